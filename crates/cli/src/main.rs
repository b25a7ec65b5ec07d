use anyhow::Context;
use app_core::{ControlStrip, ProcessControl, Section};
use process_control::{KillallProcessControl, NoRestart};
use storage::JsonPreferenceStore;
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().collect();
    let no_restart = take_flag(&mut args, "--no-restart");
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "list" => cmd_list(&args),
        "status" => cmd_status(),
        "find" => cmd_find(&args),
        "add" => cmd_add(&args, no_restart),
        "remove" => cmd_remove(&args, no_restart),
        "replace" => cmd_replace(&args, no_restart),
        "reset" => cmd_reset(&args, no_restart),
        other => anyhow::bail!("unknown command: {other} (run `stripctl help`)"),
    }
}

fn print_help() {
    eprintln!(
        r#"stripctl - edit the control strip item order

USAGE:
  stripctl list [full|mini]
  stripctl status
  stripctl find <id> [--section <full|mini>]
  stripctl add <id> [--section <full|mini>] [--at <index>]
  stripctl remove <id> [--section <full|mini>]
  stripctl replace <old_id> <new_id> [--section <full|mini>]
  stripctl reset [--section <full|mini>]

Commands that change the strip save it and restart ControlStrip,
unless --no-restart is given.

ENVIRONMENT:
  STRIPCTL_PREFS_DIR  directory holding the preference files
  RUST_LOG            log filter (default: info)
"#
    );
}

fn cmd_list(args: &[String]) -> anyhow::Result<()> {
    let sections = match args.get(2) {
        Some(raw) => vec![raw.parse::<Section>()?],
        None => Section::ALL.to_vec(),
    };

    let (_, strip) = open()?;
    for section in sections {
        println!("{section}:");
        let items = strip.items(section);
        if items.is_empty() {
            println!("  (empty)");
        }
        for (i, item) in items.iter().enumerate() {
            println!("  {i}  {item}");
        }
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let (_, strip) = open()?;
    if strip.is_default() {
        println!("default");
    } else {
        println!("customized");
    }
    Ok(())
}

fn cmd_find(args: &[String]) -> anyhow::Result<()> {
    let opts = Opts::parse(args, 1, &["--section"])?;
    let id = &opts.positional[0];

    let (_, strip) = open()?;
    match strip.find_existing_item(id, opts.section.unwrap_or_default()) {
        Some(index) => println!("{index}"),
        None => println!("not found"),
    }
    Ok(())
}

fn cmd_add(args: &[String], no_restart: bool) -> anyhow::Result<()> {
    let opts = Opts::parse(args, 1, &["--section", "--at"])?;

    let (mut store, mut strip) = open()?;
    strip.add_item(&opts.positional[0], opts.section.unwrap_or_default(), opts.at);
    save(&strip, &mut store, no_restart)
}

fn cmd_remove(args: &[String], no_restart: bool) -> anyhow::Result<()> {
    let opts = Opts::parse(args, 1, &["--section"])?;

    let (mut store, mut strip) = open()?;
    strip.remove_item(&opts.positional[0], opts.section);
    save(&strip, &mut store, no_restart)
}

fn cmd_replace(args: &[String], no_restart: bool) -> anyhow::Result<()> {
    let opts = Opts::parse(args, 2, &["--section"])?;

    let (mut store, mut strip) = open()?;
    strip.replace_item(
        &opts.positional[0],
        &opts.positional[1],
        opts.section.unwrap_or_default(),
    );
    save(&strip, &mut store, no_restart)
}

fn cmd_reset(args: &[String], no_restart: bool) -> anyhow::Result<()> {
    let opts = Opts::parse(args, 0, &["--section"])?;

    let (mut store, mut strip) = open()?;
    strip.reset(opts.section);
    save(&strip, &mut store, no_restart)
}

fn open() -> anyhow::Result<(JsonPreferenceStore, ControlStrip)> {
    let store = JsonPreferenceStore::open_default()?;
    debug!(dir = %store.dir().display(), "using preference store");
    let strip = load(&store)?;
    Ok((store, strip))
}

fn load(store: &JsonPreferenceStore) -> anyhow::Result<ControlStrip> {
    ControlStrip::load(store).context("failed to load control strip preferences")
}

fn save(
    strip: &ControlStrip,
    store: &mut JsonPreferenceStore,
    no_restart: bool,
) -> anyhow::Result<()> {
    let process: Box<dyn ProcessControl> = if no_restart {
        Box::new(NoRestart)
    } else {
        Box::new(KillallProcessControl::new())
    };
    strip.save(store, process.as_ref())?;
    println!("saved");
    Ok(())
}

/// Removes every occurrence of `flag`, returning whether it was present.
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

#[derive(Debug, Default)]
struct Opts {
    positional: Vec<String>,
    section: Option<Section>,
    at: Option<usize>,
}

impl Opts {
    /// Parses everything after the command name. Exactly `positional`
    /// arguments are required; only flags listed in `allowed` are accepted.
    fn parse(args: &[String], positional: usize, allowed: &[&str]) -> anyhow::Result<Self> {
        let mut opts = Opts::default();
        let mut i = 2;
        while i < args.len() {
            let arg = args[i].as_str();
            if !arg.starts_with("--") {
                opts.positional.push(arg.to_string());
                i += 1;
                continue;
            }
            if !allowed.contains(&arg) {
                anyhow::bail!("unknown flag: {arg}");
            }
            let v = args
                .get(i + 1)
                .ok_or_else(|| anyhow::anyhow!("{arg} requires a value"))?;
            match arg {
                "--section" => opts.section = Some(v.parse::<Section>()?),
                "--at" => {
                    opts.at = Some(
                        v.parse::<usize>()
                            .with_context(|| format!("invalid index: {v}"))?,
                    )
                }
                _ => anyhow::bail!("unknown flag: {arg}"),
            }
            i += 2;
        }

        if opts.positional.len() != positional {
            anyhow::bail!(
                "expected {positional} argument(s), got {} (run `stripctl help`)",
                opts.positional.len()
            );
        }
        Ok(opts)
    }
}
