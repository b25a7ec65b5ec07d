use std::ffi::OsString;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Overrides the directory preference files are kept in.
pub const PREFS_DIR_ENV: &str = "STRIPCTL_PREFS_DIR";

pub fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("io", "github", "stripctl")
        .ok_or_else(|| anyhow::anyhow!("unable to determine platform preference directories"))
}

/// Directory holding one preferences file per domain.
pub fn prefs_dir() -> anyhow::Result<PathBuf> {
    prefs_dir_from(std::env::var_os(PREFS_DIR_ENV))
}

/// Resolves the preference directory from a raw `STRIPCTL_PREFS_DIR` value.
/// An unset or empty value falls back to the platform preference directory.
pub fn prefs_dir_from(var: Option<OsString>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = var.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(project_dirs()?.preference_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_dir() -> Option<PathBuf> {
        project_dirs()
            .ok()
            .map(|d| d.preference_dir().to_path_buf())
    }

    #[test]
    fn override_wins() {
        let dir = prefs_dir_from(Some(OsString::from("/tmp/strip-prefs"))).expect("dir");
        assert_eq!(dir, PathBuf::from("/tmp/strip-prefs"));
    }

    #[test]
    fn empty_override_falls_back_to_platform_dir() {
        assert_eq!(prefs_dir_from(Some(OsString::new())).ok(), platform_dir());
    }

    #[test]
    fn unset_override_falls_back_to_platform_dir() {
        assert_eq!(prefs_dir_from(None).ok(), platform_dir());
    }
}
