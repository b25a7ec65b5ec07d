use serde_json::Value;
use tracing::{debug, info, warn};

use crate::defaults::{default_items, default_vec};
use crate::error::StripError;
use crate::ids::Section;
use crate::{PreferenceStore, ProcessControl, CONTROL_STRIP_PROCESS, DOMAIN};

/// In-memory item order for every control strip section.
///
/// Changes stay in memory until [`ControlStrip::save`] writes them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlStrip {
    full: Vec<String>,
    mini: Vec<String>,
}

impl ControlStrip {
    /// Reads each section from `store`, falling back to the factory order for
    /// sections the store has no value for.
    pub fn load<S: PreferenceStore + ?Sized>(store: &S) -> Result<Self, StripError> {
        Ok(Self {
            full: load_section(store, Section::Full)?,
            mini: load_section(store, Section::Mini)?,
        })
    }

    /// A model holding the factory order for every section.
    pub fn defaults() -> Self {
        Self {
            full: default_vec(Section::Full),
            mini: default_vec(Section::Mini),
        }
    }

    pub fn items(&self, section: Section) -> &[String] {
        match section {
            Section::Full => &self.full,
            Section::Mini => &self.mini,
        }
    }

    fn items_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Full => &mut self.full,
            Section::Mini => &mut self.mini,
        }
    }

    /// True when every section matches the factory order exactly.
    ///
    /// Order matters: the default items in a different order are a
    /// customization.
    pub fn is_default(&self) -> bool {
        Section::ALL.into_iter().all(|section| {
            self.items(section)
                .iter()
                .map(String::as_str)
                .eq(default_items(section).iter().copied())
        })
    }

    /// Position of the first item equal to `identifier`.
    pub fn find_existing_item(&self, identifier: &str, section: Section) -> Option<usize> {
        self.items(section).iter().position(|item| item == identifier)
    }

    /// Adds `identifier` unless the section already holds it.
    ///
    /// `Some(0)` inserts at the front; `None` or a position past the end
    /// appends.
    pub fn add_item(&mut self, identifier: &str, section: Section, position: Option<usize>) {
        if self.find_existing_item(identifier, section).is_some() {
            return;
        }

        let items = self.items_mut(section);
        match position {
            Some(index) => {
                let index = index.min(items.len());
                items.insert(index, identifier.to_string());
            }
            None => items.push(identifier.to_string()),
        }
    }

    /// Removes the first occurrence of `identifier` from `section`, or from
    /// every section when none is given.
    pub fn remove_item(&mut self, identifier: &str, section: Option<Section>) {
        let sections = match section {
            Some(section) => vec![section],
            None => Section::ALL.to_vec(),
        };

        for section in sections {
            if let Some(index) = self.find_existing_item(identifier, section) {
                self.items_mut(section).remove(index);
            }
        }
    }

    /// Overwrites the slot holding `old` with `new`, keeping its position.
    ///
    /// `new` is not checked against the rest of the section, so this can
    /// leave a duplicate behind.
    pub fn replace_item(&mut self, old: &str, new: &str, section: Section) {
        let Some(index) = self.find_existing_item(old, section) else {
            return;
        };

        if self.find_existing_item(new, section).is_some() {
            debug!(section = section.key(), item = new, "replacement already present in section");
        }
        self.items_mut(section)[index] = new.to_string();
    }

    /// Restores `section` (or every section) to the factory order.
    pub fn reset(&mut self, section: Option<Section>) {
        match section {
            Some(section) => *self.items_mut(section) = default_vec(section),
            None => *self = Self::defaults(),
        }
    }

    /// Writes every section, synchronizes the store and asks the control strip
    /// process to restart.
    ///
    /// Sections are written in order without rollback: if a later write
    /// fails, earlier sections keep their new value. The restart is only
    /// requested once everything is written and synchronized.
    pub fn save<S, P>(&self, store: &mut S, process: &P) -> Result<(), StripError>
    where
        S: PreferenceStore + ?Sized,
        P: ProcessControl + ?Sized,
    {
        for section in Section::ALL {
            let value = Value::from(self.items(section).to_vec());
            if let Err(err) = store.set(section.key(), value, DOMAIN) {
                warn!(section = section.key(), error = %err, "failed to write section");
                return Err(StripError::Persistence);
            }
        }

        if !store.synchronize(DOMAIN) {
            warn!(domain = DOMAIN, "preference synchronize failed");
            return Err(StripError::Persistence);
        }

        info!(domain = DOMAIN, "control strip preferences saved");
        process.request_restart(CONTROL_STRIP_PROCESS);
        Ok(())
    }
}

impl Default for ControlStrip {
    fn default() -> Self {
        Self::defaults()
    }
}

fn load_section<S: PreferenceStore + ?Sized>(
    store: &S,
    section: Section,
) -> Result<Vec<String>, StripError> {
    let key = section.key();
    match store.get(key, DOMAIN) {
        Ok(Some(value)) => serde_json::from_value(value).map_err(|err| StripError::StoreRead {
            key,
            source: err.into(),
        }),
        Ok(None) => {
            debug!(section = key, "no stored value, using defaults");
            Ok(default_vec(section))
        }
        Err(source) => Err(StripError::StoreRead { key, source }),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        values: HashMap<(String, String), Value>,
        fail_get: bool,
        fail_set_key: Option<&'static str>,
        fail_sync: bool,
        syncs: usize,
    }

    impl FakeStore {
        fn with(full: &[&str], mini: &[&str]) -> Self {
            let mut store = Self::default();
            store.put(Section::Full, full);
            store.put(Section::Mini, mini);
            store
        }

        fn put(&mut self, section: Section, items: &[&str]) {
            self.values.insert(
                (section.key().to_string(), DOMAIN.to_string()),
                serde_json::json!(items),
            );
        }

        fn stored(&self, section: Section) -> Option<&Value> {
            self.values.get(&(section.key().to_string(), DOMAIN.to_string()))
        }
    }

    impl PreferenceStore for FakeStore {
        fn get(&self, key: &str, domain: &str) -> anyhow::Result<Option<Value>> {
            if self.fail_get {
                anyhow::bail!("store unavailable");
            }
            Ok(self.values.get(&(key.to_string(), domain.to_string())).cloned())
        }

        fn set(&mut self, key: &str, value: Value, domain: &str) -> anyhow::Result<()> {
            if matches!(self.fail_set_key, Some(k) if k == key) {
                anyhow::bail!("write rejected for {key}");
            }
            self.values.insert((key.to_string(), domain.to_string()), value);
            Ok(())
        }

        fn synchronize(&mut self, _domain: &str) -> bool {
            self.syncs += 1;
            !self.fail_sync
        }
    }

    #[derive(Default)]
    struct RecordingProcess {
        restarts: RefCell<Vec<String>>,
    }

    impl ProcessControl for RecordingProcess {
        fn request_restart(&self, process_name: &str) {
            self.restarts.borrow_mut().push(process_name.to_string());
        }
    }

    fn strip(full: &[&str], mini: &[&str]) -> ControlStrip {
        ControlStrip::load(&FakeStore::with(full, mini)).expect("load")
    }

    #[test]
    fn empty_store_loads_defaults() {
        let strip = ControlStrip::load(&FakeStore::default()).expect("load");

        assert!(strip.is_default());
        assert_eq!(strip.items(Section::Mini), default_items(Section::Mini));
        assert_eq!(strip, ControlStrip::defaults());
    }

    #[test]
    fn stored_sections_are_loaded_as_is() {
        let strip = strip(&["a", "b", "a"], &[]);

        assert_eq!(strip.items(Section::Full), ["a", "b", "a"]);
        assert!(strip.items(Section::Mini).is_empty());
        assert!(!strip.is_default());
    }

    #[test]
    fn one_missing_section_falls_back_alone() {
        let mut store = FakeStore::default();
        store.put(Section::Mini, &["com.apple.system.mute"]);

        let strip = ControlStrip::load(&store).expect("load");

        assert_eq!(strip.items(Section::Full), default_items(Section::Full));
        assert_eq!(strip.items(Section::Mini), ["com.apple.system.mute"]);
    }

    #[test]
    fn read_failure_propagates() {
        let store = FakeStore {
            fail_get: true,
            ..FakeStore::default()
        };

        let err = ControlStrip::load(&store).expect_err("read must fail");
        assert!(matches!(err, StripError::StoreRead { key: "FullCustomized", .. }));
    }

    #[test]
    fn non_list_value_is_a_read_failure() {
        let mut store = FakeStore::default();
        store.values.insert(
            (Section::Mini.key().to_string(), DOMAIN.to_string()),
            serde_json::json!({ "not": "a list" }),
        );

        let err = ControlStrip::load(&store).expect_err("decode must fail");
        assert!(matches!(err, StripError::StoreRead { key: "MiniCustomized", .. }));
    }

    #[test]
    fn find_reports_first_occurrence_or_none() {
        let strip = strip(&["a", "b", "a"], &[]);

        assert_eq!(strip.find_existing_item("a", Section::Full), Some(0));
        assert_eq!(strip.find_existing_item("b", Section::Full), Some(1));
        assert_eq!(strip.find_existing_item("z", Section::Full), None);
        assert_eq!(strip.find_existing_item("a", Section::Mini), None);
    }

    #[test]
    fn add_remove_volume_scenario() {
        let mut strip = strip(&[], &[]);

        strip.add_item("volume", Section::Full, None);
        assert_eq!(strip.items(Section::Full), ["volume"]);

        strip.add_item("volume", Section::Full, None);
        assert_eq!(strip.items(Section::Full), ["volume"]);

        strip.remove_item("volume", None);
        assert!(strip.items(Section::Full).is_empty());
    }

    #[test]
    fn add_is_idempotent_even_with_position() {
        let mut strip = strip(&["a", "b"], &[]);

        strip.add_item("b", Section::Full, Some(0));
        assert_eq!(strip.items(Section::Full), ["a", "b"]);
    }

    #[test]
    fn add_at_zero_inserts_at_front() {
        let mut strip = strip(&["a", "b"], &[]);

        strip.add_item("x", Section::Full, Some(0));
        assert_eq!(strip.items(Section::Full), ["x", "a", "b"]);
    }

    #[test]
    fn add_at_position_shifts_later_items() {
        let mut strip = strip(&["a", "b", "c"], &[]);

        strip.add_item("x", Section::Full, Some(2));
        assert_eq!(strip.items(Section::Full), ["a", "b", "x", "c"]);
    }

    #[test]
    fn add_past_end_appends() {
        let mut strip = strip(&["a"], &[]);

        strip.add_item("x", Section::Full, Some(10));
        assert_eq!(strip.items(Section::Full), ["a", "x"]);
    }

    #[test]
    fn add_only_touches_its_section() {
        let mut strip = strip(&["a"], &["b"]);

        strip.add_item("a", Section::Mini, None);
        assert_eq!(strip.items(Section::Full), ["a"]);
        assert_eq!(strip.items(Section::Mini), ["b", "a"]);
    }

    #[test]
    fn remove_without_section_hits_every_section() {
        let mut strip = strip(&["a", "siri", "b"], &["siri"]);

        strip.remove_item("siri", None);
        assert_eq!(strip.items(Section::Full), ["a", "b"]);
        assert!(strip.items(Section::Mini).is_empty());

        strip.remove_item("missing", None);
        assert_eq!(strip.items(Section::Full), ["a", "b"]);
    }

    #[test]
    fn remove_with_section_leaves_others_alone() {
        let mut strip = strip(&["siri"], &["siri"]);

        strip.remove_item("siri", Some(Section::Mini));
        assert_eq!(strip.items(Section::Full), ["siri"]);
        assert!(strip.items(Section::Mini).is_empty());
    }

    #[test]
    fn remove_deletes_only_first_occurrence() {
        let mut strip = strip(&["a", "b", "a"], &[]);

        strip.remove_item("a", Some(Section::Full));
        assert_eq!(strip.items(Section::Full), ["b", "a"]);
    }

    #[test]
    fn replace_keeps_position_and_ignores_missing() {
        let mut strip = strip(&["a", "b", "c"], &[]);

        strip.replace_item("b", "x", Section::Full);
        assert_eq!(strip.items(Section::Full), ["a", "x", "c"]);

        strip.replace_item("z", "y", Section::Full);
        assert_eq!(strip.items(Section::Full), ["a", "x", "c"]);
    }

    #[test]
    fn replace_can_introduce_duplicate() {
        let mut strip = strip(&["a", "b"], &[]);

        strip.replace_item("b", "a", Section::Full);
        assert_eq!(strip.items(Section::Full), ["a", "a"]);
    }

    #[test]
    fn reordered_defaults_are_not_default() {
        let mut strip = ControlStrip::defaults();
        let last = default_items(Section::Mini)[3];

        strip.remove_item(last, Some(Section::Mini));
        strip.add_item(last, Section::Mini, Some(0));

        assert_eq!(strip.items(Section::Mini).len(), default_items(Section::Mini).len());
        assert!(!strip.is_default());
    }

    #[test]
    fn reset_restores_factory_order() {
        let mut strip = strip(&["a"], &["b"]);

        strip.reset(Some(Section::Mini));
        assert_eq!(strip.items(Section::Mini), default_items(Section::Mini));
        assert!(!strip.is_default());

        strip.reset(None);
        assert!(strip.is_default());
    }

    #[test]
    fn save_round_trips_through_store() {
        let mut store = FakeStore::default();
        let process = RecordingProcess::default();

        let mut strip = ControlStrip::load(&store).expect("load");
        strip.remove_item("com.apple.system.siri", None);
        strip.add_item("com.apple.system.screen-lock", Section::Full, Some(0));
        strip.save(&mut store, &process).expect("save");

        let reloaded = ControlStrip::load(&store).expect("reload");
        assert_eq!(reloaded, strip);
        assert_eq!(store.syncs, 1);
        assert_eq!(*process.restarts.borrow(), ["ControlStrip"]);
    }

    #[test]
    fn repeated_save_yields_same_stored_state() {
        let mut store = FakeStore::default();
        let process = RecordingProcess::default();
        let strip = strip(&["a", "b"], &["c"]);

        strip.save(&mut store, &process).expect("first save");
        let first = store.values.clone();
        strip.save(&mut store, &process).expect("second save");

        assert_eq!(store.values, first);
    }

    #[test]
    fn failed_second_write_keeps_first_and_skips_restart() {
        let mut store = FakeStore::with(&["old"], &["old"]);
        store.fail_set_key = Some("MiniCustomized");
        let process = RecordingProcess::default();
        let strip = strip(&["new"], &["new"]);

        let err = strip.save(&mut store, &process).expect_err("save must fail");

        assert!(matches!(err, StripError::Persistence));
        assert_eq!(store.stored(Section::Full), Some(&serde_json::json!(["new"])));
        assert_eq!(store.stored(Section::Mini), Some(&serde_json::json!(["old"])));
        assert_eq!(store.syncs, 0);
        assert!(process.restarts.borrow().is_empty());
    }

    #[test]
    fn failed_synchronize_skips_restart() {
        let mut store = FakeStore {
            fail_sync: true,
            ..FakeStore::default()
        };
        let process = RecordingProcess::default();

        let err = ControlStrip::defaults()
            .save(&mut store, &process)
            .expect_err("save must fail");

        assert!(matches!(err, StripError::Persistence));
        assert!(process.restarts.borrow().is_empty());
    }
}
