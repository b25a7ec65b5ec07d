//! On-disk persistence for control strip preferences.

pub mod paths;
pub mod prefs;

pub use prefs::{JsonPreferenceStore, PrefsError};
