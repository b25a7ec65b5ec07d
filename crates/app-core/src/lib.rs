//! Control strip item model and the collaborators it persists through.

pub mod defaults;
pub mod error;
pub mod ids;
pub mod model;

pub use error::StripError;
pub use ids::Section;
pub use model::ControlStrip;

/// Preference domain the control strip reads its layout from.
pub const DOMAIN: &str = "com.apple.controlstrip";

/// Process that owns the control strip and reloads it on restart.
pub const CONTROL_STRIP_PROCESS: &str = "ControlStrip";

/// Per-application key-value preferences.
///
/// `get` distinguishes a missing key (`Ok(None)`) from a failed read (`Err`).
/// Writes made with `set` are only guaranteed durable after `synchronize`.
pub trait PreferenceStore {
    fn get(&self, key: &str, domain: &str) -> anyhow::Result<Option<serde_json::Value>>;

    fn set(&mut self, key: &str, value: serde_json::Value, domain: &str) -> anyhow::Result<()>;

    fn synchronize(&mut self, domain: &str) -> bool;
}

/// Signals a running process to reload by restarting it.
pub trait ProcessControl {
    /// Fire-and-forget; the caller never learns whether the restart happened.
    fn request_restart(&self, process_name: &str);
}
