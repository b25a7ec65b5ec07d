use crate::ids::Section;

const FULL_DEFAULTS: &[&str] = &[
    "com.apple.system.group.brightness",
    "com.apple.system.mission-control",
    "com.apple.system.launchpad",
    "com.apple.system.group.keyboard-brightness",
    "com.apple.system.group.media",
    "com.apple.system.group.volume",
    "com.apple.system.siri",
];

const MINI_DEFAULTS: &[&str] = &[
    "com.apple.system.brightness",
    "com.apple.system.volume",
    "com.apple.system.mute",
    "com.apple.system.siri",
];

/// Factory item order for a section, used when the store has no value for it.
pub fn default_items(section: Section) -> &'static [&'static str] {
    match section {
        Section::Full => FULL_DEFAULTS,
        Section::Mini => MINI_DEFAULTS,
    }
}

pub(crate) fn default_vec(section: Section) -> Vec<String> {
    default_items(section).iter().map(|s| s.to_string()).collect()
}
