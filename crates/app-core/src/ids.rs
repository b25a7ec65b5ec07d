use std::fmt;
use std::str::FromStr;

/// One of the two customizable control strip layouts.
///
/// The set is closed: the preference store only knows these two keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Section {
    #[default]
    Full,
    Mini,
}

impl Section {
    /// Every recognized section, in the order they are loaded and saved.
    pub const ALL: [Section; 2] = [Section::Full, Section::Mini];

    /// Preference key the section is stored under.
    pub fn key(self) -> &'static str {
        match self {
            Section::Full => "FullCustomized",
            Section::Mini => "MiniCustomized",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section: {0} (expected full or mini)")]
pub struct ParseSectionError(pub String);

impl FromStr for Section {
    type Err = ParseSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "fullcustomized" => Ok(Section::Full),
            "mini" | "minicustomized" => Ok(Section::Mini),
            _ => Err(ParseSectionError(s.to_string())),
        }
    }
}
