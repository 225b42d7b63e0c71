use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playlist category. `Mixed` is derived from the other three and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Happy,
    Chill,
    Energetic,
    Mixed,
}

impl Mood {
    /// Every mood, in the order the mood buttons are shown.
    pub const ALL: [Mood; 4] = [Mood::Happy, Mood::Chill, Mood::Energetic, Mood::Mixed];

    /// Moods that hold their own links, in persistence order.
    pub const EDITABLE: [Mood; 3] = [Mood::Happy, Mood::Chill, Mood::Energetic];

    /// Lowercase key used on the command line and in the links file.
    pub fn key(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Chill => "chill",
            Mood::Energetic => "energetic",
            Mood::Mixed => "mixed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Chill => "Chill",
            Mood::Energetic => "Energetic",
            Mood::Mixed => "Mixed",
        }
    }

    pub fn is_derived(self) -> bool {
        self == Mood::Mixed
    }

    /// Storage slot of an editable mood, `None` for `Mixed`.
    pub(crate) fn slot(self) -> Option<usize> {
        match self {
            Mood::Happy => Some(0),
            Mood::Chill => Some(1),
            Mood::Energetic => Some(2),
            Mood::Mixed => None,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood '{0}' (expected happy, chill, energetic or mixed)")]
pub struct ParseMoodError(pub String);

impl FromStr for Mood {
    type Err = ParseMoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseMoodError(s.to_string()))
    }
}

/// One playable link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub title: String,
    pub url: String,
}

impl LinkRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn summary(&self) -> String {
        format!("{} <{}>", self.title, self.url)
    }
}

impl fmt::Display for LinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// True when `s` looks like something a browser can open.
pub fn is_web_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
