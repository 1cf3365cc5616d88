use serde::{Deserialize, Serialize};
use std::fmt;

/// Feed an observation value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Ghcn,
    Gsod,
    Normals,
    MnClimate,
    Nws,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Ghcn,
        Source::Gsod,
        Source::Normals,
        Source::MnClimate,
        Source::Nws,
    ];

    /// Numeric precedence rank. Higher ranks are never overwritten by lower ones;
    /// equal ranks overwrite each other freely.
    pub fn precedence(&self) -> u8 {
        match self {
            Source::Ghcn => 1,
            Source::Gsod | Source::Normals | Source::MnClimate | Source::Nws => 0,
        }
    }

    /// Whether a write from `self` may replace a value currently held by `holder`.
    pub fn may_overwrite(&self, holder: Source) -> bool {
        self.precedence() >= holder.precedence()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ghcn => "ghcn",
            Source::Gsod => "gsod",
            Source::Normals => "normals",
            Source::MnClimate => "mn_climate",
            Source::Nws => "nws",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ghcn" => Some(Source::Ghcn),
            "gsod" => Some(Source::Gsod),
            "normals" => Some(Source::Normals),
            "mn_climate" => Some(Source::MnClimate),
            "nws" => Some(Source::Nws),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
