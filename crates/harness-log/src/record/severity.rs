use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::LogError;

/// Severity of a log record.
///
/// Totally ordered; sink filtering is `record.level >= sink.min_level`.
/// `Exception` is primarily a rendering level: stack frames are written under
/// an `EXC**` header regardless of the originating record's own level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Exception = 45,
    Critical = 50,
}

impl Severity {
    /// Numeric rank used for threshold comparison.
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Fixed header label, at most 5 columns wide.
    ///
    /// The match is total over the closed enum, so a record can never reach a
    /// sink with an unmappable level.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
            Severity::Exception => "EXC**",
            Severity::Critical => "ERR**",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Debug
    }
}

impl FromStr for Severity {
    type Err = LogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "exception" => Ok(Self::Exception),
            "critical" => Ok(Self::Critical),
            _ => Err(LogError::InvalidSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Exception => "exception",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
