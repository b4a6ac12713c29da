//! Process run mode.

use std::fmt;

/// Environment variable that selects the run mode.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Production or development behaviour, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    /// Resolve the mode from `NODE_ENV`.
    ///
    /// Only the exact value `production` selects production; anything else,
    /// including an unset variable, is development.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Production => write!(f, "production"),
            Mode::Development => write!(f, "development"),
        }
    }
}
