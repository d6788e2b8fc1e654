//! Per-tab load state machine
//!
//! ```text
//! Idle
//!   ↓ navigate
//! Loading ──→ Error
//!   ↓           │
//! Loaded        │
//!   ↑ navigate  ↓ navigate / retry
//!   └──────── Loading
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Surface created, nothing requested yet
    Idle,
    Loading,
    Loaded,
    /// Main-frame load failed
    Error,
}

impl LoadState {
    pub fn can_transition_to(&self, target: LoadState) -> bool {
        match (self, target) {
            // Any state re-enters loading on the next navigation
            (_, LoadState::Loading) => true,
            (LoadState::Loading, LoadState::Loaded) => true,
            (LoadState::Loading, LoadState::Error) => true,
            _ => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Error => "error",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(LoadState::Idle),
            "loading" => Ok(LoadState::Loading),
            "loaded" => Ok(LoadState::Loaded),
            "error" => Ok(LoadState::Error),
            _ => Err(format!("Unknown load state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(LoadState::Idle.can_transition_to(LoadState::Loading));
        assert!(LoadState::Loading.can_transition_to(LoadState::Loaded));
        assert!(LoadState::Loading.can_transition_to(LoadState::Error));
        assert!(LoadState::Loaded.can_transition_to(LoadState::Loading));
        assert!(LoadState::Error.can_transition_to(LoadState::Loading));
        assert!(LoadState::Loading.can_transition_to(LoadState::Loading));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!LoadState::Idle.can_transition_to(LoadState::Loaded));
        assert!(!LoadState::Idle.can_transition_to(LoadState::Error));
        // A late completion after a failure must not flip the tab back
        assert!(!LoadState::Error.can_transition_to(LoadState::Loaded));
        assert!(!LoadState::Loaded.can_transition_to(LoadState::Error));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Loading".parse::<LoadState>().unwrap(), LoadState::Loading);
        assert!("frozen".parse::<LoadState>().is_err());
    }
}
