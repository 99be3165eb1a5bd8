//! Screen orientation lock state
//!
//! Holds the orientation constraint the application currently requests from
//! the platform. A process-wide instance is available through [`global`];
//! standalone instances can be created for injection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

/// Requested screen orientation constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrientationLock {
    /// Platform default behaviour
    Default,
    /// Any orientation
    All,
    /// Portrait, either way up
    Portrait,
    /// Portrait, right way up
    #[default]
    PortraitUp,
    /// Portrait, upside down
    PortraitDown,
    /// Landscape, either side
    Landscape,
    /// Landscape, rotated left
    LandscapeLeft,
    /// Landscape, rotated right
    LandscapeRight,
    /// Platform-specific lock
    Other,
    /// Lock could not be determined
    Unknown,
}

impl OrientationLock {
    /// Platform name of the lock
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::All => "ALL",
            Self::Portrait => "PORTRAIT",
            Self::PortraitUp => "PORTRAIT_UP",
            Self::PortraitDown => "PORTRAIT_DOWN",
            Self::Landscape => "LANDSCAPE",
            Self::LandscapeLeft => "LANDSCAPE_LEFT",
            Self::LandscapeRight => "LANDSCAPE_RIGHT",
            Self::Other => "OTHER",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the lock only allows landscape orientations
    pub fn is_landscape(&self) -> bool {
        matches!(
            self,
            Self::Landscape | Self::LandscapeLeft | Self::LandscapeRight
        )
    }
}

impl fmt::Display for OrientationLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized orientation lock name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown orientation lock: {0}")]
pub struct ParseOrientationError(String);

impl FromStr for OrientationLock {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().replace('-', "_").as_str() {
            "DEFAULT" => Self::Default,
            "ALL" => Self::All,
            "PORTRAIT" => Self::Portrait,
            "PORTRAIT_UP" => Self::PortraitUp,
            "PORTRAIT_DOWN" => Self::PortraitDown,
            "LANDSCAPE" => Self::Landscape,
            "LANDSCAPE_LEFT" => Self::LandscapeLeft,
            "LANDSCAPE_RIGHT" => Self::LandscapeRight,
            "OTHER" => Self::Other,
            "UNKNOWN" => Self::Unknown,
            _ => return Err(ParseOrientationError(s.to_string())),
        })
    }
}

/// Current orientation lock with change notification
///
/// Clones share the same value.
#[derive(Debug, Clone)]
pub struct OrientationState {
    sender: Arc<watch::Sender<OrientationLock>>,
}

impl Default for OrientationState {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationState {
    /// Create a state holding the portrait default
    pub fn new() -> Self {
        Self::with_lock(OrientationLock::default())
    }

    /// Create a state holding `lock`
    pub fn with_lock(lock: OrientationLock) -> Self {
        let (sender, _) = watch::channel(lock);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Current lock
    pub fn get(&self) -> OrientationLock {
        *self.sender.borrow()
    }

    /// Replace the current lock, returning the previous one
    ///
    /// Any lock is accepted; subscribers are only woken when the value changes.
    pub fn set(&self, lock: OrientationLock) -> OrientationLock {
        let mut previous = lock;
        self.sender.send_if_modified(|current| {
            previous = *current;
            if *current == lock {
                return false;
            }
            *current = lock;
            true
        });
        if previous != lock {
            debug!(from = %previous, to = %lock, "Orientation lock changed");
        }
        previous
    }

    /// Subscribe to lock changes, e.g. from the platform orientation API
    pub fn subscribe(&self) -> watch::Receiver<OrientationLock> {
        self.sender.subscribe()
    }
}

static GLOBAL_ORIENTATION: Lazy<OrientationState> = Lazy::new(OrientationState::new);

/// Process-wide orientation state
pub fn global() -> &'static OrientationState {
    &GLOBAL_ORIENTATION
}
