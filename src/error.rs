//! Error types surfaced by the tray controller.

use thiserror::Error;

use crate::render::ElementKey;

/// Errors returned by tray lifecycle operations.
///
/// Only `start` can fail. Updates and closes on a tray that is not running are
/// silent no-ops rather than errors.
#[derive(Debug, Error)]
pub enum TrayError {
    /// The native tray subsystem could not be initialized.
    #[error("tray initialization failed: {0}")]
    Init(String),

    /// `start` was called while a session is already live.
    #[error("tray session is already running")]
    AlreadyRunning,

    /// A native menu element could not be created.
    #[error("failed to create menu item {key:?}: {reason}")]
    MenuItem { key: ElementKey, reason: String },

    /// A click listener thread could not be spawned.
    #[error("failed to spawn click listener for {key:?}: {source}")]
    Listener {
        key: ElementKey,
        #[source]
        source: std::io::Error,
    },

    /// An icon payload could not be decoded.
    #[error("icon decode error: {0}")]
    Icon(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_item_error_names_the_element() {
        let err = TrayError::MenuItem {
            key: ElementKey::ExitNodeToggle,
            reason: "menu closed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to create menu item ExitNodeToggle: menu closed"
        );
    }

    #[test]
    fn listener_error_keeps_io_source() {
        let err = TrayError::Listener {
            key: ElementKey::Quit,
            source: std::io::Error::new(std::io::ErrorKind::Other, "no threads"),
        };
        let source = std::error::Error::source(&err).expect("source should be set");
        assert_eq!(source.to_string(), "no threads");
    }
}
