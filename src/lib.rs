//! VPN Status Tray - system tray presence for a VPN client
//!
//! This library keeps a native status tray (icon, connect toggle, exit node
//! toggle and own-node entry) in sync with the client's connectivity status.
//! Updates may arrive at any rate; only elements whose values changed since
//! the last paint are pushed to the native tray.
//!
//! The native side sits behind [`TrayBackend`]. With the `tauri-tray`
//! feature, [`tauri_tray::TauriTrayBackend`] drives a Tauri tray icon.

pub mod backend;
pub mod callbacks;
pub mod config;
pub mod controller;
pub mod diff;
pub mod error;
pub mod feed;
pub mod icons;
pub mod logging;
pub mod menu;
pub mod render;
pub mod status;
#[cfg(feature = "tauri-tray")]
pub mod tauri_tray;

pub use backend::{ClickEvent, ClickStream, MenuItemSpec, TrayBackend, TraySetup};
pub use callbacks::{Callbacks, TrayAction};
pub use config::{load_config, save_config, ConfigError, TrayConfig};
pub use controller::{ExitSignal, LifecycleState, TrayController, UpdateOutcome};
pub use error::TrayError;
pub use feed::spawn_update_loop;
pub use icons::{IconSet, IconStyle};
pub use logging::init_logging;
pub use render::{ElementKey, RepaintReport};
pub use status::{FileStatus, IpnStatus, ProfileStatus, Status, StatusSnapshot};
