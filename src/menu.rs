//! Menu layout and static menu text.

use crate::backend::MenuItemSpec;
use crate::config::TrayConfig;
use crate::render::{ElementKey, TrayView};

/// Position of a separator in the menu, given as the number of items above it.
pub const SEPARATORS_AFTER: [usize; 2] = [1, 4];

/// Text that does not depend on status: tooltips, the tray title and the
/// initial labels of the fixed items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuText {
    pub tray_tooltip: String,
    pub tray_title: Option<String>,
    show: String,
    show_tooltip: String,
    connect_tooltip: String,
    exit_tooltip: String,
    self_tooltip: String,
    quit: String,
    quit_tooltip: String,
}

impl MenuText {
    pub fn from_config(config: &TrayConfig) -> Self {
        Self {
            tray_tooltip: config.tray_tooltip().to_string(),
            tray_title: config.title.clone(),
            show: "Show".to_string(),
            show_tooltip: format!("Show {}", config.app_name),
            connect_tooltip: format!("Connect to {}", config.service_name),
            exit_tooltip: "Allow use of this device as an exit node".to_string(),
            self_tooltip: "Current node IP".to_string(),
            quit: "Quit".to_string(),
            quit_tooltip: format!(
                "Quit {} ({} will remain running)",
                config.app_name, config.service_name
            ),
        }
    }

    /// Creation parameters for the menu item `key`, seeded from `view`.
    /// `None` for elements that are not menu items.
    pub fn item_spec(&self, key: ElementKey, view: &TrayView) -> Option<MenuItemSpec> {
        let (title, tooltip, checkable, checked) = match key {
            ElementKey::Show => (self.show.clone(), &self.show_tooltip, false, false),
            ElementKey::ConnectToggle => (
                view.connect_label.to_string(),
                &self.connect_tooltip,
                true,
                view.online,
            ),
            ElementKey::ExitNodeToggle => (
                view.exit_label.to_string(),
                &self.exit_tooltip,
                true,
                view.exit_node_active,
            ),
            ElementKey::SelfNode => (view.self_title(), &self.self_tooltip, false, false),
            ElementKey::Quit => (self.quit.clone(), &self.quit_tooltip, false, false),
            ElementKey::StatusIcon => return None,
        };

        Some(MenuItemSpec {
            key,
            title,
            tooltip: tooltip.clone(),
            checkable,
            checked,
        })
    }
}

impl Default for MenuText {
    fn default() -> Self {
        Self::from_config(&TrayConfig::default())
    }
}
