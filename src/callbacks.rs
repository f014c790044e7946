//! Host callbacks invoked on menu clicks.

use std::fmt;
use std::sync::Arc;

use crate::render::ElementKey;

type Handler = Arc<dyn Fn() + Send + Sync>;

/// User action behind a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrayAction {
    Show,
    ConnectToggle,
    ExitNodeToggle,
    SelfNode,
    Quit,
}

impl TrayAction {
    /// The action a click on `key` triggers. The status icon has none.
    pub fn for_element(key: ElementKey) -> Option<Self> {
        match key {
            ElementKey::Show => Some(Self::Show),
            ElementKey::ConnectToggle => Some(Self::ConnectToggle),
            ElementKey::ExitNodeToggle => Some(Self::ExitNodeToggle),
            ElementKey::SelfNode => Some(Self::SelfNode),
            ElementKey::Quit => Some(Self::Quit),
            ElementKey::StatusIcon => None,
        }
    }
}

/// Handlers the host registers for each menu action.
///
/// Handlers run on the click listener threads, outside the tray lock. They
/// may take as long as they like, but must not call `update` or `close`
/// synchronously if they also wait on something that holds the tray lock.
#[derive(Clone, Default)]
pub struct Callbacks {
    on_show: Option<Handler>,
    on_connect_toggle: Option<Handler>,
    on_exit_node_toggle: Option<Handler>,
    on_self_node: Option<Handler>,
    on_quit: Option<Handler>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_show(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_show = Some(Arc::new(f));
        self
    }

    pub fn on_connect_toggle(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect_toggle = Some(Arc::new(f));
        self
    }

    pub fn on_exit_node_toggle(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_exit_node_toggle = Some(Arc::new(f));
        self
    }

    pub fn on_self_node(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_self_node = Some(Arc::new(f));
        self
    }

    pub fn on_quit(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_quit = Some(Arc::new(f));
        self
    }

    fn handler(&self, action: TrayAction) -> Option<&Handler> {
        match action {
            TrayAction::Show => self.on_show.as_ref(),
            TrayAction::ConnectToggle => self.on_connect_toggle.as_ref(),
            TrayAction::ExitNodeToggle => self.on_exit_node_toggle.as_ref(),
            TrayAction::SelfNode => self.on_self_node.as_ref(),
            TrayAction::Quit => self.on_quit.as_ref(),
        }
    }

    /// Run the handler for `action`, if one is registered.
    pub fn dispatch(&self, action: TrayAction) {
        match self.handler(action) {
            Some(handler) => handler(),
            None => log::debug!("Tray: no handler for {:?}", action),
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_show", &self.on_show.is_some())
            .field("on_connect_toggle", &self.on_connect_toggle.is_some())
            .field("on_exit_node_toggle", &self.on_exit_node_toggle.is_some())
            .field("on_self_node", &self.on_self_node.is_some())
            .field("on_quit", &self.on_quit.is_some())
            .finish()
    }
}
