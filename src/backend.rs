//! Boundary between the tray core and the native tray subsystem.

use std::sync::mpsc::Receiver;

use crate::error::TrayError;
use crate::render::ElementKey;

/// One click on a native menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent;

/// Long-lived stream of clicks for one menu item. It ends when the backend
/// drops the sending half, which happens on [`TrayBackend::shutdown`].
pub type ClickStream = Receiver<ClickEvent>;

/// Everything the native tray needs before menu items are added.
#[derive(Debug, Clone, Copy)]
pub struct TraySetup<'a> {
    pub tooltip: &'a str,
    pub title: Option<&'a str>,
    pub icon: &'a [u8],
    pub icon_is_template: bool,
}

/// Creation parameters of one menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemSpec {
    pub key: ElementKey,
    pub title: String,
    pub tooltip: String,
    pub checkable: bool,
    pub checked: bool,
}

/// Native tray operations used by the controller.
///
/// Mutators are fire-and-forget: implementations log failures instead of
/// returning them. All methods are called with the controller's session lock
/// held, so implementations must not call back into the controller.
pub trait TrayBackend: Send + 'static {
    /// Handle of a created menu item.
    type Item: Send + 'static;

    fn start(&mut self, setup: &TraySetup<'_>) -> Result<(), TrayError>;

    fn add_menu_item(&mut self, spec: &MenuItemSpec) -> Result<Self::Item, TrayError>;

    fn add_separator(&mut self) -> Result<(), TrayError>;

    fn click_stream(&mut self, item: &Self::Item) -> ClickStream;

    fn set_title(&mut self, item: &Self::Item, title: &str);

    fn set_enabled(&mut self, item: &Self::Item, enabled: bool);

    fn set_checked(&mut self, item: &Self::Item, checked: bool);

    fn set_icon(&mut self, icon: &[u8]);

    /// Remove the tray and close every click stream. Safe to call repeatedly.
    fn shutdown(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::mpsc::{self, Sender};
    use std::sync::{Arc, Mutex};

    /// A recorded native mutator call. Items are identified by creation index.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NativeCall {
        SetTitle(usize, String),
        SetEnabled(usize, bool),
        SetChecked(usize, bool),
        SetIcon(Vec<u8>),
    }

    #[derive(Default)]
    struct FakeState {
        calls: Vec<NativeCall>,
        items: Vec<MenuItemSpec>,
        separators: usize,
        starts: u32,
        shutdowns: u32,
        running: bool,
        fail_start: bool,
        fail_item: Option<ElementKey>,
        clicks: HashMap<usize, Sender<ClickEvent>>,
    }

    /// In-memory backend; clones share state so tests can observe calls made
    /// through the copy the controller owns.
    #[derive(Clone, Default)]
    pub struct FakeBackend {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakeBackend {
        fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
            self.inner.lock().expect("fake backend lock poisoned")
        }

        pub fn calls(&self) -> Vec<NativeCall> {
            self.state().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.state().calls.clear();
        }

        pub fn items(&self) -> Vec<MenuItemSpec> {
            self.state().items.clone()
        }

        pub fn separators(&self) -> usize {
            self.state().separators
        }

        pub fn starts(&self) -> u32 {
            self.state().starts
        }

        pub fn shutdowns(&self) -> u32 {
            self.state().shutdowns
        }

        pub fn set_fail_start(&self, fail: bool) {
            self.state().fail_start = fail;
        }

        pub fn set_fail_item(&self, key: Option<ElementKey>) {
            self.state().fail_item = key;
        }

        /// Index of the most recently created item for `key`.
        pub fn item_index(&self, key: ElementKey) -> Option<usize> {
            self.state().items.iter().rposition(|spec| spec.key == key)
        }

        /// Simulate a user click. Returns false when nobody is listening.
        pub fn click(&self, key: ElementKey) -> bool {
            let state = self.state();
            let Some(index) = state.items.iter().rposition(|spec| spec.key == key) else {
                return false;
            };
            state
                .clicks
                .get(&index)
                .is_some_and(|tx| tx.send(ClickEvent).is_ok())
        }
    }

    impl TrayBackend for FakeBackend {
        type Item = usize;

        fn start(&mut self, _setup: &TraySetup<'_>) -> Result<(), TrayError> {
            let mut state = self.state();
            state.starts += 1;
            if state.fail_start {
                return Err(TrayError::Init("no status notifier host".to_string()));
            }
            state.running = true;
            Ok(())
        }

        fn add_menu_item(&mut self, spec: &MenuItemSpec) -> Result<usize, TrayError> {
            let mut state = self.state();
            if state.fail_item == Some(spec.key) {
                return Err(TrayError::MenuItem {
                    key: spec.key,
                    reason: "menu rejected item".to_string(),
                });
            }
            state.items.push(spec.clone());
            Ok(state.items.len() - 1)
        }

        fn add_separator(&mut self) -> Result<(), TrayError> {
            self.state().separators += 1;
            Ok(())
        }

        fn click_stream(&mut self, item: &usize) -> ClickStream {
            let (tx, rx) = mpsc::channel();
            self.state().clicks.insert(*item, tx);
            rx
        }

        fn set_title(&mut self, item: &usize, title: &str) {
            self.state()
                .calls
                .push(NativeCall::SetTitle(*item, title.to_string()));
        }

        fn set_enabled(&mut self, item: &usize, enabled: bool) {
            self.state().calls.push(NativeCall::SetEnabled(*item, enabled));
        }

        fn set_checked(&mut self, item: &usize, checked: bool) {
            self.state().calls.push(NativeCall::SetChecked(*item, checked));
        }

        fn set_icon(&mut self, icon: &[u8]) {
            self.state().calls.push(NativeCall::SetIcon(icon.to_vec()));
        }

        fn shutdown(&mut self) {
            let mut state = self.state();
            if state.running {
                state.shutdowns += 1;
            }
            state.running = false;
            state.clicks.clear();
        }
    }
}
