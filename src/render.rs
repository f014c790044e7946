//! Change-detecting repaint of the tray elements.
//!
//! A repaint derives a [`TrayView`] from the snapshot, then walks the
//! elements one by one. Each element owns a key in the session's
//! [`DiffCache`]; its native mutators only run when the value tuple for that
//! key changed. The first repaint of a session finds every key missing, so it
//! paints everything.

use crate::backend::TrayBackend;
use crate::diff::DiffCache;
use crate::icons::{IconKind, IconSet};
use crate::status::StatusSnapshot;

const NOT_CONNECTED: &str = "Not connected";
const SELF_TITLE_PREFIX: &str = "This machine: ";

/// Stable identity of each tray element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Show,
    ConnectToggle,
    ExitNodeToggle,
    SelfNode,
    Quit,
    StatusIcon,
}

impl ElementKey {
    /// Menu item keys in menu order.
    pub const MENU_ITEMS: [ElementKey; 5] = [
        Self::Show,
        Self::ConnectToggle,
        Self::ExitNodeToggle,
        Self::SelfNode,
        Self::Quit,
    ];

    /// Id used for native menu items.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::ConnectToggle => "connect_toggle",
            Self::ExitNodeToggle => "exit_node_toggle",
            Self::SelfNode => "self_node",
            Self::Quit => "quit",
            Self::StatusIcon => "status_icon",
        }
    }
}

/// Presentation of every tray element for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    pub self_label: String,
    /// Derived from address validity.
    pub connected: bool,
    /// Reported by the client. Usually equal to `connected`, but not always.
    pub online: bool,
    pub exit_node_active: bool,
    pub connect_label: &'static str,
    pub exit_label: &'static str,
    pub icon: IconKind,
}

impl TrayView {
    pub fn from_snapshot<S: StatusSnapshot + ?Sized>(status: &S) -> Self {
        let (self_label, connected) = self_label(status);
        let online = status.online();
        let exit_node_active = status.exit_node_active();

        Self {
            self_label,
            connected,
            online,
            exit_node_active,
            connect_label: connect_label(online),
            exit_label: exit_label(exit_node_active),
            icon: IconKind::for_state(online, exit_node_active),
        }
    }

    /// Full title of the self-node menu item.
    pub fn self_title(&self) -> String {
        format!("{}{}", SELF_TITLE_PREFIX, self.self_label)
    }
}

fn self_label<S: StatusSnapshot + ?Sized>(status: &S) -> (String, bool) {
    match status.self_address() {
        Some(addr) => (format!("{} ({})", status.self_display_name(), addr), true),
        None => (NOT_CONNECTED.to_string(), false),
    }
}

fn connect_label(online: bool) -> &'static str {
    if online {
        "Disconnect"
    } else {
        "Connect"
    }
}

fn exit_label(exit_node_active: bool) -> &'static str {
    if exit_node_active {
        "Disable exit node"
    } else {
        "Enable exit node"
    }
}

/// Native handles of the menu items of one session.
#[derive(Debug)]
pub struct MenuHandles<I> {
    pub show: I,
    pub connect_toggle: I,
    pub exit_toggle: I,
    pub self_node: I,
    pub quit: I,
}

/// What a repaint touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepaintReport {
    /// Elements whose value tuple changed, in repaint order.
    pub repainted: Vec<ElementKey>,
    /// Native mutator calls issued.
    pub native_calls: usize,
}

impl RepaintReport {
    pub fn is_noop(&self) -> bool {
        self.repainted.is_empty()
    }
}

/// Push every stale element of `view` to the native tray.
pub fn repaint<B: TrayBackend>(
    backend: &mut B,
    handles: &MenuHandles<B::Item>,
    cache: &mut DiffCache,
    icons: &IconSet,
    view: &TrayView,
) -> RepaintReport {
    let mut report = RepaintReport::default();

    let icon = icons.select(view.icon);
    if cache.bytes.dirty(ElementKey::StatusIcon, &[icon]) {
        backend.set_icon(icon);
        report.repainted.push(ElementKey::StatusIcon);
        report.native_calls += 1;
    }

    if cache.scalars.dirty(
        ElementKey::SelfNode,
        vec![view.self_label.as_str().into(), view.connected.into()],
    ) {
        backend.set_title(&handles.self_node, &view.self_title());
        backend.set_enabled(&handles.self_node, view.connected);
        report.repainted.push(ElementKey::SelfNode);
        report.native_calls += 2;
    }

    if cache.scalars.dirty(
        ElementKey::ConnectToggle,
        vec![view.connect_label.into(), view.online.into()],
    ) {
        backend.set_title(&handles.connect_toggle, view.connect_label);
        backend.set_checked(&handles.connect_toggle, view.online);
        report.repainted.push(ElementKey::ConnectToggle);
        report.native_calls += 2;
    }

    if cache.scalars.dirty(
        ElementKey::ExitNodeToggle,
        vec![
            view.exit_label.into(),
            view.connected.into(),
            view.exit_node_active.into(),
        ],
    ) {
        backend.set_title(&handles.exit_toggle, view.exit_label);
        backend.set_enabled(&handles.exit_toggle, view.connected);
        backend.set_checked(&handles.exit_toggle, view.exit_node_active);
        report.repainted.push(ElementKey::ExitNodeToggle);
        report.native_calls += 3;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{FakeBackend, NativeCall};
    use crate::icons::IconStyle;
    use crate::status::IpnStatus;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(100, 1, 2, 3))
    }

    fn handles() -> MenuHandles<usize> {
        MenuHandles {
            show: 0,
            connect_toggle: 1,
            exit_toggle: 2,
            self_node: 3,
            quit: 4,
        }
    }

    fn paint(
        backend: &mut FakeBackend,
        cache: &mut DiffCache,
        icons: &IconSet,
        status: &IpnStatus,
    ) -> RepaintReport {
        repaint(
            backend,
            &handles(),
            cache,
            icons,
            &TrayView::from_snapshot(status),
        )
    }

    #[test]
    fn self_label_without_address() {
        let view = TrayView::from_snapshot(&IpnStatus::offline());
        assert_eq!(view.self_label, "Not connected");
        assert!(!view.connected);
        assert_eq!(view.self_title(), "This machine: Not connected");
    }

    #[test]
    fn self_label_with_address() {
        let view = TrayView::from_snapshot(&IpnStatus::connected("host", addr()));
        assert_eq!(view.self_label, "host (100.1.2.3)");
        assert!(view.connected);
        assert_eq!(view.self_title(), "This machine: host (100.1.2.3)");
    }

    #[test]
    fn online_and_connected_stay_distinct() {
        let status = IpnStatus {
            online: false,
            exit_node_active: false,
            self_addr: Some(addr()),
            self_display_name: "host".to_string(),
        };
        let view = TrayView::from_snapshot(&status);
        assert!(view.connected);
        assert!(!view.online);
        assert_eq!(view.connect_label, "Connect");
    }

    #[test]
    fn labels_follow_state() {
        let on = TrayView::from_snapshot(&IpnStatus::connected("h", addr()).with_exit_node(true));
        assert_eq!(on.connect_label, "Disconnect");
        assert_eq!(on.exit_label, "Disable exit node");
        assert_eq!(on.icon, IconKind::ExitNode);

        let off = TrayView::from_snapshot(&IpnStatus::offline());
        assert_eq!(off.connect_label, "Connect");
        assert_eq!(off.exit_label, "Enable exit node");
        assert_eq!(off.icon, IconKind::Inactive);
    }

    #[test]
    fn first_repaint_touches_every_element() {
        let mut backend = FakeBackend::default();
        let mut cache = DiffCache::new();
        let icons = IconSet::embedded(IconStyle::Color);

        let report = paint(
            &mut backend,
            &mut cache,
            &icons,
            &IpnStatus::connected("host", addr()),
        );

        assert_eq!(
            report.repainted,
            vec![
                ElementKey::StatusIcon,
                ElementKey::SelfNode,
                ElementKey::ConnectToggle,
                ElementKey::ExitNodeToggle,
            ]
        );
        assert_eq!(report.native_calls, 8);
        assert_eq!(backend.calls().len(), 8);
        for key in [
            ElementKey::StatusIcon,
            ElementKey::SelfNode,
            ElementKey::ConnectToggle,
            ElementKey::ExitNodeToggle,
        ] {
            assert!(cache.is_tracked(key), "{:?} should be tracked", key);
        }
    }

    #[test]
    fn repeat_repaint_is_silent() {
        let mut backend = FakeBackend::default();
        let mut cache = DiffCache::new();
        let icons = IconSet::default();
        let status = IpnStatus::connected("host", addr());

        paint(&mut backend, &mut cache, &icons, &status);
        backend.clear_calls();

        let report = paint(&mut backend, &mut cache, &icons, &status);
        assert!(report.is_noop());
        assert_eq!(report.native_calls, 0);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn exit_node_change_repaints_only_exit_toggle_and_icon() {
        let mut backend = FakeBackend::default();
        let mut cache = DiffCache::new();
        let icons = IconSet::embedded(IconStyle::Color);
        let before = IpnStatus::connected("host", addr());
        let after = before.clone().with_exit_node(true);

        paint(&mut backend, &mut cache, &icons, &before);
        backend.clear_calls();

        let report = paint(&mut backend, &mut cache, &icons, &after);
        assert_eq!(
            report.repainted,
            vec![ElementKey::StatusIcon, ElementKey::ExitNodeToggle]
        );
        assert_eq!(
            backend.calls(),
            vec![
                NativeCall::SetIcon(icons.select(IconKind::ExitNode).to_vec()),
                NativeCall::SetTitle(2, "Disable exit node".to_string()),
                NativeCall::SetEnabled(2, true),
                NativeCall::SetChecked(2, true),
            ]
        );
    }

    #[test]
    fn going_offline_keeps_self_item_when_address_is_kept() {
        let mut backend = FakeBackend::default();
        let mut cache = DiffCache::new();
        let icons = IconSet::embedded(IconStyle::Color);
        let online = IpnStatus::connected("host", addr());
        let mut offline = online.clone();
        offline.online = false;

        paint(&mut backend, &mut cache, &icons, &online);
        backend.clear_calls();

        let report = paint(&mut backend, &mut cache, &icons, &offline);
        assert_eq!(
            report.repainted,
            vec![ElementKey::StatusIcon, ElementKey::ConnectToggle]
        );
        assert!(backend.calls().contains(&NativeCall::SetChecked(1, false)));
        assert!(backend
            .calls()
            .contains(&NativeCall::SetTitle(1, "Connect".to_string())));
    }

    #[test]
    fn losing_address_disables_self_and_exit_items() {
        let mut backend = FakeBackend::default();
        let mut cache = DiffCache::new();
        let icons = IconSet::default();

        paint(
            &mut backend,
            &mut cache,
            &icons,
            &IpnStatus::connected("host", addr()),
        );
        backend.clear_calls();

        let status = IpnStatus {
            online: true,
            self_addr: None,
            ..IpnStatus::connected("host", addr())
        };
        let report = paint(&mut backend, &mut cache, &icons, &status);

        assert_eq!(
            report.repainted,
            vec![ElementKey::SelfNode, ElementKey::ExitNodeToggle]
        );
        let calls = backend.calls();
        assert!(calls.contains(&NativeCall::SetTitle(
            3,
            "This machine: Not connected".to_string()
        )));
        assert!(calls.contains(&NativeCall::SetEnabled(3, false)));
        assert!(calls.contains(&NativeCall::SetEnabled(2, false)));
    }

    #[test]
    fn menu_ids_unique() {
        let mut seen = std::collections::HashSet::new();
        for key in ElementKey::MENU_ITEMS
            .iter()
            .chain(std::iter::once(&ElementKey::StatusIcon))
        {
            assert!(seen.insert(key.as_str()), "Duplicate menu ID: {}", key.as_str());
        }
    }
}
