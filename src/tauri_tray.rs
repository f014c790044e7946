//! Native tray backed by Tauri's tray icon and menu APIs.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use tauri::image::Image;
use tauri::menu::{
    CheckMenuItem, CheckMenuItemBuilder, Menu, MenuEvent, MenuId, MenuItem, MenuItemBuilder,
    PredefinedMenuItem,
};
use tauri::tray::{TrayIcon, TrayIconBuilder, TrayIconId};
use tauri::{AppHandle, RunEvent, Runtime};

use crate::backend::{ClickEvent, ClickStream, MenuItemSpec, TrayBackend, TraySetup};
use crate::controller::TrayController;
use crate::error::TrayError;
use crate::icons::decode_png;

/// Id of the tray icon registered with Tauri.
pub const TRAY_ID: &str = "vpn-status";

type ClickRoutes = Arc<Mutex<HashMap<String, Sender<ClickEvent>>>>;

enum ItemKind<R: Runtime> {
    Plain(MenuItem<R>),
    Check(CheckMenuItem<R>),
}

/// A menu item created by [`TauriTrayBackend`].
pub struct TauriMenuItem<R: Runtime> {
    id: String,
    kind: ItemKind<R>,
}

/// [`TrayBackend`] driving a Tauri `TrayIcon`.
pub struct TauriTrayBackend<R: Runtime> {
    app: AppHandle<R>,
    tray: Option<TrayIcon<R>>,
    menu: Option<Menu<R>>,
    routes: ClickRoutes,
    template: bool,
}

impl<R: Runtime> TauriTrayBackend<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self {
            app,
            tray: None,
            menu: None,
            routes: Arc::new(Mutex::new(HashMap::new())),
            template: false,
        }
    }

    fn menu(&self) -> Result<&Menu<R>, TrayError> {
        self.menu
            .as_ref()
            .ok_or_else(|| TrayError::Init("tray menu not created".to_string()))
    }
}

fn load_image(bytes: &[u8]) -> Result<Image<'static>, TrayError> {
    let icon = decode_png(bytes)?;
    Ok(Image::new_owned(icon.rgba, icon.width, icon.height))
}

fn route_click(routes: &ClickRoutes, event: &MenuEvent) {
    let id = event.id().as_ref();
    let routes = routes.lock().unwrap_or_else(PoisonError::into_inner);
    match routes.get(id) {
        Some(tx) => {
            if tx.send(ClickEvent).is_err() {
                log::debug!("Tray: click on {} after its listener stopped", id);
            }
        }
        None => log::debug!("Tray: Unhandled menu event: {}", id),
    }
}

impl<R: Runtime> TrayBackend for TauriTrayBackend<R> {
    type Item = TauriMenuItem<R>;

    fn start(&mut self, setup: &TraySetup<'_>) -> Result<(), TrayError> {
        let init = |e: tauri::Error| TrayError::Init(e.to_string());

        let menu = Menu::new(&self.app).map_err(init)?;
        let routes = Arc::clone(&self.routes);

        let mut builder = TrayIconBuilder::with_id(TrayIconId::new(TRAY_ID))
            .icon(load_image(setup.icon)?)
            .icon_as_template(setup.icon_is_template)
            .tooltip(setup.tooltip)
            .menu(&menu)
            .show_menu_on_left_click(true)
            .on_menu_event(move |_app, event| route_click(&routes, &event));
        if let Some(title) = setup.title {
            builder = builder.title(title);
        }

        let tray = builder.build(&self.app).map_err(init)?;
        self.template = setup.icon_is_template;
        self.menu = Some(menu);
        self.tray = Some(tray);
        log::info!("Tray icon initialized");
        Ok(())
    }

    fn add_menu_item(&mut self, spec: &MenuItemSpec) -> Result<Self::Item, TrayError> {
        let id = spec.key.as_str().to_string();
        let failed = |e: tauri::Error| TrayError::MenuItem {
            key: spec.key,
            reason: e.to_string(),
        };

        // Tauri menu items have no tooltip; `spec.tooltip` is dropped.
        let kind = if spec.checkable {
            let item = CheckMenuItemBuilder::with_id(MenuId::new(&id), &spec.title)
                .checked(spec.checked)
                .build(&self.app)
                .map_err(failed)?;
            self.menu()?.append(&item).map_err(failed)?;
            ItemKind::Check(item)
        } else {
            let item = MenuItemBuilder::with_id(MenuId::new(&id), &spec.title)
                .build(&self.app)
                .map_err(failed)?;
            self.menu()?.append(&item).map_err(failed)?;
            ItemKind::Plain(item)
        };

        Ok(TauriMenuItem { id, kind })
    }

    fn add_separator(&mut self) -> Result<(), TrayError> {
        let init = |e: tauri::Error| TrayError::Init(e.to_string());
        let separator = PredefinedMenuItem::separator(&self.app).map_err(init)?;
        self.menu()?.append(&separator).map_err(init)
    }

    fn click_stream(&mut self, item: &Self::Item) -> ClickStream {
        let (tx, rx) = mpsc::channel();
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.id.clone(), tx);
        rx
    }

    fn set_title(&mut self, item: &Self::Item, title: &str) {
        let result = match &item.kind {
            ItemKind::Plain(menu_item) => menu_item.set_text(title),
            ItemKind::Check(menu_item) => menu_item.set_text(title),
        };
        if let Err(err) = result {
            log::warn!("Tray: failed to set title of {}: {}", item.id, err);
        }
    }

    fn set_enabled(&mut self, item: &Self::Item, enabled: bool) {
        let result = match &item.kind {
            ItemKind::Plain(menu_item) => menu_item.set_enabled(enabled),
            ItemKind::Check(menu_item) => menu_item.set_enabled(enabled),
        };
        if let Err(err) = result {
            log::warn!("Tray: failed to set enabled on {}: {}", item.id, err);
        }
    }

    fn set_checked(&mut self, item: &Self::Item, checked: bool) {
        match &item.kind {
            ItemKind::Check(menu_item) => {
                if let Err(err) = menu_item.set_checked(checked) {
                    log::warn!("Tray: failed to set checked on {}: {}", item.id, err);
                }
            }
            ItemKind::Plain(_) => {
                log::warn!("Tray: {} is not checkable", item.id);
            }
        }
    }

    fn set_icon(&mut self, icon: &[u8]) {
        let Some(tray) = &self.tray else {
            return;
        };
        let image = match load_image(icon) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("Tray: failed to load icon: {}", err);
                return;
            }
        };
        if let Err(err) = tray.set_icon(Some(image)) {
            log::warn!("Tray: failed to set icon: {}", err);
            return;
        }
        if let Err(err) = tray.set_icon_as_template(self.template) {
            log::warn!("Tray: failed to mark icon as template: {}", err);
        }
    }

    fn shutdown(&mut self) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.menu = None;
        if let Some(tray) = self.tray.take() {
            if let Err(err) = tray.set_visible(false) {
                log::warn!("Tray: failed to hide tray icon: {}", err);
            }
            self.app.remove_tray_by_id(TRAY_ID);
            log::info!("Tray icon removed");
        }
    }
}

/// Forward Tauri run events that concern the tray.
///
/// Call from the host's `App::run` callback so the tray session ends when the
/// event loop exits. Never blocks the main thread: if an update is in flight,
/// the teardown runs when that update releases the tray.
pub fn handle_run_event<B: TrayBackend>(controller: &TrayController<B>, event: &RunEvent) {
    if matches!(event, RunEvent::Exit) {
        if let Some(signal) = controller.exit_signal() {
            signal.fire();
        }
    }
}
