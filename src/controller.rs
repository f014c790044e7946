//! Tray session lifecycle.
//!
//! # State Diagram
//!
//! ```text
//!   Uninitialized ──start──► Starting ──menu built──► Ready
//!         ▲                     │                       │
//!         └──── init failure ───┘                 close │ native exit
//!                                                       ▼
//!   Closed ◄─────────────── teardown ─────────────── Closing
//!     │
//!     └──start──► Starting
//! ```
//!
//! One mutex guards the whole session: both diff tables and every native
//! mutation sequence. `start`, `update` and `close` each hold it for their
//! full duration, so concurrent updates serialize and the last one to acquire
//! the lock wins. Click listeners never take it.
//!
//! Native exit never waits for the lock. Native mutators may block until the
//! platform's main thread serves them, and exit is reported from that same
//! thread, so an [`ExitSignal`] only records the request and tries the lock.
//! If the lock is busy, whoever holds it performs the teardown on release.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::thread;

use crate::backend::{TrayBackend, TraySetup};
use crate::callbacks::{Callbacks, TrayAction};
use crate::config::TrayConfig;
use crate::diff::DiffCache;
use crate::error::TrayError;
use crate::icons::IconSet;
use crate::menu::{MenuText, SEPARATORS_AFTER};
use crate::render::{self, ElementKey, MenuHandles, RepaintReport, TrayView};
use crate::status::{Status, StatusSnapshot};

/// Session ids start at 1; 0 means no session.
const NO_SESSION: u64 = 0;

/// Lifecycle of the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Starting,
    Ready,
    Closing,
    Closed,
}

/// Result of handing a status to the tray. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The tray was live; the report lists what changed (possibly nothing).
    Repainted(RepaintReport),
    /// No live session, or it is exiting; the status was dropped.
    NotReady,
    /// The status carries no connectivity snapshot; it was dropped.
    Unsupported,
}

/// Tells the controller that the native tray went away on its own.
///
/// A signal is bound to the session that issued it; firing it after that
/// session ended does nothing. Firing never blocks, so it is safe from the
/// platform's main thread.
#[derive(Clone)]
pub struct ExitSignal {
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl ExitSignal {
    pub fn fire(&self) {
        (self.notify)()
    }
}

impl std::fmt::Debug for ExitSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitSignal").finish_non_exhaustive()
    }
}

struct Session<I> {
    id: u64,
    handles: MenuHandles<I>,
    cache: DiffCache,
}

struct Inner<B: TrayBackend> {
    backend: B,
    state: LifecycleState,
    next_session_id: u64,
    session: Option<Session<B::Item>>,
}

struct Shared<B: TrayBackend> {
    callbacks: Callbacks,
    icons: IconSet,
    text: MenuText,
    /// Id of the ready session, readable without the lock.
    live_session: AtomicU64,
    /// Id of a session whose native exit has not been handled yet.
    pending_exit: AtomicU64,
    inner: Mutex<Inner<B>>,
}

/// Owns the native tray and keeps it in sync with status updates.
pub struct TrayController<B: TrayBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: TrayBackend> Clone for TrayController<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: TrayBackend> TrayController<B> {
    pub fn new(backend: B, config: &TrayConfig, callbacks: Callbacks) -> Self {
        Self::with_icons(backend, config, IconSet::from_config(config), callbacks)
    }

    pub fn with_icons(
        backend: B,
        config: &TrayConfig,
        icons: IconSet,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                callbacks,
                icons,
                text: MenuText::from_config(config),
                live_session: AtomicU64::new(NO_SESSION),
                pending_exit: AtomicU64::new(NO_SESSION),
                inner: Mutex::new(Inner {
                    backend,
                    state: LifecycleState::Uninitialized,
                    next_session_id: 1,
                    session: None,
                }),
            }),
        }
    }

    /// Create the native tray and paint it from `initial`.
    ///
    /// Fails with [`TrayError::AlreadyRunning`] if a session is live. On any
    /// native failure the partial tray is torn down and the controller goes
    /// back to the state it was in.
    pub fn start<S: StatusSnapshot + ?Sized>(&self, initial: &S) -> Result<(), TrayError> {
        let shared = &self.shared;
        shared.with_inner(|inner| {
            let resting = inner.state;
            if !matches!(
                resting,
                LifecycleState::Uninitialized | LifecycleState::Closed
            ) {
                return Err(TrayError::AlreadyRunning);
            }

            inner.state = LifecycleState::Starting;
            let id = inner.next_session_id;
            inner.next_session_id += 1;
            log::info!("Starting tray session {}", id);

            let view = TrayView::from_snapshot(initial);
            let mut session = match shared.open_session(&mut inner.backend, id, &view) {
                Ok(session) => session,
                Err(err) => {
                    inner.backend.shutdown();
                    inner.state = resting;
                    log::error!("Tray session {} failed to start: {}", id, err);
                    return Err(err);
                }
            };

            inner.state = LifecycleState::Ready;
            let report = render::repaint(
                &mut inner.backend,
                &session.handles,
                &mut session.cache,
                &shared.icons,
                &view,
            );
            log::debug!(
                "Tray session {} painted {} elements ({} native calls)",
                id,
                report.repainted.len(),
                report.native_calls
            );
            inner.session = Some(session);
            shared.live_session.store(id, Ordering::SeqCst);

            log::info!("Tray session {} ready", id);
            Ok(())
        })
    }

    /// Apply a status update. Statuses without a connectivity snapshot and
    /// updates while the tray is not ready are dropped.
    pub fn update(&self, status: &Status) -> UpdateOutcome {
        let Some(snapshot) = status.as_ipn() else {
            log::debug!("Tray: ignoring {} status", status.kind());
            return UpdateOutcome::Unsupported;
        };
        self.repaint(snapshot)
    }

    /// Repaint from a snapshot, touching only stale elements.
    pub fn repaint<S: StatusSnapshot + ?Sized>(&self, snapshot: &S) -> UpdateOutcome {
        let shared = &self.shared;
        shared.with_inner(|inner| {
            let Some(session) = inner.session.as_mut() else {
                return UpdateOutcome::NotReady;
            };
            if shared.pending_exit.load(Ordering::SeqCst) == session.id {
                return UpdateOutcome::NotReady;
            }

            let view = TrayView::from_snapshot(snapshot);
            let report = render::repaint(
                &mut inner.backend,
                &session.handles,
                &mut session.cache,
                &shared.icons,
                &view,
            );
            if !report.is_noop() {
                log::debug!(
                    "Tray session {} repainted {:?}",
                    session.id,
                    report.repainted
                );
            }
            UpdateOutcome::Repainted(report)
        })
    }

    /// Tear down the native tray. Does nothing if no session is live.
    pub fn close(&self) {
        self.shared.with_inner(|inner| {
            let Some(session) = inner.session.take() else {
                return;
            };
            log::info!("Closing tray session {}", session.id);
            self.shared.teardown(inner, session);
        })
    }

    /// Signal for the native layer to report that the tray was closed by the
    /// OS or the user. `None` while no session is live. Never blocks.
    pub fn exit_signal(&self) -> Option<ExitSignal> {
        let id = self.shared.live_session.load(Ordering::SeqCst);
        if id == NO_SESSION {
            return None;
        }
        let shared: Weak<Shared<B>> = Arc::downgrade(&self.shared);

        Some(ExitSignal {
            notify: Arc::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.request_exit(id);
                }
            }),
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.with_inner(|inner| inner.state)
    }

    pub fn is_ready(&self) -> bool {
        self.shared.with_inner(|inner| inner.session.is_some())
    }

    /// Whether `key` has been painted in the live session.
    pub fn is_painted(&self, key: ElementKey) -> bool {
        self.shared.with_inner(|inner| {
            inner
                .session
                .as_ref()
                .is_some_and(|session| session.cache.is_tracked(key))
        })
    }
}

impl<B: TrayBackend> Shared<B> {
    /// Run `f` under the session lock, then handle any exit reported while
    /// the lock was held.
    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner<B>) -> T) -> T {
        let out = {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.drain_pending_exit();
        out
    }

    fn try_lock(&self) -> Option<MutexGuard<'_, Inner<B>>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn request_exit(&self, id: u64) {
        if self.live_session.load(Ordering::SeqCst) != id {
            return;
        }
        self.pending_exit.store(id, Ordering::SeqCst);
        self.drain_pending_exit();
    }

    /// Handle a recorded exit if the lock is free. A busy lock means its
    /// holder will call this again after releasing it.
    fn drain_pending_exit(&self) {
        while self.pending_exit.load(Ordering::SeqCst) != NO_SESSION {
            let Some(mut guard) = self.try_lock() else {
                return;
            };
            let id = self.pending_exit.swap(NO_SESSION, Ordering::SeqCst);
            if id != NO_SESSION {
                self.handle_native_exit(&mut guard, id);
            }
        }
    }

    fn open_session(
        &self,
        backend: &mut B,
        id: u64,
        view: &TrayView,
    ) -> Result<Session<B::Item>, TrayError> {
        backend.start(&TraySetup {
            tooltip: &self.text.tray_tooltip,
            title: self.text.tray_title.as_deref(),
            icon: self.icons.select(view.icon),
            icon_is_template: self.icons.is_template(),
        })?;

        let mut created = Vec::with_capacity(ElementKey::MENU_ITEMS.len());
        for (index, key) in ElementKey::MENU_ITEMS.into_iter().enumerate() {
            if SEPARATORS_AFTER.contains(&index) {
                backend.add_separator()?;
            }
            let spec =
                self.text
                    .item_spec(key, view)
                    .ok_or_else(|| TrayError::MenuItem {
                        key,
                        reason: "element has no menu item".to_string(),
                    })?;
            created.push(backend.add_menu_item(&spec)?);
        }

        let mut created = created.into_iter();
        let mut next = || {
            created.next().ok_or_else(|| {
                TrayError::Init("native menu returned fewer items than requested".to_string())
            })
        };
        let handles = MenuHandles {
            show: next()?,
            connect_toggle: next()?,
            exit_toggle: next()?,
            self_node: next()?,
            quit: next()?,
        };

        self.spawn_listeners(backend, &handles)?;

        Ok(Session {
            id,
            handles,
            cache: DiffCache::new(),
        })
    }

    /// One listener thread per menu item, each draining its own item's stream.
    fn spawn_listeners(
        &self,
        backend: &mut B,
        handles: &MenuHandles<B::Item>,
    ) -> Result<(), TrayError> {
        let items = [
            (ElementKey::Show, &handles.show),
            (ElementKey::ConnectToggle, &handles.connect_toggle),
            (ElementKey::ExitNodeToggle, &handles.exit_toggle),
            (ElementKey::SelfNode, &handles.self_node),
            (ElementKey::Quit, &handles.quit),
        ];

        for (key, item) in items {
            let Some(action) = TrayAction::for_element(key) else {
                continue;
            };
            let clicks = backend.click_stream(item);
            let callbacks = self.callbacks.clone();
            thread::Builder::new()
                .name(format!("tray-click-{}", key.as_str()))
                .spawn(move || {
                    for _ in clicks {
                        callbacks.dispatch(action);
                    }
                    log::debug!("Tray: click listener for {} stopped", key.as_str());
                })
                .map_err(|source| TrayError::Listener { key, source })?;
        }

        Ok(())
    }

    fn handle_native_exit(&self, inner: &mut Inner<B>, id: u64) {
        let live = inner.session.as_ref().is_some_and(|session| session.id == id);
        if !live || inner.state != LifecycleState::Ready {
            return;
        }
        let Some(session) = inner.session.take() else {
            return;
        };
        log::info!("Tray session {} exited", id);
        self.teardown(inner, session);
    }

    fn teardown(&self, inner: &mut Inner<B>, session: Session<B::Item>) {
        inner.state = LifecycleState::Closing;
        self.live_session.store(NO_SESSION, Ordering::SeqCst);
        inner.backend.shutdown();
        drop(session);
        inner.state = LifecycleState::Closed;
    }
}
