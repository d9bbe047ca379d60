//! The public tray icon handle.

use crate::backend::{self, Backend, Capabilities};
use crate::config::BackendKind;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::menu::{Menu, MenuItem};
use crate::tray::state::IconState;
use log::{debug, error, warn};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};

/// Callback run on a separate thread once the icon is ready.
pub type SetupFn = Box<dyn FnOnce(&Icon) + Send + 'static>;

struct IconInner {
    name: String,
    state: Mutex<IconState>,
    backend: Arc<dyn Backend>,
    ready: Mutex<Option<Sender<()>>>,
    setup_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for IconInner {
    fn drop(&mut self) {
        let visible = self
            .state
            .get_mut()
            .map(|state| state.visible)
            .unwrap_or_else(|poisoned| poisoned.into_inner().visible);
        if visible && let Err(e) = self.backend.hide() {
            warn!("Failed to hide icon {} on drop: {}", self.name, e);
        }
    }
}

/// A system tray icon.
///
/// The icon starts hidden. [`Icon::run`] enters the backend's event loop and, unless a setup
/// callback says otherwise, shows the icon once the loop is ready.
///
/// `Icon` is a cheap handle: clones refer to the same tray icon and may be moved to other
/// threads. Dropping the last handle of a visible icon hides it.
///
/// ```no_run
/// use tray_bridge::{Icon, Image, Menu, MenuItem};
///
/// let icon = Icon::builder("example")
///     .image(Image::solid(32, 32, [0x20, 0x80, 0xff, 0xff])?)
///     .title("Example")
///     .menu(Menu::new([
///         MenuItem::new("Say hello")
///             .default(true)
///             .on_activate(|icon, _| {
///                 let _ = icon.notify("Hello!", None);
///             }),
///         MenuItem::new("Quit").on_activate(|icon, _| icon.stop()),
///     ]))
///     .build()?;
///
/// icon.run()?;
/// # Ok::<(), tray_bridge::Error>(())
/// ```
#[derive(Clone)]
pub struct Icon {
    inner: Arc<IconInner>,
}

/// A non-owning reference to an [`Icon`], held by backends to avoid reference cycles.
#[derive(Clone)]
pub struct WeakIcon {
    inner: Weak<IconInner>,
}

impl WeakIcon {
    pub fn upgrade(&self) -> Option<Icon> {
        self.inner.upgrade().map(|inner| Icon { inner })
    }
}

enum BackendChoice {
    Auto,
    Kind(BackendKind),
    Custom(Arc<dyn Backend>),
}

/// Builder for [`Icon`].
pub struct IconBuilder {
    name: String,
    image: Option<Image>,
    title: String,
    menu: Option<Menu>,
    backend: BackendChoice,
}

impl IconBuilder {
    pub fn image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The popup menu. Only the default item is guaranteed to be invokable on every
    /// platform; see [`Capabilities`].
    pub fn menu(mut self, menu: Menu) -> Self {
        self.menu = Some(menu);
        self
    }

    /// Forces a backend instead of choosing from the platform and `TRAY_BRIDGE_BACKEND`.
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = BackendChoice::Kind(kind);
        self
    }

    /// Uses a caller-provided backend implementation.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = BackendChoice::Custom(backend);
        self
    }

    pub fn build(self) -> Result<Icon> {
        let backend = match self.backend {
            BackendChoice::Auto => backend::select()?,
            BackendChoice::Kind(kind) => backend::load(kind)?,
            BackendChoice::Custom(backend) => backend,
        };
        debug!("Creating icon {} with the {} backend", self.name, backend.name());

        Ok(Icon {
            inner: Arc::new(IconInner {
                name: self.name,
                state: Mutex::new(IconState::new(self.image, self.title, self.menu)),
                backend,
                ready: Mutex::new(None),
                setup_thread: Mutex::new(None),
            }),
        })
    }
}

impl Icon {
    /// Creates a hidden icon without image, title or menu.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::builder(name).build()
    }

    pub fn builder(name: impl Into<String>) -> IconBuilder {
        IconBuilder {
            name: name.into(),
            image: None,
            title: String::new(),
            menu: None,
            backend: BackendChoice::Auto,
        }
    }

    pub fn downgrade(&self) -> WeakIcon {
        WeakIcon {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn state(&self) -> MutexGuard<'_, IconState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn backend(&self) -> &dyn Backend {
        self.inner.backend.as_ref()
    }

    /// The name used by the system to identify the icon.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The name of the backend driving this icon.
    pub fn backend_name(&self) -> &'static str {
        self.backend().name()
    }

    /// What the backend can do.
    pub fn capabilities(&self) -> Capabilities {
        self.backend().capabilities()
    }

    pub fn image(&self) -> Option<Image> {
        self.state().image.clone()
    }

    /// Replaces the image.
    ///
    /// Setting an image on a hidden icon takes effect when it is shown. Setting `None` hides
    /// a visible icon.
    pub fn set_image(&self, image: Option<Image>) -> Result<()> {
        let has_image = image.is_some();
        let visible = {
            let mut state = self.state();
            state.image = image;
            state.image_valid = false;
            state.visible
        };

        if !visible {
            return Ok(());
        }

        if has_image {
            self.backend().update_image(self)?;
            self.state().image_valid = true;
            Ok(())
        } else {
            self.set_visible(false)
        }
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        let visible = {
            let mut state = self.state();
            if state.title == title {
                return Ok(());
            }
            state.title = title;
            state.visible
        };

        if visible {
            self.backend().update_title(self)?;
        }
        Ok(())
    }

    pub fn menu(&self) -> Option<Menu> {
        self.state().menu.clone()
    }

    /// Replaces the menu; `None` disables it.
    pub fn set_menu(&self, menu: Option<Menu>) -> Result<()> {
        self.state().menu = menu;
        self.update_menu()
    }

    pub fn visible(&self) -> bool {
        self.state().visible
    }

    /// Shows or hides the icon.
    ///
    /// Fails with [`Error::NoImage`] when asked to show an icon that has no image.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        let (image_set, image_valid) = {
            let state = self.state();
            if state.visible == visible {
                return Ok(());
            }
            (state.image.is_some(), state.image_valid)
        };

        if visible {
            if !image_set {
                return Err(Error::NoImage);
            }

            if !image_valid {
                self.backend().update_image(self)?;
                self.state().image_valid = true;
            }
            self.backend().show(self)?;
        } else {
            self.backend().hide()?;
        }

        self.state().visible = visible;
        Ok(())
    }

    /// Whether the event loop has started and has not been stopped.
    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Enters the event loop and shows the icon once it is ready.
    ///
    /// Blocks until [`Icon::stop`] is called. Must be called from the main thread on macOS.
    pub fn run(&self) -> Result<()> {
        self.start(None, false)
    }

    /// Enters the event loop and calls `setup` on a separate thread once it is ready.
    ///
    /// The icon is not shown automatically; `setup` has to set [`Icon::set_visible`].
    pub fn run_with<F>(&self, setup: F) -> Result<()>
    where
        F: FnOnce(&Icon) + Send + 'static,
    {
        self.start(Some(Box::new(setup)), false)
    }

    /// Prepares the icon without blocking, for applications running their own event loop.
    ///
    /// Not every backend supports this; see [`Error::NotSupported`].
    pub fn run_detached(&self) -> Result<()> {
        self.start(None, true)
    }

    pub fn run_detached_with<F>(&self, setup: F) -> Result<()>
    where
        F: FnOnce(&Icon) + Send + 'static,
    {
        self.start(Some(Box::new(setup)), true)
    }

    fn start(&self, setup: Option<SetupFn>, detached: bool) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        *self.inner.ready.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);

        let icon = self.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-setup", self.name()))
            .spawn(move || icon.setup_handler(rx, setup))?;
        *self
            .inner
            .setup_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        let result = if detached {
            self.backend().run_detached(self)
        } else {
            let result = self.backend().run(self);
            self.state().running = false;
            result
        };

        if let Err(e) = &result {
            error!("The {} event loop failed: {}", self.backend_name(), e);
            // releases the setup thread if the loop never became ready
            self.inner
                .ready
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            self.join_setup_thread();
        }
        result
    }

    fn setup_handler(&self, ready: Receiver<()>, setup: Option<SetupFn>) {
        if ready.recv().is_err() {
            debug!("Icon {} never became ready, skipping setup", self.name());
            return;
        }

        match setup {
            Some(setup) => setup(self),
            None => {
                if let Err(e) = self.set_visible(true) {
                    error!("Failed to show icon {}: {}", self.name(), e);
                }
            }
        }
    }

    fn join_setup_thread(&self) {
        let handle = self
            .inner
            .setup_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle
            && handle.thread().id() != thread::current().id()
            && handle.join().is_err()
        {
            error!("The setup callback of icon {} panicked", self.name());
        }
    }

    /// Stops the event loop, unblocking [`Icon::run`].
    ///
    /// Joins the setup thread unless called from it.
    pub fn stop(&self) {
        if let Err(e) = self.backend().stop() {
            error!("Failed to stop the {} event loop: {}", self.backend_name(), e);
        }
        // a setup thread still waiting for readiness would never be released otherwise
        self.inner
            .ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.join_setup_thread();
        self.state().running = false;
    }

    /// Rebuilds the native menu from the menu descriptors.
    ///
    /// Only needed when dynamic properties change through something other than a menu
    /// callback; activating an item always updates the menu afterwards.
    pub fn update_menu(&self) -> Result<()> {
        self.backend().update_menu(self)
    }

    /// Displays a notification, replacing any previous one.
    ///
    /// `title` defaults to the icon title.
    pub fn notify(&self, message: &str, title: Option<&str>) -> Result<()> {
        let title = match title {
            Some(title) => title.to_string(),
            None => self.title(),
        };
        self.backend().notify(self, message, &title)
    }

    pub fn remove_notification(&self) -> Result<()> {
        self.backend().remove_notification()
    }

    /// Invokes the default action: the menu's default item, if there is one.
    ///
    /// Like [`Icon::handle_item`], a panicking callback is logged and the menu is still
    /// updated afterwards.
    pub fn activate(&self) {
        let Some(menu) = self.menu() else {
            return;
        };

        if panic::catch_unwind(AssertUnwindSafe(|| menu.activate_default(self))).is_err() {
            error!("The default action of icon {} panicked", self.name());
        }
        if let Err(e) = self.update_menu() {
            warn!("Failed to update the menu of icon {}: {}", self.name(), e);
        }
    }

    /// Signals that the backend loop is ready.
    ///
    /// Backends call this exactly once per run. The menu is updated before the setup
    /// callback is released.
    pub fn mark_ready(&self) {
        self.state().running = true;
        if let Err(e) = self.update_menu() {
            warn!("Failed to build the menu of icon {}: {}", self.name(), e);
        }

        let ready = self
            .inner
            .ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = ready {
            let _ = tx.send(());
        }
    }

    /// Activates a menu item on behalf of the backend, then updates the menu.
    ///
    /// A panicking callback is logged and does not unwind into the native loop.
    pub fn handle_item(&self, item: &MenuItem) {
        if panic::catch_unwind(AssertUnwindSafe(|| item.activate(self))).is_err() {
            error!("Menu callback for {:?} panicked", item.text());
        }

        if let Err(e) = self.update_menu() {
            warn!("Failed to update the menu of icon {}: {}", self.name(), e);
        }
    }
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Icon")
            .field("name", &self.inner.name)
            .field("backend", &self.inner.backend.name())
            .field("title", &state.title)
            .field("visible", &state.visible)
            .field("running", &state.running)
            .finish()
    }
}
