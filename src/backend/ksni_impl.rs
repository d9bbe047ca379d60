//! StatusNotifierItem backend.
//!
//! This module bridges the icon to the ksni library, implementing the `ksni::Tray` trait on
//! top of the icon handle so every property query reads the icon's current state. It covers
//! the desktops served by AppIndicator: KDE, GNOME with the AppIndicator extension, and
//! every panel implementing a StatusNotifierHost.

use crate::backend::{Backend, Capabilities};
use crate::error::{Error, Result};
use crate::menu::{Menu, MenuItem};
use crate::notification::Notifier;
use crate::tray::{Icon, TrayEvent, WeakIcon};
use ksni::blocking::TrayMethods;
use ksni::menu::{CheckmarkItem, RadioGroup, RadioItem, StandardItem, SubMenu};
use log::{debug, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

/// Implementation of the `ksni::Tray` trait that reads everything from the icon.
pub struct KsniTray {
    /// The icon this tray belongs to.
    pub icon: WeakIcon,
    /// Whether the item should be shown by hosts.
    pub shown: Arc<AtomicBool>,
}

impl ksni::Tray for KsniTray {
    fn id(&self) -> String {
        self.icon
            .upgrade()
            .map(|icon| icon.name().to_string())
            .unwrap_or_default()
    }

    fn title(&self) -> String {
        self.icon.upgrade().map(|icon| icon.title()).unwrap_or_default()
    }

    fn status(&self) -> ksni::Status {
        if self.shown.load(Ordering::SeqCst) {
            ksni::Status::Active
        } else {
            ksni::Status::Passive
        }
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        let Some(image) = self.icon.upgrade().and_then(|icon| icon.image()) else {
            return Vec::new();
        };

        vec![ksni::Icon {
            width: image.width() as i32,
            height: image.height() as i32,
            data: image.to_argb(),
        }]
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.title(),
            ..Default::default()
        }
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        if let Some(icon) = self.icon.upgrade() {
            icon.activate();
        }
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        self.icon
            .upgrade()
            .and_then(|icon| icon.menu())
            .map(|menu| build_menu_items(&menu))
            .unwrap_or_default()
    }
}

/// Builds the ksni menu structure from the visible items of a menu.
///
/// Adjacent radio items are merged into one radio group.
pub fn build_menu_items(menu: &Menu) -> Vec<ksni::MenuItem<KsniTray>> {
    let mut items = Vec::new();
    let mut radio_run: Vec<MenuItem> = Vec::new();

    for item in menu.visible_items() {
        if item.is_radio() {
            radio_run.push(item);
            continue;
        }
        if !radio_run.is_empty() {
            items.push(build_radio_group(std::mem::take(&mut radio_run)));
        }
        items.push(build_menu_item(&item));
    }
    if !radio_run.is_empty() {
        items.push(build_radio_group(radio_run));
    }

    items
}

/// Converts a single non-radio item into a ksni menu item.
fn build_menu_item(item: &MenuItem) -> ksni::MenuItem<KsniTray> {
    if item.is_separator() {
        return ksni::MenuItem::Separator;
    }

    let label = escape_label(&item.text());
    let enabled = item.is_enabled();

    if let Some(submenu) = item.as_submenu() {
        return SubMenu {
            label,
            enabled,
            submenu: build_menu_items(submenu),
            ..Default::default()
        }
        .into();
    }

    let descriptor = item.clone();
    let activate = Box::new(move |this: &mut KsniTray| {
        if let Some(icon) = this.icon.upgrade() {
            icon.handle_item(&descriptor);
        }
    });

    match item.check_state() {
        Some(checked) => CheckmarkItem {
            label,
            enabled,
            checked,
            activate,
            ..Default::default()
        }
        .into(),
        None => StandardItem {
            label,
            enabled,
            activate,
            ..Default::default()
        }
        .into(),
    }
}

/// Converts a run of radio items into one radio group.
fn build_radio_group(options: Vec<MenuItem>) -> ksni::MenuItem<KsniTray> {
    // an index past the end selects nothing
    let selected = options
        .iter()
        .position(|item| item.check_state() == Some(true))
        .unwrap_or(options.len());

    let radio_items = options
        .iter()
        .map(|item| RadioItem {
            label: escape_label(&item.text()),
            enabled: item.is_enabled(),
            ..Default::default()
        })
        .collect();

    RadioGroup {
        selected,
        select: Box::new(move |this: &mut KsniTray, index| {
            if let (Some(icon), Some(item)) = (this.icon.upgrade(), options.get(index)) {
                icon.handle_item(item);
            }
        }),
        options: radio_items,
        ..Default::default()
    }
    .into()
}

/// Underscores mark access keys in dbusmenu labels.
fn escape_label(label: &str) -> String {
    label.replace('_', "__")
}

/// Backend publishing the icon as a StatusNotifierItem on the session bus.
///
/// Property changes are pushed from a worker thread, so menu callbacks running inside the
/// D-Bus service can change the icon without waiting on the service itself.
pub struct SniBackend {
    shown: Arc<AtomicBool>,
    events: Mutex<Option<Sender<TrayEvent>>>,
    stopped: Mutex<bool>,
    wakeup: Condvar,
    notifier: Notifier,
}

impl SniBackend {
    /// Checks that a session bus can be found before committing to this backend.
    pub fn probe() -> Result<Self> {
        let has_address = std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some();
        let has_runtime_bus = std::env::var_os("XDG_RUNTIME_DIR")
            .is_some_and(|dir| Path::new(&dir).join("bus").exists());

        if !has_address && !has_runtime_bus {
            return Err(Error::BackendUnavailable {
                backend: "sni",
                reason: "no D-Bus session bus found".to_string(),
            });
        }
        Ok(Self::new())
    }

    pub fn new() -> Self {
        Self {
            shown: Arc::new(AtomicBool::new(false)),
            events: Mutex::new(None),
            stopped: Mutex::new(false),
            wakeup: Condvar::new(),
            notifier: Notifier::new(),
        }
    }

    fn spawn(&self, icon: &Icon) -> Result<()> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if events.is_some() {
            return Err(Error::Tray("the tray is already running".to_string()));
        }

        let tray = KsniTray {
            icon: icon.downgrade(),
            shown: self.shown.clone(),
        };
        let handle = tray.spawn().map_err(|e| Error::Tray(e.to_string()))?;
        debug!("Spawned StatusNotifierItem for {}", icon.name());

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("{}-sni", icon.name()))
            .spawn(move || {
                for event in rx {
                    if event == TrayEvent::Stop {
                        break;
                    }
                    if handle.update(|_: &mut KsniTray| {}).is_none() {
                        warn!("The StatusNotifierItem service has shut down");
                        return;
                    }
                }
                let _ = handle.shutdown();
            })?;

        *events = Some(tx);
        Ok(())
    }

    /// Asks the worker to shut the tray down.
    ///
    /// The worker is not joined: this may run inside a menu callback, which holds the tray
    /// while a pending update in the worker waits for it.
    fn shutdown_worker(&self) {
        let events = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = events
            && tx.send(TrayEvent::Stop).is_err()
        {
            debug!("The tray worker already exited");
        }
    }

    fn send(&self, event: TrayEvent) {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = events.as_ref()
            && tx.send(event).is_err()
        {
            warn!("Dropped {:?}: the tray worker is gone", event);
        }
    }

    fn finalize(&self) {
        if let Err(e) = self.notifier.hide() {
            warn!("Failed to close notification: {}", e);
        }
    }
}

impl Default for SniBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SniBackend {
    fn name(&self) -> &'static str {
        "sni"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_notification: Notifier::is_supported(),
            ..Capabilities::default()
        }
    }

    fn show(&self, _icon: &Icon) -> Result<()> {
        self.shown.store(true, Ordering::SeqCst);
        self.send(TrayEvent::Show);
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        self.shown.store(false, Ordering::SeqCst);
        self.send(TrayEvent::Hide);
        Ok(())
    }

    fn update_image(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::ImageChanged);
        Ok(())
    }

    fn update_title(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::TitleChanged);
        Ok(())
    }

    fn update_menu(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::MenuChanged);
        Ok(())
    }

    fn run(&self, icon: &Icon) -> Result<()> {
        self.spawn(icon)?;
        icon.mark_ready();

        // a stop issued during startup still counts; the flag is consumed on the way out
        let mut stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            stopped = self
                .wakeup
                .wait(stopped)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *stopped = false;
        drop(stopped);

        // covers a stop that arrived before the worker existed
        self.shutdown_worker();
        Ok(())
    }

    fn run_detached(&self, icon: &Icon) -> Result<()> {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.spawn(icon)?;
        icon.mark_ready();
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.shutdown_worker();
        self.finalize();

        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wakeup.notify_all();
        Ok(())
    }

    fn notify(&self, icon: &Icon, message: &str, title: &str) -> Result<()> {
        self.notifier.notify(icon.name(), title, message)
    }

    fn remove_notification(&self) -> Result<()> {
        self.notifier.hide()
    }
}
