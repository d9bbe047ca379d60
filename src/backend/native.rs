//! Windows and macOS backend.
//!
//! Both platforms want the tray icon owned by the thread running the native event loop, so
//! the loop is a `winit` event loop on the thread calling [`Icon::run`], and every change
//! reaches it as a user event through an `EventLoopProxy`. Menu clicks and tray clicks are
//! forwarded the same way.

use crate::backend::{Backend, Capabilities};
use crate::error::{Error, Result};
use crate::menu::{Menu, MenuItem};
use crate::notification::Notifier;
use crate::tray::{Icon, TrayEvent, WeakIcon};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tray_icon::menu::{
    CheckMenuItem, ContextMenu, IsMenuItem, Menu as NativeMenu, MenuEvent, MenuId,
    MenuItem as NativeItem, PredefinedMenuItem, Submenu,
};
use tray_icon::{MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::WindowId;

#[derive(Debug)]
enum NativeEvent {
    Tray(TrayEvent),
    Menu(MenuEvent),
    Click(TrayIconEvent),
}

pub struct NativeBackend {
    proxy: Mutex<Option<EventLoopProxy<NativeEvent>>>,
    notifier: Notifier,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self {
            proxy: Mutex::new(None),
            notifier: Notifier::new(),
        }
    }

    fn send(&self, event: TrayEvent) -> Result<()> {
        let proxy = self.proxy.lock().unwrap_or_else(PoisonError::into_inner);
        match proxy.as_ref() {
            Some(proxy) => proxy
                .send_event(NativeEvent::Tray(event))
                .map_err(|_| Error::NotRunning),
            // picked up when the loop creates the tray
            None => Ok(()),
        }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_menu_radio: false,
            has_notification: Notifier::is_supported(),
            ..Capabilities::default()
        }
    }

    fn show(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::Show)
    }

    fn hide(&self) -> Result<()> {
        self.send(TrayEvent::Hide)
    }

    fn update_image(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::ImageChanged)
    }

    fn update_title(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::TitleChanged)
    }

    fn update_menu(&self, _icon: &Icon) -> Result<()> {
        self.send(TrayEvent::MenuChanged)
    }

    fn run(&self, icon: &Icon) -> Result<()> {
        let event_loop = EventLoop::<NativeEvent>::with_user_event()
            .build()
            .map_err(|e| Error::Tray(e.to_string()))?;
        let proxy = event_loop.create_proxy();

        // the handlers must be Sync, which the proxy is not on every platform
        let menu_proxy = Mutex::new(proxy.clone());
        MenuEvent::set_event_handler(Some(move |event| {
            let proxy = menu_proxy.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = proxy.send_event(NativeEvent::Menu(event));
        }));
        let click_proxy = Mutex::new(proxy.clone());
        TrayIconEvent::set_event_handler(Some(move |event| {
            let proxy = click_proxy.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = proxy.send_event(NativeEvent::Click(event));
        }));
        *self.proxy.lock().unwrap_or_else(PoisonError::into_inner) = Some(proxy);

        let mut app = NativeApp {
            icon: icon.downgrade(),
            tray: None,
            items: HashMap::new(),
        };
        let result = event_loop
            .run_app(&mut app)
            .map_err(|e| Error::Tray(e.to_string()));

        self.proxy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        MenuEvent::set_event_handler(None::<fn(MenuEvent)>);
        TrayIconEvent::set_event_handler(None::<fn(TrayIconEvent)>);
        if let Err(e) = self.notifier.hide() {
            warn!("Failed to close notification: {}", e);
        }
        result
    }

    fn stop(&self) -> Result<()> {
        match self.send(TrayEvent::Stop) {
            Err(Error::NotRunning) => {
                debug!("Stop requested after the event loop exited");
                Ok(())
            }
            other => other,
        }
    }

    fn notify(&self, icon: &Icon, message: &str, title: &str) -> Result<()> {
        self.notifier.notify(icon.name(), title, message)
    }

    fn remove_notification(&self) -> Result<()> {
        self.notifier.hide()
    }
}

/// State owned by the event loop thread.
struct NativeApp {
    icon: WeakIcon,
    tray: Option<TrayIcon>,
    /// Maps native menu ids back to their descriptors.
    items: HashMap<MenuId, MenuItem>,
}

impl NativeApp {
    fn apply(&mut self, icon: &Icon, event: TrayEvent, event_loop: &ActiveEventLoop) -> Result<()> {
        match event {
            TrayEvent::Show => match &self.tray {
                Some(tray) => tray
                    .set_visible(true)
                    .map_err(|e| Error::Tray(e.to_string()))?,
                None => self.tray = Some(self.create_tray(icon)?),
            },
            TrayEvent::Hide => {
                if let Some(tray) = &self.tray {
                    tray.set_visible(false)
                        .map_err(|e| Error::Tray(e.to_string()))?;
                }
            }
            TrayEvent::ImageChanged => {
                if let Some(tray) = &self.tray {
                    tray.set_icon(native_image(icon)?)
                        .map_err(|e| Error::Tray(e.to_string()))?;
                }
            }
            TrayEvent::TitleChanged => {
                if let Some(tray) = &self.tray {
                    tray.set_tooltip(Some(icon.title()))
                        .map_err(|e| Error::Tray(e.to_string()))?;
                }
            }
            TrayEvent::MenuChanged => {
                if self.tray.is_some() {
                    let menu = self.build_menu(icon)?;
                    if let Some(tray) = &self.tray {
                        tray.set_menu(menu.map(|menu| Box::new(menu) as Box<dyn ContextMenu>));
                    }
                }
            }
            TrayEvent::Stop => {
                self.tray = None;
                event_loop.exit();
            }
        }
        Ok(())
    }

    fn create_tray(&mut self, icon: &Icon) -> Result<TrayIcon> {
        let mut builder = TrayIconBuilder::new()
            .with_id(icon.name())
            .with_tooltip(icon.title())
            .with_menu_on_left_click(false);
        if let Some(image) = native_image(icon)? {
            builder = builder.with_icon(image);
        }
        if let Some(menu) = self.build_menu(icon)? {
            builder = builder.with_menu(Box::new(menu));
        }
        builder.build().map_err(|e| Error::Tray(e.to_string()))
    }

    fn build_menu(&mut self, icon: &Icon) -> Result<Option<NativeMenu>> {
        self.items.clear();
        let Some(menu) = icon.menu().filter(Menu::is_visible) else {
            return Ok(None);
        };

        let native = NativeMenu::new();
        for item in menu.visible_items() {
            let entry = native_entry(&item, &mut self.items)?;
            native
                .append(entry.as_ref())
                .map_err(|e| Error::Tray(e.to_string()))?;
        }
        Ok(Some(native))
    }
}

fn native_image(icon: &Icon) -> Result<Option<tray_icon::Icon>> {
    icon.image()
        .map(|image| {
            let (width, height) = (image.width(), image.height());
            tray_icon::Icon::from_rgba(image.into_rgba(), width, height)
                .map_err(|e| Error::InvalidImage(e.to_string()))
        })
        .transpose()
}

/// Converts one descriptor into a native menu entry, registering its id.
///
/// Radio items are rendered as check items; the native menus have no radio style.
fn native_entry(
    item: &MenuItem,
    items: &mut HashMap<MenuId, MenuItem>,
) -> Result<Box<dyn IsMenuItem>> {
    if item.is_separator() {
        return Ok(Box::new(PredefinedMenuItem::separator()));
    }

    let text = item.text();
    let enabled = item.is_enabled();

    if let Some(submenu) = item.as_submenu() {
        let native = Submenu::new(&text, enabled);
        for child in submenu.visible_items() {
            let entry = native_entry(&child, items)?;
            native
                .append(entry.as_ref())
                .map_err(|e| Error::Tray(e.to_string()))?;
        }
        return Ok(Box::new(native));
    }

    match item.check_state() {
        Some(checked) => {
            let native = CheckMenuItem::new(&text, enabled, checked, None);
            items.insert(native.id().clone(), item.clone());
            Ok(Box::new(native))
        }
        None => {
            let native = NativeItem::new(&text, enabled, None);
            items.insert(native.id().clone(), item.clone());
            Ok(Box::new(native))
        }
    }
}

impl ApplicationHandler<NativeEvent> for NativeApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        if cause == StartCause::Init {
            event_loop.set_control_flow(ControlFlow::Wait);
            if let Some(icon) = self.icon.upgrade() {
                icon.mark_ready();
            }
        }
    }

    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, _: WindowEvent) {}

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: NativeEvent) {
        let Some(icon) = self.icon.upgrade() else {
            event_loop.exit();
            return;
        };

        match event {
            NativeEvent::Tray(event) => {
                if let Err(e) = self.apply(&icon, event, event_loop) {
                    error!("Failed to apply {:?} to icon {}: {}", event, icon.name(), e);
                }
            }
            NativeEvent::Menu(event) => {
                let item = self.items.get(event.id()).cloned();
                match item {
                    Some(item) => icon.handle_item(&item),
                    None => debug!("Ignoring event for unknown menu item {:?}", event.id()),
                }
            }
            NativeEvent::Click(TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            }) => icon.activate(),
            NativeEvent::Click(_) => {}
        }
    }
}
