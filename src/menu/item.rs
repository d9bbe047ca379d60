//! Menu item descriptors.
//!
//! A [`MenuItem`] describes one entry of a tray menu: its text, what happens when it is
//! activated, and a handful of display flags. Every flag can either be a fixed value or a
//! callable that is evaluated each time a backend asks for it, which is how dynamic menus
//! are expressed.

use crate::menu::descriptor::Menu;
use crate::tray::Icon;
use std::fmt;
use std::sync::Arc;

/// A callable computing a property from the item it belongs to.
pub(crate) type ItemFn<T> = Arc<dyn Fn(&MenuItem) -> T + Send + Sync>;

/// Callback invoked when an item is activated.
pub type ActivateFn = Arc<dyn Fn(&Icon, &MenuItem) + Send + Sync>;

const SEPARATOR_TEXT: &str = "- - - -";

/// A menu item property: either a constant or re-evaluated on every read.
#[derive(Clone)]
pub(crate) enum Property<T> {
    Static(T),
    Dynamic(ItemFn<T>),
}

impl<T: Clone> Property<T> {
    fn get(&self, item: &MenuItem) -> T {
        match self {
            Property::Static(value) => value.clone(),
            Property::Dynamic(f) => f(item),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Static(value) => write!(f, "{value:?}"),
            Property::Dynamic(_) => f.write_str("<dynamic>"),
        }
    }
}

/// What activating a menu item does.
#[derive(Clone)]
enum Action {
    Nothing,
    Callback(ActivateFn),
    Submenu(Menu),
}

#[derive(Clone)]
struct ItemData {
    text: Property<String>,
    action: Action,
    checked: Option<ItemFn<Option<bool>>>,
    radio: Property<bool>,
    default: Property<bool>,
    visible: Property<bool>,
    enabled: Property<bool>,
    separator: bool,
}

/// A single, immutable menu item.
///
/// Items are built with the consuming builder methods and are cheap to clone; clones share
/// the same descriptor.
///
/// ```
/// use tray_bridge::{Menu, MenuItem};
///
/// let menu = Menu::new([
///     MenuItem::new("Show window").default(true).on_activate(|_icon, _item| {}),
///     MenuItem::separator(),
///     MenuItem::new("Quit").on_activate(|icon, _item| icon.stop()),
/// ]);
/// assert_eq!(menu.visible_items().len(), 3);
/// ```
#[derive(Clone)]
pub struct MenuItem {
    data: Arc<ItemData>,
}

impl MenuItem {
    /// Creates an item with a fixed text and no action.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_text(Property::Static(text.into()))
    }

    /// Creates an item whose text is computed each time the menu is built.
    pub fn dynamic<F>(text: F) -> Self
    where
        F: Fn(&MenuItem) -> String + Send + Sync + 'static,
    {
        Self::with_text(Property::Dynamic(Arc::new(text)))
    }

    /// Creates an item that opens `menu` as a nested submenu.
    pub fn submenu(text: impl Into<String>, menu: Menu) -> Self {
        let mut item = Self::new(text);
        Arc::make_mut(&mut item.data).action = Action::Submenu(menu);
        item
    }

    /// Creates a separator.
    ///
    /// Separators at the head or tail of a menu are dropped, and runs of separators are
    /// collapsed into one, when the visible items are computed.
    pub fn separator() -> Self {
        let mut item = Self::new(SEPARATOR_TEXT);
        Arc::make_mut(&mut item.data).separator = true;
        item
    }

    fn with_text(text: Property<String>) -> Self {
        Self {
            data: Arc::new(ItemData {
                text,
                action: Action::Nothing,
                checked: None,
                radio: Property::Static(false),
                default: Property::Static(false),
                visible: Property::Static(true),
                enabled: Property::Static(true),
                separator: false,
            }),
        }
    }

    fn update(mut self, f: impl FnOnce(&mut ItemData)) -> Self {
        f(Arc::make_mut(&mut self.data));
        self
    }

    /// Sets the activation callback. Replaces a submenu if one was set.
    pub fn on_activate<F>(self, f: F) -> Self
    where
        F: Fn(&Icon, &MenuItem) + Send + Sync + 'static,
    {
        self.update(|data| data.action = Action::Callback(Arc::new(f)))
    }

    /// Makes the item checkable; `f` decides whether it is currently checked.
    ///
    /// Only a callable is accepted, since a constant could never follow a toggle.
    pub fn checked<F>(self, f: F) -> Self
    where
        F: Fn(&MenuItem) -> bool + Send + Sync + 'static,
    {
        self.checked_opt(move |item| Some(f(item)))
    }

    /// Like [`MenuItem::checked`], but `f` returning `None` makes the item uncheckable for
    /// as long as it does.
    pub fn checked_opt<F>(self, f: F) -> Self
    where
        F: Fn(&MenuItem) -> Option<bool> + Send + Sync + 'static,
    {
        self.update(|data| data.checked = Some(Arc::new(f)))
    }

    /// Draws a checkable item as a radio button.
    pub fn radio(self, radio: bool) -> Self {
        self.update(|data| data.radio = Property::Static(radio))
    }

    pub fn radio_fn<F>(self, f: F) -> Self
    where
        F: Fn(&MenuItem) -> bool + Send + Sync + 'static,
    {
        self.update(|data| data.radio = Property::Dynamic(Arc::new(f)))
    }

    /// Marks the item as the default action of its menu.
    pub fn default(self, default: bool) -> Self {
        self.update(|data| data.default = Property::Static(default))
    }

    pub fn default_fn<F>(self, f: F) -> Self
    where
        F: Fn(&MenuItem) -> bool + Send + Sync + 'static,
    {
        self.update(|data| data.default = Property::Dynamic(Arc::new(f)))
    }

    pub fn visible(self, visible: bool) -> Self {
        self.update(|data| data.visible = Property::Static(visible))
    }

    pub fn visible_fn<F>(self, f: F) -> Self
    where
        F: Fn(&MenuItem) -> bool + Send + Sync + 'static,
    {
        self.update(|data| data.visible = Property::Dynamic(Arc::new(f)))
    }

    pub fn enabled(self, enabled: bool) -> Self {
        self.update(|data| data.enabled = Property::Static(enabled))
    }

    pub fn enabled_fn<F>(self, f: F) -> Self
    where
        F: Fn(&MenuItem) -> bool + Send + Sync + 'static,
    {
        self.update(|data| data.enabled = Property::Dynamic(Arc::new(f)))
    }

    /// The current text.
    pub fn text(&self) -> String {
        self.data.text.get(self)
    }

    /// `Some(checked)` for checkable items, `None` for items that cannot be checked.
    pub fn check_state(&self) -> Option<bool> {
        self.data.checked.as_ref().and_then(|f| f(self))
    }

    /// Whether the item is a radio button. Always `false` for items that cannot be checked.
    pub fn is_radio(&self) -> bool {
        self.check_state().is_some() && self.data.radio.get(self)
    }

    pub fn is_default(&self) -> bool {
        self.data.default.get(self)
    }

    /// Whether the item is shown. An item opening a submenu is only visible if the
    /// submenu itself has visible items.
    pub fn is_visible(&self) -> bool {
        match &self.data.action {
            Action::Submenu(menu) => self.data.visible.get(self) && menu.is_visible(),
            _ => self.data.visible.get(self),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.data.enabled.get(self)
    }

    pub fn is_separator(&self) -> bool {
        self.data.separator
    }

    /// The nested menu, if activating this item opens one.
    pub fn as_submenu(&self) -> Option<&Menu> {
        match &self.data.action {
            Action::Submenu(menu) => Some(menu),
            _ => None,
        }
    }

    /// Runs the activation callback. Items without one, and submenu items, do nothing.
    pub fn activate(&self, icon: &Icon) {
        if let Action::Callback(f) = &self.data.action {
            f(icon, self);
        }
    }

    /// Whether both handles refer to the same descriptor.
    pub fn ptr_eq(&self, other: &MenuItem) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data.action {
            Action::Submenu(menu) => write!(f, "{} =>\n{}", self.text(), menu),
            _ => f.write_str(&self.text()),
        }
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.separator {
            return f.write_str("Separator");
        }
        f.debug_struct("MenuItem")
            .field("text", &self.data.text)
            .field("radio", &self.data.radio)
            .field("default", &self.data.default)
            .field("visible", &self.data.visible)
            .field("enabled", &self.data.enabled)
            .field("checkable", &self.data.checked.is_some())
            .field("submenu", &self.as_submenu())
            .finish()
    }
}
