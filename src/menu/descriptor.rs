//! Menu descriptors.

use crate::menu::item::MenuItem;
use crate::tray::Icon;
use std::fmt;
use std::sync::Arc;

/// Generator producing the items of a dynamic menu.
pub type MenuFn = Arc<dyn Fn() -> Vec<MenuItem> + Send + Sync>;

enum MenuSource {
    Items(Vec<MenuItem>),
    Generator(MenuFn),
}

/// An immutable description of a menu.
///
/// A menu is either a fixed list of items or a generator that is called every time the
/// items are needed. Backends only ever render [`Menu::visible_items`]: hidden items are
/// removed first, then separators at the head and tail are dropped and runs of separators
/// are collapsed into one.
#[derive(Clone)]
pub struct Menu {
    source: Arc<MenuSource>,
}

impl Menu {
    pub fn new(items: impl IntoIterator<Item = MenuItem>) -> Self {
        Self {
            source: Arc::new(MenuSource::Items(items.into_iter().collect())),
        }
    }

    /// A menu without items.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A menu whose items are regenerated on every access.
    pub fn from_fn<F>(generator: F) -> Self
    where
        F: Fn() -> Vec<MenuItem> + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(MenuSource::Generator(Arc::new(generator))),
        }
    }

    /// All items, including hidden ones and redundant separators.
    pub fn items(&self) -> Vec<MenuItem> {
        match self.source.as_ref() {
            MenuSource::Items(items) => items.clone(),
            MenuSource::Generator(generator) => generator(),
        }
    }

    /// The items a backend should render, with hidden items and redundant separators removed.
    pub fn visible_items(&self) -> Vec<MenuItem> {
        let mut visible: Vec<MenuItem> = Vec::new();
        let mut was_separator = false;
        for item in self.items() {
            if !item.is_visible() {
                continue;
            }

            if item.is_separator() {
                if was_separator {
                    continue;
                }
                was_separator = true;
            } else {
                was_separator = false;
            }
            visible.push(item);
        }

        let start = visible
            .iter()
            .position(|item| !item.is_separator())
            .unwrap_or(visible.len());
        let end = visible
            .iter()
            .rposition(|item| !item.is_separator())
            .map_or(start, |last| last + 1);
        visible.truncate(end);
        visible.drain(..start);
        visible
    }

    /// Whether the menu has at least one visible item.
    pub fn is_visible(&self) -> bool {
        !self.visible_items().is_empty()
    }

    /// The first item flagged as default, visible or not.
    pub fn default_item(&self) -> Option<MenuItem> {
        self.items().into_iter().find(MenuItem::is_default)
    }

    /// Activates the default item.
    ///
    /// Returns `false` if the menu has no default item.
    pub fn activate_default(&self, icon: &Icon) -> bool {
        match self.default_item() {
            Some(item) => {
                item.activate(icon);
                true
            }
            None => false,
        }
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<MenuItem> for Menu {
    fn from_iter<I: IntoIterator<Item = MenuItem>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .visible_items()
            .iter()
            .map(|item| {
                item.to_string()
                    .lines()
                    .map(|line| format!("    {line}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect();
        f.write_str(&rendered.join("\n"))
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source.as_ref() {
            MenuSource::Items(items) => f.debug_list().entries(items).finish(),
            MenuSource::Generator(_) => f.write_str("Menu(<generator>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(menu: &Menu) -> Vec<String> {
        menu.visible_items().iter().map(MenuItem::text).collect()
    }

    #[test]
    fn only_separators_is_empty() {
        let menu = Menu::new([MenuItem::separator(), MenuItem::separator()]);
        assert!(menu.visible_items().is_empty());
        assert!(!menu.is_visible());
    }

    #[test]
    fn hidden_items_do_not_split_separators() {
        let menu = Menu::new([
            MenuItem::new("a"),
            MenuItem::separator(),
            MenuItem::new("hidden").visible(false),
            MenuItem::separator(),
            MenuItem::new("b"),
        ]);
        assert_eq!(texts(&menu), ["a", "- - - -", "b"]);
    }

    #[test]
    fn default_item_may_be_hidden() {
        let menu = Menu::new([
            MenuItem::new("shown"),
            MenuItem::new("hidden default").default(true).visible(false),
        ]);
        assert_eq!(texts(&menu), ["shown"]);
        assert_eq!(
            menu.default_item().map(|item| item.text()).as_deref(),
            Some("hidden default")
        );
    }

    #[test]
    fn generator_runs_on_every_access() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let menu = Menu::from_fn(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            vec![MenuItem::new(format!("call {n}"))]
        });

        assert_eq!(texts(&menu), ["call 0"]);
        assert_eq!(texts(&menu), ["call 1"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
