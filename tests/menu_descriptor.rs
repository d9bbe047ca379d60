use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tray_bridge::{DummyBackend, Icon, Menu, MenuItem};

fn icon() -> Icon {
    let _ = env_logger::builder().is_test(true).try_init();
    Icon::builder("menu-test")
        .with_backend(Arc::new(DummyBackend::new()))
        .build()
        .unwrap()
}

fn texts(menu: &Menu) -> Vec<String> {
    menu.visible_items().iter().map(MenuItem::text).collect()
}

#[test]
fn activation_calls_the_callback() {
    let icon = icon();
    let (tx, rx) = std::sync::mpsc::channel();
    let item = MenuItem::new("Test entry").on_activate(move |_, item| {
        tx.send(item.text()).unwrap();
    });

    item.activate(&icon);
    assert_eq!(rx.try_recv().unwrap(), "Test entry");
}

#[test]
fn activation_receives_the_icon() {
    let icon = icon();
    let (tx, rx) = std::sync::mpsc::channel();
    let item = MenuItem::new("Test").on_activate(move |icon, _| {
        tx.send(icon.name().to_string()).unwrap();
    });

    item.activate(&icon);
    assert_eq!(rx.try_recv().unwrap(), "menu-test");
}

#[test]
fn item_without_action_does_nothing() {
    MenuItem::new("Nothing").activate(&icon());
}

#[test]
fn menu_from_items() {
    let menu = Menu::new([MenuItem::new("one"), MenuItem::new("two")]);
    assert_eq!(texts(&menu), ["one", "two"]);
    assert!(menu.is_visible());
}

#[test]
fn menu_collected_from_iterator() {
    let menu: Menu = ["a", "b", "c"].into_iter().map(MenuItem::new).collect();
    assert_eq!(texts(&menu), ["a", "b", "c"]);
}

#[test]
fn generated_menu_follows_state() {
    let count = Arc::new(AtomicUsize::new(1));
    let source = count.clone();
    let menu = Menu::from_fn(move || {
        (0..source.load(Ordering::SeqCst))
            .map(|i| MenuItem::new(format!("Item {i}")))
            .collect()
    });

    assert_eq!(texts(&menu), ["Item 0"]);
    count.store(3, Ordering::SeqCst);
    assert_eq!(texts(&menu), ["Item 0", "Item 1", "Item 2"]);
    count.store(0, Ordering::SeqCst);
    assert!(!menu.is_visible());
}

#[test]
fn empty_menu_is_invisible() {
    assert!(!Menu::empty().is_visible());
    assert!(!Menu::default().is_visible());
    assert_eq!(Menu::empty().to_string(), "");
}

#[test]
fn separators_are_collapsed_and_trimmed() {
    let menu = Menu::new([
        MenuItem::separator(),
        MenuItem::new("one"),
        MenuItem::separator(),
        MenuItem::separator(),
        MenuItem::new("two"),
        MenuItem::separator(),
    ]);
    assert_eq!(texts(&menu), ["one", "- - - -", "two"]);
}

#[test]
fn hidden_items_are_skipped() {
    let shown = Arc::new(AtomicBool::new(false));
    let flag = shown.clone();
    let menu = Menu::new([
        MenuItem::new("always"),
        MenuItem::new("sometimes").visible_fn(move |_| flag.load(Ordering::SeqCst)),
    ]);

    assert_eq!(texts(&menu), ["always"]);
    shown.store(true, Ordering::SeqCst);
    assert_eq!(texts(&menu), ["always", "sometimes"]);
}

#[test]
fn submenu_visibility_follows_its_items() {
    let empty = MenuItem::submenu("Empty", Menu::new([MenuItem::new("x").visible(false)]));
    assert!(!empty.is_visible());

    let filled = MenuItem::submenu("Filled", Menu::new([MenuItem::new("x")]));
    assert!(filled.is_visible());
    assert!(!filled.clone().visible(false).is_visible());

    let menu = Menu::new([MenuItem::new("top"), empty, filled]);
    assert_eq!(texts(&menu), ["top", "Filled"]);
}

#[test]
fn submenu_item_exposes_its_menu() {
    let item = MenuItem::submenu("More", Menu::new([MenuItem::new("inner")]));
    let submenu = item.as_submenu().unwrap();
    assert_eq!(texts(submenu), ["inner"]);
    assert!(MenuItem::new("plain").as_submenu().is_none());
}

#[test]
fn submenu_item_does_not_activate() {
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let item = MenuItem::submenu(
        "More",
        Menu::new([MenuItem::new("inner").on_activate(move |_, _| {
            flag.store(true, Ordering::SeqCst);
        })]),
    );

    item.activate(&icon());
    assert!(!called.load(Ordering::SeqCst));
}

#[test]
fn default_item_is_the_first_flagged() {
    let menu = Menu::new([
        MenuItem::new("plain"),
        MenuItem::new("first").default(true),
        MenuItem::new("second").default(true),
    ]);
    assert_eq!(menu.default_item().unwrap().text(), "first");
    assert!(Menu::new([MenuItem::new("plain")]).default_item().is_none());
}

#[test]
fn default_flag_may_be_computed() {
    let first = Arc::new(AtomicBool::new(true));
    let flag = first.clone();
    let other = first.clone();
    let menu = Menu::new([
        MenuItem::new("one").default_fn(move |_| flag.load(Ordering::SeqCst)),
        MenuItem::new("two").default_fn(move |_| !other.load(Ordering::SeqCst)),
    ]);

    assert_eq!(menu.default_item().unwrap().text(), "one");
    first.store(false, Ordering::SeqCst);
    assert_eq!(menu.default_item().unwrap().text(), "two");
}

#[test]
fn activate_default_reports_whether_anything_ran() {
    let icon = icon();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let menu = Menu::new([
        MenuItem::new("other"),
        MenuItem::new("default").default(true).on_activate(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    ]);

    assert!(menu.activate_default(&icon));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!Menu::new([MenuItem::new("other")]).activate_default(&icon));
}

#[test]
fn enabled_may_be_computed() {
    let enabled = Arc::new(AtomicBool::new(false));
    let flag = enabled.clone();
    let item = MenuItem::new("Test").enabled_fn(move |_| flag.load(Ordering::SeqCst));

    assert!(!item.is_enabled());
    enabled.store(true, Ordering::SeqCst);
    assert!(item.is_enabled());
}

#[test]
fn checked_toggles_through_activation() {
    let icon = icon();
    let state = Arc::new(AtomicBool::new(false));
    let read = state.clone();
    let item = MenuItem::new("Toggle")
        .checked(move |_| read.load(Ordering::SeqCst))
        .on_activate(move |_, _| {
            state.fetch_xor(true, Ordering::SeqCst);
        });

    assert_eq!(item.check_state(), Some(false));
    item.activate(&icon);
    assert_eq!(item.check_state(), Some(true));
    item.activate(&icon);
    assert_eq!(item.check_state(), Some(false));
}

#[test]
fn radio_only_applies_to_checkable_items() {
    assert!(!MenuItem::new("plain").radio(true).is_radio());
    assert!(MenuItem::new("option").checked(|_| false).radio(true).is_radio());
}

#[test]
fn radio_group_selection() {
    let selected = Arc::new(AtomicUsize::new(0));
    let items: Vec<MenuItem> = (0..3)
        .map(|i| {
            let read = selected.clone();
            let write = selected.clone();
            MenuItem::new(format!("Option {i}"))
                .checked(move |_| read.load(Ordering::SeqCst) == i)
                .radio(true)
                .on_activate(move |_, _| write.store(i, Ordering::SeqCst))
        })
        .collect();
    let menu = Menu::new(items);
    let icon = icon();

    menu.visible_items()[2].activate(&icon);
    let states: Vec<Option<bool>> = menu.visible_items().iter().map(MenuItem::check_state).collect();
    assert_eq!(states, [Some(false), Some(false), Some(true)]);
}

#[test]
fn dynamic_text_is_reevaluated() {
    let count = Arc::new(AtomicUsize::new(0));
    let source = count.clone();
    let item = MenuItem::dynamic(move |_| format!("Clicked {} times", source.load(Ordering::SeqCst)));

    assert_eq!(item.text(), "Clicked 0 times");
    count.store(2, Ordering::SeqCst);
    assert_eq!(item.text(), "Clicked 2 times");
}

#[test]
fn menu_renders_with_indentation() {
    let menu = Menu::new([
        MenuItem::new("one"),
        MenuItem::separator(),
        MenuItem::submenu("more", Menu::new([MenuItem::new("two"), MenuItem::new("three")])),
    ]);
    assert_eq!(
        menu.to_string(),
        "    one\n    - - - -\n    more =>\n        two\n        three"
    );
}
