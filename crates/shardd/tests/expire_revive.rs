mod helpers;
use helpers::{make_registry, registry_cfg};

use std::time::Duration;

use queryzilla_shard::content;
use shardd::registry::RegistryError;

#[test]
fn accessed_within_timeout_never_expires() {
    let t = make_registry(registry_cfg(10));
    let id = t.registry.create("text", content::ALL).unwrap();
    t.registry.page(&id, Some(0), 2).unwrap();

    // каждые 10с при таймауте 30с — курсор живёт
    for _ in 0..5 {
        t.clock.advance(Duration::from_secs(10));
        t.registry.sweep();
        t.registry.page(&id, None, 2).unwrap();
    }

    assert_eq!(t.registry.open_iterators(), 1);
    assert_eq!(t.registry.statuses()[0].state, "active");
}

#[test]
fn idle_past_timeout_expires_and_releases_iterator() {
    let t = make_registry(registry_cfg(10));
    let id = t.registry.create("text", content::ALL).unwrap();
    t.registry.page(&id, Some(0), 2).unwrap();
    assert_eq!(t.registry.open_iterators(), 1);

    t.clock.advance(Duration::from_secs(31));
    t.registry.sweep();

    let st = &t.registry.statuses()[0];
    assert_eq!(st.state, "expired");
    assert_eq!(st.id, id);
    assert_eq!(t.registry.open_iterators(), 0, "итератор должен быть освобождён");
    // запись сохранена для revive
    assert_eq!(t.registry.live_count(), 1);
}

#[test]
fn revive_serves_same_id_and_keeps_total() {
    let t = make_registry(registry_cfg(10));
    let id = t.registry.create("text", content::ALL).unwrap();

    let first = t.registry.page(&id, Some(0), 3).unwrap();
    assert_eq!(first.total, 20);
    assert_eq!(first.row, 2);

    t.clock.advance(Duration::from_secs(31));
    t.registry.sweep();
    assert_eq!(t.registry.statuses()[0].state, "expired");

    // revive: тот же id, продолжение без разрыва, total не пересчитан
    let out = t.registry.page(&id, None, 3).unwrap();
    assert_eq!(out.total, 20);
    assert_eq!(out.row, 5);
    assert_eq!(out.window, 3);
    assert_eq!(t.registry.live_count(), 1);
    assert_eq!(t.registry.statuses()[0].state, "active");
}

#[test]
fn created_cursor_does_not_expire() {
    let t = make_registry(registry_cfg(10));
    t.registry.create("text", content::ALL).unwrap();

    t.clock.advance(Duration::from_secs(3600));
    t.registry.sweep();

    assert_eq!(t.registry.live_count(), 1);
    assert_eq!(t.registry.statuses()[0].state, "created");
}

#[test]
fn flushed_cursor_is_gone() {
    let t = make_registry(registry_cfg(10));
    let id = t.registry.create("text", content::ALL).unwrap();

    assert!(t.registry.flush(&id));
    assert!(!t.registry.flush(&id), "повторный flush идемпотентен");

    let err = t.registry.page(&id, Some(0), 2).unwrap_err();
    assert!(matches!(err, RegistryError::CursorNotFound(_)));
}
