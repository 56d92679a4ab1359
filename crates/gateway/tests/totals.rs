mod helpers;
use helpers::{FakeShard, FakeTransport};

use gateway::{GatherError, ScatterGatherCursor};
use queryzilla_shard::content;

fn text(cur: &ScatterGatherCursor) -> String {
    cur.current().unwrap().text.clone().unwrap()
}

#[tokio::test]
async fn all_zero_totals_mean_no_results_without_error() {
    let t = FakeTransport::new(vec![
        ("s0", FakeShard::with_docs("a", 0)),
        ("s1", FakeShard::with_docs("b", 0)),
    ]);
    let addrs = vec!["s0".to_string(), "s1".to_string()];

    let mut cur = ScatterGatherCursor::begin(t, &addrs, "q", content::ALL, 4)
        .await
        .unwrap();

    assert_eq!(cur.global_total(), 0);
    assert!(!cur.next().await.unwrap());
    assert!(!cur.next().await.unwrap());
    assert!(matches!(cur.current(), Err(GatherError::InvalidCursorState)));
}

#[tokio::test]
async fn concatenation_order_with_empty_middle_shard() {
    // totals [5, 0, 3]: строки 0..4 -> шард 0, строки 5..7 -> шард 2
    let t = FakeTransport::new(vec![
        ("s0", FakeShard::with_docs("s0", 5)),
        ("s1", FakeShard::with_docs("s1", 0)),
        ("s2", FakeShard::with_docs("s2", 3)),
    ]);
    let addrs = vec!["s0".to_string(), "s1".to_string(), "s2".to_string()];

    let mut cur = ScatterGatherCursor::begin(t, &addrs, "q", content::ALL, 2)
        .await
        .unwrap();
    assert_eq!(cur.global_total(), 8);

    let mut seen = Vec::new();
    while cur.next().await.unwrap() {
        seen.push(text(&cur));
    }
    assert_eq!(
        seen,
        vec!["s0-0", "s0-1", "s0-2", "s0-3", "s0-4", "s2-0", "s2-1", "s2-2"]
    );
    assert_eq!(cur.global_row(), 8, "позиция за последней строкой");
    assert!(matches!(cur.current(), Err(GatherError::InvalidCursorState)));
}

#[tokio::test]
async fn current_before_first_next_is_an_error() {
    let t = FakeTransport::new(vec![("s0", FakeShard::with_docs("s0", 2))]);
    let addrs = vec!["s0".to_string()];

    let mut cur = ScatterGatherCursor::begin(t, &addrs, "q", content::ALL, 4)
        .await
        .unwrap();
    assert!(matches!(cur.current(), Err(GatherError::InvalidCursorState)));

    assert!(cur.next().await.unwrap());
    assert_eq!(text(&cur), "s0-0");
}

#[tokio::test]
async fn window_refill_uses_one_call_per_page() {
    let t = FakeTransport::new(vec![("s0", FakeShard::with_docs("s0", 5))]);
    let addrs = vec!["s0".to_string()];

    let mut cur = ScatterGatherCursor::begin(t.clone(), &addrs, "q", content::ALL, 2)
        .await
        .unwrap();
    while cur.next().await.unwrap() {}

    // 1 warm + 3 страницы по 2 (2+2+1)
    assert_eq!(t.calls.lock().len(), 4);
}

#[tokio::test]
async fn empty_page_before_declared_total_does_not_loop() {
    // шард заявляет total 5, но документов только 3: после клэмпа
    // переходим к следующему шарду, а не зацикливаемся
    let mut lying = FakeShard::with_docs("s0", 3);
    lying.total = 5;
    let t = FakeTransport::new(vec![
        ("s0", lying),
        ("s1", FakeShard::with_docs("s1", 2)),
    ]);
    let addrs = vec!["s0".to_string(), "s1".to_string()];

    let mut cur = ScatterGatherCursor::begin(t, &addrs, "q", content::ALL, 10)
        .await
        .unwrap();

    let mut seen = Vec::new();
    while cur.next().await.unwrap() {
        seen.push(text(&cur));
    }
    assert_eq!(seen, vec!["s0-0", "s0-1", "s0-2", "s1-0", "s1-1"]);
}

#[tokio::test]
async fn overdeclared_page_size_is_clamped_to_observed() {
    let mut s = FakeShard::with_docs("s0", 4);
    s.overdeclare = 2; // size в статусе врёт в большую сторону
    let t = FakeTransport::new(vec![("s0", s)]);
    let addrs = vec!["s0".to_string()];

    let mut cur = ScatterGatherCursor::begin(t, &addrs, "q", content::ALL, 10)
        .await
        .unwrap();

    let mut n = 0;
    while cur.next().await.unwrap() {
        n += 1;
    }
    assert_eq!(n, 4, "верим фактическому числу документов, не заявленному");
}
