use super::*;
use super::test_helpers::red_point;

use std::thread;

#[test]
fn new_store_is_empty() {
    let store = BoardStore::new();
    assert!(store.is_empty());
    assert!(store.snapshot().is_empty());
    assert_eq!(store.revision(), 0);
}

#[test]
fn submit_preserves_order() {
    let store = BoardStore::new();
    store.submit(DrawingAction::point(10.0, 20.0, "#ff0000"));
    store.submit(DrawingAction::point(30.0, 40.0, "#00ff00"));

    let snap = store.snapshot();
    assert_eq!(
        snap.to_vec(),
        vec![DrawingAction::point(10.0, 20.0, "#ff0000"), DrawingAction::point(30.0, 40.0, "#00ff00")]
    );
    assert!(snap.iter().all(|a| !a.clear));
}

#[test]
fn clear_flag_empties_board() {
    let store = BoardStore::new();
    store.submit(DrawingAction::point(10.0, 20.0, "#ff0000"));
    store.submit(DrawingAction { x: 0.0, y: 0.0, color: "#000000".into(), clear: true });
    assert!(store.snapshot().is_empty());
}

#[test]
fn clear_flag_action_is_never_stored() {
    let store = BoardStore::new();
    store.submit(DrawingAction { x: 5.0, y: 6.0, color: "#123456".into(), clear: true });
    store.submit(red_point(1.0, 2.0));

    let snap = store.snapshot();
    assert_eq!(snap.len(), 1);
    assert!(!snap[0].clear);
    assert_eq!(snap[0], red_point(1.0, 2.0));
}

#[test]
fn reset_on_fresh_store_is_empty() {
    let store = BoardStore::new();
    store.reset();
    assert!(store.snapshot().is_empty());
}

#[test]
fn reset_twice_stays_empty() {
    let store = BoardStore::new();
    store.submit(red_point(1.0, 1.0));
    store.reset();
    store.reset();
    assert!(store.is_empty());
    // Every mutation counts, even a no-op reset.
    assert_eq!(store.revision(), 3);
}

#[test]
fn snapshot_is_unaffected_by_later_mutations() {
    let store = BoardStore::new();
    store.submit(red_point(1.0, 1.0));
    let before = store.snapshot();

    store.submit(red_point(2.0, 2.0));
    assert_eq!(before.len(), 1);

    store.reset();
    assert_eq!(before.to_vec(), vec![red_point(1.0, 1.0)]);
    assert_eq!(before.revision(), 1);
    assert_eq!(store.snapshot().revision(), 3);
}

#[test]
fn snapshot_copy_does_not_write_back() {
    let store = BoardStore::new();
    store.submit(red_point(1.0, 1.0));

    let mut copy = store.snapshot().to_vec();
    copy.push(red_point(9.0, 9.0));
    copy[0].color = "#000000".into();

    assert_eq!(store.snapshot().to_vec(), vec![red_point(1.0, 1.0)]);
}

#[test]
fn clones_share_one_board() {
    let store = BoardStore::new();
    let handle = store.clone();
    handle.submit(red_point(3.0, 4.0));
    assert_eq!(store.len(), 1);
}

#[test]
fn history_limit_keeps_newest_actions() {
    let store = BoardStore::with_history_limit(NonZeroUsize::new(3));
    for i in 0..5_i32 {
        store.submit(red_point(f64::from(i), 0.0));
    }

    let xs: Vec<f64> = store.snapshot().iter().map(|a| a.x).collect();
    assert_eq!(xs, vec![2.0, 3.0, 4.0]);
}

#[test]
fn concurrent_submits_lose_nothing_and_keep_per_thread_order() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let store = BoardStore::new();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                let color = format!("#{t:06}");
                for i in 0..PER_THREAD {
                    #[allow(clippy::cast_precision_loss)]
                    store.submit(DrawingAction::point(i as f64, 0.0, color.clone()));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("submitter thread panicked");
    }

    let snap = store.snapshot();
    assert_eq!(snap.len(), THREADS * PER_THREAD);

    for t in 0..THREADS {
        let color = format!("#{t:06}");
        let xs: Vec<f64> = snap.iter().filter(|a| a.color == color).map(|a| a.x).collect();
        assert_eq!(xs.len(), PER_THREAD);
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "thread {t} actions out of order");
    }
}

#[test]
fn concurrent_snapshots_never_see_torn_state() {
    let store = BoardStore::new();
    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for i in 0..500_i32 {
                store.submit(red_point(f64::from(i), 0.0));
                if i % 50 == 49 {
                    store.reset();
                }
            }
        })
    };

    for _ in 0..500 {
        let snap = store.snapshot();
        // Between resets, the board is always a gap-free run of x values.
        assert!(snap.windows(2).all(|w| (w[1].x - w[0].x - 1.0).abs() < f64::EPSILON));
    }
    writer.join().expect("writer thread panicked");
    assert!(store.is_empty());
}

#[test]
fn drawing_action_deserializes_without_clear_flag() {
    let action: DrawingAction = serde_json::from_str(r##"{"x": 1.5, "y": 2, "color": "#abcdef"}"##).unwrap();
    assert_eq!(action, DrawingAction::point(1.5, 2.0, "#abcdef"));
}

#[test]
fn snapshot_serializes_as_action_list() {
    let store = BoardStore::new();
    store.submit(DrawingAction::point(10.0, 20.0, "#ff0000"));

    let json = serde_json::to_value(store.snapshot()).unwrap();
    assert_eq!(json, serde_json::json!([{"x": 10.0, "y": 20.0, "color": "#ff0000", "clear": false}]));
}

#[test]
fn app_state_shares_store_across_clones() {
    let state = test_helpers::test_app_state();
    let other = state.clone();
    other.board.submit(red_point(1.0, 1.0));
    assert_eq!(state.board.len(), 1);
}
