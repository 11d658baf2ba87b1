mod common;

use common::observation;
use storygen_app::domains::history::*;

#[test]
fn test_flush_due_once_per_cycle() {
    let mut window = EventHistoryWindow::new(10);
    let mut flushes = 0;
    for i in 0..25 {
        if window.push(observation(&format!("e{}", i))) == PushOutcome::FlushDue {
            flushes += 1;
        }
    }
    assert_eq!(flushes, 2);
    assert_eq!(window.counter(), 5);
    assert_eq!(window.len(), 10);
}

#[test]
fn test_tenth_push_triggers_flush() {
    let mut window = EventHistoryWindow::default();
    for i in 0..9 {
        assert_eq!(window.push(observation(&format!("e{}", i))), PushOutcome::Buffered);
    }
    assert_eq!(window.push(observation("e9")), PushOutcome::FlushDue);
    assert_eq!(window.counter(), 0);
    assert_eq!(window.len(), 10);
}

#[test]
fn test_fifo_eviction_keeps_latest() {
    let mut window = EventHistoryWindow::new(3);
    for id in ["a", "b", "c", "d", "e"] {
        window.push(observation(id));
    }
    let ids: Vec<_> = window.events().map(|e| e.target_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "d", "e"]);
}

#[test]
fn test_zero_capacity_is_raised() {
    let mut window = EventHistoryWindow::new(0);
    assert_eq!(window.capacity(), 1);
    assert_eq!(window.push(observation("a")), PushOutcome::FlushDue);
    assert_eq!(window.len(), 1);
}
