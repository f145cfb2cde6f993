//! Integration tests for the signal dispatch system.
//!
//! Tests cover: connect/send, payload filtering, disconnect, multiple
//! handlers, ordering and cross-thread dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use formwork_signals::Signal;

#[derive(Debug)]
struct FieldEvent {
    field_id: String,
    value: String,
}

// ═════════════════════════════════════════════════════════════════════
// 1. Handler receives the payload
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_connect_and_send_receives_data() {
    let signal: Signal<FieldEvent> = Signal::new();
    let received = Arc::new(Mutex::new(String::new()));
    let received_clone = received.clone();

    signal.connect(
        "capture",
        Arc::new(move |event: &FieldEvent| {
            *received_clone.lock().unwrap() = event.value.clone();
        }),
    );

    signal.send(&FieldEvent {
        field_id: "name".into(),
        value: "hello world".into(),
    });
    assert_eq!(*received.lock().unwrap(), "hello world");
}

// ═════════════════════════════════════════════════════════════════════
// 2. Receivers filter on payload content
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_payload_filtering() {
    let signal: Signal<FieldEvent> = Signal::new();
    let email_count = Arc::new(AtomicUsize::new(0));

    let ec = email_count.clone();
    signal.connect(
        "email_listener",
        Arc::new(move |event: &FieldEvent| {
            if event.field_id == "email" {
                ec.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    for id in ["email", "name", "email"] {
        signal.send(&FieldEvent {
            field_id: id.into(),
            value: String::new(),
        });
    }
    assert_eq!(email_count.load(Ordering::SeqCst), 2);
}

// ═════════════════════════════════════════════════════════════════════
// 3. Receivers run in connection order
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_receivers_run_in_order() {
    let signal: Signal<()> = Signal::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let o = order.clone();
        signal.connect(
            name,
            Arc::new(move |(): &()| {
                o.lock().unwrap().push(name);
            }),
        );
    }

    signal.send(&());
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Disconnected receivers stop firing
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_disconnect_stops_delivery() {
    let signal: Signal<i32> = Signal::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();

    let id = signal.subscribe(Arc::new(move |_: &i32| {
        c.fetch_add(1, Ordering::SeqCst);
    }));

    signal.send(&1);
    assert!(signal.disconnect(&id));
    signal.send(&2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

// ═════════════════════════════════════════════════════════════════════
// 5. Dispatch from another thread
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_send_across_threads() {
    let signal: Arc<Signal<usize>> = Arc::new(Signal::new());
    let total = Arc::new(AtomicUsize::new(0));
    let t = total.clone();

    signal.connect(
        "sum",
        Arc::new(move |n: &usize| {
            t.fetch_add(*n, Ordering::SeqCst);
        }),
    );

    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let s = signal.clone();
            std::thread::spawn(move || {
                s.send(&n);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(total.load(Ordering::SeqCst), 10);
}
