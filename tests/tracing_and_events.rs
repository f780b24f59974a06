//! Integration tests for tracing and event monitoring.
//!
//! This test demonstrates how to use the per-map tracing callback to observe
//! construction, waiting, and failures.

use service_locator::{Locator, ServiceLocator, SingletonError, SingletonMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

fn record(map: &SingletonMap<&'static str>) -> Arc<Mutex<Vec<String>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();

    map.set_trace_callback(move |event| {
        events_clone.lock().unwrap().push(event.to_string());
    });

    events
}

#[test]
fn test_basic_tracing() {
    let map = SingletonMap::new();
    let events = record(&map);

    let _ = map.get_value("answer", || 42i32).unwrap();
    let _ = map.get_value("answer", || 0i32).unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "construct { key: \"answer\", type_name: i32 }",
            "ready { key: \"answer\", type_name: i32 }",
            "get { key: \"answer\", type_name: i32, waited: false }",
        ]
    );
}

#[test]
fn test_trace_failed_construction() {
    let map = SingletonMap::new();
    let events = record(&map);

    let _ = map.try_get_value::<u32, SingletonError, _>("port", || {
        Err(SingletonError::InvalidBucketCount)
    });

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert!(captured[0].starts_with("construct"));
    assert_eq!(captured[1], "failed { key: \"port\", type_name: u32 }");
}

#[test]
fn test_trace_panicked_construction() {
    let map = SingletonMap::new();
    let events = record(&map);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = map.get_value("flaky", || -> u8 { panic!("boom") });
    }));
    assert!(result.is_err());

    let _ = map.get_value("flaky", || 3u8).unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "construct { key: \"flaky\", type_name: u8 }",
            "failed { key: \"flaky\", type_name: u8 }",
            "construct { key: \"flaky\", type_name: u8 }",
            "ready { key: \"flaky\", type_name: u8 }",
        ]
    );
}

#[test]
fn test_type_mismatch_emits_no_get() {
    let map = SingletonMap::new();
    let _ = map.get_value("port", || 8080u16).unwrap();

    let events = record(&map);
    let result = map.get_value("port", || 1.0f32);
    assert!(result.is_err());

    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn test_trace_nested_construction_order() {
    let map = SingletonMap::with_bucket_count(1).unwrap();
    let events = record(&map);

    let _ = map
        .try_get_value::<String, SingletonError, _>("outer", || {
            let inner = map.get_value("inner", || 1u8)?;
            Ok(format!("outer-{inner}"))
        })
        .unwrap();

    let captured = events.lock().unwrap();
    let kinds: Vec<&str> = captured
        .iter()
        .map(|e| e.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(kinds, vec!["construct", "construct", "ready", "ready"]);
    assert!(captured[1].contains("\"inner\""));
    assert!(captured[3].contains("\"outer\""));
}

#[test]
fn test_callback_may_use_the_map() {
    let map: Arc<SingletonMap<&'static str>> =
        Arc::new(SingletonMap::with_bucket_count(1).unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let map_clone = Arc::downgrade(&map);
    let seen_clone = seen.clone();
    map.set_trace_callback(move |_| {
        if let Some(map) = map_clone.upgrade() {
            seen_clone.lock().unwrap().push(map.contains(&"answer"));
        }
    });

    let _ = map.get_value("answer", || 42i32).unwrap();

    // construct, then ready
    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

#[test]
fn test_clear_trace_callback() {
    let map = SingletonMap::new();
    let events = record(&map);

    let _ = map.get_value("first", || 1u8).unwrap();
    map.clear_trace_callback();
    let _ = map.get_value("second", || 2u8).unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert!(captured.iter().all(|e| e.contains("\"first\"")));
}

#[test]
fn test_locator_map_can_be_traced() {
    let locator = ServiceLocator::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();

    locator.singletons().set_trace_callback(move |event| {
        events_clone.lock().unwrap().push(event.to_string());
    });

    let _ = locator.singleton("config", || "debug".to_string()).unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(
        captured[0],
        "construct { key: \"config\", type_name: alloc::string::String }"
    );
}
