//! Generation tracking and concurrent access tests

use std::sync::{Arc, Barrier};
use std::thread;

use rvoip_dialog_registry::{
    DialogDirection, DialogRegistry, DialogState, PartyHeader, RegistryConfig, RegistryError,
    SipMessage,
};

#[derive(Debug)]
struct Request {
    call_id: Option<String>,
    from: Option<PartyHeader>,
    to: Option<PartyHeader>,
}

impl Request {
    fn new(call_id: &str, from_tag: &str, to_tag: &str) -> Self {
        Self {
            call_id: Some(call_id.to_string()),
            from: Some(PartyHeader::new("sip:bob@example.com").with_tag(from_tag)),
            to: Some(PartyHeader::new("sip:alice@example.com").with_tag(to_tag)),
        }
    }
}

impl SipMessage for Request {
    fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    fn from_header(&self) -> Option<&PartyHeader> {
        self.from.as_ref()
    }

    fn to_header(&self) -> Option<&PartyHeader> {
        self.to.as_ref()
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rvoip_dialog_registry=debug")
        .with_test_writer()
        .try_init();
}

fn incoming_dialog(registry: &DialogRegistry, call_id: &str) -> rvoip_dialog_registry::DialogRef {
    let dialog = registry.create_dialog(DialogDirection::Incoming, false).unwrap();
    {
        let mut guard = dialog.lock().unwrap();
        guard.set_call_id(call_id).unwrap();
        guard.set_remote_tag("bob-1").unwrap();
        guard.set_local_tag("alice-1").unwrap();
        guard.set_state(DialogState::Connected);
        registry.insert(&guard).unwrap();
    }
    dialog
}

/// Test that a reference found by message goes stale after a reset
#[test]
fn test_find_by_message_detects_reset() {
    let registry = DialogRegistry::new(RegistryConfig::new(4)).unwrap();
    let dialog = incoming_dialog(&registry, "stale@host");

    let bye = Request::new("stale@host", "bob-1", "alice-1");
    let (found, generation) = registry
        .find_by_message(&bye, DialogDirection::Incoming, true)
        .unwrap()
        .expect("dialog for BYE");
    assert_eq!(found, dialog);
    assert_eq!(generation, dialog.generation());
    assert!(found.verify_validity());

    // Another thread reuses the record for a new dialog
    let new_generation = {
        let mut guard = dialog.lock().unwrap();
        let new_generation = registry.reset(&mut guard).unwrap();
        assert_eq!(guard.state(), DialogState::Idle);
        assert!(!guard.is_linked());
        assert!(guard.call_id().is_none());
        guard.set_call_id("fresh@host").unwrap();
        registry.insert(&guard).unwrap();
        new_generation
    };
    assert_ne!(new_generation, generation);

    assert!(!found.is_current());
    assert!(found.lock().is_none());
    assert!(!found.verify_validity());
    assert!(registry
        .find_by_message(&bye, DialogDirection::Incoming, true)
        .unwrap()
        .is_none());
    assert_eq!(registry.resources().dialogs.in_use, 1);
}

/// Test that a message without Call-ID cannot be looked up
#[test]
fn test_find_by_message_requires_headers() {
    let registry = DialogRegistry::new(RegistryConfig::new(1)).unwrap();
    let mut request = Request::new("x@host", "a", "b");
    request.call_id = None;
    let err = registry
        .find_by_message(&request, DialogDirection::Incoming, false)
        .unwrap_err();
    assert!(matches!(err, RegistryError::MessageKey { .. }));
}

/// Test that terminated dialogs are found but fail validity checks
#[test]
fn test_terminated_dialog_is_not_valid() {
    let registry = DialogRegistry::new(RegistryConfig::new(1)).unwrap();
    let dialog = incoming_dialog(&registry, "done@host");
    dialog.lock().unwrap().set_state(DialogState::Terminated);

    let bye = Request::new("done@host", "bob-1", "alice-1");
    let (found, _) = registry
        .find_by_message(&bye, DialogDirection::Incoming, true)
        .unwrap()
        .unwrap();
    assert!(found.is_current());
    assert!(!found.verify_validity());
}

/// Test that concurrent inserts of equal identities index exactly one record
#[test]
fn test_concurrent_duplicate_inserts() {
    init_logging();
    const THREADS: usize = 8;
    let registry = Arc::new(DialogRegistry::new(RegistryConfig::new(THREADS)).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let dialog = registry.create_dialog(DialogDirection::Incoming, false).unwrap();
                let mut guard = dialog.lock().unwrap();
                guard.set_call_id("race@host").unwrap();
                guard.set_remote_tag("caller").unwrap();
                guard.set_local_tag("callee").unwrap();
                barrier.wait();
                registry.insert(&guard).is_ok()
            })
        })
        .collect();

    let inserted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(inserted, 1);
    assert_eq!(registry.resources().hash_entries, 1);
}

/// Test lookups racing with resets never hand out a usable stale record
#[test]
fn test_lookups_racing_with_resets() {
    init_logging();
    let registry = Arc::new(DialogRegistry::new(RegistryConfig::new(2)).unwrap());
    let dialog = incoming_dialog(&registry, "busy@host");

    let resetter = {
        let registry = Arc::clone(&registry);
        let mut current = dialog.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let next = {
                    let Some(mut guard) = current.lock() else { break };
                    registry.reset(&mut guard).unwrap();
                    guard.set_call_id("busy@host").unwrap();
                    guard.set_remote_tag("bob-1").unwrap();
                    guard.set_local_tag("alice-1").unwrap();
                    registry.insert(&guard).unwrap();
                    guard.dialog_ref()
                };
                current = next;
            }
            current
        })
    };

    let bye = Request::new("busy@host", "bob-1", "alice-1");
    for _ in 0..200 {
        if let Some((found, generation)) = registry
            .find_by_message(&bye, DialogDirection::Incoming, true)
            .unwrap()
        {
            if let Some(guard) = found.lock() {
                assert_eq!(guard.generation(), generation);
            }
        }
    }
    let last = resetter.join().unwrap();
    assert!(last.is_current());
    assert!(!dialog.is_current());
}
