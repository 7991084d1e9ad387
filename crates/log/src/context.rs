//! Per-thread diagnostic context.
//!
//! A small string map attached to the current thread; providers snapshot
//! it into every event. The map does not flow into child threads by
//! itself: propagation is explicit through [`snapshot`]/[`attach`], or
//! [`spawn`] which copies the parent map into the new thread.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::thread::{self, JoinHandle};

/// Snapshot of the diagnostic context.
pub type ContextMap = BTreeMap<String, String>;

thread_local! {
    static CONTEXT: RefCell<ContextMap> = RefCell::new(ContextMap::new());
}

/// Sets a context entry on the current thread. An empty value removes the
/// entry.
pub fn put(name: &str, value: &str) {
    CONTEXT.with(|context| {
        let mut context = context.borrow_mut();
        if value.is_empty() {
            context.remove(name);
        } else {
            context.insert(name.to_string(), value.to_string());
        }
    });
}

pub fn remove(name: &str) {
    CONTEXT.with(|context| {
        context.borrow_mut().remove(name);
    });
}

pub fn get(name: &str) -> Option<String> {
    CONTEXT.with(|context| context.borrow().get(name).cloned())
}

pub fn clear() {
    CONTEXT.with(|context| context.borrow_mut().clear());
}

/// Copy of the current thread's context.
pub fn snapshot() -> ContextMap {
    CONTEXT.with(|context| context.borrow().clone())
}

/// Replaces the current thread's context with the given snapshot.
pub fn attach(map: ContextMap) {
    CONTEXT.with(|context| {
        *context.borrow_mut() = map;
    });
}

/// Spawns a named thread that starts with a copy of the caller's context.
pub fn spawn<F, T>(name: &str, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let parent = snapshot();
    thread::Builder::new().name(name.to_string()).spawn(move || {
        attach(parent);
        f()
    })
}
