//! Tick-complete notifications.
//!
//! Listeners are called synchronously after every tick, in registration
//! order, with the raw elapsed time of that tick. A listener that returns an
//! error or panics is logged and skipped; the others still run and the
//! controller state is unaffected.

use std::panic::{catch_unwind, AssertUnwindSafe};

use bevy::log::warn;

use crate::error::ListenerError;

/// Handle returned by [`TickListeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Callback invoked after each tick with the elapsed seconds.
pub type TickListener = Box<dyn FnMut(f32) -> Result<(), ListenerError> + Send + Sync>;

/// Ordered list of tick listeners.
#[derive(Default)]
pub struct TickListeners {
    next_id: u64,
    entries: Vec<(ListenerId, TickListener)>,
}

impl std::fmt::Debug for TickListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickListeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl TickListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It runs after every listener registered before it.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(f32) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call every listener with `elapsed`. Returns the number of failures.
    pub fn notify(&mut self, elapsed: f32) -> usize {
        let mut failures = 0;
        for (id, listener) in &mut self.entries {
            match catch_unwind(AssertUnwindSafe(|| listener(elapsed))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    warn!("listener {:?}: {}", id, err);
                }
                Err(_) => {
                    failures += 1;
                    warn!("listener {:?} panicked during tick notification", id);
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<(u32, f32)>>>, impl Fn(u32) -> TickListener) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = log.clone();
            move |tag: u32| -> TickListener {
                let log = log.clone();
                Box::new(move |elapsed: f32| {
                    log.lock().unwrap().push((tag, elapsed));
                    Ok(())
                })
            }
        };
        (log, make)
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let (log, make) = recorder();
        let mut listeners = TickListeners::new();
        listeners.subscribe(make(1));
        listeners.subscribe(make(2));
        listeners.subscribe(make(3));

        assert_eq!(listeners.notify(0.016), 0);
        assert_eq!(*log.lock().unwrap(), vec![(1, 0.016), (2, 0.016), (3, 0.016)]);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let (log, make) = recorder();
        let mut listeners = TickListeners::new();
        listeners.subscribe(make(1));
        let second = listeners.subscribe(make(2));

        assert!(listeners.unsubscribe(second));
        assert!(!listeners.unsubscribe(second));
        assert_eq!(listeners.len(), 1);

        listeners.notify(0.5);
        assert_eq!(*log.lock().unwrap(), vec![(1, 0.5)]);
    }

    #[test]
    fn failing_listener_does_not_stop_others() {
        let (log, make) = recorder();
        let mut listeners = TickListeners::new();
        listeners.subscribe(|_| Err(ListenerError::new("nope")));
        listeners.subscribe(make(2));

        assert_eq!(listeners.notify(0.1), 1);
        assert_eq!(listeners.notify(0.2), 1);
        assert_eq!(*log.lock().unwrap(), vec![(2, 0.1), (2, 0.2)]);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let (log, make) = recorder();
        let mut listeners = TickListeners::new();
        listeners.subscribe(|_| panic!("listener exploded"));
        listeners.subscribe(make(7));

        assert_eq!(listeners.notify(0.25), 1);
        assert_eq!(*log.lock().unwrap(), vec![(7, 0.25)]);
    }
}
