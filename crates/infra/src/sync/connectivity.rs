//! Online/offline state with edge-triggered notifications

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::info;

type Listener = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    state: watch::Sender<bool>,
    on_online: RwLock<Vec<Listener>>,
    on_offline: RwLock<Vec<Listener>>,
}

/// Shared connectivity flag
///
/// Clones observe the same state. Setting the current value again is a
/// no-op: subscribers and listeners only see transitions.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<Inner>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        Self {
            inner: Arc::new(Inner {
                state,
                on_online: RwLock::new(Vec::new()),
                on_offline: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.inner.state.borrow()
    }

    /// Record the current state; returns whether it changed
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.inner.state.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });

        if changed {
            info!(online, "connectivity changed");
            let listeners = if online {
                self.inner.on_online.read().clone()
            } else {
                self.inner.on_offline.read().clone()
            };
            for listener in listeners {
                listener();
            }
        }
        changed
    }

    /// Receiver that wakes on every transition
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.state.subscribe()
    }

    /// Run `listener` on every offline to online transition
    pub fn on_online(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner.on_online.write().push(Arc::new(listener));
    }

    /// Run `listener` on every online to offline transition
    pub fn on_offline(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner.on_offline.write().push(Arc::new(listener));
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor").field("online", &self.is_online()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn listeners_fire_on_edges_only() {
        let monitor = ConnectivityMonitor::new(true);
        let online = Arc::new(AtomicUsize::new(0));
        let offline = Arc::new(AtomicUsize::new(0));
        {
            let online = Arc::clone(&online);
            monitor.on_online(move || {
                online.fetch_add(1, Ordering::SeqCst);
            });
            let offline = Arc::clone(&offline);
            monitor.on_offline(move || {
                offline.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(!monitor.set_online(true));
        assert!(monitor.set_online(false));
        assert!(!monitor.set_online(false));
        assert!(monitor.set_online(true));

        assert_eq!(online.load(Ordering::SeqCst), 1);
        assert_eq!(offline.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        let clone = monitor.clone();
        clone.set_online(true);

        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        assert!(monitor.is_online());

        monitor.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
