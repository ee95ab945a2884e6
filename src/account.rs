//! Account/session state
//!
//! Holds the signed-in session and notifies registered observers when it
//! changes. Loaders consult `has_account` as their precondition; the
//! transport reads the access token for the bearer header.

use std::sync::{RwLock, Weak};

/// Observer of account-state changes. Registered as `Weak` so a dropped
/// observer silently falls out of the list.
pub trait AccountObserver: Send + Sync {
    fn account_changed(&self, signed_in: bool);
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
}

/// Session holder shared between the model layer and the transport
#[derive(Default)]
pub struct AccountManager {
    session: RwLock<Option<Session>>,
    observers: RwLock<Vec<Weak<dyn AccountObserver>>>,
}

impl AccountManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_account(&self) -> bool {
        self.session.read().unwrap().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub fn set_session(&self, session: Session) {
        *self.session.write().unwrap() = Some(session);
        self.notify(true);
    }

    pub fn clear_session(&self) {
        *self.session.write().unwrap() = None;
        self.notify(false);
    }

    pub fn add_observer(&self, observer: Weak<dyn AccountObserver>) {
        self.observers.write().unwrap().push(observer);
    }

    fn notify(&self, signed_in: bool) {
        let mut observers = self.observers.write().unwrap();
        observers.retain(|weak| match weak.upgrade() {
            Some(observer) => {
                observer.account_changed(signed_in);
                true
            }
            None => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Recorder {
        changes: AtomicUsize,
    }

    impl AccountObserver for Recorder {
        fn account_changed(&self, _signed_in: bool) {
            self.changes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_has_account() {
        let manager = AccountManager::new();
        assert!(!manager.has_account());
        manager.set_session(Session {
            access_token: "token".to_string(),
        });
        assert!(manager.has_account());
        assert_eq!(manager.access_token().as_deref(), Some("token"));
        manager.clear_session();
        assert!(!manager.has_account());
    }

    #[test]
    fn test_observers_notified() {
        let manager = AccountManager::new();
        let recorder = Arc::new(Recorder {
            changes: AtomicUsize::new(0),
        });
        let observer = Arc::downgrade(&recorder) as Weak<dyn AccountObserver>;
        manager.add_observer(observer);

        manager.set_session(Session {
            access_token: "t".to_string(),
        });
        manager.clear_session();
        assert_eq!(recorder.changes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dead_observers_pruned() {
        let manager = AccountManager::new();
        let recorder = Arc::new(Recorder {
            changes: AtomicUsize::new(0),
        });
        let observer = Arc::downgrade(&recorder) as Weak<dyn AccountObserver>;
        manager.add_observer(observer);
        drop(recorder);

        // Must not panic, and the dead entry is dropped from the list.
        manager.set_session(Session {
            access_token: "t".to_string(),
        });
        assert!(manager.observers.read().unwrap().is_empty());
    }
}
