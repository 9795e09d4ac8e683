use log::info;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use super::types::{ConnectionState, Notification, Session};

pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;
pub type StateChangeHandler = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// State shared between the caller and the background SSE reader.
///
/// The reader is the only writer of `session`; everything else only reads it
/// or clears it after the reader has been joined.
pub(crate) struct SharedState {
    base_url: String,
    state: Mutex<ConnectionState>,
    session: Mutex<Option<Session>>,
    on_notification: RwLock<Option<NotificationHandler>>,
    on_state_change: RwLock<Option<StateChangeHandler>>,
}

impl SharedState {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            state: Mutex::new(ConnectionState::Disconnected),
            session: Mutex::new(None),
            on_notification: RwLock::new(None),
            on_state_change: RwLock::new(None),
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Records a transition and fires the state-change handler. Writing the
    /// current state again is a no-op.
    pub(crate) fn set_state(&self, new_state: ConnectionState) {
        {
            let mut state = self.state.lock();
            if *state == new_state {
                return;
            }
            info!("Connection state changed: {} -> {}", *state, new_state);
            *state = new_state;
        }

        // Cloned out so the handler runs without any lock held.
        let handler = self.on_state_change.read().clone();
        if let Some(handler) = handler {
            handler(new_state);
        }
    }

    pub(crate) fn session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// Stores the session handed out by the server. Returns false when this
    /// connection already has one.
    pub(crate) fn establish_session(&self, session: Session) -> bool {
        let mut current = self.session.lock();
        if current.is_some() {
            return false;
        }
        *current = Some(session);
        true
    }

    pub(crate) fn clear_session(&self) {
        self.session.lock().take();
    }

    pub(crate) fn notify(&self, notification: &Notification) {
        let handler = self.on_notification.read().clone();
        if let Some(handler) = handler {
            handler(notification);
        }
    }

    pub(crate) fn set_notification_handler(&self, handler: Option<NotificationHandler>) {
        *self.on_notification.write() = handler;
    }

    pub(crate) fn set_state_change_handler(&self, handler: Option<StateChangeHandler>) {
        *self.on_state_change.write() = handler;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_handler_fires_only_on_change() {
        let shared = SharedState::new("http://localhost:8000");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        shared.set_state_change_handler(Some(Arc::new(move |state: ConnectionState| {
            sink.lock().push(state)
        })));

        shared.set_state(ConnectionState::Connecting);
        shared.set_state(ConnectionState::Connecting);
        shared.set_state(ConnectionState::Connected);
        shared.set_state(ConnectionState::Disconnected);

        assert_eq!(
            *seen.lock(),
            vec![
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Disconnected
            ]
        );
    }

    #[test]
    fn test_session_is_established_once() {
        let shared = SharedState::new("http://localhost:8000");
        let first = Session {
            session_id: "a".to_string(),
            message_endpoint: "http://localhost:8000/messages?sessionId=a".to_string(),
        };
        let second = Session {
            session_id: "b".to_string(),
            message_endpoint: "http://localhost:8000/messages?sessionId=b".to_string(),
        };

        assert!(shared.establish_session(first.clone()));
        assert!(!shared.establish_session(second));
        assert_eq!(shared.session(), Some(first));

        shared.clear_session();
        assert!(shared.session().is_none());
    }
}
