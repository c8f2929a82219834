use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    models::{role::Role, session::Session},
    storage::{KeyValueStore, StorageError},
};

const SESSION_KEY: &str = "session";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Role '{actual}' is not allowed here, '{required}' or above required")]
    Forbidden { required: Role, actual: Role },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Anything that must reset itself when the user signs out.
pub trait SessionEndListener: Send + Sync {
    fn on_session_end(&self);
}

/// Owns the persisted session record and tells registered listeners when it ends.
pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
    listeners: Mutex<Vec<Arc<dyn SessionEndListener>>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn on_session_end(&self, listener: Arc<dyn SessionEndListener>) {
        self.lock_listeners().push(listener);
    }

    /// Start a session. A session held by a different user is ended first, so its
    /// listeners reset before the new user takes over. Signing in again as the same
    /// user only refreshes the record.
    pub fn start(
        &self,
        username: &str,
        role: Role,
        department: Option<String>,
    ) -> Result<Session, SessionError> {
        if username.trim().is_empty() {
            return Err(SessionError::ValidationError {
                message: "Username is required".to_string(),
            });
        }

        let session = Session::new(username.to_string(), role, department);
        if let Some(previous) = self.current() {
            if previous.username != session.username {
                info!(
                    "{} signing in over {}, ending previous session",
                    session.username, previous.username
                );
                self.end()?;
            }
        }

        let json_data = serde_json::to_string_pretty(&session)?;
        self.store.set(SESSION_KEY, &json_data)?;

        info!("Session started for {} ({})", session.username, session.role);
        Ok(session)
    }

    /// A missing or unreadable record both read as "no session".
    pub fn current(&self) -> Option<Session> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read session record: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("Discarding unreadable session record: {}", e);
                None
            }
        }
    }

    pub fn require_role(&self, required: Role) -> Result<Session, SessionError> {
        let session = self.current().ok_or(SessionError::NotSignedIn)?;
        if !session.role.at_least(required) {
            warn!(
                "Access denied: {} ({}) needs {}",
                session.username, session.role, required
            );
            return Err(SessionError::Forbidden {
                required,
                actual: session.role,
            });
        }
        Ok(session)
    }

    /// Sign out: drop the record, then notify every listener. Listeners run even if
    /// the record could not be removed.
    pub fn end(&self) -> Result<(), SessionError> {
        info!("Ending session");
        let removed = self.store.remove(SESSION_KEY);

        let listeners: Vec<Arc<dyn SessionEndListener>> = self.lock_listeners().clone();
        for listener in &listeners {
            listener.on_session_end();
        }
        debug!("Notified {} session listeners", listeners.len());

        removed.map_err(SessionError::from)
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn SessionEndListener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
