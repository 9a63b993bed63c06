//! In-memory session store
//!
//! The map lock is held only long enough to find or insert a session
//! handle. Each session carries its own async mutex so one user's
//! generation call never blocks another user.

use super::{Session, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Time source for session timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Sessions keyed by user, alive for the lifetime of the process
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, SessionHandle>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Existing session for `user_id`, or a freshly defaulted one
    pub async fn get_or_create(&self, user_id: UserId) -> SessionHandle {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(&user_id) {
                return Arc::clone(handle);
            }
        }

        let mut sessions = self.sessions.write().await;
        let clock = &self.clock;
        Arc::clone(sessions.entry(user_id).or_insert_with(|| {
            tracing::info!(user_id = %user_id, "Creating session");
            Arc::new(Mutex::new(Session::new(user_id, clock.now())))
        }))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
