use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::analysis::controller::AnalysisController;

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_MAX_SESSIONS: usize = 1_000;

struct Entry {
    controller: Arc<AnalysisController>,
    last_touched: Instant,
}

/// Live analysis sessions, one controller each. Shared by all route handlers.
///
/// A client that walks away never closes its session, so sessions idle for
/// longer than `idle_ttl` are swept on every `open` and `get`, and opening
/// beyond `max_sessions` evicts the least recently touched one. Evicted
/// controllers are abandoned.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn open(&self, controller: AnalysisController) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions);

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(id, _)| *id)
            else {
                break;
            };
            if let Some(entry) = sessions.remove(&oldest) {
                entry.controller.abandon();
                debug!(session_id = %oldest, "evicted least recently used session");
            }
        }

        sessions.insert(
            id,
            Entry {
                controller: Arc::new(controller),
                last_touched: Instant::now(),
            },
        );
        debug!(session_id = %id, "analysis session opened");
        id
    }

    /// Looks up a session and marks it as recently used.
    pub fn get(&self, id: &Uuid) -> Option<Arc<AnalysisController>> {
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions);
        let entry = sessions.get_mut(id)?;
        entry.last_touched = Instant::now();
        Some(Arc::clone(&entry.controller))
    }

    /// Removes the session and abandons whatever it was doing.
    pub fn close(&self, id: &Uuid) -> bool {
        let Some(entry) = self.lock().remove(id) else {
            return false;
        };
        entry.controller.abandon();
        debug!(session_id = %id, "analysis session closed");
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // Sessions with a request in flight are kept until it settles.
    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Entry>) {
        let now = Instant::now();
        sessions.retain(|id, entry| {
            let expired = now.duration_since(entry.last_touched) >= self.idle_ttl
                && !entry.controller.snapshot().is_submitting();
            if expired {
                entry.controller.abandon();
                debug!(session_id = %id, "evicted idle session");
            }
            !expired
        });
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
