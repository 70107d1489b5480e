//! Session registry: the single owner of live MCP sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{Clock, SessionId, SystemClock};
use crate::error::CineConcertsError;
use crate::mcp::McpTransport;
use crate::Result;

/// Callback fired by a transport when it closes, with the session it served.
pub type CloseObserver = Box<dyn FnOnce(&SessionId) + Send>;

/// The part of a per-session transport the registry manages.
pub trait SessionTransport: Send + Sync + 'static {
    /// Close the transport. Must be idempotent.
    fn close(&self) -> Result<()>;

    /// Subscribe to the transport's closure.
    ///
    /// Observers fire once, whatever closed the transport. Subscribing to an
    /// already-closed transport fires the observer immediately.
    fn on_close(&self, observer: CloseObserver);
}

/// Limits applied by the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of concurrently live sessions.
    pub max_sessions: usize,
    /// Idle time after which a session is swept.
    pub ttl: Duration,
    /// How often the background sweeper runs.
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// A live session.
#[derive(Debug)]
pub struct Session<T> {
    /// Unique identifier.
    pub id: SessionId,
    /// Transport bound to this session.
    pub transport: Arc<T>,
    /// Time when session was created.
    pub created_at: Instant,
    /// Time of last activity.
    pub last_activity: Instant,
}

impl<T> Session<T> {
    /// Idle duration as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.idle_for(now) > ttl
    }
}

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            transport: Arc::clone(&self.transport),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }
}

type SessionMap<T> = HashMap<SessionId, Session<T>>;

/// Thread-safe registry of live sessions.
///
/// Every operation takes the map lock once and releases it before touching
/// a transport, so closing a transport (and the close notification it fires
/// back into the registry) never runs under the lock.
pub struct SessionRegistry<T = McpTransport> {
    sessions: Arc<RwLock<SessionMap<T>>>,
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
}

impl<T: SessionTransport> SessionRegistry<T> {
    /// Create an empty registry on the system clock.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty registry with an injected clock.
    pub fn with_clock(config: RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Look up a live session. No side effects.
    pub fn resolve(&self, id: &SessionId) -> Result<Option<Session<T>>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CineConcertsError::LockPoisoned)?;
        Ok(sessions.get(id).cloned())
    }

    /// Mark a session as active now.
    ///
    /// Returns `false` (and creates nothing) if the session doesn't exist.
    pub fn touch(&self, id: &SessionId) -> Result<bool> {
        let now = self.clock.now();
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CineConcertsError::LockPoisoned)?;

        match sessions.get_mut(id) {
            Some(session) => {
                session.last_activity = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Register a new session whose transport is built by `make_transport`.
    ///
    /// Fails with [`CineConcertsError::CapacityExceeded`] when the registry is
    /// full; the live set is left untouched in that case.
    pub fn create<F>(&self, make_transport: F) -> Result<Session<T>>
    where
        F: FnOnce(SessionId) -> T,
    {
        let session = {
            let mut sessions = self
                .sessions
                .write()
                .map_err(|_| CineConcertsError::LockPoisoned)?;

            if sessions.len() >= self.config.max_sessions {
                return Err(CineConcertsError::CapacityExceeded {
                    max: self.config.max_sessions,
                });
            }

            let mut id = SessionId::new();
            while sessions.contains_key(&id) {
                id = SessionId::new();
            }

            let now = self.clock.now();
            let session = Session {
                id,
                transport: Arc::new(make_transport(id)),
                created_at: now,
                last_activity: now,
            };
            sessions.insert(id, session.clone());
            session
        };

        self.subscribe_to_close(&session.transport);
        info!(session_id = %session.id, active = self.len(), "Session created");
        Ok(session)
    }

    fn subscribe_to_close(&self, transport: &T) {
        let sessions = Arc::downgrade(&self.sessions);
        transport.on_close(Box::new(move |id: &SessionId| {
            let Some(sessions) = sessions.upgrade() else {
                return;
            };
            let removed = sessions
                .write()
                .map(|mut s| s.remove(id).is_some())
                .unwrap_or(false);
            if removed {
                info!(session_id = %id, "Session closed by transport");
            }
        }));
    }

    /// Remove a session and close its transport.
    ///
    /// Idempotent: returns `false` if the session was already gone.
    pub fn remove(&self, id: &SessionId) -> Result<bool> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| CineConcertsError::LockPoisoned)?
            .remove(id);

        match removed {
            Some(session) => {
                close_quietly(&session);
                info!(session_id = %id, "Session removed");
                Ok(true)
            }
            None => {
                debug!(session_id = %id, "Session already removed");
                Ok(false)
            }
        }
    }

    /// Remove every session idle for longer than the TTL as of `now`.
    ///
    /// Returns the number of sessions removed.
    pub fn sweep(&self, now: Instant) -> Result<usize> {
        let expired: Vec<Session<T>> = {
            let mut sessions = self
                .sessions
                .write()
                .map_err(|_| CineConcertsError::LockPoisoned)?;

            let ids: Vec<SessionId> = sessions
                .values()
                .filter(|s| s.is_expired(now, self.config.ttl))
                .map(|s| s.id)
                .collect();

            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for session in &expired {
            info!(
                session_id = %session.id,
                idle_secs = session.idle_for(now).as_secs(),
                "Purging idle session"
            );
            close_quietly(session);
        }

        Ok(expired.len())
    }

    /// Sweep against the registry's own clock.
    pub fn sweep_expired(&self) -> Result<usize> {
        self.sweep(self.clock.now())
    }

    /// Remove and close every session. Used on shutdown.
    pub fn close_all(&self) -> Result<usize> {
        let drained: Vec<Session<T>> = self
            .sessions
            .write()
            .map_err(|_| CineConcertsError::LockPoisoned)?
            .drain()
            .map(|(_, s)| s)
            .collect();

        for session in &drained {
            close_quietly(session);
        }

        Ok(drained.len())
    }

    /// Get the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all live session IDs.
    pub fn ids(&self) -> Result<Vec<SessionId>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CineConcertsError::LockPoisoned)?;
        Ok(sessions.keys().copied().collect())
    }
}

fn close_quietly<T: SessionTransport>(session: &Session<T>) {
    if let Err(e) = session.transport.close() {
        warn!(session_id = %session.id, error = %e, "Failed to close transport");
    }
}
