use kw_domain::config::SessionConfig;
use kw_domain::model::{Id, Timestamp};
use kw_event_bus::EventBus;
use kw_kernel::events::{CloseReason, SessionEvent};
use kw_kernel::{now_millis, safe_nanoid};
use moka::notification::RemovalCause;
use moka::sync::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const TOKEN_LENGTH: usize = 32;

/// An open web service session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: Id,
    pub user_name: String,
    pub session_type: i32,
    pub ip_address: IpAddr,
    pub login_time: Timestamp,
}

/// Open sessions keyed by token. Idle sessions expire on their own.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cache: Cache<String, Arc<Session>>,
    events: EventBus,
    /// Serializes logins so that finding and replacing a user's session is one step.
    logins: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(config: &SessionConfig, events: EventBus) -> Self {
        let listener_events = events.clone();
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_idle(Duration::from_secs(config.idle_timeout_seconds.max(1)))
            .eviction_listener(move |_token: Arc<String>, session: Arc<Session>, cause| {
                if matches!(cause, RemovalCause::Expired | RemovalCause::Size) {
                    debug!(user = %session.user_name, ?cause, "Session evicted");
                    publish(&listener_events, &session, CloseReason::Expired);
                }
            })
            .build();
        Self { cache, events, logins: Arc::default() }
    }

    /// Opens a session, closing any session of the same user and type. Returns the new
    /// session and the one it replaced.
    pub fn open(
        &self,
        user_id: &str,
        user_name: &str,
        session_type: i32,
        ip_address: IpAddr,
    ) -> (Arc<Session>, Option<Arc<Session>>) {
        let login = self.logins.lock();
        let replaced = self
            .cache
            .iter()
            .find(|(_, s)| s.user_id == user_id && s.session_type == session_type)
            .map(|(_, s)| s);
        if let Some(previous) = &replaced {
            self.cache.invalidate(&previous.token);
            publish(&self.events, previous, CloseReason::Replaced);
        }

        let session = Arc::new(Session {
            token: safe_nanoid!(TOKEN_LENGTH),
            user_id: user_id.to_owned(),
            user_name: user_name.to_owned(),
            session_type,
            ip_address,
            login_time: now_millis(),
        });
        self.cache.insert(session.token.clone(), Arc::clone(&session));
        drop(login);
        if let Err(error) = self.events.publish(SessionEvent::Opened {
            user_name: user_name.to_owned(),
            session_type,
            ip: ip_address,
        }) {
            warn!(%error, "Session event dropped");
        }
        (session, replaced)
    }

    /// Looks a session up, refreshing its idle timer.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<Arc<Session>> {
        self.cache.get(token)
    }

    pub fn close(&self, token: &str, reason: CloseReason) -> Option<Arc<Session>> {
        let removed = self.cache.remove(token)?;
        publish(&self.events, &removed, reason);
        Some(removed)
    }

    /// Closes every session of `user_id`.
    pub fn close_user(&self, user_id: &str, reason: CloseReason) -> usize {
        let tokens: Vec<Arc<String>> =
            self.cache.iter().filter(|(_, s)| s.user_id == user_id).map(|(token, _)| token).collect();
        tokens.iter().filter(|token| self.close(token, reason).is_some()).count()
    }

    /// Sessions currently open, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<_> = self.cache.iter().map(|(_, s)| s).collect();
        sessions.sort_by_key(|s| s.login_time);
        sessions
    }
}

fn publish(events: &EventBus, session: &Session, reason: CloseReason) {
    let event = SessionEvent::Closed { user_name: session.user_name.clone(), reason };
    if let Err(error) = events.publish(event) {
        warn!(%error, "Session event dropped");
    }
}
