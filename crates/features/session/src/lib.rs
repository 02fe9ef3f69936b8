//! Session feature slice: login, logout, call validation and user administration.
//!
//! Every web service call passes through [`SessionsInner::validate_call`], which turns a
//! session token and the caller's address into a [`Caller`] once the session, the address
//! and the privilege check out.

mod accounts;
mod bootstrap;
mod password;
mod store;
mod ws;

pub use accounts::{Holder, NewUser, UserInfo, UserUpdate};
pub use store::Session;
pub use ws::SessionCall;

use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_domain::constants::{SESSION_TYPE_DESKTOP, SESSION_TYPE_WEB};
use kw_event_bus::EventBus;
use kw_kernel::call::{Caller, Requirement};
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_kernel::events::CloseReason;
use std::net::IpAddr;
use std::sync::Arc;
use store::SessionStore;
use tracing::{debug, info};

/// Session feature state
#[kw_derive::kw_slice(name = "session")]
pub struct Sessions {
    database: Database,
    store: SessionStore,
    admin_user_name: String,
}

impl SessionsInner {
    /// Authenticates `user_name` and opens a session bound to `ip`.
    ///
    /// # Errors
    /// * [`InventoryError::InvalidArgument`] for unknown session types.
    /// * [`InventoryError::NotAuthorized`] for unknown users, wrong passwords and disabled
    ///   accounts. The message does not tell which.
    pub fn create_session(
        &self,
        user_name: &str,
        password: &str,
        session_type: i32,
        ip: IpAddr,
    ) -> Result<Arc<Session>, InventoryError> {
        if !(SESSION_TYPE_DESKTOP..=SESSION_TYPE_WEB).contains(&session_type) {
            return Err(InventoryError::invalid(format!("Unknown session type {session_type}")));
        }
        let user = self
            .database
            .read(|tables| tables.user_by_name(user_name.trim()).cloned())
            .filter(|user| user.enabled && password::verify(user, password))
            .ok_or_else(|| InventoryError::not_authorized("User or password incorrect"))?;

        let (session, replaced) = self.store.open(&user.id, &user.user_name, session_type, ip);
        if replaced.is_some() {
            debug!(user = %user.user_name, session_type, "Previous session replaced");
        }
        info!(user = %user.user_name, session_type, %ip, "Session opened");
        Ok(session)
    }

    /// # Errors
    /// [`InventoryError::NotAuthorized`] for unknown tokens or a different address.
    pub fn close_session(&self, token: &str, ip: IpAddr) -> Result<(), InventoryError> {
        let session = self.session(token, ip)?;
        self.store.close(&session.token, CloseReason::Logout);
        info!(user = %session.user_name, "Session closed");
        Ok(())
    }

    /// Resolves the caller of an operation demanding `requirement`.
    ///
    /// # Errors
    /// [`InventoryError::NotAuthorized`] when the session is unknown or expired, was opened
    /// from another address, belongs to a user that no longer exists or is disabled, or the
    /// user lacks the privilege.
    pub fn validate_call(
        &self,
        operation: &str,
        token: &str,
        ip: IpAddr,
        requirement: Requirement,
    ) -> Result<Caller, InventoryError> {
        let session = self.session(token, ip)?;
        let allowed = self.database.read(|tables| {
            let user = tables.users.get(&session.user_id).filter(|u| u.enabled)?;
            Some(accounts::grants(tables, user).allows(requirement.feature, requirement.access))
        });
        match allowed {
            None => Err(InventoryError::not_authorized("The session user no longer has access")),
            Some(false) => Err(InventoryError::not_authorized(format!(
                "User {} is not authorized to call {operation}",
                session.user_name
            ))),
            Some(true) => Ok(Caller {
                user_id: session.user_id.clone(),
                user_name: session.user_name.clone(),
                session_type: session.session_type,
            }),
        }
    }

    /// The session behind `token`, provided it was opened from `ip`.
    ///
    /// # Errors
    /// [`InventoryError::NotAuthorized`] for unknown tokens or a different address.
    pub fn session(&self, token: &str, ip: IpAddr) -> Result<Arc<Session>, InventoryError> {
        let session =
            self.store.get(token).ok_or_else(|| InventoryError::not_authorized("Invalid or expired session"))?;
        if session.ip_address != ip {
            return Err(InventoryError::not_authorized(format!(
                "Session {token} was not opened from {ip}"
            )));
        }
        Ok(session)
    }
}

/// Initialize the session slice, creating the administrator account on first start.
///
/// # Errors
/// Fails when the configured administrator is malformed.
pub fn init(database: &Database, config: &ApiConfig, events: &EventBus) -> Result<InitializedSlice, InventoryError> {
    let admin = &config.security.admin;
    database.write(|tables| bootstrap::ensure_administrator(tables, admin))?;

    let inner = SessionsInner {
        database: database.clone(),
        store: SessionStore::new(&config.security.session, events.clone()),
        admin_user_name: admin.user_name.clone(),
    };
    info!(idle_timeout = config.security.session.idle_timeout_seconds, "Session slice initialized");
    Ok(InitializedSlice::new(Sessions::new(inner)))
}
