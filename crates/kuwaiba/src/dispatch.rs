//! The web service dispatcher.
//!
//! A request names one operation of the catalog. The session is checked first, then the
//! operation is decoded by the call enum that owns it, the caller's privilege is checked
//! against the decoded call and the owning slice runs it.

use kw_application::{
    FavoritesCall, FilesCall, PoolsCall, ProcessesCall, ProxiesCall, QueriesCall, ReportsCall, RulesCall, TasksCall,
    TemplatesCall, VariablesCall, ViewsCall,
};
use kw_audit::AuditCall;
use kw_business::BusinessCall;
use kw_connections::{ConnectionsCall, SdhCall};
use kw_domain::registry::{FeatureSlice, InitializedSlice};
use kw_event_bus::EventBus;
use kw_ipam::IpamCall;
use kw_kernel::call::{CallContext, SliceCall};
use kw_kernel::error::InventoryError;
use kw_metadata::MetadataCall;
use kw_services::{ContractsCall, ProjectsCall, ServicesCall, WarehousesCall};
use kw_session::{SessionCall, Sessions};
use kw_sync::SyncCall;
use serde_json::{Value, json};
use std::net::IpAddr;
use tracing::debug;

/// Expands `$apply!` with every call enum of the catalog.
macro_rules! with_catalog {
    ($apply:ident) => {
        $apply!(
            SessionCall,
            MetadataCall,
            BusinessCall,
            ConnectionsCall,
            SdhCall,
            PoolsCall,
            TemplatesCall,
            FavoritesCall,
            ViewsCall,
            ProcessesCall,
            QueriesCall,
            TasksCall,
            ReportsCall,
            VariablesCall,
            ProxiesCall,
            RulesCall,
            FilesCall,
            SyncCall,
            IpamCall,
            ServicesCall,
            ContractsCall,
            ProjectsCall,
            WarehousesCall,
            AuditCall,
        )
    };
}

/// One `POST /ws` body.
#[kw_derive::api_model]
pub struct WsRequest {
    pub session_id: String,
    pub operation: String,
    /// Operation parameters. Absent or `null` is read as `{}`.
    #[serde(default)]
    #[cfg_attr(feature = "server", schema(value_type = Object))]
    pub params: Option<Value>,
}

/// Where the dispatcher finds the initialized slices and the bus activity goes to.
pub trait Slices: Send + Sync {
    fn slice<T: FeatureSlice>(&self) -> Option<&T>;

    fn events(&self) -> &EventBus;
}

/// A plain slice registry for embedding the catalog without the HTTP layer.
#[derive(Debug)]
pub struct Registry {
    slices: Vec<InitializedSlice>,
    events: EventBus,
}

impl Registry {
    #[must_use]
    pub const fn new(slices: Vec<InitializedSlice>, events: EventBus) -> Self {
        Self { slices, events }
    }
}

impl Slices for Registry {
    fn slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.slices.iter().find_map(InitializedSlice::state::<T>)
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}

/// Every operation name the catalog serves.
#[must_use]
pub fn operations() -> Vec<&'static str> {
    macro_rules! names {
        ($($call:ty),+ $(,)?) => {
            [$(<$call as SliceCall>::operations()),+].concat()
        };
    }
    with_catalog!(names)
}

fn missing<T>() -> InventoryError {
    InventoryError::Internal {
        message: format!("Slice {} is not registered", std::any::type_name::<T>()).into(),
        context: None,
    }
}

/// Runs one catalog operation on behalf of the session `request.session_id`, opened
/// from `ip`.
///
/// # Errors
/// * [`InventoryError::NotAuthorized`] for invalid sessions and missing privileges.
/// * [`InventoryError::InvalidArgument`] for unknown operations and malformed parameters.
/// * Whatever the operation itself reports.
pub async fn dispatch<S: Slices>(slices: &S, ip: IpAddr, request: WsRequest) -> Result<Value, InventoryError> {
    let sessions = slices.slice::<Sessions>().ok_or_else(missing::<Sessions>)?;
    sessions.session(&request.session_id, ip)?;

    let WsRequest { session_id, operation, params } = request;
    let params = params.filter(|p| !p.is_null()).unwrap_or_else(|| json!({}));
    let envelope = json!({ "operation": operation, "params": params });

    macro_rules! route {
        ($($call:ty),+ $(,)?) => {
            $(
                if <$call as SliceCall>::operations().contains(&operation.as_str()) {
                    return run::<$call, S>(slices, sessions, &session_id, ip, envelope).await;
                }
            )+
        };
    }
    with_catalog!(route);

    Err(InventoryError::invalid(format!("Unknown operation {operation}")))
}

async fn run<C, S>(
    slices: &S,
    sessions: &Sessions,
    token: &str,
    ip: IpAddr,
    envelope: Value,
) -> Result<Value, InventoryError>
where
    C: SliceCall,
    S: Slices,
{
    let call: C = serde_json::from_value(envelope)
        .map_err(|error| InventoryError::invalid(format!("Malformed parameters: {error}")))?;
    let operation = call.as_ref().to_owned();
    let caller = sessions.validate_call(&operation, token, ip, call.requirement())?;
    let slice = slices.slice::<C::Slice>().ok_or_else(missing::<C::Slice>)?;
    debug!(user = %caller.user_name, %operation, "Dispatching call");

    let ctx = CallContext::new(caller, operation, slices.events().clone());
    call.execute(slice, &ctx).await
}
