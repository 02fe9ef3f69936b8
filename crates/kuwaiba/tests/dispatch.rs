use kuwaiba::dispatch::{Registry, WsRequest, dispatch, operations};
use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_domain::constants::SESSION_TYPE_WEB_SERVICE;
use kw_event_bus::EventBus;
use kw_kernel::error::InventoryError;
use kw_session::Sessions;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

const HOME: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const AWAY: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));

fn registry() -> Registry {
    let events = EventBus::new();
    let slices = kuwaiba::init(&ApiConfig::default(), &Database::in_memory(), &events, None).unwrap();
    Registry::new(slices, events)
}

fn login(registry: &Registry) -> String {
    use kuwaiba::dispatch::Slices;
    let sessions = registry.slice::<Sessions>().unwrap();
    sessions.create_session("admin", "kuwaiba", SESSION_TYPE_WEB_SERVICE, HOME).unwrap().token.clone()
}

fn request(token: &str, operation: &str, params: Option<Value>) -> WsRequest {
    WsRequest { session_id: token.to_owned(), operation: operation.to_owned(), params }
}

#[test]
fn operation_names_are_unique() {
    let names = operations();
    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());
    for name in [
        "createUser",
        "getClass",
        "createObject",
        "connectMirrorPort",
        "createSDHTransportLink",
        "getBGPMap",
        "createOSPView",
        "getProcessDefinitions",
        "getAffectedServices",
        "createSubnet",
        "getGeneralActivityAuditTrail",
    ] {
        assert!(unique.contains(name), "{name} is not routed");
    }
}

#[tokio::test]
async fn calls_reach_the_owning_slice() {
    let registry = registry();
    let token = login(&registry);

    let pools = dispatch(&registry, HOME, request(&token, "getCustomerPools", None)).await.unwrap();
    assert_eq!(pools, json!([]));

    let params = json!({ "name": "Corporate", "description": "Large accounts" });
    let id = dispatch(&registry, HOME, request(&token, "createCustomerPool", Some(params))).await.unwrap();
    assert!(id.as_str().is_some_and(|id| !id.is_empty()));

    let pools = dispatch(&registry, HOME, request(&token, "getCustomerPools", Some(Value::Null))).await.unwrap();
    assert_eq!(pools.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unknown_operations_and_bad_parameters_are_rejected() {
    let registry = registry();
    let token = login(&registry);

    let err = dispatch(&registry, HOME, request(&token, "formatHardDrive", None)).await.unwrap_err();
    assert!(matches!(err, InventoryError::InvalidArgument { .. }));

    let params = json!({ "name": 5 });
    let err = dispatch(&registry, HOME, request(&token, "createCustomerPool", Some(params))).await.unwrap_err();
    assert!(matches!(err, InventoryError::InvalidArgument { .. }));
}

#[tokio::test]
async fn sessions_are_checked_before_anything_else() {
    let registry = registry();
    let token = login(&registry);

    let err = dispatch(&registry, HOME, request("forged", "getCustomerPools", None)).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));

    let err = dispatch(&registry, AWAY, request(&token, "getCustomerPools", None)).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));

    // Unknown operations of a bad session still report the session.
    let err = dispatch(&registry, HOME, request("forged", "formatHardDrive", None)).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));
}

#[tokio::test]
async fn privileges_are_checked_per_operation() {
    use kuwaiba::dispatch::Slices;
    let registry = registry();
    let admin = login(&registry);

    let params = json!({ "userName": "viewer", "password": "view-only" });
    dispatch(&registry, HOME, request(&admin, "createUser", Some(params))).await.unwrap();
    let sessions = registry.slice::<Sessions>().unwrap();
    let viewer = sessions.create_session("viewer", "view-only", SESSION_TYPE_WEB_SERVICE, HOME).unwrap().token.clone();

    let err = dispatch(&registry, HOME, request(&viewer, "getCustomerPools", None)).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));
}
