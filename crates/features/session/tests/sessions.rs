use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_domain::constants::{SESSION_TYPE_DESKTOP, SESSION_TYPE_WEB_SERVICE};
use kw_domain::privileges::FeatureSet;
use kw_event_bus::EventBus;
use kw_kernel::call::{CallContext, Caller, Requirement, SliceCall};
use kw_kernel::error::InventoryError;
use kw_session::{SessionCall, Sessions, init};
use serde_json::{Value, json};
use std::net::{IpAddr, Ipv4Addr};

const HOME: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const AWAY: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

fn slice() -> Sessions {
    let db = Database::in_memory();
    init(&db, &ApiConfig::default(), &EventBus::new()).unwrap().state::<Sessions>().unwrap().clone()
}

async fn call(slice: &Sessions, request: Value) -> Result<Value, InventoryError> {
    let call: SessionCall = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await
}

#[test]
fn login_checks_credentials() {
    let slice = slice();
    let session = slice.create_session("admin", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap();
    assert_eq!(session.user_name, "admin");

    let err = slice.create_session("admin", "wrong", SESSION_TYPE_DESKTOP, HOME).unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));
    let err = slice.create_session("nobody", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));
    let err = slice.create_session("admin", "kuwaiba", 42, HOME).unwrap_err();
    assert!(matches!(err, InventoryError::InvalidArgument { .. }));
}

#[test]
fn new_login_of_same_type_replaces_the_old_session() {
    let slice = slice();
    let first = slice.create_session("admin", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap();
    let other = slice.create_session("admin", "kuwaiba", SESSION_TYPE_WEB_SERVICE, HOME).unwrap();
    let second = slice.create_session("admin", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap();

    assert!(slice.session(&first.token, HOME).is_err());
    assert!(slice.session(&second.token, HOME).is_ok());
    assert!(slice.session(&other.token, HOME).is_ok());
}

#[test]
fn calls_are_bound_to_address_and_session() {
    let slice = slice();
    let session = slice.create_session("admin", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap();
    let write = Requirement::write(FeatureSet::BUSINESS);

    let caller = slice.validate_call("createObject", &session.token, HOME, write).unwrap();
    assert_eq!(caller.user_name, "admin");
    assert!(slice.validate_call("createObject", &session.token, AWAY, write).is_err());
    assert!(slice.validate_call("createObject", "forged", HOME, write).is_err());

    assert!(slice.close_session(&session.token, AWAY).is_err());
    slice.close_session(&session.token, HOME).unwrap();
    assert!(slice.validate_call("createObject", &session.token, HOME, write).is_err());
}

#[tokio::test]
async fn privileges_gate_operations() {
    let slice = slice();
    let user_id = call(
        &slice,
        json!({ "operation": "createUser", "params": { "userName": "viewer", "password": "pw" } }),
    )
    .await
    .unwrap();
    call(
        &slice,
        json!({
            "operation": "setPrivilegeToUser",
            "params": { "userId": user_id, "featureToken": "business", "accessLevel": 1 }
        }),
    )
    .await
    .unwrap();

    let session = slice.create_session("viewer", "pw", SESSION_TYPE_DESKTOP, HOME).unwrap();
    assert!(slice.validate_call("getObject", &session.token, HOME, Requirement::read(FeatureSet::BUSINESS)).is_ok());
    let err = slice
        .validate_call("createObject", &session.token, HOME, Requirement::write(FeatureSet::BUSINESS))
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));

    call(&slice, json!({ "operation": "deleteUsers", "params": { "userIds": [user_id] } })).await.unwrap();
    assert!(slice.session(&session.token, HOME).is_err());
}

#[tokio::test]
async fn administrator_can_not_be_deleted() {
    let slice = slice();
    let users = call(&slice, json!({ "operation": "getUsers", "params": {} })).await.unwrap();
    let admin_id = users[0]["id"].clone();
    assert!(users[0].get("passwordHash").is_none());

    let err = call(&slice, json!({ "operation": "deleteUsers", "params": { "userIds": [admin_id] } }))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::OperationNotPermitted { .. }));
}

#[tokio::test]
async fn groups_and_members() {
    let slice = slice();
    let user_id = call(
        &slice,
        json!({ "operation": "createUser", "params": { "userName": "tech", "password": "pw" } }),
    )
    .await
    .unwrap();
    let group_id = call(
        &slice,
        json!({ "operation": "createGroup", "params": { "groupName": "Field", "users": [user_id] } }),
    )
    .await
    .unwrap();

    let members =
        call(&slice, json!({ "operation": "getUsersInGroup", "params": { "groupId": group_id } })).await.unwrap();
    assert_eq!(members[0]["userName"], "tech");

    call(
        &slice,
        json!({ "operation": "removeUserFromGroup", "params": { "userId": user_id, "groupId": group_id } }),
    )
    .await
    .unwrap();
    let groups =
        call(&slice, json!({ "operation": "getGroupsForUser", "params": { "userId": user_id } })).await.unwrap();
    assert_eq!(groups, json!([]));
}

#[test]
fn idle_sessions_stop_authorizing_calls() {
    let mut config = ApiConfig::default();
    config.security.session.idle_timeout_seconds = 1;
    let db = Database::in_memory();
    let slice = init(&db, &config, &EventBus::new()).unwrap().state::<Sessions>().unwrap().clone();
    let session = slice.create_session("admin", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap();
    let read = Requirement::read(FeatureSet::BUSINESS);
    assert!(slice.validate_call("getObject", &session.token, HOME, read).is_ok());

    std::thread::sleep(std::time::Duration::from_millis(1200));
    let err = slice.validate_call("getObject", &session.token, HOME, read).unwrap_err();
    assert!(matches!(err, InventoryError::NotAuthorized { .. }));
}

#[test]
fn racing_logins_of_one_user_keep_a_single_session() {
    let slice = slice();
    let tokens: Vec<String> = std::thread::scope(|scope| {
        let logins: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| slice.create_session("admin", "kuwaiba", SESSION_TYPE_DESKTOP, HOME).unwrap()))
            .collect();
        logins.into_iter().map(|login| login.join().unwrap().token.clone()).collect()
    });
    let live = tokens.iter().filter(|token| slice.session(token, HOME).is_ok()).count();
    assert_eq!(live, 1);
}
