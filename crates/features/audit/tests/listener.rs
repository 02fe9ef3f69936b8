use kw_audit::{Audit, AuditCall, init};
use kw_database::Database;
use kw_domain::config::AuditConfig;
use kw_domain::model::ObjectKey;
use kw_domain::model::audit::ActivityType;
use kw_event_bus::EventBus;
use kw_kernel::call::{CallContext, Caller, SliceCall};
use kw_kernel::events::{CloseReason, SessionEvent};
use serde_json::{Value, json};
use std::time::Duration;

fn audit(database: &Database, max_entries: usize) -> Audit {
    kw_metadata::init(database).unwrap();
    init(database, &AuditConfig { max_entries }).unwrap().state::<Audit>().unwrap().clone()
}

async fn call(slice: &Audit, request: Value) -> Value {
    let call: AuditCall = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await.unwrap()
}

async fn settle(database: &Database, expected: usize) {
    for _ in 0..200 {
        if database.read(|t| t.activity_log.len()) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[test]
fn test_init_registers_audit_slice() {
    let database = Database::in_memory();
    let slice = init(&database, &AuditConfig::default()).unwrap();
    assert_eq!(slice.name(), Audit::NAME);
    assert!(slice.state::<Audit>().is_some());
}

#[tokio::test]
async fn recorded_calls_reach_the_trail() {
    let database = Database::in_memory();
    let slice = audit(&database, 0);
    let events = EventBus::new();
    let listener = slice.listen(&events).unwrap();

    let router = ObjectKey::new("Router", "r1");
    let ctx = CallContext::new(Caller::system(), "updateObject", events.clone());
    ctx.record(ActivityType::UpdateInventoryObject, Some(&router), "name");
    ctx.record(ActivityType::CreateRelationship, None, "uses");
    events
        .publish(SessionEvent::Closed { user_name: "admin".to_owned(), reason: CloseReason::Logout })
        .unwrap();
    settle(&database, 3).await;

    let general = call(&slice, json!({ "operation": "getGeneralActivityAuditTrail", "params": { "page": 1, "limit": 10 } })).await;
    assert_eq!(general.as_array().unwrap().len(), 3);

    let logouts = call(
        &slice,
        json!({ "operation": "getGeneralActivityAuditTrail", "params": { "filters": { "activityType": "logout" } } }),
    )
    .await;
    assert_eq!(logouts[0]["userName"], "admin");

    let object = call(
        &slice,
        json!({ "operation": "getBusinessObjectAuditTrail", "params": { "className": "Router", "id": "r1" } }),
    )
    .await;
    assert_eq!(object.as_array().unwrap().len(), 1);
    assert_eq!(object[0]["operation"], "updateObject");
    assert_eq!(object[0]["notes"], "name");

    events.shutdown();
    listener.await.unwrap();
}

#[tokio::test]
async fn the_listener_keeps_the_log_bounded() {
    let database = Database::in_memory();
    let slice = audit(&database, 2);
    let events = EventBus::new();
    let _listener = slice.listen(&events).unwrap();
    let ctx = CallContext::new(Caller::system(), "createObject", events.clone());
    for n in 0..4 {
        ctx.record(ActivityType::CreateInventoryObject, None, n.to_string());
    }
    settle(&database, 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let notes: Vec<String> = database.read(|t| t.activity_log.iter().map(|e| e.notes.clone()).collect());
    assert_eq!(notes, ["2", "3"]);
}

#[tokio::test]
async fn bursts_past_the_broadcast_buffer_are_all_logged() {
    let database = Database::in_memory();
    let slice = audit(&database, 0);
    let events = EventBus::new();
    let _listener = slice.listen(&events).unwrap();
    let ctx = CallContext::new(Caller::system(), "createObject", events.clone());
    for n in 0..1000 {
        ctx.record(ActivityType::CreateInventoryObject, None, n.to_string());
    }
    settle(&database, 1000).await;

    let notes: Vec<String> = database.read(|t| t.activity_log.iter().map(|e| e.notes.clone()).collect());
    assert_eq!(notes.len(), 1000);
    assert_eq!(notes.first().map(String::as_str), Some("0"));
    assert_eq!(notes.last().map(String::as_str), Some("999"));
}
