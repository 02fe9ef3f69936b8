use kw_business::{Business, BusinessCall, init};
use kw_database::Database;
use kw_domain::privileges::{Access, FeatureSet};
use kw_kernel::call::{CallContext, Caller, SliceCall};
use kw_kernel::error::InventoryError;
use serde_json::{Value, json};

fn slice() -> Business {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    init(&database, None).unwrap().state::<Business>().unwrap().clone()
}

async fn call(slice: &Business, request: Value) -> Result<Value, InventoryError> {
    let call: BusinessCall = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await
}

async fn create(slice: &Business, class_name: &str, parent: (&str, &str), name: &str) -> String {
    let id = call(
        slice,
        json!({
            "operation": "createObject",
            "params": {
                "className": class_name,
                "parentClassName": parent.0,
                "parentId": parent.1,
                "attributes": { "name": name }
            }
        }),
    )
    .await
    .unwrap();
    id.as_str().unwrap().to_owned()
}

#[test]
fn reads_and_writes_are_told_apart() {
    let read: BusinessCall =
        serde_json::from_value(json!({ "operation": "getObject", "params": { "className": "Router", "id": "x" } }))
            .unwrap();
    assert_eq!(read.requirement().access, Access::Read);
    assert_eq!(read.requirement().feature, FeatureSet::BUSINESS);

    let write: BusinessCall = serde_json::from_value(
        json!({ "operation": "deleteObjects", "params": { "objects": [{ "className": "Router", "id": "x" }] } }),
    )
    .unwrap();
    assert_eq!(write.requirement().access, Access::Write);
    assert!(BusinessCall::operations().contains(&"getParentsUntilFirstOfClass"));
}

#[tokio::test]
async fn object_lifecycle() {
    let slice = slice();
    let peru = create(&slice, "Country", ("DummyRoot", "-1"), "Peru").await;
    let lima = create(&slice, "City", ("Country", &peru), "Lima").await;

    call(
        &slice,
        json!({
            "operation": "updateObject",
            "params": { "className": "City", "id": lima, "attributes": { "description": "Capital" } }
        }),
    )
    .await
    .unwrap();
    let object = call(&slice, json!({ "operation": "getObject", "params": { "className": "City", "id": lima } }))
        .await
        .unwrap();
    assert_eq!(object["attributes"]["description"], "Capital");

    let parents = call(&slice, json!({ "operation": "getParents", "params": { "className": "City", "id": lima } }))
        .await
        .unwrap();
    assert_eq!(parents[0]["name"], "Peru");
    assert_eq!(parents[1]["id"], "-1");

    call(
        &slice,
        json!({
            "operation": "deleteObjects",
            "params": { "objects": [{ "className": "Country", "id": peru }] }
        }),
    )
    .await
    .unwrap();
    let missing =
        call(&slice, json!({ "operation": "getObjectLight", "params": { "className": "City", "id": lima } })).await;
    assert!(matches!(missing, Err(InventoryError::NotFound { .. })));
}

#[tokio::test]
async fn bulk_creation_and_relationships() {
    let slice = slice();
    let peru = create(&slice, "Country", ("DummyRoot", "-1"), "Peru").await;
    let lima = create(&slice, "City", ("Country", &peru), "Lima").await;
    let hq = create(&slice, "Building", ("City", &lima), "HQ").await;
    let rack = create(&slice, "Rack", ("Building", &hq), "R1").await;

    let routers = call(
        &slice,
        json!({
            "operation": "createBulkObjects",
            "params": {
                "className": "Router",
                "parentClassName": "Rack",
                "parentId": rack,
                "namePattern": "edge-[sequence(1,3)]"
            }
        }),
    )
    .await
    .unwrap();
    let routers: Vec<String> = serde_json::from_value(routers).unwrap();
    assert_eq!(routers.len(), 3);

    let count = call(&slice, json!({ "operation": "countChildren", "params": { "className": "Rack", "id": rack } }))
        .await
        .unwrap();
    assert_eq!(count, 3);

    call(
        &slice,
        json!({
            "operation": "createSpecialRelationship",
            "params": {
                "aClassName": "Router", "aId": routers[0],
                "bClassName": "Router", "bId": routers[1],
                "name": "backup"
            }
        }),
    )
    .await
    .unwrap();
    let related = call(
        &slice,
        json!({
            "operation": "getSpecialAttribute",
            "params": { "className": "Router", "id": routers[1], "attributeName": "backup" }
        }),
    )
    .await
    .unwrap();
    assert_eq!(related[0]["name"], "edge-1");

    let blocked = call(
        &slice,
        json!({
            "operation": "deleteObjects",
            "params": { "objects": [{ "className": "Router", "id": routers[0] }] }
        }),
    )
    .await;
    assert!(matches!(blocked, Err(InventoryError::OperationNotPermitted { .. })));

    let suggestions = call(
        &slice,
        json!({ "operation": "getSuggestedObjectsWithFilter", "params": { "filter": "EDGE", "limit": 2 } }),
    )
    .await
    .unwrap();
    assert_eq!(suggestions.as_array().unwrap().len(), 2);
}
