use kw_business::objects::{self, NewObject, Store};
use kw_database::Database;
use kw_domain::privileges::{Access, FeatureSet};
use kw_kernel::call::{CallContext, Caller, SliceCall};
use kw_kernel::error::InventoryError;
use kw_sync::{SyncCall, Synchronization, init};
use serde_json::{Value, json};
use std::collections::BTreeMap;

fn setup() -> (Synchronization, String) {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let new = NewObject {
        class_name: "Country".to_owned(),
        parent_class_name: "DummyRoot".to_owned(),
        parent_id: "-1".to_owned(),
        attributes: BTreeMap::from([("name".to_owned(), "Peru".to_owned())]),
        template_id: None,
    };
    let country = database.write(|t| objects::create_object(t, Store::Objects, &new, false)).unwrap();
    let slice = init(&database).unwrap().state::<Synchronization>().unwrap().clone();
    (slice, country)
}

async fn call(slice: &Synchronization, request: Value) -> Result<Value, InventoryError> {
    let call: SyncCall = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await
}

#[test]
fn listing_providers_is_a_read() {
    let read: SyncCall =
        serde_json::from_value(json!({ "operation": "getSynchronizationProviders", "params": {} })).unwrap();
    assert_eq!(read.requirement().access, Access::Read);
    assert_eq!(read.requirement().feature, FeatureSet::SYNC);
    assert!(SyncCall::operations().contains(&"releaseSyncDataSourceConfigFromSyncGroup"));
}

#[tokio::test]
async fn configurations_follow_their_groups() {
    let (slice, country) = setup();
    let providers = call(&slice, json!({ "operation": "getSynchronizationProviders", "params": {} })).await.unwrap();
    let provider = providers[0]["id"].as_str().unwrap().to_owned();

    let group = call(
        &slice,
        json!({ "operation": "createSynchronizationGroup", "params": { "name": "Core", "provider": provider } }),
    )
    .await
    .unwrap();
    let config = call(
        &slice,
        json!({
            "operation": "createSynchronizationDataSourceConfig",
            "params": {
                "objectClassName": "Country",
                "objectId": country,
                "syncGroupId": group,
                "name": "snmp",
                "parameters": { "ipAddress": "10.0.0.1" }
            }
        }),
    )
    .await
    .unwrap();

    let copies =
        call(&slice, json!({ "operation": "copySyncGroup", "params": { "syncGroupIds": [group] } })).await.unwrap();
    assert_eq!(copies[0]["name"], "Copy of Core");
    let copy = copies[0]["id"].clone();

    let in_copy = call(
        &slice,
        json!({ "operation": "getSyncDataSourceConfigurations", "params": { "syncGroupId": copy } }),
    )
    .await
    .unwrap();
    assert_eq!(in_copy[0]["id"], config);

    call(
        &slice,
        json!({
            "operation": "releaseSyncDataSourceConfigFromSyncGroup",
            "params": { "syncGroupId": group, "syncDataSourceConfigurationIds": [config] }
        }),
    )
    .await
    .unwrap();
    let last = call(
        &slice,
        json!({
            "operation": "releaseSyncDataSourceConfigFromSyncGroup",
            "params": { "syncGroupId": copy, "syncDataSourceConfigurationIds": [config] }
        }),
    )
    .await;
    assert!(matches!(last, Err(InventoryError::OperationNotPermitted { .. })));

    let by_object = call(
        &slice,
        json!({
            "operation": "getSyncDataSourceConfiguration",
            "params": { "objectClassName": "Country", "objectId": country }
        }),
    )
    .await
    .unwrap();
    assert_eq!(by_object["parameters"]["ipAddress"], "10.0.0.1");

    call(&slice, json!({ "operation": "deleteSynchronizationGroup", "params": { "syncGroupId": copy } }))
        .await
        .unwrap();
    let gone = call(
        &slice,
        json!({
            "operation": "getSyncDataSourceConfiguration",
            "params": { "objectClassName": "Country", "objectId": country }
        }),
    )
    .await;
    assert!(matches!(gone, Err(InventoryError::NotFound { .. })));
}
