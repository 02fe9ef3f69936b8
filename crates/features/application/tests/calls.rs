use kw_application::{
    Application, FavoritesCall, FilesCall, PoolsCall, ProcessesCall, ProxiesCall, QueriesCall, ReportsCall, RulesCall, TasksCall,
    TemplatesCall, VariablesCall, ViewsCall, init,
};
use kw_database::Database;
use kw_domain::config::AttachmentsConfig;
use kw_domain::privileges::{Access, FeatureSet};
use kw_kernel::call::{CallContext, Caller, SliceCall};
use kw_kernel::error::InventoryError;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeSet;

fn slice() -> Application {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    init(&database, None, &AttachmentsConfig::default()).unwrap().state::<Application>().unwrap().clone()
}

async fn call<C>(slice: &Application, request: Value) -> Result<Value, InventoryError>
where
    C: SliceCall<Slice = Application> + DeserializeOwned + AsRef<str>,
{
    let call: C = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await
}

#[test]
fn operation_names_do_not_overlap() {
    let groups = [
        FavoritesCall::operations(),
        FilesCall::operations(),
        PoolsCall::operations(),
        ProcessesCall::operations(),
        ProxiesCall::operations(),
        QueriesCall::operations(),
        ReportsCall::operations(),
        RulesCall::operations(),
        TasksCall::operations(),
        TemplatesCall::operations(),
        VariablesCall::operations(),
        ViewsCall::operations(),
    ];
    let total: usize = groups.iter().map(|g| g.len()).sum();
    let unique: BTreeSet<&str> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    assert_eq!(unique.len(), total);
    assert!(unique.contains("getConfigurationVariableValue"));
    assert!(unique.contains("createBulkSpecialTemplateElement"));
    assert!(unique.contains("createProcessInstance"));
}

#[test]
fn rules_and_validators_need_their_own_features() {
    let rules: RulesCall =
        serde_json::from_value(json!({ "operation": "getBusinessRules", "params": {} })).unwrap();
    assert_eq!(rules.requirement().feature, FeatureSet::BUSINESS_RULES);
    assert_eq!(rules.requirement().access, Access::Read);

    let validators: RulesCall =
        serde_json::from_value(json!({ "operation": "deleteValidatorDefinition", "params": { "id": "x" } }))
            .unwrap();
    assert_eq!(validators.requirement().feature, FeatureSet::VALIDATORS);
    assert_eq!(validators.requirement().access, Access::Write);
}

#[tokio::test]
async fn pool_items_can_start_from_a_template() {
    let slice = slice();
    let template = call::<TemplatesCall>(
        &slice,
        json!({ "operation": "createTemplate", "params": { "className": "Router", "name": "edge-template" } }),
    )
    .await
    .unwrap();
    let pool = call::<PoolsCall>(
        &slice,
        json!({
            "operation": "createRootPool",
            "params": { "name": "Spares", "className": "GenericCommunicationsElement" }
        }),
    )
    .await
    .unwrap();

    call::<PoolsCall>(
        &slice,
        json!({
            "operation": "createPoolItem",
            "params": { "poolId": pool, "className": "Router", "templateId": template }
        }),
    )
    .await
    .unwrap();
    call::<PoolsCall>(
        &slice,
        json!({
            "operation": "createPoolItem",
            "params": { "poolId": pool, "className": "Router", "attributes": { "name": "bare" } }
        }),
    )
    .await
    .unwrap();

    let items =
        call::<PoolsCall>(&slice, json!({ "operation": "getPoolItems", "params": { "poolId": pool, "limit": -1 } }))
            .await
            .unwrap();
    let names: Vec<&str> = items.as_array().unwrap().iter().filter_map(|i| i["name"].as_str()).collect();
    assert_eq!(names, ["bare", "edge-template"]);

    let wrong_class = call::<PoolsCall>(
        &slice,
        json!({ "operation": "createPoolItem", "params": { "poolId": pool, "className": "Building" } }),
    )
    .await;
    assert!(wrong_class.is_err());
}

#[tokio::test]
async fn masked_variables_hide_their_value_until_asked() {
    let slice = slice();
    let pool = call::<VariablesCall>(
        &slice,
        json!({ "operation": "createConfigurationVariablesPool", "params": { "name": "General" } }),
    )
    .await
    .unwrap();
    call::<VariablesCall>(
        &slice,
        json!({
            "operation": "createConfigurationVariable",
            "params": {
                "poolId": pool,
                "name": "snmp_retries",
                "variableType": 0,
                "masked": true,
                "valueDefinition": "3"
            }
        }),
    )
    .await
    .unwrap();

    let info = call::<VariablesCall>(
        &slice,
        json!({ "operation": "getConfigurationVariable", "params": { "name": "snmp_retries" } }),
    )
    .await
    .unwrap();
    assert_eq!(info["value"], "****");
    let value = call::<VariablesCall>(
        &slice,
        json!({ "operation": "getConfigurationVariableValue", "params": { "name": "snmp_retries" } }),
    )
    .await
    .unwrap();
    assert_eq!(value, json!(3));

    call::<VariablesCall>(
        &slice,
        json!({ "operation": "deleteConfigurationVariablesPool", "params": { "poolId": pool } }),
    )
    .await
    .unwrap();
    let gone = call::<VariablesCall>(
        &slice,
        json!({ "operation": "getConfigurationVariable", "params": { "name": "snmp_retries" } }),
    )
    .await;
    assert!(matches!(gone, Err(InventoryError::NotFound { .. })));
}

#[tokio::test]
async fn tasks_round_trip_through_calls() {
    let slice = slice();
    let id = call::<TasksCall>(
        &slice,
        json!({ "operation": "createTask", "params": { "name": "nightly", "script": "print('hi')" } }),
    )
    .await
    .unwrap();
    call::<TasksCall>(
        &slice,
        json!({
            "operation": "updateTaskProperties",
            "params": { "taskId": id, "propertyName": "enabled", "propertyValue": "true" }
        }),
    )
    .await
    .unwrap();

    let tasks = call::<TasksCall>(&slice, json!({ "operation": "getTasks", "params": {} })).await.unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["enabled"], true);

    let bad = call::<TasksCall>(
        &slice,
        json!({
            "operation": "updateTaskProperties",
            "params": { "taskId": id, "propertyName": "enabled", "propertyValue": "maybe" }
        }),
    )
    .await;
    assert!(matches!(bad, Err(InventoryError::InvalidArgument { .. })));
}

#[tokio::test]
async fn attachments_need_storage() {
    let slice = slice();
    let refused = call::<FilesCall>(
        &slice,
        json!({
            "operation": "attachFileToObject",
            "params": { "name": "photo.png", "file": "/wA=", "className": "Router", "id": "r1" }
        }),
    )
    .await;
    assert!(matches!(refused, Err(InventoryError::OperationNotPermitted { .. })));
}

#[tokio::test]
async fn process_catalog_guards_its_definitions() {
    let slice = slice();
    let definition = call::<ProcessesCall>(
        &slice,
        json!({ "operation": "createProcessDefinition", "params": { "name": "Service provisioning", "enabled": true } }),
    )
    .await
    .unwrap();
    let instance = call::<ProcessesCall>(
        &slice,
        json!({ "operation": "createProcessInstance", "params": { "processDefinitionId": definition, "name": "ACME uplink" } }),
    )
    .await
    .unwrap();

    let refused =
        call::<ProcessesCall>(&slice, json!({ "operation": "deleteProcessDefinition", "params": { "id": definition } })).await;
    assert!(matches!(refused, Err(InventoryError::OperationNotPermitted { .. })));

    let instances = call::<ProcessesCall>(
        &slice,
        json!({ "operation": "getProcessInstances", "params": { "processDefinitionId": definition } }),
    )
    .await
    .unwrap();
    assert_eq!(instances[0]["id"], instance);

    call::<ProcessesCall>(&slice, json!({ "operation": "deleteProcessInstance", "params": { "id": instance } }))
        .await
        .unwrap();
    call::<ProcessesCall>(&slice, json!({ "operation": "deleteProcessDefinition", "params": { "id": definition } }))
        .await
        .unwrap();
    let left = call::<ProcessesCall>(&slice, json!({ "operation": "getProcessDefinitions", "params": {} })).await.unwrap();
    assert_eq!(left, json!([]));
}

#[tokio::test]
async fn outside_plant_views_need_their_own_feature() {
    let slice = slice();
    let create: ViewsCall =
        serde_json::from_value(json!({ "operation": "createOSPView", "params": { "name": "Downtown ducts" } })).unwrap();
    assert_eq!(create.requirement().feature, FeatureSet::OUTSIDE_PLANT);
    assert_eq!(create.requirement().access, Access::Write);

    let id = call::<ViewsCall>(&slice, json!({ "operation": "createOSPView", "params": { "name": "Downtown ducts" } }))
        .await
        .unwrap();
    let views = call::<ViewsCall>(&slice, json!({ "operation": "getOSPViews", "params": {} })).await.unwrap();
    assert_eq!(views[0]["id"], id);
    let floor = call::<ViewsCall>(
        &slice,
        json!({ "operation": "createGeneralView", "params": { "viewClass": "FloorPlan", "name": "Rack room" } }),
    )
    .await
    .unwrap();
    let views = call::<ViewsCall>(&slice, json!({ "operation": "getOSPViews", "params": {} })).await.unwrap();
    assert_eq!(views.as_array().map(Vec::len), Some(1));
    let wrong = call::<ViewsCall>(&slice, json!({ "operation": "getOSPView", "params": { "id": floor } })).await;
    assert!(matches!(wrong, Err(InventoryError::NotFound { .. })));
}
