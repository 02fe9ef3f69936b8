use kw_business::objects::{self, NewObject, Store};
use kw_database::Database;
use kw_domain::privileges::{Access, FeatureSet};
use kw_kernel::call::{CallContext, Caller, SliceCall};
use kw_kernel::error::InventoryError;
use kw_services::{ContractsCall, ProjectsCall, Services, ServicesCall, WarehousesCall, init};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;

fn place(database: &Database, class_name: &str, parent_class: &str, parent_id: &str) -> String {
    let new = NewObject {
        class_name: class_name.to_owned(),
        parent_class_name: parent_class.to_owned(),
        parent_id: parent_id.to_owned(),
        attributes: BTreeMap::from([("name".to_owned(), format!("{class_name}-1"))]),
        template_id: None,
    };
    database.write(|t| objects::create_object(t, Store::Objects, &new, false)).unwrap()
}

struct Site {
    database: Database,
    rack: String,
    router: String,
}

fn setup() -> (Services, Site) {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let country = place(&database, "Country", "DummyRoot", "-1");
    let city = place(&database, "City", "Country", &country);
    let building = place(&database, "Building", "City", &city);
    let rack = place(&database, "Rack", "Building", &building);
    let router = place(&database, "Router", "Rack", &rack);
    let slice = init(&database, None).unwrap().state::<Services>().unwrap().clone();
    (slice, Site { database, rack, router })
}

async fn call<C>(slice: &Services, request: Value) -> Result<Value, InventoryError>
where
    C: SliceCall<Slice = Services> + DeserializeOwned + AsRef<str>,
{
    let call: C = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await
}

fn id(value: &Value) -> String {
    value.as_str().unwrap().to_owned()
}

#[test]
fn each_module_carries_its_own_privilege() {
    let read: WarehousesCall =
        serde_json::from_value(json!({ "operation": "getWarehouseRootPools", "params": {} })).unwrap();
    assert_eq!(read.requirement().feature, FeatureSet::WAREHOUSES);
    assert_eq!(read.requirement().access, Access::Read);

    let write: ContractsCall = serde_json::from_value(json!({
        "operation": "releaseObjectFromContract",
        "params": { "contractId": "c", "objectId": "o" }
    }))
    .unwrap();
    assert_eq!(write.requirement().feature, FeatureSet::CONTRACTS);
    assert_eq!(write.requirement().access, Access::Write);

    assert!(ServicesCall::operations().contains(&"getServicePoolsInCustomer"));
    assert!(ProjectsCall::operations().contains(&"getProjectsRelatedToObject"));
    assert!(WarehousesCall::operations().contains(&"associatesPhysicalNodeToWarehouse"));
}

#[tokio::test]
async fn customers_services_and_contacts() {
    let (slice, site) = setup();
    let pool = id(&call::<ServicesCall>(&slice, json!({ "operation": "createCustomerPool", "params": { "name": "Customers" } }))
        .await
        .unwrap());
    let customer = id(&call::<ServicesCall>(
        &slice,
        json!({ "operation": "createCustomer", "params": {
            "poolId": pool, "className": "CorporateCustomer", "attributes": { "name": "ACME" }
        } }),
    )
    .await
    .unwrap());
    let service_pool = id(&call::<ServicesCall>(
        &slice,
        json!({ "operation": "createServicePool", "params": {
            "customerClassName": "CorporateCustomer", "customerId": customer, "name": "Data"
        } }),
    )
    .await
    .unwrap());
    let service = id(&call::<ServicesCall>(
        &slice,
        json!({ "operation": "createService", "params": {
            "poolId": service_pool, "className": "DataService", "attributes": { "name": "Link 1" }
        } }),
    )
    .await
    .unwrap());

    let relate = json!({ "operation": "relateObjectToService", "params": {
        "objectClassName": "Router", "objectId": site.router,
        "serviceClassName": "DataService", "serviceId": service
    } });
    call::<ServicesCall>(&slice, relate.clone()).await.unwrap();
    assert!(matches!(
        call::<ServicesCall>(&slice, relate).await,
        Err(InventoryError::OperationNotPermitted { .. })
    ));
    let services = call::<ServicesCall>(
        &slice,
        json!({ "operation": "getServicesForObject", "params": { "className": "Router", "id": site.router } }),
    )
    .await
    .unwrap();
    assert_eq!(services[0]["name"], "Link 1");
    let affected = call::<ServicesCall>(
        &slice,
        json!({ "operation": "getAffectedServices", "params": { "resourceType": 1, "resourceDefinition": "Router-1" } }),
    )
    .await
    .unwrap();
    assert_eq!(affected["inventoryObjects"][0]["id"], site.router.as_str());
    assert_eq!(affected["services"][0]["customer"]["name"], "ACME");
    assert_eq!(affected["services"][0]["services"][0]["name"], "Link 1");

    let contact = id(&call::<ServicesCall>(
        &slice,
        json!({ "operation": "createContact", "params": {
            "className": "TechnicalContact",
            "properties": { "name": "Ada", "email": "ada@example.com" },
            "customerClassName": "CorporateCustomer", "customerId": customer
        } }),
    )
    .await
    .unwrap());
    let found = call::<ServicesCall>(&slice, json!({ "operation": "searchForContacts", "params": { "searchString": "EXAMPLE" } }))
        .await
        .unwrap();
    assert_eq!(found[0]["id"], contact.as_str());
    assert_eq!(found[0]["customer"]["name"], "ACME");

    let delete = json!({ "operation": "deleteCustomer", "params": { "className": "CorporateCustomer", "id": customer } });
    assert!(matches!(
        call::<ServicesCall>(&slice, delete.clone()).await,
        Err(InventoryError::OperationNotPermitted { .. })
    ));
    call::<ServicesCall>(
        &slice,
        json!({ "operation": "releaseObjectFromService", "params": {
            "serviceClassName": "DataService", "serviceId": service, "objectId": site.router
        } }),
    )
    .await
    .unwrap();
    call::<ServicesCall>(&slice, delete).await.unwrap();

    let services = call::<ServicesCall>(&slice, json!({ "operation": "getAllServices", "params": {} })).await.unwrap();
    assert_eq!(services, json!([]));
    let contacts = call::<ServicesCall>(&slice, json!({ "operation": "searchForContacts", "params": {} })).await.unwrap();
    assert_eq!(contacts, json!([]));
}

#[tokio::test]
async fn contracts_and_projects_track_their_resources() {
    let (slice, site) = setup();
    let router = json!({ "className": "Router", "id": site.router });

    let pool = id(&call::<ContractsCall>(&slice, json!({ "operation": "createContractPool", "params": { "name": "Support" } }))
        .await
        .unwrap());
    let contract = id(&call::<ContractsCall>(
        &slice,
        json!({ "operation": "createContract", "params": {
            "poolId": pool, "className": "SupportContract", "attributes": { "name": "SLA-7" }
        } }),
    )
    .await
    .unwrap());
    call::<ContractsCall>(
        &slice,
        json!({ "operation": "relateObjectsToContract", "params": {
            "contractClassName": "SupportContract", "contractId": contract, "objects": [router]
        } }),
    )
    .await
    .unwrap();
    let resources = call::<ContractsCall>(
        &slice,
        json!({ "operation": "getContractResources", "params": { "contractClassName": "SupportContract", "contractId": contract } }),
    )
    .await
    .unwrap();
    assert_eq!(resources[0]["id"], site.router.as_str());
    call::<ContractsCall>(
        &slice,
        json!({ "operation": "releaseObjectFromContract", "params": { "contractId": contract, "objectId": site.router } }),
    )
    .await
    .unwrap();

    let pool = id(&call::<ProjectsCall>(&slice, json!({ "operation": "createProjectPool", "params": { "name": "Rollout" } }))
        .await
        .unwrap());
    let project = id(&call::<ProjectsCall>(
        &slice,
        json!({ "operation": "createProject", "params": {
            "poolId": pool, "className": "GeneralProject", "attributes": { "name": "Backbone" }
        } }),
    )
    .await
    .unwrap());
    call::<ProjectsCall>(
        &slice,
        json!({ "operation": "createActivity", "params": {
            "projectClassName": "GeneralProject", "projectId": project,
            "className": "GeneralActivity", "attributes": { "name": "Survey" }
        } }),
    )
    .await
    .unwrap();
    call::<ProjectsCall>(
        &slice,
        json!({ "operation": "relateObjectsToProject", "params": {
            "projectClassName": "GeneralProject", "projectId": project, "objects": [router]
        } }),
    )
    .await
    .unwrap();
    let projects = call::<ProjectsCall>(
        &slice,
        json!({ "operation": "getProjectsRelatedToObject", "params": { "className": "Router", "id": site.router } }),
    )
    .await
    .unwrap();
    assert_eq!(projects[0]["name"], "Backbone");

    call::<ProjectsCall>(
        &slice,
        json!({ "operation": "deleteProject", "params": {
            "className": "GeneralProject", "id": project, "releaseRelationships": true
        } }),
    )
    .await
    .unwrap();
    let projects = call::<ProjectsCall>(&slice, json!({ "operation": "getAllProjects", "params": {} })).await.unwrap();
    assert_eq!(projects, json!([]));
}

#[tokio::test]
async fn warehouses_hold_spares_next_to_a_node() {
    let (slice, site) = setup();
    let (root, warehouse, spares) = site
        .database
        .write(|t| {
            let root = kw_services::catalog::create_root_pool(t, "GenericWarehouse", "Stores", "")?;
            let attributes = BTreeMap::from([("name".to_owned(), "North".to_owned())]);
            let warehouse = kw_services::catalog::create_item(t, "GenericWarehouse", &root, "Warehouse", &attributes, None)?;
            let owner = kw_domain::model::ObjectKey::new("Warehouse", warehouse.clone());
            let spares =
                kw_services::catalog::create_pool_in_object(t, &owner, "GenericCommunicationsElement", "Spares", "")?;
            Ok::<_, InventoryError>((root, warehouse, spares))
        })
        .unwrap();

    let pools = call::<WarehousesCall>(&slice, json!({ "operation": "getWarehouseRootPools", "params": {} })).await.unwrap();
    assert_eq!(pools[0]["id"], root.as_str());

    call::<WarehousesCall>(
        &slice,
        json!({ "operation": "associatePhysicalNodeToWarehouse", "params": {
            "objectClass": "Rack", "objectId": site.rack, "warehouseClass": "Warehouse", "warehouseId": warehouse
        } }),
    )
    .await
    .unwrap();
    let router = json!([{ "className": "Router", "id": site.router }]);
    call::<WarehousesCall>(
        &slice,
        json!({ "operation": "moveObjectsToWarehousePool", "params": { "targetOid": spares, "objects": router } }),
    )
    .await
    .unwrap();

    let holder = call::<WarehousesCall>(
        &slice,
        json!({ "operation": "getWarehouseToObject", "params": { "objectClassName": "Router", "objectId": site.router } }),
    )
    .await
    .unwrap();
    assert_eq!(holder["name"], "North");
    let node = call::<WarehousesCall>(
        &slice,
        json!({ "operation": "getPhysicalNodeToObjectInWarehouse", "params": {
            "objectClassName": "Router", "objectId": site.router
        } }),
    )
    .await
    .unwrap();
    assert_eq!(node["id"], site.rack.as_str());

    call::<WarehousesCall>(
        &slice,
        json!({ "operation": "releasePhysicalNodeFromWarehouse", "params": {
            "warehouseClass": "Warehouse", "warehouseId": warehouse, "targetId": site.rack
        } }),
    )
    .await
    .unwrap();
    let node = call::<WarehousesCall>(
        &slice,
        json!({ "operation": "getPhysicalNodeToObjectInWarehouse", "params": {
            "objectClassName": "Router", "objectId": site.router
        } }),
    )
    .await
    .unwrap();
    assert_eq!(node, Value::Null);
}
