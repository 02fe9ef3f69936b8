use kw_business::objects::{self, NewObject, Store};
use kw_database::Database;
use kw_domain::privileges::{Access, FeatureSet};
use kw_ipam::{Ipam, IpamCall, init};
use kw_kernel::call::{CallContext, Caller, SliceCall};
use kw_kernel::error::InventoryError;
use serde_json::{Value, json};
use std::collections::BTreeMap;

fn place(database: &Database, class_name: &str, parent_class: &str, parent_id: &str, special: bool) -> String {
    let new = NewObject {
        class_name: class_name.to_owned(),
        parent_class_name: parent_class.to_owned(),
        parent_id: parent_id.to_owned(),
        attributes: BTreeMap::from([("name".to_owned(), format!("{class_name}-1"))]),
        template_id: None,
    };
    database.write(|t| objects::create_object(t, Store::Objects, &new, special)).unwrap()
}

struct Site {
    port: String,
    interface: String,
    vlan: String,
    vrf: String,
}

fn setup() -> (Ipam, Site) {
    let database = Database::in_memory();
    kw_metadata::init(&database).unwrap();
    let country = place(&database, "Country", "DummyRoot", "-1", false);
    let city = place(&database, "City", "Country", &country, false);
    let building = place(&database, "Building", "City", &city, false);
    let rack = place(&database, "Rack", "Building", &building, false);
    let router = place(&database, "Router", "Rack", &rack, false);
    let site = Site {
        port: place(&database, "OpticalPort", "Router", &router, false),
        interface: place(&database, "VirtualPort", "Router", &router, false),
        vlan: place(&database, "VLAN", "Router", &router, true),
        vrf: place(&database, "VRFInstance", "Router", &router, true),
    };
    let slice = init(&database, None).unwrap().state::<Ipam>().unwrap().clone();
    (slice, site)
}

async fn call(slice: &Ipam, request: Value) -> Result<Value, InventoryError> {
    let call: IpamCall = serde_json::from_value(request).unwrap();
    let ctx = CallContext::detached(Caller::system(), call.as_ref().to_owned());
    call.execute(slice, &ctx).await
}

fn id(value: &Value) -> String {
    value.as_str().unwrap().to_owned()
}

#[test]
fn operation_names_keep_their_acronyms() {
    for name in ["addIPAddress", "removeIP", "relateIPtoPort", "releasePortFromIP", "releaseSubnetFromVRF"] {
        assert!(IpamCall::operations().contains(&name), "{name}");
    }
    assert_eq!(IpamCall::operations().len(), 21);

    let read: IpamCall = serde_json::from_value(json!({
        "operation": "itOverlaps",
        "params": { "networkIp": "10.0.0.0", "broadcastIp": "10.0.0.255" }
    }))
    .unwrap();
    assert_eq!(read.requirement().access, Access::Read);
    assert_eq!(read.requirement().feature, FeatureSet::IPAM);
}

#[tokio::test]
async fn subnets_and_addresses_through_calls() {
    let (slice, site) = setup();
    let roots = call(&slice, json!({ "operation": "getSubnetPools", "params": { "parentId": "-1", "className": "SubnetIPv4" } }))
        .await
        .unwrap();
    assert_eq!(roots[0]["name"], "IPv4 Root");

    let pool = id(&call(
        &slice,
        json!({ "operation": "createSubnetPool", "params": {
            "parentId": "-1", "subnetPoolName": "Backbone", "className": "SubnetIPv4"
        } }),
    )
    .await
    .unwrap());
    let wide = id(&call(
        &slice,
        json!({ "operation": "createSubnet", "params": {
            "poolId": pool, "className": "SubnetIPv4", "attributes": { "name": "10.20.0.0/16" }
        } }),
    )
    .await
    .unwrap());
    let lan = id(&call(
        &slice,
        json!({ "operation": "createSubnet", "params": {
            "parentId": wide, "className": "SubnetIPv4", "attributes": { "name": "10.20.1.0/24" }
        } }),
    )
    .await
    .unwrap());

    let nested = call(&slice, json!({ "operation": "getSubnetsInSubnet", "params": { "id": wide, "className": "SubnetIPv4" } }))
        .await
        .unwrap();
    assert_eq!(nested[0]["name"], "10.20.1.0/24");
    let stored = call(&slice, json!({ "operation": "getSubnet", "params": { "id": lan, "className": "SubnetIPv4" } }))
        .await
        .unwrap();
    assert_eq!(stored["attributes"]["hosts"], "254");

    let ip = id(&call(
        &slice,
        json!({ "operation": "addIPAddress", "params": {
            "id": lan, "parentClassName": "SubnetIPv4", "attributes": { "name": "10.20.1.1" }
        } }),
    )
    .await
    .unwrap());
    let used = call(&slice, json!({ "operation": "getSubnetUsedIps", "params": { "id": lan, "className": "SubnetIPv4" } }))
        .await
        .unwrap();
    assert_eq!(used[0]["name"], "10.20.1.1");

    let overlap = call(&slice, json!({ "operation": "itOverlaps", "params": {
        "networkIp": "10.20.1.128", "broadcastIp": "10.20.1.255"
    } }))
    .await
    .unwrap();
    assert_eq!(overlap, json!(true));

    call(&slice, json!({ "operation": "relateIPtoPort", "params": {
        "id": ip, "deviceClassName": "OpticalPort", "deviceId": site.port
    } }))
    .await
    .unwrap();
    let refused = call(&slice, json!({ "operation": "removeIP", "params": { "ids": [ip] } })).await;
    assert!(matches!(refused, Err(InventoryError::OperationNotPermitted { .. })));
    call(&slice, json!({ "operation": "releasePortFromIP", "params": {
        "deviceClassName": "OpticalPort", "deviceId": site.port, "id": ip
    } }))
    .await
    .unwrap();
    call(&slice, json!({ "operation": "removeIP", "params": { "ids": [ip] } })).await.unwrap();

    let deleted = call(&slice, json!({ "operation": "deleteSubnetPools", "params": { "ids": [pool] } })).await;
    assert!(deleted.is_ok());
    let gone = call(&slice, json!({ "operation": "getSubnet", "params": { "id": wide, "className": "SubnetIPv4" } })).await;
    assert!(matches!(gone, Err(InventoryError::NotFound { .. })));
}

#[tokio::test]
async fn vlans_vrfs_and_interfaces_link_once() {
    let (slice, site) = setup();
    let pool = id(&call(
        &slice,
        json!({ "operation": "createSubnetPool", "params": {
            "parentId": "-1", "subnetPoolName": "Customers", "className": "SubnetIPv6"
        } }),
    )
    .await
    .unwrap());
    let subnet = id(&call(
        &slice,
        json!({ "operation": "createSubnet", "params": {
            "poolId": pool, "className": "SubnetIPv6", "attributes": { "name": "2001:db8:10::/48" }
        } }),
    )
    .await
    .unwrap());

    let to_vlan = json!({ "operation": "relateSubnetToVlan", "params": {
        "id": subnet, "className": "SubnetIPv6", "vlanId": site.vlan
    } });
    call(&slice, to_vlan.clone()).await.unwrap();
    assert!(matches!(call(&slice, to_vlan).await, Err(InventoryError::OperationNotPermitted { .. })));
    call(&slice, json!({ "operation": "relateSubnetToVrf", "params": {
        "id": subnet, "className": "SubnetIPv6", "vrfId": site.vrf
    } }))
    .await
    .unwrap();
    let wrong_end = call(&slice, json!({ "operation": "relateSubnetToVlan", "params": {
        "id": subnet, "className": "SubnetIPv6", "vlanId": site.vrf
    } }))
    .await;
    assert!(matches!(wrong_end, Err(InventoryError::NotFound { .. })));

    call(&slice, json!({ "operation": "releaseSubnetFromVlan", "params": { "subnetId": subnet, "vlanId": site.vlan } }))
        .await
        .unwrap();
    call(&slice, json!({ "operation": "releaseSubnetFromVRF", "params": { "subnetId": subnet, "vrfId": site.vrf } }))
        .await
        .unwrap();
    let again = call(&slice, json!({ "operation": "releaseSubnetFromVlan", "params": { "subnetId": subnet, "vlanId": site.vlan } }))
        .await;
    assert!(matches!(again, Err(InventoryError::NotFound { .. })));

    call(&slice, json!({ "operation": "relatePortToInterface", "params": {
        "portId": site.port, "portClassName": "OpticalPort",
        "interfaceClassName": "VirtualPort", "interfaceId": site.interface
    } }))
    .await
    .unwrap();
    call(&slice, json!({ "operation": "releasePortFromInterface", "params": {
        "interfaceClassName": "VirtualPort", "interfaceId": site.interface, "portId": site.port
    } }))
    .await
    .unwrap();
}
