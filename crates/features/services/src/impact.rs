//! Fault impact: the services, and the customers behind them, a failing resource takes
//! down.
//!
//! A hardware resource is written `device` or `device;port` by name. Everything contained
//! in it fails with it, and so do the connections ending on any of those objects.

use crate::catalog;
use kw_business::objects::{self, Store};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{
    CLASS_GENERIC_COMMUNICATIONS_ELEMENT, CLASS_GENERIC_CUSTOMER, CLASS_GENERIC_LOGICAL_CONNECTION,
    CLASS_GENERIC_PHYSICAL_CONTAINER, CLASS_GENERIC_PHYSICAL_LINK, CLASS_GENERIC_PORT, CLASS_GENERIC_SERVICE, REL_USES,
};
use kw_domain::model::inventory::BusinessObject;
use kw_domain::model::{ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const RESOURCE_TYPE_HARDWARE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerServices {
    /// `None` for services outside any customer's pools.
    pub customer: Option<ObjectLight>,
    pub services: Vec<ObjectLight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedServices {
    /// The failing resource first, then what fails with it.
    pub inventory_objects: Vec<ObjectLight>,
    pub services: Vec<CustomerServices>,
}

fn device_named<'a>(tables: &'a Tables, name: &str) -> Result<&'a BusinessObject, InventoryError> {
    let mut found = tables
        .objects
        .iter()
        .filter(|o| o.name == name && tables.classes.is_subclass_of(&o.class_name, CLASS_GENERIC_COMMUNICATIONS_ELEMENT));
    let device = found
        .next()
        .ok_or_else(|| InventoryError::not_found(format!("No communications element is named {name}")))?;
    if found.next().is_some() {
        return Err(InventoryError::invalid(format!("More than one communications element is named {name}")));
    }
    Ok(device)
}

fn is_connection(tables: &Tables, class_name: &str) -> bool {
    [CLASS_GENERIC_PHYSICAL_LINK, CLASS_GENERIC_PHYSICAL_CONTAINER, CLASS_GENERIC_LOGICAL_CONNECTION]
        .iter()
        .any(|family| tables.classes.is_subclass_of(class_name, family))
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for resource types other than hardware, empty
///   definitions and device names shared by several elements.
/// * [`InventoryError::NotFound`] for unknown devices or ports.
pub fn affected_services(tables: &Tables, resource_type: i32, definition: &str) -> Result<AffectedServices, InventoryError> {
    if resource_type != RESOURCE_TYPE_HARDWARE {
        return Err(InventoryError::invalid(format!("Resource type {resource_type} is not supported")));
    }
    let mut parts = definition.split(';').map(str::trim);
    let device_name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| InventoryError::invalid("The resource definition must name a device"))?;
    let device = device_named(tables, device_name)?;
    let resource = match parts.next().filter(|name| !name.is_empty()) {
        None => device,
        Some(port_name) => objects::subtree(tables, Store::Objects, device)
            .objects
            .iter()
            .filter_map(|key| tables.objects.get_by_key(key))
            .find(|o| o.name == port_name && tables.classes.is_subclass_of(&o.class_name, CLASS_GENERIC_PORT))
            .ok_or_else(|| InventoryError::not_found(format!("{device_name} has no port named {port_name}")))?,
    };

    let mut affected = objects::subtree(tables, Store::Objects, resource).objects;
    let ending: Vec<ObjectKey> = affected
        .iter()
        .flat_map(|key| tables.relationships.of_object(key).filter(move |r| &r.b == key).map(|r| r.a.clone()))
        .filter(|connection| is_connection(tables, &connection.class_name))
        .collect();
    for connection in ending {
        if !affected.contains(&connection) {
            affected.push(connection);
        }
    }

    let mut by_customer: BTreeMap<Option<ObjectKey>, Vec<ObjectLight>> = BTreeMap::new();
    let mut seen = BTreeSet::new();
    for key in &affected {
        for holder in tables.relationships.related(key, REL_USES) {
            if !tables.classes.is_subclass_of(&holder.class_name, CLASS_GENERIC_SERVICE) || !seen.insert(holder.clone()) {
                continue;
            }
            let Some(service) = tables.objects.get_by_key(&holder) else {
                continue;
            };
            let customer = catalog::pool_owner(tables, service)
                .filter(|owner| tables.classes.is_subclass_of(&owner.class_name, CLASS_GENERIC_CUSTOMER));
            by_customer.entry(customer).or_default().push(service.light());
        }
    }
    let services = by_customer
        .into_iter()
        .map(|(customer, mut services)| {
            services.sort_by(|a, b| a.name.cmp(&b.name));
            CustomerServices { customer: customer.and_then(|c| relationships::light(tables, &c)), services }
        })
        .collect();
    Ok(AffectedServices {
        inventory_objects: affected.iter().filter_map(|key| relationships::light(tables, key)).collect(),
        services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers;
    use kw_domain::constants::{ATTRIBUTE_NAME, REL_ENDPOINT_A};
    use kw_domain::model::inventory::ParentRef;
    use kw_metadata::bootstrap::seed_core_model;

    fn add(tables: &mut Tables, class_name: &str, id: &str, parent: ParentRef) -> ObjectKey {
        tables.objects.insert(BusinessObject {
            id: id.to_owned(),
            class_name: class_name.to_owned(),
            name: id.to_owned(),
            parent,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        ObjectKey::new(class_name, id)
    }

    fn named(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())])
    }

    #[test]
    fn failures_reach_customers_through_what_their_services_use() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let router = add(&mut tables, "Router", "edge", ParentRef::Root);
        let ge0 = add(&mut tables, "OpticalPort", "ge0", ParentRef::Child(router.clone()));
        add(&mut tables, "OpticalPort", "ge1", ParentRef::Child(router.clone()));
        let fiber = add(&mut tables, "OpticalLink", "fiber", ParentRef::Root);
        relationships::insert(&mut tables, fiber.clone(), ge0.clone(), REL_ENDPOINT_A, BTreeMap::new());

        let pool = catalog::create_root_pool(&mut tables, CLASS_GENERIC_CUSTOMER, "Customers", "").unwrap();
        let acme = catalog::create_item(&mut tables, CLASS_GENERIC_CUSTOMER, &pool, "CorporateCustomer", &named("ACME"), None)
            .unwrap();
        let acme = ObjectKey::new("CorporateCustomer", acme);
        let services = customers::create_service_pool(&mut tables, &acme, "Services", "").unwrap();
        let mut service = |name: &str, uses: &ObjectKey| {
            let id = catalog::create_item(&mut tables, CLASS_GENERIC_SERVICE, &services, "DataService", &named(name), None)
                .unwrap();
            let key = ObjectKey::new("DataService", id);
            customers::relate_to_service(&mut tables, &key, std::slice::from_ref(uses)).unwrap();
        };
        service("internet", &fiber);
        service("monitoring", &router);

        let port = affected_services(&tables, RESOURCE_TYPE_HARDWARE, "edge; ge0").unwrap();
        let failing: Vec<&str> = port.inventory_objects.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(failing, ["ge0", "fiber"]);
        assert_eq!(port.services.len(), 1);
        assert_eq!(port.services[0].customer.as_ref().unwrap().name, "ACME");
        assert_eq!(port.services[0].services[0].name, "internet");

        let device = affected_services(&tables, RESOURCE_TYPE_HARDWARE, "edge").unwrap();
        let names: Vec<&str> = device.services[0].services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["internet", "monitoring"]);

        assert!(matches!(affected_services(&tables, 2, "edge"), Err(InventoryError::InvalidArgument { .. })));
        assert!(matches!(affected_services(&tables, 1, " "), Err(InventoryError::InvalidArgument { .. })));
        assert!(matches!(affected_services(&tables, 1, "core"), Err(InventoryError::NotFound { .. })));
        assert!(matches!(affected_services(&tables, 1, "edge;ge9"), Err(InventoryError::NotFound { .. })));
    }
}
