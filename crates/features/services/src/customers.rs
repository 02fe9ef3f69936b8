//! Customers, the service pools they own, and the services in them. Services tie the
//! inventory objects they use through the `uses` relationship.

use crate::{catalog, contacts};
use kw_business::objects::{self, Removed, Store};
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_CONTACT, CLASS_GENERIC_CUSTOMER, CLASS_GENERIC_SERVICE, REL_CONTACTS, REL_USES};
use kw_domain::model::inventory::Pool;
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;

/// Deletes a customer with its service pools, services and contacts. Relationships of the
/// customer or its services other than the contact links block the deletion.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown customers.
/// * [`InventoryError::OperationNotPermitted`] while relationships remain.
pub fn delete_customer(tables: &mut Tables, class_name: &str, id: &str) -> Result<Removed, InventoryError> {
    let customer = catalog::member(tables, CLASS_GENERIC_CUSTOMER, class_name, id)?;
    let key = customer.key();
    for object in objects::subtree(tables, Store::Objects, customer).objects {
        let blocking = tables
            .relationships
            .of_object(&object)
            .find(|r| !(object == key && r.name == REL_CONTACTS));
        if let Some(relationship) = blocking {
            return Err(InventoryError::not_permitted(format!(
                "Object {object} has a {} relationship; release it first",
                relationship.name
            )));
        }
    }
    let linked: Vec<ObjectKey> = tables
        .relationships
        .related(&key, REL_CONTACTS)
        .into_iter()
        .filter(|c| tables.classes.is_subclass_of(&c.class_name, CLASS_GENERIC_CONTACT))
        .collect();
    let mut removed = objects::delete_objects(tables, Store::Objects, &[key], true)?;
    for contact in &linked {
        removed.files.extend(contacts::forget(tables, contact));
    }
    Ok(removed)
}

/// # Errors
/// See [`catalog::create_pool_in_object`], plus [`InventoryError::NotFound`] for owners
/// that are not customers.
pub fn create_service_pool(
    tables: &mut Tables,
    customer: &ObjectKey,
    name: &str,
    description: &str,
) -> Result<Id, InventoryError> {
    let owner = catalog::member(tables, CLASS_GENERIC_CUSTOMER, &customer.class_name, &customer.id)?.key();
    catalog::create_pool_in_object(tables, &owner, CLASS_GENERIC_SERVICE, name, description)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown customers.
pub fn service_pools(tables: &Tables, customer: &ObjectKey) -> Result<Vec<Pool>, InventoryError> {
    catalog::member(tables, CLASS_GENERIC_CUSTOMER, &customer.class_name, &customer.id)?;
    kw_application::pools::pools_in_object(tables, &customer.class_name, &customer.id, Some(CLASS_GENERIC_SERVICE))
}

/// Relates objects to a service. Returns the objects as stored.
///
/// # Errors
/// See [`catalog::relate_all`], plus [`InventoryError::NotFound`] for unknown services.
pub fn relate_to_service(
    tables: &mut Tables,
    service: &ObjectKey,
    objects: &[ObjectKey],
) -> Result<Vec<ObjectKey>, InventoryError> {
    let service = catalog::member(tables, CLASS_GENERIC_SERVICE, &service.class_name, &service.id)?.key();
    catalog::relate_all(tables, &service, objects, REL_USES)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown services and objects not related to them.
pub fn release_from_service(tables: &mut Tables, service: &ObjectKey, object_id: &str) -> Result<(), InventoryError> {
    let service = catalog::member(tables, CLASS_GENERIC_SERVICE, &service.class_name, &service.id)?.key();
    catalog::release(tables, &service, object_id, REL_USES)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown services.
pub fn objects_of_service(tables: &Tables, service: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    let service = catalog::member(tables, CLASS_GENERIC_SERVICE, &service.class_name, &service.id)?.key();
    kw_business::relationships::special_attribute(tables, &service, REL_USES)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn services_of_object(tables: &Tables, object: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    catalog::holders_of(tables, object, CLASS_GENERIC_SERVICE, REL_USES)
}
