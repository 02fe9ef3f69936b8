//! Contacts. They live outside the containment tree and are reached through the customer
//! they were created for, linked with the `contacts` relationship.

use crate::catalog;
use kw_business::navigation::sorted;
use kw_business::objects;
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_CONTACT, CLASS_GENERIC_CUSTOMER, REL_CONTACTS};
use kw_domain::model::application::FileObject;
use kw_domain::model::inventory::BusinessObject;
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_metadata::values::{self, RemoteObject};
use serde::Serialize;
use std::collections::BTreeMap;

/// A contact with the customer it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteContact {
    #[serde(flatten)]
    pub contact: RemoteObject,
    pub customer: Option<ObjectLight>,
}

fn remote(tables: &Tables, contact: &BusinessObject) -> RemoteContact {
    let customer = tables
        .relationships
        .related(&contact.key(), REL_CONTACTS)
        .iter()
        .filter_map(|key| relationships::light(tables, key))
        .find(|o| tables.classes.is_subclass_of(&o.class_name, CLASS_GENERIC_CUSTOMER));
    RemoteContact { contact: RemoteObject::from(contact), customer }
}

/// Creates a contact for a customer.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown customers and classes outside the contacts.
/// * Attribute errors as reported by object creation.
pub fn create_contact(
    tables: &mut Tables,
    class_name: &str,
    properties: &BTreeMap<String, String>,
    customer: &ObjectKey,
) -> Result<Id, InventoryError> {
    let customer = catalog::member(tables, CLASS_GENERIC_CUSTOMER, &customer.class_name, &customer.id)?.key();
    catalog::ensure_family(tables, CLASS_GENERIC_CONTACT, class_name)?;
    let id = objects::create_detached_object(tables, class_name, CLASS_GENERIC_CONTACT, properties)?;
    relationships::insert(tables, customer, ObjectKey::new(class_name, id.clone()), REL_CONTACTS, BTreeMap::new());
    Ok(id)
}

/// Changes attributes of a contact. Returns what changed, for the activity log.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown contacts.
/// * [`InventoryError::InvalidArgument`] for bad values or an empty name.
pub fn update_contact(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    properties: &BTreeMap<String, String>,
) -> Result<String, InventoryError> {
    let contact = catalog::member(tables, CLASS_GENERIC_CONTACT, class_name, id)?;
    let changes = values::parse_attributes(tables, &contact.class_name, properties)?;
    if changes.name.as_deref().is_some_and(str::is_empty) {
        return Err(InventoryError::invalid("The name of a contact can not be empty"));
    }
    let id = contact.id.clone();
    tables.objects.edit(&id, |object| changes.apply(object));
    Ok(properties.keys().cloned().collect::<Vec<_>>().join(", "))
}

/// Drops a contact record and its links. Returns the attachment records that went with it.
pub(crate) fn forget(tables: &mut Tables, key: &ObjectKey) -> Vec<FileObject> {
    tables.relationships.release_all(key);
    tables.objects.remove(&key.id);
    let files: Vec<Id> = tables.files.values().filter(|f| &f.object == key).map(|f| f.id.clone()).collect();
    files.iter().filter_map(|id| tables.files.remove(id)).collect()
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown contacts.
pub fn delete_contact(tables: &mut Tables, class_name: &str, id: &str) -> Result<Vec<FileObject>, InventoryError> {
    let key = catalog::member(tables, CLASS_GENERIC_CONTACT, class_name, id)?.key();
    Ok(forget(tables, &key))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown contacts.
pub fn contact(tables: &Tables, class_name: &str, id: &str) -> Result<RemoteContact, InventoryError> {
    catalog::member(tables, CLASS_GENERIC_CONTACT, class_name, id).map(|c| remote(tables, c))
}

/// Contacts whose name or any attribute contains `text`, ignoring case.
#[must_use]
pub fn search_contacts(tables: &Tables, text: &str, limit: i64) -> Vec<RemoteContact> {
    let needle = text.trim().to_lowercase();
    let matches = |contact: &&BusinessObject| {
        needle.is_empty()
            || contact.name.to_lowercase().contains(&needle)
            || contact.attributes.values().any(|v| v.to_string().to_lowercase().contains(&needle))
    };
    let found: Vec<ObjectLight> = tables
        .objects
        .iter()
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, CLASS_GENERIC_CONTACT))
        .filter(matches)
        .map(BusinessObject::light)
        .collect();
    sorted(found, limit)
        .iter()
        .filter_map(|light| tables.objects.get(&light.id))
        .map(|contact| remote(tables, contact))
        .collect()
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown customers.
pub fn contacts_for_customer(tables: &Tables, customer: &ObjectKey) -> Result<Vec<RemoteContact>, InventoryError> {
    let customer = catalog::member(tables, CLASS_GENERIC_CUSTOMER, &customer.class_name, &customer.id)?.key();
    let mut found: Vec<&BusinessObject> = tables
        .relationships
        .related(&customer, REL_CONTACTS)
        .iter()
        .filter_map(|key| tables.objects.get_by_key(key))
        .collect();
    found.sort_by(|a, b| a.light().cmp(&b.light()));
    Ok(found.into_iter().map(|contact| remote(tables, contact)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_item, create_root_pool};
    use crate::customers::delete_customer;
    use kw_domain::constants::ATTRIBUTE_NAME;
    use kw_metadata::bootstrap::seed_core_model;

    fn attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn contacts_follow_their_customer() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let pool = create_root_pool(&mut tables, CLASS_GENERIC_CUSTOMER, "Customers", "").unwrap();
        let acme = create_item(
            &mut tables,
            CLASS_GENERIC_CUSTOMER,
            &pool,
            "CorporateCustomer",
            &attributes(&[(ATTRIBUTE_NAME, "Acme")]),
            None,
        )
        .unwrap();
        let customer = ObjectKey::new("CorporateCustomer", acme.clone());
        let ana = create_contact(
            &mut tables,
            "TechnicalContact",
            &attributes(&[(ATTRIBUTE_NAME, "Ana"), ("email", "ana@acme.example")]),
            &customer,
        )
        .unwrap();
        assert!(create_contact(&mut tables, "Router", &BTreeMap::new(), &customer).is_err());

        let found = search_contacts(&tables, "ACME.example", 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer.as_ref().map(|c| c.name.as_str()), Some("Acme"));

        update_contact(&mut tables, "TechnicalContact", &ana, &attributes(&[("telephone", "555")])).unwrap();
        assert_eq!(contact(&tables, "GenericContact", &ana).unwrap().contact.attributes["telephone"], "555");
        assert!(update_contact(&mut tables, "TechnicalContact", &ana, &attributes(&[(ATTRIBUTE_NAME, "")])).is_err());

        delete_customer(&mut tables, "CorporateCustomer", &acme).unwrap();
        assert!(contact(&tables, "TechnicalContact", &ana).is_err());
        assert!(search_contacts(&tables, "", 0).is_empty());
    }
}
