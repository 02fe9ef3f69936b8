use crate::schema::{self, is_list_type};
use crate::values::{self, RemoteObject};
use kw_database::{ObjectStore, Tables};
use kw_domain::constants::{ATTRIBUTE_DISPLAY_NAME, CLASS_GENERIC_OBJECT_LIST};
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::metadata::{AttributeValue, ClassLight};
use kw_domain::model::{Id, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::validation;
use kw_kernel::{new_id, now_millis};
use std::collections::BTreeMap;

fn item<'a>(tables: &'a Tables, class_name: &str, id: &str) -> Result<&'a BusinessObject, InventoryError> {
    tables.list_items.get_of_class(class_name, id).ok_or_else(|| {
        InventoryError::not_found(format!("List type item {id} of class {class_name} could not be found"))
    })
}

fn holds(object: &BusinessObject, item_id: &str) -> bool {
    object.attributes.values().any(|v| matches!(v, AttributeValue::ListItem(id) if id == item_id))
}

fn users<'a>(store: &'a ObjectStore, item_id: &'a str) -> impl Iterator<Item = &'a BusinessObject> + use<'a> {
    store.iter().filter(move |o| holds(o, item_id))
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] when the class is not a list type or the name is blank.
/// * [`InventoryError::OperationNotPermitted`] for abstract list types.
pub fn create_item(
    tables: &mut Tables,
    class_name: &str,
    name: &str,
    display_name: &str,
) -> Result<Id, InventoryError> {
    schema::instanceable(tables, class_name, CLASS_GENERIC_OBJECT_LIST)?;
    let name = validation::not_blank(name, "List type item name")?;

    let mut attributes = BTreeMap::new();
    if !display_name.trim().is_empty() {
        attributes.insert(ATTRIBUTE_DISPLAY_NAME.to_owned(), AttributeValue::String(display_name.trim().to_owned()));
    }
    let id = new_id();
    tables.list_items.insert(BusinessObject {
        id: id.clone(),
        class_name: class_name.to_owned(),
        name: name.to_owned(),
        parent: ParentRef::Root,
        attributes,
        creation_date: now_millis(),
    });
    Ok(id)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown items, and any attribute parsing error.
pub fn update_item(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<(), InventoryError> {
    item(tables, class_name, id)?;
    let changes = values::parse_attributes(tables, class_name, attributes)?;
    if changes.name.as_deref().is_some_and(str::is_empty) {
        return Err(InventoryError::invalid("List type item name can not be empty"));
    }
    tables.list_items.edit(id, |item| changes.apply(item));
    Ok(())
}

/// Deletes an item. Objects still pointing at it block the deletion unless
/// `release_relationships` is set, in which case their values are cleared.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown items.
/// * [`InventoryError::OperationNotPermitted`] when the item is in use.
pub fn delete_item(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    release_relationships: bool,
) -> Result<(), InventoryError> {
    item(tables, class_name, id)?;
    let in_use: Vec<Id> = users(&tables.objects, id).map(|o| o.id.clone()).collect();
    let in_templates: Vec<Id> = users(&tables.templates, id).map(|o| o.id.clone()).collect();
    if !release_relationships && !(in_use.is_empty() && in_templates.is_empty()) {
        return Err(InventoryError::not_permitted(format!(
            "List type item {id} is used by {} objects",
            in_use.len() + in_templates.len()
        )));
    }

    let clear = |object: &mut BusinessObject| {
        object.attributes.retain(|_, v| !matches!(v, AttributeValue::ListItem(item) if item == id));
    };
    for object_id in in_use {
        tables.objects.edit(&object_id, clear);
    }
    for object_id in in_templates {
        tables.templates.edit(&object_id, clear);
    }
    tables.list_items.remove(id);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown items.
pub fn get_item(tables: &Tables, class_name: &str, id: &str) -> Result<RemoteObject, InventoryError> {
    item(tables, class_name, id).map(RemoteObject::from)
}

/// Items of `class_name`, sorted by name.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] when the class is not a list type.
pub fn get_items(tables: &Tables, class_name: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    schema::class(tables, class_name)?;
    if !is_list_type(tables, class_name) {
        return Err(InventoryError::invalid(format!("Class {class_name} is not a list type")));
    }
    let mut items: Vec<ObjectLight> = tables.list_items.of_class(class_name).map(BusinessObject::light).collect();
    items.sort();
    Ok(items)
}

#[must_use]
pub fn instanceable_list_types(tables: &Tables) -> Vec<ClassLight> {
    tables
        .classes
        .all_subclasses(CLASS_GENERIC_OBJECT_LIST)
        .into_iter()
        .filter(|c| !c.is_abstract && !c.in_design)
        .map(ClassLight::from)
        .collect()
}

/// Objects and template elements whose attributes point at the item. `limit <= 0` returns all.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown items.
pub fn item_uses(tables: &Tables, class_name: &str, id: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    item(tables, class_name, id)?;
    validation::paginate(
        users(&tables.objects, id).chain(users(&tables.templates, id)).map(BusinessObject::light),
        1,
        limit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::seed_core_model;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables
    }

    fn router_using(tables: &mut Tables, vendor: &str) {
        tables.objects.insert(BusinessObject {
            id: "r1".to_owned(),
            class_name: "Router".to_owned(),
            name: "r1".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::from([("vendor".to_owned(), AttributeValue::ListItem(vendor.to_owned()))]),
            creation_date: 0,
        });
    }

    #[test]
    fn items_belong_to_concrete_list_types() {
        let mut tables = tables();
        let id = create_item(&mut tables, "EquipmentVendor", "Cisco", "Cisco Systems").unwrap();
        let remote = get_item(&tables, "EquipmentVendor", &id).unwrap();
        assert_eq!(remote.attributes["displayName"], "Cisco Systems");

        assert!(create_item(&mut tables, "GenericObjectList", "x", "").is_err());
        assert!(create_item(&mut tables, "Router", "x", "").is_err());
        assert!(create_item(&mut tables, "EquipmentVendor", " ", "").is_err());
        assert_eq!(get_items(&tables, "EquipmentVendor").unwrap().len(), 1);
        assert!(instanceable_list_types(&tables).iter().any(|c| c.name == "OperationalState"));
    }

    #[test]
    fn used_items_need_release() {
        let mut tables = tables();
        let id = create_item(&mut tables, "EquipmentVendor", "Cisco", "").unwrap();
        router_using(&mut tables, &id);

        assert_eq!(item_uses(&tables, "EquipmentVendor", &id, 0).unwrap().len(), 1);
        let err = delete_item(&mut tables, "EquipmentVendor", &id, false).unwrap_err();
        assert!(matches!(err, InventoryError::OperationNotPermitted { .. }));

        delete_item(&mut tables, "EquipmentVendor", &id, true).unwrap();
        assert!(tables.objects.get("r1").unwrap().attributes.is_empty());
        assert!(get_item(&tables, "EquipmentVendor", &id).is_err());
    }

    #[test]
    fn items_can_be_renamed() {
        let mut tables = tables();
        let id = create_item(&mut tables, "OperationalState", "Up", "").unwrap();
        let rename = BTreeMap::from([("name".to_owned(), "Operational".to_owned())]);
        update_item(&mut tables, "OperationalState", &id, &rename).unwrap();
        assert_eq!(get_item(&tables, "OperationalState", &id).unwrap().name, "Operational");
    }
}
