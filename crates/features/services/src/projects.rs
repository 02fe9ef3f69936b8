//! Projects, their activities and the resources they use.
//!
//! Activities are special children of their project, so deleting a project takes them
//! along. Resources are linked with `projectsProjectUses`.

use crate::catalog;
use kw_business::navigation::sorted;
use kw_business::objects::{self, NewObject, Removed, Store};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_ACTIVITY, CLASS_GENERIC_PROJECT, REL_PROJECT_USES};
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use std::collections::BTreeMap;

fn project_key(tables: &Tables, project: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    Ok(catalog::member(tables, CLASS_GENERIC_PROJECT, &project.class_name, &project.id)?.key())
}

/// Adds an activity to a project.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown projects and classes that are not activities.
/// * Attribute errors as reported by object creation.
pub fn create_activity(
    tables: &mut Tables,
    project: &ObjectKey,
    class_name: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    let project = project_key(tables, project)?;
    catalog::ensure_family(tables, CLASS_GENERIC_ACTIVITY, class_name)?;
    let new = NewObject {
        class_name: class_name.to_owned(),
        parent_class_name: project.class_name,
        parent_id: project.id,
        attributes: attributes.clone(),
        template_id: None,
    };
    objects::create_object(tables, Store::Objects, &new, true)
}

/// # Errors
/// See [`catalog::delete_member`].
pub fn delete_activity(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    release_relationships: bool,
) -> Result<Removed, InventoryError> {
    catalog::delete_member(tables, CLASS_GENERIC_ACTIVITY, class_name, id, release_relationships)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown projects.
pub fn activities(tables: &Tables, project: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    let project = project_key(tables, project)?;
    let lights = tables
        .objects
        .children_of(&ParentRef::Special(project))
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, CLASS_GENERIC_ACTIVITY))
        .map(BusinessObject::light)
        .collect();
    Ok(sorted(lights, 0))
}

/// # Errors
/// See [`catalog::relate_all`], plus [`InventoryError::NotFound`] for unknown projects.
pub fn relate_to_project(
    tables: &mut Tables,
    project: &ObjectKey,
    objects: &[ObjectKey],
) -> Result<Vec<ObjectKey>, InventoryError> {
    let project = project_key(tables, project)?;
    catalog::relate_all(tables, &project, objects, REL_PROJECT_USES)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown projects and objects the project does not use.
pub fn release_from_project(tables: &mut Tables, project: &ObjectKey, object_id: &str) -> Result<(), InventoryError> {
    let project = project_key(tables, project)?;
    catalog::release(tables, &project, object_id, REL_PROJECT_USES)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown projects.
pub fn project_resources(tables: &Tables, project: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    let project = project_key(tables, project)?;
    relationships::special_attribute(tables, &project, REL_PROJECT_USES)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn projects_of_object(tables: &Tables, object: &ObjectKey) -> Result<Vec<ObjectLight>, InventoryError> {
    catalog::holders_of(tables, object, CLASS_GENERIC_PROJECT, REL_PROJECT_USES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_item, create_root_pool, delete_member};
    use kw_domain::constants::ATTRIBUTE_NAME;
    use kw_metadata::bootstrap::seed_core_model;

    fn named(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())])
    }

    #[test]
    fn activities_go_with_their_project() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let pool = create_root_pool(&mut tables, CLASS_GENERIC_PROJECT, "Rollouts", "").unwrap();
        let id = create_item(&mut tables, CLASS_GENERIC_PROJECT, &pool, "GeneralProject", &named("fiber"), None).unwrap();
        let project = ObjectKey::new("GeneralProject", id.clone());
        create_activity(&mut tables, &project, "GeneralActivity", &named("survey")).unwrap();
        assert!(create_activity(&mut tables, &project, "Router", &named("r")).is_err());
        assert_eq!(activities(&tables, &project).unwrap()[0].name, "survey");

        let other = create_item(&mut tables, CLASS_GENERIC_PROJECT, &pool, "GeneralProject", &named("radio"), None).unwrap();
        relate_to_project(&mut tables, &project, &[ObjectKey::new("GeneralProject", other.clone())]).unwrap();
        assert_eq!(projects_of_object(&tables, &ObjectKey::new("GeneralProject", other.clone())).unwrap().len(), 1);
        assert!(delete_member(&mut tables, CLASS_GENERIC_PROJECT, "GeneralProject", &id, false).is_err());
        release_from_project(&mut tables, &project, &other).unwrap();

        let removed = delete_member(&mut tables, CLASS_GENERIC_PROJECT, "GeneralProject", &id, false).unwrap();
        assert_eq!(removed.objects.len(), 2);
    }
}
