//! Walking the containment tree.

use crate::objects::{self, Store};
use kw_database::Tables;
use kw_domain::constants::{CLASS_DUMMY_ROOT, POOL_CLASS, ROOT_ID};
use kw_domain::model::inventory::{BusinessObject, ParentRef, PoolOwner};
use kw_domain::model::{ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_metadata::values::RemoteObject;

/// The pseudo object standing for the containment root.
#[must_use]
pub fn dummy_root() -> ObjectLight {
    ObjectLight { id: ROOT_ID.to_owned(), class_name: CLASS_DUMMY_ROOT.to_owned(), name: CLASS_DUMMY_ROOT.to_owned() }
}

/// Sorts by name and keeps the first `limit` entries (`limit <= 0` keeps all).
pub fn sorted(mut lights: Vec<ObjectLight>, limit: i64) -> Vec<ObjectLight> {
    lights.sort();
    if let Ok(limit) = usize::try_from(limit)
        && limit > 0
    {
        lights.truncate(limit);
    }
    lights
}

fn parent_ref(tables: &Tables, class_name: &str, id: &str, special: bool) -> Result<ParentRef, InventoryError> {
    Ok(objects::resolve_parent(tables, Store::Objects, class_name, id, special)?.0)
}

/// Regular children, sorted by name. Parent id `-1` lists the top level.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown parents.
pub fn children(tables: &Tables, class_name: &str, id: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    let parent = parent_ref(tables, class_name, id, false)?;
    Ok(sorted(tables.objects.children_of(&parent).map(BusinessObject::light).collect(), limit))
}

/// Regular children that are instances of `filter_class` or its subclasses.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown parents.
pub fn children_of_class(
    tables: &Tables,
    class_name: &str,
    id: &str,
    filter_class: &str,
    limit: i64,
) -> Result<Vec<ObjectLight>, InventoryError> {
    let parent = parent_ref(tables, class_name, id, false)?;
    let lights = tables
        .objects
        .children_of(&parent)
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, filter_class))
        .map(BusinessObject::light)
        .collect();
    Ok(sorted(lights, limit))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown parents.
pub fn special_children(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    let parent = parent_ref(tables, class_name, id, true)?;
    Ok(sorted(tables.objects.children_of(&parent).map(BusinessObject::light).collect(), 0))
}

/// Objects sharing the parent of the given one, itself excluded.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn siblings(tables: &Tables, class_name: &str, id: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    let object = objects::object(tables, class_name, id)?;
    if object.parent == ParentRef::Detached {
        return Ok(Vec::new());
    }
    let lights = tables
        .objects
        .children_of(&object.parent)
        .filter(|o| o.id != object.id)
        .map(BusinessObject::light)
        .collect();
    Ok(sorted(lights, limit))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown parents.
pub fn count_children(tables: &Tables, class_name: &str, id: &str) -> Result<usize, InventoryError> {
    let parent = parent_ref(tables, class_name, id, false)?;
    Ok(tables.objects.count_children(&parent))
}

enum Step {
    Object(ObjectLight, ParentRef),
    Pool(ObjectLight, PoolOwner),
    Root,
}

fn pool_light(tables: &Tables, pool_id: &str) -> Option<(ObjectLight, PoolOwner)> {
    tables.pools.get(pool_id).map(|pool| {
        (ObjectLight { id: pool.id.clone(), class_name: POOL_CLASS.to_owned(), name: pool.name.clone() }, pool.owner.clone())
    })
}

fn step(tables: &Tables, parent: &ParentRef) -> Option<Step> {
    match parent {
        ParentRef::Root => Some(Step::Root),
        ParentRef::Child(key) | ParentRef::Special(key) => {
            tables.objects.get_by_key(key).map(|o| Step::Object(o.light(), o.parent.clone()))
        },
        ParentRef::Pool(pool_id) => pool_light(tables, pool_id).map(|(light, owner)| Step::Pool(light, owner)),
        ParentRef::Detached => None,
    }
}

/// Ancestors from the direct parent up to the containment root. Pools on the way show up
/// with class `Pool`; the root shows up as `DummyRoot` with id `-1`.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn parents(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    let object = objects::object(tables, class_name, id)?;
    let mut chain = Vec::new();
    let mut next = step(tables, &object.parent);
    while let Some(current) = next {
        if chain.len() > tables.objects.len() + tables.pools.len() {
            break;
        }
        next = match current {
            Step::Root => {
                chain.push(dummy_root());
                None
            },
            Step::Object(light, parent) => {
                chain.push(light);
                step(tables, &parent)
            },
            Step::Pool(light, owner) => {
                chain.push(light);
                match owner {
                    PoolOwner::Root => None,
                    PoolOwner::Object(key) => step(tables, &ParentRef::Child(key)),
                    PoolOwner::Pool(pool_id) => step(tables, &ParentRef::Pool(pool_id)),
                }
            },
        };
    }
    Ok(chain)
}

/// The direct parent.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] for objects outside the containment tree.
pub fn parent(tables: &Tables, class_name: &str, id: &str) -> Result<ObjectLight, InventoryError> {
    let object = objects::object(tables, class_name, id)?;
    match step(tables, &object.parent) {
        Some(Step::Root) => Ok(dummy_root()),
        Some(Step::Object(light, _) | Step::Pool(light, _)) => Ok(light),
        None => Err(InventoryError::invalid(format!("The parent of {} ({id}) could not be found", object.name))),
    }
}

/// Ancestors up to and including the first whose class is one of `classes` (or a subclass
/// of one). The root is never included.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn parents_until_first_of_class(
    tables: &Tables,
    class_name: &str,
    id: &str,
    classes: &[String],
) -> Result<Vec<ObjectLight>, InventoryError> {
    let mut chain = Vec::new();
    for ancestor in parents(tables, class_name, id)? {
        if ancestor.class_name == CLASS_DUMMY_ROOT {
            break;
        }
        let matched = ancestor.class_name != POOL_CLASS
            && classes.iter().any(|c| tables.classes.is_subclass_of(&ancestor.class_name, c));
        chain.push(ancestor);
        if matched {
            break;
        }
    }
    Ok(chain)
}

/// The closest ancestor that is an instance of `match_class` or one of its subclasses.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn first_parent_of_class(
    tables: &Tables,
    class_name: &str,
    id: &str,
    match_class: &str,
) -> Result<Option<RemoteObject>, InventoryError> {
    Ok(parents(tables, class_name, id)?
        .into_iter()
        .take_while(|a| a.class_name != POOL_CLASS && a.class_name != CLASS_DUMMY_ROOT)
        .find(|a| tables.classes.is_subclass_of(&a.class_name, match_class))
        .and_then(|a| tables.objects.get(&a.id))
        .map(RemoteObject::from))
}

/// The closest ancestor both objects share, `DummyRoot` when they only share the root.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn common_parent(tables: &Tables, a: &ObjectKey, b: &ObjectKey) -> Result<Option<ObjectLight>, InventoryError> {
    let of_b = parents(tables, &b.class_name, &b.id)?;
    Ok(parents(tables, &a.class_name, &a.id)?
        .into_iter()
        .find(|candidate| of_b.iter().any(|other| other.id == candidate.id && other.class_name == candidate.class_name)))
}

/// Instances of `class_name` and its subclasses.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn objects_of_class(tables: &Tables, class_name: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    kw_metadata::schema::class(tables, class_name)?;
    let mut lights = Vec::new();
    for class in std::iter::once(class_name.to_owned())
        .chain(tables.classes.all_subclasses(class_name).into_iter().map(|c| c.name.clone()))
    {
        lights.extend(tables.objects.of_class(&class).map(BusinessObject::light));
    }
    Ok(sorted(lights, limit))
}

/// Objects whose name is one of `names` and whose class is one of `class_names` or a
/// subclass of one. An empty class list matches every class.
#[must_use]
pub fn objects_by_name_and_class(tables: &Tables, names: &[String], class_names: &[String], limit: i64) -> Vec<ObjectLight> {
    let lights = tables
        .objects
        .iter()
        .filter(|o| names.iter().any(|n| n == &o.name))
        .filter(|o| class_names.is_empty() || class_names.iter().any(|c| tables.classes.is_subclass_of(&o.class_name, c)))
        .map(BusinessObject::light)
        .collect();
    sorted(lights, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{NewObject, create_object};
    use kw_domain::constants::ATTRIBUTE_NAME;
    use kw_metadata::bootstrap::seed_core_model;
    use std::collections::BTreeMap;

    fn create(tables: &mut Tables, class_name: &str, parent: (&str, &str), name: &str) -> String {
        let new = NewObject {
            class_name: class_name.to_owned(),
            parent_class_name: parent.0.to_owned(),
            parent_id: parent.1.to_owned(),
            attributes: BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())]),
            template_id: None,
        };
        create_object(tables, Store::Objects, &new, false).unwrap()
    }

    struct Site {
        tables: Tables,
        country: String,
        lima: String,
        hq: String,
        annex: String,
    }

    fn site() -> Site {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let country = create(&mut tables, "Country", ("DummyRoot", "-1"), "Peru");
        let lima = create(&mut tables, "City", ("Country", &country), "Lima");
        let hq = create(&mut tables, "Building", ("City", &lima), "HQ");
        let annex = create(&mut tables, "Building", ("City", &lima), "Annex");
        Site { tables, country, lima, hq, annex }
    }

    #[test]
    fn children_are_sorted_by_name() {
        let site = site();
        let names: Vec<_> =
            children(&site.tables, "City", &site.lima, 0).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Annex", "HQ"]);
        assert_eq!(children(&site.tables, "City", &site.lima, 1).unwrap().len(), 1);
        assert_eq!(count_children(&site.tables, "DummyRoot", "-1").unwrap(), 1);
        assert_eq!(siblings(&site.tables, "Building", &site.hq, 0).unwrap()[0].id, site.annex);
    }

    #[test]
    fn parent_chains_end_at_the_root() {
        let site = site();
        let chain: Vec<_> =
            parents(&site.tables, "Building", &site.hq).unwrap().into_iter().map(|p| p.class_name).collect();
        assert_eq!(chain, ["City", "Country", "DummyRoot"]);
        assert_eq!(parent(&site.tables, "Country", &site.country).unwrap(), dummy_root());

        let until = parents_until_first_of_class(&site.tables, "Building", &site.hq, &["Country".to_owned()]).unwrap();
        assert_eq!(until.len(), 2);
        let found = first_parent_of_class(&site.tables, "Building", &site.hq, "GenericLocation").unwrap().unwrap();
        assert_eq!(found.id, site.lima);
    }

    #[test]
    fn common_parent_of_siblings_is_their_parent() {
        let site = site();
        let common = common_parent(
            &site.tables,
            &ObjectKey::new("Building", &site.hq),
            &ObjectKey::new("Building", &site.annex),
        )
        .unwrap()
        .unwrap();
        assert_eq!(common.id, site.lima);
    }

    #[test]
    fn instances_include_subclasses() {
        let site = site();
        assert_eq!(objects_of_class(&site.tables, "GenericLocation", 0).unwrap().len(), 4);
        let found = objects_by_name_and_class(&site.tables, &["HQ".to_owned()], &["GenericLocation".to_owned()], 0);
        assert_eq!(found.len(), 1);
    }
}
