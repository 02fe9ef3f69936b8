//! Creation, update, deletion, moves and copies of objects in the containment tree.
//!
//! Everything here works on either the inventory or the template table so templates share
//! the containment and attribute rules of the objects they describe.

use crate::naming::{self, MirrorMode};
use kw_database::{ObjectStore, Tables};
use kw_domain::constants::{
    ATTRIBUTE_NAME, CLASS_DUMMY_ROOT, CLASS_INVENTORY_OBJECT, REL_MIRROR, REL_MIRROR_MULTIPLE, ROOT_ID,
};
use kw_domain::model::application::FileObject;
use kw_domain::model::inventory::{BusinessObject, ParentRef, PoolOwner, Relationship};
use kw_domain::model::metadata::AttributeValue;
use kw_domain::model::{Id, ObjectKey};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis};
use kw_metadata::{schema, values};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Which object table an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Objects,
    Templates,
}

impl Store {
    #[must_use]
    pub const fn of(self, tables: &Tables) -> &ObjectStore {
        match self {
            Self::Objects => &tables.objects,
            Self::Templates => &tables.templates,
        }
    }

    pub const fn of_mut(self, tables: &mut Tables) -> &mut ObjectStore {
        match self {
            Self::Objects => &mut tables.objects,
            Self::Templates => &mut tables.templates,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Objects => "Object",
            Self::Templates => "Template element",
        }
    }
}

/// Looks an object up by id, accepting any subclass of `class_name`.
///
/// # Errors
/// [`InventoryError::NotFound`] when no such object exists.
pub fn find<'a>(
    tables: &'a Tables,
    store: Store,
    class_name: &str,
    id: &str,
) -> Result<&'a BusinessObject, InventoryError> {
    store
        .of(tables)
        .get(id)
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, class_name))
        .ok_or_else(|| {
            InventoryError::not_found(format!(
                "{} {id} of class {class_name} could not be found",
                store.label()
            ))
        })
}

/// Shorthand for [`find`] on the inventory table.
///
/// # Errors
/// See [`find`].
pub fn object<'a>(tables: &'a Tables, class_name: &str, id: &str) -> Result<&'a BusinessObject, InventoryError> {
    find(tables, Store::Objects, class_name, id)
}

#[must_use]
pub fn is_root(class_name: &str, id: &str) -> bool {
    id.trim() == ROOT_ID || class_name.trim() == CLASS_DUMMY_ROOT
}

/// Resolves a parent address into the reference stored in the child and the class the
/// containment rules are checked against.
///
/// # Errors
/// [`InventoryError::NotFound`] when the parent does not exist.
pub fn resolve_parent(
    tables: &Tables,
    store: Store,
    parent_class: &str,
    parent_id: &str,
    special: bool,
) -> Result<(ParentRef, String), InventoryError> {
    if is_root(parent_class, parent_id) {
        return Ok((ParentRef::Root, CLASS_DUMMY_ROOT.to_owned()));
    }
    let parent = find(tables, store, parent_class, parent_id)?;
    let reference = if special { ParentRef::Special(parent.key()) } else { ParentRef::Child(parent.key()) };
    Ok((reference, parent.class_name.clone()))
}

/// Parameters of `createObject` and friends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObject {
    pub class_name: String,
    pub parent_class_name: String,
    pub parent_id: Id,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub template_id: Option<Id>,
}

/// A validated object waiting to be inserted, with the template subtree to copy under it.
#[derive(Debug)]
struct Prepared {
    object: BusinessObject,
    template: Option<ObjectKey>,
}

fn prepare(tables: &Tables, store: Store, new: &NewObject, special: bool) -> Result<Prepared, InventoryError> {
    if new.parent_id.trim().is_empty() {
        return Err(InventoryError::invalid("The parent id of a new object is required"));
    }
    schema::instanceable(tables, &new.class_name, CLASS_INVENTORY_OBJECT)?;
    let (parent, parent_class) = resolve_parent(tables, store, &new.parent_class_name, &new.parent_id, special)?;
    schema::ensure_can_contain(tables, &parent_class, &new.class_name, special)?;

    let mut object = BusinessObject {
        id: new_id(),
        class_name: new.class_name.clone(),
        name: String::new(),
        parent,
        attributes: BTreeMap::new(),
        creation_date: now_millis(),
    };

    let template = match new.template_id.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(template_id) => {
            let template = tables.templates.get(template_id).ok_or_else(|| {
                InventoryError::not_found(format!("Template {template_id} could not be found"))
            })?;
            if template.class_name != new.class_name {
                return Err(InventoryError::invalid(format!(
                    "Template {template_id} is a {} template, not a {} one",
                    template.class_name, new.class_name
                )));
            }
            object.name.clone_from(&template.name);
            object.attributes = template.attributes.clone();
            Some(template.key())
        },
        None => None,
    };

    values::parse_attributes(tables, &new.class_name, &new.attributes)?.apply(&mut object);
    ensure_complete(tables, store, &object)?;
    Ok(Prepared { object, template })
}

fn commit(tables: &mut Tables, store: Store, prepared: Prepared) -> Id {
    let key = prepared.object.key();
    store.of_mut(tables).insert(prepared.object);
    if let Some(template) = prepared.template {
        copy_subtree_children(tables, Store::Templates, store, &template, &key, false);
    }
    key.id
}

/// Creates an object under a regular or special parent.
///
/// # Errors
/// * [`InventoryError::InvalidArgument`] for a missing parent id, bad attribute values, a
///   template of another class or missing mandatory attributes.
/// * [`InventoryError::NotFound`] for unknown classes, parents or templates.
/// * [`InventoryError::OperationNotPermitted`] when the class can not have instances, the
///   parent can not contain it, or a unique value is taken.
pub fn create_object(tables: &mut Tables, store: Store, new: &NewObject, special: bool) -> Result<Id, InventoryError> {
    let prepared = prepare(tables, store, new, special)?;
    Ok(commit(tables, store, prepared))
}

/// Creates an object outside the containment tree, reachable only through its
/// relationships. `ancestor` is the class the new one must descend from.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes.
/// * [`InventoryError::InvalidArgument`] for bad values or missing mandatory attributes.
/// * [`InventoryError::OperationNotPermitted`] when the class can not have instances or a
///   unique value is taken.
pub fn create_detached_object(
    tables: &mut Tables,
    class_name: &str,
    ancestor: &str,
    raw: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    insert_outside_tree(tables, class_name, ancestor, ParentRef::Detached, raw)
}

/// Creates an item of a pool. The item must be an instance of the pool class.
///
/// # Errors
/// As [`create_detached_object`], plus [`InventoryError::NotFound`] for unknown pools.
pub fn create_pool_item(
    tables: &mut Tables,
    pool_id: &str,
    class_name: &str,
    raw: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    let pool_class = tables
        .pools
        .get(pool_id)
        .map(|pool| pool.class_name.clone())
        .ok_or_else(|| InventoryError::not_found(format!("Pool {pool_id} could not be found")))?;
    insert_outside_tree(tables, class_name, &pool_class, ParentRef::Pool(pool_id.to_owned()), raw)
}

fn insert_outside_tree(
    tables: &mut Tables,
    class_name: &str,
    ancestor: &str,
    parent: ParentRef,
    raw: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    schema::instanceable(tables, class_name, ancestor)?;
    let mut object = BusinessObject {
        id: new_id(),
        class_name: class_name.to_owned(),
        name: String::new(),
        parent,
        attributes: BTreeMap::new(),
        creation_date: now_millis(),
    };
    values::parse_attributes(tables, class_name, raw)?.apply(&mut object);
    ensure_complete(tables, Store::Objects, &object)?;
    let id = object.id.clone();
    tables.objects.insert(object);
    Ok(id)
}

/// Creates one object per name the pattern expands to, linking mirror pairs. Unique values
/// must differ between the new objects too.
///
/// # Errors
/// Pattern errors and everything [`create_object`] reports, before anything is created.
pub fn create_bulk_objects(
    tables: &mut Tables,
    store: Store,
    template: &NewObject,
    pattern: &str,
    special: bool,
) -> Result<Vec<Id>, InventoryError> {
    let expansion = naming::expand(pattern)?;
    let mut batch = Vec::with_capacity(expansion.names.len());
    let mut names = BTreeSet::new();
    for name in &expansion.names {
        if !names.insert(name.as_str()) {
            return Err(InventoryError::invalid(format!("Pattern {pattern} produces {name} twice")));
        }
        let mut new = template.clone();
        new.attributes.insert(ATTRIBUTE_NAME.to_owned(), name.clone());
        let prepared = prepare(tables, store, &new, special)?;
        let accepted = batch.iter().map(|p: &Prepared| &p.object);
        if let Some(attribute) = shared_unique_value(tables, &prepared.object, accepted) {
            return Err(unique_taken(&attribute, &prepared.object.class_name));
        }
        batch.push(prepared);
    }

    let keys: Vec<ObjectKey> = batch.iter().map(|p| p.object.key()).collect();
    let ids: Vec<Id> = batch.into_iter().map(|prepared| commit(tables, store, prepared)).collect();

    if store == Store::Objects {
        match expansion.mirror {
            MirrorMode::None => {},
            MirrorMode::Pairs => {
                for pair in keys.chunks_exact(2) {
                    link(tables, &pair[1], &pair[0], REL_MIRROR);
                }
            },
            MirrorMode::Multiple => {
                if let Some((first, rest)) = keys.split_first() {
                    for other in rest {
                        link(tables, first, other, REL_MIRROR_MULTIPLE);
                    }
                }
            },
        }
    }
    Ok(ids)
}

fn link(tables: &mut Tables, a: &ObjectKey, b: &ObjectKey, name: &str) {
    tables.relationships.insert(Relationship {
        id: new_id(),
        name: name.to_owned(),
        a: a.clone(),
        b: b.clone(),
        properties: BTreeMap::new(),
    });
}

/// The first unique attribute of `object` whose value another instance of its class among
/// `others` already holds. `name` compares the object names.
fn shared_unique_value<'a>(
    tables: &Tables,
    object: &BusinessObject,
    others: impl Iterator<Item = &'a BusinessObject>,
) -> Option<String> {
    let unique: Vec<String> = schema::effective_attributes(tables, &object.class_name)
        .into_iter()
        .filter(|a| a.unique)
        .map(|a| a.name)
        .collect();
    if unique.is_empty() {
        return None;
    }
    others.filter(|o| o.id != object.id && o.class_name == object.class_name).find_map(|other| {
        unique
            .iter()
            .find(|name| {
                if name.as_str() == ATTRIBUTE_NAME {
                    other.name == object.name
                } else {
                    object.attributes.get(name.as_str()).is_some_and(|v| other.attributes.get(name.as_str()) == Some(v))
                }
            })
            .cloned()
    })
}

fn unique_taken(attribute: &str, class_name: &str) -> InventoryError {
    InventoryError::not_permitted(format!(
        "The value of the unique attribute {attribute} is already in use by another {class_name}"
    ))
}

/// Unique and mandatory checks against the other records of the same table.
fn ensure_complete(tables: &Tables, store: Store, object: &BusinessObject) -> Result<(), InventoryError> {
    let missing = values::missing_mandatory(tables, &object.class_name, object);
    if !missing.is_empty() {
        return Err(InventoryError::invalid(format!(
            "Mandatory attributes of {} are missing: {}",
            object.class_name,
            missing.join(", ")
        )));
    }

    if let Some(attribute) = shared_unique_value(tables, object, store.of(tables).of_class(&object.class_name)) {
        return Err(unique_taken(&attribute, &object.class_name));
    }
    Ok(())
}

/// Updates attributes given as strings. Returns a note describing each change.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] for bad values, empty names or cleared mandatory
///   attributes.
/// * [`InventoryError::OperationNotPermitted`] for read-only attributes and unique clashes.
pub fn update_object(
    tables: &mut Tables,
    store: Store,
    class_name: &str,
    id: &str,
    raw: &BTreeMap<String, String>,
) -> Result<String, InventoryError> {
    let current = find(tables, store, class_name, id)?;
    if !schema::is_inventory_class(tables, &current.class_name) {
        return Err(InventoryError::invalid(format!("Class {class_name} is not an inventory class")));
    }
    let changes = values::parse_attributes(tables, &current.class_name, raw)?;
    if changes.name.as_deref().is_some_and(str::is_empty) {
        return Err(InventoryError::invalid("The name of an object can not be empty"));
    }
    for attribute_name in changes.values.keys() {
        let read_only = schema::effective_attribute(tables, &current.class_name, attribute_name)
            .is_some_and(|a| a.read_only);
        if read_only {
            return Err(InventoryError::not_permitted(format!("Attribute {attribute_name} is read only")));
        }
    }

    let mut notes = Vec::new();
    if let Some(name) = changes.name.as_ref().filter(|n| **n != current.name) {
        notes.push(format!("{ATTRIBUTE_NAME}: {} -> {name}", current.name));
    }
    for (attribute_name, value) in &changes.values {
        let before = current.attributes.get(attribute_name);
        if before != value.as_ref() {
            notes.push(format!("{attribute_name}: {} -> {}", render(before), render(value.as_ref())));
        }
    }

    let mut preview = current.clone();
    changes.clone().apply(&mut preview);
    ensure_complete(tables, store, &preview)?;

    store.of_mut(tables).edit(id, |object| changes.apply(object));
    Ok(notes.join("; "))
}

fn render(value: Option<&AttributeValue>) -> String {
    value.map_or_else(String::new, ToString::to_string)
}

/// Everything hanging from an object: regular and special children, pools it owns, their
/// subpools and items, recursively. The root comes first; parents precede their children.
#[derive(Debug, Default)]
pub struct Subtree {
    pub objects: Vec<ObjectKey>,
    pub pools: Vec<Id>,
}

#[must_use]
pub fn subtree(tables: &Tables, store: Store, root: &BusinessObject) -> Subtree {
    let records = store.of(tables);
    let mut found = Subtree::default();
    let mut queue = VecDeque::from([root.key()]);
    while let Some(key) = queue.pop_front() {
        for parent in [ParentRef::Child(key.clone()), ParentRef::Special(key.clone())] {
            queue.extend(records.children_of(&parent).map(BusinessObject::key));
        }
        let mut pools: VecDeque<Id> =
            tables.pools_owned_by(&PoolOwner::Object(key.clone())).map(|p| p.id.clone()).collect();
        while let Some(pool_id) = pools.pop_front() {
            pools.extend(tables.pools_owned_by(&PoolOwner::Pool(pool_id.clone())).map(|p| p.id.clone()));
            queue.extend(records.children_of(&ParentRef::Pool(pool_id.clone())).map(BusinessObject::key));
            found.pools.push(pool_id);
        }
        found.objects.push(key);
    }
    found
}

/// What a deletion removed besides the objects themselves.
#[derive(Debug, Default)]
pub struct Removed {
    pub objects: Vec<ObjectKey>,
    pub files: Vec<FileObject>,
}

/// Deletes objects with their subtrees.
///
/// Relationships of any removed object block the deletion unless `release_relationships`
/// is set. Pools owned by removed objects go too, as do views, attachments, favorites
/// entries and synchronization configurations pointing at them.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::OperationNotPermitted`] for classes outside the inventory and for
///   objects still holding relationships.
pub fn delete_objects(
    tables: &mut Tables,
    store: Store,
    targets: &[ObjectKey],
    release_relationships: bool,
) -> Result<Removed, InventoryError> {
    let mut doomed = Vec::new();
    let mut pools = Vec::new();
    let mut seen = BTreeSet::new();
    for target in targets {
        let root = find(tables, store, &target.class_name, &target.id)?;
        if !schema::is_inventory_class(tables, &root.class_name) {
            return Err(InventoryError::not_permitted(format!(
                "Class {} is not a business related class",
                root.class_name
            )));
        }
        let tree = subtree(tables, store, root);
        for key in tree.objects {
            if !release_relationships && tables.relationships.has_any(&key) {
                return Err(InventoryError::not_permitted(format!(
                    "Object {key} has relationships; release them first"
                )));
            }
            if seen.insert(key.clone()) {
                doomed.push(key);
            }
        }
        pools.extend(tree.pools);
    }

    let mut removed = Removed::default();
    for key in doomed {
        tables.relationships.release_all(&key);
        if store.of_mut(tables).remove(&key.id).is_none() {
            continue;
        }
        if store == Store::Objects {
            tables.views.retain(|_, view| view.object.as_ref() != Some(&key));
            tables.sync_configs.retain(|_, config| config.object != key);
            for folder in tables.favorites.values_mut() {
                folder.objects.retain(|o| o != &key);
            }
            let files: Vec<Id> =
                tables.files.values().filter(|f| f.object == key).map(|f| f.id.clone()).collect();
            removed.files.extend(files.iter().filter_map(|id| tables.files.remove(id)));
        }
        removed.objects.push(key);
    }
    for pool_id in pools {
        tables.pools.remove(&pool_id);
    }
    Ok(removed)
}

/// Whether `candidate` is `ancestor` or lies anywhere below it.
fn is_within(tables: &Tables, store: Store, candidate: &ParentRef, ancestor: &ObjectKey) -> bool {
    let mut current = candidate.clone();
    for _ in 0..=store.of(tables).len() {
        let next = match &current {
            ParentRef::Child(key) | ParentRef::Special(key) => {
                if key == ancestor {
                    return true;
                }
                store.of(tables).get_by_key(key).map(|o| o.parent.clone())
            },
            ParentRef::Pool(pool_id) => tables.pools.get(pool_id).and_then(|pool| match &pool.owner {
                PoolOwner::Object(owner) => Some(ParentRef::Child(owner.clone())),
                PoolOwner::Pool(parent) => Some(ParentRef::Pool(parent.clone())),
                PoolOwner::Root => None,
            }),
            ParentRef::Root | ParentRef::Detached => None,
        };
        match next {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

/// Moves objects under a new regular or special parent.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects or targets.
/// * [`InventoryError::OperationNotPermitted`] when containment forbids the move or the
///   target lies inside the moved object.
pub fn move_objects(
    tables: &mut Tables,
    store: Store,
    target_class: &str,
    target_id: &str,
    objects: &[ObjectKey],
    special: bool,
) -> Result<(), InventoryError> {
    let (parent, parent_class) = resolve_parent(tables, store, target_class, target_id, special)?;
    let mut moving = Vec::with_capacity(objects.len());
    for key in objects {
        let object = find(tables, store, &key.class_name, &key.id)?;
        schema::ensure_can_contain(tables, &parent_class, &object.class_name, special)?;
        if is_within(tables, store, &parent, &object.key()) {
            return Err(InventoryError::not_permitted(format!(
                "Object {} can not be moved into its own subtree",
                object.name
            )));
        }
        moving.push(object.id.clone());
    }
    for id in moving {
        store.of_mut(tables).edit(&id, |object| object.parent = parent.clone());
    }
    Ok(())
}

/// Attribute values carried over to a copy. Unique values never are; `noCopy` values are
/// dropped when `skip_no_copy` is set.
fn copied_attributes(tables: &Tables, object: &BusinessObject, skip_no_copy: bool) -> BTreeMap<String, AttributeValue> {
    let dropped: BTreeSet<String> = schema::effective_attributes(tables, &object.class_name)
        .into_iter()
        .filter(|a| a.unique || (skip_no_copy && a.no_copy))
        .map(|a| a.name)
        .collect();
    object.attributes.iter().filter(|(name, _)| !dropped.contains(*name)).map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Copies the children of `source` (read from `from`) under `target` (in `to`). The copy
/// plan is taken before the first insert, so copying an object into itself terminates.
fn copy_subtree_children(
    tables: &mut Tables,
    from: Store,
    to: Store,
    source: &ObjectKey,
    target: &ObjectKey,
    skip_no_copy: bool,
) -> usize {
    let Some(root) = from.of(tables).get_by_key(source) else {
        return 0;
    };
    let plan: Vec<BusinessObject> = subtree(tables, from, root)
        .objects
        .iter()
        .skip(1)
        .filter_map(|key| from.of(tables).get_by_key(key))
        .filter(|o| matches!(o.parent, ParentRef::Child(_) | ParentRef::Special(_)))
        .map(|o| {
            let mut copy = o.clone();
            copy.attributes = copied_attributes(tables, o, skip_no_copy);
            copy
        })
        .collect();

    let mut renamed: BTreeMap<ObjectKey, ObjectKey> = BTreeMap::from([(source.clone(), target.clone())]);
    let now = now_millis();
    let mut copied = 0;
    for mut copy in plan {
        let old_key = copy.key();
        let parent = match &copy.parent {
            ParentRef::Child(key) => renamed.get(key).cloned().map(ParentRef::Child),
            ParentRef::Special(key) => renamed.get(key).cloned().map(ParentRef::Special),
            _ => None,
        };
        let Some(parent) = parent else {
            continue;
        };
        copy.id = new_id();
        copy.parent = parent;
        copy.creation_date = now;
        renamed.insert(old_key, copy.key());
        to.of_mut(tables).insert(copy);
        copied += 1;
    }
    copied
}

/// Copies the element tree of a template under an object created from it. Returns how
/// many elements were copied.
pub fn instantiate_template(tables: &mut Tables, template: &ObjectKey, target: &ObjectKey) -> usize {
    copy_subtree_children(tables, Store::Templates, Store::Objects, template, target, false)
}

/// Copies objects under a new parent. Returns the ids of the copies in input order.
///
/// # Errors
/// Same as [`move_objects`], except that copying into the own subtree is allowed.
pub fn copy_objects(
    tables: &mut Tables,
    store: Store,
    target_class: &str,
    target_id: &str,
    objects: &[ObjectKey],
    recursive: bool,
    special: bool,
) -> Result<Vec<Id>, InventoryError> {
    let (parent, parent_class) = resolve_parent(tables, store, target_class, target_id, special)?;
    let mut copies = Vec::with_capacity(objects.len());
    for key in objects {
        let object = find(tables, store, &key.class_name, &key.id)?;
        schema::ensure_can_contain(tables, &parent_class, &object.class_name, special)?;
        let mut copy = object.clone();
        copy.id = new_id();
        copy.parent = parent.clone();
        copy.attributes = copied_attributes(tables, object, true);
        copy.creation_date = now_millis();
        copies.push((object.key(), copy));
    }

    let mut ids = Vec::with_capacity(copies.len());
    for (source, copy) in copies {
        let target = copy.key();
        store.of_mut(tables).insert(copy);
        if recursive {
            copy_subtree_children(tables, store, store, &source, &target, true);
        }
        ids.push(target.id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::metadata::{AttributeMetadata, AttributeType};
    use kw_metadata::bootstrap::seed_core_model;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables
    }

    fn create(tables: &mut Tables, class_name: &str, parent: (&str, &str), name: &str) -> Id {
        let new = NewObject {
            class_name: class_name.to_owned(),
            parent_class_name: parent.0.to_owned(),
            parent_id: parent.1.to_owned(),
            attributes: BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())]),
            template_id: None,
        };
        create_object(tables, Store::Objects, &new, false).unwrap()
    }

    #[test]
    fn containment_is_enforced_on_creation() {
        let mut tables = tables();
        let country = create(&mut tables, "Country", ("DummyRoot", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        assert_eq!(tables.objects.get(&city).unwrap().parent, ParentRef::Child(ObjectKey::new("Country", country)));

        let misplaced = NewObject {
            class_name: "Router".to_owned(),
            parent_class_name: "DummyRoot".to_owned(),
            parent_id: "-1".to_owned(),
            ..NewObject::default()
        };
        assert!(matches!(
            create_object(&mut tables, Store::Objects, &misplaced, false),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
    }

    #[test]
    fn templates_are_instantiated_with_their_subtree() {
        let mut tables = tables();
        // Templates hang from the root of their own table regardless of containment.
        let template_id = new_id();
        tables.templates.insert(BusinessObject {
            id: template_id.clone(),
            class_name: "Router".to_owned(),
            name: "edge".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        tables.templates.insert(BusinessObject {
            id: "tp".to_owned(),
            class_name: "OpticalPort".to_owned(),
            name: "ge-0/0/0".to_owned(),
            parent: ParentRef::Child(ObjectKey::new("Router", template_id.clone())),
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        let country = create(&mut tables, "Country", ("-1", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        let building = create(&mut tables, "Building", ("City", &city), "HQ");
        let rack = create(&mut tables, "Rack", ("Building", &building), "R1");
        let router = create_object(
            &mut tables,
            Store::Objects,
            &NewObject {
                class_name: "Router".to_owned(),
                parent_class_name: "Rack".to_owned(),
                parent_id: rack,
                attributes: BTreeMap::new(),
                template_id: Some(template_id),
            },
            false,
        )
        .unwrap();

        assert_eq!(tables.objects.get(&router).unwrap().name, "edge");
        let ports: Vec<_> =
            tables.objects.children_of(&ParentRef::Child(ObjectKey::new("Router", router))).collect();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name, "ge-0/0/0");
    }

    #[test]
    fn objects_can_not_move_into_their_own_subtree() {
        let mut tables = tables();
        let country = create(&mut tables, "Country", ("-1", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        let building = create(&mut tables, "Building", ("City", &city), "HQ");
        let room = create(&mut tables, "Room", ("Building", &building), "R1");
        let rack = create(&mut tables, "Rack", ("Room", &room), "Rack 1");

        assert!(move_objects(&mut tables, Store::Objects, "Building", &building, &[ObjectKey::new("Rack", &rack)], false).is_ok());
        assert_eq!(
            tables.objects.get(&rack).unwrap().parent,
            ParentRef::Child(ObjectKey::new("Building", building.clone()))
        );
        // Rooms may hold racks but not other rooms.
        assert!(move_objects(&mut tables, Store::Objects, "Room", &room, &[ObjectKey::new("Building", &building)], false).is_err());
    }

    #[test]
    fn recursive_copies_get_fresh_ids() {
        let mut tables = tables();
        let country = create(&mut tables, "Country", ("-1", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        create(&mut tables, "Building", ("City", &city), "HQ");

        let copies =
            copy_objects(&mut tables, Store::Objects, "Country", &country, &[ObjectKey::new("City", &city)], true, false)
                .unwrap();
        assert_eq!(copies.len(), 1);
        assert_ne!(copies[0], city);
        let copy = ParentRef::Child(ObjectKey::new("City", copies[0].clone()));
        assert_eq!(tables.objects.count_children(&copy), 1);
        assert_eq!(tables.objects.len(), 5);
    }

    #[test]
    fn deletion_takes_the_subtree_and_respects_relationships() {
        let mut tables = tables();
        let country = create(&mut tables, "Country", ("-1", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        let other = create(&mut tables, "Country", ("-1", "-1"), "Chile");
        link(&mut tables, &ObjectKey::new("City", &city), &ObjectKey::new("Country", &other), "uses");

        let target = [ObjectKey::new("Country", &country)];
        assert!(matches!(
            delete_objects(&mut tables, Store::Objects, &target, false),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
        let removed = delete_objects(&mut tables, Store::Objects, &target, true).unwrap();
        assert_eq!(removed.objects.len(), 2);
        assert_eq!(tables.objects.len(), 1);
        assert_eq!(tables.relationships.len(), 0);
    }

    #[test]
    fn bulk_mirrors_are_linked_in_pairs() {
        let mut tables = tables();
        let country = create(&mut tables, "Country", ("-1", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        let building = create(&mut tables, "Building", ("City", &city), "HQ");
        let rack = create(&mut tables, "Rack", ("Building", &building), "R1");
        let router = create(&mut tables, "Router", ("Rack", &rack), "core");

        let template = NewObject {
            class_name: "OpticalPort".to_owned(),
            parent_class_name: "Router".to_owned(),
            parent_id: router,
            ..NewObject::default()
        };
        let ids = create_bulk_objects(&mut tables, Store::Objects, &template, "port-[mirror(1,2)]", false).unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(tables.objects.get(&ids[0]).unwrap().name, "port-1-front");
        assert_eq!(tables.objects.get(&ids[1]).unwrap().name, "port-1-back");
        assert!(tables.relationships.linked(
            &ObjectKey::new("OpticalPort", &ids[0]),
            &ObjectKey::new("OpticalPort", &ids[1]),
            REL_MIRROR
        ));
        assert_eq!(tables.relationships.len(), 2);
    }

    #[test]
    fn bulk_creation_keeps_unique_values_apart() {
        let mut tables = tables();
        tables.classes.edit("OpticalPort", |class| {
            class.attributes.push(AttributeMetadata {
                id: new_id(),
                name: "serial".to_owned(),
                display_name: "serial".to_owned(),
                description: String::new(),
                attribute_type: AttributeType::parse("String"),
                administrative: false,
                visible: true,
                read_only: false,
                unique: true,
                mandatory: false,
                no_copy: false,
                order: 0,
            });
        });
        tables.templates.insert(BusinessObject {
            id: "sfp".to_owned(),
            class_name: "OpticalPort".to_owned(),
            name: "sfp".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::from([("serial".to_owned(), AttributeValue::String("SN-1".to_owned()))]),
            creation_date: 0,
        });
        let country = create(&mut tables, "Country", ("-1", "-1"), "Peru");
        let city = create(&mut tables, "City", ("Country", &country), "Lima");
        let building = create(&mut tables, "Building", ("City", &city), "HQ");
        let rack = create(&mut tables, "Rack", ("Building", &building), "R1");
        let router = create(&mut tables, "Router", ("Rack", &rack), "edge");

        let mut ports = NewObject {
            class_name: "OpticalPort".to_owned(),
            parent_class_name: "Router".to_owned(),
            parent_id: router,
            attributes: BTreeMap::new(),
            template_id: Some("sfp".to_owned()),
        };
        assert!(matches!(
            create_bulk_objects(&mut tables, Store::Objects, &ports, "p[sequence(1,3)]", false),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
        assert_eq!(tables.objects.count_of_class("OpticalPort"), 0);

        ports.template_id = None;
        let created = create_bulk_objects(&mut tables, Store::Objects, &ports, "p[sequence(1,3)]", false).unwrap();
        assert_eq!(created.len(), 3);
        ports.attributes.insert("serial".to_owned(), "SN-2".to_owned());
        assert!(create_bulk_objects(&mut tables, Store::Objects, &ports, "q[sequence(1,2)]", false).is_err());
        assert_eq!(
            create_bulk_objects(&mut tables, Store::Objects, &ports, "q[sequence(1,1)]", false).unwrap().len(),
            1
        );
    }
}
