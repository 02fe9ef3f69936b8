use fxhash::FxHashMap;
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::{Id, ObjectKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Table of objects keyed by id, indexed by parent and by class.
///
/// The indexes are not serialized; [`ObjectStore::rebuild_indexes`] restores them after a
/// snapshot load. Callers never get a `&mut BusinessObject` that could move an object
/// behind the indexes' back: changes go through [`ObjectStore::edit`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStore {
    records: BTreeMap<Id, BusinessObject>,
    #[serde(skip)]
    by_parent: FxHashMap<ParentRef, BTreeSet<Id>>,
    #[serde(skip)]
    by_class: FxHashMap<String, BTreeSet<Id>>,
}

impl ObjectStore {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BusinessObject> {
        self.records.get(id)
    }

    /// The object with `id`, provided it is an instance of exactly `class_name`.
    #[must_use]
    pub fn get_of_class(&self, class_name: &str, id: &str) -> Option<&BusinessObject> {
        self.records.get(id).filter(|o| o.class_name == class_name)
    }

    #[must_use]
    pub fn get_by_key(&self, key: &ObjectKey) -> Option<&BusinessObject> {
        self.get_of_class(&key.class_name, &key.id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusinessObject> {
        self.records.values()
    }

    /// Inserts or replaces an object.
    pub fn insert(&mut self, object: BusinessObject) {
        if let Some(previous) = self.records.remove(&object.id) {
            self.unindex(&previous);
        }
        self.index(&object);
        self.records.insert(object.id.clone(), object);
    }

    pub fn remove(&mut self, id: &str) -> Option<BusinessObject> {
        let removed = self.records.remove(id)?;
        self.unindex(&removed);
        Some(removed)
    }

    /// Applies `change` to an object and reindexes it. Returns `None` when absent.
    pub fn edit<R>(&mut self, id: &str, change: impl FnOnce(&mut BusinessObject) -> R) -> Option<R> {
        let mut object = self.records.remove(id)?;
        self.unindex(&object);
        let result = change(&mut object);
        self.index(&object);
        self.records.insert(object.id.clone(), object);
        Some(result)
    }

    /// Objects hanging from `parent`, in id order.
    pub fn children_of<'a>(&'a self, parent: &ParentRef) -> impl Iterator<Item = &'a BusinessObject> + use<'a> {
        self.by_parent
            .get(parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
    }

    #[must_use]
    pub fn count_children(&self, parent: &ParentRef) -> usize {
        self.by_parent.get(parent).map_or(0, BTreeSet::len)
    }

    /// Direct instances of `class_name`.
    pub fn of_class<'a>(&'a self, class_name: &str) -> impl Iterator<Item = &'a BusinessObject> + use<'a> {
        self.by_class
            .get(class_name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
    }

    #[must_use]
    pub fn count_of_class(&self, class_name: &str) -> usize {
        self.by_class.get(class_name).map_or(0, BTreeSet::len)
    }

    pub fn rebuild_indexes(&mut self) {
        self.by_parent.clear();
        self.by_class.clear();
        let records = std::mem::take(&mut self.records);
        for object in records.values() {
            self.index(object);
        }
        self.records = records;
    }

    fn index(&mut self, object: &BusinessObject) {
        self.by_parent.entry(object.parent.clone()).or_default().insert(object.id.clone());
        self.by_class.entry(object.class_name.clone()).or_default().insert(object.id.clone());
    }

    fn unindex(&mut self, object: &BusinessObject) {
        if let Some(ids) = self.by_parent.get_mut(&object.parent) {
            ids.remove(&object.id);
            if ids.is_empty() {
                self.by_parent.remove(&object.parent);
            }
        }
        if let Some(ids) = self.by_class.get_mut(&object.class_name) {
            ids.remove(&object.id);
            if ids.is_empty() {
                self.by_class.remove(&object.class_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str, class_name: &str, parent: ParentRef) -> BusinessObject {
        BusinessObject {
            id: id.to_owned(),
            class_name: class_name.to_owned(),
            name: id.to_owned(),
            parent,
            attributes: BTreeMap::new(),
            creation_date: 0,
        }
    }

    #[test]
    fn indexes_follow_edits() {
        let mut store = ObjectStore::default();
        store.insert(object("site", "Building", ParentRef::Root));
        store.insert(object("rack", "Rack", ParentRef::Child(ObjectKey::new("Building", "site"))));

        let site = ParentRef::Child(ObjectKey::new("Building", "site"));
        assert_eq!(store.count_children(&site), 1);

        store.edit("rack", |o| o.parent = ParentRef::Root);
        assert_eq!(store.count_children(&site), 0);
        assert_eq!(store.count_children(&ParentRef::Root), 2);
        assert_eq!(store.of_class("Rack").count(), 1);
    }

    #[test]
    fn removal_clears_indexes() {
        let mut store = ObjectStore::default();
        store.insert(object("a", "Router", ParentRef::Root));
        assert!(store.remove("a").is_some());
        assert_eq!(store.count_of_class("Router"), 0);
        assert!(store.remove("a").is_none());
    }

    #[test]
    fn class_mismatch_is_not_found() {
        let mut store = ObjectStore::default();
        store.insert(object("a", "Router", ParentRef::Root));
        assert!(store.get_of_class("Switch", "a").is_none());
        assert!(store.get_by_key(&ObjectKey::new("Router", "a")).is_some());
    }
}
