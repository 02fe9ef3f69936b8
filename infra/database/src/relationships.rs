use fxhash::FxHashMap;
use kw_domain::model::inventory::Relationship;
use kw_domain::model::{Id, ObjectKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Special relationships, indexed by both ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipStore {
    records: BTreeMap<Id, Relationship>,
    #[serde(skip)]
    by_object: FxHashMap<ObjectKey, BTreeSet<Id>>,
}

impl RelationshipStore {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.records.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.records.values()
    }

    pub fn insert(&mut self, relationship: Relationship) {
        if let Some(previous) = self.records.remove(&relationship.id) {
            self.unindex(&previous);
        }
        self.index(&relationship);
        self.records.insert(relationship.id.clone(), relationship);
    }

    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let removed = self.records.remove(id)?;
        self.unindex(&removed);
        Some(removed)
    }

    /// Every relationship touching `key`.
    pub fn of_object<'a>(&'a self, key: &ObjectKey) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        self.by_object.get(key).into_iter().flatten().filter_map(|id| self.records.get(id))
    }

    /// Relationships named `name` touching `key`.
    pub fn named<'a>(
        &'a self,
        key: &ObjectKey,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        self.of_object(key).filter(move |r| r.name == name)
    }

    /// Objects linked to `key` through `name`.
    #[must_use]
    pub fn related(&self, key: &ObjectKey, name: &str) -> Vec<ObjectKey> {
        self.of_object(key)
            .filter(|r| r.name == name)
            .filter_map(|r| r.other(key).cloned())
            .collect()
    }

    /// Objects linked to `key` through `name` where `key` is the `a` side.
    #[must_use]
    pub fn outgoing(&self, key: &ObjectKey, name: &str) -> Vec<ObjectKey> {
        self.of_object(key).filter(|r| r.name == name && &r.a == key).map(|r| r.b.clone()).collect()
    }

    /// Objects linked to `key` through `name` where `key` is the `b` side.
    #[must_use]
    pub fn incoming(&self, key: &ObjectKey, name: &str) -> Vec<ObjectKey> {
        self.of_object(key).filter(|r| r.name == name && &r.b == key).map(|r| r.a.clone()).collect()
    }

    #[must_use]
    pub fn has_any(&self, key: &ObjectKey) -> bool {
        self.by_object.get(key).is_some_and(|ids| !ids.is_empty())
    }

    /// Whether `a` and `b` are already linked through `name`, in either direction.
    #[must_use]
    pub fn linked(&self, a: &ObjectKey, b: &ObjectKey, name: &str) -> bool {
        self.of_object(a).any(|r| r.name == name && r.other(a) == Some(b))
    }

    /// Removes the relationships named `name` between `a` and `b` (any `b` when `None`).
    pub fn release(&mut self, a: &ObjectKey, name: &str, b: Option<&ObjectKey>) -> Vec<Relationship> {
        let ids: Vec<Id> = self
            .of_object(a)
            .filter(|r| r.name == name && b.is_none_or(|b| r.other(a) == Some(b)))
            .map(|r| r.id.clone())
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Removes everything touching `key`.
    pub fn release_all(&mut self, key: &ObjectKey) -> Vec<Relationship> {
        let ids: Vec<Id> = self.by_object.get(key).into_iter().flatten().cloned().collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn rebuild_indexes(&mut self) {
        self.by_object.clear();
        let records = std::mem::take(&mut self.records);
        for relationship in records.values() {
            self.index(relationship);
        }
        self.records = records;
    }

    fn index(&mut self, relationship: &Relationship) {
        for end in [&relationship.a, &relationship.b] {
            self.by_object.entry(end.clone()).or_default().insert(relationship.id.clone());
        }
    }

    fn unindex(&mut self, relationship: &Relationship) {
        for end in [&relationship.a, &relationship.b] {
            if let Some(ids) = self.by_object.get_mut(end) {
                ids.remove(&relationship.id);
                if ids.is_empty() {
                    self.by_object.remove(end);
                }
            }
        }
    }
}
