use fxhash::FxHashMap;
use kw_domain::model::Id;
use kw_domain::model::metadata::ClassMetadata;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The class model keyed by class name, with a reverse index of direct subclasses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassStore {
    records: BTreeMap<String, ClassMetadata>,
    #[serde(skip)]
    subclasses: FxHashMap<String, BTreeSet<String>>,
    #[serde(skip)]
    by_id: FxHashMap<Id, String>,
}

impl ClassStore {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassMetadata> {
        self.records.get(name)
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&ClassMetadata> {
        self.by_id.get(id).and_then(|name| self.records.get(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassMetadata> {
        self.records.values()
    }

    pub fn insert(&mut self, class: ClassMetadata) {
        if let Some(previous) = self.records.remove(&class.name) {
            self.unindex(&previous);
        }
        self.index(&class);
        self.records.insert(class.name.clone(), class);
    }

    pub fn remove(&mut self, name: &str) -> Option<ClassMetadata> {
        let removed = self.records.remove(name)?;
        self.unindex(&removed);
        Some(removed)
    }

    /// Applies `change` to a class and reindexes it, following a rename when the change
    /// sets a new name. Subclasses pointing at the old name are repointed.
    pub fn edit<R>(&mut self, name: &str, change: impl FnOnce(&mut ClassMetadata) -> R) -> Option<R> {
        let mut class = self.records.remove(name)?;
        self.unindex(&class);
        let result = change(&mut class);
        if class.name != name {
            let children: Vec<String> =
                self.subclasses.remove(name).map(|set| set.into_iter().collect()).unwrap_or_default();
            for child in children {
                if let Some(sub) = self.records.get_mut(&child) {
                    sub.parent_class_name = Some(class.name.clone());
                }
                self.subclasses.entry(class.name.clone()).or_default().insert(child);
            }
        }
        self.index(&class);
        self.records.insert(class.name.clone(), class);
        Some(result)
    }

    /// Direct subclasses, sorted by name.
    pub fn direct_subclasses<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassMetadata> + use<'a> {
        self.subclasses
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|child| self.records.get(child))
    }

    /// Every class below `name`, depth first. `name` itself is not included.
    #[must_use]
    pub fn all_subclasses(&self, name: &str) -> Vec<&ClassMetadata> {
        let mut found = Vec::new();
        let mut pending: Vec<&str> = vec![name];
        while let Some(current) = pending.pop() {
            for child in self.direct_subclasses(current) {
                found.push(child);
                pending.push(&child.name);
            }
        }
        found
    }

    /// The chain from `name` up to the root, starting with `name` itself.
    #[must_use]
    pub fn lineage(&self, name: &str) -> Vec<&ClassMetadata> {
        let mut chain = Vec::new();
        let mut current = self.records.get(name);
        while let Some(class) = current {
            if chain.iter().any(|seen: &&ClassMetadata| seen.name == class.name) {
                break;
            }
            chain.push(class);
            current = class.parent_class_name.as_deref().and_then(|p| self.records.get(p));
        }
        chain
    }

    /// Whether `class_name` is `ancestor` or inherits from it.
    #[must_use]
    pub fn is_subclass_of(&self, class_name: &str, ancestor: &str) -> bool {
        self.lineage(class_name).iter().any(|c| c.name == ancestor)
    }

    pub fn rebuild_indexes(&mut self) {
        self.subclasses.clear();
        self.by_id.clear();
        let records = std::mem::take(&mut self.records);
        for class in records.values() {
            self.index(class);
        }
        self.records = records;
    }

    fn index(&mut self, class: &ClassMetadata) {
        if let Some(parent) = &class.parent_class_name {
            self.subclasses.entry(parent.clone()).or_default().insert(class.name.clone());
        }
        self.by_id.insert(class.id.clone(), class.name.clone());
    }

    fn unindex(&mut self, class: &ClassMetadata) {
        if let Some(parent) = &class.parent_class_name
            && let Some(children) = self.subclasses.get_mut(parent)
        {
            children.remove(&class.name);
            if children.is_empty() {
                self.subclasses.remove(parent);
            }
        }
        self.by_id.remove(&class.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, parent: Option<&str>) -> ClassMetadata {
        ClassMetadata {
            id: format!("id-{name}"),
            name: name.to_owned(),
            display_name: String::new(),
            description: String::new(),
            parent_class_name: parent.map(str::to_owned),
            is_abstract: false,
            custom: false,
            countable: true,
            in_design: false,
            color: 0,
            attributes: Vec::new(),
            possible_children: Vec::new(),
            possible_special_children: Vec::new(),
            creation_date: 0,
        }
    }

    fn store() -> ClassStore {
        let mut store = ClassStore::default();
        store.insert(class("RootObject", None));
        store.insert(class("InventoryObject", Some("RootObject")));
        store.insert(class("GenericPort", Some("InventoryObject")));
        store.insert(class("OpticalPort", Some("GenericPort")));
        store
    }

    #[test]
    fn lineage_walks_to_the_root() {
        let store = store();
        let names: Vec<_> = store.lineage("OpticalPort").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["OpticalPort", "GenericPort", "InventoryObject", "RootObject"]);
        assert!(store.is_subclass_of("OpticalPort", "InventoryObject"));
        assert!(store.is_subclass_of("OpticalPort", "OpticalPort"));
        assert!(!store.is_subclass_of("GenericPort", "OpticalPort"));
    }

    #[test]
    fn subclasses_are_indexed() {
        let store = store();
        assert_eq!(store.all_subclasses("InventoryObject").len(), 2);
        assert_eq!(store.direct_subclasses("InventoryObject").count(), 1);
        assert_eq!(store.get_by_id("id-GenericPort").map(|c| c.name.as_str()), Some("GenericPort"));
    }

    #[test]
    fn rename_repoints_subclasses() {
        let mut store = store();
        store.edit("GenericPort", |c| c.name = "GenericInterface".to_owned());
        assert_eq!(
            store.get("OpticalPort").and_then(|c| c.parent_class_name.as_deref()),
            Some("GenericInterface")
        );
        assert!(store.is_subclass_of("OpticalPort", "InventoryObject"));
        assert_eq!(store.direct_subclasses("GenericInterface").count(), 1);
        assert!(store.get("GenericPort").is_none());
    }
}
