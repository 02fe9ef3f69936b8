use crate::classes::ClassStore;
use crate::objects::ObjectStore;
use crate::relationships::RelationshipStore;
use kw_domain::model::Id;
use kw_domain::model::application::{
    BusinessRule, ConfigVariable, FavoritesFolder, FileObject, Group, NamedPool, ProcessDefinition,
    ProcessInstance, Query, Report, Task, User, ValidatorDefinition, View,
};
use kw_domain::model::audit::ActivityLogEntry;
use kw_domain::model::inventory::{Pool, PoolOwner};
use kw_domain::model::sync::{SyncDataSourceConfig, SyncGroup};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Every table of the inventory.
///
/// Feature slices operate on these through [`crate::Database::read`] and
/// [`crate::Database::write`]; nothing here enforces business rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    pub classes: ClassStore,
    pub objects: ObjectStore,
    pub templates: ObjectStore,
    pub list_items: ObjectStore,
    pub proxies: ObjectStore,
    pub relationships: RelationshipStore,
    pub pools: BTreeMap<Id, Pool>,
    pub users: BTreeMap<Id, User>,
    pub groups: BTreeMap<Id, Group>,
    pub favorites: BTreeMap<Id, FavoritesFolder>,
    pub views: BTreeMap<Id, View>,
    pub queries: BTreeMap<Id, Query>,
    pub tasks: BTreeMap<Id, Task>,
    pub reports: BTreeMap<Id, Report>,
    pub config_pools: BTreeMap<Id, NamedPool>,
    pub config_variables: BTreeMap<Id, ConfigVariable>,
    pub proxy_pools: BTreeMap<Id, NamedPool>,
    pub validators: BTreeMap<Id, ValidatorDefinition>,
    pub business_rules: BTreeMap<Id, BusinessRule>,
    pub files: BTreeMap<Id, FileObject>,
    pub sync_groups: BTreeMap<Id, SyncGroup>,
    pub sync_configs: BTreeMap<Id, SyncDataSourceConfig>,
    pub process_definitions: BTreeMap<Id, ProcessDefinition>,
    pub process_instances: BTreeMap<Id, ProcessInstance>,
    pub activity_log: VecDeque<ActivityLogEntry>,
}

impl Tables {
    /// Restores the secondary indexes dropped by the snapshot codec.
    pub fn rebuild_indexes(&mut self) {
        self.classes.rebuild_indexes();
        self.objects.rebuild_indexes();
        self.templates.rebuild_indexes();
        self.list_items.rebuild_indexes();
        self.proxies.rebuild_indexes();
        self.relationships.rebuild_indexes();
    }

    /// Pools directly owned by `owner`.
    pub fn pools_owned_by<'a>(&'a self, owner: &'a PoolOwner) -> impl Iterator<Item = &'a Pool> {
        self.pools.values().filter(move |p| &p.owner == owner)
    }

    #[must_use]
    pub fn user_by_name(&self, user_name: &str) -> Option<&User> {
        self.users.values().find(|u| u.user_name == user_name)
    }

    #[must_use]
    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.values().find(|g| g.name == name)
    }

    #[must_use]
    pub fn config_variable_by_name(&self, name: &str) -> Option<&ConfigVariable> {
        self.config_variables.values().find(|v| v.name == name)
    }

    /// Number of records across all tables, for logging.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.classes.len()
            + self.objects.len()
            + self.templates.len()
            + self.list_items.len()
            + self.proxies.len()
            + self.relationships.len()
            + self.pools.len()
            + self.users.len()
            + self.groups.len()
            + self.favorites.len()
            + self.views.len()
            + self.queries.len()
            + self.tasks.len()
            + self.reports.len()
            + self.config_pools.len()
            + self.config_variables.len()
            + self.proxy_pools.len()
            + self.validators.len()
            + self.business_rules.len()
            + self.files.len()
            + self.sync_groups.len()
            + self.sync_configs.len()
            + self.process_definitions.len()
            + self.process_instances.len()
            + self.activity_log.len()
    }
}
