//! Web service operations on synchronization groups and data source configurations.

use crate::{Synchronization, configs, groups, providers};
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SyncCall {
    GetSynchronizationProviders {},
    CreateSynchronizationGroup {
        name: String,
        #[serde(default)]
        provider: String,
    },
    UpdateSynchronizationGroup { sync_group_id: Id, sync_group_properties: BTreeMap<String, String> },
    DeleteSynchronizationGroup { sync_group_id: Id },
    GetSynchronizationGroup { sync_group_id: Id },
    GetSynchronizationGroups {},
    CreateSynchronizationDataSourceConfig {
        object_class_name: String,
        object_id: Id,
        sync_group_id: Id,
        name: String,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
    UpdateSyncDataSourceConfiguration { sync_data_source_config_id: Id, parameters: BTreeMap<String, Option<String>> },
    DeleteSynchronizationDataSourceConfig { sync_data_source_config_id: Id },
    GetSyncDataSourceConfiguration { object_class_name: String, object_id: Id },
    GetSyncDataSourceConfigurations { sync_group_id: Id },
    CopySyncGroup { sync_group_ids: Vec<Id> },
    CopySyncDataSourceConfiguration { sync_group_id: Id, sync_data_source_configuration_ids: Vec<Id> },
    ReleaseSyncDataSourceConfigFromSyncGroup { sync_group_id: Id, sync_data_source_configuration_ids: Vec<Id> },
    MoveSyncDataSourceConfiguration {
        old_sync_group_id: Id,
        new_sync_group_id: Id,
        sync_data_source_configuration_ids: Vec<Id>,
    },
}

impl SliceCall for SyncCall {
    type Slice = Synchronization;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetSynchronizationProviders {}
            | Self::GetSynchronizationGroup { .. }
            | Self::GetSynchronizationGroups {}
            | Self::GetSyncDataSourceConfiguration { .. }
            | Self::GetSyncDataSourceConfigurations { .. } => Requirement::read(FeatureSet::SYNC),
            _ => Requirement::write(FeatureSet::SYNC),
        }
    }

    async fn execute(self, slice: &Synchronization, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::GetSynchronizationProviders {} => reply(providers::providers()),
            Self::CreateSynchronizationGroup { name, provider } => {
                let id = db.write(|t| groups::create_group(t, &name, &provider))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Synchronization group {name}"));
                reply(id)
            },
            Self::UpdateSynchronizationGroup { sync_group_id, sync_group_properties } => {
                let changed = db.write(|t| groups::update_group(t, &sync_group_id, &sync_group_properties))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Synchronization group {sync_group_id}: {changed}"),
                );
                reply(())
            },
            Self::DeleteSynchronizationGroup { sync_group_id } => {
                let orphans = db.write(|t| groups::delete_group(t, &sync_group_id))?;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    None,
                    format!("Synchronization group {sync_group_id} and {orphans} configurations"),
                );
                reply(())
            },
            Self::GetSynchronizationGroup { sync_group_id } => {
                reply(db.read(|t| groups::group(t, &sync_group_id).cloned())?)
            },
            Self::GetSynchronizationGroups {} => reply(db.read(groups::groups)),
            Self::CreateSynchronizationDataSourceConfig { object_class_name, object_id, sync_group_id, name, parameters } => {
                let object = ObjectKey::new(object_class_name, object_id);
                let id = db.write(|t| configs::create_config(t, &object, &sync_group_id, &name, parameters))?;
                ctx.record(ActivityType::CreateApplicationObject, Some(&object), format!("Data source configuration {name}"));
                reply(id)
            },
            Self::UpdateSyncDataSourceConfiguration { sync_data_source_config_id, parameters } => {
                db.write(|t| configs::update_config(t, &sync_data_source_config_id, &parameters))?;
                let changed = parameters.keys().cloned().collect::<Vec<_>>().join(", ");
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Data source configuration {sync_data_source_config_id}: {changed}"),
                );
                reply(())
            },
            Self::DeleteSynchronizationDataSourceConfig { sync_data_source_config_id } => {
                let removed = db.write(|t| configs::delete_config(t, &sync_data_source_config_id))?;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    Some(&removed.object),
                    format!("Data source configuration {}", removed.name),
                );
                reply(())
            },
            Self::GetSyncDataSourceConfiguration { object_class_name, object_id } => {
                reply(db.read(|t| configs::config_for_object(t, &object_class_name, &object_id).cloned())?)
            },
            Self::GetSyncDataSourceConfigurations { sync_group_id } => {
                reply(db.read(|t| configs::configs_in_group(t, &sync_group_id))?)
            },
            Self::CopySyncGroup { sync_group_ids } => {
                let copies = db.write(|t| groups::copy_groups(t, &sync_group_ids))?;
                for copy in &copies {
                    ctx.record(ActivityType::CreateApplicationObject, None, format!("Synchronization group {}", copy.name));
                }
                reply(copies)
            },
            Self::CopySyncDataSourceConfiguration { sync_group_id, sync_data_source_configuration_ids: ids } => {
                db.write(|t| configs::copy_to_group(t, &sync_group_id, &ids))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("{} configurations added to group {sync_group_id}", ids.len()),
                );
                reply(())
            },
            Self::ReleaseSyncDataSourceConfigFromSyncGroup { sync_group_id, sync_data_source_configuration_ids: ids } => {
                db.write(|t| configs::release_from_group(t, &sync_group_id, &ids))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("{} configurations released from group {sync_group_id}", ids.len()),
                );
                reply(())
            },
            Self::MoveSyncDataSourceConfiguration {
                old_sync_group_id,
                new_sync_group_id,
                sync_data_source_configuration_ids: ids,
            } => {
                db.write(|t| configs::move_to_group(t, &old_sync_group_id, &new_sync_group_id, &ids))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("{} configurations moved from {old_sync_group_id} to {new_sync_group_id}", ids.len()),
                );
                reply(())
            },
        }
    }
}
