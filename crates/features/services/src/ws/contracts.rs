use super::{forget_removed, record_links};
use crate::{Services, catalog, contracts};
use kw_domain::constants::{CLASS_GENERIC_CONTRACT, REL_CONTRACT_HAS};
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
pub enum ContractsCall {
    CreateContractPool {
        name: String,
        #[serde(default)]
        description: String,
    },
    GetContractPools {},
    CreateContract {
        pool_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        template_id: Option<Id>,
    },
    GetContractsInPool {
        pool_id: Id,
        #[serde(default)]
        class_name: Option<String>,
        #[serde(default)]
        limit: i64,
    },
    GetAllContracts {
        #[serde(default)]
        limit: i64,
    },
    DeleteContract {
        class_name: String,
        id: Id,
        #[serde(default)]
        release_relationships: bool,
    },
    RelateObjectsToContract { contract_class_name: String, contract_id: Id, objects: Vec<ObjectKey> },
    ReleaseObjectFromContract { contract_id: Id, object_id: Id },
    GetContractResources { contract_class_name: String, contract_id: Id },
    CopyContractToPool { pool_id: Id, class_name: String, id: Id },
    MoveContractToPool { pool_id: Id, class_name: String, id: Id },
}

impl SliceCall for ContractsCall {
    type Slice = Services;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetContractPools {}
            | Self::GetContractsInPool { .. }
            | Self::GetAllContracts { .. }
            | Self::GetContractResources { .. } => Requirement::read(FeatureSet::CONTRACTS),
            _ => Requirement::write(FeatureSet::CONTRACTS),
        }
    }

    async fn execute(self, slice: &Services, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateContractPool { name, description } => {
                let id = db.write(|t| catalog::create_root_pool(t, CLASS_GENERIC_CONTRACT, &name, &description))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Contract pool {name}"));
                reply(id)
            },
            Self::GetContractPools {} => reply(db.read(|t| catalog::root_pools(t, CLASS_GENERIC_CONTRACT))),
            Self::CreateContract { pool_id, class_name, attributes, template_id } => {
                let id = db.write(|t| {
                    catalog::create_item(t, CLASS_GENERIC_CONTRACT, &pool_id, &class_name, &attributes, template_id.as_deref())
                })?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("In pool {pool_id}"),
                );
                reply(id)
            },
            Self::GetContractsInPool { pool_id, class_name, limit } => reply(db.read(|t| {
                catalog::items_in_pool(t, CLASS_GENERIC_CONTRACT, &pool_id, class_name.as_deref(), limit)
            })?),
            Self::GetAllContracts { limit } => reply(db.read(|t| catalog::all_of(t, CLASS_GENERIC_CONTRACT, limit))),
            Self::DeleteContract { class_name, id, release_relationships } => {
                let removed = db.write(|t| {
                    catalog::delete_member(t, CLASS_GENERIC_CONTRACT, &class_name, &id, release_relationships)
                })?;
                forget_removed(slice.attachments.as_ref(), ctx, &removed).await;
                reply(())
            },
            Self::RelateObjectsToContract { contract_class_name, contract_id, objects } => {
                let contract = ObjectKey::new(contract_class_name, contract_id);
                let related = db.write(|t| contracts::relate_to_contract(t, &contract, &objects))?;
                record_links(ctx, ActivityType::CreateRelationship, &contract, &related, REL_CONTRACT_HAS);
                reply(())
            },
            Self::ReleaseObjectFromContract { contract_id, object_id } => {
                let contract = db.write(|t| contracts::release_from_contract(t, &contract_id, &object_id))?;
                ctx.record(
                    ActivityType::ReleaseRelationship,
                    Some(&contract),
                    format!("{REL_CONTRACT_HAS} -> {object_id}"),
                );
                reply(())
            },
            Self::GetContractResources { contract_class_name, contract_id } => {
                let contract = ObjectKey::new(contract_class_name, contract_id);
                reply(db.read(|t| contracts::contract_resources(t, &contract))?)
            },
            Self::CopyContractToPool { pool_id, class_name, id } => {
                let copy = db.write(|t| catalog::copy_to_pool(t, CLASS_GENERIC_CONTRACT, &pool_id, &class_name, &id))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, copy.clone())),
                    format!("Copy of {id} in pool {pool_id}"),
                );
                reply(copy)
            },
            Self::MoveContractToPool { pool_id, class_name, id } => {
                db.write(|t| catalog::move_to_pool(t, CLASS_GENERIC_CONTRACT, &pool_id, &class_name, &id))?;
                ctx.record(ActivityType::MoveObject, Some(&ObjectKey::new(class_name, id)), format!("To pool {pool_id}"));
                reply(())
            },
        }
    }
}
