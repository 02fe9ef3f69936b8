use super::any_type;
use crate::Application;
use crate::pools::{self, NewPool};
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
pub enum PoolsCall {
    CreateRootPool(NewPool),
    CreatePoolInObject {
        parent_class_name: String,
        parent_id: Id,
        #[serde(flatten)]
        pool: NewPool,
    },
    CreatePoolInPool {
        parent_id: Id,
        #[serde(flatten)]
        pool: NewPool,
    },
    CreatePoolItem {
        pool_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        template_id: Option<Id>,
    },
    DeletePools { ids: Vec<Id> },
    GetRootPools {
        #[serde(default)]
        class_name: Option<String>,
        #[serde(default = "any_type")]
        pool_type: i32,
        #[serde(default)]
        include_subclasses: bool,
    },
    GetPoolsInObject {
        class_name: String,
        id: Id,
        #[serde(default)]
        pool_class: Option<String>,
    },
    GetPoolsInPool {
        parent_id: Id,
        #[serde(default)]
        pool_class: Option<String>,
    },
    GetPool { id: Id },
    GetPoolItems {
        pool_id: Id,
        #[serde(default)]
        limit: i64,
    },
    SetPoolProperties {
        id: Id,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl SliceCall for PoolsCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetRootPools { .. }
            | Self::GetPoolsInObject { .. }
            | Self::GetPoolsInPool { .. }
            | Self::GetPool { .. }
            | Self::GetPoolItems { .. } => Requirement::read(FeatureSet::POOLS),
            _ => Requirement::write(FeatureSet::POOLS),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateRootPool(pool) => {
                let id = db.write(|t| pools::create_root_pool(t, &pool))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Pool {} ({id})", pool.name));
                reply(id)
            },
            Self::CreatePoolInObject { parent_class_name, parent_id, pool } => {
                let id = db.write(|t| pools::create_pool_in_object(t, &parent_class_name, &parent_id, &pool))?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    Some(&ObjectKey::new(parent_class_name, parent_id)),
                    format!("Pool {} ({id})", pool.name),
                );
                reply(id)
            },
            Self::CreatePoolInPool { parent_id, pool } => {
                let id = db.write(|t| pools::create_pool_in_pool(t, &parent_id, &pool))?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    None,
                    format!("Pool {} ({id}) in pool {parent_id}", pool.name),
                );
                reply(id)
            },
            Self::CreatePoolItem { pool_id, class_name, attributes, template_id } => {
                let id =
                    db.write(|t| pools::create_pool_item(t, &pool_id, &class_name, &attributes, template_id.as_deref()))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("In pool {pool_id}"),
                );
                reply(id)
            },
            Self::DeletePools { ids } => {
                let removed = db.write(|t| pools::delete_pools(t, &ids))?;
                kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    None,
                    format!("Pools {} with {} items", ids.join(", "), removed.objects.len()),
                );
                reply(())
            },
            Self::GetRootPools { class_name, pool_type, include_subclasses } => {
                reply(db.read(|t| pools::root_pools(t, class_name.as_deref(), pool_type, include_subclasses)))
            },
            Self::GetPoolsInObject { class_name, id, pool_class } => {
                reply(db.read(|t| pools::pools_in_object(t, &class_name, &id, pool_class.as_deref()))?)
            },
            Self::GetPoolsInPool { parent_id, pool_class } => {
                reply(db.read(|t| pools::pools_in_pool(t, &parent_id, pool_class.as_deref()))?)
            },
            Self::GetPool { id } => reply(db.read(|t| pools::pool(t, &id).cloned())?),
            Self::GetPoolItems { pool_id, limit } => reply(db.read(|t| pools::pool_items(t, &pool_id, limit))?),
            Self::SetPoolProperties { id, name, description } => {
                let notes = db.write(|t| pools::set_pool_properties(t, &id, name.as_deref(), description.as_deref()))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Pool {id}: {notes}"));
                reply(())
            },
        }
    }
}
