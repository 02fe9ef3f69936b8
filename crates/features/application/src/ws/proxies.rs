use crate::Application;
use crate::proxies;
use kw_domain::constants::REL_HAS_PROXY;
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
pub enum ProxiesCall {
    CreateProxyPool {
        name: String,
        #[serde(default)]
        description: String,
    },
    UpdateProxyPool { pool_id: Id, property_to_update: String, value: String },
    DeleteProxyPool { pool_id: Id },
    GetProxyPools {},
    CreateProxy {
        pool_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
    UpdateProxy { class_name: String, id: Id, attributes: BTreeMap<String, String> },
    DeleteProxy { class_name: String, id: Id },
    GetProxiesInPool { pool_id: Id },
    GetAllProxies {},
    AssociateObjectToProxy { object_class_name: String, object_id: Id, proxy_class_name: String, proxy_id: Id },
    ReleaseObjectFromProxy { object_class_name: String, object_id: Id, proxy_class_name: String, proxy_id: Id },
}

impl SliceCall for ProxiesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetProxyPools {} | Self::GetProxiesInPool { .. } | Self::GetAllProxies {} => {
                Requirement::read(FeatureSet::PROXIES)
            },
            _ => Requirement::write(FeatureSet::PROXIES),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateProxyPool { name, description } => {
                let id = db.write(|t| proxies::create_pool(t, &name, &description))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Proxy pool {name}"));
                reply(id)
            },
            Self::UpdateProxyPool { pool_id, property_to_update, value } => {
                db.write(|t| proxies::update_pool(t, &pool_id, &property_to_update, &value))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Proxy pool {pool_id}: {property_to_update}"),
                );
                reply(())
            },
            Self::DeleteProxyPool { pool_id } => {
                let count = db.write(|t| proxies::delete_pool(t, &pool_id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Proxy pool {pool_id} with {count} proxies"));
                reply(())
            },
            Self::GetProxyPools {} => reply(db.read(proxies::pools)),
            Self::CreateProxy { pool_id, class_name, attributes } => {
                let id = db.write(|t| proxies::create_proxy(t, &pool_id, &class_name, &attributes))?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("In proxy pool {pool_id}"),
                );
                reply(id)
            },
            Self::UpdateProxy { class_name, id, attributes } => {
                db.write(|t| proxies::update_proxy(t, &class_name, &id, &attributes))?;
                let changed = attributes.keys().cloned().collect::<Vec<_>>().join(", ");
                ctx.record(ActivityType::UpdateApplicationObject, Some(&ObjectKey::new(class_name, id)), changed);
                reply(())
            },
            Self::DeleteProxy { class_name, id } => {
                db.write(|t| proxies::delete_proxy(t, &class_name, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, Some(&ObjectKey::new(class_name, id)), "");
                reply(())
            },
            Self::GetProxiesInPool { pool_id } => reply(db.read(|t| proxies::proxies_in_pool(t, &pool_id))?),
            Self::GetAllProxies {} => reply(db.read(proxies::all_proxies)),
            Self::AssociateObjectToProxy { object_class_name, object_id, proxy_class_name, proxy_id } => {
                let object = ObjectKey::new(object_class_name, object_id);
                let proxy = ObjectKey::new(proxy_class_name, proxy_id);
                db.write(|t| proxies::associate(t, &object, &proxy))?;
                ctx.record(ActivityType::CreateRelationship, Some(&object), format!("{REL_HAS_PROXY} -> {proxy}"));
                reply(())
            },
            Self::ReleaseObjectFromProxy { object_class_name, object_id, proxy_class_name, proxy_id } => {
                let object = ObjectKey::new(object_class_name, object_id);
                let proxy = ObjectKey::new(proxy_class_name, proxy_id);
                db.write(|t| proxies::release(t, &object, &proxy))?;
                ctx.record(ActivityType::ReleaseRelationship, Some(&object), format!("{REL_HAS_PROXY} -> {proxy}"));
                reply(())
            },
        }
    }
}
