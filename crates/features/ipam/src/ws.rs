//! Web service operations of the IPAM module.

use crate::addresses::{self, Link};
use crate::{Ipam, pools, subnets};
use kw_database::Database;
use kw_domain::constants::{ATTRIBUTE_NAME, CLASS_GENERIC_SUBNET, CLASS_IP_ADDRESS, CLASS_VLAN, CLASS_VRF_INSTANCE};
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
pub enum IpamCall {
    GetSubnetPools {
        parent_id: Id,
        #[serde(default)]
        class_name: Option<String>,
    },
    GetSubnetPool { subnet_pool_id: Id },
    CreateSubnetPool {
        parent_id: Id,
        subnet_pool_name: String,
        #[serde(default)]
        subnet_pool_description: String,
        class_name: String,
    },
    DeleteSubnetPools { ids: Vec<Id> },
    GetSubnets {
        pool_id: Id,
        #[serde(default)]
        limit: i64,
    },
    GetSubnet { class_name: String, id: Id },
    /// `poolId` may also name the subnet the new one nests in.
    CreateSubnet {
        #[serde(alias = "parentId")]
        pool_id: Id,
        class_name: String,
        attributes: BTreeMap<String, String>,
    },
    DeleteSubnets {
        ids: Vec<Id>,
        class_name: String,
        #[serde(default)]
        release_relationships: bool,
    },
    #[serde(rename = "addIPAddress")]
    #[strum(serialize = "addIPAddress")]
    AddIpAddress { id: Id, parent_class_name: String, attributes: BTreeMap<String, String> },
    #[serde(rename = "removeIP")]
    #[strum(serialize = "removeIP")]
    RemoveIp {
        ids: Vec<Id>,
        #[serde(default)]
        release_relationships: bool,
    },
    #[serde(rename = "relateIPtoPort")]
    #[strum(serialize = "relateIPtoPort")]
    RelateIpToPort { id: Id, device_class_name: String, device_id: Id },
    #[serde(rename = "releasePortFromIP")]
    #[strum(serialize = "releasePortFromIP")]
    ReleasePortFromIp { device_class_name: String, device_id: Id, id: Id },
    RelateSubnetToVlan { id: Id, class_name: String, vlan_id: Id },
    ReleaseSubnetFromVlan { subnet_id: Id, vlan_id: Id },
    RelateSubnetToVrf { id: Id, class_name: String, vrf_id: Id },
    #[serde(rename = "releaseSubnetFromVRF")]
    #[strum(serialize = "releaseSubnetFromVRF")]
    ReleaseSubnetFromVrf { subnet_id: Id, vrf_id: Id },
    GetSubnetUsedIps {
        id: Id,
        class_name: String,
        #[serde(default)]
        limit: i64,
    },
    GetSubnetsInSubnet {
        id: Id,
        class_name: String,
        #[serde(default)]
        limit: i64,
    },
    ItOverlaps { network_ip: String, broadcast_ip: String },
    RelatePortToInterface { port_id: Id, port_class_name: String, interface_class_name: String, interface_id: Id },
    ReleasePortFromInterface { interface_class_name: String, interface_id: Id, port_id: Id },
}

impl SliceCall for IpamCall {
    type Slice = Ipam;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetSubnetPools { .. }
            | Self::GetSubnetPool { .. }
            | Self::GetSubnets { .. }
            | Self::GetSubnet { .. }
            | Self::GetSubnetUsedIps { .. }
            | Self::GetSubnetsInSubnet { .. }
            | Self::ItOverlaps { .. } => Requirement::read(FeatureSet::IPAM),
            _ => Requirement::write(FeatureSet::IPAM),
        }
    }

    async fn execute(self, slice: &Ipam, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::GetSubnetPools { parent_id, class_name } => {
                reply(db.read(|t| pools::subnet_pools(t, &parent_id, class_name.as_deref()))?)
            },
            Self::GetSubnetPool { subnet_pool_id } => {
                reply(db.read(|t| pools::subnet_pool(t, &subnet_pool_id).cloned())?)
            },
            Self::CreateSubnetPool { parent_id, subnet_pool_name, subnet_pool_description, class_name } => {
                let id = db.write(|t| {
                    pools::create_subnet_pool(t, &parent_id, &subnet_pool_name, &subnet_pool_description, &class_name)
                })?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Subnet pool {subnet_pool_name}"));
                reply(id)
            },
            Self::DeleteSubnetPools { ids } => {
                let removed = db.write(|t| pools::delete_subnet_pools(t, &ids))?;
                kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    None,
                    format!("Subnet pools {} with {} objects", ids.join(", "), removed.objects.len()),
                );
                reply(())
            },
            Self::GetSubnets { pool_id, limit } => reply(db.read(|t| subnets::subnets_in_pool(t, &pool_id, limit))?),
            Self::GetSubnet { class_name, id } => reply(db.read(|t| subnets::subnet(t, &class_name, &id))?),
            Self::CreateSubnet { pool_id, class_name, attributes } => {
                let id = db.write(|t| subnets::create_subnet(t, &pool_id, &class_name, &attributes))?;
                let block = attributes.get(ATTRIBUTE_NAME).cloned().unwrap_or_default();
                ctx.record(ActivityType::CreateInventoryObject, Some(&ObjectKey::new(class_name, id.clone())), block);
                reply(id)
            },
            Self::DeleteSubnets { ids, class_name, release_relationships } => {
                let removed =
                    db.write(|t| subnets::delete_subnets(t, &class_name, &ids, release_relationships))?;
                kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                for key in &removed.objects {
                    ctx.record(ActivityType::DeleteInventoryObject, Some(key), "");
                }
                reply(())
            },
            Self::AddIpAddress { id, parent_class_name, attributes } => {
                let ip = db.write(|t| addresses::add_ip_address(t, &id, &parent_class_name, &attributes))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(CLASS_IP_ADDRESS, ip.clone())),
                    format!("In subnet {id}"),
                );
                reply(ip)
            },
            Self::RemoveIp { ids, release_relationships } => {
                let removed = db.write(|t| addresses::remove_ips(t, &ids, release_relationships))?;
                kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                for key in &removed.objects {
                    ctx.record(ActivityType::DeleteInventoryObject, Some(key), "");
                }
                reply(())
            },
            Self::RelateIpToPort { id, device_class_name, device_id } => {
                let port = ObjectKey::new(device_class_name, device_id);
                relate(db, ctx, Link::PortAddress, &port, &ObjectKey::new(CLASS_IP_ADDRESS, id))
            },
            Self::ReleasePortFromIp { device_class_name, device_id, id } => {
                release(db, ctx, Link::PortAddress, &ObjectKey::new(device_class_name, device_id), &id)
            },
            Self::RelateSubnetToVlan { id, class_name, vlan_id } => {
                relate(db, ctx, Link::SubnetVlan, &ObjectKey::new(CLASS_VLAN, vlan_id), &ObjectKey::new(class_name, id))
            },
            Self::ReleaseSubnetFromVlan { subnet_id, vlan_id } => {
                release(db, ctx, Link::SubnetVlan, &ObjectKey::new(CLASS_VLAN, vlan_id), &subnet_id)
            },
            Self::RelateSubnetToVrf { id, class_name, vrf_id } => {
                let vrf = ObjectKey::new(CLASS_VRF_INSTANCE, vrf_id);
                relate(db, ctx, Link::SubnetVrf, &vrf, &ObjectKey::new(class_name, id))
            },
            Self::ReleaseSubnetFromVrf { subnet_id, vrf_id } => {
                release(db, ctx, Link::SubnetVrf, &ObjectKey::new(CLASS_VRF_INSTANCE, vrf_id), &subnet_id)
            },
            Self::GetSubnetUsedIps { id, class_name, limit } => {
                reply(db.read(|t| subnets::used_ips(t, &class_name, &id, limit))?)
            },
            Self::GetSubnetsInSubnet { id, class_name, limit } => {
                let class_name = if class_name.trim().is_empty() { CLASS_GENERIC_SUBNET.to_owned() } else { class_name };
                reply(db.read(|t| subnets::subnets_in_subnet(t, &class_name, &id, limit))?)
            },
            Self::ItOverlaps { network_ip, broadcast_ip } => {
                reply(db.read(|t| subnets::overlaps(t, &network_ip, &broadcast_ip))?)
            },
            Self::RelatePortToInterface { port_id, port_class_name, interface_class_name, interface_id } => {
                let interface = ObjectKey::new(interface_class_name, interface_id);
                relate(db, ctx, Link::PortInterface, &interface, &ObjectKey::new(port_class_name, port_id))
            },
            Self::ReleasePortFromInterface { interface_class_name, interface_id, port_id } => {
                release(db, ctx, Link::PortInterface, &ObjectKey::new(interface_class_name, interface_id), &port_id)
            },
        }
    }
}

fn relate(
    db: &Database,
    ctx: &CallContext,
    link: Link,
    a: &ObjectKey,
    b: &ObjectKey,
) -> Result<Value, InventoryError> {
    let (a, b) = db.write(|t| link.relate(t, a, b))?;
    ctx.record(ActivityType::CreateRelationship, Some(&a), format!("{} -> {b}", link.relationship()));
    reply(())
}

fn release(
    db: &Database,
    ctx: &CallContext,
    link: Link,
    a: &ObjectKey,
    b_id: &str,
) -> Result<Value, InventoryError> {
    db.write(|t| link.release(t, a, b_id))?;
    ctx.record(ActivityType::ReleaseRelationship, Some(a), format!("{} -> {b_id}", link.relationship()));
    reply(())
}
