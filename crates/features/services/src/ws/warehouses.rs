use super::record_links;
use crate::{Services, warehouses};
use kw_domain::constants::REL_WAREHOUSE_HAS;
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum WarehousesCall {
    GetWarehouseRootPools {},
    AssociatePhysicalNodeToWarehouse { object_class: String, object_id: Id, warehouse_class: String, warehouse_id: Id },
    AssociatesPhysicalNodeToWarehouse { objects: Vec<ObjectKey>, warehouse_class: String, warehouse_id: Id },
    ReleasePhysicalNodeFromWarehouse { warehouse_class: String, warehouse_id: Id, target_id: Id },
    /// `target_oid` is the id of a pool owned by a warehouse.
    MoveObjectsToWarehousePool { target_oid: Id, objects: Vec<ObjectKey> },
    MoveObjectsToWarehouse { target_class: String, target_oid: Id, objects: Vec<ObjectKey> },
    GetPhysicalNodeToObjectInWarehouse { object_class_name: String, object_id: Id },
    GetWarehouseToObject { object_class_name: String, object_id: Id },
}

impl SliceCall for WarehousesCall {
    type Slice = Services;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetWarehouseRootPools {}
            | Self::GetPhysicalNodeToObjectInWarehouse { .. }
            | Self::GetWarehouseToObject { .. } => Requirement::read(FeatureSet::WAREHOUSES),
            _ => Requirement::write(FeatureSet::WAREHOUSES),
        }
    }

    async fn execute(self, slice: &Services, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::GetWarehouseRootPools {} => reply(db.read(warehouses::root_pools)),
            Self::AssociatePhysicalNodeToWarehouse { object_class, object_id, warehouse_class, warehouse_id } => {
                let warehouse = ObjectKey::new(warehouse_class, warehouse_id);
                let nodes = [ObjectKey::new(object_class, object_id)];
                let related = db.write(|t| warehouses::associate(t, &warehouse, &nodes))?;
                record_links(ctx, ActivityType::CreateRelationship, &warehouse, &related, REL_WAREHOUSE_HAS);
                reply(())
            },
            Self::AssociatesPhysicalNodeToWarehouse { objects, warehouse_class, warehouse_id } => {
                let warehouse = ObjectKey::new(warehouse_class, warehouse_id);
                let related = db.write(|t| warehouses::associate(t, &warehouse, &objects))?;
                record_links(ctx, ActivityType::CreateRelationship, &warehouse, &related, REL_WAREHOUSE_HAS);
                reply(())
            },
            Self::ReleasePhysicalNodeFromWarehouse { warehouse_class, warehouse_id, target_id } => {
                let warehouse = ObjectKey::new(warehouse_class, warehouse_id);
                db.write(|t| warehouses::release(t, &warehouse, &target_id))?;
                ctx.record(
                    ActivityType::ReleaseRelationship,
                    Some(&warehouse),
                    format!("{REL_WAREHOUSE_HAS} -> {target_id}"),
                );
                reply(())
            },
            Self::MoveObjectsToWarehousePool { target_oid, objects } => {
                db.write(|t| warehouses::move_to_pool(t, &target_oid, &objects))?;
                for object in &objects {
                    ctx.record(ActivityType::MoveObject, Some(object), format!("To pool {target_oid}"));
                }
                reply(())
            },
            Self::MoveObjectsToWarehouse { target_class, target_oid, objects } => {
                let warehouse = ObjectKey::new(target_class, target_oid);
                db.write(|t| warehouses::move_to_warehouse(t, &warehouse, &objects))?;
                for object in &objects {
                    ctx.record(ActivityType::MoveObject, Some(object), format!("To {warehouse}"));
                }
                reply(())
            },
            Self::GetPhysicalNodeToObjectInWarehouse { object_class_name, object_id } => {
                let object = ObjectKey::new(object_class_name, object_id);
                reply(db.read(|t| warehouses::physical_node_of(t, &object))?)
            },
            Self::GetWarehouseToObject { object_class_name, object_id } => {
                let object = ObjectKey::new(object_class_name, object_id);
                reply(db.read(|t| warehouses::warehouse_of(t, &object))?)
            },
        }
    }
}
