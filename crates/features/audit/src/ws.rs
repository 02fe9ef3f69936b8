use crate::Audit;
use crate::trail::{self, TrailFilter};
use kw_domain::model::Id;
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AuditCall {
    GetGeneralActivityAuditTrail {
        #[serde(default)]
        page: i64,
        #[serde(default)]
        limit: i64,
        #[serde(default)]
        filters: TrailFilter,
    },
    GetBusinessObjectAuditTrail {
        class_name: String,
        id: Id,
        #[serde(default)]
        limit: i64,
    },
}

impl SliceCall for AuditCall {
    type Slice = Audit;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        Requirement::read(FeatureSet::AUDIT)
    }

    async fn execute(self, slice: &Audit, _ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::GetGeneralActivityAuditTrail { page, limit, filters } => {
                reply(db.read(|t| trail::general_trail(t, page, limit, &filters))?)
            },
            Self::GetBusinessObjectAuditTrail { class_name, id, limit } => {
                reply(db.read(|t| trail::object_trail(t, &class_name, &id, limit))?)
            },
        }
    }
}
