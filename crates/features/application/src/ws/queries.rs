use super::first_page;
use crate::Application;
use crate::queries::{self, QueryContent};
use kw_domain::model::Id;
use kw_domain::model::application::QueryDefinition;
use kw_domain::model::audit::ActivityType;
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

/// Saved queries are scoped to the calling user.
#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum QueriesCall {
    CreateQuery(QueryContent),
    SaveQuery {
        id: Id,
        #[serde(flatten)]
        content: QueryContent,
    },
    DeleteQuery { id: Id },
    GetQueries {
        #[serde(default)]
        show_public: bool,
    },
    GetQuery { id: Id },
    ExecuteQuery {
        definition: QueryDefinition,
        #[serde(default = "first_page")]
        page: i64,
        #[serde(default)]
        limit: i64,
    },
}

impl SliceCall for QueriesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetQueries { .. } | Self::GetQuery { .. } | Self::ExecuteQuery { .. } => {
                Requirement::read(FeatureSet::QUERIES)
            },
            _ => Requirement::write(FeatureSet::QUERIES),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        let user_id = ctx.caller().user_id.as_str();
        match self {
            Self::CreateQuery(content) => {
                let id = db.write(|t| queries::create_query(t, &content))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Query {} ({id})", content.name));
                reply(id)
            },
            Self::SaveQuery { id, content } => {
                db.write(|t| queries::save_query(t, &id, user_id, &content))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Query {} ({id})", content.name));
                reply(())
            },
            Self::DeleteQuery { id } => {
                db.write(|t| queries::delete_query(t, &id, user_id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Query {id}"));
                reply(())
            },
            Self::GetQueries { show_public } => reply(db.read(|t| queries::queries(t, user_id, show_public))),
            Self::GetQuery { id } => reply(db.read(|t| queries::query(t, &id, user_id).cloned())?),
            Self::ExecuteQuery { definition, page, limit } => {
                reply(db.read(|t| queries::execute(t, &definition, page, limit))?)
            },
        }
    }
}
