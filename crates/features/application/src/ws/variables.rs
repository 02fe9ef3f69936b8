use crate::Application;
use crate::variables::{self, NewVariable};
use kw_domain::model::Id;
use kw_domain::model::audit::ActivityType;
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum VariablesCall {
    CreateConfigurationVariablesPool {
        name: String,
        #[serde(default)]
        description: String,
    },
    UpdateConfigurationVariablesPool { pool_id: Id, property_to_update: String, value: String },
    DeleteConfigurationVariablesPool { pool_id: Id },
    GetConfigurationVariablesPools {},
    GetConfigurationVariablesInPool { pool_id: Id },
    CreateConfigurationVariable {
        pool_id: Id,
        #[serde(flatten)]
        variable: NewVariable,
    },
    UpdateConfigurationVariable { name: String, property_to_update: String, value: String },
    DeleteConfigurationVariable { name: String },
    GetConfigurationVariable { name: String },
    GetConfigurationVariableValue { name: String },
}

impl SliceCall for VariablesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetConfigurationVariablesPools {}
            | Self::GetConfigurationVariablesInPool { .. }
            | Self::GetConfigurationVariable { .. }
            | Self::GetConfigurationVariableValue { .. } => Requirement::read(FeatureSet::CONFIG),
            _ => Requirement::write(FeatureSet::CONFIG),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateConfigurationVariablesPool { name, description } => {
                let id = db.write(|t| variables::create_pool(t, &name, &description))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Configuration pool {name}"));
                reply(id)
            },
            Self::UpdateConfigurationVariablesPool { pool_id, property_to_update, value } => {
                db.write(|t| variables::update_pool(t, &pool_id, &property_to_update, &value))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Configuration pool {pool_id}: {property_to_update}"),
                );
                reply(())
            },
            Self::DeleteConfigurationVariablesPool { pool_id } => {
                let count = db.write(|t| variables::delete_pool(t, &pool_id))?;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    None,
                    format!("Configuration pool {pool_id} with {count} variables"),
                );
                reply(())
            },
            Self::GetConfigurationVariablesPools {} => reply(db.read(variables::pools)),
            Self::GetConfigurationVariablesInPool { pool_id } => {
                reply(db.read(|t| variables::variables_in_pool(t, &pool_id))?)
            },
            Self::CreateConfigurationVariable { pool_id, variable } => {
                let id = db.write(|t| variables::create_variable(t, &pool_id, &variable))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Configuration variable {}", variable.name));
                reply(id)
            },
            Self::UpdateConfigurationVariable { name, property_to_update, value } => {
                db.write(|t| variables::update_variable(t, &name, &property_to_update, &value))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Configuration variable {name}: {property_to_update}"),
                );
                reply(())
            },
            Self::DeleteConfigurationVariable { name } => {
                db.write(|t| variables::delete_variable(t, &name))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Configuration variable {name}"));
                reply(())
            },
            Self::GetConfigurationVariable { name } => reply(db.read(|t| variables::variable_info(t, &name))?),
            Self::GetConfigurationVariableValue { name } => reply(db.read(|t| variables::variable_value(t, &name))?),
        }
    }
}
