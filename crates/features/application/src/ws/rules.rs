use super::any_type;
use crate::Application;
use crate::rules::{self, NewBusinessRule};
use crate::validators::{self, ValidatorUpdate};
use kw_domain::model::Id;
use kw_domain::model::audit::ActivityType;
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

/// Validator definitions and business rules.
#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RulesCall {
    CreateValidatorDefinition {
        name: String,
        #[serde(default)]
        description: String,
        class_name: String,
        #[serde(default)]
        script: String,
        #[serde(default)]
        enabled: bool,
    },
    UpdateValidatorDefinition {
        id: Id,
        #[serde(flatten)]
        update: ValidatorUpdate,
    },
    DeleteValidatorDefinition { id: Id },
    GetValidatorDefinitionsForClass { class_name: String },
    GetAllValidatorDefinitions {},
    CreateBusinessRule(NewBusinessRule),
    DeleteBusinessRule { id: Id },
    GetBusinessRules {
        #[serde(default = "any_type")]
        rule_type: i32,
    },
}

impl SliceCall for RulesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetValidatorDefinitionsForClass { .. } | Self::GetAllValidatorDefinitions {} => {
                Requirement::read(FeatureSet::VALIDATORS)
            },
            Self::CreateValidatorDefinition { .. }
            | Self::UpdateValidatorDefinition { .. }
            | Self::DeleteValidatorDefinition { .. } => Requirement::write(FeatureSet::VALIDATORS),
            Self::GetBusinessRules { .. } => Requirement::read(FeatureSet::BUSINESS_RULES),
            Self::CreateBusinessRule(_) | Self::DeleteBusinessRule { .. } => {
                Requirement::write(FeatureSet::BUSINESS_RULES)
            },
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateValidatorDefinition { name, description, class_name, script, enabled } => {
                let id = db.write(|t| {
                    validators::create_validator(t, &name, &description, &class_name, &script, enabled)
                })?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Validator {name} for {class_name}"));
                reply(id)
            },
            Self::UpdateValidatorDefinition { id, update } => {
                db.write(|t| validators::update_validator(t, &id, update))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Validator {id}"));
                reply(())
            },
            Self::DeleteValidatorDefinition { id } => {
                db.write(|t| validators::delete_validator(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Validator {id}"));
                reply(())
            },
            Self::GetValidatorDefinitionsForClass { class_name } => {
                reply(db.read(|t| validators::validators_for_class(t, &class_name))?)
            },
            Self::GetAllValidatorDefinitions {} => reply(db.read(validators::all_validators)),
            Self::CreateBusinessRule(rule) => {
                let name = rule.name.clone();
                let id = db.write(|t| rules::create_rule(t, rule))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Business rule {name}"));
                reply(id)
            },
            Self::DeleteBusinessRule { id } => {
                db.write(|t| rules::delete_rule(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Business rule {id}"));
                reply(())
            },
            Self::GetBusinessRules { rule_type } => reply(db.read(|t| rules::rules(t, rule_type))),
        }
    }
}
