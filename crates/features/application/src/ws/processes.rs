use crate::Application;
use crate::processes::{self, NewProcessDefinition};
use kw_domain::model::Id;
use kw_domain::model::audit::ActivityType;
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
pub enum ProcessesCall {
    CreateProcessDefinition(NewProcessDefinition),
    UpdateProcessDefinition {
        id: Id,
        #[serde(default)]
        properties: BTreeMap<String, String>,
        #[serde(default)]
        structure: Option<String>,
    },
    DeleteProcessDefinition { id: Id },
    GetProcessDefinition { id: Id },
    GetProcessDefinitions {},
    CreateProcessInstance {
        process_definition_id: Id,
        #[serde(default)]
        name: String,
        #[serde(default)]
        description: String,
    },
    GetProcessInstance { id: Id },
    GetProcessInstances { process_definition_id: Id },
    DeleteProcessInstance { id: Id },
}

impl SliceCall for ProcessesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetProcessDefinition { .. }
            | Self::GetProcessDefinitions {}
            | Self::GetProcessInstance { .. }
            | Self::GetProcessInstances { .. } => Requirement::read(FeatureSet::PROCESSES),
            _ => Requirement::write(FeatureSet::PROCESSES),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateProcessDefinition(definition) => {
                let name = definition.name.clone();
                let id = db.write(|t| processes::create_definition(t, definition))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Process definition {name}"));
                reply(id)
            },
            Self::UpdateProcessDefinition { id, properties, structure } => {
                let notes = db.write(|t| processes::update_definition(t, &id, &properties, structure.as_deref()))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, notes);
                reply(())
            },
            Self::DeleteProcessDefinition { id } => {
                let removed = db.write(|t| processes::delete_definition(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Process definition {}", removed.name));
                reply(())
            },
            Self::GetProcessDefinition { id } => reply(db.read(|t| processes::definition(t, &id).cloned())?),
            Self::GetProcessDefinitions {} => reply(db.read(processes::definitions)),
            Self::CreateProcessInstance { process_definition_id, name, description } => {
                let id = db.write(|t| processes::create_instance(t, &process_definition_id, &name, &description))?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    None,
                    format!("Process instance {id} of {process_definition_id}"),
                );
                reply(id)
            },
            Self::GetProcessInstance { id } => reply(db.read(|t| processes::instance(t, &id).cloned())?),
            Self::GetProcessInstances { process_definition_id } => {
                reply(db.read(|t| processes::instances(t, &process_definition_id))?)
            },
            Self::DeleteProcessInstance { id } => {
                db.write(|t| processes::delete_instance(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Process instance {id}"));
                reply(())
            },
        }
    }
}
