use crate::Application;
use crate::reports::{self, NewReport, ReportUpdate};
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
pub enum ReportsCall {
    CreateClassLevelReport {
        class_name: String,
        #[serde(flatten)]
        report: NewReport,
    },
    CreateInventoryLevelReport(NewReport),
    UpdateReport {
        id: Id,
        #[serde(flatten)]
        update: ReportUpdate,
    },
    UpdateReportParameters { id: Id, parameters: BTreeMap<String, Option<String>> },
    DeleteReport { id: Id },
    GetClassLevelReports {
        class_name: String,
        #[serde(default)]
        recursive: bool,
        #[serde(default)]
        include_disabled: bool,
    },
    GetInventoryLevelReports {
        #[serde(default)]
        include_disabled: bool,
    },
    GetReport { id: Id },
}

impl SliceCall for ReportsCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetClassLevelReports { .. } | Self::GetInventoryLevelReports { .. } | Self::GetReport { .. } => {
                Requirement::read(FeatureSet::REPORTS)
            },
            _ => Requirement::write(FeatureSet::REPORTS),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateClassLevelReport { class_name, report } => {
                let name = report.name.clone();
                let id = db.write(|t| reports::create_class_level_report(t, &class_name, report))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Report {name} for {class_name}"));
                reply(id)
            },
            Self::CreateInventoryLevelReport(report) => {
                let name = report.name.clone();
                let id = db.write(|t| reports::create_inventory_level_report(t, report))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Report {name}"));
                reply(id)
            },
            Self::UpdateReport { id, update } => {
                let notes = db.write(|t| reports::update_report(t, &id, update))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, notes);
                reply(())
            },
            Self::UpdateReportParameters { id, parameters } => {
                db.write(|t| reports::update_parameters(t, &id, &parameters))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Report {id}: parameters"));
                reply(())
            },
            Self::DeleteReport { id } => {
                db.write(|t| reports::delete_report(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Report {id}"));
                reply(())
            },
            Self::GetClassLevelReports { class_name, recursive, include_disabled } => {
                reply(db.read(|t| reports::class_level_reports(t, &class_name, recursive, include_disabled))?)
            },
            Self::GetInventoryLevelReports { include_disabled } => {
                reply(db.read(|t| reports::inventory_level_reports(t, include_disabled)))
            },
            Self::GetReport { id } => reply(db.read(|t| reports::report(t, &id).cloned())?),
        }
    }
}
