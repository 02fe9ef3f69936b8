//! Report definitions. Class level reports run against one object, inventory level reports
//! against the whole inventory.

use kw_database::Tables;
use kw_domain::model::application::Report;
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use kw_metadata::schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub report_type: i32,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub report_type: Option<i32>,
    #[serde(default)]
    pub script: Option<String>,
}

/// A report without its script, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLight {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub report_type: i32,
    pub class_name: Option<String>,
}

impl From<&Report> for ReportLight {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            name: report.name.clone(),
            description: report.description.clone(),
            enabled: report.enabled,
            report_type: report.report_type,
            class_name: report.class_name.clone(),
        }
    }
}

fn insert(tables: &mut Tables, class_name: Option<String>, new: NewReport) -> Result<Id, InventoryError> {
    let name = validation::not_blank(&new.name, "The report name")?.to_owned();
    let id = new_id();
    tables.reports.insert(
        id.clone(),
        Report {
            id: id.clone(),
            name,
            description: new.description,
            enabled: new.enabled,
            report_type: new.report_type,
            script: new.script,
            class_name,
            parameters: new.parameters,
        },
    );
    Ok(id)
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes.
/// * [`InventoryError::InvalidArgument`] for blank names.
pub fn create_class_level_report(tables: &mut Tables, class_name: &str, new: NewReport) -> Result<Id, InventoryError> {
    let class_name = schema::class(tables, class_name)?.name.clone();
    insert(tables, Some(class_name), new)
}

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names.
pub fn create_inventory_level_report(tables: &mut Tables, new: NewReport) -> Result<Id, InventoryError> {
    insert(tables, None, new)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown reports.
pub fn report<'a>(tables: &'a Tables, id: &str) -> Result<&'a Report, InventoryError> {
    tables.reports.get(id).ok_or_else(|| InventoryError::not_found(format!("Report {id} could not be found")))
}

/// Applies the fields present in `update`, returning a summary of the changes.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown reports, [`InventoryError::InvalidArgument`] for
/// blank names.
pub fn update_report(tables: &mut Tables, id: &str, update: ReportUpdate) -> Result<String, InventoryError> {
    let name = update.name.as_deref().map(|n| validation::not_blank(n, "The report name")).transpose()?;
    let Some(report) = tables.reports.get_mut(id) else {
        return Err(InventoryError::not_found(format!("Report {id} could not be found")));
    };
    let mut changed = Vec::new();
    if let Some(name) = name {
        name.clone_into(&mut report.name);
        changed.push("name");
    }
    if let Some(description) = update.description {
        report.description = description;
        changed.push("description");
    }
    if let Some(enabled) = update.enabled {
        report.enabled = enabled;
        changed.push("enabled");
    }
    if let Some(report_type) = update.report_type {
        report.report_type = report_type;
        changed.push("type");
    }
    if let Some(script) = update.script {
        report.script = script;
        changed.push("script");
    }
    Ok(format!("Updated {} of report {}", changed.join(", "), report.name))
}

/// Sets parameters; a `None` value removes the parameter.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown reports.
pub fn update_parameters(
    tables: &mut Tables,
    id: &str,
    parameters: &BTreeMap<String, Option<String>>,
) -> Result<(), InventoryError> {
    let Some(report) = tables.reports.get_mut(id) else {
        return Err(InventoryError::not_found(format!("Report {id} could not be found")));
    };
    for (name, value) in parameters {
        match value {
            Some(value) => report.parameters.insert(name.clone(), value.clone()),
            None => report.parameters.remove(name),
        };
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown reports.
pub fn delete_report(tables: &mut Tables, id: &str) -> Result<(), InventoryError> {
    tables.reports.remove(id).map(drop).ok_or_else(|| InventoryError::not_found(format!("Report {id} could not be found")))
}

fn listed<'a>(reports: impl Iterator<Item = &'a Report>, include_disabled: bool) -> Vec<ReportLight> {
    let mut lights: Vec<ReportLight> =
        reports.filter(|r| include_disabled || r.enabled).map(ReportLight::from).collect();
    lights.sort_by(|a, b| a.name.cmp(&b.name));
    lights
}

/// Reports of `class_name`, and of its superclasses when `recursive` is set.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn class_level_reports(
    tables: &Tables,
    class_name: &str,
    recursive: bool,
    include_disabled: bool,
) -> Result<Vec<ReportLight>, InventoryError> {
    schema::class(tables, class_name)?;
    let classes: Vec<&str> = if recursive {
        tables.classes.lineage(class_name).into_iter().map(|c| c.name.as_str()).collect()
    } else {
        vec![class_name]
    };
    Ok(listed(
        tables.reports.values().filter(|r| r.class_name.as_deref().is_some_and(|c| classes.contains(&c))),
        include_disabled,
    ))
}

#[must_use]
pub fn inventory_level_reports(tables: &Tables, include_disabled: bool) -> Vec<ReportLight> {
    listed(tables.reports.values().filter(|r| r.class_name.is_none()), include_disabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new(name: &str, enabled: bool) -> NewReport {
        NewReport { name: name.to_owned(), enabled, ..NewReport::default() }
    }

    #[test]
    fn class_reports_are_inherited_on_request() {
        let mut tables = Tables::default();
        kw_metadata::bootstrap::seed_core_model(&mut tables);
        create_class_level_report(&mut tables, "GenericCommunicationsElement", new("Inventory card", true)).unwrap();
        create_class_level_report(&mut tables, "Router", new("Interfaces", true)).unwrap();
        create_class_level_report(&mut tables, "Router", new("Draft", false)).unwrap();
        assert!(create_class_level_report(&mut tables, "Spaceship", new("x", true)).is_err());

        assert_eq!(class_level_reports(&tables, "Router", false, false).unwrap().len(), 1);
        assert_eq!(class_level_reports(&tables, "Router", true, false).unwrap().len(), 2);
        assert_eq!(class_level_reports(&tables, "Router", true, true).unwrap().len(), 3);
        assert!(inventory_level_reports(&tables, true).is_empty());
    }

    #[test]
    fn updates_touch_only_given_fields() {
        let mut tables = Tables::default();
        let id = create_inventory_level_report(&mut tables, new("Capacity", false)).unwrap();
        let update = ReportUpdate { enabled: Some(true), script: Some("run()".to_owned()), ..ReportUpdate::default() };
        update_report(&mut tables, &id, update).unwrap();
        let stored = report(&tables, &id).unwrap();
        assert!(stored.enabled);
        assert_eq!(stored.name, "Capacity");
        assert_eq!(inventory_level_reports(&tables, false).len(), 1);

        let blank = ReportUpdate { name: Some(String::new()), ..ReportUpdate::default() };
        assert!(update_report(&mut tables, &id, blank).is_err());
        delete_report(&mut tables, &id).unwrap();
        assert!(report(&tables, &id).is_err());
    }
}
