//! Business rules. Relationship rules restrict which classes a named special relationship
//! may reach; the check itself lives with the relationships.

use kw_database::Tables;
use kw_domain::model::application::{BUSINESS_RULE_TYPE_RELATIONSHIP, BusinessRule};
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use kw_metadata::schema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBusinessRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_type: i32,
    #[serde(default)]
    pub scope: i32,
    pub applies_to: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// `className;relationshipName;targetClass`, every part filled in.
fn check_relationship_constraint(constraint: &str) -> Result<(), InventoryError> {
    let parts: Vec<&str> = constraint.split(';').map(str::trim).collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.is_empty()) {
        Ok(())
    } else {
        Err(InventoryError::invalid(format!(
            "Constraint '{constraint}' must read className;relationshipName;targetClass"
        )))
    }
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names and malformed constraints.
/// * [`InventoryError::NotFound`] when a relationship rule applies to an unknown class.
pub fn create_rule(tables: &mut Tables, new: NewBusinessRule) -> Result<Id, InventoryError> {
    let name = validation::not_blank(&new.name, "The rule name")?.to_owned();
    if new.rule_type == BUSINESS_RULE_TYPE_RELATIONSHIP {
        schema::class(tables, &new.applies_to)?;
        if new.constraints.is_empty() {
            return Err(InventoryError::invalid("Relationship rules need at least one constraint"));
        }
        for constraint in &new.constraints {
            check_relationship_constraint(constraint)?;
        }
    }
    let id = new_id();
    tables.business_rules.insert(
        id.clone(),
        BusinessRule {
            id: id.clone(),
            name,
            description: new.description,
            rule_type: new.rule_type,
            scope: new.scope,
            applies_to: new.applies_to,
            version: new.version,
            constraints: new.constraints,
        },
    );
    Ok(id)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown rules.
pub fn delete_rule(tables: &mut Tables, id: &str) -> Result<(), InventoryError> {
    tables
        .business_rules
        .remove(id)
        .map(drop)
        .ok_or_else(|| InventoryError::not_found(format!("Business rule {id} could not be found")))
}

/// Rules of one type; `-1` lists them all.
#[must_use]
pub fn rules(tables: &Tables, rule_type: i32) -> Vec<BusinessRule> {
    let mut found: Vec<BusinessRule> =
        tables.business_rules.values().filter(|r| rule_type == -1 || r.rule_type == rule_type).cloned().collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, constraints: &[&str]) -> NewBusinessRule {
        NewBusinessRule {
            name: name.to_owned(),
            description: String::new(),
            rule_type: BUSINESS_RULE_TYPE_RELATIONSHIP,
            scope: 0,
            applies_to: "Router".to_owned(),
            version: "1.0".to_owned(),
            constraints: constraints.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    #[test]
    fn relationship_constraints_are_checked() {
        let mut tables = Tables::default();
        kw_metadata::bootstrap::seed_core_model(&mut tables);
        let id = create_rule(&mut tables, rule("uplinks", &["Router;uplink;Switch"])).unwrap();
        assert!(create_rule(&mut tables, rule("broken", &["Router;uplink"])).is_err());
        assert!(create_rule(&mut tables, rule("empty", &[])).is_err());
        assert!(create_rule(&mut tables, rule("blank", &["Router; ;Switch"])).is_err());

        let other = NewBusinessRule { rule_type: 7, applies_to: String::new(), ..rule("free form", &[]) };
        create_rule(&mut tables, other).unwrap();
        assert_eq!(rules(&tables, BUSINESS_RULE_TYPE_RELATIONSHIP).len(), 1);
        assert_eq!(rules(&tables, -1).len(), 2);
        delete_rule(&mut tables, &id).unwrap();
        assert!(delete_rule(&mut tables, &id).is_err());
    }
}
