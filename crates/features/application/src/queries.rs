//! Saved queries and their execution against the inventory.

use kw_business::search::readable;
use kw_database::Tables;
use kw_domain::model::application::{LogicalConnector, Query, QueryCondition, QueryDefinition, QueryOperator};
use kw_domain::model::inventory::BusinessObject;
use kw_domain::model::{Id, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use kw_metadata::schema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fields of a new or saved query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryContent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Public when absent.
    #[serde(default)]
    pub owner_id: Option<Id>,
    pub definition: QueryDefinition,
}

fn checked(tables: &Tables, content: &QueryContent) -> Result<(), InventoryError> {
    validation::not_blank(&content.name, "The query name")?;
    if let Some(owner) = &content.owner_id
        && !tables.users.contains_key(owner)
    {
        return Err(InventoryError::not_found(format!("User {owner} could not be found")));
    }
    validate_definition(tables, &content.definition)
}

/// Every attribute a definition filters on or shows must exist in its class.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes.
/// * [`InventoryError::InvalidArgument`] for unknown attributes.
pub fn validate_definition(tables: &Tables, definition: &QueryDefinition) -> Result<(), InventoryError> {
    schema::class(tables, &definition.class_name)?;
    let named = definition.conditions.iter().map(|c| &c.attribute).chain(&definition.visible_attributes);
    for attribute in named {
        if schema::effective_attribute(tables, &definition.class_name, attribute).is_none() {
            return Err(InventoryError::invalid(format!(
                "Class {} has no attribute named {attribute}",
                definition.class_name
            )));
        }
    }
    Ok(())
}

/// # Errors
/// See [`validate_definition`], plus blank names and unknown owners.
pub fn create_query(tables: &mut Tables, content: &QueryContent) -> Result<Id, InventoryError> {
    checked(tables, content)?;
    let id = new_id();
    tables.queries.insert(
        id.clone(),
        Query {
            id: id.clone(),
            name: content.name.trim().to_owned(),
            description: content.description.clone(),
            owner: content.owner_id.clone(),
            definition: content.definition.clone(),
        },
    );
    Ok(id)
}

/// A query `user_id` may see: public ones and their own.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown queries and private queries of other users.
pub fn query<'a>(tables: &'a Tables, id: &str, user_id: &str) -> Result<&'a Query, InventoryError> {
    tables
        .queries
        .get(id)
        .filter(|q| q.owner.as_deref().is_none_or(|owner| owner == user_id))
        .ok_or_else(|| InventoryError::not_found(format!("Query {id} could not be found")))
}

/// # Errors
/// As [`create_query`] and [`query`].
pub fn save_query(tables: &mut Tables, id: &str, user_id: &str, content: &QueryContent) -> Result<(), InventoryError> {
    query(tables, id, user_id)?;
    checked(tables, content)?;
    if let Some(query) = tables.queries.get_mut(id) {
        query.name = content.name.trim().to_owned();
        query.description.clone_from(&content.description);
        query.owner.clone_from(&content.owner_id);
        query.definition = content.definition.clone();
    }
    Ok(())
}

/// # Errors
/// See [`query`].
pub fn delete_query(tables: &mut Tables, id: &str, user_id: &str) -> Result<(), InventoryError> {
    query(tables, id, user_id)?;
    tables.queries.remove(id);
    Ok(())
}

/// Queries owned by `user_id`, plus public ones when `show_public` is set.
#[must_use]
pub fn queries(tables: &Tables, user_id: &str, show_public: bool) -> Vec<Query> {
    let mut found: Vec<Query> = tables
        .queries
        .values()
        .filter(|q| q.owner.as_deref().map_or(show_public, |owner| owner == user_id))
        .cloned()
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

/// One object matched by a query with the values of the visible attributes, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub object: ObjectLight,
    pub values: Vec<String>,
}

fn compare(value: &str, wanted: &str) -> Ordering {
    match (value.parse::<f64>(), wanted.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => value.cmp(wanted),
    }
}

/// `like` is a case insensitive substring test; `%` wildcards around the text are allowed.
fn holds(tables: &Tables, object: &BusinessObject, condition: &QueryCondition) -> bool {
    let value = readable(tables, object, &condition.attribute);
    let wanted = condition.value.as_str();
    match condition.operator {
        QueryOperator::Equal => value.as_deref() == Some(wanted),
        QueryOperator::NotEqual => value.as_deref() != Some(wanted),
        QueryOperator::Like => value.is_some_and(|v| {
            v.to_lowercase().contains(&wanted.trim_matches('%').to_lowercase())
        }),
        QueryOperator::GreaterThan => value.is_some_and(|v| compare(&v, wanted) == Ordering::Greater),
        QueryOperator::LessThan => value.is_some_and(|v| compare(&v, wanted) == Ordering::Less),
    }
}

/// Runs a definition. Results are sorted by name and paged (`page` is 1-based, `limit <= 0`
/// returns everything).
///
/// # Errors
/// See [`validate_definition`], plus [`InventoryError::InvalidArgument`] for bad pages.
pub fn execute(
    tables: &Tables,
    definition: &QueryDefinition,
    page: i64,
    limit: i64,
) -> Result<Vec<ResultRecord>, InventoryError> {
    validate_definition(tables, definition)?;
    let bounds = validation::page_bounds(page, limit)?;
    let mut matched: Vec<&BusinessObject> = tables
        .objects
        .iter()
        .filter(|o| {
            if definition.include_subclasses {
                tables.classes.is_subclass_of(&o.class_name, &definition.class_name)
            } else {
                o.class_name == definition.class_name
            }
        })
        .filter(|o| match definition.connector {
            LogicalConnector::And => definition.conditions.iter().all(|c| holds(tables, o, c)),
            LogicalConnector::Or => {
                definition.conditions.is_empty() || definition.conditions.iter().any(|c| holds(tables, o, c))
            },
        })
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let records = matched.into_iter().map(|object| ResultRecord {
        object: object.light(),
        values: definition
            .visible_attributes
            .iter()
            .map(|attribute| readable(tables, object, attribute).unwrap_or_default())
            .collect(),
    });
    Ok(match bounds {
        Some((skip, take)) => records.skip(skip).take(take).collect(),
        None => records.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::ParentRef;
    use kw_domain::model::metadata::AttributeValue;
    use std::collections::BTreeMap;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        kw_metadata::bootstrap::seed_core_model(&mut tables);
        for (class_name, id, serial) in [("Router", "r1", "100"), ("Router", "r2", "250"), ("Switch", "s1", "90")] {
            tables.objects.insert(BusinessObject {
                id: id.to_owned(),
                class_name: class_name.to_owned(),
                name: format!("{class_name}-{id}"),
                parent: ParentRef::Root,
                attributes: BTreeMap::from([("serialNumber".to_owned(), AttributeValue::String(serial.to_owned()))]),
                creation_date: 0,
            });
        }
        tables
    }

    fn definition(conditions: Vec<QueryCondition>, connector: LogicalConnector) -> QueryDefinition {
        QueryDefinition {
            class_name: "GenericCommunicationsElement".to_owned(),
            include_subclasses: true,
            connector,
            conditions,
            visible_attributes: vec!["serialNumber".to_owned()],
        }
    }

    fn condition(attribute: &str, operator: QueryOperator, value: &str) -> QueryCondition {
        QueryCondition { attribute: attribute.to_owned(), operator, value: value.to_owned() }
    }

    #[test]
    fn conditions_filter_and_compare_numbers() {
        let tables = tables();
        let bigger = definition(vec![condition("serialNumber", QueryOperator::GreaterThan, "95")], LogicalConnector::And);
        let found = execute(&tables, &bigger, 1, 0).unwrap();
        assert_eq!(found.iter().map(|r| r.values[0].as_str()).collect::<Vec<_>>(), ["100", "250"]);

        let either = definition(
            vec![
                condition("name", QueryOperator::Like, "%switch%"),
                condition("serialNumber", QueryOperator::Equal, "250"),
            ],
            LogicalConnector::Or,
        );
        assert_eq!(execute(&tables, &either, 1, 0).unwrap().len(), 2);
        assert_eq!(execute(&tables, &either, 2, 1).unwrap()[0].object.id, "s1");

        let unknown = definition(vec![condition("color", QueryOperator::Equal, "red")], LogicalConnector::And);
        assert!(execute(&tables, &unknown, 1, 0).is_err());
    }

    #[test]
    fn private_queries_stay_private() {
        let mut tables = tables();
        let content = QueryContent {
            name: "Big routers".to_owned(),
            description: String::new(),
            owner_id: None,
            definition: definition(Vec::new(), LogicalConnector::And),
        };
        let public = create_query(&mut tables, &content).unwrap();
        let private = QueryContent { owner_id: Some("ghost".to_owned()), ..content.clone() };
        assert!(create_query(&mut tables, &private).is_err());

        assert!(query(&tables, &public, "anyone").is_ok());
        assert_eq!(queries(&tables, "anyone", true).len(), 1);
        assert!(queries(&tables, "anyone", false).is_empty());
        delete_query(&mut tables, &public, "anyone").unwrap();
        assert!(tables.queries.is_empty());
    }
}
