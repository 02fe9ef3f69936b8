//! Scheduled tasks and the users subscribed to their results. Scripts are stored, never run.

use kw_database::Tables;
use kw_domain::model::application::{Task, TaskNotification, TaskSchedule};
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use kw_session::UserInfo;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub commit_on_execute: bool,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub schedule: TaskSchedule,
    #[serde(default)]
    pub notification: TaskNotification,
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown tasks.
pub fn task<'a>(tables: &'a Tables, id: &str) -> Result<&'a Task, InventoryError> {
    tables.tasks.get(id).ok_or_else(|| InventoryError::not_found(format!("Task {id} could not be found")))
}

fn task_mut<'a>(tables: &'a mut Tables, id: &str) -> Result<&'a mut Task, InventoryError> {
    tables.tasks.get_mut(id).ok_or_else(|| InventoryError::not_found(format!("Task {id} could not be found")))
}

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names.
pub fn create_task(tables: &mut Tables, new: NewTask) -> Result<Id, InventoryError> {
    let name = validation::not_blank(&new.name, "The task name")?.to_owned();
    let id = new_id();
    tables.tasks.insert(
        id.clone(),
        Task {
            id: id.clone(),
            name,
            description: new.description,
            enabled: new.enabled,
            commit_on_execute: new.commit_on_execute,
            script: new.script,
            parameters: new.parameters,
            schedule: new.schedule,
            notification: new.notification,
            subscribers: Vec::new(),
        },
    );
    Ok(id)
}

fn flag(property: &str, value: &str) -> Result<bool, InventoryError> {
    value
        .trim()
        .parse()
        .map_err(|_| InventoryError::invalid(format!("Value '{value}' of {property} is not a boolean")))
}

/// Sets one of `name`, `description`, `enabled`, `commitOnExecute` or `script`.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown tasks.
/// * [`InventoryError::InvalidArgument`] for unknown properties, blank names and values
///   that do not fit the property.
pub fn update_property(tables: &mut Tables, id: &str, property: &str, value: &str) -> Result<(), InventoryError> {
    let task = task_mut(tables, id)?;
    match property {
        "name" => validation::not_blank(value, "The task name")?.clone_into(&mut task.name),
        "description" => value.clone_into(&mut task.description),
        "enabled" => task.enabled = flag(property, value)?,
        "commitOnExecute" => task.commit_on_execute = flag(property, value)?,
        "script" => value.clone_into(&mut task.script),
        other => return Err(InventoryError::invalid(format!("Tasks have no property named {other}"))),
    }
    Ok(())
}

/// Sets parameters; a `None` value removes the parameter.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown tasks.
pub fn update_parameters(
    tables: &mut Tables,
    id: &str,
    parameters: &BTreeMap<String, Option<String>>,
) -> Result<(), InventoryError> {
    let task = task_mut(tables, id)?;
    for (name, value) in parameters {
        match value {
            Some(value) => task.parameters.insert(name.clone(), value.clone()),
            None => task.parameters.remove(name),
        };
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown tasks.
pub fn update_schedule(tables: &mut Tables, id: &str, schedule: TaskSchedule) -> Result<(), InventoryError> {
    task_mut(tables, id)?.schedule = schedule;
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown tasks.
pub fn update_notification(tables: &mut Tables, id: &str, notification: TaskNotification) -> Result<(), InventoryError> {
    task_mut(tables, id)?.notification = notification;
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown tasks.
pub fn delete_task(tables: &mut Tables, id: &str) -> Result<(), InventoryError> {
    tables.tasks.remove(id).map(drop).ok_or_else(|| InventoryError::not_found(format!("Task {id} could not be found")))
}

#[must_use]
pub fn tasks(tables: &Tables) -> Vec<Task> {
    let mut all: Vec<Task> = tables.tasks.values().cloned().collect();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    all
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users.
pub fn tasks_for_user(tables: &Tables, user_id: &str) -> Result<Vec<Task>, InventoryError> {
    if !tables.users.contains_key(user_id) {
        return Err(InventoryError::not_found(format!("User {user_id} could not be found")));
    }
    Ok(tasks(tables).into_iter().filter(|t| t.subscribers.iter().any(|s| s == user_id)).collect())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown tasks.
pub fn subscribers(tables: &Tables, id: &str) -> Result<Vec<UserInfo>, InventoryError> {
    Ok(task(tables, id)?.subscribers.iter().filter_map(|user| tables.users.get(user)).map(UserInfo::from).collect())
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown users or tasks.
/// * [`InventoryError::OperationNotPermitted`] for users already subscribed.
pub fn subscribe(tables: &mut Tables, user_id: &str, id: &str) -> Result<(), InventoryError> {
    if !tables.users.contains_key(user_id) {
        return Err(InventoryError::not_found(format!("User {user_id} could not be found")));
    }
    let task = task_mut(tables, id)?;
    if task.subscribers.iter().any(|s| s == user_id) {
        return Err(InventoryError::not_permitted(format!("User {user_id} is already subscribed to {}", task.name)));
    }
    task.subscribers.push(user_id.to_owned());
    Ok(())
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown tasks.
/// * [`InventoryError::OperationNotPermitted`] for users not subscribed.
pub fn unsubscribe(tables: &mut Tables, user_id: &str, id: &str) -> Result<(), InventoryError> {
    let task = task_mut(tables, id)?;
    let before = task.subscribers.len();
    task.subscribers.retain(|s| s != user_id);
    if task.subscribers.len() == before {
        return Err(InventoryError::not_permitted(format!("User {user_id} is not subscribed to {}", task.name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::application::User;

    fn user(id: &str) -> User {
        User {
            id: id.to_owned(),
            user_name: id.to_owned(),
            password_hash: String::new(),
            salt: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            enabled: true,
            user_type: 0,
            privileges: Vec::new(),
            groups: Vec::new(),
            creation_date: 0,
        }
    }

    #[test]
    fn properties_are_typed() {
        let mut tables = Tables::default();
        let id = create_task(&mut tables, NewTask { name: "Backup".to_owned(), ..NewTask::default() }).unwrap();
        update_property(&mut tables, &id, "enabled", "true").unwrap();
        assert!(task(&tables, &id).unwrap().enabled);
        assert!(update_property(&mut tables, &id, "enabled", "maybe").is_err());
        assert!(update_property(&mut tables, &id, "color", "red").is_err());
        assert!(update_property(&mut tables, &id, "name", " ").is_err());

        let parameters = BTreeMap::from([("host".to_owned(), Some("db1".to_owned())), ("old".to_owned(), None)]);
        update_parameters(&mut tables, &id, &parameters).unwrap();
        assert_eq!(task(&tables, &id).unwrap().parameters.get("host").map(String::as_str), Some("db1"));
        assert!(create_task(&mut tables, NewTask::default()).is_err());
    }

    #[test]
    fn users_subscribe_once() {
        let mut tables = Tables::default();
        tables.users.insert("ana".to_owned(), user("ana"));
        let id = create_task(&mut tables, NewTask { name: "Audit".to_owned(), ..NewTask::default() }).unwrap();
        subscribe(&mut tables, "ana", &id).unwrap();
        assert!(subscribe(&mut tables, "ana", &id).is_err());
        assert!(subscribe(&mut tables, "ghost", &id).is_err());
        assert_eq!(subscribers(&tables, &id).unwrap()[0].user_name, "ana");
        assert_eq!(tasks_for_user(&tables, "ana").unwrap().len(), 1);

        unsubscribe(&mut tables, "ana", &id).unwrap();
        assert!(unsubscribe(&mut tables, "ana", &id).is_err());
        delete_task(&mut tables, &id).unwrap();
        assert!(delete_task(&mut tables, &id).is_err());
    }
}
