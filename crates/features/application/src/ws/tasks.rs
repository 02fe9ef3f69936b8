use crate::Application;
use crate::tasks::{self, NewTask};
use kw_domain::model::Id;
use kw_domain::model::application::{TaskNotification, TaskSchedule};
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
pub enum TasksCall {
    CreateTask(NewTask),
    UpdateTaskProperties { task_id: Id, property_name: String, property_value: String },
    UpdateTaskParameters { task_id: Id, parameters: BTreeMap<String, Option<String>> },
    UpdateTaskSchedule { task_id: Id, schedule: TaskSchedule },
    UpdateTaskNotificationType { task_id: Id, notification: TaskNotification },
    GetTask { id: Id },
    GetTasks {},
    GetTasksForUser { user_id: Id },
    GetSubscribersForTask { task_id: Id },
    DeleteTask { id: Id },
    SubscribeUserToTask { user_id: Id, task_id: Id },
    UnsubscribeUserFromTask { user_id: Id, task_id: Id },
}

impl SliceCall for TasksCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetTask { .. }
            | Self::GetTasks {}
            | Self::GetTasksForUser { .. }
            | Self::GetSubscribersForTask { .. } => Requirement::read(FeatureSet::TASKS),
            _ => Requirement::write(FeatureSet::TASKS),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateTask(task) => {
                let name = task.name.clone();
                let id = db.write(|t| tasks::create_task(t, task))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Task {name} ({id})"));
                reply(id)
            },
            Self::UpdateTaskProperties { task_id, property_name, property_value } => {
                db.write(|t| tasks::update_property(t, &task_id, &property_name, &property_value))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Task {task_id}: {property_name}"));
                reply(())
            },
            Self::UpdateTaskParameters { task_id, parameters } => {
                db.write(|t| tasks::update_parameters(t, &task_id, &parameters))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Task {task_id}: parameters"));
                reply(())
            },
            Self::UpdateTaskSchedule { task_id, schedule } => {
                db.write(|t| tasks::update_schedule(t, &task_id, schedule))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Task {task_id}: schedule"));
                reply(())
            },
            Self::UpdateTaskNotificationType { task_id, notification } => {
                db.write(|t| tasks::update_notification(t, &task_id, notification))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Task {task_id}: notification"));
                reply(())
            },
            Self::GetTask { id } => reply(db.read(|t| tasks::task(t, &id).cloned())?),
            Self::GetTasks {} => reply(db.read(tasks::tasks)),
            Self::GetTasksForUser { user_id } => reply(db.read(|t| tasks::tasks_for_user(t, &user_id))?),
            Self::GetSubscribersForTask { task_id } => reply(db.read(|t| tasks::subscribers(t, &task_id))?),
            Self::DeleteTask { id } => {
                db.write(|t| tasks::delete_task(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Task {id}"));
                reply(())
            },
            Self::SubscribeUserToTask { user_id, task_id } => {
                db.write(|t| tasks::subscribe(t, &user_id, &task_id))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("User {user_id} subscribed to {task_id}"));
                reply(())
            },
            Self::UnsubscribeUserFromTask { user_id, task_id } => {
                db.write(|t| tasks::unsubscribe(t, &user_id, &task_id))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("User {user_id} unsubscribed from {task_id}"),
                );
                reply(())
            },
        }
    }
}
