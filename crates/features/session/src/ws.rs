use crate::accounts::{self, Holder, NewUser, UserUpdate};
use crate::{Session, Sessions};
use kw_domain::model::Id;
use kw_domain::model::audit::ActivityType;
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use kw_kernel::events::CloseReason;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SessionCall {
    CreateUser(NewUser),
    SetUserProperties(UserUpdate),
    DeleteUsers { user_ids: Vec<Id> },
    GetUsers {},
    GetUsersInGroup { group_id: Id },
    GetGroupsForUser { user_id: Id },
    CreateGroup {
        group_name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        users: Vec<Id>,
    },
    SetGroupProperties { group_id: Id, group_name: Option<String>, description: Option<String> },
    DeleteGroups { group_ids: Vec<Id> },
    GetGroups {},
    AddUserToGroup { user_id: Id, group_id: Id },
    RemoveUserFromGroup { user_id: Id, group_id: Id },
    SetPrivilegeToUser { user_id: Id, feature_token: String, access_level: u8 },
    SetPrivilegeToGroup { group_id: Id, feature_token: String, access_level: u8 },
    RemovePrivilegeFromUser { user_id: Id, feature_token: String },
    RemovePrivilegeFromGroup { group_id: Id, feature_token: String },
    GetSessions {},
}

impl SliceCall for SessionCall {
    type Slice = Sessions;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetUsers {}
            | Self::GetUsersInGroup { .. }
            | Self::GetGroupsForUser { .. }
            | Self::GetGroups {}
            | Self::GetSessions {} => Requirement::read(FeatureSet::USERS),
            _ => Requirement::write(FeatureSet::USERS),
        }
    }

    async fn execute(self, slice: &Sessions, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateUser(new) => {
                let name = new.user_name.clone();
                let id = db.write(|t| accounts::create_user(t, new))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("User {name}"));
                reply(id)
            },
            Self::SetUserProperties(update) => {
                let user_id = update.user_id.clone();
                let disabled = update.enabled == Some(false);
                db.write(|t| accounts::set_user_properties(t, update))?;
                if disabled {
                    slice.store.close_user(&user_id, CloseReason::Revoked);
                }
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("User {user_id}"));
                reply(())
            },
            Self::DeleteUsers { user_ids } => {
                let deleted = db.write(|t| accounts::delete_users(t, &user_ids, &slice.admin_user_name))?;
                for user in deleted {
                    slice.store.close_user(&user.id, CloseReason::Revoked);
                    ctx.record(ActivityType::DeleteApplicationObject, None, format!("User {}", user.user_name));
                }
                reply(())
            },
            Self::GetUsers {} => reply(db.read(accounts::users)),
            Self::GetUsersInGroup { group_id } => reply(db.read(|t| accounts::users_in_group(t, &group_id))?),
            Self::GetGroupsForUser { user_id } => reply(db.read(|t| accounts::groups_for_user(t, &user_id))?),
            Self::CreateGroup { group_name, description, users } => {
                let id = db.write(|t| accounts::create_group(t, &group_name, &description, &users))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Group {group_name}"));
                reply(id)
            },
            Self::SetGroupProperties { group_id, group_name, description } => {
                db.write(|t| {
                    accounts::set_group_properties(t, &group_id, group_name.as_deref(), description.as_deref())
                })?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Group {group_id}"));
                reply(())
            },
            Self::DeleteGroups { group_ids } => {
                db.write(|t| accounts::delete_groups(t, &group_ids))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Groups {}", group_ids.join(", ")));
                reply(())
            },
            Self::GetGroups {} => reply(db.read(accounts::groups)),
            Self::AddUserToGroup { user_id, group_id } => {
                db.write(|t| accounts::add_user_to_group(t, &user_id, &group_id))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("User {user_id} joined {group_id}"));
                reply(())
            },
            Self::RemoveUserFromGroup { user_id, group_id } => {
                db.write(|t| accounts::remove_user_from_group(t, &user_id, &group_id))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("User {user_id} left {group_id}"));
                reply(())
            },
            Self::SetPrivilegeToUser { user_id, feature_token, access_level } => {
                db.write(|t| accounts::set_privilege(t, Holder::User(&user_id), &feature_token, access_level))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("User {user_id} granted {feature_token}:{access_level}"),
                );
                reply(())
            },
            Self::SetPrivilegeToGroup { group_id, feature_token, access_level } => {
                db.write(|t| accounts::set_privilege(t, Holder::Group(&group_id), &feature_token, access_level))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Group {group_id} granted {feature_token}:{access_level}"),
                );
                reply(())
            },
            Self::RemovePrivilegeFromUser { user_id, feature_token } => {
                db.write(|t| accounts::remove_privilege(t, Holder::User(&user_id), &feature_token))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("User {user_id} lost {feature_token}"));
                reply(())
            },
            Self::RemovePrivilegeFromGroup { group_id, feature_token } => {
                db.write(|t| accounts::remove_privilege(t, Holder::Group(&group_id), &feature_token))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("Group {group_id} lost {feature_token}"),
                );
                reply(())
            },
            Self::GetSessions {} => {
                let sessions: Vec<Session> = slice.store.list().iter().map(|s| Session::clone(s)).collect();
                reply(sessions)
            },
        }
    }
}
