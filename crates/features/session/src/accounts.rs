//! Users, groups and the privileges they hold.

use crate::password;
use kw_database::Tables;
use kw_domain::model::application::{Group, Privilege, User};
use kw_domain::model::{Id, Timestamp};
use kw_domain::privileges::{Access, FeatureSet, Grants, WILDCARD_TOKEN};
use kw_kernel::error::InventoryError;
use kw_kernel::validation;
use kw_kernel::{new_id, now_millis};
use serde::{Deserialize, Serialize};

/// A user as clients see it, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Id,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enabled: bool,
    pub user_type: i32,
    pub privileges: Vec<Privilege>,
    pub groups: Vec<Id>,
    pub creation_date: Timestamp,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            user_name: user.user_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            enabled: user.enabled,
            user_type: user.user_type,
            privileges: user.privileges.clone(),
            groups: user.groups.clone(),
            creation_date: user.creation_date,
        }
    }
}

const fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub user_type: i32,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    pub default_group_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub user_id: Id,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
    pub user_type: Option<i32>,
}

fn user<'a>(tables: &'a Tables, id: &str) -> Result<&'a User, InventoryError> {
    tables
        .users
        .get(id)
        .ok_or_else(|| InventoryError::not_found(format!("User with id {id} could not be found")))
}

fn group<'a>(tables: &'a Tables, id: &str) -> Result<&'a Group, InventoryError> {
    tables
        .groups
        .get(id)
        .ok_or_else(|| InventoryError::not_found(format!("Group with id {id} could not be found")))
}

fn privilege(feature_token: &str, access_level: u8) -> Result<Privilege, InventoryError> {
    let token = validation::not_blank(feature_token, "Feature token")?;
    if FeatureSet::from(token).is_empty() {
        return Err(InventoryError::invalid(format!("Unknown feature token {token}")));
    }
    if Access::from_level(access_level).is_none() {
        return Err(InventoryError::invalid(format!(
            "Access level {access_level} is neither read (1) nor read/write (2)"
        )));
    }
    Ok(Privilege { feature_token: token.to_owned(), access_level })
}

fn upsert(privileges: &mut Vec<Privilege>, granted: Privilege) {
    privileges.retain(|p| p.feature_token != granted.feature_token);
    privileges.push(granted);
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for malformed or taken user names, empty passwords
///   and unknown privileges.
/// * [`InventoryError::NotFound`] when the default group does not exist.
pub fn create_user(tables: &mut Tables, new: NewUser) -> Result<Id, InventoryError> {
    let user_name = validation::user_name(&new.user_name)?.to_owned();
    if tables.user_by_name(&user_name).is_some() {
        return Err(InventoryError::invalid(format!("User name {user_name} already exists")));
    }
    if new.password.is_empty() {
        return Err(InventoryError::invalid("Password can not be empty"));
    }
    let privileges = new
        .privileges
        .iter()
        .map(|p| privilege(&p.feature_token, p.access_level))
        .collect::<Result<Vec<_>, _>>()?;
    let groups = match new.default_group_id {
        Some(group_id) => vec![group(tables, &group_id)?.id.clone()],
        None => Vec::new(),
    };

    let salt = password::new_salt();
    let id = new_id();
    tables.users.insert(
        id.clone(),
        User {
            id: id.clone(),
            user_name,
            password_hash: password::hash(&salt, &new.password),
            salt,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            enabled: new.enabled,
            user_type: new.user_type,
            privileges,
            groups,
            creation_date: now_millis(),
        },
    );
    Ok(id)
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown users.
/// * [`InventoryError::InvalidArgument`] for malformed or taken names and empty passwords.
pub fn set_user_properties(tables: &mut Tables, update: UserUpdate) -> Result<(), InventoryError> {
    let current = user(tables, &update.user_id)?;
    let user_name = match update.user_name.as_deref() {
        Some(requested) if requested.trim() != current.user_name => {
            let requested = validation::user_name(requested)?;
            if tables.user_by_name(requested).is_some() {
                return Err(InventoryError::invalid(format!("User name {requested} already exists")));
            }
            Some(requested.to_owned())
        },
        _ => None,
    };
    if update.password.as_deref().is_some_and(str::is_empty) {
        return Err(InventoryError::invalid("Password can not be empty"));
    }

    let Some(user) = tables.users.get_mut(&update.user_id) else {
        return Ok(());
    };
    if let Some(user_name) = user_name {
        user.user_name = user_name;
    }
    if let Some(password) = update.password {
        user.salt = password::new_salt();
        user.password_hash = password::hash(&user.salt, &password);
    }
    if let Some(first_name) = update.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = update.last_name {
        user.last_name = last_name;
    }
    if let Some(email) = update.email {
        user.email = email;
    }
    if let Some(enabled) = update.enabled {
        user.enabled = enabled;
    }
    if let Some(user_type) = update.user_type {
        user.user_type = user_type;
    }
    Ok(())
}

/// Deletes users. `protected` names the bootstrap administrator, who can not be deleted.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown users.
/// * [`InventoryError::OperationNotPermitted`] for the protected user.
pub fn delete_users(tables: &mut Tables, ids: &[Id], protected: &str) -> Result<Vec<User>, InventoryError> {
    for id in ids {
        if user(tables, id)?.user_name == protected {
            return Err(InventoryError::not_permitted(format!("User {protected} can not be deleted")));
        }
    }
    Ok(ids.iter().filter_map(|id| tables.users.remove(id)).collect())
}

#[must_use]
pub fn users(tables: &Tables) -> Vec<UserInfo> {
    let mut users: Vec<UserInfo> = tables.users.values().map(UserInfo::from).collect();
    users.sort_by(|a, b| a.user_name.cmp(&b.user_name));
    users
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown groups.
pub fn users_in_group(tables: &Tables, group_id: &str) -> Result<Vec<UserInfo>, InventoryError> {
    group(tables, group_id)?;
    Ok(users(tables).into_iter().filter(|u| u.groups.iter().any(|g| g == group_id)).collect())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users.
pub fn groups_for_user(tables: &Tables, user_id: &str) -> Result<Vec<Group>, InventoryError> {
    Ok(user(tables, user_id)?.groups.iter().filter_map(|g| tables.groups.get(g)).cloned().collect())
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank or taken names.
/// * [`InventoryError::NotFound`] for unknown initial members.
pub fn create_group(
    tables: &mut Tables,
    name: &str,
    description: &str,
    members: &[Id],
) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "Group name")?;
    if tables.group_by_name(name).is_some() {
        return Err(InventoryError::invalid(format!("Group {name} already exists")));
    }
    for member in members {
        user(tables, member)?;
    }

    let id = new_id();
    tables.groups.insert(
        id.clone(),
        Group {
            id: id.clone(),
            name: name.to_owned(),
            description: description.to_owned(),
            privileges: Vec::new(),
            creation_date: now_millis(),
        },
    );
    for member in members {
        if let Some(user) = tables.users.get_mut(member)
            && !user.groups.contains(&id)
        {
            user.groups.push(id.clone());
        }
    }
    Ok(id)
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown groups.
/// * [`InventoryError::InvalidArgument`] for blank or taken names.
pub fn set_group_properties(
    tables: &mut Tables,
    group_id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<(), InventoryError> {
    let current = group(tables, group_id)?;
    let name = match name {
        Some(requested) if requested.trim() != current.name => {
            let requested = validation::not_blank(requested, "Group name")?;
            if tables.group_by_name(requested).is_some() {
                return Err(InventoryError::invalid(format!("Group {requested} already exists")));
            }
            Some(requested.to_owned())
        },
        _ => None,
    };
    if let Some(group) = tables.groups.get_mut(group_id) {
        if let Some(name) = name {
            group.name = name;
        }
        if let Some(description) = description {
            description.clone_into(&mut group.description);
        }
    }
    Ok(())
}

/// Deletes groups and drops them from their members.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown groups.
pub fn delete_groups(tables: &mut Tables, ids: &[Id]) -> Result<(), InventoryError> {
    for id in ids {
        group(tables, id)?;
    }
    for id in ids {
        tables.groups.remove(id);
    }
    for user in tables.users.values_mut() {
        user.groups.retain(|g| !ids.contains(g));
    }
    Ok(())
}

#[must_use]
pub fn groups(tables: &Tables) -> Vec<Group> {
    let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    groups
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users or groups, and
/// [`InventoryError::InvalidArgument`] when the user already is a member.
pub fn add_user_to_group(tables: &mut Tables, user_id: &str, group_id: &str) -> Result<(), InventoryError> {
    group(tables, group_id)?;
    if user(tables, user_id)?.groups.iter().any(|g| g == group_id) {
        return Err(InventoryError::invalid(format!("User {user_id} already belongs to group {group_id}")));
    }
    if let Some(user) = tables.users.get_mut(user_id) {
        user.groups.push(group_id.to_owned());
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users, groups or memberships.
pub fn remove_user_from_group(tables: &mut Tables, user_id: &str, group_id: &str) -> Result<(), InventoryError> {
    group(tables, group_id)?;
    if !user(tables, user_id)?.groups.iter().any(|g| g == group_id) {
        return Err(InventoryError::not_found(format!("User {user_id} does not belong to group {group_id}")));
    }
    if let Some(user) = tables.users.get_mut(user_id) {
        user.groups.retain(|g| g != group_id);
    }
    Ok(())
}

/// Who a privilege change applies to.
#[derive(Debug, Clone, Copy)]
pub enum Holder<'a> {
    User(&'a str),
    Group(&'a str),
}

fn privileges_of<'a>(tables: &'a mut Tables, holder: Holder<'_>) -> Result<&'a mut Vec<Privilege>, InventoryError> {
    match holder {
        Holder::User(id) => tables
            .users
            .get_mut(id)
            .map(|u| &mut u.privileges)
            .ok_or_else(|| InventoryError::not_found(format!("User with id {id} could not be found"))),
        Holder::Group(id) => tables
            .groups
            .get_mut(id)
            .map(|g| &mut g.privileges)
            .ok_or_else(|| InventoryError::not_found(format!("Group with id {id} could not be found"))),
    }
}

/// Grants `feature_token` at `access_level`, replacing a previous grant of the same token.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown holders, [`InventoryError::InvalidArgument`] for
/// unknown tokens or levels.
pub fn set_privilege(
    tables: &mut Tables,
    holder: Holder<'_>,
    feature_token: &str,
    access_level: u8,
) -> Result<(), InventoryError> {
    let granted = privilege(feature_token, access_level)?;
    upsert(privileges_of(tables, holder)?, granted);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown holders or when the token is not granted.
pub fn remove_privilege(tables: &mut Tables, holder: Holder<'_>, feature_token: &str) -> Result<(), InventoryError> {
    let privileges = privileges_of(tables, holder)?;
    let before = privileges.len();
    privileges.retain(|p| p.feature_token != feature_token);
    if privileges.len() == before {
        return Err(InventoryError::not_found(format!("Privilege {feature_token} is not granted")));
    }
    Ok(())
}

/// Effective rights of a user: their own privileges merged with their groups'.
#[must_use]
pub fn grants(tables: &Tables, user: &User) -> Grants {
    let mut grants = Grants::default();
    let group_privileges = user.groups.iter().filter_map(|g| tables.groups.get(g)).flat_map(|g| &g.privileges);
    for privilege in user.privileges.iter().chain(group_privileges) {
        if let Some(access) = Access::from_level(privilege.access_level) {
            grants.grant(FeatureSet::from(privilege.feature_token.as_str()), access);
        }
    }
    grants
}

/// Privilege list granting everything.
#[must_use]
pub fn full_privileges() -> Vec<Privilege> {
    vec![Privilege { feature_token: WILDCARD_TOKEN.to_owned(), access_level: Access::WRITE_LEVEL }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            user_name: name.to_owned(),
            password: "secret".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            enabled: true,
            user_type: 0,
            privileges: Vec::new(),
            default_group_id: None,
        }
    }

    #[test]
    fn user_names_are_validated_and_unique() {
        let mut tables = Tables::default();
        create_user(&mut tables, new_user("j.doe")).unwrap();
        assert!(create_user(&mut tables, new_user("j.doe")).is_err());
        assert!(create_user(&mut tables, new_user("j doe")).is_err());
        let mut empty = new_user("empty");
        empty.password.clear();
        assert!(create_user(&mut tables, empty).is_err());
    }

    #[test]
    fn group_privileges_reach_members() {
        let mut tables = Tables::default();
        let user_id = create_user(&mut tables, new_user("operator")).unwrap();
        let group_id = create_group(&mut tables, "Operators", "", &[user_id.clone()]).unwrap();
        set_privilege(&mut tables, Holder::Group(&group_id), "business", Access::WRITE_LEVEL).unwrap();
        set_privilege(&mut tables, Holder::User(&user_id), "metadata", Access::READ_LEVEL).unwrap();

        let grants = grants(&tables, &tables.users[&user_id]);
        assert!(grants.allows(FeatureSet::BUSINESS, Access::Write));
        assert!(grants.allows(FeatureSet::METADATA, Access::Read));
        assert!(!grants.allows(FeatureSet::METADATA, Access::Write));
        assert!(!grants.allows(FeatureSet::USERS, Access::Read));

        delete_groups(&mut tables, &[group_id]).unwrap();
        assert!(tables.users[&user_id].groups.is_empty());
        let grants = super::grants(&tables, &tables.users[&user_id]);
        assert!(!grants.allows(FeatureSet::BUSINESS, Access::Read));
    }

    #[test]
    fn privileges_are_checked() {
        let mut tables = Tables::default();
        let user_id = create_user(&mut tables, new_user("operator")).unwrap();
        assert!(set_privilege(&mut tables, Holder::User(&user_id), "teleport", 1).is_err());
        assert!(set_privilege(&mut tables, Holder::User(&user_id), "ipam", 3).is_err());
        set_privilege(&mut tables, Holder::User(&user_id), "ipam", 1).unwrap();
        set_privilege(&mut tables, Holder::User(&user_id), "ipam", 2).unwrap();
        assert_eq!(tables.users[&user_id].privileges.len(), 1);
        remove_privilege(&mut tables, Holder::User(&user_id), "ipam").unwrap();
        assert!(remove_privilege(&mut tables, Holder::User(&user_id), "ipam").is_err());
    }

    #[test]
    fn protected_user_survives() {
        let mut tables = Tables::default();
        let admin = create_user(&mut tables, new_user("admin")).unwrap();
        let other = create_user(&mut tables, new_user("other")).unwrap();
        assert!(delete_users(&mut tables, &[other.clone(), admin], "admin").is_err());
        assert!(tables.users.contains_key(&other));
        assert_eq!(delete_users(&mut tables, &[other], "admin").unwrap().len(), 1);
    }
}
