use crate::accounts::{self, NewUser};
use kw_database::Tables;
use kw_domain::config::AdminConfig;
use kw_domain::constants::DEFAULT_ADMIN_GROUP;
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use tracing::{info, warn};

/// Makes sure the administrators group and the configured administrator exist. Returns
/// whether anything was created.
///
/// # Errors
/// Propagates validation errors of a malformed configured administrator.
pub fn ensure_administrator(tables: &mut Tables, admin: &AdminConfig) -> Result<bool, InventoryError> {
    let mut created = false;
    let group_id: Id = if let Some(group) = tables.group_by_name(DEFAULT_ADMIN_GROUP) {
        group.id.clone()
    } else {
        let id = accounts::create_group(tables, DEFAULT_ADMIN_GROUP, "Full access to every feature", &[])?;
        if let Some(group) = tables.groups.get_mut(&id) {
            group.privileges = accounts::full_privileges();
        }
        info!(group = DEFAULT_ADMIN_GROUP, "Administrators group created");
        created = true;
        id
    };

    if tables.user_by_name(&admin.user_name).is_none() {
        accounts::create_user(
            tables,
            NewUser {
                user_name: admin.user_name.clone(),
                password: admin.password.clone(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                enabled: true,
                user_type: 0,
                privileges: Vec::new(),
                default_group_id: Some(group_id),
            },
        )?;
        if admin.password == AdminConfig::default().password {
            warn!(user = %admin.user_name, "Administrator created with the default password; change it");
        } else {
            info!(user = %admin.user_name, "Administrator created");
        }
        created = true;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::privileges::{Access, FeatureSet};

    #[test]
    fn administrator_is_created_once_with_full_rights() {
        let mut tables = Tables::default();
        let admin = AdminConfig::default();
        assert!(ensure_administrator(&mut tables, &admin).unwrap());
        assert!(!ensure_administrator(&mut tables, &admin).unwrap());

        let user = tables.user_by_name("admin").unwrap();
        let grants = accounts::grants(&tables, user);
        assert!(grants.allows(FeatureSet::ALL, Access::Write));
    }
}
