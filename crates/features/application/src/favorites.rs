//! Per user folders of bookmarked objects.

use kw_business::navigation::sorted;
use kw_business::objects;
use kw_database::Tables;
use kw_domain::model::application::FavoritesFolder;
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};

fn ensure_user(tables: &Tables, user_id: &str) -> Result<(), InventoryError> {
    if tables.users.contains_key(user_id) {
        Ok(())
    } else {
        Err(InventoryError::not_found(format!("User {user_id} could not be found")))
    }
}

/// A folder of `user_id`. Folders of other users are reported as missing.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown users and folders.
pub fn folder<'a>(tables: &'a Tables, id: &str, user_id: &str) -> Result<&'a FavoritesFolder, InventoryError> {
    ensure_user(tables, user_id)?;
    tables
        .favorites
        .get(id)
        .filter(|f| f.user_id == user_id)
        .ok_or_else(|| InventoryError::not_found(format!("Favorites folder {id} could not be found")))
}

fn ensure_unique_name(tables: &Tables, user_id: &str, name: &str, except: Option<&str>) -> Result<(), InventoryError> {
    let taken = tables
        .favorites
        .values()
        .any(|f| f.user_id == user_id && f.name == name && Some(f.id.as_str()) != except);
    if taken {
        return Err(InventoryError::not_permitted(format!("A favorites folder named {name} already exists")));
    }
    Ok(())
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names.
/// * [`InventoryError::NotFound`] for unknown users.
/// * [`InventoryError::OperationNotPermitted`] when the user already has a folder so named.
pub fn create_folder(tables: &mut Tables, name: &str, user_id: &str) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "The folder name")?;
    ensure_user(tables, user_id)?;
    ensure_unique_name(tables, user_id, name, None)?;
    let id = new_id();
    tables.favorites.insert(
        id.clone(),
        FavoritesFolder { id: id.clone(), name: name.to_owned(), user_id: user_id.to_owned(), objects: Vec::new() },
    );
    Ok(id)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users or folders, before anything is deleted.
pub fn delete_folders(tables: &mut Tables, ids: &[Id], user_id: &str) -> Result<(), InventoryError> {
    for id in ids {
        folder(tables, id, user_id)?;
    }
    for id in ids {
        tables.favorites.remove(id);
    }
    Ok(())
}

/// # Errors
/// As [`create_folder`], plus [`InventoryError::NotFound`] for unknown folders.
pub fn rename_folder(tables: &mut Tables, id: &str, user_id: &str, name: &str) -> Result<(), InventoryError> {
    let name = validation::not_blank(name, "The folder name")?;
    folder(tables, id, user_id)?;
    ensure_unique_name(tables, user_id, name, Some(id))?;
    if let Some(folder) = tables.favorites.get_mut(id) {
        name.clone_into(&mut folder.name);
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users.
pub fn folders_for_user(tables: &Tables, user_id: &str) -> Result<Vec<FavoritesFolder>, InventoryError> {
    ensure_user(tables, user_id)?;
    let mut folders: Vec<FavoritesFolder> = tables.favorites.values().filter(|f| f.user_id == user_id).cloned().collect();
    folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(folders)
}

/// Bookmarks objects in folders.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown users, folders or objects.
/// * [`InventoryError::OperationNotPermitted`] for objects already in one of the folders.
pub fn add_objects(tables: &mut Tables, objects: &[ObjectKey], folder_ids: &[Id], user_id: &str) -> Result<(), InventoryError> {
    let mut keys = Vec::with_capacity(objects.len());
    for key in objects {
        keys.push(objects::object(tables, &key.class_name, &key.id)?.key());
    }
    for folder_id in folder_ids {
        let folder = folder(tables, folder_id, user_id)?;
        if let Some(present) = keys.iter().find(|k| folder.objects.contains(k)) {
            return Err(InventoryError::not_permitted(format!(
                "Object {present} is already in favorites folder {}",
                folder.name
            )));
        }
    }
    for folder_id in folder_ids {
        if let Some(folder) = tables.favorites.get_mut(folder_id) {
            folder.objects.extend(keys.iter().cloned());
        }
    }
    Ok(())
}

/// Removes bookmarks. Objects not in a folder are skipped.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown users or folders.
pub fn remove_objects(
    tables: &mut Tables,
    objects: &[ObjectKey],
    folder_ids: &[Id],
    user_id: &str,
) -> Result<(), InventoryError> {
    for folder_id in folder_ids {
        folder(tables, folder_id, user_id)?;
    }
    for folder_id in folder_ids {
        if let Some(folder) = tables.favorites.get_mut(folder_id) {
            folder.objects.retain(|o| !objects.contains(o));
        }
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown users or folders.
pub fn objects_in_folder(
    tables: &Tables,
    folder_id: &str,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ObjectLight>, InventoryError> {
    let folder = folder(tables, folder_id, user_id)?;
    let lights = folder.objects.iter().filter_map(|key| tables.objects.get_by_key(key)).map(|o| o.light()).collect();
    Ok(sorted(lights, limit))
}

/// Folders of `user_id` holding an object.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown users or objects.
pub fn folders_for_object(
    tables: &Tables,
    user_id: &str,
    class_name: &str,
    id: &str,
) -> Result<Vec<FavoritesFolder>, InventoryError> {
    let key = objects::object(tables, class_name, id)?.key();
    Ok(folders_for_user(tables, user_id)?.into_iter().filter(|f| f.objects.contains(&key)).collect())
}
