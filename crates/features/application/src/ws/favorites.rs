use crate::Application;
use crate::favorites;
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FavoritesCall {
    CreateFavoritesFolderForUser { name: String, user_id: Id },
    DeleteFavoritesFolders { ids: Vec<Id>, user_id: Id },
    UpdateFavoritesFolder { id: Id, user_id: Id, name: String },
    GetFavoritesFoldersForUser { user_id: Id },
    AddObjectsToFavoritesFolder { objects: Vec<ObjectKey>, folder_ids: Vec<Id>, user_id: Id },
    RemoveObjectsFromFavoritesFolder { objects: Vec<ObjectKey>, folder_ids: Vec<Id>, user_id: Id },
    GetObjectsInFavoritesFolder {
        folder_id: Id,
        user_id: Id,
        #[serde(default)]
        limit: i64,
    },
    GetFavoritesFoldersForObject { user_id: Id, class_name: String, id: Id },
}

impl SliceCall for FavoritesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetFavoritesFoldersForUser { .. }
            | Self::GetObjectsInFavoritesFolder { .. }
            | Self::GetFavoritesFoldersForObject { .. } => Requirement::read(FeatureSet::FAVORITES),
            _ => Requirement::write(FeatureSet::FAVORITES),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateFavoritesFolderForUser { name, user_id } => {
                let id = db.write(|t| favorites::create_folder(t, &name, &user_id))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Favorites folder {name} of {user_id}"));
                reply(id)
            },
            Self::DeleteFavoritesFolders { ids, user_id } => {
                db.write(|t| favorites::delete_folders(t, &ids, &user_id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("Favorites folders {}", ids.join(", ")));
                reply(())
            },
            Self::UpdateFavoritesFolder { id, user_id, name } => {
                db.write(|t| favorites::rename_folder(t, &id, &user_id, &name))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("Favorites folder {id} renamed to {name}"));
                reply(())
            },
            Self::GetFavoritesFoldersForUser { user_id } => reply(db.read(|t| favorites::folders_for_user(t, &user_id))?),
            Self::AddObjectsToFavoritesFolder { objects, folder_ids, user_id } => {
                db.write(|t| favorites::add_objects(t, &objects, &folder_ids, &user_id))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("{} objects added to favorites folders {}", objects.len(), folder_ids.join(", ")),
                );
                reply(())
            },
            Self::RemoveObjectsFromFavoritesFolder { objects, folder_ids, user_id } => {
                db.write(|t| favorites::remove_objects(t, &objects, &folder_ids, &user_id))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    None,
                    format!("{} objects removed from favorites folders {}", objects.len(), folder_ids.join(", ")),
                );
                reply(())
            },
            Self::GetObjectsInFavoritesFolder { folder_id, user_id, limit } => {
                reply(db.read(|t| favorites::objects_in_folder(t, &folder_id, &user_id, limit))?)
            },
            Self::GetFavoritesFoldersForObject { user_id, class_name, id } => {
                reply(db.read(|t| favorites::folders_for_object(t, &user_id, &class_name, &id))?)
            },
        }
    }
}
