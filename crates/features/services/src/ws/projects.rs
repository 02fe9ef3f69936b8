use super::{forget_removed, record_links};
use crate::{Services, catalog, projects};
use kw_domain::constants::{CLASS_GENERIC_PROJECT, REL_PROJECT_USES};
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
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
pub enum ProjectsCall {
    CreateProjectPool {
        name: String,
        #[serde(default)]
        description: String,
    },
    GetProjectPools {},
    CreateProject {
        pool_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        template_id: Option<Id>,
    },
    DeleteProject {
        class_name: String,
        id: Id,
        #[serde(default)]
        release_relationships: bool,
    },
    GetProjectsInPool {
        pool_id: Id,
        #[serde(default)]
        class_name: Option<String>,
        #[serde(default)]
        limit: i64,
    },
    GetAllProjects {
        #[serde(default)]
        limit: i64,
    },
    CreateActivity {
        project_class_name: String,
        project_id: Id,
        class_name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
    DeleteActivity {
        class_name: String,
        id: Id,
        #[serde(default)]
        release_relationships: bool,
    },
    GetProjectActivities { project_class_name: String, project_id: Id },
    RelateObjectsToProject { project_class_name: String, project_id: Id, objects: Vec<ObjectKey> },
    ReleaseObjectFromProject { project_class_name: String, project_id: Id, object_id: Id },
    GetProjectResources { project_class_name: String, project_id: Id },
    GetProjectsRelatedToObject { class_name: String, id: Id },
    CopyProjectToPool { pool_id: Id, class_name: String, id: Id },
    MoveProjectToPool { pool_id: Id, class_name: String, id: Id },
}

impl SliceCall for ProjectsCall {
    type Slice = Services;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetProjectPools {}
            | Self::GetProjectsInPool { .. }
            | Self::GetAllProjects { .. }
            | Self::GetProjectActivities { .. }
            | Self::GetProjectResources { .. }
            | Self::GetProjectsRelatedToObject { .. } => Requirement::read(FeatureSet::PROJECTS),
            _ => Requirement::write(FeatureSet::PROJECTS),
        }
    }

    async fn execute(self, slice: &Services, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        let attachments = slice.attachments.as_ref();
        match self {
            Self::CreateProjectPool { name, description } => {
                let id = db.write(|t| catalog::create_root_pool(t, CLASS_GENERIC_PROJECT, &name, &description))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("Project pool {name}"));
                reply(id)
            },
            Self::GetProjectPools {} => reply(db.read(|t| catalog::root_pools(t, CLASS_GENERIC_PROJECT))),
            Self::CreateProject { pool_id, class_name, attributes, template_id } => {
                let id = db.write(|t| {
                    catalog::create_item(t, CLASS_GENERIC_PROJECT, &pool_id, &class_name, &attributes, template_id.as_deref())
                })?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("In pool {pool_id}"),
                );
                reply(id)
            },
            Self::DeleteProject { class_name, id, release_relationships } => {
                let removed = db.write(|t| {
                    catalog::delete_member(t, CLASS_GENERIC_PROJECT, &class_name, &id, release_relationships)
                })?;
                forget_removed(attachments, ctx, &removed).await;
                reply(())
            },
            Self::GetProjectsInPool { pool_id, class_name, limit } => reply(db.read(|t| {
                catalog::items_in_pool(t, CLASS_GENERIC_PROJECT, &pool_id, class_name.as_deref(), limit)
            })?),
            Self::GetAllProjects { limit } => reply(db.read(|t| catalog::all_of(t, CLASS_GENERIC_PROJECT, limit))),
            Self::CreateActivity { project_class_name, project_id, class_name, attributes } => {
                let project = ObjectKey::new(project_class_name, project_id);
                let id = db.write(|t| projects::create_activity(t, &project, &class_name, &attributes))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("Activity of {project}"),
                );
                reply(id)
            },
            Self::DeleteActivity { class_name, id, release_relationships } => {
                let removed = db.write(|t| projects::delete_activity(t, &class_name, &id, release_relationships))?;
                forget_removed(attachments, ctx, &removed).await;
                reply(())
            },
            Self::GetProjectActivities { project_class_name, project_id } => {
                let project = ObjectKey::new(project_class_name, project_id);
                reply(db.read(|t| projects::activities(t, &project))?)
            },
            Self::RelateObjectsToProject { project_class_name, project_id, objects } => {
                let project = ObjectKey::new(project_class_name, project_id);
                let related = db.write(|t| projects::relate_to_project(t, &project, &objects))?;
                record_links(ctx, ActivityType::CreateRelationship, &project, &related, REL_PROJECT_USES);
                reply(())
            },
            Self::ReleaseObjectFromProject { project_class_name, project_id, object_id } => {
                let project = ObjectKey::new(project_class_name, project_id);
                db.write(|t| projects::release_from_project(t, &project, &object_id))?;
                ctx.record(
                    ActivityType::ReleaseRelationship,
                    Some(&project),
                    format!("{REL_PROJECT_USES} -> {object_id}"),
                );
                reply(())
            },
            Self::GetProjectResources { project_class_name, project_id } => {
                let project = ObjectKey::new(project_class_name, project_id);
                reply(db.read(|t| projects::project_resources(t, &project))?)
            },
            Self::GetProjectsRelatedToObject { class_name, id } => {
                let object = ObjectKey::new(class_name, id);
                reply(db.read(|t| projects::projects_of_object(t, &object))?)
            },
            Self::CopyProjectToPool { pool_id, class_name, id } => {
                let copy = db.write(|t| catalog::copy_to_pool(t, CLASS_GENERIC_PROJECT, &pool_id, &class_name, &id))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(class_name, copy.clone())),
                    format!("Copy of {id} in pool {pool_id}"),
                );
                reply(copy)
            },
            Self::MoveProjectToPool { pool_id, class_name, id } => {
                db.write(|t| catalog::move_to_pool(t, CLASS_GENERIC_PROJECT, &pool_id, &class_name, &id))?;
                ctx.record(ActivityType::MoveObject, Some(&ObjectKey::new(class_name, id)), format!("To pool {pool_id}"));
                reply(())
            },
        }
    }
}
