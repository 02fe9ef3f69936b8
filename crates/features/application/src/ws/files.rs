use crate::Application;
use crate::files::{self, base64_content};
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
pub enum FilesCall {
    AttachFileToObject {
        name: String,
        #[serde(default)]
        tags: String,
        /// Base64 encoded content.
        #[serde(deserialize_with = "base64_content::deserialize")]
        file: Vec<u8>,
        class_name: String,
        id: Id,
    },
    DetachFileFromObject { file_id: Id, class_name: String, id: Id },
    GetFilesForObject { class_name: String, id: Id },
    GetFile { file_id: Id, class_name: String, id: Id },
    UpdateFileProperties {
        file_id: Id,
        class_name: String,
        id: Id,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        tags: Option<String>,
    },
}

impl SliceCall for FilesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetFilesForObject { .. } | Self::GetFile { .. } => Requirement::read(FeatureSet::FILES),
            _ => Requirement::write(FeatureSet::FILES),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        let attachments = slice.attachments.as_ref();
        match self {
            Self::AttachFileToObject { name, tags, file, class_name, id } => {
                let object = ObjectKey::new(class_name, id);
                let stored =
                    files::attach(db, attachments, slice.max_attachment_size, &object, &name, &tags, &file).await?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    Some(&object),
                    format!("File {name} ({} bytes)", stored.size),
                );
                reply(stored.id)
            },
            Self::DetachFileFromObject { file_id, class_name, id } => {
                let removed = files::detach(db, attachments, &file_id, &class_name, &id).await?;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    Some(&ObjectKey::new(class_name, id)),
                    format!("File {}", removed.name),
                );
                reply(())
            },
            Self::GetFilesForObject { class_name, id } => reply(db.read(|t| files::files_for_object(t, &class_name, &id))?),
            Self::GetFile { file_id, class_name, id } => {
                reply(files::read(db, attachments, &file_id, &class_name, &id).await?)
            },
            Self::UpdateFileProperties { file_id, class_name, id, name, tags } => {
                let notes = db.write(|t| {
                    files::update_properties(t, &file_id, &class_name, &id, name.as_deref(), tags.as_deref())
                })?;
                ctx.record(ActivityType::UpdateApplicationObject, Some(&ObjectKey::new(class_name, id)), notes);
                reply(())
            },
        }
    }
}
