//! File attachments of inventory objects.
//!
//! Records live in the database, content in the `attachments` storage namespace under the
//! file id. Content is written before the record and deleted after it, so a crash leaves at
//! worst orphaned content, never a record without content.

use kw_business::objects;
use kw_database::{Database, Tables};
use kw_domain::model::application::FileObject;
use kw_domain::model::ObjectKey;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis, validation};
use kw_storage::NamespacedStorage;
use serde::Serialize;

/// Base64 (standard alphabet, padded) for byte payloads in JSON.
pub(crate) mod base64_content {
    use base64::{Engine as _, engine::general_purpose};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        general_purpose::STANDARD
            .decode(text.trim())
            .map_err(|e| serde::de::Error::custom(format!("Invalid Base64: {e}")))
    }
}

/// A file record together with its content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    #[serde(flatten)]
    pub file: FileObject,
    #[serde(with = "base64_content")]
    pub content: Vec<u8>,
}

fn storage(attachments: Option<&NamespacedStorage>) -> Result<&NamespacedStorage, InventoryError> {
    attachments.ok_or_else(|| InventoryError::not_permitted("This server has no attachment storage configured"))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects, or files not attached to the object.
pub fn file<'a>(tables: &'a Tables, file_id: &str, class_name: &str, id: &str) -> Result<&'a FileObject, InventoryError> {
    let key = objects::object(tables, class_name, id)?.key();
    tables
        .files
        .get(file_id)
        .filter(|f| f.object == key)
        .ok_or_else(|| InventoryError::not_found(format!("File {file_id} of {key} could not be found")))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn files_for_object(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<FileObject>, InventoryError> {
    let key = objects::object(tables, class_name, id)?.key();
    let mut found: Vec<FileObject> = tables.files.values().filter(|f| f.object == key).cloned().collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

/// Sets the name and tags present. Returns a summary of the changes.
///
/// # Errors
/// As [`file`], plus [`InventoryError::InvalidArgument`] for blank names.
pub fn update_properties(
    tables: &mut Tables,
    file_id: &str,
    class_name: &str,
    id: &str,
    name: Option<&str>,
    tags: Option<&str>,
) -> Result<String, InventoryError> {
    let name = name.map(|n| validation::not_blank(n, "The file name")).transpose()?;
    file(tables, file_id, class_name, id)?;
    let Some(file) = tables.files.get_mut(file_id) else {
        return Err(InventoryError::not_found(format!("File {file_id} could not be found")));
    };
    if let Some(name) = name {
        name.clone_into(&mut file.name);
    }
    if let Some(tags) = tags {
        tags.clone_into(&mut file.tags);
    }
    Ok(format!("Updated properties of file {}", file.name))
}

/// Stores `content` and attaches it to an object.
///
/// # Errors
/// * [`InventoryError::OperationNotPermitted`] without attachment storage.
/// * [`InventoryError::InvalidArgument`] for blank names or content over `max_size` bytes.
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::Storage`] when the content can not be written.
pub async fn attach(
    database: &Database,
    attachments: Option<&NamespacedStorage>,
    max_size: u64,
    object: &ObjectKey,
    name: &str,
    tags: &str,
    content: &[u8],
) -> Result<FileObject, InventoryError> {
    let storage = storage(attachments)?;
    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > max_size {
        return Err(InventoryError::invalid(format!("Files can not be larger than {max_size} bytes, this one has {size}")));
    }
    let name = validation::not_blank(name, "The file name")?;
    let object = database.read(|t| objects::object(t, &object.class_name, &object.id).map(|o| o.key()))?;
    let file = FileObject {
        id: new_id(),
        name: name.to_owned(),
        tags: tags.to_owned(),
        object,
        size,
        creation_date: now_millis(),
    };

    storage.write(&file.id, content).await?;
    let stored = database.write(|t| {
        if t.objects.get_by_key(&file.object).is_none() {
            return Err(InventoryError::not_found(format!("Object {} could not be found", file.object)));
        }
        t.files.insert(file.id.clone(), file.clone());
        Ok(())
    });
    if let Err(error) = stored {
        kw_business::discard_attachments(Some(storage), std::slice::from_ref(&file)).await;
        return Err(error);
    }
    Ok(file)
}

/// Detaches a file from its object and deletes its content.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects, or files not attached to the object.
pub async fn detach(
    database: &Database,
    attachments: Option<&NamespacedStorage>,
    file_id: &str,
    class_name: &str,
    id: &str,
) -> Result<FileObject, InventoryError> {
    let removed = database.write(|t| {
        file(t, file_id, class_name, id)?;
        t.files
            .remove(file_id)
            .ok_or_else(|| InventoryError::not_found(format!("File {file_id} could not be found")))
    })?;
    kw_business::discard_attachments(attachments, std::slice::from_ref(&removed)).await;
    Ok(removed)
}

/// # Errors
/// As [`file`], plus [`InventoryError::OperationNotPermitted`] without attachment storage
/// and [`InventoryError::Storage`] when the content can not be read.
pub async fn read(
    database: &Database,
    attachments: Option<&NamespacedStorage>,
    file_id: &str,
    class_name: &str,
    id: &str,
) -> Result<FileContent, InventoryError> {
    let storage = storage(attachments)?;
    let file = database.read(|t| file(t, file_id, class_name, id).cloned())?;
    let content = storage.read(&file.id).await?;
    Ok(FileContent { file, content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};
    use kw_storage::Storage;
    use std::collections::BTreeMap;

    fn database() -> Database {
        let database = Database::in_memory();
        database
            .write(|t| {
                kw_metadata::bootstrap::seed_core_model(t);
                t.objects.insert(BusinessObject {
                    id: "r1".to_owned(),
                    class_name: "Router".to_owned(),
                    name: "core".to_owned(),
                    parent: ParentRef::Root,
                    attributes: BTreeMap::new(),
                    creation_date: 0,
                });
                Ok::<_, InventoryError>(())
            })
            .unwrap();
        database
    }

    #[tokio::test]
    async fn content_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::builder().root(dir.path()).connect().await.unwrap();
        let attachments = storage.namespace("attachments").unwrap();
        let database = database();
        let router = ObjectKey::new("Router", "r1");

        let file = attach(&database, Some(&attachments), 16, &router, "config.txt", "cfg", b"hostname core")
            .await
            .unwrap();
        assert!(attach(&database, Some(&attachments), 4, &router, "big", "", b"too large").await.is_err());
        assert!(attach(&database, None, 16, &router, "x", "", b"x").await.is_err());

        let read_back = read(&database, Some(&attachments), &file.id, "Router", "r1").await.unwrap();
        assert_eq!(read_back.content, b"hostname core");
        assert_eq!(read_back.file.size, 13);

        database
            .write(|t| update_properties(t, &file.id, "Router", "r1", Some("running.cfg"), None))
            .unwrap();
        assert_eq!(database.read(|t| files_for_object(t, "Router", "r1")).unwrap()[0].name, "running.cfg");

        detach(&database, Some(&attachments), &file.id, "Router", "r1").await.unwrap();
        assert!(!attachments.exists(&file.id).unwrap());
        assert!(read(&database, Some(&attachments), &file.id, "Router", "r1").await.is_err());
    }

    #[test]
    fn content_serializes_as_base64() {
        let content = FileContent {
            file: FileObject {
                id: "f1".to_owned(),
                name: "a".to_owned(),
                tags: String::new(),
                object: ObjectKey::new("Router", "r1"),
                size: 2,
                creation_date: 0,
            },
            content: vec![0xff, 0x00],
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["content"], "/wA=");
        assert_eq!(json["name"], "a");
    }
}
