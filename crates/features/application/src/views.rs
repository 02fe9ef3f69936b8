//! Views: client rendered documents, either about one object or general purpose.

use kw_business::objects;
use kw_database::Tables;
use kw_domain::model::application::View;
use kw_domain::model::{Id, ObjectKey};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis, validation};
use serde::{Deserialize, Serialize};

/// Fields of a new or edited view. Absent fields keep their value on updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewContent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

/// A view without its structure and background, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewLight {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub view_class: String,
}

impl From<&View> for ViewLight {
    fn from(view: &View) -> Self {
        Self {
            id: view.id.clone(),
            name: view.name.clone(),
            description: view.description.clone(),
            view_class: view.view_class.clone(),
        }
    }
}

fn insert(
    tables: &mut Tables,
    object: Option<ObjectKey>,
    view_class: &str,
    content: &ViewContent,
) -> Result<Id, InventoryError> {
    let view_class = validation::not_blank(view_class, "The view class")?;
    let name = validation::not_blank(content.name.as_deref().unwrap_or_default(), "The view name")?;
    let id = new_id();
    tables.views.insert(
        id.clone(),
        View {
            id: id.clone(),
            name: name.to_owned(),
            description: content.description.clone().unwrap_or_default(),
            view_class: view_class.to_owned(),
            structure: content.structure.clone().unwrap_or_default(),
            background: content.background.clone().filter(|b| !b.is_empty()),
            object,
            creation_date: now_millis(),
        },
    );
    Ok(id)
}

fn edit(tables: &mut Tables, id: &str, content: &ViewContent) -> Result<(), InventoryError> {
    let name = content.name.as_deref().map(|n| validation::not_blank(n, "The view name")).transpose()?;
    let Some(view) = tables.views.get_mut(id) else {
        return Err(InventoryError::not_found(format!("View {id} could not be found")));
    };
    if let Some(name) = name {
        name.clone_into(&mut view.name);
    }
    if let Some(description) = &content.description {
        view.description.clone_from(description);
    }
    if let Some(structure) = &content.structure {
        view.structure.clone_from(structure);
    }
    if let Some(background) = &content.background {
        view.background = Some(background.clone()).filter(|b| !b.is_empty());
    }
    Ok(())
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] for blank names or view classes.
pub fn create_object_view(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    view_class: &str,
    content: &ViewContent,
) -> Result<Id, InventoryError> {
    let key = objects::object(tables, class_name, id)?.key();
    insert(tables, Some(key), view_class, content)
}

/// A view of an object. Views of other objects are reported as missing.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects and views.
pub fn object_view<'a>(tables: &'a Tables, class_name: &str, id: &str, view_id: &str) -> Result<&'a View, InventoryError> {
    let key = objects::object(tables, class_name, id)?.key();
    tables
        .views
        .get(view_id)
        .filter(|v| v.object.as_ref() == Some(&key))
        .ok_or_else(|| InventoryError::not_found(format!("View {view_id} of {key} could not be found")))
}

/// # Errors
/// As [`object_view`], plus [`InventoryError::InvalidArgument`] for blank names.
pub fn update_object_view(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    view_id: &str,
    content: &ViewContent,
) -> Result<(), InventoryError> {
    object_view(tables, class_name, id, view_id)?;
    edit(tables, view_id, content)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn object_views(tables: &Tables, class_name: &str, id: &str, limit: i64) -> Result<Vec<ViewLight>, InventoryError> {
    let key = objects::object(tables, class_name, id)?.key();
    Ok(listed(tables.views.values().filter(|v| v.object.as_ref() == Some(&key)), limit))
}

fn listed<'a>(views: impl Iterator<Item = &'a View>, limit: i64) -> Vec<ViewLight> {
    let mut lights: Vec<ViewLight> = views.map(ViewLight::from).collect();
    lights.sort_by(|a, b| a.name.cmp(&b.name));
    if let Ok(limit) = usize::try_from(limit)
        && limit > 0
    {
        lights.truncate(limit);
    }
    lights
}

/// Deletes views. `general` selects which kind the ids must name.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown ids or views of the other kind, before anything
/// is deleted.
pub fn delete_views(tables: &mut Tables, ids: &[Id], general: bool) -> Result<(), InventoryError> {
    for id in ids {
        let known = tables.views.get(id).is_some_and(|v| v.object.is_none() == general);
        if !known {
            return Err(InventoryError::not_found(format!("View {id} could not be found")));
        }
    }
    for id in ids {
        tables.views.remove(id);
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names or view classes.
pub fn create_general_view(tables: &mut Tables, view_class: &str, content: &ViewContent) -> Result<Id, InventoryError> {
    insert(tables, None, view_class, content)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown views and views bound to an object.
pub fn general_view<'a>(tables: &'a Tables, id: &str) -> Result<&'a View, InventoryError> {
    tables
        .views
        .get(id)
        .filter(|v| v.object.is_none())
        .ok_or_else(|| InventoryError::not_found(format!("General view {id} could not be found")))
}

/// # Errors
/// As [`general_view`], plus [`InventoryError::InvalidArgument`] for blank names.
pub fn update_general_view(tables: &mut Tables, id: &str, content: &ViewContent) -> Result<(), InventoryError> {
    general_view(tables, id)?;
    edit(tables, id, content)
}

/// General views, optionally of one view class only.
#[must_use]
pub fn general_views(tables: &Tables, view_class: Option<&str>, limit: i64) -> Vec<ViewLight> {
    let view_class = view_class.filter(|c| !c.trim().is_empty());
    listed(
        tables.views.values().filter(|v| v.object.is_none() && view_class.is_none_or(|c| v.view_class == c)),
        limit,
    )
}

/// View class of outside plant views. They are general views the outside plant operations
/// manage apart from the others.
pub const OSP_VIEW_CLASS: &str = "OSPView";

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names.
pub fn create_osp_view(tables: &mut Tables, content: &ViewContent) -> Result<Id, InventoryError> {
    insert(tables, None, OSP_VIEW_CLASS, content)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown ids and views of other classes.
pub fn osp_view<'a>(tables: &'a Tables, id: &str) -> Result<&'a View, InventoryError> {
    general_view(tables, id)
        .ok()
        .filter(|v| v.view_class == OSP_VIEW_CLASS)
        .ok_or_else(|| InventoryError::not_found(format!("OSP view {id} could not be found")))
}

#[must_use]
pub fn osp_views(tables: &Tables) -> Vec<ViewLight> {
    general_views(tables, Some(OSP_VIEW_CLASS), 0)
}

/// # Errors
/// As [`osp_view`], plus [`InventoryError::InvalidArgument`] for blank names.
pub fn update_osp_view(tables: &mut Tables, id: &str, content: &ViewContent) -> Result<(), InventoryError> {
    osp_view(tables, id)?;
    edit(tables, id, content)
}

/// # Errors
/// See [`osp_view`].
pub fn delete_osp_view(tables: &mut Tables, id: &str) -> Result<View, InventoryError> {
    osp_view(tables, id)?;
    tables
        .views
        .remove(id)
        .ok_or_else(|| InventoryError::not_found(format!("OSP view {id} could not be found")))
}
