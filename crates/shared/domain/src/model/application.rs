use super::{Id, ObjectKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A feature token and the level granted on it (`1` read, `2` read and write).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Privilege {
    pub feature_token: String,
    pub access_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub user_name: String,
    pub password_hash: String,
    pub salt: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enabled: bool,
    pub user_type: i32,
    pub privileges: Vec<Privilege>,
    pub groups: Vec<Id>,
    pub creation_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub privileges: Vec<Privilege>,
    pub creation_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesFolder {
    pub id: Id,
    pub name: String,
    pub user_id: Id,
    pub objects: Vec<ObjectKey>,
}

/// A view. Object related views carry the object they belong to, general views do not.
/// `structure` is the client rendered document, `background` a base64 image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub view_class: String,
    pub structure: String,
    pub background: Option<String>,
    pub object: Option<ObjectKey>,
    pub creation_date: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryOperator {
    Equal,
    NotEqual,
    Like,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalConnector {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCondition {
    pub attribute: String,
    pub operator: QueryOperator,
    pub value: String,
}

/// What a saved query selects: instances of a class (and optionally its subclasses)
/// filtered by attribute conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    pub class_name: String,
    pub include_subclasses: bool,
    pub connector: LogicalConnector,
    pub conditions: Vec<QueryCondition>,
    pub visible_attributes: Vec<String>,
}

/// A saved query. Queries without owner are public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub owner: Option<Id>,
    pub definition: QueryDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    pub start_time: Timestamp,
    pub every_x_minutes: i32,
    pub execution_type: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNotification {
    pub email: String,
    pub notification_type: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub commit_on_execute: bool,
    pub script: String,
    pub parameters: BTreeMap<String, String>,
    pub schedule: TaskSchedule,
    pub notification: TaskNotification,
    pub subscribers: Vec<Id>,
}

/// A report. Class level reports apply to instances of `class_name`, inventory level
/// reports have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub report_type: i32,
    pub script: String,
    pub class_name: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

/// Pool of configuration variables or of proxies. Not part of the inventory pool tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedPool {
    pub id: Id,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigVariableType {
    Integer,
    Float,
    String,
    Boolean,
    Array,
    Matrix,
}

impl ConfigVariableType {
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Integer),
            1 => Some(Self::Float),
            2 => Some(Self::String),
            3 => Some(Self::Boolean),
            4 => Some(Self::Array),
            5 => Some(Self::Matrix),
            _ => None,
        }
    }
}

/// Configuration variables are addressed by their unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigVariable {
    pub id: Id,
    pub pool_id: Id,
    pub name: String,
    pub description: String,
    pub variable_type: ConfigVariableType,
    pub masked: bool,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorDefinition {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub class_name: String,
    pub script: String,
    pub enabled: bool,
}

/// Rule types understood by the service.
pub const BUSINESS_RULE_TYPE_RELATIONSHIP: i32 = 1;

/// A business rule. Relationship rules hold constraints of the form
/// `sourceClass;relationshipName;targetClass`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRule {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub rule_type: i32,
    pub scope: i32,
    pub applies_to: String,
    pub version: String,
    pub constraints: Vec<String>,
}

/// Metadata of a file attached to an object. The content lives in the attachments store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileObject {
    pub id: Id,
    pub name: String,
    pub tags: String,
    pub object: ObjectKey,
    pub size: u64,
    pub creation_date: Timestamp,
}

/// A process definition. `structure` is the base64 encoded definition document, which the
/// service stores without interpreting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub version: String,
    pub enabled: bool,
    pub structure: String,
    pub creation_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstance {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub process_definition: Id,
    pub current_activity: Option<Id>,
    pub creation_date: Timestamp,
}
