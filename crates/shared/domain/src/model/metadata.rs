use super::{Id, Timestamp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Type of an attribute: a primitive, or the name of a list type class whose items are the
/// allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    String,
    Integer,
    Long,
    Float,
    Boolean,
    Date,
    Timestamp,
    ListType(String),
}

impl AttributeType {
    pub const PRIMITIVES: &'static [&'static str] =
        &["String", "Integer", "Long", "Float", "Boolean", "Date", "Timestamp"];

    /// Parses a primitive name; anything else is taken as a list type class name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "String" => Self::String,
            "Integer" => Self::Integer,
            "Long" => Self::Long,
            "Float" => Self::Float,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "Timestamp" => Self::Timestamp,
            other => Self::ListType(other.to_owned()),
        }
    }

    #[must_use]
    pub const fn is_list_type(&self) -> bool {
        matches!(self, Self::ListType(_))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Timestamp => "Timestamp",
            Self::ListType(class_name) => class_name,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for AttributeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for AttributeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

/// A typed attribute value. Dates and timestamps are epoch milliseconds, list values hold
/// the id of a list type item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeValue {
    String(String),
    Integer(i32),
    Long(i64),
    Float(f64),
    Boolean(bool),
    Date(i64),
    Timestamp(i64),
    ListItem(Id),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) | Self::ListItem(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Long(value) | Self::Date(value) | Self::Timestamp(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    pub id: Id,
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub administrative: bool,
    pub visible: bool,
    pub read_only: bool,
    pub unique: bool,
    pub mandatory: bool,
    pub no_copy: bool,
    pub order: i32,
}

/// A class of the data model. Only the attributes declared by the class itself are stored;
/// inherited ones are resolved by walking the parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMetadata {
    pub id: Id,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub parent_class_name: Option<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub custom: bool,
    pub countable: bool,
    pub in_design: bool,
    pub color: i32,
    pub attributes: Vec<AttributeMetadata>,
    pub possible_children: Vec<String>,
    pub possible_special_children: Vec<String>,
    pub creation_date: Timestamp,
}

impl ClassMetadata {
    #[must_use]
    pub fn own_attribute(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Light view of a class used by hierarchy listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLight {
    pub id: Id,
    pub name: String,
    pub display_name: String,
    pub parent_class_name: Option<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub in_design: bool,
    pub custom: bool,
    pub color: i32,
}

impl From<&ClassMetadata> for ClassLight {
    fn from(class: &ClassMetadata) -> Self {
        Self {
            id: class.id.clone(),
            name: class.name.clone(),
            display_name: class.display_name.clone(),
            parent_class_name: class.parent_class_name.clone(),
            is_abstract: class.is_abstract,
            in_design: class.in_design,
            custom: class.custom,
            color: class.color,
        }
    }
}
