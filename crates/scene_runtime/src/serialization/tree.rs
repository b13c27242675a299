//! Tree of named fields
//!
//! The neutral representation scenes are encoded into before being written
//! out. A [`FieldTree`] maps names to [`Field`]s; a field is a scalar, a
//! nested tree, or a sequence of trees. Typed access goes through the
//! [`IntoField`] / [`FromField`] conversions.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ecs::EntityId;
use crate::foundation::math::{Quat, Vec3};

/// A single named value in a [`FieldTree`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Text scalar
    Text(String),
    /// Nested tree
    Tree(FieldTree),
    /// Sequence of trees
    Sequence(Vec<FieldTree>),
}

impl Field {
    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Tree(_) => "tree",
            Self::Sequence(_) => "sequence",
        }
    }
}

/// Errors raised while reading values back out of a [`FieldTree`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// A required field is absent
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A field holds a different kind of value than requested
    #[error("field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// What the reader asked for
        expected: &'static str,
        /// What the tree holds
        found: &'static str,
    },

    /// A field has the right kind but an unusable value
    #[error("field '{field}' has an invalid value: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Human readable reason
        reason: String,
    },
}

/// Map of named fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTree {
    fields: BTreeMap<String, Field>,
}

impl FieldTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl IntoField) -> &mut Self {
        self.fields.insert(name.into(), value.into_field());
        self
    }

    /// Builder form of [`FieldTree::set`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl IntoField) -> Self {
        self.set(name, value);
        self
    }

    /// Whether a field is present
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Raw access to a field
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Read a typed field
    pub fn get<T: FromField>(&self, name: &str) -> Result<T, DecodeError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| DecodeError::MissingField(name.to_string()))?;
        T::from_field(field).ok_or_else(|| DecodeError::TypeMismatch {
            field: name.to_string(),
            expected: T::EXPECTED,
            found: field.kind(),
        })
    }

    /// Read a typed field, using `default` when it is absent.
    /// A present field of the wrong type is still an error.
    pub fn get_or<T: FromField>(&self, name: &str, default: T) -> Result<T, DecodeError> {
        if self.contains(name) {
            self.get(name)
        } else {
            Ok(default)
        }
    }

    /// Borrow a nested tree
    pub fn tree(&self, name: &str) -> Option<&FieldTree> {
        match self.fields.get(name) {
            Some(Field::Tree(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Borrow a sequence of trees
    pub fn sequence(&self, name: &str) -> Option<&[FieldTree]> {
        match self.fields.get(name) {
            Some(Field::Sequence(items)) => Some(items),
            _ => None,
        }
    }

    /// Remove a field
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the tree has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Conversion of a value into a [`Field`]
pub trait IntoField {
    /// Encode `self`
    fn into_field(self) -> Field;
}

/// Conversion of a [`Field`] back into a value
pub trait FromField: Sized {
    /// Description of the expected field kind, for diagnostics
    const EXPECTED: &'static str;

    /// Decode, returning `None` on a kind or range mismatch
    fn from_field(field: &Field) -> Option<Self>;
}

impl IntoField for Field {
    fn into_field(self) -> Field {
        self
    }
}

impl IntoField for bool {
    fn into_field(self) -> Field {
        Field::Bool(self)
    }
}

impl FromField for bool {
    const EXPECTED: &'static str = "bool";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl IntoField for i64 {
    fn into_field(self) -> Field {
        Field::Int(self)
    }
}

impl FromField for i64 {
    const EXPECTED: &'static str = "int";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl IntoField for u32 {
    fn into_field(self) -> Field {
        Field::Int(i64::from(self))
    }
}

impl FromField for u32 {
    const EXPECTED: &'static str = "unsigned 32-bit int";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Int(value) => u32::try_from(*value).ok(),
            _ => None,
        }
    }
}

impl IntoField for f32 {
    fn into_field(self) -> Field {
        Field::Float(f64::from(self))
    }
}

impl FromField for f32 {
    const EXPECTED: &'static str = "float";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Float(value) => Some(*value as f32),
            Field::Int(value) => Some(*value as f32),
            _ => None,
        }
    }
}

impl IntoField for String {
    fn into_field(self) -> Field {
        Field::Text(self)
    }
}

impl IntoField for &str {
    fn into_field(self) -> Field {
        Field::Text(self.to_string())
    }
}

impl FromField for String {
    const EXPECTED: &'static str = "text";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Text(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl IntoField for Uuid {
    fn into_field(self) -> Field {
        Field::Text(self.to_string())
    }
}

impl FromField for Uuid {
    const EXPECTED: &'static str = "uuid text";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Text(value) => Uuid::parse_str(value).ok(),
            _ => None,
        }
    }
}

impl IntoField for EntityId {
    fn into_field(self) -> Field {
        Field::Int(i64::from(self.raw()))
    }
}

impl FromField for EntityId {
    const EXPECTED: &'static str = "entity id";

    fn from_field(field: &Field) -> Option<Self> {
        u32::from_field(field).map(EntityId::from_raw)
    }
}

impl IntoField for FieldTree {
    fn into_field(self) -> Field {
        Field::Tree(self)
    }
}

impl FromField for FieldTree {
    const EXPECTED: &'static str = "tree";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Tree(tree) => Some(tree.clone()),
            _ => None,
        }
    }
}

impl IntoField for Vec<FieldTree> {
    fn into_field(self) -> Field {
        Field::Sequence(self)
    }
}

impl FromField for Vec<FieldTree> {
    const EXPECTED: &'static str = "sequence";

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::Sequence(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl IntoField for Vec3 {
    fn into_field(self) -> Field {
        Field::Tree(FieldTree::new().with("x", self.x).with("y", self.y).with("z", self.z))
    }
}

impl FromField for Vec3 {
    const EXPECTED: &'static str = "vector tree {x, y, z}";

    fn from_field(field: &Field) -> Option<Self> {
        let Field::Tree(tree) = field else { return None };
        Some(Vec3::new(tree.get("x").ok()?, tree.get("y").ok()?, tree.get("z").ok()?))
    }
}

impl IntoField for Quat {
    fn into_field(self) -> Field {
        let q = self.into_inner();
        Field::Tree(
            FieldTree::new()
                .with("x", q.i)
                .with("y", q.j)
                .with("z", q.k)
                .with("w", q.w),
        )
    }
}

impl FromField for Quat {
    const EXPECTED: &'static str = "quaternion tree {x, y, z, w}";

    fn from_field(field: &Field) -> Option<Self> {
        let Field::Tree(tree) = field else { return None };
        let raw = nalgebra::Quaternion::new(
            tree.get::<f32>("w").ok()?,
            tree.get::<f32>("x").ok()?,
            tree.get::<f32>("y").ok()?,
            tree.get::<f32>("z").ok()?,
        );
        // Zero quaternions cannot be normalized
        Quat::try_new(raw, f32::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_typed_access() {
        let mut tree = FieldTree::new();
        tree.set("name", "crate").set("count", 3u32).set("visible", true);

        assert_eq!(tree.get::<String>("name").unwrap(), "crate");
        assert_eq!(tree.get::<u32>("count").unwrap(), 3);
        assert!(tree.get::<bool>("visible").unwrap());
        assert!(tree.contains("count"));
        assert!(!tree.contains("missing"));
    }

    #[test]
    fn test_missing_and_mismatched_fields() {
        let tree = FieldTree::new().with("count", "three");

        assert_eq!(tree.get::<u32>("other"), Err(DecodeError::MissingField("other".to_string())));
        assert!(matches!(
            tree.get::<u32>("count"),
            Err(DecodeError::TypeMismatch { expected: "unsigned 32-bit int", found: "text", .. })
        ));
        assert_eq!(tree.get_or::<u32>("other", 9).unwrap(), 9);
    }

    #[test]
    fn test_negative_int_is_not_an_entity() {
        let tree = FieldTree::new().with("parent", -4i64);
        assert!(tree.get::<EntityId>("parent").is_err());
    }

    #[test]
    fn test_null_entity_survives() {
        let tree = FieldTree::new().with("parent", EntityId::NULL);
        assert_eq!(tree.get::<EntityId>("parent").unwrap(), EntityId::NULL);
    }

    #[test]
    fn test_vector_and_quaternion_fields() {
        let rotation = Quat::from_euler_angles(0.1, 0.2, 0.3);
        let tree = FieldTree::new()
            .with("position", Vec3::new(1.0, 2.0, 3.0))
            .with("rotation", rotation);

        assert_eq!(tree.get::<Vec3>("position").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(tree.get::<Quat>("rotation").unwrap(), rotation, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_quaternion_rejected() {
        let zero = FieldTree::new().with("x", 0.0f32).with("y", 0.0f32).with("z", 0.0f32).with("w", 0.0f32);
        let tree = FieldTree::new().with("rotation", zero);
        assert!(tree.get::<Quat>("rotation").is_err());
    }

    #[test]
    fn test_ron_text_roundtrip() {
        let tree = FieldTree::new()
            .with("id", 4u32)
            .with("items", vec![FieldTree::new().with("a", 1.5f32)]);
        let text = ron::to_string(&tree).unwrap();
        let parsed: FieldTree = ron::from_str(&text).unwrap();
        assert_eq!(parsed, tree);
    }
}
