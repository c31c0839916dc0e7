//! Entity metadata capability
//!
//! The normalizers never inspect live objects on their own. Everything they need to
//! know about an entity type, and every relation value they traverse, comes through a
//! [`MetadataOracle`] implemented once per data layer.

use crate::error::MetadataError;
use serde_json::{Map, Value};
use std::fmt;

/// A domain object with a type identity
pub trait Entity {
	/// Type name used to look up metadata (e.g., "Author")
	fn entity_type(&self) -> &str;
}

impl<T: Entity + ?Sized> Entity for &T {
	fn entity_type(&self) -> &str {
		(**self).entity_type()
	}
}

impl<T: Entity + ?Sized> Entity for std::sync::Arc<T> {
	fn entity_type(&self) -> &str {
		(**self).entity_type()
	}
}

/// Cardinality of a declared relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationShape {
	/// Many-to-one or one-to-one
	ToOne,
	/// One-to-many or many-to-many
	ToMany,
}

impl fmt::Display for RelationShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RelationShape::ToOne => write!(f, "to-one"),
			RelationShape::ToMany => write!(f, "to-many"),
		}
	}
}

/// Current value of a relation on a live entity
#[derive(Debug)]
pub enum RelationValue<'e, E: ?Sized> {
	/// Single-valued relation (`None` when no row is related)
	One(Option<&'e E>),
	/// Collection-valued relation, in the collection's iteration order
	Many(Vec<&'e E>),
}

impl<'e, E: ?Sized> RelationValue<'e, E> {
	/// Shape of the value itself, regardless of what metadata declares
	pub fn shape(&self) -> RelationShape {
		match self {
			RelationValue::One(_) => RelationShape::ToOne,
			RelationValue::Many(_) => RelationShape::ToMany,
		}
	}
}

/// Primary-key values of one entity, in key-column order
///
/// # Examples
///
/// ```
/// use entity_normalizer::IdentifierValues;
/// use serde_json::json;
///
/// let single = IdentifierValues::single("id", json!(5));
/// assert_eq!(single.into_value(), json!(5));
///
/// let composite = IdentifierValues::new(vec![
///     ("order_id".to_string(), json!(1)),
///     ("line".to_string(), json!(2)),
/// ]);
/// assert_eq!(composite.into_value(), json!({"order_id": 1, "line": 2}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierValues {
	columns: Vec<(String, Value)>,
}

impl IdentifierValues {
	/// Create identifier values from ordered `(column, value)` pairs
	pub fn new(columns: Vec<(String, Value)>) -> Self {
		Self { columns }
	}

	/// Create a single-column identifier
	pub fn single(column: impl Into<String>, value: Value) -> Self {
		Self {
			columns: vec![(column.into(), value)],
		}
	}

	/// Key columns and their values
	pub fn columns(&self) -> &[(String, Value)] {
		&self.columns
	}

	/// Whether the key spans more than one column
	pub fn is_composite(&self) -> bool {
		self.columns.len() > 1
	}

	/// Render the identifier
	///
	/// A single-column key becomes its bare value, a composite key an ordered object,
	/// and an empty key `null`.
	pub fn into_value(self) -> Value {
		let mut columns = self.columns;
		match columns.len() {
			0 => Value::Null,
			1 => columns.pop().map(|(_, value)| value).unwrap_or(Value::Null),
			_ => Value::Object(columns.into_iter().collect::<Map<String, Value>>()),
		}
	}
}

/// Schema oracle consulted by the normalizers
///
/// Implementations must be safe for concurrent read access; the normalizers only
/// ever read through this trait.
pub trait MetadataOracle<E: ?Sized>: Send + Sync {
	/// Whether the type is a mapped entity
	fn is_known_entity_type(&self, entity_type: &str) -> bool;

	/// Declared scalar field names, in declaration order (relations excluded)
	fn declared_field_names(&self, entity_type: &str) -> Result<Vec<String>, MetadataError>;

	/// Declared relation names, in declaration order
	fn declared_relation_names(&self, entity_type: &str) -> Result<Vec<String>, MetadataError>;

	/// Cardinality of a declared relation
	fn relation_shape(
		&self,
		entity_type: &str,
		relation: &str,
	) -> Result<RelationShape, MetadataError>;

	/// Current value of a relation on a live entity
	fn relation_value<'e>(
		&self,
		entity: &'e E,
		relation: &str,
	) -> Result<RelationValue<'e, E>, MetadataError>;

	/// Primary-key values of a live entity
	fn primary_key_values(&self, entity: &E) -> Result<IdentifierValues, MetadataError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_single_identifier_renders_bare_value() {
		// Arrange
		let id = IdentifierValues::single("id", json!(10));

		// Act & Assert
		assert!(!id.is_composite());
		assert_eq!(id.into_value(), json!(10));
	}

	#[rstest]
	fn test_composite_identifier_keeps_column_order() {
		// Arrange
		let id = IdentifierValues::new(vec![
			("tenant".to_string(), json!("acme")),
			("id".to_string(), json!(7)),
		]);

		// Act
		let rendered = id.into_value();

		// Assert
		let keys: Vec<&String> = rendered.as_object().unwrap().keys().collect();
		assert_eq!(keys, vec!["tenant", "id"]);
	}

	#[rstest]
	fn test_empty_identifier_is_null() {
		assert_eq!(IdentifierValues::new(Vec::new()).into_value(), Value::Null);
	}

	#[rstest]
	fn test_relation_value_shape() {
		// Arrange
		let one: RelationValue<'_, str> = RelationValue::One(Some("a"));
		let many: RelationValue<'_, str> = RelationValue::Many(vec!["a", "b"]);

		// Act & Assert
		assert_eq!(one.shape(), RelationShape::ToOne);
		assert_eq!(many.shape(), RelationShape::ToMany);
		assert_eq!(RelationShape::ToMany.to_string(), "to-many");
	}
}
