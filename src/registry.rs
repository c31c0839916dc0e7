//! Explicit entity schema registry
//!
//! [`EntityRegistry`] is a ready-made [`MetadataOracle`] for applications that
//! describe their models up front, the way an ORM's class metadata factory does.
//! Each [`EntitySchema`] lists the scalar fields, the primary key and the relations
//! of one entity type, and carries two accessor functions that read values off a
//! live entity.

use crate::error::MetadataError;
use crate::metadata::{Entity, IdentifierValues, MetadataOracle, RelationShape, RelationValue};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Reads a scalar field off a live entity
pub type FieldAccessor<E> = fn(&E, &str) -> Option<Value>;

/// Reads the current value of a relation off a live entity
pub type RelationAccessor<E> = for<'e> fn(&'e E, &str) -> Option<RelationValue<'e, E>>;

/// Mapping of one entity type
///
/// # Examples
///
/// ```
/// use entity_normalizer::{EntitySchema, RelationValue};
/// use serde_json::{json, Value};
///
/// struct Tag { id: i64, label: String }
///
/// fn tag_field(tag: &Tag, name: &str) -> Option<Value> {
///     match name {
///         "id" => Some(json!(tag.id)),
///         "label" => Some(json!(tag.label)),
///         _ => None,
///     }
/// }
///
/// fn tag_relation<'e>(_tag: &'e Tag, _name: &str) -> Option<RelationValue<'e, Tag>> {
///     None
/// }
///
/// let schema = EntitySchema::new("Tag", tag_field, tag_relation)
///     .field("id")
///     .field("label");
/// assert_eq!(schema.fields(), ["id", "label"]);
/// assert_eq!(schema.primary_key_columns(), ["id"]);
/// ```
pub struct EntitySchema<E: ?Sized> {
	entity_type: String,
	fields: Vec<String>,
	primary_key: Vec<String>,
	relations: IndexMap<String, RelationShape>,
	field_accessor: FieldAccessor<E>,
	relation_accessor: RelationAccessor<E>,
}

impl<E: ?Sized> EntitySchema<E> {
	/// Create a schema with no fields and an `id` primary key
	pub fn new(
		entity_type: impl Into<String>,
		field_accessor: FieldAccessor<E>,
		relation_accessor: RelationAccessor<E>,
	) -> Self {
		Self {
			entity_type: entity_type.into(),
			fields: Vec::new(),
			primary_key: vec!["id".to_string()],
			relations: IndexMap::new(),
			field_accessor,
			relation_accessor,
		}
	}

	/// Declare a scalar field
	pub fn field(mut self, name: impl Into<String>) -> Self {
		self.fields.push(name.into());
		self
	}

	/// Declare several scalar fields
	pub fn fields_from<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields.extend(names.into_iter().map(Into::into));
		self
	}

	/// Set the primary-key columns
	pub fn primary_key<I, S>(mut self, columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.primary_key = columns.into_iter().map(Into::into).collect();
		self
	}

	/// Declare a single-valued relation
	pub fn to_one(mut self, name: impl Into<String>) -> Self {
		self.relations.insert(name.into(), RelationShape::ToOne);
		self
	}

	/// Declare a collection-valued relation
	pub fn to_many(mut self, name: impl Into<String>) -> Self {
		self.relations.insert(name.into(), RelationShape::ToMany);
		self
	}

	/// Type name
	pub fn entity_type(&self) -> &str {
		&self.entity_type
	}

	/// Declared scalar fields
	pub fn fields(&self) -> &[String] {
		&self.fields
	}

	/// Primary-key columns
	pub fn primary_key_columns(&self) -> &[String] {
		&self.primary_key
	}

	/// Declared relations and their shapes
	pub fn relations(&self) -> impl Iterator<Item = (&str, RelationShape)> {
		self.relations
			.iter()
			.map(|(name, shape)| (name.as_str(), *shape))
	}

	fn validate(&self) -> Result<(), MetadataError> {
		let invalid = |message: String| MetadataError::InvalidSchema {
			entity_type: self.entity_type.clone(),
			message,
		};

		let mut seen = HashSet::new();
		for field in &self.fields {
			if !seen.insert(field.as_str()) {
				return Err(invalid(format!("field '{}' declared twice", field)));
			}
		}
		if self.primary_key.is_empty() {
			return Err(invalid("primary key has no columns".to_string()));
		}
		for column in &self.primary_key {
			if !seen.contains(column.as_str()) {
				return Err(invalid(format!(
					"primary key column '{}' is not a declared field",
					column
				)));
			}
		}
		for relation in self.relations.keys() {
			if seen.contains(relation.as_str()) {
				return Err(invalid(format!(
					"relation '{}' collides with a field of the same name",
					relation
				)));
			}
		}
		Ok(())
	}
}

impl<E: ?Sized> fmt::Debug for EntitySchema<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntitySchema")
			.field("entity_type", &self.entity_type)
			.field("fields", &self.fields)
			.field("primary_key", &self.primary_key)
			.field("relations", &self.relations)
			.finish()
	}
}

/// [`MetadataOracle`] over a set of registered [`EntitySchema`]s
pub struct EntityRegistry<E: ?Sized> {
	schemas: HashMap<String, EntitySchema<E>>,
}

impl<E: ?Sized> EntityRegistry<E> {
	/// Create an empty registry
	pub fn new() -> Self {
		Self {
			schemas: HashMap::new(),
		}
	}

	/// Register a schema
	///
	/// # Errors
	///
	/// Returns [`MetadataError::InvalidSchema`] if the type is already registered or
	/// the schema is inconsistent.
	pub fn register(&mut self, schema: EntitySchema<E>) -> Result<(), MetadataError> {
		schema.validate()?;
		if self.schemas.contains_key(&schema.entity_type) {
			return Err(MetadataError::InvalidSchema {
				entity_type: schema.entity_type.clone(),
				message: "entity type registered twice".to_string(),
			});
		}

		tracing::debug!(
			entity_type = %schema.entity_type,
			fields = schema.fields.len(),
			relations = schema.relations.len(),
			"Registered entity schema"
		);
		self.schemas.insert(schema.entity_type.clone(), schema);
		Ok(())
	}

	/// Register a schema, builder style
	pub fn with_schema(mut self, schema: EntitySchema<E>) -> Result<Self, MetadataError> {
		self.register(schema)?;
		Ok(self)
	}

	/// Look up the schema of a type
	pub fn schema(&self, entity_type: &str) -> Result<&EntitySchema<E>, MetadataError> {
		self.schemas
			.get(entity_type)
			.ok_or_else(|| MetadataError::UnknownEntityType(entity_type.to_string()))
	}

	/// Number of registered types
	pub fn len(&self) -> usize {
		self.schemas.len()
	}

	/// Whether no type is registered
	pub fn is_empty(&self) -> bool {
		self.schemas.is_empty()
	}
}

impl<E: ?Sized> Default for EntityRegistry<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: ?Sized> fmt::Debug for EntityRegistry<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntityRegistry")
			.field("entity_types", &self.schemas.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl<E: Entity + ?Sized> MetadataOracle<E> for EntityRegistry<E> {
	fn is_known_entity_type(&self, entity_type: &str) -> bool {
		self.schemas.contains_key(entity_type)
	}

	fn declared_field_names(&self, entity_type: &str) -> Result<Vec<String>, MetadataError> {
		Ok(self.schema(entity_type)?.fields.clone())
	}

	fn declared_relation_names(&self, entity_type: &str) -> Result<Vec<String>, MetadataError> {
		Ok(self.schema(entity_type)?.relations.keys().cloned().collect())
	}

	fn relation_shape(
		&self,
		entity_type: &str,
		relation: &str,
	) -> Result<RelationShape, MetadataError> {
		self.schema(entity_type)?
			.relations
			.get(relation)
			.copied()
			.ok_or_else(|| MetadataError::UnknownRelation {
				entity_type: entity_type.to_string(),
				relation: relation.to_string(),
			})
	}

	fn relation_value<'e>(
		&self,
		entity: &'e E,
		relation: &str,
	) -> Result<RelationValue<'e, E>, MetadataError> {
		let entity_type = entity.entity_type();
		let schema = self.schema(entity_type)?;
		let unknown = || MetadataError::UnknownRelation {
			entity_type: entity_type.to_string(),
			relation: relation.to_string(),
		};

		let declared = schema.relations.get(relation).copied().ok_or_else(unknown)?;
		let value = (schema.relation_accessor)(entity, relation).ok_or_else(unknown)?;
		if value.shape() != declared {
			return Err(MetadataError::ShapeMismatch {
				entity_type: entity_type.to_string(),
				relation: relation.to_string(),
				expected: declared.to_string(),
			});
		}
		Ok(value)
	}

	fn primary_key_values(&self, entity: &E) -> Result<IdentifierValues, MetadataError> {
		let entity_type = entity.entity_type();
		let schema = self.schema(entity_type)?;

		let columns = schema
			.primary_key
			.iter()
			.map(|column| {
				(schema.field_accessor)(entity, column)
					.map(|value| (column.clone(), value))
					.ok_or_else(|| MetadataError::MissingPrimaryKey {
						entity_type: entity_type.to_string(),
						column: column.clone(),
					})
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(IdentifierValues::new(columns))
	}
}
