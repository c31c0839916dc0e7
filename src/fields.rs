//! Base field normalization
//!
//! The expanders never render scalar fields themselves. They decide *which* fields
//! to render and delegate the rendering to a [`FieldNormalizer`].

use crate::context::NormalizationContext;
use crate::error::BoxError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Normalized output: an insertion-ordered map from field or relation name to value
pub type Record = Map<String, Value>;

/// Renders the scalar fields of a plain entity
///
/// Implementations must not recurse into relations and must be safe for
/// concurrent use.
pub trait FieldNormalizer<E: ?Sized>: Send + Sync {
	/// Render exactly the fields named in `fields`, in that order
	fn normalize_fields(
		&self,
		entity: &E,
		fields: &[String],
		context: &NormalizationContext,
	) -> Result<Record, BoxError>;
}

/// [`FieldNormalizer`] backed by the entity's `Serialize` implementation
///
/// The entity is serialized with `serde_json` and the allow-listed fields are
/// copied out of the resulting object.
///
/// # Examples
///
/// ```
/// use entity_normalizer::{FieldNormalizer, NormalizationContext, SerdeFieldNormalizer};
/// use serde::Serialize;
/// use serde_json::json;
///
/// #[derive(Serialize)]
/// struct Book { id: i64, title: String, secret: String }
///
/// let book = Book { id: 10, title: "T1".to_string(), secret: "x".to_string() };
/// let fields = vec!["title".to_string(), "id".to_string()];
/// let record = SerdeFieldNormalizer::new()
///     .normalize_fields(&book, &fields, &NormalizationContext::new())
///     .unwrap();
///
/// assert_eq!(serde_json::Value::Object(record), json!({"title": "T1", "id": 10}));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeFieldNormalizer;

impl SerdeFieldNormalizer {
	/// Create a new serde-backed field normalizer
	pub fn new() -> Self {
		Self
	}
}

impl<E: Serialize + ?Sized> FieldNormalizer<E> for SerdeFieldNormalizer {
	fn normalize_fields(
		&self,
		entity: &E,
		fields: &[String],
		_context: &NormalizationContext,
	) -> Result<Record, BoxError> {
		let mut source = match serde_json::to_value(entity)? {
			Value::Object(map) => map,
			other => {
				return Err(format!("expected an object, entity serialized to {}", other).into());
			}
		};

		let mut record = Record::new();
		for field in fields {
			let value = source
				.remove(field)
				.ok_or_else(|| format!("field '{}' missing from serialized entity", field))?;
			record.insert(field.clone(), value);
		}
		Ok(record)
	}
}
