//! # Entity Normalizer
//!
//! Policy-driven normalization of ORM-managed entity graphs into plain
//! [`serde_json`] structures.
//!
//! Entities are linked by to-one and to-many relations, and those links routinely
//! form cycles (an author's books point back at the author). Rendering such a graph
//! naively never terminates. This crate renders an entity according to two
//! independent policies:
//!
//! - [`RelationNormalizeMode`] decides how to-one relations are rendered;
//! - [`CollectionNormalizeMode`] decides how to-many relations are rendered.
//!
//! Every nested call receives a strictly more restrictive mode than its parent, so
//! output depth is bounded by the mode lattice alone.
//!
//! ## Components
//!
//! - [`RelationNormalizer`]: renders one entity and its relations
//! - [`CollectionNormalizer`]: renders the members of a to-many relation
//! - [`EntityNormalizer`]: facade owning the collaborators and process-wide defaults
//! - [`MetadataOracle`] / [`EntityRegistry`]: answers what an entity type declares
//! - [`FieldNormalizer`] / [`SerdeFieldNormalizer`]: renders scalar fields
//!
//! ## Modes
//!
//! | relation mode            | to-one output                                  |
//! |--------------------------|------------------------------------------------|
//! | `Disabled` (default)     | key omitted, flat field path                   |
//! | `OnlyIdentifier`         | primary key                                    |
//! | `OnlyFieldsOfSelf`       | scalar fields                                  |
//! | `SelfPlusOwnCollections` | scalar fields + own collections, one level     |
//! | `Ignored`                | key omitted                                    |
//!
//! | collection mode          | to-many output                                 |
//! |--------------------------|------------------------------------------------|
//! | `Disabled` (default)     | key omitted                                    |
//! | `OnlyIdentifier`         | list of primary keys                           |
//! | `WithoutRelations`       | list of scalar-field records                   |
//! | `Ignored`                | key omitted                                    |
//!
//! ## Feature Flags
//!
//! - `toml` (default): [`NormalizerSettings::from_toml_str`]

pub mod collection;
pub mod context;
pub mod error;
pub mod fields;
pub mod metadata;
pub mod modes;
pub mod normalizer;
pub mod registry;
pub mod relation;
pub mod settings;

#[cfg(test)]
mod test_utils;

pub use collection::CollectionNormalizer;
pub use context::NormalizationContext;
pub use error::{BoxError, ConfigurationError, MetadataError, NormalizerError, Result};
pub use fields::{FieldNormalizer, Record, SerdeFieldNormalizer};
pub use metadata::{Entity, IdentifierValues, MetadataOracle, RelationShape, RelationValue};
pub use modes::{CollectionNormalizeMode, RelationNormalizeMode};
pub use normalizer::EntityNormalizer;
pub use registry::{EntityRegistry, EntitySchema, FieldAccessor, RelationAccessor};
pub use relation::RelationNormalizer;
pub use settings::NormalizerSettings;
