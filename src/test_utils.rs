//! In-memory entities for unit tests

use crate::metadata::{Entity, RelationValue};
use crate::registry::{EntityRegistry, EntitySchema};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};

/// Hydrated row of any entity type
#[derive(Debug)]
pub(crate) struct Row {
	kind: &'static str,
	fields: Map<String, Value>,
	links: OnceLock<IndexMap<String, Link>>,
}

#[derive(Debug)]
pub(crate) enum Link {
	One(Option<Arc<Row>>),
	Many(Vec<Arc<Row>>),
}

impl Row {
	pub(crate) fn new(kind: &'static str, fields: Value) -> Self {
		let fields = match fields {
			Value::Object(map) => map,
			other => panic!("row fields must be an object, got {other}"),
		};
		Self {
			kind,
			fields,
			links: OnceLock::new(),
		}
	}

	pub(crate) fn with_one(mut self, name: &str, target: Option<Row>) -> Self {
		self.links_mut()
			.insert(name.to_string(), Link::One(target.map(Arc::new)));
		self
	}

	pub(crate) fn with_many(mut self, name: &str, targets: Vec<Row>) -> Self {
		self.links_mut().insert(
			name.to_string(),
			Link::Many(targets.into_iter().map(Arc::new).collect()),
		);
		self
	}

	/// Attach links after the row is shared, allowing reference cycles
	pub(crate) fn tie(&self, links: Vec<(&str, Link)>) {
		let links = links
			.into_iter()
			.map(|(name, link)| (name.to_string(), link))
			.collect();
		self.links
			.set(links)
			.expect("links can only be tied once");
	}

	fn links_mut(&mut self) -> &mut IndexMap<String, Link> {
		if self.links.get().is_none() {
			let _ = self.links.set(IndexMap::new());
		}
		self.links.get_mut().expect("links initialized above")
	}
}

impl Entity for Row {
	fn entity_type(&self) -> &str {
		self.kind
	}
}

impl Serialize for Row {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.fields.serialize(serializer)
	}
}

pub(crate) fn row_field(row: &Row, name: &str) -> Option<Value> {
	row.fields.get(name).cloned()
}

pub(crate) fn row_relation<'e>(row: &'e Row, name: &str) -> Option<RelationValue<'e, Row>> {
	let link = row.links.get()?.get(name)?;
	Some(match link {
		Link::One(target) => RelationValue::One(target.as_deref()),
		Link::Many(targets) => RelationValue::Many(targets.iter().map(Arc::as_ref).collect()),
	})
}

fn schema(entity_type: &str) -> EntitySchema<Row> {
	EntitySchema::new(entity_type, row_field, row_relation)
}

/// Author -> Publisher (to-one), Author -> Book (to-many),
/// Book -> Author (to-one), Book -> Review (to-many), Publisher -> Author (to-many)
pub(crate) fn library_registry() -> EntityRegistry<Row> {
	let mut registry = EntityRegistry::new();
	registry
		.register(
			schema("Author")
				.fields_from(["id", "name"])
				.to_one("publisher")
				.to_many("books"),
		)
		.unwrap();
	registry
		.register(
			schema("Book")
				.fields_from(["id", "title"])
				.to_one("author")
				.to_many("reviews"),
		)
		.unwrap();
	registry
		.register(
			schema("Publisher")
				.fields_from(["id", "name"])
				.to_many("authors"),
		)
		.unwrap();
	registry
		.register(schema("Review").fields_from(["id", "stars"]))
		.unwrap();
	registry
		.register(
			schema("Node")
				.fields_from(["id"])
				.to_one("parent")
				.to_many("children"),
		)
		.unwrap();
	registry
}

pub(crate) fn review(id: i64, stars: i64) -> Row {
	Row::new("Review", serde_json::json!({"id": id, "stars": stars}))
}

/// Book without a back-reference to its author
pub(crate) fn book(id: i64, title: &str, reviews: Vec<Row>) -> Row {
	Row::new("Book", serde_json::json!({"id": id, "title": title}))
		.with_one("author", None)
		.with_many("reviews", reviews)
}

/// Publisher with an empty author list
pub(crate) fn publisher(id: i64, name: &str) -> Row {
	Row::new("Publisher", serde_json::json!({"id": id, "name": name})).with_many("authors", vec![])
}

/// Author{1, "A"} published by Publisher{5, "P"} with books 10 and 11
pub(crate) fn author() -> Row {
	Row::new("Author", serde_json::json!({"id": 1, "name": "A"}))
		.with_one("publisher", Some(publisher(5, "P")))
		.with_many(
			"books",
			vec![
				book(10, "T1", vec![review(100, 5)]),
				book(11, "T2", vec![]),
			],
		)
}
