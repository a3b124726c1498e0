pub mod mem0;
pub mod neo4j;
pub mod supermemory;

mod error;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

use provrag_domain::SemanticHit;

const CONTENT_FIELDS: [&str; 3] = ["content", "memory", "text"];
const ENTITY_FIELDS: [&str; 2] = ["entity", "user_id"];

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};
		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}
	Ok(headers)
}

/// Maps one provider result object onto a hit. Providers disagree on field names, so the first
/// present of each alias wins. A missing content field yields an empty content string and is left
/// for the caller to reject.
pub(crate) fn semantic_hit_from_value(item: &Value) -> Result<SemanticHit> {
	let Some(object) = item.as_object() else {
		return Err(Error::InvalidResponse {
			message: "Search result item must be an object.".to_string(),
		});
	};
	let content = CONTENT_FIELDS
		.iter()
		.find_map(|field| object.get(*field).and_then(Value::as_str))
		.unwrap_or_default()
		.to_string();
	let entity = ENTITY_FIELDS
		.iter()
		.find_map(|field| object.get(*field).and_then(Value::as_str))
		.or_else(|| {
			object
				.get("metadata")
				.and_then(|metadata| metadata.get("entity"))
				.and_then(Value::as_str)
		})
		.map(str::to_string);
	let id = match object.get("id") {
		Some(Value::String(raw)) => Some(raw.clone()),
		Some(Value::Number(raw)) => Some(raw.to_string()),
		_ => None,
	};

	Ok(SemanticHit { id, content, entity })
}

pub(crate) fn semantic_hits_from_array(json: &Value, fields: &[&str]) -> Result<Vec<SemanticHit>> {
	if !json.is_object() {
		return Err(Error::InvalidResponse {
			message: "Search response must be a JSON object.".to_string(),
		});
	}

	let Some(items) = fields.iter().find_map(|field| json.get(*field).and_then(Value::as_array))
	else {
		tracing::debug!(fields = ?fields, "Search response carries no result array.");

		return Ok(Vec::new());
	};

	items.iter().map(semantic_hit_from_value).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_content_aliases_and_nested_entity() {
		let item = serde_json::json!({
			"id": 42,
			"memory": "Custody transfer to lab.",
			"metadata": { "entity": "case-7" }
		});
		let hit = semantic_hit_from_value(&item).expect("parse failed");

		assert_eq!(hit.id.as_deref(), Some("42"));
		assert_eq!(hit.content, "Custody transfer to lab.");
		assert_eq!(hit.entity.as_deref(), Some("case-7"));
	}

	#[test]
	fn missing_content_is_left_empty() {
		let hit = semantic_hit_from_value(&serde_json::json!({ "id": "x" })).expect("parse failed");

		assert!(hit.content.is_empty());
	}

	#[test]
	fn rejects_non_object_items() {
		let err = semantic_hit_from_value(&serde_json::json!("text")).expect_err("must fail");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}
}
