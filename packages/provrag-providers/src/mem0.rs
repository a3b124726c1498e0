use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::Result;
use provrag_config::SemanticProviderConfig;
use provrag_domain::SemanticHit;

const DEFAULT_USER_ID: &str = "default";

pub async fn search(
	cfg: &SemanticProviderConfig,
	query: &str,
	limit: u32,
) -> Result<Vec<SemanticHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.query(&build_query_params(cfg, query, limit))
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn build_query_params(
	cfg: &SemanticProviderConfig,
	query: &str,
	limit: u32,
) -> Vec<(String, String)> {
	let mut params = vec![
		("query".to_string(), query.to_string()),
		("user_id".to_string(), cfg.user_id.as_deref().unwrap_or(DEFAULT_USER_ID).to_string()),
		("limit".to_string(), limit.to_string()),
	];

	for (key, value) in &cfg.filters {
		let rendered = match value {
			Value::String(raw) => raw.clone(),
			Value::Null => continue,
			other => other.to_string(),
		};

		params.push((key.clone(), rendered));
	}

	params
}

fn parse_search_response(json: Value) -> Result<Vec<SemanticHit>> {
	crate::semantic_hits_from_array(&json, &["memories", "results"])
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;
	use provrag_config::SemanticProviderKind;

	fn cfg(filters: Map<String, Value>) -> SemanticProviderConfig {
		SemanticProviderConfig {
			kind: SemanticProviderKind::Mem0,
			api_base: "http://localhost".to_string(),
			api_key: "key".to_string(),
			path: "/memories/search".to_string(),
			timeout_ms: 1_000,
			user_id: None,
			filters,
			default_headers: Map::new(),
		}
	}

	#[test]
	fn query_params_default_user_and_flatten_filters() {
		let mut filters = Map::new();

		filters.insert("classification".to_string(), Value::String("general".to_string()));
		filters.insert("min_score".to_string(), serde_json::json!(0.5));
		filters.insert("ignored".to_string(), Value::Null);

		let params = build_query_params(&cfg(filters), "custody", 4);

		assert!(params.contains(&("user_id".to_string(), "default".to_string())));
		assert!(params.contains(&("limit".to_string(), "4".to_string())));
		assert!(params.contains(&("classification".to_string(), "general".to_string())));
		assert!(params.contains(&("min_score".to_string(), "0.5".to_string())));
		assert!(!params.iter().any(|(key, _)| key == "ignored"));
	}

	#[test]
	fn reads_memories_array() {
		let json = serde_json::json!({
			"memories": [{ "id": "a", "memory": "Witness statement filed.", "user_id": "case-3" }]
		});
		let hits = parse_search_response(json).expect("parse failed");

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].content, "Witness statement filed.");
		assert_eq!(hits[0].entity.as_deref(), Some("case-3"));
	}
}
