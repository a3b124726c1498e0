use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::Result;
use provrag_config::SemanticProviderConfig;
use provrag_domain::SemanticHit;

pub async fn search(
	cfg: &SemanticProviderConfig,
	query: &str,
	limit: u32,
) -> Result<Vec<SemanticHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"query": query,
		"limit": limit,
		"filters": cfg.filters,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<Vec<SemanticHit>> {
	crate::semantic_hits_from_array(&json, &["results"])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_provider_rank_order() {
		let json = serde_json::json!({
			"results": [
				{ "id": "m-2", "content": "Chain of custody signed.", "entity": "case-1" },
				{ "id": "m-1", "content": "Exhibit photographed." }
			]
		});
		let hits = parse_search_response(json).expect("parse failed");

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].content, "Chain of custody signed.");
		assert_eq!(hits[0].entity.as_deref(), Some("case-1"));
		assert_eq!(hits[1].id.as_deref(), Some("m-1"));
	}

	#[test]
	fn missing_results_is_empty() {
		let hits = parse_search_response(serde_json::json!({ "total": 0 })).expect("parse failed");

		assert!(hits.is_empty());
	}
}
