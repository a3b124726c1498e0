//! Graph collaborator backed by the Neo4j HTTP transactional endpoint.
//!
//! Variable-length bounds cannot be bound as Cypher parameters, so hop limits are rendered into
//! the statement text. They are always integers that have already been validated upstream.

use std::time::Duration;

use reqwest::{Client, header::ACCEPT};
use serde_json::{Map, Value};

use crate::{Error, Result};
use provrag_config::Neo4j;
use provrag_domain::{GraphHit, GraphQuery, ProvenanceStep, Relation, timestamp};

pub type Row = Map<String, Value>;

pub async fn search_memories(
	cfg: &Neo4j,
	query: &GraphQuery,
	global_scan_depth: u32,
) -> Result<Vec<GraphHit>> {
	let (statement, parameters) = match query.entity.as_deref() {
		Some(entity) => (
			entity_scoped_statement(query.max_depth),
			serde_json::json!({ "entity": entity, "query": query.text, "limit": query.limit }),
		),
		None => (
			global_scan_statement(global_scan_depth),
			serde_json::json!({ "query": query.text, "limit": query.limit }),
		),
	};
	let rows = run(cfg, &statement, parameters).await?;

	Ok(rows.iter().map(graph_hit_from_row).collect())
}

pub async fn provenance(
	cfg: &Neo4j,
	entity: &str,
	max_hops: u32,
	max_edges: u32,
) -> Result<Vec<ProvenanceStep>> {
	let statement = provenance_statement(max_hops);
	let parameters = serde_json::json!({ "entity": entity, "limit": max_edges });
	let rows = run(cfg, &statement, parameters).await?;

	Ok(rows.iter().filter_map(provenance_step_from_row).collect())
}

pub async fn run(cfg: &Neo4j, statement: &str, parameters: Value) -> Result<Vec<Row>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/db/{}/tx/commit", cfg.url, cfg.database);
	let body = serde_json::json!({
		"statements": [{ "statement": statement, "parameters": parameters }],
	});
	let res = client
		.post(url)
		.basic_auth(&cfg.user, Some(&cfg.password))
		.header(ACCEPT, "application/json")
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rows(json)
}

fn entity_scoped_statement(max_depth: u32) -> String {
	format!(
		"\
MATCH (start:Entity {{name: $entity}})
MATCH path = (start)-[*1..{max_depth}]-(m:Memory)
WHERE m.content CONTAINS $query
WITH m, min(length(path)) AS path_length
OPTIONAL MATCH (m)-[:CUSTODY_EVENT]->(c:CustodyEvent)
OPTIONAL MATCH (m)-[:RELATES_TO]->(owner:Entity)
RETURN
	m.content AS content,
	head(collect(DISTINCT owner.name)) AS entity,
	path_length,
	count(DISTINCT c) AS custody_event_count,
	toString(m.created_at) AS created_at
ORDER BY path_length ASC, created_at DESC
LIMIT $limit"
	)
}

fn global_scan_statement(depth: u32) -> String {
	format!(
		"\
MATCH (m:Memory)
WHERE m.content CONTAINS $query
OPTIONAL MATCH path = (m)-[:RELATES_TO*1..{depth}]-(e:Entity)
WITH m, min(length(path)) AS path_length, head(collect(DISTINCT e.name)) AS entity
OPTIONAL MATCH (m)-[:CUSTODY_EVENT]->(c:CustodyEvent)
RETURN
	m.content AS content,
	entity,
	path_length,
	count(DISTINCT c) AS custody_event_count,
	toString(m.created_at) AS created_at
ORDER BY created_at DESC
LIMIT $limit"
	)
}

fn provenance_statement(max_hops: u32) -> String {
	let relations = Relation::PROVENANCE.map(Relation::as_str).join("|");

	format!(
		"\
MATCH path = (e:Entity {{name: $entity}})-[:{relations}*1..{max_hops}]->(related)
WITH path, related, last(relationships(path)) AS rel
RETURN
	coalesce(related.id, elementId(related)) AS node_id,
	type(rel) AS relation_type,
	toString(coalesce(rel.timestamp, related.timestamp, related.created_at)) AS timestamp,
	length(path) AS depth
ORDER BY depth ASC
LIMIT $limit"
	)
}

fn parse_rows(json: Value) -> Result<Vec<Row>> {
	if let Some(error) =
		json.get("errors").and_then(Value::as_array).and_then(|errors| errors.first())
	{
		return Err(Error::Cypher {
			code: error.get("code").and_then(Value::as_str).unwrap_or("unknown").to_string(),
			message: error.get("message").and_then(Value::as_str).unwrap_or_default().to_string(),
		});
	}

	let Some(result) =
		json.get("results").and_then(Value::as_array).and_then(|results| results.first())
	else {
		return Err(Error::InvalidResponse {
			message: "Neo4j response is missing results array.".to_string(),
		});
	};
	let columns = result
		.get("columns")
		.and_then(Value::as_array)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Neo4j result is missing columns.".to_string(),
		})?
		.iter()
		.map(|column| column.as_str().unwrap_or_default().to_string())
		.collect::<Vec<_>>();
	let data = result.get("data").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Neo4j result is missing data.".to_string() }
	})?;
	let mut rows = Vec::with_capacity(data.len());

	for item in data {
		let values = item.get("row").and_then(Value::as_array).ok_or_else(|| {
			Error::InvalidResponse { message: "Neo4j data item is missing row.".to_string() }
		})?;

		if values.len() != columns.len() {
			return Err(Error::InvalidResponse {
				message: "Neo4j row width does not match columns.".to_string(),
			});
		}

		rows.push(columns.iter().cloned().zip(values.iter().cloned()).collect::<Row>());
	}

	Ok(rows)
}

fn graph_hit_from_row(row: &Row) -> GraphHit {
	GraphHit {
		content: row_str(row, "content").unwrap_or_default().to_string(),
		entity: row_str(row, "entity").map(str::to_string),
		path_length: row_u32(row, "path_length"),
		custody_event_count: row_u32(row, "custody_event_count").unwrap_or(0),
		created_at: row_str(row, "created_at").and_then(timestamp::parse_rfc3339),
	}
}

fn provenance_step_from_row(row: &Row) -> Option<ProvenanceStep> {
	let node_id = row_str(row, "node_id")?;
	let label = row_str(row, "relation_type")?;
	let Some(relation_type) = Relation::from_label(label) else {
		tracing::warn!(relation_type = label, "Skipping provenance edge with unknown relation.");

		return None;
	};

	Some(ProvenanceStep {
		node_id: node_id.to_string(),
		relation_type,
		timestamp: row_str(row, "timestamp").and_then(timestamp::parse_rfc3339),
		depth: row_u32(row, "depth").unwrap_or(1),
	})
}

fn row_str<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
	row.get(column).and_then(Value::as_str)
}

fn row_u32(row: &Row, column: &str) -> Option<u32> {
	row.get(column).and_then(Value::as_u64).and_then(|value| u32::try_from(value).ok())
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn maps_rows_by_column_name() {
		let json = serde_json::json!({
			"results": [{
				"columns": ["content", "entity", "path_length", "custody_event_count", "created_at"],
				"data": [
					{ "row": ["Seized laptop imaged.", "case-9", 2, 1, "2024-05-01T09:30:00Z"], "meta": [] },
					{ "row": ["Warrant served.", null, null, 0, null], "meta": [] }
				]
			}],
			"errors": []
		});
		let rows = parse_rows(json).expect("parse failed");
		let hits = rows.iter().map(graph_hit_from_row).collect::<Vec<_>>();

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].entity.as_deref(), Some("case-9"));
		assert_eq!(hits[0].path_length, Some(2));
		assert_eq!(hits[0].custody_event_count, 1);
		assert_eq!(hits[0].created_at, Some(datetime!(2024-05-01 09:30 UTC)));
		assert_eq!(hits[1].entity, None);
		assert_eq!(hits[1].path_length, None);
	}

	#[test]
	fn surfaces_cypher_errors() {
		let json = serde_json::json!({
			"results": [],
			"errors": [{ "code": "Neo.ClientError.Statement.SyntaxError", "message": "bad" }]
		});
		let err = parse_rows(json).expect_err("must fail");

		assert!(matches!(
			err,
			Error::Cypher { ref code, .. } if code == "Neo.ClientError.Statement.SyntaxError"
		));
	}

	#[test]
	fn rejects_ragged_rows() {
		let json = serde_json::json!({
			"results": [{ "columns": ["a", "b"], "data": [{ "row": [1] }] }],
			"errors": []
		});

		assert!(matches!(parse_rows(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn provenance_rows_skip_unknown_relations() {
		let mut known = Row::new();

		known.insert("node_id".to_string(), Value::from("custody-1"));
		known.insert("relation_type".to_string(), Value::from("CUSTODY_EVENT"));
		known.insert("timestamp".to_string(), Value::Null);
		known.insert("depth".to_string(), Value::from(1));

		let mut unknown = known.clone();

		unknown.insert("relation_type".to_string(), Value::from("KNOWS"));

		let step = provenance_step_from_row(&known).expect("step expected");

		assert_eq!(step.relation_type, Relation::CustodyEvent);
		assert_eq!(step.timestamp, None);
		assert!(provenance_step_from_row(&unknown).is_none());
	}

	#[test]
	fn statements_render_hop_bounds() {
		assert!(entity_scoped_statement(3).contains("[*1..3]"));
		assert!(global_scan_statement(2).contains("[:RELATES_TO*1..2]"));
		assert!(provenance_statement(5).contains("[:CUSTODY_EVENT|DERIVED_FROM*1..5]"));
	}
}
