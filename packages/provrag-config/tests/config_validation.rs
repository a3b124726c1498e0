use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use provrag_config::{Config, Error, GraphBackendKind, SemanticProviderKind};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

static NEXT_CONFIG_ID: AtomicU64 = AtomicU64::new(0);

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn with_table<'a>(value: &'a mut Value, path: &[&str]) -> &'a mut toml::Table {
	let mut table = value.as_table_mut().expect("Template config must be a table.");

	for key in path {
		table = table
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	table
}

fn write_config(value: &Value) -> PathBuf {
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock is before epoch.");
	let id = NEXT_CONFIG_ID.fetch_add(1, Ordering::SeqCst);
	let path = env::temp_dir().join(format!(
		"provrag_config_test_{}_{}_{id}.toml",
		std::process::id(),
		nanos.as_nanos()
	));
	let rendered = toml::to_string(value).expect("Failed to render config.");

	fs::write(&path, rendered).expect("Failed to write config.");

	path
}

fn load_value(value: &Value) -> provrag_config::Result<Config> {
	let path = write_config(value);
	let result = provrag_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove config.");

	result
}

fn validation_message(result: provrag_config::Result<Config>) -> String {
	match result {
		Err(Error::Validation { message }) => message,
		Err(other) => panic!("Expected validation error, got {other:?}."),
		Ok(_) => panic!("Expected validation error, got a config."),
	}
}

#[test]
fn loads_and_normalizes_sample_config() {
	let cfg = load_value(&sample_value()).expect("Sample config must load.");
	let primary = cfg.providers.semantic_primary.as_ref().expect("Primary provider missing.");
	let secondary = cfg.providers.semantic_secondary.as_ref().expect("Secondary provider missing.");
	let neo4j = cfg.graph.neo4j.as_ref().expect("Neo4j config missing.");

	assert_eq!(primary.kind, SemanticProviderKind::Supermemory);
	assert_eq!(primary.api_base, "https://api.supermemory.ai");
	assert_eq!(secondary.kind, SemanticProviderKind::Mem0);
	assert_eq!(secondary.user_id, None);
	assert_eq!(cfg.graph.backend, GraphBackendKind::Neo4j);
	assert_eq!(neo4j.url, "http://localhost:7474");
	assert_eq!(neo4j.database, "neo4j");
	assert_eq!(cfg.retrieval.semantic_headroom, 2);
	assert_eq!(cfg.retrieval.provenance_max_edges, 50);
}

#[test]
fn minimal_config_uses_documented_defaults() {
	let cfg: Config = toml::from_str("").expect("Empty config must parse.");

	provrag_config::validate(&cfg).expect("Defaults must validate.");

	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.graph.backend, GraphBackendKind::None);
	assert!(cfg.providers.semantic_primary.is_none());
	assert_eq!(cfg.retrieval.default_limit, 10);
	assert_eq!(cfg.retrieval.default_max_graph_depth, 3);
	assert_eq!(cfg.retrieval.max_graph_depth_cap, 10);
	assert_eq!(cfg.retrieval.provenance_max_hops, 5);
	assert_eq!(cfg.retrieval.weights.semantic, 0.6);
	assert_eq!(cfg.retrieval.weights.graph, 0.4);
	assert_eq!(cfg.retrieval.weights.graph_only_bonus, 0.3);
	assert_eq!(cfg.retrieval.weights.custody_bonus, 0.2);
	assert_eq!(cfg.retrieval.weights.rank_decay, 0.1);
}

#[test]
fn neo4j_backend_requires_connection_section() {
	let mut value = sample_value();

	with_table(&mut value, &["graph"]).remove("neo4j");

	assert_eq!(
		validation_message(load_value(&value)),
		"graph.neo4j must be set when graph.backend is neo4j."
	);
}

#[test]
fn memory_backend_ignores_missing_neo4j_section() {
	let mut value = sample_value();
	let graph = with_table(&mut value, &["graph"]);

	graph.remove("neo4j");
	graph.insert("backend".to_string(), Value::String("memory".to_string()));

	let cfg = load_value(&value).expect("Memory backend must load.");

	assert_eq!(cfg.graph.backend, GraphBackendKind::Memory);
}

#[test]
fn rejects_zero_retrieval_bounds() {
	for key in [
		"default_limit",
		"default_max_graph_depth",
		"max_graph_depth_cap",
		"provenance_max_edges",
	] {
		let mut value = sample_value();

		with_table(&mut value, &["retrieval"]).insert(key.to_string(), Value::Integer(0));

		assert_eq!(
			validation_message(load_value(&value)),
			format!("retrieval.{key} must be greater than zero.")
		);
	}
}

#[test]
fn default_depth_must_fit_under_cap() {
	let mut value = sample_value();
	let retrieval = with_table(&mut value, &["retrieval"]);

	retrieval.insert("default_max_graph_depth".to_string(), Value::Integer(6));
	retrieval.insert("max_graph_depth_cap".to_string(), Value::Integer(5));

	assert_eq!(
		validation_message(load_value(&value)),
		"retrieval.default_max_graph_depth must not exceed retrieval.max_graph_depth_cap."
	);
}

#[test]
fn rejects_zero_backend_timeout() {
	let mut value = sample_value();

	with_table(&mut value, &["retrieval"])
		.insert("backend_timeout_ms".to_string(), Value::Integer(0));

	assert_eq!(
		validation_message(load_value(&value)),
		"retrieval.backend_timeout_ms must be greater than zero."
	);
}

#[test]
fn rejects_negative_and_non_finite_weights() {
	let mut value = sample_value();

	with_table(&mut value, &["retrieval", "weights"])
		.insert("custody_bonus".to_string(), Value::Float(-0.2));

	assert_eq!(
		validation_message(load_value(&value)),
		"retrieval.weights.custody_bonus must be zero or greater."
	);

	let mut value = sample_value();

	with_table(&mut value, &["retrieval", "weights"])
		.insert("semantic".to_string(), Value::Float(f64::NAN));

	assert_eq!(
		validation_message(load_value(&value)),
		"retrieval.weights.semantic must be a finite number."
	);
}

#[test]
fn rejects_blank_provider_key() {
	let mut value = sample_value();

	with_table(&mut value, &["providers", "semantic_primary"])
		.insert("api_key".to_string(), Value::String("  ".to_string()));

	assert_eq!(
		validation_message(load_value(&value)),
		"providers.semantic_primary.api_key must be non-empty."
	);
}

#[test]
fn secondary_provider_requires_primary() {
	let mut value = sample_value();

	with_table(&mut value, &["providers"]).remove("semantic_primary");

	assert_eq!(
		validation_message(load_value(&value)),
		"providers.semantic_secondary requires providers.semantic_primary."
	);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("provrag_config_missing_file.toml");
	let err = provrag_config::load(&path).expect_err("Missing file must fail.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
