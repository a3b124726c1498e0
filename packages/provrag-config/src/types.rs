use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	#[serde(default)]
	pub providers: Providers,
	#[serde(default)]
	pub graph: Graph,
	#[serde(default)]
	pub retrieval: Retrieval,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Providers {
	/// Queried first for every semantic search.
	pub semantic_primary: Option<SemanticProviderConfig>,
	/// Only queried for the shortfall when the primary returns fewer hits than requested.
	pub semantic_secondary: Option<SemanticProviderConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticProviderKind {
	Supermemory,
	Mem0,
}
impl SemanticProviderKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Supermemory => "supermemory",
			Self::Mem0 => "mem0",
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticProviderConfig {
	pub kind: SemanticProviderKind,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	/// Mem0 partitions memories by user; SuperMemory ignores it.
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub filters: Map<String, Value>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackendKind {
	#[default]
	None,
	Memory,
	Neo4j,
}
impl GraphBackendKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Memory => "memory",
			Self::Neo4j => "neo4j",
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Graph {
	pub backend: GraphBackendKind,
	pub neo4j: Option<Neo4j>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Neo4j {
	pub url: String,
	#[serde(default = "default_neo4j_database")]
	pub database: String,
	pub user: String,
	pub password: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub default_limit: u32,
	pub default_max_graph_depth: u32,
	/// Largest traversal depth a request may ask for.
	pub max_graph_depth_cap: u32,
	/// Semantic candidates requested per result slot.
	pub semantic_headroom: u32,
	pub graph_candidate_limit: u32,
	pub global_scan_depth: u32,
	pub provenance_max_hops: u32,
	pub provenance_max_edges: u32,
	/// Upper bound for any single backend call made by the engine.
	pub backend_timeout_ms: u64,
	pub weights: RetrievalWeights,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			default_limit: 10,
			default_max_graph_depth: 3,
			max_graph_depth_cap: 10,
			semantic_headroom: 2,
			graph_candidate_limit: 20,
			global_scan_depth: 2,
			provenance_max_hops: 5,
			provenance_max_edges: 50,
			backend_timeout_ms: 5_000,
			weights: RetrievalWeights::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalWeights {
	pub semantic: f32,
	pub graph: f32,
	pub graph_only_bonus: f32,
	pub custody_bonus: f32,
	pub rank_decay: f32,
}
impl Default for RetrievalWeights {
	fn default() -> Self {
		Self {
			semantic: 0.6,
			graph: 0.4,
			graph_only_bonus: 0.3,
			custody_bonus: 0.2,
			rank_decay: 0.1,
		}
	}
}

fn default_neo4j_database() -> String {
	"neo4j".to_string()
}
