use std::time::Instant;

use serde::{Deserialize, Serialize};

use provrag_config::RetrievalWeights;
use provrag_domain::{ProvenanceTrail, Record};
use provrag_graph::GraphStats;

use crate::{
	Error, Result, RetrievalService,
	audit::{AuditEvent, AuditOperation},
	ranking,
};

#[derive(Debug, Clone, Deserialize)]
pub struct HybridSearchRequest {
	pub query: String,
	#[serde(default)]
	pub entity: Option<String>,
	/// Falls back to `retrieval.default_limit`. Signed so non-positive input is reported rather
	/// than rejected by the decoder.
	#[serde(default)]
	pub limit: Option<i64>,
	#[serde(default = "default_include_provenance")]
	pub include_provenance: bool,
	/// Falls back to `retrieval.default_max_graph_depth`.
	#[serde(default)]
	pub max_graph_depth: Option<i64>,
}
impl HybridSearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			entity: None,
			limit: None,
			include_provenance: default_include_provenance(),
			max_graph_depth: None,
		}
	}

	pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
		self.entity = Some(entity.into());

		self
	}

	pub fn with_limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);

		self
	}
}

#[derive(Debug, Clone, PartialEq)]
struct ValidatedHybridRequest {
	query: String,
	entity: Option<String>,
	limit: u32,
	include_provenance: bool,
	max_graph_depth: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HybridResult {
	pub results: Vec<Record>,
	pub provenance: Option<ProvenanceTrail>,
	pub confidence_scores: ConfidenceScores,
	pub result_counts: ResultCounts,
	pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceScores {
	pub semantic_weight: f32,
	pub graph_weight: f32,
	pub average_confidence: f32,
}

/// Candidate counts per source before merging, and the size of the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
	pub semantic: usize,
	pub graph: usize,
	pub hybrid: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalStatus {
	pub semantic_primary: Option<String>,
	pub semantic_secondary: Option<String>,
	pub graph_backend: Option<String>,
	pub provenance_tracking: bool,
	/// Node counts, for backends that can report them cheaply.
	pub graph_stats: Option<GraphStats>,
	pub weights: RetrievalWeights,
}

impl RetrievalService {
	pub async fn hybrid_search(&self, req: HybridSearchRequest) -> Result<HybridResult> {
		let req = self.validate_hybrid_request(req)?;
		let retrieval = &self.cfg.retrieval;
		let weights = &retrieval.weights;
		let semantic_limit = req.limit.saturating_mul(retrieval.semantic_headroom);
		let started = Instant::now();
		let (semantic, graph) = tokio::join!(
			self.semantic_records(&req.query, semantic_limit),
			self.graph_records(&req.query, req.entity.as_deref(), req.max_graph_depth),
		);
		let (semantic, graph) = (semantic?, graph?);
		let mut result_counts =
			ResultCounts { semantic: semantic.len(), graph: graph.len(), hybrid: 0 };
		let merged = ranking::merge_ranked(semantic, graph, req.limit as usize, weights);
		let provenance = match req.entity.as_deref() {
			Some(entity) if req.include_provenance => Some(self.provenance_trail(entity).await),
			_ => None,
		};
		let execution_time_ms = started.elapsed().as_secs_f64() * 1_000.0;

		result_counts.hybrid = merged.records.len();

		self.backends.audit.publish(AuditEvent::new(
			AuditOperation::HybridSearch,
			req.entity.as_deref(),
			result_counts.hybrid,
		));
		tracing::info!(
			entity = req.entity.as_deref().unwrap_or_default(),
			semantic = result_counts.semantic,
			graph = result_counts.graph,
			hybrid = result_counts.hybrid,
			provenance_steps = provenance.as_ref().map(ProvenanceTrail::len).unwrap_or_default(),
			execution_time_ms,
			"Hybrid search completed."
		);

		Ok(HybridResult {
			results: merged.records,
			provenance,
			confidence_scores: ConfidenceScores {
				semantic_weight: weights.semantic,
				graph_weight: weights.graph,
				average_confidence: merged.average_confidence,
			},
			result_counts,
			execution_time_ms,
		})
	}

	pub fn status(&self) -> RetrievalStatus {
		let backends = &self.backends;
		let graph_backend = backends.graph.as_deref().map(|graph| graph.name().to_string());

		RetrievalStatus {
			semantic_primary: backends.semantic_primary.as_deref().map(|p| p.name().to_string()),
			semantic_secondary: backends
				.semantic_secondary
				.as_deref()
				.map(|p| p.name().to_string()),
			provenance_tracking: graph_backend.is_some(),
			graph_backend,
			graph_stats: backends.graph.as_deref().and_then(|graph| graph.stats()),
			weights: self.cfg.retrieval.weights,
		}
	}

	fn validate_hybrid_request(&self, req: HybridSearchRequest) -> Result<ValidatedHybridRequest> {
		let retrieval = &self.cfg.retrieval;
		let query = require_query(&req.query)?.to_string();
		let limit = require_positive("limit", req.limit.unwrap_or(retrieval.default_limit.into()))?;
		let max_graph_depth = require_depth(
			req.max_graph_depth.unwrap_or(retrieval.default_max_graph_depth.into()),
			retrieval.max_graph_depth_cap,
		)?;
		let entity = normalize_entity(req.entity.as_deref()).map(str::to_string);

		Ok(ValidatedHybridRequest {
			query,
			entity,
			limit,
			include_provenance: req.include_provenance,
			max_graph_depth,
		})
	}
}

pub(crate) fn require_query(query: &str) -> Result<&str> {
	if query.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
	}

	Ok(query)
}

pub(crate) fn require_positive(field: &str, value: i64) -> Result<u32> {
	if value <= 0 {
		return Err(Error::InvalidRequest {
			message: format!("{field} must be greater than zero."),
		});
	}

	u32::try_from(value).map_err(|_| Error::InvalidRequest {
		message: format!("{field} must be at most {}.", u32::MAX),
	})
}

/// Traversal depth is rendered into backend queries, so it is bounded by config as well.
pub(crate) fn require_depth(value: i64, cap: u32) -> Result<u32> {
	let depth = require_positive("max_graph_depth", value)?;

	if depth > cap {
		return Err(Error::InvalidRequest {
			message: format!("max_graph_depth must be at most {cap}."),
		});
	}

	Ok(depth)
}

pub(crate) fn normalize_entity(entity: Option<&str>) -> Option<&str> {
	entity.map(str::trim).filter(|entity| !entity.is_empty())
}

fn default_include_provenance() -> bool {
	true
}
