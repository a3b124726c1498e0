pub mod audit;
pub mod backends;
pub mod graph;
pub mod provenance;
pub mod ranking;
pub mod search;
pub mod semantic;

mod error;

pub use audit::{
	AuditEvent, AuditOperation, AuditSink, ChannelAuditSink, NoopAuditSink, TracingAuditSink,
};
pub use backends::{Backends, EmbeddedGraph, HttpSemanticProvider, Neo4jBackend};
pub use error::{Error, Result};
pub use search::{
	ConfidenceScores, HybridResult, HybridSearchRequest, ResultCounts, RetrievalStatus,
};

use std::{future::Future, pin::Pin, time::Duration};

use provrag_config::Config;
use provrag_domain::{GraphHit, GraphQuery, ProvenanceStep, SemanticHit};
use provrag_graph::GraphStats;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait SemanticProvider
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SemanticHit>>>;
}

pub trait GraphBackend
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	fn search<'a>(
		&'a self,
		query: &'a GraphQuery,
		global_scan_depth: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphHit>>>;

	fn provenance<'a>(
		&'a self,
		entity: &'a str,
		max_hops: u32,
		max_edges: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ProvenanceStep>>>;

	fn stats(&self) -> Option<GraphStats> {
		None
	}
}

/// Hybrid retrieval over the configured semantic providers and graph backend.
///
/// Holds no per-request state; share it behind an `Arc` across concurrent callers.
pub struct RetrievalService {
	pub cfg: Config,
	pub backends: Backends,
}
impl RetrievalService {
	pub fn new(cfg: Config, backends: Backends) -> Self {
		Self { cfg, backends }
	}

	pub fn from_config(cfg: Config) -> Self {
		let backends = Backends::from_config(&cfg);

		Self { cfg, backends }
	}

	pub(crate) fn backend_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.retrieval.backend_timeout_ms)
	}
}
