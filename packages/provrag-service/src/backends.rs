use std::sync::Arc;

use provrag_config::{
	Config, GraphBackendKind, Neo4j, SemanticProviderConfig, SemanticProviderKind,
};
use provrag_domain::{GraphHit, GraphQuery, ProvenanceStep, SemanticHit};
use provrag_graph::{GraphStats, MemoryGraph};
use provrag_providers::{mem0, neo4j, supermemory};

use crate::{
	BoxFuture, GraphBackend, SemanticProvider,
	audit::{AuditSink, TracingAuditSink},
};

/// The collaborators one service instance talks to.
#[derive(Clone)]
pub struct Backends {
	pub semantic_primary: Option<Arc<dyn SemanticProvider>>,
	/// Consulted only for the shortfall left by the primary.
	pub semantic_secondary: Option<Arc<dyn SemanticProvider>>,
	pub graph: Option<Arc<dyn GraphBackend>>,
	pub audit: Arc<dyn AuditSink>,
}
impl Backends {
	pub fn from_config(cfg: &Config) -> Self {
		let semantic = |provider: &Option<SemanticProviderConfig>| {
			provider.clone().map(|cfg| {
				Arc::new(HttpSemanticProvider::new(cfg)) as Arc<dyn SemanticProvider>
			})
		};
		let graph = match cfg.graph.backend {
			GraphBackendKind::None => None,
			GraphBackendKind::Memory => {
				let graph = EmbeddedGraph::new(Arc::new(MemoryGraph::new()));

				Some(Arc::new(graph) as Arc<dyn GraphBackend>)
			},
			GraphBackendKind::Neo4j => cfg
				.graph
				.neo4j
				.clone()
				.map(|neo4j| Arc::new(Neo4jBackend::new(neo4j)) as Arc<dyn GraphBackend>),
		};

		Self {
			semantic_primary: semantic(&cfg.providers.semantic_primary),
			semantic_secondary: semantic(&cfg.providers.semantic_secondary),
			graph,
			audit: Arc::new(TracingAuditSink),
		}
	}

	pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
		self.audit = audit;

		self
	}
}
impl Default for Backends {
	fn default() -> Self {
		Self {
			semantic_primary: None,
			semantic_secondary: None,
			graph: None,
			audit: Arc::new(TracingAuditSink),
		}
	}
}

/// Semantic provider speaking either the SuperMemory or the Mem0 HTTP API.
pub struct HttpSemanticProvider {
	cfg: SemanticProviderConfig,
}
impl HttpSemanticProvider {
	pub fn new(cfg: SemanticProviderConfig) -> Self {
		Self { cfg }
	}
}
impl SemanticProvider for HttpSemanticProvider {
	fn name(&self) -> &str {
		self.cfg.kind.as_str()
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SemanticHit>>> {
		Box::pin(async move {
			let hits = match self.cfg.kind {
				SemanticProviderKind::Supermemory =>
					supermemory::search(&self.cfg, query, limit).await?,
				SemanticProviderKind::Mem0 => mem0::search(&self.cfg, query, limit).await?,
			};

			Ok(hits)
		})
	}
}

pub struct Neo4jBackend {
	cfg: Neo4j,
}
impl Neo4jBackend {
	pub fn new(cfg: Neo4j) -> Self {
		Self { cfg }
	}
}
impl GraphBackend for Neo4jBackend {
	fn name(&self) -> &str {
		GraphBackendKind::Neo4j.as_str()
	}

	fn search<'a>(
		&'a self,
		query: &'a GraphQuery,
		global_scan_depth: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphHit>>> {
		Box::pin(async move {
			Ok(neo4j::search_memories(&self.cfg, query, global_scan_depth).await?)
		})
	}

	fn provenance<'a>(
		&'a self,
		entity: &'a str,
		max_hops: u32,
		max_edges: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ProvenanceStep>>> {
		Box::pin(async move {
			Ok(neo4j::provenance(&self.cfg, entity, max_hops, max_edges).await?)
		})
	}
}

/// Serves an in-process [`MemoryGraph`]. Traversals run on the blocking pool so the engine's
/// per-call timeout can abandon them.
#[derive(Debug, Clone)]
pub struct EmbeddedGraph {
	graph: Arc<MemoryGraph>,
}
impl EmbeddedGraph {
	pub fn new(graph: Arc<MemoryGraph>) -> Self {
		Self { graph }
	}
}
impl GraphBackend for EmbeddedGraph {
	fn name(&self) -> &str {
		GraphBackendKind::Memory.as_str()
	}

	fn search<'a>(
		&'a self,
		query: &'a GraphQuery,
		global_scan_depth: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphHit>>> {
		let graph = Arc::clone(&self.graph);
		let query = query.clone();

		Box::pin(async move {
			let hits =
				tokio::task::spawn_blocking(move || graph.search(&query, global_scan_depth)).await?;

			Ok(hits)
		})
	}

	fn provenance<'a>(
		&'a self,
		entity: &'a str,
		max_hops: u32,
		max_edges: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ProvenanceStep>>> {
		let graph = Arc::clone(&self.graph);
		let entity = entity.to_string();

		Box::pin(async move {
			let steps = tokio::task::spawn_blocking(move || {
				graph.provenance(&entity, max_hops, max_edges)
			})
			.await?;

			Ok(steps)
		})
	}

	fn stats(&self) -> Option<GraphStats> {
		Some(self.graph.stats())
	}
}
