use provrag_domain::{GraphHit, GraphQuery, Record, scoring};

use crate::{
	Error, Result, RetrievalService,
	audit::{AuditEvent, AuditOperation},
	search,
};

impl RetrievalService {
	/// Graph candidates scoped to `entity` when one is given, otherwise from the global scan.
	pub async fn graph_search(
		&self,
		query: &str,
		entity: Option<&str>,
		max_depth: i64,
	) -> Result<Vec<Record>> {
		let query = search::require_query(query)?;
		let max_depth = search::require_depth(max_depth, self.cfg.retrieval.max_graph_depth_cap)?;
		let entity = search::normalize_entity(entity);
		let records = self.graph_records(query, entity, max_depth).await?;

		self.backends.audit.publish(AuditEvent::new(
			AuditOperation::GraphSearch,
			entity,
			records.len(),
		));

		Ok(records)
	}

	pub(crate) async fn graph_records(
		&self,
		query: &str,
		entity: Option<&str>,
		max_depth: u32,
	) -> Result<Vec<Record>> {
		let Some(backend) = self.backends.graph.as_deref() else {
			tracing::debug!("No graph backend configured; skipping graph search.");

			return Ok(Vec::new());
		};
		let retrieval = &self.cfg.retrieval;
		let graph_query = GraphQuery {
			text: query.to_string(),
			entity: entity.map(str::to_string),
			max_depth,
			limit: retrieval.graph_candidate_limit,
		};
		let pending = backend.search(&graph_query, retrieval.global_scan_depth);
		let mut hits = match tokio::time::timeout(self.backend_timeout(), pending).await {
			Ok(Ok(hits)) => hits,
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					backend = backend.name(),
					"Graph search failed; continuing without graph hits."
				);

				return Ok(Vec::new());
			},
			Err(_) => {
				tracing::warn!(
					backend = backend.name(),
					timeout_ms = retrieval.backend_timeout_ms,
					"Graph search timed out; continuing without graph hits."
				);

				return Ok(Vec::new());
			},
		};

		hits.truncate(retrieval.graph_candidate_limit as usize);

		hits.into_iter().map(|hit| self.graph_record(hit)).collect()
	}

	fn graph_record(&self, hit: GraphHit) -> Result<Record> {
		if hit.content.is_empty() {
			return Err(Error::Contract {
				backend: "graph",
				message: "memory node has empty content.".to_string(),
			});
		}

		let weights = &self.cfg.retrieval.weights;
		let score =
			scoring::graph_score(hit.path_length, hit.custody_event_count, weights.custody_bonus);

		Ok(Record::graph(
			hit.content,
			hit.entity,
			score,
			hit.path_length,
			hit.custody_event_count,
			weights,
		))
	}
}
