use provrag_config::RetrievalWeights;
use provrag_domain::{Record, SemanticHit, scoring};

use crate::{
	Error, Result, RetrievalService, SemanticProvider,
	audit::{AuditEvent, AuditOperation},
	search,
};

impl RetrievalService {
	/// Ranked semantic candidates from the primary provider, topped up by the secondary.
	pub async fn semantic_search(&self, query: &str, limit: i64) -> Result<Vec<Record>> {
		let query = search::require_query(query)?;
		let limit = search::require_positive("limit", limit)?;
		let records = self.semantic_records(query, limit).await?;

		self.backends.audit.publish(AuditEvent::new(
			AuditOperation::SemanticSearch,
			None,
			records.len(),
		));

		Ok(records)
	}

	pub(crate) async fn semantic_records(&self, query: &str, limit: u32) -> Result<Vec<Record>> {
		let wanted = limit as usize;
		let mut hits = match self.backends.semantic_primary.as_deref() {
			Some(primary) => self.ask_provider(primary, query, limit).await,
			None => Vec::new(),
		};

		hits.truncate(wanted);

		if hits.len() < wanted
			&& let Some(secondary) = self.backends.semantic_secondary.as_deref()
		{
			let shortfall = wanted - hits.len();
			let mut extra = self.ask_provider(secondary, query, shortfall as u32).await;

			extra.truncate(shortfall);
			hits.extend(extra);
		}

		let weights = &self.cfg.retrieval.weights;

		hits.into_iter()
			.enumerate()
			.map(|(rank, hit)| {
				let score = scoring::rank_score(rank, weights.rank_decay);

				semantic_record(hit, score, weights)
			})
			.collect()
	}

	async fn ask_provider(
		&self,
		provider: &dyn SemanticProvider,
		query: &str,
		limit: u32,
	) -> Vec<SemanticHit> {
		match tokio::time::timeout(self.backend_timeout(), provider.search(query, limit)).await {
			Ok(Ok(hits)) => {
				tracing::debug!(
					provider = provider.name(),
					count = hits.len(),
					"Semantic provider answered."
				);

				hits
			},
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					provider = provider.name(),
					"Semantic provider failed; continuing without its hits."
				);

				Vec::new()
			},
			Err(_) => {
				tracing::warn!(
					provider = provider.name(),
					timeout_ms = self.cfg.retrieval.backend_timeout_ms,
					"Semantic provider timed out; continuing without its hits."
				);

				Vec::new()
			},
		}
	}
}

fn semantic_record(
	hit: SemanticHit,
	score: f32,
	weights: &RetrievalWeights,
) -> Result<Record> {
	if hit.content.is_empty() {
		return Err(Error::Contract {
			backend: "semantic",
			message: format!(
				"hit {} has empty content.",
				hit.id.as_deref().unwrap_or("without id")
			),
		});
	}

	Ok(Record::semantic(hit.content, hit.entity, score, weights))
}
