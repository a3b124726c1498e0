use provrag_domain::ProvenanceTrail;

use crate::{
	RetrievalService,
	audit::{AuditEvent, AuditOperation},
};

impl RetrievalService {
	/// Custody and derivation history reachable from `entity`, shallowest first.
	///
	/// Never fails: an unknown entity, a missing backend, or a backend error all yield an empty
	/// trail.
	pub async fn resolve_provenance(&self, entity: &str) -> ProvenanceTrail {
		let trail = self.provenance_trail(entity).await;

		self.backends.audit.publish(AuditEvent::new(
			AuditOperation::ProvenanceResolve,
			Some(entity),
			trail.len(),
		));

		trail
	}

	pub(crate) async fn provenance_trail(&self, entity: &str) -> ProvenanceTrail {
		let entity = entity.trim();

		if entity.is_empty() {
			return ProvenanceTrail::default();
		}

		let Some(backend) = self.backends.graph.as_deref() else {
			return ProvenanceTrail::default();
		};
		let retrieval = &self.cfg.retrieval;
		let pending = backend.provenance(
			entity,
			retrieval.provenance_max_hops,
			retrieval.provenance_max_edges,
		);
		let mut steps = match tokio::time::timeout(self.backend_timeout(), pending).await {
			Ok(Ok(steps)) => steps,
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					backend = backend.name(),
					entity,
					"Provenance lookup failed; returning an empty trail."
				);

				return ProvenanceTrail::default();
			},
			Err(_) => {
				tracing::warn!(
					backend = backend.name(),
					entity,
					timeout_ms = retrieval.backend_timeout_ms,
					"Provenance lookup timed out; returning an empty trail."
				);

				return ProvenanceTrail::default();
			},
		};

		steps.retain(|step| {
			step.relation_type.is_provenance() && step.depth <= retrieval.provenance_max_hops
		});
		steps.sort_by_key(|step| step.depth);
		steps.truncate(retrieval.provenance_max_edges as usize);

		ProvenanceTrail::new(steps)
	}
}
