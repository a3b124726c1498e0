//! Publish-only audit stream for retrieval operations.
//!
//! Publishing never blocks and never fails the retrieval that produced the event.

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
	SemanticSearch,
	GraphSearch,
	HybridSearch,
	ProvenanceResolve,
}
impl AuditOperation {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::SemanticSearch => "semantic_search",
			Self::GraphSearch => "graph_search",
			Self::HybridSearch => "hybrid_search",
			Self::ProvenanceResolve => "provenance_resolve",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
	pub operation: AuditOperation,
	pub entity: Option<String>,
	pub result_count: usize,
	#[serde(with = "time::serde::rfc3339")]
	pub recorded_at: OffsetDateTime,
}
impl AuditEvent {
	pub fn new(operation: AuditOperation, entity: Option<&str>, result_count: usize) -> Self {
		Self {
			operation,
			entity: entity.map(str::to_string),
			result_count,
			recorded_at: OffsetDateTime::now_utc(),
		}
	}
}

pub trait AuditSink
where
	Self: Send + Sync,
{
	fn publish(&self, event: AuditEvent);
}

/// Emits each event as a structured log record under the `provrag::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;
impl AuditSink for TracingAuditSink {
	fn publish(&self, event: AuditEvent) {
		tracing::info!(
			target: "provrag::audit",
			operation = event.operation.as_str(),
			entity = event.entity.as_deref().unwrap_or_default(),
			result_count = event.result_count,
			"Retrieval operation recorded."
		);
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;
impl AuditSink for NoopAuditSink {
	fn publish(&self, _event: AuditEvent) {}
}

/// Hands events to an external consumer through a bounded channel. Events are dropped, with a
/// warning, when the consumer lags or has gone away.
#[derive(Debug, Clone)]
pub struct ChannelAuditSink {
	tx: Sender<AuditEvent>,
}
impl ChannelAuditSink {
	pub fn new(tx: Sender<AuditEvent>) -> Self {
		Self { tx }
	}

	pub fn channel(capacity: usize) -> (Self, Receiver<AuditEvent>) {
		let (tx, rx) = mpsc::channel(capacity);

		(Self { tx }, rx)
	}
}
impl AuditSink for ChannelAuditSink {
	fn publish(&self, event: AuditEvent) {
		match self.tx.try_send(event) {
			Ok(()) => {},
			Err(TrySendError::Full(event)) => {
				tracing::warn!(
					operation = event.operation.as_str(),
					"Audit channel is full; dropping event."
				);
			},
			Err(TrySendError::Closed(event)) => {
				tracing::warn!(
					operation = event.operation.as_str(),
					"Audit channel is closed; dropping event."
				);
			},
		}
	}
}
