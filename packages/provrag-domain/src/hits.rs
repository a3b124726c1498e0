//! Raw collaborator output, before the engine turns it into scored records.

use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
	pub id: Option<String>,
	pub content: String,
	pub entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphHit {
	pub content: String,
	pub entity: Option<String>,
	pub path_length: Option<u32>,
	pub custody_event_count: u32,
	pub created_at: Option<OffsetDateTime>,
}

/// A graph search as handed to a graph backend. `entity: None` selects the shallow global scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQuery {
	pub text: String,
	pub entity: Option<String>,
	pub max_depth: u32,
	pub limit: u32,
}
