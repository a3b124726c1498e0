use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Relationship labels understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
	RelatesTo,
	CustodyEvent,
	DerivedFrom,
}
impl Relation {
	pub const PROVENANCE: [Relation; 2] = [Relation::CustodyEvent, Relation::DerivedFrom];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::RelatesTo => "RELATES_TO",
			Self::CustodyEvent => "CUSTODY_EVENT",
			Self::DerivedFrom => "DERIVED_FROM",
		}
	}

	pub fn from_label(label: &str) -> Option<Self> {
		match label {
			"RELATES_TO" => Some(Self::RelatesTo),
			"CUSTODY_EVENT" => Some(Self::CustodyEvent),
			"DERIVED_FROM" => Some(Self::DerivedFrom),
			_ => None,
		}
	}

	pub fn is_provenance(self) -> bool {
		Self::PROVENANCE.contains(&self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceStep {
	pub node_id: String,
	pub relation_type: Relation,
	#[serde(with = "crate::timestamp", default)]
	pub timestamp: Option<OffsetDateTime>,
	/// Hops from the root entity, starting at 1.
	pub depth: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceTrail {
	pub steps: Vec<ProvenanceStep>,
}
impl ProvenanceTrail {
	pub fn new(steps: Vec<ProvenanceStep>) -> Self {
		Self { steps }
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}
}
