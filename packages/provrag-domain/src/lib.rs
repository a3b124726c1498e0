pub mod hits;
pub mod provenance;
pub mod record;
pub mod scoring;
pub mod timestamp;

pub use hits::{GraphHit, GraphQuery, SemanticHit};
pub use provenance::{ProvenanceStep, ProvenanceTrail, Relation};
pub use record::{ContentKey, Record, Signals, SourceType};
