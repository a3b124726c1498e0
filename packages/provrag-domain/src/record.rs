use serde::{Deserialize, Serialize};

use provrag_config::RetrievalWeights;

use crate::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
	Semantic,
	Graph,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub semantic: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub graph: Option<f32>,
}

/// Byte-exact identity of a record's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey(blake3::Hash);
impl ContentKey {
	pub fn of(content: &str) -> Self {
		Self(blake3::hash(content.as_bytes()))
	}
}

/// A retrieval candidate. The hybrid score is derived from the signals on every mutation and
/// cannot be set directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
	content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	entity: Option<String>,
	source_type: SourceType,
	signals: Signals,
	hybrid_score: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	path_length: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	custody_event_count: Option<u32>,
}
impl Record {
	pub fn semantic(
		content: impl Into<String>,
		entity: Option<String>,
		score: f32,
		weights: &RetrievalWeights,
	) -> Self {
		let signals = Signals { semantic: Some(score), graph: None };

		Self {
			content: content.into(),
			entity,
			source_type: SourceType::Semantic,
			signals,
			hybrid_score: scoring::hybrid_score(signals, weights),
			path_length: None,
			custody_event_count: None,
		}
	}

	pub fn graph(
		content: impl Into<String>,
		entity: Option<String>,
		score: f32,
		path_length: Option<u32>,
		custody_event_count: u32,
		weights: &RetrievalWeights,
	) -> Self {
		let signals = Signals { semantic: None, graph: Some(score) };

		Self {
			content: content.into(),
			entity,
			source_type: SourceType::Graph,
			signals,
			hybrid_score: scoring::hybrid_score(signals, weights),
			path_length,
			custody_event_count: Some(custody_event_count),
		}
	}

	pub fn content(&self) -> &str {
		&self.content
	}

	pub fn entity(&self) -> Option<&str> {
		self.entity.as_deref()
	}

	pub fn source_type(&self) -> SourceType {
		self.source_type
	}

	pub fn signals(&self) -> Signals {
		self.signals
	}

	pub fn hybrid_score(&self) -> f32 {
		self.hybrid_score
	}

	pub fn path_length(&self) -> Option<u32> {
		self.path_length
	}

	pub fn custody_event_count(&self) -> Option<u32> {
		self.custody_event_count
	}

	pub fn key(&self) -> ContentKey {
		ContentKey::of(&self.content)
	}

	/// Folds a graph hit for the same content into this record. The discovering source and
	/// content stay as they are; graph signal and path metadata come from `graph`.
	pub fn absorb_graph(&mut self, graph: &Record, weights: &RetrievalWeights) {
		self.signals.graph = graph.signals.graph;
		self.path_length = graph.path_length;
		self.custody_event_count = graph.custody_event_count;

		if self.entity.is_none() {
			self.entity = graph.entity.clone();
		}

		self.rescore(weights);
	}

	pub fn rescore(&mut self, weights: &RetrievalWeights) {
		self.hybrid_score = scoring::hybrid_score(self.signals, weights);
	}
}
