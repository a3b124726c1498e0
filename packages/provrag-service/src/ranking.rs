use std::collections::{HashMap, hash_map::Entry};

use provrag_config::RetrievalWeights;
use provrag_domain::{ContentKey, Record, scoring};

#[derive(Debug, Clone)]
pub struct MergeOutcome {
	pub records: Vec<Record>,
	pub average_confidence: f32,
}

/// Deduplicates both candidate lists by content, blends signals for content found by both
/// sources, then keeps the `limit` best by hybrid score.
///
/// Semantic records are placed first so ties resolve in favour of semantic discovery. Within one
/// source the first occurrence of a content wins.
pub fn merge_ranked(
	semantic: Vec<Record>,
	graph: Vec<Record>,
	limit: usize,
	weights: &RetrievalWeights,
) -> MergeOutcome {
	let mut merged = Vec::with_capacity(semantic.len() + graph.len());
	let mut positions: HashMap<ContentKey, usize> = HashMap::new();

	for record in semantic {
		if let Entry::Vacant(slot) = positions.entry(record.key()) {
			slot.insert(merged.len());
			merged.push(record);
		}
	}
	for record in graph {
		match positions.entry(record.key()) {
			Entry::Occupied(slot) => {
				let existing: &mut Record = &mut merged[*slot.get()];

				if existing.signals().graph.is_none() {
					existing.absorb_graph(&record, weights);
				}
			},
			Entry::Vacant(slot) => {
				slot.insert(merged.len());
				merged.push(record);
			},
		}
	}

	// Stable, so equal scores keep insertion order.
	merged.sort_by(|a, b| b.hybrid_score().total_cmp(&a.hybrid_score()));
	merged.truncate(limit);

	let scores = merged.iter().map(Record::hybrid_score).collect::<Vec<_>>();
	let average_confidence = scoring::average_confidence(&scores);

	MergeOutcome { records: merged, average_confidence }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn contents(records: &[Record]) -> Vec<&str> {
		records.iter().map(Record::content).collect()
	}

	#[test]
	fn blends_shared_content_and_orders_by_hybrid_score() {
		let weights = RetrievalWeights::default();
		let semantic = vec![
			Record::semantic("A", None, 1.0, &weights),
			Record::semantic("B", None, 0.5, &weights),
		];
		let graph = vec![
			Record::graph("A", None, 0.5, Some(1), 0, &weights),
			Record::graph("C", None, 0.8, Some(0), 0, &weights),
		];
		let outcome = merge_ranked(semantic, graph, 10, &weights);

		assert_eq!(contents(&outcome.records), vec!["A", "C", "B"]);
		assert!((outcome.records[0].hybrid_score() - 0.8).abs() < 1e-6);
		assert!((outcome.records[1].hybrid_score() - 0.62).abs() < 1e-6);
		assert!((outcome.records[2].hybrid_score() - 0.3).abs() < 1e-6);
		assert!((outcome.average_confidence - (0.8 + 0.62 + 0.3) / 3.0).abs() < 1e-6);
	}

	#[test]
	fn first_occurrence_wins_within_a_source() {
		let weights = RetrievalWeights::default();
		let semantic = vec![
			Record::semantic("A", Some("first".to_string()), 1.0, &weights),
			Record::semantic("A", Some("second".to_string()), 0.9, &weights),
		];
		let graph = vec![
			Record::graph("G", None, 0.5, Some(1), 0, &weights),
			Record::graph("G", None, 1.2, Some(0), 3, &weights),
		];
		let outcome = merge_ranked(semantic, graph, 10, &weights);

		assert_eq!(outcome.records.len(), 2);
		assert_eq!(outcome.records[0].entity(), Some("first"));
		assert_eq!(outcome.records[1].path_length(), Some(1));
	}

	#[test]
	fn ties_keep_semantic_before_graph() {
		let weights = RetrievalWeights::default();
		// 0.5 * 0.6 == 0.0 * 0.4 + 0.3
		let semantic = vec![Record::semantic("S", None, 0.5, &weights)];
		let graph = vec![Record::graph("G", None, 0.0, None, 0, &weights)];
		let outcome = merge_ranked(semantic, graph, 10, &weights);

		assert_eq!(contents(&outcome.records), vec!["S", "G"]);
	}

	#[test]
	fn truncates_before_averaging() {
		let weights = RetrievalWeights::default();
		let semantic = (0..5)
			.map(|rank| {
				Record::semantic(
					format!("doc-{rank}"),
					None,
					scoring::rank_score(rank, weights.rank_decay),
					&weights,
				)
			})
			.collect::<Vec<_>>();
		let outcome = merge_ranked(semantic, Vec::new(), 2, &weights);

		assert_eq!(contents(&outcome.records), vec!["doc-0", "doc-1"]);
		assert!((outcome.average_confidence - (0.6 + 0.54) / 2.0).abs() < 1e-6);
	}

	#[test]
	fn empty_inputs_average_to_zero() {
		let outcome = merge_ranked(Vec::new(), Vec::new(), 10, &RetrievalWeights::default());

		assert!(outcome.records.is_empty());
		assert_eq!(outcome.average_confidence, 0.0);
	}
}
