use provrag_config::RetrievalWeights;

use crate::record::Signals;

/// Path length assumed for graph hits that carry none.
pub const DEFAULT_PATH_LENGTH: u32 = 1;

/// Linear decay over provider rank, floored at zero.
pub fn rank_score(index: usize, rank_decay: f32) -> f32 {
	(1.0 - index as f32 * rank_decay).max(0.0)
}

pub fn graph_score(path_length: Option<u32>, custody_event_count: u32, custody_bonus: f32) -> f32 {
	let path_length = path_length.unwrap_or(DEFAULT_PATH_LENGTH);
	let mut score = 1.0 / (path_length as f32 + 1.0);

	if custody_event_count > 0 {
		score += custody_bonus;
	}

	score
}

pub fn hybrid_score(signals: Signals, weights: &RetrievalWeights) -> f32 {
	match (signals.semantic, signals.graph) {
		(Some(semantic), Some(graph)) => semantic * weights.semantic + graph * weights.graph,
		(Some(semantic), None) => semantic * weights.semantic,
		(None, Some(graph)) => graph * weights.graph + weights.graph_only_bonus,
		(None, None) => 0.0,
	}
}

pub fn average_confidence<'a>(scores: impl IntoIterator<Item = &'a f32>) -> f32 {
	let mut total = 0.0_f32;
	let mut count = 0_usize;

	for score in scores {
		total += *score;
		count += 1;
	}

	if count == 0 { 0.0 } else { total / count as f32 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rank_score_decays_to_zero_floor() {
		assert_eq!(rank_score(0, 0.1), 1.0);
		assert!((rank_score(5, 0.1) - 0.5).abs() < 1e-6);
		assert_eq!(rank_score(10, 0.1), 0.0);
		assert_eq!(rank_score(14, 0.1), 0.0);
	}

	#[test]
	fn graph_score_adds_custody_bonus_once() {
		assert_eq!(graph_score(Some(0), 0, 0.2), 1.0);
		assert!((graph_score(Some(1), 3, 0.2) - 0.7).abs() < 1e-6);
		assert!((graph_score(None, 0, 0.2) - 0.5).abs() < 1e-6);
	}

	#[test]
	fn graph_only_hits_receive_flat_bonus() {
		let weights = RetrievalWeights::default();
		let graph_only = Signals { semantic: None, graph: Some(0.8) };
		let both = Signals { semantic: Some(1.0), graph: Some(0.5) };

		assert!((hybrid_score(graph_only, &weights) - 0.62).abs() < 1e-6);
		assert!((hybrid_score(both, &weights) - 0.8).abs() < 1e-6);
		assert_eq!(hybrid_score(Signals::default(), &weights), 0.0);
	}

	#[test]
	fn average_of_nothing_is_zero() {
		assert_eq!(average_confidence(&[]), 0.0);
		assert!((average_confidence(&[0.8, 0.4]) - 0.6).abs() < 1e-6);
	}
}
