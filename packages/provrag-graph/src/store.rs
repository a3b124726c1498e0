use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet, VecDeque},
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result};
use provrag_domain::{GraphHit, GraphQuery, ProvenanceStep, Relation};

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
	Entity { name: String },
	Memory { content: String, entity: Option<String>, created_at: OffsetDateTime },
	CustodyEvent { handler: String, action: String, timestamp: OffsetDateTime },
}
impl NodeKind {
	fn timestamp(&self) -> Option<OffsetDateTime> {
		match self {
			Self::Entity { .. } => None,
			Self::Memory { created_at, .. } => Some(*created_at),
			Self::CustodyEvent { timestamp, .. } => Some(*timestamp),
		}
	}
}

#[derive(Debug, Clone)]
struct Node {
	id: Uuid,
	kind: NodeKind,
}

#[derive(Debug, Clone)]
struct Edge {
	from: usize,
	to: usize,
	relation: Relation,
	timestamp: Option<OffsetDateTime>,
}

/// Node counts by kind, reported through the retrieval status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
	pub memory_count: usize,
	pub entity_count: usize,
	pub custody_events: usize,
}

/// Embedded labeled property graph. Nodes and edges are append-only and addressed by insertion
/// index internally, so every traversal is deterministic for a given insertion history.
#[derive(Debug, Default)]
pub struct MemoryGraph {
	state: RwLock<GraphState>,
}

#[derive(Debug, Default)]
struct GraphState {
	nodes: Vec<Node>,
	index: HashMap<Uuid, usize>,
	entities: HashMap<String, usize>,
	edges: Vec<Edge>,
	/// Edge indices touching each node, in either direction.
	incident: Vec<Vec<usize>>,
}

impl MemoryGraph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn upsert_entity(&self, name: &str) -> Result<Uuid> {
		if name.trim().is_empty() {
			return Err(Error::InvalidArgument("entity name must not be empty".to_string()));
		}

		let mut state = self.write();

		Ok(state.entity_node(name))
	}

	/// Inserts a memory and links it to its owning entity, creating the entity when needed.
	pub fn add_memory(
		&self,
		content: &str,
		entity: Option<&str>,
		created_at: OffsetDateTime,
	) -> Result<Uuid> {
		if content.is_empty() {
			return Err(Error::InvalidArgument("memory content must not be empty".to_string()));
		}

		let entity = entity.map(str::trim).filter(|name| !name.is_empty());
		let mut state = self.write();
		let memory = state.push_node(NodeKind::Memory {
			content: content.to_string(),
			entity: entity.map(str::to_string),
			created_at,
		});

		if let Some(name) = entity {
			let entity_id = state.entity_node(name);
			let entity_idx = state.index[&entity_id];

			state.push_edge(memory, entity_idx, Relation::RelatesTo, Some(created_at));
		}

		Ok(state.nodes[memory].id)
	}

	pub fn add_custody_event(
		&self,
		subject: Uuid,
		handler: &str,
		action: &str,
		timestamp: OffsetDateTime,
	) -> Result<Uuid> {
		let mut state = self.write();
		let subject = state.lookup(subject)?;
		let event = state.push_node(NodeKind::CustodyEvent {
			handler: handler.to_string(),
			action: action.to_string(),
			timestamp,
		});

		state.push_edge(subject, event, Relation::CustodyEvent, Some(timestamp));

		Ok(state.nodes[event].id)
	}

	pub fn add_derivation(
		&self,
		derived: Uuid,
		source: Uuid,
		timestamp: Option<OffsetDateTime>,
	) -> Result<()> {
		self.relate(derived, source, Relation::DerivedFrom, timestamp)
	}

	pub fn relate(
		&self,
		from: Uuid,
		to: Uuid,
		relation: Relation,
		timestamp: Option<OffsetDateTime>,
	) -> Result<()> {
		let mut state = self.write();
		let from = state.lookup(from)?;
		let to = state.lookup(to)?;

		state.push_edge(from, to, relation, timestamp);

		Ok(())
	}

	pub fn stats(&self) -> GraphStats {
		let state = self.read();
		let mut stats = GraphStats::default();

		for node in &state.nodes {
			match node.kind {
				NodeKind::Entity { .. } => stats.entity_count += 1,
				NodeKind::Memory { .. } => stats.memory_count += 1,
				NodeKind::CustodyEvent { .. } => stats.custody_events += 1,
			}
		}

		stats
	}

	/// Entity-scoped search walks every relation undirected up to `max_depth` hops. Without an
	/// entity, memories are scanned globally and their distance to the nearest entity is measured
	/// over `RELATES_TO` only, bounded by `global_scan_depth`.
	pub fn search(&self, query: &GraphQuery, global_scan_depth: u32) -> Vec<GraphHit> {
		let state = self.read();
		let mut hits = match query.entity.as_deref() {
			Some(name) => state.entity_scoped(name, &query.text, query.max_depth),
			None => state.global_scan(&query.text, global_scan_depth),
		};

		hits.truncate(query.limit as usize);
		hits.into_iter().map(|(_, hit)| hit).collect()
	}

	pub fn provenance(&self, entity: &str, max_hops: u32, max_edges: u32) -> Vec<ProvenanceStep> {
		let state = self.read();
		let Some(&root) = state.entities.get(entity) else {
			tracing::debug!(entity, "Provenance requested for unknown entity.");

			return Vec::new();
		};
		let mut steps = Vec::new();
		let mut expanded = HashSet::from([root]);
		let mut queue = VecDeque::from([(root, 0_u32)]);

		while let Some((node, depth)) = queue.pop_front() {
			if depth >= max_hops {
				continue;
			}

			for &edge_idx in &state.incident[node] {
				let edge = &state.edges[edge_idx];

				if edge.from != node || !edge.relation.is_provenance() {
					continue;
				}
				if steps.len() >= max_edges as usize {
					return steps;
				}

				let target = &state.nodes[edge.to];

				steps.push(ProvenanceStep {
					node_id: target.id.to_string(),
					relation_type: edge.relation,
					timestamp: edge.timestamp.or_else(|| target.kind.timestamp()),
					depth: depth + 1,
				});

				if expanded.insert(edge.to) {
					queue.push_back((edge.to, depth + 1));
				}
			}
		}

		steps
	}

	fn read(&self) -> RwLockReadGuard<'_, GraphState> {
		self.state.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
		self.state.write().unwrap_or_else(|err| err.into_inner())
	}
}

impl GraphState {
	fn push_node(&mut self, kind: NodeKind) -> usize {
		let idx = self.nodes.len();
		let id = Uuid::new_v4();

		self.nodes.push(Node { id, kind });
		self.index.insert(id, idx);
		self.incident.push(Vec::new());

		idx
	}

	fn push_edge(
		&mut self,
		from: usize,
		to: usize,
		relation: Relation,
		timestamp: Option<OffsetDateTime>,
	) {
		let idx = self.edges.len();

		self.edges.push(Edge { from, to, relation, timestamp });
		self.incident[from].push(idx);

		if from != to {
			self.incident[to].push(idx);
		}
	}

	fn entity_node(&mut self, name: &str) -> Uuid {
		if let Some(&idx) = self.entities.get(name) {
			return self.nodes[idx].id;
		}

		let idx = self.push_node(NodeKind::Entity { name: name.to_string() });

		self.entities.insert(name.to_string(), idx);

		self.nodes[idx].id
	}

	fn lookup(&self, id: Uuid) -> Result<usize> {
		self.index.get(&id).copied().ok_or(Error::UnknownNode(id))
	}

	/// Shortest undirected hop counts from `start` over every relation.
	fn distances(&self, start: usize, max_depth: u32) -> Vec<Option<u32>> {
		let mut distance = vec![None; self.nodes.len()];
		let mut queue = VecDeque::from([start]);

		distance[start] = Some(0);

		while let Some(node) = queue.pop_front() {
			let depth = distance[node].unwrap_or_default();

			if depth >= max_depth {
				continue;
			}

			for &edge_idx in &self.incident[node] {
				let edge = &self.edges[edge_idx];
				let next = if edge.from == node { edge.to } else { edge.from };

				if distance[next].is_none() {
					distance[next] = Some(depth + 1);
					queue.push_back(next);
				}
			}
		}

		distance
	}

	fn custody_count(&self, node: usize) -> u32 {
		self.incident[node]
			.iter()
			.filter(|&&edge_idx| {
				let edge = &self.edges[edge_idx];

				edge.from == node
					&& edge.relation == Relation::CustodyEvent
					&& matches!(self.nodes[edge.to].kind, NodeKind::CustodyEvent { .. })
			})
			.count() as u32
	}

	fn owner_name(&self, node: usize) -> Option<String> {
		self.incident[node].iter().find_map(|&edge_idx| {
			let edge = &self.edges[edge_idx];

			if edge.from != node || edge.relation != Relation::RelatesTo {
				return None;
			}

			match &self.nodes[edge.to].kind {
				NodeKind::Entity { name } => Some(name.clone()),
				_ => None,
			}
		})
	}

	fn entity_scoped(&self, name: &str, text: &str, max_depth: u32) -> Vec<(usize, GraphHit)> {
		let Some(&start) = self.entities.get(name) else {
			return Vec::new();
		};
		let distance = self.distances(start, max_depth);
		let mut hits = Vec::new();

		for (idx, node) in self.nodes.iter().enumerate() {
			let NodeKind::Memory { content, entity, created_at } = &node.kind else { continue };
			let Some(path_length) = distance[idx].filter(|length| *length > 0) else { continue };

			if !content.contains(text) {
				continue;
			}

			hits.push((idx, GraphHit {
				content: content.clone(),
				entity: self.owner_name(idx).or_else(|| entity.clone()),
				path_length: Some(path_length),
				custody_event_count: self.custody_count(idx),
				created_at: Some(*created_at),
			}));
		}

		hits.sort_by(|(left_idx, left), (right_idx, right)| {
			left.path_length
				.cmp(&right.path_length)
				.then_with(|| recency_desc(left.created_at, right.created_at))
				.then_with(|| left_idx.cmp(right_idx))
		});

		hits
	}

	fn global_scan(&self, text: &str, depth: u32) -> Vec<(usize, GraphHit)> {
		let nearest = self.nearest_entities(depth);
		let mut hits = Vec::new();

		for (idx, node) in self.nodes.iter().enumerate() {
			let NodeKind::Memory { content, created_at, .. } = &node.kind else { continue };

			if !content.contains(text) {
				continue;
			}

			let (path_length, entity) = match nearest[idx] {
				Some((length, origin)) => match &self.nodes[origin].kind {
					NodeKind::Entity { name } => (Some(length), Some(name.clone())),
					_ => (None, None),
				},
				None => (None, None),
			};

			hits.push((idx, GraphHit {
				content: content.clone(),
				entity,
				path_length,
				custody_event_count: self.custody_count(idx),
				created_at: Some(*created_at),
			}));
		}

		hits.sort_by(|(left_idx, left), (right_idx, right)| {
			recency_desc(left.created_at, right.created_at).then_with(|| right_idx.cmp(left_idx))
		});

		hits
	}

	/// Distance to, and index of, the closest entity over undirected `RELATES_TO` edges, within
	/// `max_depth` hops. One BFS seeded from every entity at once; among entities at the same
	/// distance the lowest insertion index wins.
	fn nearest_entities(&self, max_depth: u32) -> Vec<Option<(u32, usize)>> {
		let mut nearest = vec![None; self.nodes.len()];
		let mut queue = VecDeque::new();

		for (idx, node) in self.nodes.iter().enumerate() {
			if matches!(node.kind, NodeKind::Entity { .. }) {
				nearest[idx] = Some((0, idx));
				queue.push_back(idx);
			}
		}

		while let Some(node) = queue.pop_front() {
			// A node's origin is final once it is dequeued: every candidate origin for it was
			// offered while the previous layer was expanded.
			let Some((depth, origin)) = nearest[node] else { continue };

			if depth >= max_depth {
				continue;
			}

			for &edge_idx in &self.incident[node] {
				let edge = &self.edges[edge_idx];

				if edge.relation != Relation::RelatesTo {
					continue;
				}

				let next = if edge.from == node { edge.to } else { edge.from };

				match nearest[next] {
					None => {
						nearest[next] = Some((depth + 1, origin));
						queue.push_back(next);
					},
					Some((length, current)) if length == depth + 1 && origin < current => {
						nearest[next] = Some((length, origin));
					},
					Some(_) => {},
				}
			}
		}

		nearest
	}
}

fn recency_desc(left: Option<OffsetDateTime>, right: Option<OffsetDateTime>) -> Ordering {
	// `None` sorts last.
	right.cmp(&left)
}
