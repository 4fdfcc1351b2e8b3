//! Simulation-local copies of the externally owned graph.

use std::collections::HashSet;

use log::debug;

use super::types::{Edge, NodeId, NodePosition, Point, PositionStore, SimulationEdge, SimulationNode};

/// Node and edge mirror handed to an engine in one piece.
#[derive(Debug)]
pub struct GraphMirror {
	pub nodes: Vec<SimulationNode>,
	pub edges: Vec<SimulationEdge>,
}

impl GraphMirror {
	pub fn build(node_ids: &[NodeId], edges: &[Edge], positions: &PositionStore) -> Self {
		report_dangling_edges(node_ids, edges);
		Self {
			nodes: build_nodes(node_ids, positions),
			edges: build_edges(edges),
		}
	}
}

/// Edges with an endpoint outside `node_ids`. The solvers skip them.
pub fn dangling_edges<'a>(node_ids: &[NodeId], edges: &'a [Edge]) -> Vec<&'a Edge> {
	let known: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
	edges
		.iter()
		.filter(|edge| !known.contains(edge.source.as_str()) || !known.contains(edge.target.as_str()))
		.collect()
}

pub(crate) fn report_dangling_edges(node_ids: &[NodeId], edges: &[Edge]) {
	let dangling = dangling_edges(node_ids, edges);
	if let Some(first) = dangling.first() {
		debug!(
			"ignoring {} edge(s) with an unknown endpoint, first {} -> {}",
			dangling.len(),
			first.source,
			first.target
		);
	}
}

/// Gives every id without a store entry a fresh one at `center`. Returns the ids placed.
pub fn place_new_nodes(node_ids: &[NodeId], positions: &PositionStore, center: Point) -> Vec<NodeId> {
	positions.update(|map| {
		let mut placed = Vec::new();
		for id in node_ids {
			if !map.contains_key(id) {
				map.insert(id.clone(), NodePosition::at(center));
				placed.push(id.clone());
			}
		}
		if !placed.is_empty() {
			debug!("placed {} new node(s) at ({}, {})", placed.len(), center.x, center.y);
		}
		placed
	})
}

/// One simulation node per id, seeded from its store entry (origin when absent).
pub fn build_nodes(node_ids: &[NodeId], positions: &PositionStore) -> Vec<SimulationNode> {
	positions.with(|map| {
		node_ids
			.iter()
			.map(|id| {
				let position = map.get(id).cloned().unwrap_or_default();
				let mut node = SimulationNode::new(id.clone(), position.x, position.y);
				node.fx = position.fx;
				node.fy = position.fy;
				if position.fixed && position.pin().is_none() {
					node.set_pin(position.point());
				}
				node
			})
			.collect()
	})
}

/// Fresh edge records carrying only the endpoint ids.
pub fn build_edges(edges: &[Edge]) -> Vec<SimulationEdge> {
	edges
		.iter()
		.enumerate()
		.map(|(index, edge)| SimulationEdge {
			index,
			source: edge.source.clone(),
			target: edge.target.clone(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(names: &[&str]) -> Vec<NodeId> {
		names.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn new_nodes_land_on_center_and_existing_keep_position() {
		let positions = PositionStore::new();
		positions.insert("a", NodePosition::at(Point::new(5.0, 6.0)));

		let placed = place_new_nodes(&ids(&["a", "b"]), &positions, Point::new(100.0, 50.0));

		assert_eq!(placed, ids(&["b"]));
		assert_eq!(positions.get("a").map(|p| p.point()), Some(Point::new(5.0, 6.0)));
		assert_eq!(positions.get("b").map(|p| p.point()), Some(Point::new(100.0, 50.0)));
	}

	#[test]
	fn nodes_follow_the_id_set_and_carry_pins() {
		let positions = PositionStore::new();
		positions.insert("a", NodePosition::at(Point::new(1.0, 2.0)));
		positions.insert("gone", NodePosition::at(Point::new(9.0, 9.0)));
		let mut pinned = NodePosition::at(Point::new(3.0, 4.0));
		pinned.fixed = true;
		positions.insert("p", pinned);

		let nodes = build_nodes(&ids(&["a", "p", "unknown"]), &positions);

		assert_eq!(nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), ["a", "p", "unknown"]);
		assert_eq!(nodes[0].point(), Point::new(1.0, 2.0));
		assert_eq!((nodes[1].fx, nodes[1].fy), (Some(3.0), Some(4.0)));
		assert_eq!(nodes[2].point(), Point::ORIGIN);
	}

	#[test]
	fn dangling_edges_are_listed_once() {
		let edges = vec![Edge::new("a", "b"), Edge::new("a", "ghost"), Edge::new("ghost", "b"), Edge::new("a", "a")];
		let dangling = dangling_edges(&ids(&["a", "b"]), &edges);
		assert_eq!(dangling, [&edges[1], &edges[2]]);
	}

	#[test]
	fn edges_are_rebuilt_from_ids() {
		let edges = vec![Edge::new("a", "b"), Edge::new("b", "c")];
		let mirrored = build_edges(&edges);
		assert_eq!(mirrored[1], SimulationEdge {
			index: 1,
			source: "b".into(),
			target: "c".into(),
		});
	}
}
