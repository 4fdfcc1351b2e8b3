use crate::layout::{Edge, GraphSource, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: Option<String>,
	pub color: Option<String>,
	pub group: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphSource for GraphData {
	fn node_ids(&self) -> Vec<NodeId> {
		self.nodes.iter().map(|node| node.id.clone()).collect()
	}

	fn edges(&self) -> Vec<Edge> {
		self.links
			.iter()
			.map(|link| Edge::new(link.source.clone(), link.target.clone()))
			.collect()
	}
}
