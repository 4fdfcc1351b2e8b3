use leptos::prelude::*;

use crate::components::force_graph::{ForceGraphCanvas, GraphData, GraphLink, GraphNode};
use crate::layout::{ForceLayoutConfig, ModifierKey};

fn sample_node(i: usize) -> GraphNode {
	GraphNode {
		id: i.to_string(),
		label: if i < 10 {
			Some(format!("Node {}", i))
		} else {
			None
		},
		color: None,
		group: Some((i % 10) as u32),
	}
}

/// Link node `i` to an earlier node, forming a random tree.
fn sample_link(i: usize) -> GraphLink {
	let target = (rand_simple(i) * (i as f64)) as usize;
	GraphLink {
		source: i.to_string(),
		target: target.to_string(),
	}
}

/// Generate sample graph data (random tree similar to the JS example).
fn generate_sample_data(n: usize) -> GraphData {
	GraphData {
		nodes: (0..n).map(sample_node).collect(),
		links: (1..n).map(sample_link).collect(),
	}
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = RwSignal::new(generate_sample_data(60));

	let add_node = move |_| {
		graph_data.update(|data| {
			let i = data.nodes.len();
			data.nodes.push(sample_node(i));
			data.links.push(sample_link(i));
		});
	};
	let remove_node = move |_| {
		graph_data.update(|data| {
			if let Some(node) = data.nodes.pop() {
				data.links.retain(|l| l.source != node.id && l.target != node.id);
			}
		});
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					data=graph_data
					fullscreen=true
					config=ForceLayoutConfig::default().with_pin_on_click(true, ModifierKey::Alt)
				/>
				<div class="graph-overlay">
					<h1>"Force-Directed Graph"</h1>
					<p class="subtitle">
						"Drag nodes to reposition. Alt+click pins or releases a node. Scroll to zoom. Drag background to pan."
					</p>
					<button on:click=add_node>"Add node"</button>
					<button on:click=remove_node>"Remove node"</button>
				</div>
			</div>
		</ErrorBoundary>
	}
}
