use std::collections::HashMap;

use color_eyre::eyre::{eyre, Result};
use eframe::{run_native, App, CreationContext, NativeOptions};
use egui::Color32;
use egui_graphs::{
    DefaultGraphView, Graph, SettingsInteraction, SettingsNavigation, SettingsStyle,
};
use petgraph::{graph::EdgeIndex, graph::NodeIndex, prelude::StableGraph};

use crate::fa::FA;

struct Visualizer {
    graph: Graph,
}

impl Visualizer {
    fn new(_: &CreationContext<'_>, graph: Graph) -> Self {
        Visualizer { graph }
    }
}

impl App for Visualizer {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let navigation_settings = &SettingsNavigation::new()
                .with_zoom_and_pan_enabled(true)
                .with_fit_to_screen_enabled(true);
            let interactive_settings = &SettingsInteraction::new()
                .with_dragging_enabled(true)
                .with_node_clicking_enabled(true)
                .with_node_selection_enabled(true)
                .with_edge_clicking_enabled(true)
                .with_edge_selection_enabled(true);
            let style_settings = &SettingsStyle::default().with_labels_always(true);
            ui.add(
                &mut DefaultGraphView::new(&mut self.graph)
                    .with_styles(style_settings)
                    .with_interactions(interactive_settings)
                    .with_navigations(navigation_settings),
            );
        });
    }
}

// Parallel transitions between two states are drawn as one edge listing every label
fn edge_labels<T: FA>(fa: &T) -> HashMap<(usize, usize), String> {
    let mut labels: HashMap<(usize, usize), String> = HashMap::new();

    for (from, label, to) in fa.get_transition_triples() {
        labels
            .entry((from, to))
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&label);
            })
            .or_insert(label);
    }

    labels
}

fn generate_stable_graph<T: FA>(fa: &T) -> Graph {
    let mut stable_graph = StableGraph::new();

    let num_states = fa.get_num_states();

    let start_node_color = Color32::from_rgb(20, 67, 130);
    let accept_node_color = Color32::from_rgb(20, 130, 90);

    let labels = edge_labels(fa);
    let mut edge_map: HashMap<EdgeIndex, String> = HashMap::new();

    for _state_idx in 0..num_states {
        stable_graph.add_node(());
    }

    for ((from, to), label) in labels {
        if to < num_states {
            let edge_idx = stable_graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
            edge_map.insert(edge_idx, label);
        }
    }

    let mut graph = Graph::from(&stable_graph);

    for state_idx in 0..num_states {
        if let Some(node) = graph.node_mut(NodeIndex::new(state_idx)) {
            node.set_label(fa.state_label(state_idx));

            if fa.is_accepting(state_idx) {
                node.set_color(accept_node_color);
            }
            if state_idx == fa.get_start_state() {
                node.set_color(start_node_color);
            }
        }
    }

    for (edge_idx, label) in edge_map {
        if let Some(edge) = graph.edge_mut(edge_idx) {
            edge.set_label(label);
        }
    }

    graph
}
/// Opens a window showing the finite automaton provided. Start states are blue, accepting
/// states green.
pub fn visualize<T: FA>(fa: &T) -> Result<()> {
    let graph = generate_stable_graph(fa);
    run_native(
        "finite automata visualizer",
        NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(Visualizer::new(cc, graph)))),
    )
    .map_err(|err| eyre!("Failed to open the visualizer window: {}", err))
}
