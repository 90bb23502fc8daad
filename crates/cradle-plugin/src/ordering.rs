//! Plugin ordering validation.
//!
//! Plugins are applied in declaration order, so every prerequisite of a
//! plugin must be declared, must not depend back on it, and must come first.

use std::collections::HashMap;
use std::fmt;

use miette::Diagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::plugin::Plugin;

/// A plugin together with one of its prerequisites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisitePair {
    pub plugin: String,
    pub prerequisite: String,
}

impl fmt::Display for PrerequisitePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {}", self.plugin, self.prerequisite)
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Plugin declarations that cannot be applied. Fatal for the whole pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PluginOrderError {
    #[error("plugin `{id}` is declared more than once")]
    #[diagnostic(code(cradle::plugin::duplicate))]
    DuplicatePlugin { id: String },

    #[error("missing plugin prerequisites: {}", join(.pairs, "; "))]
    #[diagnostic(
        code(cradle::plugin::missing),
        help("Declare each required plugin in plugins {{ }}, or override the requirement under [plugins] in cradle.toml")
    )]
    MissingPrerequisite { pairs: Vec<PrerequisitePair> },

    #[error("plugin prerequisites form a cycle: {}", join(.cycle, " -> "))]
    #[diagnostic(
        code(cradle::plugin::cycle),
        help("Break the cycle by overriding one of the requirements under [plugins] in cradle.toml")
    )]
    CyclicPrerequisite { cycle: Vec<String> },

    #[error("plugins are declared before their prerequisites: {}", join(.pairs, "; "))]
    #[diagnostic(
        code(cradle::plugin::order),
        help("Plugins are applied in declaration order; move each prerequisite above the plugin that needs it")
    )]
    PrerequisiteOrder { pairs: Vec<PrerequisitePair> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Check that `plugins` can be applied in the order given.
///
/// Checks run in a fixed order and the first failing one is reported:
/// duplicates, missing prerequisites (all pairs), cycles, then declaration order.
pub fn validate(plugins: &[Plugin]) -> Result<(), PluginOrderError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for plugin in plugins {
        if index.contains_key(plugin.id.as_str()) {
            return Err(PluginOrderError::DuplicatePlugin {
                id: plugin.id.clone(),
            });
        }
        index.insert(&plugin.id, graph.add_node(&plugin.id));
    }

    let missing: Vec<PrerequisitePair> = plugins
        .iter()
        .flat_map(|plugin| {
            plugin
                .prerequisites
                .iter()
                .filter(|p| !index.contains_key(p.as_str()))
                .map(|p| PrerequisitePair {
                    plugin: plugin.id.clone(),
                    prerequisite: p.clone(),
                })
        })
        .collect();
    if !missing.is_empty() {
        return Err(PluginOrderError::MissingPrerequisite { pairs: missing });
    }

    for plugin in plugins {
        let from = index[plugin.id.as_str()];
        for prerequisite in &plugin.prerequisites {
            graph.add_edge(from, index[prerequisite.as_str()], ());
        }
    }

    if let Some(cycle) = find_cycle(&graph) {
        return Err(PluginOrderError::CyclicPrerequisite {
            cycle: cycle.into_iter().map(|n| graph[n].to_string()).collect(),
        });
    }

    let late: Vec<PrerequisitePair> = graph
        .node_indices()
        .flat_map(|node| {
            let graph = &graph;
            successors(graph, node)
                .into_iter()
                .filter(move |&prerequisite| prerequisite.index() > node.index())
                .map(move |prerequisite| PrerequisitePair {
                    plugin: graph[node].to_string(),
                    prerequisite: graph[prerequisite].to_string(),
                })
        })
        .collect();
    if !late.is_empty() {
        return Err(PluginOrderError::PrerequisiteOrder { pairs: late });
    }

    tracing::debug!(plugins = plugins.len(), "plugin order is valid");
    Ok(())
}

/// Outgoing neighbours in insertion order.
fn successors(graph: &DiGraph<&str, ()>, node: NodeIndex) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = graph.neighbors(node).collect();
    next.reverse();
    next
}

/// Three-color depth-first search from each node in declaration order.
/// Returns the first cycle found, starting at the node that closes it.
fn find_cycle(graph: &DiGraph<&str, ()>) -> Option<Vec<NodeIndex>> {
    let mut colors = vec![Color::White; graph.node_count()];
    let mut path = Vec::new();
    for start in graph.node_indices() {
        if colors[start.index()] == Color::White {
            if let Some(cycle) = visit(graph, start, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    graph: &DiGraph<&str, ()>,
    node: NodeIndex,
    colors: &mut [Color],
    path: &mut Vec<NodeIndex>,
) -> Option<Vec<NodeIndex>> {
    colors[node.index()] = Color::Gray;
    path.push(node);
    for next in successors(graph, node) {
        match colors[next.index()] {
            Color::Gray => {
                if let Some(start) = path.iter().position(|&n| n == next) {
                    return Some(path[start..].to_vec());
                }
            }
            Color::White => {
                if let Some(cycle) = visit(graph, next, colors, path) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }
    path.pop();
    colors[node.index()] = Color::Black;
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successors_follow_insertion_order() {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let c = graph.add_node("c");
        graph.add_edge(a, b, ());
        graph.add_edge(a, c, ());
        assert_eq!(successors(&graph, a), [b, c]);
    }

    #[test]
    fn self_requirement_is_a_cycle() {
        let err = validate(&[Plugin::new("a").requires("a")]).unwrap_err();
        assert_eq!(
            err,
            PluginOrderError::CyclicPrerequisite {
                cycle: vec!["a".into()]
            }
        );
    }
}
