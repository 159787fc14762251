//! DOT writer
//!
//! Produces the Graphviz description of a diagram. Output is deterministic:
//! nodes get `node_N` ids and clusters `cluster_N` ids in declaration order.

use std::fmt::Write as _;

use tracing::trace;

use crate::diagram::{ClusterData, Diagram, EdgeData, NodeData};

use super::{DiagramConfig, EdgeStyle};

const FONT_NAME: &str = "Sans-Serif";
const FONT_COLOR: &str = "#2D3436";
const EDGE_COLOR: &str = "#7B8894";
const CLUSTER_PEN_COLOR: &str = "#AEB6BE";

/// Cluster backgrounds, cycled by nesting depth
const CLUSTER_BACKGROUNDS: [&str; 4] = ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"];

const INDENT: &str = "    ";

/// Ordered attribute list where a later `set` replaces an earlier value
#[derive(Debug, Default)]
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    fn extend<'a>(&mut self, overrides: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (key, value) in overrides {
            self.set(key.as_str(), value.as_str());
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Attrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", key, quote(value))?;
        }
        write!(f, "]")
    }
}

/// Quote a DOT string, escaping quotes and backslashes and encoding newlines
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// DOT id of the node at `index`
pub fn node_id(index: usize) -> String {
    format!("node_{}", index)
}

/// DOT id of the cluster at `index`; Graphviz only boxes subgraphs named `cluster*`
pub fn cluster_id(index: usize) -> String {
    format!("cluster_{}", index)
}

fn graph_attrs(config: &DiagramConfig) -> Attrs {
    let mut attrs = Attrs::default();
    attrs
        .set("fontname", FONT_NAME)
        .set("fontsize", "15")
        .set("fontcolor", FONT_COLOR)
        .set("label", config.label.as_str())
        .set("labelloc", config.label_loc.as_str())
        .set("rankdir", config.direction.to_string())
        .set("nodesep", config.node_separation.to_string())
        .set("pad", config.padding.to_string())
        .set("ranksep", config.rank_separation.to_string())
        .set("splines", config.edge_routing.to_string());
    attrs.extend(&config.graph_attrs);
    attrs
}

fn default_node_attrs(config: &DiagramConfig) -> Attrs {
    let mut attrs = Attrs::default();
    attrs
        .set("shape", "box")
        .set("style", "rounded,filled")
        .set("fontname", FONT_NAME)
        .set("fontsize", config.font_size.to_string())
        .set("fontcolor", FONT_COLOR)
        .set("margin", "0.15");
    attrs.extend(&config.node_attrs);
    attrs
}

fn default_edge_attrs(config: &DiagramConfig) -> Attrs {
    let mut attrs = Attrs::default();
    attrs
        .set("color", EDGE_COLOR)
        .set("fontname", FONT_NAME)
        .set("fontsize", "10")
        .set("fontcolor", FONT_COLOR);
    attrs.extend(&config.edge_attrs);
    attrs
}

fn node_attrs(node: &NodeData) -> Attrs {
    let mut attrs = Attrs::default();
    attrs
        .set("label", node.label.as_str())
        .set("shape", node.category.shape())
        .set("fillcolor", node.category.fill_color());
    attrs
}

fn edge_attrs(edge: &EdgeData) -> Attrs {
    let mut attrs = Attrs::default();
    if let Some(label) = &edge.label {
        attrs.set("label", label.as_str());
    }
    attrs.set("dir", edge.direction.dot_dir());
    if let Some(color) = &edge.color {
        attrs.set("color", color.as_str());
    }
    if edge.style != EdgeStyle::Solid {
        attrs.set("style", edge.style.to_string());
    }
    attrs
}

fn cluster_attrs(cluster: &ClusterData, depth: usize) -> Attrs {
    let mut attrs = Attrs::default();
    attrs
        .set("label", cluster.name.as_str())
        .set("style", "rounded,filled")
        .set("labeljust", "l")
        .set("pencolor", CLUSTER_PEN_COLOR)
        .set("bgcolor", CLUSTER_BACKGROUNDS[depth % CLUSTER_BACKGROUNDS.len()])
        .set("fontname", FONT_NAME)
        .set("fontsize", "12");
    attrs
}

/// Render the diagram as a DOT `digraph`
pub fn to_dot(diagram: &Diagram) -> String {
    let mut out = String::new();
    let config = diagram.config();

    // Writing into a String cannot fail
    let _ = writeln!(out, "digraph {} {{", quote(diagram.name()));
    let _ = writeln!(out, "{}graph {};", INDENT, graph_attrs(config));
    let _ = writeln!(out, "{}node {};", INDENT, default_node_attrs(config));
    let _ = writeln!(out, "{}edge {};", INDENT, default_edge_attrs(config));

    write_scope(&mut out, diagram, None, 1);

    if diagram.edge_count() > 0 {
        out.push('\n');
    }
    for edge in diagram.edges() {
        let attrs = edge_attrs(edge);
        let _ = write!(
            out,
            "{}{} -> {}",
            INDENT,
            node_id(edge.from),
            node_id(edge.to)
        );
        if !attrs.is_empty() {
            let _ = write!(out, " {}", attrs);
        }
        out.push_str(";\n");
    }

    out.push_str("}\n");
    trace!(
        dot_len = out.len(),
        node_count = diagram.node_count(),
        cluster_count = diagram.cluster_count(),
        edge_count = diagram.edge_count(),
        "DOT description generated"
    );
    out
}

/// Write the nodes directly inside `scope`, then its child clusters
fn write_scope(out: &mut String, diagram: &Diagram, scope: Option<usize>, depth: usize) {
    let indent = INDENT.repeat(depth);

    for (index, node) in diagram
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| n.cluster == scope)
    {
        let _ = writeln!(out, "{}{} {};", indent, node_id(index), node_attrs(node));
    }

    for (index, cluster) in diagram
        .clusters()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.parent == scope)
    {
        let _ = writeln!(out, "{}subgraph {} {{", indent, cluster_id(index));
        let _ = writeln!(
            out,
            "{}{}graph {};",
            indent,
            INDENT,
            cluster_attrs(cluster, depth - 1)
        );
        write_scope(out, diagram, Some(index), depth + 1);
        let _ = writeln!(out, "{}}}", indent);
    }
}
