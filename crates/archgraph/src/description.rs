//! JSON diagram descriptions
//!
//! Lets a diagram be declared in a file instead of code:
//!
//! ```json
//! {
//!   "name": "Restricted access deployment",
//!   "config": { "filename": "arch-local" },
//!   "nodes": [{ "id": "user", "label": "End user", "category": "end-user" }],
//!   "clusters": [{
//!     "name": "Kubernetes",
//!     "nodes": [{ "id": "ingress", "label": "Ingress", "category": "load-balancer" }]
//!   }],
//!   "edges": [{ "from": "user", "to": "ingress" }]
//! }
//! ```
//!
//! Node ids are local to the document and only used to wire edges.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, span, Level};

use crate::core::{
    DiagramConfig, DiagramError, EdgeDirection, EdgeStyle, NodeCategory, NodeHandle, Result,
};
use crate::diagram::{Diagram, Edge};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDescription {
    pub id: String,
    /// Defaults to the id
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: NodeCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterDescription {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub clusters: Vec<ClusterDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDescription {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub direction: EdgeDirection,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub style: EdgeStyle,
}

/// A whole diagram as a serializable document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramDescription {
    pub name: String,
    #[serde(default)]
    pub config: DiagramConfig,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub clusters: Vec<ClusterDescription>,
    #[serde(default)]
    pub edges: Vec<EdgeDescription>,
}

impl DiagramDescription {
    /// Parse a description from JSON text
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a description file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| DiagramError::io_error(path, e))?;
        Self::from_json(&content).map_err(|e| match e {
            DiagramError::DescriptionError { message } => {
                DiagramError::description_error(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Serialize back to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Declare everything into a fresh [`Diagram`]
    ///
    /// Nodes are declared first, clusters in document order, then edges.
    /// Duplicate or unknown node ids are declaration errors.
    pub fn build(&self) -> Result<Diagram> {
        let build_span = span!(Level::DEBUG, "build_description", diagram = %self.name);
        let _enter = build_span.enter();

        let mut diagram = Diagram::with_config(self.name.clone(), self.config.clone());
        let mut handles: HashMap<String, NodeHandle> = HashMap::new();

        declare_nodes(&mut diagram, &self.nodes, &mut handles)?;
        for cluster in &self.clusters {
            declare_cluster(&mut diagram, cluster, &mut handles)?;
        }

        for edge in &self.edges {
            let from = lookup(&handles, &edge.from)?;
            let to = lookup(&handles, &edge.to)?;
            let mut spec = Edge::new().direction(edge.direction).style(edge.style);
            if let Some(label) = &edge.label {
                spec = spec.label(label.clone());
            }
            if let Some(color) = &edge.color {
                spec = spec.color(color.clone());
            }
            diagram.declare_edge(from, to, spec)?;
        }

        debug!(
            node_count = diagram.node_count(),
            cluster_count = diagram.cluster_count(),
            edge_count = diagram.edge_count(),
            "Description built"
        );
        Ok(diagram)
    }
}

fn declare_nodes(
    diagram: &mut Diagram,
    nodes: &[NodeDescription],
    handles: &mut HashMap<String, NodeHandle>,
) -> Result<()> {
    for node in nodes {
        if handles.contains_key(&node.id) {
            return Err(DiagramError::declaration_error(format!(
                "node id '{}' is declared more than once",
                node.id
            )));
        }
        let label = node.label.clone().unwrap_or_else(|| node.id.clone());
        let handle = diagram.declare_node(label, node.category);
        handles.insert(node.id.clone(), handle);
    }
    Ok(())
}

fn declare_cluster(
    diagram: &mut Diagram,
    cluster: &ClusterDescription,
    handles: &mut HashMap<String, NodeHandle>,
) -> Result<()> {
    let mut scope = diagram.cluster(cluster.name.clone());
    declare_nodes(&mut scope, &cluster.nodes, handles)?;
    for child in &cluster.clusters {
        declare_cluster(&mut scope, child, handles)?;
    }
    Ok(())
}

fn lookup(handles: &HashMap<String, NodeHandle>, id: &str) -> Result<NodeHandle> {
    handles.get(id).copied().ok_or_else(|| {
        DiagramError::declaration_error(format!("edge references undeclared node '{}'", id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Sample",
        "config": { "filename": "sample", "font_size": 14.0 },
        "nodes": [
            { "id": "user", "label": "End user", "category": "end-user" },
            { "id": "ldap", "label": "LDAP", "category": "storage" }
        ],
        "clusters": [{
            "name": "Kubernetes",
            "nodes": [{ "id": "auth", "label": "Authentication", "category": "kubernetes-engine" }],
            "clusters": [{ "name": "Inner", "nodes": [{ "id": "svc" }] }]
        }],
        "edges": [
            { "from": "user", "to": "auth" },
            { "from": "auth", "to": "ldap", "direction": "reverse" },
            { "from": "svc", "to": "auth", "label": "calls", "style": "dashed" }
        ]
    }"#;

    #[test]
    fn test_build_sample() {
        let description = DiagramDescription::from_json(SAMPLE).unwrap();
        let diagram = description.build().unwrap();

        assert_eq!(diagram.name(), "Sample");
        assert_eq!(diagram.node_count(), 4);
        assert_eq!(diagram.cluster_count(), 2);
        assert_eq!(diagram.edge_count(), 3);
        assert_eq!(diagram.default_filename(), "sample");
        assert_eq!(diagram.config().font_size, 14.0);

        // Missing label falls back to the id, missing category to server
        let svc = &diagram.nodes()[3];
        assert_eq!(svc.label, "svc");
        assert_eq!(svc.category, NodeCategory::Server);
        assert_eq!(svc.cluster, Some(1));

        assert_eq!(diagram.edges()[1].direction, EdgeDirection::Reverse);
        assert_eq!(diagram.edges()[2].style, EdgeStyle::Dashed);
    }

    #[test]
    fn test_unknown_edge_endpoint() {
        let json = r#"{ "name": "Bad", "nodes": [{ "id": "a" }], "edges": [{ "from": "a", "to": "ghost" }] }"#;
        let err = DiagramDescription::from_json(json).unwrap().build().unwrap_err();
        assert!(err.is_declaration());
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_duplicate_node_id() {
        let json = r#"{
            "name": "Dup",
            "nodes": [{ "id": "a" }],
            "clusters": [{ "name": "C", "nodes": [{ "id": "a" }] }]
        }"#;
        let err = DiagramDescription::from_json(json).unwrap().build().unwrap_err();
        assert!(err.is_declaration());
    }

    #[test]
    fn test_malformed_json() {
        let err = DiagramDescription::from_json("{ \"name\": ").unwrap_err();
        assert!(matches!(err, DiagramError::DescriptionError { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = DiagramDescription::from_json(r#"{ "name": "X", "node": [] }"#).unwrap_err();
        assert!(matches!(err, DiagramError::DescriptionError { .. }));
    }

    #[test]
    fn test_json_roundtrip_preserves_build() {
        let description = DiagramDescription::from_json(SAMPLE).unwrap();
        let reparsed = DiagramDescription::from_json(&description.to_json().unwrap()).unwrap();
        assert_eq!(description, reparsed);
        assert_eq!(
            description.build().unwrap().to_dot(),
            reparsed.build().unwrap().to_dot()
        );
    }
}
