//! archgraph - Declare architecture diagrams and render them with Graphviz
//!
//! Nodes, clusters and edges are declared through a [`Diagram`]; layout and
//! rasterization are delegated to a [`RenderBackend`], by default the
//! Graphviz `dot` executable.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use archgraph::prelude::*;
//!
//! # fn main() -> archgraph::Result<()> {
//! let mut diagram = Diagram::new("Login flow");
//! let user = diagram.declare_node("End user", NodeCategory::EndUser);
//! let idp = diagram.declare_node("Identity provider", NodeCategory::Server);
//! let auth = {
//!     let mut k8s = diagram.cluster("Kubernetes");
//!     k8s.declare_node("Authentication", NodeCategory::KubernetesEngine)
//! };
//!
//! diagram.chain(&[user, idp, auth])?;
//! diagram.declare_edge(user, auth, Edge::labeled("session"))?;
//!
//! diagram.render("login.png", OutputFormat::Png, &GraphvizBackend::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Inspecting the Graph Description
//!
//! ```rust
//! use archgraph::prelude::*;
//!
//! let mut diagram = Diagram::new("Two nodes");
//! let a = diagram.declare_node("A", NodeCategory::Server);
//! let b = diagram.declare_node("B", NodeCategory::Storage);
//! diagram.connect(a, b).unwrap();
//!
//! let dot = diagram.to_dot();
//! assert!(dot.contains("node_0 -> node_1"));
//! ```

pub mod core;
pub mod description;
pub mod diagram;
pub mod presets;

use std::path::{Path, PathBuf};

pub use crate::core::*;
pub use crate::description::DiagramDescription;
pub use crate::diagram::{ClusterScope, Diagram, Edge, RenderOutput};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        DiagramConfig, DiagramError, Direction, EdgeDirection, EdgeRouting, EdgeStyle,
        GraphvizBackend, NodeCategory, NodeHandle, OutputFormat, RenderBackend,
    };
    pub use crate::description::DiagramDescription;
    pub use crate::diagram::{ClusterScope, Diagram, Edge, RenderOutput};
}

/// DOT description of a built-in diagram
///
/// # Example
/// ```rust
/// let dot = archgraph::preset_dot("local").unwrap();
/// assert!(dot.contains("subgraph cluster_0"));
/// ```
pub fn preset_dot(name: &str) -> anyhow::Result<String> {
    let preset = presets::by_name(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown preset '{}' (available: {})",
            name,
            presets::names().join(", ")
        )
    })?;
    Ok(preset.build()?.to_dot())
}

/// Render a built-in diagram with Graphviz into `dir/<filename>.<ext>`
pub fn render_preset(
    name: &str,
    dir: impl AsRef<Path>,
    format: OutputFormat,
) -> anyhow::Result<PathBuf> {
    let preset = presets::by_name(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown preset '{}'", name))?;
    let diagram = preset.build()?;
    let path = dir
        .as_ref()
        .join(format!("{}.{}", diagram.default_filename(), format.extension()));
    let output = diagram.render(&path, format, &GraphvizBackend::new())?;
    Ok(output.path)
}

/// Build a diagram from a JSON description file and return its DOT text
pub fn description_dot(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let description = DiagramDescription::from_file(path)?;
    Ok(description.build()?.to_dot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_dot() {
        let dot = preset_dot("federated").unwrap();
        assert!(dot.contains("Science Platform"));
        assert!(dot.contains("subgraph cluster_1"));
    }

    #[test]
    fn test_unknown_preset() {
        let err = preset_dot("nope").unwrap_err();
        assert!(err.to_string().contains("federated"));
    }

    #[test]
    fn test_description_dot_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.json");
        std::fs::write(
            &path,
            r#"{ "name": "File", "nodes": [{ "id": "a" }, { "id": "b" }], "edges": [{ "from": "a", "to": "b" }] }"#,
        )
        .unwrap();

        let dot = description_dot(&path).unwrap();
        assert!(dot.starts_with("digraph \"File\""));
        assert!(dot.contains("node_0 -> node_1"));

        let err = description_dot(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_render_preset_as_dot_needs_no_graphviz() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_preset("local", dir.path(), OutputFormat::Dot).unwrap();
        assert_eq!(path, dir.path().join("arch-local.dot"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("digraph \"Restricted access deployment\""));
    }
}
