//! Layout and style configuration passed to the rendering backend
//!
//! Values are forwarded as-is. Invalid combinations are reported by the
//! backend, not here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Direction, EdgeRouting};

/// Configuration for one diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Overall diagram title; empty hides it
    pub label: String,
    /// Title location (Graphviz `labelloc`)
    pub label_loc: String,
    /// Spacing between nodes in the same rank, in inches
    pub node_separation: f64,
    /// Padding around the drawing, in inches
    pub padding: f64,
    /// Spacing between ranks, in inches
    pub rank_separation: f64,
    /// How edges are routed
    pub edge_routing: EdgeRouting,
    /// Node label font size, in points
    pub font_size: f64,
    /// Rank direction
    pub direction: Direction,
    /// Output file stem; derived from the diagram name when unset
    pub filename: Option<String>,
    /// Raw graph attribute overrides, applied last
    pub graph_attrs: BTreeMap<String, String>,
    /// Raw overrides for the default node attributes
    pub node_attrs: BTreeMap<String, String>,
    /// Raw overrides for the default edge attributes
    pub edge_attrs: BTreeMap<String, String>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            label_loc: "bbc".to_string(),
            node_separation: 0.2,
            padding: 0.2,
            rank_separation: 0.75,
            edge_routing: EdgeRouting::Spline,
            font_size: 12.0,
            direction: Direction::LeftRight,
            filename: None,
            graph_attrs: BTreeMap::new(),
            node_attrs: BTreeMap::new(),
            edge_attrs: BTreeMap::new(),
        }
    }
}

impl DiagramConfig {
    /// Create a configuration with the default layout hints
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_edge_routing(mut self, routing: EdgeRouting) -> Self {
        self.edge_routing = routing;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Add a raw graph attribute, overriding any generated value
    pub fn with_graph_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.graph_attrs.insert(key.into(), value.into());
        self
    }

    /// Add a raw default node attribute
    pub fn with_node_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_attrs.insert(key.into(), value.into());
        self
    }

    /// Add a raw default edge attribute
    pub fn with_edge_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.edge_attrs.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documentation_diagrams() {
        let config = DiagramConfig::default();
        assert_eq!(config.label, "");
        assert_eq!(config.label_loc, "bbc");
        assert_eq!(config.node_separation, 0.2);
        assert_eq!(config.padding, 0.2);
        assert_eq!(config.rank_separation, 0.75);
        assert_eq!(config.edge_routing, EdgeRouting::Spline);
        assert_eq!(config.font_size, 12.0);
        assert_eq!(config.direction, Direction::LeftRight);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DiagramConfig =
            serde_json::from_str(r#"{"font_size": 14.0, "edge_routing": "ortho"}"#).unwrap();
        assert_eq!(config.font_size, 14.0);
        assert_eq!(config.edge_routing, EdgeRouting::Ortho);
        assert_eq!(config.rank_separation, 0.75);
        assert!(config.filename.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = DiagramConfig::new()
            .with_label("Title")
            .with_filename("out")
            .with_graph_attr("bgcolor", "white");
        assert_eq!(config.label, "Title");
        assert_eq!(config.filename.as_deref(), Some("out"));
        assert_eq!(config.graph_attrs.get("bgcolor").map(String::as_str), Some("white"));
    }
}
