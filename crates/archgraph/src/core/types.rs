//! Core type definitions for diagram building
//!
//! This module contains the fundamental types used throughout archgraph:
//! node categories, edge direction and style, output formats, layout hints
//! and the opaque node handle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visual category of a node
///
/// Each category maps to a fixed Graphviz shape and fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    /// A person using the system
    EndUser,
    /// A plain server or external service
    #[default]
    Server,
    /// Ingress or load balancer
    LoadBalancer,
    /// A workload running in Kubernetes
    KubernetesEngine,
    /// Storage or directory service (LDAP, databases)
    Storage,
    /// Identity service such as an OpenID Connect provider
    IdentityService,
    /// Anything else
    Generic,
}

impl NodeCategory {
    /// All categories in palette order
    pub fn all() -> &'static [NodeCategory] {
        &[
            NodeCategory::EndUser,
            NodeCategory::Server,
            NodeCategory::LoadBalancer,
            NodeCategory::KubernetesEngine,
            NodeCategory::Storage,
            NodeCategory::IdentityService,
            NodeCategory::Generic,
        ]
    }

    /// Graphviz shape used for this category
    pub fn shape(&self) -> &'static str {
        match self {
            NodeCategory::EndUser => "egg",
            NodeCategory::Server => "box3d",
            NodeCategory::LoadBalancer => "hexagon",
            NodeCategory::KubernetesEngine => "component",
            NodeCategory::Storage => "cylinder",
            NodeCategory::IdentityService => "octagon",
            NodeCategory::Generic => "box",
        }
    }

    /// Fill color used for this category
    pub fn fill_color(&self) -> &'static str {
        match self {
            NodeCategory::EndUser => "#F5B7B1",
            NodeCategory::Server => "#D5DBDB",
            NodeCategory::LoadBalancer => "#AED6F1",
            NodeCategory::KubernetesEngine => "#A9CCE3",
            NodeCategory::Storage => "#F9E79F",
            NodeCategory::IdentityService => "#D2B4DE",
            NodeCategory::Generic => "#FFFFFF",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeCategory::EndUser => write!(f, "end-user"),
            NodeCategory::Server => write!(f, "server"),
            NodeCategory::LoadBalancer => write!(f, "load-balancer"),
            NodeCategory::KubernetesEngine => write!(f, "kubernetes-engine"),
            NodeCategory::Storage => write!(f, "storage"),
            NodeCategory::IdentityService => write!(f, "identity-service"),
            NodeCategory::Generic => write!(f, "generic"),
        }
    }
}

/// Direction of an edge relative to its declared source and target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeDirection {
    /// Arrow from source to target: `a >> b`
    #[default]
    Forward,
    /// Arrow from target back to source: `a << b`
    Reverse,
    /// Arrowheads on both ends
    Both,
    /// Plain line without arrowheads: `a - b`
    Undirected,
}

impl EdgeDirection {
    /// Value of the Graphviz `dir` attribute
    pub fn dot_dir(&self) -> &'static str {
        match self {
            EdgeDirection::Forward => "forward",
            EdgeDirection::Reverse => "back",
            EdgeDirection::Both => "both",
            EdgeDirection::Undirected => "none",
        }
    }
}

impl fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeDirection::Forward => write!(f, ">>"),
            EdgeDirection::Reverse => write!(f, "<<"),
            EdgeDirection::Both => write!(f, "<>"),
            EdgeDirection::Undirected => write!(f, "-"),
        }
    }
}

/// Line style of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Bold,
}

impl fmt::Display for EdgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeStyle::Solid => write!(f, "solid"),
            EdgeStyle::Dashed => write!(f, "dashed"),
            EdgeStyle::Dotted => write!(f, "dotted"),
            EdgeStyle::Bold => write!(f, "bold"),
        }
    }
}

/// Edge routing style, the Graphviz `splines` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRouting {
    /// Straight line segments
    Straight,
    /// Smooth splines
    #[default]
    Spline,
    /// Polylines
    Polyline,
    /// Axis-aligned segments
    Ortho,
    /// Curved arcs
    Curved,
}

impl fmt::Display for EdgeRouting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeRouting::Straight => write!(f, "line"),
            EdgeRouting::Spline => write!(f, "spline"),
            EdgeRouting::Polyline => write!(f, "polyline"),
            EdgeRouting::Ortho => write!(f, "ortho"),
            EdgeRouting::Curved => write!(f, "curved"),
        }
    }
}

impl FromStr for EdgeRouting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" | "line" => Ok(EdgeRouting::Straight),
            "spline" | "splines" => Ok(EdgeRouting::Spline),
            "polyline" => Ok(EdgeRouting::Polyline),
            "ortho" => Ok(EdgeRouting::Ortho),
            "curved" => Ok(EdgeRouting::Curved),
            _ => Err(format!("Unknown edge routing: {}", s)),
        }
    }
}

/// Rank direction of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Top to bottom (TB)
    TopBottom,
    /// Bottom to top (BT)
    BottomTop,
    /// Left to right (LR)
    #[default]
    LeftRight,
    /// Right to left (RL)
    RightLeft,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TB" | "TD" => Ok(Direction::TopBottom),
            "BT" => Ok(Direction::BottomTop),
            "LR" => Ok(Direction::LeftRight),
            "RL" => Ok(Direction::RightLeft),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::TopBottom => write!(f, "TB"),
            Direction::BottomTop => write!(f, "BT"),
            Direction::LeftRight => write!(f, "LR"),
            Direction::RightLeft => write!(f, "RL"),
        }
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
    Svg,
    Pdf,
    /// The DOT description itself, no backend process involved
    Dot,
}

impl OutputFormat {
    /// File extension, also the Graphviz `-T` argument
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Dot => "dot",
        }
    }

    /// Guess the format from a path's extension
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            "dot" | "gv" => Ok(OutputFormat::Dot),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Opaque reference to a node declared in a specific diagram
///
/// Handles are only meaningful for the diagram that returned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) diagram: u64,
    pub(crate) index: usize,
}
