//! Diagram builder
//!
//! A [`Diagram`] collects node, cluster and edge declarations and is consumed
//! by [`Diagram::render`]. Layout is left to the backend; declaration order
//! is preserved because `dot` uses it as a placement hint.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, span, trace, warn, Level};

use crate::core::backend::write_atomically;
use crate::core::{
    dot, DiagramConfig, DiagramError, EdgeDirection, EdgeStyle, NodeCategory, NodeHandle,
    OutputFormat, RenderBackend, Result,
};

static NEXT_DIAGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// A declared node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Display label, may contain newlines
    pub label: String,
    /// Visual category
    pub category: NodeCategory,
    /// Index of the innermost enclosing cluster
    pub cluster: Option<usize>,
}

/// A declared edge between two node indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeData {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
    pub direction: EdgeDirection,
    pub color: Option<String>,
    pub style: EdgeStyle,
}

/// A declared cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterData {
    /// Title drawn on the cluster border
    pub name: String,
    /// Index of the enclosing cluster, if nested
    pub parent: Option<usize>,
}

/// Edge declaration options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    label: Option<String>,
    direction: EdgeDirection,
    color: Option<String>,
    style: EdgeStyle,
}

impl Edge {
    /// Forward, unlabeled, solid edge
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward edge carrying a label
    pub fn labeled(label: impl Into<String>) -> Self {
        Self::new().label(label)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn direction(mut self, direction: EdgeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }
}

/// Result of a successful render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Where the image was written
    pub path: PathBuf,
    /// Format of the image
    pub format: OutputFormat,
    /// Size of the written file
    pub bytes: usize,
}

/// Diagram under construction
#[derive(Debug)]
pub struct Diagram {
    id: u64,
    name: String,
    config: DiagramConfig,
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    clusters: Vec<ClusterData>,
    /// Stack of clusters whose scope is still open
    open_clusters: Vec<usize>,
}

impl Diagram {
    /// Create an empty diagram with the default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, DiagramConfig::default())
    }

    /// Create an empty diagram with a specific configuration
    pub fn with_config(name: impl Into<String>, config: DiagramConfig) -> Self {
        let id = NEXT_DIAGRAM_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            name: name.into(),
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            clusters: Vec::new(),
            open_clusters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DiagramConfig {
        &mut self.config
    }

    /// Declared nodes in declaration order
    pub fn nodes(&self) -> &[NodeData] {
        &self.nodes
    }

    /// Declared edges in declaration order
    pub fn edges(&self) -> &[EdgeData] {
        &self.edges
    }

    /// Declared clusters in declaration order
    pub fn clusters(&self) -> &[ClusterData] {
        &self.clusters
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Look up the node a handle refers to
    pub fn node(&self, handle: NodeHandle) -> Option<&NodeData> {
        if handle.diagram != self.id {
            return None;
        }
        self.nodes.get(handle.index)
    }

    /// Output file stem: the configured filename, or the name lowercased
    /// with spaces replaced by underscores
    pub fn default_filename(&self) -> String {
        match &self.config.filename {
            Some(filename) if !filename.is_empty() => filename.clone(),
            _ => self.name.to_lowercase().replace(' ', "_"),
        }
    }

    /// Register a node inside the innermost open cluster
    pub fn declare_node(&mut self, label: impl Into<String>, category: NodeCategory) -> NodeHandle {
        let label = label.into();
        let cluster = self.open_clusters.last().copied();
        trace!(node_label = %label, node_category = %category, cluster = ?cluster, "Declaring node");

        let index = self.nodes.len();
        self.nodes.push(NodeData {
            label,
            category,
            cluster,
        });
        debug!(node_count = self.nodes.len(), "Node declared");

        NodeHandle {
            diagram: self.id,
            index,
        }
    }

    /// Open a cluster; it stays open until the returned scope is dropped
    pub fn cluster(&mut self, name: impl Into<String>) -> ClusterScope<'_> {
        let name = name.into();
        let parent = self.open_clusters.last().copied();
        let index = self.clusters.len();
        trace!(cluster_name = %name, cluster_index = index, parent = ?parent, "Opening cluster");

        self.clusters.push(ClusterData { name, parent });
        self.open_clusters.push(index);
        ClusterScope {
            diagram: self,
            index,
        }
    }

    /// Run `build` with a cluster open, closing it afterwards
    pub fn with_cluster<R>(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut Diagram) -> R,
    ) -> R {
        let mut scope = self.cluster(name);
        build(&mut *scope)
    }

    fn resolve(&self, handle: NodeHandle, role: &str) -> Result<usize> {
        if handle.diagram != self.id {
            return Err(DiagramError::declaration_error(format!(
                "{} node handle belongs to a different diagram than '{}'",
                role, self.name
            )));
        }
        if handle.index >= self.nodes.len() {
            return Err(DiagramError::declaration_error(format!(
                "{} node #{} was never declared in '{}'",
                role, handle.index, self.name
            )));
        }
        Ok(handle.index)
    }

    /// Record an edge; both ends must be nodes of this diagram
    pub fn declare_edge(&mut self, from: NodeHandle, to: NodeHandle, edge: Edge) -> Result<()> {
        let from = self.resolve(from, "source")?;
        let to = self.resolve(to, "target")?;
        trace!(
            edge_from = from,
            edge_to = to,
            edge_direction = %edge.direction,
            edge_label = ?edge.label,
            "Declaring edge"
        );

        self.edges.push(EdgeData {
            from,
            to,
            label: edge.label,
            direction: edge.direction,
            color: edge.color,
            style: edge.style,
        });
        debug!(edge_count = self.edges.len(), "Edge declared");
        Ok(())
    }

    /// Forward, unlabeled edge
    pub fn connect(&mut self, from: NodeHandle, to: NodeHandle) -> Result<()> {
        self.declare_edge(from, to, Edge::new())
    }

    /// Forward edges between consecutive nodes: `a >> b >> c`
    pub fn chain(&mut self, nodes: &[NodeHandle]) -> Result<()> {
        for pair in nodes.windows(2) {
            self.connect(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// The Graphviz description of the diagram as declared so far
    pub fn to_dot(&self) -> String {
        dot::to_dot(self)
    }

    /// Render through `backend` and write the image to `output_path`
    ///
    /// Consumes the diagram. The file is written only once the backend has
    /// produced the complete image.
    pub fn render<B>(
        self,
        output_path: impl AsRef<Path>,
        format: OutputFormat,
        backend: &B,
    ) -> Result<RenderOutput>
    where
        B: RenderBackend + ?Sized,
    {
        let path = output_path.as_ref();
        let render_span = span!(
            Level::INFO,
            "render",
            diagram = %self.name,
            format = %format,
            backend = backend.name()
        );
        let _enter = render_span.enter();

        let bytes = self.produce(format, backend)?;
        write_atomically(path, &bytes)?;

        info!(path = %path.display(), bytes = bytes.len(), "Diagram rendered");
        Ok(RenderOutput {
            path: path.to_path_buf(),
            format,
            bytes: bytes.len(),
        })
    }

    /// Render every format and write `stem.<extension>` for each
    ///
    /// All images are produced before any file is written. If a write fails,
    /// the files already written by this call are removed again.
    pub fn render_formats<B>(
        self,
        stem: impl AsRef<Path>,
        formats: &[OutputFormat],
        backend: &B,
    ) -> Result<Vec<RenderOutput>>
    where
        B: RenderBackend + ?Sized,
    {
        let render_span = span!(
            Level::INFO,
            "render_formats",
            diagram = %self.name,
            format_count = formats.len(),
            backend = backend.name()
        );
        let _enter = render_span.enter();

        let mut unique: Vec<OutputFormat> = Vec::with_capacity(formats.len());
        for format in formats {
            if !unique.contains(format) {
                unique.push(*format);
            }
        }
        if unique.is_empty() {
            return Err(DiagramError::render_error("no output format requested"));
        }

        let mut rendered = Vec::with_capacity(unique.len());
        for format in unique {
            rendered.push((format, self.produce(format, backend)?));
        }

        let mut outputs: Vec<RenderOutput> = Vec::with_capacity(rendered.len());
        for (format, bytes) in rendered {
            let path = path_with_extension(stem.as_ref(), format);
            if let Err(err) = write_atomically(&path, &bytes) {
                for written in &outputs {
                    if let Err(e) = std::fs::remove_file(&written.path) {
                        warn!(
                            path = %written.path.display(),
                            error = %e,
                            "Could not remove partial output"
                        );
                    }
                }
                return Err(err);
            }
            info!(path = %path.display(), bytes = bytes.len(), "Diagram rendered");
            outputs.push(RenderOutput {
                path,
                format,
                bytes: bytes.len(),
            });
        }
        Ok(outputs)
    }

    fn produce<B>(&self, format: OutputFormat, backend: &B) -> Result<Vec<u8>>
    where
        B: RenderBackend + ?Sized,
    {
        let dot = self.to_dot();
        let bytes = backend.render(&dot, format)?;
        if bytes.is_empty() {
            return Err(DiagramError::render_error(format!(
                "{} backend produced no {} output",
                backend.name(),
                format
            )));
        }
        Ok(bytes)
    }
}

/// `stem` plus `.ext`, leaving any dots already in the stem alone
fn path_with_extension(stem: &Path, format: OutputFormat) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

/// An open cluster; nodes declared through it are drawn inside the cluster
///
/// Derefs to the [`Diagram`], so every builder method is available. The
/// cluster closes when the scope is dropped.
#[derive(Debug)]
pub struct ClusterScope<'a> {
    diagram: &'a mut Diagram,
    index: usize,
}

impl ClusterScope<'_> {
    /// Index of this cluster in declaration order
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Deref for ClusterScope<'_> {
    type Target = Diagram;

    fn deref(&self) -> &Diagram {
        self.diagram
    }
}

impl DerefMut for ClusterScope<'_> {
    fn deref_mut(&mut self) -> &mut Diagram {
        self.diagram
    }
}

impl Drop for ClusterScope<'_> {
    fn drop(&mut self) {
        // Borrowing forces scopes to close innermost first
        let closed = self.diagram.open_clusters.pop();
        debug_assert_eq!(closed, Some(self.index));
        trace!(cluster_index = self.index, "Closed cluster");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_nodes_and_edges() {
        let mut diagram = Diagram::new("Basic");
        let user = diagram.declare_node("End user", NodeCategory::EndUser);
        let idp = diagram.declare_node("Identity provider", NodeCategory::Server);

        diagram.connect(user, idp).unwrap();

        assert_eq!(diagram.node_count(), 2);
        assert_eq!(diagram.edge_count(), 1);
        assert_eq!(diagram.node(user).unwrap().label, "End user");
        let edge = &diagram.edges()[0];
        assert_eq!((edge.from, edge.to), (0, 1));
        assert_eq!(edge.direction, EdgeDirection::Forward);
    }

    #[test]
    fn test_duplicate_labels_allowed() {
        let mut diagram = Diagram::new("Dupes");
        let a = diagram.declare_node("Service", NodeCategory::KubernetesEngine);
        let b = diagram.declare_node("Service", NodeCategory::KubernetesEngine);
        assert_ne!(a, b);
        assert_eq!(diagram.node_count(), 2);
    }

    #[test]
    fn test_cluster_scope_membership() {
        let mut diagram = Diagram::new("Clusters");
        let outside = diagram.declare_node("Outside", NodeCategory::Server);
        let (inner, nested) = {
            let mut platform = diagram.cluster("Platform");
            let inner = platform.declare_node("Inner", NodeCategory::Server);
            let mut k8s = platform.cluster("Kubernetes");
            let nested = k8s.declare_node("Nested", NodeCategory::KubernetesEngine);
            (inner, nested)
        };
        let after = diagram.declare_node("After", NodeCategory::Server);

        assert_eq!(diagram.node(outside).unwrap().cluster, None);
        assert_eq!(diagram.node(inner).unwrap().cluster, Some(0));
        assert_eq!(diagram.node(nested).unwrap().cluster, Some(1));
        assert_eq!(diagram.node(after).unwrap().cluster, None);
        assert_eq!(diagram.clusters()[1].parent, Some(0));
    }

    #[test]
    fn test_cluster_scope_index() {
        let mut diagram = Diagram::new("Indexes");
        {
            let mut first = diagram.cluster("First");
            assert_eq!(first.index(), 0);
            let second = first.cluster("Second");
            assert_eq!(second.index(), 1);
        }
        let third = diagram.cluster("Third");
        assert_eq!(third.index(), 2);
    }

    #[test]
    fn test_with_cluster_closure() {
        let mut diagram = Diagram::new("Closure");
        let node = diagram.with_cluster("Group", |d| d.declare_node("A", NodeCategory::Storage));
        assert_eq!(diagram.node(node).unwrap().cluster, Some(0));
        let outside = diagram.declare_node("B", NodeCategory::Storage);
        assert_eq!(diagram.node(outside).unwrap().cluster, None);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut other = Diagram::new("Other");
        let foreign = other.declare_node("Foreign", NodeCategory::Server);

        let mut diagram = Diagram::new("Main");
        let local = diagram.declare_node("Local", NodeCategory::Server);

        let err = diagram.connect(local, foreign).unwrap_err();
        assert!(err.is_declaration());
        assert!(err.to_string().contains("different diagram"));
        assert_eq!(diagram.edge_count(), 0);
        assert!(diagram.node(foreign).is_none());
    }

    #[test]
    fn test_chain_declares_consecutive_edges() {
        let mut diagram = Diagram::new("Chain");
        let a = diagram.declare_node("A", NodeCategory::EndUser);
        let b = diagram.declare_node("B", NodeCategory::LoadBalancer);
        let c = diagram.declare_node("C", NodeCategory::KubernetesEngine);
        diagram.chain(&[a, b, c]).unwrap();

        let pairs: Vec<_> = diagram.edges().iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_default_filename() {
        let diagram = Diagram::new("General access deployment");
        assert_eq!(diagram.default_filename(), "general_access_deployment");

        let config = DiagramConfig::default().with_filename("arch-federated");
        let diagram = Diagram::with_config("General access deployment", config);
        assert_eq!(diagram.default_filename(), "arch-federated");
    }

    #[test]
    fn test_path_with_extension_keeps_dots() {
        let path = path_with_extension(Path::new("out/v1.2"), OutputFormat::Svg);
        assert_eq!(path, PathBuf::from("out/v1.2.svg"));
    }
}
