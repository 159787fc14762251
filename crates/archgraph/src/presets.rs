//! Built-in deployment diagrams
//!
//! Component diagrams for the two authentication deployments: federated
//! (general access) and local OpenID Connect (restricted access).

use crate::core::{DiagramConfig, EdgeDirection, NodeCategory, Result};
use crate::diagram::{Diagram, Edge};

/// A named built-in diagram
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> Result<Diagram>,
}

impl Preset {
    /// Build a fresh diagram for this preset
    pub fn build(&self) -> Result<Diagram> {
        (self.build)()
    }
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "federated",
        description: "General access deployment with federated authentication",
        build: federated,
    },
    Preset {
        name: "local",
        description: "Restricted access deployment with a local OpenID Connect provider",
        build: local,
    },
];

/// All built-in diagrams
pub fn all() -> &'static [Preset] {
    PRESETS
}

/// Names of all built-in diagrams
pub fn names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

/// Look up a built-in diagram by name
pub fn by_name(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

fn config(filename: &str) -> DiagramConfig {
    DiagramConfig::default().with_filename(filename)
}

/// General access deployment, written to `arch-federated`
pub fn federated() -> Result<Diagram> {
    let mut diagram = Diagram::with_config("General access deployment", config("arch-federated"));

    let user = diagram.declare_node("End user", NodeCategory::EndUser);
    let idp = diagram.declare_node("Identity provider", NodeCategory::Server);

    let (idm, ingress, gafaelfawr, service_a, service_b) = {
        let mut platform = diagram.cluster("Science Platform");
        let idm = platform.declare_node("Identity management", NodeCategory::Server);

        let mut kubernetes = platform.cluster("Kubernetes");
        let ingress = kubernetes.declare_node("Ingress", NodeCategory::LoadBalancer);
        let gafaelfawr = kubernetes.declare_node("Authentication", NodeCategory::KubernetesEngine);
        let service_a = kubernetes.declare_node("Service A", NodeCategory::KubernetesEngine);
        let service_b = kubernetes.declare_node("Service B", NodeCategory::KubernetesEngine);
        (idm, ingress, gafaelfawr, service_a, service_b)
    };

    diagram.connect(user, idp)?;
    diagram.connect(user, idm)?;
    diagram.declare_edge(idp, idm, Edge::new().direction(EdgeDirection::Undirected))?;
    diagram.connect(idm, gafaelfawr)?;
    diagram.chain(&[user, ingress, gafaelfawr])?;
    diagram.connect(ingress, service_a)?;
    diagram.connect(ingress, service_b)?;
    diagram.declare_edge(service_a, ingress, Edge::labeled("To service B"))?;

    Ok(diagram)
}

/// Restricted access deployment, written to `arch-local`
pub fn local() -> Result<Diagram> {
    let mut diagram = Diagram::with_config("Restricted access deployment", config("arch-local"));

    let user = diagram.declare_node("End user", NodeCategory::EndUser);
    let idp = diagram.declare_node("OpenID Connect\nprovider", NodeCategory::Server);
    let ldap = diagram.declare_node("LDAP", NodeCategory::Storage);

    let (ingress, gafaelfawr, service_a, service_b) = {
        let mut kubernetes = diagram.cluster("Kubernetes");
        let ingress = kubernetes.declare_node("Ingress", NodeCategory::LoadBalancer);
        let gafaelfawr = kubernetes.declare_node("Authentication", NodeCategory::KubernetesEngine);
        let service_a = kubernetes.declare_node("Service A", NodeCategory::KubernetesEngine);
        let service_b = kubernetes.declare_node("Service B", NodeCategory::KubernetesEngine);
        (ingress, gafaelfawr, service_a, service_b)
    };

    diagram.chain(&[user, idp, gafaelfawr])?;
    diagram.declare_edge(gafaelfawr, ldap, Edge::new().direction(EdgeDirection::Reverse))?;
    diagram.chain(&[user, ingress, gafaelfawr])?;
    diagram.connect(ingress, service_a)?;
    diagram.connect(ingress, service_b)?;
    diagram.declare_edge(service_a, ingress, Edge::labeled("To service B"))?;

    Ok(diagram)
}
