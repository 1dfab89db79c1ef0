//! Descriptor plans.
//!
//! A [`Plan`] is the output of one declarative pass: descriptors in emission order,
//! each with a deferred body and explicit dependency edges. A descriptor may only
//! depend on descriptors emitted before it, so emission order is always a valid
//! apply order and the graph cannot contain cycles.
//!
//! [`Plan::resolve`] turns the plan into a [`ResolvedPlan`] of concrete resources,
//! which [`ResolvedPlan::apply`] hands to an [`Engine`].

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, trace};

use crate::core::deferred::{Deferred, Resolve};
use crate::core::engine::Engine;
use crate::core::resource::{Resource, ResourceKind};
use crate::error::{ComposeError, Error, ResolveError, Result};

/// Logical name of a descriptor: `<kind>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    pub fn new(kind: ResourceKind, name: &str) -> Self {
        Urn(format!("{}/{}", kind.slug(), name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named group of descriptors composed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    type_token: &'static str,
    name: String,
}

impl Component {
    pub fn new(type_token: &'static str, name: impl Into<String>) -> Self {
        Self {
            type_token,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_token(&self) -> &'static str {
        self.type_token
    }

    /// `<type token>/<name>`
    pub fn urn(&self) -> String {
        format!("{}/{}", self.type_token, self.name)
    }
}

/// Desired state of one resource, not yet resolved.
#[derive(Debug, Clone)]
pub struct Descriptor {
    urn: Urn,
    kind: ResourceKind,
    name: String,
    parent: Option<String>,
    depends_on: Vec<Urn>,
    body: Deferred<Option<Resource>>,
}

impl Descriptor {
    /// A descriptor that always resolves to a resource.
    pub fn new(kind: ResourceKind, name: impl Into<String>, body: Deferred<Resource>) -> Self {
        Self::optional(kind, name, body.map(Some))
    }

    /// A descriptor whose resource may resolve to nothing.
    ///
    /// A `None` body is dropped at resolution together with every edge pointing at it.
    pub fn optional(
        kind: ResourceKind,
        name: impl Into<String>,
        body: Deferred<Option<Resource>>,
    ) -> Self {
        let name = name.into();
        Self {
            urn: Urn::new(kind, &name),
            kind,
            name,
            parent: None,
            depends_on: Vec::new(),
            body,
        }
    }

    /// Group under a component.
    pub fn with_parent(mut self, component: &Component) -> Self {
        self.parent = Some(component.urn());
        self
    }

    /// Add a dependency edge.
    pub fn depends_on(mut self, urn: &Urn) -> Self {
        if !self.depends_on.contains(urn) {
            self.depends_on.push(urn.clone());
        }
        self
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn dependencies(&self) -> &[Urn] {
        &self.depends_on
    }

    pub fn body(&self) -> &Deferred<Option<Resource>> {
        &self.body
    }
}

/// Descriptors of one declarative pass, in emission order.
#[derive(Debug, Default)]
pub struct Plan {
    descriptors: Vec<Descriptor>,
    emitted: BTreeSet<Urn>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ComposeError::DuplicateDescriptor` if the URN was already emitted, or
    /// `ComposeError::UnknownDependency` if a dependency has not been emitted yet.
    pub fn emit(&mut self, descriptor: Descriptor) -> Result<Urn> {
        let urn = descriptor.urn.clone();
        if self.emitted.contains(&urn) {
            return Err(ComposeError::DuplicateDescriptor(urn.to_string()).into());
        }
        if let Some(missing) = descriptor
            .depends_on
            .iter()
            .find(|dep| !self.emitted.contains(*dep))
        {
            return Err(ComposeError::UnknownDependency {
                descriptor: urn.to_string(),
                dependency: missing.to_string(),
            }
            .into());
        }

        trace!(urn = %urn, dependencies = descriptor.depends_on.len(), "emitted descriptor");
        self.emitted.insert(urn.clone());
        self.descriptors.push(descriptor);
        Ok(urn)
    }

    pub fn contains(&self, urn: &Urn) -> bool {
        self.emitted.contains(urn)
    }

    pub fn get(&self, urn: &Urn) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| &d.urn == urn)
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Resolve every descriptor body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Descriptor` naming the first descriptor whose body fails to
    /// resolve.
    pub fn resolve(&self, resolver: &dyn Resolve) -> Result<ResolvedPlan> {
        debug!(descriptors = self.len(), "resolving plan");

        let mut resolved = Vec::with_capacity(self.descriptors.len());
        let mut skipped = BTreeSet::new();

        for descriptor in &self.descriptors {
            let attribute = |e: Error| Error::Descriptor {
                descriptor: descriptor.urn.to_string(),
                source: Box::new(e),
            };

            let resource = match descriptor.body.resolve(resolver).map_err(attribute)? {
                Some(resource) => resource,
                None => {
                    debug!(urn = %descriptor.urn, "resolved to nothing, skipping");
                    skipped.insert(descriptor.urn.clone());
                    continue;
                }
            };
            debug_assert_eq!(resource.kind(), descriptor.kind);

            let fingerprint = fingerprint(&resource).map_err(attribute)?;
            resolved.push(ResolvedDescriptor {
                urn: descriptor.urn.clone(),
                kind: descriptor.kind,
                name: descriptor.name.clone(),
                parent: descriptor.parent.clone(),
                depends_on: descriptor
                    .depends_on
                    .iter()
                    .filter(|dep| !skipped.contains(*dep))
                    .cloned()
                    .collect(),
                secret: descriptor.body.is_secret(),
                fingerprint,
                resource,
            });
        }

        debug!(
            resolved = resolved.len(),
            skipped = skipped.len(),
            "plan resolved"
        );
        Ok(ResolvedPlan {
            descriptors: resolved,
        })
    }
}

/// sha256 of the resource's JSON body.
fn fingerprint(resource: &Resource) -> Result<String> {
    let bytes = serde_json::to_vec(resource).map_err(ResolveError::Fingerprint)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// A descriptor with its resource resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDescriptor {
    pub urn: Urn,
    pub kind: ResourceKind,
    pub name: String,
    pub parent: Option<String>,
    /// Dependencies that resolved to a resource
    pub depends_on: Vec<Urn>,
    /// Derived from a secret value
    pub secret: bool,
    /// Change key for the engine: equal bodies have equal fingerprints
    pub fingerprint: String,
    pub resource: Resource,
}

/// Resolved descriptors, in emission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedPlan {
    descriptors: Vec<ResolvedDescriptor>,
}

impl ResolvedPlan {
    pub fn descriptors(&self) -> &[ResolvedDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, urn: &Urn) -> Option<&ResolvedDescriptor> {
        self.descriptors.iter().find(|d| &d.urn == urn)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResolvedDescriptor> {
        self.descriptors.iter().filter(move |d| d.kind == kind)
    }

    /// Hand every descriptor to the engine in emission order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Reconcile` naming the descriptor the engine rejected. Nothing
    /// after it is applied.
    pub fn apply(&self, engine: &mut dyn Engine) -> Result<usize> {
        info!(engine = engine.name(), descriptors = self.len(), "applying plan");

        for descriptor in &self.descriptors {
            debug!(urn = %descriptor.urn, fingerprint = %descriptor.fingerprint, "applying");
            engine
                .apply(descriptor)
                .map_err(|source| Error::Reconcile {
                    descriptor: descriptor.urn.to_string(),
                    source,
                })?;
        }
        engine.finish().map_err(|source| Error::Reconcile {
            descriptor: "plan index".to_string(),
            source,
        })?;

        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::DryRun;
    use crate::core::resource::{k8s, Secret};
    use crate::core::stack::StackOutputs;
    use crate::error::ReconcileError;
    use serde_json::json;

    fn secret(name: &str) -> Descriptor {
        Descriptor::new(
            ResourceKind::Secret,
            name,
            Deferred::known(Resource::Secret(Secret::new(name))),
        )
    }

    fn service(name: &str) -> Descriptor {
        let spec = k8s::ServiceSpec {
            selector: Default::default(),
            ports: vec![],
        };
        Descriptor::new(
            ResourceKind::Service,
            name,
            Deferred::known(Resource::Service(k8s::Service::new(name, spec))),
        )
    }

    fn resolver() -> StackOutputs {
        StackOutputs::default().with_output("cluster", json!("eks"))
    }

    #[test]
    fn test_urn_format() {
        assert_eq!(
            Urn::new(ResourceKind::Ingress, "shop-ingress").as_str(),
            "ingress/shop-ingress"
        );
    }

    #[test]
    fn test_emit_rejects_duplicates() {
        let mut plan = Plan::new();
        plan.emit(secret("a")).unwrap();
        let err = plan.emit(secret("a")).unwrap_err();
        assert!(matches!(err, Error::Compose(ComposeError::DuplicateDescriptor(_))));
    }

    #[test]
    fn test_emit_rejects_unknown_dependency() {
        let mut plan = Plan::new();
        let missing = Urn::new(ResourceKind::Secret, "later");
        let err = plan.emit(service("svc").depends_on(&missing)).unwrap_err();
        assert!(matches!(
            err,
            Error::Compose(ComposeError::UnknownDependency { ref dependency, .. })
                if dependency == "secret/later"
        ));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_depends_on_deduplicates() {
        let urn = Urn::new(ResourceKind::Secret, "a");
        let d = service("svc").depends_on(&urn).depends_on(&urn);
        assert_eq!(d.dependencies().len(), 1);
    }

    #[test]
    fn test_with_parent() {
        let component = Component::new("berth:infrastructure:Application", "shop");
        let d = secret("a").with_parent(&component);
        assert_eq!(d.parent(), Some("berth:infrastructure:Application/shop"));
    }

    #[test]
    fn test_resolve_drops_empty_bodies_and_their_edges() {
        let mut plan = Plan::new();
        let empty = plan
            .emit(Descriptor::optional(
                ResourceKind::Secret,
                "maybe",
                Deferred::known(None),
            ))
            .unwrap();
        let svc = plan.emit(service("svc").depends_on(&empty)).unwrap();

        let resolved = plan.resolve(&resolver()).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.get(&empty).is_none());
        assert!(resolved.get(&svc).unwrap().depends_on.is_empty());
    }

    #[test]
    fn test_resolve_failure_names_descriptor() {
        let mut plan = Plan::new();
        let body = Deferred::stack_output("missing")
            .map(|name| Resource::Secret(Secret::new(name)));
        plan.emit(Descriptor::new(ResourceKind::Secret, "db", body))
            .unwrap();

        let err = plan.resolve(&resolver()).unwrap_err();
        match err {
            Error::Descriptor { descriptor, source } => {
                assert_eq!(descriptor, "secret/db");
                assert!(matches!(
                    *source,
                    Error::Resolve(ResolveError::MissingStackOutput(_))
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = fingerprint(&Resource::Secret(Secret::new("a"))).unwrap();
        let a2 = fingerprint(&Resource::Secret(Secret::new("a"))).unwrap();
        let b = fingerprint(&Resource::Secret(Secret::new("b"))).unwrap();
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_secret_mark_carried() {
        let mut plan = Plan::new();
        let body = Deferred::known(Resource::Secret(Secret::new("s"))).into_secret();
        let urn = plan
            .emit(Descriptor::new(ResourceKind::Secret, "s", body))
            .unwrap();
        let resolved = plan.resolve(&resolver()).unwrap();
        assert!(resolved.get(&urn).unwrap().secret);
    }

    #[test]
    fn test_apply_in_emission_order() {
        let mut plan = Plan::new();
        let a = plan.emit(secret("a")).unwrap();
        let b = plan.emit(service("b").depends_on(&a)).unwrap();
        let resolved = plan.resolve(&resolver()).unwrap();

        let mut engine = DryRun::new();
        assert_eq!(resolved.apply(&mut engine).unwrap(), 2);
        assert_eq!(engine.applied(), vec![&a, &b]);
        assert!(engine.finished());
    }

    #[test]
    fn test_apply_stops_at_rejected_descriptor() {
        let mut plan = Plan::new();
        let a = plan.emit(secret("a")).unwrap();
        plan.emit(service("b").depends_on(&a)).unwrap();
        let resolved = plan.resolve(&resolver()).unwrap();

        let mut engine = DryRun::rejecting(a.clone());
        let err = resolved.apply(&mut engine).unwrap_err();
        match err {
            Error::Reconcile { descriptor, source } => {
                assert_eq!(descriptor, "secret/a");
                assert!(matches!(source, ReconcileError::Rejected { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(engine.applied().is_empty());
        assert!(!engine.finished());
    }
}
