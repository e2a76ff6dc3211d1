//! Two-pass reference restoration.
//!
//! A freshly decoded graph carries whatever ids its writer used. Restoration
//! makes ids dense and authoritative again, then re-resolves every weak
//! reference against them:
//!
//! 1. **Renumber**: walks master edges only. Every manager reached resets
//!    its family generator (once per family), hands each entity a fresh id
//!    and records `old → new` in the [`RestoreContext`].
//! 2. **Reconnect**: walks every edge. Entities rewrite their
//!    [`WeakRef`](crate::WeakRef)s through the remap table. References to ids
//!    nobody renumbered are left null and reported as faults.
//!
//! Each pass keeps its own visited set keyed by node identity, so shared
//! nodes and cycles are processed exactly once and the walk terminates.

use parking_lot::RwLock;
use planstore_types::EntityId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::RestoreError;

/// A node that takes part in restoration.
///
/// Implementors list their nested restorable members explicitly in
/// [`restorable_children`](Self::restorable_children); nothing is discovered
/// by inspection.
pub trait Restorable {
    /// Pass 1 hook. Called once per node, before its children.
    fn renumber(&mut self, ctx: &mut RestoreContext) {
        let _ = ctx;
    }

    /// Pass 2 hook. Called once per node, before its children.
    fn reconnect(&mut self, ctx: &mut RestoreContext) {
        let _ = ctx;
    }

    fn restorable_children(&mut self) -> Vec<RestoreChild<'_>> {
        Vec::new()
    }

    /// Distinguishes nodes that share an address (a struct and its first
    /// field) in the visited sets.
    fn restore_kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A node that several parents may hold, possibly cyclically.
pub type SharedRestorable = Arc<RwLock<dyn Restorable + Send + Sync>>;

/// Whether an edge owns its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The authoritative owner; renumbering happens through this edge.
    Master,
    /// A non-owning edge; only followed when reconnecting.
    Reference,
}

pub enum ChildNode<'a> {
    Owned(&'a mut dyn Restorable),
    Shared(SharedRestorable),
}

/// One outgoing edge of a restorable node.
pub struct RestoreChild<'a> {
    pub role: Role,
    pub node: ChildNode<'a>,
}

impl<'a> RestoreChild<'a> {
    #[must_use]
    pub fn master(node: &'a mut dyn Restorable) -> Self {
        Self {
            role: Role::Master,
            node: ChildNode::Owned(node),
        }
    }

    #[must_use]
    pub fn reference(node: &'a mut dyn Restorable) -> Self {
        Self {
            role: Role::Reference,
            node: ChildNode::Owned(node),
        }
    }

    #[must_use]
    pub fn shared_master(node: SharedRestorable) -> Self {
        Self {
            role: Role::Master,
            node: ChildNode::Shared(node),
        }
    }

    #[must_use]
    pub fn shared_reference(node: SharedRestorable) -> Self {
        Self {
            role: Role::Reference,
            node: ChildNode::Shared(node),
        }
    }
}

/// Identity of a node within one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RestoreKey {
    address: usize,
    kind: &'static str,
}

impl RestoreKey {
    fn owned(node: &dyn Restorable) -> Self {
        Self {
            address: std::ptr::from_ref(node).cast::<()>() as usize,
            kind: node.restore_kind(),
        }
    }

    fn shared(node: &SharedRestorable) -> Self {
        Self {
            address: Arc::as_ptr(node).cast::<()>() as usize,
            kind: "shared",
        }
    }
}

/// A weak reference whose target id was not renumbered by any manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReferenceFault {
    /// Kind of the entity that was referenced.
    pub kind: &'static str,
    /// The pre-restoration id that failed to resolve.
    pub referenced: EntityId,
}

/// State shared by every node during one restoration.
#[derive(Debug, Default)]
pub struct RestoreContext {
    remap: HashMap<&'static str, HashMap<EntityId, EntityId>>,
    reset_families: HashSet<&'static str>,
    renumbered: usize,
    moved: usize,
    faults: Vec<DanglingReferenceFault>,
}

impl RestoreContext {
    /// Returns true the first time `family` is seen in this restoration,
    /// meaning the caller should reset the family's generator.
    pub fn begin_family(&mut self, family: &'static str) -> bool {
        self.reset_families.insert(family)
    }

    pub fn record_renumber(&mut self, kind: &'static str, old: EntityId, new: EntityId) {
        let table = self.remap.entry(kind).or_default();
        if let Some(previous) = table.insert(old, new) {
            warn!("{kind} {old} renumbered twice ({previous} then {new})");
        }
        self.renumbered += 1;
        if old != new {
            self.moved += 1;
        }
    }

    /// New id for a pre-restoration id, if it was renumbered.
    #[must_use]
    pub fn remapped(&self, kind: &'static str, old: EntityId) -> Option<EntityId> {
        self.remap.get(kind)?.get(&old).copied()
    }

    /// Resolves a weak reference. Null stays null; an id that was never
    /// renumbered is logged, recorded as a fault and resolved to null.
    pub fn resolve(&mut self, kind: &'static str, old: EntityId) -> EntityId {
        if old.is_null() {
            return EntityId::NULL;
        }
        match self.remapped(kind, old) {
            Some(new) => new,
            None => {
                warn!("dangling reference to {kind} {old}, leaving it null");
                self.faults.push(DanglingReferenceFault {
                    kind,
                    referenced: old,
                });
                EntityId::NULL
            }
        }
    }

    #[must_use]
    pub fn faults(&self) -> &[DanglingReferenceFault] {
        &self.faults
    }
}

/// Outcome of a restoration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Nodes processed by pass 1.
    pub renumber_visits: usize,
    /// Nodes processed by pass 2.
    pub reconnect_visits: usize,
    /// Entities renumbered by pass 1, including those that kept their id.
    pub renumbered: usize,
    /// Entities whose id actually changed.
    pub moved: usize,
    pub faults: Vec<DanglingReferenceFault>,
}

impl RestoreReport {
    /// True if every weak reference resolved.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    Ready,
    Renumbered,
    Reconnected,
}

/// Drives the two restoration passes over one graph.
#[derive(Debug)]
pub struct ReferenceRestorer {
    phase: RestorePhase,
    ctx: RestoreContext,
    report: RestoreReport,
}

impl ReferenceRestorer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: RestorePhase::Ready,
            ctx: RestoreContext::default(),
            report: RestoreReport::default(),
        }
    }

    /// Runs both passes over `root`.
    pub fn run(root: &mut dyn Restorable) -> Result<RestoreReport, RestoreError> {
        let mut restorer = Self::new();
        restorer.after_restore_references_1(root)?;
        restorer.after_restore_references_2(root)?;
        Ok(restorer.into_report())
    }

    #[must_use]
    pub fn phase(&self) -> RestorePhase {
        self.phase
    }

    /// Pass 1: renumber every entity reachable through master edges.
    pub fn after_restore_references_1(
        &mut self,
        root: &mut dyn Restorable,
    ) -> Result<(), RestoreError> {
        if self.phase != RestorePhase::Ready {
            return Err(RestoreError::PassOutOfOrder {
                requested: 1,
                phase: self.phase,
            });
        }
        let visits = Walk::new(Pass::Renumber, &mut self.ctx).run(root);
        self.report.renumber_visits = visits;
        self.report.renumbered = self.ctx.renumbered;
        self.report.moved = self.ctx.moved;
        self.phase = RestorePhase::Renumbered;
        debug!(
            "restore pass 1: {visits} nodes, {} entities renumbered, {} moved",
            self.ctx.renumbered, self.ctx.moved
        );
        Ok(())
    }

    /// Pass 2: reconnect weak references through every edge.
    pub fn after_restore_references_2(
        &mut self,
        root: &mut dyn Restorable,
    ) -> Result<&RestoreReport, RestoreError> {
        if self.phase != RestorePhase::Renumbered {
            return Err(RestoreError::PassOutOfOrder {
                requested: 2,
                phase: self.phase,
            });
        }
        let visits = Walk::new(Pass::Reconnect, &mut self.ctx).run(root);
        self.report.reconnect_visits = visits;
        self.report.faults = self.ctx.faults.clone();
        self.phase = RestorePhase::Reconnected;
        debug!(
            "restore pass 2: {visits} nodes, {} dangling references",
            self.report.faults.len()
        );
        Ok(&self.report)
    }

    #[must_use]
    pub fn report(&self) -> &RestoreReport {
        &self.report
    }

    #[must_use]
    pub fn into_report(self) -> RestoreReport {
        self.report
    }
}

impl Default for ReferenceRestorer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Renumber,
    Reconnect,
}

struct Walk<'c> {
    pass: Pass,
    ctx: &'c mut RestoreContext,
    visited: HashSet<RestoreKey>,
}

impl<'c> Walk<'c> {
    fn new(pass: Pass, ctx: &'c mut RestoreContext) -> Self {
        Self {
            pass,
            ctx,
            visited: HashSet::new(),
        }
    }

    fn run(mut self, root: &mut dyn Restorable) -> usize {
        self.visited.insert(RestoreKey::owned(&*root));
        self.enter(root);
        self.visited.len()
    }

    fn enter(&mut self, node: &mut dyn Restorable) {
        match self.pass {
            Pass::Renumber => node.renumber(self.ctx),
            Pass::Reconnect => node.reconnect(self.ctx),
        }
        for child in node.restorable_children() {
            self.follow(child);
        }
    }

    fn follow(&mut self, child: RestoreChild<'_>) {
        if self.pass == Pass::Renumber && child.role == Role::Reference {
            return;
        }
        match child.node {
            ChildNode::Owned(node) => {
                if self.visited.insert(RestoreKey::owned(&*node)) {
                    self.enter(node);
                }
            }
            ChildNode::Shared(node) => {
                // Checked before locking: a node already on the stack holds
                // its own write lock.
                if self.visited.insert(RestoreKey::shared(&node)) {
                    let mut guard = node.write();
                    self.enter(&mut *guard);
                }
            }
        }
    }
}
