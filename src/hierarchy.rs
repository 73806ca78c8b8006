//! Hierarchy resolution: dependency ordering, cycle detection, and the
//! structural subsumption test between a subclass and its superclass.

use tracing::{debug, warn};

use crate::decl::{DeclArena, DeclId};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::state::StateDescription;

/// Ordered partial injective mapping from superclass components to subclass
/// components, matched structurally by name and type. Pairs are kept in the
/// superclass's declared order; that order drives the derived super call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsumptionMap {
    matched: Vec<(usize, usize)>,
    missing: Vec<usize>,
    super_arity: usize,
}

impl SubsumptionMap {
    /// Run the subsumption test: for every superclass component, search the
    /// subclass description for a component with identical name and type.
    #[must_use]
    pub fn compute(superclass: &StateDescription, subclass: &StateDescription) -> Self {
        let mut matched = Vec::new();
        let mut missing = Vec::new();
        for component in superclass {
            match subclass.position_of(&component.name, &component.ty) {
                Some(sub_position) => matched.push((component.position, sub_position)),
                None => missing.push(component.position),
            }
        }
        Self {
            matched,
            missing,
            super_arity: superclass.arity(),
        }
    }

    /// Full subsumption covers every superclass component; only then is the
    /// super-constructor call derivable without author input.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.missing.is_empty() && self.matched.len() == self.super_arity
    }

    /// `(superclass position, subclass position)` pairs in superclass order.
    #[must_use]
    pub fn matched(&self) -> &[(usize, usize)] {
        &self.matched
    }

    /// Superclass positions with no structural match in the subclass.
    #[must_use]
    pub fn missing(&self) -> &[usize] {
        &self.missing
    }

    #[must_use]
    pub fn subclass_position_for(&self, super_position: usize) -> Option<usize> {
        self.matched
            .iter()
            .find(|(sup, _)| *sup == super_position)
            .map(|(_, sub)| *sub)
    }

    /// Whether the subclass component at `sub_position` corresponds to some
    /// superclass component.
    #[must_use]
    pub fn subsumes(&self, sub_position: usize) -> bool {
        self.matched.iter().any(|(_, sub)| *sub == sub_position)
    }
}

/// Result of ordering the inheritance graph. `order` lists resolvable
/// declarations superclass-first; `cycles` holds each detected cycle;
/// `blocked` holds declarations outside a cycle whose ancestor chain runs
/// into one, so they cannot be resolved either.
#[derive(Debug, Default)]
pub struct HierarchyOrder {
    pub order: Vec<DeclId>,
    pub cycles: Vec<Vec<DeclId>>,
    pub blocked: Vec<DeclId>,
}

impl HierarchyOrder {
    /// One `CyclicInheritanceError` per declaration inside a cycle, with the
    /// full cycle path rendered for context.
    #[must_use]
    pub fn cycle_diagnostics(&self, arena: &DeclArena) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for cycle in &self.cycles {
            let mut rendering = cycle
                .iter()
                .map(|id| arena.get(*id).name.clone())
                .collect::<Vec<_>>()
                .join(" -> ");
            if let Some(first) = cycle.first() {
                rendering.push_str(" -> ");
                rendering.push_str(&arena.get(*first).name);
            }
            for id in cycle {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::CyclicInheritance,
                    arena.get(*id).name.clone(),
                    format!("inheritance cycle: {rendering}"),
                ));
            }
        }
        diagnostics
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unvisited,
    Visiting,
    Resolved,
    Poisoned,
}

/// Order declarations so every superclass precedes its subclasses, detecting
/// inheritance cycles before any synthesis starts on the affected nodes.
/// Iterative over the arena indices; single inheritance means each walk
/// follows one parent chain.
#[must_use]
pub fn dependency_order(arena: &DeclArena) -> HierarchyOrder {
    let mut states = vec![NodeState::Unvisited; arena.len()];
    let mut result = HierarchyOrder::default();

    for start in arena.ids() {
        if states[start.0] != NodeState::Unvisited {
            continue;
        }
        let mut path: Vec<DeclId> = Vec::new();
        let mut current = start;
        let outcome = loop {
            match states[current.0] {
                NodeState::Unvisited => {
                    states[current.0] = NodeState::Visiting;
                    path.push(current);
                    let decl = arena.get(current);
                    match arena.superclass_of(current) {
                        Some(parent) => current = parent,
                        None => {
                            if let Some(name) = decl.superclass.as_deref() {
                                warn!(
                                    target: "carrier.hierarchy",
                                    declaration = %decl.name,
                                    superclass = %name,
                                    "superclass not in arena; treating declaration as a root"
                                );
                            }
                            break NodeState::Resolved;
                        }
                    }
                }
                NodeState::Visiting => {
                    // `current` is on the active path: everything from its
                    // first occurrence onward forms the cycle.
                    let cycle_start = path
                        .iter()
                        .position(|id| *id == current)
                        .unwrap_or_default();
                    let cycle: Vec<DeclId> = path.split_off(cycle_start);
                    for id in &cycle {
                        states[id.0] = NodeState::Poisoned;
                    }
                    result.cycles.push(cycle);
                    break NodeState::Poisoned;
                }
                NodeState::Resolved => break NodeState::Resolved,
                NodeState::Poisoned => break NodeState::Poisoned,
            }
        };

        // Unwind the remaining path ancestors-first.
        match outcome {
            NodeState::Resolved => {
                for id in path.iter().rev() {
                    states[id.0] = NodeState::Resolved;
                    result.order.push(*id);
                }
            }
            _ => {
                for id in path.iter().rev() {
                    states[id.0] = NodeState::Poisoned;
                    result.blocked.push(*id);
                }
            }
        }
    }

    debug!(
        target: "carrier.hierarchy",
        resolvable = result.order.len(),
        cycles = result.cycles.len(),
        blocked = result.blocked.len(),
        "computed dependency order"
    );
    result
}
