//! Binding resolution: matching each component of a declaration's state
//! description to its backing source.

use tracing::debug;

use crate::decl::{DeclArena, DeclId, Declaration};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::hierarchy::SubsumptionMap;
use crate::state::Component;

/// Reference to an explicitly declared field, by arena id and field index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRef {
    pub decl: DeclId,
    pub index: usize,
}

/// Reference to an explicitly declared method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodRef {
    pub decl: DeclId,
    pub index: usize,
}

/// Backing source for one component. Computed once per declaration and
/// immutable afterward; recomputed only through engine invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentBinding {
    /// A declared field whose name and type exactly match the component.
    FieldBacked(FieldRef),
    /// Subsumed from an ancestor whose accessor already resolves.
    InheritedAccessor(DeclId),
    /// An author-provided accessor satisfies the component contract.
    ExplicitAccessor(MethodRef),
    /// No backing found; fatal unless the declaration is abstract.
    Unresolved,
}

impl ComponentBinding {
    /// Whether some accessor (synthesized, explicit, or up the chain) can
    /// produce this component's value.
    #[must_use]
    pub fn has_accessor(&self) -> bool {
        !matches!(self, ComponentBinding::Unresolved)
    }
}

/// Binding for one component plus the field eligible as the constructor's
/// initialization target. When both a matching field and an explicit
/// accessor exist, the accessor wins the binding but the field keeps its
/// role as the initialization target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingEntry {
    pub binding: ComponentBinding,
    pub init_field: Option<FieldRef>,
}

/// Per-declaration bindings, indexed by component position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingSet {
    entries: Vec<BindingEntry>,
}

impl BindingSet {
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&BindingEntry> {
        self.entries.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BindingEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn has_unresolved(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.binding == ComponentBinding::Unresolved)
    }

    /// Every component reaches some accessor; the precondition for pattern
    /// synthesis and for the identity members.
    #[must_use]
    pub fn fully_accessible(&self) -> bool {
        self.entries.iter().all(|e| e.binding.has_accessor())
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a BindingEntry;
    type IntoIter = std::slice::Iter<'a, BindingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Already-finalized superclass context for resolving a subclass.
#[derive(Clone, Copy, Debug)]
pub struct SuperContext<'a> {
    pub id: DeclId,
    pub bindings: &'a BindingSet,
    pub subsumption: &'a SubsumptionMap,
}

/// Outcome of the pure structural match of one component against a
/// declaration's own members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentMatch {
    pub accessor: Option<usize>,
    pub field: Option<usize>,
    pub mismatched_field: Option<usize>,
}

/// Match one component against the declaration's explicit fields and
/// methods. Pure: no links are recorded, only indices.
#[must_use]
pub fn match_component(component: &Component, decl: &Declaration) -> ComponentMatch {
    let accessor = decl
        .methods
        .iter()
        .position(|m| m.is_accessor_for(&component.name, &component.ty));
    let mut field = None;
    let mut mismatched_field = None;
    for (index, candidate) in decl.fields.iter().enumerate() {
        if candidate.name != component.name {
            continue;
        }
        if candidate.ty == component.ty {
            field = Some(index);
        } else {
            mismatched_field = Some(index);
        }
    }
    ComponentMatch {
        accessor,
        field,
        mismatched_field,
    }
}

/// Resolve every component of `id`'s state description to a binding.
///
/// Components subsumed from the superclass inherit its accessor when the
/// superclass binding resolved; the rest are matched against this
/// declaration's own members. A concrete declaration with an `Unresolved`
/// component gets an `IncompleteStateDescriptionError`.
pub fn resolve_bindings(
    arena: &DeclArena,
    id: DeclId,
    superclass: Option<SuperContext<'_>>,
    sink: &mut DiagnosticSink,
) -> BindingSet {
    let decl = arena.get(id);
    let mut entries = Vec::with_capacity(decl.state.arity());

    for component in &decl.state {
        let inherited = superclass.and_then(|ctx| {
            let super_position = ctx
                .subsumption
                .matched()
                .iter()
                .find(|(_, sub)| *sub == component.position)
                .map(|(sup, _)| *sup)?;
            let entry = ctx.bindings.get(super_position)?;
            entry.binding.has_accessor().then_some(ctx.id)
        });

        let entry = if let Some(super_id) = inherited {
            BindingEntry {
                binding: ComponentBinding::InheritedAccessor(super_id),
                init_field: None,
            }
        } else {
            resolve_own(decl, id, component, sink)
        };
        entries.push(entry);
    }

    let set = BindingSet { entries };
    if set.has_unresolved() && decl.is_concrete() {
        for (component, entry) in decl.state.iter().zip(set.iter()) {
            if entry.binding == ComponentBinding::Unresolved {
                sink.push(
                    Diagnostic::error(
                        DiagnosticKind::IncompleteStateDescription,
                        decl.name.clone(),
                        format!("no field or accessor backs component `{component}`"),
                    )
                    .with_component(component.name.clone()),
                );
            }
        }
    }

    debug!(
        target: "carrier.binding",
        declaration = %decl.name,
        arity = set.arity(),
        unresolved = set.has_unresolved(),
        "resolved component bindings"
    );
    set
}

fn resolve_own(
    decl: &Declaration,
    id: DeclId,
    component: &Component,
    sink: &mut DiagnosticSink,
) -> BindingEntry {
    let matched = match_component(component, decl);
    let init_field = matched.field.map(|index| FieldRef { decl: id, index });

    if let Some(index) = matched.accessor {
        // Author's accessor overrides default derivation; the field (if any)
        // stays eligible as the constructor-initialization target.
        return BindingEntry {
            binding: ComponentBinding::ExplicitAccessor(MethodRef { decl: id, index }),
            init_field,
        };
    }
    if let Some(field) = init_field {
        return BindingEntry {
            binding: ComponentBinding::FieldBacked(field),
            init_field,
        };
    }
    if let Some(index) = matched.mismatched_field {
        let field = &decl.fields[index];
        sink.push(
            Diagnostic::error(
                DiagnosticKind::ComponentFieldTypeMismatch,
                decl.name.clone(),
                format!(
                    "field `{}: {}` disagrees with component `{component}`",
                    field.name, field.ty
                ),
            )
            .with_component(component.name.clone()),
        );
    }
    BindingEntry {
        binding: ComponentBinding::Unresolved,
        init_field: None,
    }
}
