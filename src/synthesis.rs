//! Member synthesis: turning resolved bindings and subsumption results into
//! a derivation plan for the code-emission backend.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::binding::{BindingSet, ComponentBinding};
use crate::decl::{ConstructorDecl, ConstructorForm, DeclArena, DeclId, Declaration};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::hierarchy::SubsumptionMap;
use crate::state::StateDescription;

/// Identity-member names in the carrier language's object protocol. An
/// author declaration of any of these suppresses its synthesis wholesale.
pub const EQUALS_METHOD: &str = "equals";
pub const HASH_METHOD: &str = "hashCode";
pub const STRING_METHOD: &str = "toString";

/// Where a destructuring position's value comes from at resolution time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum AccessorRef {
    /// Accessor synthesized on the named declaration for a field-backed
    /// component.
    Synthesized {
        declaration: String,
        component: String,
    },
    /// Author-provided accessor method.
    Explicit { declaration: String, method: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SuperCallSpec {
    /// No superclass, or the superclass constructor takes no derivable part.
    None,
    /// Derived from full subsumption: subclass component names in the
    /// superclass's declared order.
    Derived { arguments: Vec<String> },
    /// The author's constructor body carries its own super call.
    Explicit,
}

/// Specification of the canonical constructor to synthesize or complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConstructorSpec {
    /// Parameter list, exactly the state description in order.
    pub params: Vec<ParamSpec>,
    pub super_call: SuperCallSpec,
    /// Component names whose backing fields get auto-assigned from the
    /// same-named parameter.
    pub field_inits: Vec<String>,
    /// True when completing an authored compact form rather than deriving
    /// the whole constructor.
    pub from_compact: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessorSpec {
    pub component: String,
    pub field: String,
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatternPosition {
    pub component: String,
    pub accessor: AccessorRef,
}

/// Positional destructuring shape: length equals the full state
/// description, each position resolved to an accessor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatternSpec {
    pub arity: usize,
    pub positions: Vec<PatternPosition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EqualitySpec {
    /// Accessor comparison order; same runtime declaration is implied.
    pub components: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HashSpec {
    /// Order-sensitive combination of each accessor's hash.
    pub components: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StringSpec {
    /// Rendering template, e.g. `Point(x={x}, y={y})`.
    pub template: String,
}

/// The engine's output per declaration: members to synthesize plus the
/// diagnostics blocking synthesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DerivationPlan {
    pub declaration: String,
    pub arity: usize,
    pub constructor: Option<ConstructorSpec>,
    pub accessors: Vec<AccessorSpec>,
    pub pattern: Option<PatternSpec>,
    pub equality: Option<EqualitySpec>,
    pub hash: Option<HashSpec>,
    pub string: Option<StringSpec>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything the synthesizer needs about one declaration, resolved by the
/// engine beforehand.
pub struct SynthesisInput<'a> {
    pub arena: &'a DeclArena,
    pub id: DeclId,
    pub bindings: &'a BindingSet,
    pub subsumption: Option<&'a SubsumptionMap>,
    pub super_state: Option<&'a StateDescription>,
    /// Final accessor provider per component position bound
    /// `InheritedAccessor`, walked up the ancestor chain by the engine.
    pub inherited_accessors: &'a HashMap<usize, AccessorRef>,
}

/// Synthesize every derivable member. Failures are attached to the sink and
/// never abort the other members, so one pass reports everything.
#[must_use]
pub fn synthesize(input: &SynthesisInput<'_>, sink: &mut DiagnosticSink) -> DerivationPlan {
    let decl = input.arena.get(input.id);

    let constructor = synthesize_constructor(input, decl, sink);
    let accessors = synthesize_accessors(input.id, decl, input.bindings);
    let pattern = synthesize_pattern(input, decl);
    let (equality, hash, string) = synthesize_identity(decl, input.bindings);

    debug!(
        target: "carrier.synthesis",
        declaration = %decl.name,
        constructor = constructor.is_some(),
        accessors = accessors.len(),
        pattern = pattern.is_some(),
        identity = equality.is_some(),
        "synthesized derivation plan"
    );

    DerivationPlan {
        declaration: decl.name.clone(),
        arity: decl.state.arity(),
        constructor,
        accessors,
        pattern,
        equality,
        hash,
        string,
        diagnostics: Vec::new(),
    }
}

/// The authored constructor relevant to canonical derivation: an explicit
/// constructor whose parameter list mirrors the state description, or a
/// compact form.
fn canonical_authored(decl: &Declaration) -> Option<&ConstructorDecl> {
    decl.constructors.iter().find(|ctor| match &ctor.form {
        ConstructorForm::Compact => true,
        ConstructorForm::Explicit { params } => {
            params.len() == decl.state.arity()
                && params
                    .iter()
                    .zip(decl.state.iter())
                    .all(|((name, ty), component)| component.matches(name, ty))
        }
    })
}

fn synthesize_constructor(
    input: &SynthesisInput<'_>,
    decl: &Declaration,
    sink: &mut DiagnosticSink,
) -> Option<ConstructorSpec> {
    let authored = canonical_authored(decl);
    let super_call = resolve_super_call(input, decl, authored, sink);

    let params: Vec<ParamSpec> = decl
        .state
        .iter()
        .map(|component| ParamSpec {
            name: component.name.clone(),
            ty: component.ty.as_str().to_string(),
        })
        .collect();

    match authored {
        Some(ctor) if matches!(ctor.form, ConstructorForm::Explicit { .. }) => {
            // The author owns the canonical constructor; nothing to derive.
            None
        }
        Some(ctor) => {
            // Compact form: auto-assign every init-eligible component the
            // body has not assigned; inherited components flow to the super
            // call instead.
            let field_inits = init_targets(decl, input.bindings, &ctor.assigned_fields);
            Some(ConstructorSpec {
                params,
                super_call: super_call?,
                field_inits,
                from_compact: true,
            })
        }
        None => {
            let explicit_only = decl.state.iter().any(|component| {
                input.bindings.get(component.position).is_some_and(|entry| {
                    matches!(entry.binding, ComponentBinding::ExplicitAccessor(_))
                        && entry.init_field.is_none()
                })
            });
            if explicit_only {
                sink.push(Diagnostic::error(
                    DiagnosticKind::MissingCanonicalConstructor,
                    decl.name.clone(),
                    "components backed only by explicit accessors need an authored constructor",
                ));
                return None;
            }
            if input.bindings.has_unresolved() {
                // Abstract completion is left to subclasses; a concrete
                // declaration already got its incompleteness diagnostic.
                return None;
            }
            let field_inits = init_targets(decl, input.bindings, &[]);
            Some(ConstructorSpec {
                params,
                super_call: super_call?,
                field_inits,
                from_compact: false,
            })
        }
    }
}

/// Component names whose fields the synthesized constructor assigns:
/// init-eligible, not inherited, not already assigned by the author's body.
fn init_targets(
    decl: &Declaration,
    bindings: &BindingSet,
    assigned_fields: &[String],
) -> Vec<String> {
    decl.state
        .iter()
        .filter(|component| {
            bindings.get(component.position).is_some_and(|entry| {
                entry.init_field.is_some() && !assigned_fields.contains(&component.name)
            })
        })
        .map(|component| component.name.clone())
        .collect()
}

/// Decide the super-call posture for the canonical constructor. Returns
/// `None` when a required explicit super call is missing, after reporting
/// the diagnostic.
fn resolve_super_call(
    input: &SynthesisInput<'_>,
    decl: &Declaration,
    authored: Option<&ConstructorDecl>,
    sink: &mut DiagnosticSink,
) -> Option<SuperCallSpec> {
    let Some(subsumption) = input.subsumption else {
        return Some(SuperCallSpec::None);
    };
    if authored.is_some_and(|ctor| ctor.super_call.is_some()) {
        return Some(SuperCallSpec::Explicit);
    }
    if subsumption.is_full() {
        let arguments = subsumption
            .matched()
            .iter()
            .map(|(_, sub)| decl.state.get(*sub).map(|c| c.name.clone()))
            .collect::<Option<Vec<_>>>()?;
        return Some(SuperCallSpec::Derived { arguments });
    }
    let missing = subsumption
        .missing()
        .first()
        .and_then(|position| input.super_state.and_then(|state| state.get(*position)));
    let detail = match missing {
        Some(component) => format!(
            "partial subsumption: superclass component `{component}` has no match; an explicit super call is required"
        ),
        None => "partial subsumption requires an explicit super call".to_string(),
    };
    let mut diagnostic =
        Diagnostic::error(DiagnosticKind::MissingSuperConstructorCall, decl.name.clone(), detail);
    if let Some(component) = missing {
        diagnostic = diagnostic.with_component(component.name.clone());
    }
    sink.push(diagnostic);
    None
}

fn synthesize_accessors(
    id: DeclId,
    decl: &Declaration,
    bindings: &BindingSet,
) -> Vec<AccessorSpec> {
    decl.state
        .iter()
        .filter_map(|component| match bindings.get(component.position)?.binding {
            ComponentBinding::FieldBacked(field) if field.decl == id => {
                let field = &decl.fields[field.index];
                Some(AccessorSpec {
                    component: component.name.clone(),
                    field: field.name.clone(),
                    ty: field.ty.as_str().to_string(),
                })
            }
            _ => None,
        })
        .collect()
}

/// The destructuring pattern requires every component to reach an accessor;
/// concreteness is not required, so abstract declarations with fully
/// resolvable components still destructure.
fn synthesize_pattern(input: &SynthesisInput<'_>, decl: &Declaration) -> Option<PatternSpec> {
    if !input.bindings.fully_accessible() {
        return None;
    }
    let mut positions = Vec::with_capacity(decl.state.arity());
    for component in &decl.state {
        let accessor = match input.bindings.get(component.position)?.binding {
            ComponentBinding::FieldBacked(_) => AccessorRef::Synthesized {
                declaration: decl.name.clone(),
                component: component.name.clone(),
            },
            ComponentBinding::ExplicitAccessor(method) => AccessorRef::Explicit {
                declaration: decl.name.clone(),
                method: input.arena.get(method.decl).methods[method.index].name.clone(),
            },
            ComponentBinding::InheritedAccessor(_) => input
                .inherited_accessors
                .get(&component.position)?
                .clone(),
            ComponentBinding::Unresolved => return None,
        };
        positions.push(PatternPosition {
            component: component.name.clone(),
            accessor,
        });
    }
    Some(PatternSpec {
        arity: positions.len(),
        positions,
    })
}

fn synthesize_identity(
    decl: &Declaration,
    bindings: &BindingSet,
) -> (Option<EqualitySpec>, Option<HashSpec>, Option<StringSpec>) {
    if !decl.is_concrete() || !bindings.fully_accessible() {
        return (None, None, None);
    }
    let components: Vec<String> = decl.state.iter().map(|c| c.name.clone()).collect();

    let equality = (!decl.declares_method(EQUALS_METHOD)).then(|| EqualitySpec {
        components: components.clone(),
    });
    let hash = (!decl.declares_method(HASH_METHOD)).then(|| HashSpec {
        components: components.clone(),
    });
    let string = (!decl.declares_method(STRING_METHOD)).then(|| {
        let body = components
            .iter()
            .map(|name| format!("{name}={{{name}}}"))
            .collect::<Vec<_>>()
            .join(", ");
        StringSpec {
            template: format!("{}({body})", decl.name),
        }
    });
    (equality, hash, string)
}
