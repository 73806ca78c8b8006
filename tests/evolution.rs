//! Backward-compatible evolution: prefix patterns against widened
//! declarations.

mod common;

use carrier::decl::{ConstructorDecl, ConstructorForm, Declaration};
use carrier::diagnostics::DiagnosticKind;
use carrier::engine::Engine;
use carrier::error::Error;
use common::{Interp, int};

/// `R(a, b)` evolved to `R(a, b, c, d)` by pure addition, keeping a
/// compatibility constructor with the original arity.
fn evolved_r() -> Declaration {
    Declaration::builder("R")
        .component("a", "int")
        .component("b", "int")
        .component("c", "int")
        .component("d", "int")
        .field("a", "int")
        .field("b", "int")
        .field("c", "int")
        .field("d", "int")
        .constructor(ConstructorDecl {
            form: ConstructorForm::Explicit {
                params: vec![("a".to_string(), "int".into()), ("b".to_string(), "int".into())],
            },
            assigned_fields: Vec::new(),
            super_call: None,
        })
        .finish()
        .unwrap()
}

#[test]
fn compatibility_constructor_does_not_shadow_the_canonical_one() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(evolved_r());
    let stats = engine.resolve_all().unwrap();
    assert_eq!(stats.resolved, 1);

    // The 2-ary constructor is not canonical; the 4-ary one is derived.
    let result = engine.result(id).unwrap();
    let ctor = result.plan.constructor.as_ref().unwrap();
    assert_eq!(ctor.params.len(), 4);
    assert_eq!(ctor.field_inits, vec!["a", "b", "c", "d"]);
}

#[test]
fn original_pattern_still_matches_the_widened_declaration() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(evolved_r());
    engine.resolve_all().unwrap();

    let matched = engine.match_call_site(id, 2).unwrap();
    assert_eq!(matched.bound.len(), 2);
    assert_eq!(matched.universal, 2);
    assert_eq!(matched.bound[0].component, "a");
    assert_eq!(matched.bound[1].component, "b");
}

#[test]
fn oversupplied_pattern_is_a_pattern_arity_error() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(evolved_r());
    engine.resolve_all().unwrap();

    let err = engine.match_call_site(id, 5).unwrap_err();
    match err {
        Error::Resolve(diag) => {
            assert_eq!(diag.kind, DiagnosticKind::PatternArity);
            assert_eq!(diag.declaration, "R");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn prefix_match_ignores_trailing_component_values() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(evolved_r());
    engine.resolve_all().unwrap();

    let interp = Interp::new(&engine);
    let old_style = interp.construct(id, &[int(1), int(2), int(3), int(4)]);
    let different_tail = interp.construct(id, &[int(1), int(2), int(9), int(9)]);

    let matched = engine.match_call_site(id, 2).unwrap();
    let old_prefix: Vec<_> = matched
        .bound
        .iter()
        .map(|position| interp.read(&old_style, &position.accessor))
        .collect();
    let new_prefix: Vec<_> = matched
        .bound
        .iter()
        .map(|position| interp.read(&different_tail, &position.accessor))
        .collect();
    // The original two sub-patterns bind identically on both instances.
    assert_eq!(old_prefix, new_prefix);
    assert_eq!(old_prefix, vec![int(1), int(2)]);
}

#[test]
fn exhaustive_match_covers_every_component() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(evolved_r());
    engine.resolve_all().unwrap();

    let matched = engine.match_call_site(id, 4).unwrap();
    assert_eq!(matched.bound.len(), 4);
    assert_eq!(matched.universal, 0);
}
