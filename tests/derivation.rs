//! End-to-end derivation scenarios driven through the public engine API.

mod common;

use carrier::decl::{ConstructorDecl, Declaration};
use carrier::diagnostics::DiagnosticKind;
use carrier::engine::Engine;
use carrier::synthesis::SuperCallSpec;
use carrier::logging::{self, LogOptions};
use common::{Interp, int};
use expect_test::expect;
use serde_json::Value;

fn point() -> Declaration {
    Declaration::builder("Point")
        .component("x", "int")
        .component("y", "int")
        .field("x", "int")
        .field("y", "int")
        .finish()
        .unwrap()
}

#[test]
fn bare_point_derives_all_members() {
    assert!(logging::init(LogOptions::from_env()));

    let mut engine = Engine::new();
    let id = engine.add_declaration(point());
    let stats = engine.resolve_all().unwrap();
    assert_eq!(stats.resolved, 1);

    let result = engine.result(id).unwrap();
    assert!(result.plan.constructor.is_some());
    assert_eq!(result.plan.accessors.len(), 2);
    assert_eq!(result.plan.pattern.as_ref().unwrap().arity, 2);
    assert!(result.plan.equality.is_some());
    assert!(result.plan.hash.is_some());
    assert!(result.plan.string.is_some());
    assert!(result.plan.diagnostics.is_empty());
}

#[test]
fn point_round_trip_preserves_values_in_order() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(point());
    engine.resolve_all().unwrap();

    let interp = Interp::new(&engine);
    let instance = interp.construct(id, &[int(1), int(2)]);
    assert_eq!(interp.destructure(id, &instance), vec![int(1), int(2)]);
}

#[test]
fn point_equality_hash_and_string_follow_the_shape() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(point());
    engine.resolve_all().unwrap();

    let interp = Interp::new(&engine);
    let a = interp.construct(id, &[int(1), int(2)]);
    let b = interp.construct(id, &[int(1), int(2)]);
    let c = interp.construct(id, &[int(1), int(3)]);

    assert!(interp.equals(id, &a, &b));
    assert!(!interp.equals(id, &a, &c));
    assert_eq!(interp.hash(id, &a), interp.hash(id, &b));
    assert_eq!(interp.render(id, &a), "Point(x=1, y=2)");
}

#[test]
fn equality_is_reflexive_symmetric_and_transitive() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(point());
    engine.resolve_all().unwrap();

    let interp = Interp::new(&engine);
    let a = interp.construct(id, &[int(7), int(9)]);
    let b = interp.construct(id, &[int(7), int(9)]);
    let c = interp.construct(id, &[int(7), int(9)]);

    assert!(interp.equals(id, &a, &a));
    assert!(interp.equals(id, &a, &b) == interp.equals(id, &b, &a));
    assert!(interp.equals(id, &a, &b) && interp.equals(id, &b, &c) && interp.equals(id, &a, &c));
}

#[test]
fn instances_of_different_declarations_never_compare_equal() {
    let mut engine = Engine::new();
    let a = engine.add_declaration(point());
    let b = engine.add_declaration(
        Declaration::builder("Vec2")
            .component("x", "int")
            .component("y", "int")
            .field("x", "int")
            .field("y", "int")
            .finish()
            .unwrap(),
    );
    engine.resolve_all().unwrap();

    let interp = Interp::new(&engine);
    let left = interp.construct(a, &[int(1), int(2)]);
    let right = interp.construct(b, &[int(1), int(2)]);
    assert!(!interp.equals(a, &left, &right));
}

#[test]
fn almost_record_leaves_authored_parts_alone() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(
        Declaration::builder("AlmostRecord")
            .component("x", "int")
            .component("y", "int")
            .component("s", "Optional<String>")
            .field("x", "int")
            .field("y", "int")
            .field("s", "String")
            .accessor("s", "Optional<String>")
            .constructor(ConstructorDecl::compact().assigns("s"))
            .finish()
            .unwrap(),
    );
    let stats = engine.resolve_all().unwrap();
    assert_eq!(stats.resolved, 1);

    let result = engine.result(id).unwrap();
    assert!(result.plan.diagnostics.is_empty());

    // Constructor field-init covers x and y only; s stays with the author.
    let ctor = result.plan.constructor.as_ref().unwrap();
    assert!(ctor.from_compact);
    assert_eq!(ctor.field_inits, vec!["x", "y"]);
    let accessors: Vec<&str> = result
        .plan
        .accessors
        .iter()
        .map(|a| a.component.as_str())
        .collect();
    assert_eq!(accessors, vec!["x", "y"]);

    // Equality reads x(), y(), s() in order, not the raw nullable field.
    assert_eq!(
        result.plan.equality.as_ref().unwrap().components,
        vec!["x", "y", "s"]
    );
}

#[test]
fn explicit_accessor_result_wins_over_the_raw_field() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(
        Declaration::builder("AlmostRecord")
            .component("x", "int")
            .component("y", "int")
            .component("s", "Optional<String>")
            .field("x", "int")
            .field("y", "int")
            .field("s", "String")
            .accessor("s", "Optional<String>")
            .constructor(ConstructorDecl::compact().assigns("s"))
            .finish()
            .unwrap(),
    );
    engine.resolve_all().unwrap();

    let interp = Interp::new(&engine).with_explicit("AlmostRecord", "s", |instance| {
        match instance.raw("AlmostRecord", "s") {
            Value::Null => Value::from("Optional.empty"),
            other => Value::from(format!("Optional[{}]", other.as_str().unwrap())),
        }
    });

    let mut instance = interp.construct(id, &[int(1), int(2), Value::from("hello")]);
    // The authored compact body assigns the unwrapped field itself.
    instance.set_raw("AlmostRecord", "s", Value::from("hello"));

    let values = interp.destructure(id, &instance);
    assert_eq!(
        values,
        vec![int(1), int(2), Value::from("Optional[hello]")]
    );

    let mut other = interp.construct(id, &[int(1), int(2), Value::from("hello")]);
    other.set_raw("AlmostRecord", "s", Value::from("hello"));
    assert!(interp.equals(id, &instance, &other));
}

#[test]
fn point3d_gets_a_derived_super_call_and_full_round_trip() {
    let mut engine = Engine::new();
    engine.add_declaration(point());
    let sub = engine.add_declaration(
        Declaration::builder("Point3d")
            .component("x", "int")
            .component("y", "int")
            .component("z", "int")
            .field("z", "int")
            .extends("Point")
            .finish()
            .unwrap(),
    );
    let stats = engine.resolve_all().unwrap();
    assert_eq!(stats.resolved, 2);

    let result = engine.result(sub).unwrap();
    assert!(result.plan.diagnostics.is_empty());
    let ctor = result.plan.constructor.as_ref().unwrap();
    assert_eq!(
        ctor.super_call,
        SuperCallSpec::Derived {
            arguments: vec!["x".to_string(), "y".to_string()]
        }
    );

    let interp = Interp::new(&engine);
    let instance = interp.construct(sub, &[int(1), int(2), int(3)]);
    assert_eq!(
        interp.destructure(sub, &instance),
        vec![int(1), int(2), int(3)]
    );
    // Inherited state was written by the super constructor, not locally.
    assert_eq!(instance.raw("Point", "x"), int(1));
    assert_eq!(instance.raw("Point3d", "z"), int(3));
}

#[test]
fn partial_subsumption_demands_an_explicit_super_call() {
    let mut engine = Engine::new();
    engine.add_declaration(point());
    let sub = engine.add_declaration(
        Declaration::builder("Labeled")
            .component("x", "int")
            .component("label", "String")
            .field("x", "int")
            .field("label", "String")
            .extends("Point")
            .finish()
            .unwrap(),
    );
    engine.resolve_all().unwrap();

    let result = engine.result(sub).unwrap();
    assert!(result.plan.constructor.is_none());
    let kinds: Vec<DiagnosticKind> = result.plan.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::MissingSuperConstructorCall]);
    assert_eq!(result.plan.diagnostics[0].component.as_deref(), Some("y"));
}

#[test]
fn mismatched_component_field_blocks_the_accessor() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(
        Declaration::builder("Widened")
            .component("x", "int")
            .field("x", "long")
            .finish()
            .unwrap(),
    );
    let stats = engine.resolve_all().unwrap();
    assert_eq!(stats.failed, 1);

    let result = engine.result(id).unwrap();
    assert!(result.plan.accessors.is_empty());
    assert!(result.plan.pattern.is_none());
    let kinds: Vec<DiagnosticKind> = result.plan.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::ComponentFieldTypeMismatch,
            DiagnosticKind::IncompleteStateDescription,
        ]
    );
}

#[test]
fn inheritance_cycle_leaves_no_plans_behind() {
    let mut engine = Engine::new();
    let a = engine.add_declaration(
        Declaration::builder("A")
            .component("x", "int")
            .field("x", "int")
            .extends("B")
            .finish()
            .unwrap(),
    );
    let b = engine.add_declaration(
        Declaration::builder("B")
            .component("x", "int")
            .field("x", "int")
            .extends("A")
            .finish()
            .unwrap(),
    );
    let stats = engine.resolve_all().unwrap();
    assert_eq!(stats.failed, 2);
    assert!(engine.result(a).is_none());
    assert!(engine.result(b).is_none());

    let kinds: Vec<DiagnosticKind> = engine
        .batch_diagnostics()
        .iter()
        .map(|d| d.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::CyclicInheritance,
            DiagnosticKind::CyclicInheritance,
        ]
    );
}

#[test]
fn point_plan_serializes_for_the_emission_backend() {
    let mut engine = Engine::new();
    let id = engine.add_declaration(point());
    engine.resolve_all().unwrap();

    let result = engine.result(id).unwrap();
    let json = serde_json::to_string_pretty(&result.plan).unwrap();
    expect![[r#"
        {
          "declaration": "Point",
          "arity": 2,
          "constructor": {
            "params": [
              {
                "name": "x",
                "ty": "int"
              },
              {
                "name": "y",
                "ty": "int"
              }
            ],
            "super_call": "None",
            "field_inits": [
              "x",
              "y"
            ],
            "from_compact": false
          },
          "accessors": [
            {
              "component": "x",
              "field": "x",
              "ty": "int"
            },
            {
              "component": "y",
              "field": "y",
              "ty": "int"
            }
          ],
          "pattern": {
            "arity": 2,
            "positions": [
              {
                "component": "x",
                "accessor": {
                  "Synthesized": {
                    "declaration": "Point",
                    "component": "x"
                  }
                }
              },
              {
                "component": "y",
                "accessor": {
                  "Synthesized": {
                    "declaration": "Point",
                    "component": "y"
                  }
                }
              }
            ]
          },
          "equality": {
            "components": [
              "x",
              "y"
            ]
          },
          "hash": {
            "components": [
              "x",
              "y"
            ]
          },
          "string": {
            "template": "Point(x={x}, y={y})"
          },
          "diagnostics": []
        }"#]]
    .assert_eq(&json);
}
