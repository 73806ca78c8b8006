//! Plan interpreter standing in for the emission backend: executes
//! synthesized constructor/accessor/pattern/identity specs over concrete
//! values so the property tests can observe runtime behavior.

// Each consumer crate exercises a different slice of the interpreter; the
// unused remainder would otherwise warn per crate.
#![allow(dead_code)]

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use carrier::decl::DeclId;
use carrier::engine::Engine;
use carrier::synthesis::{AccessorRef, SuperCallSpec};
use serde_json::Value;

type ExplicitFn = Box<dyn Fn(&Instance) -> Value>;

/// A constructed object: field storage keyed by the owning declaration and
/// field name, so inherited state lives with the ancestor that declared it.
pub struct Instance {
    pub declaration: String,
    fields: HashMap<(String, String), Value>,
}

impl Instance {
    pub fn raw(&self, declaration: &str, field: &str) -> Value {
        self.fields
            .get(&(declaration.to_string(), field.to_string()))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Stand-in for an authored constructor-body assignment.
    pub fn set_raw(&mut self, declaration: &str, field: &str, value: Value) {
        self.fields
            .insert((declaration.to_string(), field.to_string()), value);
    }
}

pub struct Interp<'a> {
    engine: &'a Engine,
    explicit: HashMap<(String, String), ExplicitFn>,
}

impl<'a> Interp<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            explicit: HashMap::new(),
        }
    }

    /// Register the behavior of an author-written accessor method.
    pub fn with_explicit(
        mut self,
        declaration: &str,
        method: &str,
        behavior: impl Fn(&Instance) -> Value + 'static,
    ) -> Self {
        self.explicit.insert(
            (declaration.to_string(), method.to_string()),
            Box::new(behavior),
        );
        self
    }

    /// Run the canonical constructor with `args` in state-description order.
    pub fn construct(&self, id: DeclId, args: &[Value]) -> Instance {
        let decl = self.engine.arena().get(id);
        let mut by_name = HashMap::new();
        for (component, value) in decl.state.iter().zip(args) {
            by_name.insert(component.name.clone(), value.clone());
        }
        let mut instance = Instance {
            declaration: decl.name.clone(),
            fields: HashMap::new(),
        };
        self.run_constructor(id, &by_name, &mut instance);
        instance
    }

    fn run_constructor(&self, id: DeclId, args: &HashMap<String, Value>, instance: &mut Instance) {
        let decl = self.engine.arena().get(id);
        let result = self.engine.result(id).expect("finalized result");
        let ctor = result
            .plan
            .constructor
            .as_ref()
            .expect("synthesized constructor");

        if let SuperCallSpec::Derived { arguments } = &ctor.super_call {
            let sup = self
                .engine
                .arena()
                .superclass_of(id)
                .expect("superclass for derived super call");
            let sup_decl = self.engine.arena().get(sup);
            let mut sup_args = HashMap::new();
            for (component, argument) in sup_decl.state.iter().zip(arguments) {
                sup_args.insert(
                    component.name.clone(),
                    args.get(argument).cloned().unwrap_or(Value::Null),
                );
            }
            self.run_constructor(sup, &sup_args, instance);
        }

        for name in &ctor.field_inits {
            let value = args.get(name).cloned().unwrap_or(Value::Null);
            instance.set_raw(&decl.name, name, value);
        }
    }

    pub fn read(&self, instance: &Instance, accessor: &AccessorRef) -> Value {
        match accessor {
            AccessorRef::Synthesized {
                declaration,
                component,
            } => instance.raw(declaration, component),
            AccessorRef::Explicit {
                declaration,
                method,
            } => {
                let behavior = self
                    .explicit
                    .get(&(declaration.clone(), method.clone()))
                    .expect("registered explicit accessor behavior");
                behavior(instance)
            }
        }
    }

    /// Destructure through the synthesized positional pattern.
    pub fn destructure(&self, id: DeclId, instance: &Instance) -> Vec<Value> {
        let result = self.engine.result(id).expect("finalized result");
        let pattern = result.plan.pattern.as_ref().expect("pattern");
        pattern
            .positions
            .iter()
            .map(|position| self.read(instance, &position.accessor))
            .collect()
    }

    /// Structural equality: same runtime declaration, then pairwise
    /// accessor-result equality in component order.
    pub fn equals(&self, id: DeclId, left: &Instance, right: &Instance) -> bool {
        let result = self.engine.result(id).expect("finalized result");
        assert!(result.plan.equality.is_some(), "equality not synthesized");
        left.declaration == right.declaration
            && self.destructure(id, left) == self.destructure(id, right)
    }

    /// Order-sensitive combination of each accessor result's hash.
    pub fn hash(&self, id: DeclId, instance: &Instance) -> u64 {
        let result = self.engine.result(id).expect("finalized result");
        assert!(result.plan.hash.is_some(), "hash not synthesized");
        let mut hasher = DefaultHasher::new();
        for value in self.destructure(id, instance) {
            value.to_string().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Fill the synthesized string template with accessor results.
    pub fn render(&self, id: DeclId, instance: &Instance) -> String {
        let result = self.engine.result(id).expect("finalized result");
        let spec = result.plan.string.as_ref().expect("string not synthesized");
        let pattern = result.plan.pattern.as_ref().expect("pattern");
        let mut rendering = spec.template.clone();
        for position in &pattern.positions {
            let value = self.read(instance, &position.accessor);
            let text = match &value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            rendering = rendering.replace(&format!("{{{}}}", position.component), &text);
        }
        rendering
    }
}

pub fn int(value: i64) -> Value {
    Value::from(value)
}
