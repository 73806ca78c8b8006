//! Declarations and the arena the hierarchy resolver walks.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};
use crate::state::{StateDescription, StateDescriptionError, TypeDescriptor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Interface,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_abstract: bool,
    pub is_final: bool,
    pub sealed_to: Option<Vec<String>>,
}

/// An explicitly authored field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDescriptor,
}

/// An explicitly authored method signature. Bodies are opaque to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    pub ret: Option<TypeDescriptor>,
}

impl MethodDecl {
    /// Whether this method satisfies the accessor contract for a component of
    /// the given name and type: same name, no parameters, matching return.
    #[must_use]
    pub fn is_accessor_for(&self, name: &str, ty: &TypeDescriptor) -> bool {
        self.name == name && self.params.is_empty() && self.ret.as_ref() == Some(ty)
    }
}

/// Constructor shape as authored. A compact form carries a body but no
/// parameter list of its own; its parameters are the state description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructorForm {
    Explicit { params: Vec<(String, TypeDescriptor)> },
    Compact,
}

/// Explicit `super(...)` call inside a constructor body, by argument name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuperCall {
    pub arguments: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub form: ConstructorForm,
    /// Field names the authored body assigns.
    pub assigned_fields: Vec<String>,
    pub super_call: Option<SuperCall>,
}

impl ConstructorDecl {
    #[must_use]
    pub fn compact() -> Self {
        Self {
            form: ConstructorForm::Compact,
            assigned_fields: Vec::new(),
            super_call: None,
        }
    }

    #[must_use]
    pub fn assigns(mut self, field: impl Into<String>) -> Self {
        self.assigned_fields.push(field.into());
        self
    }

    #[must_use]
    pub fn with_super_call(mut self, arguments: Vec<String>) -> Self {
        self.super_call = Some(SuperCall { arguments });
        self
    }
}

/// A carrier class or interface: a state description plus whatever members
/// the author wrote out by hand. The superclass is a non-owning reference
/// resolved through the arena.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    pub modifiers: Modifiers,
    pub state: StateDescription,
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
}

impl Declaration {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DeclarationBuilder {
        DeclarationBuilder::new(name)
    }

    #[must_use]
    pub fn is_concrete(&self) -> bool {
        !self.modifiers.is_abstract
    }

    /// Methods that collide with a would-be synthesized identity member.
    #[must_use]
    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }
}

/// Builder used by the upstream symbol-table adapter and by tests.
pub struct DeclarationBuilder {
    name: String,
    kind: DeclKind,
    modifiers: Modifiers,
    components: Vec<(String, TypeDescriptor)>,
    superclass: Option<String>,
    fields: Vec<FieldDecl>,
    constructors: Vec<ConstructorDecl>,
    methods: Vec<MethodDecl>,
}

impl DeclarationBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeclKind::Class,
            modifiers: Modifiers::default(),
            components: Vec::new(),
            superclass: None,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: DeclKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn abstract_(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    #[must_use]
    pub fn final_(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    #[must_use]
    pub fn sealed_to(mut self, permitted: Vec<String>) -> Self {
        self.modifiers.sealed_to = Some(permitted);
        self
    }

    #[must_use]
    pub fn component(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.components.push((name.into(), ty.into()));
        self
    }

    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Shorthand for an authored zero-parameter accessor method.
    #[must_use]
    pub fn accessor(mut self, name: impl Into<String>, ret: impl Into<TypeDescriptor>) -> Self {
        self.methods.push(MethodDecl {
            name: name.into(),
            params: Vec::new(),
            ret: Some(ret.into()),
        });
        self
    }

    /// Validate and assemble the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolve`] carrying a structured diagnostic that
    /// names this declaration (and the offending component, where there is
    /// one) when the component list repeats a name or is empty.
    pub fn finish(self) -> Result<Declaration> {
        let state = match StateDescription::new(self.components) {
            Ok(state) => state,
            Err(StateDescriptionError::DuplicateComponent { name }) => {
                return Err(Error::Resolve(
                    Diagnostic::error(
                        DiagnosticKind::DuplicateComponent,
                        self.name,
                        format!("component `{name}` is declared more than once"),
                    )
                    .with_component(name),
                ));
            }
            Err(StateDescriptionError::Empty) => {
                return Err(Error::Resolve(Diagnostic::error(
                    DiagnosticKind::IncompleteStateDescription,
                    self.name,
                    "state description has no components",
                )));
            }
        };
        Ok(Declaration {
            name: self.name,
            kind: self.kind,
            modifiers: self.modifiers,
            state,
            superclass: self.superclass,
            fields: self.fields,
            constructors: self.constructors,
            methods: self.methods,
        })
    }
}

/// Identifier for a declaration stored in the [`DeclArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeclId(pub usize);

/// Arena of declarations with superclass adjacency by index. Lookups go
/// through indices so the hierarchy walk never chases back-references.
#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Declaration>,
    by_name: HashMap<String, DeclId>,
}

impl DeclArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len());
        self.by_name.insert(decl.name.clone(), id);
        self.decls.push(decl);
        id
    }

    /// Replace a declaration in place, keeping its id. The caller is
    /// responsible for invalidating cached results.
    pub fn replace(&mut self, id: DeclId, decl: Declaration) {
        self.by_name.remove(&self.decls[id.0].name);
        self.by_name.insert(decl.name.clone(), id);
        self.decls[id.0] = decl;
    }

    #[must_use]
    pub fn get(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0]
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn superclass_of(&self, id: DeclId) -> Option<DeclId> {
        self.decls[id.0]
            .superclass
            .as_deref()
            .and_then(|name| self.lookup(name))
    }

    /// Direct subclasses, by scan. The arena stays small enough in practice
    /// that an inverted index has not been worth maintaining.
    #[must_use]
    pub fn subclasses_of(&self, id: DeclId) -> Vec<DeclId> {
        let name = &self.decls[id.0].name;
        self.decls
            .iter()
            .enumerate()
            .filter(|(_, d)| d.superclass.as_deref() == Some(name.as_str()))
            .map(|(index, _)| DeclId(index))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len()).map(DeclId)
    }
}
