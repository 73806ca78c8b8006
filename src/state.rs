//! State description model: ordered, name-unique, typed components.

use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

/// Opaque type descriptor compared structurally on its canonical text.
/// The engine performs no inference; two descriptors are the same type
/// exactly when their renderings are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TypeDescriptor {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// One named, typed element of a state description. `position` is the index
/// in declaration order; order is semantically significant (constructor
/// parameters, destructuring, equality comparison).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Component {
    pub name: String,
    pub ty: TypeDescriptor,
    pub position: usize,
}

impl Component {
    #[must_use]
    pub fn matches(&self, name: &str, ty: &TypeDescriptor) -> bool {
        self.name == name && self.ty == *ty
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Validation failure while constructing a [`StateDescription`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateDescriptionError {
    DuplicateComponent { name: String },
    Empty,
}

impl fmt::Display for StateDescriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateDescriptionError::DuplicateComponent { name } => {
                write!(f, "duplicate component name `{name}`")
            }
            StateDescriptionError::Empty => f.write_str("state description has no components"),
        }
    }
}

impl StdError for StateDescriptionError {}

/// Ordered component list owned by exactly one declaration. Immutable once
/// constructed; lookups are read-only, by index or by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateDescription {
    components: Vec<Component>,
}

impl StateDescription {
    /// Validate a proposed ordered component list.
    ///
    /// # Errors
    ///
    /// Fails on a repeated component name or an empty list.
    pub fn new(
        components: impl IntoIterator<Item = (String, TypeDescriptor)>,
    ) -> Result<Self, StateDescriptionError> {
        let mut canonical = Vec::new();
        for (position, (name, ty)) in components.into_iter().enumerate() {
            if canonical.iter().any(|c: &Component| c.name == name) {
                return Err(StateDescriptionError::DuplicateComponent { name });
            }
            canonical.push(Component { name, ty, position });
        }
        if canonical.is_empty() {
            return Err(StateDescriptionError::Empty);
        }
        Ok(Self {
            components: canonical,
        })
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Component> {
        self.components.get(position)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    /// Position of the component with the given name and type, if any.
    /// The structural match used for subsumption and binding; correspondence
    /// is inferred, never linked.
    #[must_use]
    pub fn position_of(&self, name: &str, ty: &TypeDescriptor) -> Option<usize> {
        self.components
            .iter()
            .find(|c| c.matches(name, ty))
            .map(|c| c.position)
    }
}

impl<'a> IntoIterator for &'a StateDescription {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
