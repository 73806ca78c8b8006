//! Content fingerprints keying the incremental result cache.

use std::fmt;

use blake3::Hasher;

use crate::decl::{ConstructorForm, Declaration};

/// Stable digest of a declaration's externally visible shape plus its
/// superclass's fingerprint. Equal fingerprints mean a cached result is
/// still valid.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

impl Fingerprint {
    /// First eight hex digits, for logging.
    #[must_use]
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Fingerprint a declaration's own explicit members and state description,
/// chained with the superclass fingerprint so superclass edits invalidate
/// every descendant.
#[must_use]
pub fn fingerprint_declaration(decl: &Declaration, superclass: Option<&Fingerprint>) -> Fingerprint {
    let mut hasher = Hasher::new();
    hasher.update(decl.name.as_bytes());
    hasher.update(&[
        u8::from(decl.modifiers.is_abstract),
        u8::from(decl.modifiers.is_final),
    ]);
    if let Some(permitted) = &decl.modifiers.sealed_to {
        for name in permitted {
            update_str(&mut hasher, name);
        }
    }
    for component in &decl.state {
        update_str(&mut hasher, &component.name);
        update_str(&mut hasher, component.ty.as_str());
    }
    for field in &decl.fields {
        update_str(&mut hasher, &field.name);
        update_str(&mut hasher, field.ty.as_str());
    }
    for method in &decl.methods {
        update_str(&mut hasher, &method.name);
        for param in &method.params {
            update_str(&mut hasher, param.as_str());
        }
        if let Some(ret) = &method.ret {
            update_str(&mut hasher, ret.as_str());
        }
    }
    for ctor in &decl.constructors {
        match &ctor.form {
            ConstructorForm::Compact => {
                hasher.update(b"compact");
            }
            ConstructorForm::Explicit { params } => {
                hasher.update(b"explicit");
                for (name, ty) in params {
                    update_str(&mut hasher, name);
                    update_str(&mut hasher, ty.as_str());
                }
            }
        }
        for field in &ctor.assigned_fields {
            update_str(&mut hasher, field);
        }
        if let Some(call) = &ctor.super_call {
            hasher.update(b"super");
            for argument in &call.arguments {
                update_str(&mut hasher, argument);
            }
        }
    }
    if let Some(parent) = superclass {
        hasher.update(&parent.0);
    }
    Fingerprint(*hasher.finalize().as_bytes())
}

// Length-prefixed so adjacent strings cannot collide by concatenation.
fn update_str(hasher: &mut Hasher, text: &str) {
    hasher.update(&(text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
}
