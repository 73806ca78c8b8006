#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Carrier-member derivation engine.
//!
//! Given class/interface declarations annotated with an ordered state
//! description, the engine decides which data-access members (canonical
//! constructor, accessors, equality/hash/string, destructuring pattern) can
//! be synthesized mechanically, resolves the decisions consistently across
//! single-inheritance chains, and hands a [`synthesis::DerivationPlan`] per
//! declaration to a code-emission backend.

pub mod binding;
pub mod decl;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod evolution;
pub mod fingerprint;
pub mod hierarchy;
pub mod logging;
pub mod state;
pub mod synthesis;

pub use decl::{DeclArena, DeclId, Declaration};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use engine::{BatchStats, CallSiteMatch, DeclResult, Engine};
pub use error::{Error, Result};
pub use state::{Component, StateDescription, TypeDescriptor};
pub use synthesis::DerivationPlan;
