//! Prefix-compatible pattern matching against an evolved state description.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::synthesis::{PatternPosition, PatternSpec};

/// A `k`-ary pattern matched against an `n`-ary declaration (`k <= n`): the
/// first `k` positions bind through their accessors, the trailing `n - k`
/// positions are universal and always match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixMatch<'a> {
    pub bound: &'a [PatternPosition],
    pub universal: usize,
}

impl PrefixMatch<'_> {
    /// True when the pattern covers the whole description (no implicit
    /// trailing wildcards).
    #[must_use]
    pub fn is_exhaustive(&self) -> bool {
        self.universal == 0
    }
}

/// Match a pattern supplying `supplied` positional sub-patterns against the
/// declaration's finalized destructuring shape. Component identification is
/// purely positional; there is no way to match a non-prefix subset.
///
/// # Errors
///
/// Fails with a `PatternArity` diagnostic when `supplied` exceeds the
/// declaration's arity.
pub fn match_prefix<'a>(
    declaration: &str,
    pattern: &'a PatternSpec,
    supplied: usize,
) -> Result<PrefixMatch<'a>, Diagnostic> {
    if supplied > pattern.arity {
        return Err(Diagnostic::error(
            DiagnosticKind::PatternArity,
            declaration,
            format!(
                "pattern supplies {supplied} sub-patterns but the state description has {} components",
                pattern.arity
            ),
        ));
    }
    Ok(PrefixMatch {
        bound: &pattern.positions[..supplied],
        universal: pattern.arity - supplied,
    })
}
