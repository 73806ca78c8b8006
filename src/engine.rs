//! Batch driver: dependency-ordered resolution, the write-once result
//! table, and fingerprint-based incremental invalidation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::binding::{BindingSet, ComponentBinding, SuperContext, resolve_bindings};
use crate::decl::{DeclArena, DeclId, Declaration};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::evolution::match_prefix;
use crate::fingerprint::{Fingerprint, fingerprint_declaration};
use crate::hierarchy::{SubsumptionMap, dependency_order};
use crate::synthesis::{AccessorRef, DerivationPlan, PatternPosition, SynthesisInput, synthesize};

/// Finalized per-declaration analysis: written exactly once per resolution,
/// read-only afterward.
#[derive(Debug)]
pub struct DeclResult {
    pub bindings: BindingSet,
    pub subsumption: Option<SubsumptionMap>,
    pub plan: DerivationPlan,
    pub fingerprint: Fingerprint,
}

impl DeclResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.plan.diagnostics.iter().any(|d| d.severity.is_error())
    }
}

/// Shared table of finalized results. Single writer per entry, any number
/// of readers; finalizing an already-finalized entry is an internal error.
#[derive(Debug, Default)]
struct ResultTable {
    entries: RwLock<HashMap<DeclId, Arc<DeclResult>>>,
}

impl ResultTable {
    fn get(&self, id: DeclId) -> Option<Arc<DeclResult>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).cloned()
    }

    fn finalize(&self, id: DeclId, result: DeclResult) -> Result<Arc<DeclResult>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&id) {
            return Err(Error::internal(format!(
                "result for declaration {id:?} finalized twice"
            )));
        }
        let result = Arc::new(result);
        entries.insert(id, Arc::clone(&result));
        Ok(result)
    }

    fn clear(&self, id: DeclId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&id).is_some()
    }
}

/// Counters for one `resolve_all` run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Declarations resolved this run with a clean plan.
    pub resolved: usize,
    /// Declarations whose cached result was still valid.
    pub cached: usize,
    /// Declarations whose plan carries at least one error, plus cycle
    /// members and their descendants, which get no plan at all.
    pub failed: usize,
}

/// Positional call-site match outcome, cloned out of the finalized pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSiteMatch {
    pub bound: Vec<PatternPosition>,
    pub universal: usize,
}

/// The derivation engine: owns the declaration arena and the table of
/// finalized results across incremental runs.
#[derive(Debug, Default)]
pub struct Engine {
    arena: DeclArena,
    table: ResultTable,
    batch_diagnostics: Vec<Diagnostic>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_declaration(&mut self, decl: Declaration) -> DeclId {
        self.arena.push(decl)
    }

    /// Replace a declaration in place and invalidate it together with every
    /// known transitive subclass.
    pub fn replace_declaration(&mut self, id: DeclId, decl: Declaration) {
        self.arena.replace(id, decl);
        self.invalidate(id);
    }

    #[must_use]
    pub fn arena(&self) -> &DeclArena {
        &self.arena
    }

    /// The finalized result for a declaration, if the last run produced one.
    /// Cycle members and their descendants have none.
    #[must_use]
    pub fn result(&self, id: DeclId) -> Option<Arc<DeclResult>> {
        self.table.get(id)
    }

    /// Batch-level diagnostics from the last run (inheritance cycles).
    #[must_use]
    pub fn batch_diagnostics(&self) -> &[Diagnostic] {
        &self.batch_diagnostics
    }

    /// Drop the cached result for `id` and all transitive subclasses.
    pub fn invalidate(&mut self, id: DeclId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if self.table.clear(current) {
                debug!(
                    target: "carrier.engine",
                    declaration = %self.arena.get(current).name,
                    "invalidated cached result"
                );
            }
            pending.extend(self.arena.subclasses_of(current));
        }
    }

    /// Resolve every declaration in dependency order. Cached results with an
    /// unchanged fingerprint are kept; everything else is recomputed. Cycle
    /// detection completes first, and no member of a cycle (nor any of its
    /// descendants) reaches synthesis.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Internal`] when a table invariant breaks (an
    /// unfinalized superclass or a double finalization); per-declaration
    /// failures land in the plans' diagnostics instead.
    pub fn resolve_all(&mut self) -> Result<BatchStats> {
        let order = dependency_order(&self.arena);
        self.batch_diagnostics = order.cycle_diagnostics(&self.arena);

        let mut stats = BatchStats::default();
        for cycle in &order.cycles {
            for id in cycle {
                self.table.clear(*id);
                stats.failed += 1;
            }
        }
        for id in &order.blocked {
            self.table.clear(*id);
            stats.failed += 1;
        }

        for id in order.order {
            let super_id = self.arena.superclass_of(id);
            let super_result = match super_id {
                Some(sup) => match self.table.get(sup) {
                    Some(result) => Some((sup, result)),
                    None => {
                        return Err(Error::internal(format!(
                            "superclass of {:?} not finalized before subclass",
                            self.arena.get(id).name
                        )));
                    }
                },
                None => None,
            };

            let decl = self.arena.get(id);
            let fingerprint =
                fingerprint_declaration(decl, super_result.as_ref().map(|(_, r)| &r.fingerprint));
            if let Some(existing) = self.table.get(id) {
                if existing.fingerprint == fingerprint {
                    stats.cached += 1;
                    continue;
                }
                self.table.clear(id);
            }

            let result = self.resolve_one(id, super_result, fingerprint)?;
            if result.has_errors() {
                stats.failed += 1;
            } else {
                stats.resolved += 1;
            }
        }

        info!(
            target: "carrier.engine",
            resolved = stats.resolved,
            cached = stats.cached,
            failed = stats.failed,
            "batch resolution finished"
        );
        Ok(stats)
    }

    fn resolve_one(
        &self,
        id: DeclId,
        super_result: Option<(DeclId, Arc<DeclResult>)>,
        fingerprint: Fingerprint,
    ) -> Result<Arc<DeclResult>> {
        let decl = self.arena.get(id);
        let subsumption = super_result.as_ref().map(|(sup, _)| {
            SubsumptionMap::compute(&self.arena.get(*sup).state, &decl.state)
        });

        let mut sink = DiagnosticSink::new();
        let super_ctx = super_result.as_ref().zip(subsumption.as_ref()).map(
            |((sup, result), subsumption)| SuperContext {
                id: *sup,
                bindings: &result.bindings,
                subsumption,
            },
        );
        let bindings = resolve_bindings(&self.arena, id, super_ctx, &mut sink);

        let mut inherited_accessors = HashMap::new();
        for (position, entry) in bindings.iter().enumerate() {
            if let ComponentBinding::InheritedAccessor(sup) = entry.binding
                && let Some(component) = decl.state.get(position)
                && let Some(accessor) = self.provider_for(sup, &component.name)
            {
                inherited_accessors.insert(position, accessor);
            }
        }

        let input = SynthesisInput {
            arena: &self.arena,
            id,
            bindings: &bindings,
            subsumption: subsumption.as_ref(),
            super_state: super_result.as_ref().map(|(sup, _)| &self.arena.get(*sup).state),
            inherited_accessors: &inherited_accessors,
        };
        let mut plan = synthesize(&input, &mut sink);
        plan.diagnostics = sink.into_vec();

        self.table.finalize(
            id,
            DeclResult {
                bindings,
                subsumption,
                plan,
                fingerprint,
            },
        )
    }

    /// Walk the ancestor chain to the declaration whose accessor actually
    /// produces the named component's value.
    fn provider_for(&self, mut current: DeclId, component: &str) -> Option<AccessorRef> {
        loop {
            let decl = self.arena.get(current);
            let position = decl.state.by_name(component)?.position;
            let result = self.table.get(current)?;
            match result.bindings.get(position)?.binding {
                ComponentBinding::FieldBacked(_) => {
                    return Some(AccessorRef::Synthesized {
                        declaration: decl.name.clone(),
                        component: component.to_string(),
                    });
                }
                ComponentBinding::ExplicitAccessor(method) => {
                    let owner = self.arena.get(method.decl);
                    return Some(AccessorRef::Explicit {
                        declaration: owner.name.clone(),
                        method: owner.methods[method.index].name.clone(),
                    });
                }
                ComponentBinding::InheritedAccessor(next) => current = next,
                ComponentBinding::Unresolved => return None,
            }
        }
    }

    /// Match a call-site pattern supplying `supplied` positional
    /// sub-patterns against the declaration's finalized destructuring shape,
    /// honoring prefix-compatible evolution.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Resolve`] on an oversupplied pattern, and with
    /// [`Error::Internal`] when the declaration has no finalized pattern to
    /// match against.
    pub fn match_call_site(&self, id: DeclId, supplied: usize) -> Result<CallSiteMatch> {
        let decl = self.arena.get(id);
        let result = self.table.get(id).ok_or_else(|| {
            Error::internal(format!("declaration `{}` has no finalized plan", decl.name))
        })?;
        let pattern = result.plan.pattern.as_ref().ok_or_else(|| {
            Error::internal(format!(
                "declaration `{}` has no destructuring pattern",
                decl.name
            ))
        })?;
        let matched = match_prefix(&decl.name, pattern, supplied)?;
        Ok(CallSiteMatch {
            bound: matched.bound.to_vec(),
            universal: matched.universal,
        })
    }
}
