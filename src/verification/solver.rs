// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SMT solver interface using Z3
//!
//! One `SmtBackend` wraps one solver over one context and serves exactly
//! one query; the driver builds a fresh backend per unfolding depth so no
//! assertions leak between attempts.

use crate::ast::HoleId;
use crate::verification::encode::hole_const;
use crate::verification::env::SymEnv;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use z3::ast::{Bool, Dynamic};
use z3::{Context, SatResult, Solver};

/// Integer values chosen for hole constants.
///
/// A hole the solver left unconstrained has no entry; readers substitute
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HoleModel {
    values: BTreeMap<HoleId, i64>,
}

impl HoleModel {
    pub fn insert(&mut self, id: HoleId, value: i64) {
        self.values.insert(id, value);
    }

    pub fn value(&self, id: HoleId) -> Option<i64> {
        self.values.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HoleId, i64)> + '_ {
        self.values.iter().map(|(&id, &value)| (id, value))
    }
}

impl fmt::Display for HoleModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (id, value) in &self.values {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "??#{id} = {value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Variable assignments refuting a verification condition
#[derive(Debug, Clone, Default)]
pub struct Counterexample {
    pub assignments: BTreeMap<String, String>,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.assignments {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name} = {value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Result of a validity check
pub enum ValidityOutcome {
    /// The formula holds in every state (its negation is unsatisfiable)
    Valid,

    /// A state refuting the formula was found
    Refuted(Counterexample),

    /// The solver gave up
    Undecided,
}

/// Result of a synthesis query
pub enum SolveOutcome {
    /// Hole values satisfying the query
    Model(HoleModel),

    /// No hole values exist
    NoSolution,

    /// The solver gave up
    Undecided,
}

/// One solver scoped to one query
pub struct SmtBackend<'ctx> {
    ctx: &'ctx Context,
    solver: Solver<'ctx>,
}

impl<'ctx> SmtBackend<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            solver: Solver::new(ctx),
        }
    }

    /// Check that `formula` holds in every state by refuting its negation.
    ///
    /// On failure the refuting state is read back from the bindings of
    /// `env` for diagnostics.
    pub fn check_validity(&self, formula: &Bool<'ctx>, env: &SymEnv<'ctx>) -> ValidityOutcome {
        self.solver.assert(&formula.not());
        match self.solver.check() {
            SatResult::Unsat => ValidityOutcome::Valid,
            SatResult::Sat => ValidityOutcome::Refuted(self.extract_counterexample(env)),
            SatResult::Unknown => ValidityOutcome::Undecided,
        }
    }

    /// Check satisfiability of `formula` and extract values for the first
    /// `hole_count` hole constants
    pub fn solve(&self, formula: &Bool<'ctx>, hole_count: usize) -> SolveOutcome {
        self.solver.assert(formula);
        match self.solver.check() {
            SatResult::Sat => SolveOutcome::Model(self.extract_holes(hole_count)),
            SatResult::Unsat => SolveOutcome::NoSolution,
            SatResult::Unknown => SolveOutcome::Undecided,
        }
    }

    fn extract_holes(&self, hole_count: usize) -> HoleModel {
        let mut model = HoleModel::default();
        let solver_model = match self.solver.get_model() {
            Some(m) => m,
            None => return model,
        };
        for id in 0..hole_count {
            let constant = hole_const(self.ctx, id);
            // Without model completion an unconstrained hole evaluates to
            // itself rather than a numeral and stays out of the model
            if let Some(value) = solver_model
                .eval(&constant, false)
                .and_then(|term| term.as_i64())
            {
                model.insert(id, value);
            }
        }
        model
    }

    fn extract_counterexample(&self, env: &SymEnv<'ctx>) -> Counterexample {
        let mut counterexample = Counterexample::default();
        let solver_model = match self.solver.get_model() {
            Some(m) => m,
            None => return counterexample,
        };
        for (name, binding) in env.bindings() {
            let term: Dynamic<'ctx> = binding.to_dynamic();
            if let Some(value) = solver_model.eval(&term, true) {
                counterexample
                    .assignments
                    .insert(name.clone(), value.to_string());
            }
        }
        counterexample
    }
}
