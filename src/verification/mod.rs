//! Verification and synthesis engine
//!
//! Drives the wp pipeline: build a symbolic environment over the free
//! identifiers, compute `wp(c, Q)`, and discharge the resulting formula
//! with Z3. When the invariant-based encoding cannot settle a query the
//! engine retries on bounded unfoldings of the program, one solver
//! context per attempt.

pub mod encode;
pub mod env;
pub mod solver;
pub mod unfold;
pub mod vcgen;

use crate::ast::{Cmd, Expr, VariableUses};
use crate::error::VerificationError;
use env::SymEnv;
use solver::{HoleModel, SmtBackend, SolveOutcome, ValidityOutcome};
use z3::ast::{forall_const, Ast, Bool, Dynamic};
use z3::{Config, Context};

/// Deepest unfolding attempted before giving up
pub const DEFAULT_MAX_UNFOLD_DEPTH: usize = 9;

/// One input/output example pair for synthesis: a Hoare triple
/// `{pre} c {post}` the completed program must satisfy
#[derive(Debug, Clone)]
pub struct Example {
    pub pre: Expr,
    pub post: Expr,
}

impl Example {
    pub fn new(pre: Expr, post: Expr) -> Self {
        Self { pre, post }
    }

    /// The unconstrained pair `{true} c {true}`; still forces every
    /// assertion in the program
    pub fn trivial() -> Self {
        Self {
            pre: Expr::Bool(true),
            post: Expr::Bool(true),
        }
    }
}

/// Main verification engine
pub struct VerificationEngine {
    max_unfold_depth: usize,
    solver_timeout_ms: Option<u64>,
}

impl VerificationEngine {
    pub fn new() -> Self {
        Self {
            max_unfold_depth: DEFAULT_MAX_UNFOLD_DEPTH,
            solver_timeout_ms: None,
        }
    }

    /// Cap the unfolding retry ladder
    pub fn with_max_unfold_depth(mut self, depth: usize) -> Self {
        self.max_unfold_depth = depth;
        self
    }

    /// Give each solver query a wall-clock budget
    pub fn with_solver_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.solver_timeout_ms = Some(timeout_ms);
        self
    }

    /// Decide the Hoare triple `{pre} program {post}` under `invariant`.
    ///
    /// Returns `true` iff the triple is proved, either by the invariant
    /// rule on the original program or on some bounded unfolding of it.
    pub fn verify(
        &self,
        pre: &Expr,
        program: &Cmd,
        post: &Expr,
        invariant: &Expr,
    ) -> Result<bool, VerificationError> {
        let uses = gather_uses(program, &[pre, post, invariant])?;
        let can_unfold = program.has_loops();

        for depth in 0..=self.max_unfold_depth {
            if depth > 0 && !can_unfold {
                break;
            }
            let unfolded;
            let candidate: &Cmd = if depth == 0 {
                program
            } else {
                unfolded = unfold::unfold(program, depth);
                &unfolded
            };

            match self.check_triple(&uses, pre, candidate, post, invariant)? {
                ValidityOutcome::Valid => {
                    log::debug!("triple proved at unfolding depth {depth}");
                    return Ok(true);
                }
                ValidityOutcome::Refuted(counterexample) => {
                    log::debug!("depth {depth} refuted: {counterexample}");
                }
                ValidityOutcome::Undecided => {
                    log::debug!("depth {depth} undecided");
                }
            }
        }
        Ok(false)
    }

    /// Find integer values for the holes of `program` making every
    /// example triple valid under `invariant`.
    ///
    /// Hole identities are assigned on first use and stay attached to the
    /// caller's AST so the model can be substituted back. An empty
    /// example list is treated as the single trivial pair.
    pub fn synthesize(
        &self,
        program: &mut Cmd,
        invariant: &Expr,
        examples: &[Example],
    ) -> Result<Option<HoleModel>, VerificationError> {
        let hole_count = program.assign_hole_ids();

        let trivial_examples;
        let examples: &[Example] = if examples.is_empty() {
            trivial_examples = [Example::trivial()];
            &trivial_examples
        } else {
            examples
        };

        let mut predicates: Vec<&Expr> = vec![invariant];
        for example in examples {
            predicates.push(&example.pre);
            predicates.push(&example.post);
        }
        let uses = gather_uses(program, &predicates)?;
        let can_unfold = program.has_loops();

        for depth in 0..=self.max_unfold_depth {
            if depth > 0 && !can_unfold {
                break;
            }
            let unfolded;
            let candidate: &Cmd = if depth == 0 {
                program
            } else {
                unfolded = unfold::unfold(program, depth);
                &unfolded
            };

            match self.solve_sketch(&uses, candidate, invariant, examples, hole_count)? {
                SolveOutcome::Model(model) => {
                    log::debug!("model found at unfolding depth {depth}: {model}");
                    return Ok(Some(model));
                }
                SolveOutcome::NoSolution => {
                    log::debug!("depth {depth} has no model");
                }
                SolveOutcome::Undecided => {
                    log::debug!("depth {depth} undecided");
                }
            }
        }
        Ok(None)
    }

    fn solver_config(&self) -> Config {
        let mut config = Config::new();
        if let Some(timeout_ms) = self.solver_timeout_ms {
            config.set_timeout_msec(timeout_ms);
        }
        config
    }

    /// Discharge one triple at one depth in a fresh solver context
    fn check_triple(
        &self,
        uses: &VariableUses,
        pre: &Expr,
        program: &Cmd,
        post: &Expr,
        invariant: &Expr,
    ) -> Result<ValidityOutcome, VerificationError> {
        let config = self.solver_config();
        let ctx = Context::new(&config);
        let env = SymEnv::new(&ctx, uses, encode::predicate_of(&ctx, invariant));

        let weakest = vcgen::wp(&ctx, program, encode::predicate_of(&ctx, post));
        let pre_formula = encode::eval_bool(&ctx, pre, &env)?;
        let goal = pre_formula.implies(&weakest(&env)?);

        let backend = SmtBackend::new(&ctx);
        Ok(backend.check_validity(&goal, &env))
    }

    /// Solve one synthesis query at one depth: holes stay free, program
    /// state is universally quantified
    fn solve_sketch(
        &self,
        uses: &VariableUses,
        program: &Cmd,
        invariant: &Expr,
        examples: &[Example],
        hole_count: usize,
    ) -> Result<SolveOutcome, VerificationError> {
        let config = self.solver_config();
        let ctx = Context::new(&config);
        let env = SymEnv::new(&ctx, uses, encode::predicate_of(&ctx, invariant));

        let mut obligations: Vec<Bool> = Vec::new();
        for example in examples {
            let weakest = vcgen::wp(&ctx, program, encode::predicate_of(&ctx, &example.post));
            let pre_formula = encode::eval_bool(&ctx, &example.pre, &env)?;
            obligations.push(pre_formula.implies(&weakest(&env)?));
        }
        let obligation_refs: Vec<&Bool> = obligations.iter().collect();
        let conjoined = Bool::and(&ctx, &obligation_refs);

        let state: Vec<Dynamic> = env.bindings().map(|(_, b)| b.to_dynamic()).collect();
        let goal = if state.is_empty() {
            conjoined
        } else {
            let state_refs: Vec<&dyn Ast> = state.iter().map(|d| d as &dyn Ast).collect();
            forall_const(&ctx, &state_refs, &[], &conjoined)
        };

        let backend = SmtBackend::new(&ctx);
        Ok(backend.solve(&goal, hole_count))
    }
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect every identifier used by the program or its specification and
/// reject names used both as scalar and as array
fn gather_uses(program: &Cmd, predicates: &[&Expr]) -> Result<VariableUses, VerificationError> {
    let mut uses = program.variable_uses();
    for predicate in predicates {
        predicate.collect_uses(&mut uses);
    }
    if let Some(name) = uses.scalars.intersection(&uses.arrays).next() {
        return Err(VerificationError::SortClash { name: name.clone() });
    }
    Ok(uses)
}
