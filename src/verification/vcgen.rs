//! Weakest-precondition construction
//!
//! `wp(c, Q)` turns a postcondition predicate into a precondition
//! predicate. Every construct except `while` stays quantifier-free; the
//! loop rule introduces one universal closure over havocked copies of the
//! variables the body touches.

use crate::ast::Cmd;
use crate::verification::encode::{eval_bool, eval_int};
use crate::verification::env::{Binding, Predicate, SymEnv};
use std::rc::Rc;
use z3::ast::{forall_const, Ast, Bool, Dynamic};
use z3::Context;

/// Weakest precondition of `cmd` with respect to the postcondition `post`
pub fn wp<'ctx>(ctx: &'ctx Context, cmd: &'ctx Cmd, post: Predicate<'ctx>) -> Predicate<'ctx> {
    match cmd {
        Cmd::Skip => post,

        Cmd::Assign { name, value } => Rc::new(move |env| {
            let term = eval_int(ctx, value, env)?;
            post(&env.bind(name, Binding::Int(term)))
        }),

        Cmd::Store {
            array,
            index,
            value,
        } => Rc::new(move |env| {
            let table = env.array(array)?;
            let index = eval_int(ctx, index, env)?;
            let value = eval_int(ctx, value, env)?;
            let updated = table.store(&index, &value);
            post(&env.bind(array, Binding::Array(updated)))
        }),

        Cmd::Seq(c1, c2) => wp(ctx, c1, wp(ctx, c2, post)),

        Cmd::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let wp_then = wp(ctx, then_branch, post.clone());
            let wp_else = wp(ctx, else_branch, post);
            Rc::new(move |env| {
                let guard = eval_bool(ctx, cond, env)?;
                let taken = Bool::and(ctx, &[&guard, &wp_then(env)?]);
                let skipped = Bool::and(ctx, &[&guard.not(), &wp_else(env)?]);
                Ok(Bool::or(ctx, &[&taken, &skipped]))
            })
        }

        Cmd::Assert(cond) => Rc::new(move |env| {
            Ok(Bool::and(ctx, &[&eval_bool(ctx, cond, env)?, &post(env)?]))
        }),

        Cmd::While { cond, body } => wp_while(ctx, cond, body, post),
    }
}

/// The invariant-based loop rule.
///
/// With `I` the environment's invariant and `E'` a havocked copy of the
/// entry state `E`, the emitted predicate is
///
/// ```text
///   ( I(E) /\ !b(E) /\ Q(E) )
/// \/ ( I(E) /\ b(E) /\ wp(S, I)(E)
///      /\ forall E'.  ( wp(S, I)(E') /\ wp(S, b)(E')
///                         -> wp(S, wp(S, I))(E') \/ !wp(S, b)(E') )
///                  /\ ( wp(S, I)(E') /\ !wp(S, b)(E') -> wp(S, Q)(E') ) )
/// ```
///
/// The concrete `wp(S, I)(E)` conjunct makes a first iteration from the
/// actual entry state discharge the body's assertions even when the
/// invariant alone is too weak to.
fn wp_while<'ctx>(
    ctx: &'ctx Context,
    cond: &'ctx crate::ast::Expr,
    body: &'ctx Cmd,
    post: Predicate<'ctx>,
) -> Predicate<'ctx> {
    // Identifiers read or written by the body; each gets a fresh symbol
    let touched: Vec<String> = body.variable_uses().names().into_iter().collect();

    let invariant: Predicate<'ctx> = Rc::new(move |env: &SymEnv<'ctx>| {
        let inv = env.invariant();
        inv(env)
    });
    let guard: Predicate<'ctx> = Rc::new(move |env: &SymEnv<'ctx>| eval_bool(ctx, cond, env));

    let establishes_inv = wp(ctx, body, invariant.clone()); // wp(S, I)
    let establishes_inv_twice = wp(ctx, body, establishes_inv.clone()); // wp(S, wp(S, I))
    let guard_after_body = wp(ctx, body, guard); // wp(S, b)
    let establishes_post = wp(ctx, body, post.clone()); // wp(S, Q)

    Rc::new(move |env| {
        let inv_at_entry = invariant(env)?;
        let guard_at_entry = eval_bool(ctx, cond, env)?;

        // Havoc the body variables, recording each fresh symbol so nested
        // havocs pick new names
        let mut havocked = env.clone();
        let mut bounds: Vec<Dynamic<'ctx>> = Vec::new();
        for name in &touched {
            let fresh_name = havocked.fresh_name(name);
            let fresh = havocked.lookup(name)?.fresh(ctx, &fresh_name);
            bounds.push(fresh.to_dynamic());
            havocked = havocked
                .bind(&fresh_name, fresh.clone())
                .bind(name, fresh);
        }

        let preserved = establishes_inv(&havocked)?;
        let guard_next = guard_after_body(&havocked)?;
        let preserved_twice = establishes_inv_twice(&havocked)?;
        let post_on_exit = establishes_post(&havocked)?;

        let continues_or_stops = Bool::and(ctx, &[&preserved, &guard_next])
            .implies(&Bool::or(ctx, &[&preserved_twice, &guard_next.not()]));
        let stop_reaches_post =
            Bool::and(ctx, &[&preserved, &guard_next.not()]).implies(&post_on_exit);

        let inductive = if bounds.is_empty() {
            Bool::from_bool(ctx, true)
        } else {
            let bound_refs: Vec<&dyn Ast<'ctx>> =
                bounds.iter().map(|b| b as &dyn Ast<'ctx>).collect();
            forall_const(
                ctx,
                &bound_refs,
                &[],
                &Bool::and(ctx, &[&continues_or_stops, &stop_reaches_post]),
            )
        };

        let first_step = establishes_inv(env)?;
        let enters = Bool::and(
            ctx,
            &[&inv_at_entry, &guard_at_entry, &first_step, &inductive],
        );
        let never_enters = Bool::and(ctx, &[&inv_at_entry, &guard_at_entry.not(), &post(env)?]);
        Ok(Bool::or(ctx, &[&never_enters, &enters]))
    })
}
