//! Bounded loop unfolding
//!
//! Rewrites every `while b do S` into the assert-guarded chain
//! `assert b ; S ; ... ; assert b ; S ; assert not b` with `depth`
//! iterations; depth zero leaves only `assert not b`. Guard and body
//! clones carry their hole identity slots along, so a hole denotes the
//! same solver constant in the original program and in every unfolding.

use crate::ast::{Cmd, Expr};

/// Unfold every loop in `cmd` to `depth` explicit iterations
pub fn unfold(cmd: &Cmd, depth: usize) -> Cmd {
    match cmd {
        Cmd::While { cond, body } => {
            let body = unfold(body, depth);
            let mut chain = Cmd::Assert(Expr::Not(Box::new(cond.clone())));
            for _ in 0..depth {
                chain = Cmd::Seq(
                    Box::new(Cmd::Assert(cond.clone())),
                    Box::new(Cmd::Seq(Box::new(body.clone()), Box::new(chain))),
                );
            }
            chain
        }
        Cmd::Seq(c1, c2) => Cmd::Seq(
            Box::new(unfold(c1, depth)),
            Box::new(unfold(c2, depth)),
        ),
        Cmd::If {
            cond,
            then_branch,
            else_branch,
        } => Cmd::If {
            cond: cond.clone(),
            then_branch: Box::new(unfold(then_branch, depth)),
            else_branch: Box::new(unfold(else_branch, depth)),
        },
        other => other.clone(),
    }
}
