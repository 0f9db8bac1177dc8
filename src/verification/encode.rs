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

//! Expression encoding
//!
//! Folds an expression AST into a Z3 term under a symbolic environment.
//! Arithmetic stays in linear integer arithmetic with arrays; `/` and
//! `mod` keep the solver's integer division and modulus semantics.

use crate::ast::{BinOp, Expr, HoleId};
use crate::verification::env::{SymEnv, Predicate, VcResult};
use crate::error::VerificationError;
use std::rc::Rc;
use z3::ast::{Ast, Bool, Int};
use z3::Context;

/// Solver name of a hole constant.
///
/// The double underscore keeps it outside the identifier grammar, so a
/// program variable can never alias a hole.
pub fn hole_name(id: HoleId) -> String {
    format!("__hole_{id}")
}

/// The integer constant standing for a hole
pub fn hole_const<'ctx>(ctx: &'ctx Context, id: HoleId) -> Int<'ctx> {
    Int::new_const(ctx, hole_name(id))
}

/// An encoded term: integer-sorted or boolean-sorted
pub enum SmtTerm<'ctx> {
    Int(Int<'ctx>),
    Bool(Bool<'ctx>),
}

impl<'ctx> SmtTerm<'ctx> {
    fn into_int(self) -> VcResult<Int<'ctx>> {
        match self {
            SmtTerm::Int(term) => Ok(term),
            SmtTerm::Bool(_) => Err(VerificationError::IntegerExpected),
        }
    }

    fn into_bool(self) -> VcResult<Bool<'ctx>> {
        match self {
            SmtTerm::Bool(term) => Ok(term),
            SmtTerm::Int(_) => Err(VerificationError::BooleanExpected),
        }
    }
}

/// Evaluate an expression to a Z3 term under `env`
pub fn eval_expr<'ctx>(
    ctx: &'ctx Context,
    expr: &Expr,
    env: &SymEnv<'ctx>,
) -> VcResult<SmtTerm<'ctx>> {
    match expr {
        Expr::Var(name) => Ok(SmtTerm::Int(env.scalar(name)?)),

        Expr::Num(value) => Ok(SmtTerm::Int(Int::from_i64(ctx, *value))),

        Expr::Bool(value) => Ok(SmtTerm::Bool(Bool::from_bool(ctx, *value))),

        Expr::Select { array, index } => {
            let table = env.array(array)?;
            let index = eval_int(ctx, index, env)?;
            table
                .select(&index)
                .as_int()
                .map(SmtTerm::Int)
                .ok_or(VerificationError::IntegerExpected)
        }

        Expr::Hole { id } => {
            let id = id.ok_or(VerificationError::MissingHoleIdentity)?;
            Ok(SmtTerm::Int(hole_const(ctx, id)))
        }

        Expr::Not(inner) => Ok(SmtTerm::Bool(eval_bool(ctx, inner, env)?.not())),

        Expr::Binary { op, left, right } => match op {
            BinOp::And => {
                let l = eval_bool(ctx, left, env)?;
                let r = eval_bool(ctx, right, env)?;
                Ok(SmtTerm::Bool(Bool::and(ctx, &[&l, &r])))
            }
            BinOp::Or => {
                let l = eval_bool(ctx, left, env)?;
                let r = eval_bool(ctx, right, env)?;
                Ok(SmtTerm::Bool(Bool::or(ctx, &[&l, &r])))
            }
            _ => {
                let l = eval_int(ctx, left, env)?;
                let r = eval_int(ctx, right, env)?;
                Ok(match op {
                    BinOp::Add => SmtTerm::Int(l + r),
                    BinOp::Sub => SmtTerm::Int(l - r),
                    BinOp::Mul => SmtTerm::Int(l * r),
                    BinOp::Div => SmtTerm::Int(l.div(&r)),
                    BinOp::Mod => SmtTerm::Int(l.modulo(&r)),
                    BinOp::Eq => SmtTerm::Bool(l._eq(&r)),
                    BinOp::Ne => SmtTerm::Bool(l._eq(&r).not()),
                    BinOp::Lt => SmtTerm::Bool(l.lt(&r)),
                    BinOp::Le => SmtTerm::Bool(l.le(&r)),
                    BinOp::Gt => SmtTerm::Bool(l.gt(&r)),
                    BinOp::Ge => SmtTerm::Bool(l.ge(&r)),
                    BinOp::And | BinOp::Or => unreachable!("handled above"),
                })
            }
        },
    }
}

/// Evaluate an expression expected to be integer-sorted
pub fn eval_int<'ctx>(ctx: &'ctx Context, expr: &Expr, env: &SymEnv<'ctx>) -> VcResult<Int<'ctx>> {
    eval_expr(ctx, expr, env)?.into_int()
}

/// Evaluate an expression expected to be boolean-sorted
pub fn eval_bool<'ctx>(
    ctx: &'ctx Context,
    expr: &Expr,
    env: &SymEnv<'ctx>,
) -> VcResult<Bool<'ctx>> {
    eval_expr(ctx, expr, env)?.into_bool()
}

/// Lift a predicate AST into a closure over environments
pub fn predicate_of<'ctx>(ctx: &'ctx Context, expr: &'ctx Expr) -> Predicate<'ctx> {
    Rc::new(move |env| eval_bool(ctx, expr, env))
}
