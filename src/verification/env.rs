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

//! Symbolic environments
//!
//! An environment maps every program identifier to a Z3 term: scalars to
//! integer constants named after the variable, arrays to `Int -> Int`
//! constants. Environments are immutable; `bind` returns a new mapping
//! with one key replaced. The loop invariant travels in a dedicated field
//! so it can never collide with a program identifier.

use crate::ast::VariableUses;
use crate::error::VerificationError;
use std::collections::BTreeMap;
use std::rc::Rc;
use z3::ast::{Array, Bool, Dynamic, Int};
use z3::{Context, Sort};

/// Result type for verification-condition construction
pub type VcResult<T> = Result<T, VerificationError>;

/// A predicate over symbolic environments.
///
/// Pre/post-conditions and the loop invariant all live in this space, and
/// the wp transformer is an endomorphism on it.
pub type Predicate<'ctx> = Rc<dyn Fn(&SymEnv<'ctx>) -> VcResult<Bool<'ctx>> + 'ctx>;

/// A predicate that holds in every environment
pub fn trivial<'ctx>(ctx: &'ctx Context) -> Predicate<'ctx> {
    Rc::new(move |_| Ok(Bool::from_bool(ctx, true)))
}

/// The Z3 term bound to one program identifier
#[derive(Clone)]
pub enum Binding<'ctx> {
    Int(Int<'ctx>),
    Array(Array<'ctx>),
}

impl<'ctx> Binding<'ctx> {
    /// A fresh constant of the same sort under a new name
    pub fn fresh(&self, ctx: &'ctx Context, name: &str) -> Binding<'ctx> {
        match self {
            Binding::Int(_) => Binding::Int(Int::new_const(ctx, name)),
            Binding::Array(_) => Binding::Array(Array::new_const(
                ctx,
                name,
                &Sort::int(ctx),
                &Sort::int(ctx),
            )),
        }
    }

    pub fn to_dynamic(&self) -> Dynamic<'ctx> {
        match self {
            Binding::Int(term) => term.clone().into(),
            Binding::Array(term) => term.clone().into(),
        }
    }
}

/// Immutable mapping from program identifiers to Z3 terms
#[derive(Clone)]
pub struct SymEnv<'ctx> {
    ctx: &'ctx Context,
    vars: BTreeMap<String, Binding<'ctx>>,
    invariant: Predicate<'ctx>,
}

impl<'ctx> SymEnv<'ctx> {
    /// Build an environment binding every identifier in `uses`
    pub fn new(ctx: &'ctx Context, uses: &VariableUses, invariant: Predicate<'ctx>) -> Self {
        let mut vars = BTreeMap::new();
        for name in &uses.scalars {
            vars.insert(name.clone(), Binding::Int(Int::new_const(ctx, name.as_str())));
        }
        for name in &uses.arrays {
            vars.insert(
                name.clone(),
                Binding::Array(Array::new_const(
                    ctx,
                    name.as_str(),
                    &Sort::int(ctx),
                    &Sort::int(ctx),
                )),
            );
        }
        Self {
            ctx,
            vars,
            invariant,
        }
    }

    pub fn ctx(&self) -> &'ctx Context {
        self.ctx
    }

    /// The loop invariant predicate carried by this environment
    pub fn invariant(&self) -> Predicate<'ctx> {
        self.invariant.clone()
    }

    pub fn lookup(&self, name: &str) -> VcResult<&Binding<'ctx>> {
        self.vars
            .get(name)
            .ok_or_else(|| VerificationError::UnboundVariable {
                name: name.to_string(),
            })
    }

    /// Look up a scalar variable
    pub fn scalar(&self, name: &str) -> VcResult<Int<'ctx>> {
        match self.lookup(name)? {
            Binding::Int(term) => Ok(term.clone()),
            Binding::Array(_) => Err(VerificationError::ArrayAsScalar {
                name: name.to_string(),
            }),
        }
    }

    /// Look up an array variable
    pub fn array(&self, name: &str) -> VcResult<Array<'ctx>> {
        match self.lookup(name)? {
            Binding::Array(term) => Ok(term.clone()),
            Binding::Int(_) => Err(VerificationError::ScalarAsArray {
                name: name.to_string(),
            }),
        }
    }

    /// Functional update: a new environment with `name` rebound
    pub fn bind(&self, name: &str, binding: Binding<'ctx>) -> Self {
        let mut vars = self.vars.clone();
        vars.insert(name.to_string(), binding);
        Self {
            ctx: self.ctx,
            vars,
            invariant: self.invariant.clone(),
        }
    }

    /// Smallest `<base>_k` not yet bound in this environment.
    ///
    /// Callers that havoc a variable also bind the fresh name itself (see
    /// the loop rule), so a nested havoc of the same variable cannot pick
    /// the same symbol again.
    pub fn fresh_name(&self, base: &str) -> String {
        let mut k = 0;
        loop {
            let candidate = format!("{base}_{k}");
            if !self.vars.contains_key(&candidate) {
                return candidate;
            }
            k += 1;
        }
    }

    /// Iterate over all bindings in identifier order
    pub fn bindings(&self) -> impl Iterator<Item = (&String, &Binding<'ctx>)> {
        self.vars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z3::Config;

    fn test_uses() -> VariableUses {
        let mut uses = VariableUses::default();
        uses.scalars.insert("x".to_string());
        uses.arrays.insert("a".to_string());
        uses
    }

    #[test]
    fn test_env_binds_by_sort() {
        let config = Config::new();
        let ctx = Context::new(&config);
        let env = SymEnv::new(&ctx, &test_uses(), trivial(&ctx));
        assert!(env.scalar("x").is_ok());
        assert!(env.array("a").is_ok());
        assert!(matches!(
            env.scalar("a"),
            Err(VerificationError::ArrayAsScalar { .. })
        ));
        assert!(matches!(
            env.lookup("missing"),
            Err(VerificationError::UnboundVariable { .. })
        ));
    }

    #[test]
    fn test_bind_is_functional() {
        let config = Config::new();
        let ctx = Context::new(&config);
        let env = SymEnv::new(&ctx, &test_uses(), trivial(&ctx));
        let zero = Int::from_i64(&ctx, 0);
        let updated = env.bind("x", Binding::Int(zero.clone()));

        // The original environment still sees the symbolic constant
        assert_eq!(env.scalar("x").expect("lookup"), Int::new_const(&ctx, "x"));
        assert_eq!(updated.scalar("x").expect("lookup"), zero);
    }

    #[test]
    fn test_fresh_name_avoids_bound_names() {
        let config = Config::new();
        let ctx = Context::new(&config);
        let env = SymEnv::new(&ctx, &test_uses(), trivial(&ctx));
        assert_eq!(env.fresh_name("x"), "x_0");

        let fresh = env.lookup("x").expect("lookup").fresh(&ctx, "x_0");
        let extended = env.bind("x_0", fresh);
        assert_eq!(extended.fresh_name("x"), "x_1");
    }
}
