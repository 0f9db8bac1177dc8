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

//! WhileSynth library
//!
//! A verifier and sketch-based synthesizer for a small While language
//! with integer arrays, assertions, and `??` holes. Programs are parsed
//! from surface syntax, specifications are Hoare triples over predicate
//! expressions, and queries are discharged with Z3 through a
//! weakest-precondition encoding.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod verification;

use crate::ast::printer::pretty;
use crate::ast::{Cmd, Expr};
use crate::error::ToolError;
use crate::verification::solver::HoleModel;
use crate::verification::{Example, VerificationEngine, DEFAULT_MAX_UNFOLD_DEPTH};
use std::path::Path;

/// A completed sketch: the chosen hole values and the resulting program
#[derive(Debug, Clone)]
pub struct SynthesizedProgram {
    /// Hole values chosen by the solver
    pub model: HoleModel,

    /// Pretty-printed program with hole values substituted
    pub source: String,

    /// Whether the reparsed program re-verified against every example
    pub verified: bool,
}

/// The main toolchain interface: parse, synthesize, verify
pub struct Synthesizer {
    max_unfold_depth: usize,
    solver_timeout_ms: Option<u64>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self {
            max_unfold_depth: DEFAULT_MAX_UNFOLD_DEPTH,
            solver_timeout_ms: None,
        }
    }

    /// Cap the unfolding retry ladder (0 disables unfolding retries)
    pub fn max_unfold_depth(mut self, depth: usize) -> Self {
        self.max_unfold_depth = depth;
        self
    }

    /// Give each solver query a wall-clock budget
    pub fn solver_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.solver_timeout_ms = Some(timeout_ms);
        self
    }

    fn engine(&self) -> VerificationEngine {
        let engine = VerificationEngine::new().with_max_unfold_depth(self.max_unfold_depth);
        match self.solver_timeout_ms {
            Some(timeout_ms) => engine.with_solver_timeout_ms(timeout_ms),
            None => engine,
        }
    }

    /// Verify the triple `{pre} program {post}` under an optional loop
    /// invariant (`None` means `true`)
    pub fn verify_source(
        &self,
        program: &str,
        pre: &str,
        post: &str,
        invariant: Option<&str>,
    ) -> Result<bool, ToolError> {
        let program = parser::parse(program)?;
        let pre = parser::parse_predicate(pre)?;
        let post = parser::parse_predicate(post)?;
        let invariant = parse_invariant(invariant)?;
        Ok(self.engine().verify(&pre, &program, &post, &invariant)?)
    }

    /// Verify a program read from a file
    pub fn verify_file(
        &self,
        path: &Path,
        pre: &str,
        post: &str,
        invariant: Option<&str>,
    ) -> Result<bool, ToolError> {
        let source = std::fs::read_to_string(path)?;
        self.verify_source(&source, pre, post, invariant)
    }

    /// Synthesize hole values for a sketch against example pairs, then
    /// re-verify the completed program.
    ///
    /// `examples` are `(pre, post)` predicate pairs; an empty list means
    /// the single trivial pair, which still forces every assertion in the
    /// sketch. Returns `None` when no assignment exists within the
    /// unfolding budget.
    pub fn synthesize_source(
        &self,
        program: &str,
        invariant: Option<&str>,
        examples: &[(String, String)],
    ) -> Result<Option<SynthesizedProgram>, ToolError> {
        let mut sketch = parser::parse(program)?;
        let invariant = parse_invariant(invariant)?;
        let examples = parse_examples(examples)?;

        let engine = self.engine();
        let model = match engine.synthesize(&mut sketch, &invariant, &examples)? {
            Some(model) => model,
            None => return Ok(None),
        };

        let source = pretty(&sketch, Some(&model));
        let verified = self.reverify(&source, &invariant, &examples)?;
        Ok(Some(SynthesizedProgram {
            model,
            source,
            verified,
        }))
    }

    /// Synthesize from a sketch read from a file
    pub fn synthesize_file(
        &self,
        path: &Path,
        invariant: Option<&str>,
        examples: &[(String, String)],
    ) -> Result<Option<SynthesizedProgram>, ToolError> {
        let source = std::fs::read_to_string(path)?;
        self.synthesize_source(&source, invariant, examples)
    }

    /// Reparse a completed program and check every example triple on it
    fn reverify(
        &self,
        source: &str,
        invariant: &Expr,
        examples: &[Example],
    ) -> Result<bool, ToolError> {
        let program: Cmd = parser::parse(source)?;
        let engine = self.engine();
        let trivial = [Example::trivial()];
        let examples = if examples.is_empty() {
            &trivial[..]
        } else {
            examples
        };
        for example in examples {
            if !engine.verify(&example.pre, &program, &example.post, invariant)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_invariant(invariant: Option<&str>) -> Result<Expr, ToolError> {
    match invariant {
        Some(text) => Ok(parser::parse_predicate(text)?),
        None => Ok(Expr::Bool(true)),
    }
}

fn parse_examples(examples: &[(String, String)]) -> Result<Vec<Example>, ToolError> {
    examples
        .iter()
        .map(|(pre, post)| {
            Ok(Example::new(
                parser::parse_predicate(pre)?,
                parser::parse_predicate(post)?,
            ))
        })
        .collect()
}
