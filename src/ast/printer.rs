//! Render an AST back to concrete surface syntax
//!
//! Every binary operator is parenthesized so the output reparses without
//! ambiguity. Nested blocks are indented by four spaces per depth and
//! sequencing prints as `;` followed by a newline. Holes render as their
//! model value (`0` when the solver left them unconstrained), or as `??`
//! when no model is supplied.

use crate::ast::{Cmd, Expr};
use crate::verification::solver::HoleModel;

const INDENT: &str = "    ";

/// Pretty-print a program, substituting hole values from `model`
pub fn pretty(cmd: &Cmd, model: Option<&HoleModel>) -> String {
    let mut out = String::new();
    write_cmd(cmd, model, 0, &mut out);
    out
}

/// Pretty-print a single expression
pub fn pretty_expr(expr: &Expr, model: Option<&HoleModel>) -> String {
    let mut out = String::new();
    write_expr(expr, model, &mut out);
    out
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_cmd(cmd: &Cmd, model: Option<&HoleModel>, depth: usize, out: &mut String) {
    match cmd {
        Cmd::Skip => out.push_str("skip"),
        Cmd::Assign { name, value } => {
            out.push_str(name);
            out.push_str(" := ");
            write_expr(value, model, out);
        }
        Cmd::Store {
            array,
            index,
            value,
        } => {
            out.push_str(array);
            out.push('[');
            write_expr(index, model, out);
            out.push_str("] := ");
            write_expr(value, model, out);
        }
        Cmd::Seq(c1, c2) => {
            write_cmd(c1, model, depth, out);
            out.push_str(";\n");
            push_indent(depth, out);
            write_cmd(c2, model, depth, out);
        }
        Cmd::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str("if ");
            write_expr(cond, model, out);
            out.push_str(" then ");
            write_block(then_branch, model, depth, out);
            out.push_str(" else ");
            write_block(else_branch, model, depth, out);
        }
        Cmd::While { cond, body } => {
            out.push_str("while ");
            write_expr(cond, model, out);
            out.push_str(" do ");
            write_block(body, model, depth, out);
        }
        Cmd::Assert(cond) => {
            out.push_str("assert ");
            write_expr(cond, model, out);
        }
    }
}

fn write_block(cmd: &Cmd, model: Option<&HoleModel>, depth: usize, out: &mut String) {
    out.push_str("(\n");
    push_indent(depth + 1, out);
    write_cmd(cmd, model, depth + 1, out);
    out.push('\n');
    push_indent(depth, out);
    out.push(')');
}

fn write_expr(expr: &Expr, model: Option<&HoleModel>, out: &mut String) {
    match expr {
        Expr::Var(name) => out.push_str(name),
        Expr::Num(value) => out.push_str(&value.to_string()),
        Expr::Bool(true) => out.push_str("true"),
        Expr::Bool(false) => out.push_str("false"),
        Expr::Select { array, index } => {
            out.push_str(array);
            out.push('[');
            write_expr(index, model, out);
            out.push(']');
        }
        Expr::Hole { id } => match model {
            Some(m) => {
                let value = id.and_then(|i| m.value(i)).unwrap_or(0);
                out.push_str(&value.to_string());
            }
            None => out.push_str("??"),
        },
        // Parenthesized so a `not` operand cannot absorb a sibling of an
        // enclosing binary operator when reparsed
        Expr::Not(inner) => {
            out.push_str("(not ");
            write_expr(inner, model, out);
            out.push(')');
        }
        Expr::Binary { op, left, right } => {
            out.push('(');
            write_expr(left, model, out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(right, model, out);
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOp;

    #[test]
    fn test_pretty_assignment() {
        let cmd = Cmd::Assign {
            name: "x".to_string(),
            value: Expr::Binary {
                op: BinOp::Add,
                left: Box::new(Expr::Var("y".to_string())),
                right: Box::new(Expr::Num(1)),
            },
        };
        assert_eq!(pretty(&cmd, None), "x := (y + 1)");
    }

    #[test]
    fn test_pretty_hole_without_model() {
        let cmd = Cmd::Assign {
            name: "x".to_string(),
            value: Expr::Hole { id: Some(0) },
        };
        assert_eq!(pretty(&cmd, None), "x := ??");
    }

    #[test]
    fn test_pretty_hole_with_model() {
        let mut model = HoleModel::default();
        model.insert(0, 7);
        let cmd = Cmd::Seq(
            Box::new(Cmd::Assign {
                name: "x".to_string(),
                value: Expr::Hole { id: Some(0) },
            }),
            Box::new(Cmd::Assign {
                name: "y".to_string(),
                value: Expr::Hole { id: Some(1) },
            }),
        );
        // Hole 1 is absent from the model and prints as 0
        assert_eq!(pretty(&cmd, Some(&model)), "x := 7;\ny := 0");
    }

    #[test]
    fn test_pretty_while_indents_blocks() {
        let cmd = Cmd::While {
            cond: Expr::Binary {
                op: BinOp::Lt,
                left: Box::new(Expr::Var("i".to_string())),
                right: Box::new(Expr::Var("n".to_string())),
            },
            body: Box::new(Cmd::Assign {
                name: "i".to_string(),
                value: Expr::Binary {
                    op: BinOp::Add,
                    left: Box::new(Expr::Var("i".to_string())),
                    right: Box::new(Expr::Num(1)),
                },
            }),
        };
        assert_eq!(
            pretty(&cmd, None),
            "while (i < n) do (\n    i := (i + 1)\n)"
        );
    }
}
