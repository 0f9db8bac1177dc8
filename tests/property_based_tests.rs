use proptest::prelude::*;
use std::collections::BTreeSet;
use whilesynth::ast::printer::pretty;
use whilesynth::ast::{BinOp, Cmd, Expr};
use whilesynth::lexer::Lexer;
use whilesynth::parser::parse;
use whilesynth::verification::unfold::unfold;

/// Scalar names, kept disjoint from the one array name used below
fn arb_scalar() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["x", "y", "z", "count"]).prop_map(str::to_string)
}

fn arb_arith_op() -> impl Strategy<Value = BinOp> {
    prop::sample::select(vec![
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::Mod,
    ])
}

fn arb_compare_op() -> impl Strategy<Value = BinOp> {
    prop::sample::select(vec![
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Lt,
        BinOp::Le,
        BinOp::Gt,
        BinOp::Ge,
    ])
}

/// Integer-valued expressions, optionally containing holes
fn arb_int_expr(with_holes: bool) -> impl Strategy<Value = Expr> {
    let leaf = if with_holes {
        prop_oneof![
            (-50i64..50).prop_map(Expr::Num),
            arb_scalar().prop_map(Expr::Var),
            Just(Expr::Hole { id: None }),
        ]
        .boxed()
    } else {
        prop_oneof![
            (-50i64..50).prop_map(Expr::Num),
            arb_scalar().prop_map(Expr::Var),
        ]
        .boxed()
    };
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            (arb_arith_op(), inner.clone(), inner.clone()).prop_map(|(op, l, r)| Expr::Binary {
                op,
                left: Box::new(l),
                right: Box::new(r),
            }),
            inner.prop_map(|index| Expr::Select {
                array: "table".to_string(),
                index: Box::new(index),
            }),
        ]
    })
}

/// Boolean-valued expressions over integer comparisons
fn arb_bool_expr(with_holes: bool) -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Expr::Bool),
        (
            arb_compare_op(),
            arb_int_expr(with_holes),
            arb_int_expr(with_holes)
        )
            .prop_map(|(op, l, r)| Expr::Binary {
                op,
                left: Box::new(l),
                right: Box::new(r),
            }),
    ];
    leaf.prop_recursive(2, 16, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Not(Box::new(e))),
            (
                prop::sample::select(vec![BinOp::And, BinOp::Or]),
                inner.clone(),
                inner
            )
                .prop_map(|(op, l, r)| Expr::Binary {
                    op,
                    left: Box::new(l),
                    right: Box::new(r),
                }),
        ]
    })
}

/// Arbitrary commands
fn arb_cmd(with_holes: bool) -> impl Strategy<Value = Cmd> {
    let leaf = prop_oneof![
        Just(Cmd::Skip),
        (arb_scalar(), arb_int_expr(with_holes))
            .prop_map(|(name, value)| Cmd::Assign { name, value }),
        (arb_int_expr(with_holes), arb_int_expr(with_holes)).prop_map(|(index, value)| {
            Cmd::Store {
                array: "table".to_string(),
                index,
                value,
            }
        }),
        arb_bool_expr(with_holes).prop_map(Cmd::Assert),
    ];
    leaf.prop_recursive(3, 24, 2, move |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(c1, c2)| Cmd::Seq(Box::new(c1), Box::new(c2))),
            (arb_bool_expr(with_holes), inner.clone(), inner.clone()).prop_map(
                |(cond, t, e)| Cmd::If {
                    cond,
                    then_branch: Box::new(t),
                    else_branch: Box::new(e),
                }
            ),
            (arb_bool_expr(with_holes), inner).prop_map(|(cond, body)| Cmd::While {
                cond,
                body: Box::new(body),
            }),
        ]
    })
}

proptest! {
    /// Unfolding at any depth preserves the set of hole identities
    #[test]
    fn prop_unfold_preserves_hole_identities(mut cmd in arb_cmd(true), depth in 0usize..5) {
        cmd.assign_hole_ids();
        let before: BTreeSet<_> = cmd.hole_ids().into_iter().collect();
        let after: BTreeSet<_> = unfold(&cmd, depth).hole_ids().into_iter().collect();
        prop_assert_eq!(before, after);
    }

    /// Depth-zero unfolding turns a loop into exactly the negated guard
    #[test]
    fn prop_unfold_zero_is_guard_negation(cond in arb_bool_expr(false), body in arb_cmd(false)) {
        let cmd = Cmd::While { cond: cond.clone(), body: Box::new(body) };
        let unfolded = unfold(&cmd, 0);
        prop_assert_eq!(unfolded, Cmd::Assert(Expr::Not(Box::new(cond))));
    }

    /// Unfolded programs contain no loops
    #[test]
    fn prop_unfold_eliminates_loops(cmd in arb_cmd(false), depth in 0usize..4) {
        prop_assert!(!unfold(&cmd, depth).has_loops());
    }

    /// Pretty-printed programs reparse, and printing is idempotent: the
    /// reparsed tree may re-associate sequencing but renders identically
    #[test]
    fn prop_pretty_print_roundtrip(cmd in arb_cmd(false)) {
        let printed = pretty(&cmd, None);
        let reparsed = parse(&printed)
            .unwrap_or_else(|e| panic!("pretty output failed to reparse: {e}\n{printed}"));
        prop_assert_eq!(pretty(&reparsed, None), printed);
    }

    /// Round-tripping preserves the number of holes
    #[test]
    fn prop_roundtrip_preserves_hole_count(cmd in arb_cmd(true)) {
        let printed = pretty(&cmd, None);
        let reparsed = parse(&printed)
            .unwrap_or_else(|e| panic!("pretty output failed to reparse: {e}\n{printed}"));
        prop_assert_eq!(reparsed.hole_count(), cmd.hole_count());
    }

    /// The lexer rejects garbage with an error, never a panic
    #[test]
    fn prop_lexer_never_panics(input in ".{0,200}") {
        let _ = Lexer::new(&input, "fuzz.while".to_string()).tokenize();
    }

    /// The parser rejects garbage with an error, never a panic
    #[test]
    fn prop_parser_never_panics(input in ".{0,200}") {
        let _ = parse(&input);
    }
}
