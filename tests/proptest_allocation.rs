//! Property-based tests for the alt-stack variable allocator.
//!
//! Programs are generated as source text, compiled, run on the reference
//! evaluator and compared against a plain model of the variables.

mod common;

use common::{CompilerOptions, alt_after, compile, nums};
use proptest::prelude::*;

const NAMES: [&str; 5] = ["a", "b", "c", "d", "e"];

#[derive(Debug, Clone)]
enum Step {
    /// `v = n;`
    Store(usize, i64),
    /// `v = w;`
    Copy(usize, usize),
    /// `v = w + n;`
    AddTo(usize, usize, i64),
}

fn arb_value() -> impl Strategy<Value = i64> {
    -1000i64..1000i64
}

fn arb_step(vars: usize) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..vars, arb_value()).prop_map(|(v, n)| Step::Store(v, n)),
        (0..vars, 0..vars).prop_map(|(v, w)| Step::Copy(v, w)),
        (0..vars, 0..vars, arb_value()).prop_map(|(v, w, n)| Step::AddTo(v, w, n)),
    ]
}

/// Initial values for 3..=5 variables followed by a run of steps.
fn arb_program() -> impl Strategy<Value = (Vec<i64>, Vec<Step>)> {
    (3usize..=5).prop_flat_map(|vars| {
        (
            prop::collection::vec(arb_value(), vars),
            prop::collection::vec(arb_step(vars), 0..20),
        )
    })
}

/// Source text plus the values the model expects at the end.
fn render(initial: &[i64], steps: &[Step]) -> (String, Vec<i64>) {
    let mut source = String::new();
    let mut model = initial.to_vec();
    for (v, n) in initial.iter().enumerate() {
        source.push_str(&format!("{} = {};\n", NAMES[v], n));
    }
    for step in steps {
        match *step {
            Step::Store(v, n) => {
                source.push_str(&format!("{} = {};\n", NAMES[v], n));
                model[v] = n;
            }
            Step::Copy(v, w) => {
                source.push_str(&format!("{} = {};\n", NAMES[v], NAMES[w]));
                model[v] = model[w];
            }
            Step::AddTo(v, w, n) => {
                source.push_str(&format!("{} = {} + {};\n", NAMES[v], NAMES[w], n));
                model[v] = model[w] + n;
            }
        }
    }
    (source, model)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every read sees the last value written, and the alt-stack ends up
    /// holding one value per variable in declaration order.
    #[test]
    fn reads_return_last_write((initial, steps) in arb_program()) {
        let (source, model) = render(&initial, &steps);
        let alt = alt_after(&source, CompilerOptions::empty());
        prop_assert_eq!(alt, Ok(nums(&model)), "program:\n{}", source);
    }

    /// The optimizer changes instruction counts, never results.
    #[test]
    fn optimizer_preserves_results((initial, steps) in arb_program()) {
        let (source, _) = render(&initial, &steps);
        let plain = alt_after(&source, CompilerOptions::empty());
        let optimized = alt_after(&source, CompilerOptions::OPTIMIZER_ENABLED);
        prop_assert_eq!(&plain, &optimized, "program:\n{}", source);

        let shorter = compile(&source, CompilerOptions::OPTIMIZER_ENABLED).len();
        let longer = compile(&source, CompilerOptions::empty()).len();
        prop_assert!(shorter <= longer);
        prop_assert_eq!((longer - shorter) % 2, 0);
    }

    /// Both paths of a conditional leave the same variables behind.
    #[test]
    fn branches_agree_on_layout(
        cond in 0i64..2,
        then_value in arb_value(),
        else_value in arb_value(),
    ) {
        let source = format!(
            "c = {};\nif (c == 1) {{ a = {}; }} else {{ b = {}; }}\nd = a + b;",
            cond, then_value, else_value
        );
        let expected = if cond == 1 {
            vec![cond, then_value, 0, then_value]
        } else {
            vec![cond, 0, else_value, else_value]
        };
        let alt = alt_after(&source, CompilerOptions::OPTIMIZER_ENABLED);
        prop_assert_eq!(alt, Ok(nums(&expected)), "program:\n{}", source);
    }
}

#[test]
fn test_loop_unrolling_order() {
    let alt = alt_after("x = 0;\nfor i in [1..3] { x = x * 10 + i; }", CompilerOptions::empty());
    assert_eq!(alt, Ok(nums(&[123, 3])));
    let alt = alt_after("x = 0;\nfor i in [3..1] { x = x * 10 + i; }", CompilerOptions::empty());
    assert_eq!(alt, Ok(nums(&[321, 1])));
}
