use conjecture_arrays::{
    assemble, ArrayShrinker, ConjectureRunner, Dtype, DtypeFilter, DtypeKind, GeneratedArray, ReferenceArray,
    ReferenceModule, RunResult, RunnerConfig, Scalar, ShapeBounds, ShrinkPhase, ShrinkReport, Strategy,
    XpStrategies,
};

type Array = GeneratedArray<ReferenceArray>;

fn ints(values: &[i128]) -> Vec<Scalar> {
    values.iter().map(|&v| Scalar::Int(v)).collect()
}

fn any_at_least_100(array: &Array) -> bool {
    array.values.iter().any(|v| v.as_int().map_or(false, |v| v >= 100))
}

#[test]
fn test_failing_vector_shrinks_to_one_element_at_the_boundary() {
    let module = ReferenceModule::named("shrinking-test-vector");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp
        .arrays(Dtype::INT32, ShapeBounds::new().dims(1, 1).sides(1, 5))
        .build()
        .unwrap();
    let initial = assemble(&module, &[3], Dtype::INT32, ints(&[5, 7, 12345])).unwrap();

    let (minimal, report) = strategy.minimize(initial, &mut any_at_least_100, 10_000);
    assert_eq!(minimal.shape, vec![1]);
    assert_eq!(minimal.dtype, Dtype::INT32);
    assert_eq!(minimal.values, ints(&[100]));
    assert_eq!(minimal.array.to_vec().unwrap(), ints(&[100]));
    assert!(report.converged());
    assert_eq!(report.steps()[0].phase, ShrinkPhase::Shape);
    assert_eq!(report.steps().last().map(|s| s.phase), Some(ShrinkPhase::Elements));
}

#[test]
fn test_element_counts_never_grow() {
    let xp = XpStrategies::new(ReferenceModule::named("shrinking-test-monotone"));
    let strategy = xp
        .arrays(DtypeFilter::kind(DtypeKind::Int), ShapeBounds::new().dims(1, 3).sides(1, 6))
        .build()
        .unwrap();
    let mut checked = 0;
    for array in strategy.samples(11).take(200) {
        let array = array.unwrap();
        if !any_at_least_100(&array) {
            continue;
        }
        checked += 1;
        let original_ndim = array.ndim();
        let original_size = array.size();
        let (minimal, report) = strategy.minimize(array, &mut any_at_least_100, 10_000);
        assert!(any_at_least_100(&minimal));
        assert!(minimal.ndim() <= original_ndim);
        assert!(minimal.size() <= original_size);
        let counts: Vec<usize> = report.steps().iter().filter_map(|s| s.element_count).collect();
        assert_eq!(counts.len(), report.accepted());
        assert!(counts.windows(2).all(|w| w[1] <= w[0]), "{:?}", counts);
        assert_eq!(minimal.size(), 1);
        assert_eq!(minimal.values, ints(&[100]));
    }
    assert!(checked > 0);
}

/// Whether each axis of `shrunk` lines up, in order, with an axis of
/// `original` at least as long.
fn fits_within(shrunk: &[usize], original: &[usize]) -> bool {
    let mut remaining = original.iter();
    shrunk.iter().all(|side| remaining.any(|o| side <= o))
}

/// Orders arrays by how far they are from fully shrunk.
fn complexity(array: &Array) -> (usize, usize, u32, DtypeKind, i128, usize) {
    let magnitude = array.values.iter().filter_map(|v| v.as_int()).map(i128::abs).sum();
    let negatives = array.values.iter().filter(|v| v.as_int().map_or(false, |v| v < 0)).count();
    (array.size(), array.ndim(), array.dtype.bits(), array.dtype.kind(), magnitude, negatives)
}

#[test]
fn test_every_accepted_step_is_strictly_simpler() {
    let xp = XpStrategies::new(ReferenceModule::named("shrinking-test-steps"));
    let strategy = xp
        .arrays(DtypeFilter::kind(DtypeKind::Int), ShapeBounds::new().dims(1, 3).sides(1, 6))
        .build()
        .unwrap();
    let mut checked = 0;
    for array in strategy.samples(23).take(200) {
        let array = array.unwrap();
        if !any_at_least_100(&array) {
            continue;
        }
        checked += 1;
        let mut accepted = vec![array.clone()];
        let mut still_fails = |candidate: &Array| {
            let fails = any_at_least_100(candidate);
            if fails {
                accepted.push(candidate.clone());
            }
            fails
        };
        let (minimal, report) = strategy.minimize(array.clone(), &mut still_fails, 10_000);
        assert_eq!(accepted.len(), report.accepted() + 1);
        assert_eq!(accepted.last().map(|a| &a.values), Some(&minimal.values));
        for pair in accepted.windows(2) {
            let (before, after) = (&pair[0], &pair[1]);
            assert!(
                complexity(after) < complexity(before),
                "{:?} {:?} -> {:?} {:?}",
                before.shape,
                before.values,
                after.shape,
                after.values
            );
            assert!(fits_within(&after.shape, &before.shape), "{:?} -> {:?}", before.shape, after.shape);
        }
        assert!(fits_within(&minimal.shape, &array.shape));
    }
    assert!(checked > 0);
}

#[test]
fn test_dropping_a_trailing_axis_keeps_the_leading_one() {
    let module = ReferenceModule::named("shrinking-test-trailing-axis");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp
        .arrays(Dtype::INT32, ShapeBounds::new().dims(1, 2).sides(1, 5))
        .build()
        .unwrap();
    let mut values = vec![0; 10];
    values[8] = 500;
    let initial = assemble(&module, &[5, 2], Dtype::INT32, ints(&values)).unwrap();
    let mut has_five_rows = |array: &Array| array.shape.first() == Some(&5) && any_at_least_100(array);

    let (minimal, _) = strategy.minimize(initial, &mut has_five_rows, 10_000);
    assert_eq!(minimal.shape, vec![5]);
    assert_eq!(minimal.values, ints(&[0, 0, 0, 0, 100]));
    assert!(fits_within(&minimal.shape, &[5, 2]));
}

#[test]
fn test_first_shrink_of_a_large_array() {
    let module = ReferenceModule::named("shrinking-test-large");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp
        .arrays(Dtype::INT8, ShapeBounds::new().dims(1, 2).sides(1, 150))
        .build()
        .unwrap();
    let values: Vec<i128> = (0..150 * 150).map(|i| i % 100).collect();
    let initial = assemble(&module, &[150, 150], Dtype::INT8, ints(&values)).unwrap();

    let first = strategy.shrink(&initial).next().unwrap();
    assert_eq!(first.shape, vec![150]);
    assert_eq!(first.values, ints(&values[..150]));
}

#[test]
fn test_variable_dtypes_shrink_to_the_narrowest_that_holds_the_values() {
    let module = ReferenceModule::named("shrinking-test-dtype");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp.arrays(DtypeFilter::kind(DtypeKind::Int), 2usize).build().unwrap();
    assert!(strategy.dtype_is_variable());
    let initial = assemble(&module, &[2], Dtype::INT64, ints(&[3, 200])).unwrap();

    let (minimal, report) = strategy.minimize(initial, &mut any_at_least_100, 10_000);
    assert_eq!(minimal.dtype, Dtype::INT8);
    assert_eq!(minimal.array.dtype(), Dtype::INT8);
    assert_eq!(minimal.values, ints(&[0, 100]));
    assert!(report.steps().iter().any(|s| s.phase == ShrinkPhase::Dtype));
    assert!(report.converged());
}

#[test]
fn test_fixed_dtype_skips_the_dtype_phase() {
    let module = ReferenceModule::named("shrinking-test-fixed-dtype");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp.arrays(Dtype::INT64, 2usize).build().unwrap();
    let initial = assemble(&module, &[2], Dtype::INT64, ints(&[3, 200])).unwrap();

    let (minimal, report) = strategy.minimize(initial, &mut any_at_least_100, 10_000);
    assert_eq!(minimal.dtype, Dtype::INT64);
    assert_eq!(minimal.values, ints(&[0, 100]));
    assert!(report.steps().iter().all(|s| s.phase != ShrinkPhase::Dtype));
}

#[test]
fn test_spent_budget_reports_the_running_phase() {
    let module = ReferenceModule::named("shrinking-test-budget");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp
        .arrays(Dtype::INT32, ShapeBounds::new().dims(1, 1).sides(1, 5))
        .build()
        .unwrap();
    let initial = assemble(&module, &[3], Dtype::INT32, ints(&[5, 7, 12345])).unwrap();

    let mut calls = 0;
    let mut still_fails = |array: &Array| {
        calls += 1;
        any_at_least_100(array)
    };
    let shrinker = ArrayShrinker::new(&strategy, initial, &mut still_fails, 2);
    assert_eq!(shrinker.current().shape, vec![3]);
    let (current, report) = shrinker.shrink();
    assert_eq!(calls, 2);
    assert_eq!(report.calls(), 2);
    assert!(!report.converged());
    assert_eq!(report.final_phase(), ShrinkPhase::Shape);
    assert_eq!(current.values, ints(&[5, 7, 12345]));
}

#[test]
fn test_report_serialises() {
    let module = ReferenceModule::named("shrinking-test-report");
    let xp = XpStrategies::new(module.clone());
    let strategy = xp.arrays(Dtype::INT16, 3usize).build().unwrap();
    let initial = assemble(&module, &[3], Dtype::INT16, ints(&[150, -4, 9])).unwrap();
    let (_, report) = strategy.minimize(initial, &mut any_at_least_100, 10_000);

    let json = serde_json::to_string(&report).unwrap();
    let back: ShrinkReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    assert!(back.accepted() > 0);
}

#[test]
fn test_runner_finds_and_shrinks_a_failure() {
    let xp = XpStrategies::new(ReferenceModule::named("shrinking-test-runner"));
    let strategy = xp
        .arrays(Dtype::INT32, ShapeBounds::new().dims(1, 1).sides(1, 5))
        .build()
        .unwrap();
    let mut runner = ConjectureRunner::new(RunnerConfig {
        seed: 7,
        ..RunnerConfig::default()
    });
    let result = runner
        .run(&strategy, |array: &Array| array.values.iter().all(|v| v.as_int().unwrap() < 100))
        .unwrap();
    match result {
        RunResult::Failed {
            seed,
            original,
            minimal,
            report,
        } => {
            assert_eq!(minimal.shape, vec![1]);
            assert_eq!(minimal.values, ints(&[100]));
            assert!(minimal.ndim() <= original.ndim());
            assert!(report.converged());
            let replayed = strategy.example_with_seed(seed).unwrap();
            assert_eq!(replayed.values, original.values);
            assert_eq!(runner.stats.shrink_calls, report.calls());
        }
        RunResult::Passed { .. } => panic!("expected a failing example"),
    }
}

#[test]
fn test_runner_passes_a_true_property() {
    let xp = XpStrategies::new(ReferenceModule::named("shrinking-test-passing"));
    let strategy = xp.arrays(Dtype::BOOL, ShapeBounds::new()).build().unwrap();
    let mut runner = ConjectureRunner::new(RunnerConfig {
        max_examples: 50,
        ..RunnerConfig::default()
    });
    let result = runner
        .run(&strategy, |array: &Array| array.values.iter().all(|v| v.as_bool().is_some()))
        .unwrap();
    assert!(result.is_passed());
    assert!(result.minimal().is_none());
    assert_eq!(runner.stats.examples_generated, 50);
}
