//! ConjectureRunner - draws examples from a strategy, checks a property
//! against each, and shrinks the first failure it finds.

use crate::error::Result;
use crate::shrinking::ShrinkReport;
use crate::strategy::{example_seed, Strategy};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Configuration for the ConjectureRunner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of examples to generate
    pub max_examples: usize,

    /// Maximum number of property calls made while shrinking
    pub max_shrinks: usize,

    /// Random seed for deterministic execution
    pub seed: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_examples: 100,
            max_shrinks: 10_000,
            seed: 0,
        }
    }
}

/// Statistics about test execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerStats {
    /// Total examples generated
    pub examples_generated: usize,

    /// Property calls made while shrinking
    pub shrink_calls: usize,
}

#[derive(Debug, Clone)]
pub enum RunResult<T> {
    /// No example failed the property.
    Passed { examples: usize },
    /// `original` failed; `minimal` is the smallest failing value shrinking
    /// found from it.
    Failed {
        seed: u64,
        original: T,
        minimal: T,
        report: ShrinkReport,
    },
}

impl<T> RunResult<T> {
    pub fn is_passed(&self) -> bool {
        matches!(self, RunResult::Passed { .. })
    }

    pub fn minimal(&self) -> Option<&T> {
        match self {
            RunResult::Failed { minimal, .. } => Some(minimal),
            RunResult::Passed { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct ConjectureRunner {
    /// Configuration for this runner
    pub config: RunnerConfig,

    /// Statistics about execution
    pub stats: RunnerStats,
}

/// Runs `property`, counting a panic as a failure.
fn holds<T, F: Fn(&T) -> bool>(property: &F, value: &T) -> bool {
    catch_unwind(AssertUnwindSafe(|| property(value))).unwrap_or(false)
}

impl ConjectureRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            stats: RunnerStats::default(),
        }
    }

    /// Checks `property` against up to `max_examples` draws from `strategy`.
    ///
    /// Example `i` is drawn from `example_seed(config.seed, i)`, and that
    /// seed is reported on failure so the example can be replayed with
    /// `Strategy::example_with_seed`. Errors are configuration or module
    /// contract errors raised while drawing.
    pub fn run<S, F>(&mut self, strategy: &S, property: F) -> Result<RunResult<S::Value>>
    where
        S: Strategy,
        F: Fn(&S::Value) -> bool,
    {
        log::debug!("Starting test run with config: {:?}", self.config);

        for index in 0..self.config.max_examples {
            let seed = example_seed(self.config.seed, index as u64);
            let value = strategy.example_with_seed(seed)?;
            self.stats.examples_generated += 1;
            if holds(&property, &value) {
                continue;
            }

            log::debug!("Example {} (seed {}) failed, shrinking", index, seed);
            let mut still_fails = |candidate: &S::Value| !holds(&property, candidate);
            let (minimal, report) = strategy.minimize(value.clone(), &mut still_fails, self.config.max_shrinks);
            self.stats.shrink_calls += report.calls();
            log::info!(
                "Found failing example after {} examples; shrunk in {} steps using {} calls",
                self.stats.examples_generated,
                report.accepted(),
                report.calls()
            );
            return Ok(RunResult::Failed {
                seed,
                original: value,
                minimal,
                report,
            });
        }

        log::info!("All {} examples passed", self.stats.examples_generated);
        Ok(RunResult::Passed {
            examples: self.stats.examples_generated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SampledFrom;

    #[test]
    fn test_runner_creation() {
        let config = RunnerConfig::default();
        let runner = ConjectureRunner::new(config.clone());

        assert_eq!(runner.config.max_examples, 100);
        assert_eq!(runner.config.max_shrinks, 10_000);
        assert_eq!(runner.stats, RunnerStats::default());
    }

    #[test]
    fn test_passing_property() {
        let mut runner = ConjectureRunner::new(RunnerConfig::default());
        let strategy = SampledFrom::new((0..10).collect::<Vec<i32>>()).unwrap();

        let result = runner.run(&strategy, |x| *x < 10).unwrap();
        match result {
            RunResult::Passed { examples } => assert_eq!(examples, 100),
            RunResult::Failed { .. } => panic!("Expected test to pass"),
        }
        assert_eq!(runner.stats.examples_generated, 100);
    }

    #[test]
    fn test_failing_property_is_shrunk_and_replayable() {
        let mut runner = ConjectureRunner::new(RunnerConfig {
            seed: 17,
            ..RunnerConfig::default()
        });
        let strategy = SampledFrom::new((0..50).collect::<Vec<i32>>()).unwrap();

        match runner.run(&strategy, |x| *x < 20).unwrap() {
            RunResult::Failed {
                seed,
                original,
                minimal,
                report,
            } => {
                assert_eq!(minimal, 20);
                assert!(original >= 20);
                assert_eq!(strategy.example_with_seed(seed).unwrap(), original);
                assert!(report.converged());
            }
            RunResult::Passed { .. } => panic!("Expected test to fail"),
        }
    }

    #[test]
    fn test_panics_count_as_failures() {
        let mut runner = ConjectureRunner::new(RunnerConfig::default());
        let strategy = SampledFrom::new(vec![1, 2, 3]).unwrap();

        let result = runner
            .run(&strategy, |x| {
                assert!(*x != 3, "three is not allowed");
                true
            })
            .unwrap();
        assert!(!result.is_passed());
        assert_eq!(result.minimal(), Some(&3));
    }
}
