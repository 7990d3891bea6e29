//! Shrinking of failing values.
//!
//! Two searches live here. `greedy_minimize` is the generic shrink-tree walk
//! used by every strategy: try the candidates `Strategy::shrink` proposes, in
//! order, and restart from the first one that still fails.
//!
//! `ArrayShrinker` is the array-specific state machine. It works on the
//! construction parameters of a generated array (shape, dtype and row-major
//! values) and reduces one axis of variation at a time:
//!
//! 1. Shape: drop whole axes, cut sides down to a prefix, a single index or
//!    (on short axes) all but one index, carrying the surviving values along.
//! 2. Dtype: move to a narrower allowed dtype that still holds every value.
//!    Only when the dtype was drawn rather than fixed.
//! 3. Elements: move values towards the simplest member of their domain.
//!
//! Every candidate is rebuilt from scratch through the array module, so each
//! accepted step has passed the same checks as a fresh draw. An axis is done
//! once none of its candidates reproduces the failure. A candidate that cannot
//! be built at all ends the axis early. The machine converges once a full
//! pass over all axes accepts nothing.

use crate::arrays::ArrayStrategy;
use crate::assembler::GeneratedArray;
use crate::dtypes::Dtype;
use crate::elements::ElementDomain;
use crate::module::ArrayModule;
use crate::scalar::Scalar;
use crate::shapes::{shape_size, Shape};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShrinkPhase {
    Shape,
    Dtype,
    Elements,
    /// Reductions of values that are not arrays, proposed by `Strategy::shrink`.
    Value,
    Converged,
}

impl ShrinkPhase {
    /// The array axes, in the order they are reduced.
    pub const AXES: [ShrinkPhase; 3] = [ShrinkPhase::Shape, ShrinkPhase::Dtype, ShrinkPhase::Elements];
}

impl Default for ShrinkPhase {
    fn default() -> Self {
        ShrinkPhase::Converged
    }
}

/// One accepted reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkStep {
    pub phase: ShrinkPhase,
    /// Number of elements in the accepted array, when the value is an array.
    pub element_count: Option<usize>,
}

/// What a shrink search did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkReport {
    calls: usize,
    steps: Vec<ShrinkStep>,
    final_phase: ShrinkPhase,
}

impl ShrinkReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicate calls made.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn steps(&self) -> &[ShrinkStep] {
        &self.steps
    }

    pub fn accepted(&self) -> usize {
        self.steps.len()
    }

    /// `Converged`, or the phase that was running when the call budget ran out.
    pub fn final_phase(&self) -> ShrinkPhase {
        self.final_phase
    }

    pub fn converged(&self) -> bool {
        self.final_phase == ShrinkPhase::Converged
    }

    fn record(&mut self, phase: ShrinkPhase, element_count: Option<usize>) {
        self.steps.push(ShrinkStep { phase, element_count });
    }

    fn finish(&mut self, phase: ShrinkPhase) {
        self.final_phase = phase;
    }
}

/// Shrinks `value` through `strategy.shrink`, accepting the first candidate
/// for which `still_fails` holds, until no candidate does or `max_calls`
/// predicate calls have been made.
pub fn greedy_minimize<S: Strategy + ?Sized>(
    strategy: &S,
    value: S::Value,
    still_fails: &mut dyn FnMut(&S::Value) -> bool,
    max_calls: usize,
) -> (S::Value, ShrinkReport) {
    let mut report = ShrinkReport::new();
    let mut current = value;
    loop {
        let mut improved = false;
        for candidate in strategy.shrink(&current) {
            if report.calls >= max_calls {
                report.finish(ShrinkPhase::Value);
                return (current, report);
            }
            report.calls += 1;
            if still_fails(&candidate) {
                log::debug!("Accepted shrink to {:?}", candidate);
                current = candidate;
                report.record(ShrinkPhase::Value, None);
                improved = true;
                break;
            }
        }
        if !improved {
            break;
        }
    }
    report.finish(ShrinkPhase::Converged);
    (current, report)
}

/// The construction parameters of an array: a proposed simplification is
/// always expressed as one of these and rebuilt from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkCandidate {
    pub shape: Shape,
    pub dtype: Dtype,
    pub values: Vec<Scalar>,
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (1..shape.len()).rev() {
        strides[axis - 1] = strides[axis] * shape[axis];
    }
    strides
}

impl ShrinkCandidate {
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Identity of the candidate for the "already tried" set.
    fn fingerprint(&self) -> Vec<u64> {
        let mut key = Vec::with_capacity(self.shape.len() + self.values.len() + 3);
        key.push(self.shape.len() as u64);
        key.extend(self.shape.iter().map(|&s| s as u64));
        key.push(self.dtype.kind() as u64);
        key.push(self.dtype.bits() as u64);
        for value in &self.values {
            match *value {
                Scalar::Bool(b) => key.push(b as u64),
                Scalar::Int(v) => {
                    key.push((v >> 64) as u64);
                    key.push(v as u64);
                }
                Scalar::Float(v) => key.push(v.to_bits()),
                Scalar::Complex(re, im) => {
                    key.push(re.to_bits());
                    key.push(im.to_bits());
                }
            }
        }
        key
    }

    /// The sub-array keeping only `kept` along `axis`.
    fn keeping(&self, axis: usize, kept: Vec<usize>) -> ShrinkCandidate {
        let mut keep: Vec<Vec<usize>> = self.shape.iter().map(|&side| (0..side).collect()).collect();
        keep[axis] = kept;
        self.select(&keep)
    }

    /// The sub-array keeping, along each axis, the listed indices.
    fn select(&self, keep: &[Vec<usize>]) -> ShrinkCandidate {
        let shape: Shape = keep.iter().map(Vec::len).collect();
        let strides = strides(&self.shape);
        let mut values = Vec::with_capacity(shape_size(&shape));
        if shape_size(&shape) > 0 {
            let mut index = vec![0usize; shape.len()];
            'cells: loop {
                let flat: usize = index
                    .iter()
                    .zip(keep)
                    .zip(&strides)
                    .map(|((&i, kept), &stride)| kept[i] * stride)
                    .sum();
                values.push(self.values[flat]);

                let mut axis = shape.len();
                loop {
                    if axis == 0 {
                        break 'cells;
                    }
                    axis -= 1;
                    index[axis] += 1;
                    if index[axis] < shape[axis] {
                        break;
                    }
                    index[axis] = 0;
                }
            }
        }
        ShrinkCandidate {
            shape,
            dtype: self.dtype,
            values,
        }
    }
}

/// Longest axis for which every "all but one index" cut is proposed.
const ALL_BUT_ONE_MAX_SIDE: usize = 8;

/// Smaller arrays cut out of `current`, fewest axes first. Candidates are
/// built as they are pulled, so taking the first one costs one sub-array.
pub(crate) fn shape_reductions(current: &ShrinkCandidate) -> Box<dyn Iterator<Item = ShrinkCandidate>> {
    let base = Rc::new(current.clone());
    let sides: Vec<(usize, usize)> = current.shape.iter().copied().enumerate().collect();

    let dropped = {
        let base = Rc::clone(&base);
        sides.clone().into_iter().flat_map(move |(axis, side)| {
            let base = Rc::clone(&base);
            (0..side).map(move |index| {
                let mut dropped = base.keeping(axis, vec![index]);
                dropped.shape.remove(axis);
                dropped
            })
        })
    };
    let cut = sides.into_iter().flat_map(move |(axis, side)| {
        let base = Rc::clone(&base);
        cuts(side).map(move |kept| base.keeping(axis, kept))
    });
    Box::new(dropped.chain(cut))
}

/// Index sets to keep along an axis of length `side`: prefixes, single
/// indices, then everything but one index on short axes.
fn cuts(side: usize) -> impl Iterator<Item = Vec<usize>> {
    let mut prefixes = vec![0, 1, side / 2, side.saturating_sub(1)];
    prefixes.retain(|&len| len < side);
    prefixes.sort_unstable();
    prefixes.dedup();
    let skippable = if side > 2 && side <= ALL_BUT_ONE_MAX_SIDE { side - 1 } else { 0 };

    prefixes
        .into_iter()
        .map(|len| (0..len).collect::<Vec<usize>>())
        .chain((1..side).map(|index| vec![index]))
        .chain((0..skippable).map(move |skipped| (0..side).filter(|&i| i != skipped).collect::<Vec<usize>>()))
}

/// Simpler values for `current`: everything at once to the simplest value,
/// then one element at a time.
pub(crate) fn element_reductions<'a>(
    current: &ShrinkCandidate,
    domain: &'a ElementDomain,
) -> Box<dyn Iterator<Item = ShrinkCandidate> + 'a> {
    let simplest = domain.simplest();
    let flattened = if current.values.iter().any(|v| !v.same_as(&simplest)) {
        Some(ShrinkCandidate {
            values: vec![simplest; current.size()],
            ..current.clone()
        })
    } else {
        None
    };

    let base = current.clone();
    let one_at_a_time = (0..base.size()).flat_map(move |index| {
        let base = base.clone();
        domain
            .shrink_candidates(&base.values[index])
            .into_iter()
            .map(move |value| {
                let mut candidate = base.clone();
                candidate.values[index] = value;
                candidate
            })
    });
    Box::new(flattened.into_iter().chain(one_at_a_time))
}

enum Progress {
    Accepted,
    Exhausted,
    OutOfBudget,
}

/// The shape, dtype and elements state machine for one failing array.
pub struct ArrayShrinker<'a, M: ArrayModule> {
    strategy: &'a ArrayStrategy<M>,
    still_fails: &'a mut dyn FnMut(&GeneratedArray<M::Array>) -> bool,
    current: GeneratedArray<M::Array>,
    seen: HashSet<Vec<u64>>,
    max_calls: usize,
    report: ShrinkReport,
}

impl<'a, M: ArrayModule> ArrayShrinker<'a, M> {
    pub fn new(
        strategy: &'a ArrayStrategy<M>,
        initial: GeneratedArray<M::Array>,
        still_fails: &'a mut dyn FnMut(&GeneratedArray<M::Array>) -> bool,
        max_calls: usize,
    ) -> Self {
        let mut seen = HashSet::new();
        seen.insert(initial.candidate().fingerprint());
        ArrayShrinker {
            strategy,
            still_fails,
            current: initial,
            seen,
            max_calls,
            report: ShrinkReport::new(),
        }
    }

    pub fn current(&self) -> &GeneratedArray<M::Array> {
        &self.current
    }

    /// Runs to convergence or until the call budget is spent, returning the
    /// smallest failing array found.
    pub fn shrink(mut self) -> (GeneratedArray<M::Array>, ShrinkReport) {
        loop {
            let accepted_before = self.report.accepted();
            for phase in ShrinkPhase::AXES {
                if phase == ShrinkPhase::Dtype && !self.strategy.dtype_is_variable() {
                    continue;
                }
                log::debug!(
                    "Entering {:?} phase with shape {:?} and dtype {}",
                    phase,
                    self.current.shape,
                    self.current.dtype
                );
                if !self.run_phase(phase) {
                    log::debug!("Shrink budget of {} calls spent during {:?}", self.max_calls, phase);
                    self.report.finish(phase);
                    return (self.current, self.report);
                }
            }
            if self.report.accepted() == accepted_before {
                break;
            }
        }
        log::debug!(
            "Shrinking converged after {} calls and {} steps",
            self.report.calls(),
            self.report.accepted()
        );
        self.report.finish(ShrinkPhase::Converged);
        (self.current, self.report)
    }

    /// Reduces along one axis until it stops yielding. `false` means the call
    /// budget ran out.
    fn run_phase(&mut self, phase: ShrinkPhase) -> bool {
        loop {
            match self.improve(phase) {
                Progress::Accepted => continue,
                Progress::Exhausted => return true,
                Progress::OutOfBudget => return false,
            }
        }
    }

    fn improve(&mut self, phase: ShrinkPhase) -> Progress {
        let strategy = self.strategy;
        let base = self.current.candidate();
        for candidate in strategy.candidates(phase, &base) {
            if !self.seen.insert(candidate.fingerprint()) {
                continue;
            }
            if self.report.calls() >= self.max_calls {
                return Progress::OutOfBudget;
            }
            let built = match strategy.build_candidate(candidate) {
                Ok(built) => built,
                Err(e) => {
                    log::debug!("Abandoning {:?} phase, candidate could not be built: {}", phase, e);
                    return Progress::Exhausted;
                }
            };
            self.report.calls += 1;
            if (self.still_fails)(&built) {
                log::debug!(
                    "Accepted {:?} reduction to shape {:?} dtype {} ({} elements)",
                    phase,
                    built.shape,
                    built.dtype,
                    built.size()
                );
                self.report.record(phase, Some(built.size()));
                self.current = built;
                return Progress::Accepted;
            }
        }
        Progress::Exhausted
    }
}
