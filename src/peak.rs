//! Midpoint-split peak extraction.
//!
//! A series of length `n` is split at index `n / 2`; the second half keeps
//! the extra point when `n` is odd. The "second peak" is the maximum of the
//! second half and the time of its first occurrence. There is no smoothing
//! and no local-maximum search.

use crate::engine::Trajectory;
use crate::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak<T> {
    pub value: T,
    pub time: f64,
    /// Index into the full series.
    pub index: usize,
}

pub type SecondPeak = Peak<i32>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPeaks<T> {
    pub first: Peak<T>,
    pub second: Peak<T>,
}

/// Peaks of both halves of `values`, sampled at `times`.
pub fn split_peaks<T: PartialOrd + Copy>(
    times: &[f64],
    values: &[T],
) -> Result<SplitPeaks<T>, SimError> {
    let len = values.len().min(times.len());
    if len < 2 {
        return Err(SimError::EmptyTrajectory { len });
    }
    let mid = len / 2;
    Ok(SplitPeaks {
        first: max_first_occurrence(times, values, 0, mid),
        second: max_first_occurrence(times, values, mid, len),
    })
}

/// Fox second peak of one trajectory.
pub fn second_peak(trajectory: &Trajectory) -> Result<SecondPeak, SimError> {
    split_peaks(trajectory.times(), trajectory.foxes()).map(|peaks| peaks.second)
}

fn max_first_occurrence<T: PartialOrd + Copy>(
    times: &[f64],
    values: &[T],
    start: usize,
    end: usize,
) -> Peak<T> {
    debug_assert!(start < end);
    let mut best = start;
    for idx in start + 1..end {
        if values[idx] > values[best] {
            best = idx;
        }
    }
    Peak {
        value: values[best],
        time: times[best],
        index: best,
    }
}
