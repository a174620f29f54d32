use crate::error::SimError;
use crate::runner::TrialBatch;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtinctionStatistics {
    pub trials: usize,
    pub failed_trials: usize,
    pub rabbit_extinctions: usize,
    pub fox_extinctions: usize,
    pub rabbit_extinction_percent: f64,
    pub fox_extinction_percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn of(values: &mut [f64]) -> Self {
        Self {
            q1: percentile(values, 25.0),
            q3: percentile(values, 75.0),
        }
    }

    pub fn range(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondPeakStatistics {
    pub threshold: f64,
    pub candidates: usize,
    pub too_short: usize,
    // strictly after `threshold`
    pub accepted: usize,
    pub mean_value: f64,
    pub mean_time: f64,
    pub value_quartiles: Quartiles,
    pub time_quartiles: Quartiles,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateStatistics {
    pub extinction: ExtinctionStatistics,
    pub second_peak: SecondPeakStatistics,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatisticsAggregator {
    threshold: f64,
}

impl StatisticsAggregator {
    pub fn new(threshold: f64) -> Result<Self, SimError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "peak acceptance threshold must be a non-negative number of days, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn for_horizon(horizon: f64) -> Result<Self, SimError> {
        Self::new(horizon / 3.0)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn extinction(&self, batch: &TrialBatch) -> ExtinctionStatistics {
        let percent = |count: usize| {
            if batch.trials == 0 {
                0.0
            } else {
                count as f64 / batch.trials as f64 * 100.0
            }
        };
        ExtinctionStatistics {
            trials: batch.trials,
            failed_trials: batch.failures.len(),
            rabbit_extinctions: batch.rabbit_extinctions,
            fox_extinctions: batch.fox_extinctions,
            rabbit_extinction_percent: percent(batch.rabbit_extinctions),
            fox_extinction_percent: percent(batch.fox_extinctions),
        }
    }

    pub fn second_peaks(&self, batch: &TrialBatch) -> Result<SecondPeakStatistics, SimError> {
        let candidates: Vec<_> = batch
            .results
            .iter()
            .filter_map(|result| result.second_peak.as_ref().ok())
            .collect();
        let (mut values, mut times): (Vec<f64>, Vec<f64>) = candidates
            .iter()
            .filter(|peak| peak.time > self.threshold)
            .map(|peak| (f64::from(peak.value), peak.time))
            .unzip();
        if values.is_empty() {
            return Err(SimError::NoValidSecondPeak {
                threshold: self.threshold,
                candidates: candidates.len(),
            });
        }
        Ok(SecondPeakStatistics {
            threshold: self.threshold,
            candidates: candidates.len(),
            too_short: batch.results.len() - candidates.len(),
            accepted: values.len(),
            mean_value: mean(&values),
            mean_time: mean(&times),
            value_quartiles: Quartiles::of(&mut values),
            time_quartiles: Quartiles::of(&mut times),
        })
    }

    pub fn aggregate(&self, batch: &TrialBatch) -> Result<AggregateStatistics, SimError> {
        Ok(AggregateStatistics {
            extinction: self.extinction(batch),
            second_peak: self.second_peaks(batch)?,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// Linear interpolation between order statistics; sorts in place.
pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
