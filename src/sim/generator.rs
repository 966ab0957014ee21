use std::ops::RangeInclusive;

use rand::{SeedableRng, distr::Uniform, rngs::StdRng};
use rand_distr::{Distribution, Exp, Normal};
use thiserror::Error;

use super::workload::{BurstPair, ProcessSpec, WorkloadSpec};
use crate::core::Ticks;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub count: usize,
    pub switch_overhead: Ticks,
    pub mean_interarrival: f64,
    pub cpu_burst: RangeInclusive<Ticks>,
    pub io_burst: RangeInclusive<Ticks>,
    pub burst_count_mean: f64,
    pub burst_count_sd: f64,
    // Fresh OS entropy when unset
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 50,
            switch_overhead: 5,
            mean_interarrival: 50.0,
            cpu_burst: 5..=500,
            io_burst: 30..=1000,
            burst_count_mean: 20.0,
            burst_count_sd: 5.0,
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid generator parameter {what}: {reason}")]
pub struct GeneratorError {
    what: &'static str,
    reason: String,
}

impl GeneratorError {
    fn new(what: &'static str, reason: impl ToString) -> Self {
        Self {
            what,
            reason: reason.to_string(),
        }
    }
}

/// Synthetic workloads: exponential inter-arrival gaps, uniform burst
/// lengths, and a normally distributed number of bursts forced odd so every
/// process ends on a CPU burst.
pub struct WorkloadGenerator {
    count: usize,
    switch_overhead: Ticks,
    rng: StdRng,
    interarrival: Exp<f64>,
    cpu_burst: Uniform<Ticks>,
    io_burst: Uniform<Ticks>,
    burst_count: Normal<f64>,
}

impl WorkloadGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        if config.mean_interarrival.is_nan() || config.mean_interarrival <= 0.0 {
            return Err(GeneratorError::new("mean_interarrival", "must be positive"));
        }
        let interarrival = Exp::new(1.0 / config.mean_interarrival)
            .map_err(|e| GeneratorError::new("mean_interarrival", e))?;
        let cpu_burst = Uniform::new_inclusive(*config.cpu_burst.start(), *config.cpu_burst.end())
            .map_err(|e| GeneratorError::new("cpu_burst", e))?;
        let io_burst = Uniform::new_inclusive(*config.io_burst.start(), *config.io_burst.end())
            .map_err(|e| GeneratorError::new("io_burst", e))?;
        let burst_count = Normal::new(config.burst_count_mean, config.burst_count_sd)
            .map_err(|e| GeneratorError::new("burst_count_sd", e))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            count: config.count,
            switch_overhead: config.switch_overhead,
            rng,
            interarrival,
            cpu_burst,
            io_burst,
            burst_count,
        })
    }

    pub fn generate(&mut self) -> WorkloadSpec {
        let mut processes = Vec::with_capacity(self.count);
        let mut arrival_time: Ticks = 0;

        for id in 1..=self.count as u64 {
            // Whole ticks only; the fractional part of each gap is dropped
            arrival_time += self.interarrival.sample(&mut self.rng) as Ticks;

            let pairs = self.burst_count().div_ceil(2);
            let mut bursts = Vec::with_capacity(pairs);
            for i in 0..pairs {
                let cpu = self.cpu_burst.sample(&mut self.rng);
                let io = if i + 1 < pairs {
                    self.io_burst.sample(&mut self.rng)
                } else {
                    0
                };
                bursts.push(BurstPair { cpu, io });
            }

            processes.push(ProcessSpec {
                id,
                arrival_time,
                bursts,
            });
        }

        WorkloadSpec {
            switch_overhead: self.switch_overhead,
            processes,
        }
    }

    // Total CPU + I/O bursts, always odd and at least one
    fn burst_count(&mut self) -> usize {
        let sample = self.burst_count.sample(&mut self.rng).round();
        let count = sample.max(1.0) as usize;
        if count % 2 == 0 { count + 1 } else { count }
    }
}
