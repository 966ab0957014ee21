pub mod fcfs;
pub mod round_robin;
pub mod sjf;
pub mod srtn;

use std::{fmt, num::NonZeroU64, str::FromStr};

use thiserror::Error;

use crate::core::{
    Ticks,
    state::{ProcKey, Process, ReadySet},
};
pub use fcfs::FcfsPolicy;
pub use round_robin::RoundRobinPolicy;
pub use sjf::SjfPolicy;
pub use srtn::SrtnPolicy;

// Selection removes the process from the ready set; re-queueing is up to the engine
pub trait Policy {
    fn label(&self) -> String;

    fn create_ready_set(&self) -> ReadySet;

    fn enqueue(&mut self, ready: &mut ReadySet, proc: ProcKey, process: &Process);

    fn select_next(&mut self, ready: &mut ReadySet, _now: Ticks) -> Option<ProcKey> {
        ready.pop()
    }

    fn is_preemptive(&self) -> bool {
        false
    }

    // Consulted after every event batch while the CPU is busy, preemptive policies only
    fn should_preempt(&self, _ready: &ReadySet, _running_remaining: Ticks) -> bool {
        false
    }

    // None runs the burst to completion
    fn time_slice(&self, _remaining: Ticks) -> Option<Ticks> {
        None
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn create_ready_set(&self) -> ReadySet {
        (**self).create_ready_set()
    }

    fn enqueue(&mut self, ready: &mut ReadySet, proc: ProcKey, process: &Process) {
        (**self).enqueue(ready, proc, process)
    }

    fn select_next(&mut self, ready: &mut ReadySet, now: Ticks) -> Option<ProcKey> {
        (**self).select_next(ready, now)
    }

    fn is_preemptive(&self) -> bool {
        (**self).is_preemptive()
    }

    fn should_preempt(&self, ready: &ReadySet, running_remaining: Ticks) -> bool {
        (**self).should_preempt(ready, running_remaining)
    }

    fn time_slice(&self, remaining: Ticks) -> Option<Ticks> {
        (**self).time_slice(remaining)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Fcfs,
    Sjf,
    Srtn,
    RoundRobin(NonZeroU64),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown algorithm `{0}` (expected FCFS, SJF, SRTN or RR<quantum>)")]
pub struct UnknownAlgorithm(pub String);

impl Algorithm {
    pub fn defaults() -> Vec<Algorithm> {
        let mut algorithms = vec![Algorithm::Fcfs, Algorithm::Sjf, Algorithm::Srtn];
        algorithms.extend(
            [10, 50, 100]
                .into_iter()
                .filter_map(NonZeroU64::new)
                .map(Algorithm::RoundRobin),
        );
        algorithms
    }

    pub fn policy(&self) -> Box<dyn Policy> {
        match *self {
            Algorithm::Fcfs => Box::new(FcfsPolicy),
            Algorithm::Sjf => Box::new(SjfPolicy),
            Algorithm::Srtn => Box::new(SrtnPolicy),
            Algorithm::RoundRobin(quantum) => Box::new(RoundRobinPolicy::new(quantum)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Fcfs => f.write_str("FCFS"),
            Algorithm::Sjf => f.write_str("SJF"),
            Algorithm::Srtn => f.write_str("SRTN"),
            Algorithm::RoundRobin(quantum) => write!(f, "RR{quantum}"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "FCFS" => Ok(Algorithm::Fcfs),
            "SJF" => Ok(Algorithm::Sjf),
            "SRTN" => Ok(Algorithm::Srtn),
            _ => upper
                .strip_prefix("RR")
                .and_then(|quantum| quantum.parse::<NonZeroU64>().ok())
                .map(Algorithm::RoundRobin)
                .ok_or_else(|| UnknownAlgorithm(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("FCFS".parse::<Algorithm>(), Ok(Algorithm::Fcfs));
        assert_eq!("sjf".parse::<Algorithm>(), Ok(Algorithm::Sjf));
        assert_eq!("SRTN".parse::<Algorithm>(), Ok(Algorithm::Srtn));
        assert_eq!(
            "RR50".parse::<Algorithm>(),
            Ok(Algorithm::RoundRobin(NonZeroU64::new(50).unwrap()))
        );
        assert!("RR0".parse::<Algorithm>().is_err());
        assert!("RR".parse::<Algorithm>().is_err());
        assert!("LIFO".parse::<Algorithm>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for algorithm in Algorithm::defaults() {
            assert_eq!(algorithm.to_string().parse::<Algorithm>(), Ok(algorithm));
        }
    }

    #[test]
    fn only_srtn_and_rr_are_preemptive() {
        let flags: Vec<_> = Algorithm::defaults()
            .iter()
            .map(|a| a.policy().is_preemptive())
            .collect();
        assert_eq!(flags, vec![false, false, true, true, true, true]);
    }
}
