use std::num::NonZeroU64;

use super::{Policy, ProcKey, Process, ReadySet};
use crate::core::Ticks;

pub struct RoundRobinPolicy {
    quantum: NonZeroU64,
}

impl RoundRobinPolicy {
    pub fn new(quantum: NonZeroU64) -> Self {
        Self { quantum }
    }

    pub fn quantum(&self) -> Ticks {
        self.quantum.get()
    }
}

impl Policy for RoundRobinPolicy {
    fn label(&self) -> String {
        format!("Round Robin (Quantum {})", self.quantum)
    }

    fn create_ready_set(&self) -> ReadySet {
        ReadySet::new_fifo()
    }

    fn enqueue(&mut self, ready: &mut ReadySet, proc: ProcKey, _process: &Process) {
        ready.push_back(proc);
    }

    fn is_preemptive(&self) -> bool {
        true
    }

    fn time_slice(&self, remaining: Ticks) -> Option<Ticks> {
        (remaining > self.quantum()).then_some(self.quantum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BurstKind, Workload};

    fn policy(quantum: u64) -> RoundRobinPolicy {
        RoundRobinPolicy::new(NonZeroU64::new(quantum).unwrap())
    }

    #[test]
    fn slice_only_when_burst_exceeds_quantum() {
        let rr = policy(10);
        assert_eq!(rr.time_slice(25), Some(10));
        assert_eq!(rr.time_slice(11), Some(10));
        assert_eq!(rr.time_slice(10), None);
        assert_eq!(rr.time_slice(3), None);
    }

    #[test]
    fn requeued_process_goes_to_back() {
        let mut workload = Workload::new(0);
        let keys: Vec<_> = (1..=3)
            .map(|id| {
                let mut process = Process::new(id, 0);
                process.add_burst(BurstKind::Cpu, 100);
                workload.add_process(process)
            })
            .collect();

        let mut rr = policy(10);
        let mut ready = rr.create_ready_set();
        for &key in &keys {
            rr.enqueue(&mut ready, key, workload.process(key));
        }

        let first = rr.select_next(&mut ready, 0).unwrap();
        assert_eq!(first, keys[0]);
        rr.enqueue(&mut ready, first, workload.process(first));
        assert_eq!(
            ready.iter().collect::<Vec<_>>(),
            vec![keys[1], keys[2], keys[0]]
        );
        assert!(!rr.should_preempt(&ready, u64::MAX));
        assert_eq!(rr.label(), "Round Robin (Quantum 10)");
    }
}
