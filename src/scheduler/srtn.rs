use super::{Policy, ProcKey, Process, ReadySet};
use crate::core::Ticks;

pub struct SrtnPolicy;

impl Policy for SrtnPolicy {
    fn label(&self) -> String {
        "Shortest Remaining Time Next".to_string()
    }

    fn create_ready_set(&self) -> ReadySet {
        ReadySet::new_ranked()
    }

    // A ready process is not consuming its burst, so the key stays valid until selected
    fn enqueue(&mut self, ready: &mut ReadySet, proc: ProcKey, process: &Process) {
        ready.push_ranked(proc, process.current_burst().remaining);
    }

    fn is_preemptive(&self) -> bool {
        true
    }

    fn should_preempt(&self, ready: &ReadySet, running_remaining: Ticks) -> bool {
        ready
            .peek_key()
            .is_some_and(|shortest| shortest < running_remaining)
    }
}
