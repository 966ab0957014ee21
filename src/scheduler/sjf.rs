use super::{Policy, ProcKey, Process, ReadySet};

// Keyed on the full burst length, not what is left of it
pub struct SjfPolicy;

impl Policy for SjfPolicy {
    fn label(&self) -> String {
        "Shortest Job First".to_string()
    }

    fn create_ready_set(&self) -> ReadySet {
        ReadySet::new_ranked()
    }

    fn enqueue(&mut self, ready: &mut ReadySet, proc: ProcKey, process: &Process) {
        ready.push_ranked(proc, process.current_burst().duration);
    }
}
