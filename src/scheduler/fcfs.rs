use super::{Policy, ProcKey, Process, ReadySet};

pub struct FcfsPolicy;

impl Policy for FcfsPolicy {
    fn label(&self) -> String {
        "First Come First Serve".to_string()
    }

    fn create_ready_set(&self) -> ReadySet {
        ReadySet::new_ranked()
    }

    // Ranked by arrival rather than by when the process (re)joined the queue
    fn enqueue(&mut self, ready: &mut ReadySet, proc: ProcKey, process: &Process) {
        ready.push_ranked(proc, process.arrival_time);
    }
}
