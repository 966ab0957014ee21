use log::trace;
use slotmap::SlotMap;

use super::{
    event::Transition,
    state::{ProcKey, Process, ProcessState, ReadySet},
};

pub type TraceSink<'a> = Box<dyn FnMut(&Transition) + 'a>;

pub struct Observer<'a> {
    step: u64,
    transitions: u64,
    sink: Option<TraceSink<'a>>,
}

impl<'a> Observer<'a> {
    pub fn new() -> Self {
        Self {
            step: 0,
            transitions: 0,
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: TraceSink<'a>) {
        self.sink = Some(sink);
    }

    pub fn transition(&mut self, transition: Transition) {
        self.transitions += 1;
        trace!("{transition}");
        if let Some(sink) = self.sink.as_mut() {
            sink(&transition);
        }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn observe(
        &mut self,
        procs: &SlotMap<ProcKey, Process>,
        ready: &ReadySet,
        running: Option<ProcKey>,
    ) {
        self.step += 1;

        if let Some(key) = running {
            let process = &procs[key];
            debug_assert_eq!(
                process.state,
                ProcessState::Running,
                "Running process {} must be in the running state",
                process.id
            );
            debug_assert!(
                !ready.contains(key),
                "Running process {} must not appear in the ready set",
                process.id
            );
        }

        for key in ready.iter() {
            let process = &procs[key];
            debug_assert_eq!(
                process.state,
                ProcessState::Ready,
                "Process {} in the ready set is {}",
                process.id,
                process.state
            );
            debug_assert_eq!(
                process.current_burst().kind,
                super::BurstKind::Cpu,
                "Ready process {} must be waiting on a CPU burst",
                process.id
            );
        }
    }
}

impl Default for Observer<'_> {
    fn default() -> Self {
        Self::new()
    }
}
