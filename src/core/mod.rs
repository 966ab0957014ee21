pub mod driver;
pub mod event;
pub mod metrics;
pub mod observer;
pub mod state;

pub use driver::Engine;
pub use event::{Event, EventKind, Transition, TransitionReason};
pub use metrics::{ProcessReport, RunReport};
pub use state::{
    Burst, BurstKind, Pid, ProcKey, Process, ProcessState, ReadySet, Ticks, Workload,
};
