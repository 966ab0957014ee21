use log::info;

use super::workload::{WorkloadError, WorkloadSpec};
use crate::{
    core::{Engine, RunReport, Transition, Workload},
    scheduler::Algorithm,
};

/// Replays one workload under any number of policies. Each run starts from
/// a full reset of the shared processes, so runs never observe each other.
pub struct Sim {
    pub workload: Workload,
}

impl Sim {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }

    pub fn from_spec(spec: &WorkloadSpec) -> Result<Self, WorkloadError> {
        Ok(Self::new(spec.build()?))
    }

    pub fn run(&mut self, algorithm: Algorithm) -> RunReport {
        info!("Running {algorithm} over {} processes", self.workload.len());
        Engine::new(&mut self.workload, algorithm.policy()).run()
    }

    pub fn run_traced<'a>(
        &'a mut self,
        algorithm: Algorithm,
        sink: impl FnMut(&Transition) + 'a,
    ) -> RunReport {
        info!("Running {algorithm} over {} processes", self.workload.len());
        Engine::new(&mut self.workload, algorithm.policy())
            .with_trace(sink)
            .run()
    }

    pub fn run_all(&mut self, algorithms: &[Algorithm]) -> Vec<RunReport> {
        algorithms
            .iter()
            .map(|&algorithm| self.run(algorithm))
            .collect()
    }

    pub fn all_processes_terminated(&self) -> bool {
        self.workload.all_terminated()
    }
}
