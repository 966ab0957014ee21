use average::{Estimate, Mean};

use super::state::{Pid, Process, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub id: Pid,
    pub arrival_time: Ticks,
    pub start_time: Ticks,
    pub service_time: Ticks,
    pub io_time: Ticks,
    pub turnaround_time: Ticks,
    // Time spent in the ready set or behind a process switch
    pub wait_time: Ticks,
    pub finish_time: Ticks,
}

impl ProcessReport {
    // Panics unless the process was dispatched and has terminated
    pub fn from_process(process: &Process) -> Self {
        let turnaround_time = process
            .turnaround_time()
            .unwrap_or_else(|| panic!("Process {} has not terminated", process.id));
        let start_time = process
            .start_time
            .unwrap_or_else(|| panic!("Process {} was never dispatched", process.id));

        Self {
            id: process.id,
            arrival_time: process.arrival_time,
            start_time,
            service_time: process.service_time,
            io_time: process.io_time,
            turnaround_time,
            wait_time: turnaround_time - process.service_time - process.io_time,
            finish_time: process.arrival_time + turnaround_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub label: String,
    pub total_time: Ticks,
    pub busy_time: Ticks,
    pub cpu_utilization: f64,
    pub processes: Vec<ProcessReport>,
}

impl RunReport {
    pub fn new(
        label: String,
        total_time: Ticks,
        busy_time: Ticks,
        processes: Vec<ProcessReport>,
    ) -> Self {
        let cpu_utilization = if total_time == 0 {
            0.0
        } else {
            busy_time as f64 / total_time as f64
        };

        Self {
            label,
            total_time,
            busy_time,
            cpu_utilization,
            processes,
        }
    }

    pub fn mean_turnaround(&self) -> f64 {
        avg(self.processes.iter().map(|p| p.turnaround_time as f64))
    }

    pub fn mean_wait(&self) -> f64 {
        avg(self.processes.iter().map(|p| p.wait_time as f64))
    }

    pub fn process(&self, id: Pid) -> Option<&ProcessReport> {
        self.processes.iter().find(|p| p.id == id)
    }
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<Mean>().estimate()
}
