use std::{fmt, io, str::FromStr};

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::{BurstKind, Pid, Process, Ticks, Workload};

/// One CPU burst and the I/O burst that follows it. The last pair of a
/// process ends on its CPU burst, so its `io` is never simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPair {
    pub cpu: Ticks,
    pub io: Ticks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub id: Pid,
    pub arrival_time: Ticks,
    pub bursts: Vec<BurstPair>,
}

/// Validated-on-build description of a workload, as read from or written to
/// the plain-text format:
///
/// ```text
/// <process count> <switch overhead>
/// <id> <arrival> <burst count>
/// 1 <cpu> <io>
/// ...
/// <burst count> <cpu> [<io>]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkloadSpec {
    pub switch_overhead: Ticks,
    pub processes: Vec<ProcessSpec>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkloadError {
    #[error("workload description has no header line")]
    MissingHeader,
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: &'static str,
        found: usize,
    },
    #[error("line {line}: invalid {field} `{value}`")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: expected burst {expected} of process {pid}, found {found}")]
    BurstOrder {
        line: usize,
        pid: Pid,
        expected: usize,
        found: usize,
    },
    #[error("process {pid} declares no bursts")]
    NoBursts { pid: Pid },
    #[error("process ids must be positive")]
    ZeroPid,
    #[error("duplicate process id {pid}")]
    DuplicatePid { pid: Pid },
    #[error("header declares {declared} processes but {found} were described")]
    CountMismatch { declared: usize, found: usize },
    #[error("process {pid} ends after {found} of {declared} bursts")]
    Truncated {
        pid: Pid,
        declared: usize,
        found: usize,
    },
}

struct Line<'a> {
    line_no: usize,
    fields: Vec<&'a str>,
}

impl Line<'_> {
    fn expect_fields(
        &self,
        expected: &'static str,
        allowed: &[usize],
    ) -> Result<(), WorkloadError> {
        if allowed.contains(&self.fields.len()) {
            Ok(())
        } else {
            Err(WorkloadError::FieldCount {
                line: self.line_no,
                expected,
                found: self.fields.len(),
            })
        }
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, WorkloadError> {
        let value = self.fields[index];
        value.parse().map_err(|_| WorkloadError::InvalidNumber {
            line: self.line_no,
            field,
            value: value.to_string(),
        })
    }
}

// Process currently being read, with the burst count its header declared
struct Pending {
    spec: ProcessSpec,
    declared: usize,
}

impl WorkloadSpec {
    pub fn parse(text: &str) -> Result<Self, WorkloadError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| Line {
                line_no: i + 1,
                fields: line.split_whitespace().collect(),
            })
            .filter(|line| !line.fields.is_empty());

        let header = lines.next().ok_or(WorkloadError::MissingHeader)?;
        header.expect_fields("2", &[2])?;
        let declared: usize = header.number(0, "process count")?;
        let switch_overhead: Ticks = header.number(1, "switch overhead")?;

        let mut processes = Vec::new();
        let mut pending: Option<Pending> = None;

        for line in lines {
            let Some(mut current) = pending.take() else {
                line.expect_fields("3", &[3])?;
                let spec = ProcessSpec {
                    id: line.number(0, "process id")?,
                    arrival_time: line.number(1, "arrival time")?,
                    bursts: Vec::new(),
                };
                let declared: usize = line.number(2, "burst count")?;
                if declared == 0 {
                    return Err(WorkloadError::NoBursts { pid: spec.id });
                }
                pending = Some(Pending { spec, declared });
                continue;
            };

            let expected = current.spec.bursts.len() + 1;
            let is_last = expected == current.declared;
            // The trailing I/O time of the final burst is optional
            if is_last {
                line.expect_fields("2 or 3", &[2, 3])?;
            } else {
                line.expect_fields("3", &[3])?;
            }

            let found: usize = line.number(0, "burst number")?;
            if found != expected {
                return Err(WorkloadError::BurstOrder {
                    line: line.line_no,
                    pid: current.spec.id,
                    expected,
                    found,
                });
            }

            let cpu = line.number(1, "CPU time")?;
            let io = if line.fields.len() == 3 {
                line.number(2, "I/O time")?
            } else {
                0
            };
            current.spec.bursts.push(BurstPair { cpu, io });

            if is_last {
                processes.push(current.spec);
            } else {
                pending = Some(current);
            }
        }

        if let Some(current) = pending {
            return Err(WorkloadError::Truncated {
                pid: current.spec.id,
                declared: current.declared,
                found: current.spec.bursts.len(),
            });
        }
        if processes.len() != declared {
            return Err(WorkloadError::CountMismatch {
                declared,
                found: processes.len(),
            });
        }

        let spec = Self {
            switch_overhead,
            processes,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), WorkloadError> {
        let mut seen = FxHashSet::default();
        for process in &self.processes {
            if process.id == 0 {
                return Err(WorkloadError::ZeroPid);
            }
            if process.bursts.is_empty() {
                return Err(WorkloadError::NoBursts { pid: process.id });
            }
            if !seen.insert(process.id) {
                return Err(WorkloadError::DuplicatePid { pid: process.id });
            }
        }
        Ok(())
    }

    /// Materialize the processes into an arena the engine can run.
    pub fn build(&self) -> Result<Workload, WorkloadError> {
        self.validate()?;

        let mut workload = Workload::new(self.switch_overhead);
        for spec in &self.processes {
            let mut process = Process::new(spec.id, spec.arrival_time);
            let last = spec.bursts.len() - 1;
            for (i, pair) in spec.bursts.iter().enumerate() {
                process.add_burst(BurstKind::Cpu, pair.cpu);
                if i < last {
                    process.add_burst(BurstKind::Io, pair.io);
                }
            }
            workload.add_process(process);
        }
        Ok(workload)
    }

    pub fn write_description(&self, out: &mut impl io::Write) -> io::Result<()> {
        write!(out, "{self}")
    }
}

impl FromStr for WorkloadSpec {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for WorkloadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.processes.len(), self.switch_overhead)?;
        for process in &self.processes {
            let count = process.bursts.len();
            writeln!(f, "{} {} {}", process.id, process.arrival_time, count)?;
            for (i, pair) in process.bursts.iter().enumerate() {
                if i + 1 == count {
                    writeln!(f, "{} {}", i + 1, pair.cpu)?;
                } else {
                    writeln!(f, "{} {} {}", i + 1, pair.cpu, pair.io)?;
                }
            }
        }
        Ok(())
    }
}

impl From<&Workload> for WorkloadSpec {
    fn from(workload: &Workload) -> Self {
        let processes = workload
            .processes()
            .map(|process| {
                let bursts = process
                    .bursts
                    .chunks(2)
                    .map(|pair| BurstPair {
                        cpu: pair[0].duration,
                        io: pair.get(1).map_or(0, |io| io.duration),
                    })
                    .collect();
                ProcessSpec {
                    id: process.id,
                    arrival_time: process.arrival_time,
                    bursts,
                }
            })
            .collect();

        Self {
            switch_overhead: workload.switch_overhead,
            processes,
        }
    }
}
