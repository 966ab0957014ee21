use std::fmt;

use crate::core::RunReport;

/// One-line rendering of a run: makespan and CPU utilization.
pub struct Summary<'a>(pub &'a RunReport);

/// Headline followed by per-process timings and averages.
pub struct Detailed<'a>(pub &'a RunReport);

fn headline(f: &mut fmt::Formatter<'_>, report: &RunReport, unit: &str) -> fmt::Result {
    write!(
        f,
        "{}: Total Time required is {} {unit} CPU Utilization is {:.0}%",
        report.label,
        report.total_time,
        report.cpu_utilization * 100.0
    )
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        headline(f, self.0, "time units")
    }
}

impl fmt::Display for Detailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        headline(f, report, "units")?;
        writeln!(f)?;
        for process in &report.processes {
            writeln!(f, "Process {}:", process.id)?;
            writeln!(f, "  arrival time: {} units", process.arrival_time)?;
            writeln!(f, "  service time: {} units", process.service_time)?;
            writeln!(f, "  I/O time: {} units", process.io_time)?;
            writeln!(f, "  turnaround time: {} units", process.turnaround_time)?;
            writeln!(f, "  finish time: {} units", process.finish_time)?;
        }
        write!(
            f,
            "Average turnaround time: {:.2} units, average wait time: {:.2} units",
            report.mean_turnaround(),
            report.mean_wait()
        )
    }
}
