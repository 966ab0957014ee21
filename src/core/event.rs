use std::{cmp::Ordering, fmt};

use crate::core::{Pid, ProcKey, ProcessState, Ticks};

// Declaration order is the tie-break rank for events at the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Arrival,
    CpuCompletion,
    IoCompletion,
    QuantumExpiry,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Arrival => "Process Arrival",
            Self::CpuCompletion => "CPU Burst Completion",
            Self::IoCompletion => "IO Burst Completion",
            Self::QuantumExpiry => "Time Slice Expiration",
        };
        f.write_str(name)
    }
}

// Ordered by (time, kind, seq); generation only matters when popped
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: Ticks,
    pub kind: EventKind,
    pub proc: ProcKey,
    pub seq: u64,
    pub generation: u64,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    Arrived,
    Dispatched,
    BurstCompleted,
    IoCompleted,
    SliceExpired,
    Preempted,
}

impl TransitionReason {
    // Only involuntary releases are annotated in the trace line
    pub fn annotation(&self) -> Option<&'static str> {
        match self {
            Self::SliceExpired => Some("time slice expired"),
            Self::Preempted => Some("preempted"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub time: Ticks,
    pub pid: Pid,
    pub from: ProcessState,
    pub to: ProcessState,
    pub reason: TransitionReason,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "At time {}: Process {} moves from {} to {}",
            self.time, self.pid, self.from, self.to
        )?;
        if let Some(note) = self.reason.annotation() {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::{cmp::Reverse, collections::BinaryHeap};

    #[test]
    fn same_instant_orders_by_kind_then_seq() {
        let mut keys: SlotMap<ProcKey, ()> = SlotMap::with_key();
        let proc = keys.insert(());
        let event = |time, kind, seq| Event {
            time,
            kind,
            proc,
            seq,
            generation: 0,
        };

        let mut queue = BinaryHeap::new();
        queue.push(Reverse(event(5, EventKind::QuantumExpiry, 0)));
        queue.push(Reverse(event(5, EventKind::IoCompletion, 1)));
        queue.push(Reverse(event(5, EventKind::Arrival, 3)));
        queue.push(Reverse(event(5, EventKind::Arrival, 2)));
        queue.push(Reverse(event(4, EventKind::QuantumExpiry, 4)));
        queue.push(Reverse(event(5, EventKind::CpuCompletion, 5)));

        let mut order = Vec::new();
        while let Some(Reverse(e)) = queue.pop() {
            order.push((e.time, e.kind, e.seq));
        }
        assert_eq!(
            order,
            vec![
                (4, EventKind::QuantumExpiry, 4),
                (5, EventKind::Arrival, 2),
                (5, EventKind::Arrival, 3),
                (5, EventKind::CpuCompletion, 5),
                (5, EventKind::IoCompletion, 1),
                (5, EventKind::QuantumExpiry, 0),
            ]
        );
    }

    #[test]
    fn trace_line_annotates_involuntary_release() {
        let preempted = Transition {
            time: 12,
            pid: 3,
            from: ProcessState::Running,
            to: ProcessState::Ready,
            reason: TransitionReason::Preempted,
        };
        assert_eq!(
            preempted.to_string(),
            "At time 12: Process 3 moves from running to ready (preempted)"
        );

        let arrived = Transition {
            reason: TransitionReason::Arrived,
            from: ProcessState::New,
            ..preempted
        };
        assert_eq!(
            arrived.to_string(),
            "At time 12: Process 3 moves from new to ready"
        );
    }
}
