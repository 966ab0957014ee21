use keyed_priority_queue::KeyedPriorityQueue;
use slotmap::{SlotMap, new_key_type};
use std::{collections::VecDeque, fmt};

pub type Ticks = u64;
// Workload-visible process number
pub type Pid = u64;
new_key_type! {
    pub struct ProcKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    Cpu,
    Io,
}

#[derive(Debug, Clone)]
pub struct Burst {
    pub kind: BurstKind,
    pub duration: Ticks,
    pub remaining: Ticks,
}

impl Burst {
    pub fn new(kind: BurstKind, duration: Ticks) -> Self {
        Self {
            kind,
            duration,
            remaining: duration,
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Blocked => "blocked",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Process {
    pub id: Pid,
    pub arrival_time: Ticks,
    pub bursts: Vec<Burst>,
    pub state: ProcessState,
    pub current_burst: usize,
    pub service_time: Ticks,
    pub io_time: Ticks,
    pub start_time: Option<Ticks>,
    pub finish_time: Option<Ticks>,
    pub last_state_change: Ticks,
}

impl Process {
    pub fn new(id: Pid, arrival_time: Ticks) -> Self {
        Self {
            id,
            arrival_time,
            bursts: Vec::new(),
            state: ProcessState::New,
            current_burst: 0,
            service_time: 0,
            io_time: 0,
            start_time: None,
            finish_time: None,
            last_state_change: arrival_time,
        }
    }

    // Alternation is checked by the workload builder, not here
    pub fn add_burst(&mut self, kind: BurstKind, duration: Ticks) {
        self.bursts.push(Burst::new(kind, duration));
    }

    pub fn current_burst(&self) -> &Burst {
        assert!(
            !self.is_completed(),
            "Process {} has no current burst after termination",
            self.id
        );
        &self.bursts[self.current_burst]
    }

    pub fn current_burst_mut(&mut self) -> &mut Burst {
        assert!(
            !self.is_completed(),
            "Process {} has no current burst after termination",
            self.id
        );
        &mut self.bursts[self.current_burst]
    }

    pub fn is_completed(&self) -> bool {
        self.current_burst >= self.bursts.len()
    }

    // Saturates at bursts.len(), which is the terminated position
    pub fn advance_burst(&mut self) {
        if !self.is_completed() {
            self.current_burst += 1;
        }
    }

    pub fn accrue_service_time(&mut self, now: Ticks) {
        if self.current_burst().kind == BurstKind::Cpu {
            self.service_time += self.elapsed_since_change(now);
        }
    }

    pub fn accrue_io_time(&mut self, now: Ticks) {
        if self.current_burst().kind == BurstKind::Io {
            self.io_time += self.elapsed_since_change(now);
        }
    }

    pub fn elapsed_since_change(&self, now: Ticks) -> Ticks {
        debug_assert!(
            now >= self.last_state_change,
            "Process {} observed time {now} before its last state change {}",
            self.id,
            self.last_state_change
        );
        now.saturating_sub(self.last_state_change)
    }

    pub fn set_state(&mut self, state: ProcessState, now: Ticks) {
        self.state = state;
        self.last_state_change = now;
    }

    // Only the first dispatch counts as the start
    pub fn mark_started(&mut self, now: Ticks) {
        self.start_time.get_or_insert(now);
    }

    pub fn mark_finished(&mut self, now: Ticks) {
        assert!(
            self.finish_time.is_none(),
            "Process {} finished twice",
            self.id
        );
        debug_assert!(self.is_completed(), "Process {} still has bursts", self.id);
        self.finish_time = Some(now);
    }

    pub fn turnaround_time(&self) -> Option<Ticks> {
        self.finish_time.map(|finish| finish - self.arrival_time)
    }

    pub fn total_demand(&self, kind: BurstKind) -> Ticks {
        self.bursts
            .iter()
            .filter(|burst| burst.kind == kind)
            .map(|burst| burst.duration)
            .sum()
    }

    pub fn reset(&mut self) {
        self.state = ProcessState::New;
        self.current_burst = 0;
        self.service_time = 0;
        self.io_time = 0;
        self.start_time = None;
        self.finish_time = None;
        self.last_state_change = self.arrival_time;
        for burst in &mut self.bursts {
            burst.reset();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workload {
    pub procs: SlotMap<ProcKey, Process>,
    pub switch_overhead: Ticks,
}

impl Workload {
    pub fn new(switch_overhead: Ticks) -> Self {
        Self {
            procs: SlotMap::with_key(),
            switch_overhead,
        }
    }

    pub fn add_process(&mut self, process: Process) -> ProcKey {
        self.procs.insert(process)
    }

    pub fn process(&self, key: ProcKey) -> &Process {
        &self.procs[key]
    }

    // Insertion order; slots are never removed
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.procs.values()
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn reset(&mut self) {
        for process in self.procs.values_mut() {
            process.reset();
        }
    }

    pub fn all_terminated(&self) -> bool {
        self.procs
            .values()
            .all(|process| process.state == ProcessState::Terminated)
    }
}

// Lowest key first, then earliest insertion
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rank {
    pub key: Ticks,
    pub seq: u64,
}

// KeyedPriorityQueue is a max-heap, so Rank's Ord is flipped
impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub enum ReadySet {
    Fifo {
        procs: VecDeque<ProcKey>,
    },
    Ranked {
        procs: KeyedPriorityQueue<ProcKey, Rank>,
        next_seq: u64,
    },
}

impl ReadySet {
    pub fn new_fifo() -> Self {
        Self::Fifo {
            procs: VecDeque::new(),
        }
    }

    pub fn new_ranked() -> Self {
        Self::Ranked {
            procs: KeyedPriorityQueue::new(),
            next_seq: 0,
        }
    }

    fn push(&mut self, proc: ProcKey, key: Option<Ticks>) {
        assert!(!self.contains(proc), "Process already in the ready set");

        match self {
            Self::Fifo { procs } => procs.push_back(proc),
            Self::Ranked { procs, next_seq } => {
                let rank = Rank {
                    key: key.expect("Attempted to push to a ranked ready set with no key"),
                    seq: *next_seq,
                };
                *next_seq += 1;
                procs.push(proc, rank);
            }
        }
    }

    pub fn push_back(&mut self, proc: ProcKey) {
        self.push(proc, None);
    }

    pub fn push_ranked(&mut self, proc: ProcKey, key: Ticks) {
        self.push(proc, Some(key));
    }

    pub fn pop(&mut self) -> Option<ProcKey> {
        match self {
            Self::Fifo { procs } => procs.pop_front(),
            Self::Ranked { procs, .. } => procs.pop().map(|(proc, _)| proc),
        }
    }

    // Key of the entry `pop` would return; FIFO sets carry no key
    pub fn peek_key(&self) -> Option<Ticks> {
        match self {
            Self::Fifo { .. } => None,
            Self::Ranked { procs, .. } => procs.peek().map(|(_, rank)| rank.key),
        }
    }

    pub fn contains(&self, proc: ProcKey) -> bool {
        match self {
            Self::Fifo { procs } => procs.contains(&proc),
            Self::Ranked { procs, .. } => procs.get_priority(&proc).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { procs } => procs.len(),
            Self::Ranked { procs, .. } => procs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = ProcKey> + '_> {
        match self {
            Self::Fifo { procs } => Box::new(procs.iter().copied()),
            Self::Ranked { procs, .. } => Box::new(procs.iter().map(|(proc, _)| *proc)),
        }
    }
}
