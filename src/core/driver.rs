use std::{cmp::Reverse, collections::BinaryHeap};

use log::{debug, trace};
use slotmap::SecondaryMap;

use super::{
    event::{Event, EventKind, Transition, TransitionReason},
    metrics::{ProcessReport, RunReport},
    observer::Observer,
    state::{ProcKey, ProcessState, ReadySet, Ticks, Workload},
};
use crate::scheduler::Policy;

pub struct Engine<'w, P: Policy> {
    workload: &'w mut Workload,
    policy: P,
    ready: ReadySet,
    events: BinaryHeap<Reverse<Event>>,
    running: Option<ProcKey>,
    // Bumped on preemption; queued events carrying an older value are stale
    generations: SecondaryMap<ProcKey, u64>,
    now: Ticks,
    next_dispatch: Ticks,
    busy: Ticks,
    next_seq: u64,
    observer: Observer<'w>,
}

impl<'w, P: Policy> Engine<'w, P> {
    pub fn new(workload: &'w mut Workload, policy: P) -> Self {
        let ready = policy.create_ready_set();
        Self {
            workload,
            policy,
            ready,
            events: BinaryHeap::new(),
            running: None,
            generations: SecondaryMap::new(),
            now: 0,
            next_dispatch: 0,
            busy: 0,
            next_seq: 0,
            observer: Observer::new(),
        }
    }

    pub fn with_trace(mut self, sink: impl FnMut(&Transition) + 'w) -> Self {
        self.observer.set_sink(Box::new(sink));
        self
    }

    pub fn run(mut self) -> RunReport {
        self.start();
        while self.step() {}
        self.finish()
    }

    pub fn start(&mut self) {
        self.workload.reset();
        self.ready = self.policy.create_ready_set();
        self.events.clear();
        self.running = None;
        self.generations.clear();
        self.now = 0;
        self.next_dispatch = 0;
        self.busy = 0;
        self.next_seq = 0;

        debug!(
            "{}: simulating {} processes, switch overhead {}",
            self.policy.label(),
            self.workload.len(),
            self.workload.switch_overhead
        );

        let arrivals: Vec<_> = self
            .workload
            .procs
            .iter()
            .map(|(key, process)| (key, process.arrival_time))
            .collect();
        for (key, arrival_time) in arrivals {
            self.generations.insert(key, 0);
            self.schedule(arrival_time, EventKind::Arrival, key);
        }
    }

    // Earliest instant is either a queued event or the end of a switch overhead
    pub fn step(&mut self) -> bool {
        let Some(time) = [self.next_event_time(), self.pending_dispatch()]
            .into_iter()
            .flatten()
            .min()
        else {
            return false;
        };
        debug_assert!(
            time >= self.now,
            "Clock moved back from {} to {time}",
            self.now
        );
        self.now = time;

        while self.next_event_time() == Some(time) {
            let Reverse(event) = self.events.pop().expect("Peeked event vanished from queue");
            if event.generation != self.generations[event.proc] {
                trace!(
                    "t={} dropping cancelled {} for process {}",
                    event.time,
                    event.kind,
                    self.workload.procs[event.proc].id
                );
                continue;
            }
            self.handle(event);
        }

        if self.policy.is_preemptive() {
            self.check_preemption();
        }
        self.dispatch();

        self.observer
            .observe(&self.workload.procs, &self.ready, self.running);
        true
    }

    pub fn finish(self) -> RunReport {
        assert!(self.events.is_empty(), "Finishing with pending events");
        assert!(
            self.running.is_none() && self.ready.is_empty(),
            "Event queue drained while processes still wait for the CPU"
        );
        assert!(
            self.workload.all_terminated(),
            "Event queue drained before every process terminated"
        );

        let processes = self
            .workload
            .processes()
            .map(ProcessReport::from_process)
            .collect();
        let report = RunReport::new(self.policy.label(), self.now, self.busy, processes);

        debug!(
            "{}: finished at t={} after {} steps and {} transitions, utilization {:.3}",
            report.label,
            report.total_time,
            self.observer.steps(),
            self.observer.transitions(),
            report.cpu_utilization
        );
        report
    }

    pub fn now(&self) -> Ticks {
        self.now
    }

    pub fn ready(&self) -> &ReadySet {
        &self.ready
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn running_remaining(&self) -> Option<Ticks> {
        self.running.map(|key| {
            let process = &self.workload.procs[key];
            process.current_burst().remaining - process.elapsed_since_change(self.now)
        })
    }

    fn next_event_time(&self) -> Option<Ticks> {
        self.events.peek().map(|Reverse(event)| event.time)
    }

    // Earliest instant the idle CPU may be handed to a waiting process
    fn pending_dispatch(&self) -> Option<Ticks> {
        if self.running.is_some() || self.ready.is_empty() {
            return None;
        }
        Some(self.now.max(self.next_dispatch))
    }

    fn schedule(&mut self, time: Ticks, kind: EventKind, proc: ProcKey) {
        let event = Event {
            time,
            kind,
            proc,
            seq: self.next_seq,
            generation: self.generations[proc],
        };
        self.next_seq += 1;
        self.events.push(Reverse(event));
    }

    fn handle(&mut self, event: Event) {
        trace!(
            "t={} {} for process {}",
            event.time,
            event.kind,
            self.workload.procs[event.proc].id
        );

        match event.kind {
            EventKind::Arrival => self.on_arrival(event.proc, event.time),
            EventKind::CpuCompletion => self.on_cpu_completion(event.proc, event.time),
            EventKind::IoCompletion => self.on_io_completion(event.proc, event.time),
            EventKind::QuantumExpiry => self.on_quantum_expiry(event.proc, event.time),
        }
    }

    fn on_arrival(&mut self, proc: ProcKey, now: Ticks) {
        debug_assert_eq!(
            self.workload.procs[proc].state,
            ProcessState::New,
            "Arrival for a process that already arrived"
        );
        self.make_ready(proc, now, TransitionReason::Arrived);
    }

    fn on_cpu_completion(&mut self, proc: ProcKey, now: Ticks) {
        self.release_cpu(proc, now);

        let process = &mut self.workload.procs[proc];
        process.current_burst_mut().remaining = 0;
        process.advance_burst();

        if process.is_completed() {
            process.mark_finished(now);
            self.transition(
                proc,
                now,
                ProcessState::Terminated,
                TransitionReason::BurstCompleted,
            );
        } else {
            let io_duration = process.current_burst().duration;
            self.transition(
                proc,
                now,
                ProcessState::Blocked,
                TransitionReason::BurstCompleted,
            );
            self.schedule(now + io_duration, EventKind::IoCompletion, proc);
        }
    }

    fn on_io_completion(&mut self, proc: ProcKey, now: Ticks) {
        let process = &mut self.workload.procs[proc];
        debug_assert_eq!(
            process.state,
            ProcessState::Blocked,
            "I/O completion for process {} that is not blocked",
            process.id
        );
        process.accrue_io_time(now);
        process.current_burst_mut().remaining = 0;
        process.advance_burst();
        self.make_ready(proc, now, TransitionReason::IoCompleted);
    }

    fn on_quantum_expiry(&mut self, proc: ProcKey, now: Ticks) {
        let elapsed = self.workload.procs[proc].elapsed_since_change(now);
        self.release_cpu(proc, now);

        let burst = self.workload.procs[proc].current_burst_mut();
        debug_assert!(
            elapsed < burst.remaining,
            "Quantum expired at or after burst completion"
        );
        burst.remaining -= elapsed;
        self.make_ready(proc, now, TransitionReason::SliceExpired);
    }

    fn check_preemption(&mut self) {
        let (Some(proc), Some(remaining)) = (self.running, self.running_remaining()) else {
            return;
        };
        if !self.policy.should_preempt(&self.ready, remaining) {
            return;
        }

        let now = self.now;
        self.release_cpu(proc, now);
        self.workload.procs[proc].current_burst_mut().remaining = remaining;
        // Orphans the pending completion or quantum expiry
        self.generations[proc] += 1;
        self.make_ready(proc, now, TransitionReason::Preempted);
    }

    // No-op until the switch overhead since the last release has elapsed
    fn dispatch(&mut self) {
        if self.pending_dispatch() != Some(self.now) {
            return;
        }

        let now = self.now;
        let proc = self
            .policy
            .select_next(&mut self.ready, now)
            .expect("Policy selected nothing from a non-empty ready set");

        self.running = Some(proc);
        self.workload.procs[proc].mark_started(now);
        self.transition(
            proc,
            now,
            ProcessState::Running,
            TransitionReason::Dispatched,
        );

        let remaining = self.workload.procs[proc].current_burst().remaining;
        match self.policy.time_slice(remaining) {
            Some(slice) => {
                debug_assert!(slice < remaining, "Slice must end before the burst does");
                self.schedule(now + slice, EventKind::QuantumExpiry, proc);
            }
            None => self.schedule(now + remaining, EventKind::CpuCompletion, proc),
        }
    }

    // Service and CPU-busy accounting for a process leaving the CPU
    fn release_cpu(&mut self, proc: ProcKey, now: Ticks) {
        assert_eq!(
            self.running,
            Some(proc),
            "Releasing the CPU from a process that does not hold it"
        );

        let process = &mut self.workload.procs[proc];
        self.busy += process.elapsed_since_change(now);
        process.accrue_service_time(now);

        self.running = None;
        self.next_dispatch = now + self.workload.switch_overhead;
    }

    fn make_ready(&mut self, proc: ProcKey, now: Ticks, reason: TransitionReason) {
        self.transition(proc, now, ProcessState::Ready, reason);
        self.policy
            .enqueue(&mut self.ready, proc, &self.workload.procs[proc]);
    }

    fn transition(
        &mut self,
        proc: ProcKey,
        now: Ticks,
        to: ProcessState,
        reason: TransitionReason,
    ) {
        let process = &mut self.workload.procs[proc];
        let from = process.state;
        process.set_state(to, now);
        self.observer.transition(Transition {
            time: now,
            pid: process.id,
            from,
            to,
            reason,
        });
    }
}
