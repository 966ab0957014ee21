// Invariants that must hold for any workload, checked over seeded random ones.

use std::num::NonZeroU64;

use rustc_hash::FxHashMap;
use sched_sim::{
    Algorithm, Engine, Sim, WorkloadSpec,
    core::{BurstKind, ProcessState, TransitionReason},
    scheduler::{FcfsPolicy, Policy, SrtnPolicy},
    sim::{BurstPair, GeneratorConfig, ProcessSpec, WorkloadGenerator},
};

const SEEDS: [u64; 4] = [1, 17, 2024, 99991];

fn generated(seed: u64, switch_overhead: u64) -> WorkloadSpec {
    WorkloadGenerator::new(GeneratorConfig {
        count: 20,
        switch_overhead,
        seed: Some(seed),
        ..Default::default()
    })
    .unwrap()
    .generate()
}

#[test]
fn every_run_terminates_all_processes_with_sane_metrics() {
    for seed in SEEDS {
        let spec = generated(seed, 5);
        let mut sim = Sim::from_spec(&spec).unwrap();

        for algorithm in Algorithm::defaults() {
            let report = sim.run(algorithm);
            assert!(sim.all_processes_terminated(), "{algorithm} seed {seed}");
            assert_eq!(report.processes.len(), spec.processes.len());
            assert!((0.0..=1.0).contains(&report.cpu_utilization));

            for process in sim.workload.processes() {
                let stats = report.process(process.id).unwrap();
                assert_eq!(process.state, ProcessState::Terminated);
                assert!(stats.finish_time > stats.arrival_time);
                assert!(stats.start_time >= stats.arrival_time);
                assert!(stats.finish_time <= report.total_time);
                assert!(stats.turnaround_time >= stats.service_time + stats.io_time);
                // Demand is served exactly, however often the burst was cut
                assert_eq!(stats.service_time, process.total_demand(BurstKind::Cpu));
                assert_eq!(stats.io_time, process.total_demand(BurstKind::Io));
            }

            let served: u64 = report.processes.iter().map(|p| p.service_time).sum();
            assert_eq!(report.busy_time, served);
        }
    }
}

#[test]
fn reruns_are_independent_of_earlier_runs() {
    let spec = generated(5, 5);
    let mut sim = Sim::from_spec(&spec).unwrap();

    let first = sim.run(Algorithm::Fcfs);
    sim.run(Algorithm::Srtn);
    sim.run(Algorithm::RoundRobin(NonZeroU64::new(10).unwrap()));
    let again = sim.run(Algorithm::Fcfs);
    assert_eq!(first, again);

    let fresh = Sim::from_spec(&spec).unwrap().run(Algorithm::Fcfs);
    assert_eq!(first, fresh);
}

#[test]
fn run_all_matches_individual_runs() {
    let spec = generated(8, 3);
    let algorithms = Algorithm::defaults();
    let reports = Sim::from_spec(&spec).unwrap().run_all(&algorithms);
    assert_eq!(reports.len(), algorithms.len());

    for (algorithm, report) in algorithms.into_iter().zip(reports) {
        let single = Sim::from_spec(&spec).unwrap().run(algorithm);
        assert_eq!(report, single);
        assert_eq!(report.label, algorithm.policy().label());
    }
}

#[test]
fn round_robin_never_overruns_its_quantum() {
    for seed in SEEDS {
        for quantum in [10, 50] {
            let spec = generated(seed, 5);
            let mut sim = Sim::from_spec(&spec).unwrap();
            let mut dispatched_at = FxHashMap::default();
            let mut slices = Vec::new();

            let algorithm = Algorithm::RoundRobin(NonZeroU64::new(quantum).unwrap());
            sim.run_traced(algorithm, |t| {
                if t.to == ProcessState::Running {
                    dispatched_at.insert(t.pid, t.time);
                } else if t.from == ProcessState::Running {
                    let start = dispatched_at.remove(&t.pid).unwrap();
                    slices.push((t.time - start, t.reason));
                }
            });

            assert!(!slices.is_empty());
            for (length, reason) in slices {
                assert!(length <= quantum);
                if length < quantum {
                    assert_eq!(reason, TransitionReason::BurstCompleted);
                }
                assert_ne!(reason, TransitionReason::Preempted);
            }
        }
    }
}

#[test]
fn srtn_running_process_is_never_beaten_by_the_ready_set() {
    for seed in SEEDS {
        let mut workload = generated(seed, 0).build().unwrap();
        let mut engine = Engine::new(&mut workload, SrtnPolicy);
        engine.start();

        let mut last = engine.now();
        while engine.step() {
            assert!(engine.now() >= last);
            last = engine.now();
            if let Some(remaining) = engine.running_remaining() {
                assert!(!engine.policy().should_preempt(engine.ready(), remaining));
                if let Some(shortest) = engine.ready().peek_key() {
                    assert!(shortest >= remaining);
                }
            }
        }

        let report = engine.finish();
        assert!((0.0..=1.0).contains(&report.cpu_utilization));
    }
}

#[test]
fn fcfs_ignores_insertion_order_for_distinct_arrivals() {
    let processes = vec![
        ProcessSpec {
            id: 1,
            arrival_time: 0,
            bursts: vec![BurstPair { cpu: 30, io: 5 }, BurstPair { cpu: 10, io: 0 }],
        },
        ProcessSpec {
            id: 2,
            arrival_time: 3,
            bursts: vec![BurstPair { cpu: 5, io: 100 }, BurstPair { cpu: 5, io: 0 }],
        },
        ProcessSpec {
            id: 3,
            arrival_time: 7,
            bursts: vec![BurstPair { cpu: 20, io: 0 }],
        },
        ProcessSpec {
            id: 4,
            arrival_time: 12,
            bursts: vec![BurstPair { cpu: 8, io: 2 }, BurstPair { cpu: 4, io: 0 }],
        },
    ];
    let forward = WorkloadSpec {
        switch_overhead: 2,
        processes: processes.clone(),
    };
    let backward = WorkloadSpec {
        switch_overhead: 2,
        processes: processes.into_iter().rev().collect(),
    };

    let a = Sim::from_spec(&forward).unwrap().run(Algorithm::Fcfs);
    let b = Sim::from_spec(&backward).unwrap().run(Algorithm::Fcfs);
    assert_eq!(a.total_time, b.total_time);
    assert_eq!(a.busy_time, b.busy_time);
    for id in 1..=4 {
        assert_eq!(a.process(id), b.process(id));
    }
}

#[test]
fn dispatch_waits_out_the_switch_overhead() {
    const OVERHEAD: u64 = 7;

    for seed in SEEDS {
        for algorithm in [Algorithm::Fcfs, Algorithm::Srtn] {
            let mut sim = Sim::from_spec(&generated(seed, OVERHEAD)).unwrap();
            let mut last_release = None;
            let mut dispatches = 0;

            let report = sim.run_traced(algorithm, |t| {
                if t.to == ProcessState::Running {
                    if let Some(released) = last_release {
                        assert!(t.time >= released + OVERHEAD);
                    }
                    dispatches += 1;
                } else if t.from == ProcessState::Running {
                    last_release = Some(t.time);
                }
            });

            assert!(dispatches > 0);
            assert!(report.total_time >= last_release.unwrap_or(0));
            assert!(report.cpu_utilization < 1.0);
        }
    }
}

#[test]
fn overhead_does_not_change_cpu_demand() {
    for seed in SEEDS {
        let without = {
            let mut workload = generated(seed, 0).build().unwrap();
            Engine::new(&mut workload, FcfsPolicy).run()
        };
        let with = {
            let mut workload = generated(seed, 5).build().unwrap();
            Engine::new(&mut workload, FcfsPolicy).run()
        };
        assert_eq!(without.busy_time, with.busy_time);
    }
}

#[test]
fn generated_descriptions_parse_back() {
    for seed in SEEDS {
        let spec = generated(seed, 5);
        let mut text = Vec::new();
        spec.write_description(&mut text).unwrap();
        let parsed = WorkloadSpec::parse(&String::from_utf8(text).unwrap()).unwrap();
        assert_eq!(parsed, spec);

        let a = Sim::from_spec(&spec).unwrap().run(Algorithm::Sjf);
        let b = Sim::from_spec(&parsed).unwrap().run(Algorithm::Sjf);
        assert_eq!(a, b);
    }
}

#[test]
fn trace_never_goes_back_in_time() {
    for seed in SEEDS {
        let mut sim = Sim::from_spec(&generated(seed, 5)).unwrap();
        for algorithm in Algorithm::defaults() {
            let mut last = 0;
            let mut count = 0;
            sim.run_traced(algorithm, |t| {
                assert!(t.time >= last, "{algorithm}: {t} after t={last}");
                last = t.time;
                count += 1;
            });
            assert!(count > 0);
        }
    }
}
