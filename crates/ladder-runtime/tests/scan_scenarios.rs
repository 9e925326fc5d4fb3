//! End-to-end scan scenarios.
//!
//! These drive the whole stack (program model, resolver, evaluator,
//! scheduler, I/O table) the way a controller would: inputs written from
//! outside, scans executed on the period, outputs observed from outside.
//! Timing-sensitive behavior runs against the manual clock so the tests
//! are deterministic; the overrun scenario uses a spawned worker with the
//! real clock.

use ladder_common::config::OverrunPolicy;
use ladder_common::mode::RunMode;
use ladder_logic::program::{CounterMode, Element, Program, Rung, TimerMode};
use ladder_runtime::{Command, ManualClock, ScanEngine, ScanEngineBuilder};
use std::sync::Arc;
use std::time::Duration;

fn manual_engine(program: Program) -> ScanEngine<ManualClock> {
    ScanEngineBuilder::new()
        .clock(ManualClock::new())
        .program(program)
        .build()
        .unwrap()
}

/// Two rungs forming a start/stop latch on `flag` with pure series logic:
/// the first rung computes NOT (set OR flag), the second inverts it back
/// and gates it with the stop contact. The rungs observe each other's
/// coils, so the resolver sees a cycle and falls back to program order.
fn latch_rungs(set: &str, clear: &str, flag: &str, helper: &str) -> Vec<Rung> {
    vec![
        Rung::new(vec![
            Element::contact(set, false),
            Element::contact(flag, false),
            Element::coil(helper),
        ]),
        Rung::new(vec![
            Element::contact(helper, false),
            Element::contact(clear, false),
            Element::coil(flag),
        ]),
    ]
}

#[test]
fn normally_open_passthrough() {
    let mut engine = manual_engine(Program::new(vec![Rung::new(vec![
        Element::contact("in1", true),
        Element::coil("out1"),
    ])]));
    let io = Arc::clone(engine.io());

    io.write_bit("in1", true);
    engine.scan_once();
    assert!(io.read_bit("out1"));

    io.write_bit("in1", false);
    engine.scan_once();
    assert!(!io.read_bit("out1"));
}

#[test]
fn motor_start_stop_latch() {
    let mut engine = manual_engine(Program::new(latch_rungs(
        "start", "stop", "motor", "motor_n",
    )));
    let io = Arc::clone(engine.io());

    // Settle with everything released; the motor stays off
    engine.scan_once();
    engine.scan_once();
    assert!(!io.read_bit("motor"));

    // Pulse start for one scan
    io.write_bit("start", true);
    engine.scan_once();
    assert!(io.read_bit("motor"));
    io.write_bit("start", false);

    // The latch holds across scans
    for _ in 0..5 {
        engine.scan_once();
        assert!(io.read_bit("motor"));
    }

    // Pulse stop for one scan
    io.write_bit("stop", true);
    engine.scan_once();
    assert!(!io.read_bit("motor"));
    io.write_bit("stop", false);

    // And it stays off
    for _ in 0..3 {
        engine.scan_once();
        assert!(!io.read_bit("motor"));
    }
}

#[test]
fn ton_rises_on_fifth_scan() {
    // Preset 5 ticks at a 100ms period is half a second
    let mut engine = manual_engine(Program::new(vec![Rung::new(vec![
        Element::contact("run", true),
        Element::timer("t1", TimerMode::Ton, 5),
        Element::coil("q"),
    ])]));
    let io = Arc::clone(engine.io());

    io.write_bit("run", true);
    for scan in 1..=4 {
        engine.scan_once();
        assert!(!io.read_bit("q"), "q rose early, scan {scan}");
    }
    engine.scan_once();
    assert!(io.read_bit("q"));

    // Release: q drops on the next scan and the timer restarts from zero
    io.write_bit("run", false);
    engine.scan_once();
    assert!(!io.read_bit("q"));

    io.write_bit("run", true);
    engine.scan_once();
    assert!(!io.read_bit("q"), "accumulator did not restart");
}

#[test]
fn ctu_counts_edges_and_resets() {
    let mut engine = manual_engine(Program::new(vec![Rung::new(vec![
        Element::contact("cu", true),
        Element::counter("c1", CounterMode::Ctu, 3, Some("r".into()), None),
        Element::coil("q"),
    ])]));
    let io = Arc::clone(engine.io());

    // Four rising edges; q must rise on the third
    let mut rises = 0;
    for edge in 1..=4 {
        io.write_bit("cu", true);
        engine.scan_once();
        if io.read_bit("q") {
            rises += 1;
        }
        assert_eq!(
            io.read_bit("q"),
            edge >= 3,
            "wrong q after edge {edge}"
        );
        io.write_bit("cu", false);
        engine.scan_once();
    }
    assert!(rises > 0);

    // A held-high trigger does not keep counting: q state is unchanged
    // by the level scans above (each edge counted exactly once).

    // Pulse reset: the count clears and q drops
    io.write_bit("r", true);
    engine.scan_once();
    assert!(!io.read_bit("q"));
}

#[test]
fn edge_idempotence_under_held_trigger() {
    let mut engine = manual_engine(Program::new(vec![Rung::new(vec![
        Element::contact("cu", true),
        Element::counter("c1", CounterMode::Ctu, 2, None, None),
        Element::coil("q"),
    ])]));
    let io = Arc::clone(engine.io());

    // One rising edge, then many scans with the trigger held high
    io.write_bit("cu", true);
    for _ in 0..10 {
        engine.scan_once();
        assert!(!io.read_bit("q"), "held trigger counted more than once");
    }

    // The second real edge reaches the preset
    io.write_bit("cu", false);
    engine.scan_once();
    io.write_bit("cu", true);
    engine.scan_once();
    assert!(io.read_bit("q"));
}

#[test]
fn ctud_follows_load_and_reset_wires() {
    let mut engine = manual_engine(Program::new(vec![Rung::new(vec![
        Element::contact("t", true),
        Element::counter(
            "c1",
            CounterMode::Ctud,
            2,
            Some("rst".into()),
            Some("ld".into()),
        ),
        Element::coil("q"),
    ])]));
    let io = Arc::clone(engine.io());

    // Pulsing the rung edges both count inputs at once; they cancel and
    // the value never moves
    for _ in 0..4 {
        io.write_bit("t", true);
        engine.scan_once();
        assert!(!io.read_bit("q"));
        io.write_bit("t", false);
        engine.scan_once();
    }

    // Loading the preset raises qu, which gates the rung
    io.write_bit("t", true);
    io.write_bit("ld", true);
    engine.scan_once();
    assert!(io.read_bit("q"));
    io.write_bit("ld", false);
    engine.scan_once();
    assert!(io.read_bit("q"));

    // Reset clears the value and drops the output
    io.write_bit("rst", true);
    engine.scan_once();
    assert!(!io.read_bit("q"));
}

#[test]
fn feedback_cycle_resolves_in_program_order() {
    let mut engine = manual_engine(Program::new(latch_rungs("set", "clear", "flag", "flag_n")));

    // Every rung appears exactly once in the resolved order
    let mut order = engine.evaluator().order().to_vec();
    order.sort_unstable();
    assert_eq!(order, vec![0, 1]);

    // Steady-state behavior matches the motor latch semantics
    let io = Arc::clone(engine.io());
    io.write_bit("set", true);
    engine.scan_once();
    io.write_bit("set", false);
    engine.scan_once();
    engine.scan_once();
    assert!(io.read_bit("flag"));

    io.write_bit("clear", true);
    engine.scan_once();
    assert!(!io.read_bit("flag"));
}

#[test]
fn scan_overrun_is_counted_once_and_cadence_recovers() {
    let engine = ScanEngineBuilder::new()
        .scan_period(Duration::from_millis(50))
        .overrun_policy(OverrunPolicy::Ignore)
        .on_scan(|scan| {
            // Stall exactly one scan well past the period
            if scan == 3 {
                std::thread::sleep(Duration::from_millis(120));
            }
        })
        .program(Program::new(vec![Rung::new(vec![
            Element::contact("in1", true),
            Element::coil("out1"),
        ])]))
        .build()
        .unwrap();
    let mut handle = engine.spawn("overrun-scenario").unwrap();

    handle.run().unwrap();

    // Let it get well past the stalled scan
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while handle.telemetry().scan_count < 8 {
        assert!(
            std::time::Instant::now() < deadline,
            "worker made no progress"
        );
        std::thread::sleep(Duration::from_millis(5));
    }
    handle.stop().unwrap();

    let telemetry = handle.telemetry();
    assert_eq!(telemetry.overrun_count, 1, "exactly one overrun expected");
    handle.shutdown();
}

#[test]
fn identical_timelines_produce_identical_output_sequences() {
    let build = || {
        let mut rungs = latch_rungs("set", "clear", "flag", "flag_n");
        rungs.push(Rung::new(vec![
            Element::contact("flag", true),
            Element::timer("t1", TimerMode::Ton, 3),
            Element::coil("warm"),
        ]));
        rungs.push(Rung::new(vec![
            Element::contact("tick", true),
            Element::counter("c1", CounterMode::Ctu, 4, Some("clear".into()), None),
            Element::coil("often"),
        ]));
        manual_engine(Program::new(rungs))
    };

    let mut a = build();
    let mut b = build();

    // A fixed, slightly adversarial input timeline
    let timeline: Vec<(&str, &[(&str, bool)])> = vec![
        ("scan", &[("set", true), ("tick", true)]),
        ("scan", &[("set", false)]),
        ("scan", &[("tick", false)]),
        ("scan", &[("tick", true)]),
        ("scan", &[("tick", false), ("clear", true)]),
        ("scan", &[("clear", false), ("set", true)]),
        ("scan", &[("tick", true)]),
        ("scan", &[]),
        ("scan", &[("set", false)]),
        ("scan", &[]),
    ];

    for (step, (_, writes)) in timeline.iter().enumerate() {
        for (id, bit) in *writes {
            a.io().write_bit(*id, *bit);
            b.io().write_bit(*id, *bit);
        }
        a.scan_once();
        b.scan_once();
        assert_eq!(
            a.io().snapshot(),
            b.io().snapshot(),
            "images diverged at step {step}"
        );
    }
}

#[test]
fn reset_returns_engine_to_cold_state() {
    let mut engine = manual_engine(Program::new(latch_rungs(
        "set", "clear", "flag", "flag_n",
    )));
    let io = Arc::clone(engine.io());

    io.write_bit("set", true);
    engine.scan_once();
    io.write_bit("set", false);
    engine.scan_once();
    assert!(io.read_bit("flag"));

    engine.apply(Command::Reset);
    assert!(io.is_empty());
    assert_eq!(engine.mode(), RunMode::Stopped);

    // Cold again: no latched state survives
    engine.scan_once();
    assert!(!io.read_bit("flag"));
}
