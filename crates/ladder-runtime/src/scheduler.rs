//! Deterministic cyclic scan scheduler.
//!
//! One scan is the classic PLC cycle: snapshot the I/O table, evaluate
//! every rung in resolved order, commit the writes, sleep to the next
//! tick. A dedicated worker thread owns the program, the evaluator, and
//! all block state; external callers interact only through the control
//! channel and the shared [`IoTable`].
//!
//! A scan always completes atomically. Control messages are drained
//! between scans, so `Stop` halts at the next boundary and a new program
//! swaps in at a boundary. Overruns are never fatal: the overrun is
//! counted, the sleep is skipped, and the next scan starts immediately.

use crate::clock::{Clock, StdClock};
use crate::io_table::IoTable;
use crate::telemetry::{ScanTelemetry, TelemetrySnapshot};
use ladder_common::config::{EngineConfig, OverrunPolicy};
use ladder_common::error::{EngineError, EngineResult};
use ladder_common::faults::{FaultCounters, SoftFault};
use ladder_common::iec_types::{duration_from_time, time_from_duration, TIME};
use ladder_common::metrics::ScanMetrics;
use ladder_common::mode::RunMode;
use ladder_logic::eval::ProgramEvaluator;
use ladder_logic::program::Program;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{info, trace, warn};

/// How often a stopped worker polls for control messages.
const CONTROL_POLL: Duration = Duration::from_millis(50);

/// Control messages accepted by the scan worker.
pub enum Command {
    /// Enter cyclic scanning.
    Run,
    /// Halt scanning at the next scan boundary.
    Stop,
    /// Execute exactly one scan, then stop again.
    Step,
    /// Re-initialize the I/O table and all block state.
    Reset,
    /// Swap in a new program at the next scan boundary.
    LoadProgram {
        /// The program to install.
        program: Box<Program>,
        /// Where to report acceptance or rejection.
        respond_to: Option<mpsc::Sender<EngineResult<()>>>,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run => write!(f, "Run"),
            Self::Stop => write!(f, "Stop"),
            Self::Step => write!(f, "Step"),
            Self::Reset => write!(f, "Reset"),
            Self::LoadProgram { program, .. } => f
                .debug_struct("LoadProgram")
                .field("rungs", &program.rungs.len())
                .finish_non_exhaustive(),
        }
    }
}

/// Result of a single scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanReport {
    /// Scan number, counted from 1.
    pub scan: u64,
    /// Clock time at scan start.
    pub started: TIME,
    /// Scan execution time in nanoseconds.
    pub elapsed: TIME,
    /// Whether execution exceeded the scan period.
    pub overrun: bool,
}

/// The scan engine: program evaluation driven on a fixed period.
///
/// Use directly for synchronous, test-driven scanning via
/// [`ScanEngine::scan_once`], or hand it to [`ScanEngine::spawn`] for the
/// cyclic worker thread.
pub struct ScanEngine<C: Clock = StdClock> {
    io: Arc<IoTable>,
    evaluator: ProgramEvaluator,
    clock: C,
    period_ns: TIME,
    overrun_policy: OverrunPolicy,
    metrics: ScanMetrics,
    metrics_enabled: bool,
    telemetry: Arc<ScanTelemetry>,
    faults: Arc<FaultCounters>,
    mode: RunMode,
    cmd_rx: Option<mpsc::Receiver<Command>>,
    on_scan: Option<Box<dyn FnMut(u64) + Send>>,
    last_tick: Option<TIME>,
}

impl<C: Clock> std::fmt::Debug for ScanEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("mode", &self.mode)
            .field("period_ns", &self.period_ns)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> ScanEngine<C> {
    /// Create an engine over the given I/O table and clock.
    pub fn new(config: &EngineConfig, io: Arc<IoTable>, clock: C) -> Self {
        let faults = Arc::clone(io.faults());
        Self {
            evaluator: ProgramEvaluator::new(Arc::clone(&faults)),
            io,
            clock,
            period_ns: time_from_duration(config.scan_period),
            overrun_policy: config.overrun_policy,
            metrics: ScanMetrics::new(config.metrics.histogram_size, config.scan_period),
            metrics_enabled: config.metrics.enabled,
            telemetry: Arc::new(ScanTelemetry::new()),
            faults,
            mode: RunMode::Stopped,
            cmd_rx: None,
            on_scan: None,
            last_tick: None,
        }
    }

    /// Install a program, re-validating the single-driver invariant.
    ///
    /// On rejection the previous program stays installed and the mode is
    /// unchanged.
    pub fn load_program(&mut self, program: Program) -> EngineResult<()> {
        self.evaluator.load(program)?;
        self.io.register_outputs(self.evaluator.output_ids());
        Ok(())
    }

    /// Current run mode.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// The shared I/O table.
    #[must_use]
    pub fn io(&self) -> &Arc<IoTable> {
        &self.io
    }

    /// The shared telemetry counters.
    #[must_use]
    pub fn telemetry(&self) -> &Arc<ScanTelemetry> {
        &self.telemetry
    }

    /// Scan latency metrics.
    #[must_use]
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// The installed evaluator, for inspection.
    #[must_use]
    pub fn evaluator(&self) -> &ProgramEvaluator {
        &self.evaluator
    }

    /// Apply one control message.
    pub fn apply(&mut self, command: Command) {
        trace!(?command, "control message");
        match command {
            Command::Run => self.transition(RunMode::Running),
            Command::Stop => self.transition(RunMode::Stopped),
            Command::Step => {
                if self.mode == RunMode::Stopped {
                    self.transition(RunMode::SingleStep);
                } else {
                    warn!(mode = %self.mode, "step ignored while scanning");
                }
            }
            Command::Reset => {
                info!("resetting I/O table and block state");
                self.io.reset();
                self.evaluator.reset();
                self.last_tick = None;
            }
            Command::LoadProgram {
                program,
                respond_to,
            } => {
                let result = self.load_program(*program);
                if let Err(error) = &result {
                    warn!(%error, "program rejected, keeping previous program");
                }
                if let Some(tx) = respond_to {
                    let _ = tx.send(result);
                }
            }
        }
    }

    fn transition(&mut self, target: RunMode) {
        match self.mode.transition_to(target) {
            Ok(()) => {
                self.telemetry.set_mode(self.mode);
                info!(mode = %self.mode, "run mode changed");
            }
            Err(error) => warn!(%error, "run mode unchanged"),
        }
    }

    /// Execute exactly one scan.
    ///
    /// Snapshot, evaluate, commit; then account for timing. When the mode
    /// was SINGLE_STEP the engine falls back to STOPPED, so a step command
    /// yields one scan.
    pub fn scan_once(&mut self) -> ScanReport {
        let started = self.clock.now();
        if let Some(last) = self.last_tick {
            self.telemetry
                .record_period(u64::try_from(started - last).unwrap_or(0));
        }
        self.last_tick = Some(started);

        let scan = self.telemetry.scan_count() + 1;
        let inputs = self.io.snapshot();
        let result = self.evaluator.scan(&inputs, self.period_ns);
        if let Some(hook) = self.on_scan.as_mut() {
            hook(scan);
        }
        self.io.commit(&result.delta);

        let elapsed = self.clock.now() - started;
        self.telemetry.record_scan();
        if self.metrics_enabled {
            self.metrics.record(duration_from_time(elapsed));
        }

        let overrun = elapsed > self.period_ns;
        if overrun {
            self.faults.record(SoftFault::ScanOverrun);
            self.telemetry.record_overrun();
            match self.overrun_policy {
                OverrunPolicy::Warn => warn!(
                    scan,
                    elapsed_us = elapsed / 1_000,
                    period_us = self.period_ns / 1_000,
                    "scan overrun"
                ),
                OverrunPolicy::Ignore => trace!(scan, "scan overrun ignored by policy"),
            }
        }

        if self.mode == RunMode::SingleStep {
            self.transition(RunMode::Stopped);
        }

        trace!(scan, elapsed_us = elapsed / 1_000, "scan complete");
        ScanReport {
            scan,
            started,
            elapsed,
            overrun,
        }
    }

    /// Worker loop body. Runs until the stop flag is raised.
    fn run_loop(&mut self, stop: &AtomicBool) {
        info!(period_us = self.period_ns / 1_000, "scan worker started");
        self.telemetry.set_mode(self.mode);

        while !stop.load(Ordering::Acquire) {
            self.drain_commands();

            if self.mode.is_scanning() {
                let report = self.scan_once();
                // An overrun skips the sleep so the next scan starts now
                if !report.overrun && self.mode.is_scanning() {
                    self.clock.sleep_until(report.started + self.period_ns);
                }
            } else {
                // Stopped: wait for the next control message
                let received = self
                    .cmd_rx
                    .as_ref()
                    .and_then(|rx| rx.recv_timeout(CONTROL_POLL).ok());
                if let Some(command) = received {
                    self.apply(command);
                }
            }
        }

        info!(
            scans = self.telemetry.scan_count(),
            overruns = self.telemetry.overrun_count(),
            "scan worker exited"
        );
    }

    fn drain_commands(&mut self) {
        loop {
            let command = match &self.cmd_rx {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            match command {
                Some(command) => self.apply(command),
                None => break,
            }
        }
    }

    /// Spawn the engine on a dedicated worker thread.
    pub fn spawn(mut self, name: impl Into<String>) -> EngineResult<EngineHandle<C>>
    where
        C: Clone,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        self.cmd_rx = Some(cmd_rx);

        let stop = Arc::new(AtomicBool::new(false));
        let telemetry = Arc::clone(&self.telemetry);
        let faults = Arc::clone(&self.faults);
        let io = Arc::clone(&self.io);
        let clock = self.clock.clone();

        let stop_worker = Arc::clone(&stop);
        let join = thread::Builder::new()
            .name(name.into())
            .spawn(move || self.run_loop(&stop_worker))
            .map_err(|e| EngineError::ThreadSpawn(e.to_string()))?;

        Ok(EngineHandle {
            cmd_tx,
            stop,
            telemetry,
            faults,
            io,
            clock,
            join: Some(join),
        })
    }
}

/// Handle to a spawned scan worker.
///
/// Dropping the handle shuts the worker down and joins it.
#[derive(Debug)]
pub struct EngineHandle<C: Clock> {
    cmd_tx: mpsc::Sender<Command>,
    stop: Arc<AtomicBool>,
    telemetry: Arc<ScanTelemetry>,
    faults: Arc<FaultCounters>,
    io: Arc<IoTable>,
    clock: C,
    join: Option<thread::JoinHandle<()>>,
}

impl<C: Clock> EngineHandle<C> {
    /// Send a raw control message.
    pub fn send(&self, command: Command) -> EngineResult<()> {
        self.cmd_tx
            .send(command)
            .map_err(|_| EngineError::ControlChannel("scan worker is gone".into()))
    }

    /// Enter cyclic scanning.
    pub fn run(&self) -> EngineResult<()> {
        self.send(Command::Run)
    }

    /// Halt scanning at the next scan boundary.
    pub fn stop(&self) -> EngineResult<()> {
        self.send(Command::Stop)
    }

    /// Execute exactly one scan.
    pub fn step(&self) -> EngineResult<()> {
        self.send(Command::Step)
    }

    /// Re-initialize the I/O table and all block state.
    pub fn reset(&self) -> EngineResult<()> {
        self.send(Command::Reset)
    }

    /// Swap in a new program and wait for the worker's verdict.
    pub fn load_program(&self, program: Program) -> EngineResult<()> {
        let (tx, rx) = mpsc::channel();
        self.send(Command::LoadProgram {
            program: Box::new(program),
            respond_to: Some(tx),
        })?;
        rx.recv()
            .map_err(|_| EngineError::ControlChannel("no load response".into()))?
    }

    /// The worker's run mode as last published.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.telemetry.mode()
    }

    /// Telemetry snapshot.
    #[must_use]
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Soft-fault counter snapshot.
    #[must_use]
    pub fn faults(&self) -> ladder_common::faults::FaultSnapshot {
        self.faults.snapshot()
    }

    /// The shared I/O table.
    #[must_use]
    pub fn io(&self) -> &Arc<IoTable> {
        &self.io
    }

    /// Stop the worker thread and join it.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.clock.wake();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("scan worker panicked");
            }
        }
    }
}

impl<C: Clock> Drop for EngineHandle<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for a configured [`ScanEngine`].
pub struct ScanEngineBuilder<C: Clock = StdClock> {
    config: EngineConfig,
    clock: C,
    io: Option<Arc<IoTable>>,
    program: Option<Program>,
    on_scan: Option<Box<dyn FnMut(u64) + Send>>,
}

impl ScanEngineBuilder<StdClock> {
    /// Start from defaults with the production clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: StdClock::new(),
            io: None,
            program: None,
            on_scan: None,
        }
    }
}

impl Default for ScanEngineBuilder<StdClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ScanEngineBuilder<C> {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the scan period.
    #[must_use]
    pub fn scan_period(mut self, period: Duration) -> Self {
        self.config.scan_period = period;
        self
    }

    /// Set the overrun reporting policy.
    #[must_use]
    pub fn overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.config.overrun_policy = policy;
        self
    }

    /// Share an existing I/O table.
    #[must_use]
    pub fn io(mut self, io: Arc<IoTable>) -> Self {
        self.io = Some(io);
        self
    }

    /// Install a program at build time.
    #[must_use]
    pub fn program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }

    /// Observer invoked with the scan number after evaluation, before
    /// commit. Diagnostics and test harnesses use this to watch cadence or
    /// inject load.
    #[must_use]
    pub fn on_scan(mut self, hook: impl FnMut(u64) + Send + 'static) -> Self {
        self.on_scan = Some(Box::new(hook));
        self
    }

    /// Swap the scheduling clock.
    #[must_use]
    pub fn clock<C2: Clock>(self, clock: C2) -> ScanEngineBuilder<C2> {
        ScanEngineBuilder {
            config: self.config,
            clock,
            io: self.io,
            program: self.program,
            on_scan: self.on_scan,
        }
    }

    /// Build the engine, loading any program given to the builder.
    pub fn build(self) -> EngineResult<ScanEngine<C>> {
        let io = self.io.unwrap_or_else(|| Arc::new(IoTable::new()));
        let mut engine = ScanEngine::new(&self.config, io, self.clock);
        engine.on_scan = self.on_scan;
        if let Some(program) = self.program {
            engine.load_program(program)?;
        }
        Ok(engine)
    }
}
