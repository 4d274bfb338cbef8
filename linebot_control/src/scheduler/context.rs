//! Global and per-worker scheduling contexts.

use super::phase::Phase;
use super::service::Service;
use super::stats::TickStats;
use crate::error::SchedulerError;
use linebot_common::mode::Mode;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Largest number of services one worker can hold.
pub const MAX_SERVICES: usize = 32;

/// Outcome of a mode change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    /// A new epoch started.
    Applied,
    /// A transition is in flight; the request will be applied once every
    /// worker has converged. A later request replaces it.
    Queued,
    /// Already the current mode.
    Unchanged,
}

/// Point-in-time copy of the global context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalSnapshot {
    #[serde(serialize_with = "serialize_mode")]
    pub current: Mode,
    #[serde(serialize_with = "serialize_mode")]
    pub previous: Mode,
    pub running_count: usize,
    pub workers: usize,
}

fn serialize_mode<S: serde::Serializer>(mode: &Mode, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(mode)
}

#[derive(Debug)]
struct GlobalInner {
    current: Mode,
    previous: Mode,
    running_count: usize,
    workers: usize,
    pending: Option<Mode>,
}

impl GlobalInner {
    fn settled(&self) -> bool {
        self.previous == self.current && self.running_count == self.workers
    }
}

/// Process-wide mode state shared by every worker.
///
/// `running_count` counts workers that have entered the current epoch. A
/// mode change starts a new epoch; each worker leaves the count after its
/// teardowns, and the last one out advances `previous` to `current`, which
/// releases every worker into its setups.
#[derive(Debug)]
pub struct GlobalContext {
    inner: Mutex<GlobalInner>,
}

impl GlobalContext {
    /// Start in `Idle` with no workers attached.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GlobalInner {
                current: Mode::IDLE,
                previous: Mode::IDLE,
                running_count: 0,
                workers: 0,
                pending: None,
            }),
        }
    }

    /// Register one more worker; returns its index.
    ///
    /// Attach every worker before any of them starts ticking.
    pub fn attach_worker(&self) -> usize {
        let mut g = self.inner.lock();
        g.workers += 1;
        g.workers - 1
    }

    /// Request a mode change. This is the only way `current` changes.
    ///
    /// `HALT` is never queued: it replaces any in-flight transition and any
    /// pending request, so workers stuck behind an unfinished epoch still
    /// see it.
    ///
    /// # Errors
    /// `InvalidMode` unless `mode` is exactly one named mode; `Halted` once
    /// `HALT` has been applied.
    pub fn set_mode(&self, mode: Mode) -> Result<ModeRequest, SchedulerError> {
        if !mode.is_single() {
            return Err(SchedulerError::InvalidMode(mode));
        }
        let mut g = self.inner.lock();
        if g.current == Mode::HALT {
            return Err(SchedulerError::Halted(mode));
        }
        if mode == Mode::HALT {
            info!(
                from = %g.current,
                running = g.running_count,
                workers = g.workers,
                "Halt requested"
            );
            g.pending = None;
            g.current = Mode::HALT;
            return Ok(ModeRequest::Applied);
        }
        if !g.settled() {
            debug!(requested = %mode, current = %g.current, "Mode change queued");
            g.pending = Some(mode);
            return Ok(ModeRequest::Queued);
        }
        if g.current == mode {
            return Ok(ModeRequest::Unchanged);
        }
        info!(from = %g.current, to = %mode, "Mode change");
        g.current = mode;
        Ok(ModeRequest::Applied)
    }

    pub fn current_mode(&self) -> Mode {
        self.inner.lock().current
    }

    pub fn previous_mode(&self) -> Mode {
        self.inner.lock().previous
    }

    pub fn running_count(&self) -> usize {
        self.inner.lock().running_count
    }

    pub fn worker_count(&self) -> usize {
        self.inner.lock().workers
    }

    /// True when no transition is in flight.
    pub fn is_settled(&self) -> bool {
        self.inner.lock().settled()
    }

    pub fn snapshot(&self) -> GlobalSnapshot {
        let g = self.inner.lock();
        GlobalSnapshot {
            current: g.current,
            previous: g.previous,
            running_count: g.running_count,
            workers: g.workers,
        }
    }

    /// `(previous, current)` read under one lock.
    fn modes(&self) -> (Mode, Mode) {
        let g = self.inner.lock();
        (g.previous, g.current)
    }

    /// A worker finished its setups. The worker that completes the epoch
    /// applies any queued request.
    fn enter_complete(&self) {
        let mut g = self.inner.lock();
        g.running_count = (g.running_count + 1).min(g.workers);
        if !g.settled() {
            return;
        }
        if let Some(next) = g.pending.take() {
            if next != g.current {
                info!(from = %g.current, to = %next, "Queued mode change applied");
                g.current = next;
            }
        }
    }

    /// A worker finished its teardowns. The last one out releases the
    /// barrier.
    fn exit_complete(&self) {
        let mut g = self.inner.lock();
        g.running_count = g.running_count.saturating_sub(1);
        if g.running_count == 0 {
            debug!(from = %g.previous, to = %g.current, "Epoch barrier released");
            g.previous = g.current;
        }
    }
}

impl Default for GlobalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one scheduling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    /// The worker tore down for `HALT` and must stop.
    Halt,
}

/// What a worker does between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPolicy {
    /// Busy-poll.
    Spin,
    /// Yield the CPU to other runnable threads.
    Yield,
    /// Sleep for a fixed duration.
    Sleep(Duration),
}

impl PollPolicy {
    #[inline]
    fn pause(&self) {
        match *self {
            Self::Spin => std::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
            Self::Sleep(d) => std::thread::sleep(d),
        }
    }
}

/// Summary returned when a worker stops.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub name: String,
    pub stats: TickStats,
}

struct Slot {
    service: Box<dyn Service>,
    /// Set up and not yet torn down.
    live: bool,
}

/// Per-worker view of the mode plus the worker's ordered service list.
///
/// Starts at `(previous, current) = (HALT, IDLE)` so the first tick is an
/// `Enter` that sets up every idle service before anything cycles.
pub struct LocalContext {
    name: String,
    global: Arc<GlobalContext>,
    current: Mode,
    previous: Mode,
    services: heapless::Vec<Slot, MAX_SERVICES>,
    /// Counted in the global `running_count`.
    entered: bool,
    stats: TickStats,
    last_phase: Option<Phase>,
}

impl LocalContext {
    /// Create a worker context and attach it to `global`.
    pub fn new(name: impl Into<String>, global: Arc<GlobalContext>) -> Self {
        global.attach_worker();
        Self {
            name: name.into(),
            global,
            current: Mode::IDLE,
            previous: Mode::HALT,
            services: heapless::Vec::new(),
            entered: false,
            stats: TickStats::new(),
            last_phase: None,
        }
    }

    /// Append a service; registration order is dispatch order.
    pub fn add_service(&mut self, service: Box<dyn Service>) -> Result<(), SchedulerError> {
        self.services
            .push(Slot {
                service,
                live: false,
            })
            .map_err(|_| SchedulerError::ServiceListFull {
                worker: self.name.clone(),
                capacity: MAX_SERVICES,
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_mode(&self) -> Mode {
        self.current
    }

    pub fn previous_mode(&self) -> Mode {
        self.previous
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Phase the next tick would execute.
    pub fn phase(&self) -> Phase {
        let (g_prev, g_cur) = self.global.modes();
        Phase::derive(g_prev != g_cur, self.previous != self.current)
    }

    /// Execute one phase.
    pub fn tick(&mut self) -> Tick {
        let (g_prev, g_cur) = self.global.modes();
        let phase = Phase::derive(g_prev != g_cur, self.previous != self.current);

        if self.last_phase != Some(phase) {
            debug!(
                worker = %self.name,
                %phase,
                local = %self.current,
                global = %g_cur,
                "Phase"
            );
            self.last_phase = Some(phase);
        }

        if g_cur == Mode::HALT {
            self.halt();
            return Tick::Halt;
        }

        match phase {
            Phase::Run => {
                for slot in self.services.iter_mut() {
                    if slot.service.mask().intersects(self.current) {
                        slot.service.cycle();
                    }
                }
            }
            Phase::Enter => {
                self.current = g_cur;
                for slot in self.services.iter_mut() {
                    let mask = slot.service.mask();
                    if mask.intersects(self.current) && !mask.intersects(self.previous) {
                        trace!(worker = %self.name, service = slot.service.name(), "setup");
                        slot.service.setup();
                        slot.live = true;
                    }
                }
                self.previous = self.current;
                self.entered = true;
                self.global.enter_complete();
            }
            Phase::Exit => {
                for slot in self.services.iter_mut() {
                    let mask = slot.service.mask();
                    if mask.intersects(g_prev) && !mask.intersects(g_cur) {
                        trace!(worker = %self.name, service = slot.service.name(), "teardown");
                        slot.service.teardown();
                        slot.live = false;
                    }
                }
                self.current = g_cur;
                self.entered = false;
                self.global.exit_complete();
            }
            Phase::Overlap => {
                for slot in self.services.iter_mut() {
                    let mask = slot.service.mask();
                    if mask.intersects(self.current) && mask.intersects(self.previous) {
                        slot.service.cycle();
                    }
                }
            }
        }
        Tick::Continue
    }

    /// Tear down every live service, leave the epoch if still counted in it,
    /// and adopt `HALT` locally. Works from any phase, including a worker
    /// parked in `Overlap` behind an epoch that will never complete.
    fn halt(&mut self) {
        for slot in self.services.iter_mut().filter(|s| s.live) {
            trace!(worker = %self.name, service = slot.service.name(), "teardown");
            slot.service.teardown();
            slot.live = false;
        }
        if self.entered {
            self.entered = false;
            self.global.exit_complete();
        }
        self.previous = self.current;
        self.current = Mode::HALT;
    }

    /// Tick until halted, pausing per `poll` between ticks.
    pub fn run(mut self, poll: PollPolicy) -> WorkerReport {
        info!(
            worker = %self.name,
            services = self.services.len(),
            ?poll,
            "Worker started"
        );
        loop {
            let start = Instant::now();
            let tick = self.tick();
            self.stats.record(start.elapsed().as_nanos() as u64);
            if tick == Tick::Halt {
                break;
            }
            poll.pause();
        }
        info!(
            worker = %self.name,
            ticks = self.stats.tick_count,
            avg_ns = self.stats.avg_tick_ns(),
            max_ns = self.stats.max_tick_ns,
            "Worker halted"
        );
        WorkerReport {
            name: self.name,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::service::FnService;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter() -> Arc<AtomicU32> {
        Arc::new(AtomicU32::new(0))
    }

    #[test]
    fn first_tick_is_enter() {
        let global = Arc::new(GlobalContext::new());
        let mut local = LocalContext::new("w", global.clone());
        assert_eq!(local.phase(), Phase::Enter);

        let setups = counter();
        let s = setups.clone();
        local
            .add_service(Box::new(FnService::new("idle", Mode::IDLE).on_setup(move || {
                s.fetch_add(1, Ordering::Relaxed);
            })))
            .unwrap();

        assert_eq!(local.tick(), Tick::Continue);
        assert_eq!(setups.load(Ordering::Relaxed), 1);
        assert_eq!(global.running_count(), 1);
        assert_eq!(local.phase(), Phase::Run);
        assert!(global.is_settled());
    }

    #[test]
    fn set_mode_rejects_combinations() {
        let global = GlobalContext::new();
        assert_eq!(
            global.set_mode(Mode::IDLE | Mode::DRIVE),
            Err(SchedulerError::InvalidMode(Mode::IDLE | Mode::DRIVE))
        );
        assert!(global.set_mode(Mode::ALL).is_err());
        assert!(global.set_mode(Mode::empty()).is_err());
    }

    #[test]
    fn set_mode_without_workers_applies() {
        let global = GlobalContext::new();
        assert_eq!(global.set_mode(Mode::IDLE), Ok(ModeRequest::Unchanged));
        assert_eq!(global.set_mode(Mode::DRIVE), Ok(ModeRequest::Applied));
        assert_eq!(global.current_mode(), Mode::DRIVE);
        assert_eq!(global.previous_mode(), Mode::IDLE);
        // Transition in flight.
        assert_eq!(global.set_mode(Mode::IDLE), Ok(ModeRequest::Queued));
    }

    #[test]
    fn halt_is_applied_mid_transition_and_drops_pending() {
        let global = GlobalContext::new();
        global.set_mode(Mode::DRIVE).unwrap();
        assert_eq!(global.set_mode(Mode::MUSIC), Ok(ModeRequest::Queued));
        assert_eq!(global.set_mode(Mode::HALT), Ok(ModeRequest::Applied));
        assert_eq!(global.current_mode(), Mode::HALT);
        assert_eq!(global.inner.lock().pending, None);
    }

    #[test]
    fn requests_before_first_enter_are_queued() {
        let global = Arc::new(GlobalContext::new());
        let mut local = LocalContext::new("w", global.clone());
        assert_eq!(global.set_mode(Mode::DRIVE), Ok(ModeRequest::Queued));
        assert_eq!(global.current_mode(), Mode::IDLE);

        local.tick(); // Enter completes the epoch and applies the request.
        assert_eq!(global.current_mode(), Mode::DRIVE);
        assert_eq!(local.phase(), Phase::Exit);
    }

    #[test]
    fn service_list_capacity() {
        let global = Arc::new(GlobalContext::new());
        let mut local = LocalContext::new("full", global);
        for i in 0..MAX_SERVICES {
            local
                .add_service(Box::new(FnService::new(format!("s{i}"), Mode::ALL)))
                .unwrap();
        }
        let err = local
            .add_service(Box::new(FnService::new("extra", Mode::ALL)))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::ServiceListFull { capacity: 32, .. }));
        assert_eq!(local.service_count(), MAX_SERVICES);
    }

    #[test]
    fn halt_stops_worker_and_refuses_changes() {
        let global = Arc::new(GlobalContext::new());
        let mut local = LocalContext::new("w", global.clone());
        local.tick();
        global.set_mode(Mode::HALT).unwrap();
        assert_eq!(local.tick(), Tick::Halt);
        assert_eq!(global.previous_mode(), Mode::HALT);
        assert_eq!(
            global.set_mode(Mode::IDLE),
            Err(SchedulerError::Halted(Mode::IDLE))
        );
    }

    #[test]
    fn snapshot_serializes_mode_names() {
        let global = GlobalContext::new();
        global.attach_worker();
        let json = serde_json::to_string(&global.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"{"current":"idle","previous":"idle","running_count":0,"workers":1}"#
        );
    }

    #[test]
    fn run_returns_report_on_halt() {
        let global = Arc::new(GlobalContext::new());
        let local = LocalContext::new("runner", global.clone());
        let g = global.clone();
        let handle = std::thread::spawn(move || local.run(PollPolicy::Yield));
        while global.running_count() == 0 {
            std::thread::yield_now();
        }
        g.set_mode(Mode::HALT).unwrap();
        let report = handle.join().unwrap();
        assert_eq!(report.name, "runner");
        assert!(report.stats.tick_count >= 2);
    }
}
