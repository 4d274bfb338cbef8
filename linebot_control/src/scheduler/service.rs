//! Service capability interface.

use linebot_common::mode::Mode;

/// A unit of work the scheduler starts, runs and stops by mode.
///
/// All three callbacks are optional; the defaults do nothing. Callbacks run
/// on the owning worker's thread. A panicking callback unwinds that worker
/// and takes its remaining services with it; sibling workers keep running.
pub trait Service: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Modes during which this service is active.
    fn mask(&self) -> Mode;

    /// Called once when the worker enters a mode in `mask` from one outside it.
    fn setup(&mut self) {}

    /// Called on every tick while active.
    fn cycle(&mut self) {}

    /// Called once when the global mode leaves `mask`.
    fn teardown(&mut self) {}
}

type Callback = Box<dyn FnMut() + Send>;

/// Service assembled from closures.
///
/// ```rust
/// use linebot_common::mode::Mode;
/// use linebot_control::scheduler::{FnService, Service};
///
/// let mut blink = FnService::new("blink", Mode::IDLE).on_cycle(|| {});
/// assert_eq!(blink.mask(), Mode::IDLE);
/// blink.setup(); // no setup registered: no-op
/// ```
pub struct FnService {
    name: String,
    mask: Mode,
    setup: Option<Callback>,
    cycle: Option<Callback>,
    teardown: Option<Callback>,
}

impl FnService {
    pub fn new(name: impl Into<String>, mask: Mode) -> Self {
        Self {
            name: name.into(),
            mask,
            setup: None,
            cycle: None,
            teardown: None,
        }
    }

    pub fn on_setup(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.setup = Some(Box::new(f));
        self
    }

    pub fn on_cycle(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.cycle = Some(Box::new(f));
        self
    }

    pub fn on_teardown(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.teardown = Some(Box::new(f));
        self
    }
}

impl Service for FnService {
    fn name(&self) -> &str {
        &self.name
    }

    fn mask(&self) -> Mode {
        self.mask
    }

    fn setup(&mut self) {
        if let Some(f) = self.setup.as_mut() {
            f();
        }
    }

    fn cycle(&mut self) {
        if let Some(f) = self.cycle.as_mut() {
            f();
        }
    }

    fn teardown(&mut self) {
        if let Some(f) = self.teardown.as_mut() {
            f();
        }
    }
}
