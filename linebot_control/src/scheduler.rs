//! Mode scheduler.
//!
//! Each worker thread owns a [`LocalContext`] holding an ordered list of
//! [`Service`]s. All workers share one [`GlobalContext`] holding the current
//! operating mode. On every tick a worker compares the global and its local
//! view of the mode and derives a [`Phase`]:
//!
//! ```text
//!  set_mode(Drive)
//!        │
//!        ▼
//!   ┌─────────┐  teardowns,   ┌─────────┐  last worker out  ┌─────────┐
//!   │   Run   │ ────────────► │ Overlap │ ────────────────► │  Enter  │
//!   │ (Idle)  │  count − 1    │ (wait)  │  previous:=Drive  │ setups, │
//!   └─────────┘    (Exit)     └─────────┘                   │count + 1│
//!        ▲                                                  └────┬────┘
//!        └──────────────────────  Run (Drive)  ◄─────────────────┘
//! ```
//!
//! Teardowns are decided against the global modes, setups against the local
//! ones. Services whose mask covers both the old and the new mode keep
//! cycling through the whole transition and see neither.
//!
//! The local `current` follows the global one at two points: after the
//! worker's teardowns in `Exit` and before its setups in `Enter`. Mode
//! requests made while a transition is in flight are queued and applied by
//! the worker whose `Enter` completes the epoch, so no worker ever skips a
//! teardown.

mod context;
mod phase;
mod service;
mod stats;

pub use context::{
    GlobalContext, GlobalSnapshot, LocalContext, MAX_SERVICES, ModeRequest, PollPolicy, Tick,
    WorkerReport,
};
pub use phase::Phase;
pub use service::{FnService, Service};
pub use stats::TickStats;
