//! Per-tick phase derivation.

use std::fmt;

/// What a worker does on one tick.
///
/// | global changed | local changed | Phase |
/// |---|---|---|
/// | no | no | `Run` |
/// | no | yes | `Enter` |
/// | yes | no | `Exit` |
/// | yes | yes | `Overlap` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Steady state: cycle every active service.
    Run,
    /// Epoch released: set up newly active services, rejoin the count.
    Enter,
    /// Global mode changed: tear down leaving services, leave the count.
    Exit,
    /// Waiting at the barrier: cycle services active in both modes.
    Overlap,
}

impl Phase {
    #[inline]
    pub const fn derive(global_changed: bool, local_changed: bool) -> Self {
        match (global_changed, local_changed) {
            (false, false) => Self::Run,
            (false, true) => Self::Enter,
            (true, false) => Self::Exit,
            (true, true) => Self::Overlap,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Run => "run",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Overlap => "overlap",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_table() {
        assert_eq!(Phase::derive(false, false), Phase::Run);
        assert_eq!(Phase::derive(false, true), Phase::Enter);
        assert_eq!(Phase::derive(true, false), Phase::Exit);
        assert_eq!(Phase::derive(true, true), Phase::Overlap);
    }
}
