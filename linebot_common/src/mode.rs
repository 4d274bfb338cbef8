//! Operating mode bitset.
//!
//! Exactly one mode is current at any instant; services declare the set of
//! modes they take part in by OR-ing flags together.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Operating mode mask.
    ///
    /// `ALL` covers every mode except `HALT`, so a catch-all service keeps
    /// running across ordinary transitions but is torn down on halt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mode: u32 {
        const IDLE           = 1 << 0;
        const CALIBRATE_LOW  = 1 << 1;
        const CALIBRATE_HIGH = 1 << 2;
        const DRIVE          = 1 << 3;
        const MUSIC          = 1 << 4;
        const HALT           = 1 << 5;

        const ALL = Self::IDLE.bits()
            | Self::CALIBRATE_LOW.bits()
            | Self::CALIBRATE_HIGH.bits()
            | Self::DRIVE.bits()
            | Self::MUSIC.bits();
    }
}

impl Mode {
    /// True if this value names exactly one mode.
    #[inline]
    pub const fn is_single(self) -> bool {
        self.bits().count_ones() == 1 && Self::all().contains(self)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::IDLE
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("all");
        }
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            f.write_str(&name.to_ascii_lowercase())?;
        }
        Ok(())
    }
}
