//! Sensor calibration bounds and their on-disk layout.
//!
//! # File layout
//!
//! | Offset | Size | Content |
//! |--------|------|---------|
//! | 0 | 4 | Magic `"CALI"` |
//! | 4 | 32 | Low bound per channel, `u16` little-endian |
//! | 36 | 32 | High bound per channel, `u16` little-endian |
//! | 68 | 1 | Sum of bytes `0..68`, modulo 256 |
//!
//! A blob that fails any check is rejected as a whole; callers treat the
//! vehicle as uncalibrated rather than using partial bounds.

use crate::consts::NUM_SENSORS;
use static_assertions::const_assert_eq;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Magic bytes at the start of a calibration file.
pub const CALIBRATION_MAGIC: [u8; 4] = *b"CALI";

/// Total length of an encoded calibration blob.
pub const CALIBRATION_LEN: usize = CALIBRATION_MAGIC.len() + NUM_SENSORS * 2 * 2 + 1;

const_assert_eq!(CALIBRATION_LEN, 69);

const LOW_OFFSET: usize = CALIBRATION_MAGIC.len();
const HIGH_OFFSET: usize = LOW_OFFSET + NUM_SENSORS * 2;
const CHECKSUM_OFFSET: usize = HIGH_OFFSET + NUM_SENSORS * 2;

/// Errors produced while reading or writing calibration data.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("calibration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("calibration blob has {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("calibration magic mismatch")]
    BadMagic,

    #[error("calibration checksum mismatch (stored {stored:#04x}, computed {computed:#04x})")]
    Checksum { stored: u8, computed: u8 },
}

/// Per-channel raw readings over white (low) and black (high) surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calibration {
    pub low: [u16; NUM_SENSORS],
    pub high: [u16; NUM_SENSORS],
}

/// Byte sum modulo 256.
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

impl Calibration {
    /// True if channel `index` has a usable range (`high > low`).
    #[inline]
    pub fn channel_valid(&self, index: usize) -> bool {
        self.high[index] > self.low[index]
    }

    /// Serialize into the fixed 69-byte layout.
    pub fn encode(&self) -> [u8; CALIBRATION_LEN] {
        let mut out = [0u8; CALIBRATION_LEN];
        out[..LOW_OFFSET].copy_from_slice(&CALIBRATION_MAGIC);
        for i in 0..NUM_SENSORS {
            out[LOW_OFFSET + i * 2..LOW_OFFSET + i * 2 + 2]
                .copy_from_slice(&self.low[i].to_le_bytes());
            out[HIGH_OFFSET + i * 2..HIGH_OFFSET + i * 2 + 2]
                .copy_from_slice(&self.high[i].to_le_bytes());
        }
        out[CHECKSUM_OFFSET] = checksum(&out[..CHECKSUM_OFFSET]);
        out
    }

    /// Parse a blob produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// `Length` for a short or long blob, `BadMagic` if the magic does not
    /// match, `Checksum` if the trailing byte disagrees with the content.
    pub fn decode(bytes: &[u8]) -> Result<Self, CalibrationError> {
        if bytes.len() != CALIBRATION_LEN {
            return Err(CalibrationError::Length {
                expected: CALIBRATION_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[..LOW_OFFSET] != CALIBRATION_MAGIC {
            return Err(CalibrationError::BadMagic);
        }
        let stored = bytes[CHECKSUM_OFFSET];
        let computed = checksum(&bytes[..CHECKSUM_OFFSET]);
        if stored != computed {
            return Err(CalibrationError::Checksum { stored, computed });
        }

        let word = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let mut cal = Self::default();
        for i in 0..NUM_SENSORS {
            cal.low[i] = word(LOW_OFFSET + i * 2);
            cal.high[i] = word(HIGH_OFFSET + i * 2);
        }
        Ok(cal)
    }

    /// Write the encoded blob to `path`.
    ///
    /// The blob is written next to the target and renamed into place so a
    /// crash mid-write never leaves a truncated file behind.
    pub fn save(&self, path: &Path) -> Result<(), CalibrationError> {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.encode())?;
        std::fs::rename(&tmp, path)?;
        info!("Calibration saved to {}", path.display());
        Ok(())
    }

    /// Read and decode the blob at `path`.
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Load `path`, mapping every failure to `None` (uncalibrated).
    pub fn load_or_uncalibrated(path: &Path) -> Option<Self> {
        match Self::load(path) {
            Ok(cal) => {
                info!("Calibration loaded from {}", path.display());
                Some(cal)
            }
            Err(e) => {
                warn!("{}: {e}; running uncalibrated", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Calibration {
        let mut cal = Calibration::default();
        for i in 0..NUM_SENSORS {
            cal.low[i] = 100 + i as u16;
            cal.high[i] = 3000 + 7 * i as u16;
        }
        cal
    }

    #[test]
    fn encoded_layout() {
        let blob = sample().encode();
        assert_eq!(&blob[..4], b"CALI");
        // Channel 0 low = 100 = 0x0064, little-endian.
        assert_eq!(blob[4], 0x64);
        assert_eq!(blob[5], 0x00);
        // Channel 0 high = 3000 = 0x0BB8.
        assert_eq!(blob[36], 0xB8);
        assert_eq!(blob[37], 0x0B);
        assert_eq!(blob[68], checksum(&blob[..68]));
    }

    #[test]
    fn decode_roundtrip() {
        let cal = sample();
        assert_eq!(Calibration::decode(&cal.encode()).unwrap(), cal);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut blob = sample().encode();
        blob[0] = b'X';
        // Keep the checksum consistent so only the magic is wrong.
        blob[68] = checksum(&blob[..68]);
        assert!(matches!(
            Calibration::decode(&blob),
            Err(CalibrationError::BadMagic)
        ));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let mut blob = sample().encode();
        blob[68] = blob[68].wrapping_add(1);
        assert!(matches!(
            Calibration::decode(&blob),
            Err(CalibrationError::Checksum { .. })
        ));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let blob = sample().encode();
        assert!(matches!(
            Calibration::decode(&blob[..68]),
            Err(CalibrationError::Length { actual: 68, .. })
        ));
    }

    #[test]
    fn channel_validity() {
        let mut cal = Calibration::default();
        assert!(!cal.channel_valid(0));
        cal.high[0] = 10;
        assert!(cal.channel_valid(0));
        cal.low[0] = 10;
        assert!(!cal.channel_valid(0));
    }
}
