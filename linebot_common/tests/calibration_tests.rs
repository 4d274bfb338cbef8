//! Calibration file round-trip and corruption tests.
//!
//! Saves arbitrary bounds to a real file, reads them back, and checks that
//! flipping any single byte of the saved blob makes the load fail closed.

use linebot_common::calibration::{CALIBRATION_LEN, Calibration, CalibrationError};
use linebot_common::consts::NUM_SENSORS;
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn calibration_strategy() -> impl Strategy<Value = Calibration> {
    (
        prop::array::uniform16(any::<u16>()),
        prop::array::uniform16(any::<u16>()),
    )
        .prop_map(|(low, high)| Calibration { low, high })
}

#[test]
fn save_then_load_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.bin");

    let mut cal = Calibration::default();
    for i in 0..NUM_SENSORS {
        cal.low[i] = 200 + i as u16 * 3;
        cal.high[i] = 3900 - i as u16 * 5;
    }
    cal.save(&path).unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), CALIBRATION_LEN as u64);
    assert_eq!(Calibration::load(&path).unwrap(), cal);
    assert_eq!(Calibration::load_or_uncalibrated(&path), Some(cal));
    // The temporary file used during save is gone.
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn missing_file_is_uncalibrated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.bin");

    assert!(matches!(
        Calibration::load(&path),
        Err(CalibrationError::Io(_))
    ));
    assert_eq!(Calibration::load_or_uncalibrated(&path), None);
}

#[test]
fn truncated_file_is_uncalibrated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.bin");
    let blob = Calibration::default().encode();
    fs::write(&path, &blob[..40]).unwrap();

    assert_eq!(Calibration::load_or_uncalibrated(&path), None);
}

proptest! {
    #[test]
    fn roundtrip_preserves_bounds(cal in calibration_strategy()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.bin");
        cal.save(&path).unwrap();
        prop_assert_eq!(Calibration::load(&path).unwrap(), cal);
    }

    #[test]
    fn any_single_byte_corruption_fails_closed(
        cal in calibration_strategy(),
        index in 0..CALIBRATION_LEN,
        flip in 1u8..=255,
    ) {
        let mut blob = cal.encode();
        blob[index] ^= flip;
        prop_assert!(Calibration::decode(&blob).is_err());
    }
}
