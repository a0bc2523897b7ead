//! Quantizes the 14-bit pitch wheel into five zones and only reports a key
//! when the wheel moves into a different zone.

use log::Level;

use crate::decoder::{DecoderState, Key};

/// Divisor for the 14-bit bend value. One past the real maximum, so the rest
/// position lands just under 0.5; the zone thresholds are tuned for this.
const BEND_SCALE: f32 = 16384.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BendBucket {
    UpFull,
    UpHalf,
    #[default]
    Zero,
    DownHalf,
    DownFull,
}

impl BendBucket {
    /// Zone for a normalized wheel position. First match wins.
    pub fn from_fraction(f: f32) -> Self {
        if f > 0.9 {
            BendBucket::UpFull
        } else if f > 0.6 {
            BendBucket::UpHalf
        } else if f < 0.1 {
            BendBucket::DownFull
        } else if f < 0.4 {
            BendBucket::DownHalf
        } else {
            BendBucket::Zero
        }
    }

    pub fn from_data(lsb: u8, msb: u8) -> Self {
        Self::from_fraction(f32::from(raw_value(lsb, msb)) / BEND_SCALE)
    }

    pub fn key(self) -> Key {
        match self {
            BendBucket::UpFull => Key::BEND_UP_FULL,
            BendBucket::UpHalf => Key::BEND_UP_HALF,
            BendBucket::Zero => Key::BEND_ZERO,
            BendBucket::DownHalf => Key::BEND_DOWN_HALF,
            BendBucket::DownFull => Key::BEND_DOWN_FULL,
        }
    }
}

/// Combines the two 7-bit data bytes, `0..=16383`.
pub fn raw_value(lsb: u8, msb: u8) -> u16 {
    (u16::from(msb & 0x7F) << 7) + u16::from(lsb & 0x7F)
}

/// Returns the zone key on a zone change, `None` while the wheel stays put.
pub fn quantize(data1: u8, data2: u8, state: &mut DecoderState, diag: Level) -> Option<Key> {
    let bucket = BendBucket::from_data(data1, data2);
    if bucket == state.last_bend {
        return None;
    }
    state.last_bend = bucket;
    log::log!(
        diag,
        "Bend moved to {:?} ({})",
        bucket,
        raw_value(data1, data2)
    );
    Some(bucket.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn split(value: u16) -> (u8, u8) {
        ((value & 0x7F) as u8, (value >> 7) as u8)
    }

    fn bucket_of(value: u16) -> BendBucket {
        let (lsb, msb) = split(value);
        BendBucket::from_data(lsb, msb)
    }

    #[test]
    fn representative_positions() {
        assert_eq!(BendBucket::from_fraction(0.95), BendBucket::UpFull);
        assert_eq!(BendBucket::from_fraction(0.75), BendBucket::UpHalf);
        assert_eq!(BendBucket::from_fraction(0.5), BendBucket::Zero);
        assert_eq!(BendBucket::from_fraction(0.25), BendBucket::DownHalf);
        assert_eq!(BendBucket::from_fraction(0.05), BendBucket::DownFull);
    }

    #[test]
    fn exact_thresholds_fall_through() {
        assert_eq!(BendBucket::from_fraction(0.9), BendBucket::UpHalf);
        assert_eq!(BendBucket::from_fraction(0.6), BendBucket::Zero);
        assert_eq!(BendBucket::from_fraction(0.4), BendBucket::Zero);
        assert_eq!(BendBucket::from_fraction(0.1), BendBucket::DownHalf);
    }

    #[test]
    fn raw_values_either_side_of_each_threshold() {
        assert_eq!(bucket_of(14745), BendBucket::UpHalf);
        assert_eq!(bucket_of(14746), BendBucket::UpFull);
        assert_eq!(bucket_of(9830), BendBucket::Zero);
        assert_eq!(bucket_of(9831), BendBucket::UpHalf);
        assert_eq!(bucket_of(6553), BendBucket::DownHalf);
        assert_eq!(bucket_of(6554), BendBucket::Zero);
        assert_eq!(bucket_of(1638), BendBucket::DownFull);
        assert_eq!(bucket_of(1639), BendBucket::DownHalf);
    }

    #[test]
    fn wheel_extremes_and_rest() {
        assert_eq!(bucket_of(0), BendBucket::DownFull);
        assert_eq!(bucket_of(8192), BendBucket::Zero);
        assert_eq!(bucket_of(16383), BendBucket::UpFull);
    }

    #[test]
    fn combines_lsb_and_msb() {
        assert_eq!(raw_value(0x00, 0x40), 8192);
        assert_eq!(raw_value(0x7F, 0x7F), 16383);
        assert_eq!(raw_value(0x01, 0x00), 1);
    }

    #[test]
    fn starts_at_rest_so_centre_is_silent() {
        let mut state = DecoderState::default();
        let (lsb, msb) = split(8192);
        assert_eq!(quantize(lsb, msb, &mut state, Level::Debug), None);
    }

    #[test]
    fn fires_once_per_transition() {
        let mut state = DecoderState::default();
        let mut fired = Vec::new();
        for value in [8192u16, 10000, 11000, 12000, 15000, 16383, 16000, 8192] {
            let (lsb, msb) = split(value);
            if let Some(key) = quantize(lsb, msb, &mut state, Level::Debug) {
                fired.push(key);
            }
        }
        assert_eq!(
            fired,
            vec![Key::BEND_UP_HALF, Key::BEND_UP_FULL, Key::BEND_ZERO]
        );
    }

    proptest! {
        #[test]
        fn same_zone_emits_at_most_once(values in prop::collection::vec(0u16..1638, 1..50)) {
            let mut state = DecoderState::default();
            let emitted = values
                .iter()
                .filter(|&&v| {
                    let (lsb, msb) = split(v);
                    quantize(lsb, msb, &mut state, Level::Debug).is_some()
                })
                .count();
            prop_assert_eq!(emitted, 1);
            prop_assert_eq!(state.last_bend, BendBucket::DownFull);
        }

        #[test]
        fn emits_only_when_zone_changes(values in prop::collection::vec(0u16..16384, 1..100)) {
            let mut state = DecoderState::default();
            let mut previous = BendBucket::Zero;
            for v in values {
                let (lsb, msb) = split(v);
                let current = bucket_of(v);
                let fired = quantize(lsb, msb, &mut state, Level::Debug);
                prop_assert_eq!(fired.is_some(), current != previous);
                previous = current;
            }
        }
    }
}
