//! Register definitions for wireless nodes
//!
//! A node stores its configuration in an address-mapped EEPROM made of 16-bit
//! words at even byte addresses. Each well-known location is modelled as a
//! `regiface` register keyed by its byte address; values wider than one word
//! occupy consecutive words, most significant word first.
//!
//! Per-channel settings (gain, offset, calibration) have no fixed address:
//! their location depends on the node model and is resolved through
//! [`FeatureModel::locate`](crate::FeatureModel::locate). Their value types
//! live in [`channel`].

use core::convert::Infallible;

use regiface::{ByteArray, FromByteArray, ToByteArray};

use crate::{Error, Result};

pub mod channel;
mod diagnostics;
mod identity;
mod radio;
mod sampling;

pub use diagnostics::*;
pub use identity::*;
pub use radio::*;
pub use sampling::*;

/// Byte address of a 16-bit word in the node's register space.
pub type RegisterLocation = u16;

/// Number of bytes in one register word.
pub const WORD_SIZE: u16 = 2;

/// Number of words a value of type `T` spans.
pub fn word_count<T: FromByteArray>() -> usize {
    let mut raw = T::Array::new();
    let bytes: &mut [u8] = raw.as_mut();
    (bytes.len() + 1) / 2
}

/// Word addresses covered by a `count`-word value starting at `location`.
///
/// # Errors
/// * `Error::OutOfRange` - the words would run past the end of the 16-bit
///   register space
pub fn word_locations(location: RegisterLocation, count: usize) -> Result<Vec<RegisterLocation>> {
    let available = usize::from(u16::MAX - location) / usize::from(WORD_SIZE) + 1;
    let out_of_range = || Error::OutOfRange {
        name: "word count",
        value: u32::try_from(count).unwrap_or(u32::MAX),
        min: 0,
        max: available as u32,
    };
    if count > available {
        return Err(out_of_range());
    }

    (0..count)
        .map(|i| {
            u16::try_from(i)
                .ok()
                .and_then(|i| i.checked_mul(WORD_SIZE))
                .and_then(|offset| location.checked_add(offset))
                .ok_or_else(out_of_range)
        })
        .collect()
}

/// Decodes a value from the words read at `location`.
pub fn decode<T: FromByteArray>(location: RegisterLocation, words: &[u16]) -> Result<T> {
    let mut raw = T::Array::new();
    let bytes: &mut [u8] = raw.as_mut();
    if words.len() * 2 < bytes.len() {
        return Err(Error::MalformedResponse(format!(
            "expected {} bytes at {location:#06x}, got {} words",
            bytes.len(),
            words.len()
        )));
    }

    for (chunk, word) in bytes.chunks_mut(2).zip(words) {
        let be = word.to_be_bytes();
        let len = chunk.len();
        chunk.copy_from_slice(&be[..len]);
    }

    T::from_bytes(raw).map_err(|_| {
        Error::MalformedResponse(format!("invalid value {words:04x?} at {location:#06x}"))
    })
}

/// Encodes a value into the words to write starting at its location.
pub fn encode<T: ToByteArray<Error = Infallible>>(value: T) -> Vec<u16> {
    let raw = value.to_bytes().unwrap_or_else(|never| match never {});
    let bytes: &[u8] = raw.as_ref();
    bytes
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], c.get(1).copied().unwrap_or(0)]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelMask, Version};

    #[test]
    fn word_layout_is_big_endian_across_consecutive_words() {
        let sweeps = NumSweeps { sweeps: 0x0001_E240 };
        assert_eq!(encode(sweeps), vec![0x0001, 0xE240]);
        assert_eq!(word_count::<SerialNumber>(), 2);
        assert_eq!(word_locations(0x0074, 2).unwrap(), vec![0x0074, 0x0076]);

        let back: SerialNumber = decode(0x0074, &[0x0001, 0xE240]).unwrap();
        assert_eq!(back.value, 123_456);
    }

    #[test]
    fn word_spans_stay_inside_the_register_space() {
        assert_eq!(word_locations(0xFFFC, 2).unwrap(), vec![0xFFFC, 0xFFFE]);
        assert_eq!(word_locations(0x0000, 32_768).unwrap().len(), 32_768);
        assert!(word_locations(0x0010, 0).unwrap().is_empty());

        for (location, count) in [(0xFFFC, 3), (0x0000, 32_769), (0x0000, 40_000), (0x0000, 65_536)] {
            assert!(matches!(
                word_locations(location, count),
                Err(Error::OutOfRange { name: "word count", .. })
            ));
        }
    }

    #[test]
    fn firmware_version_packs_major_and_minor() {
        let fw: FirmwareVersion = decode(0x006C, &[0x0815]).unwrap();
        assert_eq!(fw.version, Version::new(8, 21));
    }

    #[test]
    fn decoding_rejects_short_or_invalid_data() {
        assert!(matches!(
            decode::<SerialNumber>(0x0074, &[0x0001]),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            decode::<SamplingMode>(0x000E, &[0x00FF]),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn active_channels_round_trip_through_a_word() {
        let words = encode(ActiveChannels {
            mask: ChannelMask::CH1 | ChannelMask::CH3,
        });
        assert_eq!(words, vec![0x0005]);
    }
}
