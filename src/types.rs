//! Small value types shared by every layer of the driver.

use core::fmt;

use bitflags::bitflags;

/// Address of a node on its base station's network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress(pub u16);

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for NodeAddress {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Firmware version of a node.
///
/// Ordered by major, then minor, so threshold checks read naturally:
/// `version >= Version::new(8, 21)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

bitflags! {
    /// Set of physical channels a setting applies to.
    ///
    /// Bit `n - 1` selects channel `n`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChannelMask: u16 {
        const CH1 = 1 << 0;
        const CH2 = 1 << 1;
        const CH3 = 1 << 2;
        const CH4 = 1 << 3;
        const CH5 = 1 << 4;
        const CH6 = 1 << 5;
        const CH7 = 1 << 6;
        const CH8 = 1 << 7;
        const CH9 = 1 << 8;
        const CH10 = 1 << 9;
        const CH11 = 1 << 10;
        const CH12 = 1 << 11;
        const CH13 = 1 << 12;
        const CH14 = 1 << 13;
        const CH15 = 1 << 14;
        const CH16 = 1 << 15;
    }
}

impl ChannelMask {
    /// Mask selecting the single channel `number` (1-based).
    ///
    /// Channel numbers outside 1..=16 yield an empty mask.
    pub fn channel(number: u8) -> Self {
        match number {
            1..=16 => Self::from_bits_retain(1 << (number - 1)),
            _ => Self::empty(),
        }
    }

    /// Mask selecting channels `1..=count`.
    pub fn first(count: u8) -> Self {
        (1..=count).fold(Self::empty(), |mask, ch| mask | Self::channel(ch))
    }

    /// Whether channel `number` (1-based) is selected.
    pub fn is_enabled(&self, number: u8) -> bool {
        let single = Self::channel(number);
        !single.is_empty() && self.contains(single)
    }

    /// Iterates the selected channel numbers in ascending order.
    pub fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=16u8).filter(move |ch| self.is_enabled(*ch))
    }

    /// Lowest selected channel number, if any.
    pub fn lowest(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.bits().trailing_zeros() as u8 + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_compare_by_major_then_minor() {
        assert!(Version::new(8, 21) > Version::new(8, 9));
        assert!(Version::new(9, 0) > Version::new(8, 99));
        assert_eq!(Version::new(8, 5).to_string(), "8.05");
    }

    #[test]
    fn channel_mask_helpers() {
        assert_eq!(ChannelMask::channel(3), ChannelMask::CH3);
        assert!(ChannelMask::channel(0).is_empty());
        assert!(ChannelMask::channel(17).is_empty());

        let mask = ChannelMask::first(3);
        assert_eq!(mask, ChannelMask::CH1 | ChannelMask::CH2 | ChannelMask::CH3);
        assert_eq!(mask.channels().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!mask.is_enabled(4));
        assert_eq!((ChannelMask::CH4 | ChannelMask::CH9).lowest(), Some(4));
        assert_eq!(ChannelMask::empty().lowest(), None);
    }
}
