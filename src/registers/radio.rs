//! Radio and power registers
//!
//! This module contains registers controlling how the node uses its radio:
//! - operating frequency (radio channel) and transmit power
//! - boot mode and inactivity/check-radio timers
//! - the power control register used to cycle power or reset the radio
//!
//! Frequency and transmit power changes only take effect after the radio is
//! reset.

use core::convert::Infallible;
use core::fmt;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Error type for frequency conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidFrequency(pub u16);

/// Radio frequency register (address: 0x005A)
///
/// Holds the 2.4 GHz channel number the node listens on.
///
/// # Important Notes
/// - Valid channels are 11 through 26
/// - Channel 11 is 2.405 GHz, each following channel adds 5 MHz
/// - The radio must be reset before a new channel takes effect
#[register(0x005Au16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Frequency {
    /// 2.4 GHz channel number
    pub channel: u8,
}

impl Frequency {
    /// Lowest channel the radio tunes to (2.405 GHz)
    pub const MIN: Frequency = Frequency { channel: 11 };
    /// Highest channel the radio tunes to (2.480 GHz)
    pub const MAX: Frequency = Frequency { channel: 26 };

    /// Creates a frequency from a channel number, without range checking.
    pub const fn new(channel: u8) -> Self {
        Self { channel }
    }

    /// Whether the channel lies in the range the radio can tune to.
    pub fn is_valid(&self) -> bool {
        (Self::MIN.channel..=Self::MAX.channel).contains(&self.channel)
    }

    /// Centre frequency in MHz, for valid channels.
    pub fn mhz(&self) -> Option<u32> {
        self.is_valid()
            .then(|| 2405 + 5 * u32::from(self.channel - Self::MIN.channel))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mhz() {
            Some(mhz) => write!(f, "channel {} ({mhz} MHz)", self.channel),
            None => write!(f, "channel {}", self.channel),
        }
    }
}

/// Error type for transmit power conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransmitPower(pub u16);

/// Transmit power register (address: 0x0026)
///
/// Stored as the output power in dBm.
#[register(0x0026u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub enum TransmitPower {
    /// +20 dBm
    Dbm20,
    /// +16 dBm
    Dbm16,
    /// +10 dBm
    Dbm10,
    /// +5 dBm
    Dbm5,
    /// 0 dBm
    Dbm0,
}

impl TransmitPower {
    /// Converts a dBm value to a power level.
    ///
    /// # Errors
    /// * `InvalidTransmitPower` - the node has no level for `dbm`
    pub fn from_dbm(dbm: u16) -> Result<Self, InvalidTransmitPower> {
        match dbm {
            20 => Ok(Self::Dbm20),
            16 => Ok(Self::Dbm16),
            10 => Ok(Self::Dbm10),
            5 => Ok(Self::Dbm5),
            0 => Ok(Self::Dbm0),
            invalid => Err(InvalidTransmitPower(invalid)),
        }
    }

    /// Output power in dBm.
    pub fn dbm(self) -> u16 {
        match self {
            Self::Dbm20 => 20,
            Self::Dbm16 => 16,
            Self::Dbm10 => 10,
            Self::Dbm5 => 5,
            Self::Dbm0 => 0,
        }
    }
}

/// Error type for default mode conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDefaultMode(pub u16);

/// Default (boot) mode register (address: 0x0020)
///
/// Mode the node enters after power-up.
#[register(0x0020u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub enum DefaultMode {
    /// Wait for commands
    Idle,
    /// Sample at a low rate and transmit as it goes
    LowDutyCycle,
    /// Log to on-board memory
    Datalog,
    /// Sleep, waking every check-radio interval
    Sleep,
    /// Resume synchronized sampling
    SyncSampling,
}

impl DefaultMode {
    /// Decodes the value stored in the register.
    pub fn from_code(code: u16) -> Result<Self, InvalidDefaultMode> {
        match code {
            0 => Ok(Self::Idle),
            1 => Ok(Self::LowDutyCycle),
            2 => Ok(Self::Datalog),
            5 => Ok(Self::Sleep),
            6 => Ok(Self::SyncSampling),
            invalid => Err(InvalidDefaultMode(invalid)),
        }
    }

    /// Value stored in the register.
    pub fn code(self) -> u16 {
        match self {
            Self::Idle => 0,
            Self::LowDutyCycle => 1,
            Self::Datalog => 2,
            Self::Sleep => 5,
            Self::SyncSampling => 6,
        }
    }
}

/// Inactivity timeout register (address: 0x0022)
///
/// Seconds of radio silence after which an idle node goes to sleep.
#[register(0x0022u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct InactivityTimeout {
    /// Timeout in seconds
    pub seconds: u16,
}

impl InactivityTimeout {
    /// Shortest timeout the firmware honours.
    pub const MIN_SECONDS: u16 = 5;
}

/// Error type for check radio interval conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCheckRadioInterval(pub u16);

/// Check radio interval register (address: 0x0024)
///
/// Seconds between wake-ups of a sleeping node to listen for commands.
#[register(0x0024u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct CheckRadioInterval {
    /// Interval in seconds
    pub seconds: u8,
}

impl CheckRadioInterval {
    /// Shortest interval the firmware accepts
    pub const MIN_SECONDS: u8 = 1;
    /// Longest interval the firmware accepts
    pub const MAX_SECONDS: u8 = 60;
}

/// Lost beacon timeout register (address: 0x001E)
///
/// Minutes without a sync beacon before a synchronized node stops sampling.
/// Zero disables the timeout.
#[register(0x001Eu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct LostBeaconTimeout {
    /// Timeout in minutes, or [`LostBeaconTimeout::DISABLED`]
    pub minutes: u16,
}

impl LostBeaconTimeout {
    /// Turns the timeout off
    pub const DISABLED: u16 = 0;
    pub const MIN_MINUTES: u16 = 2;
    pub const MAX_MINUTES: u16 = 600;
}

/// Power control register (address: 0x00FA)
///
/// Write-only command register. Writing a sentinel value triggers the
/// corresponding action on the node.
#[register(0x00FAu16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub enum PowerControl {
    /// Power-cycle the whole node
    CyclePower,
    /// Reset only the radio, committing radio settings
    ResetRadio,
}

impl PowerControl {
    pub const CYCLE_POWER: u16 = 0x01;
    pub const RESET_RADIO: u16 = 0x02;

    /// Value written to trigger the action.
    pub fn sentinel(self) -> u16 {
        match self {
            Self::CyclePower => Self::CYCLE_POWER,
            Self::ResetRadio => Self::RESET_RADIO,
        }
    }
}

impl FromByteArray for Frequency {
    type Error = InvalidFrequency;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        match bytes {
            [0x00, channel] => Ok(Self { channel }),
            _ => Err(InvalidFrequency(u16::from_be_bytes(bytes))),
        }
    }
}

impl ToByteArray for Frequency {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(u16::from(self.channel).to_be_bytes())
    }
}

impl FromByteArray for TransmitPower {
    type Error = InvalidTransmitPower;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_dbm(u16::from_be_bytes(bytes))
    }
}

impl ToByteArray for TransmitPower {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.dbm().to_be_bytes())
    }
}

impl FromByteArray for DefaultMode {
    type Error = InvalidDefaultMode;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Self::from_code(u16::from_be_bytes(bytes))
    }
}

impl ToByteArray for DefaultMode {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.code().to_be_bytes())
    }
}

impl FromByteArray for InactivityTimeout {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            seconds: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for InactivityTimeout {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.seconds.to_be_bytes())
    }
}

impl FromByteArray for CheckRadioInterval {
    type Error = InvalidCheckRadioInterval;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        match bytes {
            [0x00, seconds] => Ok(Self { seconds }),
            _ => Err(InvalidCheckRadioInterval(u16::from_be_bytes(bytes))),
        }
    }
}

impl ToByteArray for CheckRadioInterval {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([0x00, self.seconds])
    }
}

impl FromByteArray for LostBeaconTimeout {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            minutes: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for LostBeaconTimeout {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.minutes.to_be_bytes())
    }
}

impl ToByteArray for PowerControl {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.sentinel().to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_range_and_display() {
        assert!(Frequency::new(11).is_valid());
        assert!(Frequency::new(26).is_valid());
        assert!(!Frequency::new(10).is_valid());
        assert!(!Frequency::new(27).is_valid());
        assert_eq!(Frequency::new(15).mhz(), Some(2425));
        assert_eq!(Frequency::new(15).to_string(), "channel 15 (2425 MHz)");
    }

    #[test]
    fn single_byte_registers_reject_a_set_high_byte() {
        assert_eq!(Frequency::from_bytes([0x00, 0x10]), Ok(Frequency::new(16)));
        assert_eq!(Frequency::from_bytes([0x01, 0x10]), Err(InvalidFrequency(0x0110)));
        assert_eq!(
            CheckRadioInterval::from_bytes([0x00, 0x05]),
            Ok(CheckRadioInterval { seconds: 5 })
        );
        assert_eq!(
            CheckRadioInterval::from_bytes([0x80, 0x05]),
            Err(InvalidCheckRadioInterval(0x8005))
        );
    }

    #[test]
    fn power_control_sentinels_are_distinct() {
        assert_eq!(PowerControl::CyclePower.to_bytes().unwrap(), [0x00, 0x01]);
        assert_eq!(PowerControl::ResetRadio.to_bytes().unwrap(), [0x00, 0x02]);
    }

    #[test]
    fn default_mode_codes_round_trip() {
        for mode in [
            DefaultMode::Idle,
            DefaultMode::LowDutyCycle,
            DefaultMode::Datalog,
            DefaultMode::Sleep,
            DefaultMode::SyncSampling,
        ] {
            assert_eq!(DefaultMode::from_code(mode.code()), Ok(mode));
        }
        assert_eq!(DefaultMode::from_code(3), Err(InvalidDefaultMode(3)));
    }
}
