//! Fatigue and histogram registers
//!
//! Structural health monitoring nodes compute fatigue damage and rainflow
//! histograms on board. Their options are stored as multi-word register
//! blocks, which makes them a good fit for grouped reads.
//!
//! These registers only exist on nodes whose feature model reports fatigue
//! or histogram support.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Fatigue options block (address: 0x0300, 7 words)
#[register(0x0300u16)]
#[derive(Debug, Clone, Copy, PartialEq, ReadableRegister, WritableRegister)]
pub struct FatigueOptions {
    /// Young's modulus of the monitored material, in Pa
    pub young_modulus: f32,
    /// Poisson's ratio of the monitored material
    pub poissons_ratio: f32,
    /// Minimum peak-to-valley amplitude counted as a cycle, in microstrain
    pub peak_valley_threshold: u16,
    /// Transmit raw strain alongside fatigue results
    pub raw_mode: bool,
    pub debug_mode: bool,
}

/// Histogram options block (address: 0x0320, 3 words)
#[register(0x0320u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct HistogramOptions {
    /// Histogram transmit rate code
    pub transmit_rate: u16,
    /// Lower edge of the first bin, in microstrain
    pub bin_start: u16,
    /// Width of each bin, in microstrain
    pub bin_size: u16,
}

/// Histogram control register (address: 0x0330)
///
/// Write-only. The node acts on the command at its next power cycle.
#[register(0x0330u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub enum HistogramControl {
    /// Zero every histogram bin
    Clear,
}

impl HistogramControl {
    pub const CLEAR: u16 = 0x01;
}

impl FromByteArray for FatigueOptions {
    type Error = Infallible;
    type Array = [u8; 14];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            young_modulus: f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            poissons_ratio: f32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            peak_valley_threshold: u16::from_be_bytes([bytes[8], bytes[9]]),
            raw_mode: u16::from_be_bytes([bytes[10], bytes[11]]) != 0,
            debug_mode: u16::from_be_bytes([bytes[12], bytes[13]]) != 0,
        })
    }
}

impl ToByteArray for FatigueOptions {
    type Error = Infallible;
    type Array = [u8; 14];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 14];
        bytes[0..4].copy_from_slice(&self.young_modulus.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.poissons_ratio.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.peak_valley_threshold.to_be_bytes());
        bytes[10..12].copy_from_slice(&u16::from(self.raw_mode).to_be_bytes());
        bytes[12..14].copy_from_slice(&u16::from(self.debug_mode).to_be_bytes());
        Ok(bytes)
    }
}

impl FromByteArray for HistogramOptions {
    type Error = Infallible;
    type Array = [u8; 6];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            transmit_rate: u16::from_be_bytes([bytes[0], bytes[1]]),
            bin_start: u16::from_be_bytes([bytes[2], bytes[3]]),
            bin_size: u16::from_be_bytes([bytes[4], bytes[5]]),
        })
    }
}

impl ToByteArray for HistogramOptions {
    type Error = Infallible;
    type Array = [u8; 6];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 6];
        bytes[0..2].copy_from_slice(&self.transmit_rate.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.bin_start.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.bin_size.to_be_bytes());
        Ok(bytes)
    }
}

impl ToByteArray for HistogramControl {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        match self {
            Self::Clear => Ok(Self::CLEAR.to_be_bytes()),
        }
    }
}
