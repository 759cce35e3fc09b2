//! Protocol dialect negotiation
//!
//! Node firmware speaks one of two register-access dialects and there is no
//! way to ask which: the only test is to try. [`negotiate`] probes the node by
//! reading its firmware version, newest dialect first, within a bounded number
//! of rounds:
//!
//! ```text
//! round 0..=retries:
//!     v1.1 probe ──ok──▶ done
//!        │ communication error
//!        ▼
//!     v1.0 probe ──ok──▶ done
//!        │ communication error
//!        ▼
//!     last round? ──yes──▶ fail
//! ```
//!
//! A successful probe only proves the node is reachable. The dialect the rest
//! of the driver uses is then picked from the firmware version alone (see
//! [`dialect_for`]).

use core::fmt;

use crate::{
    AccessSettings, BaseStation, FirmwareVersion, NodeAddress, RegisterAccessExt, RegisterCache,
    Result, Version,
};

/// Oldest firmware speaking dialect 1.1.
pub const FW_DIALECT_1_1: Version = Version::new(8, 21);

/// Register-access protocol dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    V1_0,
    V1_1,
}

impl Dialect {
    /// Whether several registers can be read in one round-trip.
    pub fn supports_grouped_reads(self) -> bool {
        match self {
            Dialect::V1_0 => false,
            Dialect::V1_1 => true,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::V1_0 => f.write_str("v1.0"),
            Dialect::V1_1 => f.write_str("v1.1"),
        }
    }
}

/// Dialect a node running `firmware` should be spoken to in.
pub fn dialect_for(firmware: Version) -> Dialect {
    if firmware >= FW_DIALECT_1_1 {
        Dialect::V1_1
    } else {
        Dialect::V1_0
    }
}

/// Outcome of a successful negotiation.
pub struct Negotiated<B> {
    pub dialect: Dialect,
    pub firmware: Version,
    /// Cache used by the successful probe, already scoped to `dialect`.
    /// Its access settings are still the probe's.
    pub cache: RegisterCache<B>,
}

/// Finds a dialect the node answers to and reads its firmware version.
///
/// Runs up to `settings.retries + 1` rounds. Each round probes dialect 1.1,
/// then 1.0 if 1.1 did not answer. Only communication errors move on to the
/// next attempt; any other error is returned immediately.
///
/// # Errors
/// * `Error::Communication` - no dialect answered in any round (the last
///   failure is returned)
pub fn negotiate<B>(base_station: &B, node: NodeAddress, settings: AccessSettings) -> Result<Negotiated<B>>
where
    B: BaseStation + Clone,
{
    // each round is one attempt per dialect
    let mut probe_settings = AccessSettings {
        retries: 0,
        ..settings
    };
    let mut round: u8 = 0;

    loop {
        match probe(base_station, node, Dialect::V1_1, probe_settings) {
            Ok(found) => return Ok(settle(node, found)),
            Err(err) if err.is_communication() => {
                log::debug!("node {node}: no answer in {}: {err}", Dialect::V1_1);
            }
            Err(err) => return Err(err),
        }

        // v1.0 reads through the same grouped path that just failed
        probe_settings.use_grouped_reads = false;

        match probe(base_station, node, Dialect::V1_0, probe_settings) {
            Ok(found) => return Ok(settle(node, found)),
            Err(err) if err.is_communication() => {
                if round >= settings.retries {
                    log::warn!("node {node}: protocol negotiation failed after {} rounds", u16::from(round) + 1);
                    return Err(err);
                }
                round += 1;
                log::warn!("node {node}: no answer in any dialect, retrying ({round}/{})", settings.retries);
            }
            Err(err) => return Err(err),
        }
    }
}

fn probe<B>(
    base_station: &B,
    node: NodeAddress,
    dialect: Dialect,
    settings: AccessSettings,
) -> Result<(Version, RegisterCache<B>)>
where
    B: BaseStation + Clone,
{
    log::debug!("node {node}: probing {dialect}");
    let mut cache = RegisterCache::new(node, base_station.clone(), dialect, settings);
    let firmware: FirmwareVersion = cache.read_register()?;
    Ok((firmware.version, cache))
}

fn settle<B>(node: NodeAddress, (firmware, mut cache): (Version, RegisterCache<B>)) -> Negotiated<B> {
    let answered = cache.dialect();
    let dialect = dialect_for(firmware);
    log::info!("node {node}: firmware {firmware}, answered {answered}, using {dialect}");
    cache.set_dialect(dialect);

    Negotiated {
        dialect,
        firmware,
        cache,
    }
}
