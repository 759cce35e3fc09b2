//! Register cache
//!
//! Reading a node register costs at least one radio round-trip through the
//! base station, so [`RegisterCache`] keeps every word it has seen, keyed by
//! word address:
//! - reads are served from the cache when possible (read-through)
//! - writes always reach the node, then update the cache (write-through)
//! - entries can be dropped one at a time or all at once when the node
//!   changes registers on its own (auto-balance, auto-cal, power cycles)
//!
//! Transport calls are retried on communication failures according to the
//! active [`AccessSettings`].

use std::collections::HashMap;

use crate::registers::word_locations;
use crate::{BaseStation, Dialect, Error, NodeAddress, RegisterAccess, RegisterLocation, Result};

/// Runtime policy for register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessSettings {
    /// How many times a failed transport call is retried before giving up
    pub retries: u8,
    /// Fetch several words in one round-trip when the dialect allows it
    pub use_grouped_reads: bool,
    /// Serve reads from cached entries
    pub use_cache: bool,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            retries: 3,
            use_grouped_reads: true,
            use_cache: true,
        }
    }
}

/// Coherent cache over one node's registers.
pub struct RegisterCache<B> {
    node: NodeAddress,
    base_station: B,
    dialect: Dialect,
    settings: AccessSettings,
    entries: HashMap<RegisterLocation, u16>,
}

impl<B> RegisterCache<B> {
    /// Creates an empty cache for `node`, speaking `dialect` through
    /// `base_station`.
    pub fn new(node: NodeAddress, base_station: B, dialect: Dialect, settings: AccessSettings) -> Self {
        Self {
            node,
            base_station,
            dialect,
            settings,
            entries: HashMap::new(),
        }
    }

    pub fn node(&self) -> NodeAddress {
        self.node
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub fn settings(&self) -> AccessSettings {
        self.settings
    }

    /// Replaces the access policy for every following operation. Existing
    /// entries are kept.
    pub fn update_settings(&mut self, settings: AccessSettings) {
        self.settings = settings;
    }

    pub fn base_station(&self) -> &B {
        &self.base_station
    }

    /// Routes every following transport call through `base_station`.
    /// Existing entries are kept.
    pub fn set_base_station(&mut self, base_station: B) {
        self.base_station = base_station;
    }

    /// Cached word at `location`, without touching the transport.
    pub fn cached(&self, location: RegisterLocation) -> Option<u16> {
        self.entries.get(&location).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the entry for `location`, if any.
    pub fn invalidate(&mut self, location: RegisterLocation) {
        if self.entries.remove(&location).is_some() {
            log::trace!("node {}: dropped cached {location:#06x}", self.node);
        }
    }

    /// Drops every entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    fn grouped(&self) -> bool {
        self.settings.use_grouped_reads && self.dialect.supports_grouped_reads()
    }
}

impl<B: BaseStation> RegisterCache<B> {
    /// Reads one word.
    pub fn read(&mut self, location: RegisterLocation) -> Result<u16> {
        let words = self.read_words(location, 1)?;
        words
            .first()
            .copied()
            .ok_or_else(|| Error::MalformedResponse(format!("no data at {location:#06x}")))
    }

    /// Reads `count` consecutive words starting at `location`.
    ///
    /// Cached words are reused when caching is enabled; the rest are fetched
    /// in a single grouped round-trip if the dialect and settings allow it,
    /// otherwise one round-trip per word.
    pub fn read_words(&mut self, location: RegisterLocation, count: usize) -> Result<Vec<u16>> {
        let locations = word_locations(location, count)?;
        let mut words: Vec<Option<u16>> = if self.settings.use_cache {
            locations.iter().map(|loc| self.cached(*loc)).collect()
        } else {
            vec![None; count]
        };

        let missing: Vec<RegisterLocation> = locations
            .iter()
            .zip(&words)
            .filter(|(_, word)| word.is_none())
            .map(|(loc, _)| *loc)
            .collect();

        if missing.is_empty() {
            log::trace!("node {}: cache hit at {location:#06x}", self.node);
        } else {
            let fetched = if self.grouped() {
                self.transport_read(&missing, true)?
            } else {
                let mut fetched = Vec::with_capacity(missing.len());
                for loc in &missing {
                    fetched.extend(self.transport_read(&[*loc], false)?);
                }
                fetched
            };

            let mut fetched = missing.iter().zip(fetched);
            for (loc, slot) in locations.iter().zip(words.iter_mut()) {
                if slot.is_some() {
                    continue;
                }
                if let Some((_, word)) = fetched.next() {
                    *slot = Some(word);
                    if self.settings.use_cache {
                        self.entries.insert(*loc, word);
                    }
                }
            }
        }

        words
            .into_iter()
            .zip(&locations)
            .map(|(word, loc)| {
                word.ok_or_else(|| Error::MalformedResponse(format!("no data at {loc:#06x}")))
            })
            .collect()
    }

    /// Writes one word, then records it in the cache.
    pub fn write(&mut self, location: RegisterLocation, value: u16) -> Result<()> {
        let (node, dialect) = (self.node, self.dialect);
        self.with_retries(|bs| bs.write_register(node, dialect, location, value))?;
        self.entries.insert(location, value);
        Ok(())
    }

    /// Writes consecutive words starting at `location`.
    pub fn write_words(&mut self, location: RegisterLocation, words: &[u16]) -> Result<()> {
        for (loc, word) in word_locations(location, words.len())?.into_iter().zip(words) {
            self.write(loc, *word)?;
        }
        Ok(())
    }

    fn transport_read(&self, locations: &[RegisterLocation], grouped: bool) -> Result<Vec<u16>> {
        let (node, dialect) = (self.node, self.dialect);
        let words = self.with_retries(|bs| bs.read_registers(node, dialect, locations, grouped))?;
        if words.len() != locations.len() {
            return Err(Error::MalformedResponse(format!(
                "asked node {node} for {} words, got {}",
                locations.len(),
                words.len()
            )));
        }
        Ok(words)
    }

    /// Runs `op`, retrying communication failures up to the configured count.
    fn with_retries<T>(&self, mut op: impl FnMut(&B) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op(&self.base_station) {
                Err(err) if err.is_communication() && attempt < self.settings.retries => {
                    attempt += 1;
                    log::warn!(
                        "node {}: {err}, retrying ({attempt}/{})",
                        self.node,
                        self.settings.retries
                    );
                }
                result => return result,
            }
        }
    }
}

impl<B: BaseStation> RegisterAccess for RegisterCache<B> {
    fn read_words(&mut self, location: RegisterLocation, count: usize) -> Result<Vec<u16>> {
        RegisterCache::read_words(self, location, count)
    }

    fn write_words(&mut self, location: RegisterLocation, words: &[u16]) -> Result<()> {
        RegisterCache::write_words(self, location, words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockBaseStation};
    use crate::{FirmwareVersion, RegisterAccessExt, SerialNumber, Version};

    const NODE: NodeAddress = NodeAddress(100);

    fn cache(bs: &MockBaseStation, dialect: Dialect, settings: AccessSettings) -> RegisterCache<MockBaseStation> {
        RegisterCache::new(NODE, bs.clone(), dialect, settings)
    }

    #[test]
    fn second_read_is_served_from_cache() {
        let bs = MockBaseStation::new();
        bs.set_word(0x006C, 0x0815);
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());

        assert_eq!(cache.read(0x006C).unwrap(), 0x0815);
        assert_eq!(cache.read(0x006C).unwrap(), 0x0815);
        assert_eq!(bs.read_count(), 1);
    }

    #[test]
    fn read_after_write_needs_no_round_trip() {
        let bs = MockBaseStation::new();
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());

        cache.write(0x0022, 30).unwrap();
        assert_eq!(cache.read(0x0022).unwrap(), 30);
        assert_eq!(bs.read_count(), 0);
        assert_eq!(bs.word(0x0022), Some(30));
    }

    #[test]
    fn write_replaces_a_stale_entry() {
        let bs = MockBaseStation::new();
        bs.set_word(0x0022, 10);
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());

        assert_eq!(cache.read(0x0022).unwrap(), 10);
        cache.write(0x0022, 60).unwrap();
        assert_eq!(cache.read(0x0022).unwrap(), 60);
        assert_eq!(bs.read_count(), 1);
    }

    #[test]
    fn disabled_cache_always_hits_the_transport() {
        let bs = MockBaseStation::new();
        bs.set_word(0x0022, 10);
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());
        cache.read(0x0022).unwrap();

        cache.update_settings(AccessSettings {
            use_cache: false,
            ..AccessSettings::default()
        });
        bs.set_word(0x0022, 20);

        assert_eq!(cache.read(0x0022).unwrap(), 20);
        assert_eq!(cache.read(0x0022).unwrap(), 20);
        assert_eq!(bs.read_count(), 3);
        // the old entry is kept, not cleared
        assert_eq!(cache.cached(0x0022), Some(10));
    }

    #[test]
    fn invalidate_drops_only_one_entry() {
        let bs = MockBaseStation::new();
        bs.set_word(0x0120, 2000);
        bs.set_word(0x0122, 2100);
        let mut cache = cache(&bs, Dialect::V1_0, AccessSettings::default());
        cache.read(0x0120).unwrap();
        cache.read(0x0122).unwrap();

        cache.invalidate(0x0120);
        assert_eq!(cache.cached(0x0120), None);
        assert_eq!(cache.cached(0x0122), Some(2100));

        cache.invalidate_all();
        assert!(cache.is_empty());
        cache.invalidate(0x0120);
        cache.invalidate_all();
    }

    #[test]
    fn grouped_reads_need_dialect_support() {
        let bs = MockBaseStation::new();
        bs.set_word(0x0074, 0x0001);
        bs.set_word(0x0076, 0xE240);

        let mut grouped = cache(&bs, Dialect::V1_1, AccessSettings::default());
        let serial: SerialNumber = grouped.read_register().unwrap();
        assert_eq!(serial.value, 123_456);
        assert_eq!(bs.read_count(), 1);
        assert!(matches!(bs.calls().last(), Some(Call::Read { grouped: true, .. })));

        bs.clear_calls();
        let mut single = cache(&bs, Dialect::V1_0, AccessSettings::default());
        let serial: SerialNumber = single.read_register().unwrap();
        assert_eq!(serial.value, 123_456);
        assert_eq!(bs.read_count(), 2);
    }

    #[test]
    fn only_missing_words_are_fetched() {
        let bs = MockBaseStation::new();
        bs.set_word(0x0074, 0x0001);
        bs.set_word(0x0076, 0xE240);
        let mut cache = cache(&bs, Dialect::V1_0, AccessSettings::default());

        cache.read(0x0074).unwrap();
        bs.clear_calls();
        let serial: SerialNumber = cache.read_register().unwrap();
        assert_eq!(serial.value, 123_456);
        assert_eq!(
            bs.calls(),
            vec![Call::Read {
                dialect: Dialect::V1_0,
                locations: vec![0x0076],
                grouped: false
            }]
        );
    }

    #[test]
    fn communication_failures_are_retried_up_to_the_limit() {
        let bs = MockBaseStation::new();
        bs.set_word(0x006C, 0x0815);
        bs.fail_next_reads(2);
        let mut cache = cache(
            &bs,
            Dialect::V1_1,
            AccessSettings {
                retries: 2,
                ..AccessSettings::default()
            },
        );

        let fw: FirmwareVersion = cache.read_register().unwrap();
        assert_eq!(fw.version, Version::new(8, 21));
        assert_eq!(bs.read_count(), 3);
    }

    #[test]
    fn exhausted_retries_surface_the_communication_error() {
        let bs = MockBaseStation::new();
        bs.set_word(0x006C, 0x0815);
        bs.fail_next_reads(3);
        let mut cache = cache(
            &bs,
            Dialect::V1_1,
            AccessSettings {
                retries: 2,
                ..AccessSettings::default()
            },
        );

        assert!(matches!(cache.read(0x006C), Err(Error::Communication(_))));
        assert_eq!(bs.read_count(), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn writes_are_retried_too() {
        let bs = MockBaseStation::new();
        bs.fail_next_writes(1);
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());

        cache.write(0x00FA, 0x02).unwrap();
        assert_eq!(bs.write_count(), 2);
    }

    #[test]
    fn spans_past_the_register_space_are_rejected_before_io() {
        let bs = MockBaseStation::new();
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());

        assert!(matches!(cache.read_words(0x0000, 40_000), Err(Error::OutOfRange { .. })));
        assert!(matches!(cache.read_words(0x0000, 65_536), Err(Error::OutOfRange { .. })));
        assert!(matches!(
            cache.write_words(0xFFFE, &[1, 2]),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(bs.call_count(), 0);
    }

    #[test]
    fn wrongly_sized_responses_are_not_retried() {
        let bs = MockBaseStation::new();
        bs.set_short_reads(true);
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());

        assert!(matches!(cache.read(0x006C), Err(Error::MalformedResponse(_))));
        assert_eq!(bs.read_count(), 1);
    }

    #[test]
    fn rebinding_the_base_station_keeps_entries() {
        let bs = MockBaseStation::new();
        bs.set_word(0x0022, 10);
        let other = MockBaseStation::new();
        other.set_word(0x0024, 5);
        let mut cache = cache(&bs, Dialect::V1_1, AccessSettings::default());
        cache.read(0x0022).unwrap();

        cache.set_base_station(other.clone());
        assert_eq!(cache.read(0x0022).unwrap(), 10);
        assert_eq!(cache.read(0x0024).unwrap(), 5);
        assert_eq!(other.read_count(), 1);
        assert_eq!(bs.read_count(), 1);
    }
}
