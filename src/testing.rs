//! Scripted in-memory base station used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use crate::{
    AutoCalResult, BaseStation, Dialect, Error, FirmwareVersion, NodeAddress, NodeModel,
    PingResponse, RegisterLocation, Result, SamplingMode, SetToIdleStatus, Version,
};

pub const FIRMWARE_VERSION: RegisterLocation = 0x006C;
pub const DATA_STORAGE_SIZE: RegisterLocation = 0x007E;
pub const SAMPLING_MODE: RegisterLocation = 0x000E;

/// Every request the mock received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read {
        dialect: Dialect,
        locations: Vec<RegisterLocation>,
        grouped: bool,
    },
    Write {
        location: RegisterLocation,
        value: u16,
    },
    Ping,
    Sleep,
    SetToIdle,
    Erase,
    StartNonSyncSampling,
    AutoBalance {
        channel: u8,
        target: u16,
    },
    AutoCal {
        model: NodeModel,
        firmware: Version,
    },
}

struct State {
    words: HashMap<RegisterLocation, u16>,
    dialects: Vec<Dialect>,
    failing_reads: u32,
    failing_writes: u32,
    read_errors: VecDeque<Error>,
    short_reads: bool,
    erase_succeeds: bool,
    auto_cal: (bool, AutoCalResult),
    calls: Vec<Call>,
}

/// Handle to a simulated base station with a single node behind it.
///
/// Clones share state; two handles are equal only if they are clones of each
/// other.
#[derive(Clone)]
pub struct MockBaseStation {
    state: Arc<Mutex<State>>,
}

impl PartialEq for MockBaseStation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for MockBaseStation {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBaseStation {
    /// A base station whose node answers both dialects and has an empty
    /// register space.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                words: HashMap::new(),
                dialects: vec![Dialect::V1_0, Dialect::V1_1],
                failing_reads: 0,
                failing_writes: 0,
                read_errors: VecDeque::new(),
                short_reads: false,
                erase_succeeds: true,
                auto_cal: (true, AutoCalResult::default()),
                calls: Vec::new(),
            })),
        }
    }

    /// A base station whose node reports `model`, `firmware` and 1 MiB of
    /// datalogging memory, and is set up for synchronized sampling.
    pub fn with_node(model: NodeModel, firmware: Version) -> Self {
        let bs = Self::new();
        bs.set_words(FIRMWARE_VERSION, &encode_firmware(firmware));
        bs.set_words(0x0070, &model_words(model));
        bs.set_words(0x0074, &[0x0001, 0xE240]);
        bs.set_word(DATA_STORAGE_SIZE, 1024);
        bs.set_word(SAMPLING_MODE, SamplingMode::Sync.code());
        bs
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_word(&self, location: RegisterLocation, value: u16) {
        self.state().words.insert(location, value);
    }

    pub fn set_words(&self, location: RegisterLocation, values: &[u16]) {
        for (i, value) in values.iter().enumerate() {
            self.set_word(location + 2 * i as u16, *value);
        }
    }

    pub fn word(&self, location: RegisterLocation) -> Option<u16> {
        self.state().words.get(&location).copied()
    }

    /// Dialects the node answers to.
    pub fn set_dialects(&self, dialects: &[Dialect]) {
        self.state().dialects = dialects.to_vec();
    }

    pub fn fail_next_reads(&self, count: u32) {
        self.state().failing_reads = count;
    }

    pub fn fail_next_writes(&self, count: u32) {
        self.state().failing_writes = count;
    }

    /// Makes the next read fail with `error`, regardless of dialect.
    pub fn fail_next_read_with(&self, error: Error) {
        self.state().read_errors.push_back(error);
    }

    /// Answers every read with one word too few.
    pub fn set_short_reads(&self, short: bool) {
        self.state().short_reads = short;
    }

    pub fn set_erase_succeeds(&self, succeeds: bool) {
        self.state().erase_succeeds = succeeds;
    }

    pub fn set_auto_cal(&self, success: bool, result: AutoCalResult) {
        self.state().auto_cal = (success, result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn read_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Read { .. }))
            .count()
    }

    pub fn write_count(&self) -> usize {
        self.writes().len()
    }

    pub fn writes(&self) -> Vec<(RegisterLocation, u16)> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                Call::Write { location, value } => Some((*location, *value)),
                _ => None,
            })
            .collect()
    }

    /// Dialect of every read, in order.
    pub fn read_dialects(&self) -> Vec<Dialect> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                Call::Read { dialect, .. } => Some(*dialect),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

pub fn encode_firmware(version: Version) -> Vec<u16> {
    vec![u16::from_be_bytes([version.major, version.minor])]
}

pub fn model_words(model: NodeModel) -> Vec<u16> {
    let code = model.code();
    vec![(code >> 16) as u16, code as u16]
}

impl BaseStation for MockBaseStation {
    fn read_registers(
        &self,
        node: NodeAddress,
        dialect: Dialect,
        locations: &[RegisterLocation],
        grouped: bool,
    ) -> Result<Vec<u16>> {
        self.record(Call::Read {
            dialect,
            locations: locations.to_vec(),
            grouped,
        });

        let mut state = self.state();
        if let Some(error) = state.read_errors.pop_front() {
            return Err(error);
        }
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(Error::Communication(format!("node {node} timed out")));
        }
        if !state.dialects.contains(&dialect) {
            return Err(Error::Communication(format!("node {node} did not answer")));
        }

        let mut words: Vec<u16> = locations
            .iter()
            .map(|loc| state.words.get(loc).copied().unwrap_or(0))
            .collect();
        if state.short_reads {
            words.pop();
        }
        Ok(words)
    }

    fn write_register(
        &self,
        node: NodeAddress,
        dialect: Dialect,
        location: RegisterLocation,
        value: u16,
    ) -> Result<()> {
        self.record(Call::Write { location, value });

        let mut state = self.state();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(Error::Communication(format!("node {node} timed out")));
        }
        if !state.dialects.contains(&dialect) {
            return Err(Error::Communication(format!("node {node} did not answer")));
        }
        state.words.insert(location, value);
        Ok(())
    }

    fn ping(&self, _node: NodeAddress) -> Result<PingResponse> {
        self.record(Call::Ping);
        Ok(PingResponse {
            success: true,
            node_rssi: -40,
            base_rssi: -45,
        })
    }

    fn sleep(&self, _node: NodeAddress) -> Result<bool> {
        self.record(Call::Sleep);
        Ok(true)
    }

    fn set_to_idle(&self, _node: NodeAddress) -> Result<SetToIdleStatus> {
        self.record(Call::SetToIdle);
        Ok(SetToIdleStatus::Success)
    }

    fn erase(&self, _node: NodeAddress) -> Result<bool> {
        self.record(Call::Erase);
        Ok(self.state().erase_succeeds)
    }

    fn start_non_sync_sampling(&self, _node: NodeAddress) -> Result<()> {
        self.record(Call::StartNonSyncSampling);
        Ok(())
    }

    fn auto_balance(&self, _node: NodeAddress, channel: u8, target: u16) -> Result<()> {
        self.record(Call::AutoBalance { channel, target });
        Ok(())
    }

    fn auto_cal(
        &self,
        _node: NodeAddress,
        model: NodeModel,
        firmware: Version,
    ) -> Result<(bool, AutoCalResult)> {
        self.record(Call::AutoCal { model, firmware });
        Ok(self.state().auto_cal)
    }

    fn last_communication_time(&self, _node: NodeAddress) -> SystemTime {
        SystemTime::UNIX_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::decode;
    use crate::ModelNumber;

    #[test]
    fn node_image_matches_the_register_codecs() {
        let bs = MockBaseStation::with_node(NodeModel::ShmLink2, Version::new(8, 21));

        let fw: FirmwareVersion = decode(FIRMWARE_VERSION, &[bs.word(FIRMWARE_VERSION).unwrap()]).unwrap();
        assert_eq!(fw.version, Version::new(8, 21));

        let words = [bs.word(0x0070).unwrap(), bs.word(0x0072).unwrap()];
        let model: ModelNumber = decode(0x0070, &words).unwrap();
        assert_eq!(model.model, NodeModel::ShmLink2);

        let mode: SamplingMode = decode(SAMPLING_MODE, &[bs.word(SAMPLING_MODE).unwrap()]).unwrap();
        assert_eq!(mode, SamplingMode::Sync);
    }
}
