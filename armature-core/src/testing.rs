//! Shared test doubles

use armature_hal::{ByteRead, ByteStore, RamStore, StoreError};

use crate::joint::JOINT_COUNT;
use crate::traits::ServoOutput;

/// Full-size RAM store
pub type Eeprom = RamStore;

/// Servo bank that remembers the last angle written per channel
#[derive(Debug, Default)]
pub struct RecordingServos {
    pub last: [u8; JOINT_COUNT],
    pub writes: usize,
}

impl ServoOutput for RecordingServos {
    fn write(&mut self, joint: usize, physical_deg: u8) {
        self.last[joint] = physical_deg;
        self.writes += 1;
    }
}

/// RAM store whose writes and commits can be made to fail
///
/// With `drop_writes` set, writes report success but never reach `inner`.
pub struct FlakyStore {
    pub inner: RamStore,
    pub fail_commit: bool,
    pub fail_write: bool,
    pub drop_writes: bool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: RamStore::new(),
            fail_commit: false,
            fail_write: false,
            drop_writes: false,
        }
    }
}

impl ByteRead for FlakyStore {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        self.inner.read(offset, buf)
    }
}

impl ByteStore for FlakyStore {
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        if self.fail_write {
            return Err(StoreError::Flash);
        }
        if self.drop_writes {
            return Ok(());
        }
        self.inner.write(offset, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.fail_commit {
            return Err(StoreError::CommitFailed);
        }
        self.inner.commit()
    }
}
