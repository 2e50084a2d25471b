//! Persistence layer
//!
//! Owns the byte store. Saves calibration and last-known positions as a
//! checksummed record, restores them on boot, and upgrades legacy records
//! in place. The pose and macro tables live in the same store.

pub mod crc;
pub mod layout;
pub mod record;

use armature_hal::ByteStore;

use crate::error::{Error, IntegrityError};
use crate::joint::JointState;
use crate::motion::MotionController;
use crate::store::{MacroStore, PoseStore};
use crate::traits::ServoOutput;

use layout::{RECORD_OFFSET, RECORD_REGION_LEN};
use record::{detect, LegacyRecord, Record, RecordKind, LEGACY_RECORD_LEN, RECORD_LEN};

/// How a successful load found the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// Current-format record accepted as stored
    Restored,
    /// Legacy record upgraded and rewritten before restoring
    Migrated,
}

/// Load progress
enum LoadStep {
    Read { migrated: bool },
    Migrate(LegacyRecord),
    Install { record: Record, migrated: bool },
}

/// Persistence layer over a byte store
pub struct Persistence<B> {
    store: B,
}

impl<B: ByteStore> Persistence<B> {
    pub fn new(store: B) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut B {
        &mut self.store
    }

    pub fn into_inner(self) -> B {
        self.store
    }

    /// Pose table
    pub fn poses(&mut self) -> PoseStore<&mut B> {
        PoseStore::new(&mut self.store)
    }

    /// Macro table
    pub fn macros(&mut self) -> MacroStore<&mut B> {
        MacroStore::new(&mut self.store)
    }

    /// Read-only pose table
    pub fn pose_view(&self) -> PoseStore<&B> {
        PoseStore::new(&self.store)
    }

    /// Read-only macro table
    pub fn macro_view(&self) -> MacroStore<&B> {
        MacroStore::new(&self.store)
    }

    /// Write the current calibration and positions and commit
    pub fn save(&mut self, joints: &JointState) -> Result<(), Error> {
        let bytes = Record::from_joints(joints).encode();
        self.store.write(RECORD_OFFSET, &bytes)?;
        self.store.commit()?;
        Ok(())
    }

    /// Restore calibration and positions from the stored record
    ///
    /// A legacy record is rewritten in the current format and the load is
    /// retried once. On any failure the joint state is left as it was.
    /// With `then_move` the arm glides to the stored positions at the
    /// configured speed; otherwise they are applied immediately.
    pub fn load<S: ServoOutput>(
        &mut self,
        motion: &mut MotionController<S>,
        then_move: bool,
        now_ms: u32,
    ) -> Result<LoadOutcome, Error> {
        let mut step = LoadStep::Read { migrated: false };
        loop {
            step = match step {
                LoadStep::Read { migrated } => {
                    let mut bytes = [0u8; LEGACY_RECORD_LEN];
                    self.store.read(RECORD_OFFSET, &mut bytes)?;
                    match detect(&bytes)? {
                        RecordKind::Compact => {
                            let mut compact = [0u8; RECORD_LEN];
                            compact.copy_from_slice(&bytes[..RECORD_LEN]);
                            LoadStep::Install {
                                record: Record::decode(&compact)?,
                                migrated,
                            }
                        }
                        RecordKind::Legacy if migrated => {
                            return Err(IntegrityError::MigrationFailed.into());
                        }
                        RecordKind::Legacy => LoadStep::Migrate(LegacyRecord::decode(&bytes)?),
                    }
                }
                LoadStep::Migrate(legacy) => {
                    let bytes = legacy.migrate().encode();
                    self.store.write(RECORD_OFFSET, &bytes)?;
                    self.store
                        .zero(RECORD_OFFSET + RECORD_LEN, RECORD_REGION_LEN - RECORD_LEN)?;
                    self.store.commit()?;
                    LoadStep::Read { migrated: true }
                }
                LoadStep::Install { record, migrated } => {
                    motion.install_calibration(record.calibration());
                    let positions = record.positions();
                    if then_move {
                        motion.move_to(&positions, None, now_ms)?;
                    } else {
                        motion.start_move(&positions, 0, now_ms)?;
                    }
                    return Ok(if migrated {
                        LoadOutcome::Migrated
                    } else {
                        LoadOutcome::Restored
                    });
                }
            };
        }
    }
}
