//! Pose store
//!
//! Named snapshots of all joint angles.

use armature_hal::{ByteRead, ByteStore};
use serde::{Deserialize, Serialize};

use super::slots::{SlotEntry, SlotTable};
use super::{entry_label, label, Label, DELETE_ALL};
use crate::error::Error;
use crate::joint::Angles;
use crate::motion::MotionController;
use crate::persist::layout::{POSE_SLOT_SIZE, POSE_TABLE};
use crate::traits::ServoOutput;

/// Pose table capacity
pub const MAX_POSES: usize = 10;

/// Named joint snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pose {
    pub name: Label,
    pub angles: Angles,
}

impl SlotEntry for Pose {
    fn label(&self) -> &Label {
        &self.name
    }
}

/// Pose table view over a byte store
///
/// Every mutation is committed before returning.
pub struct PoseStore<S> {
    store: S,
    table: SlotTable<Pose, POSE_SLOT_SIZE>,
}

impl<S: ByteRead> PoseStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            table: POSE_TABLE,
        }
    }

    /// Occupied pose names in slot order
    ///
    /// Lazy: each step reads one slot. Clone the iterator to restart it.
    pub fn names(&self) -> impl Iterator<Item = Label> + Clone + '_ {
        self.table.entries(&self.store).map(|pose| pose.name)
    }

    /// All occupied poses in slot order
    pub fn iter(&self) -> impl Iterator<Item = Pose> + Clone + '_ {
        self.table.entries(&self.store)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn load_by_name(&self, name: &str) -> Result<Pose, Error> {
        let name = label(name)?;
        let (_, pose) = self.table.find(&self.store, &name)?.ok_or(Error::NotFound)?;
        Ok(pose)
    }

    pub fn load_by_slot(&self, slot: u8) -> Result<Pose, Error> {
        self.table
            .read(&self.store, slot as usize)?
            .ok_or(Error::NotFound)
    }

    /// Load a pose and move to it
    ///
    /// Without an explicit duration the move runs at the configured speed.
    pub fn apply_by_name<V: ServoOutput>(
        &self,
        name: &str,
        motion: &mut MotionController<V>,
        duration_ms: Option<u32>,
        now_ms: u32,
    ) -> Result<Pose, Error> {
        let pose = self.load_by_name(name)?;
        motion.move_to(&pose.angles, duration_ms, now_ms)?;
        Ok(pose)
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<'a, B: ByteRead> PoseStore<&'a B> {
    /// Pose names that stay readable after the view is dropped
    pub fn into_names(self) -> impl Iterator<Item = Label> + Clone + 'a {
        self.table.entries(self.store).map(|pose| pose.name)
    }
}

impl<S: ByteStore> PoseStore<S> {
    /// Save `angles` under `name`, returning the slot used
    ///
    /// Overwrites a pose with the same name in place; otherwise takes the
    /// first empty slot.
    pub fn save(&mut self, name: &str, angles: &Angles) -> Result<usize, Error> {
        let name = entry_label(name)?;
        let index = self.table.allocate(&self.store, &name)?;
        let pose = Pose {
            name,
            angles: *angles,
        };
        self.table.write(&mut self.store, index, &pose)?;
        self.store.commit()?;
        Ok(index)
    }

    /// Delete one pose, or every pose when `name` is `"all"`
    pub fn delete_by_name(&mut self, name: &str) -> Result<(), Error> {
        let name = label(name)?;
        if name == DELETE_ALL {
            self.table.clear_all(&mut self.store)?;
        } else {
            let (index, _) = self.table.find(&self.store, &name)?.ok_or(Error::NotFound)?;
            self.table.clear(&mut self.store, index)?;
        }
        self.store.commit()?;
        Ok(())
    }
}
