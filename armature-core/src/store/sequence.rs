//! Macro store
//!
//! A macro is a named list of pose references, each followed by a wait.

use armature_hal::{ByteRead, ByteStore};
use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::pose::{Pose, PoseStore, MAX_POSES};
use super::slots::{SlotEntry, SlotTable};
use super::{entry_label, label, Label, DELETE_ALL};
use crate::error::{Error, ValidationError};
use crate::persist::layout::{MACRO_SLOT_SIZE, MACRO_TABLE};

/// Macro table capacity
pub const MAX_MACROS: usize = 5;

/// Longest macro
pub const MAX_STEPS: usize = 16;

/// How a macro step names its pose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PoseRef {
    /// Pose looked up by name when the step runs
    Name(Label),
    /// Pose table slot
    Slot(u8),
}

impl PoseRef {
    /// Parse a reference: a bare slot number, otherwise a pose name
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        if let Ok(slot) = text.parse::<u8>() {
            return Ok(PoseRef::Slot(slot));
        }
        label(text).map(PoseRef::Name)
    }

    /// Resolve against the pose table
    pub fn resolve<S: ByteRead>(&self, poses: &PoseStore<S>) -> Result<Pose, Error> {
        match self {
            PoseRef::Name(name) => poses.load_by_name(name),
            PoseRef::Slot(slot) => poses.load_by_slot(*slot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroStep {
    pub pose: PoseRef,
    /// Wait after the pose is reached
    pub delay_ms: u32,
}

impl MacroStep {
    pub fn new(pose: PoseRef, delay_ms: u32) -> Self {
        Self { pose, delay_ms }
    }
}

/// Named step sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Macro {
    pub name: Label,
    pub steps: Vec<MacroStep, MAX_STEPS>,
}

impl SlotEntry for Macro {
    fn label(&self) -> &Label {
        &self.name
    }
}

/// Macro table view over a byte store
pub struct MacroStore<S> {
    store: S,
    table: SlotTable<Macro, MACRO_SLOT_SIZE>,
}

impl<S: ByteRead> MacroStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            table: MACRO_TABLE,
        }
    }

    /// Occupied macro names in slot order
    pub fn names(&self) -> impl Iterator<Item = Label> + Clone + '_ {
        self.table.entries(&self.store).map(|m| m.name)
    }

    /// Occupied macros with their step counts
    pub fn list(&self) -> impl Iterator<Item = (Label, usize)> + Clone + '_ {
        self.table
            .entries(&self.store)
            .map(|m| (m.name, m.steps.len()))
    }

    pub fn load_by_name(&self, name: &str) -> Result<Macro, Error> {
        let name = label(name)?;
        let (_, m) = self.table.find(&self.store, &name)?.ok_or(Error::NotFound)?;
        Ok(m)
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<'a, B: ByteRead> MacroStore<&'a B> {
    /// Macro names and step counts that stay readable after the view is
    /// dropped
    pub fn into_list(self) -> impl Iterator<Item = (Label, usize)> + Clone + 'a {
        self.table
            .entries(self.store)
            .map(|m| (m.name, m.steps.len()))
    }
}

impl<S: ByteStore> MacroStore<S> {
    /// Save a macro, overwriting one with the same name
    pub fn save(&mut self, name: &str, steps: &[MacroStep]) -> Result<usize, Error> {
        let name = entry_label(name)?;
        if steps.is_empty() {
            return Err(ValidationError::EmptyMacro.into());
        }
        for step in steps {
            if let PoseRef::Slot(slot) = step.pose {
                if slot as usize >= MAX_POSES {
                    return Err(ValidationError::SlotIndex(slot).into());
                }
            }
        }
        let steps = Vec::from_slice(steps).map_err(|_| ValidationError::TooManySteps)?;

        let index = self.table.allocate(&self.store, &name)?;
        self.table
            .write(&mut self.store, index, &Macro { name, steps })?;
        self.store.commit()?;
        Ok(index)
    }

    /// Delete one macro, or every macro when `name` is `"all"`
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
