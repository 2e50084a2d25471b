//! Named pose and macro storage
//!
//! Both stores are fixed-capacity slot tables in the byte store, scanned
//! linearly. Slot position carries no meaning; slot count is the capacity.

pub mod pose;
pub mod sequence;
pub mod slots;

use heapless::String;

use crate::error::ValidationError;

pub use pose::{Pose, PoseStore, MAX_POSES};
pub use sequence::{Macro, MacroStep, MacroStore, PoseRef, MAX_MACROS, MAX_STEPS};
pub use slots::{SlotEntry, SlotTable};

/// Longest pose or macro name
pub const MAX_NAME_LEN: usize = 9;

/// Name that addresses every slot in a delete
pub const DELETE_ALL: &str = "all";

/// Pose or macro name
pub type Label = String<MAX_NAME_LEN>;

/// Validate a name and copy it into a label
///
/// Names are 1 to 9 printable ASCII characters without whitespace. Longer
/// names are rejected rather than truncated.
pub fn label(name: &str) -> Result<Label, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::NameEmpty);
    }
    if !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(ValidationError::NameInvalid);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    let mut out = Label::new();
    out.push_str(name).map_err(|_| ValidationError::NameTooLong)?;
    Ok(out)
}

/// Validate a name for saving, which also excludes the delete-all sentinel
pub fn entry_label(name: &str) -> Result<Label, ValidationError> {
    let out = label(name)?;
    if out == DELETE_ALL {
        return Err(ValidationError::NameReserved);
    }
    Ok(out)
}
