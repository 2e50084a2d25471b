//! Error taxonomy for core operations
//!
//! Every error is local and recoverable: the caller issues a corrected
//! command. None of them leave state partially mutated.

use armature_hal::StoreError;

/// Core operation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Request rejected at the call boundary, nothing mutated
    Validation(ValidationError),
    /// No free pose or macro slot
    Capacity,
    /// Pose or macro name (or slot) absent
    NotFound,
    /// Stored record failed magic, version or checksum validation
    Integrity(IntegrityError),
    /// Kinematics produced no finite solution
    DegenerateGeometry,
    /// A macro is already running
    Busy,
    /// Underlying byte store failed
    Storage(StoreError),
}

/// Reasons a request is rejected before any state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Joint index outside `0..JOINT_COUNT`
    JointIndex(u8),
    /// Target angle outside the joint's calibrated travel
    AngleOutOfBounds {
        joint: u8,
        angle: i16,
        min: u8,
        max: u8,
    },
    /// Calibration bound outside 0-180
    BoundOutOfRange(i16),
    /// Bound change would leave min above max
    InvertedBounds { min: u8, max: u8 },
    /// Calibration offset outside the accepted range
    OffsetOutOfRange(i16),
    /// Slot index outside the table
    SlotIndex(u8),
    /// Name is empty
    NameEmpty,
    /// Name longer than the stored label
    NameTooLong,
    /// Name contains whitespace or non-ASCII characters
    NameInvalid,
    /// Name collides with the delete-all sentinel
    NameReserved,
    /// Macro has no steps
    EmptyMacro,
    /// Macro exceeds the step limit
    TooManySteps,
}

/// Reasons a persisted record is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrityError {
    /// Format sentinel missing (empty or foreign data)
    BadMagic,
    /// Version byte not understood by this firmware
    UnknownVersion(u8),
    /// Recomputed checksum differs from the stored one
    ChecksumMismatch { stored: u16, computed: u16 },
    /// Record still unreadable after migration
    MigrationFailed,
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Storage(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<IntegrityError> for Error {
    fn from(e: IntegrityError) -> Self {
        Error::Integrity(e)
    }
}

impl Error {
    /// Check if the caller can fix this by correcting the request
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this came from stored data rather than the request
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity(_))
    }
}
