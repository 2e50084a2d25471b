//! Emulated EEPROM for RP2040
//!
//! Keeps a RAM mirror of the last 4 KB flash sector. Reads and writes touch
//! only the mirror; `commit` erases the sector and programs the mirror back
//! when something changed.
//!
//! Implements the `ByteRead` and `ByteStore` traits from `armature-hal`.

use armature_hal::storage::check_range;
use armature_hal::{ByteRead, ByteStore, StoreError, STORE_SIZE};
use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const EEPROM_OFFSET: u32 = (FLASH_SIZE - STORE_SIZE) as u32;

const _: () = assert!(STORE_SIZE % ERASE_SIZE == 0);

/// Flash-backed byte store
pub struct FlashEeprom<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
    mirror: [u8; STORE_SIZE],
    dirty: bool,
}

impl<'d> FlashEeprom<'d> {
    /// Take the flash peripheral and load the sector into RAM
    pub fn new(flash: Peri<'d, FLASH>) -> Result<Self, StoreError> {
        let mut eeprom = Self {
            flash: Flash::new_blocking(flash),
            mirror: [0; STORE_SIZE],
            dirty: false,
        };
        eeprom
            .flash
            .blocking_read(EEPROM_OFFSET, &mut eeprom.mirror)
            .map_err(|_| StoreError::Flash)?;
        Ok(eeprom)
    }

    /// Check for writes not yet committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl ByteRead for FlashEeprom<'_> {
    fn capacity(&self) -> usize {
        STORE_SIZE
    }

    fn read(&self, offset: usize, buffer: &mut [u8]) -> Result<(), StoreError> {
        check_range(STORE_SIZE, offset, buffer.len())?;
        buffer.copy_from_slice(&self.mirror[offset..offset + buffer.len()]);
        Ok(())
    }
}

impl ByteStore for FlashEeprom<'_> {
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        check_range(STORE_SIZE, offset, data.len())?;
        let slot = &mut self.mirror[offset..offset + data.len()];
        if *slot != *data {
            slot.copy_from_slice(data);
            self.dirty = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let end = EEPROM_OFFSET + STORE_SIZE as u32;
        self.flash
            .blocking_erase(EEPROM_OFFSET, end)
            .map_err(|_| StoreError::CommitFailed)?;
        self.flash
            .blocking_write(EEPROM_OFFSET, &self.mirror)
            .map_err(|_| StoreError::CommitFailed)?;

        self.dirty = false;
        Ok(())
    }
}
