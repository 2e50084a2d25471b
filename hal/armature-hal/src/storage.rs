//! Persistent byte store abstractions
//!
//! Provides a flat, byte-addressable persistent region in the style of an
//! emulated EEPROM: writes land in a working copy and only become durable
//! after an explicit [`ByteStore::commit`].

/// Size of the persistent region in bytes
pub const STORE_SIZE: usize = 4096;

/// Errors from byte store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Access extends past the end of the region
    OutOfRange,
    /// Underlying flash operation failed
    Flash,
    /// Commit did not complete
    CommitFailed,
}

/// Read access to a byte store
pub trait ByteRead {
    /// Total addressable size in bytes
    fn capacity(&self) -> usize;

    /// Read `buffer.len()` bytes starting at `offset`
    fn read(&self, offset: usize, buffer: &mut [u8]) -> Result<(), StoreError>;
}

/// Byte-addressable persistent storage
///
/// Implementations must make `commit` durable before returning: once it
/// returns `Ok`, every preceding `write` survives a power cycle. A write that
/// was never committed may be lost.
pub trait ByteStore: ByteRead {
    /// Write `data` starting at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError>;

    /// Flush all pending writes to the backing medium
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Fill `len` bytes starting at `offset` with zeros
    fn zero(&mut self, offset: usize, len: usize) -> Result<(), StoreError> {
        const CHUNK: usize = 32;
        let zeros = [0u8; CHUNK];
        let mut done = 0;
        while done < len {
            let n = (len - done).min(CHUNK);
            self.write(offset + done, &zeros[..n])?;
            done += n;
        }
        Ok(())
    }
}

impl<T: ByteRead + ?Sized> ByteRead for &T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&self, offset: usize, buffer: &mut [u8]) -> Result<(), StoreError> {
        (**self).read(offset, buffer)
    }
}

impl<T: ByteRead + ?Sized> ByteRead for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&self, offset: usize, buffer: &mut [u8]) -> Result<(), StoreError> {
        (**self).read(offset, buffer)
    }
}

impl<T: ByteStore + ?Sized> ByteStore for &mut T {
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        (**self).write(offset, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }
}

/// Check that `offset..offset + len` lies inside a region of `capacity` bytes
pub fn check_range(capacity: usize, offset: usize, len: usize) -> Result<(), StoreError> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StoreError::OutOfRange),
    }
}

/// RAM-backed byte store
///
/// Used on the host and as the working copy behind flash-backed stores.
/// Commits are counted so callers can verify that a write was flushed.
#[derive(Debug, Clone)]
pub struct RamStore<const N: usize = STORE_SIZE> {
    bytes: [u8; N],
    commits: u32,
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStore<N> {
    /// Create a zero-filled store
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            commits: 0,
        }
    }

    /// Create a store that looks like freshly erased flash (all `0xFF`)
    pub const fn erased() -> Self {
        Self {
            bytes: [0xFF; N],
            commits: 0,
        }
    }

    /// Create a store from an existing image
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes, commits: 0 }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Mutable raw contents (bypasses commit accounting)
    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }

    /// Number of successful commits so far
    pub fn commit_count(&self) -> u32 {
        self.commits
    }
}

impl<const N: usize> ByteRead for RamStore<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&self, offset: usize, buffer: &mut [u8]) -> Result<(), StoreError> {
        check_range(N, offset, buffer.len())?;
        buffer.copy_from_slice(&self.bytes[offset..offset + buffer.len()]);
        Ok(())
    }
}

impl<const N: usize> ByteStore for RamStore<N> {
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        check_range(N, offset, data.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commits = self.commits.wrapping_add(1);
        Ok(())
    }
}
