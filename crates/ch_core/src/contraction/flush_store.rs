//! Spill-to-disk storage for the periodic contraction "flush" (spec §4.5.5,
//! §9 design note).
//!
//! The original C++ `Contractor::Flush` pass runs once the hierarchy is
//! roughly 65% contracted: it renumbers the remaining nodes densely and
//! rebuilds the working graph, spilling the already-finalized shortcut
//! edges to a temp file rather than keeping them resident, backed by a
//! global `TemporaryStorage` singleton
//! (`examples/original_source/Contractor/TemporaryStorage.h`:
//! `allocateSlot`/`writeToSlot`/`readFromSlot`, one `fstream` + mutex per
//! slot, paths generated with `boost::filesystem::unique_path`). Rather
//! than reimplement unique-path generation and a global singleton, this
//! module wraps the `tempfile` crate (already used the same way by
//! `butterfly-osm`'s `butterfly-io` crate in this retrieval pack) in an
//! explicit value, `FlushStore`, that the contractor owns directly instead
//! of reaching through a global.

use std::io::{self, Read, Seek, SeekFrom, Write};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CoreError, Result};

/// One spill slot: a backing temp file plus the byte offset most recently
/// written or read, mirroring `TemporaryStorage::StorageSlot`'s `fstream`
/// and explicit `tell`/`seek` support.
pub struct FlushSlot {
    file: NamedTempFile,
    position: u64,
}

impl FlushSlot {
    fn new() -> Result<Self> {
        let file = NamedTempFile::new().map_err(flush_io_err)?;
        Ok(Self { file, position: 0 })
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.as_file_mut().write_all(bytes).map_err(flush_io_err)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.as_file_mut().read_exact(buf).map_err(flush_io_err)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.file
            .as_file_mut()
            .seek(SeekFrom::Start(offset))
            .map_err(flush_io_err)?;
        self.position = offset;
        Ok(())
    }

    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Serialize `value` with `bincode` and append it to the slot,
    /// prefixed with its encoded length so it can be read back in order.
    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let encoded =
            bincode::serde::encode_to_vec(value, bincode::config::standard())
                .map_err(|e| CoreError::out_of_resources(e.to_string()))?;
        self.write_bytes(&(encoded.len() as u64).to_le_bytes())?;
        self.write_bytes(&encoded)
    }

    pub fn read_value<T: DeserializeOwned>(&mut self) -> Result<T> {
        let mut len_bytes = [0u8; 8];
        self.read_bytes(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes) as usize;
        let mut buf = vec![0u8; len];
        self.read_bytes(&mut buf)?;
        let (value, _) = bincode::serde::decode_from_slice(&buf, bincode::config::standard())
            .map_err(|e| CoreError::invariant(format!("corrupt flush slot: {e}")))?;
        Ok(value)
    }
}

fn flush_io_err(e: io::Error) -> CoreError {
    CoreError::out_of_resources(format!("flush store I/O failure: {e}"))
}

/// A small pool of spill slots, one per contraction worker, allocated
/// lazily as workers request them (`TemporaryStorage::allocateSlot`).
#[derive(Default)]
pub struct FlushStore {
    slots: Vec<Option<FlushSlot>>,
}

impl FlushStore {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocate a new slot, returning its index for later `write`/`read`
    /// calls (`allocateSlot`).
    pub fn allocate_slot(&mut self) -> Result<usize> {
        let slot = FlushSlot::new()?;
        self.slots.push(Some(slot));
        Ok(self.slots.len() - 1)
    }

    pub fn deallocate_slot(&mut self, id: usize) {
        if let Some(slot) = self.slots.get_mut(id) {
            *slot = None;
        }
    }

    fn slot_mut(&mut self, id: usize) -> Result<&mut FlushSlot> {
        self.slots
            .get_mut(id)
            .and_then(|s| s.as_mut())
            .ok_or_else(|| CoreError::invariant(format!("flush slot {id} not allocated")))
    }

    pub fn write_value<T: Serialize>(&mut self, id: usize, value: &T) -> Result<()> {
        self.slot_mut(id)?.write_value(value)
    }

    pub fn read_value<T: DeserializeOwned>(&mut self, id: usize) -> Result<T> {
        self.slot_mut(id)?.read_value()
    }

    pub fn seek(&mut self, id: usize, offset: u64) -> Result<()> {
        self.slot_mut(id)?.seek(offset)
    }

    pub fn tell(&mut self, id: usize) -> Result<u64> {
        Ok(self.slot_mut(id)?.tell())
    }

    /// Drop every slot, deleting the backing temp files
    /// (`TemporaryStorage::removeAll`).
    pub fn remove_all(&mut self) {
        self.slots.clear();
    }
}
