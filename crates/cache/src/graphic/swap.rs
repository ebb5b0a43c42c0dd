//! Swap files holding dematerialised payloads

use super::payload::GraphicPayload;
use gfxswap_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};

/// Anonymous temporary file with one serialised payload
///
/// The file is unlinked on creation and disappears when dropped.
#[derive(Debug)]
pub(crate) struct SwapFile {
    file: File,
    len: u64,
}

impl SwapFile {
    /// Write `payload` to a fresh swap file
    pub(crate) fn write(payload: &GraphicPayload) -> Result<Self> {
        let mut file = tempfile::tempfile().map_err(|e| Error::swap_io("create", e))?;

        {
            let mut writer = BufWriter::new(&mut file);
            bincode::serialize_into(&mut writer, payload)
                .map_err(|e| Error::swap_codec("encode", e))?;
            writer.flush().map_err(|e| Error::swap_io("write", e))?;
        }

        let len = file
            .stream_position()
            .map_err(|e| Error::swap_io("seek", e))?;
        Ok(Self { file, len })
    }

    /// Read the payload back
    pub(crate) fn read(&mut self) -> Result<GraphicPayload> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::swap_io("seek", e))?;
        bincode::deserialize_from(BufReader::new(&mut self.file))
            .map_err(|e| Error::swap_codec("decode", e))
    }

    /// Bytes on disk
    pub(crate) fn len(&self) -> u64 {
        self.len
    }
}
