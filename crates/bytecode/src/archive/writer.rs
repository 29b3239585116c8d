//! Archive container writer.

use std::collections::BTreeMap;
use std::path::Path;

use crate::cipher::CipherKey;
use crate::element::ScenarioId;
use crate::encode::encode_scenario;
use crate::error::{ArchiveError, EncodeError};
use crate::format::{ARCHIVE_HEADER_LEN, ARCHIVE_MAGIC, ARCHIVE_VERSION, TOC_ENTRY_LEN};
use crate::scenario::Scenario;

/// Builds an archive image from scenario blobs.
///
/// Blobs are laid out in id order directly after the table of contents and
/// are individually enciphered with the writer's key.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    key: CipherKey,
    blobs: BTreeMap<ScenarioId, Vec<u8>>,
}

impl ArchiveWriter {
    /// Writer producing an archive readable with `key`.
    pub fn new(key: CipherKey) -> Self {
        Self {
            key,
            blobs: BTreeMap::new(),
        }
    }

    /// Add an already encoded scenario blob. A later blob with the same id replaces the earlier one.
    pub fn add_blob(&mut self, id: ScenarioId, blob: Vec<u8>) -> &mut Self {
        self.blobs.insert(id, blob);
        self
    }

    /// Encode and add a scenario under its own id.
    pub fn add_scenario(&mut self, scenario: &Scenario) -> Result<&mut Self, EncodeError> {
        let blob = encode_scenario(scenario)?;
        Ok(self.add_blob(scenario.id(), blob))
    }

    /// Number of scenarios added so far.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no scenario has been added.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Produce the archive image.
    pub fn finish(&self) -> Result<Vec<u8>, EncodeError> {
        let toc_len = ARCHIVE_HEADER_LEN + TOC_ENTRY_LEN * self.blobs.len();
        let data_len: usize = self.blobs.values().map(Vec::len).sum();
        let count = to_u32("table of contents", self.blobs.len())?;
        to_u32("archive", toc_len + data_len)?;

        let mut out = Vec::with_capacity(toc_len + data_len);
        out.extend_from_slice(&ARCHIVE_MAGIC);
        out.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());

        let mut offset = toc_len;
        for (id, blob) in &self.blobs {
            out.extend_from_slice(&u32::from(id.get()).to_le_bytes());
            out.extend_from_slice(&to_u32("archive", offset)?.to_le_bytes());
            out.extend_from_slice(&to_u32("scenario", blob.len())?.to_le_bytes());
            offset += blob.len();
        }
        for blob in self.blobs.values() {
            out.extend_from_slice(&self.key.encrypt(blob));
        }
        Ok(out)
    }

    /// Write the archive image to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        let path = path.as_ref();
        let image = self.finish().map_err(|err| ArchiveError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, err),
        })?;
        std::fs::write(path, image).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn to_u32(what: &'static str, len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLong { what, len })
}
