//! Archive header and table of contents.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::element::{ScenarioId, MAX_SCENARIO_ID};
use crate::error::FormatFault;
use crate::format::{ARCHIVE_HEADER_LEN, ARCHIVE_MAGIC, ARCHIVE_VERSION, TOC_ENTRY_LEN};

/// Byte range of one scenario inside the archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScenarioDescriptor {
    /// Offset of the first scenario byte.
    pub offset: u32,
    /// Length of the ciphered scenario blob.
    pub length: u32,
}

impl ScenarioDescriptor {
    /// The descriptor as a slice range.
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.length as usize
    }
}

/// Parse the header and table of contents of an archive image.
///
/// Every returned descriptor lies inside `data` and after the table of
/// contents. Empty slots (zero length) are skipped.
pub(crate) fn read_index(data: &[u8]) -> Result<BTreeMap<ScenarioId, ScenarioDescriptor>, FormatFault> {
    if data.len() < ARCHIVE_HEADER_LEN {
        return Err(FormatFault::TruncatedHeader(data.len()));
    }
    let magic = [data[0], data[1], data[2], data[3]];
    if magic != ARCHIVE_MAGIC {
        return Err(FormatFault::BadMagic(magic));
    }
    let version = read_u16(data, 4);
    if version != ARCHIVE_VERSION {
        return Err(FormatFault::UnsupportedVersion(version));
    }
    let entries = read_u32(data, 8);

    let toc_end = (entries as usize)
        .checked_mul(TOC_ENTRY_LEN)
        .and_then(|len| len.checked_add(ARCHIVE_HEADER_LEN))
        .filter(|end| *end <= data.len())
        .ok_or(FormatFault::TocSize {
            entries,
            needed: ARCHIVE_HEADER_LEN.saturating_add((entries as usize).saturating_mul(TOC_ENTRY_LEN)),
            available: data.len(),
        })?;

    let mut index = BTreeMap::new();
    for entry in data[ARCHIVE_HEADER_LEN..toc_end].chunks_exact(TOC_ENTRY_LEN) {
        let raw_id = read_u32(entry, 0);
        let offset = read_u32(entry, 4);
        let length = read_u32(entry, 8);

        let id = u16::try_from(raw_id)
            .ok()
            .filter(|id| *id <= MAX_SCENARIO_ID)
            .map(ScenarioId::new)
            .ok_or(FormatFault::IdOutOfRange(raw_id))?;
        if length == 0 {
            continue;
        }
        if index.contains_key(&id) {
            return Err(FormatFault::DuplicateId(id));
        }

        let start = offset as usize;
        let in_bounds = start >= toc_end
            && start
                .checked_add(length as usize)
                .is_some_and(|end| end <= data.len());
        if !in_bounds {
            return Err(FormatFault::RangeOutOfBounds { id, offset, length });
        }
        index.insert(id, ScenarioDescriptor { offset, length });
    }
    Ok(index)
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(entries: &[(u32, u32, u32)], total: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&ARCHIVE_MAGIC);
        out.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for (id, offset, length) in entries {
            out.extend_from_slice(&id.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&length.to_le_bytes());
        }
        out.resize(total.max(out.len()), 0);
        out
    }

    #[test]
    fn test_reads_entries_in_id_order() {
        let data = image(&[(7, 100, 10), (2, 50, 20), (3, 0, 0)], 200);
        let index = read_index(&data).unwrap();
        assert_eq!(
            index.into_iter().collect::<Vec<_>>(),
            vec![
                (ScenarioId::new(2), ScenarioDescriptor { offset: 50, length: 20 }),
                (ScenarioId::new(7), ScenarioDescriptor { offset: 100, length: 10 }),
            ]
        );
    }

    #[test]
    fn test_header_faults() {
        assert_eq!(read_index(&[0; 4]), Err(FormatFault::TruncatedHeader(4)));

        let mut data = image(&[], 12);
        data[0] = b'X';
        assert!(matches!(read_index(&data), Err(FormatFault::BadMagic(_))));

        let mut data = image(&[], 12);
        data[4] = 2;
        assert_eq!(read_index(&data), Err(FormatFault::UnsupportedVersion(2)));
    }

    #[test]
    fn test_toc_larger_than_file() {
        let mut data = image(&[], 12);
        data[8..12].copy_from_slice(&3u32.to_le_bytes());
        assert_eq!(
            read_index(&data),
            Err(FormatFault::TocSize {
                entries: 3,
                needed: 48,
                available: 12
            })
        );
    }

    #[test]
    fn test_entry_faults() {
        let data = image(&[(10_000, 100, 1)], 200);
        assert_eq!(read_index(&data), Err(FormatFault::IdOutOfRange(10_000)));

        let data = image(&[(1, 100, 1), (1, 120, 1)], 200);
        assert_eq!(
            read_index(&data),
            Err(FormatFault::DuplicateId(ScenarioId::new(1)))
        );

        let data = image(&[(1, 190, 20)], 200);
        assert!(matches!(
            read_index(&data),
            Err(FormatFault::RangeOutOfBounds { offset: 190, length: 20, .. })
        ));

        // a range starting inside the table of contents
        let data = image(&[(1, 4, 8)], 200);
        assert!(matches!(
            read_index(&data),
            Err(FormatFault::RangeOutOfBounds { offset: 4, .. })
        ));

        let data = image(&[(1, u32::MAX, u32::MAX)], 200);
        assert!(matches!(
            read_index(&data),
            Err(FormatFault::RangeOutOfBounds { .. })
        ));
    }
}
