//! Bulk entry import from newline-delimited JSON.
//!
//! Each non-blank line is one `{"id", "title", "content"}` object.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::StoreError;
use crate::interfaces::EntryImporter;
use miniflux_indexer_shared::Entry;

/// Longest accepted input line in bytes.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Insert every entry read from `reader` into `importer`.
///
/// Stops between lines when `cancel` fires. A malformed or oversized line
/// aborts the import with [`StoreError::ImportError`].
///
/// # Returns
///
/// * `Ok(usize)` - Number of entries inserted
/// * `Err(StoreError)` - The first decode or insert failure
pub async fn import_entries<R>(
    mut reader: R,
    importer: &dyn EntryImporter,
    cancel: &CancellationToken,
) -> Result<usize, StoreError>
where
    R: AsyncBufRead + Unpin,
{
    info!("Start importing");

    let mut line = Vec::new();
    let mut line_no = 0usize;
    let mut imported = 0usize;

    loop {
        line.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(imported, "Import cancelled");
                break;
            }
            read = read_line(&mut reader, &mut line) => read,
        };

        let read = read.map_err(|e| StoreError::import(line_no + 1, e.to_string()))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        if line.len() > MAX_LINE_BYTES {
            return Err(StoreError::import(
                line_no,
                format!("line exceeds {} bytes", MAX_LINE_BYTES),
            ));
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let entry: Entry = serde_json::from_slice(&line)
            .map_err(|e| StoreError::import(line_no, e.to_string()))?;
        importer.insert_entry(&entry).await?;
        debug!(entry_id = entry.id, "Entry imported");
        imported += 1;
    }

    info!(imported, lines = line_no, "Import finished");
    Ok(imported)
}

/// Read one line into `line` without its terminator, buffering at most
/// one byte past [`MAX_LINE_BYTES`].
///
/// Returns the number of bytes consumed; zero means end of input. A line
/// longer than the limit is left truncated to `MAX_LINE_BYTES + 1` bytes.
async fn read_line<R>(reader: &mut R, line: &mut Vec<u8>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_LINE_BYTES as u64 + 1;
    let read = (&mut *reader).take(limit).read_until(b'\n', line).await?;

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    Ok(read)
}
