use crate::domain::registry_snapshot::RegistrySnapshot;
use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What to do with a row that has more fields than the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LongRows {
    /// Count it as malformed and leave it out.
    Skip,
    /// Keep the fields that fit under the header and drop the rest.
    Truncate,
}

/// Parses a registry file.
///
/// Shorter rows are padded with empty fields, so missing columns read as
/// empty strings. Longer rows are handled according to `long_rows`.
pub fn read_table<T: DeserializeOwned>(
    bytes: &[u8],
    long_rows: LongRows,
) -> Result<RegistrySnapshot<T>, anyhow::Error> {
    let decoded = String::from_utf8_lossy(bytes);
    let content = strip_bom(&decoded);

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("Failed to read the CSV header")?
        .clone();

    let mut snapshot = RegistrySnapshot::empty();
    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", index + 1))?;
        let record = if record.len() > headers.len() {
            match long_rows {
                LongRows::Skip => {
                    snapshot.malformed_rows += 1;
                    continue;
                }
                LongRows::Truncate => {
                    tracing::warn!(row = index + 1, "Truncating a CSV row longer than the header");
                    record.iter().take(headers.len()).collect()
                }
            }
        } else {
            pad(&record, headers.len())
        };

        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => snapshot.records.push(row),
            Err(e) => {
                tracing::warn!(row = index + 1, error = %e, "Skipping an unreadable CSV row");
                snapshot.malformed_rows += 1;
            }
        }
    }

    Ok(snapshot)
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

fn pad(record: &StringRecord, len: usize) -> StringRecord {
    let mut padded = record.clone();
    while padded.len() < len {
        padded.push_field("");
    }
    padded
}

/// Serializes rows under `header`, prefixed with a BOM so spreadsheet
/// software opens the accents correctly.
pub fn write_table<T: Serialize>(header: &[&str], rows: &[T]) -> Result<Vec<u8>, anyhow::Error> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.to_vec());

    writer
        .write_record(header)
        .context("Failed to write the CSV header")?;
    for row in rows {
        writer.serialize(row).context("Failed to write a CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush the CSV writer: {}", e.error()))
}

/// Column names of a CSV file, without reading its rows.
pub fn read_header(bytes: &[u8]) -> Result<Vec<String>, anyhow::Error> {
    let decoded = String::from_utf8_lossy(bytes);
    let content = strip_bom(&decoded);
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader.headers().context("Failed to read the CSV header")?;
    Ok(headers.iter().map(str::to_string).collect())
}
