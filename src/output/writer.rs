//! Append-only CSV row writer
//!
//! Every call opens the file in append mode, writes one UTF-8 record and
//! flushes, so an interrupted run leaves a valid prefix behind.

use std::fs::OpenOptions;
use std::path::Path;

/// Appends one row of text fields to the CSV file at `path`
///
/// The file is created if it does not exist. Fields are quoted only when
/// they contain a delimiter, quote or line break.
pub fn append_row<I, S>(path: &Path, fields: I) -> Result<(), csv::Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record(fields)?;
    writer.flush()?;
    Ok(())
}
