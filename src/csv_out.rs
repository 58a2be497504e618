use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::FilterError;
use crate::model::MergedOutput;

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn write_records<W: Write>(
    mut sink: W,
    merged: &MergedOutput,
    delimiter: u8,
) -> Result<W, FilterError> {
    sink.write_all(UTF8_BOM)?;
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(sink);
    writer.write_record(&merged.headers)?;
    for row in &merged.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|error| FilterError::Io(error.into_error()))
}

pub(crate) fn write_csv(
    path: &Path,
    merged: &MergedOutput,
    delimiter: u8,
) -> Result<(), FilterError> {
    let file = write_records(File::create(path)?, merged, delimiter)?;
    file.sync_all()?;
    Ok(())
}

pub(crate) fn write_csv_to_string(
    merged: &MergedOutput,
    delimiter: u8,
) -> Result<String, FilterError> {
    let bytes = write_records(Vec::new(), merged, delimiter)?;
    String::from_utf8(bytes)
        .map_err(|error| FilterError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
