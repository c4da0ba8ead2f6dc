use crate::models::PeriodRecord;

const LINE_TERMINATOR: u8 = b'\n';

#[derive(Debug, thiserror::Error)]
#[error("Failed to encode record for period {period}: {source}")]
pub struct EncodeError {
    pub period: i64,
    #[source]
    pub source: serde_json::Error,
}

/// Encodes records as newline-delimited JSON, one record per line.
///
/// Every line, including the last, ends with `\n`. An empty slice encodes to
/// an empty buffer.
pub fn serialize(records: &[PeriodRecord]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();

    for record in records {
        serde_json::to_writer(&mut out, record).map_err(|source| EncodeError {
            period: record.period,
            source,
        })?;
        out.push(LINE_TERMINATOR);
    }

    Ok(out)
}
