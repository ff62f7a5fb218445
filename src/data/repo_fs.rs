//! Flat-file writer for synthetic datasets.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::common::error::PrepResult;

use super::domain::{SyntheticOrderRecord, CSV_HEADER};

/// Write records as comma separated values with a header row. Floats carry two
/// decimals and `is_peak_hour` is written as 0/1, so equal input gives equal
/// bytes.
pub fn write_csv(path: &Path, records: &[SyntheticOrderRecord]) -> PrepResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{:.2},{:.2}",
            r.vendor_id,
            r.order_hour,
            r.day_of_week,
            r.item_count,
            u8::from(r.is_peak_hour),
            r.historical_delay_avg,
            r.prep_time_minutes
        )?;
    }
    out.flush()?;
    Ok(())
}
