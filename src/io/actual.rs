//! CSV import of metered monthly energy.
//!
//! Expected columns: `month,central_total_kwh,local_total_kwh,total_kwh`.
//! Energy columns may be omitted or left empty; the `_kWh` spellings are
//! accepted too.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::calibration::ActualDataPoint;

/// Reads metered data rows from any reader.
///
/// # Errors
///
/// Returns a `csv::Error` naming the offending record if a row cannot be parsed.
pub fn read_actual_csv(reader: impl Read) -> Result<Vec<ActualDataPoint>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize().collect()
}

/// Loads metered data from a CSV file.
///
/// # Errors
///
/// Returns a `csv::Error` if the file cannot be opened or parsed.
pub fn load_actual_csv(path: &Path) -> Result<Vec<ActualDataPoint>, csv::Error> {
    let file = File::open(path)?;
    read_actual_csv(io::BufReader::new(file))
}
