//! CSV readers for the raw credit-card tables (plain or zip-compressed).
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::Array2;

use crate::data_handling::CreditTable;

/// Cell contents read as missing values, compared case-insensitively.
///
/// Same set as the pandas `read_csv` default `na_values`.
const MISSING_TOKENS: [&str; 15] = [
    "", "#n/a", "#n/a n/a", "#na", "-1.#ind", "-1.#qnan", "-nan", "1.#ind", "1.#qnan", "<na>",
    "n/a", "na", "nan", "null", "none",
];

/// Read a zip archive holding a single CSV file.
///
/// The first file entry of the archive is parsed; directories are skipped.
pub fn read_csv_zip<P: AsRef<Path>>(path: P) -> Result<CreditTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open zip archive: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read zip archive: {}", path.display()))?;

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        log::debug!("Reading {} from {}", name, path.display());
        return read_csv_from_reader(entry)
            .with_context(|| format!("Failed to parse {} in {}", name, path.display()));
    }

    Err(anyhow!("Zip archive {} contains no files", path.display()))
}

/// Read an uncompressed CSV file.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<CreditTable> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_csv_from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read either format, chosen by the `.zip` extension.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<CreditTable> {
    let is_zip = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if is_zip {
        read_csv_zip(path)
    } else {
        read_csv(path)
    }
}

fn read_csv_from_reader<R: Read>(reader: R) -> Result<CreditTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    if columns.is_empty() {
        return Err(anyhow!("CSV header is empty"));
    }

    let mut data = Vec::new();
    let mut n_rows = 0usize;
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.len() != columns.len() {
            return Err(anyhow!(
                "Row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                columns.len()
            ));
        }
        parse_record(&record, &headers, row_idx, &mut data)?;
        n_rows += 1;
    }

    let values = Array2::from_shape_vec((n_rows, columns.len()), data)?;
    log::info!("Loaded {} rows x {} columns", n_rows, columns.len());
    Ok(CreditTable::new(columns, values)?)
}

fn parse_record(
    record: &StringRecord,
    headers: &StringRecord,
    row_idx: usize,
    out: &mut Vec<f64>,
) -> Result<()> {
    for (col_idx, field) in record.iter().enumerate() {
        let value = if MISSING_TOKENS.contains(&field.to_lowercase().as_str()) {
            f64::NAN
        } else {
            field.parse::<f64>().map_err(|_| {
                anyhow!(
                    "Invalid numeric value '{}' in column '{}' at row {}",
                    field,
                    headers.get(col_idx).unwrap_or("?"),
                    row_idx + 1
                )
            })?
        };
        out.push(value);
    }
    Ok(())
}
