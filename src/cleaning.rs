//! Row and column cleaning for the raw credit-card tables.
use crate::data_handling::{CreditTable, TARGET_COLUMN};
use crate::error::{PipelineError, Result};

/// Target column name as it appears in the raw files.
pub const RAW_TARGET_COLUMN: &str = "default payment next month";
pub const ID_COLUMN: &str = "ID";

/// Education codes above this value are merged into "others".
pub const EDUCATION_OTHERS: f64 = 4.0;

/// Categorical columns where a zero code means "unknown".
const CODED_COLUMNS: [&str; 3] = ["SEX", "EDUCATION", "MARRIAGE"];

/// Row counts removed by each cleaning rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningSummary {
    pub input_rows: usize,
    pub missing_rows: usize,
    pub invalid_code_rows: usize,
    pub education_remapped: usize,
    pub output_rows: usize,
}

/// Clean a raw table.
///
/// Renames the target, drops `ID`, drops rows with missing values or zero
/// codes in SEX/EDUCATION/MARRIAGE, and caps EDUCATION at 4. Dropped rows
/// never produce an error; a missing coded column does.
pub fn clean_table(table: CreditTable) -> Result<(CreditTable, CleaningSummary)> {
    let mut table = table;
    let mut summary = CleaningSummary {
        input_rows: table.nrows(),
        ..CleaningSummary::default()
    };

    table.rename_column(RAW_TARGET_COLUMN, TARGET_COLUMN);
    table.drop_column(ID_COLUMN);

    let complete: Vec<bool> = table
        .values
        .rows()
        .into_iter()
        .map(|row| row.iter().all(|v| !v.is_nan()))
        .collect();
    summary.missing_rows = complete.iter().filter(|&&keep| !keep).count();
    let mut table = table.filter(&complete);

    let coded_idx = CODED_COLUMNS
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| {
                PipelineError::InvalidParameter(format!("required column '{}' not found", name))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let valid: Vec<bool> = table
        .values
        .rows()
        .into_iter()
        .map(|row| coded_idx.iter().all(|&c| row[c] != 0.0))
        .collect();
    summary.invalid_code_rows = valid.iter().filter(|&&keep| !keep).count();
    table = table.filter(&valid);

    // Coded columns were checked above, EDUCATION is one of them.
    let education_idx = coded_idx[1];
    for v in table.values.column_mut(education_idx).iter_mut() {
        if *v > EDUCATION_OTHERS {
            *v = EDUCATION_OTHERS;
            summary.education_remapped += 1;
        }
    }

    summary.output_rows = table.nrows();
    log::info!(
        "Cleaning kept {} of {} rows ({} with missing values, {} with invalid codes, {} education codes merged into others)",
        summary.output_rows,
        summary.input_rows,
        summary.missing_rows,
        summary.invalid_code_rows,
        summary.education_remapped
    );

    Ok((table, summary))
}
