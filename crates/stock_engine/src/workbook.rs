use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use stock_core::{CellValue, Column, ReportTable};
use stock_logging::stock_info;

use crate::persist::{AtomicFileWriter, PersistError};

const HEADER_ROW: RowNum = 0;
const TOTALS_ROW: RowNum = 1;
const FIRST_RECORD_ROW: RowNum = 2;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("failed to build workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("report has too many rows for one worksheet ({0})")]
    TooManyRows(usize),
    #[error("failed to save workbook: {0}")]
    Persist(#[from] PersistError),
}

/// `{username}_{YYYY-MM-DD}.xlsx`, with path-hostile characters replaced.
pub fn workbook_filename(username: &str, date: NaiveDate) -> String {
    let user: String = username
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    format!("{user}_{}.xlsx", date.format("%Y-%m-%d"))
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

/// Serialize the table: labels, then the totals row, then one row per record.
pub fn render_workbook(table: &ReportTable) -> Result<Vec<u8>, WorkbookError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (index, spec) in Column::specs().iter().enumerate() {
        let col = index as ColNum;
        let format = spec.number_format.map(|code| Format::new().set_num_format(code));
        sheet.set_column_width(col, spec.width)?;
        if let Some(format) = &format {
            sheet.set_column_format(col, format)?;
        }
        sheet.write_string(HEADER_ROW, col, spec.label)?;
        if let Some(total) = table.total(spec.column) {
            write_number(sheet, TOTALS_ROW, col, total, format.as_ref())?;
        }
        for (offset, record) in table.rows().iter().enumerate() {
            let row = record_row(offset)?;
            match spec.column.cell(record) {
                CellValue::Text(text) => {
                    sheet.write_string(row, col, text)?;
                }
                CellValue::Number(value) => write_number(sheet, row, col, value, format.as_ref())?,
                CellValue::Empty => {}
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

/// Render the table and atomically save it as `dir/filename`.
pub fn write_workbook(
    table: &ReportTable,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, WorkbookError> {
    let bytes = render_workbook(table)?;
    let path = AtomicFileWriter::new(dir.to_path_buf()).write(filename, &bytes)?;
    stock_info!("Wrote workbook with {} rows to {:?}", table.len(), path);
    Ok(path)
}

fn record_row(offset: usize) -> Result<RowNum, WorkbookError> {
    RowNum::try_from(offset)
        .ok()
        .and_then(|row| row.checked_add(FIRST_RECORD_ROW))
        .ok_or(WorkbookError::TooManyRows(offset))
}

fn write_number(
    sheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: u64,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match format {
        Some(format) => sheet.write_number_with_format(row, col, value as f64, format)?,
        None => sheet.write_number(row, col, value as f64)?,
    };
    Ok(())
}
