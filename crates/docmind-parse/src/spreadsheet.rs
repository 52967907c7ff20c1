use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use docmind_core::error::{Error, Result};

/// One line per non-empty row, cells joined with ` | `; a header line per
/// sheet when the workbook has more than one.
pub(crate) fn xlsx_text(bytes: &[u8]) -> Result<String> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| Error::Parse(format!("unreadable workbook: {e}")))?;
    let sheet_names = workbook.sheet_names();

    let mut out = String::new();
    for sheet in &sheet_names {
        let range = match workbook.worksheet_range(sheet) {
            Ok(range) if !range.is_empty() => range,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(sheet = %sheet, error = %e, "skipping unreadable sheet");
                continue;
            }
        };
        if sheet_names.len() > 1 {
            out.push_str(&format!("--- Sheet: {sheet} ---\n"));
        }
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(cell_to_string).collect();
            if cells.iter().all(String::is_empty) {
                continue;
            }
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
    }
    Ok(out)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{f:.0}")
            } else {
                format!("{f:.4}").trim_end_matches('0').trim_end_matches('.').to_string()
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}
