use csv::{ErrorKind, ReaderBuilder, StringRecord};

use crate::types::{AppError, AppResult};

const MISSING: &str = "NaN";
const COLUMN_GAP: &str = "  ";

/// Render comma-delimited data (header row assumed) as an aligned text table.
///
/// Each data row is prefixed with its zero-based index and every column is
/// right-justified to its widest cell.
pub(super) fn render_csv(content: &[u8]) -> AppResult<String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(map_csv_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() {
        return Err(AppError::Parse("no columns to parse".to_string()));
    }

    let mut records: Vec<StringRecord> = Vec::new();
    for record in rdr.records() {
        records.push(record.map_err(map_csv_error)?);
    }
    let rows = cells(&records, headers.len());

    if records.is_empty() {
        return Ok(format!(
            "Empty DataFrame\nColumns: [{}]\nIndex: []",
            headers.join(", ")
        ));
    }

    Ok(layout(&headers, &rows))
}

/// Cell text per row. An integer column with a gap turns into a float
/// column, so its values print as `1.0` next to `NaN`.
fn cells(records: &[StringRecord], columns: usize) -> Vec<Vec<String>> {
    let promoted: Vec<bool> = (0..columns)
        .map(|col| {
            let values = records.iter().filter_map(|r| r.get(col));
            let has_gap = values.clone().any(str::is_empty);
            has_gap
                && values
                    .filter(|v| !v.is_empty())
                    .all(|v| v.trim().parse::<i64>().is_ok())
        })
        .collect();

    records
        .iter()
        .map(|record| {
            record
                .iter()
                .enumerate()
                .map(|(col, field)| match field.trim().parse::<i64>() {
                    _ if field.is_empty() => MISSING.to_string(),
                    Ok(n) if promoted.get(col).copied().unwrap_or(false) => format!("{}.0", n),
                    _ => field.to_string(),
                })
                .collect()
        })
        .collect()
}

fn layout(headers: &[String], rows: &[Vec<String>]) -> String {
    let index_width = (rows.len() - 1).to_string().len();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header_line = " ".repeat(index_width);
    for (header, width) in headers.iter().zip(&widths) {
        header_line.push_str(COLUMN_GAP);
        header_line.push_str(&right_justify(header, *width));
    }
    lines.push(header_line);

    for (idx, row) in rows.iter().enumerate() {
        let mut line = right_justify(&idx.to_string(), index_width);
        for (cell, width) in row.iter().zip(&widths) {
            line.push_str(COLUMN_GAP);
            line.push_str(&right_justify(cell, *width));
        }
        lines.push(line);
    }

    lines.join("\n")
}

fn right_justify(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        value.to_string()
    } else {
        format!("{}{}", " ".repeat(width - len), value)
    }
}

fn map_csv_error(err: csv::Error) -> AppError {
    match err.kind() {
        ErrorKind::Utf8 { .. } => AppError::Decode(err.to_string()),
        _ => AppError::Parse(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_aligned_table() {
        let text = render_csv(b"name,age\nAlice,30\nBob,25\n").unwrap();
        let expected = "    name  age\n0  Alice   30\n1    Bob   25";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_index_column_widens() {
        let mut data = String::from("n\n");
        for i in 0..11 {
            data.push_str(&format!("{}\n", i * 100));
        }
        let text = render_csv(data.as_bytes()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "       n");
        assert_eq!(lines[1], " 0     0");
        assert_eq!(lines[11], "10  1000");
    }

    #[test]
    fn test_missing_cells_render_nan() {
        let text = render_csv(b"name,city\nAlice,\n,Paris\n").unwrap();
        let expected = "    name   city\n0  Alice    NaN\n1    NaN  Paris";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_integer_column_with_gap_prints_as_float() {
        let text = render_csv(b"a,b\n1,\n,2\n3,4\n").unwrap();
        let expected = "     a    b\n0  1.0  NaN\n1  NaN  2.0\n2  3.0  4.0";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_complete_integer_column_keeps_integers() {
        let text = render_csv(b"id,label\n1,x\n2,\n").unwrap();
        assert_eq!(text, "   id  label\n0   1      x\n1   2    NaN");
    }

    #[test]
    fn test_header_only() {
        let text = render_csv(b"city,population\n").unwrap();
        assert_eq!(text, "Empty DataFrame\nColumns: [city, population]\nIndex: []");
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(render_csv(b""), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_ragged_rows_are_parse_error() {
        let result = render_csv(b"a,b\n1,2\n3,4,5\n");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let result = render_csv(b"a,b\n\xff\xfe,2\n");
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[test]
    fn test_quoted_fields() {
        let text = render_csv(b"title,note\n\"Hello, world\",ok\n").unwrap();
        assert_eq!(text, "          title  note\n0  Hello, world    ok");
    }
}
