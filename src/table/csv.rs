use ::csv::{self, ReaderBuilder, StringRecord, Trim};
use super::DatasetError;

/// Field separator of dataset files.
pub const DELIMITER : u8 = b'\t';

/// Textual table as read from a dataset file, after the numeric columns
/// were parsed. The header keeps the label column name at position 0.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub header : Vec<String>,
    pub labels : Vec<String>,
    pub rows : Vec<Vec<f64>>
}

fn malformed(line : u64, reason : impl Into<String>) -> DatasetError {
    DatasetError::Malformed { line, reason : reason.into() }
}

// Line reported by the csv reader for a failed record, if it knows it.
fn error_line(e : &csv::Error, fallback : u64) -> u64 {
    e.position().map(|p| p.line() ).unwrap_or(fallback)
}

/// Reads the header entries, which must name the label column and at
/// least one value column.
pub(crate) fn parse_header(
    csv_reader : &mut csv::Reader<&[u8]>
) -> Result<Vec<String>, DatasetError> {
    let header = csv_reader.headers()
        .map_err(|e| malformed(error_line(&e, 1), format!("Unreadable header ({})", e)) )?;
    let entries : Vec<String> = header.iter().map(|e| e.to_string() ).collect();
    match entries.len() {
        0 => Err(malformed(1, "Empty dataset")),
        1 => Err(malformed(1, "Header has no value columns after the label column")),
        _ => Ok(entries)
    }
}

/// Splits a record into its label (first field) and its values, which must
/// all parse as finite f64. The record must have exactly as many fields as the header.
pub(crate) fn parse_row(
    record : &StringRecord,
    n_fields : usize,
    line : u64
) -> Result<(String, Vec<f64>), DatasetError> {
    if record.len() != n_fields {
        return Err(malformed(
            line,
            format!("Row has {} fields, but header has {}", record.len(), n_fields)
        ));
    }
    let mut fields = record.iter();
    let label = fields.next().unwrap_or_default().to_string();
    let mut values = Vec::with_capacity(n_fields - 1);
    for (col, field) in fields.enumerate() {
        match field.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => {
                return Err(malformed(
                    line,
                    format!("Non-numeric value '{}' at value column {}", field, col)
                ));
            }
        }
    }
    Ok((label, values))
}

/// Parses tab-delimited content. The first row is a header and the first column
/// of every row is a label; everything else must be numeric. Rows are returned
/// in file order.
pub(crate) fn parse_tab_delimited(content : &[u8]) -> Result<RawTable, DatasetError> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content);
    let header = parse_header(&mut csv_reader)?;
    let mut labels = Vec::new();
    let mut rows = Vec::new();
    for (ix_rec, row_record) in csv_reader.records().enumerate() {

        // Header sits at line 1, so records without position start at line 2.
        let fallback = ix_rec as u64 + 2;
        let record = row_record
            .map_err(|e| malformed(error_line(&e, fallback), format!("Unreadable record ({})", e)) )?;
        let line = record.position().map(|p| p.line() ).unwrap_or(fallback);
        let (label, values) = parse_row(&record, header.len(), line)?;
        labels.push(label);
        rows.push(values);
    }
    if rows.is_empty() {
        return Err(malformed(1, "No records available"));
    }
    Ok(RawTable { header, labels, rows })
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parses_labels_and_values() {
        let content = "id\tx\ty\na\t1.0\t2.0\nb\t3\t-4.5\n";
        let tbl = parse_tab_delimited(content.as_bytes()).unwrap();
        assert_eq!(tbl.header, vec!["id", "x", "y"]);
        assert_eq!(tbl.labels, vec!["a", "b"]);
        assert_eq!(tbl.rows, vec![vec![1.0, 2.0], vec![3.0, -4.5]]);
    }

    #[test]
    fn empty_label_header_cell() {
        let content = "\tx\n0\t1.5\n1\t2.5\n";
        let tbl = parse_tab_delimited(content.as_bytes()).unwrap();
        assert_eq!(tbl.header.len(), 2);
        assert_eq!(tbl.rows[1], vec![2.5]);
    }

    #[test]
    fn short_row_reports_its_line() {
        let content = "id\tx\ty\na\t1\t2\nb\t3\n";
        match parse_tab_delimited(content.as_bytes()) {
            Err(DatasetError::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected malformed error, got {:?}", other)
        }
    }

    #[test]
    fn non_numeric_value() {
        let content = "id\tx\na\tabc\n";
        assert!(matches!(
            parse_tab_delimited(content.as_bytes()),
            Err(DatasetError::Malformed { line : 2, .. })
        ));
    }

    #[test]
    fn non_finite_value() {
        let content = "id\tx\na\t1\nb\tNaN\n";
        assert!(matches!(
            parse_tab_delimited(content.as_bytes()),
            Err(DatasetError::Malformed { line : 3, .. })
        ));
    }

    #[test]
    fn header_only() {
        let content = "id\tx\ty\n";
        assert!(matches!(parse_tab_delimited(content.as_bytes()), Err(DatasetError::Malformed { .. })));
    }

    #[test]
    fn label_column_only() {
        let content = "id\na\nb\n";
        assert!(matches!(parse_tab_delimited(content.as_bytes()), Err(DatasetError::Malformed { line : 1, .. })));
    }

    #[test]
    fn empty_content() {
        assert!(matches!(parse_tab_delimited(b""), Err(DatasetError::Malformed { .. })));
    }

}
