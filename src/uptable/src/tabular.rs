//! CSV interchange for property tables
//!
//! Export writes one row per entry: a `Tag` column, one column per scalar
//! property and one `Property[index]` column per array element. Array columns
//! cover the longest array of that property across all entries; shorter
//! entries leave the extra cells empty.
//!
//! Import reads the same shape back and turns every changed cell into an
//! [`Edit`]. Rows map to entries by position.

use tracing::debug;

use crate::entries::PropertyTable;
use crate::patch::Edit;
use crate::property::{Scalar, Value};
use crate::{Error, Result};

const TAG_COLUMN: &str = "Tag";

/// CSV export settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Write numeric cells as `="n"` so spreadsheets keep them verbatim
    pub formula_escape: bool,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub entry: usize,
    pub column: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Tag,
    Scalar { position: usize },
    Element { position: usize, index: usize },
}

impl Column {
    fn header(self, table: &PropertyTable) -> String {
        match self {
            Self::Tag => TAG_COLUMN.to_string(),
            Self::Scalar { position } => property_name(table, position).to_string(),
            Self::Element { position, index } => {
                format!("{}[{}]", property_name(table, position), index)
            }
        }
    }

    fn position(self) -> Option<usize> {
        match self {
            Self::Tag => None,
            Self::Scalar { position } | Self::Element { position, .. } => Some(position),
        }
    }
}

fn property_name(table: &PropertyTable, position: usize) -> &str {
    table
        .schema()
        .get(position)
        .map(|p| p.name.as_str())
        .unwrap_or_default()
}

/// Column layout for a table, in schema order
fn columns(table: &PropertyTable) -> Vec<Column> {
    let mut columns = vec![Column::Tag];
    for (position, descriptor) in table.schema().iter().enumerate() {
        if !descriptor.is_array() {
            columns.push(Column::Scalar { position });
            continue;
        }
        let longest = table
            .entries()
            .iter()
            .filter_map(|e| e.value(position).and_then(Value::as_array))
            .map(<[Scalar]>::len)
            .max()
            .unwrap_or(0);
        columns.extend((0..longest).map(|index| Column::Element { position, index }));
    }
    columns
}

/// Current value of a cell, `None` when the entry has no such element
fn cell<'a>(table: &'a PropertyTable, entry: usize, column: Column) -> Option<CellRef<'a>> {
    let entry_ref = table.entries().get(entry)?;
    match column {
        Column::Tag => Some(CellRef::Tag(&entry_ref.tag)),
        Column::Scalar { position } => entry_ref
            .value(position)?
            .as_scalar()
            .map(CellRef::Scalar),
        Column::Element { position, index } => entry_ref
            .value(position)?
            .as_array()?
            .get(index)
            .map(CellRef::Scalar),
    }
}

enum CellRef<'a> {
    Tag(&'a str),
    Scalar(&'a Scalar),
}

impl CellRef<'_> {
    fn text(&self) -> String {
        match self {
            Self::Tag(tag) => (*tag).to_string(),
            Self::Scalar(value) => value.to_string(),
        }
    }
}

/// Render a table as CSV
pub fn export_csv(table: &PropertyTable, options: &ExportOptions) -> String {
    let columns = columns(table);
    let mut out = String::new();

    let headers: Vec<String> = columns.iter().map(|c| c.header(table)).collect();
    write_record(&mut out, headers.iter().map(String::as_str));

    for entry in 0..table.entries().len() {
        let cells: Vec<String> = columns
            .iter()
            .map(|&column| match cell(table, entry, column) {
                Some(CellRef::Scalar(value)) if options.formula_escape && value.kind().is_numeric() => {
                    format!("=\"{}\"", value)
                }
                Some(found) => found.text(),
                None => String::new(),
            })
            .collect();
        write_record(&mut out, cells.iter().map(String::as_str));
    }

    debug!(
        rows = table.entries().len(),
        columns = columns.len(),
        "exported table"
    );
    out
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

/// Resolve a header cell against the schema
fn parse_header(table: &PropertyTable, header: &str) -> Result<Column> {
    if header == TAG_COLUMN {
        return Ok(Column::Tag);
    }

    let unknown = || Error::UnknownField(header.to_string());
    let schema = table.schema();

    let indexed = header
        .strip_suffix(']')
        .and_then(|h| h.rfind('[').map(|at| (&h[..at], &h[at + 1..])));
    if let Some((name, index)) = indexed {
        let index: usize = index.parse().map_err(|_| unknown())?;
        let (position, descriptor) = schema.find(name).ok_or_else(unknown)?;
        if !descriptor.is_array() {
            return Err(unknown());
        }
        return Ok(Column::Element { position, index });
    }

    match schema.find(header) {
        Some((position, descriptor)) if !descriptor.is_array() => Ok(Column::Scalar { position }),
        _ => Err(unknown()),
    }
}

/// Strip the `="..."` wrapper written by formula-escaped exports
fn unescape_formula(text: &str) -> &str {
    text.strip_prefix("=\"")
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Compare an edited CSV against the table and collect the changed cells
///
/// Empty cells are ignored. A cell whose parsed value equals the current
/// value produces no edit.
pub fn import_csv(table: &PropertyTable, text: &str) -> Result<Vec<Edit>> {
    let mut records = parse_csv(text)?.into_iter();
    let Some((header_line, headers)) = records.next() else {
        return Ok(Vec::new());
    };

    let columns = headers
        .iter()
        .map(|h| parse_header(table, h))
        .collect::<Result<Vec<_>>>()?;
    let tag_column = columns
        .iter()
        .position(|c| *c == Column::Tag)
        .ok_or_else(|| Error::Table {
            line: header_line,
            message: format!("missing {} column", TAG_COLUMN),
        })?;

    let mut edits = Vec::new();
    for (entry, (line, fields)) in records.enumerate() {
        if fields.len() > columns.len() {
            return Err(Error::Table {
                line,
                message: format!("expected {} fields, got {}", columns.len(), fields.len()),
            });
        }
        let current = table.entry(entry)?;

        let tag = fields.get(tag_column).map(String::as_str).unwrap_or_default();
        if tag != current.tag {
            return Err(Error::TagMismatch {
                entry,
                expected: current.tag.clone(),
                actual: tag.to_string(),
            });
        }

        for (&column, field) in columns.iter().zip(&fields) {
            if let Some(edit) = cell_edit(table, entry, column, field)? {
                edits.push(edit);
            }
        }
    }

    debug!(edits = edits.len(), "imported table");
    Ok(edits)
}

fn cell_edit(
    table: &PropertyTable,
    entry: usize,
    column: Column,
    field: &str,
) -> Result<Option<Edit>> {
    let Some(position) = column.position() else {
        return Ok(None);
    };
    let Some(descriptor) = table.schema().get(position) else {
        return Ok(None);
    };
    let field = if descriptor.kind.is_numeric() {
        unescape_formula(field)
    } else {
        field
    };
    if field.is_empty() {
        return Ok(None);
    }

    let value = Scalar::parse(descriptor.kind, field)?;

    let current = match cell(table, entry, column) {
        Some(CellRef::Scalar(current)) => current,
        _ => {
            // The entry has fewer elements than the column set
            let len = table
                .entries()
                .get(entry)
                .and_then(|e| e.value(position))
                .and_then(Value::as_array)
                .map_or(0, <[Scalar]>::len);
            let index = match column {
                Column::Element { index, .. } => index,
                _ => 0,
            };
            return Err(Error::ArrayIndexOutOfRange {
                entry,
                property: descriptor.name.clone(),
                index,
                len,
            });
        }
    };

    if *current == value {
        return Ok(None);
    }

    Ok(Some(match column {
        Column::Element { index, .. } => Edit::element(entry, &descriptor.name, index, value),
        _ => Edit::scalar(entry, &descriptor.name, value),
    }))
}

/// Parse RFC 4180 CSV into records tagged with their starting line
///
/// Blank lines are skipped. Both LF and CRLF line endings are accepted.
fn parse_csv(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while chars.peek().is_some() {
        let start_line = line;
        let mut fields = Vec::new();
        let mut field = String::new();

        loop {
            match chars.next() {
                None => {
                    fields.push(std::mem::take(&mut field));
                    break;
                }
                Some('"') if field.is_empty() => {
                    read_quoted(&mut chars, &mut field, &mut line, start_line)?;
                    match chars.peek() {
                        None | Some(',' | '\r' | '\n') => {}
                        Some(c) => {
                            return Err(Error::Table {
                                line,
                                message: format!("unexpected '{}' after closing quote", c),
                            })
                        }
                    }
                }
                Some(',') => fields.push(std::mem::take(&mut field)),
                Some('\r') if chars.peek() == Some(&'\n') => {}
                Some('\n') => {
                    line += 1;
                    fields.push(std::mem::take(&mut field));
                    break;
                }
                Some(c) => field.push(c),
            }
        }

        let blank = fields.len() == 1 && fields[0].is_empty();
        if !blank {
            records.push((start_line, fields));
        }
    }

    Ok(records)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    field: &mut String,
    line: &mut usize,
    start_line: usize,
) -> Result<()> {
    loop {
        match chars.next() {
            None => {
                return Err(Error::Table {
                    line: start_line,
                    message: "unterminated quoted field".to_string(),
                })
            }
            Some('"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    return Ok(());
                }
            }
            Some(c) => {
                if c == '\n' {
                    *line += 1;
                }
                field.push(c);
            }
        }
    }
}

/// Case-insensitive substring search over tags and cell values
pub fn find(table: &PropertyTable, needle: &str) -> Vec<Match> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle = needle.to_lowercase();
    let columns = columns(table);

    let mut matches = Vec::new();
    for entry in 0..table.entries().len() {
        for &column in &columns {
            let Some(found) = cell(table, entry, column) else {
                continue;
            };
            let text = found.text();
            if text.to_lowercase().contains(&needle) {
                matches.push(Match {
                    entry,
                    column: column.header(table),
                    text,
                });
            }
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyType;
    use crate::testing::*;
    use crate::NameTable;

    fn table() -> PropertyTable {
        let names = NameTable::new(NAMES.iter().map(|s| s.to_string()).collect());
        PropertyTable::parse(&sample_table(), &names).unwrap()
    }

    fn lines(csv: &str) -> Vec<&str> {
        csv.split("\r\n").filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_export_layout() {
        let table = table();
        let csv = export_csv(&table, &ExportOptions::default());
        let rows = lines(&csv);

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            "Tag,Hp,Speed,Alive,Level,Grade,Enabled,Label,Kind,\
             Drops_Array[0],Drops_Array[1],Drops_Array[2],\
             Flags_Array[0],Flags_Array[1],Flags_Array[2],\
             Kinds_Array[0],Kinds_Array[1],\
             Small_Array[0],Small_Array[1],\
             Titles_Array[0]"
        );
        assert_eq!(
            rows[1],
            "Row_A,100,1.5,1,300,7,1,Sword,Fire,10,20,30,1,0,,Fire,Ice,5,-1,a"
        );
        assert_eq!(
            rows[2],
            "Row_B,-5,0.25,0,0,255,0,\u{3042}\u{3044},None,,,,1,1,1,,,,,"
        );
    }

    #[test]
    fn test_export_formula_escape() {
        let table = table();
        let csv = export_csv(
            &table,
            &ExportOptions {
                formula_escape: true,
            },
        );
        let rows = lines(&csv);
        assert!(rows[1].starts_with("Row_A,\"=\"\"100\"\"\",\"=\"\"1.5\"\"\","));
        // Text cells stay plain
        assert!(rows[1].contains(",Sword,Fire,"));

        assert!(import_csv(&table, &csv).unwrap().is_empty());
    }

    #[test]
    fn test_export_quotes_special_characters() {
        let mut out = String::new();
        write_record(&mut out, ["a,b", "say \"hi\"", "two\nlines", "plain"].into_iter());
        assert_eq!(
            out,
            "\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\",plain\r\n"
        );
        let parsed = parse_csv(&out).unwrap();
        assert_eq!(
            parsed,
            vec![(
                1,
                vec![
                    "a,b".to_string(),
                    "say \"hi\"".to_string(),
                    "two\nlines".to_string(),
                    "plain".to_string()
                ]
            )]
        );
    }

    #[test]
    fn test_roundtrip_without_changes_yields_no_edits() {
        let table = table();
        let csv = export_csv(&table, &ExportOptions::default());
        assert!(import_csv(&table, &csv).unwrap().is_empty());
    }

    #[test]
    fn test_changed_cells_yield_edits() {
        let table = table();
        let csv = export_csv(&table, &ExportOptions::default());
        let csv = csv
            .replace("Row_A,100,", "Row_A,150,")
            .replace(",Fire,Ice,5,-1,", ",Fire,Fire,5,-1,");

        let edits = import_csv(&table, &csv).unwrap();
        assert_eq!(
            edits,
            vec![
                Edit::scalar(0, "Hp", Scalar::Int32(150)),
                Edit::element(0, "Kinds_Array", 1, Scalar::Name("Fire".to_string())),
            ]
        );
    }

    #[test]
    fn test_equivalent_float_text_is_unchanged() {
        let table = table();
        let csv = export_csv(&table, &ExportOptions::default()).replace(",1.5,", ",1.50,");
        assert!(import_csv(&table, &csv).unwrap().is_empty());
    }

    #[test]
    fn test_tag_mismatch() {
        let table = table();
        let csv = export_csv(&table, &ExportOptions::default()).replace("Row_B,", "Row_C,");
        assert!(matches!(
            import_csv(&table, &csv),
            Err(Error::TagMismatch { entry: 1, ref expected, ref actual })
                if expected == "Row_B" && actual == "Row_C"
        ));
    }

    #[test]
    fn test_unknown_column() {
        let table = table();
        for header in ["Mana", "Hp[0]", "Drops_Array", "Drops_Array[x]"] {
            let csv = format!("Tag,{}\r\nRow_A,1\r\n", header);
            assert!(
                matches!(import_csv(&table, &csv), Err(Error::UnknownField(ref f)) if f == header),
                "{header} accepted"
            );
        }
    }

    #[test]
    fn test_partial_columns() {
        let table = table();
        let csv = "Tag,Grade\nRow_A,8\nRow_B,255\n";
        let edits = import_csv(&table, csv).unwrap();
        assert_eq!(edits, vec![Edit::scalar(0, "Grade", Scalar::Byte(8))]);
    }

    #[test]
    fn test_missing_tag_column() {
        let table = table();
        assert!(matches!(
            import_csv(&table, "Hp\n1\n"),
            Err(Error::Table { line: 1, .. })
        ));
    }

    #[test]
    fn test_too_many_rows() {
        let table = table();
        let csv = "Tag,Hp\nRow_A,100\nRow_B,-5\nRow_C,1\n";
        assert!(matches!(
            import_csv(&table, csv),
            Err(Error::EntryIndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_value_outside_element_range() {
        let table = table();
        let csv = "Tag,Grade\nRow_A,256\n";
        assert!(matches!(
            import_csv(&table, csv),
            Err(Error::InvalidValue {
                kind: PropertyType::Byte,
                ..
            })
        ));
    }

    #[test]
    fn test_value_for_missing_element() {
        let table = table();
        let csv = "Tag,Drops_Array[0]\nRow_A,10\nRow_B,5\n";
        assert!(matches!(
            import_csv(&table, csv),
            Err(Error::ArrayIndexOutOfRange {
                entry: 1,
                index: 0,
                len: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_changed_string_produces_edit() {
        let table = table();
        let csv = "Tag,Label\nRow_A,Axe\n";
        let edits = import_csv(&table, csv).unwrap();
        assert_eq!(
            edits,
            vec![Edit::scalar(0, "Label", Scalar::String("Axe".to_string()))]
        );
    }

    #[test]
    fn test_formula_wrapper_kept_on_text_cells() {
        let table = table();
        let csv = "Tag,Label,Hp\nRow_A,\"=\"\"Sword\"\"\",\"=\"\"100\"\"\"\n";
        let edits = import_csv(&table, csv).unwrap();
        assert_eq!(
            edits,
            vec![Edit::scalar(
                0,
                "Label",
                Scalar::String("=\"Sword\"".to_string())
            )]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let table = table();
        let csv = "Tag,Label\nRow_A,\"Axe\n";
        assert!(matches!(
            import_csv(&table, csv),
            Err(Error::Table { line: 2, ref message }) if message.contains("unterminated")
        ));
    }

    #[test]
    fn test_garbage_after_quote() {
        assert!(matches!(
            parse_csv("\"a\"b,c\n"),
            Err(Error::Table { line: 1, .. })
        ));
    }

    #[test]
    fn test_too_many_fields() {
        let table = table();
        assert!(matches!(
            import_csv(&table, "Tag,Hp\nRow_A,100,7\n"),
            Err(Error::Table { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_csv_line_numbers() {
        let records = parse_csv("a,b\r\n\r\n\"x\ny\",z\nlast").unwrap();
        let starts: Vec<usize> = records.iter().map(|(line, _)| *line).collect();
        assert_eq!(starts, vec![1, 3, 5]);
        assert_eq!(records[2].1, vec!["last".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(import_csv(&table(), "").unwrap().is_empty());
    }

    #[test]
    fn test_find() {
        let table = table();
        let hits = find(&table, "fire");
        assert_eq!(
            hits,
            vec![
                Match {
                    entry: 0,
                    column: "Kind".to_string(),
                    text: "Fire".to_string()
                },
                Match {
                    entry: 0,
                    column: "Kinds_Array[0]".to_string(),
                    text: "Fire".to_string()
                },
            ]
        );

        let hits = find(&table, "ROW_B");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].column, "Tag");
        assert!(find(&table, "").is_empty());
    }
}
