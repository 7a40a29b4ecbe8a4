//! CSV persistence for the hierarchy table and the selected variants.
//!
//! Hierarchy columns, in order: `Variant ID`, `Level`, `Frequency`,
//! `Parent ID` (integer or `ROOT`), `Event Path`. Fields containing a comma,
//! quote or line break are quoted, with embedded quotes doubled.

use std::fs;
use std::io::{self, Read, Write};
use std::num::NonZeroU64;
use std::path::Path;

use tracing::info;

use varscope_core::VariantCount;

use crate::algorithms::hierarchy::HierarchyRecord;

pub const HIERARCHY_HEADER: [&str; 5] =
    ["Variant ID", "Level", "Frequency", "Parent ID", "Event Path"];
pub const SELECTED_HEADER: [&str; 2] = ["Variant", "Frequency"];

/// Literal written in the `Parent ID` column of the root row.
pub const ROOT_PARENT: &str = "ROOT";

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("table is empty, expected header row")]
    MissingHeader,
    #[error("unexpected header: {found:?}")]
    BadHeader { found: Vec<String> },
    #[error("line {line}: expected {expected} columns, found {actual}")]
    ColumnCount {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: invalid {column} value {value:?}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

/// Write hierarchy rows with a header line.
pub fn write_hierarchy_csv<W: Write>(
    mut out: W,
    records: &[HierarchyRecord],
) -> Result<(), TableError> {
    write_row(&mut out, &HIERARCHY_HEADER)?;
    for r in records {
        let parent = match r.parent {
            Some(p) => p.to_string(),
            None => ROOT_PARENT.to_string(),
        };
        write_row(
            &mut out,
            &[
                r.id.to_string().as_str(),
                r.level.to_string().as_str(),
                r.frequency.to_string().as_str(),
                parent.as_str(),
                r.path.as_str(),
            ],
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Parse a hierarchy table written by [`write_hierarchy_csv`].
///
/// The header must match exactly. Blank lines are skipped; errors report the
/// 1-based line on which the offending row starts.
pub fn read_hierarchy_csv<R: Read>(mut input: R) -> Result<Vec<HierarchyRecord>, TableError> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let mut rows = split_rows(&text)?.into_iter();

    let (_, header) = rows.next().ok_or(TableError::MissingHeader)?;
    if header.iter().map(String::as_str).ne(HIERARCHY_HEADER) {
        return Err(TableError::BadHeader { found: header });
    }

    let mut records = Vec::new();
    for (line, fields) in rows {
        if fields.len() != HIERARCHY_HEADER.len() {
            return Err(TableError::ColumnCount {
                line,
                expected: HIERARCHY_HEADER.len(),
                actual: fields.len(),
            });
        }
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        let id = parse_field(line, "Variant ID", next())?;
        let level = parse_field(line, "Level", next())?;
        let frequency = parse_field::<NonZeroU64>(line, "Frequency", next())?.get();
        let parent_raw = next();
        let parent = if parent_raw == ROOT_PARENT {
            None
        } else {
            Some(parse_field(line, "Parent ID", parent_raw)?)
        };
        let path = next();

        records.push(HierarchyRecord {
            id,
            level,
            frequency,
            parent,
            path,
        });
    }
    Ok(records)
}

/// Write the hierarchy table to `path`, creating parent directories.
pub fn save_hierarchy_csv(path: &Path, records: &[HierarchyRecord]) -> Result<(), TableError> {
    ensure_parent(path)?;
    let file = fs::File::create(path)?;
    write_hierarchy_csv(io::BufWriter::new(file), records)?;
    info!(path = %path.display(), rows = records.len(), "hierarchy table saved");
    Ok(())
}

pub fn load_hierarchy_csv(path: &Path) -> Result<Vec<HierarchyRecord>, TableError> {
    let file = fs::File::open(path)?;
    let records = read_hierarchy_csv(io::BufReader::new(file))?;
    info!(path = %path.display(), rows = records.len(), "hierarchy table loaded");
    Ok(records)
}

/// Write selected variants as `Variant,Frequency` with the display path.
pub fn write_selected_csv<W: Write>(
    mut out: W,
    selected: &[VariantCount],
) -> Result<(), TableError> {
    write_row(&mut out, &SELECTED_HEADER)?;
    for vc in selected {
        let path = vc.variant.to_path();
        let freq = vc.frequency.to_string();
        write_row(&mut out, &[path.as_str(), freq.as_str()])?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_selected_csv(path: &Path, selected: &[VariantCount]) -> Result<(), TableError> {
    ensure_parent(path)?;
    let file = fs::File::create(path)?;
    write_selected_csv(io::BufWriter::new(file), selected)?;
    info!(path = %path.display(), rows = selected.len(), "selected variants saved");
    Ok(())
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

fn parse_field<T: std::str::FromStr>(
    line: usize,
    column: &'static str,
    raw: String,
) -> Result<T, TableError> {
    raw.trim()
        .parse()
        .map_err(|_| TableError::InvalidValue { line, column, value: raw })
}

fn write_row<W: Write>(out: &mut W, fields: &[&str]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    writeln!(out, "{}", line.join(","))
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split CSV text into rows of unescaped fields, each tagged with the line
/// it starts on. Quoted fields may span lines.
fn split_rows(text: &str) -> Result<Vec<(usize, Vec<String>)>, TableError> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut quote_start = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_start = line;
            }
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                end_row(&mut rows, &mut fields, &mut field, row_start);
                line += 1;
                row_start = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(TableError::UnterminatedQuote { line: quote_start });
    }
    end_row(&mut rows, &mut fields, &mut field, row_start);
    Ok(rows)
}

fn end_row(
    rows: &mut Vec<(usize, Vec<String>)>,
    fields: &mut Vec<String>,
    field: &mut String,
    line: usize,
) {
    if fields.is_empty() && field.is_empty() {
        return;
    }
    fields.push(std::mem::take(field));
    rows.push((line, std::mem::take(fields)));
}
