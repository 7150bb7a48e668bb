//! Parser for bulk rule imports.
//!
//! Accepts one rule per line as `from,to[,note]` or `from<TAB>to[<TAB>note]`.
//! Blank lines and lines starting with `#` are ignored. Lines missing a
//! `from` or `to` are reported as skipped rather than failing the import.

/// A valid line ready to be saved as a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: usize,
    pub from: String,
    pub to: String,
    pub note: Option<String>,
}

/// A line that could not be turned into a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: &'static str,
}

/// Result of parsing an import payload.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub skipped: Vec<SkippedLine>,
}

/// Parses delimited import text.
///
/// The delimiter is chosen per line: tab if the line contains one, comma
/// otherwise. Fields are trimmed and a single pair of surrounding double
/// quotes is removed. Line numbers are 1-indexed.
pub fn parse_import(text: &str) -> ParsedImport {
    let mut parsed = ParsedImport::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let delimiter = if trimmed.contains('\t') { '\t' } else { ',' };
        let mut fields = trimmed.splitn(3, delimiter).map(clean_field);

        let from = fields.next().unwrap_or_default();
        let to = fields.next().unwrap_or_default();
        let note = fields.next().filter(|n| !n.is_empty());

        if from.is_empty() {
            parsed.skipped.push(SkippedLine {
                line,
                reason: "missing source path",
            });
            continue;
        }

        if to.is_empty() {
            parsed.skipped.push(SkippedLine {
                line,
                reason: "missing destination",
            });
            continue;
        }

        parsed.rows.push(ImportRow {
            line,
            from,
            to,
            note,
        });
    }

    parsed
}

fn clean_field(field: &str) -> String {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
        .trim()
        .to_string()
}
