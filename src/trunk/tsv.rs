//! # Quoted TSV Codec
//!
//! Tab-separated records where every field is wrapped in double quotes and
//! embedded quotes are doubled. Quoted fields may span lines.

use crate::error::{ControlError, Result};

/// One decoded record plus what followed it in the input
#[derive(Debug, PartialEq, Eq)]
pub struct Parsed<'a> {
    pub fields: Vec<String>,
    /// Line terminator that ended the record; empty at end of input
    pub terminator: &'a str,
    pub rest: &'a str,
}

/// Decode the first record of `input`
///
/// Unquoted fields are accepted on input and end at the next tab or line
/// break.
///
/// # Errors
///
/// Returns error if a quoted field is never closed or a closing quote is
/// followed by something other than a tab or line break.
pub fn parse_record(input: &str) -> Result<Parsed<'_>> {
    let mut fields = Vec::new();
    let mut pos = 0;
    let bytes = input.as_bytes();

    loop {
        let mut field = String::new();

        if bytes.get(pos) == Some(&b'"') {
            pos += 1;
            loop {
                let Some(offset) = input[pos..].find('"') else {
                    return Err(ControlError::Tsv("unterminated quoted field".to_string()));
                };
                field.push_str(&input[pos..pos + offset]);
                pos += offset + 1;
                if bytes.get(pos) == Some(&b'"') {
                    field.push('"');
                    pos += 1;
                } else {
                    break;
                }
            }
        } else {
            let end = input[pos..]
                .find(&['\t', '\r', '\n'][..])
                .map_or(input.len(), |offset| pos + offset);
            field.push_str(&input[pos..end]);
            pos = end;
        }

        fields.push(field);

        let rest = &input[pos..];
        if let Some(after) = rest.strip_prefix('\t') {
            pos = input.len() - after.len();
            continue;
        }

        let terminator = if rest.starts_with("\r\n") {
            "\r\n"
        } else if rest.starts_with('\n') {
            "\n"
        } else if rest.is_empty() {
            ""
        } else {
            return Err(ControlError::Tsv(format!(
                "unexpected character after quoted field at byte {}",
                pos
            )));
        };

        return Ok(Parsed {
            fields,
            terminator,
            rest: &rest[terminator.len()..],
        });
    }
}

/// Decode every record in `input`, skipping blank lines
pub fn parse_table(input: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        if let Some(after) = remaining.strip_prefix("\r\n").or_else(|| remaining.strip_prefix('\n')) {
            remaining = after;
            continue;
        }
        let parsed = parse_record(remaining)?;
        rows.push(parsed.fields);
        remaining = parsed.rest;
    }

    Ok(rows)
}

/// Encode one record, quoting every field, without a line terminator
pub fn write_record<S: AsRef<str>>(fields: &[S], out: &mut String) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push('\t');
        }
        out.push('"');
        out.push_str(&field.as_ref().replace('"', "\"\""));
        out.push('"');
    }
}
