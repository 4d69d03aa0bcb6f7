//! Record normalizer for the renewal feed.
//!
//! The feed is a delimited text export with one header line. The delimiter
//! (comma or tab) is detected from the header. Fields may be double-quoted;
//! a quoted field can contain the delimiter and `""` escapes a quote. Rows
//! that cannot be split or that carry no client are dropped and reported,
//! never surfaced to the scheduler.

use crate::error::{RenewalError, Result};
use crate::record::{normalize_specialist, parse_premium, RenewalRecord};
use crate::types::PolicyStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_CLIENT: &str = "Client";
pub const COL_STATUS: &str = "Placement Status";
pub const COL_EXPIRY: &str = "Placement Expiry Date";
pub const COL_SPECIALIST: &str = "Placement Specialist";
pub const COL_PREMIUM: &str = "Total Premium";
pub const COL_COVERAGE: &str = "Coverage";
pub const COL_PRODUCT_LINE: &str = "Product Line";
pub const COL_CARRIER: &str = "Carrier Group";
pub const COL_PLACEMENT_ID: &str = "Placement Id";

// ---------------------------------------------------------------------------
// Delimiter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn detect(header: &str) -> Self {
        if header.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => f.write_str("comma"),
            Delimiter::Tab => f.write_str("tab"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    UnbalancedQuotes,
    MissingClient,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::UnbalancedQuotes => f.write_str("unbalanced quotes"),
            DropReason::MissingClient => f.write_str("missing client"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// 1-indexed line number in the feed text.
    pub line: usize,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub delimiter: Delimiter,
    pub headers: Vec<String>,
    pub records: Vec<RenewalRecord>,
    pub dropped: Vec<DroppedRow>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Read and normalize the feed at `path`.
pub fn load_feed(path: &Path) -> Result<Feed> {
    if !path.exists() {
        return Err(RenewalError::FeedNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_feed(&text)
}

pub fn parse_feed(text: &str) -> Result<Feed> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(RenewalError::FeedEmpty)?;
    let header_line = header_line.trim_start_matches('\u{feff}');
    let delimiter = Delimiter::detect(header_line);
    let headers = split_fields(header_line, delimiter).unwrap_or_else(|| {
        header_line
            .split(delimiter.as_char())
            .map(|h| h.trim().trim_matches('"').to_string())
            .collect()
    });
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let mut records = Vec::new();
    let mut dropped = Vec::new();
    for (line_no, line) in lines {
        let Some(values) = split_fields(line, delimiter) else {
            dropped.push(DroppedRow {
                line: line_no,
                reason: DropReason::UnbalancedQuotes,
            });
            continue;
        };
        let field = |name: &str| column_value(&columns, &values, name).to_string();

        let client = field(COL_CLIENT);
        if client.is_empty() {
            dropped.push(DroppedRow {
                line: line_no,
                reason: DropReason::MissingClient,
            });
            continue;
        }

        records.push(RenewalRecord {
            client,
            status: PolicyStatus::parse(&field(COL_STATUS)),
            expiry_raw: field(COL_EXPIRY),
            specialist: normalize_specialist(&field(COL_SPECIALIST)),
            premium: parse_premium(&field(COL_PREMIUM)),
            coverage: field(COL_COVERAGE),
            product_line: field(COL_PRODUCT_LINE),
            carrier_group: field(COL_CARRIER),
            placement_id: field(COL_PLACEMENT_ID),
        });
    }

    Ok(Feed {
        delimiter,
        headers,
        records,
        dropped,
    })
}

fn column_value<'a>(columns: &HashMap<&str, usize>, values: &'a [String], name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| values.get(i))
        .map(|v| v.as_str())
        .unwrap_or("")
}

/// Split one line into trimmed fields. Returns `None` when a quoted field is
/// never closed.
pub fn split_fields(line: &str, delimiter: Delimiter) -> Option<Vec<String>> {
    let delim = delimiter.as_char();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut field_started = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }

        if c == delim {
            fields.push(current.trim().to_string());
            current.clear();
            field_started = false;
        } else if c == '"' && !field_started {
            in_quotes = true;
            field_started = true;
            current.clear();
        } else {
            if !c.is_whitespace() {
                field_started = true;
            }
            current.push(c);
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current.trim().to_string());
    Some(fields)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
