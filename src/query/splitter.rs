//! Script splitting for CQL.
//!
//! Breaks a multi-statement script into executable units: plain statements
//! and `BEGIN ... BATCH` / `APPLY BATCH` blocks. Handles:
//! - `;` as the statement terminator
//! - `;` inside single-quoted literals (`'a;b'`), which never splits
//! - `BEGIN [UNLOGGED|COUNTER] BATCH [USING TIMESTAMP <n>]` headers

use std::sync::LazyLock;

use regex::Regex;

use crate::db::BatchOptions;
use crate::error::{GlanceError, Result};

static BATCH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^BEGIN\s+(?:(UNLOGGED|COUNTER)\s+)?BATCH(?:\s+USING\s+TIMESTAMP\s+(\d+))?(?:\s+(.*)|\s*;)$",
    )
    .expect("batch header pattern is valid")
});

static BATCH_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^APPLY\s+BATCH\s*;?$").expect("batch footer pattern is valid"));

/// One unit of work produced from a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableUnit {
    /// A single statement, terminator included.
    Simple(String),
    /// An atomic group of statements.
    Batch(BatchUnit),
}

impl ExecutableUnit {
    /// The text reported back to the caller for this unit.
    pub fn text(&self) -> &str {
        match self {
            Self::Simple(statement) => statement,
            Self::Batch(batch) => &batch.full_text,
        }
    }
}

/// A `BEGIN ... BATCH` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUnit {
    /// Header, members and `APPLY BATCH`, joined by single spaces.
    pub full_text: String,
    /// Member statements in script order, never empty.
    pub statements: Vec<String>,
    /// Batch type and timestamp.
    pub options: BatchOptions,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Literal,
}

/// Splits a script on `;`, ignoring terminators inside single-quoted literals.
///
/// Statements are trimmed, empty ones dropped, and each kept statement gets
/// its terminator back. A doubled quote (`'it''s'`) closes and reopens the
/// literal, so it needs no special case. An unclosed literal runs to the
/// end of the script.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Code;

    for ch in script.chars() {
        match (state, ch) {
            (ScanState::Code, ';') => {
                push_statement(&mut statements, &current);
                current.clear();
                continue;
            }
            (ScanState::Code, '\'') => state = ScanState::Literal,
            (ScanState::Literal, '\'') => state = ScanState::Code,
            _ => {}
        }
        current.push(ch);
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(format!("{trimmed};"));
    }
}

/// Splits a script into executable units, in script order.
///
/// Fails with [`GlanceError::MalformedBatch`] when a batch is opened but
/// never closed, carries an unusable timestamp, or closes with no members.
pub fn split(script: &str) -> Result<Vec<ExecutableUnit>> {
    let statements = split_statements(script);
    let mut units = Vec::with_capacity(statements.len());
    let mut iter = statements.into_iter();

    while let Some(statement) = iter.next() {
        let Some(header) = BATCH_HEADER.captures(&statement) else {
            units.push(ExecutableUnit::Simple(statement));
            continue;
        };

        let mut options = BatchOptions::default();
        match header.get(1).map(|m| m.as_str().to_uppercase()).as_deref() {
            Some("COUNTER") => options.counter = true,
            Some("UNLOGGED") => options.logged = false,
            _ => {}
        }
        if let Some(ts) = header.get(2) {
            let micros = ts.as_str().parse::<i64>().map_err(|_| {
                GlanceError::malformed_batch(format!("invalid batch timestamp '{}'", ts.as_str()))
            })?;
            options.timestamp_micros = Some(micros);
        }

        let mut members: Vec<String> = header
            .get(3)
            .map(|m| m.as_str().trim())
            .filter(|first| !first.is_empty() && *first != ";")
            .map(String::from)
            .into_iter()
            .collect();
        let mut full_text = statement.clone();

        loop {
            let Some(next) = iter.next() else {
                return Err(GlanceError::malformed_batch(
                    "unterminated batch block; include \"APPLY BATCH;\" at the end",
                ));
            };
            full_text.push(' ');
            full_text.push_str(&next);
            if BATCH_FOOTER.is_match(&next) {
                break;
            }
            members.push(next);
        }

        if members.is_empty() {
            return Err(GlanceError::malformed_batch("batch block contains no statements"));
        }

        units.push(ExecutableUnit::Batch(BatchUnit {
            full_text,
            statements: members,
            options,
        }));
    }

    Ok(units)
}
