use crate::shared_function::starts_with_keyword;
use crate::validation::{FindingCode, ValidationResult};

pub const START_MARKER: &str = "@startuml";
pub const END_MARKER: &str = "@enduml";

pub(crate) fn is_start_marker(trimmed: &str) -> bool {
    starts_with_keyword(trimmed, START_MARKER)
}

pub(crate) fn is_end_marker(trimmed: &str) -> bool {
    starts_with_keyword(trimmed, END_MARKER)
}

/// Checks the `@startuml` / `@enduml` envelope. Every problem is recorded; nothing short-circuits.
pub fn validate_structure(content: &str, result: &mut ValidationResult) {
    let mut start_line: Option<usize> = None;
    let mut end_line: Option<usize> = None;
    let mut last_line = 0;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let trimmed = line.trim();
        let column = indentation(line) + 1;

        if is_start_marker(trimmed) {
            match start_line {
                Some(first) => result.add_error(
                    FindingCode::DuplicateStart,
                    format!("duplicate {START_MARKER} marker (first seen on line {first})"),
                    line_no,
                    column,
                ),
                None => start_line = Some(line_no),
            }
        } else if is_end_marker(trimmed) {
            match end_line {
                Some(first) => result.add_error(
                    FindingCode::DuplicateEnd,
                    format!("duplicate {END_MARKER} marker (first seen on line {first})"),
                    line_no,
                    column,
                ),
                None => end_line = Some(line_no),
            }
        }
    }

    if start_line.is_none() {
        result.add_error(
            FindingCode::MissingStart,
            format!("missing {START_MARKER} marker"),
            1,
            1,
        );
    }

    if end_line.is_none() {
        result.add_error(
            FindingCode::MissingEnd,
            format!("missing {END_MARKER} marker"),
            last_line.max(1),
            1,
        );
    }

    if let (Some(start), Some(end)) = (start_line, end_line) {
        if start >= end {
            result.add_error(
                FindingCode::InvalidOrder,
                format!("{START_MARKER} on line {start} must precede {END_MARKER} on line {end}"),
                start,
                1,
            );
        }
    }
}

pub(crate) fn indentation(line: &str) -> usize {
    line.chars().take_while(|ch| ch.is_whitespace()).count()
}
