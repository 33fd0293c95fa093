use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::shared_function::{
    PSEUDO_STATE, is_valid_identifier, is_valid_state_name, starts_with_keyword,
};
use crate::validation::structure::{indentation, is_end_marker, is_start_marker};
use crate::validation::{FindingCode, ValidationResult};

/// Directive prefixes accepted without further inspection.
const KNOWN_DIRECTIVES: &[&str] = &[
    "note",
    "end note",
    "title",
    "skinparam",
    "!define",
    "define",
    "!include",
    "include",
    "scale",
    "left to right direction",
    "top to bottom direction",
];

struct LinePatterns {
    initial: Regex,
    terminal: Regex,
    regular: Regex,
    /// `note left of X` / `note as N`: the forms whose body runs until `end note`.
    note_block: Regex,
}

fn patterns() -> &'static LinePatterns {
    static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinePatterns {
        initial: Regex::new(r"^\[\*\]\s*-?->\s*(.+)$").expect("invalid regex"),
        terminal: Regex::new(r"^(.+?)\s*-?->\s*\[\*\]\s*(?::.*)?$").expect("invalid regex"),
        regular: Regex::new(r"^(.+?)\s*-?->\s*(.+)$").expect("invalid regex"),
        note_block: Regex::new(
            r"^note\s+(?:(?:left|right|top|bottom)\s+of\s+[^\s:\x22]+|as\s+[^\s:\x22]+)$",
        )
        .expect("invalid regex"),
    })
}

/// Scan state carried from line to line.
#[derive(Default)]
struct SyntaxScan {
    saw_start: bool,
    in_envelope: bool,
    in_note_block: bool,
    saw_initial: bool,
    states: BTreeSet<String>,
}

impl SyntaxScan {
    fn record_state(
        &mut self,
        raw: &str,
        line_no: usize,
        column: usize,
        result: &mut ValidationResult,
    ) {
        let name = strip_label(raw);
        if name == PSEUDO_STATE {
            return;
        }
        if !is_valid_state_name(name) {
            result.add_warning(
                FindingCode::InvalidStateName,
                format!("state name '{name}' is not a valid identifier"),
                line_no,
                column,
            );
        }
        self.states.insert(name.to_string());
    }

    fn scan_line(&mut self, line: &str, line_no: usize, result: &mut ValidationResult) {
        let trimmed = line.trim();
        let column = indentation(line) + 1;

        if self.in_note_block {
            if is_note_end(trimmed) {
                self.in_note_block = false;
            }
            return;
        }

        let patterns = patterns();
        if let Some(caps) = patterns.initial.captures(trimmed) {
            self.saw_initial = true;
            self.record_state(&caps[1], line_no, column, result);
        } else if let Some(caps) = patterns.terminal.captures(trimmed) {
            self.record_state(&caps[1], line_no, column, result);
        } else if let Some(caps) = patterns.regular.captures(trimmed) {
            self.record_state(&caps[1], line_no, column, result);
            self.record_state(&caps[2], line_no, column, result);
        } else if is_valid_identifier(trimmed) {
            self.states.insert(trimmed.to_string());
        } else if known_directive(trimmed).is_some() {
            if patterns.note_block.is_match(trimmed) {
                self.in_note_block = true;
            }
        } else if trimmed.contains(':') {
            // Labeled declaration, e.g. `Idle : waiting for input`.
        } else {
            result.add_warning(
                FindingCode::UnknownSyntax,
                format!("unrecognized syntax: {trimmed}"),
                line_no,
                column,
            );
        }
    }
}

fn known_directive(trimmed: &str) -> Option<&'static str> {
    KNOWN_DIRECTIVES
        .iter()
        .copied()
        .find(|directive| starts_with_keyword(trimmed, directive))
}

fn is_note_end(trimmed: &str) -> bool {
    starts_with_keyword(trimmed, "end note") || starts_with_keyword(trimmed, "endnote")
}

/// Drops a trailing `: label` annotation.
fn strip_label(raw: &str) -> &str {
    match raw.split_once(':') {
        Some((name, _)) => name.trim(),
        None => raw.trim(),
    }
}

/// Extracts states and transitions from the envelope body and checks naming and completeness.
pub fn validate_syntax(content: &str, result: &mut ValidationResult) {
    let mut scan = SyntaxScan::default();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if is_start_marker(trimmed) {
            scan.saw_start = true;
            scan.in_envelope = true;
            continue;
        }
        if is_end_marker(trimmed) {
            scan.in_envelope = false;
            scan.in_note_block = false;
            continue;
        }
        if !scan.in_envelope || trimmed.is_empty() || trimmed.starts_with('\'') {
            continue;
        }

        scan.scan_line(line, line_no, result);
    }

    if !scan.saw_start {
        return;
    }

    if !scan.saw_initial {
        result.add_warning(
            FindingCode::NoInitialState,
            "no initial state transition ([*] --> State) found",
            1,
            1,
        );
    }

    if scan.states.is_empty() {
        result.add_error(FindingCode::NoStates, "diagram declares no states", 1, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_syntax(content, &mut result);
        result
    }

    #[test]
    fn complete_machine_has_no_findings() {
        let result = check("@startuml\n[*] --> Idle\nIdle --> Active : start\nActive --> [*]\n@enduml");
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn missing_initial_transition_is_a_warning() {
        let result = check("@startuml\nStateA --> StateB\n@enduml");
        assert!(result.errors.is_empty());
        assert_eq!(result.warning_codes(), vec![FindingCode::NoInitialState]);
    }

    #[test]
    fn empty_envelope_reports_no_states() {
        let result = check("@startuml\n' only a comment\n\n@enduml");
        assert_eq!(result.error_codes(), vec![FindingCode::NoStates]);
        assert!(result.has_warning(FindingCode::NoInitialState));
    }

    #[test]
    fn content_without_start_marker_is_not_scanned() {
        let result = check("StateA --> StateB\n@enduml");
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn invalid_state_names_are_warnings() {
        let result = check("@startuml\n[*] --> 9Lives\n9Lives --> [*] : done\n@enduml");
        assert!(result.errors.is_empty());
        assert_eq!(
            result.warning_codes(),
            vec![FindingCode::InvalidStateName, FindingCode::InvalidStateName]
        );
        assert_eq!(result.warnings[0].line, 2);
    }

    #[test]
    fn directives_labels_and_bare_states_are_accepted() {
        let content = "@startuml\n\
            title Door controller\n\
            skinparam monochrome true\n\
            left to right direction\n\
            !include products/lock-1.0.0/lock-1.0.0.puml\n\
            Closed\n\
            Closed : waiting\n\
            [*] --> Closed\n\
            @enduml";
        let result = check(content);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn note_blocks_are_skipped_until_end_note() {
        let content = "@startuml\n[*] --> Idle\nnote right of Idle\nfree (text) here!\nend note\n@enduml";
        let result = check(content);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn unknown_lines_degrade_to_warnings() {
        let result = check("@startuml\n[*] --> Idle\nstate Idle {\n@enduml");
        assert!(result.errors.is_empty());
        assert_eq!(result.warning_codes(), vec![FindingCode::UnknownSyntax]);
        assert_eq!(result.warnings[0].line, 3);
    }

    #[test]
    fn lines_outside_envelope_are_ignored() {
        let result = check("garbage before\n@startuml\n[*] --> A\n@enduml\ngarbage after");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn one_line_notes_do_not_swallow_the_body() {
        let content = "@startuml\n\
            note \"Door controller\" as N1\n\
            note right of Idle : waiting\n\
            [*] --> Idle\n\
            Idle --> [*]\n\
            @enduml";
        let result = check(content);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn note_as_block_ends_at_end_note() {
        let content = "@startuml\nnote as N1\n[*] --> Ghost\nend note\n[*] --> Idle\n@enduml";
        let result = check(content);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn directive_keywords_need_a_word_boundary() {
        let result = check("@startuml\nnoteworthy remark here\n[*] --> Idle\n@enduml");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.warning_codes(), vec![FindingCode::UnknownSyntax]);
        assert_eq!(result.warnings[0].line, 2);
    }
}
