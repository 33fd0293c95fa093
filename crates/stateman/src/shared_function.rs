use std::sync::OnceLock;

use regex::Regex;

pub use semver::Version as SemVer;

/// Pseudo-state marking the initial or final state of a machine.
pub const PSEUDO_STATE: &str = "[*]";

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("invalid regex"))
}

/// Identifier rule shared by state names and reference names.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// State names additionally accept the `[*]` pseudo-state.
pub fn is_valid_state_name(name: &str) -> bool {
    name == PSEUDO_STATE || is_valid_identifier(name)
}

/// Accepts `major.minor.patch[-prerelease]`. Build metadata is rejected.
pub fn parse_version(raw: &str) -> Option<SemVer> {
    let version = SemVer::parse(raw).ok()?;
    if !version.build.is_empty() {
        return None;
    }
    Some(version)
}

pub fn is_valid_version(raw: &str) -> bool {
    parse_version(raw).is_some()
}

/// Splits a `{name}-{version}` segment.
///
/// The version starts after the first hyphen that is followed by an ASCII digit, so both
/// hyphenated names (`door-lock-1.0.0`) and prerelease versions (`door-1.0.0-rc.1`) split as
/// expected. Segments without such a hyphen split at the last hyphen, which keeps malformed
/// versions (`door-latest`) visible to validation instead of dropping them.
pub fn split_name_version(segment: &str) -> Option<(&str, &str)> {
    let bytes = segment.as_bytes();
    let digit_split = bytes
        .windows(2)
        .position(|pair| pair[0] == b'-' && pair[1].is_ascii_digit());
    let index = match digit_split {
        Some(index) => index,
        None => segment.rfind('-')?,
    };
    if index == 0 {
        return None;
    }
    Some((&segment[..index], &segment[index + 1..]))
}

/// True when `line` starts with `keyword` followed by whitespace or nothing.
pub fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}
