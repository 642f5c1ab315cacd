//! Command heuristics: Dockerfile command extraction and interpreter
//! detection.
//!
//! Both are explicit ordered rule tables, first match wins. They feed the
//! Galaxy command scaffold and requirements section; neither is ever
//! authoritative.

use once_cell::sync::Lazy;
use regex::Regex;

/// (needle, Galaxy requirement package). Ordered, first match wins.
const INTERPRETER_RULES: &[(&str, &str)] = &[
    ("python3", "python"),
    ("python", "python"),
    ("perl", "perl"),
    ("rscript", "r-base"),
    ("node", "nodejs"),
    ("bash", "bash"),
];

/// Detect the interpreter a command line relies on.
pub fn detect_interpreter(command: &str) -> Option<&'static str> {
    let lowered = command.to_lowercase();
    INTERPRETER_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, package)| *package)
}

static INSTRUCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(ENTRYPOINT|CMD)\s+(\S.*)$").expect("valid regex"));

/// Extract the effective run command from Dockerfile text.
///
/// Follows the docker semantics that matter here: the last `ENTRYPOINT` and
/// the last `CMD` win, and `CMD` acts as arguments when an `ENTRYPOINT`
/// exists. Both the JSON-array and the shell form are understood. Returns
/// `None` when neither instruction is present.
pub fn extract_dockerfile_command(dockerfile: &str) -> Option<String> {
    let mut entrypoint = None;
    let mut cmd = None;

    for line in joined_lines(dockerfile) {
        if let Some(captures) = INSTRUCTION_RE.captures(&line) {
            let args = parse_instruction_args(&captures[2]);
            if captures[1].eq_ignore_ascii_case("ENTRYPOINT") {
                entrypoint = Some(args);
            } else {
                cmd = Some(args);
            }
        }
    }

    match (entrypoint, cmd) {
        (Some(entry), Some(cmd)) => Some(format!("{entry} {cmd}")),
        (Some(entry), None) => Some(entry),
        (None, Some(cmd)) => Some(cmd),
        (None, None) => None,
    }
}

// Merge trailing-backslash continuations into single logical lines.
fn joined_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for raw in text.lines() {
        let stripped = raw.trim_end();
        if let Some(prefix) = stripped.strip_suffix('\\') {
            current.push_str(prefix);
            current.push(' ');
        } else {
            current.push_str(stripped);
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// `["python", "run.py"]` joins to `python run.py`; shell form passes through.
fn parse_instruction_args(rest: &str) -> String {
    let trimmed = rest.trim();
    if trimmed.starts_with('[') {
        if let Ok(parts) = serde_json::from_str::<Vec<String>>(trimmed) {
            return parts.join(" ");
        }
    }
    trimmed.to_string()
}
