//! Line parser for the indentation-based script dialect
//!
//! A script line is leading spaces (block nesting), then one or more
//! comma-separated sub-commands. Each sub-command is a command word
//! followed by whitespace-delimited tokens; a token contributes a numeric
//! argument only if it starts with a signed integer or decimal number
//! (the numeric prefix is captured, so "5ml" yields "5"). Everything else
//! after the command word is trailing comment text and is dropped.
//!
//! Parsing is pure: no registry lookups, no side effects.

use regex::Regex;
use std::sync::OnceLock;

/// Matches the numeric prefix of an argument token
fn numeric_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?").expect("numeric prefix pattern is valid"))
}

/// One comma-separated segment of a script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    /// Command word, canonicalized to upper-case
    pub word: String,

    /// Numeric-literal arguments, in order, as written
    pub args: Vec<String>,

    /// The trimmed source text of this sub-command
    pub raw: String,
}

/// A parsed, non-blank script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the source script
    pub number: usize,

    /// Count of leading ASCII space characters
    pub indent: usize,

    /// The raw source line
    pub raw: String,

    /// Comma-separated sub-commands, in order
    pub sub_commands: Vec<SubCommand>,
}

impl ScriptLine {
    /// Command word of the first sub-command, if any
    pub fn first_word(&self) -> Option<&str> {
        self.sub_commands.first().map(|s| s.word.as_str())
    }
}

/// Count of leading ASCII space characters
///
/// Counting stops at the first non-space character, tabs included; tab
/// indentation is rejected separately by the validator.
pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

/// Whether the leading whitespace contains a tab character
pub fn has_tab_indent(line: &str) -> bool {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .any(|c| c == '\t')
}

/// Whether the line is blank or a whole-line comment
pub fn is_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Extract numeric arguments from the tokens after the command word
fn extract_args<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    tokens
        .filter_map(|token| numeric_prefix().find(token))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse one sub-command segment; empty segments yield None
fn parse_sub_command(segment: &str) -> Option<SubCommand> {
    let raw = segment.trim();
    if raw.is_empty() {
        return None;
    }

    let mut tokens = raw.split_whitespace();
    let word = tokens.next()?.to_uppercase();
    let args = extract_args(tokens);

    Some(SubCommand {
        word,
        args,
        raw: raw.to_string(),
    })
}

/// Parse one raw line; blank and comment lines yield None
pub fn parse_line(raw: &str, number: usize) -> Option<ScriptLine> {
    if is_blank(raw) {
        return None;
    }

    let sub_commands: Vec<SubCommand> = raw.trim().split(',').filter_map(parse_sub_command).collect();
    if sub_commands.is_empty() {
        return None;
    }

    Some(ScriptLine {
        number,
        indent: indent_width(raw),
        raw: raw.to_string(),
        sub_commands,
    })
}

/// Parse a whole script, skipping blank and comment lines
pub fn parse_script(text: &str) -> Vec<ScriptLine> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| parse_line(raw, i + 1))
        .collect()
}
