//! The Makefile statement parser.
//!
//! Only produces top-level variable assignments. Rules, recipes, directives,
//! `define` blocks and anything inside a conditional are skipped without
//! being evaluated.

use crate::model::{AssignOp, Assignment};

/// A streaming parser over the logical lines of a Makefile.
pub struct Parser<'a> {
    lines: std::str::Lines<'a>,
    conditional_depth: usize,
    in_define: bool,
    /// Tab-indented lines are recipes only once a rule has been seen.
    seen_rule: bool,
}

/// Parse every top-level assignment in `source`, in file order.
pub fn parse(source: &str) -> Vec<Assignment> {
    Parser::new(source).collect()
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lines: source.lines(),
            conditional_depth: 0,
            in_define: false,
            seen_rule: false,
        }
    }

    /// Returns the next logical line with continuations joined and comments
    /// removed. The bool is true for tab-indented lines.
    fn next_logical_line(&mut self) -> Option<(String, bool)> {
        let first = self.lines.next()?;
        let tabbed = first.starts_with('\t');

        let mut line = String::new();
        let mut current = first.trim_end_matches('\r');
        loop {
            if ends_with_continuation(current) {
                let kept = current[..current.len() - 1].trim_end();
                push_joined(&mut line, kept);
                match self.lines.next() {
                    Some(next) => current = next.trim_end_matches('\r').trim_start(),
                    None => break,
                }
            } else {
                push_joined(&mut line, current);
                break;
            }
        }

        Some((strip_comment(&line).to_string(), tabbed))
    }

    /// Track `define` and conditional nesting. Returns true if `line` was
    /// consumed as a directive or lies inside a skipped block.
    fn skip_structural(&mut self, line: &str) -> bool {
        let keyword = line.split_whitespace().next().unwrap_or("");

        if self.in_define {
            if keyword == "endef" {
                self.in_define = false;
            }
            return true;
        }

        match keyword {
            "define" => {
                self.in_define = true;
                true
            }
            "ifeq" | "ifneq" | "ifdef" | "ifndef" => {
                self.conditional_depth += 1;
                true
            }
            "endif" => {
                self.conditional_depth = self.conditional_depth.saturating_sub(1);
                true
            }
            "else" => true,
            "include" | "-include" | "sinclude" | "vpath" | "unexport" => true,
            _ => self.conditional_depth > 0,
        }
    }
}

impl Iterator for Parser<'_> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        loop {
            let (line, tabbed) = self.next_logical_line()?;
            if tabbed && self.seen_rule && !self.in_define {
                continue;
            }
            let line = line.trim();
            if line.is_empty() || self.skip_structural(line) {
                continue;
            }
            match parse_assignment(line) {
                Some(assignment) => return Some(assignment),
                None if is_rule(line) => self.seen_rule = true,
                None => {}
            }
        }
    }
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.bytes().rev().take_while(|&b| b == b'\\').count();
    trailing % 2 == 1
}

fn push_joined(line: &mut String, part: &str) {
    if part.is_empty() {
        return;
    }
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(part);
}

/// Cut the line at the first unescaped `#`.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1] != b'\\') {
            return &line[..i];
        }
    }
    line
}

/// Remove any leading `export`/`override` modifiers.
fn strip_modifiers(mut line: &str) -> &str {
    loop {
        let trimmed = ["export ", "override ", "private "]
            .iter()
            .find_map(|m| line.strip_prefix(m));
        match trimmed {
            Some(rest) => line = rest.trim_start(),
            None => return line,
        }
    }
}

/// Split a logical line into an assignment, or `None` for rules and
/// anything else that is not a plain `NAME op value` definition.
fn parse_assignment(line: &str) -> Option<Assignment> {
    let line = strip_modifiers(line);
    let bytes = line.as_bytes();
    let mut depth = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'{' => depth += 1,
            b')' | b'}' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            b':' => {
                let (op, len) = if line[i..].starts_with("::=") {
                    (AssignOp::Simple, 3)
                } else if line[i..].starts_with(":=") {
                    (AssignOp::Simple, 2)
                } else {
                    // A rule or a target-specific assignment.
                    return None;
                };
                return build(line, i, i + len, op);
            }
            b'=' => {
                let (op, start) = match i.checked_sub(1).map(|p| bytes[p]) {
                    Some(b'+') => (AssignOp::Append, i - 1),
                    Some(b'?') => (AssignOp::Conditional, i - 1),
                    Some(b'!') => (AssignOp::Shell, i - 1),
                    _ => (AssignOp::Recursive, i),
                };
                return build(line, start, i + 1, op);
            }
            _ => {}
        }
    }
    None
}

/// A `targets: prerequisites` line, including target-specific assignments.
fn is_rule(line: &str) -> bool {
    let mut depth = 0usize;
    line.bytes().any(|b| match b {
        b'(' | b'{' => {
            depth += 1;
            false
        }
        b')' | b'}' => {
            depth = depth.saturating_sub(1);
            false
        }
        b':' => depth == 0,
        _ => false,
    })
}

fn build(line: &str, name_end: usize, value_start: usize, op: AssignOp) -> Option<Assignment> {
    let name = line[..name_end].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(Assignment {
        name: name.to_string(),
        op,
        value: line[value_start..].trim().to_string(),
    })
}
