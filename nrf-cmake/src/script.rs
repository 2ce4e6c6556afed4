//! An append-only CMake script buffer.

use std::fmt;
use std::ops::{Add, AddAssign};

use crate::model::SetValue;

/// Lines of a CMake script under construction.
///
/// Callers are responsible for emitting well-formed CMake; the buffer only
/// takes care of line breaks and `set()` formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    text: String,
}

impl Script {
    /// A script seeded with the generator header and, if given, a
    /// `cmake_minimum_required` line followed by a blank line.
    pub fn new(minimum_version: Option<&str>) -> Self {
        let mut script = Script::empty();
        script
            .line(concat!("# Generated by nrf-cmake ", env!("CARGO_PKG_VERSION"), "."))
            .line("# Regenerated wholesale on every run; local edits will be lost.");
        if let Some(version) = minimum_version {
            script.line(format!("cmake_minimum_required(VERSION {version})"));
        }
        script.blank();
        script
    }

    /// A script with no content at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append `line` and a newline.
    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.text.push('\n');
        self
    }

    /// Append `set(NAME VALUE)`, or `set(NAME "VALUE")` when `quoted`.
    pub fn set(&mut self, name: &str, value: &str, quoted: bool) -> &mut Self {
        if quoted {
            self.line(format!("set({name} \"{value}\")"))
        } else {
            self.line(format!("set({name} {value})"))
        }
    }

    /// Append `set()` for a value that still needs rendering.
    pub fn assign(&mut self, name: &str, value: SetValue<'_>) -> &mut Self {
        let (text, quoted) = value.resolve();
        self.set(name, &text, quoted)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Concatenate without a separator, leaving both operands untouched.
impl Add<&Script> for &Script {
    type Output = Script;

    fn add(self, other: &Script) -> Script {
        self + other.as_str()
    }
}

impl Add<&str> for &Script {
    type Output = Script;

    fn add(self, other: &str) -> Script {
        let mut text = String::with_capacity(self.text.len() + other.len());
        text.push_str(&self.text);
        text.push_str(other);
        Script { text }
    }
}

/// Shortcut for [`Script::line`].
impl AddAssign<&str> for Script {
    fn add_assign(&mut self, other: &str) {
        self.line(other);
    }
}

/// Append the other script's content as a line.
impl AddAssign<&Script> for Script {
    fn add_assign(&mut self, other: &Script) {
        self.line(other.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_renders_raw_and_path_values() {
        let mut script = Script::empty();
        script
            .assign("OPT", SetValue::Raw { text: "-O3 -g3", quoted: false })
            .assign("LIB_FILES", SetValue::Raw { text: "", quoted: true })
            .assign("ROOT", SetValue::Path(std::path::Path::new(r"C:\nRF5\sdk")));
        assert_eq!(
            script.as_str(),
            "set(OPT -O3 -g3)\nset(LIB_FILES \"\")\nset(ROOT \"C:/nRF5/sdk\")\n"
        );
    }

    #[test]
    fn header_and_minimum_version() {
        let script = Script::new(Some("3.7"));
        let lines: Vec<&str> = script.as_str().lines().collect();
        assert!(lines[0].starts_with("# Generated by nrf-cmake"));
        assert_eq!(lines[2], "cmake_minimum_required(VERSION 3.7)");
        assert_eq!(lines[3], "");
        assert!(!Script::new(None).as_str().contains("cmake_minimum_required"));
    }

    #[test]
    fn set_quoting() {
        let mut script = Script::empty();
        script
            .set("SOME_VARIABLE", "value/not/quoted", false)
            .set("SOME_VARIABLE", "value with spaces", true);
        assert_eq!(
            script.as_str(),
            "set(SOME_VARIABLE value/not/quoted)\nset(SOME_VARIABLE \"value with spaces\")\n"
        );
    }

    #[test]
    fn add_does_not_mutate_left_operand() {
        let mut left = Script::empty();
        left.line("a");
        let mut right = Script::empty();
        right.line("b");

        let joined = &left + &right;
        assert_eq!(joined.as_str(), "a\nb\n");
        assert_eq!(left.as_str(), "a\n");

        let with_text = &left + "tail";
        assert_eq!(with_text.as_str(), "a\ntail");
        assert_eq!(left.as_str(), "a\n");
    }

    #[test]
    fn add_assign_writes_in_place() {
        let mut script = Script::empty();
        script += "# comment";
        script += "";
        assert_eq!(script.as_str(), "# comment\n\n");
    }
}
