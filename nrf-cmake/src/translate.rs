//! Make `$(NAME)` → CMake `${NAME}` reference rewriting.

use crate::model::ALLOW_LIST;

/// Rewrite every `$(NAME)` whose `NAME` is allow-listed into `${NAME}`.
///
/// Matching is on the whole delimited token, so `$(LIB_SRC_FILES)` is never
/// touched by the `SRC_FILES` substitution, and text already in `${NAME}`
/// form passes through unchanged.
pub fn make_to_cmake(text: &str) -> String {
    translate_names(text, ALLOW_LIST)
}

/// [`make_to_cmake`] over an explicit list of names.
pub fn translate_names(text: &str, names: &[&str]) -> String {
    let mut out = text.to_string();
    for name in names {
        let from = format!("$({name})");
        if out.contains(&from) {
            out = out.replace(&from, &format!("${{{name}}}"));
        }
    }
    out
}
