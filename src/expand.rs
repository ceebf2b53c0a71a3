use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::env::Environment;

/// A `$` and the maximal run of name characters after it.
static VAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[A-Za-z0-9_]*").expect("variable token pattern"));

/// Substitute `$NAME` tokens in a raw input line.
///
/// Each `$` consumes the maximal run of alphanumeric/underscore characters
/// after it as a variable name; undefined names substitute the empty string.
/// A `$` followed by no name character passes through literally. There is no
/// escaping, so expansion is idempotent only on text containing no `$`.
pub fn expand(line: &str, env: &Environment) -> String {
    VAR_TOKEN
        .replace_all(line, |caps: &Captures<'_>| {
            let name = &caps[0][1..];
            if name.is_empty() {
                "$".to_string()
            } else {
                env.get(name).unwrap_or("").to_string()
            }
        })
        .into_owned()
}
