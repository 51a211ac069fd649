//! Regular expression match step

use core_types::{EvalError, EvalResult, Value};
use parking_lot::Mutex;
use regex::Regex;

/// Compiles `pattern` so that it must match the whole subject
fn compile_whole(pattern: &str) -> EvalResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|err| EvalError::compile(format!("invalid pattern: {}: {}", pattern, err)))
}

/// Answers whether the rendered inbound context matches a fixed pattern
#[derive(Debug, Clone)]
pub struct RegexAccessor {
    pattern: String,
    regex: Regex,
}

impl RegexAccessor {
    /// Compile `pattern`; an invalid pattern is a compile error
    pub fn new(pattern: &str) -> EvalResult<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: compile_whole(pattern)?,
        })
    }

    /// Source text of the pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn matches(&self, ctx: &Value) -> Value {
        Value::Boolean(self.regex.is_match(&ctx.to_string()))
    }
}

/// Last compiled pattern of a call site whose pattern is computed at
/// runtime
#[derive(Debug, Default)]
pub struct PatternCache {
    last: Mutex<Option<(String, Regex)>>,
}

impl PatternCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled form of `pattern`, reusing the previous compilation
    /// when the text is unchanged
    pub fn get(&self, pattern: &str) -> EvalResult<Regex> {
        let mut last = self.last.lock();
        if let Some((text, regex)) = last.as_ref() {
            if text == pattern {
                return Ok(regex.clone());
            }
        }
        let regex = compile_whole(pattern)?;
        *last = Some((pattern.to_string(), regex.clone()));
        Ok(regex)
    }
}
