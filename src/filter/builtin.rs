use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use super::core::{Filter, FilterRegistry};
use crate::error::FilterError;
use crate::Request;

/// Class name used for `| <regex>` shorthand segments.
pub const REGEX_CLASS: &str = "regex";

pub(super) fn install(registry: &mut FilterRegistry) {
    registry.register("string", build_string);
    registry.register("alpha", |class, args| {
        build_charset(class, args, |c| c.is_ascii_alphabetic())
    });
    registry.register("alnum", |class, args| {
        build_charset(class, args, |c| c.is_ascii_alphanumeric())
    });
    registry.register("hex", |class, args| {
        build_charset(class, args, |c| c.is_ascii_hexdigit())
    });
    registry.register("uint", build_uint);
    registry.register("int", build_int);
    registry.register(REGEX_CLASS, build_regex);
}

struct LengthFilter {
    min: usize,
    max: usize,
}

impl Filter for LengthFilter {
    fn filter(&self, text: &str, _req: Option<&Request>) -> Option<Value> {
        let len = text.chars().count();
        (self.min..=self.max)
            .contains(&len)
            .then(|| Value::String(text.to_string()))
    }
}

fn parse_len(class: &str, arg: &str) -> Result<usize, FilterError> {
    arg.parse()
        .map_err(|_| FilterError::arguments(class, format!("`{arg}` is not a length")))
}

fn build_string(class: &str, args: &[&str]) -> Result<Arc<dyn Filter>, FilterError> {
    let (min, max) = match args {
        [] => (1, usize::MAX),
        [min] => (parse_len(class, min)?, usize::MAX),
        [min, max] => (parse_len(class, min)?, parse_len(class, max)?),
        _ => return Err(FilterError::arguments(class, "expects at most `min max`")),
    };
    if min > max {
        return Err(FilterError::arguments(class, "min length exceeds max length"));
    }
    Ok(Arc::new(LengthFilter { min, max }))
}

struct CharsetFilter {
    accept: fn(char) -> bool,
}

impl Filter for CharsetFilter {
    fn filter(&self, text: &str, _req: Option<&Request>) -> Option<Value> {
        (!text.is_empty() && text.chars().all(self.accept)).then(|| Value::String(text.to_string()))
    }
}

fn build_charset(
    class: &str,
    args: &[&str],
    accept: fn(char) -> bool,
) -> Result<Arc<dyn Filter>, FilterError> {
    if !args.is_empty() {
        return Err(FilterError::arguments(class, "takes no arguments"));
    }
    Ok(Arc::new(CharsetFilter { accept }))
}

fn parse_bits(class: &str, args: &[&str]) -> Result<u32, FilterError> {
    match args {
        [] => Ok(64),
        [bits] => match *bits {
            "8" => Ok(8),
            "16" => Ok(16),
            "32" => Ok(32),
            "64" => Ok(64),
            other => Err(FilterError::arguments(
                class,
                format!("bit size `{other}` is not one of 8, 16, 32, 64"),
            )),
        },
        _ => Err(FilterError::arguments(class, "expects at most one bit size")),
    }
}

struct UintFilter {
    max: u64,
}

impl Filter for UintFilter {
    fn filter(&self, text: &str, _req: Option<&Request>) -> Option<Value> {
        // `u64::from_str` accepts a leading `+`; path segments must be digits only.
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u64 = text.parse().ok()?;
        (n <= self.max).then(|| Value::from(n))
    }
}

fn build_uint(class: &str, args: &[&str]) -> Result<Arc<dyn Filter>, FilterError> {
    let bits = parse_bits(class, args)?;
    let max = if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    Ok(Arc::new(UintFilter { max }))
}

struct IntFilter {
    min: i64,
    max: i64,
}

impl Filter for IntFilter {
    fn filter(&self, text: &str, _req: Option<&Request>) -> Option<Value> {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: i64 = text.parse().ok()?;
        (self.min..=self.max).contains(&n).then(|| Value::from(n))
    }
}

fn build_int(class: &str, args: &[&str]) -> Result<Arc<dyn Filter>, FilterError> {
    let bits = parse_bits(class, args)?;
    let (min, max) = if bits == 64 {
        (i64::MIN, i64::MAX)
    } else {
        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
    };
    Ok(Arc::new(IntFilter { min, max }))
}

struct RegexFilter {
    re: Regex,
    has_group: bool,
}

impl Filter for RegexFilter {
    fn filter(&self, text: &str, _req: Option<&Request>) -> Option<Value> {
        let caps = self.re.captures(text)?;
        let out = if self.has_group {
            caps.get(1).map_or("", |m| m.as_str())
        } else {
            text
        };
        Some(Value::String(out.to_string()))
    }
}

/// The expression must match the whole segment; the pattern's own `^`/`$` are
/// harmless inside the added anchors.
fn build_regex(class: &str, args: &[&str]) -> Result<Arc<dyn Filter>, FilterError> {
    if args.is_empty() {
        return Err(FilterError::arguments(class, "expects a regular expression"));
    }
    let source = args.join(" ");
    let re = Regex::new(&format!("^(?:{source})$")).map_err(move |err| {
        FilterError::InvalidRegex {
            source_text: source,
            source: err,
        }
    })?;
    let has_group = re.captures_len() > 1;
    Ok(Arc::new(RegexFilter { re, has_group }))
}
