//! npm-style version ranges.
//!
//! npm range syntax differs from Cargo's in a few places that matter here:
//!
//! - alternatives are joined with `||`
//! - comparators within one alternative are separated by whitespace
//! - a bare version such as `1.2.3` means exactly that version
//! - `1.2.3 - 2.0.0` is an inclusive hyphen range
//! - versions may carry a `v` prefix
//!
//! Each alternative is rewritten into a [`semver::VersionReq`], whose `~`, `^`,
//! wildcard and pre-release semantics already match npm's.
//!
//! # Examples
//!
//! ```
//! use cordova_spec::NpmRange;
//!
//! let range = NpmRange::parse("^1.2.0 || >=3.0.0 <4.0.0").unwrap();
//! assert!(range.matches_str("1.9.0"));
//! assert!(range.matches_str("3.5.1"));
//! assert!(!range.matches_str("2.0.0"));
//! ```

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};

use crate::error::{Error, Result};
use crate::version::parse_version;

/// A parsed npm-style range: any alternative matching is a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmRange {
    alternatives: Vec<VersionReq>,
    raw: String,
}

impl NpmRange {
    pub fn parse(raw: &str) -> Result<Self> {
        let alternatives = raw
            .split("||")
            .map(|alt| parse_alternative(raw, alt))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            alternatives,
            raw: raw.to_string(),
        })
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Returns `false` when `version` is not a valid version.
    pub fn matches_str(&self, version: &str) -> bool {
        parse_version(version).is_some_and(|v| self.matches(&v))
    }

    /// Highest version in `versions` that matches.
    pub fn max_satisfying<'a>(
        &self,
        versions: impl IntoIterator<Item = &'a Version>,
    ) -> Option<&'a Version> {
        versions.into_iter().filter(|v| self.matches(v)).max()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for NpmRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for NpmRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn invalid(raw: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRange {
        range: raw.to_string(),
        reason: reason.into(),
    }
}

fn parse_alternative(raw: &str, alt: &str) -> Result<VersionReq> {
    let tokens = tokenize(alt);
    if tokens.is_empty() {
        return Ok(VersionReq::STAR);
    }

    let comparators = match tokens.as_slice() {
        [low, dash, high] if dash == "-" => {
            vec![format!(">={}", strip_v(low)), format!("<={}", strip_v(high))]
        }
        _ => tokens
            .iter()
            .map(|token| comparator(raw, token))
            .collect::<Result<Vec<_>>>()?,
    };

    VersionReq::parse(&comparators.join(", ")).map_err(|e| invalid(raw, e.to_string()))
}

/// Split on whitespace, gluing a lone operator onto the version after it
/// (`>= 1.0.0` is the same as `>=1.0.0`).
fn tokenize(alt: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for word in alt.split_whitespace() {
        if is_operator(word) {
            pending_op = Some(word);
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{op}{word}")),
            None => tokens.push(word.to_string()),
        }
    }
    if let Some(op) = pending_op {
        tokens.push(op.to_string());
    }
    tokens
}

fn is_operator(word: &str) -> bool {
    matches!(word, ">" | ">=" | "<" | "<=" | "=" | "~" | "^")
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn comparator(raw: &str, token: &str) -> Result<String> {
    let split = token
        .find(|c: char| !matches!(c, '>' | '<' | '=' | '~' | '^'))
        .ok_or_else(|| invalid(raw, format!("operator '{token}' has no version")))?;
    let (op, version) = token.split_at(split);
    let version = strip_v(version);

    if matches!(version, "*" | "x" | "X") {
        return Ok("*".to_string());
    }
    let has_wildcard = version
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"));

    let op = match op {
        // npm treats a bare version as exact, semver's default is caret
        "" if has_wildcard => "",
        "" => "=",
        "~>" => "~",
        other => other,
    };
    Ok(format!("{op}{version}"))
}
