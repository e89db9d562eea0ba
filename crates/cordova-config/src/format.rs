//! Text style detection for format-preserving rewrites

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Error, Result};

/// Line ending convention of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// How an existing document is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    /// One level of indentation, as found on the first indented line
    pub indent: String,
    pub newline: Newline,
    pub trailing_newline: bool,
}

impl TextStyle {
    /// Detect the style of `source`, using `default_indent` when no line is
    /// indented.
    pub fn detect(source: &str, default_indent: &str) -> Self {
        let newline = if source.contains("\r\n") {
            Newline::CrLf
        } else {
            Newline::Lf
        };

        let indent = source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let content = line.trim_start_matches([' ', '\t']);
                &line[..line.len() - content.len()]
            })
            .find(|ws| !ws.is_empty())
            .unwrap_or(default_indent)
            .to_string();

        Self {
            indent,
            newline,
            trailing_newline: source.is_empty() || source.ends_with('\n'),
        }
    }

    /// Convert `\n`-separated text to this style's newline and trailing
    /// newline convention.
    pub fn apply(&self, text: &str) -> String {
        let body = text.trim_end_matches('\n');
        let mut out = match self.newline {
            Newline::Lf => body.to_string(),
            Newline::CrLf => body.replace('\n', "\r\n"),
        };
        if self.trailing_newline {
            out.push_str(self.newline.as_str());
        }
        out
    }
}

/// Pretty-print `value` in the given style.
pub fn render_json(value: &Value, style: &TextStyle) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(style.indent.as_bytes());
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    let text = String::from_utf8(buf).map_err(|e| Error::parse("JSON", "", e))?;
    Ok(style.apply(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn detects_tab_indent_and_crlf() {
        let style = TextStyle::detect("{\r\n\t\"a\": 1\r\n}", "  ");
        assert_eq!(style.indent, "\t");
        assert_eq!(style.newline, Newline::CrLf);
        assert!(!style.trailing_newline);
    }

    #[test]
    fn falls_back_to_default_indent() {
        let style = TextStyle::detect("{}\n", "  ");
        assert_eq!(style.indent, "  ");
        assert_eq!(style.newline, Newline::Lf);
        assert!(style.trailing_newline);
    }

    #[test]
    fn render_json_uses_detected_style() {
        let style = TextStyle::detect("{\r\n    \"a\": 1\r\n}\r\n", "  ");
        let text = render_json(&json!({"a": 1, "b": [true]}), &style).unwrap();
        assert_eq!(
            text,
            "{\r\n    \"a\": 1,\r\n    \"b\": [\r\n        true\r\n    ]\r\n}\r\n"
        );
    }

    #[test]
    fn render_json_keeps_key_order() {
        let style = TextStyle::detect("", "  ");
        let value: Value = serde_json::from_str(r#"{"z": 1, "a": 2}"#).unwrap();
        assert_eq!(
            render_json(&value, &style).unwrap(),
            "{\n  \"z\": 1,\n  \"a\": 2\n}\n"
        );
    }
}
