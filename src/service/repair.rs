//! Tolerant JSON repair for model output
//!
//! Model replies are JSON-like but not guaranteed to be well-formed. The
//! parser here accepts the common defects and produces a strict
//! [`serde_json::Value`]:
//!
//! - prose or code fences around the payload (parsing starts at the first `{` or `[`)
//! - trailing or doubled commas, missing commas between elements
//! - unquoted or single-quoted keys and strings
//! - `//` and `/* */` comments
//! - `True`/`False`/`None` literals
//! - truncated output (open strings, arrays and objects are closed at end of input)

use serde_json::{Map, Number, Value};

#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum RepairError {
    #[error("no JSON object or array found in input")]
    NoJson,

    #[error("unexpected character '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("nesting deeper than {MAX_DEPTH} levels at offset {offset}")]
    TooDeep { offset: usize },
}

/// Maximum nesting of objects and arrays
pub const MAX_DEPTH: usize = 128;

/// Repair near-JSON text and parse it
pub fn repair_json(input: &str) -> Result<Value, RepairError> {
    let chars: Vec<char> = input.chars().collect();
    let start = chars
        .iter()
        .position(|c| *c == '{' || *c == '[')
        .ok_or(RepairError::NoJson)?;

    let mut parser = Parser {
        chars: &chars,
        pos: start,
        depth: 0,
    };
    parser.parse_value()
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn unexpected(&self, found: char) -> RepairError {
        RepairError::Unexpected {
            found,
            offset: self.pos,
        }
    }

    fn skip_ws(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.chars.len());
                }
                _ => break,
            }
        }
    }

    fn skip_ws_and_commas(&mut self) {
        loop {
            self.skip_ws();
            if self.peek() == Some(',') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, RepairError> {
        self.skip_ws();
        match self.peek() {
            None => Ok(Value::Null),
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some(q @ ('"' | '\'')) => Ok(Value::String(self.parse_string(q))),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                Ok(self.parse_number())
            }
            Some(c) if c.is_alphabetic() || c == '_' => Ok(self.parse_bare_value()),
            Some(c) => Err(self.unexpected(c)),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, RepairError>,
    ) -> Result<Value, RepairError> {
        if self.depth >= MAX_DEPTH {
            return Err(RepairError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_object(&mut self) -> Result<Value, RepairError> {
        self.pos += 1;
        let mut map = Map::new();

        loop {
            self.skip_ws_and_commas();
            let key = match self.peek() {
                None => break,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                // Mismatched close: let the enclosing array consume it
                Some(']') => break,
                Some(q @ ('"' | '\'')) => self.parse_string(q),
                Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => self.parse_bare_key(),
                Some(c) => return Err(self.unexpected(c)),
            };

            self.skip_ws();
            if self.peek() == Some(':') {
                self.pos += 1;
            }
            self.skip_ws();

            let value = match self.peek() {
                None | Some(',') | Some('}') | Some(']') => Value::Null,
                _ => self.parse_value()?,
            };
            map.insert(key, value);
        }

        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, RepairError> {
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_ws_and_commas();
            match self.peek() {
                None => break,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some('}') => break,
                _ => items.push(self.parse_value()?),
            }
        }

        Ok(Value::Array(items))
    }

    fn parse_string(&mut self, quote: char) -> String {
        self.pos += 1;
        let mut out = String::new();

        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                c if c == quote => return out,
                '\\' => match self.peek() {
                    None => break,
                    Some(esc) => {
                        self.pos += 1;
                        match esc {
                            'n' => out.push('\n'),
                            't' => out.push('\t'),
                            'r' => out.push('\r'),
                            'b' => out.push('\u{8}'),
                            'f' => out.push('\u{c}'),
                            'u' => out.push(self.parse_unicode_escape()),
                            other => out.push(other),
                        }
                    }
                },
                other => out.push(other),
            }
        }

        // Unterminated string: keep what we have
        out
    }

    fn parse_unicode_escape(&mut self) -> char {
        let Some(high) = self.read_hex4() else {
            return char::REPLACEMENT_CHARACTER;
        };

        if (0xD800..0xDC00).contains(&high) {
            if self.peek() == Some('\\') && self.peek_at(1) == Some('u') {
                let saved = self.pos;
                self.pos += 2;
                if let Some(low) = self.read_hex4()
                    && (0xDC00..0xE000).contains(&low)
                {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                }
                self.pos = saved;
            }
            return char::REPLACEMENT_CHARACTER;
        }

        char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let end = self.pos + 4;
        if end > self.chars.len() {
            return None;
        }
        let digits: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&digits, 16).ok()?;
        self.pos = end;
        Some(code)
    }

    fn parse_number(&mut self) -> Value {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let trimmed = raw.trim_start_matches('+');

        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Number(i.into());
        }
        match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => Value::String(raw),
        }
    }

    fn parse_bare_key(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_bare_value(&mut self) -> Value {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | '}' | ']' | ':' | '\n') {
                break;
            }
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        match word.trim() {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "null" | "None" => Value::Null,
            other => Value::String(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_json_passes_through() {
        let value = repair_json(r#"{"a": [1, 2.5, "x", true, null]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, "x", true, null]}));
    }

    #[test]
    fn test_trailing_comma_in_array() {
        assert_eq!(repair_json(r#"["1","4",]"#).unwrap(), json!(["1", "4"]));
    }

    #[test]
    fn test_trailing_comma_in_object() {
        assert_eq!(
            repair_json(r#"{"title": "Coverage", }"#).unwrap(),
            json!({"title": "Coverage"})
        );
    }

    #[test]
    fn test_unquoted_keys_and_single_quotes() {
        let value = repair_json("{sections: [{title: 'Fraud', subsections: []}]}").unwrap();
        assert_eq!(
            value,
            json!({"sections": [{"title": "Fraud", "subsections": []}]})
        );
    }

    #[test]
    fn test_truncated_structure_is_closed() {
        let value = repair_json(r#"{"sections": [{"title": "Liab"#).unwrap();
        assert_eq!(value, json!({"sections": [{"title": "Liab"}]}));
    }

    #[test]
    fn test_surrounding_prose_and_fences_are_ignored() {
        let input = "Here are the rules:\n```json\n{\"sections\": []}\n```\nDone.";
        assert_eq!(repair_json(input).unwrap(), json!({"sections": []}));
    }

    #[test]
    fn test_missing_commas_between_elements() {
        assert_eq!(
            repair_json(r#"["1" "2" "3"]"#).unwrap(),
            json!(["1", "2", "3"])
        );
    }

    #[test]
    fn test_comments_and_python_literals() {
        let input = "{\n // note\n \"a\": True, /* x */ \"b\": None\n}";
        assert_eq!(repair_json(input).unwrap(), json!({"a": true, "b": null}));
    }

    #[test]
    fn test_escapes_are_decoded() {
        let value = repair_json(r#"["line\nbreak", "é", "😀"]"#).unwrap();
        assert_eq!(value, json!(["line\nbreak", "é", "😀"]));
    }

    #[test]
    fn test_no_brackets_is_irreparable() {
        assert_eq!(repair_json("no structure here"), Err(RepairError::NoJson));
        assert_eq!(repair_json(""), Err(RepairError::NoJson));
    }

    #[test]
    fn test_stray_symbol_is_irreparable() {
        assert!(matches!(
            repair_json("[#]"),
            Err(RepairError::Unexpected { found: '#', .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let err = repair_json(&"[".repeat(100_000)).unwrap_err();
        assert!(matches!(err, RepairError::TooDeep { .. }));

        let err = repair_json(&"{\"a\": ".repeat(50_000)).unwrap_err();
        assert!(matches!(err, RepairError::TooDeep { .. }));
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let input = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(repair_json(&input).is_ok());
        let input = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(repair_json(&input).is_err());
    }
}
