// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! RML string templates.
//!
//! A template such as `http://example.com/person/{ID}` generates terms from
//! source values. Converting back from RDF means running it in reverse: the
//! generated string is matched against the template and the placeholder
//! values are read off the capture groups.

use crate::error::{Error, Result};
use percent_encoding::percent_decode_str;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

/// How a generated value was encoded into the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inversion {
    /// Values were IRI-safe encoded: they never span `/` or `;` and are
    /// percent-decoded on the way back.
    Iri,
    /// Values were copied verbatim into a literal.
    Literal,
}

#[derive(Debug, Clone)]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
    iri_pattern: Regex,
    literal_pattern: Regex,
}

impl Template {
    /// Parse a template. `\{` and `\}` stand for literal braces.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |message: &str| Error::Template {
            template: raw.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped @ ('{' | '}' | '\\')) => text.push(escaped),
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => text.push('\\'),
                },
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(invalid("nested '{'")),
                            Some(c) => name.push(c),
                            None => return Err(invalid("unterminated placeholder")),
                        }
                    }
                    if name.is_empty() {
                        return Err(invalid("empty placeholder"));
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(invalid("unmatched '}'")),
                c => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        let iri_pattern = build_pattern(&segments, "([^/;]+?)").map_err(|e| invalid(&e))?;
        let literal_pattern = build_pattern(&segments, "(.+?)").map_err(|e| invalid(&e))?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
            iri_pattern,
            literal_pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in template order, repeats included.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Recover `(placeholder, value)` pairs from a generated string, or
    /// `None` when the string was not produced by this template.
    pub fn invert(&self, generated: &str, mode: Inversion) -> Option<Vec<(&str, String)>> {
        let pattern = match mode {
            Inversion::Iri => &self.iri_pattern,
            Inversion::Literal => &self.literal_pattern,
        };
        let captures = pattern.captures(generated)?;

        let values = self
            .placeholders()
            .zip(captures.iter().skip(1))
            .filter_map(|(name, group)| {
                let raw = group?.as_str();
                let value = match mode {
                    Inversion::Iri => percent_decode_str(raw).decode_utf8_lossy().into_owned(),
                    Inversion::Literal => raw.to_string(),
                };
                Some((name, value))
            })
            .collect();
        Some(values)
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

fn build_pattern(segments: &[Segment], group: &str) -> std::result::Result<Regex, String> {
    let mut pattern = String::from("^");
    for segment in segments {
        match segment {
            Segment::Text(text) => pattern.push_str(&regex::escape(text)),
            Segment::Placeholder(_) => pattern.push_str(group),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| e.to_string())
}
