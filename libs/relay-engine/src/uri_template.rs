use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped when an identifier is written into a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Address pattern such as `/user/:id`.
///
/// A placeholder is a path segment starting with `:`, right after a `/` or
/// at the start of the template; it runs to the next `/`, `?` or `#`.
/// A valid template has exactly one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template is empty")]
    Empty,
    #[error("placeholder at offset {0} has no name")]
    UnnamedPlaceholder(usize),
    #[error("template has no placeholder")]
    NoPlaceholder,
    #[error("template has {0} placeholders, exactly one is supported")]
    MultiplePlaceholders(usize),
}

impl UriTemplate {
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        if input.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = input.char_indices().peekable();
        let mut prev: Option<char> = None;

        while let Some((i, c)) = chars.next() {
            let segment_start = prev.is_none() || prev == Some('/');
            if c == ':' && segment_start {
                let mut name = String::new();
                while let Some((_, n)) = chars.peek() {
                    if matches!(n, '/' | '?' | '#') {
                        break;
                    }
                    name.push(*n);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(TemplateError::UnnamedPlaceholder(i));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                prev = name.chars().last();
                segments.push(Segment::Placeholder(name));
            } else {
                literal.push(c);
                prev = Some(c);
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let placeholders = segments
            .iter()
            .filter(|s| matches!(s, Segment::Placeholder(_)))
            .count();
        match placeholders {
            0 => Err(TemplateError::NoPlaceholder),
            1 => Ok(Self { segments }),
            n => Err(TemplateError::MultiplePlaceholders(n)),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Substitute `id` into the placeholder, escaped as a path segment.
    pub fn apply(&self, id: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(_) => {
                    out.extend(utf8_percent_encode(id, PATH_SEGMENT));
                }
            }
        }
        out
    }
}

impl FromStr for UriTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Placeholder(name) => write!(f, ":{name}")?,
            }
        }
        Ok(())
    }
}
