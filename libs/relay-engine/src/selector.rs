use std::fmt;
use std::str::FromStr;

use relay_api::value::Value;

/// Field-access chain evaluated against a `Value`.
///
/// Grammar:
/// - `""` or `"$"`: identity.
/// - `$name.name...`: one step per `name`; a name is `[A-Za-z0-9_-]+` or a
///   double-quoted string (`\"` and `\\` escapes).
///
/// Parsed once at task start, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector at offset {offset}: {reason}")]
pub struct SelectorError {
    pub offset: usize,
    pub reason: &'static str,
}

impl Selector {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Append a field-access step.
    pub fn get(mut self, name: impl Into<String>) -> Self {
        self.steps.push(name.into());
        self
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(Self::identity());
        }
        let base = input.len() - input.trim_start().len();
        let err = |offset: usize, reason| SelectorError { offset: base + offset, reason };

        let rest = text.strip_prefix('$').ok_or(err(0, "expected '$'"))?;
        let mut steps = Vec::new();
        let mut chars = rest.char_indices().peekable();
        let mut expect_step = !rest.is_empty();

        while expect_step {
            let start = chars.peek().map_or(rest.len(), |(i, _)| *i) + 1;
            let name = match chars.peek() {
                Some((_, '"')) => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '"')) => break,
                            Some((_, '\\')) => match chars.next() {
                                Some((_, c @ ('"' | '\\'))) => name.push(c),
                                Some((i, _)) => return Err(err(i + 1, "unsupported escape")),
                                None => return Err(err(text.len(), "unterminated string")),
                            },
                            Some((_, c)) => name.push(c),
                            None => return Err(err(text.len(), "unterminated string")),
                        }
                    }
                    name
                }
                _ => {
                    let mut name = String::new();
                    while let Some((_, c)) = chars.peek() {
                        if c.is_ascii_alphanumeric() || *c == '_' || *c == '-' {
                            name.push(*c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        return Err(err(start, "expected field name"));
                    }
                    name
                }
            };
            steps.push(name);

            expect_step = match chars.next() {
                Some((_, '.')) => true,
                Some((i, _)) => return Err(err(i + 1, "expected '.' or end of selector")),
                None => false,
            };
            if expect_step && chars.peek().is_none() {
                return Err(err(text.len(), "expected field name"));
            }
        }

        Ok(Self { steps })
    }

    /// Evaluate against `root`. `None` means undefined: some step found no
    /// slot with a matching text key, or hit a non-record value.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.steps
            .iter()
            .try_fold(root, |current, name| current.as_record()?.get(name))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            let bare = step
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if bare && !step.is_empty() {
                f.write_str(step)?;
            } else {
                write!(f, "\"{}\"", step.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}
