//! Namespace paths: `name`, `name.key`, `name[0]`, `name[other.path]`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `.key`
    Key(String),
    /// `[3]`
    Index(usize),
    /// `[path]`: a string value selects a key, an integer an index.
    Lookup(Path),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub root: String,
    pub steps: Vec<Step>,
}

impl Path {
    /// Parse a complete path; the error is a human-readable reason.
    pub fn parse(text: &str) -> Result<Path, String> {
        let mut parser = PathParser {
            bytes: text.as_bytes(),
            pos: 0,
        };
        let path = parser.path()?;
        if parser.pos < parser.bytes.len() {
            return Err(format!(
                "unexpected '{}' at offset {}",
                parser.bytes[parser.pos] as char, parser.pos
            ));
        }
        Ok(path)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for step in &self.steps {
            match step {
                Step::Key(k) => write!(f, ".{k}")?,
                Step::Index(i) => write!(f, "[{i}]")?,
                Step::Lookup(p) => write!(f, "[{p}]")?,
            }
        }
        Ok(())
    }
}

pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

struct PathParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl PathParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn name(&mut self) -> Result<String, String> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_byte) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(b) => format!("expected a name, found '{}'", b as char),
                None => "expected a name".to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn path(&mut self) -> Result<Path, String> {
        let root = self.name()?;
        let mut steps = Vec::new();
        loop {
            match self.peek() {
                Some(b'.') => {
                    self.pos += 1;
                    steps.push(Step::Key(self.name()?));
                }
                Some(b'[') => {
                    self.pos += 1;
                    steps.push(self.bracket()?);
                    if self.peek() != Some(b']') {
                        return Err("missing ']'".to_string());
                    }
                    self.pos += 1;
                }
                _ => return Ok(Path { root, steps }),
            }
        }
    }

    fn bracket(&mut self) -> Result<Step, String> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos > start && self.peek() == Some(b']') {
            let digits = String::from_utf8_lossy(&self.bytes[start..self.pos]);
            return digits
                .parse()
                .map(Step::Index)
                .map_err(|_| format!("index '{digits}' is too large"));
        }
        self.pos = start;
        self.path().map(Step::Lookup)
    }
}
