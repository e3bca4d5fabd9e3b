//! Parser for the structural path subset produced by the locator engine:
//! `/` and `//` steps, tag or `*` name tests, and `[N]`, `[@attr="v"]`,
//! `[text()="v"]`, `[attr="v"]` predicates. Literals are quoted strings or
//! `concat(...)` of quoted strings.

use crate::dom::tree::TreeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Starts at the document root (`/...`, `//...`)
    Root,
    /// Starts at the evaluation scope (`./...`, `.//...`)
    Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    /// `//`, i.e. descendant-or-self followed by a child step
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based position among the step's candidates under one parent
    Position(usize),
    Attribute { name: String, value: String },
    Text(String),
    /// Unprefixed `name="..."`; resolved against the attribute of that name
    Bare { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub name: NameTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    pub origin: Origin,
    pub steps: Vec<Step>,
}

pub fn parse(pattern: &str) -> Result<PathExpr, TreeError> {
    Parser::new(pattern).parse()
}

struct Parser<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            chars: pattern.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> TreeError {
        TreeError {
            pattern: self.pattern.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), TreeError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at offset {}", c, self.pos)))
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<PathExpr, TreeError> {
        if self.chars.is_empty() {
            return Err(self.error("empty pattern"));
        }
        let origin = if self.eat('.') { Origin::Context } else { Origin::Root };

        let mut steps = Vec::new();
        while self.peek().is_some() {
            self.expect('/')?;
            let axis = if self.eat('/') { Axis::Descendant } else { Axis::Child };
            steps.push(self.step(axis)?);
        }
        if steps.is_empty() {
            return Err(self.error("pattern has no steps"));
        }
        Ok(PathExpr { origin, steps })
    }

    fn step(&mut self, axis: Axis) -> Result<Step, TreeError> {
        let name = if self.eat('*') {
            NameTest::Any
        } else {
            let ident = self.ident();
            if ident.is_empty() {
                return Err(self.error(format!("expected a tag name at offset {}", self.pos)));
            }
            NameTest::Tag(ident.to_lowercase())
        };

        let mut predicates = Vec::new();
        while self.eat('[') {
            self.skip_ws();
            predicates.push(self.predicate()?);
            self.skip_ws();
            self.expect(']')?;
        }
        Ok(Step { axis, name, predicates })
    }

    fn predicate(&mut self) -> Result<Predicate, TreeError> {
        if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            let digits: String = self.take_while(|c| c.is_ascii_digit());
            let position = digits
                .parse::<usize>()
                .map_err(|e| self.error(format!("bad position: {}", e)))?;
            return Ok(Predicate::Position(position));
        }

        let attribute = self.eat('@');
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error(format!("expected a predicate at offset {}", self.pos)));
        }
        let is_text = !attribute && name == "text" && self.eat('(');
        if is_text {
            self.expect(')')?;
        }

        self.skip_ws();
        self.expect('=')?;
        self.skip_ws();
        let value = self.literal()?;

        Ok(if is_text {
            Predicate::Text(value)
        } else if attribute {
            Predicate::Attribute { name, value }
        } else {
            Predicate::Bare { name, value }
        })
    }

    /// A quoted string, or `concat(...)` of quoted strings.
    fn literal(&mut self) -> Result<String, TreeError> {
        if self.peek() != Some('c') {
            return self.quoted();
        }
        let function = self.ident();
        if function != "concat" {
            return Err(self.error(format!("unsupported function '{}'", function)));
        }
        self.expect('(')?;
        let mut value = String::new();
        loop {
            self.skip_ws();
            value.push_str(&self.quoted()?);
            self.skip_ws();
            if self.eat(')') {
                return Ok(value);
            }
            self.expect(',')?;
        }
    }

    fn quoted(&mut self) -> Result<String, TreeError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error(format!("expected a string literal at offset {}", self.pos))),
        };
        self.pos += 1;
        let value = self.take_while(|c| c != quote);
        self.expect(quote)?;
        Ok(value)
    }

    fn ident(&mut self) -> String {
        self.take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':'))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}
