use std::fmt;
use thiserror::Error;

/// A parsed type expression such as `Option<Vec<i32>>` or `crate::model::Pet`.
///
/// The unit type is represented with the name `()` and no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Path of the type, e.g. `Option` or `crate::model::Pet`
    pub name: String,
    /// Generic arguments in order
    pub args: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type expression `{input}`: {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub reason: String,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef {
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn unit() -> Self {
        TypeRef::named("()")
    }

    /// Parse a type expression.
    ///
    /// Accepts `()`, paths separated by `::` (optionally rooted) and generic
    /// arguments in angle brackets. References, tuples and arrays are rejected.
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        let mut parser = Parser {
            input,
            chars: input.char_indices().peekable(),
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if let Some(&(_, c)) = parser.chars.peek() {
            return Err(parser.error(format!("unexpected `{c}` after type")));
        }
        Ok(ty)
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.name == "()"
    }

    /// Last path segment: `Pet` for `crate::model::Pet`
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// The only generic argument, if there is exactly one
    #[must_use]
    pub fn single_arg(&self) -> Option<&TypeRef> {
        match self.args.as_slice() {
            [arg] => Some(arg),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        self.chars.next_if(|(_, c)| *c == expected).is_some()
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeParseError> {
        self.skip_ws();
        if self.eat('(') {
            if self.eat(')') {
                return Ok(TypeRef::unit());
            }
            return Err(self.error("tuple types are not supported"));
        }
        let name = self.parse_path()?;
        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected `,` or `>` in generic arguments"));
            }
        }
        Ok(TypeRef { name, args })
    }

    fn parse_path(&mut self) -> Result<String, TypeParseError> {
        let mut path = String::new();
        if self.eat(':') {
            if !self.eat(':') {
                return Err(self.error("expected `::`"));
            }
            path.push_str("::");
        }
        loop {
            let segment = self.parse_ident()?;
            path.push_str(&segment);
            // `::` continues the path; a lone `:` is never valid in a type
            if self.chars.next_if(|(_, c)| *c == ':').is_some() {
                if self.chars.next_if(|(_, c)| *c == ':').is_none() {
                    return Err(self.error("expected `::`"));
                }
                path.push_str("::");
                continue;
            }
            return Ok(path);
        }
    }

    fn parse_ident(&mut self) -> Result<String, TypeParseError> {
        self.skip_ws();
        let mut ident = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        {
            ident.push(c);
        }
        match ident.chars().next() {
            None => Err(self.error("expected identifier")),
            Some(first) if first.is_ascii_digit() => {
                Err(self.error(format!("identifier `{ident}` starts with a digit")))
            }
            Some(_) => Ok(ident),
        }
    }
}
