//! 宣言型 (`List<Dog>` など)

use logos::Logos;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type `{input}`: {reason}")]
pub struct TypeSyntaxError {
    pub input: String,
    pub reason: String,
}

/// Static type annotation of a program variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Base(String),
    Composed(Box<Type>, Vec<Type>),
}

impl Type {
    pub fn base(name: impl Into<String>) -> Self {
        Type::Base(name.into())
    }

    pub fn list_of(element: Type) -> Self {
        Type::Composed(Box::new(Type::base("List")), vec![element])
    }

    /// `T` for `List<T, ..>` with a concrete `T`, the only shape access queries may target
    pub fn list_element_class(&self) -> Option<&str> {
        match self {
            Type::Composed(primary, params) if **primary == Type::Base("List".to_string()) => match params.first() {
                Some(Type::Base(name)) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Base(name) => write!(f, "{}", name),
            Type::Composed(primary, params) => {
                write!(f, "{}<", primary)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token<'a> {
    #[regex(r"[A-Za-z0-9_]+")]
    Name(&'a str),

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token(",")]
    Comma,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "{}", name),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Comma => write!(f, ","),
        }
    }
}

impl FromStr for Type {
    type Err = TypeSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: String| TypeSyntaxError {
            input: s.to_string(),
            reason,
        };

        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(s).spanned() {
            match token {
                Ok(token) => tokens.push(token),
                Err(()) => return Err(fail(format!("unexpected '{}'", &s[span]))),
            }
        }

        let mut cursor = Cursor { tokens: &tokens, pos: 0 };
        let ty = cursor.ty().map_err(fail)?;
        if let Some(token) = cursor.peek() {
            return Err(fail(format!("unexpected '{}'", token)));
        }
        Ok(ty)
    }
}

struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, expected: Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // type := name ('<' type (',' type)* '>')?
    fn ty(&mut self) -> Result<Type, String> {
        let name = match self.peek() {
            Some(Token::Name(name)) => {
                self.pos += 1;
                name
            }
            Some(other) => return Err(format!("expected a type name, found '{}'", other)),
            None => return Err("expected a type name".to_string()),
        };
        if !self.eat(Token::Lt) {
            return Ok(Type::base(name));
        }

        let mut params = vec![self.ty()?];
        loop {
            if self.eat(Token::Comma) {
                params.push(self.ty()?);
            } else if self.eat(Token::Gt) {
                return Ok(Type::Composed(Box::new(Type::base(name)), params));
            } else {
                return Err("unclosed type parameter list".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let ty: Type = "List<Dog>".parse().unwrap();
        assert_eq!(ty, Type::list_of(Type::base("Dog")));
        assert_eq!(ty.to_string(), "List<Dog>");

        let nested: Type = "Pair< List<Int> , String >".parse().unwrap();
        assert_eq!(nested.to_string(), "Pair<List<Int>, String>");
    }

    #[test]
    fn test_list_element_class() {
        assert_eq!(Type::list_of(Type::base("Dog")).list_element_class(), Some("Dog"));
        assert_eq!(Type::base("Dog").list_element_class(), None);
        assert_eq!(Type::list_of(Type::list_of(Type::base("Dog"))).list_element_class(), None);
        let pair: Type = "Pair<Dog,Cat>".parse().unwrap();
        assert_eq!(pair.list_element_class(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Type>().is_err());
        assert!("List<Dog".parse::<Type>().is_err());
        assert!("List<>".parse::<Type>().is_err());
        assert!("List<Dog>>".parse::<Type>().is_err());

        let err = "List<Dog;>".parse::<Type>().unwrap_err();
        assert_eq!(err.reason, "unexpected ';'");
        let err = "List<,Dog>".parse::<Type>().unwrap_err();
        assert_eq!(err.reason, "expected a type name, found ','");
        let err = "Map<Dog, Cat".parse::<Type>().unwrap_err();
        assert_eq!(err.to_string(), "invalid type `Map<Dog, Cat`: unclosed type parameter list");
    }
}
