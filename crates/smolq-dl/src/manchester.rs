//! Manchester 構文パーサー
//!
//! 合成されたクラス式の文字列をオントロジーの文脈で [`ClassExpression`] に変換する。
//! キーワード (`some`, `value`, `and`, ...) は大文字小文字を区別しない。

use crate::model::{ClassExpression, Individual, OwlDlOntology, OwlIri, PropertyExpression, Value};
use crate::OwlDlError;
use logos::Logos;
use smolq_core::vocabulary::{RDFS_NS, XSD_NS};
use smolq_core::PrefixTable;
use std::ops::Range;

fn strip_delimiters<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> &'a str {
    let s = lex.slice();
    &s[1..s.len() - 1]
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token<'a> {
    #[token("and", ignore(ascii_case))]
    And,

    #[token("or", ignore(ascii_case))]
    Or,

    #[token("not", ignore(ascii_case))]
    Not,

    #[token("some", ignore(ascii_case))]
    SomeValues,

    #[token("only", ignore(ascii_case))]
    AllValues,

    #[token("value", ignore(ascii_case))]
    HasValue,

    #[token("inverse", ignore(ascii_case))]
    Inverse,

    #[token("min", ignore(ascii_case))]
    #[token("max", ignore(ascii_case))]
    #[token("exactly", ignore(ascii_case))]
    Cardinality,

    #[regex(r#"<[^<>"{}|^`\\\x00-\x20]*>"#, strip_delimiters)]
    Iri(&'a str),

    #[regex(r"([A-Za-z][A-Za-z0-9_\-]*)?:[A-Za-z0-9_][A-Za-z0-9_\-]*")]
    PrefixedName(&'a str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*")]
    Word(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#, strip_delimiters)]
    StringLiteral(&'a str),

    #[regex(r"[+-]?[0-9]+")]
    Integer(&'a str),

    #[regex(r"[+-]?[0-9]*\.[0-9]+")]
    Decimal(&'a str),

    #[regex(r"@[a-zA-Z]+(-[a-zA-Z0-9]+)*")]
    LangTag(&'a str),

    #[token("^^")]
    DoubleCaret,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
}

/// Parses Manchester syntax class expressions.
///
/// The ontology decides whether a property IRI denotes a data property.
/// Bare words resolve against the empty prefix when the table defines one.
pub struct ManchesterParser<'o> {
    ontology: &'o OwlDlOntology,
    prefixes: PrefixTable,
}

impl<'o> ManchesterParser<'o> {
    pub fn new(ontology: &'o OwlDlOntology) -> Self {
        Self {
            ontology,
            prefixes: PrefixTable::with_standard(),
        }
    }

    pub fn with_prefixes(mut self, prefixes: PrefixTable) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn parse(&self, input: &str) -> Result<ClassExpression, OwlDlError> {
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(input).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(OwlDlError::ParseError(format!(
                        "unexpected character at offset {}: '{}'",
                        span.start,
                        &input[span.clone()]
                    )))
                }
            }
        }

        let mut cursor = Cursor {
            parser: self,
            tokens: &tokens,
            pos: 0,
            input_len: input.len(),
        };
        let expression = cursor.description()?;
        if let Some((token, span)) = cursor.tokens.get(cursor.pos) {
            return Err(OwlDlError::ParseError(format!(
                "unexpected {:?} at offset {}, expected end of expression",
                token, span.start
            )));
        }
        Ok(expression)
    }

    fn property(&self, iri: OwlIri) -> PropertyExpression {
        if self.ontology.is_data_property(&iri) {
            PropertyExpression::DataProperty(iri)
        } else {
            PropertyExpression::ObjectProperty(iri)
        }
    }
}

struct Cursor<'p, 'o, 't, 'a> {
    parser: &'p ManchesterParser<'o>,
    tokens: &'t [(Token<'a>, Range<usize>)],
    pos: usize,
    input_len: usize,
}

impl<'p, 'o, 't, 'a> Cursor<'p, 'o, 't, 'a> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, s)| s.start).unwrap_or(self.input_len)
    }

    fn eat(&mut self, expected: &Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<(), OwlDlError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", expected)))
        }
    }

    fn error(&self, expected: &str) -> OwlDlError {
        match self.peek() {
            Some(token) => OwlDlError::ParseError(format!(
                "unexpected {:?} at offset {}, {}",
                token,
                self.offset(),
                expected
            )),
            None => OwlDlError::ParseError(format!("unexpected end of expression, {}", expected)),
        }
    }

    // description := conjunction ('or' conjunction)*
    fn description(&mut self) -> Result<ClassExpression, OwlDlError> {
        let mut operands = vec![self.conjunction()?];
        while self.eat(&Token::Or) {
            operands.push(self.conjunction()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            ClassExpression::UnionOf(operands)
        })
    }

    // conjunction := primary ('and' primary)*
    fn conjunction(&mut self) -> Result<ClassExpression, OwlDlError> {
        let mut operands = vec![self.primary()?];
        while self.eat(&Token::And) {
            operands.push(self.primary()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            ClassExpression::IntersectionOf(operands)
        })
    }

    fn primary(&mut self) -> Result<ClassExpression, OwlDlError> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(ClassExpression::ComplementOf(Box::new(self.primary()?)))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.description()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBrace) => self.one_of(),
            Some(Token::Inverse) => {
                let property = self.inverse_property()?;
                self.restriction(property)
            }
            Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) | Some(Token::Word(_)) => {
                let iri = self.iri()?;
                match self.peek() {
                    Some(Token::SomeValues) | Some(Token::AllValues) | Some(Token::HasValue) | Some(Token::Cardinality) => {
                        let property = self.parser.property(iri);
                        self.restriction(property)
                    }
                    _ => Ok(ClassExpression::named(iri.0)),
                }
            }
            _ => Err(self.error("expected a class expression")),
        }
    }

    fn one_of(&mut self) -> Result<ClassExpression, OwlDlError> {
        self.expect(Token::LBrace)?;
        let mut individuals = vec![Individual(self.iri()?)];
        while self.eat(&Token::Comma) {
            individuals.push(Individual(self.iri()?));
        }
        self.expect(Token::RBrace)?;
        Ok(ClassExpression::OneOf(individuals))
    }

    fn inverse_property(&mut self) -> Result<PropertyExpression, OwlDlError> {
        self.expect(Token::Inverse)?;
        let parenthesized = self.eat(&Token::LParen);
        let inner = match self.peek() {
            Some(Token::Inverse) => self.inverse_property()?,
            _ => {
                let iri = self.iri()?;
                self.parser.property(iri)
            }
        };
        if parenthesized {
            self.expect(Token::RParen)?;
        }
        if inner.is_data() {
            return Err(OwlDlError::ParseError(format!(
                "data property {} cannot be inverted",
                inner
            )));
        }
        Ok(inner.inverse())
    }

    fn restriction(&mut self, property: PropertyExpression) -> Result<ClassExpression, OwlDlError> {
        match self.peek() {
            Some(Token::SomeValues) => {
                self.pos += 1;
                let filler = self.filler(&property)?;
                Ok(ClassExpression::SomeValuesFrom {
                    property,
                    class: Box::new(filler),
                })
            }
            Some(Token::AllValues) => {
                self.pos += 1;
                let filler = self.filler(&property)?;
                Ok(ClassExpression::AllValuesFrom {
                    property,
                    class: Box::new(filler),
                })
            }
            Some(Token::HasValue) => {
                self.pos += 1;
                let value = self.value()?;
                Ok(ClassExpression::HasValue { property, value })
            }
            Some(Token::Cardinality) => Err(OwlDlError::UnsupportedFeature(
                "cardinality restrictions".to_string(),
            )),
            _ => Err(self.error(&format!("expected some, only or value after {}", property))),
        }
    }

    fn filler(&mut self, property: &PropertyExpression) -> Result<ClassExpression, OwlDlError> {
        let filler = self.primary()?;
        if property.is_data() {
            data_range(property, filler)
        } else {
            Ok(filler)
        }
    }

    fn value(&mut self) -> Result<Value, OwlDlError> {
        match self.peek().cloned() {
            Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) => Ok(Value::Individual(Individual(self.iri()?))),
            Some(Token::Word(word)) => {
                self.pos += 1;
                Ok(Value::Literal(word.to_string()))
            }
            Some(Token::Integer(number)) | Some(Token::Decimal(number)) => {
                self.pos += 1;
                Ok(Value::Literal(number.to_string()))
            }
            Some(Token::StringLiteral(text)) => {
                self.pos += 1;
                if self.eat(&Token::DoubleCaret) {
                    self.iri()?;
                } else if let Some(Token::LangTag(_)) = self.peek() {
                    self.pos += 1;
                }
                Ok(Value::Literal(text.replace("\\\"", "\"")))
            }
            _ => Err(self.error("expected an individual or a literal")),
        }
    }

    fn iri(&mut self) -> Result<OwlIri, OwlDlError> {
        match self.peek().cloned() {
            Some(Token::Iri(iri)) => {
                self.pos += 1;
                Ok(OwlIri::new(iri))
            }
            Some(Token::PrefixedName(name)) => {
                self.pos += 1;
                self.parser
                    .prefixes
                    .expand(name)
                    .map(OwlIri::new)
                    .map_err(|e| OwlDlError::ParseError(e.to_string()))
            }
            Some(Token::Word(word)) => match self.parser.prefixes.namespace("") {
                Some(namespace) => {
                    self.pos += 1;
                    Ok(OwlIri::new(format!("{}{}", namespace, word)))
                }
                None => Err(OwlDlError::ParseError(format!("unresolved name '{}'", word))),
            },
            _ => Err(self.error("expected an IRI")),
        }
    }
}

/// Data properties only accept datatypes as fillers; they all collapse to owl:Thing
fn data_range(property: &PropertyExpression, filler: ClassExpression) -> Result<ClassExpression, OwlDlError> {
    match &filler {
        ClassExpression::Thing => Ok(ClassExpression::Thing),
        ClassExpression::Named(iri) if iri.as_str().starts_with(XSD_NS) || iri.as_str() == format!("{}Literal", RDFS_NS) => {
            Ok(ClassExpression::Thing)
        }
        _ => Err(OwlDlError::ParseError(format!(
            "data property {} cannot take the class filler {}",
            property, filler
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EX: &str = "http://example.org/";

    fn ontology() -> OwlDlOntology {
        let mut ontology = OwlDlOntology::new();
        ontology.declare_class(OwlIri::new(format!("{}Dog", EX)));
        ontology.declare_object_property(OwlIri::new(format!("{}owner", EX)));
        ontology.declare_data_property(OwlIri::new(format!("{}age", EX)));
        ontology
    }

    fn iri(local: &str) -> OwlIri {
        OwlIri::new(format!("{}{}", EX, local))
    }

    #[test]
    fn test_named_and_thing() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        assert_eq!(parser.parse("<http://example.org/Dog>").unwrap(), ClassExpression::Named(iri("Dog")));
        assert_eq!(parser.parse("owl:Thing").unwrap(), ClassExpression::Thing);
        assert_eq!(
            parser.parse("<http://www.w3.org/2002/07/owl#Thing>").unwrap(),
            ClassExpression::Thing
        );
    }

    #[test]
    fn test_synthesized_shape() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        let expr = parser
            .parse("<http://example.org/Dog> AND (<http://example.org/owner> SOME owl:Thing) AND (<http://example.org/age> VALUE 5)")
            .unwrap();
        assert_eq!(
            expr,
            ClassExpression::IntersectionOf(vec![
                ClassExpression::Named(iri("Dog")),
                ClassExpression::some(PropertyExpression::ObjectProperty(iri("owner")), ClassExpression::Thing),
                ClassExpression::has_value(PropertyExpression::DataProperty(iri("age")), Value::Literal("5".to_string())),
            ])
        );
    }

    #[test]
    fn test_inverse_restriction() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        let expr = parser
            .parse("(inverse(<http://example.org/owner>) SOME <http://example.org/Dog>)")
            .unwrap();
        assert_eq!(
            expr,
            ClassExpression::some(
                PropertyExpression::ObjectProperty(iri("owner")).inverse(),
                ClassExpression::Named(iri("Dog"))
            )
        );
    }

    #[test]
    fn test_value_forms() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        let owner = PropertyExpression::ObjectProperty(iri("owner"));
        assert_eq!(
            parser.parse("(<http://example.org/owner> value <http://example.org/alice>)").unwrap(),
            ClassExpression::has_value(owner.clone(), Value::Individual(Individual(iri("alice"))))
        );
        assert_eq!(
            parser.parse("(<http://example.org/age> value \"five\"^^xsd:string)").unwrap(),
            ClassExpression::has_value(PropertyExpression::DataProperty(iri("age")), Value::Literal("five".to_string()))
        );
        assert_eq!(
            parser.parse("(<http://example.org/owner> value true)").unwrap(),
            ClassExpression::has_value(owner, Value::Literal("true".to_string()))
        );
        assert_eq!(
            parser.parse("(<http://example.org/age> value -3)").unwrap(),
            ClassExpression::has_value(PropertyExpression::DataProperty(iri("age")), Value::Literal("-3".to_string()))
        );
        assert_eq!(
            parser.parse("(<http://example.org/age> value +2.5)").unwrap(),
            ClassExpression::has_value(PropertyExpression::DataProperty(iri("age")), Value::Literal("+2.5".to_string()))
        );
    }

    #[test]
    fn test_union_and_complement() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        let expr = parser.parse("not <http://example.org/Dog> or owl:Nothing").unwrap();
        assert_eq!(
            expr,
            ClassExpression::UnionOf(vec![
                ClassExpression::ComplementOf(Box::new(ClassExpression::Named(iri("Dog")))),
                ClassExpression::Nothing,
            ])
        );
    }

    #[test]
    fn test_bare_word_uses_default_prefix() {
        let o = ontology();
        let mut prefixes = PrefixTable::with_standard();
        prefixes.insert("", EX);
        let parser = ManchesterParser::new(&o).with_prefixes(prefixes);
        assert_eq!(parser.parse("Dog").unwrap(), ClassExpression::Named(iri("Dog")));

        let without_default = ManchesterParser::new(&o);
        assert!(matches!(without_default.parse("Dog"), Err(OwlDlError::ParseError(_))));
    }

    #[test]
    fn test_errors() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        assert!(matches!(parser.parse("(<http://example.org/Dog>"), Err(OwlDlError::ParseError(_))));
        assert!(matches!(parser.parse("<http://example.org/Dog> AND"), Err(OwlDlError::ParseError(_))));
        assert!(matches!(parser.parse("nope:Dog"), Err(OwlDlError::ParseError(_))));
        assert!(matches!(parser.parse("<http://example.org/Dog> %"), Err(OwlDlError::ParseError(_))));
        assert!(matches!(
            parser.parse("(<http://example.org/age> SOME <http://example.org/Dog>)"),
            Err(OwlDlError::ParseError(_))
        ));
        assert!(matches!(
            parser.parse("(<http://example.org/owner> min 2 <http://example.org/Dog>)"),
            Err(OwlDlError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_data_property_datatype_filler() {
        let o = ontology();
        let parser = ManchesterParser::new(&o);
        assert_eq!(
            parser.parse("(<http://example.org/age> some xsd:integer)").unwrap(),
            ClassExpression::some(PropertyExpression::DataProperty(iri("age")), ClassExpression::Thing)
        );
    }
}
