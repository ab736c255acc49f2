//! SPARQL 字句解析器

use logos::Logos;

fn strip_iri<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> &'a str {
    let s = lex.slice();
    &s[1..s.len() - 1]
}

fn strip_quotes<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> &'a str {
    let s = lex.slice();
    &s[1..s.len() - 1]
}

/// SPARQL トークン
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'a> {
    #[token("SELECT", ignore(ascii_case))]
    Select,

    #[token("CONSTRUCT", ignore(ascii_case))]
    Construct,

    #[token("ASK", ignore(ascii_case))]
    Ask,

    #[token("DESCRIBE", ignore(ascii_case))]
    Describe,

    #[token("WHERE", ignore(ascii_case))]
    Where,

    #[token("FILTER", ignore(ascii_case))]
    Filter,

    #[token("OPTIONAL", ignore(ascii_case))]
    Optional,

    #[token("UNION", ignore(ascii_case))]
    Union,

    #[token("MINUS", ignore(ascii_case))]
    Minus,

    #[token("GRAPH", ignore(ascii_case))]
    Graph,

    #[token("SERVICE", ignore(ascii_case))]
    Service,

    #[token("SILENT", ignore(ascii_case))]
    Silent,

    #[token("BIND", ignore(ascii_case))]
    Bind,

    #[token("VALUES", ignore(ascii_case))]
    Values,

    #[token("ORDER", ignore(ascii_case))]
    Order,

    #[token("GROUP", ignore(ascii_case))]
    Group,

    #[token("HAVING", ignore(ascii_case))]
    Having,

    #[token("BY", ignore(ascii_case))]
    By,

    #[token("LIMIT", ignore(ascii_case))]
    Limit,

    #[token("OFFSET", ignore(ascii_case))]
    Offset,

    #[token("DISTINCT", ignore(ascii_case))]
    Distinct,

    #[token("REDUCED", ignore(ascii_case))]
    Reduced,

    #[token("FROM", ignore(ascii_case))]
    From,

    #[token("NAMED", ignore(ascii_case))]
    Named,

    #[token("ASC", ignore(ascii_case))]
    Asc,

    #[token("DESC", ignore(ascii_case))]
    Desc,

    #[token("AS", ignore(ascii_case))]
    As,

    #[token("BASE", ignore(ascii_case))]
    Base,

    #[token("PREFIX", ignore(ascii_case))]
    Prefix,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("a", priority = 3)]
    A,

    #[regex(r"[?$][A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Variable(&'a str),

    #[regex(r#"<[^<>"{}|^`\\\x00-\x20]*>"#, strip_iri)]
    Iri(&'a str),

    #[regex(r#""([^"\\\n]|\\.)*""#, strip_quotes)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, strip_quotes)]
    StringLiteral(&'a str),

    #[regex(r"([A-Za-z][A-Za-z0-9_\-]*)?:([A-Za-z0-9_][A-Za-z0-9_\-]*)?")]
    PrefixedName(&'a str),

    #[regex(r"_:[A-Za-z0-9_]+", |lex| &lex.slice()[2..])]
    BlankNode(&'a str),

    /// Bare identifiers, i.e. built-in function names inside FILTER/BIND
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Name(&'a str),

    /// Numbers keep their sign in the lexical form
    #[regex(r"[+-]?[0-9]+")]
    Integer(&'a str),

    #[regex(r"[+-]?[0-9]*\.[0-9]+")]
    Decimal(&'a str),

    #[regex(r"[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)[eE][+-]?[0-9]+")]
    Double(&'a str),

    #[regex(r"@[a-zA-Z]+(-[a-zA-Z0-9]+)*", |lex| &lex.slice()[1..])]
    LangTag(&'a str),

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("^^")]
    DoubleCaret,

    #[token("^")]
    Caret,

    #[token("/")]
    Slash,

    #[token("|")]
    Pipe,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("-")]
    Dash,

    #[token("?")]
    Question,

    #[token("=")]
    Equals,

    #[token("!=")]
    NotEquals,

    #[token("<")]
    LessThan,

    #[token("<=")]
    LessEqual,

    #[token(">")]
    GreaterThan,

    #[token(">=")]
    GreaterEqual,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("!")]
    Not,
}

impl<'a> Token<'a> {
    /// Whether this token can start a term in subject or object position
    pub fn starts_term(&self) -> bool {
        matches!(
            self,
            Token::Variable(_)
                | Token::Iri(_)
                | Token::PrefixedName(_)
                | Token::BlankNode(_)
                | Token::StringLiteral(_)
                | Token::Integer(_)
                | Token::Decimal(_)
                | Token::Double(_)
                | Token::True
                | Token::False
                | Token::LBracket
                | Token::LParen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token<'_>> {
        Token::lexer(input).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_select_tokens() {
        let tokens = lex("select ?obj where { ?obj a :Dog }");
        assert_eq!(
            tokens,
            vec![
                Token::Select,
                Token::Variable("obj"),
                Token::Where,
                Token::LBrace,
                Token::Variable("obj"),
                Token::A,
                Token::PrefixedName(":Dog"),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_iri_versus_less_than() {
        let tokens = lex("<http://example.org/a#b> ?x < 5");
        assert_eq!(
            tokens,
            vec![
                Token::Iri("http://example.org/a#b"),
                Token::Variable("x"),
                Token::LessThan,
                Token::Integer("5"),
            ]
        );
    }

    #[test]
    fn test_literals() {
        let tokens = lex(r#""abc"^^xsd:string 'x'@en 5. 2.5 1e3 true"#);
        assert_eq!(
            tokens,
            vec![
                Token::StringLiteral("abc"),
                Token::DoubleCaret,
                Token::PrefixedName("xsd:string"),
                Token::StringLiteral("x"),
                Token::LangTag("en"),
                Token::Integer("5"),
                Token::Dot,
                Token::Decimal("2.5"),
                Token::Double("1e3"),
                Token::True,
            ]
        );
    }

    #[test]
    fn test_signed_numbers() {
        let tokens = lex("-3 +2.5 -1e3 ?p+ ?x");
        assert_eq!(
            tokens,
            vec![
                Token::Integer("-3"),
                Token::Decimal("+2.5"),
                Token::Double("-1e3"),
                Token::Variable("p"),
                Token::Plus,
                Token::Variable("x"),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = lex("# leading comment\nASK { }");
        assert_eq!(tokens, vec![Token::Ask, Token::LBrace, Token::RBrace]);
    }

    #[test]
    fn test_prefix_declaration_name() {
        let tokens = lex("PREFIX prog: <http://example.org/prog#>");
        assert_eq!(
            tokens,
            vec![
                Token::Prefix,
                Token::PrefixedName("prog:"),
                Token::Iri("http://example.org/prog#"),
            ]
        );
    }
}
