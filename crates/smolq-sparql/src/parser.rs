//! SPARQL 1.1 構文解析器 (検査器が扱う部分集合)
//!
//! グループグラフパターンの全構文を読み取り、検査器が形状で
//! 拒否できるように OPTIONAL / UNION / FILTER なども木に残す。

use crate::lexer::Token;
use crate::SparqlError;
use logos::Logos;
use smolq_core::vocabulary::{RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use smolq_core::PrefixTable;
use std::fmt;
use std::ops::Range;

/// IRI (without angle brackets)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Iri(pub String);

impl Iri {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// RDF Literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<Iri>,
    pub language: Option<String>,
}

impl Literal {
    pub fn typed(value: impl Into<String>, datatype: &str) -> Self {
        Self {
            value: value.into(),
            datatype: Some(Iri(datatype.to_string())),
            language: None,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }
}

/// N-Triples form: `"v"`, `"v"@en` or `"v"^^<datatype>`
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "\"{}\"", escaped)?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^{}", dt)
        } else {
            Ok(())
        }
    }
}

/// RDF Variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Variable(pub String);

impl Variable {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// RDF Term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
    Variable(Variable),
    BlankNode(String),
}

impl Term {
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{}", iri),
            Term::Literal(lit) => write!(f, "{}", lit),
            Term::Variable(var) => write!(f, "{}", var),
            Term::BlankNode(label) => write!(f, "_:{}", label),
        }
    }
}

/// Triple Pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// Var or IRI
#[derive(Debug, Clone, PartialEq)]
pub enum VarOrIri {
    Var(Variable),
    Iri(Iri),
}

/// Graph Pattern
///
/// Constraint bodies (FILTER, BIND, VALUES) are kept as their source text.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphPattern {
    Bgp(Vec<TriplePattern>),
    Group(Vec<GraphPattern>),
    Optional(Box<GraphPattern>),
    Union(Vec<GraphPattern>),
    Minus(Box<GraphPattern>),
    Filter(String),
    Bind(String),
    Values(String),
    Graph(VarOrIri, Box<GraphPattern>),
    Service(VarOrIri, Box<GraphPattern>, bool), // silent flag
}

impl GraphPattern {
    /// Collect variables of all triple patterns in first-occurrence order
    pub fn collect_variables(&self, out: &mut Vec<Variable>) {
        match self {
            GraphPattern::Bgp(triples) => {
                for t in triples {
                    for term in [&t.subject, &t.predicate, &t.object] {
                        if let Term::Variable(v) = term {
                            if !out.contains(v) {
                                out.push(v.clone());
                            }
                        }
                    }
                }
            }
            GraphPattern::Group(elements) | GraphPattern::Union(elements) => {
                for e in elements {
                    e.collect_variables(out);
                }
            }
            GraphPattern::Optional(inner)
            | GraphPattern::Minus(inner)
            | GraphPattern::Graph(_, inner)
            | GraphPattern::Service(_, inner, _) => inner.collect_variables(out),
            GraphPattern::Filter(_) | GraphPattern::Bind(_) | GraphPattern::Values(_) => {}
        }
    }
}

/// Order condition
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCondition {
    Asc(Variable),
    Desc(Variable),
}

/// Solution modifier
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolutionModifier {
    pub order: Vec<OrderCondition>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
    pub reduced: bool,
}

/// Query Type
#[derive(Debug, Clone, PartialEq)]
pub enum QueryType {
    Select,
    Construct(Vec<TriplePattern>),
    Ask,
    Describe(Vec<VarOrIri>),
}

/// Graph reference for FROM/FROM NAMED
#[derive(Debug, Clone, PartialEq)]
pub enum GraphRef {
    Named(Iri),
    Default(Iri),
}

/// SPARQL Query
#[derive(Debug, Clone, PartialEq)]
pub struct SparqlQuery {
    pub query_type: QueryType,
    /// Explicitly projected variables; empty for `SELECT *`
    pub variables: Vec<Variable>,
    pub select_all: bool,
    pub dataset: Vec<GraphRef>,
    pub where_clause: GraphPattern,
    pub solution_modifier: SolutionModifier,
    pub base_iri: Option<Iri>,
    pub prefixes: PrefixTable,
}

impl SparqlQuery {
    pub fn is_select(&self) -> bool {
        matches!(self.query_type, QueryType::Select)
    }

    /// Projected variables, with `*` resolved against the WHERE clause
    pub fn projected_variables(&self) -> Vec<Variable> {
        if self.select_all {
            let mut vars = Vec::new();
            self.where_clause.collect_variables(&mut vars);
            vars
        } else {
            self.variables.clone()
        }
    }
}

/// SPARQL Parser trait
pub trait SparqlParser {
    fn parse(&self, query: &str) -> Result<SparqlQuery, SparqlError>;
}

/// Default implementation
///
/// Prefixes registered on the parser are visible to every query; `PREFIX`
/// declarations inside the query override them.
#[derive(Debug, Clone, Default)]
pub struct DefaultSparqlParser {
    prefixes: PrefixTable,
}

impl DefaultSparqlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefixes(prefixes: PrefixTable) -> Self {
        Self { prefixes }
    }
}

impl SparqlParser for DefaultSparqlParser {
    fn parse(&self, query: &str) -> Result<SparqlQuery, SparqlError> {
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(query).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(SparqlError::ParseError(format!(
                        "unrecognized input `{}` at byte {}",
                        &query[span.clone()],
                        span.start
                    )))
                }
            }
        }

        let mut cursor = Cursor {
            source: query,
            tokens,
            pos: 0,
            prefixes: self.prefixes.clone(),
            base: None,
        };
        cursor.query()
    }
}

struct Cursor<'a> {
    source: &'a str,
    tokens: Vec<(Token<'a>, Range<usize>)>,
    pos: usize,
    prefixes: PrefixTable,
    base: Option<Iri>,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn error(&self, what: &str) -> SparqlError {
        match self.tokens.get(self.pos) {
            Some((_, span)) => SparqlError::ParseError(format!(
                "expected {}, found `{}` at byte {}",
                what,
                &self.source[span.clone()],
                span.start
            )),
            None => SparqlError::ParseError(format!("expected {}, found end of query", what)),
        }
    }

    fn expect(&mut self, expected: Token<'a>, what: &str) -> Result<(), SparqlError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(what))
        }
    }

    fn query(&mut self) -> Result<SparqlQuery, SparqlError> {
        self.prologue()?;

        let mut variables = Vec::new();
        let mut select_all = false;
        let mut modifier = SolutionModifier::default();

        let head = self.peek().cloned();
        if matches!(head, Some(Token::Select) | Some(Token::Construct) | Some(Token::Ask) | Some(Token::Describe)) {
            self.pos += 1;
        }
        let query_type = match head {
            Some(Token::Select) => {
                if self.eat(&Token::Distinct) {
                    modifier.distinct = true;
                } else if self.eat(&Token::Reduced) {
                    modifier.reduced = true;
                }
                if self.eat(&Token::Star) {
                    select_all = true;
                } else {
                    while let Some(Token::Variable(name)) = self.peek() {
                        variables.push(Variable(name.to_string()));
                        self.pos += 1;
                    }
                    if variables.is_empty() {
                        if self.peek() == Some(&Token::LParen) {
                            return Err(SparqlError::UnsupportedFeature(
                                "projection expressions".to_string(),
                            ));
                        }
                        return Err(self.error("projected variables or `*`"));
                    }
                }
                QueryType::Select
            }
            Some(Token::Construct) => {
                // `CONSTRUCT WHERE { ... }` has no separate template
                if self.eat(&Token::LBrace) {
                    let template = self.triples_until_brace()?;
                    QueryType::Construct(template)
                } else {
                    QueryType::Construct(Vec::new())
                }
            }
            Some(Token::Ask) => QueryType::Ask,
            Some(Token::Describe) => {
                let mut targets = Vec::new();
                if !self.eat(&Token::Star) {
                    loop {
                        match self.peek() {
                            Some(Token::Variable(name)) => {
                                targets.push(VarOrIri::Var(Variable(name.to_string())));
                                self.pos += 1;
                            }
                            Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) => {
                                targets.push(VarOrIri::Iri(self.iri()?));
                            }
                            _ => break,
                        }
                    }
                }
                QueryType::Describe(targets)
            }
            _ => return Err(self.error("SELECT, CONSTRUCT, ASK or DESCRIBE")),
        };

        let dataset = self.dataset_clauses()?;

        let where_clause = if matches!(query_type, QueryType::Describe(_))
            && self.peek() != Some(&Token::Where)
            && self.peek() != Some(&Token::LBrace)
        {
            GraphPattern::Group(Vec::new())
        } else {
            self.eat(&Token::Where);
            self.group()?
        };

        self.solution_modifier(&mut modifier)?;

        if self.peek().is_some() {
            return Err(self.error("end of query"));
        }

        Ok(SparqlQuery {
            query_type,
            variables,
            select_all,
            dataset,
            where_clause,
            solution_modifier: modifier,
            base_iri: self.base.clone(),
            prefixes: self.prefixes.clone(),
        })
    }

    fn prologue(&mut self) -> Result<(), SparqlError> {
        loop {
            match self.peek() {
                Some(Token::Base) => {
                    self.pos += 1;
                    match self.peek().cloned() {
                        Some(Token::Iri(iri)) => {
                            self.pos += 1;
                            self.base = Some(Iri(iri.to_string()));
                        }
                        _ => return Err(self.error("base IRI")),
                    }
                }
                Some(Token::Prefix) => {
                    self.pos += 1;
                    let name = match self.peek().cloned() {
                        Some(Token::PrefixedName(name)) if name.ends_with(':') => name,
                        _ => return Err(self.error("prefix name ending in `:`")),
                    };
                    self.pos += 1;
                    let namespace = match self.peek().cloned() {
                        Some(Token::Iri(iri)) => self.resolve_relative(iri),
                        _ => return Err(self.error("namespace IRI")),
                    };
                    self.pos += 1;
                    self.prefixes.insert(name.trim_end_matches(':'), namespace);
                }
                _ => return Ok(()),
            }
        }
    }

    fn dataset_clauses(&mut self) -> Result<Vec<GraphRef>, SparqlError> {
        let mut dataset = Vec::new();
        while self.eat(&Token::From) {
            if self.eat(&Token::Named) {
                dataset.push(GraphRef::Named(self.iri()?));
            } else {
                dataset.push(GraphRef::Default(self.iri()?));
            }
        }
        Ok(dataset)
    }

    fn solution_modifier(&mut self, modifier: &mut SolutionModifier) -> Result<(), SparqlError> {
        if matches!(self.peek(), Some(Token::Group) | Some(Token::Having)) {
            return Err(SparqlError::UnsupportedFeature("aggregation".to_string()));
        }
        if self.eat(&Token::Order) {
            self.expect(Token::By, "BY")?;
            loop {
                match self.peek() {
                    Some(Token::Variable(name)) => {
                        modifier.order.push(OrderCondition::Asc(Variable(name.to_string())));
                        self.pos += 1;
                    }
                    Some(Token::Asc) | Some(Token::Desc) => {
                        let descending = self.peek() == Some(&Token::Desc);
                        self.pos += 1;
                        self.expect(Token::LParen, "`(`")?;
                        let var = match self.peek().cloned() {
                            Some(Token::Variable(name)) => Variable(name.to_string()),
                            _ => {
                                return Err(SparqlError::UnsupportedFeature(
                                    "ordering by expressions".to_string(),
                                ))
                            }
                        };
                        self.pos += 1;
                        self.expect(Token::RParen, "`)`")?;
                        modifier.order.push(if descending {
                            OrderCondition::Desc(var)
                        } else {
                            OrderCondition::Asc(var)
                        });
                    }
                    _ => break,
                }
            }
            if modifier.order.is_empty() {
                return Err(self.error("ordering condition"));
            }
        }
        loop {
            if self.eat(&Token::Limit) {
                modifier.limit = Some(self.unsigned()?);
            } else if self.eat(&Token::Offset) {
                modifier.offset = Some(self.unsigned()?);
            } else {
                return Ok(());
            }
        }
    }

    fn unsigned(&mut self) -> Result<u64, SparqlError> {
        match self.peek() {
            Some(Token::Integer(digits)) => {
                let value = digits
                    .parse::<u64>()
                    .map_err(|e| SparqlError::ParseError(format!("invalid integer {}: {}", digits, e)))?;
                self.pos += 1;
                Ok(value)
            }
            _ => Err(self.error("integer")),
        }
    }

    /// `{ ... }` group graph pattern
    fn group(&mut self) -> Result<GraphPattern, SparqlError> {
        self.expect(Token::LBrace, "`{`")?;
        let mut elements: Vec<GraphPattern> = Vec::new();

        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(GraphPattern::Group(elements));
                }
                None => return Err(self.error("`}`")),
                Some(Token::Dot) => {
                    self.pos += 1;
                }
                Some(Token::LBrace) => {
                    let first = self.group()?;
                    if self.peek() == Some(&Token::Union) {
                        let mut branches = vec![first];
                        while self.eat(&Token::Union) {
                            branches.push(self.group()?);
                        }
                        elements.push(GraphPattern::Union(branches));
                    } else {
                        elements.push(first);
                    }
                }
                Some(Token::Optional) => {
                    self.pos += 1;
                    elements.push(GraphPattern::Optional(Box::new(self.group()?)));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    elements.push(GraphPattern::Minus(Box::new(self.group()?)));
                }
                Some(Token::Graph) => {
                    self.pos += 1;
                    let target = self.var_or_iri()?;
                    elements.push(GraphPattern::Graph(target, Box::new(self.group()?)));
                }
                Some(Token::Service) => {
                    self.pos += 1;
                    let silent = self.eat(&Token::Silent);
                    let target = self.var_or_iri()?;
                    elements.push(GraphPattern::Service(target, Box::new(self.group()?), silent));
                }
                Some(Token::Filter) => {
                    self.pos += 1;
                    elements.push(GraphPattern::Filter(self.constraint()?));
                }
                Some(Token::Bind) => {
                    self.pos += 1;
                    elements.push(GraphPattern::Bind(self.balanced(Token::LParen, Token::RParen)?));
                }
                Some(Token::Values) => {
                    self.pos += 1;
                    elements.push(GraphPattern::Values(self.inline_data()?));
                }
                Some(t) if t.starts_term() => {
                    let triples = self.triples_block()?;
                    // consecutive triples blocks form one basic graph pattern
                    if let Some(GraphPattern::Bgp(existing)) = elements.last_mut() {
                        existing.extend(triples);
                    } else {
                        elements.push(GraphPattern::Bgp(triples));
                    }
                }
                Some(_) => return Err(self.error("triple pattern or group element")),
            }
        }
    }

    /// Triples up to (and including) the closing `}` of a CONSTRUCT template
    fn triples_until_brace(&mut self) -> Result<Vec<TriplePattern>, SparqlError> {
        let mut triples = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(triples);
                }
                Some(Token::Dot) => self.pos += 1,
                Some(t) if t.starts_term() => triples.extend(self.triples_block()?),
                _ => return Err(self.error("template triple or `}`")),
            }
        }
    }

    fn triples_block(&mut self) -> Result<Vec<TriplePattern>, SparqlError> {
        let mut triples = Vec::new();
        loop {
            let subject = self.term()?;
            self.property_list(&subject, &mut triples)?;
            if !self.eat(&Token::Dot) {
                return Ok(triples);
            }
            match self.peek() {
                Some(t) if t.starts_term() => continue,
                _ => return Ok(triples),
            }
        }
    }

    fn property_list(&mut self, subject: &Term, out: &mut Vec<TriplePattern>) -> Result<(), SparqlError> {
        loop {
            let predicate = self.verb()?;
            loop {
                let object = self.term()?;
                out.push(TriplePattern {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            if !self.eat(&Token::Semicolon) {
                return Ok(());
            }
            while self.eat(&Token::Semicolon) {}
            if !self.starts_verb() {
                return Ok(());
            }
        }
    }

    fn starts_verb(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::A) | Some(Token::Variable(_)) | Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) | Some(Token::Caret)
        )
    }

    fn verb(&mut self) -> Result<Term, SparqlError> {
        let verb = match self.peek() {
            Some(Token::A) => {
                self.pos += 1;
                Term::Iri(Iri(RDF_TYPE.to_string()))
            }
            Some(Token::Variable(name)) => {
                let v = Term::Variable(Variable(name.to_string()));
                self.pos += 1;
                v
            }
            Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) => Term::Iri(self.iri()?),
            Some(Token::Caret) | Some(Token::LParen) | Some(Token::Not) => {
                return Err(SparqlError::UnsupportedFeature("property paths".to_string()))
            }
            _ => return Err(self.error("predicate")),
        };
        if matches!(
            self.peek(),
            Some(Token::Slash) | Some(Token::Pipe) | Some(Token::Star) | Some(Token::Plus) | Some(Token::Question)
        ) {
            return Err(SparqlError::UnsupportedFeature("property paths".to_string()));
        }
        Ok(verb)
    }

    fn term(&mut self) -> Result<Term, SparqlError> {
        match self.peek().cloned() {
            Some(Token::Variable(name)) => {
                self.pos += 1;
                Ok(Term::Variable(Variable(name.to_string())))
            }
            Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) => Ok(Term::Iri(self.iri()?)),
            Some(Token::BlankNode(label)) => {
                self.pos += 1;
                Ok(Term::BlankNode(label.to_string()))
            }
            Some(Token::StringLiteral(raw)) => {
                self.pos += 1;
                let value = unescape(raw);
                if let Some(Token::LangTag(lang)) = self.peek().cloned() {
                    self.pos += 1;
                    return Ok(Term::Literal(Literal {
                        value,
                        datatype: None,
                        language: Some(lang.to_string()),
                    }));
                }
                if self.eat(&Token::DoubleCaret) {
                    let datatype = self.iri()?;
                    return Ok(Term::Literal(Literal {
                        value,
                        datatype: Some(datatype),
                        language: None,
                    }));
                }
                Ok(Term::Literal(Literal::plain(value)))
            }
            Some(Token::Integer(digits)) => {
                self.pos += 1;
                Ok(Term::Literal(Literal::typed(digits, XSD_INTEGER)))
            }
            Some(Token::Decimal(digits)) => {
                self.pos += 1;
                Ok(Term::Literal(Literal::typed(digits, XSD_DECIMAL)))
            }
            Some(Token::Double(digits)) => {
                self.pos += 1;
                Ok(Term::Literal(Literal::typed(digits, XSD_DOUBLE)))
            }
            Some(Token::True) => {
                self.pos += 1;
                Ok(Term::Literal(Literal::typed("true", XSD_BOOLEAN)))
            }
            Some(Token::False) => {
                self.pos += 1;
                Ok(Term::Literal(Literal::typed("false", XSD_BOOLEAN)))
            }
            Some(Token::LBracket) | Some(Token::LParen) => Err(SparqlError::UnsupportedFeature(
                "blank node property lists and collections".to_string(),
            )),
            _ => Err(self.error("term")),
        }
    }

    fn iri(&mut self) -> Result<Iri, SparqlError> {
        match self.peek().cloned() {
            Some(Token::Iri(iri)) => {
                self.pos += 1;
                Ok(Iri(self.resolve_relative(iri)))
            }
            Some(Token::PrefixedName(name)) => {
                let expanded = self
                    .prefixes
                    .expand(name)
                    .map_err(|e| SparqlError::ParseError(format!("{} at byte {}", e, self.offset())))?;
                self.pos += 1;
                Ok(Iri(expanded))
            }
            _ => Err(self.error("IRI")),
        }
    }

    fn var_or_iri(&mut self) -> Result<VarOrIri, SparqlError> {
        if let Some(Token::Variable(name)) = self.peek().cloned() {
            self.pos += 1;
            return Ok(VarOrIri::Var(Variable(name.to_string())));
        }
        Ok(VarOrIri::Iri(self.iri()?))
    }

    fn resolve_relative(&self, iri: &str) -> String {
        match &self.base {
            Some(base) if !iri.contains(':') => format!("{}{}", base.0, iri),
            _ => iri.to_string(),
        }
    }

    /// FILTER body: `( ... )` or a function call `name( ... )`
    fn constraint(&mut self) -> Result<String, SparqlError> {
        match self.peek() {
            Some(Token::LParen) => self.balanced(Token::LParen, Token::RParen),
            Some(Token::Name(_)) | Some(Token::Iri(_)) | Some(Token::PrefixedName(_)) => {
                let start = self.offset();
                self.pos += 1;
                self.balanced(Token::LParen, Token::RParen)?;
                Ok(self.text_since(start))
            }
            _ => Err(self.error("constraint")),
        }
    }

    /// VALUES data block, kept as source text
    fn inline_data(&mut self) -> Result<String, SparqlError> {
        let start = self.offset();
        match self.peek() {
            Some(Token::Variable(_)) => self.pos += 1,
            Some(Token::LParen) => {
                self.balanced(Token::LParen, Token::RParen)?;
            }
            _ => return Err(self.error("VALUES variables")),
        }
        self.balanced(Token::LBrace, Token::RBrace)?;
        Ok(self.text_since(start))
    }

    /// Source text from byte `start` to the end of the last consumed token
    fn text_since(&self, start: usize) -> String {
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, span)| span.end)
            .unwrap_or(self.source.len());
        self.source[start..end].to_string()
    }

    /// Consume a balanced `open ... close` run and return its source text
    fn balanced(&mut self, open: Token<'a>, close: Token<'a>) -> Result<String, SparqlError> {
        let start = self.offset();
        let what = format!("`{}`", if open == Token::LParen { "(" } else { "{" });
        self.expect(open.clone(), &what)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(t) if t == open => depth += 1,
                Some(t) if t == close => depth -= 1,
                Some(_) => {}
                None => return Err(SparqlError::ParseError("unbalanced brackets".to_string())),
            }
        }
        Ok(self.text_since(start))
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DefaultSparqlParser {
        let mut prefixes = PrefixTable::with_standard();
        prefixes.insert("", "http://example.org/prog#");
        DefaultSparqlParser::with_prefixes(prefixes)
    }

    #[test]
    fn test_select_type_query() {
        let q = parser().parse("select ?obj where { ?obj a :Dog }").unwrap();
        assert!(q.is_select());
        assert_eq!(q.variables, vec![Variable("obj".to_string())]);
        assert_eq!(
            q.where_clause,
            GraphPattern::Group(vec![GraphPattern::Bgp(vec![TriplePattern {
                subject: Term::Variable(Variable("obj".to_string())),
                predicate: Term::Iri(Iri(RDF_TYPE.to_string())),
                object: Term::Iri(Iri("http://example.org/prog#Dog".to_string())),
            }])])
        );
    }

    #[test]
    fn test_predicate_object_lists() {
        let q = parser()
            .parse("SELECT ?x WHERE { ?x a :Dog ; :owner ?y , ?z . ?y :age 5 . }")
            .unwrap();
        match &q.where_clause {
            GraphPattern::Group(elements) => {
                assert_eq!(elements.len(), 1);
                match &elements[0] {
                    GraphPattern::Bgp(triples) => assert_eq!(triples.len(), 4),
                    other => panic!("expected BGP, got {:?}", other),
                }
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_prefix_declaration_overrides() {
        let q = parser()
            .parse("PREFIX : <http://other.org/#>\nSELECT ?x { ?x a :Dog }")
            .unwrap();
        let mut vars = Vec::new();
        q.where_clause.collect_variables(&mut vars);
        assert_eq!(vars.len(), 1);
        if let GraphPattern::Group(elements) = &q.where_clause {
            if let GraphPattern::Bgp(triples) = &elements[0] {
                assert_eq!(triples[0].object, Term::Iri(Iri("http://other.org/#Dog".to_string())));
                return;
            }
        }
        panic!("unexpected pattern {:?}", q.where_clause);
    }

    #[test]
    fn test_union_and_filter_are_kept() {
        let q = parser()
            .parse("SELECT ?x WHERE { { ?x a :Dog } UNION { ?x a :Cat } FILTER(?x != :rex) }")
            .unwrap();
        match &q.where_clause {
            GraphPattern::Group(elements) => {
                assert!(matches!(elements[0], GraphPattern::Union(ref b) if b.len() == 2));
                assert_eq!(elements[1], GraphPattern::Filter("(?x != :rex)".to_string()));
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_select_all_projection() {
        let q = parser().parse("SELECT * WHERE { ?a :p ?b . ?b :q ?c }").unwrap();
        let names: Vec<String> = q.projected_variables().iter().map(|v| v.0.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_literal_forms() {
        let q = parser()
            .parse(r#"SELECT ?x WHERE { ?x :name "Rex"@en ; :age "5"^^xsd:integer ; :tag "a\"b" ; :ok true }"#)
            .unwrap();
        let triples = match &q.where_clause {
            GraphPattern::Group(e) => match &e[0] {
                GraphPattern::Bgp(t) => t.clone(),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };
        assert_eq!(triples[0].object.to_string(), "\"Rex\"@en");
        assert_eq!(triples[1].object.to_string(), format!("\"5\"^^<{}>", XSD_INTEGER));
        assert_eq!(triples[2].object.to_string(), "\"a\\\"b\"");
        assert_eq!(triples[3].object.to_string(), format!("\"true\"^^<{}>", XSD_BOOLEAN));
    }

    #[test]
    fn test_solution_modifiers() {
        let q = parser()
            .parse("SELECT DISTINCT ?x WHERE { ?x a :Dog } ORDER BY DESC(?x) LIMIT 10 OFFSET 2")
            .unwrap();
        assert!(q.solution_modifier.distinct);
        assert_eq!(q.solution_modifier.limit, Some(10));
        assert_eq!(q.solution_modifier.offset, Some(2));
        assert_eq!(q.solution_modifier.order, vec![OrderCondition::Desc(Variable("x".to_string()))]);
    }

    #[test]
    fn test_non_select_forms() {
        let ask = parser().parse("ASK { ?x a :Dog }").unwrap();
        assert_eq!(ask.query_type, QueryType::Ask);

        let construct = parser()
            .parse("CONSTRUCT { ?x a :Animal } WHERE { ?x a :Dog }")
            .unwrap();
        assert!(matches!(construct.query_type, QueryType::Construct(ref t) if t.len() == 1));

        let describe = parser().parse("DESCRIBE ?x WHERE { ?x a :Dog }").unwrap();
        assert!(matches!(describe.query_type, QueryType::Describe(ref t) if t.len() == 1));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parser().parse("SELECT ?x WHERE { ?x a }"), Err(SparqlError::ParseError(_))));
        assert!(matches!(parser().parse("SELECT ?x WHERE { ?x a nope:Dog }"), Err(SparqlError::ParseError(_))));
        assert!(matches!(parser().parse("SELECT ?x WHERE { ?x :p/:q ?y }"), Err(SparqlError::UnsupportedFeature(_))));
        assert!(matches!(parser().parse("SELECT ?x WHERE { ?x :p [ :q ?y ] }"), Err(SparqlError::UnsupportedFeature(_))));
        assert!(matches!(parser().parse("SELECT ?x WHERE { ?x a :Dog } trailing"), Err(SparqlError::ParseError(_))));
    }
}
