//! OWL DL データモデル

use serde::{Deserialize, Serialize};
use smolq_core::vocabulary::{OWL_NOTHING, OWL_THING};
use std::collections::BTreeSet;
use std::fmt;

/// OWL IRI wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwlIri(pub String);

impl OwlIri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn thing() -> Self {
        Self(OWL_THING.to_string())
    }

    pub fn nothing() -> Self {
        Self(OWL_NOTHING.to_string())
    }

    /// Local name after the last `#` or `/`
    pub fn local_name(&self) -> &str {
        self.0.rsplit(['#', '/']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for OwlIri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OWL Individual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Individual(pub OwlIri);

/// Filler of a `value` restriction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Individual(Individual),
    /// Lexical form of a data value
    Literal(String),
}

/// OWL DL Class Expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassExpression {
    /// Named class
    Named(OwlIri),

    /// owl:Thing (⊤)
    Thing,

    /// owl:Nothing (⊥)
    Nothing,

    /// Intersection of classes: C1 ⊓ C2 ⊓ ... ⊓ Cn
    IntersectionOf(Vec<ClassExpression>),

    /// Union of classes: C1 ⊔ C2 ⊔ ... ⊔ Cn
    UnionOf(Vec<ClassExpression>),

    /// Complement of class: ¬C
    ComplementOf(Box<ClassExpression>),

    /// Enumeration of individuals: {i1, i2, ..., in}
    OneOf(Vec<Individual>),

    /// Existential restriction: ∃R.C
    SomeValuesFrom {
        property: PropertyExpression,
        class: Box<ClassExpression>,
    },

    /// Universal restriction: ∀R.C
    AllValuesFrom {
        property: PropertyExpression,
        class: Box<ClassExpression>,
    },

    /// Has value: ∃R.{v}
    HasValue {
        property: PropertyExpression,
        value: Value,
    },
}

impl ClassExpression {
    pub fn named(iri: impl Into<String>) -> Self {
        let iri = iri.into();
        match iri.as_str() {
            OWL_THING => ClassExpression::Thing,
            OWL_NOTHING => ClassExpression::Nothing,
            _ => ClassExpression::Named(OwlIri(iri)),
        }
    }

    pub fn some(property: PropertyExpression, class: ClassExpression) -> Self {
        ClassExpression::SomeValuesFrom {
            property,
            class: Box::new(class),
        }
    }

    pub fn has_value(property: PropertyExpression, value: Value) -> Self {
        ClassExpression::HasValue { property, value }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, ClassExpression::Named(_))
    }
}

/// Manchester syntax rendering
impl fmt::Display for ClassExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassExpression::Named(iri) => write!(f, "<{}>", iri),
            ClassExpression::Thing => write!(f, "owl:Thing"),
            ClassExpression::Nothing => write!(f, "owl:Nothing"),
            ClassExpression::IntersectionOf(parts) => write_joined(f, parts, " and "),
            ClassExpression::UnionOf(parts) => write_joined(f, parts, " or "),
            ClassExpression::ComplementOf(inner) => write!(f, "not {}", inner),
            ClassExpression::OneOf(individuals) => {
                write!(f, "{{")?;
                for (i, ind) in individuals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "<{}>", ind.0)?;
                }
                write!(f, "}}")
            }
            ClassExpression::SomeValuesFrom { property, class } => write!(f, "({} some {})", property, class),
            ClassExpression::AllValuesFrom { property, class } => write!(f, "({} only {})", property, class),
            ClassExpression::HasValue { property, value } => match value {
                Value::Individual(ind) => write!(f, "({} value <{}>)", property, ind.0),
                Value::Literal(lit) => write!(f, "({} value {})", property, lit),
            },
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[ClassExpression], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, ")")
}

/// OWL DL Property Expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyExpression {
    /// Object property
    ObjectProperty(OwlIri),

    /// Data property
    DataProperty(OwlIri),

    /// Inverse property: R⁻
    InverseOf(Box<PropertyExpression>),
}

impl PropertyExpression {
    pub fn inverse(self) -> Self {
        match self {
            PropertyExpression::InverseOf(inner) => *inner,
            other => PropertyExpression::InverseOf(Box::new(other)),
        }
    }

    /// Collapse double inverses
    pub fn normalized(&self) -> Self {
        match self {
            PropertyExpression::InverseOf(inner) => match inner.normalized() {
                PropertyExpression::InverseOf(base) => *base,
                base => PropertyExpression::InverseOf(Box::new(base)),
            },
            other => other.clone(),
        }
    }

    /// IRI of the underlying named property
    pub fn iri(&self) -> &OwlIri {
        match self {
            PropertyExpression::ObjectProperty(iri) | PropertyExpression::DataProperty(iri) => iri,
            PropertyExpression::InverseOf(inner) => inner.iri(),
        }
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self.normalized(), PropertyExpression::InverseOf(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, PropertyExpression::DataProperty(_))
    }
}

impl fmt::Display for PropertyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyExpression::ObjectProperty(iri) | PropertyExpression::DataProperty(iri) => write!(f, "<{}>", iri),
            PropertyExpression::InverseOf(inner) => write!(f, "inverse({})", inner),
        }
    }
}

/// OWL DL Axiom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axiom {
    /// SubClassOf with complex class expressions
    SubClassOf(ClassExpression, ClassExpression),

    /// EquivalentClasses with complex expressions
    EquivalentClasses(Vec<ClassExpression>),

    /// DisjointClasses with complex expressions
    DisjointClasses(Vec<ClassExpression>),

    /// SubPropertyOf with property expressions
    SubPropertyOf(PropertyExpression, PropertyExpression),

    /// Property domain (object or data property)
    PropertyDomain(PropertyExpression, ClassExpression),

    /// Object property range
    ObjectPropertyRange(PropertyExpression, ClassExpression),

    /// Functional property
    FunctionalProperty(PropertyExpression),

    /// Class assertion with complex class
    ClassAssertion(ClassExpression, Individual),

    /// Object property assertion
    ObjectPropertyAssertion(PropertyExpression, Individual, Individual),

    /// Data property assertion: IRI, Individual, lexical value
    DataPropertyAssertion(OwlIri, Individual, String),
}

/// OWL DL Ontology
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwlDlOntology {
    /// Ontology IRI
    pub iri: Option<OwlIri>,

    /// All axioms in the ontology
    pub axioms: Vec<Axiom>,

    /// All named classes mentioned
    pub classes: BTreeSet<OwlIri>,

    /// Object properties mentioned
    pub object_properties: BTreeSet<OwlIri>,

    /// Data properties mentioned
    pub data_properties: BTreeSet<OwlIri>,

    /// All individuals mentioned
    pub individuals: BTreeSet<Individual>,
}

impl OwlDlOntology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_class(&mut self, iri: OwlIri) {
        self.classes.insert(iri);
    }

    pub fn declare_object_property(&mut self, iri: OwlIri) {
        self.object_properties.insert(iri);
    }

    pub fn declare_data_property(&mut self, iri: OwlIri) {
        self.data_properties.insert(iri);
    }

    pub fn declare_individual(&mut self, individual: Individual) {
        self.individuals.insert(individual);
    }

    pub fn is_data_property(&self, iri: &OwlIri) -> bool {
        self.data_properties.contains(iri)
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        // Extract entities from axioms
        match &axiom {
            Axiom::SubClassOf(ce1, ce2) => {
                self.collect_class_expression(ce1);
                self.collect_class_expression(ce2);
            }
            Axiom::EquivalentClasses(expressions) | Axiom::DisjointClasses(expressions) => {
                for expr in expressions {
                    self.collect_class_expression(expr);
                }
            }
            Axiom::SubPropertyOf(pe1, pe2) => {
                self.collect_property_expression(pe1);
                self.collect_property_expression(pe2);
            }
            Axiom::PropertyDomain(pe, ce) | Axiom::ObjectPropertyRange(pe, ce) => {
                self.collect_property_expression(pe);
                self.collect_class_expression(ce);
            }
            Axiom::FunctionalProperty(pe) => {
                self.collect_property_expression(pe);
            }
            Axiom::ClassAssertion(ce, i) => {
                self.collect_class_expression(ce);
                self.individuals.insert(i.clone());
            }
            Axiom::ObjectPropertyAssertion(pe, i1, i2) => {
                self.collect_property_expression(pe);
                self.individuals.insert(i1.clone());
                self.individuals.insert(i2.clone());
            }
            Axiom::DataPropertyAssertion(iri, i, _) => {
                self.data_properties.insert(iri.clone());
                self.individuals.insert(i.clone());
            }
        }

        if !self.axioms.contains(&axiom) {
            self.axioms.push(axiom);
        }
    }

    fn collect_class_expression(&mut self, expr: &ClassExpression) {
        match expr {
            ClassExpression::Named(iri) => {
                self.classes.insert(iri.clone());
            }
            ClassExpression::Thing | ClassExpression::Nothing => {}
            ClassExpression::IntersectionOf(expressions) | ClassExpression::UnionOf(expressions) => {
                for expr in expressions {
                    self.collect_class_expression(expr);
                }
            }
            ClassExpression::ComplementOf(expr) => {
                self.collect_class_expression(expr);
            }
            ClassExpression::OneOf(individuals) => {
                self.individuals.extend(individuals.iter().cloned());
            }
            ClassExpression::SomeValuesFrom { property, class } | ClassExpression::AllValuesFrom { property, class } => {
                self.collect_property_expression(property);
                self.collect_class_expression(class);
            }
            ClassExpression::HasValue { property, value } => {
                self.collect_property_expression(property);
                if let Value::Individual(individual) = value {
                    self.individuals.insert(individual.clone());
                }
            }
        }
    }

    fn collect_property_expression(&mut self, expr: &PropertyExpression) {
        match expr {
            PropertyExpression::ObjectProperty(iri) => {
                self.object_properties.insert(iri.clone());
            }
            PropertyExpression::DataProperty(iri) => {
                self.data_properties.insert(iri.clone());
            }
            PropertyExpression::InverseOf(expr) => {
                self.collect_property_expression(expr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> OwlIri {
        OwlIri::new(format!("http://example.org/{}", s))
    }

    #[test]
    fn test_add_axiom_collects_entities() {
        let mut ontology = OwlDlOntology::new();
        let owner = PropertyExpression::ObjectProperty(iri("owner"));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::Named(iri("Dog")),
            ClassExpression::some(owner.clone(), ClassExpression::Named(iri("Person"))),
        ));
        ontology.add_axiom(Axiom::DataPropertyAssertion(iri("age"), Individual(iri("rex")), "5".to_string()));

        assert!(ontology.classes.contains(&iri("Dog")));
        assert!(ontology.classes.contains(&iri("Person")));
        assert!(ontology.object_properties.contains(&iri("owner")));
        assert!(ontology.is_data_property(&iri("age")));
        assert!(ontology.individuals.contains(&Individual(iri("rex"))));
        assert_eq!(ontology.axioms.len(), 2);
    }

    #[test]
    fn test_duplicate_axioms_folded() {
        let mut ontology = OwlDlOntology::new();
        let axiom = Axiom::SubClassOf(ClassExpression::Named(iri("Dog")), ClassExpression::Named(iri("Animal")));
        ontology.add_axiom(axiom.clone());
        ontology.add_axiom(axiom);
        assert_eq!(ontology.axioms.len(), 1);
    }

    #[test]
    fn test_property_normalization() {
        let p = PropertyExpression::ObjectProperty(iri("owner"));
        let double = PropertyExpression::InverseOf(Box::new(PropertyExpression::InverseOf(Box::new(p.clone()))));
        assert_eq!(double.normalized(), p);
        assert!(!double.is_inverse());
        assert!(p.clone().inverse().is_inverse());
        assert_eq!(p.clone().inverse().inverse(), p);
        assert_eq!(p.inverse().iri(), &iri("owner"));
    }

    #[test]
    fn test_manchester_rendering() {
        let expr = ClassExpression::IntersectionOf(vec![
            ClassExpression::Named(iri("Dog")),
            ClassExpression::some(
                PropertyExpression::ObjectProperty(iri("owner")).inverse(),
                ClassExpression::Thing,
            ),
            ClassExpression::has_value(PropertyExpression::DataProperty(iri("age")), Value::Literal("5".to_string())),
        ]);
        assert_eq!(
            expr.to_string(),
            "(<http://example.org/Dog> and (inverse(<http://example.org/owner>) some owl:Thing) and (<http://example.org/age> value 5))"
        );
    }

    #[test]
    fn test_named_maps_builtins() {
        assert_eq!(ClassExpression::named(OWL_THING), ClassExpression::Thing);
        assert_eq!(ClassExpression::named(OWL_NOTHING), ClassExpression::Nothing);
        assert!(ClassExpression::named("http://example.org/Dog").is_named());
        assert_eq!(iri("Dog").local_name(), "Dog");
    }
}
