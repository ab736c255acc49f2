//! OWL DL リーナー
//!
//! 構造的包摂による上位クラス計算。told 階層の推移閉包に加えて
//! 定義域・値域、複合 SubClassOf 公理、和の共通上位を飽和させる。

use crate::model::{Axiom, ClassExpression, Individual, OwlDlOntology, OwlIri, PropertyExpression, Value};
use crate::OwlDlError;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// Nesting bound for filler saturation; beyond it entailment checks answer `false`
const MAX_DEPTH: usize = 8;

/// Named super-classes of a class expression, including the expression's own names and owl:Thing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperClasses(BTreeSet<OwlIri>);

impl SuperClasses {
    pub fn contains(&self, iri: &str) -> bool {
        self.0.iter().any(|c| c.as_str() == iri)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwlIri> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<OwlIri> for SuperClasses {
    fn from_iter<I: IntoIterator<Item = OwlIri>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders as `[<iri>, <iri>]`
impl fmt::Display for SuperClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, iri) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "<{}>", iri)?;
        }
        write!(f, "]")
    }
}

/// Computes the named super-classes of class expressions against an ontology
pub trait Classifier: Send + Sync {
    fn super_classes(&self, ontology: &OwlDlOntology, expression: &ClassExpression) -> Result<SuperClasses, OwlDlError>;

    fn is_subsumed_by(&self, ontology: &OwlDlOntology, expression: &ClassExpression, class: &OwlIri) -> Result<bool, OwlDlError> {
        Ok(self.super_classes(ontology, expression)?.contains(class.as_str()))
    }
}

/// OWL DL reasoner
///
/// Stateless: every call builds its own index over the ontology, so one
/// instance can serve concurrent checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwlDlReasoner;

impl OwlDlReasoner {
    pub fn new() -> Self {
        Self
    }

    /// Check if OWL DL ontology is consistent
    ///
    /// Only individual assertions are inspected: an individual whose asserted
    /// types saturate to ⊥ makes the ontology inconsistent.
    pub fn is_consistent(&self, ontology: &OwlDlOntology) -> Result<bool, OwlDlError> {
        let index = Index::build(ontology);
        Ok(index.first_unsatisfiable_individual().is_none())
    }
}

impl Classifier for OwlDlReasoner {
    fn super_classes(&self, ontology: &OwlDlOntology, expression: &ClassExpression) -> Result<SuperClasses, OwlDlError> {
        let index = Index::build(ontology);
        if let Some(individual) = index.first_unsatisfiable_individual() {
            return Err(OwlDlError::ConsistencyError(format!(
                "ontology is inconsistent: individual <{}> has no model",
                individual.0
            )));
        }

        let conjunction = index.saturate(expression, 0);
        let mut result: BTreeSet<OwlIri> = BTreeSet::new();
        result.insert(OwlIri::thing());
        if conjunction.bottom {
            // ⊥ is subsumed by everything
            result.insert(OwlIri::nothing());
            result.extend(ontology.classes.iter().cloned());
        } else {
            result.extend(conjunction.names);
        }

        debug!(expression = %expression, count = result.len(), "super classes computed");
        Ok(SuperClasses(result))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Filler {
    Class(ClassExpression),
    Value(Value),
}

/// Flattened conjunction of everything known about one (anonymous) individual
#[derive(Debug, Clone, Default)]
struct Conjunction {
    names: BTreeSet<OwlIri>,
    restrictions: Vec<(PropertyExpression, Filler)>,
    others: Vec<ClassExpression>,
    bottom: bool,
}

impl Conjunction {
    /// Returns true when something new was learned
    fn add(&mut self, expression: &ClassExpression) -> bool {
        match expression {
            ClassExpression::Thing => false,
            ClassExpression::Nothing => !std::mem::replace(&mut self.bottom, true),
            ClassExpression::Named(iri) => self.names.insert(iri.clone()),
            ClassExpression::IntersectionOf(parts) => {
                let mut changed = false;
                for part in parts {
                    changed |= self.add(part);
                }
                changed
            }
            ClassExpression::SomeValuesFrom { property, class } => {
                self.add_restriction(property.normalized(), Filler::Class((**class).clone()))
            }
            ClassExpression::HasValue { property, value } => {
                self.add_restriction(property.normalized(), Filler::Value(value.clone()))
            }
            other => {
                if self.others.contains(other) {
                    false
                } else {
                    self.others.push(other.clone());
                    true
                }
            }
        }
    }

    fn add_restriction(&mut self, property: PropertyExpression, filler: Filler) -> bool {
        let entry = (property, filler);
        if self.restrictions.contains(&entry) {
            false
        } else {
            self.restrictions.push(entry);
            true
        }
    }
}

/// Per-call view of the ontology's axioms
struct Index<'o> {
    /// named class -> told super expressions (SubClassOf and both directions of EquivalentClasses)
    told: HashMap<&'o OwlIri, Vec<&'o ClassExpression>>,
    /// SubClassOf axioms whose left side is not a named class
    general: Vec<(&'o ClassExpression, &'o ClassExpression)>,
    /// transitive super-properties; inverse keys hold inverse supers
    property_supers: HashMap<PropertyExpression, HashSet<PropertyExpression>>,
    domains: Vec<(PropertyExpression, &'o ClassExpression)>,
    ranges: Vec<(PropertyExpression, &'o ClassExpression)>,
    disjoint: Vec<&'o [ClassExpression]>,
    types: HashMap<&'o Individual, Vec<&'o ClassExpression>>,
    individuals: &'o BTreeSet<Individual>,
}

impl<'o> Index<'o> {
    fn build(ontology: &'o OwlDlOntology) -> Self {
        let mut index = Index {
            told: HashMap::new(),
            general: Vec::new(),
            property_supers: HashMap::new(),
            domains: Vec::new(),
            ranges: Vec::new(),
            disjoint: Vec::new(),
            types: HashMap::new(),
            individuals: &ontology.individuals,
        };
        let mut direct_property_supers: Vec<(PropertyExpression, PropertyExpression)> = Vec::new();

        for axiom in &ontology.axioms {
            match axiom {
                Axiom::SubClassOf(sub, sup) => index.add_inclusion(sub, sup),
                Axiom::EquivalentClasses(classes) => {
                    for a in classes {
                        for b in classes {
                            if a != b {
                                index.add_inclusion(a, b);
                            }
                        }
                    }
                }
                Axiom::DisjointClasses(classes) => index.disjoint.push(classes),
                Axiom::SubPropertyOf(sub, sup) => {
                    let (sub, sup) = (sub.normalized(), sup.normalized());
                    // p ⊑ q  <=>  p⁻ ⊑ q⁻
                    direct_property_supers.push((sub.clone().inverse(), sup.clone().inverse()));
                    direct_property_supers.push((sub, sup));
                }
                Axiom::PropertyDomain(property, class) => {
                    let property = property.normalized();
                    if property.is_inverse() {
                        index.ranges.push((property.inverse(), class));
                    } else {
                        index.domains.push((property, class));
                    }
                }
                Axiom::ObjectPropertyRange(property, class) => {
                    let property = property.normalized();
                    if property.is_inverse() {
                        index.domains.push((property.inverse(), class));
                    } else {
                        index.ranges.push((property, class));
                    }
                }
                Axiom::ClassAssertion(class, individual) => {
                    index.types.entry(individual).or_default().push(class);
                }
                Axiom::FunctionalProperty(_)
                | Axiom::ObjectPropertyAssertion(..)
                | Axiom::DataPropertyAssertion(..) => {}
            }
        }

        index.property_supers = transitive_closure(&direct_property_supers);
        trace!(
            told = index.told.len(),
            general = index.general.len(),
            properties = index.property_supers.len(),
            "reasoner index built"
        );
        index
    }

    fn add_inclusion(&mut self, sub: &'o ClassExpression, sup: &'o ClassExpression) {
        match sub {
            ClassExpression::Named(iri) => self.told.entry(iri).or_default().push(sup),
            _ => self.general.push((sub, sup)),
        }
    }

    /// Whether `sub` is `sup` or one of its (transitive) sub-properties
    fn property_subsumed(&self, sub: &PropertyExpression, sup: &PropertyExpression) -> bool {
        let (sub, sup) = (sub.normalized(), sup.normalized());
        if sub.is_inverse() == sup.is_inverse() && sub.iri() == sup.iri() {
            return true;
        }
        self.property_supers
            .get(&sub)
            .map(|supers| supers.iter().any(|p| p.is_inverse() == sup.is_inverse() && p.iri() == sup.iri()))
            .unwrap_or(false)
    }

    /// Classes implied for the holder of a `property` edge: domains of its
    /// super-properties, and ranges of properties whose inverse it falls under
    fn implied_by_restriction(&self, property: &PropertyExpression) -> Vec<&'o ClassExpression> {
        let mut implied = Vec::new();
        for (domain_property, class) in &self.domains {
            if self.property_subsumed(property, domain_property) {
                implied.push(*class);
            }
        }
        for (range_property, class) in &self.ranges {
            if self.property_subsumed(property, &range_property.clone().inverse()) {
                implied.push(*class);
            }
        }
        implied
    }

    fn saturate(&self, expression: &ClassExpression, depth: usize) -> Conjunction {
        let mut conjunction = Conjunction::default();
        conjunction.add(expression);

        loop {
            if conjunction.bottom {
                break;
            }
            let mut changed = false;

            for name in conjunction.names.clone() {
                if let Some(supers) = self.told.get(&name) {
                    for sup in supers {
                        changed |= conjunction.add(sup);
                    }
                }
            }

            let properties: Vec<PropertyExpression> = conjunction.restrictions.iter().map(|(p, _)| p.clone()).collect();
            for property in &properties {
                for class in self.implied_by_restriction(property) {
                    changed |= conjunction.add(class);
                }
            }

            if depth < MAX_DEPTH {
                for (lhs, rhs) in &self.general {
                    if self.entails(&conjunction, lhs, depth + 1) {
                        changed |= conjunction.add(rhs);
                    }
                }

                let unions: Vec<ClassExpression> = conjunction
                    .others
                    .iter()
                    .filter(|c| matches!(c, ClassExpression::UnionOf(_)))
                    .cloned()
                    .collect();
                for union in unions {
                    if let ClassExpression::UnionOf(branches) = union {
                        for name in self.common_names(&branches, depth + 1) {
                            changed |= conjunction.add(&ClassExpression::Named(name));
                        }
                    }
                }
            }

            if self.contradicts(&conjunction, depth) {
                conjunction.bottom = true;
            }

            if !changed {
                break;
            }
        }

        conjunction
    }

    /// Names shared by every satisfiable branch of a union
    fn common_names(&self, branches: &[ClassExpression], depth: usize) -> BTreeSet<OwlIri> {
        let mut common: Option<BTreeSet<OwlIri>> = None;
        for branch in branches {
            let saturated = self.saturate(branch, depth);
            if saturated.bottom {
                continue;
            }
            common = Some(match common {
                None => saturated.names,
                Some(acc) => acc.intersection(&saturated.names).cloned().collect(),
            });
        }
        common.unwrap_or_default()
    }

    fn contradicts(&self, conjunction: &Conjunction, depth: usize) -> bool {
        for other in &conjunction.others {
            if let ClassExpression::ComplementOf(inner) = other {
                if self.entails(conjunction, inner, depth + 1) {
                    return true;
                }
            }
        }
        self.disjoint.iter().any(|classes| {
            classes
                .iter()
                .filter(|c| self.entails(conjunction, c, depth + 1))
                .take(2)
                .count()
                == 2
        })
    }

    /// Structural check of `conjunction ⊑ target`
    fn entails(&self, conjunction: &Conjunction, target: &ClassExpression, depth: usize) -> bool {
        if conjunction.bottom {
            return true;
        }
        match target {
            ClassExpression::Thing => true,
            ClassExpression::Nothing => false,
            ClassExpression::Named(iri) => conjunction.names.contains(iri),
            ClassExpression::IntersectionOf(parts) => parts.iter().all(|p| self.entails(conjunction, p, depth)),
            ClassExpression::UnionOf(parts) => parts.iter().any(|p| self.entails(conjunction, p, depth)),
            ClassExpression::SomeValuesFrom { property, class } => {
                conjunction.restrictions.iter().any(|(held, filler)| {
                    self.property_subsumed(held, property) && self.filler_entails(filler, class, depth)
                })
            }
            ClassExpression::HasValue { property, value } => conjunction.restrictions.iter().any(|(held, filler)| {
                self.property_subsumed(held, property) && filler == &Filler::Value(value.clone())
            }),
            ClassExpression::OneOf(_) | ClassExpression::ComplementOf(_) | ClassExpression::AllValuesFrom { .. } => {
                conjunction.others.contains(target)
            }
        }
    }

    fn filler_entails(&self, filler: &Filler, target: &ClassExpression, depth: usize) -> bool {
        if *target == ClassExpression::Thing {
            return true;
        }
        if depth >= MAX_DEPTH {
            return false;
        }
        match filler {
            Filler::Class(class) => {
                let saturated = self.saturate(class, depth + 1);
                self.entails(&saturated, target, depth + 1)
            }
            Filler::Value(Value::Individual(individual)) => {
                let saturated = self.saturate(&self.asserted_type(individual), depth + 1);
                self.entails(&saturated, target, depth + 1)
            }
            Filler::Value(Value::Literal(_)) => false,
        }
    }

    fn asserted_type(&self, individual: &Individual) -> ClassExpression {
        match self.types.get(individual) {
            Some(types) => ClassExpression::IntersectionOf(types.iter().map(|c| (*c).clone()).collect()),
            None => ClassExpression::Thing,
        }
    }

    fn first_unsatisfiable_individual(&self) -> Option<&'o Individual> {
        let individuals: &'o BTreeSet<Individual> = self.individuals;
        individuals
            .iter()
            .find(|individual| self.saturate(&self.asserted_type(individual), 0).bottom)
    }
}

/// Transitive closure of a direct super-property relation, without self pairs
fn transitive_closure(
    direct: &[(PropertyExpression, PropertyExpression)],
) -> HashMap<PropertyExpression, HashSet<PropertyExpression>> {
    let mut closure: HashMap<PropertyExpression, HashSet<PropertyExpression>> = HashMap::new();
    for (sub, sup) in direct {
        closure.entry(sub.clone()).or_default().insert(sup.clone());
    }

    let mut changed = true;
    while changed {
        changed = false;
        let current = closure.clone();
        for (sub, supers) in &current {
            for sup in supers {
                if let Some(indirect) = current.get(sup) {
                    for p in indirect {
                        if p != sub && closure.entry(sub.clone()).or_default().insert(p.clone()) {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
    closure
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(local: &str) -> OwlIri {
        OwlIri::new(format!("http://example.org/{}", local))
    }

    fn named(local: &str) -> ClassExpression {
        ClassExpression::Named(iri(local))
    }

    fn object(local: &str) -> PropertyExpression {
        PropertyExpression::ObjectProperty(iri(local))
    }

    fn zoo() -> OwlDlOntology {
        let mut o = OwlDlOntology::new();
        o.add_axiom(Axiom::SubClassOf(named("Dog"), named("Animal")));
        o.add_axiom(Axiom::SubClassOf(named("Animal"), named("Object")));
        o.add_axiom(Axiom::SubClassOf(named("Person"), named("Object")));
        o.add_axiom(Axiom::PropertyDomain(object("owner"), named("Pet")));
        o.add_axiom(Axiom::ObjectPropertyRange(object("owner"), named("Person")));
        o
    }

    fn supers(o: &OwlDlOntology, expr: &ClassExpression) -> SuperClasses {
        OwlDlReasoner::new().super_classes(o, expr).unwrap()
    }

    #[test]
    fn test_told_closure_is_reflexive_and_transitive() {
        let o = zoo();
        let result = supers(&o, &named("Dog"));
        assert!(result.contains(iri("Dog").as_str()));
        assert!(result.contains(iri("Animal").as_str()));
        assert!(result.contains(iri("Object").as_str()));
        assert!(result.contains(OwlIri::thing().as_str()));
        assert!(!result.contains(iri("Person").as_str()));
    }

    #[test]
    fn test_thing_has_only_thing() {
        let o = zoo();
        let result = supers(&o, &ClassExpression::Thing);
        assert_eq!(result.len(), 1);
        assert_eq!(result.to_string(), "[<http://www.w3.org/2002/07/owl#Thing>]");
    }

    #[test]
    fn test_domain_and_inverse_range() {
        let o = zoo();
        let forward = ClassExpression::some(object("owner"), ClassExpression::Thing);
        assert!(supers(&o, &forward).contains(iri("Pet").as_str()));

        let inverse = ClassExpression::some(object("owner").inverse(), named("Dog"));
        let result = supers(&o, &inverse);
        assert!(result.contains(iri("Person").as_str()));
        assert!(!result.contains(iri("Pet").as_str()));
    }

    #[test]
    fn test_domain_inherited_through_sub_property() {
        let mut o = zoo();
        o.add_axiom(Axiom::SubPropertyOf(object("breeder"), object("owner")));
        let expr = ClassExpression::some(object("breeder"), ClassExpression::Thing);
        assert!(supers(&o, &expr).contains(iri("Pet").as_str()));
    }

    #[test]
    fn test_general_inclusion_with_nested_filler() {
        let mut o = zoo();
        // (owner some Person) ⊑ Owned
        o.add_axiom(Axiom::SubClassOf(
            ClassExpression::some(object("owner"), named("Person")),
            named("Owned"),
        ));
        // Student ⊑ Person
        o.add_axiom(Axiom::SubClassOf(named("Student"), named("Person")));

        let expr = ClassExpression::IntersectionOf(vec![
            named("Dog"),
            ClassExpression::some(object("owner"), named("Student")),
        ]);
        let result = supers(&o, &expr);
        assert!(result.contains(iri("Owned").as_str()));
        assert!(result.contains(iri("Animal").as_str()));
    }

    #[test]
    fn test_equivalence_both_directions() {
        let mut o = zoo();
        o.add_axiom(Axiom::EquivalentClasses(vec![named("Dog"), named("Hound")]));
        assert!(supers(&o, &named("Hound")).contains(iri("Animal").as_str()));
        assert!(supers(&o, &named("Dog")).contains(iri("Hound").as_str()));
    }

    #[test]
    fn test_union_keeps_common_supers() {
        let o = zoo();
        let expr = ClassExpression::UnionOf(vec![named("Dog"), named("Person")]);
        let result = supers(&o, &expr);
        assert!(result.contains(iri("Object").as_str()));
        assert!(!result.contains(iri("Animal").as_str()));
    }

    #[test]
    fn test_unsatisfiable_is_below_everything() {
        let mut o = zoo();
        o.add_axiom(Axiom::DisjointClasses(vec![named("Animal"), named("Person")]));
        let expr = ClassExpression::IntersectionOf(vec![named("Dog"), named("Person")]);
        let result = supers(&o, &expr);
        assert!(result.contains(OwlIri::nothing().as_str()));
        assert!(result.contains(iri("Pet").as_str()));
    }

    #[test]
    fn test_inverse_of_carries_range() {
        let mut o = zoo();
        // owns ≡ owner⁻
        o.add_axiom(Axiom::SubPropertyOf(object("owns"), object("owner").inverse()));
        o.add_axiom(Axiom::SubPropertyOf(object("owner").inverse(), object("owns")));
        let expr = ClassExpression::some(object("owns"), named("Dog"));
        assert!(supers(&o, &expr).contains(iri("Person").as_str()));
    }

    #[test]
    fn test_has_value_through_sub_property() {
        let mut o = zoo();
        o.add_axiom(Axiom::SubPropertyOf(object("breeder"), object("owner")));
        o.add_axiom(Axiom::SubClassOf(
            ClassExpression::has_value(object("owner"), Value::Individual(Individual(iri("alice")))),
            named("AlicesPet"),
        ));
        let expr = ClassExpression::has_value(object("breeder"), Value::Individual(Individual(iri("alice"))));
        assert!(supers(&o, &expr).contains(iri("AlicesPet").as_str()));
    }

    #[test]
    fn test_cyclic_axioms_terminate() {
        let mut o = OwlDlOntology::new();
        o.add_axiom(Axiom::SubClassOf(named("A"), ClassExpression::some(object("p"), named("A"))));
        o.add_axiom(Axiom::SubClassOf(ClassExpression::some(object("p"), named("B")), named("C")));
        o.add_axiom(Axiom::SubClassOf(named("A"), named("B")));
        let result = supers(&o, &named("A"));
        assert!(result.contains(iri("B").as_str()));
        assert!(result.contains(iri("C").as_str()));
    }

    #[test]
    fn test_inconsistent_ontology_is_an_error() {
        let mut o = zoo();
        o.add_axiom(Axiom::DisjointClasses(vec![named("Animal"), named("Person")]));
        o.add_axiom(Axiom::ClassAssertion(named("Dog"), Individual(iri("rex"))));
        o.add_axiom(Axiom::ClassAssertion(named("Person"), Individual(iri("rex"))));

        let reasoner = OwlDlReasoner::new();
        assert!(!reasoner.is_consistent(&o).unwrap());
        assert!(matches!(
            reasoner.super_classes(&o, &named("Dog")),
            Err(OwlDlError::ConsistencyError(_))
        ));
    }

    #[test]
    fn test_is_subsumed_by() {
        let o = zoo();
        let reasoner = OwlDlReasoner::new();
        assert!(reasoner.is_subsumed_by(&o, &named("Dog"), &iri("Object")).unwrap());
        assert!(!reasoner.is_subsumed_by(&o, &named("Object"), &iri("Dog")).unwrap());
    }
}
