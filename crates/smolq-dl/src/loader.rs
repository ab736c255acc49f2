//! OWL DLオントロジーローダー

use crate::model::{Axiom, ClassExpression, Individual, OwlDlOntology, OwlIri, PropertyExpression};
use crate::OwlDlError;
use smolq_core::vocabulary::*;
use smolq_core::Triple;
use tracing::{debug, trace};

/// OWL DL ontology loader trait
pub trait OntologyLoader {
    fn load_from_triples(&self, triples: &[Triple]) -> Result<OwlDlOntology, OwlDlError>;
}

/// Default OWL ontology loader
///
/// Declarations are read in a first pass so that later axioms know whether a
/// property is an object or a data property, independent of triple order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOntologyLoader;

impl OntologyLoader for DefaultOntologyLoader {
    fn load_from_triples(&self, triples: &[Triple]) -> Result<OwlDlOntology, OwlDlError> {
        let mut ontology = OwlDlOntology::new();

        for triple in triples {
            if triple.subject.starts_with('"') {
                return Err(OwlDlError::LoaderError(format!("literal in subject position: {}", triple)));
            }
            if triple.predicate != RDF_TYPE {
                continue;
            }
            match triple.object.as_str() {
                OWL_CLASS => ontology.declare_class(OwlIri::new(triple.subject.clone())),
                OWL_OBJECT_PROPERTY => ontology.declare_object_property(OwlIri::new(triple.subject.clone())),
                OWL_DATATYPE_PROPERTY => ontology.declare_data_property(OwlIri::new(triple.subject.clone())),
                OWL_NAMED_INDIVIDUAL => ontology.declare_individual(Individual(OwlIri::new(triple.subject.clone()))),
                OWL_ONTOLOGY => ontology.iri = Some(OwlIri::new(triple.subject.clone())),
                _ => {}
            }
        }

        for triple in triples {
            self.load_axiom(&mut ontology, triple)?;
        }

        debug!(
            classes = ontology.classes.len(),
            object_properties = ontology.object_properties.len(),
            data_properties = ontology.data_properties.len(),
            individuals = ontology.individuals.len(),
            axioms = ontology.axioms.len(),
            "ontology loaded"
        );
        Ok(ontology)
    }
}

impl DefaultOntologyLoader {
    fn load_axiom(&self, ontology: &mut OwlDlOntology, triple: &Triple) -> Result<(), OwlDlError> {
        let subject = triple.subject.as_str();
        let object = triple.object.as_str();

        match triple.predicate.as_str() {
            RDF_TYPE => {
                let object = self.iri_object(triple)?;
                if object == OWL_FUNCTIONAL_PROPERTY {
                    let property = self.property(ontology, subject);
                    ontology.add_axiom(Axiom::FunctionalProperty(property));
                } else if !is_builtin(object) {
                    ontology.add_axiom(Axiom::ClassAssertion(
                        ClassExpression::named(object),
                        Individual(OwlIri::new(subject)),
                    ));
                }
            }
            RDFS_SUBCLASS_OF => {
                let object = self.iri_object(triple)?;
                ontology.add_axiom(Axiom::SubClassOf(ClassExpression::named(subject), ClassExpression::named(object)));
            }
            OWL_EQUIVALENT_CLASS => {
                let object = self.iri_object(triple)?;
                ontology.add_axiom(Axiom::EquivalentClasses(vec![
                    ClassExpression::named(subject),
                    ClassExpression::named(object),
                ]));
            }
            OWL_DISJOINT_WITH => {
                let object = self.iri_object(triple)?;
                ontology.add_axiom(Axiom::DisjointClasses(vec![
                    ClassExpression::named(subject),
                    ClassExpression::named(object),
                ]));
            }
            RDFS_SUBPROPERTY_OF => {
                let object = self.iri_object(triple)?;
                let sub = self.property(ontology, subject);
                let sup = self.property(ontology, object);
                ontology.add_axiom(Axiom::SubPropertyOf(sub, sup));
            }
            OWL_INVERSE_OF => {
                // p inverseOf q  <=>  p ⊑ q⁻ and q⁻ ⊑ p
                let object = self.iri_object(triple)?;
                let p = self.property(ontology, subject);
                let q = self.property(ontology, object).inverse();
                ontology.add_axiom(Axiom::SubPropertyOf(p.clone(), q.clone()));
                ontology.add_axiom(Axiom::SubPropertyOf(q, p));
            }
            RDFS_DOMAIN => {
                let object = self.iri_object(triple)?;
                let property = self.property(ontology, subject);
                ontology.add_axiom(Axiom::PropertyDomain(property, ClassExpression::named(object)));
            }
            RDFS_RANGE => {
                let object = self.iri_object(triple)?;
                let property = self.property(ontology, subject);
                if property.is_data() {
                    trace!(property = subject, range = object, "datatype range ignored");
                } else {
                    ontology.add_axiom(Axiom::ObjectPropertyRange(property, ClassExpression::named(object)));
                }
            }
            predicate if is_builtin(predicate) => {
                trace!(predicate, "annotation or unsupported vocabulary skipped");
            }
            predicate => {
                let individual = Individual(OwlIri::new(subject));
                if triple.has_literal_object() {
                    ontology.add_axiom(Axiom::DataPropertyAssertion(
                        OwlIri::new(predicate),
                        individual,
                        lexical_form(object),
                    ));
                } else {
                    let property = self.property(ontology, predicate);
                    ontology.add_axiom(Axiom::ObjectPropertyAssertion(
                        property,
                        individual,
                        Individual(OwlIri::new(object)),
                    ));
                }
            }
        }

        Ok(())
    }

    fn iri_object<'t>(&self, triple: &'t Triple) -> Result<&'t str, OwlDlError> {
        if triple.has_literal_object() {
            Err(OwlDlError::LoaderError(format!("expected an IRI object in {}", triple)))
        } else {
            Ok(triple.object.as_str())
        }
    }

    fn property(&self, ontology: &OwlDlOntology, iri: &str) -> PropertyExpression {
        let iri = OwlIri::new(iri);
        if ontology.is_data_property(&iri) {
            PropertyExpression::DataProperty(iri)
        } else {
            PropertyExpression::ObjectProperty(iri)
        }
    }
}

/// Lexical form of an N-Triples literal: `"5"^^<xsd:integer>` gives `5`
pub fn lexical_form(literal: &str) -> String {
    let body = literal.strip_prefix('"').unwrap_or(literal);
    let end = body.rfind('"').unwrap_or(body.len());
    body[..end].replace("\\\"", "\"").replace("\\\\", "\\")
}
