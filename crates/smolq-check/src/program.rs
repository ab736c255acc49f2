//! プログラムのクラス表
//!
//! フィールド表と継承階層を OWL のトリプルとして書き出し、
//! 型検査が参照する静的オントロジーを作る。

use crate::config::Settings;
use crate::oracle::OntologySource;
use crate::types::Type;
use smolq_core::vocabulary::*;
use smolq_core::Triple;
use smolq_dl::{DefaultOntologyLoader, OntologyLoader, OwlDlError, OwlDlOntology};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Root of every program class hierarchy
pub const OBJECT_CLASS: &str = "Object";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: Type,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty }
    }

    fn datatype(&self) -> Option<&'static str> {
        match &self.ty {
            Type::Base(name) => match name.as_str() {
                "Int" => Some(XSD_INTEGER),
                "Double" => Some(XSD_DOUBLE),
                "String" => Some(XSD_STRING),
                "Boolean" => Some(XSD_BOOLEAN),
                _ => None,
            },
            Type::Composed(..) => None,
        }
    }

    /// Class name the field's values belong to, `List` for `List<T>`
    fn range_class(&self) -> String {
        let mut ty = &self.ty;
        while let Type::Composed(primary, _) = ty {
            ty = primary;
        }
        ty.to_string()
    }
}

/// Field table and class hierarchy of a program
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    /// class -> declared fields
    pub field_table: BTreeMap<String, Vec<FieldInfo>>,
    /// class -> direct subclasses
    pub hierarchy: BTreeMap<String, BTreeSet<String>>,
}

impl StaticTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, name: impl Into<String>, superclass: Option<&str>) {
        let name = name.into();
        self.field_table.entry(name.clone()).or_default();
        if let Some(superclass) = superclass {
            self.field_table.entry(superclass.to_string()).or_default();
            self.hierarchy.entry(superclass.to_string()).or_default().insert(name);
        }
    }

    pub fn add_field(&mut self, class: &str, field: FieldInfo) {
        self.field_table.entry(class.to_string()).or_default().push(field);
    }

    /// Direct superclass of `class`, if one was declared
    pub fn super_class(&self, class: &str) -> Option<&str> {
        self.hierarchy
            .iter()
            .find(|(_, subclasses)| subclasses.contains(class))
            .map(|(superclass, _)| superclass.as_str())
    }

    /// OWL triples describing every class, field and subclass edge
    pub fn dump_classes(&self, settings: &Settings) -> Vec<Triple> {
        let prog = |local: &str| settings.class_iri(local);
        let smol = |local: &str| format!("{}{}", settings.lang_prefix, local);
        let mut triples = Vec::new();

        for (class, fields) in &self.field_table {
            triples.push(Triple::new(prog(class), RDF_TYPE, smol("Class")));
            triples.push(Triple::new(prog(class), RDF_TYPE, OWL_CLASS));

            for field in fields {
                let field_iri = prog(&format!("{}_{}", class, field.name));
                triples.push(Triple::new(prog(class), smol("hasField"), field_iri.clone()));
                triples.push(Triple::new(field_iri.clone(), RDF_TYPE, smol("Field")));
                match field.datatype() {
                    Some(datatype) => {
                        triples.push(Triple::new(field_iri.clone(), RDF_TYPE, OWL_DATATYPE_PROPERTY));
                        triples.push(Triple::new(field_iri.clone(), RDFS_RANGE, datatype));
                    }
                    None => {
                        triples.push(Triple::new(field_iri.clone(), RDF_TYPE, OWL_FUNCTIONAL_PROPERTY));
                        triples.push(Triple::new(field_iri.clone(), RDF_TYPE, OWL_OBJECT_PROPERTY));
                        triples.push(Triple::new(field_iri.clone(), RDFS_RANGE, prog(&field.range_class())));
                    }
                }
                triples.push(Triple::new(field_iri, RDFS_DOMAIN, prog(class)));
            }
        }

        for (superclass, subclasses) in &self.hierarchy {
            for subclass in subclasses {
                triples.push(Triple::new(prog(subclass), RDFS_SUBCLASS_OF, prog(superclass)));
            }
        }

        for class in self.field_table.keys() {
            if class != OBJECT_CLASS && self.super_class(class).is_none() {
                triples.push(Triple::new(prog(class), RDFS_SUBCLASS_OF, prog(OBJECT_CLASS)));
            }
        }

        triples
    }

    pub fn to_ontology(&self, settings: &Settings) -> Result<OwlDlOntology, OwlDlError> {
        let triples = self.dump_classes(settings);
        debug!(classes = self.field_table.len(), triples = triples.len(), "class table exported");
        DefaultOntologyLoader.load_from_triples(&triples)
    }
}

/// An ontology loaded once and handed out to every check
#[derive(Debug, Clone)]
pub struct StaticOntology {
    ontology: Arc<OwlDlOntology>,
}

impl StaticOntology {
    pub fn new(ontology: OwlDlOntology) -> Self {
        Self {
            ontology: Arc::new(ontology),
        }
    }

    pub fn from_triples(triples: &[Triple]) -> Result<Self, OwlDlError> {
        Ok(Self::new(DefaultOntologyLoader.load_from_triples(triples)?))
    }

    /// Class table export merged with additional domain triples
    pub fn from_program(table: &StaticTable, settings: &Settings, extra: &[Triple]) -> Result<Self, OwlDlError> {
        let mut triples = table.dump_classes(settings);
        triples.extend_from_slice(extra);
        Self::from_triples(&triples)
    }
}

impl OntologySource for StaticOntology {
    fn static_ontology(&self) -> Arc<OwlDlOntology> {
        Arc::clone(&self.ontology)
    }
}
