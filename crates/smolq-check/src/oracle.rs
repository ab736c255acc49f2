//! 包摂オラクル
//!
//! 合成したクラス式を静的オントロジー上で解析し、推論器に上位クラスを
//! 問い合わせて宣言型のクラスが含まれるかを判定する。

use crate::config::Settings;
use crate::types::Type;
use crate::CheckError;
use smolq_dl::{ClassExpression, Classifier, ManchesterParser, OwlDlOntology, SuperClasses};
use std::sync::Arc;
use tracing::{debug, info};

/// Supplies the program's static data ontology
///
/// The returned handle is shared read-only between concurrent checks.
pub trait OntologySource: Send + Sync {
    fn static_ontology(&self) -> Arc<OwlDlOntology>;
}

pub struct SubsumptionOracleClient<'a> {
    settings: &'a Settings,
    source: &'a dyn OntologySource,
    classifier: &'a dyn Classifier,
}

impl<'a> SubsumptionOracleClient<'a> {
    pub fn new(settings: &'a Settings, source: &'a dyn OntologySource, classifier: &'a dyn Classifier) -> Self {
        Self {
            settings,
            source,
            classifier,
        }
    }

    /// IRI of `T` in `List<T>`
    pub fn target_class(&self, declared: &Type) -> Result<String, CheckError> {
        declared
            .list_element_class()
            .map(|class| self.settings.class_iri(class))
            .ok_or_else(|| CheckError::TargetTypeShapeInvalid(declared.to_string()))
    }

    pub fn parse_expression(&self, ontology: &OwlDlOntology, expression: &str) -> Result<ClassExpression, CheckError> {
        let resolved = self.settings.replace_known_prefixes(expression);
        ManchesterParser::new(ontology)
            .with_prefixes(self.settings.prefix_table())
            .parse(&resolved)
            .map_err(|e| CheckError::ExpressionParseFailure {
                expression: expression.to_string(),
                message: e.to_string(),
            })
    }

    pub fn super_classes(&self, expression: &str) -> Result<SuperClasses, CheckError> {
        let ontology = self.source.static_ontology();
        let parsed = self.parse_expression(&ontology, expression)?;
        self.classifier
            .super_classes(&ontology, &parsed)
            .map_err(|e| CheckError::ReasonerFailure(e.to_string()))
    }

    /// Ok iff the declared list element class is a super-class of `expression`
    pub fn check(&self, expression: &str, declared: &Type) -> Result<(), CheckError> {
        let target = self.target_class(declared)?;
        let supers = self.super_classes(expression)?;
        debug!(target = %target, supers = %supers, "classification finished");

        if supers.contains(&target) {
            info!(expression, declared = %declared, "query type checked");
            Ok(())
        } else {
            Err(CheckError::SubsumptionFailed {
                query: expression.to_string(),
                declared: declared.to_string(),
                supertypes: supers.to_string(),
            })
        }
    }
}
