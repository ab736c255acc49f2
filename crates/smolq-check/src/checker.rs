//! クエリ型検査
//!
//! アクセス文ごとに グラフ構築 → クラス式合成 → 包摂判定 を順に実行し、
//! 失敗はすべて診断ログに記録する。

use crate::config::Settings;
use crate::diagnostics::{DiagnosticsLog, Severity};
use crate::graph::{GraphNode, PatternGraphBuilder};
use crate::oracle::{OntologySource, SubsumptionOracleClient};
use crate::synth::ClassExpressionSynthesizer;
use crate::types::Type;
use crate::CheckError;
use smolq_dl::Classifier;
use tracing::{debug, info_span};

/// Checks access queries of one program against its static ontology
///
/// Each instance owns its diagnostics; share the ontology source and the
/// classifier between threads, not the checker.
pub struct QueryChecker<'a> {
    settings: &'a Settings,
    ontology: &'a dyn OntologySource,
    classifier: &'a dyn Classifier,
    log: DiagnosticsLog,
}

impl<'a> QueryChecker<'a> {
    pub fn new(settings: &'a Settings, ontology: &'a dyn OntologySource, classifier: &'a dyn Classifier) -> Self {
        Self {
            settings,
            ontology,
            classifier,
            log: DiagnosticsLog::new(settings.prelude_offset),
        }
    }

    /// Class expression describing `output_var`, or `None` after logging why not
    pub fn synthesize(&mut self, query: &str, output_var: &str, line: i64) -> Option<String> {
        let index = match PatternGraphBuilder::new(self.settings).build(query, output_var) {
            Ok(index) => index,
            Err(err) => {
                self.log.log_error(&err, line);
                self.log.log("building the pattern graph for the query failed", line, Severity::Warning);
                return None;
            }
        };

        match ClassExpressionSynthesizer::new(&index).synthesize(&GraphNode::variable(output_var)) {
            Ok(expression) => Some(expression),
            Err(err) => {
                debug!(error = %err, "synthesis aborted");
                self.log.log("failed to extract expression for query", line, Severity::Error);
                None
            }
        }
    }

    /// Whether the query at `line` only returns members of `declared`
    pub fn type_check(&mut self, query: &str, output_var: &str, declared: &Type, line: i64) -> bool {
        let span = info_span!("type_check", line, declared = %declared);
        let _enter = span.enter();

        let Some(expression) = self.synthesize(query, output_var, line) else {
            return false;
        };
        debug!(expression = %expression, "query expression");

        let oracle = SubsumptionOracleClient::new(self.settings, self.ontology, self.classifier);
        match oracle.check(&expression, declared) {
            Ok(()) => true,
            Err(err) => {
                self.log.log_error(&err, line);
                if matches!(err, CheckError::TargetTypeShapeInvalid(_)) {
                    self.log.log("failed to extract expression for target type", line, Severity::Error);
                }
                false
            }
        }
    }

    pub fn log(&self) -> &DiagnosticsLog {
        &self.log
    }

    pub fn into_log(self) -> DiagnosticsLog {
        self.log
    }

    /// Print collected diagnostics unless `silent`; true iff none is an error
    pub fn report(&self, silent: bool) -> bool {
        self.log.report(silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::StaticOntology;
    use smolq_core::vocabulary::{OWL_CLASS, RDFS_SUBCLASS_OF, RDF_TYPE};
    use smolq_core::Triple;
    use smolq_dl::OwlDlReasoner;

    fn ontology(settings: &Settings) -> StaticOntology {
        let c = |s: &str| settings.class_iri(s);
        StaticOntology::from_triples(&[
            Triple::new(c("Dog"), RDF_TYPE, OWL_CLASS),
            Triple::new(c("Animal"), RDF_TYPE, OWL_CLASS),
            Triple::new(c("Dog"), RDFS_SUBCLASS_OF, c("Animal")),
        ])
        .unwrap()
    }

    #[test]
    fn test_accepts_subclass() {
        let settings = Settings::default();
        let source = ontology(&settings);
        let mut checker = QueryChecker::new(&settings, &source, &OwlDlReasoner);
        let ok = checker.type_check("SELECT ?obj WHERE { ?obj a prog:Dog }", "obj", &"List<Animal>".parse().unwrap(), 1);
        assert!(ok);
        assert!(checker.log().is_empty());
        assert!(checker.report(true));
    }

    #[test]
    fn test_builder_failure_logs_two_entries() {
        let settings = Settings::default();
        let source = ontology(&settings);
        let mut checker = QueryChecker::new(&settings, &source, &OwlDlReasoner);
        assert!(checker.synthesize("ASK { ?obj a prog:Dog }", "obj", 7).is_none());

        let entries = checker.log().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].to_string(), "Line 7, ERROR: non-select queries are not supported yet");
        assert_eq!(entries[1].to_string(), "Line 7, WARNING: building the pattern graph for the query failed");
    }

    #[test]
    fn test_cycle_logs_extraction_failure() {
        let settings = Settings::default();
        let source = ontology(&settings);
        let mut checker = QueryChecker::new(&settings, &source, &OwlDlReasoner);
        assert!(checker.synthesize("SELECT ?obj WHERE { ?obj prog:knows ?obj }", "obj", 3).is_none());
        assert_eq!(
            checker.log().entries()[0].to_string(),
            "Line 3, ERROR: failed to extract expression for query"
        );
    }

    #[test]
    fn test_bad_target_type() {
        let settings = Settings::default();
        let source = ontology(&settings);
        let mut checker = QueryChecker::new(&settings, &source, &OwlDlReasoner);
        assert!(!checker.type_check("SELECT ?obj WHERE { ?obj a prog:Dog }", "obj", &Type::base("Dog"), 2));

        let messages: Vec<_> = checker.log().entries().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "access statements are only allowed to target List type variables with concrete parameter type",
                "failed to extract expression for target type",
            ]
        );
        assert!(!checker.report(true));
    }

    #[test]
    fn test_prelude_offset_moves_lines() {
        let settings = Settings::default().with_prelude("class Object end");
        let source = ontology(&settings);
        let mut checker = QueryChecker::new(&settings, &source, &OwlDlReasoner);
        checker.type_check("SELECT ?obj WHERE { ?obj a prog:Animal }", "obj", &"List<Dog>".parse().unwrap(), 10);
        assert_eq!(checker.into_log().entries()[0].line, 7);
    }
}
