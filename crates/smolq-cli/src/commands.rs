//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smolq_check::{
    ClassExpressionSynthesizer, GraphNode, PatternGraphBuilder, QueryChecker, Settings, StaticOntology,
    SubsumptionOracleClient, Type,
};
use smolq_core::NamedGraph;
use smolq_dl::OwlDlReasoner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "smolq")]
#[command(about = "Ontology-backed type checker for SPARQL access queries")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that a query only returns members of the declared type
    Check {
        /// SPARQL SELECT query
        #[arg(short, long)]
        query: String,

        /// Declared type of the target variable, e.g. List<Dog>
        #[arg(short, long)]
        r#type: String,

        /// Ontology as a JSON array of {subject, predicate, object} triples
        #[arg(short, long)]
        ontology: PathBuf,

        /// Settings file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output variable of the query
        #[arg(long, default_value = "obj")]
        var: String,

        /// Source line reported in diagnostics
        #[arg(long, default_value = "1")]
        line: i64,

        /// Do not print diagnostics
        #[arg(short, long)]
        silent: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the class expression of a query and its inferred super-classes
    Explain {
        /// SPARQL SELECT query
        #[arg(short, long)]
        query: String,

        /// Ontology as a JSON array of {subject, predicate, object} triples
        #[arg(short, long)]
        ontology: PathBuf,

        /// Settings file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output variable of the query
        #[arg(long, default_value = "obj")]
        var: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
}

/// Execute CLI commands
#[derive(Default)]
pub struct CommandExecutor {
    reasoner: OwlDlReasoner,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a CLI command
    pub fn execute(&self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Check {
                query,
                r#type,
                ontology,
                config,
                var,
                line,
                silent,
                format,
            } => self.execute_check(&query, &r#type, &ontology, config.as_deref(), &var, line, silent, format),
            Commands::Explain {
                query,
                ontology,
                config,
                var,
                format,
            } => self.execute_explain(&query, &ontology, config.as_deref(), &var, format),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_check(
        &self,
        query: &str,
        declared: &str,
        ontology_path: &Path,
        config: Option<&Path>,
        var: &str,
        line: i64,
        silent: bool,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let settings = load_settings(config)?;
        let ontology = load_ontology(ontology_path)?;
        let declared: Type = declared.parse()?;

        let mut checker = QueryChecker::new(&settings, &ontology, &self.reasoner);
        let verdict = checker.type_check(query, var, &declared, line);

        let success = match format {
            OutputFormat::Text => checker.report(silent),
            OutputFormat::Json => {
                if !silent {
                    println!("{}", serde_json::to_string_pretty(checker.log().entries())?);
                }
                !checker.log().has_errors()
            }
        };
        info!(verdict, success, "check finished");

        Ok(CommandResult {
            success,
            data: Some(serde_json::json!({
                "verdict": verdict,
                "diagnostics": checker.log().entries(),
            })),
        })
    }

    fn execute_explain(
        &self,
        query: &str,
        ontology_path: &Path,
        config: Option<&Path>,
        var: &str,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let settings = load_settings(config)?;
        let ontology = load_ontology(ontology_path)?;

        let index = PatternGraphBuilder::new(&settings).build(query, var)?;
        let expression = ClassExpressionSynthesizer::new(&index).synthesize(&GraphNode::variable(var))?;
        let supers = SubsumptionOracleClient::new(&settings, &ontology, &self.reasoner).super_classes(&expression)?;
        let super_classes: Vec<&str> = supers.iter().map(|iri| iri.as_str()).collect();

        match format {
            OutputFormat::Text => {
                println!("Expression: {}", expression);
                println!("Super-classes:");
                for iri in &super_classes {
                    println!("  <{}>", iri);
                }
            }
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "expression": expression,
                    "super_classes": super_classes,
                }))?
            ),
        }

        Ok(CommandResult {
            success: true,
            data: Some(serde_json::json!({
                "expression": expression,
                "super_classes": super_classes,
            })),
        })
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            Settings::from_json(&text).with_context(|| format!("invalid settings in {}", path.display()))
        }
        None => Ok(Settings::default()),
    }
}

fn load_ontology(path: &Path) -> Result<StaticOntology> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let graph = NamedGraph::from_json(path.display().to_string(), &text)
        .with_context(|| format!("invalid triples in {}", path.display()))?;
    let ontology = StaticOntology::from_triples(&graph.triples)?;
    Ok(ontology)
}

