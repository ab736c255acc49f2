//! 検査器の設定
//!
//! 名前空間と診断行のオフセット。JSON ファイルから読み込める。

use serde::{Deserialize, Serialize};
use smolq_core::PrefixTable;
use std::collections::BTreeMap;

/// Namespaces and line bookkeeping for one checker instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace of the language vocabulary (`smol:`)
    pub lang_prefix: String,

    /// Namespace of program classes and fields (`prog:` and `:`)
    pub prog_prefix: String,

    /// Namespace of runtime objects (`run:`)
    pub run_prefix: String,

    /// Namespace of the domain ontology (`domain:`)
    pub domain_prefix: String,

    /// Additional short name to namespace entries
    pub extra_prefixes: BTreeMap<String, String>,

    /// Lines prepended in front of user source; subtracted from every diagnostic line
    pub prelude_offset: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lang_prefix: "https://smolq.example/lang#".to_string(),
            prog_prefix: "https://smolq.example/prog#".to_string(),
            run_prefix: "https://smolq.example/run#".to_string(),
            domain_prefix: "https://smolq.example/domain#".to_string(),
            extra_prefixes: BTreeMap::new(),
            prelude_offset: 0,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Account for a standard-library prelude placed before user source.
    ///
    /// The checker separates prelude and program by two lines, hence the `+ 2`.
    pub fn with_prelude(mut self, prelude: &str) -> Self {
        self.prelude_offset = prelude.lines().count() as i64 + 2;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.extra_prefixes.insert(prefix.into(), namespace.into());
        self
    }

    /// The recognized-prefix table every query starts from
    pub fn prefix_table(&self) -> PrefixTable {
        let mut table = PrefixTable::with_standard();
        table.insert("smol", self.lang_prefix.as_str());
        table.insert("prog", self.prog_prefix.as_str());
        table.insert("run", self.run_prefix.as_str());
        table.insert("domain", self.domain_prefix.as_str());
        table.insert("", self.prog_prefix.as_str());
        for (prefix, namespace) in &self.extra_prefixes {
            table.insert(prefix.as_str(), namespace.as_str());
        }
        table
    }

    /// Rewrite `prefix:local` names with a recognized prefix into full `<IRI>`s
    pub fn replace_known_prefixes(&self, text: &str) -> String {
        self.prefix_table().replace_known_prefixes(text)
    }

    /// IRI of a program class
    pub fn class_iri(&self, class_name: &str) -> String {
        format!("{}{}", self.prog_prefix, class_name)
    }
}
