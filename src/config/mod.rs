pub mod ignore;
pub mod provenance;
pub mod resolve;
pub mod schema;
pub mod show;

use crate::analysis::{clients, AnalysisOptions, TestOptions};
use self::ignore::IgnoreFile;
use provenance::ProvenanceMap;
use std::path::{Path, PathBuf};

/// Fully resolved configuration, no Option fields.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    // Operational
    pub format: String,
    pub quiet: bool,
    pub jobs: usize,

    // Targeting
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub ignore_file: Option<IgnoreFile>,

    // Recognition
    pub clients: ResolvedClients,
    pub tests: ResolvedTests,
    pub protocols: ResolvedProtocols,

    // Provenance
    pub provenance: ProvenanceMap,
    pub loaded_files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedClients {
    pub libraries: Vec<String>,
}

impl Default for ResolvedClients {
    fn default() -> Self {
        Self {
            libraries: clients::DEFAULT_CLIENT_LIBRARIES
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedTests {
    pub function_prefixes: Vec<String>,
    pub class_prefixes: Vec<String>,
    pub base_classes: Vec<String>,
}

impl Default for ResolvedTests {
    fn default() -> Self {
        let defaults = TestOptions::default();
        Self {
            function_prefixes: defaults.function_prefixes,
            class_prefixes: defaults.class_prefixes,
            base_classes: defaults.base_classes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedProtocols {
    pub require_protocol_base: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            quiet: false,
            jobs: 0,
            include: Vec::new(),
            exclude: Vec::new(),
            ignore_file: None,
            clients: ResolvedClients::default(),
            tests: ResolvedTests::default(),
            protocols: ResolvedProtocols::default(),
            provenance: ProvenanceMap::default(),
            loaded_files: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    /// Engine options derived from the recognition sections.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            client_libraries: self.clients.libraries.clone(),
            tests: TestOptions {
                function_prefixes: self.tests.function_prefixes.clone(),
                class_prefixes: self.tests.class_prefixes.clone(),
                base_classes: self.tests.base_classes.clone(),
            },
            require_protocol_base: self.protocols.require_protocol_base,
        }
    }

    /// Whether the nearest `.pysurveyignore` drops `file` from the survey.
    pub fn is_ignored(&self, file: &Path) -> bool {
        self.ignore_file
            .as_ref()
            .is_some_and(|ignore| ignore.is_ignored(file))
    }
}
