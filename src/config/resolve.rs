use crate::config::ignore::IgnoreFile;
use crate::config::provenance::{ProvenanceMap, Source};
use crate::config::schema::FileConfig;
use crate::config::ResolvedConfig;
use crate::errors::{PysurveyError, Result};
use crate::output::OutputFormat;
use std::path::{Path, PathBuf};

/// CLI overrides extracted from command arguments.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub quiet: bool,
    pub jobs: Option<usize>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Resolve configuration by applying layers bottom-up:
/// 1. Built-in defaults
/// 2. User config (~/.config/pysurvey/config.toml)
/// 3. Project config (nearest .pysurvey.toml walking up from working_dir)
/// 4. Environment variables
/// 5. CLI overrides
///
/// The nearest `.pysurveyignore` is loaded alongside and recorded under
/// `targeting.ignore`.
pub fn resolve_config(working_dir: &Path, cli: &CliOverrides) -> Result<ResolvedConfig> {
    let mut prov = ProvenanceMap::default();
    let mut loaded_files = Vec::new();

    // 1. Built-in defaults
    let mut config = ResolvedConfig::default();

    // 2. User config
    if let Some(user_config_path) = find_user_config() {
        if user_config_path.exists() {
            let file_config = load_file_config(&user_config_path, "user")?;
            apply_file_config(
                &mut config,
                &file_config,
                Source::UserConfig(user_config_path.clone()),
                &mut prov,
            );
            loaded_files.push(user_config_path);
        }
    }

    // 3. Project config (walk up from working_dir)
    if let Some(project_config_path) = find_project_config(working_dir) {
        let file_config = load_file_config(&project_config_path, "project")?;
        apply_file_config(
            &mut config,
            &file_config,
            Source::ProjectConfig(project_config_path.clone()),
            &mut prov,
        );
        loaded_files.push(project_config_path);
    }

    // 4. Environment variables
    apply_env_vars(&mut config, &mut prov);

    // 5. CLI overrides
    apply_cli_overrides(&mut config, cli, &mut prov);

    validate_format(&config.format, &prov)?;

    config.ignore_file = IgnoreFile::discover(working_dir)?;
    if let Some(ignore) = &config.ignore_file {
        prov.set("targeting.ignore", Source::IgnoreFile(ignore.path().to_path_buf()));
    }
    config.provenance = prov;
    config.loaded_files = loaded_files;

    tracing::debug!(files = config.loaded_files.len(), "resolved configuration");
    Ok(config)
}

fn load_file_config(path: &Path, layer: &str) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        PysurveyError::Config(format!("Could not read {layer} config: {}", path.display()))
    })?;
    FileConfig::from_toml(&content)
        .map_err(|e| PysurveyError::Config(format!("Invalid {layer} config: {e}")))
}

fn find_user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pysurvey").join("config.toml"))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(".pysurvey.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn validate_format(format: &str, prov: &ProvenanceMap) -> Result<()> {
    if format.parse::<OutputFormat>().is_ok() {
        return Ok(());
    }
    let source = prov
        .get("defaults.format")
        .map_or_else(|| "unknown source".to_string(), |s| s.to_string());
    Err(PysurveyError::Config(format!(
        "Unknown output format '{format}' from {source}; expected json, text or dot"
    )))
}

fn apply_file_config(
    config: &mut ResolvedConfig,
    file: &FileConfig,
    source: Source,
    prov: &mut ProvenanceMap,
) {
    // Defaults
    if let Some(ref format) = file.defaults.format {
        config.format = format.clone();
        prov.set("defaults.format", source.clone());
    }
    if let Some(quiet) = file.defaults.quiet {
        config.quiet = quiet;
        prov.set("defaults.quiet", source.clone());
    }
    if let Some(jobs) = file.defaults.jobs {
        config.jobs = jobs;
        prov.set("defaults.jobs", source.clone());
    }

    // Targeting
    if !file.targeting.include.is_empty() {
        config.include = file.targeting.include.clone();
        prov.set("targeting.include", source.clone());
    }
    if !file.targeting.exclude.is_empty() {
        config.exclude = file.targeting.exclude.clone();
        prov.set("targeting.exclude", source.clone());
    }

    // Clients
    if let Some(ref libraries) = file.clients.libraries {
        config.clients.libraries = libraries.clone();
        prov.set("clients.libraries", source.clone());
    }

    // Tests
    if let Some(ref prefixes) = file.tests.function_prefixes {
        config.tests.function_prefixes = prefixes.clone();
        prov.set("tests.function_prefixes", source.clone());
    }
    if let Some(ref prefixes) = file.tests.class_prefixes {
        config.tests.class_prefixes = prefixes.clone();
        prov.set("tests.class_prefixes", source.clone());
    }
    if let Some(ref bases) = file.tests.base_classes {
        config.tests.base_classes = bases.clone();
        prov.set("tests.base_classes", source.clone());
    }

    // Protocols
    if let Some(require) = file.protocols.require_protocol_base {
        config.protocols.require_protocol_base = require;
        prov.set("protocols.require_protocol_base", source);
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn apply_env_vars(config: &mut ResolvedConfig, prov: &mut ProvenanceMap) {
    if let Ok(val) = std::env::var("PYSURVEY_FORMAT") {
        config.format = val;
        prov.set("defaults.format", Source::EnvVar("PYSURVEY_FORMAT".into()));
    }
    if let Ok(val) = std::env::var("PYSURVEY_QUIET") {
        config.quiet = val == "1" || val.eq_ignore_ascii_case("true");
        prov.set("defaults.quiet", Source::EnvVar("PYSURVEY_QUIET".into()));
    }
    if let Ok(val) = std::env::var("PYSURVEY_JOBS") {
        if let Ok(n) = val.parse::<usize>() {
            config.jobs = n;
            prov.set("defaults.jobs", Source::EnvVar("PYSURVEY_JOBS".into()));
        }
    }
    if let Ok(val) = std::env::var("PYSURVEY_INCLUDE") {
        config.include = split_list(&val);
        prov.set("targeting.include", Source::EnvVar("PYSURVEY_INCLUDE".into()));
    }
    if let Ok(val) = std::env::var("PYSURVEY_EXCLUDE") {
        config.exclude = split_list(&val);
        prov.set("targeting.exclude", Source::EnvVar("PYSURVEY_EXCLUDE".into()));
    }
    if let Ok(val) = std::env::var("PYSURVEY_CLIENT_LIBRARIES") {
        config.clients.libraries = split_list(&val);
        prov.set(
            "clients.libraries",
            Source::EnvVar("PYSURVEY_CLIENT_LIBRARIES".into()),
        );
    }
}

fn apply_cli_overrides(config: &mut ResolvedConfig, cli: &CliOverrides, prov: &mut ProvenanceMap) {
    if let Some(format) = cli.format {
        config.format = format.to_string();
        prov.set("defaults.format", Source::CliFlag("--format".into()));
    }
    if cli.quiet {
        config.quiet = true;
        prov.set("defaults.quiet", Source::CliFlag("--quiet".into()));
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
        prov.set("defaults.jobs", Source::CliFlag("--jobs".into()));
    }
    if !cli.include.is_empty() {
        config.include = cli.include.clone();
        prov.set("targeting.include", Source::CliFlag("--include".into()));
    }
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
        prov.set("targeting.exclude", Source::CliFlag("--exclude".into()));
    }
}
