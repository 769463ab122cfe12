use clap::ValueEnum;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level tables of a pysurvey config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Section {
    Defaults,
    Targeting,
    Clients,
    Tests,
    Protocols,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Defaults,
        Section::Targeting,
        Section::Clients,
        Section::Tests,
        Section::Protocols,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Defaults => "defaults",
            Section::Targeting => "targeting",
            Section::Clients => "clients",
            Section::Tests => "tests",
            Section::Protocols => "protocols",
        }
    }

    /// Every resolved key of the section, dotted with the section name.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Section::Defaults => &["defaults.format", "defaults.quiet", "defaults.jobs"],
            Section::Targeting => &["targeting.include", "targeting.exclude", "targeting.ignore"],
            Section::Clients => &["clients.libraries"],
            Section::Tests => &[
                "tests.function_prefixes",
                "tests.class_prefixes",
                "tests.base_classes",
            ],
            Section::Protocols => &["protocols.require_protocol_base"],
        }
    }

    pub fn of_key(key: &str) -> Option<Section> {
        let (section, _) = key.split_once('.')?;
        Self::ALL.into_iter().find(|s| s.name() == section)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The layer a resolved value came from, lowest precedence first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Default,
    UserConfig(PathBuf),
    ProjectConfig(PathBuf),
    IgnoreFile(PathBuf),
    EnvVar(String),
    CliFlag(String),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Default => write!(f, "default"),
            Source::UserConfig(path) => write!(f, "user config ({})", path.display()),
            Source::ProjectConfig(path) => write!(f, "project config ({})", path.display()),
            Source::IgnoreFile(path) => write!(f, "ignore file ({})", path.display()),
            Source::EnvVar(name) => write!(f, "env var ({name})"),
            Source::CliFlag(name) => write!(f, "CLI flag ({name})"),
        }
    }
}

/// Source of every resolved key, starting from the built-in defaults.
#[derive(Debug, Clone)]
pub struct ProvenanceMap {
    entries: BTreeMap<&'static str, Source>,
}

impl Default for ProvenanceMap {
    fn default() -> Self {
        let entries = Section::ALL
            .into_iter()
            .flat_map(Section::keys)
            .map(|key| (*key, Source::Default))
            .collect();
        Self { entries }
    }
}

impl ProvenanceMap {
    /// Record that `key` now comes from `source`. Keys outside the known
    /// sections are ignored.
    pub fn set(&mut self, key: &str, source: Source) {
        match self.entries.get_mut(key) {
            Some(entry) => *entry = source,
            None => tracing::debug!(key, "ignoring provenance for unknown config key"),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Source> {
        self.entries.get(key)
    }

    /// All keys in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Source)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Keys of one section in declaration order.
    pub fn section(&self, section: Section) -> impl Iterator<Item = (&'static str, &Source)> + '_ {
        section
            .keys()
            .iter()
            .filter_map(|key| self.entries.get(key).map(|source| (*key, source)))
    }

    /// Keys no longer at their built-in default.
    pub fn overridden(&self) -> impl Iterator<Item = (&'static str, &Source)> + '_ {
        self.iter().filter(|(_, source)| **source != Source::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_key_starts_at_default() {
        let map = ProvenanceMap::default();
        let total: usize = Section::ALL.iter().map(|s| s.keys().len()).sum();
        assert_eq!(map.iter().count(), total);
        assert!(map.iter().all(|(_, source)| *source == Source::Default));
        assert_eq!(map.overridden().count(), 0);
    }

    #[test]
    fn later_layers_replace_earlier_ones() {
        let mut map = ProvenanceMap::default();
        let project = PathBuf::from("/project/.pysurvey.toml");
        map.set("clients.libraries", Source::ProjectConfig(project.clone()));
        map.set("defaults.jobs", Source::ProjectConfig(project.clone()));
        map.set("defaults.jobs", Source::EnvVar("PYSURVEY_JOBS".into()));

        assert_eq!(
            map.get("clients.libraries"),
            Some(&Source::ProjectConfig(project))
        );
        let overridden: Vec<&str> = map.overridden().map(|(k, _)| k).collect();
        assert_eq!(overridden, vec!["clients.libraries", "defaults.jobs"]);
    }

    #[test]
    fn unknown_keys_are_not_recorded() {
        let mut map = ProvenanceMap::default();
        map.set("rules.high_fanout", Source::CliFlag("--fanout".into()));
        assert_eq!(map.get("rules.high_fanout"), None);
    }

    #[test]
    fn section_keys_follow_declaration_order() {
        let map = ProvenanceMap::default();
        let keys: Vec<&str> = map.section(Section::Tests).map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "tests.function_prefixes",
                "tests.class_prefixes",
                "tests.base_classes"
            ]
        );
    }

    #[test]
    fn keys_map_back_to_sections() {
        for section in Section::ALL {
            for key in section.keys() {
                assert_eq!(Section::of_key(key), Some(section));
            }
        }
        assert_eq!(Section::of_key("rules.x"), None);
        assert_eq!(Section::of_key("defaults"), None);
    }

    #[test]
    fn display_sources() {
        assert_eq!(Source::Default.to_string(), "default");
        assert_eq!(
            Source::IgnoreFile(PathBuf::from("/project/.pysurveyignore")).to_string(),
            "ignore file (/project/.pysurveyignore)"
        );
        assert_eq!(
            Source::EnvVar("PYSURVEY_FORMAT".to_string()).to_string(),
            "env var (PYSURVEY_FORMAT)"
        );
        assert_eq!(
            Source::CliFlag("--format".to_string()).to_string(),
            "CLI flag (--format)"
        );
    }
}
