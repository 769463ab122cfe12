use serde::Deserialize;

/// TOML-deserializable config file. All fields are Option for layered merging.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub defaults: DefaultsFileConfig,
    #[serde(default)]
    pub targeting: TargetingFileConfig,
    #[serde(default)]
    pub clients: ClientsFileConfig,
    #[serde(default)]
    pub tests: TestsFileConfig,
    #[serde(default)]
    pub protocols: ProtocolsFileConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultsFileConfig {
    pub format: Option<String>,
    pub quiet: Option<bool>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TargetingFileConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientsFileConfig {
    pub libraries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TestsFileConfig {
    pub function_prefixes: Option<Vec<String>>,
    pub class_prefixes: Option<Vec<String>>,
    pub base_classes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProtocolsFileConfig {
    pub require_protocol_base: Option<bool>,
}

impl FileConfig {
    /// Load from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
