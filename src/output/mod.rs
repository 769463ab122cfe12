pub mod dot;
pub mod json;
pub mod text;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, ValueEnum, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Dot,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Dot => write!(f, "dot"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true).map_err(|_| format!("unsupported format: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_round_trips_through_display() {
        for format in [OutputFormat::Json, OutputFormat::Text, OutputFormat::Dot] {
            assert_eq!(format.to_string().parse::<OutputFormat>(), Ok(format));
        }
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
    }
}
