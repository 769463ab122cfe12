use crate::cli::analyze::{survey, Survey};
use crate::config::resolve::CliOverrides;
use crate::errors::Result;
use crate::output::OutputFormat;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Directory or Python file to analyze
    pub path: PathBuf,

    /// Output format (dot or json)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Include glob patterns
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude glob patterns
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Worker threads (0 = one per core)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}

impl GraphArgs {
    fn to_cli_overrides(&self) -> CliOverrides {
        CliOverrides {
            format: self.format,
            quiet: self.quiet,
            jobs: self.jobs,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

pub fn run(args: &GraphArgs) -> Result<()> {
    let Survey { report, .. } = survey(&args.path, &args.to_cli_overrides())?;
    // The configured report format does not apply here; graphs default to DOT.
    let format = args.format.unwrap_or(OutputFormat::Dot);

    let graph = crate::graph::build_call_graph(&report);
    let mut stdout = std::io::stdout().lock();

    match format {
        OutputFormat::Json => crate::output::json::write_graph_json(&mut stdout, &graph)?,
        OutputFormat::Dot | OutputFormat::Text => {
            crate::output::dot::write_dot(&mut stdout, &graph)?
        }
    }

    Ok(())
}
