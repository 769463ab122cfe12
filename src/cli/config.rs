use crate::config::provenance::Section;
use crate::config::resolve::{resolve_config, CliOverrides};
use crate::config::show::{render_explain, render_show};
use crate::errors::{PysurveyError, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Project directory to resolve from (defaults to current directory)
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show every resolved setting and the layer it came from
    Show,
    /// Show the settings of one section
    Explain {
        #[arg(value_enum)]
        section: Section,
    },
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    let working_dir = working_dir(args.path.as_deref())?;
    let config = resolve_config(&working_dir, &CliOverrides::default())?;

    let mut stdout = std::io::stdout().lock();
    match args.action {
        ConfigAction::Show => render_show(&mut stdout, &config)?,
        ConfigAction::Explain { section } => render_explain(&mut stdout, &config, section)?,
    }
    Ok(())
}

fn working_dir(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| Path::new("."));
    if !path.is_dir() {
        return Err(PysurveyError::Config(format!(
            "Not a directory: {}",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}
