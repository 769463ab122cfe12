use crate::analysis::Analyzer;
use crate::config::resolve::{resolve_config, CliOverrides};
use crate::config::ResolvedConfig;
use crate::errors::{PysurveyError, Result};
use crate::output::json::Metadata;
use crate::output::OutputFormat;
use crate::report::{CancelToken, Pipeline, ProjectReport};
use crate::walk;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Directory or Python file to analyze
    pub path: PathBuf,

    /// Output format
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

impl AnalyzeArgs {
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

/// A finished analysis run, shared by `analyze` and `graph`.
pub struct Survey {
    pub config: ResolvedConfig,
    pub format: OutputFormat,
    pub report: ProjectReport,
    pub metadata: Metadata,
}

/// Resolve config, discover files and run the pipeline over them.
pub fn survey(path: &Path, overrides: &CliOverrides) -> Result<Survey> {
    let start = Instant::now();

    let target = path.canonicalize().map_err(|_| PysurveyError::NoFiles {
        path: path.to_path_buf(),
    })?;
    // Report paths are relative to the directory being surveyed.
    let root = if target.is_file() {
        target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| target.clone())
    } else {
        target.clone()
    };

    let config = resolve_config(&root, overrides)?;
    let format: OutputFormat = config
        .format
        .parse()
        .map_err(PysurveyError::Config)?;

    let mut files = walk::discover_files(&target, &config.include, &config.exclude)?;
    let discovered = files.len();
    files.retain(|file| !config.is_ignored(file));
    if files.len() < discovered {
        tracing::debug!(ignored = discovered - files.len(), "dropped files matched by .pysurveyignore");
    }
    if files.is_empty() {
        return Err(PysurveyError::NoFiles { path: target });
    }

    let progress = if !config.quiet {
        let pb = indicatif::ProgressBar::new(files.len() as u64);
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let pipeline = Pipeline::new(Analyzer::new(config.analysis_options()), config.jobs);
    let report = pipeline.run(&files, &root, &CancelToken::new(), &|| {
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let files_parsed = report.totals.files_analyzed;
    let files_per_second = if elapsed_ms > 0 {
        files_parsed as f64 / (elapsed_ms as f64 / 1000.0)
    } else {
        0.0
    };
    let metadata = Metadata {
        root: root.clone(),
        files_discovered: files.len(),
        files_parsed,
        files_failed: report.totals.files_failed,
        files_skipped: report.totals.files_skipped,
        timestamp: unix_now(),
        elapsed_ms,
        files_per_second: (files_per_second * 10.0).round() / 10.0,
    };

    Ok(Survey {
        config,
        format,
        report,
        metadata,
    })
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let Survey {
        config,
        format,
        report,
        metadata,
    } = survey(&args.path, &args.to_cli_overrides())?;

    let mut stdout = std::io::stdout().lock();

    match format {
        OutputFormat::Json => {
            crate::output::json::write_analyze_json(&mut stdout, &report, metadata.clone())?;
        }
        OutputFormat::Text => {
            crate::output::text::write_analyze_text(&mut stdout, &report, &metadata)?;
        }
        OutputFormat::Dot => {
            let graph = crate::graph::build_call_graph(&report);
            crate::output::dot::write_dot(&mut stdout, &graph)?;
        }
    }

    if !config.quiet && format != OutputFormat::Text {
        eprintln!(
            "Analyzed {} files ({} failed, {} endpoints, {} client calls, {} diagnostics) in {:.2}s",
            metadata.files_parsed,
            metadata.files_failed,
            report.totals.endpoints,
            report.totals.client_calls,
            report.totals.diagnostics,
            metadata.elapsed_ms as f64 / 1000.0,
        );
    }

    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
