use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PysurveyError {
    #[error("No Python files found in {path}")]
    #[diagnostic(code(pysurvey::no_files))]
    NoFiles { path: PathBuf },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(pysurvey::config))]
    Config(String),

    #[error("Could not start worker pool: {0}")]
    #[diagnostic(code(pysurvey::thread_pool))]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    #[diagnostic(code(pysurvey::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(pysurvey::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(pysurvey::glob))]
    Glob(#[from] globset::Error),
}

pub type Result<T> = std::result::Result<T, PysurveyError>;
