pub mod aggregate;
pub mod pipeline;

pub use aggregate::{aggregate, FileOutcome, ProjectReport, Totals};
pub use pipeline::{CancelToken, Pipeline};
