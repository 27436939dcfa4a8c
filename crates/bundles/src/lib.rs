pub mod app;
pub mod domain;
pub mod infra;

pub use app::pipeline::{CompileOutcome, Compiler};
pub use domain::errors::{BundlesError, Diagnostic};

pub fn init(verbosity: u8) {
    infra::logging::init(verbosity);
}
