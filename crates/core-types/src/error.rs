use thiserror::Error;

/// Any error a caller-supplied generator may report.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Source(#[from] BoxError),
}
