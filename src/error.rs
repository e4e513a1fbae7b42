use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxaError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("NCBI request failed: {0}")]
    Http(String),

    #[error("NCBI returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("taxonomy search returned no ids for query: {0}")]
    NotFound(String),

    #[error("taxonomy search returned {count} ids for query {query}, expected one")]
    Ambiguous { query: String, count: usize },

    #[error("taxonomy search returned a non-numeric id: {0}")]
    MalformedId(String),

    #[error("failed to parse taxonomy record: {0}")]
    Parse(String),

    #[error("failed to parse cache JSON: {0}")]
    CacheParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl TaxaError {
    // Transient failures: retried by the transport wrapper.
    pub fn is_transient(&self) -> bool {
        matches!(self, TaxaError::Http(_) | TaxaError::Status { .. })
    }

    // The per-name subset the batch loop is allowed to catch and record.
    // Everything else aborts the run.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            TaxaError::Http(_)
                | TaxaError::Status { .. }
                | TaxaError::NotFound(_)
                | TaxaError::Ambiguous { .. }
                | TaxaError::MalformedId(_)
                | TaxaError::Parse(_)
        )
    }
}
