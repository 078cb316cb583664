use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// The embedding provider failed to produce a query vector
    #[error("Error generating query embedding: {0}")]
    Retrieval(#[source] Box<RagError>),

    /// The vector store could not be reached or answered with garbage
    #[error("Error searching documents in the vector store: {0}")]
    Connectivity(#[source] Box<RagError>),

    #[error("Error generating response: {0}")]
    Generation(#[source] Box<RagError>),

    #[error("Query is empty")]
    EmptyInput,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error ({status}): {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn retrieval(cause: Self) -> Self {
        Self::Retrieval(Box::new(cause))
    }

    pub fn connectivity(cause: Self) -> Self {
        Self::Connectivity(Box::new(cause))
    }

    pub fn generation(cause: Self) -> Self {
        Self::Generation(Box::new(cause))
    }

    /// Errors caused by the caller's input rather than by the service
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InvalidQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
