use std::path::Path;

use config::Config;
use config::File;
use config::FileFormat;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::errors::RagError;

/// Default OpenAI-compatible API base
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Environment variables that override the file configuration, and the key each one sets
pub const ENV_OVERRIDES: [(&str, &str); 6] = [
    ("OPENAI_API_KEY", "llm.api_key"),
    ("SUPABASE_URL", "vector_store.url"),
    ("SUPABASE_KEY", "vector_store.key"),
    ("SUPABASE_COLLECTION_NAME", "vector_store.collection_name"),
    ("EMBEDDING_MODEL", "embeddings.model"),
    ("LLM_MODEL", "llm.model"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

fn default_openai_endpoint() -> String {
    DEFAULT_OPENAI_ENDPOINT.to_string()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            endpoint: default_openai_endpoint(),
        }
    }
}

/// Chat completion provider. The API key is shared with the embeddings client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            api_key: None,
            model: default_llm_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Supabase project URL
    #[serde(default)]
    pub url: Option<String>,
    /// Supabase service or anon key
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Postgres function invoked through `/rest/v1/rpc/`
    #[serde(default = "default_match_function")]
    pub match_function: String,
    /// Table that receives answered queries; persistence is off when unset
    #[serde(default)]
    pub query_log_table: Option<String>,
}

fn default_collection_name() -> String {
    "documents".to_string()
}

fn default_match_function() -> String {
    "match_documents".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            collection_name: default_collection_name(),
            match_function: default_match_function(),
            query_log_table: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

const fn default_similarity_threshold() -> f32 {
    0.1
}

const fn default_max_sources() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_sources: default_max_sources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

const fn default_request_timeout() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from `config.toml` (if present) and the process environment
    pub fn load() -> crate::Result<Self> {
        Self::load_from(Some(Path::new("config.toml")), |name| std::env::var(name).ok())
    }

    /// Layer defaults, an optional TOML file and environment overrides.
    ///
    /// `env` resolves a variable name to its value; variables listed in
    /// [`ENV_OVERRIDES`] win over the file.
    pub fn load_from<F>(path: Option<&Path>, env: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::layered(path, false, env)
    }

    /// Like [`AppConfig::load_from`], but a missing file at `path` is an error
    pub fn load_required<F>(path: &Path, env: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::layered(Some(path), true, env)
    }

    fn layered<F>(path: Option<&Path>, required: bool, env: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder =
                builder.add_source(File::from(path).format(FileFormat::Toml).required(required));
        }

        for (var, key) in ENV_OVERRIDES {
            let value = env(var).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    pub fn llm_model(&self) -> &str {
        &self.llm.model
    }

    /// Provider credential shared by embeddings and generation
    pub fn api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Supabase URL after normalization
    pub fn supabase_url(&self) -> crate::Result<String> {
        let raw = self
            .vector_store
            .url
            .as_deref()
            .ok_or_else(|| RagError::Config("Supabase URL not provided".to_string()))?;
        normalize_supabase_url(raw)
    }

    pub fn supabase_key(&self) -> crate::Result<&str> {
        self.vector_store
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RagError::Config("Supabase API key not provided".to_string()))
    }
}

/// Strip trailing slashes and default to https when no scheme is given
pub fn normalize_supabase_url(raw: &str) -> crate::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(RagError::Config("Supabase URL not provided".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| RagError::Config(format!("Invalid Supabase URL '{candidate}': {e}")))?;
    if parsed.host_str().is_none() {
        return Err(RagError::Config(format!(
            "Invalid Supabase URL '{candidate}': missing host"
        )));
    }

    Ok(candidate)
}
