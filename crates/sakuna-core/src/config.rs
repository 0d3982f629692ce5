//! Sakuna Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults that work against a local checkout of the reference data.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Reference gazetteer graph
    pub gazetteer: GazetteerConfig,

    /// Disaster-type taxonomy graph
    pub taxonomy: TaxonomyConfig,

    /// Text-embedding oracle
    pub embedding: EmbeddingConfig,

    /// Table recovery geometry
    pub parser: ParserConfig,

    /// Location resolver
    pub resolver: ResolverConfig,

    /// Batch processing
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SAKUNA_GAZETTEER") {
            config.gazetteer.path = PathBuf::from(path);
        }
        if let Ok(namespace) = std::env::var("SAKUNA_NAMESPACE") {
            config.gazetteer.namespace = namespace.clone();
            config.taxonomy.namespace = namespace;
        }
        if let Ok(path) = std::env::var("SAKUNA_TAXONOMY") {
            config.taxonomy.path = PathBuf::from(path);
        }

        // Pipeline
        if let Ok(dir) = std::env::var("SAKUNA_INPUT_DIR") {
            config.pipeline.input_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("SAKUNA_OUTPUT_DIR") {
            config.pipeline.output_dir = PathBuf::from(dir);
        }
        if let Ok(workers) = std::env::var("SAKUNA_WORKERS") {
            config.pipeline.workers = workers.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SAKUNA_WORKERS".to_string(),
                value: workers,
            })?;
        }

        // Embedding
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider.parse()?;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.embedding.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.embedding.ollama_url = url;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env = Self::from_env()?;
        let defaults = Self::default();

        if env.gazetteer.path != defaults.gazetteer.path {
            self.gazetteer.path = env.gazetteer.path;
        }
        if env.gazetteer.namespace != defaults.gazetteer.namespace {
            self.gazetteer.namespace = env.gazetteer.namespace;
            self.taxonomy.namespace = env.taxonomy.namespace;
        }
        if env.taxonomy.path != defaults.taxonomy.path {
            self.taxonomy.path = env.taxonomy.path;
        }
        if env.pipeline.input_dir != defaults.pipeline.input_dir {
            self.pipeline.input_dir = env.pipeline.input_dir;
        }
        if env.pipeline.output_dir != defaults.pipeline.output_dir {
            self.pipeline.output_dir = env.pipeline.output_dir;
        }
        if env.pipeline.workers != defaults.pipeline.workers {
            self.pipeline.workers = env.pipeline.workers;
        }
        if env.embedding.provider != defaults.embedding.provider {
            self.embedding.provider = env.embedding.provider;
        }
        if env.embedding.model != defaults.embedding.model {
            self.embedding.model = env.embedding.model;
        }
        if env.embedding.ollama_url != defaults.embedding.ollama_url {
            self.embedding.ollama_url = env.embedding.ollama_url;
        }
        if env.logging.level != defaults.logging.level {
            self.logging.level = env.logging.level;
        }

        // Always use env for sensitive values
        if env.embedding.openai_api_key.is_some() {
            self.embedding.openai_api_key = env.embedding.openai_api_key;
        }

        Ok(self)
    }
}

/// Gazetteer graph location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// N-Triples file with Region/Province/Municipality nodes
    pub path: PathBuf,

    /// Namespace of division IRIs and gazetteer vocabulary
    pub namespace: String,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("triples/psgc_rdf.nt"),
            namespace: "https://sakuna.ph/".to_string(),
        }
    }
}

/// Disaster taxonomy graph location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// N-Triples file with the disaster-type class hierarchy
    pub path: PathBuf,

    /// Namespace of the taxonomy classes
    pub namespace: String,

    /// Local name of the taxonomy root class
    pub root_class: String,

    /// Event type used when nothing can be classified
    pub default_event_type: String,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ontology/sakunagraph.nt"),
            namespace: "https://sakuna.ph/".to_string(),
            root_class: "DisasterType".to_string(),
            default_event_type: "MiscellaneousAccidentGeneral".to_string(),
        }
    }
}

/// Embedding oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,

    /// Model name for remote providers
    pub model: String,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Vector dimension of the local hashing embedder
    pub dimension: usize,

    /// Maximum number of cached text embeddings
    pub cache_capacity: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: "nomic-embed-text".to_string(),
            openai_api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            dimension: 512,
            cache_capacity: 10_000,
            timeout_secs: 60,
        }
    }
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local feature-hashing embedder (no network)
    Hashing,
    OpenAI,
    Ollama,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" | "local" => Ok(Self::Hashing),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Geometry constants used by table recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// How far above a table to look for an inline title (points)
    pub header_search_distance: f32,

    /// Margin tolerance for cell text alignment (points)
    pub alignment_tolerance: f32,

    /// Fraction of the page height counted as "top of page"
    pub title_top_fraction: f32,

    /// Height of the bottom band scanned for pending titles (points)
    pub bottom_band_height: f32,

    /// Number of leading rows examined for header detection
    pub max_header_rows: usize,

    /// Vertical tolerance when grouping words into lines (points)
    pub line_tolerance: f32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            header_search_distance: 80.0,
            alignment_tolerance: 5.0,
            title_top_fraction: 0.3,
            bottom_band_height: 150.0,
            max_header_rows: 8,
            line_tolerance: 3.0,
        }
    }
}

/// Location resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// String similarity used for fuzzy matching
    pub scorer: ScorerKind,
}

/// Available fuzzy scorers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Indel ratio over sorted tokens
    #[default]
    TokenSortRatio,
    /// Normalised Levenshtein over sorted tokens
    TokenSortLevenshtein,
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory of page-layout JSON documents
    pub input_dir: PathBuf,

    /// Directory receiving one folder per processed report
    pub output_dir: PathBuf,

    /// Maximum documents processed concurrently
    pub workers: usize,

    /// Table title holding the incident list
    pub incidents_table: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw/ndrrmc"),
            output_dir: PathBuf::from("data/parsed/ndrrmc"),
            workers: 4,
            incidents_table: "related_incidents".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
