//! Batch pipeline over a directory of report layouts
//!
//! Reference data is loaded once and shared read-only between document
//! tasks. Each document runs table recovery, event classification and
//! incident enrichment in order; a failing document is logged and
//! counted without touching its siblings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use sakuna_core::{AppConfig, Result, SakunaError};
use sakuna_extractor::{
    classify_event, DisasterClassifier, DisasterTaxonomy, GazetteerIndex, IncidentEnricher,
    LocationResolver,
};
use sakuna_parser::{ParsedReport, ParserRegistry, ReportParser};
use sakuna_vector::{create_embedding_client, CachedEmbedding, EmbeddingClient};
use serde_json::{json, Value};

use crate::output::{write_report, ReportOutput};

/// Load the gazetteer and build a resolver over it
pub fn load_resolver(config: &AppConfig) -> Result<Arc<LocationResolver>> {
    let gazetteer = GazetteerIndex::load(&config.gazetteer)?;
    Ok(Arc::new(LocationResolver::from_config(
        Arc::new(gazetteer),
        &config.resolver,
    )))
}

/// Load the taxonomy and embed its category definitions
pub async fn load_classifier(config: &AppConfig) -> Result<Arc<DisasterClassifier>> {
    let taxonomy = DisasterTaxonomy::load(&config.taxonomy)?;
    let inner = create_embedding_client(&config.embedding)?;
    let client: Arc<dyn EmbeddingClient> =
        Arc::new(CachedEmbedding::new(inner, config.embedding.cache_capacity));

    Ok(Arc::new(DisasterClassifier::new(taxonomy, client).await?))
}

/// Outcome of a batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// All `*.json` layouts in `dir`, sorted by file name
pub fn collect_documents(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let registry = ParserRegistry::default();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && registry.find_parser(path).is_some())
        .collect();
    paths.sort();
    Ok(paths)
}

fn document_error(path: &Path, message: impl std::fmt::Display) -> SakunaError {
    SakunaError::Document {
        document: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Report name recorded for a layout: its source PDF, else the file stem
pub fn report_name(path: &Path, source: Option<&str>) -> String {
    source
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|stem| format!("{stem}.pdf"))
        })
        .unwrap_or_default()
}

/// Shared, read-only state of one batch run
pub struct Pipeline {
    config: AppConfig,
    registry: ParserRegistry,
    parser: ReportParser,
    classifier: Arc<DisasterClassifier>,
    enricher: IncidentEnricher,
}

impl Pipeline {
    pub fn new(
        config: AppConfig,
        resolver: Arc<LocationResolver>,
        classifier: Arc<DisasterClassifier>,
    ) -> Self {
        Self {
            parser: ReportParser::new(config.parser.clone()),
            registry: ParserRegistry::default(),
            enricher: IncidentEnricher::new(resolver, Arc::clone(&classifier)),
            classifier,
            config,
        }
    }

    /// Load every piece of reference data named by `config`
    pub async fn load(config: AppConfig) -> Result<Self> {
        let resolver = load_resolver(&config)?;
        let classifier = load_classifier(&config).await?;
        Ok(Self::new(config, resolver, classifier))
    }

    /// Parse one layout file into a report
    pub fn parse_document(&self, path: &Path) -> Result<ParsedReport> {
        let layout = self
            .registry
            .parse(path)
            .map_err(|e| document_error(path, e))?;

        let name = report_name(path, layout.source.as_deref());
        Ok(self.parser.parse(&layout, &name))
    }

    /// Run one document through every stage without writing anything
    pub async fn process_document(&self, path: &Path) -> Result<ReportOutput> {
        let report = self.parse_document(path)?;
        let metadata = &report.metadata;

        let event_type = classify_event(
            Some(self.classifier.as_ref()),
            &self.config.taxonomy.default_event_type,
            &metadata.event_name,
            &metadata.report_name,
            &metadata.remarks,
        )
        .await;

        let incidents_title = &self.config.pipeline.incidents_table;
        let enriched = match report.tables.get(incidents_title) {
            Some(table) => {
                let rows = self
                    .enricher
                    .enrich(&table.rows, &table.header.column_name(0), &metadata.event_name)
                    .await
                    .map_err(|e| document_error(path, e))?;
                let rows = serde_json::to_value(rows).map_err(|e| document_error(path, e))?;
                Some((incidents_title.clone(), rows))
            }
            None => None,
        };

        let tables = report
            .tables
            .tables
            .iter()
            .map(|t| serde_json::to_value(&t.rows).map(|rows| (t.title.clone(), rows)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| document_error(path, e))?;

        let mut event = metadata.event_json();
        if let Value::Object(fields) = &mut event {
            fields.insert("hasType".to_string(), json!(event_type));
        }

        Ok(ReportOutput {
            event_name: metadata.event_name.clone(),
            report_name: metadata.report_name.clone(),
            report_id: metadata.id.to_string(),
            tables,
            metadata: event,
            source: metadata.source_json(),
            enriched,
        })
    }

    async fn process_and_write(&self, path: &Path) -> Result<PathBuf> {
        let output = self.process_document(path).await?;
        write_report(&self.config.pipeline.output_dir, &output).map_err(|e| document_error(path, e))
    }

    /// Process every document in the input directory
    pub async fn run(self: Arc<Self>) -> anyhow::Result<BatchSummary> {
        let input_dir = self.config.pipeline.input_dir.clone();
        let documents = collect_documents(&input_dir)?;
        let workers = self.config.pipeline.workers.max(1);
        tracing::info!(
            "Processing {} documents from {} with {} workers",
            documents.len(),
            input_dir.display(),
            workers
        );

        let results: Vec<(PathBuf, Result<PathBuf>)> = stream::iter(documents)
            .map(|path| {
                let pipeline = Arc::clone(&self);
                async move {
                    let task_path = path.clone();
                    let handle =
                        tokio::spawn(async move { pipeline.process_and_write(&task_path).await });
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(document_error(&path, e)),
                    };
                    (path, result)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut summary = BatchSummary::default();
        for (path, result) in results {
            match result {
                Ok(target) => {
                    summary.succeeded += 1;
                    tracing::info!("{} -> {}", path.display(), target.display());
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("{}", e);
                }
            }
        }

        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }
}
