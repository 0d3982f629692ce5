//! Nearest-category text classification by embedding similarity

use std::sync::Arc;

use sakuna_core::{Classification, DisasterCategory, LoadError, Result, SakunaError};
use sakuna_vector::{argmax, EmbeddingClient, EmbeddingMatrix};

use crate::taxonomy::DisasterTaxonomy;

/// Classifies text into the closest leaf disaster category
///
/// Category embeddings are computed once at construction. Every call
/// returns the best category however weak the match; ties go to the
/// category that comes first in taxonomy order.
pub struct DisasterClassifier {
    client: Arc<dyn EmbeddingClient>,
    categories: Vec<DisasterCategory>,
    matrix: EmbeddingMatrix,
}

impl DisasterClassifier {
    pub async fn new(taxonomy: DisasterTaxonomy, client: Arc<dyn EmbeddingClient>) -> Result<Self> {
        let mut categories = taxonomy.into_categories();
        if categories.is_empty() {
            return Err(LoadError::Malformed("taxonomy has no categories".to_string()).into());
        }

        let definitions: Vec<String> = categories.iter().map(|c| c.definition.clone()).collect();
        let embeddings = embed_checked(client.as_ref(), &definitions).await?;
        let matrix = EmbeddingMatrix::from_rows(&embeddings)?;

        for (category, embedding) in categories.iter_mut().zip(embeddings) {
            category.embedding = embedding;
        }

        tracing::info!(
            "Classifier ready: {} categories, dimension {}",
            categories.len(),
            matrix.dimension()
        );

        Ok(Self {
            client,
            categories,
            matrix,
        })
    }

    pub fn categories(&self) -> &[DisasterCategory] {
        &self.categories
    }

    /// Classify texts with one batched embedding call, preserving order
    pub async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = embed_checked(self.client.as_ref(), texts).await?;
        embeddings
            .iter()
            .map(|embedding| self.best(embedding))
            .collect()
    }

    pub async fn classify_one(&self, text: &str) -> Result<Classification> {
        self.classify(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SakunaError::Embedding("No classification returned".to_string()))
    }

    /// Cosine similarity of `text` against every category, in taxonomy order
    pub async fn scores(&self, text: &str) -> Result<Vec<(String, f32)>> {
        let embedding = self.client.embed(text).await?;
        let similarities = self.matrix.similarities(&embedding)?;

        Ok(self
            .categories
            .iter()
            .zip(similarities)
            .map(|(c, s)| (c.label.clone(), s))
            .collect())
    }

    fn best(&self, embedding: &[f32]) -> Result<Classification> {
        let similarities = self.matrix.similarities(embedding)?;
        let (idx, score) = argmax(&similarities)
            .ok_or_else(|| SakunaError::Embedding("No categories to compare".to_string()))?;

        Ok(Classification {
            label: self.categories[idx].label.clone(),
            score,
        })
    }
}

async fn embed_checked(client: &dyn EmbeddingClient, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let embeddings = client.embed_batch(texts).await?;

    if embeddings.len() != texts.len() {
        return Err(SakunaError::Embedding(format!(
            "oracle returned {} vectors for {} texts",
            embeddings.len(),
            texts.len()
        )));
    }

    let dimension = client.dimension();
    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
        return Err(SakunaError::Embedding(format!(
            "oracle returned a vector of dimension {}, expected {dimension}",
            bad.len()
        )));
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sakuna_graph::{vocab, TripleStore};

    /// Maps a text to a fixed vector by keyword
    struct KeywordEmbedding {
        short_batch: bool,
    }

    #[async_trait]
    impl EmbeddingClient for KeywordEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            Ok(if text.contains("water") || text.contains("flood") {
                vec![1.0, 0.1, 0.0]
            } else if text.contains("shak") || text.contains("quake") {
                vec![0.0, 1.0, 0.1]
            } else if text.contains("either") {
                vec![1.0, 1.0, 0.0]
            } else {
                vec![0.0, 0.0, 0.0]
            })
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            if self.short_batch {
                out.pop();
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    fn taxonomy() -> DisasterTaxonomy {
        let ns = "https://sakuna.ph/";
        let source = format!(
            "<{ns}Flood> <{sub}> <{ns}DisasterType> .\n\
             <{ns}Flood> <{def}> \"Rising water\" .\n\
             <{ns}Earthquake> <{sub}> <{ns}DisasterType> .\n\
             <{ns}Earthquake> <{def}> \"Ground shaking\" .\n",
            sub = vocab::RDFS_SUBCLASS_OF,
            def = vocab::SKOS_DEFINITION,
        );
        let store = TripleStore::from_ntriples(&source).unwrap();
        DisasterTaxonomy::from_store(&store, &format!("{ns}DisasterType")).unwrap()
    }

    async fn classifier() -> DisasterClassifier {
        DisasterClassifier::new(taxonomy(), Arc::new(KeywordEmbedding { short_batch: false }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_classify_picks_nearest() {
        let classifier = classifier().await;
        let texts = vec!["flood in the lowlands".to_string(), "quake felt".to_string()];
        let out = classifier.classify(&texts).await.unwrap();

        assert_eq!(out[0].label, "Flood");
        assert!((out[0].score - 1.0).abs() < 1e-6);
        assert_eq!(out[1].label, "Earthquake");
        assert_eq!(classifier.categories()[0].embedding.len(), 3);
    }

    #[tokio::test]
    async fn test_ties_and_zero_vectors_take_first_category() {
        let classifier = classifier().await;

        let zero = classifier.classify_one("nothing in common").await.unwrap();
        assert_eq!(zero.label, "Flood");
        assert_eq!(zero.score, 0.0);

        let scores = classifier.scores("either").await.unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0, "Flood");
    }

    #[tokio::test]
    async fn test_empty_input() {
        let classifier = classifier().await;
        assert!(classifier.classify(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_taxonomy_is_load_error() {
        let result = DisasterClassifier::new(
            DisasterTaxonomy::new(Vec::new()),
            Arc::new(KeywordEmbedding { short_batch: false }),
        )
        .await;
        assert!(matches!(result, Err(SakunaError::Load(LoadError::Malformed(_)))));
    }

    #[tokio::test]
    async fn test_short_batch_is_error() {
        let result =
            DisasterClassifier::new(taxonomy(), Arc::new(KeywordEmbedding { short_batch: true })).await;
        assert!(matches!(result, Err(SakunaError::Embedding(_))));
    }
}
