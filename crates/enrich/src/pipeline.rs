//! The enrichment pipeline: one optional slot per adapter kind, gathered
//! concurrently per turn.
//!
//! Knowledge and linguistic annotations feed their own prompt segments;
//! auxiliary adapters (entity recognition and friends) are concatenated in
//! declaration order into a single advisory block.

use charloom_config::AdaptersConfig;
use charloom_core::enrichment::{Classifier, Enrichment};
use std::sync::Arc;
use std::time::Duration;

use crate::http::HttpClassifier;

/// Holds the configured adapters. Every slot is optional; an empty pipeline
/// yields an empty [`Enrichment`] without any network traffic.
#[derive(Default)]
pub struct EnrichmentPipeline {
    emotion: Option<Arc<dyn Classifier>>,
    sentiment: Option<Arc<dyn Classifier>>,
    knowledge: Option<Arc<dyn Classifier>>,
    linguistic: Option<Arc<dyn Classifier>>,
    /// Auxiliary annotators, concatenated in declaration order.
    aux: Vec<Arc<dyn Classifier>>,
}

impl EnrichmentPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline from adapter configuration; unset endpoints leave
    /// their slot disabled.
    pub fn from_config(config: &AdaptersConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = |name: &str, url: &Option<String>| -> Option<Arc<dyn Classifier>> {
            url.as_ref()
                .map(|u| Arc::new(HttpClassifier::new(name, u.clone(), timeout)) as Arc<dyn Classifier>)
        };

        let mut pipeline = Self::new();
        pipeline.emotion = http("emotion", &config.emotion_url);
        pipeline.sentiment = http("sentiment", &config.sentiment_url);
        pipeline.knowledge = http("knowledge", &config.knowledge_url);
        pipeline.linguistic = http("linguistic", &config.linguistic_url);
        if let Some(entities) = http("entities", &config.entity_url) {
            pipeline.aux.push(entities);
        }
        pipeline
    }

    pub fn with_emotion(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.emotion = Some(classifier);
        self
    }

    pub fn with_sentiment(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.sentiment = Some(classifier);
        self
    }

    pub fn with_knowledge(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.knowledge = Some(classifier);
        self
    }

    pub fn with_linguistic(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.linguistic = Some(classifier);
        self
    }

    pub fn with_aux(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.aux.push(classifier);
        self
    }

    /// Run every configured adapter concurrently and collect contributions.
    /// Adapters that fail or are disabled simply contribute nothing.
    pub async fn gather(&self, text: &str) -> Enrichment {
        let (emotion, sentiment, knowledge, linguistic, aux_outputs) = tokio::join!(
            run_slot(&self.emotion, text),
            run_slot(&self.sentiment, text),
            run_slot(&self.knowledge, text),
            run_slot(&self.linguistic, text),
            run_aux(&self.aux, text),
        );

        let nlp_insights = if aux_outputs.is_empty() {
            None
        } else {
            Some(aux_outputs.join("\n"))
        };

        Enrichment {
            emotion,
            sentiment,
            knowledge,
            linguistic,
            nlp_insights,
        }
    }
}

async fn run_slot(slot: &Option<Arc<dyn Classifier>>, text: &str) -> Option<String> {
    match slot {
        Some(classifier) => classifier.classify(text).await,
        None => None,
    }
}

async fn run_aux(adapters: &[Arc<dyn Classifier>], text: &str) -> Vec<String> {
    let futures = adapters.iter().map(|a| a.classify(text));
    futures::future::join_all(futures)
        .await
        .into_iter()
        .flatten()
        .collect()
}
