//! Enrichment capability — best-effort contextual annotations.
//!
//! External classification is inherently unreliable and latent, so every
//! adapter is modeled as `classify(text) -> Option<label>`: the implementation
//! itself absorbs all transport and parse failures and returns "no
//! contribution" rather than propagating. The composer's logic stays free of
//! error handling for enrichment.

use async_trait::async_trait;

/// A best-effort text classifier / annotator.
///
/// Implementations must never return an error and never block the turn
/// beyond their own short timeout: any failure is `None`.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// A human-readable name for this adapter (e.g. "emotion", "sentiment").
    fn name(&self) -> &str;

    /// Classify or annotate the text. `None` means "no contribution".
    async fn classify(&self, text: &str) -> Option<String>;
}

/// The gathered per-turn enrichment, every field optional by construction.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Discrete emotion label; also pushed onto the emotion history.
    pub emotion: Option<String>,
    /// Discrete sentiment label; this turn only, never persisted.
    pub sentiment: Option<String>,
    /// Lightweight knowledge lookup result.
    pub knowledge: Option<String>,
    /// Figurative-language / sarcasm annotation.
    pub linguistic: Option<String>,
    /// Concatenated auxiliary annotations (entities etc.), fixed order.
    pub nlp_insights: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.emotion.is_none()
            && self.sentiment.is_none()
            && self.knowledge.is_none()
            && self.linguistic.is_none()
            && self.nlp_insights.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enrichment_is_empty() {
        assert!(Enrichment::default().is_empty());
        let enrichment = Enrichment {
            sentiment: Some("positive".into()),
            ..Enrichment::default()
        };
        assert!(!enrichment.is_empty());
    }
}
