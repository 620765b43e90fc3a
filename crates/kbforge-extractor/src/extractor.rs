//! Core extraction pipeline

use crate::chunking::plan_spans;
use crate::config::ExtractorConfig;
use crate::document::GraphDocument;
use crate::error::ExtractorError;
use crate::knowledge::KnowledgeAggregator;
use crate::parser::parse_relations;
use crate::types::{Extraction, ExtractionStats};
use kbforge_domain::traits::RelationModel;
use kbforge_domain::ContentItem;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives the model over every span of every item and aggregates the triples
///
/// The model is shared, never mutated, and may be reused across many runs.
/// Each call to [`extract`](Self::extract) owns a fresh aggregator.
pub struct RelationExtractor<M> {
    model: Arc<M>,
    config: ExtractorConfig,
}

impl<M> Clone for RelationExtractor<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            config: self.config.clone(),
        }
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), ExtractorError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(ExtractorError::Timeout),
        _ => Ok(()),
    }
}

impl<M> RelationExtractor<M>
where
    M: RelationModel,
    M::Error: Display,
{
    /// Create a new extractor owning its model
    pub fn new(model: M, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(model), config)
    }

    /// Create an extractor over an already shared model
    pub fn from_shared(model: Arc<M>, config: ExtractorConfig) -> Self {
        Self { model, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a knowledge graph from a corpus, in corpus order
    ///
    /// `deadline` is checked before every span; passing it aborts the run with
    /// [`ExtractorError::Timeout`] and no graph.
    pub fn extract(
        &self,
        corpus: &[ContentItem],
        deadline: Option<Instant>,
    ) -> Result<Extraction, ExtractorError> {
        self.config.validate().map_err(ExtractorError::Config)?;

        let start_time = Instant::now();
        let mut aggregator = KnowledgeAggregator::new();
        let mut stats = ExtractionStats::default();

        info!("Starting extraction over {} items", corpus.len());

        for item in corpus {
            self.extract_item(item, &mut aggregator, &mut stats, deadline)?;
        }

        stats.processing_time_ms = start_time.elapsed().as_millis() as u64;
        let graph = aggregator.into_graph();
        stats.relations = graph.len();

        info!(
            "Extraction complete: {} relations ({} provenance entries) from {} spans ({} model calls, {} ms)",
            graph.len(),
            graph.provenance_count(),
            stats.spans,
            stats.model_calls,
            stats.processing_time_ms
        );

        Ok(Extraction { graph, stats })
    }

    /// Extract and serialize the graph to the stored JSON artifact
    pub fn extract_to_json(
        &self,
        corpus: &[ContentItem],
        deadline: Option<Instant>,
    ) -> Result<(String, ExtractionStats), ExtractorError> {
        let extraction = self.extract(corpus, deadline)?;
        let json = GraphDocument::from_graph(&extraction.graph, self.config.include_item_ids)
            .to_json()?;
        Ok((json, extraction.stats))
    }

    /// Run every span of one item through the model into `aggregator`
    pub fn extract_item(
        &self,
        item: &ContentItem,
        aggregator: &mut KnowledgeAggregator,
        stats: &mut ExtractionStats,
        deadline: Option<Instant>,
    ) -> Result<(), ExtractorError> {
        check_deadline(deadline)?;

        let tokens = self
            .model
            .tokenize(&item.text)
            .map_err(|e| ExtractorError::Model(e.to_string()))?;
        if tokens.input_ids.len() != tokens.attention_mask.len() {
            return Err(ExtractorError::Model(format!(
                "tokenizer returned {} ids but {} mask entries for item {}",
                tokens.input_ids.len(),
                tokens.attention_mask.len(),
                item.id
            )));
        }

        let plan = plan_spans(tokens.len(), self.config.span_length);
        stats.items += 1;
        stats.spans += plan.len();

        debug!(
            "Item {}: {} tokens, {} spans, overlap {}",
            item.id,
            tokens.len(),
            plan.len(),
            plan.overlap
        );

        let expected = self.config.num_return_sequences as usize;

        for boundary in &plan.boundaries {
            check_deadline(deadline)?;

            let range = boundary.clip(tokens.len());
            if range.is_empty() {
                debug!("Item {}: skipping empty span {}", item.id, boundary);
                continue;
            }

            let request = self.config.generation_request(
                &tokens.input_ids[range.clone()],
                &tokens.attention_mask[range],
            );
            let decoded = self
                .model
                .generate(&request)
                .map_err(|e| ExtractorError::Model(e.to_string()))?;
            stats.model_calls += 1;

            if decoded.len() != expected {
                warn!(
                    "Item {} span {}: expected {} sequences, model returned {}",
                    item.id,
                    boundary,
                    expected,
                    decoded.len()
                );
            }

            for sequence in &decoded {
                stats.sequences += 1;
                for triple in parse_relations(sequence) {
                    stats.triples_parsed += 1;
                    aggregator.insert(triple, item.id, *boundary);
                }
            }
        }

        Ok(())
    }
}
