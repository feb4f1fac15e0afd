//! Source adapters (C3).
//!
//! Each adapter implements [`SourceAdapter`] and is invoked by the
//! coordinator (`pipeline.rs`) through a `dyn SourceAdapter` table, one
//! task per active source, fanned out over a worker pool of 5.
//!
//! An adapter never raises for upstream failures: whatever items it
//! managed to collect before a failure are returned alongside an
//! `error` string, per §4.3/§4.9.

pub mod arxiv;
pub mod biorxiv;
pub mod huggingface;
pub mod openalex;
pub mod pubmed;
pub mod semanticscholar;
mod xml_util;

use async_trait::async_trait;

use crate::config::PipelineConfig;
use crate::schema::{Item, TopicQuery};
use crate::transport::Transport;

/// What a single adapter invocation produced: partial or full results,
/// plus an optional error describing what went wrong.
#[derive(Debug, Default)]
pub struct AdapterOutcome {
    pub items: Vec<Item>,
    pub error: Option<String>,
}

impl AdapterOutcome {
    fn ok(items: Vec<Item>) -> Self {
        AdapterOutcome { items, error: None }
    }

    fn failed(items: Vec<Item>, error: impl Into<String>) -> Self {
        AdapterOutcome {
            items,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome;
}
