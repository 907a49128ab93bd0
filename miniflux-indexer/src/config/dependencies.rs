//! Dependency initialization and wiring for the miniflux indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::StartArgs;
use crate::IndexingError;
use miniflux_indexer_pipeline::processor::JiebaTokenizerFactory;
use miniflux_indexer_pipeline::{Orchestrator, PipelineConfig};
use miniflux_indexer_repository::postgres::redact_url;
use miniflux_indexer_repository::{PgEntrySource, PgIndexInfoStore, StoreConnectOptions};
use miniflux_indexer_shared::BuildInfo;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    entry_source: Arc<PgEntrySource>,
    index_info: Arc<PgIndexInfoStore>,
}

impl Dependencies {
    /// Initialize all dependencies from the `start` arguments.
    ///
    /// The configuration and the user dictionary are checked before any
    /// store is contacted. Both stores must answer within the connect
    /// deadline, and the `index_info` table is created if it is missing.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the configuration is invalid or a store is
    ///   unreachable
    pub async fn new(args: &StartArgs, build_info: BuildInfo) -> Result<Self, IndexingError> {
        let config = args.pipeline_config();
        config.validate()?;

        let tokenizer_factory = match &args.user_dictionary {
            Some(path) => JiebaTokenizerFactory::with_user_dictionary_file(path)?,
            None => JiebaTokenizerFactory::new(),
        };

        info!(
            metadata_store = %redact_url(&args.database_url),
            source_store = %redact_url(&args.miniflux_database_url),
            workers = config.workers,
            batch_size = config.batch_size,
            reindex = config.reindex,
            "Initializing dependencies"
        );

        let connect_options = StoreConnectOptions::for_workers(config.workers);

        let index_info = PgIndexInfoStore::connect(&args.database_url, &connect_options).await?;
        index_info.ensure_schema().await?;
        info!("Metadata store connection verified");

        let entry_source =
            match PgEntrySource::connect(&args.miniflux_database_url, &connect_options).await {
                Ok(source) => source,
                Err(e) => {
                    index_info.close().await;
                    return Err(e.into());
                }
            };
        info!("Source store connection verified");

        Ok(Self::from_stores(
            Arc::new(entry_source),
            Arc::new(index_info),
            tokenizer_factory,
            build_info,
            config,
        ))
    }

    fn from_stores(
        entry_source: Arc<PgEntrySource>,
        index_info: Arc<PgIndexInfoStore>,
        tokenizer_factory: JiebaTokenizerFactory,
        build_info: BuildInfo,
        config: PipelineConfig,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            entry_source.clone(),
            index_info.clone(),
            Arc::new(tokenizer_factory),
            build_info,
            config,
        );

        Self {
            orchestrator,
            entry_source,
            index_info,
        }
    }

    /// Close both connection pools.
    pub async fn close(&self) {
        self.entry_source.close().await;
        self.index_info.close().await;
    }
}
