//! Shared state handed to every job task.

use std::sync::Arc;

use crate::downloader::ProgressSender;
use crate::extract::{DynamicExtractor, NetworkObserver};
use crate::fetch::PageFetcher;
use crate::url_model::FilenameRegistry;

use super::BatchSettings;

pub struct PipelineContext {
    pub settings: BatchSettings,
    pub fetcher: Arc<dyn PageFetcher>,
    /// Present only when the dynamic fallback was requested and an observer supplied.
    pub dynamic: Option<DynamicExtractor>,
    pub filenames: FilenameRegistry,
    pub progress: Option<ProgressSender>,
}

impl PipelineContext {
    pub fn new(settings: BatchSettings, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            settings,
            fetcher,
            dynamic: None,
            filenames: FilenameRegistry::new(),
            progress: None,
        }
    }

    /// Attach a browser observer. Ignored unless `use_dynamic_fallback` is set.
    pub fn with_dynamic(mut self, observer: Arc<dyn NetworkObserver>) -> Self {
        if self.settings.use_dynamic_fallback {
            self.dynamic = Some(DynamicExtractor::new(observer));
        }
        self
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }
}
