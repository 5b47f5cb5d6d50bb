//! Process-wide holder building the assessment engine exactly once.

use super::assessment::{EngineError, QualityAssessment};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

type EngineBuilder = Box<dyn Fn() -> Result<QualityAssessment, EngineError> + Send + Sync>;

/// Lazily constructed, shared [`QualityAssessment`].
///
/// The first caller builds the engine under an async mutex; later callers read it without
/// locking. A failed build is not cached, so the next caller retries.
pub struct EngineHolder {
    engine: OnceLock<Arc<QualityAssessment>>,
    init_lock: Mutex<()>,
    builder: EngineBuilder,
}

impl EngineHolder {
    /// Create a holder that builds its engine with `builder` on first use.
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn() -> Result<QualityAssessment, EngineError> + Send + Sync + 'static,
    {
        Self {
            engine: OnceLock::new(),
            init_lock: Mutex::new(()),
            builder: Box::new(builder),
        }
    }

    /// Return the engine, building it on first use.
    pub async fn get_or_init(&self) -> Result<Arc<QualityAssessment>, EngineError> {
        if let Some(engine) = self.engine.get() {
            return Ok(Arc::clone(engine));
        }

        let _guard = self.init_lock.lock().await;
        if let Some(engine) = self.engine.get() {
            return Ok(Arc::clone(engine));
        }

        tracing::info!("Instantiating document quality engine");
        let engine = Arc::new((self.builder)()?);
        let _ = self.engine.set(Arc::clone(&engine));
        Ok(engine)
    }

    /// Engine if it has already been built.
    pub fn get(&self) -> Option<Arc<QualityAssessment>> {
        self.engine.get().cloned()
    }
}
