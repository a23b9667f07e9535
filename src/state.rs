//! Shared application state.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::LinkService;
use crate::domain::repositories::LinkRepository;
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::LinkCache;

/// Dependency bundle handed to the embedding transport layer.
///
/// All handles are explicitly constructed and injected (no ambient
/// globals); tests swap in mocks or the in-process cache through the same
/// seams.
pub struct AppState<R: LinkRepository> {
    pub links: Arc<LinkService<R>>,
    pub cache: Arc<dyn LinkCache>,
    pub visit_tx: mpsc::Sender<VisitEvent>,
}

// Manual impl: every field is a shared handle, so `R: Clone` is not required.
impl<R: LinkRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
            cache: self.cache.clone(),
            visit_tx: self.visit_tx.clone(),
        }
    }
}
