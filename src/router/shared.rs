use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

use super::core::Router;

/// Cloneable handle to the serving router that can be replaced while requests
/// are in flight.
///
/// Readers take a snapshot with [`SharedRouter::load`] once per request and keep
/// using it even if a new router is stored meanwhile.
pub struct SharedRouter<H> {
    inner: Arc<ArcSwap<Router<H>>>,
}

impl<H> Clone for SharedRouter<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> SharedRouter<H> {
    #[must_use]
    pub fn new(router: Router<H>) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(router)),
        }
    }

    /// Snapshot of the current router
    #[must_use]
    pub fn load(&self) -> Arc<Router<H>> {
        self.inner.load_full()
    }

    /// Install `router` and return the one it replaced.
    pub fn replace(&self, router: Router<H>) -> Arc<Router<H>> {
        info!(routes_count = router.len(), "Routing table replaced");
        self.inner.swap(Arc::new(router))
    }
}

impl<H> From<Router<H>> for SharedRouter<H> {
    fn from(router: Router<H>) -> Self {
        Self::new(router)
    }
}

impl<H> std::fmt::Debug for SharedRouter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRouter")
            .field("routes", &self.inner.load().len())
            .finish()
    }
}
