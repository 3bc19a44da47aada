//! Query traits

use async_trait::async_trait;

/// A read-only request
pub trait Query: Send + Sync {
    type Result: Send;
}

#[async_trait]
pub trait QueryHandler<Q: Query + 'static>: Send + Sync {
    type Error: Send;

    async fn handle(&self, query: Q) -> Result<Q::Result, Self::Error>;
}
