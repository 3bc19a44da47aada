//! Command traits

use async_trait::async_trait;

/// A state-changing request
pub trait Command: Send + Sync {
    type Result: Send;
}

/// Handles one command type; a single handler may implement this for several commands
#[async_trait]
pub trait CommandHandler<C: Command + 'static>: Send + Sync {
    type Error: Send;

    async fn handle(&self, command: C) -> Result<C::Result, Self::Error>;
}
