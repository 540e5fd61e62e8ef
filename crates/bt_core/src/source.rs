use async_trait::async_trait;

use crate::context::RunContext;
use crate::types::Node;
use crate::Result;

/// The external outline content source. Returns the document as a flat node
/// list, auxiliary shared subtrees already resolved and spliced in.
#[async_trait]
pub trait OutlineSource: Send + Sync {
    async fn fetch_outline(&self, ctx: &RunContext, url: &str) -> Result<Vec<Node>>;
}
