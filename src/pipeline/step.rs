//! The executable plan node

use crate::pipeline::error::QueryResult;
use crate::pipeline::result::PipelineQueryResult;
use async_trait::async_trait;

/// One node of a compiled expression
///
/// A step owns only immutable configuration and its children, so executing
/// the same tree twice against unchanged data yields the same table.
#[async_trait]
pub trait Step: Send + Sync {
    /// Step kind, used in logs
    fn name(&self) -> &'static str;

    /// Execute this step and its children
    async fn execute(&self) -> QueryResult<PipelineQueryResult>;
}

/// An owned step of any kind
pub type BoxedStep = Box<dyn Step>;
