//! Ordered provider pipeline.
//!
//! # Data Flow
//! ```text
//! Pipeline::request
//!     → stage[0].handle(req, next)
//!         → stage[1].handle(req, next)
//!             → ...
//!                 → Transport::send
//! ```
//!
//! Stages are fixed at construction. A stage may answer a request itself,
//! forward it (possibly more than once, e.g. to look up the chain id), or
//! forward a different request.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::rpc::transport::Transport;
use crate::rpc::types::{ProviderRequest, ProviderResult};

/// A request transformer in the pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, request: ProviderRequest, next: Next<'_>) -> ProviderResult<Value>;
}

/// The remainder of the pipeline below the current stage.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub async fn run(self, request: ProviderRequest) -> ProviderResult<Value> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    transport: self.transport,
                };
                stage.handle(request, next).await
            }
            None => self.transport.send(&request).await,
        }
    }
}

/// A composed chain of stages over a base transport.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder {
            stages: Vec::new(),
            transport,
        }
    }

    pub async fn request(&self, request: ProviderRequest) -> ProviderResult<Value> {
        let next = Next {
            stages: &self.stages,
            transport: self.transport.as_ref(),
        };
        next.run(request).await
    }

    /// Stage names, outermost first.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
    transport: Arc<dyn Transport>,
}

impl PipelineBuilder {
    /// Append a stage. Stages added first sit closest to the caller.
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            transport: self.transport,
        }
    }
}
