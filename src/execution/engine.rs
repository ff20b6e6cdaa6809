//! Main execution engine - runs a pipeline's steps in order

use crate::{
    core::{
        config::EnvConfig,
        context::PipelineContext,
        error::PipelineError,
        pipeline::Pipeline,
        state::{ExecutionStatus, StepState},
        step::{StepInputs, StepOutcome},
    },
    services::Services,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
    },
    StepStarted {
        step: String,
    },
    StepCompleted {
        step: String,
    },
    StepSkipped {
        step: String,
        reason: String,
    },
    StepFailed {
        step: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Sequential pipeline engine
///
/// Steps run one after the other against a single context; the first step
/// returning an error aborts the pipeline and the remaining steps never run.
pub struct ExecutionEngine {
    env: EnvConfig,
    services: Services,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new(env: EnvConfig, services: Services) -> Self {
        Self {
            env,
            services,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute every step of the pipeline against `ctx`
    pub async fn execute(
        &self,
        pipeline: &mut Pipeline,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let execution_id = pipeline.state.execution_id;
        info!("Starting {} pipeline ({})", pipeline.name, execution_id);
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
        });

        pipeline.state.start();
        let inputs = StepInputs {
            env: &self.env,
            services: &self.services,
        };

        for index in 0..pipeline.len() {
            let name = pipeline.step_at(index).name();
            debug!("Running step {}", name);
            let started_at = Utc::now();
            pipeline.set_state(index, StepState::Running { started_at });
            self.emit_event(ExecutionEvent::StepStarted {
                step: name.to_string(),
            });

            match pipeline.step_at(index).execute(ctx, inputs).await {
                Ok(StepOutcome::Completed) => {
                    pipeline.set_state(
                        index,
                        StepState::Completed {
                            started_at,
                            completed_at: Utc::now(),
                        },
                    );
                    self.emit_event(ExecutionEvent::StepCompleted {
                        step: name.to_string(),
                    });
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    debug!("Step {} skipped: {}", name, reason);
                    pipeline.set_state(index, StepState::Skipped { reason: reason.clone() });
                    self.emit_event(ExecutionEvent::StepSkipped {
                        step: name.to_string(),
                        reason,
                    });
                }
                Err(source) => {
                    error!("Step {} failed: {}", name, source);
                    pipeline.set_state(
                        index,
                        StepState::Failed {
                            error: source.to_string(),
                            failed_at: Utc::now(),
                        },
                    );
                    pipeline.state.fail();
                    self.emit_event(ExecutionEvent::StepFailed {
                        step: name.to_string(),
                        error: source.to_string(),
                    });
                    self.emit_event(ExecutionEvent::PipelineCompleted {
                        execution_id,
                        status: ExecutionStatus::Failed,
                    });
                    return Err(PipelineError::Aborted {
                        pipeline: pipeline.name.clone(),
                        step: name.to_string(),
                        source,
                    });
                }
            }
        }

        pipeline.state.complete();
        info!("{} pipeline completed", pipeline.name);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status: ExecutionStatus::Completed,
        });
        Ok(())
    }
}
