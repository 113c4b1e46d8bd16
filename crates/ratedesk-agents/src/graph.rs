//! The supervisor graph: START → supervisor → worker → supervisor → … → END.
//!
//! Execution is strictly sequential. `stream` yields one `GraphEvent` per
//! node execution, so callers observe intermediate states as they happen.

use std::collections::HashMap;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use ratedesk_models::message::{Conversation, Message};
use ratedesk_models::routing::{Goto, NodeId, WorkerId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AgentError;
use crate::handoff::HandoffNode;
use crate::llm::ChatModel;
use crate::supervisor::SupervisorRouter;
use crate::worker::{ReactWorker, WorkerAgent};

/// Observable result of one node execution.
#[derive(Debug, Clone)]
pub struct GraphEvent {
    /// 1-based node execution count within the run.
    pub step: usize,
    pub node: NodeId,
    /// Messages the node produced internally (tool requests, tool results,
    /// worker answers). Empty for the supervisor.
    pub inner: Vec<Message>,
    /// Messages appended to the shared conversation.
    pub update: Vec<Message>,
    pub goto: Goto,
}

/// Fixed-topology graph over one supervisor and a set of workers.
pub struct SupervisorGraph {
    supervisor: SupervisorRouter,
    workers: HashMap<WorkerId, HandoffNode>,
    recursion_limit: usize,
}

impl SupervisorGraph {
    pub fn new(supervisor: SupervisorRouter, recursion_limit: usize) -> Self {
        Self {
            supervisor,
            workers: HashMap::new(),
            recursion_limit,
        }
    }

    /// Build the default graph: every `WorkerId` backed by a `ReactWorker`
    /// with its default tool, all sharing one model.
    pub fn with_default_workers(
        model: Arc<dyn ChatModel>,
        recursion_limit: usize,
        max_tool_rounds: usize,
    ) -> Self {
        let mut graph = Self::new(SupervisorRouter::new(Arc::clone(&model)), recursion_limit);
        for id in WorkerId::ALL {
            graph = graph.add_worker(Arc::new(ReactWorker::with_defaults(
                id,
                Arc::clone(&model),
                max_tool_rounds,
            )));
        }
        graph
    }

    /// Register a worker node. A later worker with the same id replaces the earlier one.
    pub fn add_worker(mut self, worker: Arc<dyn WorkerAgent>) -> Self {
        self.workers.insert(worker.id(), HandoffNode::new(worker));
        self
    }

    pub fn workers(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.keys().copied()
    }

    async fn execute(
        &self,
        node: NodeId,
        state: &Conversation,
    ) -> Result<(Goto, Vec<Message>, Vec<Message>), AgentError> {
        match node {
            NodeId::Supervisor => {
                let command = self.supervisor.run(state).await?;
                Ok((command.goto, Vec::new(), command.update))
            }
            NodeId::Worker(id) => {
                let worker = self.workers.get(&id).ok_or_else(|| {
                    AgentError::InvalidRoute(format!("{id} (no such node in graph)"))
                })?;
                let step = worker.run(state).await?;
                Ok((step.command.goto, step.inner, step.command.update))
            }
        }
    }

    /// Run the graph lazily from `initial`. The stream ends after the
    /// supervisor routes to FINISH, or after the first error.
    pub fn stream(
        &self,
        initial: Conversation,
    ) -> impl Stream<Item = Result<GraphEvent, AgentError>> + Send + '_ {
        async_stream::try_stream! {
            let run_id = Uuid::new_v4();
            info!(%run_id, messages = initial.len(), "Graph run started");

            let mut state = initial;
            let mut current = NodeId::Supervisor;
            let mut step = 0;

            loop {
                step += 1;
                if step > self.recursion_limit {
                    Err::<(), _>(AgentError::RecursionLimit(self.recursion_limit))?;
                }

                debug!(%run_id, step, node = %current, "Executing node");
                let (goto, inner, update) = self.execute(current, &state).await?;
                state.extend(update.iter().cloned());

                yield GraphEvent {
                    step,
                    node: current,
                    inner,
                    update,
                    goto,
                };

                match goto {
                    Goto::Node(next) => current = next,
                    Goto::End => {
                        info!(%run_id, steps = step, messages = state.len(), "Graph run finished");
                        break;
                    }
                }
            }
        }
    }

    /// Drive the graph to completion and return the final conversation.
    pub async fn invoke(&self, initial: Conversation) -> Result<Conversation, AgentError> {
        let mut state = initial.clone();
        let stream = self.stream(initial);
        futures::pin_mut!(stream);

        while let Some(event) = stream.next().await {
            state.extend(event?.update);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedWorker, ScriptedModel};

    fn graph(supervisor_script: &[&str], limit: usize) -> SupervisorGraph {
        let model = Arc::new(ScriptedModel::new(supervisor_script));
        SupervisorGraph::new(SupervisorRouter::new(model), limit)
            .add_worker(Arc::new(FixedWorker::new(WorkerId::Saving, "Saving rate is 0.5%.")))
            .add_worker(Arc::new(FixedWorker::new(WorkerId::Cd, "CD rate is 0.2%.")))
    }

    #[tokio::test]
    async fn streams_one_event_per_node() {
        let graph = graph(
            &[
                r#"{"next": "saving-agent"}"#,
                r#"{"next": "cd-agent"}"#,
                r#"{"next": "FINISH"}"#,
            ],
            25,
        );

        let events: Vec<_> = graph
            .stream(Conversation::from_user("compare"))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let nodes: Vec<_> = events.iter().map(|e| e.node).collect();
        assert_eq!(
            nodes,
            vec![
                NodeId::Supervisor,
                NodeId::Worker(WorkerId::Saving),
                NodeId::Supervisor,
                NodeId::Worker(WorkerId::Cd),
                NodeId::Supervisor,
            ]
        );
        assert_eq!(events.last().unwrap().goto, Goto::End);
        assert_eq!(events[1].goto, Goto::Node(NodeId::Supervisor));
        assert_eq!(events[1].update[0].author(), "saving-agent");
        assert_eq!(events.iter().map(|e| e.step).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn invoke_appends_handoffs_in_order() {
        let graph = graph(
            &[
                r#"{"next": "cd-agent"}"#,
                r#"{"next": "saving-agent"}"#,
                r#"{"next": "FINISH"}"#,
            ],
            25,
        );

        let initial = Conversation::from_user("compare");
        let result = graph.invoke(initial.clone()).await.unwrap();

        assert_eq!(&result.messages()[..1], initial.messages());
        let authors: Vec<_> = result.iter().map(|m| m.author().to_string()).collect();
        assert_eq!(authors, vec!["user", "cd-agent", "saving-agent"]);
    }

    #[tokio::test]
    async fn immediate_finish_leaves_conversation_unchanged() {
        let graph = graph(&[r#"{"next": "FINISH"}"#], 25);
        let initial = Conversation::from_user("nothing to do");
        let result = graph.invoke(initial.clone()).await.unwrap();
        assert_eq!(result, initial);
    }

    #[tokio::test]
    async fn recursion_limit_stops_loops() {
        let graph = graph(
            &[r#"{"next": "cd-agent"}"#, r#"{"next": "cd-agent"}"#],
            3,
        );

        let err = graph
            .invoke(Conversation::from_user("loop"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::RecursionLimit(3)));
    }

    #[tokio::test]
    async fn invalid_route_aborts_stream() {
        let graph = graph(&[r#"{"next": "loan-agent"}"#], 25);
        let results: Vec<_> = graph
            .stream(Conversation::from_user("loan"))
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(AgentError::InvalidRoute(_))));
    }

    #[tokio::test]
    async fn missing_worker_is_route_error() {
        let model = Arc::new(ScriptedModel::new(&[r#"{"next": "cd-agent"}"#]));
        let graph = SupervisorGraph::new(SupervisorRouter::new(model), 25)
            .add_worker(Arc::new(FixedWorker::new(WorkerId::Saving, "0.5%")));

        let err = graph
            .invoke(Conversation::from_user("cd?"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidRoute(_)));
    }

    #[test]
    fn default_graph_registers_every_worker() {
        let model = Arc::new(ScriptedModel::new(&[]));
        let graph = SupervisorGraph::with_default_workers(model, 25, 5);
        let mut workers: Vec<_> = graph.workers().map(|w| w.to_string()).collect();
        workers.sort();
        assert_eq!(workers, vec!["cd-agent", "saving-agent"]);
    }
}
