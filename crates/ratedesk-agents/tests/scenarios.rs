//! End-to-end runs of the supervisor graph.
//!
//! Each test drives the real `ReactWorker`s and rate tools with a
//! `ScenarioModel` (or a scripted supervisor) and checks the streamed
//! events and the final conversation.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use ratedesk_agents::test_support::{first_rate, FixedWorker, ScenarioModel, ScriptedModel};
use ratedesk_agents::{AgentError, ChatModel, GraphEvent, SupervisorGraph, SupervisorRouter};
use ratedesk_models::message::{Conversation, Role};
use ratedesk_models::routing::{Goto, NodeId, WorkerId};
use rust_decimal::Decimal;

const REQUEST: &str = "Advise me to keep my money in saving account if the saving interest rate \
     higher than the CD interest rate. Otherwise, advise me to put my money in CD account.";

fn scenario_graph() -> (SupervisorGraph, Arc<ScenarioModel>) {
    let model = Arc::new(ScenarioModel::new());
    let graph = SupervisorGraph::with_default_workers(model.clone() as Arc<dyn ChatModel>, 25, 5);
    (graph, model)
}

async fn collect_events(graph: &SupervisorGraph, initial: Conversation) -> Vec<GraphEvent> {
    graph
        .stream(initial)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn tenths(max: i64) -> HashSet<Decimal> {
    (1..=max).map(|t| Decimal::new(t, 1)).collect()
}

#[tokio::test]
async fn default_request_visits_each_worker_once_then_finishes() {
    let (graph, _) = scenario_graph();
    let events = collect_events(&graph, Conversation::from_user(REQUEST)).await;

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

    for event in &events {
        match event.node {
            NodeId::Supervisor => assert!(event.update.is_empty()),
            NodeId::Worker(_) => assert_eq!(event.goto, Goto::Node(NodeId::Supervisor)),
        }
    }
}

#[tokio::test]
async fn final_answer_recommends_an_account() {
    let (graph, _) = scenario_graph();
    let result = graph.invoke(Conversation::from_user(REQUEST)).await.unwrap();

    let last = result.last().unwrap().text().unwrap().to_string();
    assert!(
        last.contains("saving account") || last.contains("CD account"),
        "no recommendation in {last:?}"
    );

    let saving = first_rate(result.messages()[1].text().unwrap()).unwrap();
    let cd = first_rate(&last).unwrap();
    if saving > cd {
        assert!(last.contains("keep your money in the saving account"));
    } else {
        assert!(last.contains("put your money in the CD account"));
    }
}

#[tokio::test]
async fn tool_results_stay_in_range() {
    let saving_range = tenths(7);
    let cd_range = tenths(4);

    for _ in 0..20 {
        let (graph, _) = scenario_graph();
        let events = collect_events(&graph, Conversation::from_user(REQUEST)).await;

        for event in &events {
            for message in event.inner.iter().filter(|m| m.role == Role::Tool) {
                let rate: Decimal = message.text().unwrap().parse().unwrap();
                match message.author() {
                    "saving_interest_rate" => assert!(saving_range.contains(&rate)),
                    "cd_interest_rate" => assert!(cd_range.contains(&rate)),
                    other => panic!("unexpected tool {other}"),
                }
            }
        }
    }
}

#[tokio::test]
async fn worker_inner_messages_show_tool_call_then_answer() {
    let (graph, _) = scenario_graph();
    let events = collect_events(&graph, Conversation::from_user(REQUEST)).await;

    let saving = &events[1];
    assert_eq!(saving.inner.len(), 3);
    assert_eq!(saving.inner[0].tool_calls[0].name, "saving_interest_rate");
    assert_eq!(saving.inner[1].role, Role::Tool);
    assert_eq!(saving.inner[2].role, Role::Assistant);
    assert_eq!(saving.update.len(), 1);
    assert_eq!(saving.update[0].text(), saving.inner[2].text());
}

#[tokio::test]
async fn appended_messages_follow_everything_visible() {
    let (graph, model) = scenario_graph();
    let initial = Conversation::from_user(REQUEST);
    let result = graph.invoke(initial.clone()).await.unwrap();

    assert_eq!(result.messages()[0], initial.messages()[0]);
    assert_eq!(result.len(), 3);
    assert_eq!(result.messages()[1].author(), "saving-agent");
    assert_eq!(result.messages()[2].author(), "cd-agent");

    // 3 supervisor calls + 2 model turns per worker.
    assert_eq!(model.call_count(), 7);
}

#[tokio::test]
async fn supervisor_may_visit_cd_first() {
    let supervisor = Arc::new(ScriptedModel::new(&[
        r#"{"next": "cd-agent"}"#,
        r#"{"next": "saving-agent"}"#,
        r#"{"next": "FINISH"}"#,
    ]));
    let workers: Arc<dyn ChatModel> = Arc::new(ScenarioModel::new());
    let graph = SupervisorGraph::new(SupervisorRouter::new(supervisor.clone()), 25)
        .add_worker(Arc::new(ratedesk_agents::ReactWorker::with_defaults(
            WorkerId::Cd,
            Arc::clone(&workers),
            5,
        )))
        .add_worker(Arc::new(ratedesk_agents::ReactWorker::with_defaults(
            WorkerId::Saving,
            Arc::clone(&workers),
            5,
        )));

    let result = graph.invoke(Conversation::from_user(REQUEST)).await.unwrap();
    let authors: Vec<_> = result.iter().map(|m| m.author().to_string()).collect();
    assert_eq!(authors, vec!["user", "cd-agent", "saving-agent"]);

    let last = result.last().unwrap().text().unwrap();
    assert!(last.contains("saving account") || last.contains("CD account"));
    assert_eq!(supervisor.remaining(), 0);

    // The last routing call saw both handoffs.
    let calls = supervisor.calls();
    assert_eq!(calls[2].len(), 3);
}

#[tokio::test]
async fn empty_worker_output_aborts_run() {
    let supervisor = Arc::new(ScriptedModel::new(&[r#"{"next": "saving-agent"}"#]));
    let graph = SupervisorGraph::new(SupervisorRouter::new(supervisor), 25)
        .add_worker(Arc::new(FixedWorker::new(WorkerId::Saving, "   ")));

    let err = graph
        .invoke(Conversation::from_user(REQUEST))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::EmptyWorkerOutput(agent) if agent == "saving-agent"));
}

#[tokio::test]
async fn model_failure_mid_run_surfaces_after_earlier_events() {
    // Supervisor answers once, then the script runs dry.
    let supervisor = Arc::new(ScriptedModel::new(&[r#"{"next": "cd-agent"}"#]));
    let graph = SupervisorGraph::new(SupervisorRouter::new(supervisor), 25)
        .add_worker(Arc::new(FixedWorker::new(WorkerId::Cd, "CD rate is 0.1%.")));

    let results: Vec<_> = graph
        .stream(Conversation::from_user(REQUEST))
        .collect()
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(AgentError::Cli(_))));
}
