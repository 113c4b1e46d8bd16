use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// The worker agents the supervisor can hand a conversation to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkerId {
    #[serde(rename = "saving-agent")]
    Saving,
    #[serde(rename = "cd-agent")]
    Cd,
}

impl WorkerId {
    pub const ALL: [WorkerId; 2] = [WorkerId::Saving, WorkerId::Cd];

    pub const fn as_str(&self) -> &'static str {
        match self {
            WorkerId::Saving => "saving-agent",
            WorkerId::Cd => "cd-agent",
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerId {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerId::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// A label that is not part of the closed routing set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown route {:?} (expected one of {:?})",
            self.0,
            Route::ALL_LABELS
        )
    }
}

impl std::error::Error for UnknownLabel {}

/// Routing decision made by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Worker(WorkerId),
    Finish,
}

impl Route {
    pub const FINISH_LABEL: &'static str = "FINISH";
    pub const ALL_LABELS: [&'static str; 3] = [
        WorkerId::ALL[0].as_str(),
        WorkerId::ALL[1].as_str(),
        Route::FINISH_LABEL,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Worker(worker) => worker.as_str(),
            Route::Finish => Route::FINISH_LABEL,
        }
    }

    pub fn goto(&self) -> Goto {
        match self {
            Route::Worker(worker) => Goto::Node(NodeId::Worker(*worker)),
            Route::Finish => Goto::End,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Route::FINISH_LABEL {
            return Ok(Route::Finish);
        }
        s.parse().map(Route::Worker)
    }
}

impl Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// A node in the supervisor graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Supervisor,
    Worker(WorkerId),
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Supervisor => "supervisor",
            NodeId::Worker(worker) => worker.as_str(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the graph goes after a node finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goto {
    Node(NodeId),
    End,
}

impl fmt::Display for Goto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goto::Node(node) => node.fmt(f),
            Goto::End => f.write_str("__end__"),
        }
    }
}

/// Transition signal emitted by every node invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub goto: Goto,
    /// Messages to append to the conversation before moving on.
    pub update: Vec<Message>,
}

impl Command {
    pub fn goto(goto: Goto) -> Self {
        Self {
            goto,
            update: Vec::new(),
        }
    }

    pub fn with_update(mut self, update: Vec<Message>) -> Self {
        self.update = update;
        self
    }
}
