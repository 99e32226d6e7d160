
use crate::events::feed::EventFeed;
use crate::query::builder::QueryDescriptor;
use crate::transport::client::{Transport, TransportError};

use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted answer of the fake events API.
pub(crate) enum Step {
    Respond(Value),
    Fail(TransportError),
    /// Never answers; only cancellation gets the loop out.
    Hang,
}

/// `Transport` that replays a script and remembers every query it was sent.
/// Once the script runs out it answers with empty polls.
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn execute<F: EventFeed>(
        &self,
        query: &QueryDescriptor<F>,
    ) -> Result<Value, TransportError> {
        self.queries.lock().unwrap().push(query.text().to_string());
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Respond(data)) => Ok(data),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => std::future::pending().await,
            None => {
                let mut data = Map::new();
                data.insert(query.dataset().to_string(), Value::Array(Vec::new()));
                Ok(Value::Object(data))
            }
        }
    }
}
