use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::conversation::Turn;
use crate::error::ModelCallFailure;
use crate::ollama::ChatModel;
use crate::tui::{AppEvent, EventSender};

/// Handle to the one outstanding model request.
///
/// The spawned task only computes a result and posts it back to the UI task
/// as `AppEvent::Reply`; it never sees the conversation log.
pub struct ChatWorker {
    handle: JoinHandle<()>,
}

impl ChatWorker {
    pub fn start(client: Arc<dyn ChatModel>, history: Vec<Turn>, events: EventSender) -> Self {
        let handle = tokio::spawn(async move {
            let model = client.model().to_string();
            tracing::debug!(model = %model, turns = history.len(), "sending chat request");

            // Run the call in its own task so a panic inside it still
            // produces a completion.
            let call = tokio::spawn(async move { client.complete(&history).await });
            let result = match call.await {
                Ok(result) => result,
                Err(join_err) => Err(ModelCallFailure::new(format!(
                    "model call aborted: {}",
                    join_err
                ))),
            };

            match &result {
                Ok(reply) => tracing::info!(model = %model, chars = reply.len(), "chat request finished"),
                Err(e) => tracing::warn!(model = %model, error = %e, "chat request failed"),
            }

            if events.send(AppEvent::Reply(result)).is_err() {
                tracing::debug!("UI closed before reply was delivered");
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
