use console_rules::RunError;
use console_rules::runner::ExecutionOutcome;
use flume::{Receiver, Sender};

use crate::app::App;

// Results of background runs, drained by the main loop
static RUN_CHANNEL: once_cell::sync::Lazy<(Sender<RunMessage>, Receiver<RunMessage>)> =
    once_cell::sync::Lazy::new(flume::unbounded);

#[derive(Debug, Clone)]
pub enum RunMessage {
    Finished {
        snippet_id: String,
        outcome: ExecutionOutcome,
    },
}

/// Saves the drafts of the active snippet and runs the saved version in the background.
///
/// Refused while another run is pending. A failed save aborts before anything runs.
pub fn run_active_snippet(app: &mut App) {
    let Some(id) = app.active_id.clone() else {
        app.set_error_message(app.t("noActiveSnippet"));
        return;
    };

    let ticket = match app.session.runner.try_begin() {
        Ok(ticket) => ticket,
        Err(RunError::AlreadyRunning) => {
            app.set_error_message(app.t("alreadyRunning"));
            return;
        }
        Err(e) => {
            app.set_error_message(app.session.translator.error_status(&e.to_string()));
            return;
        }
    };

    let saved = app
        .runtime
        .block_on(app.session.store.update(&id, &app.draft_name, &app.draft_code));
    let snippet = match saved {
        Ok(snippet) => snippet,
        Err(e) => {
            drop(ticket);
            app.report_store_error(&e);
            return;
        }
    };
    app.draft_name = snippet.name.clone();
    app.set_success_message(app.t("running"));

    let sender = RUN_CHANNEL.0.clone();
    app.runtime.spawn(async move {
        let outcome = ticket.execute(&snippet).await;
        let _ = sender.send(RunMessage::Finished {
            snippet_id: snippet.id,
            outcome,
        });
    });
}

/// Applies finished runs to the status line. Returns true when anything arrived.
pub fn poll_run_results(app: &mut App) -> bool {
    let mut received = false;

    while let Ok(message) = RUN_CHANNEL.1.try_recv() {
        received = true;
        match message {
            RunMessage::Finished {
                snippet_id,
                outcome,
            } => {
                let status = outcome.status(&app.session.translator);
                if outcome.is_success() {
                    app.run_output = outcome.output_lines();
                    tracing::debug!(
                        "snippet {snippet_id} finished with {} output lines",
                        app.run_output.len()
                    );
                    app.set_success_message(status);
                } else {
                    app.set_error_message(status);
                }
            }
        }
    }

    received
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;

    #[test]
    fn test_finished_run_keeps_printed_output() {
        let mut app = test_app();
        let snippet_id = app.active_id.clone().unwrap();

        RUN_CHANNEL
            .0
            .send(RunMessage::Finished {
                snippet_id,
                outcome: ExecutionOutcome::Success {
                    result: Some("3".to_string()),
                    output: "hi\n".to_string(),
                },
            })
            .unwrap();

        assert!(poll_run_results(&mut app));
        assert_eq!(app.run_output, vec!["hi", "⇒ 3"]);
        let status = app.status.as_ref().unwrap();
        assert!(!status.is_error);
        assert_eq!(status.text, app.t("executedSuccessfully"));
        assert!(!poll_run_results(&mut app));
    }
}
