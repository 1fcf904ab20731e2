//! Execution boundary: turning a saved snippet into a run and a short status.
//!
//! The [`Runner`] allows one run at a time. A [`RunTicket`] holds the in-flight slot
//! and releases it when dropped, so a second trigger while a run is pending is refused
//! with [`RunError::AlreadyRunning`].

use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::RunError;
use crate::i18n::Translator;
use crate::models::storage::KeyValueStore;
use crate::models::store::SnippetStore;
use crate::models::Snippet;

const SLUG_MAX_LEN: usize = 50;
const OUTCOME_MARKER: &str = "__CONSOLE_RULES_OUTCOME__";

static UNSAFE_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").unwrap());
static ERROR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*(?:Error|Exception)\b.*").unwrap());

/// How the code reaches the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Evaluated as a script, like typing into a console.
    Eval,
    /// Wrapped as a function body and invoked, reporting its return value.
    #[default]
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub name: String,
    /// Code with the source marker already appended.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success {
        result: Option<String>,
        /// Anything the code printed along the way.
        output: String,
    },
    Failure {
        message: String,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    /// What a successful run printed, followed by its result marked with `⇒`.
    /// Empty for failures and for runs that neither printed nor returned anything.
    pub fn output_lines(&self) -> Vec<String> {
        let ExecutionOutcome::Success { result, output } = self else {
            return Vec::new();
        };
        let mut lines: Vec<String> = output.lines().map(str::to_string).collect();
        if let Some(result) = result {
            lines.push(format!("⇒ {result}"));
        }
        lines
    }

    /// One-line status for the front ends.
    pub fn status(&self, translator: &Translator) -> String {
        match self {
            ExecutionOutcome::Success { .. } => translator.t("executedSuccessfully"),
            ExecutionOutcome::Failure { message } => translator.error_status(message),
        }
    }
}

/// Runs code somewhere and reports back. Never fails as a Rust error: whatever goes
/// wrong, including the channel itself, becomes [`ExecutionOutcome::Failure`].
pub trait ScriptExecutor: Send + Sync + 'static {
    fn execute(&self, request: ScriptRequest) -> impl Future<Output = ExecutionOutcome> + Send;
}

impl<T: ScriptExecutor> ScriptExecutor for Arc<T> {
    fn execute(&self, request: ScriptRequest) -> impl Future<Output = ExecutionOutcome> + Send {
        (**self).execute(request)
    }
}

/// Filesystem-safe slug of a snippet name for the source marker.
pub fn source_slug(name: &str) -> String {
    let mut slug = UNSAFE_SLUG_CHARS.replace_all(name, "_").into_owned();
    slug.truncate(SLUG_MAX_LEN);
    if slug.is_empty() {
        "snippet".to_string()
    } else {
        slug
    }
}

/// Appends a `sourceURL` comment so stack traces name the snippet.
pub fn with_source_url(code: &str, name: &str) -> String {
    format!("{code}\n//# sourceURL=ConsoleRules/{}.js", source_slug(name))
}

/// Runs snippets with a JavaScript interpreter read from stdin (`node -` by default).
#[derive(Debug, Clone)]
pub struct NodeExecutor {
    program: String,
    args: Vec<String>,
    mode: ExecutionMode,
}

#[derive(Debug, Deserialize)]
struct WireOutcome {
    success: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl NodeExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>, mode: ExecutionMode) -> Self {
        Self {
            program: program.into(),
            args,
            mode,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// The script handed to the interpreter for `request`.
    pub fn script(&self, request: &ScriptRequest) -> String {
        match self.mode {
            ExecutionMode::Eval => request.source.clone(),
            ExecutionMode::Function => {
                // JSON string literals are valid JavaScript string literals.
                let literal = serde_json::to_string(&request.source)
                    .unwrap_or_else(|_| "\"\"".to_string());
                format!(
                    r#"const __crCode = {literal};
let __crOutcome;
try {{
  const __crResult = new Function(__crCode)();
  __crOutcome = {{
    success: true,
    result: __crResult === undefined ? null : (typeof __crResult === 'string' ? __crResult : (() => {{
      try {{ return JSON.stringify(__crResult) ?? String(__crResult); }} catch (_) {{ return String(__crResult); }}
    }})()),
  }};
}} catch (error) {{
  __crOutcome = {{ success: false, error: error && error.message ? error.message : String(error) }};
}}
process.stdout.write('\n{OUTCOME_MARKER}' + JSON.stringify(__crOutcome) + '\n');
"#
                )
            }
        }
    }

    fn interpret(&self, status_ok: bool, stdout: &str, stderr: &str) -> ExecutionOutcome {
        if self.mode == ExecutionMode::Function {
            if let Some((output, wire)) = split_wire_outcome(stdout) {
                return if wire.success {
                    ExecutionOutcome::Success {
                        result: wire.result,
                        output,
                    }
                } else {
                    ExecutionOutcome::Failure {
                        message: wire.error.unwrap_or_default(),
                    }
                };
            }
        }

        if status_ok {
            let output = stdout.trim_end().to_string();
            let result = output.lines().last().map(str::to_string);
            ExecutionOutcome::Success { result, output }
        } else {
            ExecutionOutcome::Failure {
                message: error_message(stderr),
            }
        }
    }
}

impl Default for NodeExecutor {
    fn default() -> Self {
        Self::new("node", Vec::new(), ExecutionMode::default())
    }
}

impl ScriptExecutor for NodeExecutor {
    async fn execute(&self, request: ScriptRequest) -> ExecutionOutcome {
        let script = self.script(&request);

        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("failed to start {}: {e}", self.program);
                return ExecutionOutcome::Failure {
                    message: format!("failed to start {}: {e}", self.program),
                };
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(script.as_bytes()).await {
                warn!("failed to send script to {}: {e}", self.program);
            }
        }

        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => {
                return ExecutionOutcome::Failure {
                    message: e.to_string(),
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            "{} exited with {} for {}",
            self.program, output.status, request.name
        );
        self.interpret(output.status.success(), &stdout, &stderr)
    }
}

fn split_wire_outcome(stdout: &str) -> Option<(String, WireOutcome)> {
    let start = stdout.rfind(OUTCOME_MARKER)?;
    let line = stdout[start + OUTCOME_MARKER.len()..].lines().next()?;
    let wire: WireOutcome = serde_json::from_str(line).ok()?;
    let output = stdout[..start].trim_end().to_string();
    Some((output, wire))
}

/// The most telling line of an interpreter's stderr.
fn error_message(stderr: &str) -> String {
    stderr
        .lines()
        .find(|l| ERROR_LINE.is_match(l))
        .or_else(|| stderr.lines().find(|l| !l.trim().is_empty()))
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Serializes runs: at most one is in flight.
#[derive(Debug)]
pub struct Runner<E> {
    executor: Arc<E>,
    in_flight: Arc<AtomicBool>,
}

impl<E> Clone for Runner<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<E: ScriptExecutor> Runner<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the in-flight slot.
    pub fn try_begin(&self) -> Result<RunTicket<E>, RunError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RunError::AlreadyRunning)?;

        Ok(RunTicket {
            executor: Arc::clone(&self.executor),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Saves the draft of `id`, then runs the saved snippet. A failed save aborts
    /// before anything is executed.
    pub async fn save_and_run<S: KeyValueStore>(
        &self,
        store: &mut SnippetStore<S>,
        id: &str,
        name: &str,
        code: &str,
    ) -> Result<ExecutionOutcome, RunError> {
        let ticket = self.try_begin()?;
        let snippet = store.update(id, name, code).await?;
        Ok(ticket.execute(&snippet).await)
    }
}

/// Proof of the in-flight slot; dropping it frees the slot.
#[derive(Debug)]
pub struct RunTicket<E> {
    executor: Arc<E>,
    in_flight: Arc<AtomicBool>,
}

impl<E: ScriptExecutor> RunTicket<E> {
    pub async fn execute(self, snippet: &Snippet) -> ExecutionOutcome {
        info!("running snippet {} ({})", snippet.id, snippet.name);
        let request = ScriptRequest {
            name: snippet.name.clone(),
            source: with_source_url(&snippet.code, &snippet.name),
        };
        let outcome = self.executor.execute(request).await;
        match &outcome {
            ExecutionOutcome::Success { .. } => info!("snippet {} finished", snippet.id),
            ExecutionOutcome::Failure { message } => {
                warn!("snippet {} failed: {message}", snippet.id)
            }
        }
        outcome
    }
}

impl<E> Drop for RunTicket<E> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_slug() {
        assert_eq!(source_slug("Clear cookies!"), "Clear_cookies_");
        assert_eq!(source_slug("a.b-c_d"), "a.b-c_d");
        assert_eq!(source_slug(""), "snippet");
        assert_eq!(source_slug(&"x".repeat(80)).len(), 50);
        assert_eq!(source_slug("Olá mundo"), "Ol_mundo");
    }

    #[test]
    fn test_with_source_url_appends_marker() {
        assert_eq!(
            with_source_url("1;", "My run"),
            "1;\n//# sourceURL=ConsoleRules/My_run.js"
        );
    }

    #[test]
    fn test_output_lines_end_with_result() {
        let outcome = ExecutionOutcome::Success {
            result: Some("42".to_string()),
            output: "hi\nthere\n".to_string(),
        };
        assert_eq!(outcome.output_lines(), vec!["hi", "there", "⇒ 42"]);

        let silent = ExecutionOutcome::Success {
            result: None,
            output: String::new(),
        };
        assert!(silent.output_lines().is_empty());
        let failed = ExecutionOutcome::Failure {
            message: "boom".to_string(),
        };
        assert!(failed.output_lines().is_empty());
    }

    #[test]
    fn test_error_message_picks_error_line() {
        let stderr = "[stdin]:1\nfoo()\n^\n\nReferenceError: foo is not defined\n    at [stdin]:1:1\n\nNode.js v20.0.0\n";
        assert_eq!(error_message(stderr), "ReferenceError: foo is not defined");
        assert_eq!(error_message("\n  boom  \n"), "boom");
        assert_eq!(error_message(""), "");
    }

    #[test]
    fn test_function_mode_reads_marked_outcome() {
        let executor = NodeExecutor::default();
        let stdout = format!("hello\n\n{OUTCOME_MARKER}{{\"success\":true,\"result\":\"42\"}}\n");

        assert_eq!(
            executor.interpret(true, &stdout, ""),
            ExecutionOutcome::Success {
                result: Some("42".to_string()),
                output: "hello".to_string(),
            }
        );

        let stdout = format!("\n{OUTCOME_MARKER}{{\"success\":false,\"error\":\"nope\"}}\n");
        assert_eq!(
            executor.interpret(true, &stdout, ""),
            ExecutionOutcome::Failure {
                message: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_eval_mode_uses_exit_status() {
        let executor = NodeExecutor::new("node", Vec::new(), ExecutionMode::Eval);

        assert!(executor.interpret(true, "done\n", "").is_success());
        assert_eq!(
            executor.interpret(false, "", "TypeError: x is not a function\n"),
            ExecutionOutcome::Failure {
                message: "TypeError: x is not a function".to_string()
            }
        );
    }

    #[test]
    fn test_function_script_embeds_code_as_literal() {
        let executor = NodeExecutor::default();
        let script = executor.script(&ScriptRequest {
            name: "n".to_string(),
            source: "return \"a\";\n".to_string(),
        });

        assert!(script.starts_with("const __crCode = \"return \\\"a\\\";\\n\";"));
        assert!(script.contains(OUTCOME_MARKER));
    }

    #[test]
    fn test_status_strings() {
        let translator = Translator::new(crate::i18n::Language::En);
        let ok = ExecutionOutcome::Success {
            result: None,
            output: String::new(),
        };
        let failed = ExecutionOutcome::Failure {
            message: "bad".to_string(),
        };

        assert_eq!(ok.status(&translator), "Executed successfully");
        assert_eq!(failed.status(&translator), "Error: bad");
    }
}
