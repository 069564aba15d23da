use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::adb::client::{list_users_args, set_enabled_args, BridgeRunner};
use crate::app::adb::parse::parse_user_list;
use crate::app::adb::runner::CommandOutput;
use crate::app::models::{
    ActionKind, EngineState, OperationOutcome, OperationRequest, OperationResult,
};

/// Emitted once per completed (user, package) pair. Purely observational:
/// nothing flows back into the engine through these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub user_id: u32,
    pub package: String,
    pub succeeded: bool,
    pub seq: usize,
    pub total: usize,
}

/// Applies one action across the (user × package) cross-product of a
/// request, strictly sequentially. The bridge protocol serializes
/// commands per device connection, so parallel dispatch would buy
/// nothing and muddy failure attribution.
///
/// Per invocation: Idle → Running → Completed | Aborted.
pub struct ExecutionEngine<'a, B: BridgeRunner> {
    bridge: &'a B,
    call_timeout: Duration,
    state: EngineState,
}

impl<'a, B: BridgeRunner> ExecutionEngine<'a, B> {
    pub fn new(bridge: &'a B, call_timeout: Duration) -> Self {
        Self {
            bridge,
            call_timeout,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Runs the batch. `packages` is the selection frozen at
    /// confirmation time; users are enumerated here, at request time.
    /// The cancel flag is honored only at pair boundaries so every
    /// recorded outcome reflects a call that actually finished.
    pub fn run(
        &mut self,
        device_id: &str,
        action: ActionKind,
        packages: Vec<String>,
        cancel: &AtomicBool,
        emit: &mut dyn FnMut(ProgressEvent),
    ) -> OperationResult {
        let trace_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        self.state = EngineState::Running;

        let user_ids = match self.bridge.run(&list_users_args(device_id), self.call_timeout) {
            Ok(output) => {
                let mut ids: Vec<u32> = parse_user_list(&output.stdout)
                    .iter()
                    .map(|user| user.id)
                    .collect();
                ids.sort_unstable();
                if ids.is_empty() {
                    // A device always has user 0; an empty listing means the
                    // output format drifted, not that there is nobody home.
                    ids.push(0);
                }
                ids
            }
            Err(err) => {
                warn!(trace_id = %trace_id, device_id = %device_id, error = %err, "user enumeration failed, aborting batch");
                self.state = EngineState::Aborted;
                return OperationResult {
                    request: OperationRequest {
                        device_id: device_id.to_string(),
                        action,
                        packages,
                        user_ids: Vec::new(),
                    },
                    outcomes: Vec::new(),
                    started_at,
                    finished_at: Utc::now(),
                    state: EngineState::Aborted,
                };
            }
        };

        let request = OperationRequest {
            device_id: device_id.to_string(),
            action,
            packages,
            user_ids,
        };
        let total = request.user_ids.len() * request.packages.len();
        let mut outcomes: Vec<OperationOutcome> = Vec::with_capacity(total);
        let mut aborted = false;

        info!(
            trace_id = %trace_id,
            device_id = %device_id,
            action = action.label(),
            users = request.user_ids.len(),
            packages = request.packages.len(),
            "starting batch"
        );

        'pairs: for &user_id in &request.user_ids {
            for package in &request.packages {
                if cancel.load(Ordering::SeqCst) {
                    info!(trace_id = %trace_id, "cancel observed at pair boundary");
                    aborted = true;
                    break 'pairs;
                }

                let args = set_enabled_args(&request.device_id, package, action, user_id);
                let (succeeded, message) = match self.bridge.run(&args, self.call_timeout) {
                    Ok(output) => evaluate_call(action, &output),
                    Err(err) if err.is_unreachable() => {
                        warn!(
                            trace_id = %trace_id,
                            device_id = %request.device_id,
                            package = %package,
                            user_id,
                            "device unreachable, aborting with partial results"
                        );
                        aborted = true;
                        break 'pairs;
                    }
                    Err(err) => (false, Some(err.to_string())),
                };

                outcomes.push(OperationOutcome {
                    user_id,
                    package: package.clone(),
                    succeeded,
                    message,
                });
                emit(ProgressEvent {
                    user_id,
                    package: package.clone(),
                    succeeded,
                    seq: outcomes.len(),
                    total,
                });
            }
        }

        self.state = if aborted {
            EngineState::Aborted
        } else {
            EngineState::Completed
        };
        let result = OperationResult {
            request,
            outcomes,
            started_at,
            finished_at: Utc::now(),
            state: self.state,
        };
        info!(
            trace_id = %trace_id,
            state = ?result.state,
            summary = %result.summary_line(),
            "batch finished"
        );
        result
    }
}

/// `pm` reports some failures on a zero exit status, so a completed call
/// still gets its combined output scanned for failure markers.
fn evaluate_call(action: ActionKind, output: &CommandOutput) -> (bool, Option<String>) {
    let combined = format!("{} {}", output.stdout.trim(), output.stderr.trim());
    let lower = combined.to_lowercase();
    if lower.contains("error") || lower.contains("exception") || lower.contains("failure") {
        return (false, Some(combined.trim().to_string()));
    }
    let verb = match action {
        ActionKind::Enable => "enabled",
        ActionKind::Disable => "disabled",
    };
    if lower.contains(verb) || lower.contains("new state") || combined.trim().is_empty() {
        return (true, None);
    }
    (false, Some(combined.trim().to_string()))
}
