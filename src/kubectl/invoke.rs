/*!
invoke.rs - the Invoker & Normalizer.

Executes a built plan one subprocess at a time, captures stdout/stderr and
exit status, and classifies the outcome into the uniform Response shape.

Execution model:
  - Synchronous from the caller's point of view: one OS process per step,
    awaited to completion. No timeout and no retry at this layer; deadlines
    and retry policy belong to the caller.
  - The kubeconfig override is a read-only field set at construction and
    applied to every subprocess environment. The Invoker holds no other
    state, so concurrent invocations share nothing mutable.

Classification:
  - non-zero exit  -> execution failure embedding the operation name and
                      stderr (stdout when stderr is empty)
  - spawn error    -> execution failure noting that kubectl never started
  - zero exit      -> normalized per the descriptor's declared output shape;
                      unparseable JSON is its own malformed-output class
*/

use super::build::{self, Args, Plan, Step};
use super::catalog::{self, OpSpec, OutputShape};
use super::{Failure, Response};
use crate::{log_debug, log_trace};
use serde_json::Value;
use std::path::PathBuf;
use tokio::process::Command;

/// Executes commands for the operation catalog. Cheap to clone behind an
/// `Arc`; all fields are immutable after construction.
#[derive(Debug)]
pub struct Invoker {
    /// Credential-file override handed to kubectl via KUBECONFIG. `None`
    /// leaves kubectl's own resolution untouched.
    kubeconfig: Option<PathBuf>,
}

/// Raw result of one subprocess, consumed immediately by `normalize`.
struct Captured {
    success: bool,
    stdout: String,
    stderr: String,
}

impl Invoker {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self { kubeconfig }
    }

    /// The single entry point: operation identifier + argument map in, one
    /// Response out. Every failure is recovered here; nothing propagates.
    pub async fn execute(&self, op_name: &str, args: &Args) -> Response {
        let Some(op) = catalog::find(op_name) else {
            return Failure::invalid_arguments(format!("unknown operation '{op_name}'")).into();
        };
        let plan = match build::build_plan(op, args) {
            Ok(plan) => plan,
            Err(failure) => return failure.into(),
        };
        self.run_plan(op, &plan).await
    }

    /// Run every step in order; the first failing step aborts the plan.
    pub async fn run_plan(&self, op: &OpSpec, plan: &Plan) -> Response {
        let mut notes: Vec<String> = Vec::new();
        let mut last: Option<Captured> = None;

        for step in &plan.steps {
            let captured = match self.run_step(op, step).await {
                Ok(captured) => captured,
                Err(failure) => return failure.into(),
            };
            if !captured.success {
                let diag = if captured.stderr.trim().is_empty() {
                    &captured.stdout
                } else {
                    &captured.stderr
                };
                return Failure::command_failed(format!("{}: {}", op.name, diag)).into();
            }
            if let Some(note) = &step.note {
                notes.push(note.clone());
            }
            last = Some(captured);
        }

        match last {
            Some(captured) => normalize(op, &notes, captured),
            // The builder never emits an empty plan; guard anyway.
            None => Failure::invalid_arguments(format!("{}: empty command plan", op.name)).into(),
        }
    }

    async fn run_step(&self, op: &OpSpec, step: &Step) -> Result<Captured, Failure> {
        let Some((program, rest)) = step.argv.split_first() else {
            return Err(Failure::invalid_arguments(format!("{}: empty command", op.name)));
        };
        log_debug!("exec {:?}", step.argv);

        let mut cmd = Command::new(program);
        cmd.args(rest);
        if let Some(path) = &self.kubeconfig {
            cmd.env("KUBECONFIG", path);
        }

        let output = cmd.output().await.map_err(|e| {
            Failure::command_failed(format!(
                "{}: failed to launch '{}': {}; no attempt reached the cluster",
                op.name, program, e
            ))
        })?;

        log_trace!(
            "exit {:?}, {} stdout bytes, {} stderr bytes",
            output.status.code(),
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(Captured {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Convert the final captured output into the declared response shape.
fn normalize(op: &OpSpec, notes: &[String], captured: Captured) -> Response {
    match op.output {
        OutputShape::Json => match serde_json::from_str::<Value>(&captured.stdout) {
            Ok(value) => Response::Structured(value),
            Err(e) => Failure::malformed_output(format!(
                "{}: expected JSON output but parsing failed: {}",
                op.name, e
            ))
            .into(),
        },
        OutputShape::Text => {
            if notes.is_empty() {
                // Verbatim, internal newlines included.
                Response::Diagnostic(captured.stdout)
            } else {
                let mut text = notes.join("\n");
                if !captured.stdout.trim().is_empty() {
                    text.push('\n');
                    text.push_str(&captured.stdout);
                }
                Response::Diagnostic(text)
            }
        }
        OutputShape::Line => Response::Diagnostic(captured.stdout.trim_end().to_string()),
        OutputShape::Lines => {
            let names = captured
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Value::String(line.to_string()))
                .collect();
            Response::Structured(Value::Array(names))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::FailureKind;
    use super::*;
    use serde_json::json;

    fn step(argv: &[&str]) -> Step {
        Step {
            argv: argv.iter().map(|t| t.to_string()).collect(),
            note: None,
        }
    }

    fn plan(argv: &[&str]) -> Plan {
        Plan {
            steps: vec![step(argv)],
        }
    }

    fn invoker() -> Invoker {
        Invoker::new(None)
    }

    #[tokio::test]
    async fn text_output_passes_through() {
        let op = catalog::find("describe-pod").unwrap();
        let resp = invoker().run_plan(op, &plan(&["echo", "hello", "world"])).await;
        assert_eq!(resp, Response::Diagnostic("hello world\n".into()));
    }

    #[tokio::test]
    async fn structured_output_parses_json() {
        let op = catalog::find("list-pods").unwrap();
        let resp = invoker()
            .run_plan(op, &plan(&["echo", r#"{"items":[]}"#]))
            .await;
        assert_eq!(resp, Response::Structured(json!({"items": []})));
    }

    #[tokio::test]
    async fn non_json_from_structured_op_is_malformed_output() {
        let op = catalog::find("list-pods").unwrap();
        let resp = invoker().run_plan(op, &plan(&["echo", "not json at all"])).await;
        match resp {
            Response::Failure(f) => {
                assert_eq!(f.kind, FailureKind::MalformedOutput);
                assert!(f.message.contains("list-pods"));
            }
            other => panic!("expected malformed-output failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_reports_operation_and_stderr() {
        let op = catalog::find("list-pods").unwrap();
        let resp = invoker()
            .run_plan(op, &plan(&["sh", "-c", "echo boom >&2; exit 3"]))
            .await;
        match resp {
            Response::Failure(f) => {
                assert_eq!(f.kind, FailureKind::CommandFailed);
                assert!(f.message.contains("list-pods"));
                assert!(f.message.contains("boom"));
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_falls_back_to_stdout_when_stderr_empty() {
        let op = catalog::find("delete-resource").unwrap();
        let resp = invoker()
            .run_plan(op, &plan(&["sh", "-c", "echo oops; exit 1"]))
            .await;
        match resp {
            Response::Failure(f) => assert!(f.message.contains("oops")),
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn launch_failure_notes_nothing_reached_the_cluster() {
        let op = catalog::find("list-pods").unwrap();
        let resp = invoker()
            .run_plan(op, &plan(&["mcp-kube-test-no-such-binary"]))
            .await;
        match resp {
            Response::Failure(f) => {
                assert_eq!(f.kind, FailureKind::CommandFailed);
                assert!(f.message.contains("no attempt reached the cluster"));
            }
            other => panic!("expected launch failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_line_output_strips_trailing_newline() {
        let op = catalog::find("get-current-context").unwrap();
        let resp = invoker().run_plan(op, &plan(&["echo", "minikube"])).await;
        assert_eq!(resp, Response::Diagnostic("minikube".into()));
    }

    #[tokio::test]
    async fn line_list_output_becomes_array() {
        let op = catalog::find("list-contexts").unwrap();
        let resp = invoker()
            .run_plan(op, &plan(&["sh", "-c", "echo ctx-a; echo ctx-b"]))
            .await;
        assert_eq!(resp, Response::Structured(json!(["ctx-a", "ctx-b"])));
    }

    #[tokio::test]
    async fn composite_notes_prefix_the_diagnostic() {
        let op = catalog::find("update-deployment").unwrap();
        let composite = Plan {
            steps: vec![
                Step {
                    argv: vec!["true".into()],
                    note: Some("scaled replicas to 2".into()),
                },
                Step {
                    argv: vec!["echo".into(), "deployment.apps/api image updated".into()],
                    note: Some("updated image to nginx:1.27".into()),
                },
            ],
        };
        let resp = invoker().run_plan(op, &composite).await;
        match resp {
            Response::Diagnostic(text) => {
                assert!(text.starts_with("scaled replicas to 2\nupdated image to nginx:1.27"));
                assert!(text.contains("image updated"));
            }
            other => panic!("expected diagnostic, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn composite_stops_at_first_failing_step() {
        let op = catalog::find("update-deployment").unwrap();
        let composite = Plan {
            steps: vec![
                Step {
                    argv: vec!["sh".into(), "-c".into(), "echo denied >&2; exit 1".into()],
                    note: Some("scaled replicas to 2".into()),
                },
                Step {
                    argv: vec!["echo".into(), "never runs".into()],
                    note: None,
                },
            ],
        };
        let resp = invoker().run_plan(op, &composite).await;
        match resp {
            Response::Failure(f) => {
                assert!(f.message.contains("update-deployment"));
                assert!(f.message.contains("denied"));
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_rejects_unknown_operations() {
        let resp = invoker().execute("reboot-cluster", &Args::new()).await;
        match resp {
            Response::Failure(f) => {
                assert_eq!(f.kind, FailureKind::InvalidArguments);
                assert!(f.message.contains("reboot-cluster"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_surfaces_validation_failures_without_launching() {
        let mut args = Args::new();
        args.insert("name".into(), json!("api"));
        let resp = invoker().execute("update-deployment", &args).await;
        match resp {
            Response::Failure(f) => {
                assert_eq!(f.kind, FailureKind::InvalidArguments);
                assert!(f.message.contains("must specify replicas or image"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }
}
