/*!
build.rs - the Command Builder.

Pure translation from (operation descriptor, argument map) to kubectl token
lists. No side effects, no subprocesses; a given input always yields the
same plan.

Policies:
  - Every argument value becomes its own discrete token. Values are never
    shell-interpreted or concatenated, so embedded whitespace and shell
    metacharacters cannot change the command.
  - Numeric arguments render as decimal text tokens.
  - Optional arguments without a default are omitted entirely when the
    caller does not supply them.
  - Label/annotation removal encodes deletion by suffixing the key with a
    trailing hyphen (kubectl's documented convention); no value follows.
  - The composite update-deployment produces scale then set-image, each
    step carrying a human-readable note; with neither field supplied it
    fails validation before any command exists.
*/

use super::Failure;
use super::catalog::{OpId, OpSpec, ParamKind, ParamSpec};
use serde_json::Value;

/// Argument mapping for one invocation request (parameter name -> value).
pub type Args = serde_json::Map<String, Value>;

/// The external tool. Always the first token of every command.
pub const TOOL: &str = "kubectl";

/// Marker appended to a label/annotation key to request removal.
const REMOVAL_MARKER: char = '-';

/// One external-tool invocation: ordered tokens plus an optional
/// human-readable record used by composite operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub argv: Vec<String>,
    pub note: Option<String>,
}

impl Step {
    fn new(argv: Vec<String>) -> Self {
        Self { argv, note: None }
    }

    fn with_note(argv: Vec<String>, note: String) -> Self {
        Self {
            argv,
            note: Some(note),
        }
    }
}

/// Ordered steps for one invocation request. Always at least one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    fn single(argv: Vec<String>) -> Self {
        Self {
            steps: vec![Step::new(argv)],
        }
    }
}

/// Build the command plan for an operation. Validation failures are
/// reported before any subprocess could run.
pub fn build_plan(op: &OpSpec, args: &Args) -> Result<Plan, Failure> {
    let plan = match op.id {
        OpId::ListPods => namespaced_list(op, args, "pods", &[])?,
        OpId::ListFailingPods => {
            // Server-side status filter; only the unhealthy subset crosses
            // the wire.
            namespaced_list(op, args, "pods", &["--field-selector=status.phase!=Running"])?
        }
        OpId::ListServices => namespaced_list(op, args, "services", &[])?,
        OpId::ListDeployments => namespaced_list(op, args, "deployments", &[])?,
        OpId::ListJobs => namespaced_list(op, args, "jobs", &[])?,
        OpId::ListCronjobs => namespaced_list(op, args, "cronjobs", &[])?,
        OpId::ListStatefulsets => namespaced_list(op, args, "statefulsets", &[])?,
        OpId::ListDaemonsets => namespaced_list(op, args, "daemonsets", &[])?,
        OpId::ListEvents => namespaced_list(op, args, "events", &[])?,
        OpId::ListNamespaces => cluster_list("namespaces"),
        OpId::ListNodes => cluster_list("nodes"),
        OpId::DescribePod => {
            let name = require_str(op, args, "pod_name")?;
            let ns = namespace(op, args)?;
            // describe has no structured form, so no -o json here.
            Plan::single(strs(&["describe", "pod", &name, "-n", &ns]))
        }
        OpId::ExposeResource => {
            let kind = require_str(op, args, "resource_kind")?;
            let name = require_str(op, args, "name")?;
            let ns = namespace(op, args)?;
            let service_type = defaulted_str(op, args, "service_type")?;
            let port = defaulted_int(op, args, "port")?;
            let target_port = defaulted_int(op, args, "target_port")?;
            let protocol = defaulted_str(op, args, "protocol")?;
            Plan::single(strs(&[
                "expose",
                &kind,
                &name,
                "-n",
                &ns,
                "--type",
                &service_type,
                "--port",
                &port,
                "--target-port",
                &target_port,
                "--protocol",
                &protocol,
            ]))
        }
        OpId::PortForward => {
            let resource = require_str(op, args, "resource")?;
            let name = require_str(op, args, "name")?;
            let ns = namespace(op, args)?;
            let port = defaulted_int(op, args, "port")?;
            let target_port = defaulted_int(op, args, "target_port")?;
            Plan::single(strs(&[
                "port-forward",
                &resource,
                &name,
                "-n",
                &ns,
                &port,
                &target_port,
            ]))
        }
        OpId::GetLogs => {
            let name = require_str(op, args, "name")?;
            let ns = namespace(op, args)?;
            let tail = defaulted_int(op, args, "tail")?;
            Plan::single(strs(&["logs", &name, "-n", &ns, "--tail", &tail]))
        }
        OpId::CreateDeployment => {
            let name = require_str(op, args, "name")?;
            let image = require_str(op, args, "image")?;
            let ns = namespace(op, args)?;
            let replicas = defaulted_int(op, args, "replicas")?;
            Plan::single(strs(&[
                "create",
                "deploy",
                &name,
                "--replicas",
                &replicas,
                "--image",
                &image,
                "-n",
                &ns,
            ]))
        }
        OpId::GetCurrentContext => Plan::single(strs(&["config", "current-context"])),
        OpId::ListContexts => Plan::single(strs(&["config", "get-contexts", "-o", "name"])),
        OpId::UseContext => {
            let context = require_str(op, args, "context_name")?;
            Plan::single(strs(&["config", "use-context", &context]))
        }
        OpId::Annotate => metadata_set(op, args, "annotate", "annotation")?,
        OpId::RemoveAnnotation => metadata_remove(op, args, "annotate", "annotation_key")?,
        OpId::Label => metadata_set(op, args, "label", "label")?,
        OpId::RemoveLabel => metadata_remove(op, args, "label", "label_key")?,
        OpId::UpdateDeployment => update_deployment(op, args)?,
        OpId::DeleteResource => {
            let resource_type = require_str(op, args, "resource_type")?;
            let resource_name = require_str(op, args, "resource_name")?;
            let ns = namespace(op, args)?;
            Plan::single(strs(&["delete", &resource_type, &resource_name, "-n", &ns]))
        }
    };
    Ok(plan)
}

/* ---- Per-family builders ---- */

fn namespaced_list(op: &OpSpec, args: &Args, kind: &str, extra: &[&str]) -> Result<Plan, Failure> {
    let ns = namespace(op, args)?;
    let mut argv = strs(&["get", kind, "-n", &ns]);
    argv.extend(extra.iter().map(|t| t.to_string()));
    argv.push("-o".into());
    argv.push("json".into());
    Ok(Plan {
        steps: vec![Step::new(argv)],
    })
}

fn cluster_list(kind: &str) -> Plan {
    Plan::single(strs(&["get", kind, "-o", "json"]))
}

fn metadata_set(op: &OpSpec, args: &Args, verb: &str, value_param: &str) -> Result<Plan, Failure> {
    let resource_type = require_str(op, args, "resource_type")?;
    let resource_name = require_str(op, args, "resource_name")?;
    let pair = require_str(op, args, value_param)?;
    let ns = namespace(op, args)?;
    Ok(Plan::single(strs(&[
        verb,
        &resource_type,
        &resource_name,
        &pair,
        "-n",
        &ns,
        "--overwrite",
    ])))
}

fn metadata_remove(op: &OpSpec, args: &Args, verb: &str, key_param: &str) -> Result<Plan, Failure> {
    let resource_type = require_str(op, args, "resource_type")?;
    let resource_name = require_str(op, args, "resource_name")?;
    let key = require_str(op, args, key_param)?;
    let ns = namespace(op, args)?;
    // Trailing hyphen on the key is kubectl's removal convention; no value
    // token follows it.
    let marked = format!("{key}{REMOVAL_MARKER}");
    Ok(Plan::single(strs(&[
        verb,
        &resource_type,
        &resource_name,
        &marked,
        "-n",
        &ns,
        "--overwrite",
    ])))
}

fn update_deployment(op: &OpSpec, args: &Args) -> Result<Plan, Failure> {
    let name = require_str(op, args, "name")?;
    let ns = namespace(op, args)?;
    let replicas = int_arg(op, args, "replicas")?;
    let image = str_arg(op, args, "image")?;

    if replicas.is_none() && image.is_none() {
        return Err(Failure::invalid_arguments("must specify replicas or image"));
    }

    let mut steps = Vec::new();
    if let Some(replicas) = replicas {
        let count = replicas.to_string();
        steps.push(Step::with_note(
            strs(&["scale", "deployment", &name, "--replicas", &count, "-n", &ns]),
            format!("scaled replicas to {count}"),
        ));
    }
    if let Some(image) = image {
        steps.push(Step::with_note(
            strs(&[
                "set",
                "image",
                &format!("deployment/{name}"),
                &format!("{name}={image}"),
                "-n",
                &ns,
            ]),
            format!("updated image to {image}"),
        ));
    }
    Ok(Plan { steps })
}

/* ---- Argument extraction ---- */

fn namespace(op: &OpSpec, args: &Args) -> Result<String, Failure> {
    str_arg(op, args, "namespace")?
        .ok_or_else(|| Failure::invalid_arguments(format!("{}: namespace default missing", op.name)))
}

fn require_str(op: &OpSpec, args: &Args, name: &str) -> Result<String, Failure> {
    str_arg(op, args, name)?.ok_or_else(|| missing(op, name))
}

fn defaulted_str(op: &OpSpec, args: &Args, name: &str) -> Result<String, Failure> {
    str_arg(op, args, name)?.ok_or_else(|| missing(op, name))
}

fn defaulted_int(op: &OpSpec, args: &Args, name: &str) -> Result<String, Failure> {
    int_arg(op, args, name)?
        .map(|n| n.to_string())
        .ok_or_else(|| missing(op, name))
}

fn missing(op: &OpSpec, name: &str) -> Failure {
    Failure::invalid_arguments(format!("{}: missing required parameter '{}'", op.name, name))
}

/// Extract a string parameter, applying the descriptor default when the
/// caller omitted it (absent or JSON null).
fn str_arg(op: &OpSpec, args: &Args, name: &str) -> Result<Option<String>, Failure> {
    let spec = param_spec(op, name)?;
    match args.get(name) {
        None | Some(Value::Null) => Ok(spec.default.map(str::to_string)),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_error(op, spec, other)),
    }
}

/// Extract an integer parameter. Accepts JSON numbers and decimal strings
/// (callers arriving via the CLI supply text).
fn int_arg(op: &OpSpec, args: &Args, name: &str) -> Result<Option<i64>, Failure> {
    let spec = param_spec(op, name)?;
    match args.get(name) {
        None | Some(Value::Null) => match spec.default {
            Some(d) => d
                .parse::<i64>()
                .map(Some)
                .map_err(|_| Failure::invalid_arguments(format!("{}: bad default for '{}'", op.name, name))),
            None => Ok(None),
        },
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| type_error(op, spec, &Value::Number(n.clone()))),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Failure::invalid_arguments(format!(
                "{}: parameter '{}' must be an integer, got '{}'",
                op.name, name, s
            ))),
        Some(other) => Err(type_error(op, spec, other)),
    }
}

fn param_spec(op: &OpSpec, name: &str) -> Result<&'static ParamSpec, Failure> {
    op.param(name).ok_or_else(|| {
        Failure::invalid_arguments(format!("{}: unknown parameter '{}'", op.name, name))
    })
}

fn type_error(op: &OpSpec, spec: &ParamSpec, got: &Value) -> Failure {
    let wanted = match spec.kind {
        ParamKind::Str => "a string",
        ParamKind::Int => "an integer",
    };
    Failure::invalid_arguments(format!(
        "{}: parameter '{}' must be {}, got {}",
        op.name, spec.name, wanted, got
    ))
}

fn strs(tokens: &[&str]) -> Vec<String> {
    let mut argv = Vec::with_capacity(tokens.len() + 1);
    argv.push(TOOL.to_string());
    argv.extend(tokens.iter().map(|t| t.to_string()));
    argv
}

#[cfg(test)]
mod tests {
    use super::super::FailureKind;
    use super::super::catalog::find;
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> Args {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn single_argv(name: &str, a: &Args) -> Vec<String> {
        let plan = build_plan(find(name).unwrap(), a).unwrap();
        assert_eq!(plan.steps.len(), 1);
        plan.steps[0].argv.clone()
    }

    #[test]
    fn list_pods_with_explicit_namespace() {
        let argv = single_argv("list-pods", &args(&[("namespace", json!("staging"))]));
        assert_eq!(argv, ["kubectl", "get", "pods", "-n", "staging", "-o", "json"]);
    }

    #[test]
    fn omitted_namespace_uses_sentinel() {
        for name in ["list-pods", "list-services", "list-events", "list-jobs"] {
            let argv = single_argv(name, &Args::new());
            let pos = argv.iter().position(|t| t == "-n").unwrap();
            assert_eq!(argv[pos + 1], "default", "{name} namespace sentinel");
        }
    }

    #[test]
    fn failing_pods_filter_is_server_side() {
        let argv = single_argv("list-failing-pods", &Args::new());
        assert_eq!(
            argv,
            [
                "kubectl",
                "get",
                "pods",
                "-n",
                "default",
                "--field-selector=status.phase!=Running",
                "-o",
                "json"
            ]
        );
    }

    #[test]
    fn cluster_scoped_lists_have_no_namespace_flag() {
        for name in ["list-namespaces", "list-nodes"] {
            let argv = single_argv(name, &Args::new());
            assert!(!argv.contains(&"-n".to_string()), "{name} must be cluster-scoped");
            assert!(argv.contains(&"json".to_string()));
        }
    }

    #[test]
    fn describe_pod_omits_json_flag() {
        let argv = single_argv("describe-pod", &args(&[("pod_name", json!("api-0"))]));
        assert_eq!(argv, ["kubectl", "describe", "pod", "api-0", "-n", "default"]);
    }

    #[test]
    fn logs_renders_tail_as_decimal() {
        let argv = single_argv(
            "get-logs",
            &args(&[("name", json!("api-0")), ("tail", json!(250))]),
        );
        assert_eq!(
            argv,
            ["kubectl", "logs", "api-0", "-n", "default", "--tail", "250"]
        );
    }

    #[test]
    fn expose_applies_descriptor_defaults() {
        let argv = single_argv(
            "expose-resource",
            &args(&[("resource_kind", json!("deployment")), ("name", json!("api"))]),
        );
        assert_eq!(
            argv,
            [
                "kubectl",
                "expose",
                "deployment",
                "api",
                "-n",
                "default",
                "--type",
                "ClusterIP",
                "--port",
                "80",
                "--target-port",
                "80",
                "--protocol",
                "TCP"
            ]
        );
    }

    #[test]
    fn create_deployment_token_order() {
        let argv = single_argv(
            "create-deployment",
            &args(&[
                ("name", json!("api")),
                ("image", json!("nginx:1.27")),
                ("replicas", json!(3)),
            ]),
        );
        assert_eq!(
            argv,
            [
                "kubectl",
                "create",
                "deploy",
                "api",
                "--replicas",
                "3",
                "--image",
                "nginx:1.27",
                "-n",
                "default"
            ]
        );
    }

    #[test]
    fn removal_encodes_marker_and_no_value() {
        let argv = single_argv(
            "remove-label",
            &args(&[
                ("resource_type", json!("pod")),
                ("resource_name", json!("api-0")),
                ("label_key", json!("tier")),
            ]),
        );
        assert_eq!(
            argv,
            ["kubectl", "label", "pod", "api-0", "tier-", "-n", "default", "--overwrite"]
        );
        // No key=value pair anywhere after the marked key.
        assert!(!argv.iter().any(|t| t.starts_with("tier=")));

        let argv = single_argv(
            "remove-annotation",
            &args(&[
                ("resource_type", json!("service")),
                ("resource_name", json!("web")),
                ("annotation_key", json!("owner")),
            ]),
        );
        assert_eq!(argv[4], "owner-");
    }

    #[test]
    fn annotate_passes_pair_verbatim() {
        let argv = single_argv(
            "annotate",
            &args(&[
                ("resource_type", json!("pod")),
                ("resource_name", json!("api-0")),
                ("annotation", json!("team=infra")),
            ]),
        );
        assert_eq!(
            argv,
            ["kubectl", "annotate", "pod", "api-0", "team=infra", "-n", "default", "--overwrite"]
        );
    }

    #[test]
    fn update_with_neither_field_fails_validation_before_any_command() {
        let err = build_plan(
            find("update-deployment").unwrap(),
            &args(&[("name", json!("api"))]),
        )
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.contains("must specify replicas or image"));
    }

    #[test]
    fn update_with_replicas_only_is_one_scale_step() {
        let plan = build_plan(
            find("update-deployment").unwrap(),
            &args(&[("name", json!("api")), ("replicas", json!(5))]),
        )
        .unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(
            plan.steps[0].argv,
            ["kubectl", "scale", "deployment", "api", "--replicas", "5", "-n", "default"]
        );
        assert_eq!(plan.steps[0].note.as_deref(), Some("scaled replicas to 5"));
    }

    #[test]
    fn update_with_both_fields_is_scale_then_image() {
        let plan = build_plan(
            find("update-deployment").unwrap(),
            &args(&[
                ("name", json!("api")),
                ("replicas", json!(2)),
                ("image", json!("nginx:1.27")),
            ]),
        )
        .unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].argv[1], "scale");
        assert_eq!(plan.steps[1].argv[1..4], ["set", "image", "deployment/api"]);
        assert_eq!(plan.steps[1].argv[4], "api=nginx:1.27");
        assert_eq!(plan.steps[1].note.as_deref(), Some("updated image to nginx:1.27"));
    }

    #[test]
    fn values_with_whitespace_stay_single_tokens() {
        let argv = single_argv(
            "annotate",
            &args(&[
                ("resource_type", json!("pod")),
                ("resource_name", json!("api-0")),
                ("annotation", json!("note=two words; $(rm -rf)")),
            ]),
        );
        assert!(argv.contains(&"note=two words; $(rm -rf)".to_string()));
    }

    #[test]
    fn integer_strings_are_accepted_from_cli_callers() {
        let argv = single_argv(
            "get-logs",
            &args(&[("name", json!("api-0")), ("tail", json!("50"))]),
        );
        assert_eq!(argv[6], "50");

        let err = build_plan(
            find("get-logs").unwrap(),
            &args(&[("name", json!("api-0")), ("tail", json!("many"))]),
        )
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArguments);
    }

    #[test]
    fn missing_required_parameter_is_validation_failure() {
        let err = build_plan(find("describe-pod").unwrap(), &Args::new()).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.contains("pod_name"));
    }

    #[test]
    fn building_is_deterministic_and_recoverable() {
        // Mutation arguments survive the round trip into tokens: every
        // supplied value is present verbatim, and rebuilding yields the
        // identical plan.
        let a = args(&[
            ("resource_type", json!("deployment")),
            ("resource_name", json!("api")),
            ("namespace", json!("prod")),
        ]);
        let op = find("delete-resource").unwrap();
        let first = build_plan(op, &a).unwrap();
        let second = build_plan(op, &a).unwrap();
        assert_eq!(first, second);
        for value in ["deployment", "api", "prod"] {
            assert!(first.steps[0].argv.contains(&value.to_string()));
        }
    }
}
