/*!
catalog.rs - the fixed operation catalog.

One `OpSpec` per supported kubectl action: unique identifier, ordered
parameter list, and the declared output shape. Immutable, defined at compile
time, never mutated. Parameter defaults mirror kubectl's own conventions
(namespace "default", ClusterIP services, TCP, tail 1000).
*/

/// Stable identity of an operation, used by the Command Builder to select
/// the token-construction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpId {
    ListPods,
    ListFailingPods,
    ListServices,
    DescribePod,
    ListNamespaces,
    ListNodes,
    ListDeployments,
    ListJobs,
    ListCronjobs,
    ListStatefulsets,
    ListDaemonsets,
    ExposeResource,
    PortForward,
    GetLogs,
    ListEvents,
    CreateDeployment,
    GetCurrentContext,
    ListContexts,
    UseContext,
    Annotate,
    RemoveAnnotation,
    Label,
    RemoveLabel,
    UpdateDeployment,
    DeleteResource,
}

/// How the operation's stdout is normalized on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// `-o json` mode; stdout parsed into a JSON tree.
    Json,
    /// Free text passed through verbatim, internal newlines included.
    Text,
    /// Single-line text; trailing whitespace stripped.
    Line,
    /// Newline-delimited names; returned as a JSON array of strings.
    Lines,
}

/// Semantic type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
}

/// One parameter in an operation descriptor.
///
/// `required` and `default` interact three ways:
///   required           -> caller must supply it
///   optional + default -> the default token is used when omitted
///   optional, no default -> omitted entirely from the token list
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<&'static str>,
}

const fn req(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        default: None,
    }
}

const fn opt(name: &'static str, kind: ParamKind, default: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        default: Some(default),
    }
}

const fn opt_unset(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        default: None,
    }
}

/// Namespace sentinel used whenever the caller omits the namespace.
pub const DEFAULT_NAMESPACE: &str = "default";

const NAMESPACE: ParamSpec = opt("namespace", ParamKind::Str, DEFAULT_NAMESPACE);

/// An operation descriptor: identifier, ordered parameters, output shape.
#[derive(Debug, Clone, Copy)]
pub struct OpSpec {
    pub id: OpId,
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub output: OutputShape,
}

impl OpSpec {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// The full catalog. Order is presentation order only; lookup is by name.
pub static CATALOG: &[OpSpec] = &[
    OpSpec {
        id: OpId::ListPods,
        name: "list-pods",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListFailingPods,
        name: "list-failing-pods",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListServices,
        name: "list-services",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::DescribePod,
        name: "describe-pod",
        params: &[req("pod_name", ParamKind::Str), NAMESPACE],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::ListNamespaces,
        name: "list-namespaces",
        params: &[],
        output: OutputShape::Json,
    },
    // Cluster-scoped; nodes do not live in a namespace.
    OpSpec {
        id: OpId::ListNodes,
        name: "list-nodes",
        params: &[],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListDeployments,
        name: "list-deployments",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListJobs,
        name: "list-jobs",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListCronjobs,
        name: "list-cronjobs",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListStatefulsets,
        name: "list-statefulsets",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ListDaemonsets,
        name: "list-daemonsets",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::ExposeResource,
        name: "expose-resource",
        params: &[
            req("resource_kind", ParamKind::Str),
            req("name", ParamKind::Str),
            NAMESPACE,
            opt("service_type", ParamKind::Str, "ClusterIP"),
            opt("port", ParamKind::Int, "80"),
            opt("target_port", ParamKind::Int, "80"),
            opt("protocol", ParamKind::Str, "TCP"),
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::PortForward,
        name: "port-forward",
        params: &[
            req("resource", ParamKind::Str),
            req("name", ParamKind::Str),
            NAMESPACE,
            opt("port", ParamKind::Int, "80"),
            opt("target_port", ParamKind::Int, "80"),
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::GetLogs,
        name: "get-logs",
        params: &[
            req("name", ParamKind::Str),
            NAMESPACE,
            opt("tail", ParamKind::Int, "1000"),
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::ListEvents,
        name: "list-events",
        params: &[NAMESPACE],
        output: OutputShape::Json,
    },
    OpSpec {
        id: OpId::CreateDeployment,
        name: "create-deployment",
        params: &[
            req("name", ParamKind::Str),
            req("image", ParamKind::Str),
            NAMESPACE,
            opt("replicas", ParamKind::Int, "1"),
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::GetCurrentContext,
        name: "get-current-context",
        params: &[],
        output: OutputShape::Line,
    },
    OpSpec {
        id: OpId::ListContexts,
        name: "list-contexts",
        params: &[],
        output: OutputShape::Lines,
    },
    OpSpec {
        id: OpId::UseContext,
        name: "use-context",
        params: &[req("context_name", ParamKind::Str)],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::Annotate,
        name: "annotate",
        params: &[
            req("resource_type", ParamKind::Str),
            req("resource_name", ParamKind::Str),
            req("annotation", ParamKind::Str),
            NAMESPACE,
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::RemoveAnnotation,
        name: "remove-annotation",
        params: &[
            req("resource_type", ParamKind::Str),
            req("resource_name", ParamKind::Str),
            req("annotation_key", ParamKind::Str),
            NAMESPACE,
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::Label,
        name: "label",
        params: &[
            req("resource_type", ParamKind::Str),
            req("resource_name", ParamKind::Str),
            req("label", ParamKind::Str),
            NAMESPACE,
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::RemoveLabel,
        name: "remove-label",
        params: &[
            req("resource_type", ParamKind::Str),
            req("resource_name", ParamKind::Str),
            req("label_key", ParamKind::Str),
            NAMESPACE,
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::UpdateDeployment,
        name: "update-deployment",
        params: &[
            req("name", ParamKind::Str),
            NAMESPACE,
            opt_unset("replicas", ParamKind::Int),
            opt_unset("image", ParamKind::Str),
        ],
        output: OutputShape::Text,
    },
    OpSpec {
        id: OpId::DeleteResource,
        name: "delete-resource",
        params: &[
            req("resource_type", ParamKind::Str),
            req("resource_name", ParamKind::Str),
            NAMESPACE,
        ],
        output: OutputShape::Text,
    },
];

/// Look up an operation descriptor by its public identifier.
pub fn find(name: &str) -> Option<&'static OpSpec> {
    CATALOG.iter().find(|op| op.name == name)
}
