/*!
MCP hosting surface.

Registers one tool per catalog operation and serves them over stdio. Every
tool method is a thin wrapper: typed parameters in, converted to the generic
argument map, handed to the single `Invoker::execute` path. The dispatch and
normalization logic lives entirely in `crate::kubectl`; nothing here inspects
kubectl output.

Failure Responses become tool-level error results (not protocol errors), so
a well-formed request always receives a well-formed CallToolResult.

Concurrency: the service shares only an `Arc<Invoker>`, which is read-only
after construction, so the host may dispatch requests in parallel.
*/

use crate::kubectl::{Invoker, Response, build::Args};
use anyhow::{Context as AnyhowContext, Result};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/* -------------------------------------------------------------------------- */
/* Tool Parameter Schemas                                                     */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NamespaceParams {
    #[schemars(description = "Namespace to query (defaults to 'default')")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DescribePodParams {
    #[schemars(description = "Name of the pod to describe")]
    pub pod_name: String,
    #[schemars(description = "Namespace of the pod (defaults to 'default')")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExposeResourceParams {
    #[schemars(description = "Resource kind: pod, service, replicationcontroller, deployment or replicaset")]
    pub resource_kind: String,
    #[schemars(description = "Name of the resource to expose")]
    pub name: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
    #[schemars(description = "Service type: ClusterIP, NodePort, LoadBalancer or ExternalName (defaults to ClusterIP)")]
    pub service_type: Option<String>,
    #[schemars(description = "Service port (defaults to 80)")]
    pub port: Option<i64>,
    #[schemars(description = "Target port on the resource (defaults to 80)")]
    pub target_port: Option<i64>,
    #[schemars(description = "Protocol: TCP or UDP (defaults to TCP)")]
    pub protocol: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PortForwardParams {
    #[schemars(description = "Resource reference in pod/<name>, deployment/<name> or service/<name> form")]
    pub resource: String,
    #[schemars(description = "Name of the resource")]
    pub name: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
    #[schemars(description = "Local port (defaults to 80)")]
    pub port: Option<i64>,
    #[schemars(description = "Remote port (defaults to 80)")]
    pub target_port: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetLogsParams {
    #[schemars(description = "Name of the pod")]
    pub name: String,
    #[schemars(description = "Namespace of the pod (defaults to 'default')")]
    pub namespace: Option<String>,
    #[schemars(description = "Number of trailing lines (defaults to 1000)")]
    pub tail: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateDeploymentParams {
    #[schemars(description = "Deployment name")]
    pub name: String,
    #[schemars(description = "Container image")]
    pub image: String,
    #[schemars(description = "Target namespace (defaults to 'default')")]
    pub namespace: Option<String>,
    #[schemars(description = "Replica count (defaults to 1)")]
    pub replicas: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UseContextParams {
    #[schemars(description = "Name of the kubeconfig context to switch to")]
    pub context_name: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AnnotateParams {
    #[schemars(description = "Resource type (pod, service, deployment, ...)")]
    pub resource_type: String,
    #[schemars(description = "Name of the resource")]
    pub resource_name: String,
    #[schemars(description = "Annotation to add, key=value form")]
    pub annotation: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RemoveAnnotationParams {
    #[schemars(description = "Resource type (pod, service, deployment, ...)")]
    pub resource_type: String,
    #[schemars(description = "Name of the resource")]
    pub resource_name: String,
    #[schemars(description = "Key of the annotation to remove")]
    pub annotation_key: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LabelParams {
    #[schemars(description = "Resource type (pod, service, deployment, ...)")]
    pub resource_type: String,
    #[schemars(description = "Name of the resource")]
    pub resource_name: String,
    #[schemars(description = "Label to add, key=value form")]
    pub label: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RemoveLabelParams {
    #[schemars(description = "Resource type (pod, service, deployment, ...)")]
    pub resource_type: String,
    #[schemars(description = "Name of the resource")]
    pub resource_name: String,
    #[schemars(description = "Key of the label to remove")]
    pub label_key: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateDeploymentParams {
    #[schemars(description = "Name of the deployment to update")]
    pub name: String,
    #[schemars(description = "Namespace of the deployment (defaults to 'default')")]
    pub namespace: Option<String>,
    #[schemars(description = "New replica count (optional)")]
    pub replicas: Option<i64>,
    #[schemars(description = "New container image (optional)")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeleteResourceParams {
    #[schemars(description = "Resource type (pod, service, deployment, configmap, secret, job, ...)")]
    pub resource_type: String,
    #[schemars(description = "Name of the resource to delete")]
    pub resource_name: String,
    #[schemars(description = "Namespace of the resource (defaults to 'default')")]
    pub namespace: Option<String>,
}

/* -------------------------------------------------------------------------- */
/* Service                                                                    */
/* -------------------------------------------------------------------------- */

#[derive(Clone)]
pub struct KubeService {
    invoker: Arc<Invoker>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KubeService {
    pub fn new(invoker: Arc<Invoker>) -> Self {
        Self {
            invoker,
            tool_router: Self::tool_router(),
        }
    }

    /// The one generic bridge from a typed tool call into the dispatch
    /// layer: serialize the parameters to the argument map and execute.
    async fn call<P: Serialize>(&self, op_name: &str, params: P) -> Result<CallToolResult, McpError> {
        let args = to_arg_map(&params).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(into_call_result(self.invoker.execute(op_name, &args).await))
    }

    #[tool(name = "list-pods", description = "List all pods in a namespace (kubectl get pods, JSON)")]
    async fn list_pods(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-pods", p).await
    }

    #[tool(
        name = "list-failing-pods",
        description = "List pods whose status phase is not Running, filtered server-side (JSON)"
    )]
    async fn list_failing_pods(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-failing-pods", p).await
    }

    #[tool(name = "list-services", description = "List all services in a namespace (JSON)")]
    async fn list_services(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-services", p).await
    }

    #[tool(name = "describe-pod", description = "Describe a specific pod (human-readable text)")]
    async fn describe_pod(&self, Parameters(p): Parameters<DescribePodParams>) -> Result<CallToolResult, McpError> {
        self.call("describe-pod", p).await
    }

    #[tool(name = "list-namespaces", description = "List all namespaces in the cluster (JSON)")]
    async fn list_namespaces(&self) -> Result<CallToolResult, McpError> {
        self.call("list-namespaces", ()).await
    }

    #[tool(name = "list-nodes", description = "List all nodes in the cluster (JSON)")]
    async fn list_nodes(&self) -> Result<CallToolResult, McpError> {
        self.call("list-nodes", ()).await
    }

    #[tool(name = "list-deployments", description = "List all deployments in a namespace (JSON)")]
    async fn list_deployments(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-deployments", p).await
    }

    #[tool(name = "list-jobs", description = "List all jobs in a namespace (JSON)")]
    async fn list_jobs(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-jobs", p).await
    }

    #[tool(name = "list-cronjobs", description = "List all cronjobs in a namespace (JSON)")]
    async fn list_cronjobs(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-cronjobs", p).await
    }

    #[tool(name = "list-statefulsets", description = "List all statefulsets in a namespace (JSON)")]
    async fn list_statefulsets(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-statefulsets", p).await
    }

    #[tool(name = "list-daemonsets", description = "List all daemonsets in a namespace (JSON)")]
    async fn list_daemonsets(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-daemonsets", p).await
    }

    #[tool(
        name = "expose-resource",
        description = "Expose a resource as a new Kubernetes service (kubectl expose)"
    )]
    async fn expose_resource(&self, Parameters(p): Parameters<ExposeResourceParams>) -> Result<CallToolResult, McpError> {
        self.call("expose-resource", p).await
    }

    #[tool(
        name = "port-forward",
        description = "Port-forward a pod, deployment or service (blocks until the forward ends)"
    )]
    async fn port_forward(&self, Parameters(p): Parameters<PortForwardParams>) -> Result<CallToolResult, McpError> {
        self.call("port-forward", p).await
    }

    #[tool(name = "get-logs", description = "Get the logs of a specific pod (verbatim text)")]
    async fn get_logs(&self, Parameters(p): Parameters<GetLogsParams>) -> Result<CallToolResult, McpError> {
        self.call("get-logs", p).await
    }

    #[tool(name = "list-events", description = "List the events of a namespace (JSON)")]
    async fn list_events(&self, Parameters(p): Parameters<NamespaceParams>) -> Result<CallToolResult, McpError> {
        self.call("list-events", p).await
    }

    #[tool(
        name = "create-deployment",
        description = "Create a deployment with the given name, image and replica count"
    )]
    async fn create_deployment(&self, Parameters(p): Parameters<CreateDeploymentParams>) -> Result<CallToolResult, McpError> {
        self.call("create-deployment", p).await
    }

    #[tool(name = "get-current-context", description = "Get the current kubeconfig context name")]
    async fn get_current_context(&self) -> Result<CallToolResult, McpError> {
        self.call("get-current-context", ()).await
    }

    #[tool(name = "list-contexts", description = "List all available kubeconfig context names")]
    async fn list_contexts(&self) -> Result<CallToolResult, McpError> {
        self.call("list-contexts", ()).await
    }

    #[tool(name = "use-context", description = "Switch to a specific kubeconfig context")]
    async fn use_context(&self, Parameters(p): Parameters<UseContextParams>) -> Result<CallToolResult, McpError> {
        self.call("use-context", p).await
    }

    #[tool(name = "annotate", description = "Add or overwrite an annotation (key=value) on a resource")]
    async fn annotate(&self, Parameters(p): Parameters<AnnotateParams>) -> Result<CallToolResult, McpError> {
        self.call("annotate", p).await
    }

    #[tool(name = "remove-annotation", description = "Remove an annotation from a resource by key")]
    async fn remove_annotation(&self, Parameters(p): Parameters<RemoveAnnotationParams>) -> Result<CallToolResult, McpError> {
        self.call("remove-annotation", p).await
    }

    #[tool(name = "label", description = "Add or overwrite a label (key=value) on a resource")]
    async fn label(&self, Parameters(p): Parameters<LabelParams>) -> Result<CallToolResult, McpError> {
        self.call("label", p).await
    }

    #[tool(name = "remove-label", description = "Remove a label from a resource by key")]
    async fn remove_label(&self, Parameters(p): Parameters<RemoveLabelParams>) -> Result<CallToolResult, McpError> {
        self.call("remove-label", p).await
    }

    #[tool(
        name = "update-deployment",
        description = "Update a deployment's replica count and/or image; at least one of the two must be given"
    )]
    async fn update_deployment(&self, Parameters(p): Parameters<UpdateDeploymentParams>) -> Result<CallToolResult, McpError> {
        self.call("update-deployment", p).await
    }

    #[tool(name = "delete-resource", description = "Delete a resource by type and name")]
    async fn delete_resource(&self, Parameters(p): Parameters<DeleteResourceParams>) -> Result<CallToolResult, McpError> {
        self.call("delete-resource", p).await
    }
}

#[tool_handler]
impl ServerHandler for KubeService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Kubernetes cluster operations backed by kubectl. Read tools (list-*, describe-pod, \
                 get-logs) are safe to call freely; namespaced tools default to the 'default' \
                 namespace. Mutating tools (create/update/delete, expose, annotate, label, \
                 use-context) change cluster state. update-deployment requires replicas and/or image."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Bridging Helpers                                                           */
/* -------------------------------------------------------------------------- */

/// Serialize typed tool parameters into the generic argument map. `None`
/// fields serialize to JSON null and are dropped so the builder sees them
/// as omitted.
fn to_arg_map<P: Serialize>(params: &P) -> Result<Args> {
    let value = serde_json::to_value(params).context("failed to serialize tool parameters")?;
    match value {
        Value::Null => Ok(Args::new()),
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => anyhow::bail!("tool parameters must serialize to an object, got {other}"),
    }
}

fn into_call_result(response: Response) -> CallToolResult {
    match response {
        Response::Structured(value) => CallToolResult::success(vec![Content::text(value.to_string())]),
        Response::Diagnostic(text) => CallToolResult::success(vec![Content::text(text)]),
        Response::Failure(failure) => CallToolResult::error(vec![Content::text(failure.message)]),
    }
}

/* -------------------------------------------------------------------------- */
/* Entry Point                                                                */
/* -------------------------------------------------------------------------- */

/// Serve the tool catalog over stdio until the client disconnects. stdout
/// carries the protocol; all logging goes to stderr.
pub async fn serve_stdio(invoker: Arc<Invoker>) -> Result<()> {
    let service = KubeService::new(invoker)
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio server")?;
    let _ = service
        .waiting()
        .await
        .context("MCP server task terminated abnormally")?;
    Ok(())
}
