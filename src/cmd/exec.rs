/*!
exec.rs - run one catalog operation from the command line.

Mainly a debugging aid: the same dispatch path as the MCP server, driven by
`--param key=value` pairs instead of a tool call.
*/

use crate::kubectl::{self, Invoker, ParamKind, Response};
use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Operation identifier, as listed by `catalog`.
    pub operation: String,

    /// Operation parameter as KEY=VALUE. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Print the full tagged response as JSON instead of plain output.
    #[arg(long)]
    pub json: bool,
}

pub fn execute_exec(args: ExecArgs, kubeconfig: Option<PathBuf>) -> Result<()> {
    let Some(op) = kubectl::catalog::find(&args.operation) else {
        bail!("unknown operation '{}'; see `catalog`", args.operation);
    };

    let arg_map = parse_params(op, &args.params)?;
    let invoker = Invoker::new(kubeconfig);

    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    let response = rt.block_on(invoker.execute(op.name, &arg_map));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        Response::Structured(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Response::Diagnostic(text) => print!("{text}"),
        Response::Failure(f) => bail!("{f}"),
    }
    Ok(())
}

/// Parse `key=value` pairs into an argument map, validating each key against
/// the operation descriptor and coercing values to the declared type.
fn parse_params(op: &kubectl::OpSpec, pairs: &[String]) -> Result<kubectl::build::Args> {
    let mut map = kubectl::build::Args::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid parameter '{pair}': expected KEY=VALUE");
        };
        if key.is_empty() {
            bail!("invalid parameter '{pair}': empty key");
        }
        let Some(spec) = op.param(key) else {
            let known: Vec<&str> = op.params.iter().map(|p| p.name).collect();
            bail!(
                "unknown parameter '{}' for {}; known: {}",
                key,
                op.name,
                known.join(", ")
            );
        };
        let coerced = match spec.kind {
            ParamKind::Str => Value::String(value.to_string()),
            ParamKind::Int => {
                let n: i64 = value
                    .parse()
                    .with_context(|| format!("parameter '{key}' must be an integer"))?;
                Value::from(n)
            }
        };
        map.insert(key.to_string(), coerced);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str) -> &'static kubectl::OpSpec {
        kubectl::catalog::find(name).unwrap()
    }

    #[test]
    fn pairs_are_coerced_to_declared_types() {
        let map = parse_params(
            op("get-logs"),
            &["name=api".into(), "tail=25".into()],
        )
        .unwrap();
        assert_eq!(map["name"], Value::String("api".into()));
        assert_eq!(map["tail"], Value::from(25));
    }

    #[test]
    fn unknown_keys_list_the_known_names() {
        let err = parse_params(op("list-pods"), &["nodename=x".into()]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nodename"));
        assert!(msg.contains("namespace"));
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_params(op("list-pods"), &["namespace".into()]).is_err());
        assert!(parse_params(op("list-pods"), &["=default".into()]).is_err());
    }

    #[test]
    fn non_numeric_integers_are_rejected() {
        let err = parse_params(op("get-logs"), &["name=api".into(), "tail=lots".into()])
            .unwrap_err();
        assert!(format!("{err:#}").contains("tail"));
    }
}
