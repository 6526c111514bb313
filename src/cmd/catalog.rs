/*!
catalog.rs - print the operation catalog.

Human-readable table by default; `--json` emits a machine-readable array for
tooling.
*/

use crate::kubectl::{CATALOG, OutputShape, ParamKind, ParamSpec};
use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Emit the catalog as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn execute_catalog(args: CatalogArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog_json())?);
    } else {
        print!("{}", render_table());
    }
    Ok(())
}

fn kind_str(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Str => "string",
        ParamKind::Int => "integer",
    }
}

fn shape_str(shape: OutputShape) -> &'static str {
    match shape {
        OutputShape::Json => "json",
        OutputShape::Text => "text",
        OutputShape::Line => "line",
        OutputShape::Lines => "lines",
    }
}

fn param_json(p: &ParamSpec) -> Value {
    json!({
        "name": p.name,
        "type": kind_str(p.kind),
        "required": p.required,
        "default": p.default,
    })
}

fn catalog_json() -> Value {
    let ops: Vec<Value> = CATALOG
        .iter()
        .map(|op| {
            json!({
                "name": op.name,
                "params": op.params.iter().map(param_json).collect::<Vec<_>>(),
                "output": shape_str(op.output),
            })
        })
        .collect();
    Value::Array(ops)
}

fn param_brief(p: &ParamSpec) -> String {
    if p.required {
        p.name.to_string()
    } else if let Some(default) = p.default {
        format!("[{}={}]", p.name, default)
    } else {
        format!("[{}]", p.name)
    }
}

fn render_table() -> String {
    let width = CATALOG.iter().map(|op| op.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for op in CATALOG {
        let params: Vec<String> = op.params.iter().map(param_brief).collect();
        out.push_str(&format!(
            "{:<width$}  {}\n",
            op.name,
            params.join(" "),
            width = width
        ));
    }
    out
}
