//! Minimal host that loads the demo archives and drives the catalog from the
//! command line.
//!
//! ```text
//! cargo run -p basic-host -- --config demos/basic-host/toolforge.toml list --role premium
//! cargo run -p basic-host -- invoke math.sum --input '{"values": [1, 2, 3]}'
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use toolforge::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Load tool archives and call them")]
struct Cli {
    /// Runtime configuration file.
    #[arg(long, default_value = "demos/basic-host/toolforge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tools a caller may invoke.
    List {
        #[command(flatten)]
        caller: Caller,
    },
    /// Show one tool's descriptor.
    Describe { name: String },
    /// Invoke a tool with a JSON object body.
    Invoke {
        name: String,
        #[arg(long, default_value = "{}")]
        input: String,
        #[command(flatten)]
        caller: Caller,
    },
    /// Show every registered tool.
    Status,
}

#[derive(Debug, clap::Args)]
struct Caller {
    /// Role held by the caller; repeat for several. No role means anonymous.
    #[arg(long = "role")]
    roles: Vec<String>,
}

impl Caller {
    fn identity(&self) -> Option<Identity> {
        (!self.roles.is_empty()).then(|| Identity::new("cli").with_roles(self.roles.iter().cloned()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (runtime, report) = toolforge::bootstrap(Some(&cli.config)).await?;
    for failure in &report.failures {
        warn!(archive = %failure.path().display(), "archive skipped: {failure}");
    }
    info!(tools = report.loaded.len(), "runtime ready");

    let catalog = runtime.catalog();
    let rendered = match cli.command {
        Command::List { caller } => {
            let listed: Vec<Value> = catalog
                .list_accessible(caller.identity().as_ref())
                .iter()
                .map(|descriptor| json!({
                    "id": descriptor.id(),
                    "name": descriptor.name(),
                    "accessLevel": descriptor.access_level(),
                }))
                .collect();
            Value::Array(listed)
        }
        Command::Describe { name } => match catalog.describe(&name) {
            Ok(descriptor) => serde_json::to_value(descriptor.as_deref())?,
            Err(err) => error_body(&err),
        },
        Command::Invoke { name, input, caller } => {
            let body: Value = serde_json::from_str(&input).context("--input must be JSON")?;
            match catalog.invoke(&name, caller.identity().as_ref(), body) {
                Ok(output) => output,
                Err(err) => error_body(&err),
            }
        }
        Command::Status => serde_json::to_value(catalog.status())?,
    };

    println!("{}", serde_json::to_string_pretty(&rendered)?);
    runtime.shutdown();
    Ok(())
}

fn error_body(err: &DispatchError) -> Value {
    json!({ "status": err.status_code(), "error": err.kind(), "message": err.to_string() })
}

struct Upper {
    suffix: String,
}

impl Tool for Upper {
    fn name(&self) -> &str {
        "text.upper"
    }

    fn metadata(&self) -> ToolResult<ToolDescriptor> {
        ToolDescriptor::builder("text.upper")
            .name("Uppercase")
            .category("text")
            .input_schema(json!({ "type": "object", "required": ["text"] }))
            .build()
            .map_err(|err| ToolError::invalid_metadata(err.to_string()))
    }

    fn process(&self, input: FieldMap) -> ToolResult<FieldMap> {
        let text = text_field(&input)?;
        let mut out = FieldMap::new();
        out.insert("text".into(), json!(format!("{}{}", text.to_uppercase(), self.suffix)));
        Ok(output::success(out))
    }
}

struct Reverse;

impl Tool for Reverse {
    fn name(&self) -> &str {
        "text.reverse"
    }

    fn metadata(&self) -> ToolResult<ToolDescriptor> {
        ToolDescriptor::builder("text.reverse")
            .name("Reverse")
            .category("text")
            .declared_level("premium")
            .build()
            .map_err(|err| ToolError::invalid_metadata(err.to_string()))
    }

    fn process(&self, input: FieldMap) -> ToolResult<FieldMap> {
        let text = text_field(&input)?;
        let mut out = FieldMap::new();
        out.insert("text".into(), json!(text.chars().rev().collect::<String>()));
        Ok(output::success(out))
    }
}

struct Sum;

impl Tool for Sum {
    fn name(&self) -> &str {
        "math.sum"
    }

    fn metadata(&self) -> ToolResult<ToolDescriptor> {
        ToolDescriptor::builder("math.sum")
            .name("Sum")
            .category("math")
            .build()
            .map_err(|err| ToolError::invalid_metadata(err.to_string()))
    }

    fn process(&self, input: FieldMap) -> ToolResult<FieldMap> {
        let values = input
            .get("values")
            .and_then(Value::as_array)
            .ok_or_else(|| ToolError::execution("`values` must be an array"))?;
        let total: f64 = values.iter().filter_map(Value::as_f64).sum();
        let mut out = FieldMap::new();
        out.insert("total".into(), json!(total));
        Ok(output::success(out))
    }
}

struct Purge;

impl Tool for Purge {
    fn name(&self) -> &str {
        "ops.purge"
    }

    fn metadata(&self) -> ToolResult<ToolDescriptor> {
        ToolDescriptor::builder("ops.purge")
            .name("Purge caches")
            .category("operations")
            .access_level(AccessLevel::Admin)
            .build()
            .map_err(|err| ToolError::invalid_metadata(err.to_string()))
    }

    fn process(&self, _input: FieldMap) -> ToolResult<FieldMap> {
        let mut out = FieldMap::new();
        out.insert("purged".into(), json!(true));
        Ok(output::success(out))
    }
}

fn text_field(input: &FieldMap) -> ToolResult<&str> {
    input
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::execution("`text` is required"))
}

#[provider("demo.text.upper", crate = toolforge::tools)]
fn upper(ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
    let suffix = ctx
        .config()
        .get("suffix")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    Ok(Box::new(Upper { suffix }))
}

#[provider("demo.text.reverse", crate = toolforge::tools)]
fn reverse(_ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
    Ok(Box::new(Reverse))
}

#[provider("demo.math.sum", crate = toolforge::tools)]
fn sum(_ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
    Ok(Box::new(Sum))
}

#[provider("demo.ops.purge", crate = toolforge::tools)]
fn purge(_ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
    Ok(Box::new(Purge))
}
