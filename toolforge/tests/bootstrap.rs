use std::fs;

use serde_json::{Value, json};
use toolforge::prelude::*;

struct Upper;

impl Tool for Upper {
    fn name(&self) -> &str {
        "text.upper"
    }

    fn metadata(&self) -> ToolResult<ToolDescriptor> {
        ToolDescriptor::builder("text.upper")
            .name("Uppercase")
            .category("text")
            .declared_level("premium")
            .build()
            .map_err(|err| ToolError::invalid_metadata(err.to_string()))
    }

    fn process(&self, input: FieldMap) -> ToolResult<FieldMap> {
        let text = input
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::execution("`text` is required"))?;
        let mut out = FieldMap::new();
        out.insert("text".into(), json!(text.to_uppercase()));
        Ok(output::success(out))
    }
}

#[provider("demo.upper", crate = toolforge::tools)]
fn upper(_ctx: &ProviderContext<'_>) -> ToolResult<Box<dyn Tool>> {
    Ok(Box::new(Upper))
}

#[tokio::test]
async fn bootstrap_loads_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let plugins = dir.path().join("plugins");
    fs::create_dir(&plugins).unwrap();
    fs::write(
        plugins.join("text.tpk"),
        "[archive]\nname = \"text\"\nproviders = [\"demo.upper\"]\n",
    )
    .unwrap();

    let config_path = dir.path().join("toolforge.toml");
    fs::write(
        &config_path,
        format!(
            "plugin_dir = {:?}\nlog_filter = \"warn\"\n\n[access]\npremium_roles = [\"subscriber\"]\n",
            plugins.display().to_string()
        ),
    )
    .unwrap();

    let (runtime, report) = toolforge::bootstrap(Some(&config_path)).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.loaded.len(), 1);

    let catalog = runtime.catalog();
    let denied = catalog
        .invoke("text.upper", Some(&Identity::new("u").with_role("premium")), json!({ "text": "hi" }))
        .unwrap_err();
    assert_eq!(denied.status_code(), 403);

    let subscriber = Identity::new("s").with_role("subscriber");
    let out = catalog
        .invoke("text.upper", Some(&subscriber), json!({ "text": "hi" }))
        .unwrap();
    assert_eq!(out, json!({ "text": "HI", "success": true }));

    let missing = catalog
        .invoke("text.upper", Some(&subscriber), json!({}))
        .unwrap();
    assert_eq!(out["success"], json!(true));
    assert_eq!(missing["success"], json!(false));

    runtime.shutdown();
}

#[tokio::test]
async fn bootstrap_rejects_bad_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("toolforge.toml");
    fs::write(&config_path, "max_parallel_loads = 0\n").unwrap();

    assert!(toolforge::bootstrap(Some(&config_path)).await.is_err());
}
