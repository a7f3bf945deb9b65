//! Integration descriptor generation
//!
//! Writes `integration.py` for the plugin execution backend. The file is
//! always rebuilt from the registry, never patched.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{IoContext, Result};
use crate::fs_util::write_atomic;
use crate::plugin::registry::RegistryStore;
use crate::plugin::types::{InstalledPlugin, Scope};

pub const INTEGRATION_FILE: &str = "integration.py";
pub const INIT_FILE: &str = "__init__.py";

const INIT_CONTENT: &str = "# Plugin integration module\nfrom .integration import *\n";

const HEADER: &str = r#"# Auto-generated plugin integration file
# Do not edit manually - managed by claude-plugins CLI

from typing import Dict, List, Any
import importlib.util
import sys

"#;

const HELPERS: &str = r#"

def get_plugin_tools() -> List[Dict]:
    """Get all tools from installed plugins"""
    tools = []
    for plugin_id, plugin_info in INSTALLED_PLUGINS.items():
        for tool in plugin_info.get('tools', []):
            tools.append(tool)
    return tools

def load_plugin_module(plugin_id: str):
    """Dynamically load a plugin module"""
    if plugin_id not in INSTALLED_PLUGINS:
        raise ValueError(f"Plugin {plugin_id} not found")

    plugin_info = INSTALLED_PLUGINS[plugin_id]
    module_path = f"{plugin_info['path']}/{plugin_info['entryPoint']}"

    spec = importlib.util.spec_from_file_location(plugin_id, module_path)
    if spec is None or spec.loader is None:
        raise ImportError(f"Could not load plugin {plugin_id}")

    module = importlib.util.module_from_spec(spec)
    sys.modules[plugin_id] = module
    spec.loader.exec_module(module)
    return module

def execute_plugin_tool(plugin_id: str, tool_name: str, tool_input: Dict) -> Any:
    """Execute a tool from a plugin"""
    module = load_plugin_module(plugin_id)
    if hasattr(module, 'execute_tool'):
        return module.execute_tool(tool_name, tool_input)
    raise AttributeError(f"Plugin {plugin_id} does not have execute_tool function")
"#;

/// Generates the descriptor consumed by the execution backend
#[derive(Debug, Clone)]
pub struct IntegrationGenerator {
    output_dir: PathBuf,
}

impl IntegrationGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.output_dir.join(INTEGRATION_FILE)
    }

    /// Rewrite the descriptor from the enabled plugins of `scope`
    pub fn generate(&self, store: &RegistryStore, scope: Scope) -> Result<PathBuf> {
        let mut plugins = store.list_all(scope)?;
        plugins.retain(|p| p.enabled);

        fs::create_dir_all(&self.output_dir).at(&self.output_dir)?;

        let path = self.descriptor_path();
        write_atomic(&path, render(&plugins).as_bytes())?;

        let init = self.output_dir.join(INIT_FILE);
        if !init.exists() {
            fs::write(&init, INIT_CONTENT).at(&init)?;
        }

        debug!(scope = %scope, plugins = plugins.len(), path = %path.display(), "integration descriptor written");
        Ok(path)
    }
}

/// Descriptor entries keyed by plugin id
pub fn descriptor_entries(plugins: &[InstalledPlugin]) -> Value {
    let mut entries = Map::new();
    for plugin in plugins {
        entries.insert(
            plugin.manifest.id.clone(),
            json!({
                "name": plugin.manifest.name,
                "version": plugin.manifest.version,
                "tools": plugin.manifest.tools,
                "entryPoint": plugin.manifest.entry_point,
                "path": plugin.path.to_string_lossy(),
            }),
        );
    }
    Value::Object(entries)
}

/// Render integration.py for the given plugins (callers filter `enabled`)
pub fn render(plugins: &[InstalledPlugin]) -> String {
    let mut out = String::from(HEADER);
    out.push_str("INSTALLED_PLUGINS: Dict[str, Dict] = ");
    write_python_literal(&descriptor_entries(plugins), 0, &mut out);
    out.push('\n');
    out.push_str(HELPERS);
    out
}

/// Serialize JSON as a Python literal (`true` -> `True`, `null` -> `None`)
fn write_python_literal(value: &Value, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent + 1);
    let close_pad = "  ".repeat(indent);

    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        // JSON string escapes are valid Python string escapes
        Value::String(s) => out.push_str(&Value::String(s.clone()).to_string()),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&pad);
                write_python_literal(item, indent + 1, out);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close_pad);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            let len = map.len();
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(&pad);
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_python_literal(item, indent + 1, out);
                if i + 1 < len {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close_pad);
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::registry::tests::{create_test_store, sample_manifest};
    use crate::plugin::types::PluginTool;

    #[test]
    fn test_python_literal_keywords() {
        let mut out = String::new();
        write_python_literal(&json!({"a": true, "b": null, "c": [false, 1.5], "d": "x\"y"}), 0, &mut out);
        assert_eq!(
            out,
            "{\n  \"a\": True,\n  \"b\": None,\n  \"c\": [\n    False,\n    1.5\n  ],\n  \"d\": \"x\\\"y\"\n}"
        );
    }

    #[test]
    fn test_render_lists_tools() {
        let mut manifest = sample_manifest("sample-tool");
        manifest.tools = vec![PluginTool {
            name: "measure_room".to_string(),
            description: "Measure".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "width": { "type": "number", "description": "Width in mm", "minimum": 0 }
                },
                "required": ["width"]
            }),
        }];
        let plugin = InstalledPlugin {
            manifest,
            installed_at: chrono::Utc::now(),
            path: PathBuf::from("/plugins/sample-tool"),
            enabled: true,
        };

        let rendered = render(&[plugin]);

        assert!(rendered.starts_with("# Auto-generated plugin integration file"));
        assert!(rendered.contains("\"sample-tool\": {"));
        assert!(rendered.contains("\"measure_room\""));
        assert!(rendered.contains("\"entryPoint\": \"main.py\""));
        assert!(rendered.contains("\"path\": \"/plugins/sample-tool\""));
        assert!(rendered.contains("\"minimum\": 0"));
        assert!(rendered.contains("def execute_plugin_tool"));
    }

    #[test]
    fn test_render_empty() {
        let rendered = render(&[]);
        assert!(rendered.contains("INSTALLED_PLUGINS: Dict[str, Dict] = {}\n"));
    }

    #[test]
    fn test_generate_skips_disabled() {
        let (store, temp) = create_test_store();
        store
            .upsert(sample_manifest("on"), temp.path().join("on"), Scope::Local)
            .unwrap();
        store
            .upsert(sample_manifest("off"), temp.path().join("off"), Scope::Local)
            .unwrap();
        store.set_enabled("off", false, Scope::Local).unwrap();

        let generator = IntegrationGenerator::new(temp.path().join("backend/plugins"));
        let path = generator.generate(&store, Scope::Local).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"on\": {"));
        assert!(!content.contains("\"off\": {"));
        assert!(generator.output_dir().join(INIT_FILE).exists());
    }

    #[test]
    fn test_generate_keeps_existing_init() {
        let (store, temp) = create_test_store();
        let generator = IntegrationGenerator::new(temp.path().join("out"));
        fs::create_dir_all(generator.output_dir()).unwrap();
        fs::write(generator.output_dir().join(INIT_FILE), "# custom\n").unwrap();

        generator.generate(&store, Scope::Global).unwrap();

        assert_eq!(
            fs::read_to_string(generator.output_dir().join(INIT_FILE)).unwrap(),
            "# custom\n"
        );
    }
}
