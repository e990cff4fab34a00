//! CLI command handlers

use std::path::Path;

use anyhow::{Context, Result};
use tabled::{Table, settings::Style};
use tracing::{Level, event};

use crate::{
    adapter::{
        control::run_flow,
        persist::{load_actor, save_actor},
        registry::ClassRegistry
    },
    config::Settings,
    domain::constant::flow,
    port::actor::{Actor, Lifecycle}
};

/// Loads a flow and runs its setup without executing it
pub fn check_flow(path: &Path, registry: &ClassRegistry) -> Result<Box<dyn Actor>> {
    let mut actor = load_actor(path, registry).with_context(|| format!("Failed to load flow {}", path.display()))?;
    let result = actor.setup();
    actor.clean_up();
    result.with_context(|| format!("Flow {} failed its checks", path.display()))?;
    Ok(actor)
}

/// Re-serializes a flow file; the formats follow the file extensions
pub fn convert_flow(input: &Path, output: &Path, skip_default: bool, registry: &ClassRegistry) -> Result<()> {
    let actor = load_actor(input, registry).with_context(|| format!("Failed to load flow {}", input.display()))?;
    save_actor(actor.as_ref(), output, skip_default)
        .with_context(|| format!("Failed to save flow {}", output.display()))?;
    Ok(())
}

/// Renders the class listing
pub fn class_table(registry: &ClassRegistry, filter: Option<&str>) -> Option<String> {
    let rows = registry.describe(filter);
    if rows.is_empty() {
        return None;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    Some(table.to_string())
}

/// Handle the run command - execute a flow until it finishes or Ctrl-C stops it
pub fn handle_run_command(file: &str, settings: &Settings) -> Result<()> {
    let registry = ClassRegistry::with_defaults();
    let path = settings.resolve_flow(file);
    let mut actor = load_actor(&path, &registry).with_context(|| format!("Failed to load flow {}", path.display()))?;

    let stop = actor.base().stop_signal();
    ctrlc::set_handler(move || {
        event!(Level::WARN, event = flow::INTERRUPTED, source = "ctrl-c");
        stop.set();
    })
    .context("Failed to install the Ctrl-C handler")?;

    run_flow(actor.as_mut()).with_context(|| format!("Flow {} failed", path.display()))?;
    if actor.is_stopped() {
        println!("Flow '{}' was stopped", actor.full_name());
    }
    Ok(())
}

/// Handle the check command
pub fn handle_check_command(file: &str, settings: &Settings) -> Result<()> {
    let registry = ClassRegistry::with_defaults();
    let path = settings.resolve_flow(file);
    let actor = check_flow(&path, &registry)?;
    println!("Flow '{}' ({}) is valid", actor.full_name(), path.display());
    Ok(())
}

/// Handle the list command
pub fn handle_list_command(filter: Option<&str>) -> Result<()> {
    let registry = ClassRegistry::with_defaults();
    match class_table(&registry, filter) {
        Some(table) => println!("{}", table),
        None => println!("No classes match '{}'", filter.unwrap_or_default())
    }
    Ok(())
}

/// Handle the help command
pub fn handle_help_command(class: &str) -> Result<()> {
    let registry = ClassRegistry::with_defaults();
    let help = registry.help(class).with_context(|| format!("No help available for '{}'", class))?;
    println!("{}", help);
    Ok(())
}

/// Handle the convert command
pub fn handle_convert_command(input: &str, output: &str, all: bool, settings: &Settings) -> Result<()> {
    let registry = ClassRegistry::with_defaults();
    let input = settings.resolve_flow(input);
    let output = Path::new(output);
    convert_flow(&input, output, settings.skip_defaults && !all, &registry)?;
    println!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{Value as JsonValue, json};
    use tempfile::TempDir;

    use super::*;

    fn counting_flow() -> JsonValue {
        json!({
            "class": "controls.Flow",
            "options": {
                "name": "counting",
                "actors": [
                    {"class": "sources.ForLoop", "options": {"end": 3}},
                    {"class": "sinks.Null", "options": {}}
                ]
            }
        })
    }

    #[test]
    fn test_check_valid_flow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counting.json");
        fs::write(&path, counting_flow().to_string()).unwrap();

        let actor = check_flow(&path, &ClassRegistry::with_defaults()).unwrap();
        assert_eq!(actor.full_name(), "counting");
    }

    #[test]
    fn test_check_reports_structural_problems() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sinkless.yaml");
        fs::write(&path, "class: controls.Flow\noptions:\n  actors:\n    - class: sinks.Null\n").unwrap();

        let err = check_flow(&path, &ClassRegistry::with_defaults()).unwrap_err();
        assert!(err.to_string().contains("failed its checks"));
    }

    #[test]
    fn test_convert_json_to_yaml() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("counting.json");
        let output = dir.path().join("out/counting.yaml");
        fs::write(&input, counting_flow().to_string()).unwrap();

        let registry = ClassRegistry::with_defaults();
        convert_flow(&input, &output, true, &registry).unwrap();

        let yaml: JsonValue = serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(yaml, counting_flow());
    }

    #[test]
    fn test_class_table() {
        let registry = ClassRegistry::with_defaults();
        let table = class_table(&registry, Some("forloop")).unwrap();
        assert!(table.contains("sources.ForLoop"));
        assert!(table.contains("Description"));
        assert!(class_table(&registry, Some("no-such-class")).is_none());
    }
}
