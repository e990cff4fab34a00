//! Serialized actor descriptions
//!
//! An actor is stored as `{"class": <registry key>, "options": {...}}`, with
//! nested actors and conditions using the same record shape. Files are JSON
//! (`.json`) or YAML (`.yaml`, `.yml`).

use std::{fs, path::Path};

use serde_json::{Map, Value as JsonValue, json};
use tracing::{Level, event};

use crate::{
    adapter::registry::ClassRegistry,
    domain::{
        constant::flow,
        error::{FlowError, Result}
    },
    port::{
        actor::{Actor, Lifecycle, make_names_unique},
        condition::BooleanCondition
    }
};

pub const CLASS_KEY: &str = "class";
pub const OPTIONS_KEY: &str = "options";

/// On-disk representation of a flow file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml
}

impl FileFormat {
    /// Picks the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            _ => Err(FlowError::Serialization(format!("Unsupported flow file extension: {}", path.display())))
        }
    }

    pub fn parse(&self, text: &str) -> Result<JsonValue> {
        Ok(match self {
            FileFormat::Json => serde_json::from_str(text)?,
            FileFormat::Yaml => serde_yaml::from_str(text)?
        })
    }

    pub fn render(&self, value: &JsonValue) -> Result<String> {
        Ok(match self {
            FileFormat::Json => serde_json::to_string_pretty(value)?,
            FileFormat::Yaml => serde_yaml::to_string(value)?
        })
    }
}

pub fn actor_to_dict<A>(actor: &A, skip_default: bool) -> Result<JsonValue>
where
    A: Actor + ?Sized
{
    Ok(json!({
        CLASS_KEY: actor.class_name(),
        OPTIONS_KEY: actor.base().options().to_dict(skip_default)?
    }))
}

pub fn condition_to_dict<C>(condition: &C, skip_default: bool) -> Result<JsonValue>
where
    C: BooleanCondition + ?Sized
{
    Ok(json!({
        CLASS_KEY: condition.class_name(),
        OPTIONS_KEY: condition.base().options.to_dict(skip_default)?
    }))
}

/// Splits a `{class, options}` record into its parts
fn split_record(json: &JsonValue) -> Result<(&str, Option<&Map<String, JsonValue>>)> {
    let record = json
        .as_object()
        .ok_or_else(|| FlowError::Serialization(format!("Expected a {{class, options}} object, got: {}", json)))?;
    let class = record
        .get(CLASS_KEY)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| FlowError::Serialization(format!("Missing '{}' key in: {}", CLASS_KEY, json)))?;
    let options = match record.get(OPTIONS_KEY) {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Object(options)) => Some(options),
        Some(other) => {
            return Err(FlowError::Serialization(format!("'{}' of {} must be an object: {}", OPTIONS_KEY, class, other)));
        }
    };
    Ok((class, options))
}

/// Instantiates the registered class and applies the serialized options
pub fn dict_to_actor(json: &JsonValue, registry: &ClassRegistry) -> Result<Box<dyn Actor>> {
    let (class, options) = split_record(json)?;
    let mut actor = registry.create_actor(class)?;
    if let Some(options) = options {
        actor.base_mut().options_mut().from_dict(options, registry)?;
    }
    make_names_unique(&mut actor.base_mut().children_mut());
    actor.refresh();
    Ok(actor)
}

pub fn dict_to_condition(json: &JsonValue, registry: &ClassRegistry) -> Result<Box<dyn BooleanCondition>> {
    let (class, options) = split_record(json)?;
    let mut condition = registry.create_condition(class)?;
    if let Some(options) = options {
        condition.base_mut().options.from_dict(options, registry)?;
    }
    Ok(condition)
}

/// Parses an actor description from text in the given format
pub fn actor_from_str(text: &str, format: FileFormat, registry: &ClassRegistry) -> Result<Box<dyn Actor>> {
    dict_to_actor(&format.parse(text)?, registry)
}

pub fn actor_to_string(actor: &dyn Actor, format: FileFormat, skip_default: bool) -> Result<String> {
    format.render(&actor.to_dict(skip_default)?)
}

/// Reads an actor from a `.json`/`.yaml` file
pub fn load_actor(path: &Path, registry: &ClassRegistry) -> Result<Box<dyn Actor>> {
    let format = FileFormat::from_path(path)?;
    let text = fs::read_to_string(path)
        .map_err(|e| FlowError::FileSystem(format!("Failed to read flow file {}: {}", path.display(), e)))?;
    let actor = actor_from_str(&text, format, registry)?;
    event!(Level::DEBUG, event = flow::FLOW_LOADED, path = %path.display(), class = actor.class_name());
    Ok(actor)
}

/// Writes an actor to a `.json`/`.yaml` file, creating parent directories
pub fn save_actor(actor: &dyn Actor, path: &Path, skip_default: bool) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    let text = actor_to_string(actor, format, skip_default)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| FlowError::FileSystem(format!("Failed to create directory {}: {}", parent.display(), e)))?;
    }
    fs::write(path, text)
        .map_err(|e| FlowError::FileSystem(format!("Failed to write flow file {}: {}", path.display(), e)))?;
    event!(Level::DEBUG, event = flow::FLOW_SAVED, path = %path.display());
    Ok(())
}
