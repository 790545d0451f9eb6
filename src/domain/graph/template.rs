use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

/// Shape of the logical graph a pipeline is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphType {
    Prototype,
    Scatter,
    ContImgMvp,
    /// Costed as a whole from the total sizing table instead of per component.
    Pulsar,
}

impl GraphType {
    pub fn is_whole_pipeline(&self) -> bool {
        matches!(self, GraphType::Pulsar)
    }
}

impl FromStr for GraphType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prototype" => Ok(GraphType::Prototype),
            "scatter" => Ok(GraphType::Scatter),
            "cont_img_mvp" | "cont_img_mvp_graph" => Ok(GraphType::ContImgMvp),
            "pulsar" => Ok(GraphType::Pulsar),
            _ => Err(Error::configuration(format!("Graph type '{}' unsupported", s))),
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphType::Prototype => "prototype",
            GraphType::Scatter => "scatter",
            GraphType::ContImgMvp => "cont_img_mvp",
            GraphType::Pulsar => "pulsar",
        };
        write!(f, "{}", name)
    }
}

const NODE_DATA_KEY: &str = "nodeDataArray";

/// An EAGLE logical graph template. The document is read from `path` when needed.
#[derive(Debug, Clone)]
pub struct LogicalGraphTemplate {
    pub path: PathBuf,
    document: Option<Value>,
}

impl LogicalGraphTemplate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LogicalGraphTemplate { path: path.into(), document: None }
    }

    pub fn from_value(path: impl Into<PathBuf>, document: Value) -> Self {
        LogicalGraphTemplate { path: path.into(), document: Some(document) }
    }

    /// File name without extension; the key for pre-unrolled graphs.
    pub fn stem(&self) -> String {
        self.path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    }

    fn document(&self) -> Result<Value> {
        match &self.document {
            Some(document) => Ok(document.clone()),
            None => parse_json_file(&self.path),
        }
    }

    /// Copy of the template with the frequency scatter widened to `parallelism` copies
    /// and every gather collecting `parallelism` inputs.
    pub fn with_parallelism(&self, parallelism: u32) -> Result<Value> {
        let mut document = self.document()?;
        let mut scatter_found = false;

        if let Some(nodes) = document.get_mut(NODE_DATA_KEY).and_then(Value::as_array_mut) {
            for node in nodes {
                let category = node.get("category").and_then(Value::as_str).unwrap_or_default();
                let text = node.get("text").and_then(Value::as_str).unwrap_or_default();

                let field_name = match (category, text) {
                    ("Scatter", "FrequencySplit") => {
                        scatter_found = true;
                        "num_of_copies"
                    }
                    ("Gather", _) => "num_of_inputs",
                    _ => continue,
                };
                set_field(node, field_name, parallelism);
            }
        }

        if !scatter_found {
            log::warn!("Template '{}' has no FrequencySplit scatter; parallelism {} not applied", self.path.display(), parallelism);
        }
        Ok(document)
    }
}

fn set_field(node: &mut Value, name: &str, value: u32) {
    let Some(fields) = node.get_mut("fields").and_then(Value::as_array_mut) else {
        return;
    };
    for field in fields {
        if field.get("name").and_then(Value::as_str) == Some(name) {
            field["value"] = Value::from(value);
        }
    }
}
