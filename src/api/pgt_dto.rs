use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::Result;

/// Reference to another drop. Older unroller versions emit a plain oid, newer
/// versions a single entry map of `oid -> port name`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum DropRefDto {
    Oid(String),
    Port(BTreeMap<String, serde_json::Value>),
}

impl DropRefDto {
    pub fn oid(&self) -> Option<&str> {
        match self {
            DropRefDto::Oid(oid) => Some(oid.as_str()),
            DropRefDto::Port(map) => map.keys().next().map(|k| k.as_str()),
        }
    }
}

/// One drop of a physical graph template as written by `dlg unroll`.
///
/// Application drops carry an `app` entry, data drops a `storage` entry with
/// their producing and consuming applications.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PgtElementDto {
    #[serde(default)]
    pub oid: Option<String>,

    /// Display name of the drop; for applications this is the component name.
    #[serde(default)]
    pub nm: Option<String>,

    #[serde(default)]
    pub app: Option<serde_json::Value>,

    #[serde(default)]
    pub storage: Option<serde_json::Value>,

    #[serde(default)]
    pub producers: Option<Vec<DropRefDto>>,

    #[serde(default)]
    pub consumers: Option<Vec<DropRefDto>>,
}

impl PgtElementDto {
    pub fn is_app(&self) -> bool {
        self.app.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.storage.is_some() && self.producers.is_some() && self.consumers.is_some()
    }
}

/// Parses the unroller output. Non-object entries (e.g. the graph name or
/// reproducibility metadata) are skipped; a nested list of drops is flattened.
pub fn parse_pgt(json: &str) -> Result<Vec<PgtElementDto>> {
    let root: serde_json::Value = serde_json::from_str(json)?;
    let mut elements = Vec::new();
    collect_elements(root, &mut elements)?;
    Ok(elements)
}

fn collect_elements(value: serde_json::Value, elements: &mut Vec<PgtElementDto>) -> Result<()> {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_elements(item, elements)?;
            }
        }
        serde_json::Value::Object(map) if map.contains_key("oid") => {
            elements.push(serde_json::from_value(serde_json::Value::Object(map))?);
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_port_references() {
        let json = r#"[
            "pgt_name",
            [
                {"oid": "1_0", "nm": "Grid", "app": "dlg.apps.simple.SleepApp"},
                {"oid": "1_1", "nm": "Gather", "app": "dlg.apps.simple.SleepApp"},
                {"oid": "2_0", "nm": "memory", "storage": "Memory",
                 "producers": ["1_0"], "consumers": [{"1_1": "input"}]}
            ],
            {"reprodata": {"rmode": "1"}}
        ]"#;

        let elements = parse_pgt(json).unwrap();

        assert_eq!(elements.len(), 3);
        assert!(elements[0].is_app());
        assert!(elements[2].is_data());
        let consumers = elements[2].consumers.as_ref().unwrap();
        assert_eq!(consumers[0].oid(), Some("1_1"));
        assert_eq!(elements[2].producers.as_ref().unwrap()[0].oid(), Some("1_0"));
    }

    #[test]
    fn test_storage_without_consumers_is_not_data() {
        let json = r#"[{"oid": "2_0", "storage": "File", "producers": ["1_0"]}]"#;
        let elements = parse_pgt(json).unwrap();
        assert!(!elements[0].is_data());
    }
}
