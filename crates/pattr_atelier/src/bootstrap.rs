//! Page bootstrap: engine options, embedded JSON and remote data sources.

use pattr_croquis::{Object, Value};
use pattr_relief::{Document, NodeId};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, FetchError};

/// Element ids the engine reads at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Element to hydrate (default: the document element)
    pub root_id: Option<String>,
    /// Element holding the root data JSON
    pub root_data_id: String,
    /// Element holding local UI-state JSON merged over the root data
    pub local_data_id: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            root_id: None,
            root_data_id: "p-root-data".to_string(),
            local_data_id: Some("p-local-data".to_string()),
        }
    }
}

/// Source of remote scope data referenced by `p-src`
pub trait DataSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> DataSource for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self(url)
    }
}

/// Parse text as a JSON object
pub fn parse_object(text: &str, origin: &str) -> Result<Object, EngineError> {
    if text.trim().is_empty() {
        return Ok(Object::new());
    }
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|err| EngineError::InvalidJson {
            origin: origin.to_string(),
            message: err.to_string(),
        })?;
    match Value::from_json(json) {
        Value::Object(object) => Ok(object),
        _ => Err(EngineError::NotAnObject {
            origin: origin.to_string(),
        }),
    }
}

/// Parse text as a JSON object, logging failures and falling back to `{}`
pub fn parse_object_or_empty(text: &str, origin: &str) -> Object {
    parse_object(text, origin).unwrap_or_else(|err| {
        tracing::error!("{}; using an empty object", err);
        Object::new()
    })
}

/// Root data: the root data element merged with the local data element
pub fn read_root_data(doc: &Document, options: &EngineOptions) -> Object {
    let mut data = read_embedded(doc, &options.root_data_id).unwrap_or_default();
    if let Some(local_id) = &options.local_data_id {
        if let Some(local) = read_embedded(doc, local_id) {
            data.extend(local);
        }
    }
    data
}

fn read_embedded(doc: &Document, id: &str) -> Option<Object> {
    let Some(element) = doc.get_element_by_id(id) else {
        tracing::debug!("no #{} element", id);
        return None;
    };
    Some(parse_object_or_empty(
        &doc.text_content(element),
        &format!("#{}", id),
    ))
}

/// Element the engine hydrates
pub fn find_root(doc: &Document, options: &EngineOptions) -> Result<NodeId, EngineError> {
    match &options.root_id {
        Some(id) => doc
            .get_element_by_id(id)
            .ok_or_else(|| EngineError::RootNotFound(format!("#{}", id))),
        None => doc
            .document_element()
            .ok_or_else(|| EngineError::RootNotFound("document element".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use pattr_armature::parse;

    use super::*;

    #[test]
    fn test_root_data_merges_local() {
        let (doc, _) = parse(
            r#"<html>
<script id="p-root-data" type="application/json">{"count": 1, "open": false}</script>
<script id="p-local-data" type="application/json">{"open": true}</script>
</html>"#,
        );
        let data = read_root_data(&doc, &EngineOptions::default());
        assert_eq!(data.get("count"), Some(&Value::from(1)));
        assert_eq!(data.get("open"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_malformed_json_falls_back_to_empty() {
        let (doc, _) =
            parse(r#"<html><script id="p-root-data">{"count": </script></html>"#);
        assert!(read_root_data(&doc, &EngineOptions::default()).is_empty());
    }

    #[test]
    fn test_parse_object_errors() {
        assert!(matches!(
            parse_object("[1]", "test"),
            Err(EngineError::NotAnObject { .. })
        ));
        assert!(matches!(
            parse_object("{", "test"),
            Err(EngineError::InvalidJson { .. })
        ));
        assert!(parse_object("  ", "test").unwrap().is_empty());
    }

    #[test]
    fn test_find_root() {
        let (doc, _) = parse(r#"<html><div id="app"></div></html>"#);
        let options = EngineOptions {
            root_id: Some("app".into()),
            ..EngineOptions::default()
        };
        assert_eq!(find_root(&doc, &options).unwrap(), doc.get_element_by_id("app").unwrap());
        let missing = EngineOptions {
            root_id: Some("nope".into()),
            ..EngineOptions::default()
        };
        assert!(matches!(find_root(&doc, &missing), Err(EngineError::RootNotFound(_))));
    }
}
