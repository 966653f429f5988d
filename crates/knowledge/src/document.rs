//! The school knowledge document.
//!
//! The JSON file is converted once into a typed tree of [`KnowledgeValue`]
//! nodes. Mappings keep the key order of the source file, which matters for
//! listings such as the available majors.

use schoolbot_core::{AppError, AppResult};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// A node of the knowledge tree.
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<KnowledgeValue>),
    Map(KnowledgeMap),
}

/// Ordered string-keyed mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeMap {
    entries: Vec<(String, KnowledgeValue)>,
}

impl KnowledgeMap {
    pub fn get(&self, key: &str) -> Option<&KnowledgeValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KnowledgeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, KnowledgeValue)> for KnowledgeMap {
    fn from_iter<I: IntoIterator<Item = (String, KnowledgeValue)>>(iter: I) -> Self {
        let mut map = KnowledgeMap::default();
        for (key, value) in iter {
            // Later duplicates replace earlier ones, as in JSON parsers
            match map.entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => map.entries.push((key, value)),
            }
        }
        map
    }
}

impl KnowledgeValue {
    pub fn as_map(&self) -> Option<&KnowledgeMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Strings, numbers and booleans.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Number(_) | Self::Text(_))
    }

    /// Whether the value carries nothing worth showing.
    ///
    /// Numbers and booleans always count as present, so a school reporting
    /// zero of something still gets a direct answer.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

impl From<Value> for KnowledgeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(object) => Self::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for KnowledgeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// The immutable school data document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeDocument {
    root: KnowledgeMap,
    loaded: bool,
}

impl KnowledgeDocument {
    /// An empty document (degraded mode).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a document from JSON text. The top level must be an object.
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(value)
    }

    /// Build a document from an already parsed JSON value.
    pub fn from_json(value: Value) -> AppResult<Self> {
        match KnowledgeValue::from(value) {
            KnowledgeValue::Map(root) => Ok(Self { root, loaded: true }),
            other => Err(AppError::Knowledge(format!(
                "Knowledge document must be a JSON object, found {}",
                kind_name(&other)
            ))),
        }
    }

    /// Read and parse the document at `path`.
    pub fn read(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load the document at `path`, degrading to an empty document.
    ///
    /// A missing or malformed file is logged and never aborts startup.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::read(path) {
            Ok(document) => {
                tracing::info!(
                    path = %path.display(),
                    sections = document.root.len(),
                    "Loaded school knowledge"
                );
                document
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "School knowledge unavailable, continuing with an empty document"
                );
                Self::empty()
            }
        }
    }

    /// Whether the document came from a source file.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Top-level section names in file order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    /// Resolve `path` by sequential mapping lookups.
    ///
    /// Returns `None` when a key is missing or an intermediate node is not a
    /// mapping. An empty path resolves to nothing.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&KnowledgeValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(first.as_ref())?;
        for key in rest {
            current = current.as_map()?.get(key.as_ref())?;
        }
        Some(current)
    }

    /// Resolve `path` and keep it only if it carries a non-empty value.
    pub fn resolve_present<S: AsRef<str>>(&self, path: &[S]) -> Option<&KnowledgeValue> {
        self.resolve(path).filter(|value| !value.is_empty())
    }
}

fn kind_name(value: &KnowledgeValue) -> &'static str {
    match value {
        KnowledgeValue::Null => "null",
        KnowledgeValue::Bool(_) => "a boolean",
        KnowledgeValue::Number(_) => "a number",
        KnowledgeValue::Text(_) => "a string",
        KnowledgeValue::List(_) => "an array",
        KnowledgeValue::Map(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn document() -> KnowledgeDocument {
        KnowledgeDocument::from_json(json!({
            "profile": {
                "nama": "SMKN 4 Bojonegoro",
                "jumlah_siswa": 1200,
                "visi": ""
            },
            "jurusan": {
                "TKJ": {"nama": "Teknik Komputer dan Jaringan"},
                "RPL": {"nama": "Rekayasa Perangkat Lunak"},
                "MM": {"nama": "Multimedia"}
            },
            "fasilitas": ["Lab komputer", "Perpustakaan"]
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_nested_path() {
        let doc = document();
        assert_eq!(
            doc.resolve(&["profile", "nama"]),
            Some(&KnowledgeValue::Text("SMKN 4 Bojonegoro".to_string()))
        );
        assert_eq!(
            doc.resolve(&["profile", "jumlah_siswa"]).map(|v| v.to_string()),
            Some("1200".to_string())
        );
    }

    #[test]
    fn test_missing_key_is_unresolved() {
        let doc = document();
        assert!(doc.resolve(&["profile", "kepala_sekolah"]).is_none());
        assert!(doc.resolve(&["ekstrakurikuler"]).is_none());
        let empty: [&str; 0] = [];
        assert!(doc.resolve(&empty).is_none());
    }

    #[test]
    fn test_non_mapping_intermediate_is_unresolved() {
        let doc = document();
        assert!(doc.resolve(&["fasilitas", "0"]).is_none());
        assert!(doc.resolve(&["profile", "nama", "panjang"]).is_none());
    }

    #[test]
    fn test_resolve_present_skips_empty_text() {
        let doc = document();
        assert!(doc.resolve(&["profile", "visi"]).is_some());
        assert!(doc.resolve_present(&["profile", "visi"]).is_none());
    }

    #[test]
    fn test_mapping_keeps_file_order() {
        let doc = document();
        let jurusan = doc.resolve(&["jurusan"]).and_then(|v| v.as_map()).unwrap();
        let codes: Vec<&str> = jurusan.keys().collect();
        assert_eq!(codes, vec!["TKJ", "RPL", "MM"]);
    }

    #[test]
    fn test_non_object_root_rejected() {
        let result = KnowledgeDocument::from_json_str("[1, 2, 3]");
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = KnowledgeDocument::load_or_empty(&dir.path().join("absent.json"));
        assert!(!doc.is_loaded());
        assert_eq!(doc.sections().count(), 0);
    }

    #[test]
    fn test_load_or_empty_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let doc = KnowledgeDocument::load_or_empty(file.path());
        assert!(!doc.is_loaded());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"profile": {{"kepala_sekolah": "Budi"}}}}"#).unwrap();
        let doc = KnowledgeDocument::load_or_empty(file.path());
        assert!(doc.is_loaded());
        assert_eq!(
            doc.resolve(&["profile", "kepala_sekolah"]).map(|v| v.to_string()),
            Some("Budi".to_string())
        );
    }

    #[test]
    fn test_display_list_and_scalars() {
        let value = KnowledgeValue::from(json!(["Lab", 3, true]));
        assert_eq!(value.to_string(), "Lab, 3, true");
    }
}
