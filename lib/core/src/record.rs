use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// One column of a tabular schema: a name and its free-text description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub name: String,
    pub description: String,
}

impl ColumnRecord {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Which text of a record feeds the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Description,
    /// `"<name>: <description>"`
    Combined,
}

impl Field {
    pub fn text<'a>(&self, record: &'a ColumnRecord) -> Cow<'a, str> {
        match self {
            Field::Name => Cow::Borrowed(&record.name),
            Field::Description => Cow::Borrowed(&record.description),
            Field::Combined => Cow::Owned(format!("{}: {}", record.name, record.description)),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Description => write!(f, "description"),
            Field::Combined => write!(f, "combined"),
        }
    }
}

/// On-disk shape of a schema document. Fields other than `columns` are ignored.
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    columns: Vec<ColumnRecord>,
}

/// An ordered list of columns loaded from one file or upload.
///
/// Column names are expected to be unique but this is not enforced; lookups
/// return the first column with a given name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Where the schema came from (file path, upload name, ...)
    pub label: String,
    pub columns: Vec<ColumnRecord>,
}

impl Schema {
    #[must_use]
    pub fn new(label: impl Into<String>, columns: Vec<ColumnRecord>) -> Self {
        Self {
            label: label.into(),
            columns,
        }
    }

    /// Parse a JSON schema document (`{"columns": [{"name", "description"}, ...]}`)
    pub fn from_json_str(label: impl Into<String>, data: &str) -> Result<Self> {
        let doc: SchemaDocument =
            serde_json::from_str(data).map_err(|e| Error::SchemaParse(e.to_string()))?;
        Ok(Self::new(label, doc.columns))
    }

    /// Same as [`Schema::from_json_str`] for an already decoded JSON value
    pub fn from_json_value(label: impl Into<String>, value: serde_json::Value) -> Result<Self> {
        let doc: SchemaDocument =
            serde_json::from_value(value).map_err(|e| Error::SchemaParse(e.to_string()))?;
        Ok(Self::new(label, doc.columns))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnRecord> {
        self.columns.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnRecord> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Description of the named column, used for hover text in review UIs
    pub fn description_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|c| c.description.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Parse a schema document held in memory
pub fn load_schema(data: &str) -> Result<Schema> {
    Schema::from_json_str("inline", data)
}

/// Read and parse a schema document from disk, labelled with its path
pub fn load_schema_from_path<P: AsRef<Path>>(path: P) -> Result<Schema> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    let schema = Schema::from_json_str(path.display().to_string(), &data)?;
    tracing::debug!(path = %path.display(), columns = schema.len(), "Loaded schema");
    Ok(schema)
}
