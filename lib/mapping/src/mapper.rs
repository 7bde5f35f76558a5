//! Schema Mapper
//!
//! Matches every data model column to the source column whose description
//! is closest, producing an ordered [`Mapping`].

use crate::matcher::{best_match, best_match_with_score, IndexCache};
use colmatch_core::{EmbeddingError, Field, Schema, TextEmbedder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One row of a mapping: a data model column and its assigned source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub column: String,
    /// `None` when no source column is assigned
    pub source: Option<String>,
}

/// Ordered association from data model columns to source columns.
///
/// Holds one entry per data model column, in data model order. Lookups by
/// name resolve to the first entry with that name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn get(&self, column: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.column == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Source column assigned to `column`, if any
    pub fn source_for(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(|e| e.source.as_deref())
    }

    /// Reassign `column`. Returns false if the column is not in the mapping.
    pub fn set(&mut self, column: &str, source: Option<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.column == column) {
            Some(entry) => {
                entry.source = source;
                true
            }
            None => false,
        }
    }

    /// Data model columns with no source column
    pub fn unmapped(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.source.is_none())
            .map(|e| e.column.as_str())
    }
}

/// Best match for one query, with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub name: String,
    pub description: String,
    pub score: f32,
}

/// Name-based and description-based best matches for one data model column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub description: String,
    pub by_name: Option<ScoredMatch>,
    pub by_description: Option<ScoredMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub columns: Vec<ColumnReport>,
}

/// Maps data model schemas onto one source schema.
///
/// Source indexes live in an [`IndexCache`], so however many times `map` is
/// called and however many columns the data model has, each source field is
/// embedded once.
#[derive(Debug)]
pub struct SchemaMapper {
    source: IndexCache,
}

impl SchemaMapper {
    pub fn new(embedder: Arc<dyn TextEmbedder>, source: Arc<Schema>) -> Self {
        Self {
            source: IndexCache::new(embedder, source),
        }
    }

    pub fn source(&self) -> &Arc<Schema> {
        self.source.schema()
    }

    pub fn cache(&self) -> &IndexCache {
        &self.source
    }

    /// Match every data model column by description.
    ///
    /// Columns are queried in parallel; the result keeps data model order.
    /// Any embedding failure discards the whole mapping.
    pub fn map(&self, data_model: &Schema) -> Result<Mapping, EmbeddingError> {
        let index = self.source.get(Field::Description)?;

        let entries = data_model
            .columns
            .par_iter()
            .map(|column| {
                let matched = best_match(&column.description, &index)?;
                Ok(MappingEntry {
                    column: column.name.clone(),
                    source: matched.map(|record| record.name.clone()),
                })
            })
            .collect::<Result<Vec<_>, EmbeddingError>>()?;

        let mapping = Mapping::new(entries);
        tracing::info!(
            source = %self.source().label,
            data_model = %data_model.label,
            columns = mapping.len(),
            unmapped = mapping.unmapped().count(),
            "Computed mapping"
        );
        Ok(mapping)
    }

    /// Best source match for each data model column by name and by description
    pub fn report(&self, data_model: &Schema) -> Result<MatchReport, EmbeddingError> {
        let (names, descriptions) = self.source.get_pair(Field::Name, Field::Description)?;

        let scored = |hit: Option<(&colmatch_core::ColumnRecord, f32)>| {
            hit.map(|(record, score)| ScoredMatch {
                name: record.name.clone(),
                description: record.description.clone(),
                score,
            })
        };

        let columns = data_model
            .columns
            .par_iter()
            .map(|column| {
                Ok(ColumnReport {
                    column: column.name.clone(),
                    description: column.description.clone(),
                    by_name: scored(best_match_with_score(&column.name, &names)?),
                    by_description: scored(best_match_with_score(&column.description, &descriptions)?),
                })
            })
            .collect::<Result<Vec<_>, EmbeddingError>>()?;

        Ok(MatchReport { columns })
    }
}

/// One-shot mapping of `data_model` onto `source`
pub fn propose_mapping(
    embedder: Arc<dyn TextEmbedder>,
    data_model: &Schema,
    source: &Schema,
) -> Result<Mapping, EmbeddingError> {
    SchemaMapper::new(embedder, Arc::new(source.clone())).map(data_model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmatch_core::{ColumnRecord, HashingEmbedder};

    fn embedder() -> Arc<dyn TextEmbedder> {
        Arc::new(HashingEmbedder::default())
    }

    fn schema(label: &str, columns: &[(&str, &str)]) -> Schema {
        Schema::new(
            label,
            columns.iter().map(|(n, d)| ColumnRecord::new(*n, *d)).collect(),
        )
    }

    fn data_model() -> Schema {
        schema(
            "data_model",
            &[
                ("cust_id", "unique customer identifier"),
                ("mail_addr", "customer mailing address"),
                ("birth_date", "date of birth"),
            ],
        )
    }

    fn source() -> Schema {
        schema(
            "source",
            &[
                ("dob", "date of birth of the customer"),
                ("id", "unique customer identifier"),
                ("addr", "mailing address"),
            ],
        )
    }

    #[test]
    fn test_one_entry_per_column_in_order() {
        let mapping = propose_mapping(embedder(), &data_model(), &source()).unwrap();
        let columns: Vec<&str> = mapping.iter().map(|e| e.column.as_str()).collect();
        assert_eq!(columns, vec!["cust_id", "mail_addr", "birth_date"]);
        assert_eq!(mapping.source_for("cust_id"), Some("id"));
        assert_eq!(mapping.source_for("mail_addr"), Some("addr"));
        assert_eq!(mapping.source_for("birth_date"), Some("dob"));
    }

    #[test]
    fn test_deterministic() {
        let first = propose_mapping(embedder(), &data_model(), &source()).unwrap();
        let second = propose_mapping(embedder(), &data_model(), &source()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_source_maps_to_none() {
        let empty = schema("empty", &[]);
        let mapping = propose_mapping(embedder(), &data_model(), &empty).unwrap();
        assert_eq!(mapping.len(), 3);
        assert!(mapping.iter().all(|e| e.source.is_none()));
        assert_eq!(mapping.unmapped().count(), 3);
    }

    #[test]
    fn test_duplicate_source_descriptions_first_wins() {
        let source = schema(
            "source",
            &[("id_a", "customer identifier"), ("id_b", "customer identifier")],
        );
        let dm = schema("dm", &[("cust", "customer identifier")]);
        let mapping = propose_mapping(embedder(), &dm, &source).unwrap();
        assert_eq!(mapping.source_for("cust"), Some("id_a"));
    }

    #[test]
    fn test_embedding_failure_discards_mapping() {
        let dm = schema("dm", &[("cust_id", "unique customer identifier"), ("blank", "")]);
        let result = propose_mapping(embedder(), &dm, &source());
        assert_eq!(result, Err(EmbeddingError::EmptyInput));
    }

    #[test]
    fn test_repeated_map_reuses_index() {
        let mapper = SchemaMapper::new(embedder(), Arc::new(source()));
        let first = mapper.map(&data_model()).unwrap();
        let second = mapper.map(&data_model()).unwrap();
        assert_eq!(first, second);
        assert_eq!(mapper.cache().builds(), 1);
    }

    #[test]
    fn test_report_includes_name_and_description_matches() {
        let mapper = SchemaMapper::new(embedder(), Arc::new(source()));
        let dm = schema("dm", &[("id", "unique customer identifier")]);
        let report = mapper.report(&dm).unwrap();

        let row = &report.columns[0];
        assert_eq!(row.column, "id");
        assert_eq!(row.by_name.as_ref().unwrap().name, "id");
        assert_eq!(row.by_description.as_ref().unwrap().name, "id");
        assert_eq!(mapper.cache().builds(), 2);
    }

    #[test]
    fn test_mapping_set() {
        let mut mapping = propose_mapping(embedder(), &data_model(), &source()).unwrap();
        assert!(mapping.set("cust_id", Some("addr".to_string())));
        assert_eq!(mapping.source_for("cust_id"), Some("addr"));
        assert!(!mapping.set("missing", None));
    }

    #[test]
    fn test_mapping_serializes_as_list() {
        let mapping = Mapping::new(vec![
            MappingEntry { column: "cust_id".to_string(), source: Some("id".to_string()) },
            MappingEntry { column: "other".to_string(), source: None },
        ]);
        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"column": "cust_id", "source": "id"},
                {"column": "other", "source": null}
            ])
        );
    }
}
