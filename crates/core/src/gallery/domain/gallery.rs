use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::shared::embedding::Embedding;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("embedding for {identifier} has dimension {found}, gallery uses {expected}")]
    DimensionMismatch {
        identifier: String,
        expected: usize,
        found: usize,
    },
    #[error("embedding for {identifier} is empty")]
    EmptyEmbedding { identifier: String },
    #[error("embedding for {identifier} has a non-finite component at position {position}")]
    NonFinite { identifier: String, position: usize },
    #[error("failed to scan reference images in {path}: {source}")]
    Scan {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read gallery {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write gallery {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed gallery: {0}")]
    Format(#[from] serde_json::Error),
}

/// All faces found in one reference image.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryEntry {
    pub identifier: String,
    pub embeddings: Vec<Embedding>,
}

/// Reference embeddings keyed by identifier, in insertion order.
///
/// Iteration order is the order identifiers were first inserted, which
/// makes nearest-neighbour tie-breaking reproducible across runs. Every
/// embedding shares one dimensionality, fixed by the first insert.
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    index: HashMap<String, usize>,
    dim: Option<usize>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds embeddings under `identifier`.
    ///
    /// An empty list is a no-op: images without faces never appear.
    /// Re-inserting an identifier appends to its entry without moving it.
    /// The whole batch is validated before anything is stored.
    pub fn insert(
        &mut self,
        identifier: impl Into<String>,
        embeddings: Vec<Embedding>,
    ) -> Result<(), GalleryError> {
        let identifier = identifier.into();
        if embeddings.is_empty() {
            return Ok(());
        }

        let mut dim = self.dim;
        for e in &embeddings {
            if e.is_empty() {
                return Err(GalleryError::EmptyEmbedding { identifier });
            }
            if let Some(position) = e.as_slice().iter().position(|v| !v.is_finite()) {
                return Err(GalleryError::NonFinite {
                    identifier,
                    position,
                });
            }
            match dim {
                Some(expected) if expected != e.dim() => {
                    return Err(GalleryError::DimensionMismatch {
                        identifier,
                        expected,
                        found: e.dim(),
                    });
                }
                _ => dim = Some(e.dim()),
            }
        }
        self.dim = dim;

        match self.index.get(&identifier) {
            Some(&i) => self.entries[i].embeddings.extend(embeddings),
            None => {
                self.index.insert(identifier.clone(), self.entries.len());
                self.entries.push(GalleryEntry {
                    identifier,
                    embeddings,
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&GalleryEntry> {
        self.index.get(identifier).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Every `(identifier, embedding)` pair in deterministic order.
    pub fn iter_embeddings(&self) -> impl Iterator<Item = (&str, &Embedding)> + '_ {
        self.entries.iter().flat_map(|entry| {
            entry
                .embeddings
                .iter()
                .map(move |e| (entry.identifier.as_str(), e))
        })
    }

    /// Number of reference images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn embedding_count(&self) -> usize {
        self.entries.iter().map(|e| e.embeddings.len()).sum()
    }

    /// Shared dimensionality, `None` while empty.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn to_json(&self) -> Result<String, GalleryError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GalleryError> {
        let raw: OrderedEntries = serde_json::from_str(json)?;
        Self::from_entries(raw.0)
    }

    fn from_entries(entries: Vec<(String, Vec<Embedding>)>) -> Result<Self, GalleryError> {
        let mut gallery = Self::new();
        for (identifier, embeddings) in entries {
            gallery.insert(identifier, embeddings)?;
        }
        Ok(gallery)
    }
}

impl PartialEq for Gallery {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// Serialized as one JSON object: `{ identifier: [[f32; dim], ...], ... }`.
impl Serialize for Gallery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.identifier, &entry.embeddings)?;
        }
        map.end()
    }
}

/// JSON object keys in document order; `serde_json::Map` would sort them.
struct OrderedEntries(Vec<(String, Vec<Embedding>)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from identifier to a list of embeddings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Vec<Embedding>>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn test_insert_keeps_first_insertion_order() {
        let mut g = Gallery::new();
        g.insert("b/2.jpg", vec![emb(&[1.0, 0.0])]).unwrap();
        g.insert("a/1.jpg", vec![emb(&[0.0, 1.0])]).unwrap();
        g.insert("b/2.jpg", vec![emb(&[0.5, 0.5])]).unwrap();

        let ids: Vec<&str> = g.iter_embeddings().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["b/2.jpg", "b/2.jpg", "a/1.jpg"]);
        assert_eq!(g.len(), 2);
        assert_eq!(g.embedding_count(), 3);
    }

    #[test]
    fn test_insert_empty_list_is_noop() {
        let mut g = Gallery::new();
        g.insert("nobody.jpg", vec![]).unwrap();
        assert!(g.is_empty());
        assert!(g.get("nobody.jpg").is_none());
        assert_eq!(g.dim(), None);
    }

    #[test]
    fn test_dimension_fixed_by_first_insert() {
        let mut g = Gallery::new();
        g.insert("a.jpg", vec![emb(&[1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(g.dim(), Some(3));

        let err = g.insert("b.jpg", vec![emb(&[1.0, 2.0])]).unwrap_err();
        assert!(matches!(
            err,
            GalleryError::DimensionMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert!(g.get("b.jpg").is_none());
    }

    #[test]
    fn test_mismatch_within_one_batch_stores_nothing() {
        let mut g = Gallery::new();
        let result = g.insert("a.jpg", vec![emb(&[1.0]), emb(&[1.0, 2.0])]);
        assert!(result.is_err());
        assert!(g.is_empty());
        assert_eq!(g.dim(), None);
    }

    #[test]
    fn test_empty_embedding_rejected() {
        let mut g = Gallery::new();
        let err = g.insert("a.jpg", vec![emb(&[])]).unwrap_err();
        assert!(matches!(err, GalleryError::EmptyEmbedding { .. }));
    }

    #[test]
    fn test_non_finite_component_rejected() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut g = Gallery::new();
            g.insert("s/130.jpg", vec![emb(&[0.5, 0.5])]).unwrap();

            let err = g.insert("s/131.jpg", vec![emb(&[bad, 1.0])]).unwrap_err();

            assert!(matches!(err, GalleryError::NonFinite { position: 0, .. }));
            assert!(g.get("s/131.jpg").is_none());
            assert!(Gallery::from_json(&g.to_json().unwrap()).is_ok());
        }
    }

    #[test]
    fn test_json_roundtrip_preserves_order_and_bits() {
        let mut g = Gallery::new();
        g.insert("z/300.jpg", vec![emb(&[0.1, 0.2]), emb(&[1.0 / 3.0, -2.5e-7])])
            .unwrap();
        g.insert("a/130.jpg", vec![emb(&[0.7, 0.3])]).unwrap();

        let back = Gallery::from_json(&g.to_json().unwrap()).unwrap();

        assert_eq!(back, g);
        let ids: Vec<&str> = back.entries().iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["z/300.jpg", "a/130.jpg"]);
        assert_eq!(
            back.get("z/300.jpg").unwrap().embeddings[1].as_slice()[0].to_bits(),
            (1.0f32 / 3.0).to_bits()
        );
    }

    #[test]
    fn test_json_is_identifier_to_list_of_arrays() {
        let mut g = Gallery::new();
        g.insert("sample/130.jpg", vec![emb(&[1.0, 0.5])]).unwrap();
        assert_eq!(g.to_json().unwrap(), r#"{"sample/130.jpg":[[1.0,0.5]]}"#);
    }

    #[test]
    fn test_from_json_validates_dimensions() {
        let json = r#"{"a.jpg": [[1.0, 2.0]], "b.jpg": [[1.0]]}"#;
        assert!(matches!(
            Gallery::from_json(json),
            Err(GalleryError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        assert!(matches!(
            Gallery::from_json(r#"["not", "a", "map"]"#),
            Err(GalleryError::Format(_))
        ));
    }

    #[test]
    fn test_from_json_empty_object_is_empty_gallery() {
        let g = Gallery::from_json("{}").unwrap();
        assert!(g.is_empty());
    }
}
