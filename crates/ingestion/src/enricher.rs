//! Enricher - static dotted-path overlay
//!
//! Every overlay entry `"a.b.c" = value` walks (creating as needed) the nested
//! maps `a` and `b` and sets `c`, overwriting whatever was there. Entries are
//! applied in overlay order.

use contracts::{FieldValue, Record};

use crate::error::IngestionError;

/// Applies a fixed overlay to every record
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    overlay: Vec<(Vec<String>, FieldValue)>,
}

impl Enricher {
    /// Build from `(dotted path, value)` pairs, keeping their order
    ///
    /// # Errors
    /// `InvalidOverlay` for an empty path or a path with empty segments.
    pub fn new<I, K, V>(overlay: I) -> Result<Self, IngestionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let overlay = overlay
            .into_iter()
            .map(|(path, value)| Ok((split_path(path.as_ref())?, value.into())))
            .collect::<Result<Vec<_>, IngestionError>>()?;
        Ok(Self { overlay })
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overlay.len()
    }

    /// Apply the overlay; an empty overlay returns the record unchanged
    pub fn apply(&self, mut record: Record) -> Record {
        for (path, value) in &self.overlay {
            set_path(&mut record, path, value.clone());
        }
        record
    }
}

fn split_path(path: &str) -> Result<Vec<String>, IngestionError> {
    let segments: Vec<String> = path.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(IngestionError::InvalidOverlay {
            path: path.to_string(),
            message: "path must not contain empty segments".to_string(),
        });
    }
    Ok(segments)
}

fn set_path(record: &mut Record, path: &[String], value: FieldValue) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let mut node = record;
    for segment in parents {
        node = node.nested_mut(segment);
    }
    node.insert(leaf.clone(), value);
}
