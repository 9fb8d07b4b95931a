//! Column-level difference between a stored record and a proposed one.

use std::fmt;

use crate::domain::record::{FieldValue, Record, Snapshot};

/// The columns whose proposed value differs from the stored value.
///
/// Columns keep the order of the proposed snapshot. The identity column is
/// never part of a change set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    changes: Vec<(&'static str, FieldValue)>,
}

impl ChangeSet {
    /// Compares two snapshots field by field.
    pub fn between(id_column: &str, stored: &Snapshot, proposed: &Snapshot) -> Self {
        let changes = proposed
            .iter()
            .filter(|(column, _)| *column != id_column)
            .filter(|(column, value)| stored.get(column) != Some(*value))
            .map(|(column, value)| (column, value.clone()))
            .collect();

        Self { changes }
    }

    /// Compares two records of the same variant.
    pub fn of<R: Record>(stored: &R, proposed: &R) -> Self {
        Self::between(R::SCHEMA.id_column, &stored.snapshot(), &proposed.snapshot())
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.changes
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changes.iter().map(|(c, _)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.changes.iter().map(|(c, v)| (*c, v))
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (column, value)) in self.changes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}: {value}")?;
        }
        f.write_str("}")
    }
}
