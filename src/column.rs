//! Column descriptor table.
//!
//! Static per-scan mapping of compressed-input columns to logical output
//! columns, classified as segmentby, compressed, count-metadata, or
//! sequence-metadata.

use crate::error::{OperatorError, Result};

/// Maximum logical rows per compressed batch.
pub const N_MAX: usize = 1024;

/// The logical SQL-ish type carried by a column. Only the handful of
/// numeric types the vectorized predicate evaluator and aggregator know how
/// to work with directly; anything else still round-trips as a blob but is
/// never bulk-ok.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Int32,
    Int64,
    Float32,
    Float64,
    /// Anything the operator passes through opaquely (text, UDTs, ...).
    /// Never eligible for bulk decompression.
    Opaque,
}

impl LogicalType {
    /// Width in bytes of one element's value buffer slot. `Opaque` has no
    /// fixed width and is never used to size an arena.
    pub fn value_width_bytes(self) -> Option<usize> {
        match self {
            LogicalType::Int32 | LogicalType::Float32 => Some(4),
            LogicalType::Int64 | LogicalType::Float64 => Some(8),
            LogicalType::Opaque => None,
        }
    }
}

/// What role a column plays in the compressed input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// One scalar value shared by every row in the batch.
    Segmentby,
    /// An opaque blob decoded to an array of up to `N_MAX` rows.
    Compressed,
    /// Row count metadatum, never exposed to the consumer.
    MetadataCount,
    /// Ordering tag, never exposed to the consumer.
    MetadataSequence,
}

/// Sentinel output position for metadata columns, which are never exposed.
pub const NO_OUTPUT: i32 = -1;

/// (input_position, output_position, kind, logical_type, value_width_bytes,
/// bulk_ok) as a struct.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub input_position: usize,
    pub output_position: i32,
    pub kind: ColumnKind,
    pub logical_type: LogicalType,
    pub value_width_bytes: usize,
    pub bulk_ok: bool,
    /// Human-readable name, used only for error messages and explain output.
    pub name: String,
}

impl ColumnDescriptor {
    fn validate(&self) -> Result<()> {
        match self.kind {
            ColumnKind::Segmentby => Ok(()),
            ColumnKind::Compressed => {
                if self.bulk_ok && self.logical_type.value_width_bytes().is_none() {
                    return Err(OperatorError::PlannerContract(format!(
                        "column {} is marked bulk_ok but has no fixed value width",
                        self.name
                    )));
                }
                Ok(())
            }
            ColumnKind::MetadataCount | ColumnKind::MetadataSequence => {
                if self.output_position != NO_OUTPUT {
                    return Err(OperatorError::PlannerContract(format!(
                        "metadata column {} must not have an output position",
                        self.name
                    )));
                }
                Ok(())
            }
        }
    }
}

/// The full descriptor array for one operator instance, reordered so that
/// `Compressed` descriptors occupy the dense prefix `[0, num_compressed)` —
/// decode, qualifier, and aggregate loops only ever walk that prefix.
pub struct ColumnTable {
    descriptors: Vec<ColumnDescriptor>,
    num_compressed: usize,
}

impl ColumnTable {
    /// Build the table from an arbitrary-order descriptor list, validating
    /// each entry and then stable-partitioning `Compressed` first.
    pub fn build(mut descriptors: Vec<ColumnDescriptor>) -> Result<Self> {
        for d in &descriptors {
            d.validate()?;
        }
        descriptors.sort_by_key(|d| match d.kind {
            ColumnKind::Compressed => 0,
            _ => 1,
        });
        let num_compressed = descriptors
            .iter()
            .filter(|d| d.kind == ColumnKind::Compressed)
            .count();
        Ok(Self {
            descriptors,
            num_compressed,
        })
    }

    pub fn num_compressed(&self) -> usize {
        self.num_compressed
    }

    /// The dense prefix of `Compressed` descriptors.
    pub fn compressed(&self) -> &[ColumnDescriptor] {
        &self.descriptors[..self.num_compressed]
    }

    /// Every descriptor in layout order (compressed prefix first).
    pub fn all(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn segmentby(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.kind == ColumnKind::Segmentby)
    }

    pub fn count_column(&self) -> Result<&ColumnDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.kind == ColumnKind::MetadataCount)
            .ok_or_else(|| {
                OperatorError::PlannerContract("count metadata column is required".into())
            })
    }

    pub fn sequence_column(&self) -> Option<&ColumnDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.kind == ColumnKind::MetadataSequence)
    }

    /// Dense-prefix index of a compressed column by output position, if any.
    pub fn compressed_index_for_output(&self, output_position: i32) -> Option<usize> {
        self.compressed()
            .iter()
            .position(|d| d.output_position == output_position)
    }
}
