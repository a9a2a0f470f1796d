//! Bulk decompression codecs.
//!
//! `BulkDecompressor` is the seam between opaque compressed blobs and the
//! columnar arrays the decode, qualifier, and aggregate loops operate
//! on. The registry dispatches on a codec tag carried alongside each
//! compressed column's bytes; this crate ships two reference codecs so
//! the adapter has something real to decode, not a compression research
//! project.

use crate::arena::Arena;
use crate::array::{BitMask, ColumnArray};
use crate::column::LogicalType;
use crate::error::{OperatorError, Result};

/// Identifies which codec encoded a compressed column's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecTag {
    /// Values stored verbatim, one fixed-width slot per row, plus a
    /// validity bitmap.
    Plain,
    /// Values stored as a base value plus per-row deltas, reconstructed by
    /// running prefix sum; plus a validity bitmap.
    Delta,
}

/// Decodes one compressed column's bytes into a `ColumnArray` of up to
/// `N_MAX` rows, allocating only from the supplied arena.
pub trait BulkDecompressor: Send + Sync {
    fn tag(&self) -> CodecTag;

    fn decode<'a>(
        &self,
        arena: &'a Arena,
        logical_type: LogicalType,
        bytes: &[u8],
        num_rows: usize,
    ) -> Result<ColumnArray<'a>>;
}

fn codec_err(reason: impl Into<String>) -> OperatorError {
    OperatorError::Codec {
        column: String::new(),
        batch_id: 0,
        reason: reason.into(),
    }
}

/// Named column/batch context for a codec error, filled in by the caller
/// once decode fails (the codec itself doesn't know its column's name).
pub fn with_context(err: OperatorError, column: &str, batch_id: u64) -> OperatorError {
    match err {
        OperatorError::Codec { reason, .. } => OperatorError::Codec {
            column: column.to_string(),
            batch_id,
            reason,
        },
        other => other,
    }
}

/// Wire layout: `[validity bitmap words][values]`, both little-endian,
/// values stored verbatim at the column's native width.
pub struct PlainCodec;

impl BulkDecompressor for PlainCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::Plain
    }

    fn decode<'a>(
        &self,
        arena: &'a Arena,
        logical_type: LogicalType,
        bytes: &[u8],
        num_rows: usize,
    ) -> Result<ColumnArray<'a>> {
        let width = logical_type
            .value_width_bytes()
            .ok_or_else(|| codec_err("plain codec requires a fixed-width logical type"))?;
        let bitmap_words = (num_rows + 63) / 64;
        let bitmap_bytes = bitmap_words * 8;
        let values_bytes = num_rows * width;
        if bytes.len() < bitmap_bytes + values_bytes {
            return Err(codec_err(format!(
                "short buffer: need {} bytes, have {}",
                bitmap_bytes + values_bytes,
                bytes.len()
            )));
        }
        let validity_words = read_words(&bytes[..bitmap_bytes], bitmap_words);
        let validity_slice = arena.alloc_slice_copy(&validity_words);
        let values = &bytes[bitmap_bytes..bitmap_bytes + values_bytes];
        decode_plain_values(arena, logical_type, values, num_rows, validity_slice)
    }
}

fn read_words(bytes: &[u8], num_words: usize) -> Vec<u64> {
    let mut words = Vec::with_capacity(num_words);
    for chunk in bytes.chunks_exact(8).take(num_words) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        words.push(u64::from_le_bytes(buf));
    }
    words
}

fn decode_plain_values<'a>(
    arena: &'a Arena,
    logical_type: LogicalType,
    values: &[u8],
    num_rows: usize,
    validity_words: &'a [u64],
) -> Result<ColumnArray<'a>> {
    use crate::array::Validity;
    let validity = Validity::from_words(validity_words, num_rows);
    match logical_type {
        LogicalType::Int32 => {
            let mut out = Vec::with_capacity(num_rows);
            for chunk in values.chunks_exact(4).take(num_rows) {
                out.push(i32::from_le_bytes(chunk.try_into().unwrap()));
            }
            Ok(ColumnArray::Int32 {
                values: arena.alloc_slice_copy(&out),
                validity,
            })
        }
        LogicalType::Int64 => {
            let mut out = Vec::with_capacity(num_rows);
            for chunk in values.chunks_exact(8).take(num_rows) {
                out.push(i64::from_le_bytes(chunk.try_into().unwrap()));
            }
            Ok(ColumnArray::Int64 {
                values: arena.alloc_slice_copy(&out),
                validity,
            })
        }
        LogicalType::Float32 => {
            let mut out = Vec::with_capacity(num_rows);
            for chunk in values.chunks_exact(4).take(num_rows) {
                out.push(f32::from_le_bytes(chunk.try_into().unwrap()));
            }
            Ok(ColumnArray::Float32 {
                values: arena.alloc_slice_copy(&out),
                validity,
            })
        }
        LogicalType::Float64 => {
            let mut out = Vec::with_capacity(num_rows);
            for chunk in values.chunks_exact(8).take(num_rows) {
                out.push(f64::from_le_bytes(chunk.try_into().unwrap()));
            }
            Ok(ColumnArray::Float64 {
                values: arena.alloc_slice_copy(&out),
                validity,
            })
        }
        LogicalType::Opaque => Err(codec_err("plain codec cannot decode an opaque column")),
    }
}

/// Wire layout: `[validity bitmap words][base value][i32 deltas]`. Only
/// defined for the integer logical types; reconstructed by running prefix
/// sum over the deltas starting from the base.
pub struct DeltaCodec;

impl BulkDecompressor for DeltaCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::Delta
    }

    fn decode<'a>(
        &self,
        arena: &'a Arena,
        logical_type: LogicalType,
        bytes: &[u8],
        num_rows: usize,
    ) -> Result<ColumnArray<'a>> {
        let bitmap_words = (num_rows + 63) / 64;
        let bitmap_bytes = bitmap_words * 8;
        if bytes.len() < bitmap_bytes {
            return Err(codec_err("short buffer for validity bitmap"));
        }
        let validity_words = read_words(&bytes[..bitmap_bytes], bitmap_words);
        let validity_slice = arena.alloc_slice_copy(&validity_words);
        let rest = &bytes[bitmap_bytes..];
        use crate::array::Validity;
        let validity = Validity::from_words(validity_slice, num_rows);
        match logical_type {
            LogicalType::Int32 => {
                if rest.len() < 4 + num_rows * 4 {
                    return Err(codec_err("short buffer for delta-encoded int32 column"));
                }
                let base = i32::from_le_bytes(rest[..4].try_into().unwrap());
                let mut out = Vec::with_capacity(num_rows);
                let mut running = base;
                for (i, chunk) in rest[4..4 + num_rows * 4].chunks_exact(4).enumerate() {
                    let delta = i32::from_le_bytes(chunk.try_into().unwrap());
                    if i > 0 {
                        running = running
                            .checked_add(delta)
                            .ok_or_else(|| codec_err("delta decode overflowed i32"))?;
                    }
                    out.push(running);
                }
                Ok(ColumnArray::Int32 {
                    values: arena.alloc_slice_copy(&out),
                    validity,
                })
            }
            LogicalType::Int64 => {
                if rest.len() < 8 + num_rows * 8 {
                    return Err(codec_err("short buffer for delta-encoded int64 column"));
                }
                let base = i64::from_le_bytes(rest[..8].try_into().unwrap());
                let mut out = Vec::with_capacity(num_rows);
                let mut running = base;
                for (i, chunk) in rest[8..8 + num_rows * 8].chunks_exact(8).enumerate() {
                    let delta = i64::from_le_bytes(chunk.try_into().unwrap());
                    if i > 0 {
                        running = running
                            .checked_add(delta)
                            .ok_or_else(|| codec_err("delta decode overflowed i64"))?;
                    }
                    out.push(running);
                }
                Ok(ColumnArray::Int64 {
                    values: arena.alloc_slice_copy(&out),
                    validity,
                })
            }
            other => Err(codec_err(format!(
                "delta codec does not support {:?}",
                other
            ))),
        }
    }
}

/// Also used directly by tests: decode straight into a `BitMask` rather
/// than a borrowed `Validity`, for cases that need to mutate the result.
pub fn validity_to_mask(validity: crate::array::Validity<'_>) -> BitMask {
    BitMask::from_validity(validity)
}

/// Registry of codecs available to an operator instance, keyed by tag.
pub struct CodecRegistry {
    plain: PlainCodec,
    delta: DeltaCodec,
}

impl CodecRegistry {
    pub fn with_reference_codecs() -> Self {
        Self {
            plain: PlainCodec,
            delta: DeltaCodec,
        }
    }

    pub fn get(&self, tag: CodecTag) -> &dyn BulkDecompressor {
        match tag {
            CodecTag::Plain => &self.plain,
            CodecTag::Delta => &self.delta,
        }
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_reference_codecs()
    }
}
