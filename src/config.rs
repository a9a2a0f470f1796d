//! Operator-wide, process-level configuration.
//!
//! A small typed context is constructed once at operator `open()` and
//! shared read-only for the life of the scan, rather than threaded
//! piecemeal through every call.

use std::sync::Arc;

use crate::codec::CodecRegistry;

/// on/off switch, spelled out rather than `bool` so config files and explain
/// output read the same enumerated names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// Testing gate for `require_vector_qual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorQualGate {
    Allow,
    Forbid,
    Require,
}

/// Testing gate for `require_batch_sorted_merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortedMergeGate {
    Off,
    On,
}

/// The four enumerated configuration switches exposed to callers.
#[derive(Debug, Clone, Copy)]
pub struct OperatorConfig {
    pub enable_bulk_decompression: Toggle,
    pub enable_vectorized_aggregation: Toggle,
    pub require_vector_qual: VectorQualGate,
    pub require_batch_sorted_merge: SortedMergeGate,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            enable_bulk_decompression: Toggle::On,
            enable_vectorized_aggregation: Toggle::On,
            require_vector_qual: VectorQualGate::Allow,
            require_batch_sorted_merge: SortedMergeGate::Off,
        }
    }
}

/// Process-wide read-mostly state injected at operator init: the codec
/// registry and the enable-flags. Cheap to clone (an `Arc` around the
/// registry, `Copy` config).
#[derive(Clone)]
pub struct GlobalContext {
    pub config: OperatorConfig,
    pub codecs: Arc<CodecRegistry>,
}

impl GlobalContext {
    pub fn new(config: OperatorConfig, codecs: Arc<CodecRegistry>) -> Self {
        Self { config, codecs }
    }
}
