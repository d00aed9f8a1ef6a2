// src/tensor_store.rs
//
// Fixed-capacity exchange regions for every tensor the engine reads or
// writes. Each region is a single-slot keyed table: one well-known key, one
// row, the row holding the whole tensor as an opaque byte blob
// (little-endian for multi-byte elements).
//
// The regions are deliberately unsynchronized beyond per-byte atomicity:
// concurrent writers race last-writer-wins per byte, and a reader running
// alongside a writer may observe a torn blob. Callers that need a stable
// view must arrange quiescence themselves.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

// Model dimensions, fixed for the lifetime of the system.
pub const INPUT_SIZE: usize = 784;
pub const HIDDEN_SIZE: usize = 32;
pub const OUTPUT_SIZE: usize = 10;

/// The sole row key of every exchange region.
pub const EXCHANGE_KEY: u32 = 0;

// Region capacities in bytes.
pub const INPUT_BYTES: usize = INPUT_SIZE;
pub const HIDDEN_WEIGHTS_BYTES: usize = HIDDEN_SIZE * INPUT_SIZE;
pub const HIDDEN_BIAS_BYTES: usize = HIDDEN_SIZE * 4;
pub const OUTPUT_WEIGHTS_BYTES: usize = OUTPUT_SIZE * HIDDEN_SIZE;
pub const OUTPUT_BIAS_BYTES: usize = OUTPUT_SIZE * 4;
pub const OUTPUT_BYTES: usize = OUTPUT_SIZE * 4;

#[derive(Debug, PartialEq)]
pub enum StoreError {
    KeyOutOfRange(u32),
    SizeMismatch(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::KeyOutOfRange(key) => write!(f, "Key out of range: {}", key),
            StoreError::SizeMismatch(s) => write!(f, "Size mismatch: {}", s),
        }
    }
}

impl std::error::Error for StoreError {}

/// One single-slot tensor region.
pub struct ExchangeRegion {
    name: &'static str,
    bytes: Box<[AtomicU8]>,
    present: AtomicBool,
}

impl ExchangeRegion {
    fn new(name: &'static str, capacity: usize) -> Self {
        let bytes = (0..capacity)
            .map(|_| AtomicU8::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        ExchangeRegion {
            name,
            bytes,
            present: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// A region is present once its row has been written at least once.
    pub fn is_present(&self) -> bool {
        self.present.load(Ordering::Relaxed)
    }

    /// Writes the whole row. Tensors are provisioned all-or-nothing, so the
    /// value must match the region capacity exactly.
    pub fn update(&self, key: u32, value: &[u8]) -> Result<(), StoreError> {
        if key != EXCHANGE_KEY {
            return Err(StoreError::KeyOutOfRange(key));
        }
        if value.len() != self.bytes.len() {
            return Err(StoreError::SizeMismatch(format!(
                "{}: expected {} bytes, got {}",
                self.name,
                self.bytes.len(),
                value.len()
            )));
        }
        for (slot, &byte) in self.bytes.iter().zip(value) {
            slot.store(byte, Ordering::Relaxed);
        }
        self.present.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Reads the whole row, or `None` when the key is out of range or the
    /// row has never been written.
    pub fn lookup(&self, key: u32) -> Option<Vec<u8>> {
        if key != EXCHANGE_KEY || !self.is_present() {
            return None;
        }
        Some(self.bytes.iter().map(|b| b.load(Ordering::Relaxed)).collect())
    }
}

/// The six exchange regions shared between the provisioning host and the
/// inference engine. One logical instance process-wide; share via `Arc`.
pub struct ExchangeStore {
    pub input: ExchangeRegion,
    pub hidden_weights: ExchangeRegion,
    pub hidden_bias: ExchangeRegion,
    pub output_weights: ExchangeRegion,
    pub output_bias: ExchangeRegion,
    pub output: ExchangeRegion,
}

impl ExchangeStore {
    pub fn new() -> Self {
        ExchangeStore {
            input: ExchangeRegion::new("mnist_input", INPUT_BYTES),
            hidden_weights: ExchangeRegion::new("hidden_weights", HIDDEN_WEIGHTS_BYTES),
            hidden_bias: ExchangeRegion::new("hidden_bias", HIDDEN_BIAS_BYTES),
            output_weights: ExchangeRegion::new("output_weights", OUTPUT_WEIGHTS_BYTES),
            output_bias: ExchangeRegion::new("output_bias", OUTPUT_BIAS_BYTES),
            output: ExchangeRegion::new("mnist_output", OUTPUT_BYTES),
        }
    }

    pub fn shared() -> Arc<ExchangeStore> {
        Arc::new(ExchangeStore::new())
    }
}

impl Default for ExchangeStore {
    fn default() -> Self {
        ExchangeStore::new()
    }
}

/// Decodes a little-endian i32 blob.
pub fn decode_i32_le(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap())) // unwrap is safe due to chunks_exact
        .collect()
}

/// Encodes i32 values as a little-endian blob.
pub fn encode_i32_le(values: &[i32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
