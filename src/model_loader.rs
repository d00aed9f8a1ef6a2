// src/model_loader.rs
//
// Host-side provisioning: reads the parameter blobs and the input image from
// disk and writes them into the exchange store. A missing or short parameter
// file is never fatal: the loader substitutes a deterministic fallback
// pattern, logs a degraded-mode warning, and lets the pipeline run anyway.

use crate::config::InferenceConfig;
use crate::tensor_store::{
    encode_i32_le, ExchangeStore, StoreError, EXCHANGE_KEY, HIDDEN_BIAS_BYTES,
    HIDDEN_WEIGHTS_BYTES, INPUT_BYTES, OUTPUT_BIAS_BYTES, OUTPUT_WEIGHTS_BYTES,
};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// The four parameter tensors, decoded into their element types.
/// `degraded` is set when any of them came from a fallback pattern.
#[derive(Debug, Clone)]
pub struct ModelParameters {
    pub hidden_weights: Vec<i8>,
    pub hidden_bias: Vec<i32>,
    pub output_weights: Vec<i8>,
    pub output_bias: Vec<i32>,
    pub degraded: bool,
}

/// Reads exactly `expected` bytes from `path`. Trailing file content beyond
/// `expected` is ignored; a short file is an error.
pub fn read_parameter_file(path: &Path, expected: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0u8; expected];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

fn read_i8_blob(path: &Path, expected: usize, what: &str, degraded: &mut bool) -> Vec<i8> {
    match read_parameter_file(path, expected) {
        Ok(bytes) => bytemuck::cast_slice::<u8, i8>(&bytes).to_vec(),
        Err(e) => {
            warn!(
                "couldn't load {} from {}: {}; using fallback values",
                what,
                path.display(),
                e
            );
            *degraded = true;
            vec![1i8; expected]
        }
    }
}

fn read_i32_blob(path: &Path, expected: usize, what: &str, degraded: &mut bool) -> Vec<i32> {
    match read_parameter_file(path, expected) {
        Ok(bytes) => crate::tensor_store::decode_i32_le(&bytes),
        Err(e) => {
            warn!(
                "couldn't load {} from {}: {}; using fallback values",
                what,
                path.display(),
                e
            );
            *degraded = true;
            vec![1i32; expected / 4]
        }
    }
}

/// Loads the four parameter blobs, substituting the fallback pattern
/// (all ones) for any that cannot be read in full.
pub fn load_model_parameters(config: &InferenceConfig) -> ModelParameters {
    let mut degraded = false;

    let hidden_weights = read_i8_blob(
        Path::new(&config.hidden_weights_path),
        HIDDEN_WEIGHTS_BYTES,
        "hidden weights",
        &mut degraded,
    );
    let hidden_bias = read_i32_blob(
        Path::new(&config.hidden_bias_path),
        HIDDEN_BIAS_BYTES,
        "hidden bias",
        &mut degraded,
    );
    let output_weights = read_i8_blob(
        Path::new(&config.output_weights_path),
        OUTPUT_WEIGHTS_BYTES,
        "output weights",
        &mut degraded,
    );
    let output_bias = read_i32_blob(
        Path::new(&config.output_bias_path),
        OUTPUT_BIAS_BYTES,
        "output bias",
        &mut degraded,
    );

    if degraded {
        warn!("using fallback parameters; predictions will not be meaningful");
    }

    ModelParameters {
        hidden_weights,
        hidden_bias,
        output_weights,
        output_bias,
        degraded,
    }
}

/// Loads the 784-byte input image, or the deterministic `i % 255` pattern
/// when no image can be read.
pub fn load_input_image(path: &Path) -> Vec<u8> {
    match read_parameter_file(path, INPUT_BYTES) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                "couldn't load input image from {}: {}; using fallback pattern",
                path.display(),
                e
            );
            (0..INPUT_BYTES).map(|i| (i % 255) as u8).collect()
        }
    }
}

/// Writes the parameter tensors and the input image into their exchange
/// regions. A failure here is a wiring bug, not a bad file, and is fatal.
pub fn provision(
    store: &ExchangeStore,
    params: &ModelParameters,
    image: &[u8],
) -> Result<(), StoreError> {
    store
        .hidden_weights
        .update(EXCHANGE_KEY, bytemuck::cast_slice(&params.hidden_weights))?;
    store
        .hidden_bias
        .update(EXCHANGE_KEY, &encode_i32_le(&params.hidden_bias))?;
    store
        .output_weights
        .update(EXCHANGE_KEY, bytemuck::cast_slice(&params.output_weights))?;
    store
        .output_bias
        .update(EXCHANGE_KEY, &encode_i32_le(&params.output_bias))?;
    store.input.update(EXCHANGE_KEY, image)?;

    info!(
        "provisioned {} weight/bias bytes and {} input bytes",
        HIDDEN_WEIGHTS_BYTES + HIDDEN_BIAS_BYTES + OUTPUT_WEIGHTS_BYTES + OUTPUT_BIAS_BYTES,
        image.len()
    );
    Ok(())
}
