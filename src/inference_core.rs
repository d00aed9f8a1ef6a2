// src/inference_core.rs
//
// The two-stage layer pipeline. A pass reads every tensor it needs from the
// exchange store, runs hidden then output linear layers with the leaky
// activation, and writes the score vector back. A pass either completes both
// stages or aborts before writing anything; the prior output row survives an
// aborted pass untouched.

use crate::quantized_ops::{leaky_relu_inplace, linear_forward};
use crate::tensor_store::{
    decode_i32_le, encode_i32_le, ExchangeStore, EXCHANGE_KEY, HIDDEN_SIZE, INPUT_SIZE,
    OUTPUT_SIZE,
};
use log::{debug, trace};
use std::sync::Arc;

/// Outcome of a single pass. Carries no payload: the sandboxed execution
/// model has no error channel, only a status its callers are free to
/// ignore. Diagnostics go to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    Skipped,
}

pub struct InferencePipeline {
    store: Arc<ExchangeStore>,
}

impl InferencePipeline {
    pub fn new(store: Arc<ExchangeStore>) -> Self {
        InferencePipeline { store }
    }

    pub fn store(&self) -> &Arc<ExchangeStore> {
        &self.store
    }

    /// Runs one inference pass: hidden stage (784 -> 32), output stage
    /// (32 -> 10), output write-back. Synchronous, no suspension points,
    /// callable concurrently from any number of threads.
    pub fn run_pass(&self) -> PassOutcome {
        let store = &self.store;
        let (input, hid_w, hid_b, out_w, out_b) = match (
            store.input.lookup(EXCHANGE_KEY),
            store.hidden_weights.lookup(EXCHANGE_KEY),
            store.hidden_bias.lookup(EXCHANGE_KEY),
            store.output_weights.lookup(EXCHANGE_KEY),
            store.output_bias.lookup(EXCHANGE_KEY),
        ) {
            (Some(input), Some(hid_w), Some(hid_b), Some(out_w), Some(out_b)) => {
                (input, hid_w, hid_b, out_w, out_b)
            }
            _ => {
                debug!("tensor lookup failed; pass skipped");
                return PassOutcome::Skipped;
            }
        };

        let hidden_weights: &[i8] = bytemuck::cast_slice(&hid_w);
        let hidden_bias = decode_i32_le(&hid_b);
        let output_weights: &[i8] = bytemuck::cast_slice(&out_w);
        let output_bias = decode_i32_le(&out_b);

        if input.len() != INPUT_SIZE
            || hidden_weights.len() != HIDDEN_SIZE * INPUT_SIZE
            || hidden_bias.len() != HIDDEN_SIZE
            || output_weights.len() != OUTPUT_SIZE * HIDDEN_SIZE
            || output_bias.len() != OUTPUT_SIZE
        {
            debug!("tensor cardinality check failed; pass skipped");
            return PassOutcome::Skipped;
        }

        // Image bytes are non-negative; widen to the accumulator domain.
        let mut activations = [0i32; INPUT_SIZE];
        for (a, &px) in activations.iter_mut().zip(input.iter()) {
            *a = px as i32;
        }

        // Hidden stage. The activation buffer lives and dies with this pass.
        let mut hidden = [0i32; HIDDEN_SIZE];
        if linear_forward(&activations, hidden_weights, &hidden_bias, &mut hidden).is_err() {
            debug!("hidden stage dimension check failed; pass skipped");
            return PassOutcome::Skipped;
        }
        leaky_relu_inplace(&mut hidden);

        // Output stage.
        let mut scores = [0i32; OUTPUT_SIZE];
        if linear_forward(&hidden, output_weights, &output_bias, &mut scores).is_err() {
            debug!("output stage dimension check failed; pass skipped");
            return PassOutcome::Skipped;
        }
        leaky_relu_inplace(&mut scores);

        if store
            .output
            .update(EXCHANGE_KEY, &encode_i32_le(&scores))
            .is_err()
        {
            debug!("output write-back failed; pass skipped");
            return PassOutcome::Skipped;
        }

        trace!("inference executed");
        PassOutcome::Completed
    }
}

/// Index of the maximum score; the first occurrence wins on ties
/// (left-to-right scan). An empty slice yields 0.
pub fn predict_digit(scores: &[i32]) -> usize {
    let mut best = 0;
    for (i, &v) in scores.iter().enumerate() {
        if v > scores[best] {
            best = i;
        }
    }
    best
}
