//! Quantized MNIST inference engine built for a sandboxed execution model:
//! fixed-dimension tensors exchanged through single-slot keyed regions,
//! integer-only arithmetic with statically bounded loops, and silent
//! payload-free failure on a bad pass.

pub mod config;
pub mod inference_core;
pub mod model_loader;
pub mod quantized_ops;
pub mod runtime_interface;
pub mod tensor_store;
pub mod trigger;
