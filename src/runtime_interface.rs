// src/runtime_interface.rs

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use crate::config::InferenceConfig;
use crate::inference_core::{predict_digit, InferencePipeline};
use crate::model_loader;
use crate::tensor_store::{decode_i32_le, ExchangeStore, StoreError, EXCHANGE_KEY};
use crate::trigger::{TriggerAdapter, TriggerError};

/// Host-side loader process: provisions the exchange store, attaches the
/// engine to its trigger, fires it, and reads the classification back.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Optional JSON config file providing the paths below
    #[clap(long, value_parser)]
    config: Option<String>,

    /// Hidden weight blob (25088 bytes of i8)
    #[clap(long, value_parser)]
    hidden_weights: Option<String>,
    /// Hidden bias blob (32 little-endian i32)
    #[clap(long, value_parser)]
    hidden_bias: Option<String>,
    /// Output weight blob (320 bytes of i8)
    #[clap(long, value_parser)]
    output_weights: Option<String>,
    /// Output bias blob (10 little-endian i32)
    #[clap(long, value_parser)]
    output_bias: Option<String>,
    /// Input image (784 raw grayscale bytes)
    #[clap(long, value_parser)]
    image: Option<String>,

    /// Number of trigger events to fire
    #[clap(long, value_parser, default_value_t = 1)]
    fires: usize,
}

// Custom error wrapper to combine the module error types
#[derive(Debug)]
enum RuntimeError {
    Store(StoreError),
    Trigger(TriggerError),
    Message(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Store(e) => write!(f, "Store error: {}", e),
            RuntimeError::Trigger(e) => write!(f, "Trigger error: {}", e),
            RuntimeError::Message(s) => write!(f, "Runtime error: {}", s),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuntimeError::Store(e) => Some(e),
            RuntimeError::Trigger(e) => Some(e),
            RuntimeError::Message(_) => None,
        }
    }
}

impl From<StoreError> for RuntimeError {
    fn from(err: StoreError) -> Self {
        RuntimeError::Store(err)
    }
}
impl From<TriggerError> for RuntimeError {
    fn from(err: TriggerError) -> Self {
        RuntimeError::Trigger(err)
    }
}

pub fn run_cli() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    // 1. Resolve the file paths: config file first, explicit flags win.
    let mut config = match &args.config {
        Some(path) => {
            println!("Loading config from: {}", path);
            InferenceConfig::load(path)?
        }
        None => InferenceConfig::default(),
    };
    if let Some(p) = args.hidden_weights {
        config.hidden_weights_path = p;
    }
    if let Some(p) = args.hidden_bias {
        config.hidden_bias_path = p;
    }
    if let Some(p) = args.output_weights {
        config.output_weights_path = p;
    }
    if let Some(p) = args.output_bias {
        config.output_bias_path = p;
    }
    if let Some(p) = args.image {
        config.image_path = p;
    }

    // 2. Provision the exchange store. Bad parameter files degrade, they
    // never abort the run.
    let params = model_loader::load_model_parameters(&config);
    if params.degraded {
        println!("Warning: using fallback parameters. Predictions won't be meaningful.");
    }
    let image = model_loader::load_input_image(Path::new(&config.image_path));

    let store = ExchangeStore::shared();
    model_loader::provision(&store, &params, &image).map_err(RuntimeError::from)?;
    println!("Exchange store provisioned.");

    // 3. Attach the engine to its trigger.
    let pipeline = Arc::new(InferencePipeline::new(Arc::clone(&store)));
    let adapter = TriggerAdapter::attach(pipeline).map_err(RuntimeError::from)?;
    println!("Engine attached to trigger slot.");

    // 4. Fire.
    println!("Triggering inference ({} event(s))...", args.fires);
    for _ in 0..args.fires {
        adapter.fire();
    }

    // 5. Read the output row back and classify.
    let out_bytes = store.output.lookup(EXCHANGE_KEY).ok_or_else(|| {
        RuntimeError::Message("output tensor was never produced".to_string())
    })?;
    let scores = decode_i32_le(&out_bytes);

    println!("MNIST Output:");
    let mut line = String::new();
    for v in &scores {
        line.push_str(&format!(" {}", v));
    }
    println!("{}", line);

    let digit = predict_digit(&scores);
    println!(
        "Predicted digit: {} (confidence value: {})",
        digit, scores[digit]
    );

    Ok(())
}
