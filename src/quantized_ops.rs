// src/quantized_ops.rs
//
// Integer arithmetic core: the quantized linear layer and the leaky
// activation. Everything here is pure, allocation-free, and loops over
// lengths that are fixed by the caller, so a pass has a statically known
// instruction count.

use std::fmt;

#[derive(Debug, PartialEq)]
pub enum OpsError {
    DimensionMismatch(String),
}

impl fmt::Display for OpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpsError::DimensionMismatch(s) => write!(f, "Dimension mismatch: {}", s),
        }
    }
}

impl std::error::Error for OpsError {}

/// Quantized linear layer: `output[m] = bias[m] + Σ_n weights[m*N + n] * input[n]`.
///
/// `weights` is row-major `M x N` with `M = output.len()` and `N = input.len()`;
/// each i8 entry is sign-extended to i32 before the multiply. Accumulation is
/// 32-bit wrapping arithmetic: overflow is not detected or saturated, it
/// wraps two's-complement.
pub fn linear_forward(
    input: &[i32],
    weights: &[i8],
    bias: &[i32],
    output: &mut [i32],
) -> Result<(), OpsError> {
    let in_features = input.len();
    let out_features = output.len();

    if weights.len() != out_features * in_features {
        return Err(OpsError::DimensionMismatch(format!(
            "weight matrix has {} entries, expected {}x{} = {}",
            weights.len(),
            out_features,
            in_features,
            out_features * in_features
        )));
    }
    if bias.len() != out_features {
        return Err(OpsError::DimensionMismatch(format!(
            "bias vector has {} entries, expected {}",
            bias.len(),
            out_features
        )));
    }

    for m in 0..out_features {
        let row = &weights[m * in_features..(m + 1) * in_features];
        let mut acc = bias[m];
        for n in 0..in_features {
            acc = acc.wrapping_add((row[n] as i32).wrapping_mul(input[n]));
        }
        output[m] = acc;
    }

    Ok(())
}

/// Leaky activation with a fixed 1/100 negative slope.
///
/// Integer division truncates toward zero, so any negative pre-activation
/// with magnitude below 100 collapses to exactly 0: `leaky_relu(-99) == 0`,
/// `leaky_relu(-150) == -1`. The truncation loss is part of the numeric
/// contract, matching the quantized model the weights were trained for.
#[inline]
pub fn leaky_relu(x: i32) -> i32 {
    if x >= 0 {
        x
    } else {
        x / 100
    }
}

/// Applies `leaky_relu` to every element. No inter-element dependency.
pub fn leaky_relu_inplace(values: &mut [i32]) {
    for v in values.iter_mut() {
        *v = leaky_relu(*v);
    }
}
