use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens followed by L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]`; returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _time, hidden_dim) = hidden.dims3()?;

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let masked = hidden.broadcast_mul(&mask.unsqueeze(2)?)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum_keepdim(1)?;
    let mean = sum.broadcast_div(&lengths)?;
    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(0)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_add(&eps)?;
    let pooled = mean.broadcast_div(&norm)?;
    if pooled.dims() != [batch, hidden_dim].as_slice() {
        bail!("pooled shape {:?}, expected [{batch}, {hidden_dim}]", pooled.dims());
    }
    Ok(pooled)
}
