use candle_core::{DType, Result, Tensor};

/// Mean over unmasked token states, then L2-normalise each row.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` (any numeric dtype);
/// the result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (_batch, _time, hidden_dim) = hidden.dims3()?;

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = match mask_3d.broadcast_as(hidden.shape()) {
        Ok(m) => m,
        Err(_) => mask_3d.repeat((1, 1, hidden_dim))?,
    };
    let summed = (hidden * &mask_broadcast)?.sum(1)?;
    // rows with an all-zero mask divide by eps instead of zero
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(summed.dtype())?.clamp(1e-9f32, f32::MAX)?;
    let mean = summed.broadcast_div(&lengths)?;

    let eps_val = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6f32, _ => 1e-12f32 };
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, f64::from(eps_val))?;
    mean.broadcast_div(&norm)
}
