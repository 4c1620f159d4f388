// ============================================================
// Layer 5 — Pretrained Weight Loader
// ============================================================
// Copies tensors from a GPT-2 `model.safetensors` file into a
// freshly initialised CausalLm.
//
// Key layout (an optional `transformer.` prefix is accepted):
//
//   wte.weight, wpe.weight
//   h.{i}.ln_1.{weight,bias}
//   h.{i}.attn.c_attn.{weight,bias}   weight: [n_embd, 3·n_embd]
//   h.{i}.attn.c_proj.{weight,bias}
//   h.{i}.ln_2.{weight,bias}
//   h.{i}.mlp.c_fc.{weight,bias}
//   h.{i}.mlp.c_proj.{weight,bias}
//   ln_f.{weight,bias}
//
// GPT-2 stores its projections as Conv1D with weight [in, out],
// which is already Burn's Linear layout; nothing is transposed.
// Tensors not listed above (e.g. the cached `attn.bias` mask)
// are ignored.

use std::{fs, path::Path};

use burn::{
    module::Param,
    nn::{Embedding, LayerNorm, Linear},
    prelude::*,
};
use safetensors::{Dtype, SafeTensors};

use crate::error::{PipelineError, Result};
use crate::ml::model::CausalLm;

const KEY_PREFIX: &str = "transformer.";

struct WeightFile<'a, B: Backend> {
    tensors: SafeTensors<'a>,
    device:  &'a B::Device,
}

impl<'a, B: Backend> WeightFile<'a, B> {
    fn values(&self, name: &str) -> Result<(Vec<usize>, Vec<f32>)> {
        let prefixed = format!("{KEY_PREFIX}{name}");
        let view = self
            .tensors
            .tensor(name)
            .or_else(|_| self.tensors.tensor(&prefixed))
            .map_err(|_| PipelineError::ResourceFetch(format!("weights file has no tensor '{name}'")))?;

        if view.dtype() != Dtype::F32 {
            return Err(PipelineError::ResourceFetch(format!(
                "tensor '{name}' is {:?}; only F32 weights are supported",
                view.dtype()
            )));
        }
        let values = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok((view.shape().to_vec(), values))
    }

    fn tensor<const D: usize>(&self, name: &str, expected: [usize; D]) -> Result<Tensor<B, D>> {
        let (shape, values) = self.values(name)?;
        if shape != expected {
            return Err(PipelineError::ResourceFetch(format!(
                "tensor '{name}' has shape {shape:?}, model expects {expected:?}"
            )));
        }
        Ok(Tensor::from_data(TensorData::new(values, shape), self.device))
    }

    fn embedding(&self, module: &mut Embedding<B>, name: &str) -> Result<()> {
        let dims = module.weight.val().dims();
        module.weight = Param::from_tensor(self.tensor(&format!("{name}.weight"), dims)?);
        Ok(())
    }

    fn linear(&self, module: &mut Linear<B>, name: &str) -> Result<()> {
        let dims = module.weight.val().dims();
        module.weight = Param::from_tensor(self.tensor(&format!("{name}.weight"), dims)?);
        let [_, d_out] = dims;
        module.bias = Some(Param::from_tensor(self.tensor(&format!("{name}.bias"), [d_out])?));
        Ok(())
    }

    fn layer_norm(&self, module: &mut LayerNorm<B>, name: &str) -> Result<()> {
        let dims = module.gamma.val().dims();
        module.gamma = Param::from_tensor(self.tensor(&format!("{name}.weight"), dims)?);
        module.beta = Param::from_tensor(self.tensor(&format!("{name}.bias"), dims)?);
        Ok(())
    }
}

/// Load GPT-2 weights from `path` into `model`. Every expected tensor
/// must be present with a matching shape.
pub fn load_pretrained<B: Backend>(
    mut model: CausalLm<B>,
    path:      &Path,
    device:    &B::Device,
) -> Result<CausalLm<B>> {
    let bytes = fs::read(path)?;
    let tensors = SafeTensors::deserialize(&bytes).map_err(|e| {
        PipelineError::ResourceFetch(format!("cannot parse '{}': {e}", path.display()))
    })?;
    let file = WeightFile::<B> { tensors, device };

    file.embedding(&mut model.wte, "wte")?;
    file.embedding(&mut model.wpe, "wpe")?;
    for (i, block) in model.h.iter_mut().enumerate() {
        file.layer_norm(&mut block.ln_1, &format!("h.{i}.ln_1"))?;
        file.linear(&mut block.attn.c_attn, &format!("h.{i}.attn.c_attn"))?;
        file.linear(&mut block.attn.c_proj, &format!("h.{i}.attn.c_proj"))?;
        file.layer_norm(&mut block.ln_2, &format!("h.{i}.ln_2"))?;
        file.linear(&mut block.mlp.c_fc, &format!("h.{i}.mlp.c_fc"))?;
        file.linear(&mut block.mlp.c_proj, &format!("h.{i}.mlp.c_proj"))?;
    }
    file.layer_norm(&mut model.ln_f, "ln_f")?;

    tracing::info!("Loaded pretrained weights from '{}'", path.display());
    Ok(model)
}
