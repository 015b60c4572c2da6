use std::path::Path;
use std::sync::{Arc, Mutex};

use tch::nn::ModuleT;
use tch::{CModule, Device, Kind, Tensor};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to load model artifact: {0}")]
    Load(tch::TchError),
}

/// Loaded classifier. Initialized once at startup and read-only
/// afterwards; clones share the underlying module.
#[derive(Clone)]
pub struct ModelHandle {
    model: Arc<Mutex<CModule>>,
}

impl ModelHandle {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let device = Device::cuda_if_available();
        let model = CModule::load_on_device(path, device).map_err(ModelError::Load)?;
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }

    /// One forward pass over a (1, 224, 224, 3) batch, yielding the
    /// scalar P(real) in [0, 1].
    pub fn predict(&self, input: &Tensor) -> f64 {
        let output = self.model.lock().unwrap().forward_t(input, false);
        output.to_kind(Kind::Double).view([-1]).double_value(&[0])
    }
}
