use super::cache::ModelOptions;
use crate::error::{PipelineError, Result};
use candle_core::Device;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeviceRequest {
    #[default]
    Cpu,
    Cuda(usize),
}

impl DeviceRequest {
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

macro_rules! impl_device_methods {
    (direct: $builder:ident < $($gen:ident : $bound:path),* >) => {
        impl<$($gen: $bound),*> $builder<$($gen),*> {
            /// Use CPU for inference (default).
            pub fn cpu(mut self) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Cpu;
                self
            }

            /// Use a specific CUDA GPU for inference.
            pub fn cuda(mut self, index: usize) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Cuda(index);
                self
            }
        }
    };
}

pub(crate) use impl_device_methods;

pub fn build_cache_key<O: ModelOptions>(options: &O, device: &Device) -> String {
    format!("{}-{:?}", options.cache_key(), device.location())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repo(&'static str);

    impl ModelOptions for Repo {
        fn cache_key(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn cpu_request_resolves() {
        let device = DeviceRequest::default().resolve().unwrap();
        assert!(device.is_cpu());
    }

    #[test]
    fn cache_key_includes_device() {
        let key = build_cache_key(&Repo("helinivan/english-sarcasm-detector"), &Device::Cpu);
        assert!(key.starts_with("helinivan/english-sarcasm-detector-"));
        assert!(key.contains("Cpu"));
    }
}
