// ============================================================
// Layer 5 — Compute Device Selection
// ============================================================
// The device is chosen once, from the config, and passed down
// explicitly. Backends:
//
//   Accelerator → Autodiff<Wgpu>    (feature "accelerator")
//   Cpu         → Autodiff<NdArray>
//
// Forward-only work (the probe) uses the same backends without
// the Autodiff wrapper.
//
// `auto` picks the accelerator when it was compiled in and the
// host has a usable adapter; otherwise the CPU.

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

use crate::domain::training_config::DevicePreference;

pub type CpuBackend = Autodiff<NdArray>;

#[cfg(feature = "accelerator")]
pub type AcceleratorBackend = Autodiff<burn::backend::Wgpu>;

/// Forward-only counterparts, used when no gradients are needed.
pub type CpuInference = NdArray;

#[cfg(feature = "accelerator")]
pub type AcceleratorInference = burn::backend::Wgpu;

#[derive(Debug, Clone)]
pub enum ComputeDevice {
    #[cfg(feature = "accelerator")]
    Accelerator(burn::backend::wgpu::WgpuDevice),
    Cpu(NdArrayDevice),
}

impl ComputeDevice {
    pub fn select(preference: DevicePreference) -> Self {
        let device = match preference {
            DevicePreference::Cpu => Self::Cpu(NdArrayDevice::Cpu),
            DevicePreference::Auto | DevicePreference::Accelerator => {
                Self::accelerator_or_cpu(preference, accelerator_available)
            }
        };
        tracing::info!("Using compute device: {:?}", device);
        device
    }

    #[cfg(feature = "accelerator")]
    fn accelerator_or_cpu(preference: DevicePreference, available: impl FnOnce() -> bool) -> Self {
        if available() {
            return Self::Accelerator(burn::backend::wgpu::WgpuDevice::default());
        }
        if preference == DevicePreference::Accelerator {
            tracing::warn!("Accelerator requested but no adapter is available; using CPU");
        }
        Self::Cpu(NdArrayDevice::Cpu)
    }

    #[cfg(not(feature = "accelerator"))]
    fn accelerator_or_cpu(preference: DevicePreference, _available: impl FnOnce() -> bool) -> Self {
        if preference == DevicePreference::Accelerator {
            tracing::warn!("Accelerator requested but this build has no accelerator backend; using CPU");
        }
        Self::Cpu(NdArrayDevice::Cpu)
    }

    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Self::Cpu(_))
    }
}

/// Whether the Wgpu runtime can bring up an adapter on this host.
/// The runtime panics when none exists, so one tiny allocation is
/// attempted with the panic contained and the hook silenced.
#[cfg(feature = "accelerator")]
fn accelerator_available() -> bool {
    use burn::tensor::Tensor;
    use std::panic::{self, AssertUnwindSafe};

    let device = burn::backend::wgpu::WgpuDevice::default();
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let ok = panic::catch_unwind(AssertUnwindSafe(|| {
        Tensor::<burn::backend::Wgpu, 1>::zeros([1], &device).into_data();
    }))
    .is_ok();
    panic::set_hook(hook);

    if !ok {
        tracing::debug!("No Wgpu adapter found");
    }
    ok
}

#[cfg(not(feature = "accelerator"))]
fn accelerator_available() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_preference_is_honoured() {
        let device = ComputeDevice::select(DevicePreference::Cpu);
        assert!(!device.is_accelerator());
    }

    #[cfg(not(feature = "accelerator"))]
    #[test]
    fn test_auto_falls_back_to_cpu_without_accelerator() {
        assert!(!ComputeDevice::select(DevicePreference::Auto).is_accelerator());
    }

    #[test]
    fn test_missing_adapter_falls_back_to_cpu() {
        for pref in [DevicePreference::Auto, DevicePreference::Accelerator] {
            let device = ComputeDevice::accelerator_or_cpu(pref, || false);
            assert!(matches!(device, ComputeDevice::Cpu(NdArrayDevice::Cpu)));
        }
    }

    #[cfg(feature = "accelerator")]
    #[test]
    fn test_available_adapter_is_used() {
        let device = ComputeDevice::accelerator_or_cpu(DevicePreference::Auto, || true);
        assert!(device.is_accelerator());
    }
}
