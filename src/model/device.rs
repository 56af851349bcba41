use std::path::Path;

use candle_core::Device;
use tracing::{debug, info, warn};

/// GPU backends tried for reader checkpoints, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    Metal,
    Cuda,
}

impl Accelerator {
    /// Backends compiled into this build.
    pub const ENABLED: &'static [Accelerator] = &[
        #[cfg(feature = "metal")]
        Accelerator::Metal,
        #[cfg(feature = "cuda")]
        Accelerator::Cuda,
    ];

    fn open(self) -> candle_core::Result<Device> {
        match self {
            Accelerator::Metal => Device::new_metal(0),
            Accelerator::Cuda => Device::new_cuda(0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Accelerator::Metal => "metal",
            Accelerator::Cuda => "cuda",
        }
    }
}

/// Picks the device shared by the given reader checkpoints.
///
/// With no checkpoints both readers are stubs and stay on CPU without opening an accelerator.
/// Otherwise the first enabled accelerator that opens wins.
pub fn select_device(checkpoints: &[&Path]) -> Device {
    if checkpoints.is_empty() {
        debug!("No reader checkpoints, staying on CPU");
        return Device::Cpu;
    }

    let targets: Vec<String> = checkpoints
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let mut failures = Vec::new();
    for &accelerator in Accelerator::ENABLED {
        match accelerator.open() {
            Ok(device) => {
                info!(
                    accelerator = accelerator.name(),
                    checkpoints = ?targets,
                    "Readers placed on accelerator"
                );
                return device;
            }
            Err(e) => failures.push(format!("{}: {e}", accelerator.name())),
        }
    }

    if failures.is_empty() {
        warn!(checkpoints = ?targets, "No accelerator compiled in, readers on CPU");
    } else {
        warn!(
            checkpoints = ?targets,
            failures = %failures.join("; "),
            "Accelerators unavailable, readers on CPU"
        );
    }
    Device::Cpu
}
