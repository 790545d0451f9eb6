use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::api::cluster_dto::{BufferConfigDto, ClusterDescriptorDto, ClusterHeaderDto, ClusterSystemDto, ColdBufferDto, HotBufferDto, MachineDto};
use crate::domain::telescope::Telescope;
use crate::domain::utils::units::{GIGA, PETA, TERA};
use crate::error::{Error, Result};

/// Which SDP sizing the cluster description follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Infrastructure {
    /// Sizing tuned to the SDP parametric model.
    #[default]
    Parametric,
    /// Itemised design from the critical design review.
    Cdr,
}

impl FromStr for Infrastructure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parametric" => Ok(Infrastructure::Parametric),
            "cdr" => Ok(Infrastructure::Cdr),
            _ => Err(Error::configuration(format!("Unknown infrastructure '{}'", s))),
        }
    }
}

impl fmt::Display for Infrastructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infrastructure::Parametric => write!(f, "parametric"),
            Infrastructure::Cdr => write!(f, "cdr"),
        }
    }
}

/// Capacity figures every hardware description provides.
pub trait HardwareCapability {
    /// FLOP/s of the configured nodes.
    fn total_compute(&self) -> f64;
    /// Bytes.
    fn total_storage(&self) -> f64;
    /// Bytes/s.
    fn total_bandwidth(&self) -> f64;
    fn to_descriptor(&self) -> ClusterDescriptorDto;
    fn buffer_config(&self) -> BufferConfigDto;
}

const GENERATOR: &str = env!("CARGO_PKG_NAME");

const GPU_PER_NODE: f64 = 2.0;
const GPU_PEAK_FLOPS: f64 = 31.0 * TERA;
const MEMORY_PER_NODE: f64 = 320.0 * GIGA;
const INGEST_RATE: f64 = 0.46 * TERA;

/// 3 GB/s per 10 TB NVMe SSD.
const COMPUTE_BUFFER_RATE: f64 = 3.0 * GIGA / 10.0 / TERA;
/// 0.5 GB/s per 16 TB SATA SSD.
const INPUT_BUFFER_RATE: f64 = 0.5 * GIGA / 16.0 / TERA;
/// 100 Gb ethernet.
const DELIVERY_RATE: f64 = 100.0 / 8.0 * GIGA;

/// Per-design constants of one telescope's SDP.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SdpDesign {
    machine_name: &'static str,
    total_nodes: u32,
    storage_per_node: f64,
    ethernet: f64,
    /// Hot:cold buffer split of the itemised design.
    buffer_ratio: (f64, f64),
    efficiency: f64,
    total_input_buffer: f64,
    total_compute_buffer: f64,
    total_output_buffer: f64,
}

const LOW_CDR: SdpDesign = SdpDesign {
    machine_name: "GenericSDP_LOW_CDR",
    total_nodes: 896,
    storage_per_node: 75.0 * TERA,
    ethernet: 56.0 / 8.0 * GIGA,
    buffer_ratio: (1.0, 5.0),
    efficiency: 1.0,
    total_input_buffer: 0.0,
    total_compute_buffer: 0.0,
    total_output_buffer: 0.0,
};

const LOW_PARAMETRIC: SdpDesign =
    SdpDesign { efficiency: 0.173, total_input_buffer: 43.35 * PETA, total_compute_buffer: 25.5 * PETA, total_output_buffer: 0.656 * PETA, ..LOW_CDR };

const MID_PARAMETRIC: SdpDesign = SdpDesign {
    machine_name: "GenericSDP_PAR_MODEL_MID",
    total_nodes: 786,
    storage_per_node: 147.0 * TERA,
    ethernet: 25.0 / 8.0 * GIGA,
    buffer_ratio: (1.0, 5.0),
    efficiency: 0.121,
    total_input_buffer: 48.455 * PETA,
    total_compute_buffer: 40.531 * PETA,
    total_output_buffer: 1.103 * PETA,
};

/// Hardware of the science data processor, with the number of nodes in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareSpec {
    LowCdr { nodes: u32 },
    LowParametric { nodes: u32 },
    MidParametric { nodes: u32 },
}

impl HardwareSpec {
    pub fn new(telescope: Telescope, infrastructure: Infrastructure, nodes: u32) -> Result<Self> {
        if nodes == 0 {
            return Err(Error::configuration("Cluster needs at least one node"));
        }
        match (telescope, infrastructure) {
            (Telescope::Low, Infrastructure::Cdr) => Ok(HardwareSpec::LowCdr { nodes }),
            (Telescope::Low, Infrastructure::Parametric) => Ok(HardwareSpec::LowParametric { nodes }),
            (Telescope::Mid, Infrastructure::Parametric) => Ok(HardwareSpec::MidParametric { nodes }),
            (Telescope::Mid, Infrastructure::Cdr) => Err(Error::configuration("No CDR hardware description exists for the mid telescope")),
        }
    }

    pub fn nodes(&self) -> u32 {
        match *self {
            HardwareSpec::LowCdr { nodes } | HardwareSpec::LowParametric { nodes } | HardwareSpec::MidParametric { nodes } => nodes,
        }
    }

    fn design(&self) -> &'static SdpDesign {
        match self {
            HardwareSpec::LowCdr { .. } => &LOW_CDR,
            HardwareSpec::LowParametric { .. } => &LOW_PARAMETRIC,
            HardwareSpec::MidParametric { .. } => &MID_PARAMETRIC,
        }
    }

    fn is_parametric(&self) -> bool {
        !matches!(self, HardwareSpec::LowCdr { .. })
    }

    /// Bytes/s moved from the input buffer to the compute buffer.
    pub fn input_transfer_rate(&self) -> f64 {
        let design = self.design();
        if self.is_parametric() {
            design.total_input_buffer * INPUT_BUFFER_RATE - INGEST_RATE
        } else {
            self.total_bandwidth() / design.total_nodes as f64
        }
    }

    /// Bytes/s leaving the output buffer, less the delivery link.
    pub fn output_transfer_rate(&self) -> f64 {
        self.design().total_output_buffer * INPUT_BUFFER_RATE - DELIVERY_RATE
    }

    /// Bytes/s the compute buffer can serve to running tasks.
    pub fn compute_buffer_rate(&self) -> f64 {
        self.design().total_compute_buffer * COMPUTE_BUFFER_RATE - self.input_transfer_rate() - self.output_transfer_rate()
    }

    fn machine(&self) -> MachineDto {
        let design = self.design();
        let compute_bandwidth = if self.is_parametric() {
            self.compute_buffer_rate() / design.total_nodes as f64
        } else {
            design.ethernet
        };

        MachineDto {
            count: self.nodes(),
            flops: GPU_PEAK_FLOPS * GPU_PER_NODE * design.efficiency,
            compute_bandwidth: compute_bandwidth as i64,
            memory: MEMORY_PER_NODE,
        }
    }
}

impl HardwareCapability for HardwareSpec {
    fn total_compute(&self) -> f64 {
        self.nodes() as f64 * GPU_PER_NODE * GPU_PEAK_FLOPS * self.design().efficiency
    }

    fn total_storage(&self) -> f64 {
        self.nodes() as f64 * self.design().storage_per_node
    }

    fn total_bandwidth(&self) -> f64 {
        self.nodes() as f64 * self.design().ethernet
    }

    fn to_descriptor(&self) -> ClusterDescriptorDto {
        let mut resources = BTreeMap::new();
        resources.insert(self.design().machine_name.to_string(), self.machine());

        ClusterDescriptorDto {
            header: ClusterHeaderDto { time: false, generator: GENERATOR.to_string(), version: env!("CARGO_PKG_VERSION").to_string() },
            system: ClusterSystemDto { resources, system_bandwidth: self.design().ethernet },
        }
    }

    fn buffer_config(&self) -> BufferConfigDto {
        let design = self.design();
        let (hot_capacity, cold_capacity) = if self.is_parametric() {
            (design.total_input_buffer, design.total_compute_buffer)
        } else {
            let (hot, cold) = design.buffer_ratio;
            let storage = self.total_storage();
            (storage * (hot / cold), storage * (1.0 - hot / cold))
        };

        BufferConfigDto {
            hot: HotBufferDto { capacity: hot_capacity as i64, max_ingest_rate: INGEST_RATE as i64 },
            cold: ColdBufferDto { capacity: cold_capacity as i64, max_data_rate: self.input_transfer_rate() as i64 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= b.abs() * 1e-9
    }

    #[test]
    fn test_selection_by_telescope_and_infrastructure() {
        assert_eq!(HardwareSpec::new(Telescope::Low, Infrastructure::Cdr, 896).unwrap(), HardwareSpec::LowCdr { nodes: 896 });
        assert_eq!(HardwareSpec::new(Telescope::Mid, Infrastructure::Parametric, 786).unwrap(), HardwareSpec::MidParametric { nodes: 786 });
        assert!(matches!(HardwareSpec::new(Telescope::Mid, Infrastructure::Cdr, 786), Err(Error::ConfigurationError(_))));
        assert!(matches!("cloud".parse::<Infrastructure>(), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_low_parametric_rates() {
        let spec = HardwareSpec::LowParametric { nodes: 896 };

        assert!(close(spec.input_transfer_rate(), 8.946875e11));
        assert!(close(spec.output_transfer_rate(), 8.0e9));
        assert!(close(spec.compute_buffer_rate(), 6.7473125e12));
        assert!(close(spec.total_compute(), 896.0 * 2.0 * 31e12 * 0.173));
    }

    #[test]
    fn test_low_parametric_descriptor() {
        let descriptor = HardwareSpec::LowParametric { nodes: 512 }.to_descriptor();
        let machine = &descriptor.system.resources["GenericSDP_LOW_CDR"];

        assert_eq!(machine.count, 512);
        assert!(close(machine.flops, 31e12 * 2.0 * 0.173));
        assert_eq!(machine.compute_bandwidth, (6.7473125e12 / 896.0) as i64);
        assert_eq!(descriptor.system.system_bandwidth, 7e9);
        assert!(!descriptor.header.time);
    }

    #[test]
    fn test_buffer_configs() {
        let cdr = HardwareSpec::LowCdr { nodes: 896 }.buffer_config();
        assert_eq!(cdr.hot.capacity, (896.0 * 75e12 * 0.2) as i64);
        assert_eq!(cdr.cold.capacity, (896.0 * 75e12 * (1.0 - 0.2)) as i64);
        assert_eq!(cdr.hot.max_ingest_rate, 460_000_000_000);
        assert_eq!(cdr.cold.max_data_rate, 7_000_000_000);

        let parametric = HardwareSpec::LowParametric { nodes: 896 }.buffer_config();
        assert_eq!(parametric.hot.capacity, 43_350_000_000_000_000);
        assert_eq!(parametric.cold.capacity, 25_500_000_000_000_000);
        assert!((parametric.cold.max_data_rate - 894_687_500_000).abs() <= 1);
    }

    #[test]
    fn test_mid_descriptor_name() {
        let descriptor = HardwareSpec::MidParametric { nodes: 786 }.to_descriptor();
        assert!(descriptor.system.resources.contains_key("GenericSDP_PAR_MODEL_MID"));
        assert_eq!(descriptor.system.system_bandwidth, 25.0 / 8.0 * 1e9);
    }
}
