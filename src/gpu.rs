//! GPU identity presets and the device-identity rule category built from them.

use crate::rules::{Category, PatchRule};
use serde::Deserialize;

/// Name of the generated device-identity category.
pub const DEVICE_IDENTITY: &str = "device-identity";

/// The adapter a patched tree should report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GpuIdentity {
	/// Preset name used on the command line.
	pub name: String,

	/// PCI vendor id, written as it should appear in source (e.g. `0x1002`).
	pub vendor_id: String,

	/// PCI device id, written as it should appear in source.
	pub device_id: String,

	/// Human-readable description.
	#[serde(default)]
	pub description: String,

	/// Shared system memory to report, in MiB.
	#[serde(default = "default_memory_mb")]
	pub memory_mb: u64,
}

fn default_memory_mb() -> u64 {
	16384
}

impl GpuIdentity {
	/// Build the device-identity category for this adapter.
	///
	/// `adapter_id.*` covers the vkd3d adapter struct; `VendorId`, `DeviceId`
	/// and `SharedSystemMemory` cover the DXGI adapter descriptions.
	pub fn category(&self) -> Category {
		let memory = format!("{}ULL * 1024 * 1024", self.memory_mb);
		Category::new(
			DEVICE_IDENTITY,
			format!("Report {} ({})", self.name, self.description),
			vec![
				PatchRule::assignment("gpu_vid", "adapter_id.vendor_id", &self.vendor_id),
				PatchRule::assignment("gpu_did", "adapter_id.device_id", &self.device_id),
				PatchRule::assignment("gpu_vendor", "VendorId", &self.vendor_id),
				PatchRule::assignment("gpu_device", "DeviceId", &self.device_id),
				PatchRule::assignment("gpu_mem", "SharedSystemMemory", &memory),
			],
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::apply;
	use crate::rules::compile_rules;

	fn rx6700xt() -> GpuIdentity {
		GpuIdentity {
			name: "rx6700xt".to_string(),
			vendor_id: "0x1002".to_string(),
			device_id: "0x73DF".to_string(),
			description: "AMD Radeon RX 6700 XT".to_string(),
			memory_mb: 16384,
		}
	}

	#[test]
	fn test_category_rule_ids() {
		let category = rx6700xt().category();
		let ids: Vec<_> = category.rules.iter().map(|r| r.id.as_str()).collect();

		assert_eq!(category.name, DEVICE_IDENTITY);
		assert_eq!(
			ids,
			vec!["gpu_vid", "gpu_did", "gpu_vendor", "gpu_device", "gpu_mem"]
		);
	}

	#[test]
	fn test_category_rewrites_identity() {
		let rules = compile_rules(&rx6700xt().category().rules).unwrap();
		let content = "\
adapter_id.vendor_id = 0x10DE;
adapter_id.device_id = 0x2684;
desc->VendorId = adapter_id.vendor_id;
desc->DeviceId = adapter_id.device_id;
desc->SubSysVendorId = 0x1458;
desc->SharedSystemMemory = 8 * 1024 * 1024;
";

		assert_eq!(
			apply(content, &rules),
			"\
adapter_id.vendor_id = 0x1002;
adapter_id.device_id = 0x73DF;
desc->VendorId = 0x1002;
desc->DeviceId = 0x73DF;
desc->SubSysVendorId = 0x1458;
desc->SharedSystemMemory = 16384ULL * 1024 * 1024;
"
		);
	}

	#[test]
	fn test_deserialize_defaults_memory() {
		let gpu: GpuIdentity = toml::from_str(
			r#"
name = "d3mu"
vendor-id = "0x1002"
device-id = "0x163f"
"#,
		)
		.unwrap();

		assert_eq!(gpu.memory_mb, 16384);
		assert!(gpu.description.is_empty());
	}
}
