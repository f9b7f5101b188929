//! Built-in recommendations used when no template configuration loads
//!
//! Text here is fixed English covering the known checks; the only dynamic
//! content is the outcome's most salient field. Summaries produced in this
//! mode carry an explicit marker so a report's provenance is visible.

use crate::models::{Recommendation, RecommendationKind, TestOutcome, TestStatus};

/// Literal marker embedded in every fallback-mode summary
pub const FALLBACK_SUMMARY_MARKER: &str = "fallback mode";

/// Built-in recommendation for a failed or warned check
///
/// Returns `None` for passing/skipped outcomes and for test names outside
/// the known set.
pub fn fallback_recommendation(
    test_name: &str,
    status: TestStatus,
    outcome: &TestOutcome,
) -> Option<Recommendation> {
    if !matches!(status, TestStatus::Fail | TestStatus::Warn) {
        return None;
    }

    let rec = |kind: RecommendationKind,
               fault_code: &str,
               issue: String,
               suggestion: &str,
               commands: &[&str]| Recommendation {
        kind,
        test_name: test_name.to_string(),
        fault_code: Some(fault_code.to_string()),
        issue,
        suggestion: suggestion.to_string(),
        commands: commands.iter().map(|c| c.to_string()).collect(),
        references: Vec::new(),
    };

    match test_name {
        "gpu_count_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0001",
            format!(
                "GPU count mismatch (found: {})",
                format_count(outcome.gpu_count)
            ),
            "Verify that all GPUs are visible to the driver and reseat or replace any missing device",
            &["nvidia-smi --list-gpus", "lspci | grep -i nvidia"],
        )),
        "gpu_mode_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0002",
            format!(
                "GPU is in an unsupported mode (enabled GPUs: {})",
                format_indexes(outcome.enabled_gpu_indexes.as_deref())
            ),
            "Reset the GPU mode to the supported configuration and reboot the node",
            &["nvidia-smi -q -d MIG", "nvidia-smi -mig 0"],
        )),
        "pcie_error_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0003",
            "PCIe errors detected in the kernel log".to_string(),
            "Check PCIe link health and reseat the affected device if errors persist",
            &["dmesg | grep -i pcie", "lspci -vvv"],
        )),
        "rdma_nic_count" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0004",
            format!(
                "RDMA NIC count mismatch (found: {})",
                format_count(outcome.num_rdma_nics)
            ),
            "Verify all RDMA NICs are enumerated and their firmware is current",
            &["ibdev2netdev", "lspci | grep -i mellanox"],
        )),
        "rx_discards_check" => Some(rec(
            RecommendationKind::Warning,
            "HPCD-0005",
            format!(
                "RX discards exceed threshold on: {}",
                format_interfaces(outcome.failed_interfaces.as_deref())
            ),
            "Inspect the listed interfaces for congestion or cabling faults",
            &["ethtool -S <interface> | grep discard"],
        )),
        "sram_error_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0006",
            format!(
                "GPU SRAM errors detected (max uncorrectable: {}, max correctable: {})",
                format_count(outcome.max_uncorrectable),
                format_count(outcome.max_correctable)
            ),
            "Uncorrectable SRAM errors usually require GPU replacement; open a hardware ticket",
            &["nvidia-smi -q -d ECC"],
        )),
        "link_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0007",
            format!(
                "RDMA link is down or degraded on: {}",
                format_interfaces(outcome.failed_interfaces.as_deref())
            ),
            "Check cabling and switch ports for the listed links",
            &["ibstat", "mlxlink -d <device>"],
        )),
        "eth_link_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0008",
            format!(
                "Ethernet link is down or degraded on: {}",
                format_interfaces(outcome.failed_interfaces.as_deref())
            ),
            "Check cabling and switch ports for the listed Ethernet links",
            &["ip -br link", "ethtool <interface>"],
        )),
        "eth0_presence_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0009",
            format!(
                "eth0 interface not found (present: {})",
                format_flag(outcome.eth0_present)
            ),
            "Verify the primary network interface configuration and driver",
            &["ip addr show eth0"],
        )),
        "peermem_module_check" => Some(rec(
            RecommendationKind::Warning,
            "HPCD-0010",
            format!(
                "nvidia-peermem kernel module is not loaded (loaded: {})",
                format_flag(outcome.module_loaded)
            ),
            "Load the nvidia-peermem module to enable GPUDirect RDMA",
            &["modprobe nvidia-peermem", "lsmod | grep peermem"],
        )),
        "nvlink_speed_check" => Some(rec(
            RecommendationKind::Warning,
            "HPCD-0011",
            "NVLink speed or width below expected".to_string(),
            "Verify NVLink topology and retrain links; reboot if the degradation persists",
            &["nvidia-smi nvlink --status"],
        )),
        "fabric_manager_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0012",
            "nvidia-fabricmanager service is not running".to_string(),
            "Start the fabric manager service and confirm it stays healthy",
            &[
                "systemctl start nvidia-fabricmanager",
                "systemctl status nvidia-fabricmanager",
            ],
        )),
        "hca_error_check" => Some(rec(
            RecommendationKind::Critical,
            "HPCD-0013",
            "MLX5 fatal errors detected in the kernel log".to_string(),
            "Check the HCA firmware state and reset the adapter if fatal errors recur",
            &["dmesg | grep -i mlx5"],
        )),
        _ => None,
    }
}

fn format_count<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn format_flag(value: Option<bool>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn format_indexes(indexes: Option<&[u32]>) -> String {
    match indexes {
        Some(indexes) if !indexes.is_empty() => indexes
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(","),
        _ => "unknown".to_string(),
    }
}

fn format_interfaces(interfaces: Option<&[String]>) -> String {
    match interfaces {
        Some(interfaces) if !interfaces.is_empty() => interfaces.join(","),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_produces_builtin_recommendation() {
        let mut outcome = TestOutcome::new(TestStatus::Fail);
        outcome.gpu_count = Some(7);

        let rec = fallback_recommendation("gpu_count_check", TestStatus::Fail, &outcome).unwrap();
        assert_eq!(rec.kind, RecommendationKind::Critical);
        assert_eq!(rec.issue, "GPU count mismatch (found: 7)");
        assert!(!rec.commands.is_empty());
    }

    #[test]
    fn test_warn_uses_same_table() {
        let outcome = TestOutcome::new(TestStatus::Warn);
        let rec =
            fallback_recommendation("fabric_manager_check", TestStatus::Warn, &outcome).unwrap();
        assert_eq!(rec.kind, RecommendationKind::Critical);
    }

    #[test]
    fn test_pass_and_skip_produce_nothing() {
        let outcome = TestOutcome::new(TestStatus::Pass);
        assert!(fallback_recommendation("gpu_count_check", TestStatus::Pass, &outcome).is_none());
        assert!(fallback_recommendation("gpu_count_check", TestStatus::Skip, &outcome).is_none());
    }

    #[test]
    fn test_unknown_test_produces_nothing() {
        let outcome = TestOutcome::new(TestStatus::Fail);
        assert!(fallback_recommendation("mystery_check", TestStatus::Fail, &outcome).is_none());
    }

    #[test]
    fn test_salient_field_missing_formats_as_unknown() {
        let outcome = TestOutcome::new(TestStatus::Fail);
        let rec = fallback_recommendation("rx_discards_check", TestStatus::Fail, &outcome).unwrap();
        assert_eq!(rec.issue, "RX discards exceed threshold on: unknown");
    }

    #[test]
    fn test_known_set_is_covered() {
        let outcome = TestOutcome::new(TestStatus::Fail);
        for name in [
            "gpu_count_check",
            "gpu_mode_check",
            "pcie_error_check",
            "rdma_nic_count",
            "rx_discards_check",
            "sram_error_check",
            "link_check",
            "eth_link_check",
            "eth0_presence_check",
            "peermem_module_check",
            "nvlink_speed_check",
            "fabric_manager_check",
            "hca_error_check",
        ] {
            assert!(
                fallback_recommendation(name, TestStatus::Fail, &outcome).is_some(),
                "missing fallback entry for {name}"
            );
        }
    }
}
