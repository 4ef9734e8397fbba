//! Health report for a lab: every network fabric in a resource group together
//! with the devices on its provisioned racks.

use anyhow::{Context, Result};

use crate::fabric::FabricClient;
use crate::models::{name_from_id, ResourceStates};

const SUCCEEDED: &str = "Succeeded";
const ENABLED: &str = "Enabled";
const PROVISIONED: &str = "Provisioned";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSummary {
    pub name: String,
    pub provisioning_state: String,
    pub administrative_state: String,
    pub configuration_state: String,
}

impl StateSummary {
    fn new(name: &str, states: &ResourceStates) -> Self {
        let or_unknown = |s: &Option<String>| s.clone().unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            name: name.to_string(),
            provisioning_state: or_unknown(&states.provisioning_state),
            administrative_state: or_unknown(&states.administrative_state),
            configuration_state: or_unknown(&states.configuration_state),
        }
    }

    fn provisioned_and_enabled(&self) -> bool {
        self.provisioning_state == SUCCEEDED && self.administrative_state == ENABLED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FabricStatus {
    pub fabric: StateSummary,
    pub devices: Vec<StateSummary>,
}

impl FabricStatus {
    fn is_healthy(&self) -> bool {
        let fabric_ok = self.fabric.provisioned_and_enabled()
            && matches!(
                self.fabric.configuration_state.as_str(),
                SUCCEEDED | PROVISIONED
            );
        fabric_ok
            && self
                .devices
                .iter()
                .all(|d| d.provisioned_and_enabled() && d.configuration_state == SUCCEEDED)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabStatus {
    pub fabrics: Vec<FabricStatus>,
}

impl LabStatus {
    /// A lab with no fabrics is not healthy.
    pub fn is_healthy(&self) -> bool {
        !self.fabrics.is_empty() && self.fabrics.iter().all(FabricStatus::is_healthy)
    }

    /// Markdown report handed back to the agent.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.is_healthy() {
            out.push_str("The lab is in a healthy state.\n\n");
        } else {
            out.push_str("The lab is not in a healthy state.\n\n");
        }

        out.push_str("Fabric Status:\n");
        for status in &self.fabrics {
            let f = &status.fabric;
            out.push_str(&format!(
                "- {} (Provisioning State: {}, Administrative State: {}, Configuration State: {})\n",
                f.name, f.provisioning_state, f.administrative_state, f.configuration_state
            ));
            out.push_str("  Devices:\n");
            out.push_str("    | Name | Provisioning State | AdministrativeState | Configuration State |\n");
            out.push_str("    | :--- | :--- | :--- | :--- |\n");
            for d in &status.devices {
                out.push_str(&format!(
                    "    | {} | {} | {} | {} |\n",
                    d.name, d.provisioning_state, d.administrative_state, d.configuration_state
                ));
            }
            out.push('\n');
        }
        out
    }
}

/// Walk fabrics → racks → devices in `resource_group`.  Racks that are not yet
/// provisioned contribute no devices.
pub async fn collect(client: &FabricClient, resource_group: &str) -> Result<LabStatus> {
    let mut lab = LabStatus::default();

    for fabric in client.list_fabrics(resource_group).await? {
        let mut status = FabricStatus {
            fabric: StateSummary::new(&fabric.name, &fabric.properties.states),
            devices: Vec::new(),
        };

        for rack_id in fabric.properties.racks.iter().flatten() {
            let rack_name = name_from_id(rack_id);
            let rack = client
                .rack(resource_group, rack_name)
                .await
                .with_context(|| format!("failed to get device IDs for fabric {}", fabric.name))?;

            if rack.properties.provisioning_state.as_deref() != Some(SUCCEEDED) {
                tracing::debug!(rack = %rack.name, "rack not provisioned, skipping its devices");
                continue;
            }

            for device_id in rack.properties.network_devices.iter().flatten() {
                let device = client.device(resource_group, name_from_id(device_id)).await?;
                status
                    .devices
                    .push(StateSummary::new(&device.name, &device.properties.states));
            }
        }

        lab.fabrics.push(status);
    }

    Ok(lab)
}
