//! Tool parameter types.
//!
//! Argument names are camelCase on the wire.  A missing argument is rejected
//! by rmcp while decoding the call; a blank one is rejected here, naming the
//! field, before any credential or network work happens.

use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::fabric::{ResourceKind, ResourceTarget};

/// Trimmed `value`, or `"<what> missing"` when it is blank.
pub fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    anyhow::ensure!(!trimmed.is_empty(), "{what} missing");
    Ok(trimmed)
}

fn scope(resource_group_name: &str, subscription_id: &str) -> Result<(String, String)> {
    let rg = required(resource_group_name, "resource group name")?;
    let sub = required(subscription_id, "subscription id")?;
    Ok((rg.to_string(), sub.to_string()))
}

/// A validated reference to one resource in one subscription.
#[derive(Debug)]
pub struct TargetRequest {
    pub subscription_id: String,
    pub target: ResourceTarget,
}

/// A validated create or update request.
#[derive(Debug)]
pub struct WriteRequest {
    pub subscription_id: String,
    pub target: ResourceTarget,
    pub location: Option<String>,
    pub properties: Value,
}

// ---------------------------------------------------------------------------
// Top-level fabric resources
// ---------------------------------------------------------------------------

/// Parameters for `create_*` on IP prefixes, communities, route policies and
/// isolation domains.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceParams {
    /// Name of the resource to create.  If not available, ask the user to
    /// provide the name; do not make one up.
    pub name: String,
    /// Azure region of the resource, e.g. `eastus`.
    pub location: String,
    /// Resource properties as a JSON string, e.g. the prefix, community or
    /// statement rules.
    pub properties: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl CreateResourceParams {
    pub fn validate(&self, kind: ResourceKind) -> Result<WriteRequest> {
        let name = required(&self.name, &format!("{} name", kind.noun()))?;
        let location = required(&self.location, "location")?;
        let properties = required(&self.properties, "properties")?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(WriteRequest {
            properties: kind.parse_properties(properties)?,
            target: ResourceTarget::new(kind, &rg, name),
            location: Some(location.to_string()),
            subscription_id,
        })
    }
}

/// Parameters for `update_*`: the properties are sent as a PATCH.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceParams {
    /// Name of the existing resource.
    pub name: String,
    /// Properties to change, as a JSON string.  Only the given fields are updated.
    pub properties: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl UpdateResourceParams {
    pub fn validate(&self, kind: ResourceKind) -> Result<WriteRequest> {
        let name = required(&self.name, &format!("{} name", kind.noun()))?;
        let properties = required(&self.properties, "properties")?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(WriteRequest {
            properties: kind.parse_properties(properties)?,
            target: ResourceTarget::new(kind, &rg, name),
            location: None,
            subscription_id,
        })
    }
}

/// Parameters for `get_*`, `delete_*`, `enable_*` and `disable_*`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceParams {
    /// Name of the resource.
    pub name: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl ResourceParams {
    pub fn validate(&self, kind: ResourceKind) -> Result<TargetRequest> {
        let name = required(&self.name, &format!("{} name", kind.noun()))?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(TargetRequest {
            target: ResourceTarget::new(kind, &rg, name),
            subscription_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal and external networks
// ---------------------------------------------------------------------------

/// Parameters for creating or updating an internal or external network.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkWriteParams {
    /// The L3 isolation domain the network belongs to.
    pub l3_isolation_domain_name: String,
    /// Name of the network.
    #[serde(alias = "internalNetworkName", alias = "externalNetworkName")]
    pub network_name: String,
    /// Network properties as a JSON string.
    pub properties: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl NetworkWriteParams {
    pub fn validate(&self, kind: ResourceKind) -> Result<WriteRequest> {
        let parent = required(&self.l3_isolation_domain_name, "L3 isolation domain name")?;
        let name = required(&self.network_name, &format!("{} name", kind.noun()))?;
        let properties = required(&self.properties, "properties")?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(WriteRequest {
            properties: kind.parse_properties(properties)?,
            target: ResourceTarget::nested(kind, &rg, parent, name),
            location: None,
            subscription_id,
        })
    }
}

/// Parameters for reading or deleting an internal or external network.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    /// The L3 isolation domain the network belongs to.
    pub l3_isolation_domain_name: String,
    /// Name of the network.
    #[serde(alias = "internalNetworkName", alias = "externalNetworkName")]
    pub network_name: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl NetworkParams {
    pub fn validate(&self, kind: ResourceKind) -> Result<TargetRequest> {
        let parent = required(&self.l3_isolation_domain_name, "L3 isolation domain name")?;
        let name = required(&self.network_name, &format!("{} name", kind.noun()))?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(TargetRequest {
            target: ResourceTarget::nested(kind, &rg, parent, name),
            subscription_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Fabrics and devices
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FabricParams {
    /// The name of the network fabric.
    pub fabric_name: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl FabricParams {
    pub fn validate(&self) -> Result<TargetRequest> {
        let name = required(&self.fabric_name, "fabric name")?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(TargetRequest {
            target: ResourceTarget::new(ResourceKind::NetworkFabric, &rg, name),
            subscription_id,
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceParams {
    /// The name of the network device.
    pub device_name: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl DeviceParams {
    pub fn validate(&self) -> Result<TargetRequest> {
        let name = required(&self.device_name, "device name")?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok(TargetRequest {
            target: ResourceTarget::new(ResourceKind::NetworkDevice, &rg, name),
            subscription_id,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum RebootType {
    GracefulRebootWithZTP,
    #[default]
    GracefulRebootWithoutZTP,
    UngracefulRebootWithZTP,
    UngracefulRebootWithoutZTP,
}

impl RebootType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GracefulRebootWithZTP => "GracefulRebootWithZTP",
            Self::GracefulRebootWithoutZTP => "GracefulRebootWithoutZTP",
            Self::UngracefulRebootWithZTP => "UngracefulRebootWithZTP",
            Self::UngracefulRebootWithoutZTP => "UngracefulRebootWithoutZTP",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RebootDeviceParams {
    /// The name of the network device.
    pub device_name: String,
    /// The name of the resource group.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
    /// Reboot mode (default: `GracefulRebootWithoutZTP`).
    pub reboot_type: Option<RebootType>,
}

impl RebootDeviceParams {
    pub fn validate(&self) -> Result<(TargetRequest, RebootType)> {
        let name = required(&self.device_name, "device name")?;
        let (rg, subscription_id) = scope(&self.resource_group_name, &self.subscription_id)?;
        let request = TargetRequest {
            target: ResourceTarget::new(ResourceKind::NetworkDevice, &rg, name),
            subscription_id,
        };
        Ok((request, self.reboot_type.unwrap_or_default()))
    }
}

// ---------------------------------------------------------------------------
// Resource groups and lab status
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceGroupParams {
    /// The name of the resource group.
    pub name: String,
    /// Azure region of the resource group.
    pub location: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl CreateResourceGroupParams {
    /// `(subscription, name, location)`
    pub fn validate(&self) -> Result<(String, String, String)> {
        let name = required(&self.name, "resource group name")?;
        let location = required(&self.location, "location")?;
        let sub = required(&self.subscription_id, "subscription id")?;
        Ok((sub.to_string(), name.to_string(), location.to_string()))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupParams {
    /// The name of the resource group.
    pub name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl ResourceGroupParams {
    /// `(subscription, name)`
    pub fn validate(&self) -> Result<(String, String)> {
        let name = required(&self.name, "resource group name")?;
        let sub = required(&self.subscription_id, "subscription id")?;
        Ok((sub.to_string(), name.to_string()))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabStatusParams {
    /// The name of the resource group holding the lab's fabrics.
    pub resource_group_name: String,
    /// The subscription ID for the Azure account.
    pub subscription_id: String,
}

impl LabStatusParams {
    /// `(subscription, resource group)`
    pub fn validate(&self) -> Result<(String, String)> {
        let (rg, sub) = scope(&self.resource_group_name, &self.subscription_id)?;
        Ok((sub, rg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_params(name: &str, rg: &str, properties: &str) -> CreateResourceParams {
        CreateResourceParams {
            name: name.into(),
            location: "eastus".into(),
            properties: properties.into(),
            resource_group_name: rg.into(),
            subscription_id: "sub".into(),
        }
    }

    #[test]
    fn blank_name_names_the_resource_kind() {
        let err = create_params("", "rg", "{}")
            .validate(ResourceKind::IpPrefix)
            .unwrap_err();
        assert_eq!(err.to_string(), "ip prefix name missing");

        let err = create_params("  ", "rg", "{}")
            .validate(ResourceKind::L3IsolationDomain)
            .unwrap_err();
        assert_eq!(err.to_string(), "L3 isolation domain name missing");
    }

    #[test]
    fn whitespace_resource_group_is_blank() {
        let err = create_params("p1", " \t", "{}")
            .validate(ResourceKind::IpPrefix)
            .unwrap_err();
        assert_eq!(err.to_string(), "resource group name missing");
    }

    #[test]
    fn blank_properties_are_reported_before_parsing() {
        let err = create_params("p1", "rg", "")
            .validate(ResourceKind::RoutePolicy)
            .unwrap_err();
        assert_eq!(err.to_string(), "properties missing");
    }

    #[test]
    fn malformed_properties_are_wrapped() {
        let err = create_params("p1", "rg", "{\"ipPrefixRules\": 3}")
            .validate(ResourceKind::IpPrefix)
            .unwrap_err();
        assert!(err.to_string().starts_with("error unmarshalling properties"));
    }

    #[test]
    fn valid_create_request_is_trimmed() {
        let request = create_params(" p1 ", "rg", r#"{"annotation": "a"}"#)
            .validate(ResourceKind::IpPrefix)
            .unwrap();
        assert_eq!(request.target.name, "p1");
        assert_eq!(request.location.as_deref(), Some("eastus"));
        assert_eq!(request.properties, json!({"annotation": "a"}));
    }

    #[test]
    fn network_name_accepts_kind_specific_aliases() {
        let params: NetworkParams = serde_json::from_value(json!({
            "l3IsolationDomainName": "isd",
            "internalNetworkName": "net1",
            "resourceGroupName": "rg",
            "subscriptionId": "sub"
        }))
        .unwrap();
        let request = params.validate(ResourceKind::InternalNetwork).unwrap();
        assert_eq!(request.target.parent.as_deref(), Some("isd"));
        assert_eq!(request.target.name, "net1");
    }

    #[test]
    fn blank_isolation_domain_is_reported() {
        let params = NetworkParams {
            l3_isolation_domain_name: "".into(),
            network_name: "net1".into(),
            resource_group_name: "rg".into(),
            subscription_id: "sub".into(),
        };
        let err = params.validate(ResourceKind::ExternalNetwork).unwrap_err();
        assert_eq!(err.to_string(), "L3 isolation domain name missing");
    }

    #[test]
    fn missing_argument_fails_to_decode() {
        let err = serde_json::from_value::<FabricParams>(json!({
            "fabricName": "nf1",
            "resourceGroupName": "rg"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("subscriptionId"));
    }

    #[test]
    fn reboot_type_defaults_to_graceful_without_ztp() {
        let params: RebootDeviceParams = serde_json::from_value(json!({
            "deviceName": "cp1",
            "resourceGroupName": "rg",
            "subscriptionId": "sub"
        }))
        .unwrap();
        let (_, reboot_type) = params.validate().unwrap();
        assert_eq!(reboot_type.as_str(), "GracefulRebootWithoutZTP");
    }

    #[test]
    fn schema_marks_arguments_required() {
        let schema = serde_json::to_value(schemars::schema_for!(CreateResourceParams)).unwrap();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for field in ["name", "location", "properties", "resourceGroupName", "subscriptionId"] {
            assert!(required.contains(&field), "{field} should be required");
        }
    }

    #[test]
    fn lab_status_requires_subscription() {
        let params = LabStatusParams {
            resource_group_name: "rg".into(),
            subscription_id: "".into(),
        };
        assert_eq!(params.validate().unwrap_err().to_string(), "subscription id missing");
    }
}
