//! Typed views of `Microsoft.ManagedNetworkFabric` payloads.
//!
//! Writable properties are deserialized from the caller's JSON before anything
//! is sent, so malformed payloads fail locally with a JSON path.  Every field is
//! optional and unknown fields are carried through untouched in `extra`; ARM
//! remains the authority on which fields a given operation requires.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deserialize `raw` as `T` and hand back the normalised JSON to send to ARM.
pub fn parse_properties<T>(raw: &str) -> Result<Value>
where
    T: DeserializeOwned + Serialize,
{
    let mut de = serde_json::Deserializer::from_str(raw);
    let typed: T = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        anyhow!(
            "error unmarshalling properties: path={} error={}",
            e.path(),
            e.inner()
        )
    })?;
    de.end()
        .map_err(|e| anyhow!("error unmarshalling properties: {e}"))?;
    Ok(serde_json::to_value(typed)?)
}

// ---------------------------------------------------------------------------
// Shared value sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunityActionType {
    Permit,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixCondition {
    EqualTo,
    GreaterThanOrEqualTo,
    LesserThanOrEqualTo,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WellKnownCommunity {
    Internet,
    #[serde(rename = "LocalAS")]
    LocalAs,
    NoAdvertise,
    NoExport,
    GShut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamilyType {
    IPv4,
    IPv6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutePolicyActionType {
    Permit,
    Deny,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementConditionType {
    Or,
    And,
}

/// ARM models several switches as the strings `"True"` / `"False"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanFlag {
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeeringOption {
    OptionA,
    OptionB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnableDisableState {
    Enable,
    Disable,
}

// ---------------------------------------------------------------------------
// IP prefixes and communities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpPrefixProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(rename = "ipPrefixRules", skip_serializing_if = "Option::is_none")]
    pub ip_prefix_rules: Option<Vec<IpPrefixRule>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpPrefixRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CommunityActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<PrefixCondition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpCommunityProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(rename = "ipCommunityRules", skip_serializing_if = "Option::is_none")]
    pub ip_community_rules: Option<Vec<IpCommunityRule>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpCommunityRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CommunityActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub well_known_communities: Option<Vec<WellKnownCommunity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_members: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpExtendedCommunityProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(rename = "ipExtendedCommunityRules", skip_serializing_if = "Option::is_none")]
    pub ip_extended_community_rules: Option<Vec<IpExtendedCommunityRule>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpExtendedCommunityRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CommunityActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_targets: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Route policies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePolicyProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_fabric_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_family_type: Option<AddressFamilyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_action: Option<CommunityActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<RoutePolicyStatement>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePolicyStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<StatementCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<StatementAction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementCondition {
    #[serde(rename = "ipCommunityIds", skip_serializing_if = "Option::is_none")]
    pub ip_community_ids: Option<Vec<String>>,
    #[serde(rename = "ipExtendedCommunityIds", skip_serializing_if = "Option::is_none")]
    pub ip_extended_community_ids: Option<Vec<String>>,
    #[serde(rename = "ipPrefixId", skip_serializing_if = "Option::is_none")]
    pub ip_prefix_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<StatementConditionType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<RoutePolicyActionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_preference: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Isolation domains and networks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2IsolationDomainProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_fabric_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L3IsolationDomainProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_fabric_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redistribute_connected_subnets: Option<BooleanFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redistribute_static_routes: Option<BooleanFlag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectedSubnet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalNetworkProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(rename = "connectedIPv4Subnets", skip_serializing_if = "Option::is_none")]
    pub connected_ipv4_subnets: Option<Vec<ConnectedSubnet>>,
    #[serde(rename = "connectedIPv6Subnets", skip_serializing_if = "Option::is_none")]
    pub connected_ipv6_subnets: Option<Vec<ConnectedSubnet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_monitoring_enabled: Option<BooleanFlag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNetworkProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peering_option: Option<PeeringOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_route_policy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_route_policy_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the `updateAdministrativeState` action.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAdministrativeState {
    pub state: EnableDisableState,
}

// ---------------------------------------------------------------------------
// Read models used by the lab report and device reboot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStates {
    pub provisioning_state: Option<String>,
    pub administrative_state: Option<String>,
    pub configuration_state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkFabric {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: NetworkFabricProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkFabricProperties {
    #[serde(flatten)]
    pub states: ResourceStates,
    pub racks: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkRack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: NetworkRackProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRackProperties {
    pub provisioning_state: Option<String>,
    pub network_devices: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkDevice {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: NetworkDeviceProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeviceProperties {
    #[serde(flatten)]
    pub states: ResourceStates,
    pub serial_number: Option<String>,
}

/// Last path segment of an ARM resource id.
pub fn name_from_id(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}
