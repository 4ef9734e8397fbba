use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::{json, Value};

use crate::arm::ArmClient;
use crate::models::{
    self, EnableDisableState, ExternalNetworkProperties, InternalNetworkProperties,
    IpCommunityProperties, IpExtendedCommunityProperties, IpPrefixProperties,
    L2IsolationDomainProperties, L3IsolationDomainProperties, NetworkDevice, NetworkFabric,
    NetworkRack, RoutePolicyProperties, UpdateAdministrativeState,
};

pub const PROVIDER: &str = "Microsoft.ManagedNetworkFabric";

/// Serial numbers of virtual lab (cEOS) devices contain this marker.  Such
/// devices cannot be rebooted through ARM.
pub const VLAB_SERIAL_MARKER: &str = "cEOSLab";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    IpPrefix,
    IpCommunity,
    IpExtendedCommunity,
    RoutePolicy,
    L2IsolationDomain,
    L3IsolationDomain,
    InternalNetwork,
    ExternalNetwork,
    NetworkFabric,
    NetworkDevice,
    NetworkRack,
}

impl ResourceKind {
    /// ARM collection segment under the provider.
    pub fn collection(self) -> &'static str {
        match self {
            Self::IpPrefix => "ipPrefixes",
            Self::IpCommunity => "ipCommunities",
            Self::IpExtendedCommunity => "ipExtendedCommunities",
            Self::RoutePolicy => "routePolicies",
            Self::L2IsolationDomain => "l2IsolationDomains",
            Self::L3IsolationDomain => "l3IsolationDomains",
            Self::InternalNetwork => "internalNetworks",
            Self::ExternalNetwork => "externalNetworks",
            Self::NetworkFabric => "networkFabrics",
            Self::NetworkDevice => "networkDevices",
            Self::NetworkRack => "networkRacks",
        }
    }

    /// Title-case name used in confirmations.
    pub fn label(self) -> &'static str {
        match self {
            Self::IpPrefix => "IP Prefix",
            Self::IpCommunity => "IP Community",
            Self::IpExtendedCommunity => "IP Extended Community",
            Self::RoutePolicy => "Route Policy",
            Self::L2IsolationDomain => "L2 Isolation Domain",
            Self::L3IsolationDomain => "L3 Isolation Domain",
            Self::InternalNetwork => "Internal Network",
            Self::ExternalNetwork => "External Network",
            Self::NetworkFabric => "Network Fabric",
            Self::NetworkDevice => "Network Device",
            Self::NetworkRack => "Network Rack",
        }
    }

    /// Lower-case name used in error messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::IpPrefix => "ip prefix",
            Self::IpCommunity => "ip community",
            Self::IpExtendedCommunity => "ip extended community",
            Self::RoutePolicy => "route policy",
            Self::L2IsolationDomain => "L2 isolation domain",
            Self::L3IsolationDomain => "L3 isolation domain",
            Self::InternalNetwork => "internal network",
            Self::ExternalNetwork => "external network",
            Self::NetworkFabric => "network fabric",
            Self::NetworkDevice => "network device",
            Self::NetworkRack => "network rack",
        }
    }

    /// Networks live under an L3 isolation domain and carry no location.
    pub fn is_nested(self) -> bool {
        matches!(self, Self::InternalNetwork | Self::ExternalNetwork)
    }

    /// Validate a caller-supplied properties document for this kind.
    pub fn parse_properties(self, raw: &str) -> Result<Value> {
        match self {
            Self::IpPrefix => models::parse_properties::<IpPrefixProperties>(raw),
            Self::IpCommunity => models::parse_properties::<IpCommunityProperties>(raw),
            Self::IpExtendedCommunity => {
                models::parse_properties::<IpExtendedCommunityProperties>(raw)
            }
            Self::RoutePolicy => models::parse_properties::<RoutePolicyProperties>(raw),
            Self::L2IsolationDomain => models::parse_properties::<L2IsolationDomainProperties>(raw),
            Self::L3IsolationDomain => models::parse_properties::<L3IsolationDomainProperties>(raw),
            Self::InternalNetwork => models::parse_properties::<InternalNetworkProperties>(raw),
            Self::ExternalNetwork => models::parse_properties::<ExternalNetworkProperties>(raw),
            Self::NetworkFabric | Self::NetworkDevice | Self::NetworkRack => {
                anyhow::bail!("{} properties are not writable through this server", self.noun())
            }
        }
    }
}

/// A single fabric resource inside a resource group.
#[derive(Debug, Clone)]
pub struct ResourceTarget {
    pub kind: ResourceKind,
    pub resource_group: String,
    /// L3 isolation domain owning a nested network.
    pub parent: Option<String>,
    pub name: String,
}

impl ResourceTarget {
    pub fn new(kind: ResourceKind, resource_group: &str, name: &str) -> Self {
        Self {
            kind,
            resource_group: resource_group.to_string(),
            parent: None,
            name: name.to_string(),
        }
    }

    pub fn nested(kind: ResourceKind, resource_group: &str, parent: &str, name: &str) -> Self {
        Self {
            parent: Some(parent.to_string()),
            ..Self::new(kind, resource_group, name)
        }
    }

    fn segments<'a>(&'a self, subscription_id: &'a str) -> Vec<&'a str> {
        let mut segments: Vec<&'a str> = vec![
            "subscriptions",
            subscription_id,
            "resourceGroups",
            self.resource_group.as_str(),
            "providers",
            PROVIDER,
        ];
        if let Some(parent) = &self.parent {
            segments.extend([ResourceKind::L3IsolationDomain.collection(), parent.as_str()]);
        }
        segments.extend([self.kind.collection(), self.name.as_str()]);
        segments
    }

    fn created(&self, verb: &str) -> String {
        format!(
            "{} '{}' {verb} successfully in resource group '{}'",
            self.kind.label(),
            self.name,
            self.resource_group
        )
    }
}

/// ARM client bound to one subscription and the fabric API version.
pub struct FabricClient {
    arm: ArmClient,
    subscription_id: String,
    api_version: String,
}

impl FabricClient {
    pub fn new(arm: ArmClient, subscription_id: &str, api_version: &str) -> Self {
        Self {
            arm,
            subscription_id: subscription_id.to_string(),
            api_version: api_version.to_string(),
        }
    }

    /// PUT the resource and wait for provisioning.  `location` is ignored for
    /// nested networks.
    pub async fn create(
        &self,
        target: &ResourceTarget,
        location: Option<&str>,
        properties: Value,
    ) -> Result<String> {
        let noun = target.kind.noun();
        let body = match location.filter(|_| !target.kind.is_nested()) {
            Some(location) => json!({ "location": location, "properties": properties }),
            None => json!({ "properties": properties }),
        };

        tracing::info!(kind = noun, name = %target.name, rg = %target.resource_group, "creating resource");

        let poller = self
            .arm
            .begin(Method::PUT, &target.segments(&self.subscription_id), &self.api_version, Some(&body))
            .await
            .with_context(|| format!("failed to begin creating {noun}"))?;
        poller
            .poll_until_done()
            .await
            .with_context(|| format!("failed to create {noun}"))?;

        Ok(target.created("created"))
    }

    /// PATCH `properties` onto an existing resource.
    pub async fn update(&self, target: &ResourceTarget, properties: Value) -> Result<String> {
        let noun = target.kind.noun();
        let body = json!({ "properties": properties });

        tracing::info!(kind = noun, name = %target.name, rg = %target.resource_group, "updating resource");

        let poller = self
            .arm
            .begin(Method::PATCH, &target.segments(&self.subscription_id), &self.api_version, Some(&body))
            .await
            .with_context(|| format!("failed to begin updating {noun}"))?;
        poller
            .poll_until_done()
            .await
            .with_context(|| format!("failed to update {noun}"))?;

        Ok(target.created("updated"))
    }

    pub async fn get(&self, target: &ResourceTarget) -> Result<Value> {
        self.arm
            .get(&target.segments(&self.subscription_id), &self.api_version)
            .await
            .with_context(|| format!("failed to get {}", target.kind.noun()))
    }

    pub async fn delete(&self, target: &ResourceTarget) -> Result<String> {
        let noun = target.kind.noun();

        tracing::info!(kind = noun, name = %target.name, rg = %target.resource_group, "deleting resource");

        let poller = self
            .arm
            .begin(Method::DELETE, &target.segments(&self.subscription_id), &self.api_version, None)
            .await
            .with_context(|| format!("failed to begin deleting {noun}"))?;
        poller
            .poll_until_done()
            .await
            .with_context(|| format!("failed to delete {noun}"))?;

        Ok(format!(
            "{} '{}' deleted successfully from resource group '{}'",
            target.kind.label(),
            target.name,
            target.resource_group
        ))
    }

    /// Enable or disable an isolation domain.
    pub async fn set_administrative_state(
        &self,
        target: &ResourceTarget,
        state: EnableDisableState,
    ) -> Result<String> {
        let noun = target.kind.noun();
        let (gerund, infinitive, past) = match state {
            EnableDisableState::Enable => ("enabling", "enable", "enabled"),
            EnableDisableState::Disable => ("disabling", "disable", "disabled"),
        };
        let body = serde_json::to_value(UpdateAdministrativeState { state })?;

        let mut segments = target.segments(&self.subscription_id);
        segments.push("updateAdministrativeState");

        tracing::info!(kind = noun, name = %target.name, action = infinitive, "updating administrative state");

        let poller = self
            .arm
            .begin(Method::POST, &segments, &self.api_version, Some(&body))
            .await
            .with_context(|| format!("failed to begin {gerund} {noun}"))?;
        poller
            .poll_until_done()
            .await
            .with_context(|| format!("failed to {infinitive} {noun}"))?;

        Ok(target.created(past))
    }

    pub async fn commit_configuration(&self, resource_group: &str, fabric: &str) -> Result<String> {
        let target = ResourceTarget::new(ResourceKind::NetworkFabric, resource_group, fabric);
        let mut segments = target.segments(&self.subscription_id);
        segments.push("commitConfiguration");

        tracing::info!(fabric, rg = resource_group, "committing fabric configuration");

        let poller = self
            .arm
            .begin(Method::POST, &segments, &self.api_version, None)
            .await
            .context("failed to begin commit configuration on network fabric")?;
        poller
            .poll_until_done()
            .await
            .context("failed to commit configuration on network fabric")?;

        Ok(format!("Network Fabric '{fabric}' configuration has been committed."))
    }

    /// Reboot a device unless it is a virtual lab device.
    pub async fn reboot_device(
        &self,
        resource_group: &str,
        device_name: &str,
        reboot_type: &str,
    ) -> Result<String> {
        let device = self.device(resource_group, device_name).await?;
        if device
            .properties
            .serial_number
            .as_deref()
            .is_some_and(|serial| serial.contains(VLAB_SERIAL_MARKER))
        {
            tracing::info!(device = device_name, "skipping reboot of virtual lab device");
            return Ok(format!("Skipping reboot for vlab device '{device_name}'."));
        }

        let target = ResourceTarget::new(ResourceKind::NetworkDevice, resource_group, device_name);
        let mut segments = target.segments(&self.subscription_id);
        segments.push("reboot");
        let body = json!({ "rebootType": reboot_type });

        tracing::info!(device = device_name, reboot_type, "rebooting network device");

        let poller = self
            .arm
            .begin(Method::POST, &segments, &self.api_version, Some(&body))
            .await
            .context("failed to begin reboot on network device")?;
        poller
            .poll_until_done()
            .await
            .context("failed to reboot network device")?;

        Ok(format!("Network Device '{device_name}' rebooted successfully."))
    }

    pub async fn list_fabrics(&self, resource_group: &str) -> Result<Vec<NetworkFabric>> {
        let segments = [
            "subscriptions",
            self.subscription_id.as_str(),
            "resourceGroups",
            resource_group,
            "providers",
            PROVIDER,
            ResourceKind::NetworkFabric.collection(),
        ];
        self.arm
            .list_as(&segments, &self.api_version)
            .await
            .context("failed to list network fabrics")
    }

    pub async fn rack(&self, resource_group: &str, name: &str) -> Result<NetworkRack> {
        let target = ResourceTarget::new(ResourceKind::NetworkRack, resource_group, name);
        self.arm
            .get_as(&target.segments(&self.subscription_id), &self.api_version)
            .await
            .with_context(|| format!("failed to get network rack {name}"))
    }

    pub async fn device(&self, resource_group: &str, name: &str) -> Result<NetworkDevice> {
        let target = ResourceTarget::new(ResourceKind::NetworkDevice, resource_group, name);
        self.arm
            .get_as(&target.segments(&self.subscription_id), &self.api_version)
            .await
            .with_context(|| format!("failed to get network device {name}"))
    }
}
