use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

use crate::arm::ArmClient;
use crate::config::Config;
use crate::credential::TokenProvider;
use crate::fabric::{FabricClient, ResourceKind};
use crate::lab;
use crate::models::EnableDisableState;
use crate::params::{
    CreateResourceGroupParams, CreateResourceParams, DeviceParams, FabricParams, LabStatusParams,
    NetworkParams, NetworkWriteParams, RebootDeviceParams, ResourceGroupParams, ResourceParams,
    TargetRequest, UpdateResourceParams, WriteRequest,
};
use crate::resources::ResourceGroupClient;

/// MCP server that exposes Azure Managed Network Fabric operations as tools.
#[derive(Clone)]
pub struct FabricMcpServer {
    config: Arc<Config>,
    arm: ArmClient,
    tool_router: ToolRouter<Self>,
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for FabricMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "fabric-mcp-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "This MCP server manages Azure Managed Network Fabric (Operator \
                 Nexus) resources: IP prefixes, IP communities, route policies, \
                 isolation domains and their networks, fabrics, devices and \
                 resource groups.  Every tool needs a subscriptionId; never \
                 invent resource names, ask the user instead.  Properties are \
                 JSON strings in the ARM camelCase shape.  Create, update, \
                 delete and action tools wait for the operation to finish."
                    .into(),
            ),
        }
    }
}

#[tool_router]
impl FabricMcpServer {
    // ------------------------------------------------------------------
    // IP prefixes
    // ------------------------------------------------------------------

    /// The properties are checked locally before anything is sent to ARM.
    #[tool(description = "Create a new IP prefix.  `properties` is a JSON string such as \
                          {\"ipPrefixRules\":[{\"action\":\"Permit\",\"sequenceNumber\":10,\
                          \"networkPrefix\":\"10.0.0.0/8\"}]}.")]
    async fn create_ipprefix(
        &self,
        Parameters(params): Parameters<CreateResourceParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::IpPrefix)).await
    }

    /// Read an IP prefix.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an IP prefix.")]
    async fn get_ipprefix(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::IpPrefix)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing IP prefix.")]
    async fn update_ipprefix(
        &self,
        Parameters(params): Parameters<UpdateResourceParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::IpPrefix)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an IP prefix.")]
    async fn delete_ipprefix(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::IpPrefix)).await
    }

    // ------------------------------------------------------------------
    // IP communities
    // ------------------------------------------------------------------

    /// The properties are checked locally before anything is sent to ARM.
    #[tool(description = "Create a new IP community.  `properties` is a JSON string such as \
                          {\"ipCommunityRules\":[{\"action\":\"Permit\",\"sequenceNumber\":10,\
                          \"communityMembers\":[\"1234:5678\"]}]}.")]
    async fn create_ipcommunity(
        &self,
        Parameters(params): Parameters<CreateResourceParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::IpCommunity)).await
    }

    /// Read an IP community.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an IP community.")]
    async fn get_ipcommunity(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::IpCommunity)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing IP community.")]
    async fn update_ipcommunity(
        &self,
        Parameters(params): Parameters<UpdateResourceParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::IpCommunity)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an IP community.")]
    async fn delete_ipcommunity(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::IpCommunity)).await
    }

    // ------------------------------------------------------------------
    // IP extended communities
    // ------------------------------------------------------------------

    /// The properties are checked locally before anything is sent to ARM.
    #[tool(description = "Create a new IP extended community.  `properties` is a JSON string \
                          such as {\"ipExtendedCommunityRules\":[{\"action\":\"Permit\",\
                          \"sequenceNumber\":10,\"routeTargets\":[\"1234:5678\"]}]}.")]
    async fn create_ipextcommunity(
        &self,
        Parameters(params): Parameters<CreateResourceParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::IpExtendedCommunity)).await
    }

    /// Read an IP extended community.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an IP extended community.")]
    async fn get_ipextcommunity(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::IpExtendedCommunity)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing IP extended community.")]
    async fn update_ipextcommunity(
        &self,
        Parameters(params): Parameters<UpdateResourceParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::IpExtendedCommunity)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an IP extended community.")]
    async fn delete_ipextcommunity(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::IpExtendedCommunity)).await
    }

    // ------------------------------------------------------------------
    // Route policies
    // ------------------------------------------------------------------

    /// Statements match on IP prefixes and communities created beforehand, so
    /// their ARM ids appear inside `statementCondition`.
    #[tool(description = "Create a new route policy.  `properties` is a JSON string with \
                          `statements`, each holding a sequenceNumber, a statementCondition \
                          (ipPrefixId, ipCommunityIds, ipExtendedCommunityIds) and an action \
                          (actionType Permit/Deny/Continue, optional actionProperties).")]
    async fn create_routepolicy(
        &self,
        Parameters(params): Parameters<CreateResourceParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::RoutePolicy)).await
    }

    /// Read a route policy.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get a route policy.")]
    async fn get_routepolicy(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::RoutePolicy)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing route policy.")]
    async fn update_routepolicy(
        &self,
        Parameters(params): Parameters<UpdateResourceParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::RoutePolicy)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete a route policy.")]
    async fn delete_routepolicy(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::RoutePolicy)).await
    }

    // ------------------------------------------------------------------
    // L2 isolation domains
    // ------------------------------------------------------------------

    /// The properties are checked locally before anything is sent to ARM.
    #[tool(description = "Create a new L2 isolation domain.  `properties` is a JSON string \
                          with networkFabricId, vlanId and optional mtu.")]
    async fn create_l2isolationdomain(
        &self,
        Parameters(params): Parameters<CreateResourceParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::L2IsolationDomain)).await
    }

    /// Read an L2 isolation domain.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an L2 isolation domain.")]
    async fn get_l2isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::L2IsolationDomain)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing L2 isolation domain.")]
    async fn update_l2isolationdomain(
        &self,
        Parameters(params): Parameters<UpdateResourceParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::L2IsolationDomain)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an L2 isolation domain.  Disable it first.")]
    async fn delete_l2isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::L2IsolationDomain)).await
    }

    #[tool(description = "Enable an L2 isolation domain.")]
    async fn enable_l2isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.set_state(params.validate(ResourceKind::L2IsolationDomain), EnableDisableState::Enable)
            .await
    }

    #[tool(description = "Disable an L2 isolation domain.")]
    async fn disable_l2isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.set_state(params.validate(ResourceKind::L2IsolationDomain), EnableDisableState::Disable)
            .await
    }

    // ------------------------------------------------------------------
    // L3 isolation domains
    // ------------------------------------------------------------------

    /// The properties are checked locally before anything is sent to ARM.
    #[tool(description = "Create a new L3 isolation domain.  `properties` is a JSON string \
                          with networkFabricId and optional redistributeConnectedSubnets, \
                          redistributeStaticRoutes, aggregateRouteConfiguration and \
                          connectedSubnetRoutePolicy.")]
    async fn create_l3isolationdomain(
        &self,
        Parameters(params): Parameters<CreateResourceParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::L3IsolationDomain)).await
    }

    /// Read an L3 isolation domain.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an L3 isolation domain.")]
    async fn get_l3isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::L3IsolationDomain)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing L3 isolation domain.")]
    async fn update_l3isolationdomain(
        &self,
        Parameters(params): Parameters<UpdateResourceParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::L3IsolationDomain)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an L3 isolation domain.  Disable it and delete its networks first.")]
    async fn delete_l3isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::L3IsolationDomain)).await
    }

    /// Commit the fabric configuration afterwards for the change to reach the devices.
    #[tool(description = "Enable an L3 isolation domain.")]
    async fn enable_l3isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.set_state(params.validate(ResourceKind::L3IsolationDomain), EnableDisableState::Enable)
            .await
    }

    #[tool(description = "Disable an L3 isolation domain.")]
    async fn disable_l3isolationdomain(
        &self,
        Parameters(params): Parameters<ResourceParams>,
    ) -> Result<String, String> {
        self.set_state(params.validate(ResourceKind::L3IsolationDomain), EnableDisableState::Disable)
            .await
    }

    // ------------------------------------------------------------------
    // Internal networks
    // ------------------------------------------------------------------

    /// Networks carry no location of their own; they inherit the isolation domain's.
    #[tool(description = "Create a new internal network inside an L3 isolation domain.  \
                          `properties` is a JSON string with vlanId and optional mtu, \
                          connectedIPv4Subnets, staticRouteConfiguration, bgpConfiguration, \
                          importRoutePolicy and exportRoutePolicy.")]
    async fn create_internalnetwork(
        &self,
        Parameters(params): Parameters<NetworkWriteParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::InternalNetwork)).await
    }

    /// Read a internal network.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an internal network.")]
    async fn get_internalnetwork(
        &self,
        Parameters(params): Parameters<NetworkParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::InternalNetwork)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing internal network.")]
    async fn update_internalnetwork(
        &self,
        Parameters(params): Parameters<NetworkWriteParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::InternalNetwork)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an internal network.")]
    async fn delete_internalnetwork(
        &self,
        Parameters(params): Parameters<NetworkParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::InternalNetwork)).await
    }

    // ------------------------------------------------------------------
    // External networks
    // ------------------------------------------------------------------

    /// Networks carry no location of their own; they inherit the isolation domain's.
    #[tool(description = "Create a new external network inside an L3 isolation domain.  \
                          `properties` is a JSON string with peeringOption (OptionA or \
                          OptionB) and the matching optionAProperties or optionBProperties.")]
    async fn create_externalnetwork(
        &self,
        Parameters(params): Parameters<NetworkWriteParams>,
    ) -> Result<String, String> {
        self.create(params.validate(ResourceKind::ExternalNetwork)).await
    }

    /// Read a external network.
    ///
    /// Returns the ARM resource as a JSON object.
    #[tool(description = "Get an external network.")]
    async fn get_externalnetwork(
        &self,
        Parameters(params): Parameters<NetworkParams>,
    ) -> Result<String, String> {
        self.get(params.validate(ResourceKind::ExternalNetwork)).await
    }

    /// PATCH with the given properties; fields not mentioned keep their value.
    #[tool(description = "Update the properties of an existing external network.")]
    async fn update_externalnetwork(
        &self,
        Parameters(params): Parameters<NetworkWriteParams>,
    ) -> Result<String, String> {
        self.update(params.validate(ResourceKind::ExternalNetwork)).await
    }

    /// Waits for ARM to finish the delete before confirming.
    #[tool(description = "Delete an external network.")]
    async fn delete_externalnetwork(
        &self,
        Parameters(params): Parameters<NetworkParams>,
    ) -> Result<String, String> {
        self.delete(params.validate(ResourceKind::ExternalNetwork)).await
    }

    // ------------------------------------------------------------------
    // Fabrics and devices
    // ------------------------------------------------------------------

    /// Returns the fabric resource, including its rack ids, as JSON.
    #[tool(description = "Gets the configuration of the network fabric.")]
    async fn get_networkfabric(
        &self,
        Parameters(params): Parameters<FabricParams>,
    ) -> Result<String, String> {
        self.get(params.validate()).await
    }

    /// Pushes pending isolation domain and network changes to the devices.
    #[tool(description = "Commits the configuration of the network fabric.  Run this after \
                          enabling or changing isolation domains and networks.")]
    async fn commit_networkfabric(
        &self,
        Parameters(params): Parameters<FabricParams>,
    ) -> Result<String, String> {
        let request = params.validate().map_err(render)?;
        let target = &request.target;
        self.fabric(&request.subscription_id)
            .commit_configuration(&target.resource_group, &target.name)
            .await
            .map_err(render)
    }

    /// Returns the device resource as JSON, including its serial number.
    #[tool(description = "Gets the details of a network device.")]
    async fn get_networkdevice(
        &self,
        Parameters(params): Parameters<DeviceParams>,
    ) -> Result<String, String> {
        self.get(params.validate()).await
    }

    /// Looks the device up first so that virtual lab devices can be skipped.
    #[tool(description = "Reboots a network device.  Virtual lab devices are skipped.  \
                          rebootType defaults to GracefulRebootWithoutZTP.")]
    async fn reboot_networkdevice(
        &self,
        Parameters(params): Parameters<RebootDeviceParams>,
    ) -> Result<String, String> {
        let (request, reboot_type) = params.validate().map_err(render)?;
        let target = &request.target;
        self.fabric(&request.subscription_id)
            .reboot_device(&target.resource_group, &target.name, reboot_type.as_str())
            .await
            .map_err(render)
    }

    // ------------------------------------------------------------------
    // Resource groups
    // ------------------------------------------------------------------

    /// Resource group creation completes in the initial response.
    #[tool(description = "Create a new resource group.")]
    async fn create_resourcegroup(
        &self,
        Parameters(params): Parameters<CreateResourceGroupParams>,
    ) -> Result<String, String> {
        let (subscription_id, name, location) = params.validate().map_err(render)?;
        self.groups(&subscription_id)
            .create(&name, &location)
            .await
            .map_err(render)
    }

    /// Returns the resource group as a JSON object.
    #[tool(description = "Get a resource group.")]
    async fn get_resourcegroup(
        &self,
        Parameters(params): Parameters<ResourceGroupParams>,
    ) -> Result<String, String> {
        let (subscription_id, name) = params.validate().map_err(render)?;
        self.groups(&subscription_id)
            .get(&name)
            .await
            .map_err(render)
            .map(|v| v.to_string())
    }

    #[tool(description = "Delete a resource group and everything in it.")]
    async fn delete_resourcegroup(
        &self,
        Parameters(params): Parameters<ResourceGroupParams>,
    ) -> Result<String, String> {
        let (subscription_id, name) = params.validate().map_err(render)?;
        self.groups(&subscription_id)
            .delete(&name)
            .await
            .map_err(render)
    }

    /// Follows `nextLink` until every page has been read.
    #[tool(description = "List all resources in a resource group.  Returns a JSON array.")]
    async fn list_resources_in_rg(
        &self,
        Parameters(params): Parameters<ResourceGroupParams>,
    ) -> Result<String, String> {
        let (subscription_id, name) = params.validate().map_err(render)?;
        self.groups(&subscription_id)
            .list_resources(&name)
            .await
            .map_err(render)
            .map(|v| v.to_string())
    }

    // ------------------------------------------------------------------
    // Lab
    // ------------------------------------------------------------------

    /// Builds a markdown health report covering every fabric in the resource
    /// group and the devices on its provisioned racks.
    #[tool(description = "Gets the status of the lab, including network fabrics and devices.")]
    async fn get_lab_status(
        &self,
        Parameters(params): Parameters<LabStatusParams>,
    ) -> Result<String, String> {
        let (subscription_id, resource_group) = params.validate().map_err(render)?;
        lab::collect(&self.fabric(&subscription_id), &resource_group)
            .await
            .map_err(render)
            .map(|status| status.render())
    }
}

impl FabricMcpServer {
    /// Create a new server instance.  All tools share one ARM client.
    pub fn new(config: Config, credential: Arc<dyn TokenProvider>) -> anyhow::Result<Self> {
        let arm = ArmClient::new(&config.arm, credential)?;
        Ok(Self {
            config: Arc::new(config),
            arm,
            tool_router: Self::tool_router(),
        })
    }

    fn fabric(&self, subscription_id: &str) -> FabricClient {
        FabricClient::new(
            self.arm.clone(),
            subscription_id,
            &self.config.arm.fabric_api_version,
        )
    }

    fn groups(&self, subscription_id: &str) -> ResourceGroupClient {
        ResourceGroupClient::new(
            self.arm.clone(),
            subscription_id,
            &self.config.arm.resources_api_version,
        )
    }

    async fn create(&self, request: anyhow::Result<WriteRequest>) -> Result<String, String> {
        let request = request.map_err(render)?;
        self.fabric(&request.subscription_id)
            .create(&request.target, request.location.as_deref(), request.properties)
            .await
            .map_err(render)
    }

    async fn update(&self, request: anyhow::Result<WriteRequest>) -> Result<String, String> {
        let request = request.map_err(render)?;
        self.fabric(&request.subscription_id)
            .update(&request.target, request.properties)
            .await
            .map_err(render)
    }

    async fn get(&self, request: anyhow::Result<TargetRequest>) -> Result<String, String> {
        let request = request.map_err(render)?;
        self.fabric(&request.subscription_id)
            .get(&request.target)
            .await
            .map_err(render)
            .map(|v| v.to_string())
    }

    async fn delete(&self, request: anyhow::Result<TargetRequest>) -> Result<String, String> {
        let request = request.map_err(render)?;
        self.fabric(&request.subscription_id)
            .delete(&request.target)
            .await
            .map_err(render)
    }

    async fn set_state(
        &self,
        request: anyhow::Result<TargetRequest>,
        state: EnableDisableState,
    ) -> Result<String, String> {
        let request = request.map_err(render)?;
        self.fabric(&request.subscription_id)
            .set_administrative_state(&request.target, state)
            .await
            .map_err(render)
    }
}

/// Flatten an error chain into the message returned to the agent.
fn render(e: anyhow::Error) -> String {
    let message = format!("{e:#}");
    tracing::warn!(error = %message, "tool call failed");
    message
}
