use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::{json, Value};

use crate::arm::ArmClient;

/// Resource group operations (`Microsoft.Resources`).
pub struct ResourceGroupClient {
    arm: ArmClient,
    subscription_id: String,
    api_version: String,
}

impl ResourceGroupClient {
    pub fn new(arm: ArmClient, subscription_id: &str, api_version: &str) -> Self {
        Self {
            arm,
            subscription_id: subscription_id.to_string(),
            api_version: api_version.to_string(),
        }
    }

    fn group<'a>(&'a self, name: &'a str) -> [&'a str; 4] {
        ["subscriptions", self.subscription_id.as_str(), "resourcegroups", name]
    }

    /// Resource group creation completes synchronously.
    pub async fn create(&self, name: &str, location: &str) -> Result<String> {
        tracing::info!(name, location, "creating resource group");
        self.arm
            .put(&self.group(name), &self.api_version, &json!({ "location": location }))
            .await
            .context("failed to create resource group")?;
        Ok(format!(
            "Resource Group '{name}' created successfully in location '{location}'"
        ))
    }

    pub async fn get(&self, name: &str) -> Result<Value> {
        self.arm
            .get(&self.group(name), &self.api_version)
            .await
            .context("failed to get resource group")
    }

    pub async fn delete(&self, name: &str) -> Result<String> {
        tracing::info!(name, "deleting resource group");
        let poller = self
            .arm
            .begin(Method::DELETE, &self.group(name), &self.api_version, None)
            .await
            .context("failed to begin deleting resource group")?;
        poller
            .poll_until_done()
            .await
            .context("failed to delete resource group")?;
        Ok(format!("Resource Group '{name}' deleted successfully"))
    }

    /// Every resource in the group, across all pages.
    pub async fn list_resources(&self, name: &str) -> Result<Value> {
        let segments = [
            "subscriptions",
            self.subscription_id.as_str(),
            "resourceGroups",
            name,
            "resources",
        ];
        let resources = self
            .arm
            .list(&segments, &self.api_version)
            .await
            .context("failed to list resources in resource group")?;
        Ok(Value::Array(resources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::tests::test_client;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ResourceGroupClient {
        ResourceGroupClient::new(test_client(server), "sub", "2021-04-01")
    }

    #[tokio::test]
    async fn create_puts_location() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub/resourcegroups/lab-rg"))
            .and(query_param("api-version", "2021-04-01"))
            .and(body_json(json!({"location": "westus3"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "lab-rg"})))
            .expect(1)
            .mount(&server)
            .await;

        let message = client(&server).create("lab-rg", "westus3").await.unwrap();
        assert_eq!(
            message,
            "Resource Group 'lab-rg' created successfully in location 'westus3'"
        );
    }

    #[tokio::test]
    async fn delete_waits_for_location() {
        let server = MockServer::start().await;
        let location = format!("{}/operationresults/rg1", server.uri());
        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub/resourcegroups/lab-rg"))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operationresults/rg1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let message = client(&server).delete("lab-rg").await.unwrap();
        assert_eq!(message, "Resource Group 'lab-rg' deleted successfully");
    }

    #[tokio::test]
    async fn get_failure_names_the_operation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceGroupNotFound", "message": "Resource group 'x' could not be found."}
            })))
            .mount(&server)
            .await;

        let err = client(&server).get("x").await.unwrap_err();
        let rendered = format!("{err:#}");
        assert!(rendered.starts_with("failed to get resource group: "), "{rendered}");
        assert!(rendered.contains("ResourceGroupNotFound"), "{rendered}");
    }

    #[tokio::test]
    async fn list_resources_returns_json_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub/resourceGroups/lab-rg/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "nf1", "type": "Microsoft.ManagedNetworkFabric/networkFabrics"}]
            })))
            .mount(&server)
            .await;

        let value = client(&server).list_resources("lab-rg").await.unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["name"], "nf1");
    }
}
