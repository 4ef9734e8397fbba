//! Azure Resource Manager HTTP client.
//!
//! Thin layer over `reqwest` that adds bearer authentication, ARM error
//! decoding, `nextLink` paging and a [`Poller`] for long-running operations.

use futures::{Stream, TryStreamExt};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ArmConfig;
use crate::credential::TokenProvider;
use crate::error::{ArmError, ArmResult, ErrorDetail};

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Shared ARM client.  Cheap to clone; clones share the connection pool and
/// the credential.
#[derive(Clone)]
pub struct ArmClient {
    http: Client,
    endpoint: Url,
    scope: String,
    credential: Arc<dyn TokenProvider>,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(config: &ArmConfig, credential: Arc<dyn TokenProvider>) -> ArmResult<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            scope: config.scope(),
            credential,
            poll_interval: config.poll_interval,
        })
    }

    /// Resolve `segments` under the endpoint.  Each segment is percent-encoded
    /// on its own, so resource names can never introduce extra path levels.
    pub fn url(&self, segments: &[&str], api_version: &str) -> ArmResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ArmError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> ArmResult<Response> {
        let token = self
            .credential
            .token(&self.scope)
            .await
            .map_err(|e| ArmError::Credential(format!("{e:#}")))?;

        debug!(%method, %url, "ARM request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ArmError::from_response(status.as_u16(), &body);
        debug!(status = ?err.status(), "ARM request failed");
        Err(err)
    }

    pub async fn get(&self, segments: &[&str], api_version: &str) -> ArmResult<Value> {
        let url = self.url(segments, api_version)?;
        self.get_url(url).await
    }

    pub async fn get_as<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        api_version: &str,
    ) -> ArmResult<T> {
        Ok(serde_json::from_value(self.get(segments, api_version).await?)?)
    }

    /// GET an absolute URL (`nextLink`, poll URLs).
    pub async fn get_url(&self, url: Url) -> ArmResult<Value> {
        let response = self.send(Method::GET, url, None).await?;
        Ok(read_json(response).await?.unwrap_or(Value::Null))
    }

    /// Synchronous PUT, for APIs that complete in the initial response.
    pub async fn put(&self, segments: &[&str], api_version: &str, body: &Value) -> ArmResult<Value> {
        let url = self.url(segments, api_version)?;
        let response = self.send(Method::PUT, url, Some(body)).await?;
        Ok(read_json(response).await?.unwrap_or(Value::Null))
    }

    /// Send the initial request of a long-running operation.  The returned
    /// [`Poller`] must be driven with [`Poller::poll_until_done`].
    pub async fn begin(
        &self,
        method: Method,
        segments: &[&str],
        api_version: &str,
        body: Option<&Value>,
    ) -> ArmResult<Poller> {
        let url = self.url(segments, api_version)?;
        let response = self.send(method.clone(), url.clone(), body).await?;
        let poller = Poller::from_initial(self.clone(), method, url, response).await?;
        debug!(done = poller.is_done(), "initial response received");
        Ok(poller)
    }

    /// Collect every item of a list operation, following `nextLink`.
    pub async fn list(&self, segments: &[&str], api_version: &str) -> ArmResult<Vec<Value>> {
        let first = self.url(segments, api_version)?;
        self.pages(first).try_concat().await
    }

    pub async fn list_as<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        api_version: &str,
    ) -> ArmResult<Vec<T>> {
        self.list(segments, api_version)
            .await?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ArmError::from))
            .collect()
    }

    fn pages(&self, first: Url) -> impl Stream<Item = ArmResult<Vec<Value>>> + '_ {
        futures::stream::try_unfold(Some(first), move |next| self.next_page(next))
    }

    async fn next_page(&self, next: Option<Url>) -> ArmResult<Option<(Vec<Value>, Option<Url>)>> {
        let Some(url) = next else {
            return Ok(None);
        };
        let page: Page = serde_json::from_value(self.get_url(url).await?)?;
        let next = match page.next_link.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() => Some(Url::parse(link)?),
            _ => None,
        };
        debug!(items = page.value.len(), more = next.is_some(), "ARM list page");
        Ok(Some((page.value, next)))
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

/// Status document served at an `Azure-AsyncOperation` URL.
#[derive(Debug, Default, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: ErrorDetail,
}

enum PollState {
    Done(Option<Value>),
    AsyncOperation { operation: Url, location: Option<Url> },
    Location(Url),
    ProvisioningState,
}

/// Tracks one long-running operation until it reaches a terminal state.
pub struct Poller {
    client: ArmClient,
    method: Method,
    resource_url: Url,
    state: PollState,
    delay: Option<Duration>,
}

impl Poller {
    async fn from_initial(
        client: ArmClient,
        method: Method,
        resource_url: Url,
        response: Response,
    ) -> ArmResult<Self> {
        let status = response.status();
        let operation = header_url(response.headers(), AZURE_ASYNC_OPERATION)?;
        let location = header_url(response.headers(), header::LOCATION.as_str())?;
        let delay = retry_after(response.headers());
        let body = read_json(response).await?;

        let state = if let Some(operation) = operation {
            PollState::AsyncOperation { operation, location }
        } else if let Some(location) =
            location.filter(|_| status == StatusCode::CREATED || status == StatusCode::ACCEPTED)
        {
            PollState::Location(location)
        } else if is_put_or_patch(&method)
            && body
                .as_ref()
                .and_then(provisioning_state)
                .is_some_and(|state| !is_terminal(state))
        {
            PollState::ProvisioningState
        } else {
            PollState::Done(body)
        };

        debug!(%method, url = %resource_url, %status, "long-running operation started");

        Ok(Self {
            client,
            method,
            resource_url,
            state,
            delay,
        })
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, PollState::Done(_))
    }

    /// Poll until the operation succeeds or fails.  Returns the final resource
    /// for PUT/PATCH, the result document (if any) for POST, and `None` for
    /// DELETE.
    pub async fn poll_until_done(mut self) -> ArmResult<Option<Value>> {
        loop {
            if let PollState::Done(body) = &mut self.state {
                return Ok(body.take());
            }
            let wait = self.delay.take().unwrap_or(self.client.poll_interval);
            tokio::time::sleep(wait).await;
            self.state = self.poll().await?;
        }
    }

    async fn poll(&mut self) -> ArmResult<PollState> {
        let state = std::mem::replace(&mut self.state, PollState::Done(None));
        match state {
            PollState::Done(body) => Ok(PollState::Done(body)),
            PollState::AsyncOperation { operation, location } => {
                let response = self.client.send(Method::GET, operation.clone(), None).await?;
                self.delay = retry_after(response.headers());
                let doc: OperationStatus = match read_json(response).await? {
                    Some(value) => serde_json::from_value(value)?,
                    None => OperationStatus::default(),
                };
                debug!(status = %doc.status, "async operation status");

                match doc.status.to_ascii_lowercase().as_str() {
                    "" => Err(ArmError::OperationFailed {
                        message: format!("status document at {} has no status", operation.path()),
                        status: "Unknown".into(),
                        code: "InvalidStatusDocument".into(),
                    }),
                    "succeeded" => self.finish(location).await,
                    "failed" | "canceled" | "cancelled" => Err(ArmError::OperationFailed {
                        status: doc.status,
                        code: doc.error.code,
                        message: doc.error.message,
                    }),
                    _ => Ok(PollState::AsyncOperation { operation, location }),
                }
            }
            PollState::Location(location) => {
                let response = self.client.send(Method::GET, location.clone(), None).await?;
                self.delay = retry_after(response.headers());
                if response.status() == StatusCode::ACCEPTED {
                    debug!(url = %location, "operation still running");
                    return Ok(PollState::Location(location));
                }
                if is_put_or_patch(&self.method) {
                    let resource = self.client.get_url(self.resource_url.clone()).await?;
                    return Ok(PollState::Done(Some(resource)));
                }
                Ok(PollState::Done(read_json(response).await?))
            }
            PollState::ProvisioningState => {
                let resource = self.client.get_url(self.resource_url.clone()).await?;
                match provisioning_state(&resource).map(str::to_string) {
                    Some(state) if state.eq_ignore_ascii_case("succeeded") => {
                        Ok(PollState::Done(Some(resource)))
                    }
                    Some(state) if is_terminal(&state) => Err(ArmError::OperationFailed {
                        message: format!("provisioning state of {} is {state}", self.resource_url.path()),
                        status: state,
                        code: "ProvisioningFailed".into(),
                    }),
                    Some(_) => Ok(PollState::ProvisioningState),
                    // A resource without a provisioning state has nothing left to wait for.
                    None => Ok(PollState::Done(Some(resource))),
                }
            }
        }
    }

    async fn finish(&self, location: Option<Url>) -> ArmResult<PollState> {
        if is_put_or_patch(&self.method) {
            let resource = self.client.get_url(self.resource_url.clone()).await?;
            return Ok(PollState::Done(Some(resource)));
        }
        match location {
            Some(location) if self.method == Method::POST => {
                let response = self.client.send(Method::GET, location, None).await?;
                Ok(PollState::Done(read_json(response).await?))
            }
            _ => Ok(PollState::Done(None)),
        }
    }
}

fn is_put_or_patch(method: &Method) -> bool {
    *method == Method::PUT || *method == Method::PATCH
}

fn provisioning_state(resource: &Value) -> Option<&str> {
    resource.pointer("/properties/provisioningState")?.as_str()
}

fn is_terminal(state: &str) -> bool {
    ["succeeded", "failed", "canceled", "cancelled"]
        .iter()
        .any(|terminal| state.eq_ignore_ascii_case(terminal))
}

fn header_url(headers: &HeaderMap, name: &str) -> ArmResult<Option<Url>> {
    match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(raw) if !raw.trim().is_empty() => Ok(Some(Url::parse(raw.trim())?)),
        _ => Ok(None),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(header::RETRY_AFTER)?.to_str().ok()?;
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

async fn read_json(response: Response) -> ArmResult<Option<Value>> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::credential::StaticTokenProvider;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_client(server: &MockServer) -> ArmClient {
        client_polling_every(server, Duration::ZERO)
    }

    fn client_polling_every(server: &MockServer, poll_interval: Duration) -> ArmClient {
        let config = ArmConfig {
            endpoint: Url::parse(&server.uri()).unwrap(),
            poll_interval,
            ..ArmConfig::default()
        };
        ArmClient::new(&config, Arc::new(StaticTokenProvider("test-token".into()))).unwrap()
    }

    /// Fails instead of hanging when a poller never reaches a terminal state.
    async fn finish_within_seconds(poller: Poller) -> ArmResult<Option<Value>> {
        tokio::time::timeout(Duration::from_secs(5), poller.poll_until_done())
            .await
            .expect("poller did not finish")
    }

    const PREFIX_PATH: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ManagedNetworkFabric/ipPrefixes/p1";
    const PREFIX_SEGMENTS: &[&str] = &[
        "subscriptions",
        "sub",
        "resourceGroups",
        "rg",
        "providers",
        "Microsoft.ManagedNetworkFabric",
        "ipPrefixes",
        "p1",
    ];

    #[test]
    fn url_encodes_each_segment() {
        let client = ArmClient::new(
            &ArmConfig::default(),
            Arc::new(StaticTokenProvider(String::new())),
        )
        .unwrap();
        let url = client.url(&["subscriptions", "sub 1", "a/b"], "2023-06-15").unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub%201/a%2Fb?api-version=2023-06-15"
        );
    }

    #[tokio::test]
    async fn get_sends_bearer_token_and_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PREFIX_PATH))
            .and(query_param("api-version", "2023-06-15"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "p1"})))
            .mount(&server)
            .await;

        let value = test_client(&server).get(PREFIX_SEGMENTS, "2023-06-15").await.unwrap();
        assert_eq!(value["name"], "p1");
    }

    #[tokio::test]
    async fn error_responses_carry_arm_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceNotFound", "message": "not here"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).get(PREFIX_SEGMENTS, "2023-06-15").await.unwrap_err();
        match err {
            ArmError::Api { status, code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code, "ResourceNotFound");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn put_follows_async_operation_then_reads_resource() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op1", server.uri());

        Mock::given(method("PUT"))
            .and(path(PREFIX_PATH))
            .and(body_json(json!({"location": "eastus"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Azure-AsyncOperation", operation.as_str())
                    .insert_header("Retry-After", "0")
                    .set_body_json(json!({"properties": {"provisioningState": "Accepted"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
            .with_priority(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "p1",
                "properties": {"provisioningState": "Succeeded"}
            })))
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(
                Method::PUT,
                PREFIX_SEGMENTS,
                "2023-06-15",
                Some(&json!({"location": "eastus"})),
            )
            .await
            .unwrap();
        assert!(!poller.is_done());

        let resource = poller.poll_until_done().await.unwrap().unwrap();
        assert_eq!(resource["properties"]["provisioningState"], "Succeeded");
    }

    #[tokio::test]
    async fn failed_async_operation_is_an_error() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op2", server.uri());

        Mock::given(method("DELETE"))
            .respond_with(
                ResponseTemplate::new(202).insert_header("Azure-AsyncOperation", operation.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Failed",
                "error": {"code": "InUse", "message": "prefix is referenced by a route policy"}
            })))
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::DELETE, PREFIX_SEGMENTS, "2023-06-15", None)
            .await
            .unwrap();
        let err = poller.poll_until_done().await.unwrap_err();
        match err {
            ArmError::OperationFailed { status, code, message } => {
                assert_eq!(status, "Failed");
                assert_eq!(code, "InUse");
                assert!(message.contains("route policy"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_follows_location_until_no_content() {
        let server = MockServer::start().await;
        let location = format!("{}/locations/op3", server.uri());

        Mock::given(method("DELETE"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/op3"))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/op3"))
            .respond_with(ResponseTemplate::new(204))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::DELETE, PREFIX_SEGMENTS, "2023-06-15", None)
            .await
            .unwrap();
        assert!(poller.poll_until_done().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_without_headers_polls_provisioning_state() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "properties": {"provisioningState": "Creating"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"provisioningState": "Creating"}
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"provisioningState": "Failed"}
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::PUT, PREFIX_SEGMENTS, "2023-06-15", Some(&json!({})))
            .await
            .unwrap();
        let err = poller.poll_until_done().await.unwrap_err();
        assert!(matches!(err, ArmError::OperationFailed { ref status, .. } if status == "Failed"));
    }

    #[tokio::test]
    async fn synchronous_completion_needs_no_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"configurationState": "Succeeded"})))
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::POST, PREFIX_SEGMENTS, "2023-06-15", None)
            .await
            .unwrap();
        assert!(poller.is_done());
        let body = poller.poll_until_done().await.unwrap().unwrap();
        assert_eq!(body["configurationState"], "Succeeded");
    }

    #[tokio::test]
    async fn status_document_without_status_is_an_error() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/empty", server.uri());

        Mock::given(method("DELETE"))
            .respond_with(
                ResponseTemplate::new(202).insert_header("Azure-AsyncOperation", operation.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::DELETE, PREFIX_SEGMENTS, "2023-06-15", None)
            .await
            .unwrap();
        let err = finish_within_seconds(poller).await.unwrap_err();
        assert!(
            matches!(err, ArmError::OperationFailed { ref code, .. } if code == "InvalidStatusDocument"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn resource_without_provisioning_state_is_done() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "properties": {"provisioningState": "Creating"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "p1",
                "properties": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::PUT, PREFIX_SEGMENTS, "2023-06-15", Some(&json!({})))
            .await
            .unwrap();
        let resource = finish_within_seconds(poller).await.unwrap().unwrap();
        assert_eq!(resource["name"], "p1");
    }

    #[tokio::test]
    async fn put_follows_location_then_reads_resource() {
        let server = MockServer::start().await;
        let location = format!("{}/locations/put1", server.uri());

        Mock::given(method("PUT"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(201).insert_header("Location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/put1"))
            .respond_with(ResponseTemplate::new(202))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/put1"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PREFIX_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "p1",
                "properties": {"provisioningState": "Succeeded"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::PUT, PREFIX_SEGMENTS, "2023-06-15", Some(&json!({})))
            .await
            .unwrap();
        let resource = finish_within_seconds(poller).await.unwrap().unwrap();
        assert_eq!(resource["name"], "p1");
    }

    #[tokio::test]
    async fn post_reads_location_after_async_operation() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/post1", server.uri());
        let location = format!("{}/locations/post1", server.uri());

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Azure-AsyncOperation", operation.as_str())
                    .insert_header("Location", location.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/post1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/post1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "configurationState": "Succeeded"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let poller = test_client(&server)
            .begin(Method::POST, PREFIX_SEGMENTS, "2023-06-15", None)
            .await
            .unwrap();
        let body = finish_within_seconds(poller).await.unwrap().unwrap();
        assert_eq!(body["configurationState"], "Succeeded");
    }

    #[tokio::test]
    async fn retry_after_overrides_poll_interval() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/quick", server.uri());

        Mock::given(method("DELETE"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Azure-AsyncOperation", operation.as_str())
                    .insert_header("Retry-After", "0"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/quick"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Retry-After", "0")
                    .set_body_json(json!({"status": "InProgress"})),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/quick"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
            .with_priority(2)
            .mount(&server)
            .await;

        // Without Retry-After each wait would take an hour.
        let poller = client_polling_every(&server, Duration::from_secs(3600))
            .begin(Method::DELETE, PREFIX_SEGMENTS, "2023-06-15", None)
            .await
            .unwrap();
        assert!(finish_within_seconds(poller).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_follows_next_link() {
        let server = MockServer::start().await;
        let next = format!("{}/page2", server.uri());

        Mock::given(method("GET"))
            .and(path("/subscriptions/sub/resourceGroups/rg/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "a"}, {"name": "b"}],
                "nextLink": next
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "c"}]
            })))
            .mount(&server)
            .await;

        let items = test_client(&server)
            .list(&["subscriptions", "sub", "resourceGroups", "rg", "resources"], "2021-04-01")
            .await
            .unwrap();
        let names: Vec<&str> = items.iter().filter_map(|i| i["name"].as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
