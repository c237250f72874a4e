use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BridgeError;

/// Hue API error code for an unknown or unauthorized credential.
const UNAUTHORIZED_USER: i64 = 1;

/// Per-request timeout so a stalled bridge bounds every dispatch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A partial light state.
///
/// The bridge accepts partial updates, so every field is optional and `None`
/// fields are omitted from the wire payload entirely. Brightness spans
/// 1..=254, hue spans the full `u16` color wheel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
}

impl LightState {
    /// Folds `update` into `self`: set fields overwrite, unset fields leave
    /// the existing value alone.
    pub fn merge(&mut self, update: &LightState) {
        if update.on.is_some() {
            self.on = update.on;
        }
        if update.bri.is_some() {
            self.bri = update.bri;
        }
        if update.hue.is_some() {
            self.hue = update.hue;
        }
    }
}

/// The networked lighting fixture seam.
///
/// `set_light_state` resolving to `Ok(false)` means the bridge processed the
/// request but rejected the change; callers treat that and transport errors as
/// non-fatal in steady state.
#[async_trait]
pub trait LightBridge: Send + Sync {
    async fn set_light_state(&self, light_id: u32, state: &LightState) -> Result<bool, BridgeError>;

    async fn get_light_by_name(&self, name: &str) -> Result<Option<u32>, BridgeError>;
}

/// REST client for a Hue bridge (v1 API).
pub struct HueBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HueBridge {
    /// Connects to the bridge and verifies the credential.
    ///
    /// The whitelist check is a config fetch: an unknown credential comes back
    /// as an error array rather than the bridge configuration. Both credential
    /// rejection and an unreachable bridge are fatal; the pipeline never starts
    /// without a confirmed connection.
    pub async fn connect(username: &str, address: &str) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = format!("http://{address}/api/{username}");

        let response: Value = client
            .get(format!("{base_url}/config"))
            .send()
            .await?
            .json()
            .await?;

        if let Some((code, description)) = api_error(&response) {
            return Err(if code == UNAUTHORIZED_USER {
                BridgeError::Unauthorized
            } else {
                BridgeError::Connection(description)
            });
        }

        let name = response
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let ip = response
            .get("ipaddress")
            .and_then(Value::as_str)
            .unwrap_or(address);
        info!("Connected to Hue bridge: {name} :: {ip}");

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl LightBridge for HueBridge {
    async fn set_light_state(&self, light_id: u32, state: &LightState) -> Result<bool, BridgeError> {
        let url = format!("{}/lights/{light_id}/state", self.base_url);
        let response: Value = self.client.put(&url).json(state).send().await?.json().await?;

        if let Some((_, description)) = api_error(&response) {
            debug!("light {light_id} state change rejected: {description}");
            return Ok(false);
        }
        Ok(true)
    }

    async fn get_light_by_name(&self, name: &str) -> Result<Option<u32>, BridgeError> {
        let url = format!("{}/lights", self.base_url);
        let response: Value = self.client.get(&url).send().await?.json().await?;

        if let Some((_, description)) = api_error(&response) {
            return Err(BridgeError::InvalidResponse(description));
        }
        let lights = response
            .as_object()
            .ok_or_else(|| BridgeError::InvalidResponse("lights listing is not an object".into()))?;

        for (id, light) in lights {
            if light.get("name").and_then(Value::as_str) == Some(name) {
                let id = id.parse().map_err(|_| {
                    BridgeError::InvalidResponse(format!("non-numeric light id {id}"))
                })?;
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}

/// The bridge reports failures as `[{"error": {"type": .., "description": ..}}]`.
fn api_error(response: &Value) -> Option<(i64, String)> {
    let error = response.as_array()?.iter().find_map(|entry| entry.get("error"))?;
    let code = error.get("type").and_then(Value::as_i64).unwrap_or(0);
    let description = error
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    Some((code, description))
}
