use crate::domain::model::{
    AvailabilityRecord, DispatchOrder, EmergencyCall, Location, ServiceRequest, ServiceType,
};
use crate::domain::ports::{
    AvailabilitySource, ConfigProvider, DispatchGateway, IncidentSource, LocationDirectory,
    SimulationControl, SimulationSettings,
};
use crate::utils::error::{DispatchError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

/// 透過 HTTP 存取模擬世界，所有請求共用同一個 `Client`
#[derive(Debug, Clone)]
pub struct HttpWorld {
    client: Client,
    base_url: String,
}

impl HttpWorld {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.base_url()))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 發出請求並解析回應；空 body 回傳 `None`，非 JSON 內容包成字串
    async fn call_api(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        tracing::debug!("{} {}", method, path);
        let mut request = self.client.request(method, self.url(path)).query(query);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?.error_for_status()?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_str(&text).unwrap_or(Value::String(text)),
        ))
    }

    /// 失敗一律視為沒有資料
    async fn get_lenient(&self, path: &str, query: &[(&str, String)]) -> Option<Value> {
        match self.call_api(Method::GET, path, query, None).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("⚠️ Request to {} failed: {}", path, e);
                None
            }
        }
    }
}

fn first_present<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            // 只接受整數值，2.7 之類的數量視為缺值
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_location(item: &Value) -> Result<Location> {
    let id = first_present(item, &["city", "name"])
        .and_then(as_text)
        .ok_or_else(|| DispatchError::InvalidLocationRecord {
            message: format!("missing city name: {}", item),
        })?;
    let region = first_present(item, &["county"])
        .and_then(as_text)
        .unwrap_or_else(|| "unknown".to_string());
    let latitude = first_present(item, &["latitude", "lat"]).and_then(as_float);
    let longitude = first_present(item, &["longitude", "long"]).and_then(as_float);

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Location {
            id,
            region,
            latitude,
            longitude,
        }),
        _ => Err(DispatchError::InvalidLocationRecord {
            message: format!("missing coordinates for '{}': {}", id, item),
        }),
    }
}

pub(crate) fn parse_availability(item: &Value) -> AvailabilityRecord {
    let location_id = first_present(item, &["city", "name"])
        .and_then(as_text)
        .unwrap_or_else(|| "unknown".to_string());
    let available = first_present(item, &["available", "quantity"])
        .and_then(as_integer)
        .unwrap_or(0)
        .clamp(0, i64::from(u32::MAX)) as u32;
    AvailabilityRecord {
        location_id,
        available,
    }
}

/// 解析單通事件；缺少目標城市時回傳 `None`
pub(crate) fn parse_call(item: &Value) -> Option<EmergencyCall> {
    // 有些事件以 JSON 字串形式送來
    if let Value::String(raw) = item {
        let inner: Value = serde_json::from_str(raw).ok()?;
        return parse_call(&inner);
    }

    let Some(target) = first_present(item, &["city"]).and_then(as_text) else {
        tracing::warn!("Emergency call missing 'city' field: {}", item);
        return None;
    };
    let id = first_present(item, &["id", "callId"]).and_then(as_text);

    let requests = match item.get("requests").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .filter_map(|entry| {
                let service = first_present(entry, &["Type", "type"]).and_then(as_text)?;
                let quantity = first_present(entry, &["Quantity", "quantity"])
                    .and_then(as_integer)
                    .unwrap_or(0);
                Some(ServiceRequest::new(service, quantity))
            })
            .collect(),
        // 舊格式：只帶救護車數量
        None => first_present(item, &["needed", "required", "count"])
            .and_then(as_integer)
            .map(|quantity| vec![ServiceRequest::new(ServiceType::Medical.label(), quantity)])
            .unwrap_or_default(),
    };

    Some(EmergencyCall {
        id,
        target,
        requests,
    })
}

#[async_trait]
impl LocationDirectory for HttpWorld {
    async fn fetch_locations(&self) -> Result<Vec<Location>> {
        let body = self
            .call_api(Method::GET, "/locations", &[], None)
            .await
            .map_err(|e| DispatchError::LocationDirectoryError {
                message: e.to_string(),
            })?;

        match body {
            Some(Value::Array(items)) => items.iter().map(parse_location).collect(),
            _ => Err(DispatchError::LocationDirectoryError {
                message: "failed to retrieve locations".to_string(),
            }),
        }
    }
}

#[async_trait]
impl AvailabilitySource for HttpWorld {
    async fn fetch_availability(&self, service: ServiceType) -> Result<Vec<AvailabilityRecord>> {
        let path = format!("/{}/search", service.path_segment());
        let body = self.call_api(Method::GET, &path, &[], None).await?;

        // 空 body 代表零可用；其他非陣列內容視為來源故障
        match body {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.iter().map(parse_availability).collect()),
            Some(other) => Err(DispatchError::InvalidAvailabilityResponse {
                service: service.label().to_string(),
                message: format!("expected a JSON array, got: {}", other),
            }),
        }
    }
}

#[async_trait]
impl DispatchGateway for HttpWorld {
    async fn dispatch(&self, order: &DispatchOrder, source: &Location, target: &Location) -> Result<()> {
        let path = format!("/{}/dispatch", order.service.path_segment());
        let payload = serde_json::json!({
            "sourceCounty": source.region,
            "sourceCity": source.id,
            "targetCounty": target.region,
            "targetCity": target.id,
            "quantity": order.quantity,
        });

        self.call_api(Method::POST, &path, &[], Some(&payload))
            .await
            .map_err(|e| DispatchError::GatewayError {
                message: e.to_string(),
            })?;
        tracing::debug!(
            "Dispatched {} {} unit(s) from {} to {}",
            order.quantity,
            order.service,
            source.id,
            target.id
        );
        Ok(())
    }
}

#[async_trait]
impl IncidentSource for HttpWorld {
    async fn poll_calls(&self, limit: usize) -> Vec<EmergencyCall> {
        match self
            .get_lenient("/calls/queue", &[("limit", limit.to_string())])
            .await
        {
            Some(Value::Array(items)) => items.iter().filter_map(parse_call).collect(),
            Some(item @ Value::Object(_)) => parse_call(&item).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    async fn next_call(&self) -> Option<EmergencyCall> {
        match self.get_lenient("/calls/next", &[]).await? {
            Value::Array(items) => items.iter().find_map(parse_call),
            item => parse_call(&item),
        }
    }
}

#[async_trait]
impl SimulationControl for HttpWorld {
    async fn reset(&self, settings: &SimulationSettings) -> Result<()> {
        let query = [
            ("seed", settings.seed.clone()),
            ("targetDispatches", settings.target_dispatches.to_string()),
            ("maxActiveCalls", settings.max_active_calls.to_string()),
        ];
        self.call_api(Method::POST, "/control/reset", &query, None)
            .await
            .map_err(|e| DispatchError::SimulationControlError {
                message: format!("reset failed: {}", e),
            })?;
        Ok(())
    }

    async fn stop(&self) -> Option<Value> {
        match self.call_api(Method::POST, "/control/stop", &[], None).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("⚠️ Failed to stop simulation: {}", e);
                None
            }
        }
    }
}
