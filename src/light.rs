//! Lights known to the bridge.

use std::collections::HashMap;

use futures::future::join_all;
use log::{debug, warn};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::Error;
use crate::payload::StatePayload;
use crate::response::{Envelope, order_by_id};
use crate::status::LightState;
use crate::transport::Transport;
use crate::types::{
    Brightness, Color, ColorCommand, ColorTemperature, PowerMode, Saturation,
};

type Result<T> = std::result::Result<T, Error>;

const SERVICE: &str = "lights";

/// A light as described by the bridge.
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Light {
    /// Numeric id, taken from the key the bridge lists the light under.
    #[serde(skip)]
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub state: LightState,
    pub modelid: Option<String>,
    pub manufacturername: Option<String>,
    pub productname: Option<String>,
    pub uniqueid: Option<String>,
    pub swversion: Option<String>,
    pub swconfigid: Option<String>,
    pub productid: Option<String>,
    pub swupdate: Option<SoftwareUpdate>,
    pub capabilities: Option<Capabilities>,
    pub config: Option<LightConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SoftwareUpdate {
    pub state: String,
    pub lastinstall: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Capabilities {
    pub certified: bool,
    pub control: Control,
    pub streaming: Streaming,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Control {
    pub mindimlevel: u32,
    pub maxlumen: u32,
    pub colorgamuttype: Option<String>,
    pub colorgamut: Option<Vec<[f32; 2]>>,
    pub ct: Option<ColorTemperatureRange>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ColorTemperatureRange {
    pub min: u16,
    pub max: u16,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Streaming {
    pub renderer: bool,
    pub proxy: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    pub archetype: String,
    pub function: String,
    pub direction: String,
    pub startup: Option<Startup>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Startup {
    pub mode: String,
    pub configured: bool,
}

/// Lights found by the last search for new lights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLights {
    /// `active` while a search runs, `none` if no search was made, or a timestamp.
    pub last_scan: Option<String>,
    /// `(id, name)` of each light found, in ascending id order.
    pub lights: Vec<(u32, String)>,
}

/// Operations on `/lights`.
///
/// Obtained from [`crate::Bridge::lights`]; every call is independent and may
/// run concurrently with others.
#[derive(Debug, Clone, Copy)]
pub struct Lights<'a> {
    transport: &'a Transport,
}

impl<'a> Lights<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Lights { transport }
    }

    /// All lights known to the bridge, in ascending id order.
    pub async fn get_all(&self) -> Result<Vec<Light>> {
        let lights: HashMap<String, Light> = self
            .transport
            .send(Method::GET, SERVICE, None)
            .await?
            .into_body_or_default()?;

        Ok(order_by_id(lights)?
            .into_iter()
            .map(|(id, mut light)| {
                light.id = id;
                light
            })
            .collect())
    }

    pub async fn get(&self, id: u32) -> Result<Light> {
        let mut light: Light = self
            .transport
            .send(Method::GET, &format!("{SERVICE}/{id}"), None)
            .await?
            .into_body()?;
        light.id = id;
        Ok(light)
    }

    /// Lights discovered by the last [`search`](Self::search).
    pub async fn get_new(&self) -> Result<NewLights> {
        let found: HashMap<String, Value> = self
            .transport
            .send(Method::GET, &format!("{SERVICE}/new"), None)
            .await?
            .into_body_or_default()?;

        let mut new_lights = NewLights::default();
        let mut lights = Vec::new();
        for (key, entry) in found {
            if key == "lastscan" {
                new_lights.last_scan = entry.as_str().map(String::from);
                continue;
            }
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            lights.push((key, name));
        }
        new_lights.lights = order_by_id(lights)?;
        Ok(new_lights)
    }

    /// Start searching for new lights. The bridge keeps the network open for 40s.
    pub async fn search(&self) -> Result<()> {
        let envelope = self.envelope(Method::POST, SERVICE.to_string(), None).await?;
        debug!("light search started: {:?}", envelope.first_success()?);
        Ok(())
    }

    pub async fn rename(&self, id: u32, name: &str) -> Result<()> {
        let body = json!({ "name": name });
        let envelope = self
            .envelope(Method::PUT, format!("{SERVICE}/{id}"), Some(&body))
            .await?;
        envelope.first_success()?;
        Ok(())
    }

    /// Apply a state change and return the bridge's per-attribute results.
    ///
    /// Fails if the first element is an error; later elements are left for the
    /// caller to inspect.
    pub async fn set_state(&self, id: u32, payload: &StatePayload) -> Result<Envelope> {
        if !payload.is_valid() {
            return Err(Error::NoAttribute);
        }
        let body = serde_json::to_value(payload).map_err(Error::JsonDump)?;
        self.envelope(Method::PUT, format!("{SERVICE}/{id}/state"), Some(&body))
            .await
    }

    pub async fn delete(&self, id: u32) -> Result<()> {
        let envelope = self
            .envelope(Method::DELETE, format!("{SERVICE}/{id}"), None)
            .await?;
        if !envelope.is_empty() {
            envelope.check_all()?;
        }
        Ok(())
    }

    pub async fn set_power(&self, id: u32, power: &PowerMode) -> Result<Envelope> {
        self.set_state(id, &StatePayload::from(power)).await
    }

    pub async fn turn_on(&self, id: u32) -> Result<Envelope> {
        self.set_power(id, &PowerMode::On).await
    }

    pub async fn turn_off(&self, id: u32) -> Result<Envelope> {
        self.set_power(id, &PowerMode::Off).await
    }

    /// Turn on several lights concurrently; one result per id, in input order.
    pub async fn turn_on_all(&self, ids: &[u32]) -> Vec<Result<Envelope>> {
        self.set_power_all(ids, PowerMode::On).await
    }

    /// Turn off several lights concurrently; one result per id, in input order.
    pub async fn turn_off_all(&self, ids: &[u32]) -> Vec<Result<Envelope>> {
        self.set_power_all(ids, PowerMode::Off).await
    }

    pub async fn set_brightness(&self, id: u32, brightness: &Brightness) -> Result<Envelope> {
        self.set_state(id, &StatePayload::from(brightness)).await
    }

    pub async fn set_hue(&self, id: u32, hue: u16) -> Result<Envelope> {
        let mut payload = StatePayload::new();
        payload.hue(hue);
        self.set_state(id, &payload).await
    }

    pub async fn set_saturation(&self, id: u32, saturation: &Saturation) -> Result<Envelope> {
        self.set_state(id, &StatePayload::from(saturation)).await
    }

    pub async fn set_color_temperature(
        &self,
        id: u32,
        temperature: &ColorTemperature,
    ) -> Result<Envelope> {
        self.set_state(id, &StatePayload::from(temperature)).await
    }

    /// Turn the light on with the given RGB color.
    pub async fn set_color(&self, id: u32, color: &Color) -> Result<Envelope> {
        let command = ColorCommand::from(color);
        self.set_state(id, &StatePayload::from(&command)).await
    }

    /// Turn the light on with a hex color code such as `#FF8000`.
    pub async fn set_color_hex(&self, id: u32, hex: &str) -> Result<Envelope> {
        let color = Color::hex(hex)?;
        self.set_color(id, &color).await
    }

    async fn set_power_all(&self, ids: &[u32], power: PowerMode) -> Vec<Result<Envelope>> {
        let results = join_all(ids.iter().map(|id| self.set_power(*id, &power))).await;
        for (id, result) in ids.iter().zip(&results) {
            if let Err(e) = result {
                warn!("setting light {id} to {power:?} failed: {e}");
            }
        }
        results
    }

    async fn envelope(
        &self,
        method: Method,
        resource: String,
        body: Option<&Value>,
    ) -> Result<Envelope> {
        self.transport
            .send(method, &resource, body)
            .await?
            .into_body_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::extract::State;
    use axum::routing::{delete, get, post, put};
    use axum::{Json, Router};

    fn light_json(name: &str) -> Value {
        json!({
            "state": {"on": true, "bri": 200, "hue": 8000, "sat": 120, "ct": 366, "reachable": true},
            "type": "Extended color light",
            "name": name,
            "modelid": "LCT015",
            "manufacturername": "Signify Netherlands B.V.",
            "uniqueid": format!("00:17:88:01:00:00:00:{name}"),
            "swversion": "1.50.2_r30933",
            "capabilities": {"certified": true, "control": {"mindimlevel": 1000, "maxlumen": 806, "ct": {"min": 153, "max": 500}}}
        })
    }

    #[tokio::test]
    async fn test_get_all_orders_by_numeric_id() {
        let router = Router::new().route(
            "/api/username/lights",
            get(|| async {
                Json(json!({
                    "2": light_json("two"),
                    "1": light_json("one"),
                    "10": light_json("ten"),
                }))
            }),
        );
        let bridge = testing::bridge(testing::serve(router).await);

        let lights = bridge.lights().get_all().await.unwrap();
        let ids: Vec<u32> = lights.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 10]);
        assert_eq!(lights[2].name, "ten");
        assert_eq!(lights[0].state.bri, Some(200));
        assert_eq!(
            lights[0].capabilities.as_ref().unwrap().control.ct,
            Some(ColorTemperatureRange { min: 153, max: 500 })
        );
    }

    #[tokio::test]
    async fn test_get_sets_id() {
        let router = Router::new().route(
            "/api/username/lights/7",
            get(|| async { Json(light_json("porch")) }),
        );
        let bridge = testing::bridge(testing::serve(router).await);

        let light = bridge.lights().get(7).await.unwrap();
        assert_eq!(light.id, 7);
        assert_eq!(light.name, "porch");
        assert_eq!(light.kind.as_deref(), Some("Extended color light"));
    }

    #[tokio::test]
    async fn test_get_surfaces_bridge_error() {
        let router = Router::new().route(
            "/api/username/lights/9",
            get(|| async {
                Json(json!([{"error": {"type": 3, "address": "/lights/9", "description": "resource, /lights/9, not available"}}]))
            }),
        );
        let bridge = testing::bridge(testing::serve(router).await);

        let err = bridge.lights().get(9).await.unwrap_err();
        assert!(matches!(err, Error::BridgeRejected(_)));
        assert_eq!(
            err.bridge_error().unwrap().description,
            "resource, /lights/9, not available"
        );
    }

    #[tokio::test]
    async fn test_get_new() {
        let router = Router::new().route(
            "/api/username/lights/new",
            get(|| async {
                Json(json!({"7": {"name": "Hue Lamp 7"}, "lastscan": "2012-10-29T12:00:00", "3": {"name": "Hue Lamp 3"}}))
            }),
        );
        let bridge = testing::bridge(testing::serve(router).await);

        let found = bridge.lights().get_new().await.unwrap();
        assert_eq!(found.last_scan.as_deref(), Some("2012-10-29T12:00:00"));
        assert_eq!(
            found.lights,
            vec![(3, "Hue Lamp 3".to_string()), (7, "Hue Lamp 7".to_string())]
        );
    }

    #[tokio::test]
    async fn test_search_and_rename() {
        let router = Router::new()
            .route(
                "/api/username/lights",
                post(|| async { Json(json!([{"success": {"/lights": "Searching for new devices"}}])) }),
            )
            .route(
                "/api/username/lights/1",
                put(|Json(body): Json<Value>| async move {
                    Json(json!([{"success": {"/lights/1/name": body["name"]}}]))
                }),
            );
        let bridge = testing::bridge(testing::serve(router).await);

        bridge.lights().search().await.unwrap();
        bridge.lights().rename(1, "Bedroom").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_color_hex_sends_hsv() {
        let captured = testing::captured();
        let router = Router::new()
            .route(
                "/api/username/lights/1/state",
                put(|State(seen): State<testing::Captured>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(json!([
                        {"success": {"/lights/1/state/on": true}},
                        {"success": {"/lights/1/state/hue": 0}},
                        {"success": {"/lights/1/state/sat": 254}},
                        {"success": {"/lights/1/state/bri": 254}}
                    ]))
                }),
            )
            .with_state(captured.clone());
        let bridge = testing::bridge(testing::serve(router).await);

        let envelope = bridge.lights().set_color_hex(1, "#FF0000").await.unwrap();
        assert_eq!(envelope.len(), 4);
        assert_eq!(
            captured.lock().unwrap()[0],
            json!({"on": true, "hue": 0, "sat": 254, "bri": 254})
        );

        let err = bridge.lights().set_color_hex(1, "#nothex").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedColor(_)));
        assert_eq!(captured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_state_rejects_empty_payload() {
        let bridge = testing::bridge(testing::serve(Router::new()).await);
        let err = bridge.lights().set_state(1, &StatePayload::new()).await.unwrap_err();
        assert_eq!(err, Error::NoAttribute);
    }

    #[tokio::test]
    async fn test_set_state_first_error_fails() {
        let router = Router::new().route(
            "/api/username/lights/1/state",
            put(|| async {
                Json(json!([{"error": {"type": 201, "address": "/lights/1/state/bri", "description": "parameter, bri, is not modifiable. Device is set to off."}}]))
            }),
        );
        let bridge = testing::bridge(testing::serve(router).await);

        let err = bridge
            .lights()
            .set_brightness(1, &Brightness::create(100).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.bridge_error().unwrap().kind, 201);
    }

    #[tokio::test]
    async fn test_turn_on_all_reports_each_light() {
        let captured = testing::captured();
        let handler = |State(seen): State<testing::Captured>, Json(body): Json<Value>| async move {
            seen.lock().unwrap().push(body);
            Json(json!([{"success": {"/lights/x/state/on": true}}]))
        };
        let router = Router::new()
            .route("/api/username/lights/1/state", put(handler))
            .route("/api/username/lights/2/state", put(handler))
            .with_state(captured.clone());
        let bridge = testing::bridge(testing::serve(router).await);

        let results = bridge.lights().turn_on_all(&[1, 2, 3]).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        // light 3 has no route; the mock answers 404 with an empty body
        assert!(matches!(
            results[2],
            Err(Error::UnexpectedStatus { status, .. }) if status == reqwest::StatusCode::NOT_FOUND
        ));

        let seen = captured.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|body| *body == json!({"on": true})));
    }

    #[tokio::test]
    async fn test_delete() {
        let router = Router::new().route(
            "/api/username/lights/4",
            delete(|| async { Json(json!([{"success": "/lights/4 deleted"}])) }),
        );
        let bridge = testing::bridge(testing::serve(router).await);
        bridge.lights().delete(4).await.unwrap();
    }
}
