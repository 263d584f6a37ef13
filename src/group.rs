//! Groups of lights: plain light groups, rooms, zones and the like.

use std::collections::HashMap;

use futures::future::join_all;
use log::{debug, warn};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::Error;
use crate::payload::StatePayload;
use crate::response::{Envelope, order_by_id};
use crate::status::{GroupAction, GroupState};
use crate::transport::Transport;
use crate::types::{Color, ColorCommand, GroupType, PowerMode};

type Result<T> = std::result::Result<T, Error>;

const SERVICE: &str = "groups";

/// A group as described by the bridge.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Group {
    #[serde(skip)]
    pub id: u32,
    pub name: String,
    /// Ids of the member lights, as the bridge lists them.
    #[serde(default)]
    pub lights: Vec<String>,
    #[serde(default)]
    pub sensors: Vec<String>,
    #[serde(rename = "type")]
    pub kind: GroupType,
    /// Room class, e.g. `Living room`. Only set for rooms.
    pub class: Option<String>,
    #[serde(default)]
    pub action: GroupAction,
    #[serde(default)]
    pub state: GroupState,
    pub recycle: Option<bool>,
}

impl Group {
    /// Member light ids; entries that are not numbers are skipped.
    pub fn light_ids(&self) -> Vec<u32> {
        self.lights.iter().filter_map(|id| id.parse().ok()).collect()
    }
}

/// Attributes to change with [`Groups::update`].
///
/// ```
/// use hue_bridge_rs::GroupUpdate;
///
/// let mut update = GroupUpdate::default();
/// update.name("Upstairs").lights(&[1, 4]);
/// let json = serde_json::to_value(&update).unwrap();
/// assert_eq!(json, serde_json::json!({"name": "Upstairs", "lights": ["1", "4"]}));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Clone, PartialEq)]
pub struct GroupUpdate {
    name: Option<String>,
    lights: Option<Vec<String>>,
    class: Option<String>,
}

impl GroupUpdate {
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn lights(&mut self, ids: &[u32]) -> &mut Self {
        self.lights = Some(light_list(ids));
        self
    }

    /// Only accepted by the bridge for rooms.
    pub fn class(&mut self, class: &str) -> &mut Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.lights.is_none() && self.class.is_none()
    }
}

fn light_list(ids: &[u32]) -> Vec<String> {
    ids.iter().map(u32::to_string).collect()
}

/// Operations on `/groups`.
#[derive(Debug, Clone, Copy)]
pub struct Groups<'a> {
    transport: &'a Transport,
}

impl<'a> Groups<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Groups { transport }
    }

    /// All groups, in ascending id order. Group 0 (all lights) is not listed.
    pub async fn get_all(&self) -> Result<Vec<Group>> {
        let groups: HashMap<String, Group> = self
            .transport
            .send(Method::GET, SERVICE, None)
            .await?
            .into_body_or_default()?;

        Ok(order_by_id(groups)?
            .into_iter()
            .map(|(id, mut group)| {
                group.id = id;
                group
            })
            .collect())
    }

    pub async fn get(&self, id: u32) -> Result<Group> {
        let mut group: Group = self
            .transport
            .send(Method::GET, &format!("{SERVICE}/{id}"), None)
            .await?
            .into_body()?;
        group.id = id;
        Ok(group)
    }

    /// Create a `LightGroup` and return its id.
    pub async fn create_group(&self, name: &str, lights: &[u32]) -> Result<u32> {
        let body = json!({
            "name": name,
            "type": GroupType::LightGroup,
            "lights": light_list(lights),
        });
        self.create(&body).await
    }

    /// Create a `Room` of the given class (e.g. `Bedroom`) and return its id.
    ///
    /// A light can only belong to one room.
    pub async fn create_room(&self, name: &str, class: &str, lights: &[u32]) -> Result<u32> {
        let body = json!({
            "name": name,
            "type": GroupType::Room,
            "class": class,
            "lights": light_list(lights),
        });
        self.create(&body).await
    }

    /// Change name, members or class. Any error element fails the call.
    pub async fn update(&self, id: u32, update: &GroupUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(Error::NoAttribute);
        }
        let body = serde_json::to_value(update).map_err(Error::JsonDump)?;
        self.envelope(Method::PUT, format!("{SERVICE}/{id}"), Some(&body))
            .await?
            .check_all()
    }

    /// Apply an action to every light of the group.
    pub async fn set_state(&self, id: u32, payload: &StatePayload) -> Result<Envelope> {
        if !payload.is_valid() {
            return Err(Error::NoAttribute);
        }
        let body = serde_json::to_value(payload).map_err(Error::JsonDump)?;
        self.envelope(Method::PUT, format!("{SERVICE}/{id}/action"), Some(&body))
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

    pub async fn turn_on(&self, id: u32) -> Result<Envelope> {
        self.set_state(id, &StatePayload::from(&PowerMode::On)).await
    }

    pub async fn turn_off(&self, id: u32) -> Result<Envelope> {
        self.set_state(id, &StatePayload::from(&PowerMode::Off)).await
    }

    pub async fn turn_on_all(&self, ids: &[u32]) -> Vec<Result<Envelope>> {
        self.set_power_all(ids, PowerMode::On).await
    }

    pub async fn turn_off_all(&self, ids: &[u32]) -> Vec<Result<Envelope>> {
        self.set_power_all(ids, PowerMode::Off).await
    }

    pub async fn set_color(&self, id: u32, color: &Color) -> Result<Envelope> {
        let command = ColorCommand::from(color);
        self.set_state(id, &StatePayload::from(&command)).await
    }

    async fn create(&self, body: &Value) -> Result<u32> {
        let envelope = self
            .envelope(Method::POST, SERVICE.to_string(), Some(body))
            .await?;
        let id = envelope.first_string("id")?;
        debug!("created group {id}");
        id.parse()
            .map_err(|_| Error::InvalidResponse(format!("group id {id:?} is not a number")))
    }

    async fn set_power_all(&self, ids: &[u32], power: PowerMode) -> Vec<Result<Envelope>> {
        let payload = StatePayload::from(&power);
        let results = join_all(ids.iter().map(|id| self.set_state(*id, &payload))).await;
        for (id, result) in ids.iter().zip(&results) {
            if let Err(e) = result {
                warn!("setting group {id} to {power:?} failed: {e}");
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
