use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ServiceId = String;

/// One deployed application as delivered by the topology data source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
	pub id: ServiceId,
	#[serde(default)]
	pub charm: String,
	#[serde(default)]
	pub unit_count: u32,
	#[serde(default)]
	pub exposed: bool,
	#[serde(default)]
	pub aggregated_status: BTreeMap<String, u32>,
	#[serde(default)]
	pub x: Option<f64>,
	#[serde(default)]
	pub y: Option<f64>,
}

/// `[service id, role]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endpoint(pub ServiceId, pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
	pub endpoints: Vec<Endpoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
	#[serde(default)]
	pub services: Vec<Service>,
	#[serde(default)]
	pub relations: Vec<Relation>,
}

#[derive(Debug, Error)]
pub enum TopologyError {
	#[error("malformed topology document: {0}")]
	Decode(#[from] serde_json::Error),
}

impl Topology {
	pub fn from_json(raw: &str) -> Result<Self, TopologyError> {
		Ok(serde_json::from_str(raw)?)
	}

	pub fn service(&self, id: &str) -> Option<&Service> {
		self.services.iter().find(|s| s.id == id)
	}
}
