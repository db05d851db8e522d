mod collaborators;
mod component;
mod config;
mod coords;
mod geometry;
mod interaction;
mod layout;
mod render;
pub mod scale;
mod state;
mod types;
mod viewport;

pub use collaborators::{ConfirmDialog, ConfirmEvent, EnvError, Environment, Response};
pub use component::EnvironmentCanvas;
pub use config::ViewConfig;
pub use types::{Endpoint, Relation, Service, Topology, TopologyError};
