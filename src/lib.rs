//! Layout and interaction engine for node-link diagrams of code entities.
//!
//! The host hands a [`GraphData`] snapshot to a [`GraphEngine`], forwards pointer and keyboard
//! input to it and draws each frame through a [`render::DrawSurface`].

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod render;
pub mod simulation;
mod util;
pub mod viewport;

pub use config::GraphConfig;
pub use engine::{EngineAction, GraphEngine};
pub use error::GraphError;
pub use model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};
