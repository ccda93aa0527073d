//! # Strata
//!
//! A retained-mode scene-graph engine core. The caller builds and mutates
//! a node tree through message-passing handles; an update thread ticks the
//! tree at a fixed rate; a render thread consumes the resulting item lists
//! through a GPU resource controller. All cross-thread state is either
//! double-buffered or moved, never shared raw.
//!
//! ```no_run
//! use strata::{Engine, EngineConfig, Vec3};
//!
//! let engine = Engine::start(EngineConfig::default()).unwrap();
//! let node = engine.create_node().unwrap();
//! engine.connect_to_stage(node).unwrap();
//! engine.set_node_position(node, Vec3::new(10.0, 0.0, 0.0)).unwrap();
//! let animation = engine.animate_opacity(node, 0.0, 60).unwrap();
//!
//! // ... later, on the same thread:
//! for notification in engine.pump_notifications() {
//!     println!("done: {notification:?}");
//! }
//! # let _ = animation;
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{Engine, RenderHook};
pub use error::EngineError;

pub use strata_core::math::{Matrix4, Vec3};
pub use strata_core::messaging::Message;
pub use strata_graphics::{Controller, GraphicsError, RenderCommand};
pub use strata_scene::animation::{AnimationId, PropertyValue, SceneError};
pub use strata_scene::node::NodeId;
pub use strata_scene::notification::Notification;
pub use strata_scene::property::PropertyKind;
pub use strata_scene::render_item::{RenderFrame, RenderItem};
pub use strata_scene::update_manager::UpdateScene;
