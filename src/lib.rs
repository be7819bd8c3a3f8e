//! # Vitrine
//!
//! **An interactive viewer for small JSON-described 3D scenes.**
//!
//! A scene file lists a camera, a point light and a set of entities. Each
//! entity is a text model with a material, an optional texture and an
//! optional Bézier trajectory. The viewer draws them with Phong lighting and
//! lets you fly the camera and poke at the selected entity from the keyboard.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vitrine::{AppConfig, Scene};
//!
//! fn main() {
//!     let scene = Scene::load("assets/scene.json");
//!     vitrine::run(AppConfig::new().title("My Scene"), scene).unwrap();
//! }
//! ```
//!
//! ## Controls
//!
//! | Input        | Action                                  |
//! |--------------|-----------------------------------------|
//! | W A S D      | move the camera                         |
//! | mouse        | look around                             |
//! | X / Y / Z    | toggle spin of the selected entity      |
//! | E / Q        | scale the selected entity up / down     |
//! | U / J        | move the selected entity along -Z / +Z  |
//! | C            | select the next entity                  |
//! | Escape       | quit                                    |
//!
//! Everything except drawing works without a GPU, so scenes, entities,
//! trajectories and the camera can be driven directly in tests.

mod app;
mod camera;
mod entity;
mod geometry;
mod gpu;
mod input;
mod lit_pass;
mod material;
mod mesh;
mod scene;
mod shader;
mod texture;
mod trajectory;

pub use app::{AppConfig, AppError, run};
pub use camera::{Camera, CameraMovement};
pub use entity::{AutoRotate, Axis, Entity, EntityDescriptor};
pub use geometry::{
    Attribute, GeometryError, GeometryLoader, LoadedModel, RawGeometry, load_model, parse_model,
};
pub use gpu::{GpuContext, GpuError};
pub use input::{Command, KeyBindings};
pub use lit_pass::{EntityUniforms, FrameUniforms, LitPass};
pub use material::Material;
pub use mesh::{Mesh, Vertex3d};
pub use scene::{
    CameraDescription, EntityDescription, FrameContext, LightDescription, Scene,
    SceneDescription, SceneError,
};
pub use shader::{ShaderError, compile_shader};
pub use texture::{Texture, TextureChannels};
pub use trajectory::{Trajectory, TrajectoryError, bernstein_weights, cubic_bezier};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
