//! Coordinate, color and matrix types shared by the text engine, camera and renderers.
//!
//! Two spaces are in use:
//! - window pixels (origin top-left, +Y down) for raw input and viewport sizes
//! - normalized device coordinates (origin center, +Y up, `[-1, 1]`) for text layout
//!
//! Matrices are column-major to match the GPU upload layout.

mod color;
mod mat4;
mod rect;
mod vec2;
mod vec3;
mod viewport;

pub use color::ColorRgba;
pub use mat4::Mat4;
pub use rect::Rect;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use viewport::Viewport;
