// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// OpenGL 3.3 core

mod api;
pub use api::*;

mod shader;
pub use shader::*;

mod texture2d;
pub use texture2d::*;

mod framebuffer;
pub use framebuffer::*;

mod vertexbuffer;
pub use vertexbuffer::*;

#[cfg(test)]
pub(crate) mod mock;
