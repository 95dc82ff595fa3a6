// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// OpenGL tutorial review: shader program loader and the programs using it

pub mod config;
pub mod logging;
pub mod opengl33;

#[cfg(target_os = "linux")]
pub mod context3d_xlib_glx;

#[cfg(target_os = "linux")]
pub mod demo;
