// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// Tutorial programs: a triangle and a textured quad

use std::path::Path;

use log::info;
use thiserror::Error;

use crate::config::{Demo,DemoKind,UniformValue};
use crate::context3d_xlib_glx::{Context3D,ContextError};
use crate::opengl33::{read_source,DiagnosticSink,GlApi,LogSink,ShaderProgram,Stage,Texture2D,VertexArray};

#[derive(Debug,Error)]
pub enum DemoError {
    #[error(transparent)]
    Context(#[from] ContextError),
}

pub const TRIANGLE_VERTEX_SHADER: &str = "\
#version 330 core
layout (location = 0) in vec3 aPos;
out vec3 color;
void main()
{
    gl_Position = vec4(aPos, 1.0);
    color = aPos;
}
";

pub const TRIANGLE_FRAGMENT_SHADER: &str = "\
#version 330 core
in vec3 color;
out vec4 FragColor;
void main()
{
    FragColor = vec4(sin(color) + vec3(0.7), 1.0);
}
";

pub const TEXTURES_VERTEX_SHADER: &str = "assets/shaders/textures.vs";
pub const TEXTURES_FRAGMENT_SHADER: &str = "assets/shaders/textures.fs";
pub const TEXTURES_IMAGE: &str = "assets/textures/woodtexture.jpeg";

// counter clockwise
const TRIANGLE: [f32; 9] = [
    -0.5,-0.5,0.0,
    0.5,-0.5,0.0,
    0.0,0.5,0.0,
];

// position, colour
const QUAD: [f32; 24] = [
    0.5,0.5,0.0,1.0,0.0,1.0,  // top right
    0.5,-0.5,0.0,0.5,0.0,1.0,  // bottom right
    -0.5,-0.5,0.0,0.0,0.0,1.0,  // bottom left
    -0.5,0.5,0.0,0.0,1.0,1.0,  // top left
];

const QUAD_INDICES: [u32; 6] = [
    0,1,3,
    1,2,3,
];

const QUAD_TEXCOORDS: [f32; 8] = [
    1.0,1.0,
    1.0,0.0,
    0.0,0.0,
    0.0,1.0,
];

/// Set every configured uniform by name on `program`.
pub fn apply_uniforms<G: GlApi>(program: &ShaderProgram<G>,uniforms: &[(String,UniformValue)]) {
    for (name,value) in uniforms {
        match value {
            UniformValue::Bool(value) => program.set_bool(name,*value),
            UniformValue::Int(value) => program.set_int(name,*value),
            UniformValue::Float(value) => program.set_float(name,*value),
        }
    }
}

/// Build the triangle program. A configured stage is read from its file,
/// an unconfigured one uses the embedded source.
pub fn triangle_program<'gl,G,S>(gl: &'gl G,demo: &Demo,sink: &mut S) -> ShaderProgram<'gl,G>
where
    G: GlApi,
    S: DiagnosticSink + ?Sized,
{
    let vertex = match &demo.vertex {
        Some(path) => read_source(Stage::Vertex,Path::new(path),sink),
        None => TRIANGLE_VERTEX_SHADER.to_string(),
    };
    let fragment = match &demo.fragment {
        Some(path) => read_source(Stage::Fragment,Path::new(path),sink),
        None => TRIANGLE_FRAGMENT_SHADER.to_string(),
    };
    ShaderProgram::from_sources(gl,&vertex,&fragment,sink)
}

/// Open the demo's window and draw until it is closed.
pub fn run(demo: &Demo) -> Result<(),DemoError> {
    info!("running {} ({:?}, {}x{})",demo.name,demo.kind,demo.size.0,demo.size.1);
    let ctx = Context3D::new(demo.size.0,demo.size.1,&demo.title)?;
    match demo.kind {
        DemoKind::Triangle => run_triangle(&ctx,demo),
        DemoKind::Textures => run_textures(&ctx,demo),
    }
    Ok(())
}

fn run_triangle(ctx: &Context3D,demo: &Demo) {
    let gl = ctx.gl();
    let program = triangle_program(gl,demo,&mut LogSink);
    let vao = VertexArray::new(gl,&TRIANGLE,&[3]);

    while ctx.poll_events() {
        gl.clear(demo.clear.r,demo.clear.g,demo.clear.b);
        program.activate();
        apply_uniforms(&program,&demo.uniforms);
        vao.draw();
        ctx.swap_buffers();
    }
}

fn run_textures(ctx: &Context3D,demo: &Demo) {
    let gl = ctx.gl();
    let vertex = demo.vertex.as_deref().unwrap_or(TEXTURES_VERTEX_SHADER);
    let fragment = demo.fragment.as_deref().unwrap_or(TEXTURES_FRAGMENT_SHADER);
    let program = ShaderProgram::new(gl,vertex,fragment);
    let vao = VertexArray::new(gl,&QUAD,&[3,3])
        .with_indices(&QUAD_INDICES)
        .with_attribute(&QUAD_TEXCOORDS,2);
    let texture = Texture2D::from_file_or_checkerboard(gl,demo.texture.as_deref().unwrap_or(TEXTURES_IMAGE));

    while ctx.poll_events() {
        gl.clear(demo.clear.r,demo.clear.g,demo.clear.b);
        program.activate();
        texture.bind(demo.unit);
        program.set_int("myTexture",demo.unit as i32);
        apply_uniforms(&program,&demo.uniforms);
        vao.draw();
        texture.unbind();
        ctx.swap_buffers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::opengl33::ShaderError;
    use crate::opengl33::mock::{Call,MockGl};

    const FRAGMENT: &str = "#version 330 core\nuniform bool invert;\nuniform int channel;\nuniform float level;\nout vec4 color;\nvoid main() { color = vec4(level); }\n";

    fn uniform_calls(gl: &MockGl) -> Vec<Call> {
        gl.calls().into_iter().filter(|c| matches!(c,Call::Uniform1i(..) | Call::Uniform1f(..))).collect()
    }

    #[test]
    fn apply_uniforms_dispatches_on_type() {
        let gl = MockGl::default();
        let program = ShaderProgram::from_sources(&gl,TRIANGLE_VERTEX_SHADER,FRAGMENT,&mut LogSink);
        apply_uniforms(&program,&[
            ("level".to_string(),UniformValue::Float(0.25)),
            ("channel".to_string(),UniformValue::Int(-3)),
            ("invert".to_string(),UniformValue::Bool(true)),
            ("invert".to_string(),UniformValue::Bool(false)),
            ("missing".to_string(),UniformValue::Int(7)),
        ]);
        assert_eq!(uniform_calls(&gl),vec![
            Call::Uniform1f(2,0.25),
            Call::Uniform1i(1,-3),
            Call::Uniform1i(0,1),
            Call::Uniform1i(0,0),
        ]);
    }

    #[test]
    fn triangle_uses_a_single_configured_stage() {
        let gl = MockGl::default();
        let path = std::env::temp_dir().join(format!("glreview-{}-single.fs",std::process::id()));
        fs::write(&path,FRAGMENT).unwrap();
        let mut demo = Demo::new("single",DemoKind::Triangle);
        demo.fragment = Some(path.to_string_lossy().into_owned());

        let mut errors = Vec::new();
        let program = triangle_program(&gl,&demo,&mut |e: ShaderError| errors.push(e));
        assert!(errors.is_empty(),"{:?}",errors);
        assert!(program.is_linked());
        // the uniform only exists in the file, so the file was used
        program.set_float("level",1.0);
        assert_eq!(uniform_calls(&gl),vec![Call::Uniform1f(2,1.0)]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn triangle_reports_an_unreadable_configured_stage() {
        let gl = MockGl::default();
        let mut demo = Demo::new("broken",DemoKind::Triangle);
        demo.vertex = Some("/nonexistent/glreview.vs".to_string());

        let mut errors = Vec::new();
        let program = triangle_program(&gl,&demo,&mut |e: ShaderError| errors.push(e));
        assert!(!program.is_linked());
        assert!(matches!(errors[0],ShaderError::Read { stage: Stage::Vertex,.. }));
    }

    #[test]
    fn triangle_defaults_to_embedded_sources() {
        let gl = MockGl::default();
        let demo = Demo::new("plain",DemoKind::Triangle);
        let mut errors = Vec::new();
        let program = triangle_program(&gl,&demo,&mut |e: ShaderError| errors.push(e));
        assert!(errors.is_empty());
        assert!(program.is_linked());
    }
}
