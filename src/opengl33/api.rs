// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// Explicit OpenGL context handle

use std::ffi::{CStr,CString};
use std::fmt;
use std::marker::PhantomData;
use std::os::raw::c_void;

use gl::types::*;

/// Shader stage compiled independently before linking.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            Stage::Vertex => gl::VERTEX_SHADER,
            Stage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self,f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Vertex => write!(f,"VERTEX"),
            Stage::Fragment => write!(f,"FRAGMENT"),
        }
    }
}

/// The slice of the OpenGL API a shader program needs.
///
/// Holding a value of this trait is taken as proof that its context is
/// current on the calling thread. `Gl` is the driver-backed implementation;
/// tests substitute a recording one.
pub trait GlApi {
    fn create_shader(&self,stage: Stage) -> GLuint;
    fn shader_source(&self,shader: GLuint,source: &str);
    fn compile_shader(&self,shader: GLuint);
    fn compile_status(&self,shader: GLuint) -> bool;
    fn shader_info_log(&self,shader: GLuint) -> String;
    fn delete_shader(&self,shader: GLuint);
    fn create_program(&self) -> GLuint;
    fn attach_shader(&self,program: GLuint,shader: GLuint);
    fn link_program(&self,program: GLuint);
    fn link_status(&self,program: GLuint) -> bool;
    fn program_info_log(&self,program: GLuint) -> String;
    fn use_program(&self,program: GLuint);
    fn delete_program(&self,program: GLuint);

    /// Resolve an active uniform, `None` if the linked program has no such name.
    fn uniform_location(&self,program: GLuint,name: &str) -> Option<GLint>;
    fn uniform_1i(&self,location: GLint,value: GLint);
    fn uniform_1f(&self,location: GLint,value: GLfloat);
}

/// Handle to the process-wide GL function table of a current context.
///
/// Not `Send` or `Sync`: the context it stands for is current on exactly one
/// thread.
pub struct Gl {
    _current: PhantomData<*const ()>,
}

impl Gl {
    /// Load the function pointers through `loader`.
    ///
    /// # Safety
    ///
    /// A GL 3.3 context must be current on this thread, and stay current for
    /// as long as the returned handle is used.
    pub unsafe fn load_with<F: FnMut(&'static str) -> *const c_void>(loader: F) -> Gl {
        gl::load_with(loader);
        Gl { _current: PhantomData, }
    }

    pub fn version(&self) -> String {
        get_string(gl::VERSION)
    }

    pub fn renderer(&self) -> String {
        get_string(gl::RENDERER)
    }

    pub fn max_vertex_attribs(&self) -> i32 {
        let mut count: GLint = 0;
        unsafe { gl::GetIntegerv(gl::MAX_VERTEX_ATTRIBS,&mut count) };
        count
    }

    pub fn max_texture_size(&self) -> u32 {
        let mut size: GLint = 0;
        unsafe { gl::GetIntegerv(gl::MAX_TEXTURE_SIZE,&mut size) };
        size.max(0) as u32
    }

    pub fn viewport(&self,width: i32,height: i32) {
        unsafe { gl::Viewport(0,0,width,height) };
    }

    pub fn clear(&self,r: f32,g: f32,b: f32) {
        unsafe {
            gl::ClearColor(r,g,b,1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    pub fn finish(&self) {
        unsafe { gl::Finish() };
    }
}

fn get_string(name: GLenum) -> String {
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            return String::new();
        }
        CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned()
    }
}

fn log_to_string(mut buffer: Vec<u8>,written: GLsizei) -> String {
    buffer.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}

impl GlApi for Gl {
    fn create_shader(&self,stage: Stage) -> GLuint {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn shader_source(&self,shader: GLuint,source: &str) {
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader,1,&ptr,&len) };
    }

    fn compile_shader(&self,shader: GLuint) {
        unsafe { gl::CompileShader(shader) };
    }

    fn compile_status(&self,shader: GLuint) -> bool {
        let mut success: GLint = 0;
        unsafe { gl::GetShaderiv(shader,gl::COMPILE_STATUS,&mut success) };
        success != 0
    }

    fn shader_info_log(&self,shader: GLuint) -> String {
        let mut len: GLint = 0;
        unsafe { gl::GetShaderiv(shader,gl::INFO_LOG_LENGTH,&mut len) };
        if len <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u8; len as usize];
        let mut written: GLsizei = 0;
        unsafe { gl::GetShaderInfoLog(shader,len,&mut written,buffer.as_mut_ptr() as *mut GLchar) };
        log_to_string(buffer,written)
    }

    fn delete_shader(&self,shader: GLuint) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self,program: GLuint,shader: GLuint) {
        unsafe { gl::AttachShader(program,shader) };
    }

    fn link_program(&self,program: GLuint) {
        unsafe { gl::LinkProgram(program) };
    }

    fn link_status(&self,program: GLuint) -> bool {
        let mut success: GLint = 0;
        unsafe { gl::GetProgramiv(program,gl::LINK_STATUS,&mut success) };
        success != 0
    }

    fn program_info_log(&self,program: GLuint) -> String {
        let mut len: GLint = 0;
        unsafe { gl::GetProgramiv(program,gl::INFO_LOG_LENGTH,&mut len) };
        if len <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u8; len as usize];
        let mut written: GLsizei = 0;
        unsafe { gl::GetProgramInfoLog(program,len,&mut written,buffer.as_mut_ptr() as *mut GLchar) };
        log_to_string(buffer,written)
    }

    fn use_program(&self,program: GLuint) {
        unsafe { gl::UseProgram(program) };
    }

    fn delete_program(&self,program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn uniform_location(&self,program: GLuint,name: &str) -> Option<GLint> {
        // a name with an interior NUL can never match a declared uniform
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program,name.as_ptr()) };
        if location < 0 {
            None
        }
        else {
            Some(location)
        }
    }

    fn uniform_1i(&self,location: GLint,value: GLint) {
        unsafe { gl::Uniform1i(location,value) };
    }

    fn uniform_1f(&self,location: GLint,value: GLfloat) {
        unsafe { gl::Uniform1f(location,value) };
    }
}

