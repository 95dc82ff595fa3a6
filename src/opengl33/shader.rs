// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// Shader program loader

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path,PathBuf};

use gl::types::*;
use log::{debug,error,trace};
use thiserror::Error;

use crate::opengl33::{Gl,GlApi,Stage};

/// A non-fatal problem met while building a shader program.
#[derive(Debug,Error)]
pub enum ShaderError {
    #[error("ERROR {stage} SHADER FILE NOT READ: {}: {source}",path.display())]
    Read {
        stage: Stage,
        path: PathBuf,
        source: io::Error,
    },
    #[error("ERROR IN {stage} SHADER COMPILATION\n{log}")]
    Compile {
        stage: Stage,
        log: String,
    },
    #[error("ERROR PROGRAM LINKING FAILED\n{log}")]
    Link {
        log: String,
    },
}

impl ShaderError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ShaderError::Read { stage,.. } | ShaderError::Compile { stage,.. } => Some(*stage),
            ShaderError::Link { .. } => None,
        }
    }
}

/// Every diagnostic collected by `ShaderProgram::try_new`, in order.
#[derive(Debug)]
pub struct ShaderErrors(pub Vec<ShaderError>);

impl fmt::Display for ShaderErrors {
    fn fmt(&self,f: &mut fmt::Formatter) -> fmt::Result {
        for (i,error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f,"{}",error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShaderErrors { }

/// Receiver of shader diagnostics. Reporting never aborts construction.
pub trait DiagnosticSink {
    fn report(&mut self,diagnostic: ShaderError);
}

impl<F: FnMut(ShaderError)> DiagnosticSink for F {
    fn report(&mut self,diagnostic: ShaderError) {
        self(diagnostic)
    }
}

/// Default sink, logs at error level (standard error with `env_logger`).
#[derive(Clone,Copy,Debug,Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self,diagnostic: ShaderError) {
        error!("{}",diagnostic);
    }
}

/// A linked vertex + fragment program.
///
/// Construction always yields a program; check `is_linked` (or use
/// `try_new`) to find out whether it is usable. The program is deleted on
/// drop.
pub struct ShaderProgram<'gl,G: GlApi = Gl> {
    gl: &'gl G,
    id: GLuint,
    linked: bool,
}

impl<'gl,G: GlApi> ShaderProgram<'gl,G> {

    /// Read, compile and link, reporting problems through the log.
    pub fn new<P: AsRef<Path>,Q: AsRef<Path>>(gl: &'gl G,vertex_path: P,fragment_path: Q) -> Self {
        Self::with_sink(gl,vertex_path,fragment_path,&mut LogSink)
    }

    /// Read, compile and link, reporting problems to `sink`.
    pub fn with_sink<P,Q,S>(gl: &'gl G,vertex_path: P,fragment_path: Q,sink: &mut S) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        S: DiagnosticSink + ?Sized,
    {
        let vertex = read_source(Stage::Vertex,vertex_path.as_ref(),sink);
        let fragment = read_source(Stage::Fragment,fragment_path.as_ref(),sink);
        Self::from_sources(gl,&vertex,&fragment,sink)
    }

    /// Like `with_sink`, but fails with every collected diagnostic if any
    /// stage went wrong.
    pub fn try_new<P: AsRef<Path>,Q: AsRef<Path>>(gl: &'gl G,vertex_path: P,fragment_path: Q) -> Result<Self,ShaderErrors> {
        let mut errors = Vec::new();
        let program = Self::with_sink(gl,vertex_path,fragment_path,&mut |error: ShaderError| errors.push(error));
        if errors.is_empty() {
            Ok(program)
        }
        else {
            Err(ShaderErrors(errors))
        }
    }

    /// Compile and link two in-memory sources.
    pub fn from_sources<S: DiagnosticSink + ?Sized>(gl: &'gl G,vertex: &str,fragment: &str,sink: &mut S) -> Self {
        let vs = compile(gl,Stage::Vertex,vertex,sink);
        let fs = compile(gl,Stage::Fragment,fragment,sink);

        let id = gl.create_program();
        gl.attach_shader(id,vs);
        gl.attach_shader(id,fs);
        gl.link_program(id);
        let linked = gl.link_status(id);
        if !linked {
            sink.report(ShaderError::Link { log: gl.program_info_log(id), });
        }

        // stages are owned by the program from here on
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        debug!("shader program {} built (linked: {})",id,linked);
        ShaderProgram {
            gl: gl,
            id: id,
            linked: linked,
        }
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Make this the program used by subsequent draws.
    pub fn activate(&self) {
        self.gl.use_program(self.id);
    }

    pub fn set_bool(&self,name: &str,value: bool) {
        self.set_int(name,value as GLint);
    }

    pub fn set_int(&self,name: &str,value: i32) {
        if let Some(location) = self.location(name) {
            self.gl.uniform_1i(location,value);
        }
    }

    pub fn set_float(&self,name: &str,value: f32) {
        if let Some(location) = self.location(name) {
            self.gl.uniform_1f(location,value);
        }
    }

    fn location(&self,name: &str) -> Option<GLint> {
        let location = self.gl.uniform_location(self.id,name);
        if location.is_none() {
            trace!("program {} has no active uniform {:?}",self.id,name);
        }
        location
    }
}

impl<'gl,G: GlApi> Drop for ShaderProgram<'gl,G> {
    fn drop(&mut self) {
        self.gl.delete_program(self.id);
    }
}

/// Read one stage's source. A file that cannot be read is reported to
/// `sink` and yields an empty source, which then fails to compile.
pub fn read_source<S: DiagnosticSink + ?Sized>(stage: Stage,path: &Path,sink: &mut S) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            sink.report(ShaderError::Read { stage: stage,path: path.to_path_buf(),source: e, });
            String::new()
        },
    }
}

fn compile<G: GlApi,S: DiagnosticSink + ?Sized>(gl: &G,stage: Stage,source: &str,sink: &mut S) -> GLuint {
    let shader = gl.create_shader(stage);
    gl.shader_source(shader,source);
    gl.compile_shader(shader);
    if !gl.compile_status(shader) {
        sink.report(ShaderError::Compile { stage: stage,log: gl.shader_info_log(shader), });
    }
    shader
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opengl33::mock::{Call,MockGl};

    const VERTEX: &str = "#version 330 core\nlayout (location = 0) in vec3 aPos;\nvoid main() { gl_Position = vec4(aPos,1.0); }\n";
    const FRAGMENT: &str = "#version 330 core\nuniform float level;\nuniform int channel;\nuniform bool invert;\nout vec4 color;\nvoid main() { color = vec4(level); }\n";

    fn collect<'gl>(gl: &'gl MockGl,vertex: &str,fragment: &str) -> (ShaderProgram<'gl,MockGl>,Vec<ShaderError>) {
        let mut errors = Vec::new();
        let program = ShaderProgram::from_sources(gl,vertex,fragment,&mut |e: ShaderError| errors.push(e));
        (program,errors)
    }

    fn temp_file(name: &str,contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("glreview-{}-{}",std::process::id(),name));
        fs::write(&path,contents).unwrap();
        path
    }

    #[test]
    fn valid_sources_link_without_diagnostics() {
        let gl = MockGl::default();
        let (program,errors) = collect(&gl,VERTEX,FRAGMENT);
        assert!(errors.is_empty());
        assert!(program.is_linked());
    }

    #[test]
    fn stages_are_released_after_linking() {
        let gl = MockGl::default();
        let (program,_) = collect(&gl,VERTEX,FRAGMENT);
        let calls = gl.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c,Call::DeleteShader(_))).count(),2);
        assert!(!calls.contains(&Call::DeleteProgram(program.id())));
    }

    #[test]
    fn vertex_syntax_error_is_reported_and_link_fails() {
        let gl = MockGl::default();
        let (program,errors) = collect(&gl,"#error nope\n",FRAGMENT);
        assert!(!program.is_linked());
        assert_eq!(errors.len(),2);
        assert!(errors[0].to_string().contains("VERTEX"));
        assert_eq!(errors[0].stage(),Some(Stage::Vertex));
        assert!(matches!(errors[1],ShaderError::Link { .. }));
    }

    #[test]
    fn fragment_failure_still_attempts_link() {
        let gl = MockGl::default();
        let (program,errors) = collect(&gl,VERTEX,"#error nope\n");
        assert!(!program.is_linked());
        assert!(errors[0].to_string().contains("FRAGMENT"));
        assert!(matches!(errors.last(),Some(ShaderError::Link { .. })));
    }

    #[test]
    fn missing_file_degrades_instead_of_failing() {
        let gl = MockGl::default();
        let fragment = temp_file("missing.fs",FRAGMENT);
        let mut errors = Vec::new();
        let program = ShaderProgram::with_sink(&gl,"/nonexistent/glreview.vs",&fragment,&mut |e: ShaderError| errors.push(e));
        assert!(!program.is_linked());
        match &errors[0] {
            ShaderError::Read { stage,path,.. } => {
                assert_eq!(*stage,Stage::Vertex);
                assert_eq!(path,Path::new("/nonexistent/glreview.vs"));
            },
            other => panic!("expected read error, got {:?}",other),
        }
        // the empty source then fails to compile on its own
        assert!(errors.iter().any(|e| matches!(e,ShaderError::Compile { stage: Stage::Vertex,.. })));
        fs::remove_file(fragment).unwrap();
    }

    #[test]
    fn files_on_disk_build_a_linked_program() {
        let gl = MockGl::default();
        let vertex = temp_file("ok.vs",VERTEX);
        let fragment = temp_file("ok.fs",FRAGMENT);
        let program = ShaderProgram::try_new(&gl,&vertex,&fragment).unwrap();
        assert!(program.is_linked());
        fs::remove_file(vertex).unwrap();
        fs::remove_file(fragment).unwrap();
    }

    #[test]
    fn try_new_returns_every_diagnostic() {
        let gl = MockGl::default();
        let errors = match ShaderProgram::try_new(&gl,"/nonexistent/a.vs","/nonexistent/a.fs") {
            Ok(_) => panic!("expected failure"),
            Err(errors) => errors,
        };
        // two reads, two compiles, one link
        assert_eq!(errors.0.len(),5);
        assert!(errors.to_string().contains("ERROR PROGRAM LINKING FAILED"));
        // the half-built program was released
        assert!(gl.calls().iter().any(|c| matches!(c,Call::DeleteProgram(_))));
    }

    #[test]
    fn setters_resolve_names_at_call_time() {
        let gl = MockGl::default();
        let (program,_) = collect(&gl,VERTEX,FRAGMENT);
        program.set_float("level",0.5);
        program.set_int("channel",2);
        program.set_bool("invert",true);
        program.set_bool("invert",false);
        let uniforms: Vec<Call> = gl.calls().into_iter().filter(|c| matches!(c,Call::Uniform1i(..) | Call::Uniform1f(..))).collect();
        assert_eq!(uniforms,vec![
            Call::Uniform1f(0,0.5),
            Call::Uniform1i(1,2),
            Call::Uniform1i(2,1),
            Call::Uniform1i(2,0),
        ]);
    }

    #[test]
    fn undeclared_uniform_is_a_silent_no_op() {
        let gl = MockGl::default();
        let (program,_) = collect(&gl,VERTEX,FRAGMENT);
        program.set_float("brightness",1.0);
        program.set_int("bad\0name",1);
        assert!(!gl.calls().iter().any(|c| matches!(c,Call::Uniform1i(..) | Call::Uniform1f(..))));
    }

    #[test]
    fn activating_an_unlinked_program_is_harmless() {
        let gl = MockGl::default();
        let (program,_) = collect(&gl,"",FRAGMENT);
        program.activate();
        assert!(gl.calls().contains(&Call::UseProgram(program.id())));
    }

    #[test]
    fn drop_deletes_the_program() {
        let gl = MockGl::default();
        let id = {
            let (program,_) = collect(&gl,VERTEX,FRAGMENT);
            program.id()
        };
        assert_eq!(gl.calls().last(),Some(&Call::DeleteProgram(id)));
    }
}
