// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// In-memory GlApi for unit tests

use std::cell::{Cell,RefCell};
use std::collections::HashMap;

use gl::types::*;

use crate::opengl33::{GlApi,Stage};

/// GL calls with an observable effect, in the order they were made.
#[derive(Clone,Debug,PartialEq)]
pub enum Call {
    DeleteShader(GLuint),
    UseProgram(GLuint),
    DeleteProgram(GLuint),
    Uniform1i(GLint,GLint),
    Uniform1f(GLint,GLfloat),
}

/// Pretends to be a driver: a source compiles unless it is empty or
/// contains `#error`, a program links when all its stages compiled, and
/// `uniform <type> <name>;` lines declare uniforms.
#[derive(Default)]
pub struct MockGl {
    next: Cell<GLuint>,
    sources: RefCell<HashMap<GLuint,String>>,
    attached: RefCell<HashMap<GLuint,Vec<GLuint>>>,
    pub calls: RefCell<Vec<Call>>,
}

impl MockGl {
    fn alloc(&self) -> GLuint {
        self.next.set(self.next.get() + 1);
        self.next.get()
    }

    fn compiles(source: &str) -> bool {
        !source.trim().is_empty() && !source.contains("#error")
    }

    fn uniforms(&self,program: GLuint) -> Vec<String> {
        let sources = self.sources.borrow();
        let attached = self.attached.borrow();
        let mut names = Vec::new();
        for shader in attached.get(&program).into_iter().flatten() {
            for line in sources[shader].lines() {
                let words: Vec<&str> = line.split_whitespace().collect();
                if words.len() == 3 && words[0] == "uniform" {
                    names.push(words[2].trim_end_matches(';').to_string());
                }
            }
        }
        names
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl GlApi for MockGl {
    fn create_shader(&self,_stage: Stage) -> GLuint {
        self.alloc()
    }

    fn shader_source(&self,shader: GLuint,source: &str) {
        self.sources.borrow_mut().insert(shader,source.to_string());
    }

    fn compile_shader(&self,_shader: GLuint) { }

    fn compile_status(&self,shader: GLuint) -> bool {
        MockGl::compiles(&self.sources.borrow()[&shader])
    }

    fn shader_info_log(&self,shader: GLuint) -> String {
        format!("0:1(1): error: shader {} is broken",shader)
    }

    fn delete_shader(&self,shader: GLuint) {
        self.calls.borrow_mut().push(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> GLuint {
        let id = self.alloc();
        self.attached.borrow_mut().insert(id,Vec::new());
        id
    }

    fn attach_shader(&self,program: GLuint,shader: GLuint) {
        self.attached.borrow_mut().get_mut(&program).unwrap().push(shader);
    }

    fn link_program(&self,_program: GLuint) { }

    fn link_status(&self,program: GLuint) -> bool {
        let sources = self.sources.borrow();
        let attached = self.attached.borrow();
        let stages = &attached[&program];
        stages.len() == 2 && stages.iter().all(|s| MockGl::compiles(&sources[s]))
    }

    fn program_info_log(&self,_program: GLuint) -> String {
        "error: linking with uncompiled shader".to_string()
    }

    fn use_program(&self,program: GLuint) {
        self.calls.borrow_mut().push(Call::UseProgram(program));
    }

    fn delete_program(&self,program: GLuint) {
        self.calls.borrow_mut().push(Call::DeleteProgram(program));
    }

    fn uniform_location(&self,program: GLuint,name: &str) -> Option<GLint> {
        self.uniforms(program).iter().position(|n| n == name).map(|i| i as GLint)
    }

    fn uniform_1i(&self,location: GLint,value: GLint) {
        self.calls.borrow_mut().push(Call::Uniform1i(location,value));
    }

    fn uniform_1f(&self,location: GLint,value: GLfloat) {
        self.calls.borrow_mut().push(Call::Uniform1f(location,value));
    }
}
