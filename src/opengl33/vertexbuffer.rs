// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// Vertex array with vertex and index buffers

use std::mem::size_of;
use std::os::raw::c_void;
use std::ptr::null;

use gl::types::*;

use crate::opengl33::Gl;

/// Byte stride and per-attribute byte offsets of an interleaved float layout.
pub fn interleaved_layout(components: &[GLint]) -> (GLsizei,Vec<usize>) {
    let mut offsets = Vec::with_capacity(components.len());
    let mut offset = 0usize;
    for n in components {
        offsets.push(offset);
        offset += (*n as usize) * size_of::<f32>();
    }
    (offset as GLsizei,offsets)
}

/// A VAO with one interleaved float VBO, optional extra attribute buffers and
/// an optional element buffer.
pub struct VertexArray<'gl> {
    _gl: &'gl Gl,
    vao: GLuint,
    buffers: Vec<GLuint>,
    ebo: Option<(GLuint,GLsizei)>,
    vertex_count: GLsizei,
    next_location: GLuint,
}

impl<'gl> VertexArray<'gl> {

    /// `components` lists the float count of each attribute, starting at
    /// location 0.
    pub fn new(gl: &'gl Gl,vertices: &[f32],components: &[GLint]) -> VertexArray<'gl> {
        let (stride,offsets) = interleaved_layout(components);
        let floats_per_vertex = (stride as usize) / size_of::<f32>();
        let mut vao: GLuint = 0;
        let mut vbo: GLuint = 0;
        unsafe {
            gl::GenVertexArrays(1,&mut vao);
            gl::BindVertexArray(vao);
            gl::GenBuffers(1,&mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER,vbo);
            gl::BufferData(gl::ARRAY_BUFFER,(vertices.len() * size_of::<f32>()) as GLsizeiptr,vertices.as_ptr() as *const c_void,gl::STATIC_DRAW);
            for (location,(n,offset)) in components.iter().zip(offsets.iter()).enumerate() {
                gl::VertexAttribPointer(location as GLuint,*n,gl::FLOAT,gl::FALSE,stride,*offset as *const c_void);
                gl::EnableVertexAttribArray(location as GLuint);
            }
            gl::BindVertexArray(0);
        }
        VertexArray {
            _gl: gl,
            vao: vao,
            buffers: vec![vbo],
            ebo: None,
            vertex_count: if floats_per_vertex == 0 { 0 } else { (vertices.len() / floats_per_vertex) as GLsizei },
            next_location: components.len() as GLuint,
        }
    }

    /// Attach a separate, tightly packed float buffer at the next location.
    pub fn with_attribute(mut self,data: &[f32],components: GLint) -> VertexArray<'gl> {
        let mut vbo: GLuint = 0;
        unsafe {
            gl::BindVertexArray(self.vao);
            gl::GenBuffers(1,&mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER,vbo);
            gl::BufferData(gl::ARRAY_BUFFER,(data.len() * size_of::<f32>()) as GLsizeiptr,data.as_ptr() as *const c_void,gl::STATIC_DRAW);
            gl::VertexAttribPointer(self.next_location,components,gl::FLOAT,gl::FALSE,components * size_of::<f32>() as GLsizei,null());
            gl::EnableVertexAttribArray(self.next_location);
            gl::BindVertexArray(0);
        }
        self.buffers.push(vbo);
        self.next_location += 1;
        self
    }

    /// Draw indexed triangles from now on.
    pub fn with_indices(mut self,indices: &[u32]) -> VertexArray<'gl> {
        let mut ebo: GLuint = 0;
        unsafe {
            // the element binding is VAO state
            gl::BindVertexArray(self.vao);
            gl::GenBuffers(1,&mut ebo);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER,ebo);
            gl::BufferData(gl::ELEMENT_ARRAY_BUFFER,(indices.len() * size_of::<u32>()) as GLsizeiptr,indices.as_ptr() as *const c_void,gl::STATIC_DRAW);
            gl::BindVertexArray(0);
        }
        self.ebo = Some((ebo,indices.len() as GLsizei));
        self
    }

    pub fn draw(&self) {
        unsafe {
            gl::BindVertexArray(self.vao);
            match self.ebo {
                Some((_,count)) => gl::DrawElements(gl::TRIANGLES,count,gl::UNSIGNED_INT,null()),
                None => gl::DrawArrays(gl::TRIANGLES,0,self.vertex_count),
            }
            gl::BindVertexArray(0);
        }
    }
}

impl<'gl> Drop for VertexArray<'gl> {
    fn drop(&mut self) {
        unsafe {
            if let Some((ebo,_)) = self.ebo {
                gl::DeleteBuffers(1,&ebo);
            }
            gl::DeleteBuffers(self.buffers.len() as GLsizei,self.buffers.as_ptr());
            gl::DeleteVertexArrays(1,&self.vao);
        }
    }
}
