// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// Offscreen framebuffer

use std::os::raw::c_void;

use gl::types::*;
use thiserror::Error;

use crate::opengl33::Gl;

#[derive(Debug,Error)]
#[error("framebuffer incomplete (status 0x{0:04X})")]
pub struct FramebufferError(pub GLenum);

/// RGBA8 colour target that can be read back.
pub struct Framebuffer<'gl> {
    gl: &'gl Gl,
    fbo: GLuint,
    rbo: GLuint,
    pub width: u32,
    pub height: u32,
}

impl<'gl> Framebuffer<'gl> {
    pub fn new(gl: &'gl Gl,width: u32,height: u32) -> Result<Framebuffer<'gl>,FramebufferError> {
        let mut fbo: GLuint = 0;
        let mut rbo: GLuint = 0;
        let status = unsafe {
            gl::GenFramebuffers(1,&mut fbo);
            gl::BindFramebuffer(gl::FRAMEBUFFER,fbo);
            gl::GenRenderbuffers(1,&mut rbo);
            gl::BindRenderbuffer(gl::RENDERBUFFER,rbo);
            gl::RenderbufferStorage(gl::RENDERBUFFER,gl::RGBA8,width as GLsizei,height as GLsizei);
            gl::FramebufferRenderbuffer(gl::FRAMEBUFFER,gl::COLOR_ATTACHMENT0,gl::RENDERBUFFER,rbo);
            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            gl::BindRenderbuffer(gl::RENDERBUFFER,0);
            gl::BindFramebuffer(gl::FRAMEBUFFER,0);
            status
        };
        let framebuffer = Framebuffer {
            gl: gl,
            fbo: fbo,
            rbo: rbo,
            width: width,
            height: height,
        };
        if status != gl::FRAMEBUFFER_COMPLETE {
            return Err(FramebufferError(status));
        }
        Ok(framebuffer)
    }

    /// Render into this target, viewport covering all of it.
    pub fn bind(&self) {
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER,self.fbo) };
        self.gl.viewport(self.width as i32,self.height as i32);
    }

    pub fn unbind(&self) {
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER,0) };
    }

    /// All pixels, RGBA8, bottom row first.
    pub fn grab(&self) -> Vec<u8> {
        let mut pixels = vec![0u8; (self.width * self.height * 4) as usize];
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER,self.fbo);
            gl::PixelStorei(gl::PACK_ALIGNMENT,1);
            gl::ReadPixels(0,0,self.width as GLsizei,self.height as GLsizei,gl::RGBA,gl::UNSIGNED_BYTE,pixels.as_mut_ptr() as *mut c_void);
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER,0);
        }
        pixels
    }

    pub fn pixel(&self,x: u32,y: u32) -> [u8; 4] {
        let mut pixel = [0u8; 4];
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER,self.fbo);
            gl::PixelStorei(gl::PACK_ALIGNMENT,1);
            gl::ReadPixels(x as GLint,y as GLint,1,1,gl::RGBA,gl::UNSIGNED_BYTE,pixel.as_mut_ptr() as *mut c_void);
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER,0);
        }
        pixel
    }
}

impl<'gl> Drop for Framebuffer<'gl> {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteRenderbuffers(1,&self.rbo);
            gl::DeleteFramebuffers(1,&self.fbo);
        }
    }
}
