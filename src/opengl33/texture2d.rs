// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// 2D texture

use std::os::raw::c_void;
use std::path::Path;

use gl::types::*;
use log::{debug,error};
use thiserror::Error;

use crate::opengl33::Gl;

#[derive(Debug,Error)]
pub enum TextureError {
    #[error("unable to decode texture image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture of {width}x{height} pixels exceeds the driver limit of {max}")]
    TooLarge {
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Refuse images the driver cannot hold in one texture level.
pub fn check_texture_size(width: u32,height: u32,max: u32) -> Result<(),TextureError> {
    if (width > max) || (height > max) {
        return Err(TextureError::TooLarge { width: width,height: height,max: max, });
    }
    Ok(())
}

/// RGBA8 texture with repeat wrapping, linear filtering and mipmaps.
pub struct Texture2D<'gl> {
    _gl: &'gl Gl,
    id: GLuint,
    pub width: u32,
    pub height: u32,
}

impl<'gl> Texture2D<'gl> {
    pub fn from_file<P: AsRef<Path>>(gl: &'gl Gl,path: P) -> Result<Texture2D<'gl>,TextureError> {
        // GL expects the first row at the bottom
        let image = image::open(path.as_ref())?.flipv().to_rgba8();
        let (width,height) = image.dimensions();
        check_texture_size(width,height,gl.max_texture_size())?;
        debug!("loaded texture {} ({}x{})",path.as_ref().display(),width,height);
        Ok(Texture2D::from_rgba(gl,width,height,image.as_raw()))
    }

    /// Load `path`, or fall back to a checkerboard so drawing can go on.
    pub fn from_file_or_checkerboard<P: AsRef<Path>>(gl: &'gl Gl,path: P) -> Texture2D<'gl> {
        match Texture2D::from_file(gl,path.as_ref()) {
            Ok(texture) => texture,
            Err(e) => {
                error!("FAILED TO LOAD TEXTURE {}: {}",path.as_ref().display(),e);
                Texture2D::checkerboard(gl,64,8)
            },
        }
    }

    pub fn checkerboard(gl: &'gl Gl,size: u32,cell: u32) -> Texture2D<'gl> {
        let pixels = checkerboard_pixels(size,cell);
        Texture2D::from_rgba(gl,size,size,&pixels)
    }

    /// Upload tightly packed RGBA8 rows.
    pub fn from_rgba(gl: &'gl Gl,width: u32,height: u32,pixels: &[u8]) -> Texture2D<'gl> {
        assert_eq!(pixels.len(),(width * height * 4) as usize);
        let mut id: GLuint = 0;
        unsafe {
            gl::GenTextures(1,&mut id);
            gl::BindTexture(gl::TEXTURE_2D,id);
            gl::TexParameteri(gl::TEXTURE_2D,gl::TEXTURE_WRAP_S,gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D,gl::TEXTURE_WRAP_T,gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D,gl::TEXTURE_MIN_FILTER,gl::LINEAR_MIPMAP_LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D,gl::TEXTURE_MAG_FILTER,gl::LINEAR as GLint);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT,1);
            gl::TexImage2D(gl::TEXTURE_2D,0,gl::RGBA8 as GLint,width as GLsizei,height as GLsizei,0,gl::RGBA,gl::UNSIGNED_BYTE,pixels.as_ptr() as *const c_void);
            gl::GenerateMipmap(gl::TEXTURE_2D);
            gl::BindTexture(gl::TEXTURE_2D,0);
        }
        Texture2D {
            _gl: gl,
            id: id,
            width: width,
            height: height,
        }
    }

    pub fn bind(&self,unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D,self.id);
        }
    }

    pub fn unbind(&self) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D,0) };
    }
}

impl<'gl> Drop for Texture2D<'gl> {
    fn drop(&mut self) {
        unsafe { gl::DeleteTextures(1,&self.id) };
    }
}

/// Light/dark squares of `cell` pixels, `size`x`size` RGBA8.
pub fn checkerboard_pixels(size: u32,cell: u32) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let v = if light { 0xC0 } else { 0x40 };
            pixels.extend_from_slice(&[v,v,v,0xFF]);
        }
    }
    pixels
}
