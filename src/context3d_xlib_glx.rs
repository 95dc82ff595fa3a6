// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// 3D context: Xlib window with a GLX OpenGL 3.3 core context

use std::cell::Cell;
use std::ffi::CString;
use std::mem::{transmute,zeroed};
use std::os::raw::{c_char,c_int,c_uint,c_void};
use std::ptr::{null,null_mut};
use std::sync::atomic::{AtomicU8,Ordering};

use log::{debug,error,info};
use thiserror::Error;
use x11::glx;
use x11::keysym;
use x11::xlib;

use crate::opengl33::Gl;

// GLX_ARB_create_context
const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
const GLX_CONTEXT_FLAGS_ARB: c_int = 0x2094;
const GLX_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x0001;
const GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x0002;

type GlXCreateContextAttribsARB = unsafe extern "C" fn(*mut xlib::Display,glx::GLXFBConfig,glx::GLXContext,xlib::Bool,*const c_int) -> glx::GLXContext;

// error code of the last X error raised while errors are trapped, 0 for none
static TRAPPED_X_ERROR: AtomicU8 = AtomicU8::new(0);

unsafe extern "C" fn trap_x_error(_display: *mut xlib::Display,event: *mut xlib::XErrorEvent) -> c_int {
    if !event.is_null() {
        TRAPPED_X_ERROR.store((*event).error_code,Ordering::SeqCst);
    }
    0
}

/// Run `f` with X errors recorded instead of ending the process. Returns the
/// result of `f` and the code of the last X error it caused.
unsafe fn with_x_errors_trapped<T,F: FnOnce() -> T>(display: *mut xlib::Display,f: F) -> (T,Option<u8>) {
    TRAPPED_X_ERROR.store(0,Ordering::SeqCst);
    let previous = xlib::XSetErrorHandler(Some(trap_x_error));
    let result = f();
    xlib::XSync(display,xlib::False);
    xlib::XSetErrorHandler(previous);
    match TRAPPED_X_ERROR.swap(0,Ordering::SeqCst) {
        0 => (result,None),
        code => (result,Some(code)),
    }
}

#[derive(Debug,Error)]
pub enum ContextError {
    #[error("unable to open X display")]
    NoDisplay,
    #[error("no double buffered RGBA8 GLX framebuffer configuration")]
    NoFramebufferConfig,
    #[error("no X visual for the GLX framebuffer configuration")]
    NoVisual,
    #[error("glXCreateContextAttribsARB is not available")]
    NoCreateContextAttribs,
    #[error("unable to create an OpenGL 3.3 core context")]
    NoContext,
    #[error("unable to make the OpenGL context current")]
    MakeCurrent,
}

// owns the X side; released in reverse order of creation
struct XResources {
    display: *mut xlib::Display,
    colormap: xlib::Colormap,
    window: xlib::Window,
    context: glx::GLXContext,
}

impl Drop for XResources {
    fn drop(&mut self) {
        unsafe {
            if !self.context.is_null() {
                glx::glXMakeCurrent(self.display,0,null_mut());
                glx::glXDestroyContext(self.display,self.context);
            }
            if self.window != 0 {
                xlib::XDestroyWindow(self.display,self.window);
            }
            if self.colormap != 0 {
                xlib::XFreeColormap(self.display,self.colormap);
            }
            xlib::XCloseDisplay(self.display);
        }
    }
}

/// A window with a current OpenGL 3.3 core context.
///
/// Neither `Send` nor `Sync`; the context stays current on the thread that
/// created it.
pub struct Context3D {
    x: XResources,
    wm_delete_window: xlib::Atom,
    open: Cell<bool>,
    size: Cell<(u32,u32)>,
    gl: Gl,
}

impl Context3D {

    /// Open a visible window.
    pub fn new(width: u32,height: u32,title: &str) -> Result<Context3D,ContextError> {
        Context3D::create(width,height,title,true)
    }

    /// Context on a window that is never mapped, for offscreen rendering.
    pub fn hidden(width: u32,height: u32) -> Result<Context3D,ContextError> {
        Context3D::create(width,height,"glreview",false)
    }

    fn create(width: u32,height: u32,title: &str,visible: bool) -> Result<Context3D,ContextError> {
        unsafe {
            let display = xlib::XOpenDisplay(null());
            if display.is_null() {
                return Err(ContextError::NoDisplay);
            }
            let mut x = XResources {
                display: display,
                colormap: 0,
                window: 0,
                context: null_mut(),
            };
            let screen = xlib::XDefaultScreen(display);

            // pick a framebuffer configuration
            let attributes = [
                glx::GLX_X_RENDERABLE,1,
                glx::GLX_DRAWABLE_TYPE,glx::GLX_WINDOW_BIT,
                glx::GLX_RENDER_TYPE,glx::GLX_RGBA_BIT,
                glx::GLX_X_VISUAL_TYPE,glx::GLX_TRUE_COLOR,
                glx::GLX_RED_SIZE,8,
                glx::GLX_GREEN_SIZE,8,
                glx::GLX_BLUE_SIZE,8,
                glx::GLX_ALPHA_SIZE,8,
                glx::GLX_DOUBLEBUFFER,1,
                0,
            ];
            let mut count: c_int = 0;
            let configs = glx::glXChooseFBConfig(display,screen,attributes.as_ptr(),&mut count);
            if configs.is_null() || (count == 0) {
                return Err(ContextError::NoFramebufferConfig);
            }
            let config = *configs;
            xlib::XFree(configs as *mut c_void);
            let visual = glx::glXGetVisualFromFBConfig(display,config);
            if visual.is_null() {
                return Err(ContextError::NoVisual);
            }

            // create window
            let root = xlib::XRootWindow(display,screen);
            x.colormap = xlib::XCreateColormap(display,root,(*visual).visual,xlib::AllocNone);
            let mut swa: xlib::XSetWindowAttributes = zeroed();
            swa.colormap = x.colormap;
            swa.event_mask = xlib::ExposureMask | xlib::KeyPressMask | xlib::StructureNotifyMask;
            x.window = xlib::XCreateWindow(
                display,
                root,
                0,0,
                width as c_uint,height as c_uint,
                0,
                (*visual).depth,
                xlib::InputOutput as c_uint,
                (*visual).visual,
                xlib::CWColormap | xlib::CWEventMask,
                &mut swa
            );
            xlib::XFree(visual as *mut c_void);
            let title = CString::new(title.replace('\0',"")).unwrap_or_default();
            xlib::XStoreName(display,x.window,title.as_ptr());
            let mut wm_delete_window = xlib::XInternAtom(display,b"WM_DELETE_WINDOW\0".as_ptr() as *const c_char,xlib::False);
            xlib::XSetWMProtocols(display,x.window,&mut wm_delete_window,1);
            if visible {
                xlib::XMapWindow(display,x.window);
            }

            // create the 3.3 core context
            let create: GlXCreateContextAttribsARB = match glx::glXGetProcAddress(b"glXCreateContextAttribsARB\0".as_ptr()) {
                Some(f) => transmute(f),
                None => return Err(ContextError::NoCreateContextAttribs),
            };
            let context_attributes = [
                GLX_CONTEXT_MAJOR_VERSION_ARB,3,
                GLX_CONTEXT_MINOR_VERSION_ARB,3,
                GLX_CONTEXT_PROFILE_MASK_ARB,GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
                GLX_CONTEXT_FLAGS_ARB,GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB,
                0,
            ];
            // an unsupported version or profile arrives as an X error (BadMatch)
            let (context,x_error) = with_x_errors_trapped(display,|| create(display,config,null_mut(),xlib::True,context_attributes.as_ptr()));
            x.context = context;
            if let Some(code) = x_error {
                error!("X error {} while creating the OpenGL context",code);
                return Err(ContextError::NoContext);
            }
            if x.context.is_null() {
                return Err(ContextError::NoContext);
            }
            if glx::glXMakeCurrent(display,x.window,x.context) == 0 {
                return Err(ContextError::MakeCurrent);
            }

            let gl = Gl::load_with(|symbol| {
                match CString::new(symbol) {
                    Ok(name) => match glx::glXGetProcAddress(name.as_ptr() as *const u8) {
                        Some(f) => f as *const c_void,
                        None => null(),
                    },
                    Err(_) => null(),
                }
            });
            info!("GL version: {}",gl.version());
            info!("GL renderer: {}",gl.renderer());
            debug!("maximum number of vertex attributes: {}",gl.max_vertex_attribs());
            gl.viewport(width as i32,height as i32);

            Ok(Context3D {
                x: x,
                wm_delete_window: wm_delete_window,
                open: Cell::new(true),
                size: Cell::new((width,height)),
                gl: gl,
            })
        }
    }

    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    pub fn close(&self) {
        self.open.set(false);
    }

    /// Handle pending window events; returns whether the window is still
    /// open. Escape or the window manager's close button close it, a resize
    /// moves the viewport along.
    pub fn poll_events(&self) -> bool {
        unsafe {
            while xlib::XPending(self.x.display) > 0 {
                let mut event: xlib::XEvent = zeroed();
                xlib::XNextEvent(self.x.display,&mut event);
                match event.get_type() {
                    xlib::KeyPress => {
                        let mut key = xlib::XKeyEvent::from(event);
                        if xlib::XLookupKeysym(&mut key,0) == keysym::XK_Escape as xlib::KeySym {
                            self.close();
                        }
                    },
                    xlib::ConfigureNotify => {
                        let configure = xlib::XConfigureEvent::from(event);
                        let size = (configure.width as u32,configure.height as u32);
                        if size != self.size.get() {
                            debug!("framebuffer resized to {}x{}",size.0,size.1);
                            self.size.set(size);
                            self.gl.viewport(configure.width,configure.height);
                        }
                    },
                    xlib::ClientMessage => {
                        let message = xlib::XClientMessageEvent::from(event);
                        if message.data.get_long(0) as xlib::Atom == self.wm_delete_window {
                            self.close();
                        }
                    },
                    _ => { },
                }
            }
        }
        self.open.get()
    }

    pub fn swap_buffers(&self) {
        unsafe { glx::glXSwapBuffers(self.x.display,self.x.window) };
    }
}
