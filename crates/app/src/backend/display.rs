//! X11 host backend: Xlib for geometry and input state, XTest for synthetic
//! input, Xrandr for the refresh rate.

use std::{
    os::raw::{c_char, c_int, c_uint},
    ptr,
};

use tonelink_core::{
    host::{InputSink, InputSource, ScreenInfo},
    Result, ScreenSize, ToneLinkError,
};
use x11::{xlib, xrandr, xtest};

/// `CurrentTime`: let the server timestamp synthesised events.
const CURRENT_TIME: xlib::Time = 0;

/// Connection to the default X display. Closed on drop.
pub struct X11Host {
    display: *mut xlib::Display,
    screen: c_int,
    root: xlib::Window,
}

impl X11Host {
    pub fn open() -> Result<Self> {
        // SAFETY: a null name selects the display named by $DISPLAY.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            let name = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(ToneLinkError::setup(format!(
                "cannot open X display (DISPLAY={name})"
            )));
        }

        // SAFETY: `display` is non-null and owned by this value from here on.
        let (screen, root) = unsafe {
            let screen = xlib::XDefaultScreen(display);
            (screen, xlib::XRootWindow(display, screen))
        };

        let mut event_base = 0;
        let mut error_base = 0;
        let mut major = 0;
        let mut minor = 0;
        // SAFETY: valid display; out-pointers live for the call.
        let has_xtest = unsafe {
            xtest::XTestQueryExtension(
                display,
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if has_xtest == 0 {
            // SAFETY: closing the display we just opened.
            unsafe { xlib::XCloseDisplay(display) };
            return Err(ToneLinkError::setup("X server lacks the XTest extension"));
        }

        tracing::debug!(screen, xtest_major = major, xtest_minor = minor, "X display opened");
        Ok(Self {
            display,
            screen,
            root,
        })
    }
}

impl Drop for X11Host {
    fn drop(&mut self) {
        // SAFETY: the display was opened in `open` and is closed exactly once.
        unsafe { xlib::XCloseDisplay(self.display) };
    }
}

impl ScreenInfo for X11Host {
    fn screen_size(&self) -> Result<ScreenSize> {
        // SAFETY: valid display and screen number.
        let (width, height) = unsafe {
            (
                xlib::XDisplayWidth(self.display, self.screen),
                xlib::XDisplayHeight(self.display, self.screen),
            )
        };
        if width <= 0 || height <= 0 {
            return Err(ToneLinkError::host(format!(
                "X reported a {width}x{height} screen"
            )));
        }
        Ok(ScreenSize::new(width as u32, height as u32))
    }

    fn refresh_rate(&self) -> Option<u32> {
        // SAFETY: valid display and root window; the configuration is freed
        // before returning.
        let rate = unsafe {
            let config = xrandr::XRRGetScreenInfo(self.display, self.root);
            if config.is_null() {
                return None;
            }
            let rate = xrandr::XRRConfigCurrentRate(config);
            xrandr::XRRFreeScreenConfigInfo(config);
            rate
        };
        u32::try_from(rate).ok().filter(|rate| *rate > 0)
    }
}

impl InputSource for X11Host {
    fn pointer_position(&mut self) -> Result<(i32, i32)> {
        let mut root_return: xlib::Window = 0;
        let mut child_return: xlib::Window = 0;
        let (mut root_x, mut root_y, mut win_x, mut win_y) = (0, 0, 0, 0);
        let mut mask: c_uint = 0;

        // SAFETY: valid display and root window; out-pointers live for the call.
        let on_screen = unsafe {
            xlib::XQueryPointer(
                self.display,
                self.root,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };
        if on_screen == 0 {
            return Err(ToneLinkError::host("pointer is not on the default screen"));
        }
        Ok((root_x, root_y))
    }

    fn any_key_down(&mut self) -> Result<bool> {
        let mut keys: [c_char; 32] = [0; 32];
        // SAFETY: XQueryKeymap writes exactly 32 bytes.
        unsafe { xlib::XQueryKeymap(self.display, keys.as_mut_ptr()) };
        Ok(keys.iter().any(|byte| *byte != 0))
    }
}

impl InputSink for X11Host {
    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<()> {
        // SAFETY: valid display and root window; a zero source window means
        // an absolute move.
        unsafe { xlib::XWarpPointer(self.display, 0, self.root, 0, 0, 0, 0, x, y) };
        Ok(())
    }

    fn key_event(&mut self, key_code: u32, pressed: bool) -> Result<()> {
        // SAFETY: valid display; the key code is range-checked by the server.
        let status = unsafe {
            xtest::XTestFakeKeyEvent(
                self.display,
                key_code as c_uint,
                c_int::from(pressed),
                CURRENT_TIME,
            )
        };
        if status == 0 {
            return Err(ToneLinkError::host(format!(
                "XTest rejected key {key_code} (pressed = {pressed})"
            )));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // SAFETY: valid display.
        unsafe { xlib::XFlush(self.display) };
        Ok(())
    }
}
