//! C ABI.
//!
//! Mirrors the classic `webview.h` surface with an opaque handle: the
//! embedder never sees the struct fields, so callback and userdata
//! registration are explicit calls. Return codes are 0 for success and -1
//! for failure; error detail goes to the log sink.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

use crate::config::ViewConfig;
use crate::dialog::{DialogFlags, DialogKind};
use crate::dispatch::DispatchHandle;
use crate::escape::css_inject_script;
use crate::event::LoopStatus;
use crate::view::View;

/// Page-to-host message callback, invoked on the loop thread.
pub type ExternalInvokeFn = extern "C" fn(w: *mut Webview, arg: *const c_char);

/// Function scheduled through [`webview_dispatch`], invoked on the loop
/// thread.
pub type DispatchFn = extern "C" fn(w: *mut Webview, arg: *mut c_void);

/// Opaque view handle as seen from C.
pub struct Webview {
    view: View,
    dispatch: DispatchHandle,
    external_invoke: Option<ExternalInvokeFn>,
    userdata: *mut c_void,
}

struct SendPtr<T>(*mut T);

// The pointers cross threads only to come back to the loop thread before
// they are dereferenced.
unsafe impl<T> Send for SendPtr<T> {}

fn forward_external_invoke(w: *mut Webview, arg: &str) {
    let callback = unsafe { (*w).external_invoke };
    let Some(callback) = callback else { return };
    match CString::new(arg) {
        Ok(carg) => callback(w, carg.as_ptr()),
        Err(_) => log::error!("dropping page message with interior NUL"),
    }
}

/// Box a view and wire the page-message forwarding callback to the stable
/// heap address of the wrapper.
fn wrap_view(view: View) -> *mut Webview {
    let dispatch = view.dispatch_handle();
    let mut boxed = Box::new(Webview {
        view,
        dispatch,
        external_invoke: None,
        userdata: std::ptr::null_mut(),
    });
    let ptr: *mut Webview = &mut *boxed;
    boxed
        .view
        .add_callback(move |_, arg| forward_external_invoke(ptr, arg));
    Box::into_raw(boxed)
}

unsafe fn string_arg(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Copy `s` into a caller-supplied buffer, truncating with NUL termination.
unsafe fn copy_out(dst: *mut c_char, dstsz: usize, s: &str) {
    if dst.is_null() || dstsz == 0 {
        return;
    }
    let bytes = s.as_bytes();
    let n = bytes.len().min(dstsz - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, dst, n);
    *dst.add(n) = 0;
}

/// Create a view handle. Never runs the loop; follow with `webview_init`.
#[no_mangle]
pub extern "C" fn webview_new(
    title: *const c_char,
    url: *const c_char,
    width: c_int,
    height: c_int,
    resizable: c_int,
    debug: c_int,
) -> *mut Webview {
    let config = ViewConfig {
        title: unsafe { string_arg(title) },
        url: unsafe { string_arg(url) },
        width: width.max(0) as u32,
        height: height.max(0) as u32,
        resizable: resizable != 0,
        debug: debug != 0,
    };
    wrap_view(View::new(config))
}

/// Open the native window. Returns 0 on success.
#[no_mangle]
pub extern "C" fn webview_init(w: *mut Webview) -> c_int {
    if w.is_null() {
        return -1;
    }
    match unsafe { &mut (*w).view }.open() {
        Ok(()) => 0,
        Err(e) => {
            log::error!("webview_init: {}", e);
            -1
        }
    }
}

/// Relay one loop iteration. Returns 0 to continue, 1 once termination was
/// requested, -1 on error.
#[no_mangle]
pub extern "C" fn webview_loop(w: *mut Webview, blocking: c_int) -> c_int {
    if w.is_null() {
        return -1;
    }
    match unsafe { &mut (*w).view }.step(blocking != 0) {
        Ok(LoopStatus::Continue) => 0,
        Ok(LoopStatus::Exit) => 1,
        Err(e) => {
            log::error!("webview_loop: {}", e);
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn webview_eval(w: *mut Webview, js: *const c_char) -> c_int {
    if w.is_null() || js.is_null() {
        return -1;
    }
    let js = unsafe { string_arg(js) };
    match unsafe { &mut (*w).view }.eval(&js) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("webview_eval: {}", e);
            -1
        }
    }
}

/// Escape `css`, wrap it into the injection helper and evaluate it. The
/// input is treated as raw bytes; it does not have to be valid UTF-8.
#[no_mangle]
pub extern "C" fn webview_inject_css(w: *mut Webview, css: *const c_char) -> c_int {
    if w.is_null() || css.is_null() {
        return -1;
    }
    let script = css_inject_script(unsafe { CStr::from_ptr(css) }.to_bytes());
    match unsafe { &mut (*w).view }.eval(&script) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("webview_inject_css: {}", e);
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn webview_set_title(w: *mut Webview, title: *const c_char) {
    if w.is_null() {
        return;
    }
    let title = unsafe { string_arg(title) };
    unsafe { &mut (*w).view }.set_title(&title);
}

#[no_mangle]
pub extern "C" fn webview_set_fullscreen(w: *mut Webview, fullscreen: c_int) {
    if w.is_null() {
        return;
    }
    unsafe { &mut (*w).view }.set_fullscreen(fullscreen != 0);
}

#[no_mangle]
pub extern "C" fn webview_set_color(w: *mut Webview, r: u8, g: u8, b: u8, a: u8) {
    if w.is_null() {
        return;
    }
    unsafe { &mut (*w).view }.set_color(crate::config::Rgba::new(r, g, b, a));
}

/// Present a modal dialog; the result is copied into `result` with
/// NUL-terminated truncation at `resultsz`.
#[no_mangle]
pub extern "C" fn webview_dialog(
    w: *mut Webview,
    dlgtype: c_int,
    flags: c_int,
    title: *const c_char,
    arg: *const c_char,
    result: *mut c_char,
    resultsz: usize,
) {
    if w.is_null() {
        return;
    }
    let Some(kind) = DialogKind::from_raw(dlgtype) else {
        log::error!("webview_dialog: unknown dialog type {}", dlgtype);
        return;
    };
    let flags = DialogFlags::from_bits_truncate(flags as u32);
    let title = unsafe { string_arg(title) };
    let arg = unsafe { string_arg(arg) };
    match unsafe { &mut (*w).view }.dialog(kind, flags, &title, &arg) {
        Ok(answer) => unsafe { copy_out(result, resultsz, &answer) },
        Err(e) => {
            log::error!("webview_dialog: {}", e);
            unsafe { copy_out(result, resultsz, "") };
        }
    }
}

/// Schedule `func` to run on the loop thread. Safe to call from any thread;
/// this is the only cross-thread entry point of the ABI.
#[no_mangle]
pub extern "C" fn webview_dispatch(w: *mut Webview, func: Option<DispatchFn>, arg: *mut c_void) {
    if w.is_null() {
        return;
    }
    let Some(func) = func else { return };
    let handle = unsafe { (*w).dispatch.clone() };
    let wptr = SendPtr(w);
    let aptr = SendPtr(arg);
    handle.dispatch(move |_| {
        // Capture the whole `SendPtr` wrappers (not their raw fields) so the
        // closure stays `Send`.
        let wptr = wptr;
        let aptr = aptr;
        func(wptr.0, aptr.0)
    });
}

/// Request cooperative termination; observed by the next loop iteration.
/// Safe to call from any thread.
#[no_mangle]
pub extern "C" fn webview_terminate(w: *mut Webview) {
    if w.is_null() {
        return;
    }
    unsafe { (*w).dispatch.clone() }.terminate();
}

/// Tear down the native window. The handle stays valid until
/// `webview_free`.
#[no_mangle]
pub extern "C" fn webview_exit(w: *mut Webview) {
    if w.is_null() {
        return;
    }
    unsafe { &mut (*w).view }.exit();
}

#[no_mangle]
pub extern "C" fn webview_set_external_invoke(w: *mut Webview, callback: Option<ExternalInvokeFn>) {
    if w.is_null() {
        return;
    }
    unsafe { (*w).external_invoke = callback };
}

#[no_mangle]
pub extern "C" fn webview_set_userdata(w: *mut Webview, userdata: *mut c_void) {
    if w.is_null() {
        return;
    }
    unsafe { (*w).userdata = userdata };
}

#[no_mangle]
pub extern "C" fn webview_get_userdata(w: *mut Webview) -> *mut c_void {
    if w.is_null() {
        return std::ptr::null_mut();
    }
    unsafe { (*w).userdata }
}

/// Forward a preformatted message to the log sink.
#[no_mangle]
pub extern "C" fn webview_debug(msg: *const c_char) {
    if msg.is_null() {
        return;
    }
    log::debug!(target: "webview", "{}", unsafe { string_arg(msg) });
}

/// Release a handle created by `webview_new`.
#[no_mangle]
pub extern "C" fn webview_free(w: *mut Webview) {
    if !w.is_null() {
        unsafe {
            let _ = Box::from_raw(w);
        }
    }
}

/// One-shot convenience call: run a window to completion.
#[no_mangle]
pub extern "C" fn webview(
    title: *const c_char,
    url: *const c_char,
    width: c_int,
    height: c_int,
    resizable: c_int,
) -> c_int {
    let w = webview_new(title, url, width, height, resizable, 0);
    let r = webview_init(w);
    if r != 0 {
        webview_free(w);
        return r;
    }
    while webview_loop(w, 1) == 0 {}
    webview_exit(w);
    webview_free(w);
    0
}
