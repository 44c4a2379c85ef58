//! FFI (Foreign Function Interface) bindings for plugin hosts and native
//! frontends.
//!
//! # Memory Management
//!
//! - Rust allocates handles and strings and returns pointers to the caller
//! - The caller MUST release them with `presetconv_registry_free` and
//!   `presetconv_free_string`
//! - Strings are null-terminated UTF-8
//!
//! # Errors
//!
//! Failing calls return null or a negative count and store a message on the
//! handle, readable with `presetconv_last_error` until the next call on the
//! same handle. A handle must not be used from two threads at once.
//!
//! ```c
//! PresetConvRegistry *reg = presetconv_registry_new(1);
//! int loaded = presetconv_load_profiles(reg, "/path/to/profiles");
//! if (presetconv_convert_file(reg, "Pad.h2p", "/tmp/out", "unify") < 0) {
//!     char *err = presetconv_last_error(reg);
//!     /* ... */
//!     presetconv_free_string(err);
//! }
//! presetconv_registry_free(reg);
//! ```

use crate::generators::generator_for;
use crate::operations::convert_file;
use crate::parsers::ParserSet;
use crate::registry::ProfileRegistry;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;

/// Opaque handle owning a profile registry and the parser table.
pub struct PresetConvRegistry {
    registry: ProfileRegistry,
    parsers: ParserSet,
    last_error: Option<String>,
}

impl PresetConvRegistry {
    fn fail(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}

// ============================================================================
// Registry Lifecycle
// ============================================================================

/// Create a registry. Built-in profiles are registered when `load_builtins`
/// is non-zero. Caller MUST call presetconv_registry_free() when done.
#[no_mangle]
pub extern "C" fn presetconv_registry_new(load_builtins: c_int) -> *mut PresetConvRegistry {
    let registry = if load_builtins != 0 {
        ProfileRegistry::with_builtin_profiles()
    } else {
        ProfileRegistry::new()
    };
    Box::into_raw(Box::new(PresetConvRegistry {
        registry,
        parsers: ParserSet::default(),
        last_error: None,
    }))
}

/// Free a registry created by presetconv_registry_new().
#[no_mangle]
pub extern "C" fn presetconv_registry_free(handle: *mut PresetConvRegistry) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle);
        }
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Load every descriptor in `dir`. Returns the number registered, or -1 on
/// invalid arguments. A partial load still returns its count and keeps the
/// most recent per-file failure as the last error.
#[no_mangle]
pub extern "C" fn presetconv_load_profiles(
    handle: *mut PresetConvRegistry,
    dir: *const c_char,
) -> c_int {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return -1;
    };
    let Some(dir) = c_str_arg(dir) else {
        handle.fail("profile directory is null or not UTF-8");
        return -1;
    };

    let count = handle.registry.load_profiles_from_directory(Path::new(dir));
    handle.last_error = handle.registry.last_error().map(str::to_string);
    c_int::try_from(count).unwrap_or(c_int::MAX)
}

/// Number of registered profiles, or -1 for a null handle.
#[no_mangle]
pub extern "C" fn presetconv_profile_count(handle: *const PresetConvRegistry) -> c_int {
    match unsafe { handle.as_ref() } {
        Some(handle) => {
            c_int::try_from(handle.registry.get_profile_count()).unwrap_or(c_int::MAX)
        }
        None => -1,
    }
}

/// Resolve identity hints (either may be null) to a registered plugin id.
/// Returns null when nothing matches.
/// Caller MUST call presetconv_free_string() when done.
#[no_mangle]
pub extern "C" fn presetconv_resolve_plugin_id(
    handle: *mut PresetConvRegistry,
    plugin_id: *const c_char,
    plugin_name: *const c_char,
) -> *mut c_char {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return ptr::null_mut();
    };
    let id = c_str_arg(plugin_id).unwrap_or_default();
    let name = c_str_arg(plugin_name).unwrap_or_default();

    let resolved = handle
        .registry
        .resolve(id, name)
        .map(|found| found.profile.plugin_id.clone());
    match resolved {
        Some(id) => {
            handle.last_error = None;
            string_to_c_char(&id)
        }
        None => {
            handle.fail(format!("No profile matches id {:?} or name {:?}", id, name));
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert `input` into `out_dir` using the `target` generator ("unify" or
/// "raw"). Returns the number of files written, or -1 on failure.
#[no_mangle]
pub extern "C" fn presetconv_convert_file(
    handle: *mut PresetConvRegistry,
    input: *const c_char,
    out_dir: *const c_char,
    target: *const c_char,
) -> c_int {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return -1;
    };
    let (Some(input), Some(out_dir), Some(target)) =
        (c_str_arg(input), c_str_arg(out_dir), c_str_arg(target))
    else {
        handle.fail("input, output directory and target must be non-null UTF-8");
        return -1;
    };

    let result = generator_for(target).and_then(|generator| {
        convert_file(
            Path::new(input),
            &handle.parsers,
            &handle.registry,
            generator.as_ref(),
            Path::new(out_dir),
        )
    });

    match result {
        Ok(written) => {
            handle.last_error = None;
            c_int::try_from(written.len()).unwrap_or(c_int::MAX)
        }
        Err(e) => {
            handle.fail(e.to_string());
            -1
        }
    }
}

// ============================================================================
// Errors and Strings
// ============================================================================

/// Copy of the last error on `handle`, or null if the last call succeeded.
/// Caller MUST call presetconv_free_string() when done.
#[no_mangle]
pub extern "C" fn presetconv_last_error(handle: *const PresetConvRegistry) -> *mut c_char {
    match unsafe { handle.as_ref() }.and_then(|h| h.last_error.as_deref()) {
        Some(message) => string_to_c_char(message),
        None => ptr::null_mut(),
    }
}

/// Free a string returned by FFI functions.
#[no_mangle]
pub extern "C" fn presetconv_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn c_str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn string_to_c_char(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}
