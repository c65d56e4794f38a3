//! Libretro Engine Adapter
//!
//! Loads a libretro core (`<core_dir>/<core_lib>_libretro.<so|dylib>`) with
//! `dlopen` and drives it through the [`Engine`] interface:
//!
//! | Engine call       | libretro                                    |
//! |-------------------|---------------------------------------------|
//! | construct         | `retro_init` + `retro_load_game`            |
//! | `configure`       | merge core variables, flag them as updated  |
//! | `step`            | `retro_run`                                 |
//! | `capture_frame`   | copy the last software framebuffer          |
//! | `release`         | `retro_unload_game` + `retro_deinit` + `dlclose` |
//!
//! Frontend callbacks carry no user data, so the frontend state is a process
//! global. Only one core can be loaded at a time.

use crate::engine::{BoxError, Engine, EngineFactory};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core variable selecting the N64 graphics plugin
pub const N64_GFXPLUGIN_VARIABLE: &str = "parallel-n64-gfxplugin";

/// Environment override for [`N64_GFXPLUGIN_VARIABLE`]
pub const N64_GFXPLUGIN_ENV: &str = "STABLE_RETRO_PARALLEL_N64_GFXPLUGIN";

/// Environment toggle for hardware rendering
pub const HW_RENDER_ENV: &str = "STABLE_RETRO_HW_RENDER";

const DEFAULT_N64_GFXPLUGIN: &str = "angrylion";

/// Errors loading or driving a libretro core
#[derive(Debug, Error)]
pub enum LibretroError {
    #[error("libretro cores can only be loaded on unix platforms")]
    Unsupported,

    #[error("failed to load core {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    #[error("core {} does not export {symbol}", path.display())]
    MissingSymbol { path: PathBuf, symbol: String },

    #[error("core {} implements libretro API {found}, expected {expected}", path.display())]
    ApiVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("another libretro core is already loaded")]
    AlreadyLoaded,

    #[error("failed to read content {}: {source}", path.display())]
    ReadContent {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("core rejected content {}", path.display())]
    LoadGame { path: PathBuf },

    #[error("invalid string for the core: {0:?}")]
    InvalidString(String),
}

/// Core variables applied to every engine: the N64 graphics plugin, taken from
/// the environment when set.
pub fn default_variables() -> BTreeMap<String, String> {
    let plugin = std::env::var(N64_GFXPLUGIN_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_N64_GFXPLUGIN.to_string());
    BTreeMap::from([(N64_GFXPLUGIN_VARIABLE.to_string(), plugin)])
}

/// Builds [`LibretroEngine`]s from a directory of cores
#[derive(Debug, Clone)]
pub struct LibretroFactory {
    core_dir: PathBuf,
}

impl LibretroFactory {
    pub fn new(core_dir: impl Into<PathBuf>) -> Self {
        Self {
            core_dir: core_dir.into(),
        }
    }

    /// Shared library implementing `core_lib`
    pub fn library_path(&self, core_lib: &str) -> PathBuf {
        let ext = if cfg!(target_os = "macos") {
            "dylib"
        } else {
            "so"
        };
        self.core_dir.join(format!("{core_lib}_libretro.{ext}"))
    }
}

impl EngineFactory for LibretroFactory {
    fn construct(&self, core_lib: &str, content_path: &Path) -> Result<Box<dyn Engine>, BoxError> {
        let library = self.library_path(core_lib);
        tracing::debug!(core_lib, library = %library.display(), content = %content_path.display(), "loading core");
        let engine = LibretroEngine::load(&library, &self.core_dir, content_path)?;
        Ok(Box::new(engine))
    }
}

#[cfg(unix)]
pub use self::unix::LibretroEngine;

#[cfg(not(unix))]
pub use self::unsupported::LibretroEngine;

#[cfg(unix)]
mod unix {
    use super::{LibretroError, default_variables};
    use crate::engine::{AuxDescriptor, BoxError, Engine, Frame};
    use std::collections::BTreeMap;
    use std::ffi::{CStr, CString, c_char, c_uint, c_void};
    use std::os::unix::ffi::OsStrExt;
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, MutexGuard};

    const RETRO_API_VERSION: c_uint = 1;

    const ENV_SET_ROTATION: c_uint = 1;
    const ENV_GET_CAN_DUPE: c_uint = 3;
    const ENV_GET_SYSTEM_DIRECTORY: c_uint = 9;
    const ENV_SET_PIXEL_FORMAT: c_uint = 10;
    const ENV_GET_VARIABLE: c_uint = 15;
    const ENV_GET_VARIABLE_UPDATE: c_uint = 17;
    const ENV_GET_LOG_INTERFACE: c_uint = 27;

    const PIXEL_FORMAT_0RGB1555: c_uint = 0;
    const PIXEL_FORMAT_XRGB8888: c_uint = 1;
    const PIXEL_FORMAT_RGB565: c_uint = 2;

    /// `RETRO_HW_FRAME_BUFFER_VALID`: the frame lives on the GPU.
    const HW_FRAME: *const c_void = usize::MAX as *const c_void;

    #[repr(C)]
    struct RetroGameInfo {
        path: *const c_char,
        data: *const c_void,
        size: usize,
        meta: *const c_char,
    }

    #[repr(C)]
    struct RetroVariable {
        key: *const c_char,
        value: *const c_char,
    }

    #[repr(C)]
    struct RetroLogCallback {
        log: extern "C" fn(c_uint, *const c_char),
    }

    type EnvironmentFn = extern "C" fn(c_uint, *mut c_void) -> bool;
    type VideoRefreshFn = extern "C" fn(*const c_void, c_uint, c_uint, usize);
    type AudioSampleFn = extern "C" fn(i16, i16);
    type AudioSampleBatchFn = extern "C" fn(*const i16, usize) -> usize;
    type InputPollFn = extern "C" fn();
    type InputStateFn = extern "C" fn(c_uint, c_uint, c_uint, c_uint) -> i16;

    #[derive(Clone, Copy)]
    struct CoreApi {
        api_version: unsafe extern "C" fn() -> c_uint,
        init: unsafe extern "C" fn(),
        deinit: unsafe extern "C" fn(),
        run: unsafe extern "C" fn(),
        load_game: unsafe extern "C" fn(*const RetroGameInfo) -> bool,
        unload_game: unsafe extern "C" fn(),
        set_environment: unsafe extern "C" fn(EnvironmentFn),
        set_video_refresh: unsafe extern "C" fn(VideoRefreshFn),
        set_audio_sample: unsafe extern "C" fn(AudioSampleFn),
        set_audio_sample_batch: unsafe extern "C" fn(AudioSampleBatchFn),
        set_input_poll: unsafe extern "C" fn(InputPollFn),
        set_input_state: unsafe extern "C" fn(InputStateFn),
    }

    /// Last framebuffer announced by the core
    struct RawFrame {
        data: *const c_void,
        width: u32,
        height: u32,
        pitch: usize,
        hardware: bool,
    }

    struct Frontend {
        variables: BTreeMap<String, CString>,
        variables_updated: bool,
        system_dir: CString,
        bytes_per_pixel: usize,
        frame: RawFrame,
    }

    // SAFETY: the frame pointer is only dereferenced by the engine owning the
    // loaded core, under the FRONTEND lock.
    unsafe impl Send for Frontend {}

    static FRONTEND: Mutex<Option<Frontend>> = Mutex::new(None);

    fn frontend() -> MutexGuard<'static, Option<Frontend>> {
        FRONTEND.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn to_cstring(value: &str) -> Result<CString, LibretroError> {
        CString::new(value).map_err(|_| LibretroError::InvalidString(value.to_string()))
    }

    fn to_variables(
        vars: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, CString>, LibretroError> {
        vars.iter()
            .map(|(k, v)| Ok((k.clone(), to_cstring(v)?)))
            .collect()
    }

    extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
        let mut guard = frontend();
        let Some(state) = guard.as_mut() else {
            return false;
        };
        if data.is_null() {
            return false;
        }

        // SAFETY: `data` points to the type the libretro API defines for `cmd`.
        unsafe {
            match cmd {
                ENV_SET_PIXEL_FORMAT => {
                    state.bytes_per_pixel = match *(data as *const c_uint) {
                        PIXEL_FORMAT_XRGB8888 => 4,
                        PIXEL_FORMAT_RGB565 | PIXEL_FORMAT_0RGB1555 => 2,
                        _ => return false,
                    };
                    true
                }
                ENV_GET_VARIABLE => {
                    let var = &mut *(data as *mut RetroVariable);
                    if var.key.is_null() {
                        return false;
                    }
                    let key = CStr::from_ptr(var.key).to_string_lossy();
                    match state.variables.get(&*key) {
                        Some(value) => {
                            var.value = value.as_ptr();
                            true
                        }
                        None => false,
                    }
                }
                ENV_GET_VARIABLE_UPDATE => {
                    *(data as *mut bool) = std::mem::take(&mut state.variables_updated);
                    true
                }
                ENV_GET_SYSTEM_DIRECTORY => {
                    *(data as *mut *const c_char) = state.system_dir.as_ptr();
                    true
                }
                ENV_GET_CAN_DUPE => {
                    *(data as *mut bool) = true;
                    true
                }
                ENV_GET_LOG_INTERFACE => {
                    (*(data as *mut RetroLogCallback)).log = core_log;
                    true
                }
                ENV_SET_ROTATION => true,
                _ => false,
            }
        }
    }

    // Declared without the variadic tail; only the format string is logged.
    extern "C" fn core_log(level: c_uint, fmt: *const c_char) {
        if fmt.is_null() {
            return;
        }
        // SAFETY: cores pass a NUL-terminated format string.
        let message = unsafe { CStr::from_ptr(fmt) }.to_string_lossy();
        tracing::trace!(level, message = message.trim_end(), "core log");
    }

    extern "C" fn video_refresh(data: *const c_void, width: c_uint, height: c_uint, pitch: usize) {
        let mut guard = frontend();
        let Some(state) = guard.as_mut() else {
            return;
        };
        if data == HW_FRAME {
            state.frame = RawFrame {
                data: std::ptr::null(),
                width,
                height,
                pitch: 0,
                hardware: true,
            };
            return;
        }
        // A null pointer means "duplicate the previous frame".
        if !data.is_null() {
            state.frame = RawFrame {
                data,
                width,
                height,
                pitch,
                hardware: false,
            };
        }
    }

    extern "C" fn audio_sample(_left: i16, _right: i16) {}

    extern "C" fn audio_sample_batch(_data: *const i16, frames: usize) -> usize {
        frames
    }

    extern "C" fn input_poll() {}

    extern "C" fn input_state(_port: c_uint, _device: c_uint, _index: c_uint, _id: c_uint) -> i16 {
        0
    }

    /// A loaded libretro core running one piece of content
    pub struct LibretroEngine {
        library: PathBuf,
        handle: *mut c_void,
        api: Option<CoreApi>,
        initialized: bool,
        game_loaded: bool,
        owns_frontend: bool,
    }

    impl LibretroEngine {
        /// Open `library`, initialize it and load `content_path`.
        pub fn load(
            library: &Path,
            system_dir: &Path,
            content_path: &Path,
        ) -> Result<Self, LibretroError> {
            let path_c = CString::new(library.as_os_str().as_bytes())
                .map_err(|_| LibretroError::InvalidString(library.display().to_string()))?;

            // SAFETY: dlopen with a valid NUL-terminated path.
            let handle = unsafe { libc::dlopen(path_c.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
            if handle.is_null() {
                return Err(LibretroError::Open {
                    path: library.to_path_buf(),
                    message: dl_error(),
                });
            }

            // From here on Drop undoes whatever was set up.
            let mut engine = Self {
                library: library.to_path_buf(),
                handle,
                api: None,
                initialized: false,
                game_loaded: false,
                owns_frontend: false,
            };

            let api = engine.resolve_api()?;
            engine.api = Some(api);

            // SAFETY: symbol signatures follow libretro.h.
            let version = unsafe { (api.api_version)() };
            if version != RETRO_API_VERSION {
                return Err(LibretroError::ApiVersion {
                    path: engine.library.clone(),
                    found: version,
                    expected: RETRO_API_VERSION,
                });
            }

            {
                let mut guard = frontend();
                if guard.is_some() {
                    return Err(LibretroError::AlreadyLoaded);
                }
                *guard = Some(Frontend {
                    variables: to_variables(&default_variables())?,
                    variables_updated: false,
                    system_dir: CString::new(system_dir.as_os_str().as_bytes()).map_err(
                        |_| LibretroError::InvalidString(system_dir.display().to_string()),
                    )?,
                    bytes_per_pixel: 2,
                    frame: RawFrame {
                        data: std::ptr::null(),
                        width: 0,
                        height: 0,
                        pitch: 0,
                        hardware: false,
                    },
                });
                engine.owns_frontend = true;
            }

            // SAFETY: callbacks are valid for the lifetime of the process and
            // the frontend lock is not held while the core runs.
            unsafe {
                (api.set_environment)(environment);
                (api.set_video_refresh)(video_refresh);
                (api.set_audio_sample)(audio_sample);
                (api.set_audio_sample_batch)(audio_sample_batch);
                (api.set_input_poll)(input_poll);
                (api.set_input_state)(input_state);
                (api.init)();
            }
            engine.initialized = true;

            let rom = std::fs::read(content_path).map_err(|source| LibretroError::ReadContent {
                path: content_path.to_path_buf(),
                source,
            })?;
            let content_c = CString::new(content_path.as_os_str().as_bytes())
                .map_err(|_| LibretroError::InvalidString(content_path.display().to_string()))?;
            let info = RetroGameInfo {
                path: content_c.as_ptr(),
                data: rom.as_ptr() as *const c_void,
                size: rom.len(),
                meta: std::ptr::null(),
            };

            // SAFETY: `info` and the buffers it points to outlive the call.
            let loaded = unsafe { (api.load_game)(&info) };
            if !loaded {
                return Err(LibretroError::LoadGame {
                    path: content_path.to_path_buf(),
                });
            }
            engine.game_loaded = true;

            tracing::debug!(library = %engine.library.display(), "core loaded");
            Ok(engine)
        }

        fn resolve_api(&self) -> Result<CoreApi, LibretroError> {
            // SAFETY: every symbol is a libretro entry point with the
            // signature declared in CoreApi.
            unsafe {
                Ok(CoreApi {
                    api_version: self.symbol(c"retro_api_version")?,
                    init: self.symbol(c"retro_init")?,
                    deinit: self.symbol(c"retro_deinit")?,
                    run: self.symbol(c"retro_run")?,
                    load_game: self.symbol(c"retro_load_game")?,
                    unload_game: self.symbol(c"retro_unload_game")?,
                    set_environment: self.symbol(c"retro_set_environment")?,
                    set_video_refresh: self.symbol(c"retro_set_video_refresh")?,
                    set_audio_sample: self.symbol(c"retro_set_audio_sample")?,
                    set_audio_sample_batch: self.symbol(c"retro_set_audio_sample_batch")?,
                    set_input_poll: self.symbol(c"retro_set_input_poll")?,
                    set_input_state: self.symbol(c"retro_set_input_state")?,
                })
            }
        }

        /// # Safety
        ///
        /// `T` must be a function pointer type matching the exported symbol.
        unsafe fn symbol<T: Copy>(&self, name: &CStr) -> Result<T, LibretroError> {
            debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());
            let ptr = unsafe { libc::dlsym(self.handle, name.as_ptr()) };
            if ptr.is_null() {
                return Err(LibretroError::MissingSymbol {
                    path: self.library.clone(),
                    symbol: name.to_string_lossy().into_owned(),
                });
            }
            Ok(unsafe { std::mem::transmute_copy::<*mut c_void, T>(&ptr) })
        }

        fn teardown(&mut self) {
            if let Some(api) = self.api {
                // SAFETY: the core was initialized (and the game loaded) by
                // this engine and nothing else runs it.
                unsafe {
                    if self.game_loaded {
                        (api.unload_game)();
                    }
                    if self.initialized {
                        (api.deinit)();
                    }
                }
            }
            self.game_loaded = false;
            self.initialized = false;
            self.api = None;

            if self.owns_frontend {
                *frontend() = None;
                self.owns_frontend = false;
            }

            if !self.handle.is_null() {
                // SAFETY: handle came from dlopen and no core code runs after this.
                unsafe {
                    libc::dlclose(self.handle);
                }
                self.handle = std::ptr::null_mut();
                tracing::debug!(library = %self.library.display(), "core unloaded");
            }
        }
    }

    fn dl_error() -> String {
        // SAFETY: dlerror returns null or a NUL-terminated thread-local string.
        let err = unsafe { libc::dlerror() };
        if err.is_null() {
            "unknown dlopen error".to_string()
        } else {
            unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
        }
    }

    impl Engine for LibretroEngine {
        fn configure(&mut self, aux: &AuxDescriptor) -> Result<(), BoxError> {
            if aux.variables.is_empty() {
                return Ok(());
            }
            let overrides = to_variables(&aux.variables)?;
            if let Some(state) = frontend().as_mut() {
                state.variables.extend(overrides);
                state.variables_updated = true;
            }
            Ok(())
        }

        fn step(&mut self) -> Result<(), BoxError> {
            let api = self.api.ok_or("core already released")?;
            // SAFETY: the core is loaded; callbacks take the frontend lock
            // themselves, so it is not held here.
            unsafe { (api.run)() };
            Ok(())
        }

        fn capture_frame(&mut self) -> Result<Frame, BoxError> {
            let guard = frontend();
            let Some(state) = guard.as_ref() else {
                return Err("core already released".into());
            };
            let raw = &state.frame;
            if raw.hardware || raw.data.is_null() {
                return Ok(Frame {
                    width: raw.width,
                    height: raw.height,
                    pitch: 0,
                    data: Vec::new(),
                });
            }

            let row = raw.width as usize * state.bytes_per_pixel;
            let pitch = raw.pitch.max(row);
            let len = pitch * raw.height.saturating_sub(1) as usize + row;
            // SAFETY: the core keeps its framebuffer alive between runs; the
            // last row may be shorter than `pitch`.
            let bytes = unsafe { std::slice::from_raw_parts(raw.data as *const u8, len) };
            Ok(Frame {
                width: raw.width,
                height: raw.height,
                pitch,
                data: bytes.to_vec(),
            })
        }

        fn release(&mut self) {
            self.teardown();
        }
    }

    impl Drop for LibretroEngine {
        fn drop(&mut self) {
            self.teardown();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn environment_answers_variables_and_dupe() {
            *frontend() = Some(Frontend {
                variables: to_variables(&BTreeMap::from([(
                    "parallel-n64-gfxplugin".to_string(),
                    "glide64".to_string(),
                )]))
                .unwrap(),
                variables_updated: true,
                system_dir: CString::new("/cores").unwrap(),
                bytes_per_pixel: 2,
                frame: RawFrame {
                    data: std::ptr::null(),
                    width: 0,
                    height: 0,
                    pitch: 0,
                    hardware: false,
                },
            });

            let key = CString::new("parallel-n64-gfxplugin").unwrap();
            let mut var = RetroVariable {
                key: key.as_ptr(),
                value: std::ptr::null(),
            };
            assert!(environment(ENV_GET_VARIABLE, &mut var as *mut _ as *mut c_void));
            let value = unsafe { CStr::from_ptr(var.value) };
            assert_eq!(value.to_str().unwrap(), "glide64");

            let missing = CString::new("unknown").unwrap();
            let mut var = RetroVariable {
                key: missing.as_ptr(),
                value: std::ptr::null(),
            };
            assert!(!environment(ENV_GET_VARIABLE, &mut var as *mut _ as *mut c_void));

            let mut dupe = false;
            assert!(environment(ENV_GET_CAN_DUPE, &mut dupe as *mut _ as *mut c_void));
            assert!(dupe);

            let mut updated = false;
            assert!(environment(ENV_GET_VARIABLE_UPDATE, &mut updated as *mut _ as *mut c_void));
            assert!(updated);
            assert!(environment(ENV_GET_VARIABLE_UPDATE, &mut updated as *mut _ as *mut c_void));
            assert!(!updated);

            let mut format: c_uint = PIXEL_FORMAT_XRGB8888;
            assert!(environment(ENV_SET_PIXEL_FORMAT, &mut format as *mut _ as *mut c_void));
            assert_eq!(frontend().as_ref().map(|s| s.bytes_per_pixel), Some(4));

            *frontend() = None;
            assert!(!environment(ENV_GET_CAN_DUPE, &mut dupe as *mut _ as *mut c_void));
        }

        #[test]
        fn missing_library_fails_to_open() {
            let tmp = tempfile::tempdir().unwrap();
            let err = LibretroEngine::load(
                &tmp.path().join("nothing_libretro.so"),
                tmp.path(),
                &tmp.path().join("rom.nes"),
            )
            .err()
            .unwrap();
            assert!(matches!(err, LibretroError::Open { .. }));
        }
    }
}

#[cfg(not(unix))]
mod unsupported {
    use super::LibretroError;
    use crate::engine::{AuxDescriptor, BoxError, Engine, Frame};
    use std::path::Path;

    /// Placeholder: libretro cores are only loaded on unix.
    pub struct LibretroEngine {
        _private: (),
    }

    impl LibretroEngine {
        pub fn load(
            _library: &Path,
            _system_dir: &Path,
            _content_path: &Path,
        ) -> Result<Self, LibretroError> {
            Err(LibretroError::Unsupported)
        }
    }

    impl Engine for LibretroEngine {
        fn configure(&mut self, _aux: &AuxDescriptor) -> Result<(), BoxError> {
            Err(LibretroError::Unsupported.into())
        }
        fn step(&mut self) -> Result<(), BoxError> {
            Err(LibretroError::Unsupported.into())
        }
        fn capture_frame(&mut self) -> Result<Frame, BoxError> {
            Err(LibretroError::Unsupported.into())
        }
    }
}
