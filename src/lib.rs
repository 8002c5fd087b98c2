//! 2D FDTD electromagnetic solver core on a Yee grid, with vacuum-scattered-
//! field extraction.
//!
//! This crate is the engine: the Yee update, the absorbing border, the
//! driven sources, the vacuum co-simulator, the Poynting accumulator, and the
//! geometry painter. Everything outside `lib.rs` is plain Rust with no wasm
//! dependency; `lib.rs` is where the wasm-bindgen boundary lives, keeping
//! `#[wasm_bindgen]` out of the inner modules.
//!
//! Compiled to WebAssembly for browser-based simulation.

mod border;
mod domain;
mod error;
mod grid;
mod shapes;
mod sources;
mod susceptibility;

use wasm_bindgen::prelude::*;

pub use domain::{Domain, DomainConfig, Polarization, MINOR_STEPS, SPEED_OF_LIGHT};
pub use error::{SimError, SimResult};
pub use grid::{Grid, Real};
pub use shapes::paint_shape;
pub use sources::{
    evaluate_oscillator, gaussian_pulse, is_source_active, modulated_gaussian,
    paint_line_oscillator, paint_phased_point_oscillators, paint_point_oscillators,
    FrequencyComponent, Probe, SpectrumAnalyzer,
};
pub use susceptibility::{susceptibility, MaterialPreset};

/// Initialize the Wasm module (call once at startup).
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get library version string.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get WebAssembly memory for zero-copy array access. JavaScript can create
/// `Float32Array` views over this memory using the `*_ptr`/`*_len` pairs
/// below.
#[wasm_bindgen]
pub fn get_wasm_memory() -> JsValue {
    wasm_bindgen::memory()
}

/// wasm-bindgen boundary around [`Domain`]. Owns one `Domain`, translates JS
/// call conventions (plain numbers, flat slices backed by `Float32Array`)
/// into `DomainConfig`/`SimError` at construction, and exposes pointer/length
/// pairs for each field grid so JS can build zero-copy typed-array views
/// instead of copying field data across the boundary every frame.
#[wasm_bindgen]
pub struct FdtdSimulation {
    domain: Domain,
}

#[wasm_bindgen]
impl FdtdSimulation {
    /// Build a domain of `width` x `height` cells at the given pixel
    /// spacing and polarization (`"z"`, `"xy"`, or `"xyz"`). Everything else
    /// takes the defaults from `DomainConfig::default`; use the `set_*`
    /// methods below to configure sources and amplitudes before stepping.
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: usize,
        height: usize,
        dx: Real,
        polarization: &str,
    ) -> Result<FdtdSimulation, JsValue> {
        let mode = Polarization::parse(polarization).map_err(to_js_error)?;
        let config = DomainConfig {
            nx: width,
            ny: height,
            dx,
            polarization: mode,
            ..DomainConfig::default()
        };
        let domain = Domain::new(&config).map_err(to_js_error)?;
        Ok(FdtdSimulation { domain })
    }

    #[wasm_bindgen(js_name = getWidth)]
    pub fn get_width(&self) -> usize {
        self.domain.nx()
    }

    #[wasm_bindgen(js_name = getHeight)]
    pub fn get_height(&self) -> usize {
        self.domain.ny()
    }

    #[wasm_bindgen(js_name = getTime)]
    pub fn get_time(&self) -> Real {
        self.domain.time()
    }

    #[wasm_bindgen(js_name = getFrameCount)]
    pub fn get_frame_count(&self) -> u32 {
        self.domain.iframe() as u32
    }

    /// Override the per-axis forcing amplitudes. Call before the first
    /// `step`.
    #[wasm_bindgen(js_name = setForcingAmplitudes)]
    pub fn set_forcing_amplitudes(&mut self, x: Real, y: Real, z: Real) {
        self.domain.set_amplitudes(x, y, z);
    }

    /// Override the primary drive frequency and cycle count. Call before
    /// the first `step`; `e_damping` bakes the frequency in at coefficient
    /// build.
    #[wasm_bindgen(js_name = setPrimaryFrequency)]
    pub fn set_primary_frequency(&mut self, frequency: Real, cycles: i32) {
        self.domain.set_primary_frequency(frequency, cycles);
    }

    /// Paint a shape by name (`"circle"`, `"rectangle"`, `"rotated_rectangle"`,
    /// `"lens"`, `"dish"`, `"edge"`, `"gradient"`, `"ripple"`, `"wave_packet"`,
    /// `"cavity"`) with a flat parameter tuple, consumed in fixed-size groups
    /// as documented per-shape. Errors on an unrecognized shape name.
    #[wasm_bindgen(js_name = paintShape)]
    pub fn paint_shape(&mut self, name: &str, params: &[Real]) -> Result<(), JsValue> {
        let dx = self.domain.dx();
        let (epsilon, loss) = self.domain.epsilon_and_loss_mut();
        crate::shapes::paint_shape(name, epsilon, loss, dx, params).map_err(|e| JsValue::from_str(&e))
    }

    /// Place zero or more `(strength, x, y)` point oscillators into the
    /// in-phase forcing mask.
    #[wasm_bindgen(js_name = paintPointOscillators)]
    pub fn paint_point_oscillators(&mut self, params: &[Real]) {
        let dx = self.domain.dx();
        crate::sources::paint_point_oscillators(self.domain.forcing_i_mut(), dx, params);
    }

    /// Paint a single row oscillator (a plane-wave-like line source) into
    /// the in-phase forcing mask, tapered across its width by a
    /// Gaussian-like 4th-power envelope.
    #[wasm_bindgen(js_name = paintLineOscillator)]
    pub fn paint_line_oscillator(&mut self, row: usize, strength: Real, relative_width: Real) {
        crate::sources::paint_line_oscillator(
            self.domain.forcing_i_mut(),
            row,
            strength,
            relative_width,
        );
    }

    /// Advance one inner timestep (E from the previous B, then B from the
    /// newly-advanced E).
    #[wasm_bindgen]
    pub fn step(&mut self) {
        self.domain.step();
    }

    /// Advance one frame: `MINOR_STEPS` inner timesteps plus a Poynting
    /// accumulation pass.
    #[wasm_bindgen(js_name = runFrame)]
    pub fn run_frame(&mut self) {
        self.domain.run_frame();
    }

    /// Recompute the epsilon-edge mask from the current permittivity field.
    #[wasm_bindgen(js_name = findBoundaries)]
    pub fn find_boundaries(&mut self) {
        self.domain.find_boundaries();
    }

    #[wasm_bindgen(js_name = getEzPtr)]
    pub fn get_ez_ptr(&self) -> *const Real {
        self.domain
            .ez()
            .map(|g| g.as_slice().as_ptr())
            .unwrap_or(std::ptr::null())
    }

    #[wasm_bindgen(js_name = getExPtr)]
    pub fn get_ex_ptr(&self) -> *const Real {
        self.domain
            .ex()
            .map(|g| g.as_slice().as_ptr())
            .unwrap_or(std::ptr::null())
    }

    #[wasm_bindgen(js_name = getEyPtr)]
    pub fn get_ey_ptr(&self) -> *const Real {
        self.domain
            .ey()
            .map(|g| g.as_slice().as_ptr())
            .unwrap_or(std::ptr::null())
    }

    #[wasm_bindgen(js_name = getPoyntingXPtr)]
    pub fn get_poynting_x_ptr(&self) -> *const Real {
        self.domain.poynting_x().as_slice().as_ptr()
    }

    #[wasm_bindgen(js_name = getPoyntingYPtr)]
    pub fn get_poynting_y_ptr(&self) -> *const Real {
        self.domain.poynting_y().as_slice().as_ptr()
    }

    #[wasm_bindgen(js_name = getBoundariesPtr)]
    pub fn get_boundaries_ptr(&self) -> *const Real {
        self.domain.boundaries().as_slice().as_ptr()
    }

    /// Length, in elements, of every pointer above — all field grids share
    /// one `(nx, ny)` for a given domain.
    #[wasm_bindgen(js_name = getFieldLen)]
    pub fn get_field_len(&self) -> usize {
        self.domain.nx() * self.domain.ny()
    }
}

fn to_js_error(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
