//! Driven sources
//!
//! The oscillator model that drives the I/Q forcing scalars each substep,
//! and the three source-placement primitives from the configuration table
//! (`line_oscillator`, `point_oscillator`, `phased_point_oscillator`) that
//! paint the per-cell `forcingI`/`forcingQ` masks those scalars multiply.
//!
//! Also retained from the teacher's `sources.rs`: [`Probe`] for recording a
//! time series at a point, and [`SpectrumAnalyzer`] (FFT-based, via
//! `rustfft`) for turning that time series into a frequency spectrum — used
//! here to check the two-peak multi-tone scenario from the testable
//! properties.

use crate::grid::{Grid, Real};
use std::f32::consts::PI;

/// One term of a multi-tone source: `amplitude * sin/cos(2*pi*(frequency*t + phase))`.
///
/// Grounded on `mw_frame.c`'s `frequencies` vector, consumed in groups of
/// three `(frequency, amplitude, phase)`. `phase` is in cycles (a fraction
/// of 2*pi), matching the C source's direct use inside the `sin`/`cos`
/// argument — unlike `phased_point_oscillator`'s `phase`, which is degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyComponent {
    pub frequency: Real,
    pub amplitude: Real,
    pub phase_cycles: Real,
}

/// Parse a flat `frequencies` vector into `(f, a, phase)` triples. Leftover
/// elements that don't complete a triple are dropped.
pub fn parse_frequency_components(raw: &[Real]) -> Vec<FrequencyComponent> {
    raw.chunks_exact(3)
        .map(|c| FrequencyComponent {
            frequency: c[0],
            amplitude: c[1],
            phase_cycles: c[2],
        })
        .collect()
}

/// Whether the source is still active at `time`: `time * f0 < cycles`.
pub fn is_source_active(time: Real, primary_frequency: Real, cycles: i32) -> bool {
    time * primary_frequency < cycles as Real
}

/// Evaluate the oscillator's in-phase and quadrature components at `time`.
///
/// With no configured frequency list, this is a single tone at
/// `primary_frequency`. Otherwise it is the sum over `frequencies`.
pub fn evaluate_oscillator(
    time: Real,
    primary_frequency: Real,
    frequencies: &[FrequencyComponent],
) -> (Real, Real) {
    if frequencies.is_empty() {
        let phase = 2.0 * PI * primary_frequency * time;
        (phase.sin(), phase.cos())
    } else {
        let mut osc_i = 0.0;
        let mut osc_q = 0.0;
        for fc in frequencies {
            let arg = 2.0 * PI * (time * fc.frequency + fc.phase_cycles);
            osc_i += fc.amplitude * arg.sin();
            osc_q += fc.amplitude * arg.cos();
        }
        (osc_i, osc_q)
    }
}

/// Paint a line oscillator: a Gaussian-windowed row of in-phase forcing,
/// centered horizontally, at the given row.
///
/// Grounded on `mw_start.c`'s `line_oscillator` handling: `strength` scales
/// the whole row, `relative_width` controls how fast the window decays
/// (`width_factor` in the spec's shape table naming).
pub fn paint_line_oscillator(forcing_i: &mut Grid, row: usize, strength: Real, relative_width: Real) {
    if row >= forcing_i.ny() {
        return;
    }
    let nx = forcing_i.nx() as Real;
    for k in 0..forcing_i.nx() {
        let arg = (k as Real - nx / 2.0) * 2.0 / (relative_width * nx);
        forcing_i.set(row, k, strength * (-(arg.powi(4))).exp());
    }
}

/// Paint zero or more point oscillators: groups of `(strength, x, y)` in
/// physical coordinates, converted to pixels the same way shapes are.
/// A later point at the same cell overwrites an earlier one, matching the
/// C source's plain assignment (not accumulation).
pub fn paint_point_oscillators(forcing_i: &mut Grid, dx: Real, params: &[Real]) {
    let nx = forcing_i.nx() as Real;
    let ny = forcing_i.ny() as Real;
    let mut rest = params;
    while rest.len() > 2 {
        let strength = rest[0];
        let x0 = rest[1] / dx + nx / 2.0;
        let y0 = rest[2] / dx + ny / 2.0;
        if x0 > 0.0 && x0 < nx - 1.0 && y0 > 0.0 && y0 < ny - 1.0 {
            forcing_i.set(y0 as usize, x0 as usize, strength);
        }
        rest = &rest[3..];
    }
}

/// Paint zero or more phased point oscillators: groups of
/// `(strength, x, y, phase_deg)`. Splits `strength` into in-phase and
/// quadrature components via the phase angle, for coherent beam steering
/// across several oscillators sharing one primary frequency.
pub fn paint_phased_point_oscillators(
    forcing_i: &mut Grid,
    forcing_q: &mut Grid,
    dx: Real,
    params: &[Real],
) {
    let nx = forcing_i.nx() as Real;
    let ny = forcing_i.ny() as Real;
    let mut rest = params;
    while rest.len() > 3 {
        let strength = rest[0];
        let x0 = rest[1] / dx + nx / 2.0;
        let y0 = rest[2] / dx + ny / 2.0;
        let phase = PI * rest[3] / 180.0;
        if x0 > 0.0 && x0 < nx - 1.0 && y0 > 0.0 && y0 < ny - 1.0 {
            let (j, i) = (y0 as usize, x0 as usize);
            forcing_i.set(j, i, strength * phase.cos());
            forcing_q.set(j, i, strength * phase.sin());
        }
        rest = &rest[4..];
    }
}

/// A Gaussian pulse envelope, peaking at `t0` with width `tau`.
pub fn gaussian_pulse(t: Real, t0: Real, tau: Real) -> Real {
    let arg = (t - t0) / tau;
    (-arg * arg).exp()
}

/// A Gaussian-enveloped sinusoidal carrier.
pub fn modulated_gaussian(t: Real, frequency: Real, t0: Real, tau: Real) -> Real {
    gaussian_pulse(t, t0, tau) * (2.0 * PI * frequency * t).sin()
}

/// Records a time series of a field value at one grid cell.
pub struct Probe {
    x: usize,
    y: usize,
    buffer: Vec<Real>,
    write_pos: usize,
    capacity: usize,
}

impl Probe {
    pub fn new(x: usize, y: usize, buffer_size: usize) -> Probe {
        Probe {
            x,
            y,
            buffer: vec![0.0; buffer_size.max(1)],
            write_pos: 0,
            capacity: buffer_size.max(1),
        }
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn set_position(&mut self, x: usize, y: usize) {
        self.x = x;
        self.y = y;
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Record the current value of `field` at the probe's position.
    pub fn record(&mut self, field: &Grid) {
        if self.x < field.nx() && self.y < field.ny() {
            self.buffer[self.write_pos] = field.get(self.y, self.x);
            self.write_pos = (self.write_pos + 1) % self.capacity;
        }
    }

    pub fn buffer(&self) -> &[Real] {
        &self.buffer
    }

    pub fn current_value(&self) -> Real {
        let prev = if self.write_pos == 0 {
            self.capacity - 1
        } else {
            self.write_pos - 1
        };
        self.buffer[prev]
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// FFT-based spectrum analyzer with a Hann window, used to validate
/// multi-tone sources in tests (see `domain::tests::multi_tone_two_peaks`).
pub struct SpectrumAnalyzer {
    size: usize,
    window: Vec<Real>,
    spectrum: Vec<Real>,
    scratch: Vec<rustfft::num_complex::Complex<Real>>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> SpectrumAnalyzer {
        let size = size.next_power_of_two().max(2);
        let mut window = vec![0.0; size];
        for (i, w) in window.iter_mut().enumerate() {
            *w = 0.5 * (1.0 - (2.0 * PI * i as Real / (size - 1) as Real).cos());
        }
        SpectrumAnalyzer {
            size,
            window,
            spectrum: vec![0.0; size / 2],
            scratch: vec![rustfft::num_complex::Complex::new(0.0, 0.0); size],
        }
    }

    pub fn spectrum_size(&self) -> usize {
        self.size / 2
    }

    /// Compute the magnitude spectrum (linear, not dB) of `samples`.
    pub fn compute(&mut self, samples: &[Real]) -> &[Real] {
        let n = self.size.min(samples.len());
        for i in 0..self.size {
            self.scratch[i] = if i < n {
                rustfft::num_complex::Complex::new(samples[i] * self.window[i], 0.0)
            } else {
                rustfft::num_complex::Complex::new(0.0, 0.0)
            };
        }
        let mut planner = rustfft::FftPlanner::new();
        let fft = planner.plan_fft_forward(self.size);
        fft.process(&mut self.scratch);

        let scale = 1.0 / (self.size as Real).sqrt();
        for i in 0..self.size / 2 {
            self.spectrum[i] = self.scratch[i].norm() * scale;
        }
        &self.spectrum
    }

    pub fn bin_to_frequency(&self, bin: usize, sample_rate: Real) -> Real {
        bin as Real * sample_rate / self.size as Real
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tone_oscillator_matches_sin_cos() {
        let (i, q) = evaluate_oscillator(0.25, 1.0, &[]);
        assert!((i - (2.0 * PI * 0.25).sin()).abs() < 1e-6);
        assert!((q - (2.0 * PI * 0.25).cos()).abs() < 1e-6);
    }

    #[test]
    fn source_shuts_off_after_cycles() {
        assert!(is_source_active(9.9, 1.0, 10));
        assert!(!is_source_active(10.1, 1.0, 10));
    }

    #[test]
    fn parse_frequency_components_drops_incomplete_tail() {
        let comps = parse_frequency_components(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].frequency, 1.0);
    }

    #[test]
    fn point_oscillator_sets_single_cell() {
        let mut forcing = Grid::new(10, 10, 0.0).unwrap();
        paint_point_oscillators(&mut forcing, 1.0, &[2.5, 0.0, 0.0]);
        assert_eq!(forcing.get(5, 5), 2.5);
    }

    #[test]
    fn phased_point_splits_into_iq() {
        let mut fi = Grid::new(10, 10, 0.0).unwrap();
        let mut fq = Grid::new(10, 10, 0.0).unwrap();
        paint_phased_point_oscillators(&mut fi, &mut fq, 1.0, &[1.0, 0.0, 0.0, 90.0]);
        assert!(fi.get(5, 5).abs() < 1e-5);
        assert!((fq.get(5, 5) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn probe_records_latest_value() {
        let mut probe = Probe::new(2, 2, 4);
        let mut field = Grid::new(5, 5, 0.0).unwrap();
        field.set(2, 2, 0.7);
        probe.record(&field);
        assert!((probe.current_value() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn spectrum_analyzer_peaks_at_tone_frequency() {
        let mut analyzer = SpectrumAnalyzer::new(64);
        let samples: Vec<Real> = (0..64)
            .map(|n| (2.0 * PI * 0.1 * n as Real).sin())
            .collect();
        let spectrum = analyzer.compute(&samples).to_vec();
        let (peak_bin, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        let peak_freq = analyzer.bin_to_frequency(peak_bin, 1.0);
        assert!((peak_freq - 0.1).abs() < 0.03);
    }
}
