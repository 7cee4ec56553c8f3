//! Single-pole IIR low-pass / high-pass filters.
//!
//! Both filters are *block-reset*: every invocation starts from the first
//! sample of the window it is given, with no state carried over from the
//! previous block. Turning this into a persistent streaming filter changes
//! the output characteristics of the analyzer display.

use std::f32::consts::PI;
use std::fmt;

/// Cutoff floor in Hz. Adjustments never go below this.
pub const MIN_CUTOFF_HZ: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    None,
    LowPass,
    HighPass,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterKind::None => "None",
            FilterKind::LowPass => "Low-Pass",
            FilterKind::HighPass => "High-Pass",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub kind: FilterKind,
    pub cutoff_hz: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: FilterKind::None,
            cutoff_hz: 1000.0,
        }
    }
}

impl FilterConfig {
    pub fn new(kind: FilterKind, cutoff_hz: f32) -> Self {
        Self {
            kind,
            cutoff_hz: cutoff_hz.max(MIN_CUTOFF_HZ),
        }
    }

    /// Sets the cutoff, clamped into `[MIN_CUTOFF_HZ, nyquist - 1]`.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: u32) {
        let ceiling = (sample_rate as f32 / 2.0 - 1.0).max(MIN_CUTOFF_HZ);
        self.cutoff_hz = if cutoff_hz.is_nan() {
            MIN_CUTOFF_HZ
        } else {
            cutoff_hz.clamp(MIN_CUTOFF_HZ, ceiling)
        };
    }

    pub fn adjust_cutoff(&mut self, delta_hz: f32, sample_rate: u32) {
        self.set_cutoff(self.cutoff_hz + delta_hz, sample_rate);
    }

    /// Bin index separating passband from stopband for an `n`-point transform.
    pub fn cutoff_index(&self, sample_rate: u32, n: usize) -> usize {
        ((self.cutoff_hz / sample_rate as f32) * n as f32).floor() as usize
    }

    /// Applies the selected filter in place. `None` leaves the window untouched.
    pub fn apply(&self, window: &mut [f32], sample_rate: u32) {
        match self.kind {
            FilterKind::None => {}
            FilterKind::LowPass => block_reset_low_pass(window, self.cutoff_hz, sample_rate),
            FilterKind::HighPass => block_reset_high_pass(window, self.cutoff_hz, sample_rate),
        }
    }
}

/// Whether bin `i` lies inside the passband of `kind` with the given cutoff bin.
pub fn in_passband(kind: FilterKind, i: usize, cutoff_index: usize) -> bool {
    match kind {
        FilterKind::None => true,
        FilterKind::LowPass => i <= cutoff_index,
        FilterKind::HighPass => i >= cutoff_index,
    }
}

/// Passband predicate over bin indices of an `n`-point transform.
pub fn cutoff_passband(filter: &FilterConfig, sample_rate: u32, n: usize) -> impl Fn(usize) -> bool {
    let kind = filter.kind;
    let cutoff_index = filter.cutoff_index(sample_rate, n);
    move |i| in_passband(kind, i, cutoff_index)
}

fn rc_dt(cutoff_hz: f32, sample_rate: u32) -> (f32, f32) {
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let dt = 1.0 / sample_rate as f32;
    (rc, dt)
}

/// `y[i] = y[i-1] + α·(x[i] − y[i-1])`, `y[0] = x[0]`.
pub fn block_reset_low_pass(window: &mut [f32], cutoff_hz: f32, sample_rate: u32) {
    let (rc, dt) = rc_dt(cutoff_hz, sample_rate);
    let alpha = dt / (rc + dt);

    let Some(&first) = window.first() else {
        return;
    };
    let mut y = first;
    for x in window.iter_mut().skip(1) {
        y += alpha * (*x - y);
        *x = y;
    }
}

/// `y[i] = α·(y[i-1] + x[i] − x[i-1])`, `y[0] = x[0]`.
pub fn block_reset_high_pass(window: &mut [f32], cutoff_hz: f32, sample_rate: u32) {
    let (rc, dt) = rc_dt(cutoff_hz, sample_rate);
    let alpha = rc / (rc + dt);

    let Some(&first) = window.first() else {
        return;
    };
    let mut prev_x = first;
    let mut y = first;
    for x in window.iter_mut().skip(1) {
        let input = *x;
        y = alpha * (y + input - prev_x);
        prev_x = input;
        *x = y;
    }
}
