//! Simulator configuration and initial interrupt state.

/// T-states in one 48K Spectrum frame.
pub const DEFAULT_FRAME_DURATION: u32 = 69_888;

/// T-states the interrupt line stays asserted at the start of a frame.
pub const DEFAULT_INTERRUPT_WINDOW: u32 = 32;

/// Simulator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Replace `DJNZ $` with a handler that runs the whole loop at once.
    pub fast_djnz: bool,
    /// Replace LDIR/LDDR with handlers that run the whole copy at once.
    pub fast_ldir: bool,
    /// Length of a video frame in T-states. HALT releases and maskable
    /// interrupts fire on frame boundaries.
    pub frame_duration: u32,
    /// How long the interrupt line is held at the start of each frame.
    pub interrupt_window: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fast_djnz: false,
            fast_ldir: false,
            frame_duration: DEFAULT_FRAME_DURATION,
            interrupt_window: DEFAULT_INTERRUPT_WINDOW,
        }
    }
}

impl Config {
    /// Frame duration, never zero.
    #[must_use]
    pub fn frame(&self) -> u64 {
        u64::from(self.frame_duration.max(1))
    }
}

/// Interrupt and timing state at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InitialState {
    /// Interrupt mode. Values above 2 are clamped to 2.
    pub im: u8,
    /// Interrupt-enable latch.
    pub iff: bool,
    /// Starting T-state count.
    pub tstates: u64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            im: 1,
            iff: false,
            tstates: 0,
        }
    }
}
