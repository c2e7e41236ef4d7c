use crate::vehicle::VehicleType;

/// Default number of leading text lines that must contain an FMT record
pub const DEFAULT_TEXT_LOOKBACK_LINES: usize = 100;
/// Default number of leading binary frames that must contain an FMT record
pub const DEFAULT_BINARY_LOOKBACK_FRAMES: usize = 20;

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub text_lookback_lines: usize,
    pub binary_lookback_frames: usize,
    /// Skip payload bytes up to the declared frame length after decoding.
    /// Off by default: real logs expect the next frame to start right after
    /// the last decoded column.
    pub honor_declared_length: bool,
    /// Seed the session vehicle family instead of waiting for detection
    pub vehicle: Option<VehicleType>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            text_lookback_lines: DEFAULT_TEXT_LOOKBACK_LINES,
            binary_lookback_frames: DEFAULT_BINARY_LOOKBACK_FRAMES,
            honor_declared_length: false,
            vehicle: None,
        }
    }
}
