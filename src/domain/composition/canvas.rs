//! Output canvas and its two vertical segments

use std::fmt;
use std::str::FromStr;

use crate::domain::error::CanvasParseError;
use crate::domain::geometry::Size;
use crate::domain::recording::StreamId;

pub const DEFAULT_CANVAS_WIDTH: u32 = 1080;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1920;
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Stream whose audio track is kept in the output
pub const PRIMARY_AUDIO_STREAM: StreamId = StreamId::Front;

/// Layers are drawn in this order, later ones on top
pub const DRAW_ORDER: [StreamId; 2] = [StreamId::Back, StreamId::Front];

/// Output render size and frame rate.
/// Dimensions are positive and even so that 4:2:0 chroma subsampling works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    frame_rate: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> Result<Self, CanvasParseError> {
        let input = format!("{}x{}@{}", width, height, frame_rate);
        let invalid = |reason: &str| CanvasParseError {
            input: input.clone(),
            reason: reason.to_string(),
        };

        if width == 0 || height == 0 {
            return Err(invalid("Width and height must be positive."));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(invalid("Width and height must be even."));
        }
        // Each segment is half the height and must stay even as well
        if (height / 2) % 2 != 0 {
            return Err(invalid("Height must be divisible by 4."));
        }
        if frame_rate == 0 || frame_rate > 240 {
            return Err(invalid("Frame rate must be between 1 and 240."));
        }

        Ok(Self {
            width,
            height,
            frame_rate,
        })
    }

    pub fn with_frame_rate(self, frame_rate: u32) -> Result<Self, CanvasParseError> {
        Self::new(self.width, self.height, frame_rate)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Every segment spans the full width and half the height
    pub fn segment_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height / 2))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl FromStr for Canvas {
    type Err = CanvasParseError;

    /// Parse `WxH` (e.g. `1080x1920`) at the default frame rate
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CanvasParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let normalized = s.trim().to_lowercase();
        let (w, h) = normalized
            .split_once('x')
            .ok_or_else(|| invalid("Expected format WxH (e.g., 1080x1920)."))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| invalid("Width is not a number."))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| invalid("Height is not a number."))?;

        Self::new(width, height, DEFAULT_FRAME_RATE).map_err(|e| CanvasParseError {
            input: s.to_string(),
            reason: e.reason,
        })
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Canvas region a stream is drawn into.
/// The canvas origin is bottom-left, so the top segment starts at half height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Top,
    Bottom,
}

impl Segment {
    /// Fixed assignment: front fills the bottom, back fills the top
    pub const fn for_stream(stream: StreamId) -> Self {
        match stream {
            StreamId::Front => Self::Bottom,
            StreamId::Back => Self::Top,
        }
    }

    pub fn destination_offset(&self, canvas: &Canvas) -> f64 {
        match self {
            Self::Top => f64::from(canvas.height() / 2),
            Self::Bottom => 0.0,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_canvas() {
        let canvas = Canvas::default();
        assert_eq!(canvas.width(), 1080);
        assert_eq!(canvas.height(), 1920);
        assert_eq!(canvas.frame_rate(), 30);
        assert_eq!(canvas.segment_size(), Size::new(1080.0, 960.0));
        assert_eq!(canvas.to_string(), "1080x1920");
    }

    #[test]
    fn parse_canvas() {
        let canvas: Canvas = "720x1280".parse().unwrap();
        assert_eq!(canvas.width(), 720);
        assert_eq!(canvas.height(), 1280);
        assert_eq!(canvas.frame_rate(), DEFAULT_FRAME_RATE);

        let canvas: Canvas = " 1080X1920 ".parse().unwrap();
        assert_eq!(canvas, Canvas::default());
    }

    #[test]
    fn parse_rejects_invalid() {
        for input in ["", "1080", "x1920", "1080x", "axb", "0x1920", "1081x1920", "1080x1922", "-2x4"] {
            assert!(input.parse::<Canvas>().is_err(), "{input} should fail");
        }
    }

    #[test]
    fn parse_error_keeps_input() {
        let err = "1081x1920".parse::<Canvas>().unwrap_err();
        assert_eq!(err.input, "1081x1920");
        assert!(err.reason.contains("even"));
    }

    #[test]
    fn frame_rate_bounds() {
        assert!(Canvas::default().with_frame_rate(0).is_err());
        assert!(Canvas::default().with_frame_rate(241).is_err());
        assert_eq!(Canvas::default().with_frame_rate(60).unwrap().frame_rate(), 60);
    }

    #[test]
    fn fixed_segment_assignment() {
        assert_eq!(Segment::for_stream(StreamId::Front), Segment::Bottom);
        assert_eq!(Segment::for_stream(StreamId::Back), Segment::Top);
        assert_eq!(PRIMARY_AUDIO_STREAM, StreamId::Front);
        assert_eq!(DRAW_ORDER, [StreamId::Back, StreamId::Front]);
    }

    #[test]
    fn destination_offsets() {
        let canvas = Canvas::default();
        assert_eq!(Segment::Top.destination_offset(&canvas), 960.0);
        assert_eq!(Segment::Bottom.destination_offset(&canvas), 0.0);
    }
}
