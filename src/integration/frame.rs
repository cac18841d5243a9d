//! Video frames and the trait for pulling them from a source.

use ndarray::Array3;

/// An owned video frame in HWC layout (height, width, channels).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    /// Wrap an image in height, width, channel order.
    pub fn new(pixels: Array3<u8>) -> Self {
        Self { pixels }
    }

    /// Create a zero-filled frame, mostly useful for tests and placeholders.
    pub fn blank(width: u32, height: u32, channels: u32) -> Self {
        Self::new(Array3::zeros((height as usize, width as usize, channels as usize)))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    /// Number of color channels.
    pub fn channels(&self) -> u32 {
        self.pixels.dim().2 as u32
    }

    /// Pixel data in height, width, channel order.
    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    /// Mutable pixel data, for renderers that draw in place.
    pub fn pixels_mut(&mut self) -> &mut Array3<u8> {
        &mut self.pixels
    }

    /// Raw bytes in row-major order, if the backing array is contiguous.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.pixels.as_slice()
    }
}

/// Trait for anything that yields frames one at a time (video file, camera,
/// window capture).
pub trait FrameSource {
    /// Error type for read failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the next frame. `Ok(None)` signals end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;

    /// Release the underlying device or file handle. Called once when the
    /// pipeline reaches a terminal state.
    fn release(&mut self) {}
}

/// Adapts any frame iterator into a [`FrameSource`] that never fails.
pub struct IterFrameSource<I> {
    frames: I,
}

impl<I: Iterator<Item = Frame>> IterFrameSource<I> {
    /// Serve the frames of `frames` in order.
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Frame>> FrameSource for IterFrameSource<I> {
    type Error = std::convert::Infallible;

    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        Ok(self.frames.next())
    }
}
