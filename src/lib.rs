#![forbid(unsafe_code)]

pub mod error;
pub mod matrix;
pub mod pipeline;
pub mod pixfmt;
pub mod stream;
pub mod warp;

pub use error::{FramewarpError, FramewarpResult};
pub use pixfmt::PixelFormat;
pub use stream::{FrameStream, StreamHeader};
pub use warp::Warp;
