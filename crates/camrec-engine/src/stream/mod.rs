//! Camera frame streaming into GPU textures.

mod feed;
mod texture;

pub use feed::{CameraFrame, FrameFeed, FrameWaker};
pub use texture::StreamTexture;
