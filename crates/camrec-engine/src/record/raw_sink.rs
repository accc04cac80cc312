use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use camrec_core::encoder::VideoSink;
use camrec_core::{FrameStamp, RecordingTarget, TextureHandle};

use super::readback::read_rgba;
use crate::device::SharedGpuContext;

struct Open {
    out: BufWriter<File>,
    path: PathBuf,
    width: u32,
    height: u32,
    frames: u64,
    size_mismatch_logged: bool,
}

/// Video sink writing uncompressed RGBA8 frames back to back.
///
/// Each frame is read back from the shared texture on the encoder thread.
/// Frames whose size differs from the session's are skipped. Bitrate is
/// ignored.
#[derive(Default)]
pub struct RawVideoSink {
    open: Option<Open>,
    scratch: Vec<u8>,
}

impl RawVideoSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoSink<SharedGpuContext> for RawVideoSink {
    fn begin(&mut self, target: &RecordingTarget<SharedGpuContext>) -> Result<()> {
        let path = target.destination().to_path_buf();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        log::info!(
            "raw sink: {}x{} rgba8 @ {} fps -> {} (from {})",
            target.width(),
            target.height(),
            target.frame_rate(),
            path.display(),
            target.shared_context().id()
        );
        self.open = Some(Open {
            out: BufWriter::new(file),
            path,
            width: target.width(),
            height: target.height(),
            frames: 0,
            size_mismatch_logged: false,
        });
        Ok(())
    }

    fn rebind(&mut self, context: &SharedGpuContext) -> Result<()> {
        log::debug!("raw sink now reading from {}", context.id());
        Ok(())
    }

    fn write_frame(
        &mut self,
        context: &SharedGpuContext,
        texture: TextureHandle,
        frame: &FrameStamp,
    ) -> Result<()> {
        let Some(open) = self.open.as_mut() else {
            return Ok(());
        };
        let Some(entry) = context.textures().get(texture) else {
            log::trace!("{texture} gone from {}; frame {} skipped", context.id(), frame.sequence);
            return Ok(());
        };
        if (entry.width, entry.height) != (open.width, open.height) {
            if !open.size_mismatch_logged {
                log::warn!(
                    "frame size {}x{} differs from session {}x{}; skipping such frames",
                    entry.width,
                    entry.height,
                    open.width,
                    open.height
                );
                open.size_mismatch_logged = true;
            }
            return Ok(());
        }

        self.scratch.clear();
        read_rgba(
            context.device(),
            context.queue(),
            &entry.texture,
            entry.width,
            entry.height,
            &mut self.scratch,
        )?;
        open.out
            .write_all(&self.scratch)
            .with_context(|| format!("failed to write {}", open.path.display()))?;
        open.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut open) = self.open.take() else {
            return Ok(());
        };
        open.out
            .flush()
            .with_context(|| format!("failed to flush {}", open.path.display()))?;
        log::info!("raw sink: {} frames in {}", open.frames, open.path.display());
        Ok(())
    }
}
