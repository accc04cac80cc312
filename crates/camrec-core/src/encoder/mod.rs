//! Encoder thread and its command handle.
//!
//! [`EncoderHandle`] implements [`Encoder`] by posting [`EncoderMsg`]s onto a
//! `crossbeam-channel` queue. A dedicated thread runs an [`EncoderWorker`] that
//! owns the session and hands frames to a [`VideoSink`], the codec/muxer.

mod worker;

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use anyhow::Result;
use crossbeam_channel::Sender;
use thiserror::Error;

use crate::collab::{Encoder, FrameStamp, TextureHandle};
use crate::target::RecordingTarget;

pub use worker::EncoderWorker;

/// Frame notifications beyond this backlog are dropped instead of queued.
pub const FRAME_BACKLOG: usize = 8;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("encoder thread is gone")]
    Disconnected,

    #[error("failed to spawn encoder thread")]
    Spawn(#[from] io::Error),
}

/// Commands processed in order by the encoder thread.
#[derive(Debug)]
pub enum EncoderMsg<C> {
    Start(RecordingTarget<C>),
    Stop,
    Rebind(C),
    Texture(TextureHandle),
    Frame(FrameStamp),
    Shutdown,
}

/// Codec/muxer backend driven by the encoder thread.
///
/// `C` is the shared GPU context the sink reads frames from.
pub trait VideoSink<C>: Send + 'static {
    /// Opens the destination for a new session.
    fn begin(&mut self, target: &RecordingTarget<C>) -> Result<()>;

    /// The session continues on a new GPU context.
    fn rebind(&mut self, _context: &C) -> Result<()> {
        Ok(())
    }

    fn write_frame(&mut self, context: &C, texture: TextureHandle, frame: &FrameStamp)
    -> Result<()>;

    /// Flushes and closes the destination.
    fn finish(&mut self) -> Result<()>;
}

/// Render-thread side of the encoder.
pub struct EncoderHandle<C: Send + 'static> {
    tx: Sender<EncoderMsg<C>>,
    recording: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl<C: Clone + Send + 'static> EncoderHandle<C> {
    /// Spawns the encoder thread around `sink`.
    pub fn spawn<S: VideoSink<C>>(sink: S) -> Result<Self, EncoderError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let recording = Arc::new(AtomicBool::new(false));

        let worker = EncoderWorker::new(sink, Arc::clone(&recording));
        let thread = std::thread::Builder::new()
            .name("camrec-encoder".to_string())
            .spawn(move || worker.run(rx))?;

        log::debug!("encoder thread started");
        Ok(Self {
            tx,
            recording,
            thread: Some(thread),
        })
    }

    fn post(&self, msg: EncoderMsg<C>) -> Result<(), EncoderError> {
        self.tx.send(msg).map_err(|_| EncoderError::Disconnected)
    }

    /// Stops any session and joins the encoder thread.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        // A dead thread already dropped its receiver; joining still reaps it.
        let _ = self.tx.send(EncoderMsg::Shutdown);
        if thread.join().is_err() {
            log::error!("encoder thread panicked");
        }
        self.recording.store(false, Ordering::Release);
        log::debug!("encoder thread joined");
    }
}

impl<C: Clone + Send + 'static> Encoder for EncoderHandle<C> {
    type Context = C;

    fn is_recording(&self) -> bool {
        // A worker that died mid-session cannot clear the flag itself.
        let alive = self.thread.as_ref().is_some_and(|t| !t.is_finished());
        alive && self.recording.load(Ordering::Acquire)
    }

    fn start_recording(&mut self, target: RecordingTarget<C>) -> Result<()> {
        // Tracked at request time, before posting; the worker clears it if the sink refuses.
        self.recording.store(true, Ordering::Release);
        if let Err(e) = self.post(EncoderMsg::Start(target)) {
            self.recording.store(false, Ordering::Release);
            return Err(e.into());
        }
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<()> {
        self.recording.store(false, Ordering::Release);
        self.post(EncoderMsg::Stop)?;
        Ok(())
    }

    fn rebind_gpu_context(&mut self, context: C) -> Result<()> {
        self.post(EncoderMsg::Rebind(context))?;
        Ok(())
    }

    fn set_texture_handle(&mut self, texture: TextureHandle) -> Result<()> {
        self.post(EncoderMsg::Texture(texture))?;
        Ok(())
    }

    fn notify_frame_available(&mut self, frame: FrameStamp) -> Result<()> {
        if !self.is_recording() {
            return Ok(());
        }
        if self.tx.len() >= FRAME_BACKLOG {
            log::trace!("encoder backlog full; dropping frame {}", frame.sequence);
            return Ok(());
        }
        self.post(EncoderMsg::Frame(frame))?;
        Ok(())
    }
}

impl<C: Send + 'static> Drop for EncoderHandle<C> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.tx.send(EncoderMsg::Shutdown);
            let _ = thread.join();
        }
    }
}
