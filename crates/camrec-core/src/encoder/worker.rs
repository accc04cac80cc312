use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Receiver;

use super::{EncoderMsg, VideoSink};
use crate::collab::{FrameStamp, TextureHandle};
use crate::target::RecordingTarget;

struct Session<C> {
    context: C,
    destination: PathBuf,
    frames: u64,
    last_sequence: u64,
}

/// Encoder-thread state: at most one session, plus the latest texture identity.
pub struct EncoderWorker<C, S> {
    sink: S,
    recording: Arc<AtomicBool>,
    session: Option<Session<C>>,
    texture: Option<TextureHandle>,
}

impl<C, S: VideoSink<C>> EncoderWorker<C, S> {
    pub fn new(sink: S, recording: Arc<AtomicBool>) -> Self {
        Self {
            sink,
            recording,
            session: None,
            texture: None,
        }
    }

    pub fn is_in_session(&self) -> bool {
        self.session.is_some()
    }

    /// Drains `rx` until shutdown or until every sender is gone.
    pub fn run(mut self, rx: Receiver<EncoderMsg<C>>) {
        while let Ok(msg) = rx.recv() {
            if !self.handle(msg) {
                break;
            }
        }
        self.end_session();
        log::debug!("encoder thread exiting");
    }

    /// Processes one message. Returns `false` on shutdown.
    pub fn handle(&mut self, msg: EncoderMsg<C>) -> bool {
        match msg {
            EncoderMsg::Start(target) => self.start(target),
            EncoderMsg::Stop => self.end_session(),
            EncoderMsg::Rebind(context) => self.rebind(context),
            EncoderMsg::Texture(texture) => self.texture = Some(texture),
            EncoderMsg::Frame(frame) => self.frame(&frame),
            EncoderMsg::Shutdown => return false,
        }
        true
    }

    fn start(&mut self, target: RecordingTarget<C>) {
        if let Some(session) = &self.session {
            log::warn!(
                "start ignored; already recording to {}",
                session.destination.display()
            );
            return;
        }

        if let Err(e) = self.sink.begin(&target) {
            log::error!("encoder failed to begin {}: {e:#}", target.destination().display());
            self.recording.store(false, Ordering::Release);
            return;
        }

        let destination = target.destination().to_path_buf();
        log::info!("encoder session started: {}", destination.display());
        self.session = Some(Session {
            context: target.into_shared_context(),
            destination,
            frames: 0,
            last_sequence: 0,
        });
    }

    fn rebind(&mut self, context: C) {
        let Some(session) = self.session.as_mut() else {
            log::warn!("rebind without an active session");
            return;
        };
        if let Err(e) = self.sink.rebind(&context) {
            log::error!("encoder failed to rebind: {e:#}");
            self.end_session();
            self.recording.store(false, Ordering::Release);
            return;
        }
        log::debug!("encoder rebound to new gpu context");
        session.context = context;
        // Sequence numbering restarts with the new frame source.
        session.last_sequence = 0;
    }

    fn frame(&mut self, frame: &FrameStamp) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(texture) = self.texture else {
            log::trace!("frame before any texture handle; dropped");
            return;
        };
        // Nothing latched yet, or the same frame redrawn.
        if frame.sequence == 0 || frame.sequence == session.last_sequence {
            return;
        }

        match self.sink.write_frame(&session.context, texture, frame) {
            Ok(()) => {
                session.frames += 1;
                session.last_sequence = frame.sequence;
            }
            Err(e) => {
                log::error!("encoder write failed; ending session: {e:#}");
                self.end_session();
                self.recording.store(false, Ordering::Release);
            }
        }
    }

    fn end_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match self.sink.finish() {
            Ok(()) => log::info!(
                "encoder session finished: {} ({} frames)",
                session.destination.display(),
                session.frames
            ),
            Err(e) => log::error!(
                "encoder failed to finish {}: {e:#}",
                session.destination.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{RecordingSink, SinkEvent};
    use super::*;

    fn worker(sink: &RecordingSink) -> (EncoderWorker<u32, RecordingSink>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (EncoderWorker::new(sink.clone(), Arc::clone(&flag)), flag)
    }

    fn start(ctx: u32, name: &str) -> EncoderMsg<u32> {
        EncoderMsg::Start(RecordingTarget::new(
            PathBuf::from(name),
            (320, 240),
            30,
            1_000_000,
            ctx,
        ))
    }

    fn frame(sequence: u64) -> EncoderMsg<u32> {
        EncoderMsg::Frame(FrameStamp { sequence, ..Default::default() })
    }

    #[test]
    fn second_start_is_ignored_while_in_session() {
        let sink = RecordingSink::default();
        let (mut w, _) = worker(&sink);
        w.handle(start(1, "a"));
        w.handle(start(1, "b"));
        assert_eq!(
            sink.events(),
            vec![SinkEvent::Begin { destination: "a".into(), context: 1 }]
        );
    }

    #[test]
    fn duplicate_and_empty_frames_are_skipped() {
        let sink = RecordingSink::default();
        let (mut w, _) = worker(&sink);
        w.handle(EncoderMsg::Texture(TextureHandle(2)));
        w.handle(start(1, "a"));
        for seq in [0, 1, 1, 1, 2] {
            w.handle(frame(seq));
        }
        let frames = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, SinkEvent::Frame { .. }))
            .count();
        assert_eq!(frames, 2);
    }

    #[test]
    fn frame_before_texture_is_dropped() {
        let sink = RecordingSink::default();
        let (mut w, _) = worker(&sink);
        w.handle(start(1, "a"));
        w.handle(frame(1));
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn begin_failure_clears_flag() {
        let sink = RecordingSink { fail_begin: true, ..Default::default() };
        let (mut w, flag) = worker(&sink);
        flag.store(true, Ordering::Release);
        w.handle(start(1, "a"));
        assert!(!w.is_in_session());
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn write_failure_ends_session() {
        let sink = RecordingSink { fail_write: true, ..Default::default() };
        let (mut w, flag) = worker(&sink);
        flag.store(true, Ordering::Release);
        w.handle(EncoderMsg::Texture(TextureHandle(2)));
        w.handle(start(1, "a"));
        w.handle(frame(1));
        assert!(!w.is_in_session());
        assert!(!flag.load(Ordering::Acquire));
        assert_eq!(sink.events().last(), Some(&SinkEvent::Finish));
    }

    #[test]
    fn rebind_without_session_is_ignored() {
        let sink = RecordingSink::default();
        let (mut w, _) = worker(&sink);
        assert!(w.handle(EncoderMsg::Rebind(4)));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn rebind_restarts_sequence_tracking() {
        let sink = RecordingSink::default();
        let (mut w, _) = worker(&sink);
        w.handle(EncoderMsg::Texture(TextureHandle(2)));
        w.handle(start(1, "a"));
        w.handle(frame(1));
        w.handle(EncoderMsg::Rebind(2));
        w.handle(frame(1));
        assert_eq!(
            sink.events().last(),
            Some(&SinkEvent::Frame { context: 2, texture: TextureHandle(2), sequence: 1 })
        );
    }

    #[test]
    fn shutdown_message_stops_the_loop() {
        let sink = RecordingSink::default();
        let (mut w, _) = worker(&sink);
        assert!(!w.handle(EncoderMsg::Shutdown));
    }

    #[test]
    fn run_finishes_open_session_when_senders_drop() {
        let sink = RecordingSink::default();
        let (w, _) = worker(&sink);
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(start(1, "a")).unwrap();
        drop(tx);
        w.run(rx);
        assert_eq!(sink.events().last(), Some(&SinkEvent::Finish));
    }
}
