use thiserror::Error;

/// Errors surfaced by coordinator callbacks.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// A frame was processed while the recording state was undefined.
    ///
    /// This is a broken calling contract (drawing before any surface was ever
    /// created), not a runtime condition.
    #[error("unknown recording state: no surface has been created yet")]
    UnknownRecordingState,

    /// A collaborator (GPU pipeline, frame source, encoder, host) reported a failure.
    #[error("{operation} failed")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CoordinatorError {
    pub(crate) fn collaborator(operation: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::Collaborator { operation, source }
    }

    /// Fatal errors must terminate render processing; everything else is left to
    /// the host's surface teardown/recreate cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownRecordingState)
    }
}
