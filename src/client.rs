use crate::error::BackendError;

/// The external speech-to-text collaborator.
///
/// Implementations own connection/session lifecycle, transport, and timeout
/// policy; this crate only hands them a finished container and an optional
/// language hint. The client is injected into
/// [`Transcriber`](crate::transcriber::Transcriber) as a capability rather
/// than reached through ambient state, so tests can substitute a fake and
/// exercise the whole pipeline without a live backend.
pub trait InferenceClient {
    /// Transcribe one container worth of audio.
    ///
    /// `language_hint` is a caller-supplied code such as `"en"`; `None` lets
    /// the backend auto-detect. Any backend-side failure, including a model
    /// error the backend reports as text, surfaces as a [`BackendError`]
    /// with a human-readable message.
    fn transcribe(
        &self,
        container: &[u8],
        language_hint: Option<&str>,
    ) -> Result<String, BackendError>;
}
