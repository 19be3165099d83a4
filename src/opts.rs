/// Default segment duration ceiling in seconds.
///
/// Stays under the ~30-second input cap common to hosted transcription
/// backends, with headroom for container overhead.
pub const DEFAULT_MAX_CHUNK_SECONDS: f64 = 29.0;

/// Options that control how a transcription is performed.
///
/// This struct represents *library-level configuration*, not CLI flags
/// directly. Frontends (CLIs, services, tests) map user input into this type
/// so the pipeline stays reusable outside any one binary.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Optional language hint (e.g. `"en"`, `"es"`) forwarded to the backend
    /// with every segment.
    ///
    /// When `None`, the backend auto-detects the spoken language.
    pub language: Option<String>,

    /// Maximum duration of a single dispatched segment, in seconds.
    ///
    /// Recordings above this are split into frame-aligned segments.
    pub max_chunk_seconds: f64,

    /// Dispatch split segments over a worker pool instead of one at a time.
    ///
    /// The transcript order is partition order either way; this only changes
    /// how many requests are in flight at once.
    pub enable_parallel_dispatch: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            language: None,
            max_chunk_seconds: DEFAULT_MAX_CHUNK_SECONDS,
            enable_parallel_dispatch: false,
        }
    }
}
