use std::time::Duration;

use wb_core::DEFAULT_PAIR_TEXT;

/// Capacity of both the persistence and the signal queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 3;

pub const DEFAULT_INITIAL_PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning knobs for the live pipeline.
///
/// By default a target whose write failed stays registered until its own
/// reader notices the close.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Bound of the persistence and signal queues. A full queue blocks the
    /// producer.
    pub queue_capacity: usize,

    /// Upper bound for a single fan-out write. `None` waits on the transport.
    ///
    /// Broadcast passes and new-connection admissions share one gate, so an
    /// unbounded write to a stalled target holds up every other pass.
    pub send_timeout: Option<Duration>,

    /// Bound on a new connection's initial state push when `send_timeout`
    /// is `None`.
    pub initial_push_timeout: Duration,

    /// Initial content of the shared paired-text buffer.
    pub welcome_text: String,

    /// Drop a connection from the registry as soon as a broadcast write to it
    /// fails, instead of waiting for its reader to see the close.
    pub deregister_on_send_failure: bool,

    /// Deregister and close a broadcast connection that sends an invalid
    /// thread. When off, its reader just stops.
    pub deregister_on_invalid_thread: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout: None,
            initial_push_timeout: DEFAULT_INITIAL_PUSH_TIMEOUT,
            welcome_text: DEFAULT_PAIR_TEXT.to_string(),
            deregister_on_send_failure: false,
            deregister_on_invalid_thread: false,
        }
    }
}
