use std::fmt;

use crate::controller::Stage;

type Listener = Box<dyn FnMut(Stage)>;

/// Invalidation notifier with suspend/resume batching.
///
/// While suspended, dispatches are folded into one pending notification carrying the
/// earliest dirty stage; it fires once when the outermost `resume` is reached.
#[derive(Default)]
pub struct SignalDispatcher {
    suspended: usize,
    pending: Option<Stage>,
    dispatched: u64,
    listener: Option<Listener>,
}

impl fmt::Debug for SignalDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalDispatcher")
            .field("suspended", &self.suspended)
            .field("pending", &self.pending)
            .field("dispatched", &self.dispatched)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl SignalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the callback invoked on every delivered notification.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(Stage) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub const fn suspend(&mut self) {
        self.suspended += 1;
    }

    /// Leaves one suspension level, delivering the folded notification at the outermost.
    pub fn resume(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended == 0
            && let Some(stage) = self.pending.take()
        {
            self.deliver(stage);
        }
    }

    pub fn dispatch(&mut self, stage: Stage) {
        if self.suspended > 0 {
            self.pending = Some(self.pending.map_or(stage, |pending| pending.min(stage)));
            return;
        }
        self.deliver(stage);
    }

    pub const fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    /// Number of notifications delivered so far.
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    fn deliver(&mut self, stage: Stage) {
        self.dispatched += 1;
        tracing::trace!(?stage, "invalidation dispatched");
        if let Some(listener) = self.listener.as_mut() {
            listener(stage);
        }
    }
}
