use tracing::debug;

/// OS power-save blocker ("prevent app suspension").
pub trait PowerSaveBlocker {
    fn start(&mut self) -> u32;

    fn stop(&mut self, id: u32);
}

/// Holds a blocker exactly while the player reports playback.
pub struct PowerGuard<B> {
    blocker: B,
    active: Option<u32>,
}

impl<B: PowerSaveBlocker> PowerGuard<B> {
    pub fn new(blocker: B) -> Self {
        Self {
            blocker,
            active: None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_state_change(&mut self, is_playing: bool) {
        if is_playing {
            if self.active.is_none() {
                let id = self.blocker.start();
                debug!("Power save blocker {id} started");
                self.active = Some(id);
            }
        } else {
            self.release();
        }
    }

    /// Called when the system is about to sleep.
    pub fn on_suspend(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.active.take() {
            self.blocker.stop(id);
            debug!("Power save blocker {id} stopped");
        }
    }
}
