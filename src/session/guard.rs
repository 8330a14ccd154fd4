use super::{lock_core, Core, Phase, Recording};
use crate::types::SessionSnapshot;
use std::sync::Mutex;
use tokio::sync::{watch, Notify};

/// Clears the busy flag when the device call it covers ends, however it ends.
///
/// A dropped `shutter()` future leaves the session Arming; the guard puts it
/// back to Idle and publishes that, so the next intent is not refused forever
/// and subscribers do not keep showing a start that never happened.
pub(super) struct BusyGuard<'a> {
    core: &'a Mutex<Core>,
    idle: &'a Notify,
    snapshots: &'a watch::Sender<SessionSnapshot>,
}

impl<'a> BusyGuard<'a> {
    pub(super) fn new(
        core: &'a Mutex<Core>,
        idle: &'a Notify,
        snapshots: &'a watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            core,
            idle,
            snapshots,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let reverted = {
            let mut core = lock_core(self.core);
            core.busy = false;
            if matches!(core.phase, Phase::Live(Recording::Arming)) {
                log::warn!("Recording start was cancelled before the device confirmed it");
                core.phase = Phase::Live(Recording::Idle);
                Some(core.snapshot(None))
            } else {
                None
            }
        };
        if let Some(snapshot) = reverted {
            self.snapshots.send_replace(snapshot);
        }
        self.idle.notify_waiters();
    }
}

/// Releases the flash/lens control slot once the device call ends.
pub(super) struct ControlGuard<'a> {
    core: &'a Mutex<Core>,
}

impl<'a> ControlGuard<'a> {
    pub(super) fn new(core: &'a Mutex<Core>) -> Self {
        Self { core }
    }
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        lock_core(self.core).controls_busy = false;
    }
}
