//! This module provides ways to tweak mocked storage backends and calendars, so that they can return errors on some tests

use std::error::Error;

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the storage Backend trait
    pub get_behaviour: (u32, u32),
    pub set_behaviour: (u32, u32),
    pub remove_behaviour: (u32, u32),

    // From the CalendarSync trait
    pub sync_behaviour: (u32, u32),
    pub update_event_behaviour: (u32, u32),
    pub delete_event_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            get_behaviour: (0, n_fails),
            set_behaviour: (0, n_fails),
            remove_behaviour: (0, n_fails),
            sync_behaviour: (0, n_fails),
            update_event_behaviour: (0, n_fails),
            delete_event_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_get(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.get_behaviour, "get")
    }
    pub fn can_set(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.set_behaviour, "set")
    }
    pub fn can_remove(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.remove_behaviour, "remove")
    }
    pub fn can_sync(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.sync_behaviour, "sync")
    }
    pub fn can_update_event(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.update_event_behaviour, "update_event")
    }
    pub fn can_delete_event(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_event_behaviour, "delete_event")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value).into())
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}
