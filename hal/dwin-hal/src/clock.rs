//! Monotonic time source

/// Millisecond clock
///
/// Wraps at `u32::MAX`; callers compare instants with `wrapping_sub`.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u32;

    /// Milliseconds elapsed since `since`
    fn elapsed_since(&self, since: u32) -> u32 {
        self.now_ms().wrapping_sub(since)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
