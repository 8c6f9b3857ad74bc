use std::thread;
use std::time::Duration;

use rand::Rng;

/// Bounded pauses between driver actions so lazily loaded content can appear.
pub trait Pacer {
    fn pause(&self, min: Duration, max: Duration);
}

/// Sleeps for a uniformly random duration in `[min, max]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JitteredPacer;

impl Pacer for JitteredPacer {
    fn pause(&self, min: Duration, max: Duration) {
        thread::sleep(jittered(min, max, &mut rand::thread_rng()));
    }
}

/// Never sleeps. For replayed content and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPause;

impl Pacer for NoPause {
    fn pause(&self, _min: Duration, _max: Duration) {}
}

pub(crate) fn jittered<R: Rng + ?Sized>(min: Duration, max: Duration, rng: &mut R) -> Duration {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}
