use engine::{InputTag, INPUT_TAG_COUNT};

#[derive(Debug, Clone, Copy)]
pub(crate) struct HoldTimers {
    elapsed: [f32; INPUT_TAG_COUNT],
    threshold: f32,
}

impl HoldTimers {
    pub(crate) fn new(threshold: f32) -> Self {
        Self {
            elapsed: [0.0; INPUT_TAG_COUNT],
            threshold,
        }
    }

    pub(crate) fn accumulate(&mut self, tag: InputTag, dt_seconds: f32) {
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            self.elapsed[tag.index()] += dt_seconds;
        }
    }

    pub(crate) fn reset(&mut self, tag: InputTag) {
        self.elapsed[tag.index()] = 0.0;
    }

    pub(crate) fn elapsed(&self, tag: InputTag) -> f32 {
        self.elapsed[tag.index()]
    }

    pub(crate) fn threshold(&self) -> f32 {
        self.threshold
    }

    /// A hold lasting exactly the threshold still counts as a tap.
    pub(crate) fn is_tap(&self, tag: InputTag) -> bool {
        self.elapsed(tag) <= self.threshold
    }
}
