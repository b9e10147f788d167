/// Identifies one initialization request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// Monotonic generation counter guarding asynchronous initializations.
///
/// Each request captures `begin()`; a result is applied only while its
/// generation is still the latest one, so a slow response never clobbers the
/// outcome of a newer request.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: u64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Generation {
        self.latest += 1;
        Generation(self.latest)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.latest && self.latest > 0
    }

    /// Invalidates every outstanding generation without starting a new request.
    pub fn cancel(&mut self) {
        self.latest += 1;
    }
}
