/// Tuning knobs of a [`Context`](crate::context::Context).
///
/// None of these affect results, only memory use and speed. Zero means
/// "pick automatically" for the sizes that allow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Initial operation-cache capacity in entries.
    pub init_cache_size: usize,
    /// Hard cap on operation-cache entries; reaching it flushes the cache.
    pub max_cache_hard: usize,
    /// Minimum hit ratio (percent) for growing a full cache instead of flushing it.
    pub min_hit: u32,
    /// Initial bucket count of the unique table.
    pub unique_slots: usize,
    /// Upper bound on node-arena bytes.
    pub max_memory: usize,
    pub garbage_collect: bool,
    /// Node population before the first automatic collection.
    pub loose_up_to: usize,
    /// When false, every cache lookup misses.
    pub cache_enabled: bool,
}

impl ContextConfig {
    pub const AUTO_CACHE_SIZE: usize = 1 << 14;
    pub const AUTO_MAX_CACHE_HARD: usize = 1 << 22;
    pub const AUTO_LOOSE_UP_TO: usize = 1 << 16;

    pub fn with_init_cache_size(mut self, entries: usize) -> Self {
        self.init_cache_size = entries;
        self
    }

    pub fn with_max_cache_hard(mut self, entries: usize) -> Self {
        self.max_cache_hard = entries;
        self
    }

    pub fn with_min_hit(mut self, percent: u32) -> Self {
        self.min_hit = percent;
        self
    }

    pub fn with_unique_slots(mut self, slots: usize) -> Self {
        self.unique_slots = slots;
        self
    }

    pub fn with_max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = bytes;
        self
    }

    pub fn with_garbage_collect(mut self, enabled: bool) -> Self {
        self.garbage_collect = enabled;
        self
    }

    pub fn with_loose_up_to(mut self, nodes: usize) -> Self {
        self.loose_up_to = nodes;
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn cache_size(&self) -> usize {
        if self.init_cache_size == 0 {
            Self::AUTO_CACHE_SIZE
        } else {
            self.init_cache_size
        }
    }

    pub fn cache_hard_limit(&self) -> usize {
        if self.max_cache_hard == 0 {
            Self::AUTO_MAX_CACHE_HARD.max(self.cache_size())
        } else {
            self.max_cache_hard
        }
    }

    pub fn loose_threshold(&self) -> usize {
        if self.loose_up_to == 0 {
            Self::AUTO_LOOSE_UP_TO
        } else {
            self.loose_up_to
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            init_cache_size: 0,
            max_cache_hard: 0,
            min_hit: 30,
            unique_slots: 256,
            max_memory: (32u64 << 30).min(usize::MAX as u64) as usize,
            garbage_collect: true,
            loose_up_to: 0,
            cache_enabled: true,
        }
    }
}
