//! Target page size adaptation

/// Smallest number of items requested per page
pub const MIN_PAGE_SIZE: u32 = 75;

/// Factor applied when growing or shrinking the page size
pub const PAGE_SIZE_GROWTH_FACTOR: u32 = 2;

/// Largest page Steam serves
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 5000;

/// Tracks how many items the next request should ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizer {
    current: u32,
    floor: u32,
    max: u32,
}

impl PageSizer {
    /// Create a sizer capped at `max`.
    ///
    /// A cap below [`MIN_PAGE_SIZE`] also lowers the floor to the cap.
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        let floor = MIN_PAGE_SIZE.min(max);
        Self {
            current: floor,
            floor,
            max,
        }
    }

    /// Size of the next request
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Smallest size this sizer will request
    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// Largest size this sizer will request
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether the size cannot shrink any further
    pub fn is_at_floor(&self) -> bool {
        self.current <= self.floor
    }

    /// Grow after a successful request. Returns the new size.
    pub fn grow(&mut self) -> u32 {
        self.current = self
            .current
            .saturating_mul(PAGE_SIZE_GROWTH_FACTOR)
            .min(self.max);
        self.current
    }

    /// Shrink after a failed request.
    ///
    /// Returns `true` when the failed request was already at the floor.
    pub fn shrink(&mut self) -> bool {
        let was_at_floor = self.is_at_floor();
        self.current = (self.current / PAGE_SIZE_GROWTH_FACTOR).max(self.floor);
        was_at_floor
    }
}

impl Default for PageSizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGE_SIZE)
    }
}
