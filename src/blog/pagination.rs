/// One page of an in-memory list.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: usize,
    pub size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn slice(all: Vec<T>, number: usize, size: usize) -> Self {
        let number = number.max(1);
        let size = size.max(1);
        let total = all.len();
        let start = (number - 1).saturating_mul(size);
        let items = all.into_iter().skip(start).take(size).collect();
        Self {
            items,
            number,
            size,
            total,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number.saturating_mul(self.size) < self.total
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.size)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total: self.total,
        }
    }
}

/// Page number from a query parameter; anything unusable means page 1.
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}
