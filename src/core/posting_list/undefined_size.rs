/// Size carried by an undefined posting list.
///
/// `Unknown` is its own variant instead of a numeric maximum, so adding
/// further sizes to it can never overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndefinedSize {
    /// Approximate number of entry ids, kept when counting is enabled.
    Counted(u64),
    /// Size not tracked: treat as "all entries".
    Unknown,
}

impl Default for UndefinedSize {
    fn default() -> Self {
        UndefinedSize::Counted(0)
    }
}

impl UndefinedSize {
    pub fn add(self, n: u64) -> Self {
        match self {
            UndefinedSize::Counted(size) => UndefinedSize::Counted(size.saturating_add(n)),
            UndefinedSize::Unknown => UndefinedSize::Unknown,
        }
    }

    pub fn combine(self, other: UndefinedSize) -> Self {
        match other {
            UndefinedSize::Counted(size) => self.add(size),
            UndefinedSize::Unknown => UndefinedSize::Unknown,
        }
    }

    pub fn counted(&self) -> Option<u64> {
        match self {
            UndefinedSize::Counted(size) => Some(*size),
            UndefinedSize::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, UndefinedSize::Unknown)
    }
}

impl std::fmt::Display for UndefinedSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndefinedSize::Counted(size) => write!(f, "~{}", size),
            UndefinedSize::Unknown => write!(f, "unknown"),
        }
    }
}
