use crate::VirtAddr;

/// Whether a [`Segment`] is handed out to a caller or available for reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Returned by an allocation and not released yet.
    Allocated,
    /// A hole that allocations can be carved out of.
    Free,
}

impl SegmentKind {
    /// Single letter tag used by the stats listing: `P` for process memory,
    /// `H` for a hole.
    pub const fn tag(self) -> char {
        match self {
            Self::Allocated => 'P',
            Self::Free => 'H',
        }
    }
}

/// Contiguous run of virtual address space inside one page.
///
/// The segments of a page are chained in address order and tile it exactly:
///
/// ```text
///  page base                                              page base + PAGE_SIZE
///  +----------------+-----------+-------------------------+
///  |   Allocated    |   Free    |        Allocated        |
///  +----------------+-----------+-------------------------+
///  ^ offset         ^ offset    ^ offset
/// ```
///
/// `offset` is the virtual address of the first byte and is what callers get
/// back from an allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Segment {
    pub kind: SegmentKind,
    /// Length in bytes.
    pub size: usize,
    pub offset: VirtAddr,
}

impl Segment {
    pub const fn allocated(offset: VirtAddr, size: usize) -> Self {
        Self {
            kind: SegmentKind::Allocated,
            size,
            offset,
        }
    }

    pub const fn free(offset: VirtAddr, size: usize) -> Self {
        Self {
            kind: SegmentKind::Free,
            size,
            offset,
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.kind == SegmentKind::Free
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.kind == SegmentKind::Allocated
    }

    /// First virtual address past the segment.
    #[inline]
    pub fn end(&self) -> VirtAddr {
        VirtAddr(self.offset.0 + self.size)
    }

    #[inline]
    pub fn contains(&self, addr: VirtAddr) -> bool {
        self.offset <= addr && addr < self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let segment = Segment::allocated(VirtAddr(1000), 100);

        assert!(!segment.contains(VirtAddr(999)));
        assert!(segment.contains(VirtAddr(1000)));
        assert!(segment.contains(VirtAddr(1099)));
        assert!(!segment.contains(VirtAddr(1100)));
        assert_eq!(segment.end(), VirtAddr(1100));
    }

    #[test]
    fn kind_predicates() {
        assert!(Segment::free(VirtAddr(0), 1).is_free());
        assert!(!Segment::free(VirtAddr(0), 1).is_allocated());
        assert!(Segment::allocated(VirtAddr(0), 1).is_allocated());
        assert_eq!(SegmentKind::Allocated.tag(), 'P');
        assert_eq!(SegmentKind::Free.tag(), 'H');
    }
}
