use std::ptr::NonNull;

use crate::{
    VirtAddr,
    list::{Index, List},
    segment::{Segment, SegmentKind},
};

/// One host-mapped page together with the chain of [`Segment`] tiling it.
///
/// Pages are not adjacent in physical memory, each one is an independent
/// mapping. They are only laid out next to each other in the virtual address
/// space that this crate makes up:
///
/// ```text
/// +-------------------------------------+      +-------------------------------------+
/// |      | +-------+   +------+   +---+ |      |      | +-------+   +------+   +---+ |
/// | Page | | Alloc |<->| Free |<->|...| | ---> | Page | | Alloc |<->| Free |<->|...| |
/// |      | +-------+   +------+   +---+ |      |      | +-------+   +------+   +---+ |
/// +-------------------------------------+      +-------------------------------------+
/// ```
pub(crate) struct Page {
    /// Virtual address of the first byte of the page.
    pub base: VirtAddr,
    /// Start of the host mapping backing this page.
    pub physical: NonNull<u8>,
    /// Length of the page and of its host mapping.
    pub size: usize,
    /// Segments of the page, in address order.
    pub segments: List<Segment>,
}

impl Page {
    /// Builds a fresh page whose first `requested` bytes are already handed out.
    /// The rest of the page, if any, becomes a single free segment.
    pub fn new(base: VirtAddr, physical: NonNull<u8>, size: usize, requested: usize) -> Self {
        debug_assert!(requested > 0 && requested <= size);

        let mut segments = List::new();
        segments.push_back(Segment::allocated(base, requested));
        if requested < size {
            segments.push_back(Segment::free(VirtAddr(base.0 + requested), size - requested));
        }

        Self {
            base,
            physical,
            size,
            segments,
        }
    }

    /// First virtual address past the page.
    #[inline]
    pub fn end(&self) -> VirtAddr {
        VirtAddr(self.base.0 + self.size)
    }

    #[inline]
    pub fn contains(&self, addr: VirtAddr) -> bool {
        self.base <= addr && addr < self.end()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().map(|(_, segment)| segment)
    }

    /// First free segment, in chain order, that can hold `size` bytes.
    pub fn find_free(&self, size: usize) -> Option<Index> {
        self.segments
            .iter()
            .find(|(_, segment)| segment.is_free() && segment.size >= size)
            .map(|(index, _)| index)
    }

    /// Allocated segment starting exactly at `addr`.
    pub fn find_allocated(&self, addr: VirtAddr) -> Option<Index> {
        self.segments
            .iter()
            .find(|(_, segment)| segment.is_allocated() && segment.offset == addr)
            .map(|(index, _)| index)
    }

    /// Allocated segment whose range covers `addr`.
    pub fn find_allocated_containing(&self, addr: VirtAddr) -> Option<&Segment> {
        self.segments()
            .find(|segment| segment.is_allocated() && segment.contains(addr))
    }

    /// Hands out the first `size` bytes of the free segment at `index`.
    ///
    /// When the hole is bigger than the request it is split: the tail becomes a
    /// new free segment linked right after it. No other segment is touched.
    pub fn take(&mut self, index: Index, size: usize) -> VirtAddr {
        let segment = *self.segments.get(index);
        debug_assert!(segment.is_free() && segment.size >= size);

        if segment.size > size {
            let remainder = Segment::free(VirtAddr(segment.offset.0 + size), segment.size - size);
            self.segments.insert_after(index, remainder);
        }

        *self.segments.get_mut(index) = Segment::allocated(segment.offset, size);

        segment.offset
    }

    /// Turns the segment at `index` into a hole and coalesces it with its free
    /// neighbours. Returns the index of the resulting free segment.
    pub fn release(&mut self, mut index: Index) -> Index {
        let segment = self.segments.get_mut(index);
        debug_assert!(segment.is_allocated());
        segment.kind = SegmentKind::Free;

        // No two holes were adjacent before, so one look at each side is enough.
        self.merge_with_prev(&mut index);
        self.merge_with_next(index);

        index
    }

    /// Physical location of `addr`, which must lie inside this page.
    pub fn physical_at(&self, addr: VirtAddr) -> NonNull<u8> {
        debug_assert!(self.contains(addr));

        unsafe { self.physical.add(addr.0 - self.base.0) }
    }

    /// Absorbs the segment at `index` into its predecessor when that one is
    /// free. `index` is moved to the predecessor if the merge happened.
    fn merge_with_prev(&mut self, index: &mut Index) {
        let Some(prev) = self.segments.prev(*index) else {
            return;
        };

        if self.segments.get(prev).is_free() {
            let absorbed = self.segments.remove(*index);
            self.segments.get_mut(prev).size += absorbed.size;

            *index = prev;
        }
    }

    /// Absorbs the successor of the segment at `index` when it is free.
    fn merge_with_next(&mut self, index: Index) {
        let Some(next) = self.segments.next(index) else {
            return;
        };

        if self.segments.get(next).is_free() {
            let absorbed = self.segments.remove(next);
            self.segments.get_mut(index).size += absorbed.size;
        }
    }

    /// Checks that the segments tile the page without gaps and that no two
    /// holes are adjacent.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.segments.is_empty() {
            return Err(format!("page {}: no segments", self.base));
        }

        let mut expected = self.base;
        let mut prev_free = false;

        for segment in self.segments() {
            if segment.size == 0 {
                return Err(format!("page {}: empty segment at {}", self.base, segment.offset));
            }
            if segment.offset != expected {
                return Err(format!(
                    "page {}: segment at {} but expected {}",
                    self.base, segment.offset, expected
                ));
            }
            if prev_free && segment.is_free() {
                return Err(format!(
                    "page {}: adjacent free segments at {}",
                    self.base, segment.offset
                ));
            }

            prev_free = segment.is_free();
            expected = segment.end();
        }

        if expected != self.end() {
            return Err(format!(
                "page {}: segments cover up to {} instead of {}",
                self.base,
                expected,
                self.end()
            ));
        }

        Ok(())
    }
}
