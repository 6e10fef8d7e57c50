//! Read-only summary of an address space, for diagnostics.

use std::fmt;

use crate::{VirtAddr, kernel::HostMemory, page::Page, segment::SegmentKind, space::AddressSpace};

/// Snapshot of the page list and of every segment chain.
///
/// Its [`Display`](fmt::Display) output looks like this:
///
/// ```text
/// VSPACE STATS
/// MAIN[1000:5095] -> P[1000:1099] <-> H[1100:5095] <-> NULL
/// Pages Used: 1
/// Space Unused: 3996 bytes
/// Main Chain Length: 1
/// Sub Chain Length: 2
/// ```
///
/// `P` marks allocated segments and `H` holes. Ranges are inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub pages: Vec<PageReport>,
    /// Bytes sitting in holes across every page.
    pub unused_bytes: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageReport {
    pub start: VirtAddr,
    /// Last byte of the page.
    pub end: VirtAddr,
    pub segments: Vec<SegmentReport>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentReport {
    pub start: VirtAddr,
    /// Last byte of the segment.
    pub end: VirtAddr,
    pub kind: SegmentKind,
}

impl Report {
    /// Number of pages mapped from the host.
    pub fn pages_used(&self) -> usize {
        self.pages.len()
    }

    /// Length of the page list.
    pub fn main_chain_length(&self) -> usize {
        self.pages.len()
    }

    /// Total number of segments across every page.
    pub fn sub_chain_length(&self) -> usize {
        self.pages.iter().map(|page| page.segments.len()).sum()
    }
}

impl From<&Page> for PageReport {
    fn from(page: &Page) -> Self {
        let mut segments = Vec::with_capacity(page.segments.len());
        segments.extend(page.segments().map(|segment| SegmentReport {
            start: segment.offset,
            end: VirtAddr(segment.end().0 - 1),
            kind: segment.kind,
        }));

        Self {
            start: page.base,
            end: VirtAddr(page.end().0 - 1),
            segments,
        }
    }
}

impl<H: HostMemory> AddressSpace<H> {
    /// Summarises the current state without touching it.
    pub fn report(&self) -> Report {
        Report {
            pages: self.pages.iter().map(PageReport::from).collect(),
            unused_bytes: self.free_bytes(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VSPACE STATS")?;

        for page in &self.pages {
            write!(f, "MAIN[{}:{}] -> ", page.start, page.end)?;
            for segment in &page.segments {
                write!(
                    f,
                    "{}[{}:{}] <-> ",
                    segment.kind.tag(),
                    segment.start,
                    segment.end
                )?;
            }
            writeln!(f, "NULL")?;
        }

        writeln!(f, "Pages Used: {}", self.pages_used())?;
        writeln!(f, "Space Unused: {} bytes", self.unused_bytes)?;
        writeln!(f, "Main Chain Length: {}", self.main_chain_length())?;
        writeln!(f, "Sub Chain Length: {}", self.sub_chain_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_space() {
        let space = AddressSpace::default();
        let report = space.report();

        assert_eq!(report.pages_used(), 0);
        assert_eq!(report.unused_bytes, 0);
        assert_eq!(
            report.to_string(),
            "VSPACE STATS\n\
             Pages Used: 0\n\
             Space Unused: 0 bytes\n\
             Main Chain Length: 0\n\
             Sub Chain Length: 0\n"
        );
    }

    #[test]
    fn lists_every_page_and_segment() {
        let mut space = AddressSpace::default();
        let a = space.allocate(100).unwrap();
        space.allocate(50).unwrap();
        space.allocate(4096).unwrap();
        space.release(a).unwrap();

        let report = space.report();
        assert_eq!(report.pages_used(), 2);
        assert_eq!(report.sub_chain_length(), 4);
        assert_eq!(report.unused_bytes, 100 + 3946);
        assert_eq!(
            report.pages[0].segments[1],
            SegmentReport {
                start: VirtAddr(1100),
                end: VirtAddr(1149),
                kind: SegmentKind::Allocated,
            }
        );

        assert_eq!(
            report.to_string(),
            "VSPACE STATS\n\
             MAIN[1000:5095] -> H[1000:1099] <-> P[1100:1149] <-> H[1150:5095] <-> NULL\n\
             MAIN[5096:9191] -> P[5096:9191] <-> NULL\n\
             Pages Used: 2\n\
             Space Unused: 4046 bytes\n\
             Main Chain Length: 2\n\
             Sub Chain Length: 4\n"
        );
    }

    #[test]
    fn report_is_deterministic() {
        let mut space = AddressSpace::default();
        space.allocate(10).unwrap();

        assert_eq!(space.report(), space.report());
    }
}
