//! A user-space virtual memory allocator.
//!
//! [`AddressSpace`] hands out blocks of memory identified by made-up virtual
//! addresses ([`VirtAddr`]). Behind the scenes it borrows whole pages from the
//! host ([`HostMemory`], [`Kernel`] by default), lays them out one after another
//! in its own virtual address range and carves each page into segments:
//!
//! ```text
//!            page 1000..5096                            page 5096..9192
//! +----------------------------------------+   +----------------------------+
//! | P 1000..1100 | H 1100..1300 | P ... |  |-->| P 5096..9192               |
//! +----------------------------------------+   +----------------------------+
//! ```
//!
//! Allocation is first-fit over pages and segments in address order, splitting
//! the hole it picks. Release turns a segment back into a hole and merges it
//! with free neighbours. Translation turns a virtual address into a pointer
//! into the page behind it.
//!
//! ```
//! use vspace::{AddressSpace, Config};
//!
//! let mut space = AddressSpace::new(Config::default());
//!
//! let a = space.allocate(100).unwrap();
//! space.bytes_mut(a).unwrap().copy_from_slice(&[7; 100]);
//! assert_eq!(space.bytes(a).unwrap()[99], 7);
//!
//! space.release(a).unwrap();
//! assert_eq!(space.allocate(50).unwrap(), a);
//!
//! println!("{}", space.report());
//! space.shutdown();
//! ```
//!
//! Requests larger than one page are refused, and pages are only given back
//! to the host on [`AddressSpace::shutdown`] or drop. The space is a plain
//! value with no internal locking; wrap the whole of it in a mutex to share it
//! between threads.

use std::fmt;

mod allocator;
mod config;
mod deallocator;
mod error;
pub mod kernel;
mod list;
mod page;
mod report;
mod segment;
mod space;
mod translator;

pub use config::{Config, DEFAULT_BASE_ADDRESS, DEFAULT_PAGE_SIZE};
pub use error::{Error, Result};
pub use kernel::{HostMemory, Kernel};
pub use report::{PageReport, Report, SegmentReport};
pub use segment::SegmentKind;
pub use space::AddressSpace;

/// Address in the virtual range of an [`AddressSpace`].
///
/// Only meaningful to the space that produced it. It is not a pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub usize);

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for VirtAddr {
    fn from(addr: usize) -> Self {
        Self(addr)
    }
}

impl From<VirtAddr> for usize {
    fn from(addr: VirtAddr) -> Self {
        addr.0
    }
}
