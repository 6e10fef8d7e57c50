use std::io;

use thiserror::Error;

use crate::VirtAddr;

/// Everything that can go wrong while driving an [`AddressSpace`](crate::AddressSpace).
///
/// Every error is reported before any state is touched, so a failed call leaves
/// the address space exactly as it was.
#[derive(Debug, Error)]
pub enum Error {
    /// An allocation of zero bytes was requested.
    #[error("invalid allocation size: {size} bytes")]
    InvalidSize { size: usize },

    /// The request does not fit in a single page.
    #[error("cannot allocate {size} bytes: larger than the {page_size} byte page")]
    TooLarge { size: usize, page_size: usize },

    /// The host refused to map a new page.
    #[error("host failed to map a new page: {0}")]
    AllocationFailure(#[source] io::Error),

    /// There is no virtual address range left for another page.
    #[error("virtual address space exhausted")]
    AddressSpaceExhausted,

    /// The address is not inside any allocated segment.
    #[error("virtual address {0} is not allocated")]
    NotFound(VirtAddr),

    /// The address is not the start of any allocated segment.
    #[error("virtual address {0} was not returned by an allocation or is already released")]
    InvalidAddress(VirtAddr),

    /// A page size of zero was configured.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

pub type Result<T> = std::result::Result<T, Error>;
