use crate::{
    VirtAddr,
    error::{Error, Result},
    kernel,
};

/// Size of every page, in bytes, unless configured otherwise. Fixed rather than
/// taken from the host so addresses come out the same on every machine.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Virtual address handed to the first page, unless configured otherwise.
pub const DEFAULT_BASE_ADDRESS: VirtAddr = VirtAddr(1000);

/// Geometry of an [`AddressSpace`](crate::AddressSpace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    page_size: usize,
    base_address: VirtAddr,
}

impl Config {
    pub fn new(page_size: usize, base_address: VirtAddr) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidPageSize);
        }

        Ok(Self {
            page_size,
            base_address,
        })
    }

    /// Same as [`Config::default`] but with the native page size of the host.
    pub fn host() -> Self {
        Self {
            page_size: kernel::page_size(),
            base_address: DEFAULT_BASE_ADDRESS,
        }
    }

    /// Length of every page requested from the host.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Virtual base of the first page created.
    #[inline]
    pub fn base_address(&self) -> VirtAddr {
        self.base_address
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            base_address: DEFAULT_BASE_ADDRESS,
        }
    }
}
