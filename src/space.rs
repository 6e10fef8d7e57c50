use std::mem;

use log::{debug, error};

use crate::{
    VirtAddr,
    config::Config,
    error::{Error, Result},
    kernel::{HostMemory, Kernel},
    page::Page,
};

/// A private virtual address space backed by pages borrowed from the host.
///
/// This is the state every operation works on: the pages handed out by the
/// host, ordered by virtual base, and the next virtual base still unused.
///
/// ```text
///   base_address        base + PAGE_SIZE       base + 2 * PAGE_SIZE   next_virtual_base
///        |                     |                      |                      |
///        v                     v                      v                      v
///        +---------------------+----------------------+
///        |       Page 0        |        Page 1        |     (not mapped yet)
///        +---------------------+----------------------+
///                 |                       |
///                 v                       v
///         host mapping A          host mapping B       (unrelated physical locations)
/// ```
///
/// Virtual addresses are plain numbers that only mean something to the
/// space that produced them; use [`AddressSpace::translate`] to reach the
/// memory behind them.
///
/// Pages are never returned to the host before [`AddressSpace::shutdown`]
/// (or drop), even when all of their segments are free.
pub struct AddressSpace<H: HostMemory = Kernel> {
    config: Config,
    /// Pages sorted by ascending virtual base.
    pub(crate) pages: Vec<Page>,
    next_virtual_base: VirtAddr,
    host: H,
}

impl AddressSpace<Kernel> {
    /// Creates an empty address space that maps its pages from the operating
    /// system.
    pub fn new(config: Config) -> Self {
        Self::with_host(config, Kernel)
    }
}

impl Default for AddressSpace<Kernel> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<H: HostMemory> AddressSpace<H> {
    /// Creates an empty address space that maps its pages through `host`.
    pub fn with_host(config: Config, host: H) -> Self {
        debug!(
            "address space created: page size {}, base {}",
            config.page_size(),
            config.base_address()
        );

        Self {
            config,
            pages: Vec::new(),
            next_virtual_base: config.base_address(),
            host,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Virtual base the next page will get.
    #[inline]
    pub fn next_virtual_base(&self) -> VirtAddr {
        self.next_virtual_base
    }

    /// Number of pages currently mapped.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Bytes sitting in free segments across every page.
    pub fn free_bytes(&self) -> usize {
        self.pages
            .iter()
            .flat_map(Page::segments)
            .filter(|segment| segment.is_free())
            .map(|segment| segment.size)
            .sum()
    }

    /// Returns every page to the host and tears the space down.
    ///
    /// A page the host refuses to take back is logged and forgotten. Returns
    /// the number of pages that were released successfully.
    pub fn shutdown(mut self) -> usize {
        self.release_pages()
    }

    /// Maps a new page from the host whose first `size` bytes are allocated.
    pub(crate) fn map_page(&mut self, size: usize) -> Result<VirtAddr> {
        let page_size = self.config.page_size();
        let base = self.next_virtual_base;

        // Reserve the virtual range before asking the host, so a failure
        // leaves the counter untouched.
        let next = base
            .0
            .checked_add(page_size)
            .ok_or(Error::AddressSpaceExhausted)?;
        let physical = self
            .host
            .map(page_size)
            .map_err(Error::AllocationFailure)?;

        self.next_virtual_base = VirtAddr(next);
        self.insert_page(Page::new(base, physical, page_size, size));

        debug!("mapped page {base} ({} pages in use)", self.pages.len());

        Ok(base)
    }

    /// Links `page` into the page list, keeping it sorted by virtual base.
    fn insert_page(&mut self, page: Page) {
        let at = self
            .pages
            .iter()
            .position(|existing| existing.base > page.base)
            .unwrap_or(self.pages.len());

        self.pages.insert(at, page);
    }

    /// Index of the page whose virtual range covers `addr`.
    pub(crate) fn page_index(&self, addr: VirtAddr) -> Option<usize> {
        let candidate = self
            .pages
            .partition_point(|page| page.base <= addr)
            .checked_sub(1)?;

        self.pages[candidate].contains(addr).then_some(candidate)
    }

    fn release_pages(&mut self) -> usize {
        let pages = mem::take(&mut self.pages);
        let total = pages.len();
        let mut released = 0;

        for page in pages {
            match unsafe { self.host.unmap(page.physical, page.size) } {
                Ok(()) => released += 1,
                Err(err) => error!("failed to unmap page {}: {err}", page.base),
            }
        }

        debug!("address space shut down: released {released} of {total} pages");

        released
    }

    /// Verifies the structural invariants of the whole space: every page is
    /// tiled by contiguous segments without adjacent holes, pages are sorted
    /// and sit on page boundaries below the next virtual base.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let page_size = self.config.page_size();
        let base = self.config.base_address();

        for window in self.pages.windows(2) {
            if window[0].base >= window[1].base {
                return Err(format!(
                    "pages out of order: {} before {}",
                    window[0].base, window[1].base
                ));
            }
        }

        for page in &self.pages {
            if page.size != page_size {
                return Err(format!("page {} has size {}", page.base, page.size));
            }
            if page.base < base || (page.base.0 - base.0) % page_size != 0 {
                return Err(format!("page {} is not on a page boundary", page.base));
            }
            if page.end() > self.next_virtual_base {
                return Err(format!(
                    "page {} lies beyond next virtual base {}",
                    page.base, self.next_virtual_base
                ));
            }
            page.check_invariants()?;
        }

        Ok(())
    }
}

impl<H: HostMemory> Drop for AddressSpace<H> {
    fn drop(&mut self) {
        if !self.pages.is_empty() {
            self.release_pages();
        }
    }
}
