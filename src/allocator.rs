use log::{trace, warn};

use crate::{
    VirtAddr,
    error::{Error, Result},
    kernel::HostMemory,
    space::AddressSpace,
};

impl<H: HostMemory> AddressSpace<H> {
    /// Allocates `size` bytes and returns the virtual address of the first one.
    ///
    /// Pages are scanned in address order and, inside each page, segments in
    /// chain order. The first hole that is large enough is used (first-fit),
    /// splitting off whatever the request does not need. Only when no hole fits
    /// is a new page mapped from the host.
    ///
    /// Requests must fit in one page. Zero-sized requests fail with
    /// [`Error::InvalidSize`] and bigger-than-a-page ones with
    /// [`Error::TooLarge`]. A host failure is reported as
    /// [`Error::AllocationFailure`]. The space is unchanged on every error.
    pub fn allocate(&mut self, size: usize) -> Result<VirtAddr> {
        let page_size = self.config().page_size();

        if size == 0 {
            warn!("allocate(0) rejected");
            return Err(Error::InvalidSize { size });
        }
        if size > page_size {
            warn!("allocate({size}) rejected: larger than a {page_size} byte page");
            return Err(Error::TooLarge { size, page_size });
        }

        if let Some(addr) = self.reuse_free_segment(size) {
            trace!("allocate({size}) -> {addr} (reused)");
            return Ok(addr);
        }

        let addr = self.map_page(size).inspect_err(|err| {
            warn!("allocate({size}) failed: {err}");
        })?;
        trace!("allocate({size}) -> {addr} (new page)");

        Ok(addr)
    }

    /// Carves `size` bytes out of the first hole big enough to hold them.
    fn reuse_free_segment(&mut self, size: usize) -> Option<VirtAddr> {
        self.pages.iter_mut().find_map(|page| {
            let hole = page.find_free(size)?;
            Some(page.take(hole, size))
        })
    }
}
