use log::{trace, warn};

use crate::{
    VirtAddr,
    error::{Error, Result},
    kernel::HostMemory,
    space::AddressSpace,
};

impl<H: HostMemory> AddressSpace<H> {
    /// Releases the allocation starting at `addr`.
    ///
    /// The segment becomes a hole and is merged with a free predecessor and a
    /// free successor, so no two holes are ever adjacent. The page itself stays
    /// mapped.
    ///
    /// `addr` must be exactly an address returned by [`AddressSpace::allocate`]
    /// that has not been released yet; anything else fails with
    /// [`Error::InvalidAddress`] and changes nothing.
    pub fn release(&mut self, addr: VirtAddr) -> Result<()> {
        let found = self.page_index(addr).and_then(|page| {
            let segment = self.pages[page].find_allocated(addr)?;
            Some((page, segment))
        });

        let Some((page, segment)) = found else {
            warn!("release({addr}) ignored: not an allocated segment");
            return Err(Error::InvalidAddress(addr));
        };

        let hole = self.pages[page].release(segment);
        trace!(
            "release({addr}): hole of {} bytes at {}",
            self.pages[page].segments.get(hole).size,
            self.pages[page].segments.get(hole).offset
        );

        Ok(())
    }
}
