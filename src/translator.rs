use std::{ptr::NonNull, slice};

use log::trace;

use crate::{
    VirtAddr,
    error::{Error, Result},
    kernel::HostMemory,
    space::AddressSpace,
};

impl<H: HostMemory> AddressSpace<H> {
    /// Maps a virtual address to the real memory behind it.
    ///
    /// `addr` may point anywhere inside an allocated segment. The result is
    /// the page's physical base plus the distance from the page base. Holes,
    /// released segments and addresses outside every page give
    /// [`Error::NotFound`].
    ///
    /// The pointer stays valid until the space is shut down or dropped.
    pub fn translate(&self, addr: VirtAddr) -> Result<NonNull<u8>> {
        let (physical, _) = self.locate(addr)?;
        trace!("translate({addr}) -> {physical:p}");

        Ok(physical)
    }

    /// Bytes from `addr` up to the end of its allocated segment.
    pub fn bytes(&self, addr: VirtAddr) -> Result<&[u8]> {
        let (physical, len) = self.locate(addr)?;

        // The page stays mapped for as long as `self` is borrowed.
        Ok(unsafe { slice::from_raw_parts(physical.as_ptr(), len) })
    }

    /// Mutable bytes from `addr` up to the end of its allocated segment.
    pub fn bytes_mut(&mut self, addr: VirtAddr) -> Result<&mut [u8]> {
        let (physical, len) = self.locate(addr)?;

        // Segments never overlap and `self` is borrowed exclusively.
        Ok(unsafe { slice::from_raw_parts_mut(physical.as_ptr(), len) })
    }

    /// Physical location of `addr` and the number of bytes left in its segment.
    fn locate(&self, addr: VirtAddr) -> Result<(NonNull<u8>, usize)> {
        let page = self
            .page_index(addr)
            .map(|index| &self.pages[index])
            .ok_or(Error::NotFound(addr))?;
        let segment = page
            .find_allocated_containing(addr)
            .ok_or(Error::NotFound(addr))?;

        Ok((page.physical_at(addr), segment.end().0 - addr.0))
    }
}

#[cfg(test)]
mod tests {
    use crate::{AddressSpace, Error, VirtAddr};

    #[test]
    fn translate_start_of_page() {
        let mut space = AddressSpace::default();
        let a = space.allocate(100).unwrap();

        let physical = space.translate(a).unwrap();
        assert_eq!(physical, space.pages[0].physical);
    }

    #[test]
    fn translate_interior_address() {
        let mut space = AddressSpace::default();
        space.allocate(100).unwrap();
        let b = space.allocate(100).unwrap();

        let base = space.pages[0].physical.as_ptr() as usize;
        let inner = space.translate(VirtAddr(b.0 + 10)).unwrap();
        assert_eq!(inner.as_ptr() as usize, base + 110);
    }

    #[test]
    fn holes_and_released_segments_are_not_found() {
        let mut space = AddressSpace::default();
        let a = space.allocate(100).unwrap();

        assert!(matches!(
            space.translate(VirtAddr(a.0 + 100)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(space.translate(VirtAddr(0)), Err(Error::NotFound(_))));
        assert!(matches!(
            space.translate(VirtAddr(9000)),
            Err(Error::NotFound(_))
        ));

        space.release(a).unwrap();
        assert!(matches!(space.translate(a), Err(Error::NotFound(addr)) if addr == a));
    }

    #[test]
    fn byte_views_cover_rest_of_segment() {
        let mut space = AddressSpace::default();
        let a = space.allocate(16).unwrap();
        let b = space.allocate(16).unwrap();

        space.bytes_mut(a).unwrap().fill(0xaa);
        space.bytes_mut(b).unwrap().fill(0x55);

        assert_eq!(space.bytes(a).unwrap(), [0xaa; 16]);
        assert_eq!(space.bytes(b).unwrap(), [0x55; 16]);
        assert_eq!(space.bytes(VirtAddr(a.0 + 12)).unwrap().len(), 4);
    }

    #[test]
    fn pages_have_independent_memory() {
        let mut space = AddressSpace::default();
        let a = space.allocate(4096).unwrap();
        let b = space.allocate(4096).unwrap();

        space.bytes_mut(a).unwrap().fill(1);
        space.bytes_mut(b).unwrap().fill(2);

        assert!(space.bytes(a).unwrap().iter().all(|byte| *byte == 1));
        assert!(space.bytes(b).unwrap().iter().all(|byte| *byte == 2));
    }
}
