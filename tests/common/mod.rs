use std::{
    alloc::{self, Layout},
    cell::{Cell, RefCell},
    io,
    ptr::NonNull,
    rc::Rc,
};

use vspace::HostMemory;

/// Heap-backed host whose failures are scripted by the test.
///
/// Clones share the same state, so a test can keep a handle after moving the
/// host into an address space.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    state: Rc<HostState>,
}

#[derive(Default)]
struct HostState {
    live: RefCell<Vec<(usize, usize)>>,
    maps: Cell<usize>,
    unmaps: Cell<usize>,
    failing_maps: Cell<usize>,
    failing_unmaps: Cell<bool>,
}

const ALIGN: usize = 16;

impl ScriptedHost {
    /// Makes the next `count` calls to `map` fail.
    pub fn fail_next_maps(&self, count: usize) {
        self.state.failing_maps.set(count);
    }

    /// Makes every call to `unmap` fail from now on.
    pub fn fail_unmaps(&self) {
        self.state.failing_unmaps.set(true);
    }

    pub fn maps(&self) -> usize {
        self.state.maps.get()
    }

    pub fn unmaps(&self) -> usize {
        self.state.unmaps.get()
    }

    /// Mappings handed out and not taken back yet.
    pub fn live(&self) -> usize {
        self.state.live.borrow().len()
    }
}

unsafe impl HostMemory for ScriptedHost {
    fn map(&self, len: usize) -> io::Result<NonNull<u8>> {
        let failing = self.state.failing_maps.get();
        if failing > 0 {
            self.state.failing_maps.set(failing - 1);
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, "scripted map failure"));
        }

        let layout = Layout::from_size_align(len, ALIGN).map_err(io::Error::other)?;
        let addr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
            .ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))?;

        self.state.maps.set(self.state.maps.get() + 1);
        self.state
            .live
            .borrow_mut()
            .push((addr.as_ptr() as usize, len));

        Ok(addr)
    }

    unsafe fn unmap(&self, addr: NonNull<u8>, len: usize) -> io::Result<()> {
        if self.state.failing_unmaps.get() {
            return Err(io::Error::other("scripted unmap failure"));
        }

        let mut live = self.state.live.borrow_mut();
        let position = live
            .iter()
            .position(|mapping| *mapping == (addr.as_ptr() as usize, len))
            .expect("unmapping something that is not mapped");
        live.swap_remove(position);

        self.state.unmaps.set(self.state.unmaps.get() + 1);
        unsafe {
            alloc::dealloc(addr.as_ptr(), Layout::from_size_align_unchecked(len, ALIGN));
        }

        Ok(())
    }
}
