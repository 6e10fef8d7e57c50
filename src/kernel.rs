//! Host page-mapping facility.
//!
//! The address space never touches raw memory services directly. Everything it
//! needs from the operating system goes through [`HostMemory`], which hands out
//! and takes back whole pages. [`Kernel`] is the implementation backed by the
//! real operating system.

use std::{io, ptr::NonNull, sync::OnceLock};

/// Source of whole pages of real memory.
///
/// # Safety
///
/// Implementors must guarantee that a pointer returned by [`HostMemory::map`]
/// is valid for reads and writes of `len` bytes, that those bytes are
/// initialised (zeroed) and that the region does not overlap any other live
/// mapping until it is passed to [`HostMemory::unmap`].
pub unsafe trait HostMemory {
    /// Maps `len` bytes of anonymous, private, read-write memory.
    fn map(&self, len: usize) -> io::Result<NonNull<u8>>;

    /// Returns a mapping obtained from [`HostMemory::map`] to the host.
    ///
    /// # Safety
    ///
    /// `addr` and `len` must describe a live mapping returned by `map` on this
    /// same host, and nothing may access it afterwards.
    unsafe fn unmap(&self, addr: NonNull<u8>, len: usize) -> io::Result<()>;
}

/// The operating system's own mapping primitives: `mmap`/`munmap` on unix,
/// `VirtualAlloc`/`VirtualFree` on Windows.
#[derive(Clone, Copy, Debug, Default)]
pub struct Kernel;

/// Low level memory syscalls, one implementation per platform.
trait PlatformMemory {
    /// Requests a read-write memory region of `len` bytes.
    unsafe fn request_memory(len: usize) -> io::Result<NonNull<u8>>;

    /// Gives the region of `len` bytes starting at `addr` back to the kernel.
    unsafe fn return_memory(addr: NonNull<u8>, len: usize) -> io::Result<()>;

    /// Virtual memory page size of the computer in bytes.
    fn page_size() -> usize;
}

unsafe impl HostMemory for Kernel {
    fn map(&self, len: usize) -> io::Result<NonNull<u8>> {
        unsafe { Self::request_memory(len) }
    }

    unsafe fn unmap(&self, addr: NonNull<u8>, len: usize) -> io::Result<()> {
        unsafe { Self::return_memory(addr, len) }
    }
}

/// Native page size of the host. Queried once, then cached.
pub fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

    *PAGE_SIZE.get_or_init(Kernel::page_size)
}

#[cfg(unix)]
mod unix {
    use std::{
        io,
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    use libc::{mmap, munmap, off_t, size_t};

    use super::{Kernel, PlatformMemory};

    impl PlatformMemory for Kernel {
        unsafe fn request_memory(len: usize) -> io::Result<NonNull<u8>> {
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            let addr = unsafe { mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET) };

            if addr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }

            NonNull::new(addr.cast::<u8>())
                .ok_or_else(|| io::Error::other("mmap returned a null mapping"))
        }

        unsafe fn return_memory(addr: NonNull<u8>, len: usize) -> io::Result<()> {
            match unsafe { munmap(addr.as_ptr().cast::<c_void>(), len as size_t) } {
                0 => Ok(()),
                _ => Err(io::Error::last_os_error()),
            }
        }

        fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) as usize }
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::{io, mem::MaybeUninit, os::raw::c_void, ptr::NonNull};

    use ::windows::Win32::System::{Memory, SystemInformation};

    use super::{Kernel, PlatformMemory};

    impl PlatformMemory for Kernel {
        unsafe fn request_memory(len: usize) -> io::Result<NonNull<u8>> {
            let protection = Memory::PAGE_READWRITE;
            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            let addr = unsafe { Memory::VirtualAlloc(None, len, flags, protection) };

            NonNull::new(addr.cast::<u8>()).ok_or_else(io::Error::last_os_error)
        }

        unsafe fn return_memory(addr: NonNull<u8>, _len: usize) -> io::Result<()> {
            unsafe {
                Memory::VirtualFree(addr.as_ptr().cast::<c_void>(), 0, Memory::MEM_RELEASE)
                    .map_err(io::Error::other)
            }
        }

        fn page_size() -> usize {
            unsafe {
                let mut system_info = MaybeUninit::uninit();
                SystemInformation::GetSystemInfo(system_info.as_mut_ptr());

                system_info.assume_init().dwPageSize as usize
            }
        }
    }
}
