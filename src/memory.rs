//! Guest physical memory as seen by the decoder: a single FCRAM window.

/// Default physical base of FCRAM.
pub const FCRAM_PADDR: u32 = 0x2000_0000;
/// Default FCRAM size (128 MiB).
pub const FCRAM_SIZE: u32 = 0x0800_0000;

/// Bounds-checked access to the FCRAM window `[base, base + size)`.
pub trait GuestMemory {
    fn fcram_base(&self) -> u32;
    fn fcram_size(&self) -> u32;

    /// Borrow `len` bytes at physical address `addr`, or `None` if any byte
    /// falls outside the window.
    fn read(&self, addr: u32, len: usize) -> Option<&[u8]>;

    fn write(&mut self, addr: u32, len: usize) -> Option<&mut [u8]>;

    fn contains(&self, addr: u32, len: usize) -> bool {
        range_offset(self.fcram_base(), self.fcram_size(), addr, len).is_some()
    }
}

/// Offset of `addr` inside the window when `[addr, addr + len)` fits.
fn range_offset(base: u32, size: u32, addr: u32, len: usize) -> Option<usize> {
    let start = u64::from(addr);
    let end = start.checked_add(len as u64)?;
    let base = u64::from(base);
    if start < base || end > base + u64::from(size) {
        return None;
    }
    Some((start - base) as usize)
}

/// Owned, zero-initialized FCRAM backing store.
pub struct Fcram {
    base: u32,
    data: Vec<u8>,
}

impl Fcram {
    pub fn new(base: u32, size: u32) -> Self {
        Self {
            base,
            data: vec![0; size as usize],
        }
    }
}

impl Default for Fcram {
    fn default() -> Self {
        Self::new(FCRAM_PADDR, FCRAM_SIZE)
    }
}

impl GuestMemory for Fcram {
    fn fcram_base(&self) -> u32 {
        self.base
    }

    fn fcram_size(&self) -> u32 {
        self.data.len() as u32
    }

    fn read(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let offset = range_offset(self.base, self.fcram_size(), addr, len)?;
        self.data.get(offset..offset + len)
    }

    fn write(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        let offset = range_offset(self.base, self.fcram_size(), addr, len)?;
        self.data.get_mut(offset..offset + len)
    }
}
