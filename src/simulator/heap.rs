//!
//! The dynamic memory allocator behind the `malloc` and `free` virtual routines.
//!
//! The heap is [`MAX_BANKS`] banks of [`BANK_SIZE`] bytes starting at [`HEAP_START`], and each
//! bank has a used/free flag. An allocation takes a run of banks and returns the address of the
//! first one. A free releases a single bank. Programs can only load from and store to banks
//! that are allocated.
//!

use super::memory::{BANK_SIZE, HEAP_END, HEAP_START, MAX_BANKS};
use serde::Deserialize;
use thiserror::Error;

/// How `malloc` looks for free banks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HeapSearch {
    /// Takes `ceil(size / 64)` banks (at least one) from the first run of free banks that is
    /// long enough
    #[default]
    FirstFit,

    /// Bank-for-bank compatible with the reference machine: takes `size / 64 + 1` banks, and
    /// only ever checks the window that starts at bank 0, so any allocation fails once bank 0
    /// is in use
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidFree {
    #[error("address is outside the heap")]
    OutOfRange,
    #[error("address is not word aligned")]
    Misaligned,
    #[error("bank is not allocated")]
    NotAllocated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAllocator {
    used: [bool; MAX_BANKS],
    search: HeapSearch,
}

impl BankAllocator {
    pub fn new(search: HeapSearch) -> Self {
        Self {
            used: [false; MAX_BANKS],
            search,
        }
    }

    pub fn is_used(&self, bank: usize) -> bool {
        self.used[bank]
    }

    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|&&used| used).count()
    }

    /// Whether `width` bytes starting at `addr` may be accessed: every heap bank the access
    /// touches has to be allocated. Addresses outside the heap are always accessible.
    pub fn covers(&self, addr: u32, width: usize) -> bool {
        let start = addr as usize;
        let end = start.saturating_add(width);
        let (start, end) = (start.max(HEAP_START), end.min(HEAP_END));
        if start >= end {
            return true;
        }

        let first = (start - HEAP_START) / BANK_SIZE;
        let last = (end - 1 - HEAP_START) / BANK_SIZE;
        self.used[first..=last].iter().all(|&used| used)
    }

    /// How many banks a request for `size` bytes takes
    pub fn banks_for(&self, size: u32) -> usize {
        let size = size as usize;
        match self.search {
            HeapSearch::FirstFit => size.div_ceil(BANK_SIZE).max(1),
            HeapSearch::Literal => size / BANK_SIZE + 1,
        }
    }

    /// Reserves banks for `size` bytes and returns the address of the first one, or `None` if
    /// the request can't be satisfied
    pub fn alloc(&mut self, size: u32) -> Option<u32> {
        let banks = self.banks_for(size);
        if banks > MAX_BANKS {
            return None;
        }

        let (start, window) = match self.search {
            HeapSearch::FirstFit => {
                let start = (0..=MAX_BANKS - banks)
                    .find(|&start| self.used[start..start + banks].iter().all(|&u| !u))?;
                (start, start..start + banks)
            }
            HeapSearch::Literal => {
                // The free count always covers start..banks, whatever the start is
                let start = (0..MAX_BANKS).find(|&start| {
                    let free = (start..banks).filter(|&j| !self.used[j]).count();
                    free >= banks
                })?;
                (start, start..banks)
            }
        };

        self.used[window].iter_mut().for_each(|u| *u = true);

        let addr = (HEAP_START + start * BANK_SIZE) as u32;
        tracing::debug!(size, banks, addr = format_args!("{addr:#x}"), "malloc");
        Some(addr)
    }

    /// Releases the bank that contains `addr`
    pub fn free(&mut self, addr: u32) -> Result<(), InvalidFree> {
        let addr = addr as usize;
        if !(HEAP_START..HEAP_END).contains(&addr) {
            return Err(InvalidFree::OutOfRange);
        }

        // Anything aligned to a bank is also aligned to a word
        if addr % 4 != 0 {
            return Err(InvalidFree::Misaligned);
        }

        let bank = (addr - HEAP_START) / BANK_SIZE;
        if !self.used[bank] {
            return Err(InvalidFree::NotAllocated);
        }

        self.used[bank] = false;
        tracing::debug!(bank, addr = format_args!("{addr:#x}"), "free");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = HEAP_START as u32;

    #[test]
    fn test_first_alloc_takes_the_first_bank() {
        for search in [HeapSearch::FirstFit, HeapSearch::Literal] {
            let mut heap = BankAllocator::new(search);
            assert_eq!(heap.alloc(10), Some(BASE), "{search:?}");
            assert!(heap.is_used(0));
            assert_eq!(heap.used_count(), 1);
        }
    }

    #[test]
    fn test_banks_for() {
        let first_fit = BankAllocator::new(HeapSearch::FirstFit);
        assert_eq!(first_fit.banks_for(0), 1);
        assert_eq!(first_fit.banks_for(64), 1);
        assert_eq!(first_fit.banks_for(65), 2);

        let literal = BankAllocator::new(HeapSearch::Literal);
        assert_eq!(literal.banks_for(0), 1);
        assert_eq!(literal.banks_for(63), 1);
        assert_eq!(literal.banks_for(64), 2);
    }

    #[test]
    fn test_first_fit_slides_past_used_banks() {
        let mut heap = BankAllocator::new(HeapSearch::FirstFit);
        assert_eq!(heap.alloc(64), Some(BASE));
        assert_eq!(heap.alloc(128), Some(BASE + 64));
        assert_eq!(heap.alloc(1), Some(BASE + 192));

        // Freeing bank 0 leaves a one-bank hole a two-bank request can't use
        heap.free(BASE).unwrap();
        assert_eq!(heap.alloc(100), Some(BASE + 256));
        assert_eq!(heap.alloc(10), Some(BASE));
    }

    #[test]
    fn test_literal_only_checks_the_window_at_bank_zero() {
        let mut heap = BankAllocator::new(HeapSearch::Literal);
        assert_eq!(heap.alloc(10), Some(BASE));
        assert_eq!(heap.alloc(10), None);
        assert_eq!(heap.used_count(), 1);

        heap.free(BASE).unwrap();
        assert_eq!(heap.alloc(100), Some(BASE));
        assert_eq!(heap.used_count(), 2);
    }

    #[test]
    fn test_whole_heap() {
        let mut heap = BankAllocator::new(HeapSearch::FirstFit);
        assert_eq!(heap.alloc(64 * 128), Some(BASE));
        assert_eq!(heap.used_count(), 128);
        assert_eq!(heap.alloc(1), None);

        let mut heap = BankAllocator::new(HeapSearch::FirstFit);
        assert_eq!(heap.alloc(64 * 128 + 1), None);
        assert_eq!(heap.used_count(), 0);

        // size / 64 + 1 banks don't fit when size is exactly the heap
        let mut heap = BankAllocator::new(HeapSearch::Literal);
        assert_eq!(heap.alloc(64 * 128), None);
        assert_eq!(heap.alloc(u32::MAX), None);
    }

    #[test]
    fn test_covers() {
        let mut heap = BankAllocator::new(HeapSearch::FirstFit);
        assert!(heap.covers(0x400, 4));
        assert!(heap.covers(BASE - 4, 4));
        assert!(!heap.covers(BASE - 2, 4));
        assert!(!heap.covers(BASE, 1));
        assert!(!heap.covers(HEAP_END as u32 - 1, 1));
        assert!(heap.covers(HEAP_END as u32, 4));

        heap.alloc(64).unwrap();
        assert!(heap.covers(BASE, 4));
        assert!(heap.covers(BASE + 60, 4));
        // Straddles into bank 1, which is free
        assert!(!heap.covers(BASE + 62, 4));

        heap.free(BASE).unwrap();
        assert!(!heap.covers(BASE, 4));
    }

    #[test]
    fn test_free() {
        let mut heap = BankAllocator::new(HeapSearch::FirstFit);
        heap.alloc(10).unwrap();

        assert_eq!(heap.free(BASE + 2), Err(InvalidFree::Misaligned));
        assert_eq!(heap.free(BASE - 64), Err(InvalidFree::OutOfRange));
        assert_eq!(heap.free(HEAP_END as u32), Err(InvalidFree::OutOfRange));
        assert_eq!(heap.free(BASE + 64), Err(InvalidFree::NotAllocated));
        assert!(heap.is_used(0));

        // Any word inside the bank frees it
        assert_eq!(heap.free(BASE + 8), Ok(()));
        assert!(!heap.is_used(0));
        assert_eq!(heap.free(BASE), Err(InvalidFree::NotAllocated));
    }
}
