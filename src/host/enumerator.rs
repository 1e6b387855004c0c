//! Lazy iteration over the host's paged enumeration primitives.
//!
//! The runtime enumerates metadata rows by repeatedly filling a caller-provided buffer and
//! tracking its position in an opaque handle that must be released afterwards. [`PagedEnum`]
//! hides that protocol behind a plain [`Iterator`]: pages are fetched on demand, and the handle
//! is released when the adapter is dropped, whether or not iteration ran to completion.
//!
//! # Examples
//!
//! ```rust
//! use dotprobe::host::{enumerator::PagedEnum, EnumHandle, PageFill};
//!
//! let rows = [10u32, 20, 30];
//! let mut served = 0;
//! let values: Vec<u32> = PagedEnum::new(
//!     move |_handle: &mut EnumHandle, out: &mut [u32]| {
//!         if served == rows.len() {
//!             return Ok(PageFill::Done);
//!         }
//!         out[0] = rows[served];
//!         served += 1;
//!         Ok(PageFill::Items(1))
//!     },
//!     |_handle| {},
//! )
//! .collect();
//!
//! assert_eq!(values, vec![10, 20, 30]);
//! ```

use std::{fmt, iter::FusedIterator};

use log::debug;

use crate::host::{EnumHandle, HostResult, PageFill};

/// Number of elements requested from the host per page
pub const ENUM_PAGE_SIZE: usize = 256;

type FillFn<'h, T> = Box<dyn FnMut(&mut EnumHandle, &mut [T]) -> HostResult<PageFill> + 'h>;
type CloseFn<'h> = Box<dyn FnOnce(EnumHandle) + 'h>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    /// No page requested yet
    Pending,
    /// At least one page was delivered
    Active,
    /// The host reported the end, or failed
    Exhausted,
}

/// A forward-only, single-pass iterator over a paged host enumeration.
///
/// Construction is free: the first page is requested by the first call to
/// [`Iterator::next`], and every further page once the current one is consumed. The sequence
/// ends when the host reports [`PageFill::Done`], delivers an empty page, or fails. After that
/// the host is not asked again.
///
/// The close callback runs exactly once, when the adapter is dropped. This includes adapters
/// that were never iterated and iterations abandoned half-way, e.g. by `find`.
///
/// Enumerating the same rows again requires a new adapter.
pub struct PagedEnum<'h, T> {
    fill: FillFn<'h, T>,
    close: Option<CloseFn<'h>>,
    handle: EnumHandle,
    page: Vec<T>,
    len: usize,
    pos: usize,
    state: State,
}

impl<'h, T: Copy + Default> PagedEnum<'h, T> {
    /// Creates a new adapter over a fill and a close primitive.
    ///
    /// Neither callback is invoked here.
    ///
    /// ## Arguments
    /// * `fill` - Fills the provided buffer with the next page and reports how many elements are valid
    /// * `close` - Releases the enumeration handle
    pub fn new<F, C>(fill: F, close: C) -> Self
    where
        F: FnMut(&mut EnumHandle, &mut [T]) -> HostResult<PageFill> + 'h,
        C: FnOnce(EnumHandle) + 'h,
    {
        PagedEnum {
            fill: Box::new(fill),
            close: Some(Box::new(close)),
            handle: EnumHandle::default(),
            page: Vec::new(),
            len: 0,
            pos: 0,
            state: State::Pending,
        }
    }

    /// Returns true once the sequence has ended.
    ///
    /// This is the only position information the adapter exposes.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    fn refill(&mut self) -> bool {
        if self.page.is_empty() {
            self.page = vec![T::default(); ENUM_PAGE_SIZE];
        }

        self.pos = 0;
        self.len = 0;
        match (self.fill)(&mut self.handle, &mut self.page) {
            Ok(PageFill::Items(count)) if count > 0 => {
                self.len = count.min(ENUM_PAGE_SIZE);
                true
            }
            Ok(_) => false,
            Err(error) => {
                debug!("Enumeration ended early: {}", error);
                false
            }
        }
    }
}

impl<T: Copy + Default> Iterator for PagedEnum<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.state == State::Exhausted {
            return None;
        }

        if self.pos >= self.len {
            if !self.refill() {
                self.state = State::Exhausted;
                return None;
            }
            self.state = State::Active;
        }

        let item = self.page[self.pos];
        self.pos += 1;
        Some(item)
    }
}

impl<T: Copy + Default> FusedIterator for PagedEnum<'_, T> {}

impl<T> Drop for PagedEnum<'_, T> {
    fn drop(&mut self) {
        if let Some(close) = self.close.take() {
            close(self.handle);
        }
    }
}

impl<T> fmt::Debug for PagedEnum<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedEnum")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("buffered", &(self.len - self.pos.min(self.len)))
            .finish()
    }
}
