//! Page arithmetic shared by the listing queries and the client loader.
//!
//! Pages are 1-based. Page `n` covers items `(n-1)*size .. n*size` of a
//! newest-first ordering; a page shorter than `size` marks the end.

use crate::constants::PAGE_SIZE;
use crate::error::AppError;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: usize,
}

impl PageRequest {
    /// Build a request for `page` with the standard [`PAGE_SIZE`].
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] when `page` is zero.
    pub fn new(page: u32) -> Result<Self, AppError> {
        Self::with_size(page, PAGE_SIZE)
    }

    /// Build a request with an explicit page size.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] when `page` or `size` is zero.
    pub fn with_size(page: u32, size: usize) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::BadRequest("page must be 1 or greater".to_string()));
        }
        if size == 0 {
            return Err(AppError::BadRequest("page size must be positive".to_string()));
        }
        Ok(Self { page, size })
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of items to skip.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.size)
    }
}

/// Next page to request after `pages_loaded` pages, the last of which held
/// `last_page_len` items. `None` once a short page has been seen.
///
/// A page longer than [`PAGE_SIZE`] (a client-side optimistic insert) still
/// counts as full.
pub fn next_page_param(last_page_len: usize, pages_loaded: usize) -> Option<u32> {
    if pages_loaded == 0 {
        return Some(1);
    }
    if last_page_len >= PAGE_SIZE {
        u32::try_from(pages_loaded + 1).ok()
    } else {
        None
    }
}
