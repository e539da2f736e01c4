//! Disk Manager - low-level file I/O for pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating new pages
//! - Managing the backing file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::page_store::{OpenMode, PageStore};

/// Manages disk I/O for a single page file.
///
/// # File Layout
/// The file holds pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**.
///
/// # Durability
/// Writes go to the OS page cache; [`PageStore::sync`] issues the `fsync`.
/// The index and record heap call it on close.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
    mode: OpenMode,
}

impl DiskManager {
    /// Create a new page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
            mode: OpenMode::Write,
        })
    }

    /// Open an existing page file for reading and writing.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::from_file(file, OpenMode::Write)
    }

    /// Open an existing page file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Open a page file in the given mode.
    ///
    /// `Read` requires the file to exist and rejects every mutation with
    /// `Error::ReadOnly`; `Write` creates the file when missing.
    pub fn open_with_mode<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        match mode {
            OpenMode::Write => Self::open_or_create(path),
            OpenMode::Read => {
                let file = OpenOptions::new().read(true).open(&path)?;
                Self::from_file(file, OpenMode::Read)
            }
        }
    }

    fn from_file(file: File, mode: OpenMode) -> Result<Self> {
        // Calculate page count from file size; a torn trailing page is ignored
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_count,
            mode,
        })
    }

    /// Mode the file was opened with.
    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(Error::ReadOnly)
        }
    }

    fn seek_to(&mut self, page_id: PageId) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl PageStore for DiskManager {
    fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.seek_to(page_id)?;
        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.ensure_writable()?;
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.seek_to(page_id)?;
        self.file.write_all(page.as_slice())?;

        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        self.ensure_writable()?;
        let page_id = PageId::new(self.page_count);

        // Extend file with a zeroed page
        self.seek_to(page_id)?;
        let zeros = [0u8; PAGE_SIZE];
        self.file.write_all(&zeros)?;

        self.page_count += 1;
        Ok(page_id)
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn sync(&mut self) -> Result<()> {
        if self.mode.is_writable() {
            self.file.sync_all()?;
        }
        Ok(())
    }
}
