use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, PageLayout, SlottedPage};
use log::{info, trace};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Append-only file of fixed-size pages. Page `i` lives at byte offset
/// `i * page_size`.
pub struct PageStore {
    file: File,
    layout: PageLayout,
    num_pages: u32,
}

impl PageStore {
    /// Create a fresh store, truncating any existing file. The new store
    /// holds a single empty page.
    pub fn create(path: &Path, layout: PageLayout) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Self::init(file, layout, path)
    }

    /// Open a store, creating the file if it does not exist.
    pub fn open(path: &Path, layout: PageLayout) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Self::init(file, layout, path)
    }

    fn init(file: File, layout: PageLayout, path: &Path) -> StorageResult<Self> {
        let file_size = file.metadata()?.len();
        let page_size = layout.page_size() as u64;
        if file_size % page_size != 0 {
            return Err(StorageError::Corrupted(format!(
                "{:?} is {} bytes, not a multiple of the {} byte page size",
                path, file_size, page_size
            )));
        }

        let mut store = Self {
            file,
            layout,
            num_pages: (file_size / page_size) as u32,
        };
        info!("Opened page store {:?} with {} pages", path, store.num_pages);

        if store.num_pages == 0 {
            store.extend()?;
        }
        Ok(store)
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Append one empty page and return its id.
    pub fn extend(&mut self) -> StorageResult<PageId> {
        let page_id = PageId(self.num_pages);
        let page = SlottedPage::new(self.layout);

        self.file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        self.file.write_all(page.data())?;
        self.file.sync_all()?;

        self.num_pages += 1;
        info!("Extended page store to {} pages", self.num_pages);
        Ok(page_id)
    }

    /// Read the full image of `page_id`.
    pub fn load(&mut self, page_id: PageId) -> StorageResult<SlottedPage> {
        if page_id.0 >= self.num_pages {
            return Err(StorageError::PageNotFound(page_id));
        }

        self.file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        let mut buf = vec![0u8; self.layout.page_size()];
        let read = read_full(&mut self.file, &mut buf)?;
        if read != buf.len() {
            return Err(StorageError::ShortRead { page_id, read });
        }

        trace!("Loaded page {} from disk", page_id);
        SlottedPage::from_bytes(self.layout, buf)
    }

    /// Write the full image of `page` back to `page_id`.
    pub fn flush(&mut self, page_id: PageId, page: &SlottedPage) -> StorageResult<()> {
        if page_id.0 >= self.num_pages {
            return Err(StorageError::PageNotFound(page_id));
        }
        if page.layout() != self.layout {
            return Err(StorageError::InvalidLayout(format!(
                "page layout {:?} does not match store layout {:?}",
                page.layout(),
                self.layout
            )));
        }

        self.file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        self.file.write_all(page.data())?;
        self.file.sync_all()?;

        trace!("Flushed page {} to disk", page_id);
        Ok(())
    }

    fn page_offset(&self, page_id: PageId) -> u64 {
        page_id.0 as u64 * self.layout.page_size() as u64
    }
}

/// Like `read_exact`, but reports how many bytes were read before EOF.
fn read_full(file: &mut File, buf: &mut [u8]) -> StorageResult<usize> {
    let mut read = 0;
    while read < buf.len() {
        match file.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(read)
}
