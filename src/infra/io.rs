use std::{
    fs::{self, File},
    io,
    path::Path,
};

use memmap2::Mmap;

use crate::error::CodecError;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Raw file bytes, mapped for large files and buffered otherwise
pub enum FileBytes {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(mmap) => mmap,
            FileBytes::Buffered(bytes) => bytes,
        }
    }
}

pub fn read_bytes_smart<P: AsRef<Path>>(path: P) -> io::Result<FileBytes> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;

    if metadata.len() > MMAP_THRESHOLD {
        let file = File::open(path)?;

        // Safety: the mapping is read-only and dropped before the run ends
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(FileBytes::Mapped(mmap))
    } else {
        Ok(FileBytes::Buffered(fs::read(path)?))
    }
}

/// Read an encoded document; invalid UTF-8 is replaced, never fatal
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String, CodecError> {
    let path = path.as_ref();
    let bytes = read_bytes_smart(path).map_err(|source| CodecError::UnreadableDocument {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(bytes.as_ref()).into_owned())
}

/// Write `content`, creating parent directories as needed
pub fn write_with_parents<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_files_are_buffered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"abc").unwrap();

        let bytes = read_bytes_smart(&path).unwrap();
        assert!(matches!(bytes, FileBytes::Buffered(_)));
        assert_eq!(bytes.as_ref(), b"abc");
    }

    #[test]
    fn large_files_are_mapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, vec![b'x'; (MMAP_THRESHOLD + 1) as usize]).unwrap();

        let bytes = read_bytes_smart(&path).unwrap();
        assert!(matches!(bytes, FileBytes::Mapped(_)));
        assert_eq!(bytes.as_ref().len() as u64, MMAP_THRESHOLD + 1);
    }

    #[test]
    fn missing_document_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, CodecError::UnreadableDocument { .. }));
    }

    #[test]
    fn writes_create_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_with_parents(&path, "hi").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "hi");
    }
}
