//! Content fingerprinting.
//!
//! Files are identified by the SHA-256 of their bytes together with their
//! length. Input is consumed as a forward-only stream in fixed-size chunks,
//! so memory use stays constant regardless of file size.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 of a byte stream and the number of bytes it contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    /// 64 lowercase hex characters.
    pub sha256: String,
    pub size: u64,
}

/// Hash everything `reader` yields.
///
/// The reported size is the count of bytes actually hashed, so digest and
/// size always describe the same content even if the source changes while
/// it is being read.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok(ContentDigest {
        sha256: format!("{:x}", hasher.finalize()),
        size,
    })
}

/// Open `path` and hash its contents.
pub fn sha256_file(path: &Path) -> io::Result<ContentDigest> {
    let file = File::open(path)?;
    sha256_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn known_vectors() {
        let d = sha256_reader(&b"hello"[..]).unwrap();
        assert_eq!(d.sha256, HELLO_SHA256);
        assert_eq!(d.size, 5);

        let d = sha256_reader(&b""[..]).unwrap();
        assert_eq!(d.sha256, EMPTY_SHA256);
        assert_eq!(d.size, 0);
    }

    #[test]
    fn chunked_matches_one_shot() {
        // Spans several chunks and ends mid-chunk.
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = sha256_reader(std::io::Cursor::new(&data)).unwrap();
        let one_shot = format!("{:x}", Sha256::digest(&data));

        assert_eq!(streamed.sha256, one_shot);
        assert_eq!(streamed.size, data.len() as u64);
    }

    #[test]
    fn single_byte_difference() {
        let a = sha256_reader(&b"hello world"[..]).unwrap();
        let b = sha256_reader(&b"hello worle"[..]).unwrap();
        assert_ne!(a.sha256, b.sha256);
        assert_eq!(a.size, b.size);
    }

    #[test]
    fn hashes_file_on_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let d = sha256_file(&path).unwrap();
        assert_eq!(d.sha256, HELLO_SHA256);
        assert_eq!(d.size, 5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = sha256_file(&tmp.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn read_failure_propagates() {
        struct Failing(usize);
        impl Read for Failing {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
                }
                self.0 -= 1;
                buf[0] = b'x';
                Ok(1)
            }
        }

        let err = sha256_reader(Failing(3)).unwrap_err();
        assert_eq!(err.to_string(), "device gone");
    }
}
