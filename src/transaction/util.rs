//! Hashing plumbing used by the transaction codec.

pub mod sha256d {
    use sha2::{Digest, Sha256};
    use std::io::{self, Read, Write};

    /// Abstraction over a writer which double-SHA256-hashes the data being written.
    pub struct HashWriter {
        hasher: Sha256,
    }

    impl Default for HashWriter {
        fn default() -> Self {
            HashWriter {
                hasher: Sha256::new(),
            }
        }
    }

    impl Write for HashWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.hasher.update(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl HashWriter {
        /// Destroy this writer and return the double-SHA256 of the data written to it.
        pub fn into_hash(self) -> [u8; 32] {
            let mut hash = [0; 32];
            hash.copy_from_slice(&Sha256::digest(self.hasher.finalize()));
            hash
        }
    }

    /// Abstraction over a reader which double-SHA256-hashes the data being read.
    pub struct HashReader<R: Read> {
        reader: R,
        hasher: Sha256,
    }

    impl<R: Read> HashReader<R> {
        /// Construct a new `HashReader` given an existing `reader` by value.
        pub fn new(reader: R) -> Self {
            HashReader {
                reader,
                hasher: Sha256::new(),
            }
        }

        /// Destroy this reader and return the double-SHA256 of the data read through it.
        pub fn into_hash(self) -> [u8; 32] {
            let mut hash = [0; 32];
            hash.copy_from_slice(&Sha256::digest(self.hasher.finalize()));
            hash
        }
    }

    impl<R: Read> Read for HashReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let bytes = self.reader.read(buf)?;
            if bytes > 0 {
                self.hasher.update(&buf[0..bytes]);
            }
            Ok(bytes)
        }
    }

}
