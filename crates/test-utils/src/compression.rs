//! Compress fixtures the way the open-data server ships them.

use std::io::Write;

/// bzip2-compress `data`.
pub fn bzip2_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
    encoder.write_all(data).expect("bzip2 write");
    encoder.finish().expect("bzip2 finish")
}

/// gzip-compress `data`.
pub fn gzip_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}
