//! Byte-level progress reporting for readers

use std::io::{self, Read};

/// How far a load has come
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub bytes_read: u64,
    /// Size of the source in bytes, 0 when unknown
    pub total: u64,
}

impl LoadProgress {
    pub fn new(bytes_read: u64, total: u64) -> Self {
        Self { bytes_read, total }
    }

    /// Progress of a finished load
    pub fn complete(total: u64) -> Self {
        Self { bytes_read: total, total }
    }

    /// Percentage in `[0, 100]`
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return if self.bytes_read == 0 { 0.0 } else { 100.0 };
        }
        (self.bytes_read.min(self.total) as f64 / self.total as f64 * 100.0) as f32
    }
}

/// Wraps a reader and calls back with the running byte count after every read
pub struct ProgressReader<R, F> {
    inner: R,
    bytes_read: u64,
    total: u64,
    on_progress: F,
}

impl<R: Read, F: FnMut(LoadProgress)> ProgressReader<R, F> {
    pub fn new(inner: R, total: u64, on_progress: F) -> Self {
        Self {
            inner,
            bytes_read: 0,
            total,
            on_progress,
        }
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress::new(self.bytes_read, self.total)
    }
}

impl<R: Read, F: FnMut(LoadProgress)> Read for ProgressReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.bytes_read += n as u64;
            let progress = self.progress();
            (self.on_progress)(progress);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_percent() {
        assert_eq!(LoadProgress::new(0, 200).percent(), 0.0);
        assert_eq!(LoadProgress::new(50, 200).percent(), 25.0);
        assert_eq!(LoadProgress::complete(200).percent(), 100.0);
        // Sources growing under us never report more than 100
        assert_eq!(LoadProgress::new(300, 200).percent(), 100.0);
        assert_eq!(LoadProgress::new(0, 0).percent(), 0.0);
        assert_eq!(LoadProgress::complete(0).percent(), 100.0);
    }

    #[test]
    fn test_reader_reports_running_total() {
        let data = vec![7u8; 1000];
        let mut seen = Vec::new();
        {
            let mut reader = ProgressReader::new(Cursor::new(&data), data.len() as u64, |p| seen.push(p));
            let mut buf = [0u8; 300];
            while reader.read(&mut buf).unwrap() > 0 {}
        }

        let counts: Vec<u64> = seen.iter().map(|p| p.bytes_read).collect();
        assert_eq!(counts, vec![300, 600, 900, 1000]);
        assert!(seen.iter().all(|p| p.total == 1000));
    }
}
