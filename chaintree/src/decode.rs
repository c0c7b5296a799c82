//! streaming decoder for binary tree files
//!
//! A tree file is a flat sequence of 16 byte records without header or separators.
//! Each record is big endian `parent: i32, node: i32, kza: i32, relprod: f32`.
use crate::{
    error::{Error, Result},
    node::TreeNode,
};
use std::io::{self, Read};
use tracing::{debug, info};

/// size of one encoded record in bytes
pub const RECORD_SIZE: usize = 16;

/// Decodes [TreeNode]s from a reader, one record at a time.
///
/// The iterator ends after the last complete record. If the stream ends in the middle of a
/// record, it yields a single [Error::IncompleteRecord] and then ends. It is fused after
/// any error.
pub struct RecordDecoder<R> {
    reader: R,
    /// total stream length, if known, for progress reporting
    total_len: Option<u64>,
    bytes_read: u64,
    decoded: u64,
    progress_interval: u64,
    done: bool,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            total_len: None,
            bytes_read: 0,
            decoded: 0,
            progress_interval: u64::MAX,
            done: false,
        }
    }

    /// enable progress logging every `interval` records, as percentage of `total_len` left
    pub fn with_progress(mut self, total_len: u64, interval: u64) -> Self {
        self.total_len = Some(total_len);
        self.progress_interval = interval.max(1);
        self
    }

    /// number of records decoded so far
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// fill as much of buf as the reader will give us. Returns the number of bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read = 0;
        while read < buf.len() {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(read)
    }

    fn report_progress(&self) {
        if let Some(total) = self.total_len {
            if self.decoded % self.progress_interval == 0 && total > 0 {
                let left = total.saturating_sub(self.bytes_read) as f64 / total as f64;
                info!("{}% left to be read.", (left * 100.0).floor());
            }
        }
    }

    fn next0(&mut self) -> Result<Option<TreeNode>> {
        let mut buf = [0u8; RECORD_SIZE];
        let n = self.fill(&mut buf)?;
        self.bytes_read += n as u64;
        if n == 0 {
            debug!("end of stream after {} records", self.decoded);
            return Ok(None);
        }
        if n < RECORD_SIZE {
            return Err(Error::IncompleteRecord {
                loaded: self.decoded,
                failed: 0,
                remaining: n,
            });
        }
        let node = decode_record(&buf);
        self.decoded += 1;
        #[cfg(feature = "metrics")]
        crate::prom::RECORDS_DECODED.inc();
        self.report_progress();
        Ok(Some(node))
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<TreeNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next0() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(cause) => {
                self.done = true;
                Some(Err(cause))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for RecordDecoder<R> {}

/// decode a single record
pub fn decode_record(buf: &[u8; RECORD_SIZE]) -> TreeNode {
    let word = |i: usize| [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]];
    let parent = i32::from_be_bytes(word(0));
    let node = i32::from_be_bytes(word(4));
    let kza = i32::from_be_bytes(word(8));
    let weight = f32::from_be_bytes(word(12));
    TreeNode::new(node, kza, parent, weight as f64)
}

/// encode a single record. The weight is narrowed to f32.
pub fn encode_record(node: &TreeNode) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..4].copy_from_slice(&node.parent_id.0.to_be_bytes());
    buf[4..8].copy_from_slice(&node.node_id.0.to_be_bytes());
    buf[8..12].copy_from_slice(&node.identifier_code.to_be_bytes());
    buf[12..16].copy_from_slice(&(node.weight as f32).to_be_bytes());
    buf
}

/// encode a sequence of nodes into the binary file format
pub fn encode_all<'a>(nodes: impl IntoIterator<Item = &'a TreeNode>) -> Vec<u8> {
    let mut res = Vec::new();
    for node in nodes {
        res.extend_from_slice(&encode_record(node));
    }
    res
}
