//! Huffman archive codec
//!
//! Archive layout:
//!
//! ```text
//! preorder tree | 0x02 | bitstream | trailer
//! ```
//!
//! The tree is written root-left-right, `0x00` for an internal node and
//! `0x01 <byte>` for a leaf. The bitstream is the concatenation of every input
//! byte's code, packed MSB-first with the final byte zero-padded; the trailer
//! byte records how many bits of that final byte are significant.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{CofferError, CofferResult};

use super::bits::{read_byte, BitReader, BitWriter};

/// Flag byte for an internal tree node
pub const FLAG_INTERNAL: u8 = 0x00;

/// Flag byte preceding a leaf's byte value
pub const FLAG_LEAF: u8 = 0x01;

/// Separator between the serialized tree and the bitstream
pub const SEPARATOR: u8 = 0x02;

/// Deepest node accepted when reading a tree
pub const MAX_TREE_HEIGHT: usize = 256;

const SCAN_BUFFER_SIZE: usize = 8192;

/// Occurrence count for each byte value
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Count every byte of a reader
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut table = Self::new();
        let mut buf = vec![0u8; SCAN_BUFFER_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            table.add(&buf[..n]);
        }
        Ok(table)
    }

    pub fn add(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.counts[byte as usize] += 1;
        }
    }

    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Number of distinct byte values present
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A node of the code tree; children are owned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    Leaf {
        byte: u8,
    },
    Internal {
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
    },
}

impl HuffmanNode {
    fn internal(left: HuffmanNode, right: HuffmanNode) -> Self {
        Self::Internal {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Priority queue entry; the heap pops the lowest weight, then the earliest arrival
struct QueueEntry {
    weight: u64,
    order: u64,
    node: HuffmanNode,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.order == other.order
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Prefix-free code tree over the bytes of one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffmanNode,
}

impl HuffmanTree {
    /// Build the tree for a frequency table
    ///
    /// A single distinct byte gets a zero-frequency sibling leaf so that it
    /// still receives a one-bit code.
    pub fn from_frequencies(frequencies: &FrequencyTable) -> CofferResult<Self> {
        let mut heap = BinaryHeap::new();
        let mut order = 0u64;

        for byte in 0..=u8::MAX {
            let weight = frequencies.count(byte);
            if weight > 0 {
                heap.push(QueueEntry {
                    weight,
                    order,
                    node: HuffmanNode::Leaf { byte },
                });
                order += 1;
            }
        }

        if let (1, Some(byte)) = (
            heap.len(),
            (0..=u8::MAX).find(|&b| frequencies.count(b) > 0),
        ) {
            return Ok(Self {
                root: HuffmanNode::internal(
                    HuffmanNode::Leaf { byte },
                    HuffmanNode::Leaf {
                        byte: byte.wrapping_add(1),
                    },
                ),
            });
        }

        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };
            heap.push(QueueEntry {
                weight: left.weight + right.weight,
                order,
                node: HuffmanNode::internal(left.node, right.node),
            });
            order += 1;
        }

        heap.pop()
            .map(|entry| Self { root: entry.node })
            .ok_or(CofferError::EmptyInput)
    }

    pub fn root(&self) -> &HuffmanNode {
        &self.root
    }

    pub fn leaf_count(&self) -> usize {
        fn count(node: &HuffmanNode) -> usize {
            match node {
                HuffmanNode::Leaf { .. } => 1,
                HuffmanNode::Internal { left, right } => count(left) + count(right),
            }
        }
        count(&self.root)
    }

    /// Length of the longest root-to-leaf path
    pub fn height(&self) -> usize {
        fn depth(node: &HuffmanNode) -> usize {
            match node {
                HuffmanNode::Leaf { .. } => 0,
                HuffmanNode::Internal { left, right } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    /// Derive codes (left = 0, right = 1) for the bytes that occur in `frequencies`
    ///
    /// The zero-frequency sibling of a single-symbol tree gets no code.
    pub fn code_table(&self, frequencies: &FrequencyTable) -> CodeTable {
        fn walk(
            node: &HuffmanNode,
            prefix: &mut Vec<bool>,
            frequencies: &FrequencyTable,
            table: &mut CodeTable,
        ) {
            match node {
                HuffmanNode::Leaf { byte } => {
                    if frequencies.count(*byte) > 0 {
                        table.codes[*byte as usize] = Some(prefix.clone());
                    }
                }
                HuffmanNode::Internal { left, right } => {
                    prefix.push(false);
                    walk(left, prefix, frequencies, table);
                    prefix.pop();
                    prefix.push(true);
                    walk(right, prefix, frequencies, table);
                    prefix.pop();
                }
            }
        }

        let mut table = CodeTable {
            codes: vec![None; 256],
        };
        walk(&self.root, &mut Vec::new(), frequencies, &mut table);
        table
    }

    /// Serialize the tree in preorder
    pub fn write_preorder<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        fn write_node<W: Write>(node: &HuffmanNode, writer: &mut W) -> io::Result<()> {
            match node {
                HuffmanNode::Leaf { byte } => writer.write_all(&[FLAG_LEAF, *byte]),
                HuffmanNode::Internal { left, right } => {
                    writer.write_all(&[FLAG_INTERNAL])?;
                    write_node(left, writer)?;
                    write_node(right, writer)
                }
            }
        }
        write_node(&self.root, writer)
    }

    /// Rebuild a tree written by [`HuffmanTree::write_preorder`]
    pub fn read_preorder<R: Read>(reader: &mut R) -> CofferResult<Self> {
        fn read_node<R: Read>(reader: &mut R, depth: usize) -> CofferResult<HuffmanNode> {
            if depth > MAX_TREE_HEIGHT {
                return Err(CofferError::MalformedArchive(format!(
                    "code tree deeper than {} levels",
                    MAX_TREE_HEIGHT
                )));
            }

            match read_byte(reader)? {
                Some(FLAG_LEAF) => match read_byte(reader)? {
                    Some(byte) => Ok(HuffmanNode::Leaf { byte }),
                    None => Err(truncated_tree()),
                },
                Some(FLAG_INTERNAL) => {
                    let left = read_node(reader, depth + 1)?;
                    let right = read_node(reader, depth + 1)?;
                    Ok(HuffmanNode::internal(left, right))
                }
                Some(flag) => Err(CofferError::MalformedArchive(format!(
                    "unknown tree node flag 0x{:02x}",
                    flag
                ))),
                None => Err(truncated_tree()),
            }
        }

        let root = read_node(reader, 0)?;
        if let HuffmanNode::Leaf { .. } = root {
            return Err(CofferError::MalformedArchive(
                "code tree root is a leaf".into(),
            ));
        }
        Ok(Self { root })
    }
}

fn truncated_tree() -> CofferError {
    CofferError::MalformedArchive("archive ends inside the code tree".into())
}

/// Byte value -> bit code
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: Vec<Option<Vec<bool>>>,
}

impl CodeTable {
    pub fn code(&self, byte: u8) -> Option<&[bool]> {
        self.codes[byte as usize].as_deref()
    }

    /// Iterate over `(byte, code)` for every leaf
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[bool])> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(byte, code)| code.as_deref().map(|c| (byte as u8, c)))
    }

    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sizes observed while compressing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub distinct_symbols: usize,
}

/// Counts bytes passing through to the inner writer
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Compress `input` into `output`
///
/// The input is scanned twice (frequencies, then encoding), hence `Seek`.
pub fn compress<R: Read + Seek, W: Write>(
    mut input: R,
    output: W,
) -> CofferResult<CompressionStats> {
    let frequencies = FrequencyTable::from_reader(&mut input)?;
    let tree = HuffmanTree::from_frequencies(&frequencies)?;
    let table = tree.code_table(&frequencies);

    let mut counter = CountingWriter {
        inner: output,
        count: 0,
    };
    tree.write_preorder(&mut counter)?;
    counter.write_all(&[SEPARATOR])?;

    input.seek(SeekFrom::Start(0))?;
    let mut bits = BitWriter::new(counter);
    let mut buf = vec![0u8; SCAN_BUFFER_SIZE];
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &byte in &buf[..n] {
            let code = table.code(byte).ok_or_else(|| {
                CofferError::Io("input changed between compression passes".into())
            })?;
            bits.write_code(code)?;
        }
    }
    let mut counter = bits.finish()?;
    counter.flush()?;

    Ok(CompressionStats {
        input_bytes: frequencies.total(),
        output_bytes: counter.count,
        distinct_symbols: frequencies.distinct(),
    })
}

/// Decompress an archive from `input` into `output`
///
/// Returns the number of bytes written.
pub fn decompress<R: Read, W: Write>(mut input: R, mut output: W) -> CofferResult<u64> {
    let tree = HuffmanTree::read_preorder(&mut input)?;

    match read_byte(&mut input)? {
        Some(SEPARATOR) => {}
        Some(other) => {
            return Err(CofferError::MalformedArchive(format!(
                "expected separator 0x{:02x}, found 0x{:02x}",
                SEPARATOR, other
            )))
        }
        None => {
            return Err(CofferError::MalformedArchive(
                "archive ends before the separator".into(),
            ))
        }
    }

    let root = tree.root();
    let mut node = root;
    let mut written = 0u64;
    let mut bits = BitReader::new(input);

    while let Some(bit) = bits.read_bit()? {
        let HuffmanNode::Internal { left, right } = node else {
            return Err(CofferError::MalformedArchive(
                "bit walk reached a missing child".into(),
            ));
        };
        node = if bit { right } else { left };

        if let HuffmanNode::Leaf { byte } = node {
            output.write_all(&[*byte])?;
            written += 1;
            node = root;
        }
    }
    // A partially walked code at the end carries no symbol
    output.flush()?;

    Ok(written)
}

/// Compress a file into a new archive file
///
/// Nothing is left at `output_path` when compression fails.
pub fn compress_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> CofferResult<CompressionStats> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input = File::open(input_path).map_err(|e| {
        CofferError::Io(format!("Failed to open {}: {}", input_path.display(), e))
    })?;
    let output = File::create(output_path).map_err(|e| {
        CofferError::Io(format!("Failed to create {}: {}", output_path.display(), e))
    })?;

    let stats = compress(BufReader::new(input), BufWriter::new(output))
        .inspect_err(|_| discard_output(output_path))?;
    debug!(
        path = %output_path.display(),
        input_bytes = stats.input_bytes,
        output_bytes = stats.output_bytes,
        "compressed file"
    );
    Ok(stats)
}

/// Decompress an archive file
///
/// Nothing is left at `output_path` when decompression fails.
pub fn decompress_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> CofferResult<u64> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input = File::open(input_path).map_err(|e| {
        CofferError::Io(format!("Failed to open {}: {}", input_path.display(), e))
    })?;
    let output = File::create(output_path).map_err(|e| {
        CofferError::Io(format!("Failed to create {}: {}", output_path.display(), e))
    })?;

    decompress(BufReader::new(input), BufWriter::new(output))
        .inspect_err(|_| discard_output(output_path))
}

fn discard_output(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        debug!(path = %path.display(), error = %e, "could not remove partial output");
    }
}

/// Compress an in-memory buffer
pub fn compress_bytes(data: &[u8]) -> CofferResult<Vec<u8>> {
    let mut out = Vec::new();
    compress(Cursor::new(data), &mut out)?;
    Ok(out)
}

/// Decompress an in-memory archive
pub fn decompress_bytes(archive: &[u8]) -> CofferResult<Vec<u8>> {
    let mut out = Vec::new();
    decompress(archive, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn round_trip(data: &[u8]) {
        let archive = compress_bytes(data).unwrap();
        assert_eq!(decompress_bytes(&archive).unwrap(), data);
    }

    fn frequencies_of(data: &[u8]) -> FrequencyTable {
        let mut freq = FrequencyTable::new();
        freq.add(data);
        freq
    }

    fn tree_for(data: &[u8]) -> HuffmanTree {
        HuffmanTree::from_frequencies(&frequencies_of(data)).unwrap()
    }

    fn codes_for(data: &[u8]) -> CodeTable {
        tree_for(data).code_table(&frequencies_of(data))
    }

    #[test]
    fn test_single_byte_literal_archive() {
        let archive = compress_bytes(b"A").unwrap();
        // internal, leaf 'A', dummy leaf 'B', separator, one zero bit, trailer
        assert_eq!(archive, vec![0x00, 0x01, b'A', 0x01, b'B', 0x02, 0x00, 0x01]);
        assert_eq!(decompress_bytes(&archive).unwrap(), b"A");
    }

    #[test]
    fn test_single_distinct_byte_tree() {
        let tree = tree_for(&[b'A'; 1000]);
        assert_eq!(tree.leaf_count(), 2);

        let table = codes_for(&[b'A'; 1000]);
        assert_eq!(table.code(b'A'), Some(&[false][..]));
        assert_eq!(table.code(b'B'), None);
        assert_eq!(table.len(), 1);

        round_trip(&[b'A'; 1000]);
    }

    #[test]
    fn test_dummy_wraps_at_max_byte() {
        let tree = tree_for(&[0xFF; 3]);
        assert_eq!(tree.leaf_count(), 2);

        let table = codes_for(&[0xFF; 3]);
        assert_eq!(table.code(0xFF), Some(&[false][..]));
        assert_eq!(table.code(0x00), None);
        round_trip(&[0xFF; 3]);
    }

    #[test]
    fn test_two_symbols_padding_not_emitted() {
        let archive = compress_bytes(b"AB").unwrap();
        assert_eq!(
            archive,
            vec![0x00, 0x01, b'A', 0x01, b'B', 0x02, 0b0100_0000, 0x02]
        );
        assert_eq!(decompress_bytes(&archive).unwrap(), b"AB");
    }

    #[test]
    fn test_all_byte_values() {
        let data: Vec<u8> = (0..=255u8).collect();
        let tree = tree_for(&data);
        assert_eq!(tree.leaf_count(), 256);
        assert!(tree.height() <= MAX_TREE_HEIGHT);
        round_trip(&data);

        let repeated: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 256) as u8).collect();
        round_trip(&repeated);
    }

    #[test]
    fn test_text_round_trip_compresses() {
        let text = "2025-01-04T10:00:00Z|Deposit|100.00|1000\n".repeat(200);
        let archive = compress_bytes(text.as_bytes()).unwrap();
        assert!(archive.len() < text.len());
        assert_eq!(decompress_bytes(&archive).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(compress_bytes(b""), Err(CofferError::EmptyInput)));
    }

    #[test]
    fn test_merge_order_and_tie_break() {
        // a:4 b:2 c:1 -> c and b merge first (c popped first, goes left)
        let table = codes_for(b"aaaabbc");
        assert_eq!(table.code(b'c'), Some(&[false, false][..]));
        assert_eq!(table.code(b'b'), Some(&[false, true][..]));
        assert_eq!(table.code(b'a'), Some(&[true][..]));
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let data = b"the quick brown fox jumps over the lazy dog 0123456789";
        let table = codes_for(data);
        let codes: Vec<_> = table.iter().map(|(_, c)| c.to_vec()).collect();
        assert_eq!(codes.len(), table.len());

        for (i, a) in codes.iter().enumerate() {
            assert!(!a.is_empty());
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{:?} is a prefix of {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_preorder_round_trip() {
        let tree = tree_for(b"mississippi");
        let mut bytes = Vec::new();
        tree.write_preorder(&mut bytes).unwrap();
        let restored = HuffmanTree::read_preorder(&mut bytes.as_slice()).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_malformed_archives_rejected() {
        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("empty", vec![]),
            ("truncated tree", vec![0x00, 0x01]),
            ("leaf without value", vec![0x00, 0x01, b'A', 0x01]),
            ("unknown flag", vec![0x07]),
            ("leaf root", vec![0x01, b'A', 0x02, 0x00, 0x01]),
            ("missing separator", vec![0x00, 0x01, b'A', 0x01, b'B']),
            ("wrong separator", vec![0x00, 0x01, b'A', 0x01, b'B', 0x03, 0x00, 0x01]),
            ("missing trailer", vec![0x00, 0x01, b'A', 0x01, b'B', 0x02]),
            ("bad trailer", vec![0x00, 0x01, b'A', 0x01, b'B', 0x02, 0x00, 0x0A]),
            ("too deep", vec![0x00; MAX_TREE_HEIGHT + 2]),
        ];

        for (name, archive) in cases {
            match decompress_bytes(&archive) {
                Err(CofferError::MalformedArchive(_)) => {}
                other => panic!("{}: expected MalformedArchive, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_trailing_partial_code_discarded() {
        // codes: c=00 b=01 a=1; bitstream "1" + "0" leaves a dangling half code
        let mut archive = Vec::new();
        tree_for(b"aaaabbc").write_preorder(&mut archive).unwrap();
        archive.extend_from_slice(&[SEPARATOR, 0b1000_0000, 2]);
        assert_eq!(decompress_bytes(&archive).unwrap(), b"a");
    }

    #[test]
    fn test_failed_file_operations_leave_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty.txt");
        let archive = temp_dir.path().join("empty.huff");
        fs::write(&empty, b"").unwrap();

        assert!(matches!(
            compress_file(&empty, &archive),
            Err(CofferError::EmptyInput)
        ));
        assert!(!archive.exists());

        let bogus = temp_dir.path().join("bogus.huff");
        let restored = temp_dir.path().join("restored.txt");
        fs::write(&bogus, [0x07, 0x01]).unwrap();
        assert!(matches!(
            decompress_file(&bogus, &restored),
            Err(CofferError::MalformedArchive(_))
        ));
        assert!(!restored.exists());
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("log.txt");
        let archive = temp_dir.path().join("log.huff");
        let output = temp_dir.path().join("restored.txt");

        let text = "2025-01-04T10:00:00Z|Withdraw|20.00|1001\n".repeat(50);
        fs::write(&input, &text).unwrap();

        let stats = compress_file(&input, &archive).unwrap();
        assert_eq!(stats.input_bytes, text.len() as u64);
        assert_eq!(stats.output_bytes, fs::metadata(&archive).unwrap().len());

        let written = decompress_file(&archive, &output).unwrap();
        assert_eq!(written, text.len() as u64);
        assert_eq!(fs::read_to_string(&output).unwrap(), text);
    }
}
