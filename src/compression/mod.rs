//! Huffman compression for transaction log archives

mod bits;
pub mod huffman;

pub use huffman::{
    compress, compress_bytes, compress_file, decompress, decompress_bytes, decompress_file,
    CodeTable, CompressionStats, FrequencyTable, HuffmanNode, HuffmanTree,
};
