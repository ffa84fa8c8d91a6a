//! Pipeline stages: disassembly, classification, judging and the driver that
//! runs them over the fixture matrix.

pub mod backends;
pub mod classifier;
pub mod compiler;
pub mod disassembly;
pub mod normalize;
pub mod oracle;
pub mod report;
pub mod verdict;
