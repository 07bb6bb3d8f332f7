//! Protocol encoders
//!
//! Encoders turn a batch into transport-ready frames. Encoding never fails
//! as a whole: a sample that cannot be rendered is skipped and counted.

pub mod line;
pub mod packet;

use bytes::Bytes;
use contracts::ExportBatch;

pub use self::line::LineEncoder;
pub use self::packet::PacketEncoder;

/// Encoder output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    /// Frames for the transport: one stream payload, or one datagram each
    pub frames: Vec<Bytes>,
    /// Records encoded
    pub records: usize,
    /// Samples skipped as unencodable
    pub skipped: usize,
}

impl Encoded {
    /// Total bytes across frames
    pub fn byte_len(&self) -> usize {
        self.frames.iter().map(Bytes::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Encoding capability shared by every protocol
pub trait Encoder {
    /// Encode a batch; identical input yields byte-identical output
    fn encode(&self, batch: &ExportBatch) -> Encoded;
}
