//! The row abstraction operand evaluators read from.
//!
//! The arithmetic core forwards a message reference to every operand call
//! and never inspects the contents itself; only operand implementations
//! (field selectors and the like, built by the surrounding compiler) know
//! how to read parts.

use bytes::Bytes;

/// A batch of message parts addressed by index.
pub trait Message: Send + Sync {
    /// Number of parts in the batch.
    fn len(&self) -> usize;

    /// Raw content of part `index`, if present.
    fn get(&self, index: usize) -> Option<&[u8]>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory message backed by a list of byte parts.
#[derive(Debug, Clone, Default)]
pub struct MemoryMessage {
    parts: Vec<Bytes>,
}

impl MemoryMessage {
    pub fn new(parts: Vec<Bytes>) -> Self {
        Self { parts }
    }

    /// Append a part to the batch.
    pub fn push(&mut self, part: impl Into<Bytes>) {
        self.parts.push(part.into());
    }
}

impl Message for MemoryMessage {
    fn len(&self) -> usize {
        self.parts.len()
    }

    fn get(&self, index: usize) -> Option<&[u8]> {
        self.parts.get(index).map(|part| part.as_ref())
    }
}
