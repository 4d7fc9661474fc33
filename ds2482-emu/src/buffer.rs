/// Bytes of the most recent inbound write transaction.
///
/// One slot is always kept free, so at most `N - 1` bytes are retained.
/// A cursor tracks how many parameter bytes the dispatcher has consumed.
#[derive(Debug, Clone)]
pub struct CommandBuffer<const N: usize> {
    data: [u8; N],
    len: usize,
    cursor: usize,
}

impl<const N: usize> Default for CommandBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CommandBuffer<N> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            len: 0,
            cursor: 0,
        }
    }

    /// Number of bytes that can be retained.
    pub const fn capacity(&self) -> usize {
        N.saturating_sub(1)
    }

    /// Discard the buffered transaction.
    pub fn reset(&mut self) {
        self.len = 0;
        self.cursor = 0;
    }

    /// Append a byte. Returns `false` and drops the byte if the buffer is full.
    pub fn append(&mut self, byte: u8) -> bool {
        if self.len >= self.capacity() {
            return false;
        }
        self.data[self.len] = byte;
        self.len += 1;
        true
    }

    /// The opcode of the buffered transaction, if any byte has arrived.
    pub fn first_command_byte(&self) -> Option<u8> {
        self.as_slice().first().copied()
    }

    /// Whether a byte is present at `index`. Index 0 is the opcode itself.
    pub fn has_parameter_at(&self, index: usize) -> bool {
        index < self.len
    }

    /// Byte at `index`, if it has arrived.
    pub fn parameter(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// Consume the next parameter byte following the opcode.
    pub fn take_parameter(&mut self) -> Option<u8> {
        let byte = self.parameter(self.cursor + 1)?;
        self.cursor += 1;
        Some(byte)
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no byte is buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffered bytes in arrival order.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}
