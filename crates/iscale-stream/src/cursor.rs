use iscale_image::SampleSlice;

/// A read position over the canonical samples handed to a stream.
#[derive(Clone, Copy, Debug)]
pub struct InputCursor<'a> {
    samples: SampleSlice<'a>,
    pos: usize,
}

impl<'a> InputCursor<'a> {
    /// Create a cursor at the start of `samples`.
    pub fn new(samples: SampleSlice<'a>) -> Self {
        Self { samples, pos: 0 }
    }

    /// Samples not yet consumed.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.pos
    }

    /// Whether every sample has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Storage bits of the underlying samples.
    pub fn bits(&self) -> u32 {
        self.samples.bits()
    }

    /// Consume the next `len` samples, if that many remain.
    pub fn take(&mut self, len: usize) -> Option<SampleSlice<'a>> {
        if self.remaining() < len {
            return None;
        }
        let taken = self.samples.slice(self.pos, self.pos + len);
        self.pos += len;
        Some(taken)
    }
}
