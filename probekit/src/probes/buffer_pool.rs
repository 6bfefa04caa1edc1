use parking_lot::Mutex;

/// Upper bound of idle buffers kept around between reads.
const MAX_IDLE_BUFFERS: usize = 64;

/// Recycles banner read buffers across probes.
pub(crate) struct BufferPool {
    pool: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub(crate) fn new() -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
        }
    }

    /// Hands out a zeroed buffer of exactly `len` bytes.
    pub(crate) fn get(&self, len: usize) -> Vec<u8> {
        let mut buf = self.pool.lock().pop().unwrap_or_default();
        buf.clear();
        buf.resize(len, 0);
        buf
    }

    pub(crate) fn put(&self, buf: Vec<u8>) {
        let mut pool = self.pool.lock();
        if pool.len() < MAX_IDLE_BUFFERS {
            pool.push(buf);
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.pool.lock().len()
    }
}
