use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Latest-frame store shared between the receive path and the tick path.
///
/// `store` runs on the network thread and overwrites any unconsumed payload
/// for the same universe (last writer wins; frames are never queued).
/// `take_all` runs on the tick path and swaps the whole map out under the
/// lock, so every buffered frame is handed over exactly once and dispatch
/// never holds the lock while devices run. A frame arriving during dispatch
/// lands in the fresh map and is picked up on the next tick.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Mutex<BTreeMap<u16, Vec<u8>>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the newest payload for `universe`, replacing any unconsumed one.
    pub fn store(&self, universe: u16, data: Vec<u8>) {
        self.lock().insert(universe, data);
    }

    /// Swap-and-clear: drain every buffered frame in ascending universe order.
    pub fn take_all(&self) -> BTreeMap<u16, Vec<u8>> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of universes currently holding an unconsumed frame.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u16, Vec<u8>>> {
        // Map entries are inserted whole, so the map stays usable even if a
        // holder panicked.
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameBuffer;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn last_writer_wins_per_universe() {
        let buffer = FrameBuffer::new();
        buffer.store(4, vec![1, 1, 1]);
        buffer.store(4, vec![2, 2, 2]);

        let frames = buffer.take_all();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[&4], vec![2, 2, 2]);
    }

    #[test]
    fn take_all_drains_the_buffer() {
        let buffer = FrameBuffer::new();
        buffer.store(1, vec![0xFF]);
        buffer.store(2, vec![0x7F]);

        assert_eq!(buffer.take_all().len(), 2);
        assert_eq!(buffer.pending(), 0);
        assert!(buffer.take_all().is_empty());
    }

    #[test]
    fn concurrent_stores_keep_payloads_intact() {
        let buffer = Arc::new(FrameBuffer::new());
        let writers: Vec<_> = (0u16..8)
            .map(|universe| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for round in 0u8..100 {
                        buffer.store(universe, vec![round; 64]);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        for (universe, data) in buffer.take_all() {
            assert!(universe < 8);
            assert_eq!(data.len(), 64);
            assert!(data.iter().all(|&value| value == data[0]));
        }
    }
}
