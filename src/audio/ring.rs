/// Fixed-capacity circular store of the most recent samples.
/// Pre-allocated, never grows; the oldest sample is overwritten once full.
pub struct SampleRing {
    buffer: Box<[f32]>,
    write_pos: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample ring capacity must be non-zero");
        Self {
            buffer: vec![0.0; capacity].into_boxed_slice(),
            write_pos: 0,
        }
    }

    /// Appends `frames`, overwriting the oldest samples. Cannot fail.
    #[inline]
    pub fn ingest(&mut self, frames: &[f32]) {
        let capacity = self.buffer.len();
        for &s in frames {
            self.buffer[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % capacity;
        }
    }

    /// Copies the ring into `out` in chronological order (oldest first).
    pub fn snapshot_into(&self, out: &mut [f32]) {
        assert_eq!(out.len(), self.buffer.len(), "snapshot length mismatch");
        let (newer, older) = self.buffer.split_at(self.write_pos);
        out[..older.len()].copy_from_slice(older);
        out[older.len()..].copy_from_slice(newer);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.buffer.len()];
        self.snapshot_into(&mut out);
        out
    }

    /// Replaces the ring contents with a chronological window of equal length.
    /// Used when filtered samples are written back into the ring.
    pub fn overwrite_from(&mut self, window: &[f32]) {
        assert_eq!(window.len(), self.buffer.len(), "overwrite length mismatch");
        let split = self.buffer.len() - self.write_pos;
        let (older, newer) = window.split_at(split);
        self.buffer[self.write_pos..].copy_from_slice(older);
        self.buffer[..self.write_pos].copy_from_slice(newer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_silent() {
        let ring = SampleRing::new(4);
        assert_eq!(ring.snapshot(), vec![0.0; 4]);
    }

    #[test]
    fn partial_fill_keeps_zeros_oldest() {
        let mut ring = SampleRing::new(4);
        ring.ingest(&[1.0, 2.0]);
        assert_eq!(ring.snapshot(), vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn n_plus_one_overwrites_oldest() {
        let mut ring = SampleRing::new(4);
        ring.ingest(&[0.0, 0.1, 0.2, 0.3, 0.4]);
        assert_eq!(ring.snapshot(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn wraps_across_many_blocks() {
        let mut ring = SampleRing::new(8);
        let mut all = Vec::new();
        for block in 0..7 {
            let frames: Vec<f32> = (0..3).map(|i| (block * 3 + i) as f32).collect();
            ring.ingest(&frames);
            all.extend(frames);
        }
        assert_eq!(ring.snapshot(), all[all.len() - 8..].to_vec());
    }

    #[test]
    fn oversized_block_keeps_most_recent() {
        let mut ring = SampleRing::new(4);
        let frames: Vec<f32> = (0..10).map(|i| i as f32).collect();
        ring.ingest(&frames);
        assert_eq!(ring.snapshot(), vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn overwrite_round_trips_with_snapshot() {
        let mut ring = SampleRing::new(5);
        ring.ingest(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let mut window = ring.snapshot();
        for x in window.iter_mut() {
            *x *= 10.0;
        }
        ring.overwrite_from(&window);
        assert_eq!(ring.snapshot(), window);

        // Writes continue from the same cursor.
        ring.ingest(&[8.0]);
        assert_eq!(ring.snapshot(), vec![40.0, 50.0, 60.0, 70.0, 8.0]);
    }
}
