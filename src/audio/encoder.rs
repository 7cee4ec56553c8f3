use crate::config::Encoding;
use crate::error::RecorderError;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

/// Stream parameters handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: Encoding,
}

impl From<EncoderSpec> for WavSpec {
    fn from(spec: EncoderSpec) -> Self {
        let (bits_per_sample, sample_format) = match spec.encoding {
            Encoding::F32 => (32, SampleFormat::Float),
            Encoding::I16 => (16, SampleFormat::Int),
        };
        WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// An open encoder, fed from the audio callback one block at a time.
pub trait EncoderSink: Send {
    /// Writes one block of interleaved frames and returns the samples written.
    fn write_block(&mut self, samples: &[f32]) -> usize;

    /// True once a write has failed; later blocks are not written.
    fn failed(&self) -> bool {
        false
    }

    /// Finalizes the encoder, then closes the output handle.
    fn close(self: Box<Self>) -> Result<(), RecorderError>;
}

/// Opens output targets and encoders for a recording session.
pub trait Persistence {
    type Output;

    fn open_output(&mut self, path: &Path) -> Result<Self::Output, RecorderError>;

    /// Takes ownership of `output`; on failure the output is dropped (closed).
    fn open_encoder(
        &mut self,
        output: Self::Output,
        path: &Path,
        spec: EncoderSpec,
    ) -> Result<Box<dyn EncoderSink>, RecorderError>;
}

/// WAV persistence backed by `hound`.
#[derive(Debug, Default)]
pub struct WavPersistence;

impl Persistence for WavPersistence {
    type Output = BufWriter<File>;

    fn open_output(&mut self, path: &Path) -> Result<Self::Output, RecorderError> {
        File::create(path)
            .map(BufWriter::new)
            .map_err(|source| RecorderError::OutputOpen {
                path: path.to_path_buf(),
                source,
            })
    }

    fn open_encoder(
        &mut self,
        output: Self::Output,
        path: &Path,
        spec: EncoderSpec,
    ) -> Result<Box<dyn EncoderSink>, RecorderError> {
        let writer =
            WavWriter::new(output, spec.into()).map_err(|e| RecorderError::EncoderInit {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        log::info!(
            "Encoder opened: {} ({} Hz, {} ch, {:?})",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.encoding
        );

        Ok(Box::new(WavSink {
            writer,
            encoding: spec.encoding,
            path: path.to_path_buf(),
            failed: false,
        }))
    }
}

pub struct WavSink<W: Write + Seek> {
    writer: WavWriter<W>,
    encoding: Encoding,
    path: PathBuf,
    failed: bool,
}

impl<W: Write + Seek + Send> EncoderSink for WavSink<W> {
    fn write_block(&mut self, samples: &[f32]) -> usize {
        if self.failed {
            return 0;
        }

        let mut written = 0;
        for &s in samples {
            let result = match self.encoding {
                Encoding::F32 => self.writer.write_sample(s),
                Encoding::I16 => self
                    .writer
                    .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
            };
            if let Err(e) = result {
                //
                // Further blocks are dropped for this session.
                //
                log::warn!("Encoder write to {} failed: {}", self.path.display(), e);
                self.failed = true;
                break;
            }
            written += 1;
        }
        written
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn close(self: Box<Self>) -> Result<(), RecorderError> {
        let WavSink { writer, path, .. } = *self;
        //
        // finalize() rewrites the header, flushes, and drops the handle.
        //
        writer
            .finalize()
            .map_err(|e| RecorderError::EncoderFinalize(e.to_string()))?;
        log::info!("Encoder finalized: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn spec(encoding: Encoding) -> EncoderSpec {
        EncoderSpec {
            sample_rate: 8000,
            channels: 2,
            encoding,
        }
    }

    #[test]
    fn writes_float_wav_in_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");

        let mut persistence = WavPersistence;
        let output = persistence.open_output(&path).unwrap();
        let mut sink = persistence
            .open_encoder(output, &path, spec(Encoding::F32))
            .unwrap();

        assert_eq!(sink.write_block(&[0.1, -0.1, 0.2, -0.2]), 4);
        assert_eq!(sink.write_block(&[0.3, -0.3]), 2);
        sink.close().unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8000);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    }

    #[test]
    fn writes_clamped_pcm16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take16.wav");

        let mut persistence = WavPersistence;
        let output = persistence.open_output(&path).unwrap();
        let mut sink = persistence
            .open_encoder(output, &path, spec(Encoding::I16))
            .unwrap();
        sink.write_block(&[1.5, -1.5]);
        sink.close().unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, -i16::MAX]);
    }

    /// Accepts writes until `broken` is set.
    struct BreakableWriter {
        inner: std::io::Cursor<Vec<u8>>,
        broken: Arc<AtomicBool>,
    }

    impl Write for BreakableWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"));
            }
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for BreakableWriter {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn write_failure_marks_sink_failed_and_drops_later_blocks() {
        let broken = Arc::new(AtomicBool::new(false));
        let writer = BreakableWriter {
            inner: std::io::Cursor::new(Vec::new()),
            broken: broken.clone(),
        };
        let mut sink = WavSink {
            writer: WavWriter::new(writer, spec(Encoding::F32).into()).unwrap(),
            encoding: Encoding::F32,
            path: PathBuf::from("full.wav"),
            failed: false,
        };

        assert_eq!(sink.write_block(&[0.1, 0.2]), 2);
        assert!(!sink.failed());

        broken.store(true, Ordering::SeqCst);
        assert_eq!(sink.write_block(&[0.3, 0.4]), 0);
        assert!(sink.failed());

        broken.store(false, Ordering::SeqCst);
        assert_eq!(sink.write_block(&[0.5, 0.6]), 0);
        assert!(sink.failed());
    }

    #[test]
    fn unwritable_path_is_output_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("take.wav");

        let err = WavPersistence.open_output(&path).unwrap_err();
        assert!(matches!(err, RecorderError::OutputOpen { .. }));
    }
}
