//! Image decode plus the "wait for both layers" upload pipeline.
//!
//! Each upload runs on its own thread and reports back tagged with a
//! generation number. Only the newest generation is ever delivered;
//! anything older is dropped on arrival (last write wins).

use crate::error::{Error, Result};
use crate::segment::Segmenter;
use crate::types::ImagePair;
use image::RgbaImage;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| Error::DecodeFailed(e.to_string()))
}

pub fn decode_file(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes).map_err(|e| match e {
        Error::DecodeFailed(msg) => Error::DecodeFailed(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Where the foreground cutout comes from.
#[derive(Clone)]
pub enum CutoutSource {
    /// A precomputed cutout on disk, decoded alongside the background.
    File(PathBuf),
    /// Derived from the decoded background by a segmentation collaborator.
    Segment(Arc<dyn Segmenter>),
}

#[derive(Clone)]
pub struct UploadJob {
    pub source: PathBuf,
    pub cutout: CutoutSource,
}

impl UploadJob {
    pub fn new(source: impl Into<PathBuf>, cutout: CutoutSource) -> Self {
        Self { source: source.into(), cutout }
    }

    /// Decode (and segment) until both layers are ready.
    pub fn prepare(&self) -> Result<ImagePair> {
        match &self.cutout {
            CutoutSource::File(cutout) => {
                let (background, foreground) =
                    rayon::join(|| decode_file(&self.source), || decode_file(cutout));
                Ok(ImagePair::new(background?, foreground?))
            }
            CutoutSource::Segment(segmenter) => {
                let background = decode_file(&self.source)?;
                let foreground = segmenter.extract_foreground(&background)?;
                Ok(ImagePair::new(background, foreground))
            }
        }
    }
}

pub struct Upload {
    pub generation: u64,
    pub result: Result<ImagePair>,
}

pub struct UploadWorker {
    tx: Sender<Upload>,
    rx: Receiver<Upload>,
    latest: u64,
    pending: bool,
}

impl Default for UploadWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadWorker {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, latest: 0, pending: false }
    }

    /// Start preparing `job`, superseding anything still in flight.
    pub fn submit(&mut self, job: UploadJob) -> Result<u64> {
        self.latest += 1;
        let generation = self.latest;
        let tx = self.tx.clone();
        tracing::info!("upload {generation}: {}", job.source.display());

        thread::Builder::new()
            .name(format!("upload-{generation}"))
            .spawn(move || {
                // A panicking decoder or segmenter still has to report back,
                // or `wait` would block on this generation forever.
                let result = panic::catch_unwind(AssertUnwindSafe(|| job.prepare()))
                    .unwrap_or_else(|_| {
                        Err(Error::DecodeFailed(format!(
                            "upload {generation} aborted while preparing images"
                        )))
                    });
                // The receiver only disappears when the worker is dropped.
                let _ = tx.send(Upload { generation, result });
            })?;
        self.pending = true;
        Ok(generation)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// Non-blocking: the newest result if it has arrived.
    pub fn poll(&mut self) -> Option<Upload> {
        loop {
            match self.rx.try_recv() {
                Ok(upload) => {
                    if let Some(upload) = self.accept(upload) {
                        return Some(upload);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Block until the newest submission finishes. `None` if nothing is pending.
    pub fn wait(&mut self) -> Option<Upload> {
        while self.pending {
            let upload = self.rx.recv().ok()?;
            if let Some(upload) = self.accept(upload) {
                return Some(upload);
            }
        }
        None
    }

    fn accept(&mut self, upload: Upload) -> Option<Upload> {
        if upload.generation != self.latest {
            tracing::debug!("dropping stale upload {} (latest {})", upload.generation, self.latest);
            return None;
        }
        self.pending = false;
        Some(upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::Duration;

    struct Fill {
        color: [u8; 4],
        delay: Duration,
    }

    impl Segmenter for Fill {
        fn extract_foreground(&self, source: &RgbaImage) -> Result<RgbaImage> {
            thread::sleep(self.delay);
            Ok(RgbaImage::from_pixel(source.width(), source.height(), Rgba(self.color)))
        }
    }

    struct Refuse;

    struct Explode;

    impl Segmenter for Explode {
        fn extract_foreground(&self, _source: &RgbaImage) -> Result<RgbaImage> {
            panic!("segmenter blew up");
        }
    }

    impl Segmenter for Refuse {
        fn extract_foreground(&self, _source: &RgbaImage) -> Result<RgbaImage> {
            Err(Error::SegmentationFailed("no subject".into()))
        }
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_decode_garbage_is_decode_failed() {
        assert!(matches!(decode_bytes(b"definitely not a png"), Err(Error::DecodeFailed(_))));
    }

    #[test]
    fn test_decode_missing_file_is_io() {
        assert!(matches!(decode_file(Path::new("/no/such/file.png")), Err(Error::Io(_))));
    }

    #[test]
    fn test_prepare_joins_two_files() {
        let dir = tempfile::tempdir().unwrap();
        let bg = write_png(dir.path(), "bg.png", 6, 4);
        let fg = write_png(dir.path(), "fg.png", 3, 2);

        let pair = UploadJob::new(bg, CutoutSource::File(fg)).prepare().unwrap();
        assert_eq!(pair.dimensions(), (6, 4));
        assert_eq!(pair.foreground_cutout().dimensions(), (3, 2));
    }

    #[test]
    fn test_prepare_fails_if_either_decode_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bg = write_png(dir.path(), "bg.png", 6, 4);
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"garbage").unwrap();

        let res = UploadJob::new(bg, CutoutSource::File(bad)).prepare();
        assert!(matches!(res, Err(Error::DecodeFailed(_))));
    }

    #[test]
    fn test_prepare_with_segmenter() {
        let dir = tempfile::tempdir().unwrap();
        let bg = write_png(dir.path(), "bg.png", 5, 5);
        let seg = Arc::new(Fill { color: [1, 2, 3, 128], delay: Duration::ZERO });

        let pair = UploadJob::new(&bg, CutoutSource::Segment(seg)).prepare().unwrap();
        assert_eq!(pair.foreground_cutout().get_pixel(0, 0), &Rgba([1, 2, 3, 128]));

        let res = UploadJob::new(&bg, CutoutSource::Segment(Arc::new(Refuse))).prepare();
        assert!(matches!(res, Err(Error::SegmentationFailed(_))));
    }

    #[test]
    fn test_newer_upload_supersedes_older() {
        let dir = tempfile::tempdir().unwrap();
        let bg = write_png(dir.path(), "bg.png", 4, 4);
        let slow = Arc::new(Fill { color: [255, 0, 0, 255], delay: Duration::from_millis(300) });
        let fast = Arc::new(Fill { color: [0, 255, 0, 255], delay: Duration::ZERO });

        let mut worker = UploadWorker::new();
        let first = worker.submit(UploadJob::new(&bg, CutoutSource::Segment(slow))).unwrap();
        let second = worker.submit(UploadJob::new(&bg, CutoutSource::Segment(fast))).unwrap();
        assert!(second > first);

        let upload = worker.wait().unwrap();
        assert_eq!(upload.generation, second);
        let pair = upload.result.unwrap();
        assert_eq!(pair.foreground_cutout().get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
        assert!(!worker.is_pending());

        // The slow one lands later and is silently dropped.
        thread::sleep(Duration::from_millis(400));
        assert!(worker.poll().is_none());
    }

    #[test]
    fn test_panicking_segmenter_reports_failure_instead_of_hanging() {
        let dir = tempfile::tempdir().unwrap();
        let bg = write_png(dir.path(), "bg.png", 4, 4);

        let mut worker = UploadWorker::new();
        let job = UploadJob::new(&bg, CutoutSource::Segment(Arc::new(Explode)));
        let generation = worker.submit(job).unwrap();

        let upload = worker.wait().unwrap();
        assert_eq!(upload.generation, generation);
        assert!(matches!(upload.result, Err(Error::DecodeFailed(_))));
        assert!(!worker.is_pending());
    }

    #[test]
    fn test_wait_with_nothing_pending_returns_none() {
        let mut worker = UploadWorker::new();
        assert!(worker.wait().is_none());
        assert!(worker.poll().is_none());
    }
}
