//! Frame acquisition: video sources and the background capture worker.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::render::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Where a session reads frames from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoSource {
    /// Capture device index
    Camera(u32),
    /// Image file or directory of frames, looped
    Path(PathBuf),
}

impl Default for VideoSource {
    fn default() -> Self {
        VideoSource::Camera(0)
    }
}

impl FromStr for VideoSource {
    type Err = std::convert::Infallible;

    /// Integers are camera indices; anything else is a path.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<u32>() {
            Ok(index) => VideoSource::Camera(index),
            Err(_) => VideoSource::Path(PathBuf::from(s)),
        })
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Camera(index) => write!(f, "camera {index}"),
            VideoSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Blocking, restartable frame producer.
pub trait FrameSource: Send {
    /// Read the next frame, blocking as needed. `Ok(None)` marks end of stream.
    fn read(&mut self) -> Result<Option<Frame>>;

    /// Seek back to the first frame. Returns `false` if the source cannot rewind.
    fn rewind(&mut self) -> Result<bool>;
}

/// Open the frame source described by `source`.
///
/// Fails with [`Error::SourceUnavailable`] before any frame is produced.
pub fn open_source(source: &VideoSource) -> Result<Box<dyn FrameSource>> {
    match source {
        VideoSource::Camera(index) => Err(Error::SourceUnavailable(format!(
            "camera {index}: no capture backend available"
        ))),
        VideoSource::Path(path) => Ok(Box::new(ImageSequenceSource::open(path)?)),
    }
}

/// Frames decoded from image files, played in file-name order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
    next_index: u64,
}

impl ImageSequenceSource {
    /// Open a single image file or a directory of `jpg`/`png` frames.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| Error::SourceUnavailable(format!("{}: {reason}", path.display()));

        let metadata = fs::metadata(path).map_err(|e| unavailable(e.to_string()))?;
        let paths = if metadata.is_dir() {
            let mut paths: Vec<PathBuf> = fs::read_dir(path)
                .map_err(|e| unavailable(e.to_string()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            paths.sort();
            paths
        } else {
            vec![path.to_path_buf()]
        };

        if paths.is_empty() {
            return Err(unavailable("no image frames found".to_string()));
        }

        info!(source = %path.display(), frames = paths.len(), "Opened image sequence");
        Ok(Self {
            paths,
            position: 0,
            next_index: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

impl FrameSource for ImageSequenceSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let image = image::open(path)
            .map_err(|e| Error::FrameRead(format!("{}: {e}", path.display())))?
            .to_rgb8();

        self.position += 1;
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<bool> {
        self.position = 0;
        Ok(true)
    }
}

/// Frames pulled from a [`FrameSource`] on a blocking worker thread.
///
/// The worker pushes into a bounded channel. It stops, releasing the
/// source, once the token is cancelled or the feed is dropped. End of
/// stream rewinds the source and keeps going.
pub struct FrameFeed {
    receiver: mpsc::Receiver<Frame>,
    cancel: CancellationToken,
    worker: JoinHandle<Result<()>>,
}

impl FrameFeed {
    /// Start the capture worker. Must be called within a Tokio runtime.
    pub fn spawn(source: Box<dyn FrameSource>, capacity: usize, cancel: CancellationToken) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let token = cancel.clone();
        let worker = tokio::task::spawn_blocking(move || capture_loop(source, sender, token));
        Self {
            receiver,
            cancel,
            worker,
        }
    }

    /// Next frame, or `None` once cancelled or the worker has stopped.
    pub async fn next(&mut self) -> Option<Frame> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            frame = self.receiver.recv() => frame,
        }
    }

    /// Stop the worker and report how it ended.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        drop(self.receiver);
        match self.worker.await {
            Ok(result) => result,
            Err(e) => Err(Error::FrameRead(format!("capture worker failed: {e}"))),
        }
    }
}

fn capture_loop(
    mut source: Box<dyn FrameSource>,
    sender: mpsc::Sender<Frame>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut rewound_without_frame = false;

    while !cancel.is_cancelled() {
        match source.read()? {
            Some(frame) => {
                rewound_without_frame = false;
                if sender.blocking_send(frame).is_err() {
                    debug!("Frame receiver gone, stopping capture");
                    break;
                }
            }
            None if rewound_without_frame => {
                return Err(Error::FrameRead(
                    "source produced no frames after rewind".to_string(),
                ));
            }
            None => {
                info!("End of stream, rewinding source");
                if !source.rewind()? {
                    warn!("Source cannot rewind, stopping capture");
                    return Err(Error::FrameRead("end of stream".to_string()));
                }
                rewound_without_frame = true;
            }
        }
    }

    debug!("Capture worker stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Scripted source: `frames` frames, then end of stream.
    struct CountingSource {
        frames: u64,
        position: u64,
        emitted: u64,
        rewinds: usize,
    }

    impl CountingSource {
        fn new(frames: u64) -> Self {
            Self {
                frames,
                position: 0,
                emitted: 0,
                rewinds: 0,
            }
        }
    }

    impl FrameSource for CountingSource {
        fn read(&mut self) -> Result<Option<Frame>> {
            if self.position >= self.frames {
                return Ok(None);
            }
            self.position += 1;
            let frame = Frame::blank(self.emitted, 4, 4);
            self.emitted += 1;
            Ok(Some(frame))
        }

        fn rewind(&mut self) -> Result<bool> {
            self.rewinds += 1;
            self.position = 0;
            Ok(true)
        }
    }

    #[test]
    fn test_video_source_parsing() {
        assert_eq!("0".parse::<VideoSource>().unwrap(), VideoSource::Camera(0));
        assert_eq!(
            "clips/a.mp4".parse::<VideoSource>().unwrap(),
            VideoSource::Path(PathBuf::from("clips/a.mp4"))
        );
    }

    #[test]
    fn test_camera_without_backend_is_unavailable() {
        let err = open_source(&VideoSource::Camera(0)).err().unwrap();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn test_missing_path_is_unavailable() {
        let err = open_source(&VideoSource::Path(PathBuf::from("/definitely/not/here")))
            .err()
            .unwrap();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn test_image_sequence_loops_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, width) in [("b.png", 8), ("a.png", 4)] {
            RgbImage::new(width, 2).save(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);

        assert_eq!(source.read().unwrap().unwrap().width(), 4);
        assert_eq!(source.read().unwrap().unwrap().width(), 8);
        assert!(source.read().unwrap().is_none());

        assert!(source.rewind().unwrap());
        let frame = source.read().unwrap().unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.index, 2);
    }

    #[test]
    fn test_empty_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSequenceSource::open(dir.path()),
            Err(Error::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_feed_rewinds_at_end_of_stream() {
        let cancel = CancellationToken::new();
        let mut feed = FrameFeed::spawn(Box::new(CountingSource::new(3)), 2, cancel);

        let mut indices = Vec::new();
        for _ in 0..7 {
            indices.push(feed.next().await.unwrap().index);
        }
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);

        feed.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_feed_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let mut feed = FrameFeed::spawn(Box::new(CountingSource::new(1_000)), 1, cancel.clone());
        assert!(feed.next().await.is_some());

        cancel.cancel();
        assert!(feed.next().await.is_none());
        feed.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_feed_reports_empty_source() {
        let cancel = CancellationToken::new();
        let mut feed = FrameFeed::spawn(Box::new(CountingSource::new(0)), 1, cancel);
        assert!(feed.next().await.is_none());
        assert!(matches!(feed.shutdown().await, Err(Error::FrameRead(_))));
    }
}
