use crate::emotion::{EmotionError, VideoFrame, FRAME_HEIGHT, FRAME_WIDTH};
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};

pub trait VideoFrameSource: Send + Sync {
    fn frames(&self, path: PathBuf) -> BoxFuture<'_, Result<Vec<VideoFrame>, EmotionError>>;
}

/// Decodes a video file into the full ordered sequence of grayscale frames,
/// scaled to the classifier's input resolution. Whole-file decode is fine
/// for answer-length recordings.
#[derive(Clone, Debug, Default)]
pub struct FfmpegVideoFrameSource;

impl FfmpegVideoFrameSource {
    pub fn new() -> Self {
        Self
    }

    fn ensure_ffmpeg_available(&self) -> Result<(), EmotionError> {
        download::auto_download().map_err(|e| EmotionError::Decode(e.to_string()))
    }

    async fn extract_raw_frames(&self, path: &Path) -> Result<Vec<u8>, EmotionError> {
        let filter = format!("scale={FRAME_WIDTH}:{FRAME_HEIGHT},format=gray");
        let path_s = path.to_string_lossy();
        let output = tokio::process::Command::new(ffmpeg_path())
            .args([
                "-hide_banner",
                "-nostdin",
                "-loglevel",
                "error",
                "-i",
                path_s.as_ref(),
                "-an",
                "-sn",
                "-dn",
                "-vf",
                filter.as_str(),
                "-f",
                "rawvideo",
                "pipe:1",
            ])
            .output()
            .await
            .map_err(|e| EmotionError::Decode(e.to_string()))?;

        if !output.status.success() {
            let stderr_s = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(EmotionError::Decode(format!(
                "exit_code={:?} stderr={stderr_s}",
                output.status.code()
            )));
        }
        Ok(output.stdout)
    }
}

impl VideoFrameSource for FfmpegVideoFrameSource {
    fn frames(&self, path: PathBuf) -> BoxFuture<'_, Result<Vec<VideoFrame>, EmotionError>> {
        let this = self.clone();
        async move {
            this.ensure_ffmpeg_available()?;
            let raw = this.extract_raw_frames(&path).await?;
            frames_from_raw(&raw, FRAME_WIDTH, FRAME_HEIGHT)
        }
        .boxed()
    }
}

pub(crate) fn frames_from_raw(
    raw: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<VideoFrame>, EmotionError> {
    let frame_len = width * height;
    let trailing = raw.len() % frame_len;
    if trailing != 0 {
        return Err(EmotionError::TruncatedFrame(trailing));
    }
    Ok(raw
        .chunks_exact(frame_len)
        .enumerate()
        .map(|(i, pixels)| VideoFrame {
            index: i as u64,
            width,
            height,
            pixels: pixels.to_vec(),
        })
        .collect())
}
