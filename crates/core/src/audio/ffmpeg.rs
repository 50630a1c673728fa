use crate::audio::{
    duration_from_samples, parse_f32le_mono, AudioNormalizer, DecodeError, NormalizedAudio,
    PcmFormat, Result,
};
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FfmpegAudioNormalizer {
    output_format: PcmFormat,
}

impl Default for FfmpegAudioNormalizer {
    fn default() -> Self {
        Self {
            output_format: PcmFormat::wav_mono_16khz(),
        }
    }
}

impl FfmpegAudioNormalizer {
    pub fn new(output_format: PcmFormat) -> Self {
        Self { output_format }
    }

    fn ensure_ffmpeg_available(&self) -> Result<()> {
        download::auto_download().map_err(|e| DecodeError::FfmpegUnavailable(e.to_string()))
    }

    async fn run_ffmpeg(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = tokio::process::Command::new(ffmpeg_path())
            .args(["-hide_banner", "-nostdin", "-loglevel", "error"])
            .args(args)
            .output()
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr_s = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(DecodeError::FfmpegFailed(format!(
                "exit_code={:?} stderr={stderr_s}",
                output.status.code()
            )));
        }
        Ok(output.stdout)
    }

    async fn decode_to_f32(&self, path: &Path) -> Result<Vec<f32>> {
        let rate = self.output_format.sample_rate.to_string();
        let path_s = path.to_string_lossy();
        let raw = self
            .run_ffmpeg(&[
                "-i",
                path_s.as_ref(),
                "-vn",
                "-sn",
                "-dn",
                "-ac",
                "1",
                "-ar",
                rate.as_str(),
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "pipe:1",
            ])
            .await?;
        let samples = parse_f32le_mono(&raw)?;
        if samples.is_empty() {
            return Err(DecodeError::EmptyAudio(path.to_path_buf()));
        }
        Ok(samples)
    }

    async fn write_normalized(&self, input: &Path, output: &Path) -> Result<()> {
        let rate = self.output_format.sample_rate.to_string();
        let input_s = input.to_string_lossy();
        let output_s = output.to_string_lossy();
        self.run_ffmpeg(&[
            "-y",
            "-i",
            input_s.as_ref(),
            "-vn",
            "-sn",
            "-dn",
            "-ac",
            "1",
            "-ar",
            rate.as_str(),
            "-acodec",
            "pcm_s16le",
            output_s.as_ref(),
        ])
        .await?;
        Ok(())
    }
}

impl AudioNormalizer for FfmpegAudioNormalizer {
    fn normalize(
        &self,
        input: PathBuf,
        output: PathBuf,
    ) -> BoxFuture<'_, Result<NormalizedAudio>> {
        let this = self.clone();
        async move {
            this.ensure_ffmpeg_available()?;
            this.write_normalized(&input, &output).await?;
            // Decode the artifact we just wrote; rejects silent/empty output
            // and yields the duration in one pass.
            let samples = this.decode_to_f32(&output).await?;
            let duration = duration_from_samples(this.output_format.sample_rate, samples.len());
            Ok(NormalizedAudio {
                path: output,
                format: this.output_format,
                duration,
            })
        }
        .boxed()
    }

    fn read_samples(&self, path: PathBuf) -> BoxFuture<'_, Result<Vec<f32>>> {
        let this = self.clone();
        async move {
            this.ensure_ffmpeg_available()?;
            this.decode_to_f32(&path).await
        }
        .boxed()
    }
}
