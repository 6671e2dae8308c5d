use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleLayout;
use ffmpeg_next::format::Sample;
use ffmpeg_next::util::frame::audio::Audio as AudioFrame;

use crate::audio::domain::audio_track::AudioTrack;
use crate::video::domain::audio_reader::AudioReader;

/// Decodes and resamples the soundtrack of a media file using ffmpeg-next.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioTrack>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let Some(stream) = ictx.streams().best(ffmpeg_next::media::Type::Audio) else {
            log::warn!("{} has no audio stream", path.display());
            return Ok(None);
        };
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(SampleLayout::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            target_sample_rate,
        )?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = AudioFrame::empty();
        let mut resampled = AudioFrame::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            // A corrupt packet should not abort the whole transcript
            if let Err(e) = decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable audio packet: {e}");
                continue;
            }
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled)?;
                append_mono_samples(&resampled, &mut samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            append_mono_samples(&resampled, &mut samples);
        }

        // The resampler may hold back a tail of buffered samples
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                append_mono_samples(&resampled, &mut samples);
            }
        }

        let track = AudioTrack::new(samples, target_sample_rate);
        log::debug!(
            "Decoded {:.1}s of audio from {}",
            track.duration(),
            path.display()
        );
        Ok(Some(track))
    }
}

/// Appends the samples of a planar mono f32 frame.
fn append_mono_samples(frame: &AudioFrame, out: &mut Vec<f32>) {
    let count = frame.samples();
    if count == 0 {
        return;
    }
    let bytes = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const f32, count) };
    out.extend_from_slice(floats);
}
