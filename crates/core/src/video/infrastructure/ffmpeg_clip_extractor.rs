use std::path::Path;

use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::stream::Stream;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::media::Type as MediaType;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::{Dictionary, Packet, Rational};

use crate::shared::time_range::TimeRange;
use crate::video::domain::clip_extractor::ClipExtractor;

/// Microseconds per second, the unit of container-level seeking.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Used when the source does not declare a frame rate.
const DEFAULT_FPS: i32 = 30;

/// H.264 CRF quality for re-encoded video.
const DEFAULT_CRF: &str = "18";

/// Cuts a clip with ffmpeg-next.
///
/// The best video stream is decoded from the keyframe preceding the range
/// and re-encoded (libx264 when available, MPEG-4 otherwise), so the clip
/// starts on the first frame at or after `start`. Audio streams are copied
/// packet by packet and trimmed to the range. Timestamps start at zero.
pub struct FfmpegClipExtractor;

impl ClipExtractor for FfmpegClipExtractor {
    fn extract(
        &self,
        source: &Path,
        range: TimeRange,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if is_same_file(source, output) {
            return Err(format!(
                "Refusing to overwrite the source video {}",
                source.display()
            )
            .into());
        }

        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(source)?;
        let mut octx = ffmpeg_next::format::output(output)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let video_index = ictx.streams().best(MediaType::Video).map(|s| s.index());
        let mut stream_map: Vec<Option<usize>> = vec![None; ictx.nb_streams() as usize];
        let mut input_time_bases: Vec<Rational> = Vec::with_capacity(stream_map.len());
        let mut video: Option<VideoTranscoder> = None;
        let mut ost_count: usize = 0;

        for (idx, stream) in ictx.streams().enumerate() {
            input_time_bases.push(stream.time_base());
            if Some(idx) == video_index {
                video = Some(VideoTranscoder::new(&stream, &mut octx, ost_count, global_header)?);
            } else if stream.parameters().medium() == MediaType::Audio {
                let mut ost =
                    octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
                ost.set_parameters(stream.parameters());
                unsafe {
                    (*ost.parameters().as_mut_ptr()).codec_tag = 0;
                }
            } else {
                continue;
            }
            stream_map[idx] = Some(ost_count);
            ost_count += 1;
        }

        if ost_count == 0 {
            return Err(format!("{} has no audio or video stream", source.display()).into());
        }

        if range.start() > 0.0 {
            let target = (range.start() * AV_TIME_BASE) as i64;
            ictx.seek(target, ..target)?;
        }

        octx.write_header()?;

        // The muxer may pick its own time bases while writing the header
        let mut output_time_bases: Vec<Rational> = Vec::with_capacity(ost_count);
        for idx in 0..ost_count {
            let stream = octx.stream(idx).ok_or("Output stream disappeared")?;
            output_time_bases.push(stream.time_base());
        }

        let mut past_end = vec![false; stream_map.len()];
        let mut audio_packets: usize = 0;

        for (stream, mut packet) in ictx.packets() {
            let ist = stream.index();
            let Some(ost) = stream_map.get(ist).copied().flatten() else {
                continue;
            };

            if Some(ist) == video_index {
                if let Some(video) = video.as_mut() {
                    video.send_packet(&packet, range, &mut octx)?;
                    past_end[ist] = video.reached_end;
                }
            } else if let Some(ts) = packet.dts().or(packet.pts()) {
                let in_tb = input_time_bases[ist];
                let time = seconds(ts, in_tb);
                if time >= range.end() {
                    past_end[ist] = true;
                } else if range.contains(time) {
                    let out_tb = output_time_bases[ost];
                    let shift = (range.start() / f64::from(out_tb)).round() as i64;
                    packet.rescale_ts(in_tb, out_tb);
                    packet.set_pts(packet.pts().map(|t| t - shift));
                    packet.set_dts(packet.dts().map(|t| t - shift));
                    packet.set_position(-1);
                    packet.set_stream(ost);
                    packet.write_interleaved(&mut octx)?;
                    audio_packets += 1;
                }
            }

            let done = stream_map
                .iter()
                .zip(&past_end)
                .all(|(mapped, past)| mapped.is_none() || *past);
            if done {
                break;
            }
        }

        let mut video_frames = 0;
        if let Some(video) = video.as_mut() {
            video.finish(range, &mut octx)?;
            video_frames = video.frames;
        }

        if video_frames == 0 && audio_packets == 0 {
            drop(octx);
            let _ = std::fs::remove_file(output);
            return Err(format!(
                "No media found between {:.2}s and {:.2}s in {}",
                range.start(),
                range.end(),
                source.display()
            )
            .into());
        }

        octx.write_trailer()?;
        log::info!(
            "Wrote {:.2}s clip ({video_frames} frames, {audio_packets} audio packets) to {}",
            range.duration(),
            output.display()
        );
        Ok(())
    }
}

/// Decodes one video stream and re-encodes the frames inside a range.
struct VideoTranscoder {
    decoder: ffmpeg_next::codec::decoder::Video,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: Option<scaling::Context>,
    input_time_base: Rational,
    fps: i32,
    ost_index: usize,
    last_pts: Option<i64>,
    frames: usize,
    reached_end: bool,
}

impl VideoTranscoder {
    fn new(
        stream: &Stream,
        octx: &mut Output,
        ost_index: usize,
        global_header: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;
        let (width, height) = (decoder.width(), decoder.height());
        let fps = frames_per_second(stream.avg_frame_rate());

        let codec = ffmpeg_next::encoder::find_by_name("libx264")
            .or_else(|| ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4))
            .ok_or("No H.264 or MPEG-4 encoder available")?;

        let mut ost = octx.add_stream(Some(codec))?;
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        // Options the chosen encoder does not know are ignored
        let mut options = Dictionary::new();
        options.set("preset", "veryfast");
        options.set("crf", DEFAULT_CRF);
        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);

        let scaler = if decoder.format() == Pixel::YUV420P {
            None
        } else {
            Some(scaling::Context::get(
                decoder.format(),
                width,
                height,
                Pixel::YUV420P,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?)
        };

        log::debug!("Re-encoding video at {fps} fps with {}", codec.name());
        Ok(Self {
            decoder,
            encoder,
            scaler,
            input_time_base: stream.time_base(),
            fps,
            ost_index,
            last_pts: None,
            frames: 0,
            reached_end: false,
        })
    }

    fn send_packet(
        &mut self,
        packet: &Packet,
        range: TimeRange,
        octx: &mut Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Err(e) = self.decoder.send_packet(packet) {
            log::debug!("Skipping undecodable video packet: {e}");
            return Ok(());
        }
        self.encode_decoded(range, octx)
    }

    /// Drains the decoder and the encoder.
    fn finish(
        &mut self,
        range: TimeRange,
        octx: &mut Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.decoder.send_eof()?;
        self.encode_decoded(range, octx)?;
        self.encoder.send_eof()?;
        self.write_packets(octx)
    }

    fn encode_decoded(
        &mut self,
        range: TimeRange,
        octx: &mut Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut decoded = VideoFrame::empty();
        let mut scaled = VideoFrame::empty();

        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let Some(ts) = decoded.timestamp().or(decoded.pts()) else {
                continue;
            };
            let time = seconds(ts, self.input_time_base);
            if time >= range.end() {
                self.reached_end = true;
                continue;
            }
            if !range.contains(time) {
                continue;
            }

            let pts = ((time - range.start()) * f64::from(self.fps)).round() as i64;
            if self.last_pts.is_some_and(|last| pts <= last) {
                continue;
            }
            self.last_pts = Some(pts);

            let frame = match self.scaler.as_mut() {
                Some(scaler) => {
                    scaler.run(&decoded, &mut scaled)?;
                    &mut scaled
                }
                None => &mut decoded,
            };
            frame.set_pts(Some(pts));
            frame.set_kind(ffmpeg_next::picture::Type::None);
            self.encoder.send_frame(frame)?;
            self.frames += 1;
            self.write_packets(octx)?;
        }
        Ok(())
    }

    fn write_packets(&mut self, octx: &mut Output) -> Result<(), Box<dyn std::error::Error>> {
        let out_tb = octx
            .stream(self.ost_index)
            .ok_or("Output stream disappeared")?
            .time_base();
        let mut encoded = Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.ost_index);
            encoded.rescale_ts(Rational(1, self.fps), out_tb);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

/// Exact for timestamps that fall on whole frames of a `1/n` time base.
fn seconds(ts: i64, time_base: Rational) -> f64 {
    ts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

fn frames_per_second(rate: Rational) -> i32 {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return DEFAULT_FPS;
    }
    (f64::from(rate).round() as i32).max(1)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
