//! Synthetic media fixtures for ffmpeg-backed tests.

use std::path::Path;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

/// Writes a video-only MPEG-4 file of gray frames whose brightness changes
/// every frame, with a keyframe every `gop` frames.
pub fn write_test_video(path: &Path, num_frames: usize, fps: i32, gop: u32) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();

    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();
    encoder_ctx.set_width(WIDTH);
    encoder_ctx.set_height(HEIGHT);
    encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
    encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
    encoder_ctx.set_gop(gop);
    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = encoder_ctx
        .open_with(ffmpeg_next::Dictionary::new())
        .unwrap();
    ost.set_parameters(&encoder);
    octx.write_header().unwrap();

    let ost_time_base = octx.stream(0).unwrap().time_base();
    let encoder_time_base = ffmpeg_next::Rational(1, fps);

    for i in 0..num_frames {
        let mut frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::YUV420P,
            WIDTH,
            HEIGHT,
        );
        let luma = ((i * 40) % 256) as u8;
        frame.data_mut(0).fill(luma);
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame.set_pts(Some(i as i64));

        encoder.send_frame(&frame).unwrap();
        drain_packets(&mut encoder, &mut octx, encoder_time_base, ost_time_base);
    }

    encoder.send_eof().unwrap();
    drain_packets(&mut encoder, &mut octx, encoder_time_base, ost_time_base);
    octx.write_trailer().unwrap();
}

fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    encoder_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(0);
        encoded.rescale_ts(encoder_time_base, ost_time_base);
        encoded.write_interleaved(octx).unwrap();
    }
}

/// Video packet count and presentation span of a media file, in seconds.
pub struct PacketStats {
    pub packets: usize,
    pub first_pts: f64,
    pub end_pts: f64,
}

impl PacketStats {
    pub fn duration(&self) -> f64 {
        self.end_pts - self.first_pts
    }
}

pub fn video_packet_stats(path: &Path) -> PacketStats {
    ffmpeg_next::init().unwrap();
    let mut ictx = ffmpeg_next::format::input(path).unwrap();
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .unwrap();
    let index = stream.index();
    let time_base = f64::from(stream.time_base());

    let mut stats = PacketStats {
        packets: 0,
        first_pts: f64::INFINITY,
        end_pts: 0.0,
    };
    for (stream, packet) in ictx.packets() {
        if stream.index() != index {
            continue;
        }
        stats.packets += 1;
        if let Some(pts) = packet.pts() {
            let start = pts as f64 * time_base;
            let end = (pts + packet.duration().max(0)) as f64 * time_base;
            stats.first_pts = stats.first_pts.min(start);
            stats.end_pts = stats.end_pts.max(end);
        }
    }
    stats
}
