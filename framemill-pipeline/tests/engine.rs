//! Session integration tests.
//!
//! Exercises the processing units end to end through their asynchronous
//! queues: format negotiation, byte-exact pixel results, completion
//! ordering and the error paths that must arrive through completions
//! rather than from the submitting call.

use byteorder::{ByteOrder, LittleEndian};
use framemill_codecs::{CopyParams, MixParams, ScaleParams, WipeParams};
use framemill_core::{Error, Packing, TagMap, VideoFormat};
use framemill_pipeline::{
    Concater, Decoder, Encoder, Flipper, Packer, ScaleConverter, SessionState, Stamper,
};

/// Honor `RUST_LOG` when debugging a failing scenario.
fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn tags(packing: &str, width: u32, height: u32) -> TagMap {
    let mut tags = TagMap::new();
    tags.insert("format", "video")
        .insert("packing", packing)
        .insert("width", width)
        .insert("height", height)
        .insert("interlace", 0);
    tags
}

fn make_planar420_buf(width: usize, height: usize, y: u8, cb: u8, cr: u8) -> Vec<u8> {
    let luma = width * height;
    let mut buf = vec![y; luma];
    buf.extend(std::iter::repeat(cb).take(luma / 4));
    buf.extend(std::iter::repeat(cr).take(luma / 4));
    buf
}

fn make_yuv422p10_buf(width: usize, height: usize, y: u16, cb: u16, cr: u16) -> Vec<u8> {
    let luma_bytes = width * 2 * height;
    let mut buf = vec![0u8; luma_bytes * 2];
    for i in (0..luma_bytes).step_by(2) {
        LittleEndian::write_u16(&mut buf[i..], y);
    }
    for i in (luma_bytes..luma_bytes * 3 / 2).step_by(2) {
        LittleEndian::write_u16(&mut buf[i..], cb);
    }
    for i in (luma_bytes * 3 / 2..luma_bytes * 2).step_by(2) {
        LittleEndian::write_u16(&mut buf[i..], cr);
    }
    buf
}

fn make_pgroup_buf(width: usize, height: usize) -> Vec<u8> {
    // U 512, Y 64, V 512, Y 64: the studio test pattern at 10 bits.
    let group = [0x80u8, 0x04, 0x08, 0x00, 0x40];
    let mut buf = Vec::with_capacity(width * height * 5 / 2);
    for _ in 0..(width * height / 2) {
        buf.extend_from_slice(&group);
    }
    buf
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn packer_reports_destination_size() {
    let mut packer = Packer::new();
    let bytes = packer
        .set_info(&tags("pgroup", 1920, 1080), &tags("420P", 1920, 1080))
        .unwrap();
    assert_eq!(bytes, 1920 * 1080 * 3 / 2);
    assert_eq!(packer.state(), SessionState::Configured);
}

#[test]
fn bad_dimensions_fail_configuration() {
    let mut packer = Packer::new();
    let err = packer
        .set_info(&tags("pgroup", 1280, 720), &tags("420P", 21, 0))
        .unwrap_err();
    assert!(err.is_config());
    // The session stays unconfigured and rejects submissions.
    assert_eq!(packer.state(), SessionState::Unconfigured);
    assert!(packer.pack(vec![vec![0u8; 16]], Some(vec![0u8; 16])).is_err());
}

#[test]
fn unknown_packing_fails_configuration() {
    let mut packer = Packer::new();
    let err = packer
        .set_info(&tags("RGBA8", 1280, 720), &tags("420P", 1280, 720))
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn reconfiguration_replaces_descriptors() {
    let mut packer = Packer::new();
    packer
        .set_info(&tags("pgroup", 1280, 720), &tags("420P", 1280, 720))
        .unwrap();
    let bytes = packer
        .set_info(&tags("v210", 96, 4), &tags("YUV422P10", 96, 4))
        .unwrap();
    assert_eq!(bytes, 96 * 2 * 4 * 2);
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

#[test]
fn packs_pgroup_to_planar420_bit_exactly() {
    trace_init();
    let (width, height) = (1280usize, 720usize);
    let mut packer = Packer::new();
    let dst_bytes = packer
        .set_info(
            &tags("pgroup", width as u32, height as u32),
            &tags("420P", width as u32, height as u32),
        )
        .unwrap();

    let src = make_pgroup_buf(width, height);
    let (depth, completion) = packer.pack(vec![src], Some(vec![0u8; dst_bytes])).unwrap();
    assert!(depth >= 1);

    let output = completion.wait().unwrap();
    assert_eq!(output.bytes_written, dst_bytes);
    assert_eq!(output.dst, make_planar420_buf(width, height, 0x10, 0x80, 0x80));

    packer.quit();
    packer.wait_exit().unwrap();
}

#[test]
fn completions_arrive_in_submission_order() {
    let mut packer = Packer::new();
    let fmt = tags("420P", 8, 4);
    let dst_bytes = packer.set_info(&fmt, &fmt).unwrap();

    let completions: Vec<_> = (0..12u8)
        .map(|i| {
            let src = vec![i; dst_bytes];
            packer
                .pack(vec![src], Some(vec![0u8; dst_bytes]))
                .unwrap()
                .1
        })
        .collect();

    for (i, completion) in completions.into_iter().enumerate() {
        let output = completion.wait().unwrap();
        assert!(output.dst.iter().all(|&b| b == i as u8), "operation {i}");
    }
}

#[test]
fn missing_buffers_fail_through_the_completion() {
    let mut packer = Packer::new();
    let dst_bytes = packer
        .set_info(&tags("pgroup", 1920, 1080), &tags("420P", 1920, 1080))
        .unwrap();

    let (_, completion) = packer.pack(Vec::new(), Some(vec![0u8; dst_bytes])).unwrap();
    assert!(matches!(
        completion.wait().unwrap_err(),
        Error::MissingBuffer { what: "source" }
    ));

    let src = make_pgroup_buf(64, 4);
    let mut packer2 = Packer::new();
    packer2
        .set_info(&tags("pgroup", 64, 4), &tags("420P", 64, 4))
        .unwrap();
    let (_, completion) = packer2.pack(vec![src], None).unwrap();
    assert!(matches!(
        completion.wait().unwrap_err(),
        Error::MissingBuffer {
            what: "destination"
        }
    ));
}

#[test]
fn short_destination_fails_and_session_survives() {
    let mut packer = Packer::new();
    let dst_bytes = packer
        .set_info(&tags("pgroup", 64, 4), &tags("420P", 64, 4))
        .unwrap();

    let src = make_pgroup_buf(64, 4);
    let (_, completion) = packer
        .pack(vec![src.clone()], Some(vec![0u8; dst_bytes - 128]))
        .unwrap();
    let err = completion.wait().unwrap_err();
    assert!(matches!(
        err,
        Error::BufferTooSmall {
            what: "destination",
            ..
        }
    ));

    // A failed operation must not wedge the session.
    let (_, completion) = packer.pack(vec![src], Some(vec![0u8; dst_bytes])).unwrap();
    assert!(completion.wait().is_ok());
}

#[test]
fn submissions_after_quit_fail_with_a_state_error() {
    let mut packer = Packer::new();
    let dst_bytes = packer
        .set_info(&tags("420P", 8, 4), &tags("420P", 8, 4))
        .unwrap();
    let (_, pending) = packer
        .pack(vec![vec![7u8; dst_bytes]], Some(vec![0u8; dst_bytes]))
        .unwrap();

    packer.quit();
    assert_eq!(packer.state(), SessionState::Draining);
    let err = packer
        .pack(vec![vec![0u8; dst_bytes]], Some(vec![0u8; dst_bytes]))
        .unwrap_err();
    assert!(matches!(err, Error::SessionState { .. }));

    // Work queued before the quit still completes.
    assert!(pending.wait().is_ok());
    packer.wait_exit().unwrap();
    assert_eq!(packer.state(), SessionState::Terminated);
}

// ---------------------------------------------------------------------------
// Stamping
// ---------------------------------------------------------------------------

#[test]
fn stamper_reports_destination_size() {
    let mut stamper = Stamper::new();
    let bytes = stamper
        .set_info(&tags("420P", 1280, 720), &tags("420P", 1920, 1080))
        .unwrap();
    assert_eq!(bytes, 1920 * 1080 * 3 / 2);
}

#[test]
fn wipes_planar420_to_studio_red() {
    let (width, height) = (128usize, 64usize);
    let mut stamper = Stamper::new();
    let dst_bytes = stamper
        .set_info(
            &tags("420P", width as u32, height as u32),
            &tags("420P", width as u32, height as u32),
        )
        .unwrap();

    let params = WipeParams {
        rect: [0, 0, width as u32, height as u32],
        col: [1.0, 0.0, 0.0],
    };
    let (_, completion) = stamper.wipe(Some(vec![0u8; dst_bytes]), params).unwrap();
    let output = completion.wait().unwrap();
    assert_eq!(output.dst, make_planar420_buf(width, height, 235, 128, 128));
}

#[test]
fn wipes_yuv422p10_to_studio_red() {
    let (width, height) = (128usize, 64usize);
    let mut stamper = Stamper::new();
    let dst_bytes = stamper
        .set_info(
            &tags("YUV422P10", width as u32, height as u32),
            &tags("YUV422P10", width as u32, height as u32),
        )
        .unwrap();

    let params = WipeParams {
        rect: [0, 0, width as u32, height as u32],
        col: [1.0, 0.0, 0.0],
    };
    let (_, completion) = stamper.wipe(Some(vec![0u8; dst_bytes]), params).unwrap();
    let output = completion.wait().unwrap();
    assert_eq!(output.dst, make_yuv422p10_buf(width, height, 940, 512, 512));
}

#[test]
fn copies_a_frame_verbatim_at_origin() {
    let (width, height) = (128usize, 64usize);
    let mut stamper = Stamper::new();
    let dst_bytes = stamper
        .set_info(
            &tags("420P", width as u32, height as u32),
            &tags("420P", width as u32, height as u32),
        )
        .unwrap();

    let src = make_planar420_buf(width, height, 16, 128, 128);
    let (_, completion) = stamper
        .copy(
            vec![src.clone()],
            Some(vec![0u8; dst_bytes]),
            CopyParams::default(),
        )
        .unwrap();
    assert_eq!(completion.wait().unwrap().dst, src);
}

#[test]
fn mixes_two_sources_to_their_mean() {
    let (width, height) = (128usize, 64usize);
    let mut stamper = Stamper::new();
    let dst_bytes = stamper
        .set_info(
            &tags("420P", width as u32, height as u32),
            &tags("420P", width as u32, height as u32),
        )
        .unwrap();

    let a = make_planar420_buf(width, height, 112, 112, 112);
    let b = make_planar420_buf(width, height, 144, 144, 144);
    let (_, completion) = stamper
        .mix(
            vec![a, b],
            Some(vec![0u8; dst_bytes]),
            MixParams { pressure: 0.5 },
        )
        .unwrap();
    assert_eq!(
        completion.wait().unwrap().dst,
        make_planar420_buf(width, height, 128, 128, 128)
    );
}

#[test]
fn mixes_ten_bit_sources_to_their_mean() {
    let (width, height) = (64usize, 16usize);
    let mut stamper = Stamper::new();
    let dst_bytes = stamper
        .set_info(
            &tags("YUV422P10", width as u32, height as u32),
            &tags("YUV422P10", width as u32, height as u32),
        )
        .unwrap();

    let a = make_yuv422p10_buf(width, height, 448, 448, 448);
    let b = make_yuv422p10_buf(width, height, 576, 576, 576);
    let (_, completion) = stamper
        .mix(
            vec![a, b],
            Some(vec![0u8; dst_bytes]),
            MixParams { pressure: 0.5 },
        )
        .unwrap();
    assert_eq!(
        completion.wait().unwrap().dst,
        make_yuv422p10_buf(width, height, 512, 512, 512)
    );
}

#[test]
fn mix_with_one_source_fails_through_the_completion() {
    let mut stamper = Stamper::new();
    let dst_bytes = stamper
        .set_info(&tags("420P", 8, 4), &tags("420P", 8, 4))
        .unwrap();
    let (_, completion) = stamper
        .mix(
            vec![vec![0u8; dst_bytes]],
            Some(vec![0u8; dst_bytes]),
            MixParams { pressure: 0.5 },
        )
        .unwrap();
    assert!(matches!(
        completion.wait().unwrap_err(),
        Error::MissingBuffer { what: "source" }
    ));
}

// ---------------------------------------------------------------------------
// Concatenation
// ---------------------------------------------------------------------------

#[test]
fn concatenates_sources_in_order() {
    let mut concater = Concater::new();
    let dst_bytes = concater.set_info(&tags("pgroup", 1920, 2)).unwrap();
    assert_eq!(dst_bytes, 1920 * 2 * 5 / 2);

    // Row-sized buffers carrying a running byte counter.
    let row = dst_bytes / 2;
    let mut counter = 0u8;
    let sources: Vec<Vec<u8>> = (0..2)
        .map(|_| {
            (0..row)
                .map(|_| {
                    let b = counter;
                    counter = counter.wrapping_add(1);
                    b
                })
                .collect()
        })
        .collect();
    let expected: Vec<u8> = (0..dst_bytes).map(|i| (i % 256) as u8).collect();

    let (_, completion) = concater
        .concat(sources, Some(vec![0u8; dst_bytes]))
        .unwrap();
    let output = completion.wait().unwrap();
    assert_eq!(output.bytes_written, dst_bytes);
    assert_eq!(output.dst, expected);
}

#[test]
fn concat_overflow_is_an_error_not_a_truncation() {
    let mut concater = Concater::new();
    let dst_bytes = concater.set_info(&tags("pgroup", 64, 2)).unwrap();
    let sources = vec![vec![0u8; dst_bytes], vec![0u8; 64]];
    let (_, completion) = concater
        .concat(sources, Some(vec![0u8; dst_bytes]))
        .unwrap();
    assert!(matches!(
        completion.wait().unwrap_err(),
        Error::BufferTooSmall { .. }
    ));
}

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

#[test]
fn scale_converter_repacks_at_equal_geometry() {
    let (width, height) = (96u32, 8u32);
    let mut converter = ScaleConverter::new();
    let dst_bytes = converter
        .set_info(&tags("420P", width, height), ScaleParams::default())
        .unwrap();

    let src_format = VideoFormat::new(Packing::Pgroup, width, height).unwrap();
    let src = make_pgroup_buf(width as usize, height as usize);
    let (_, completion) = converter
        .scale_convert(vec![src], src_format, Some(vec![0u8; dst_bytes]))
        .unwrap();
    assert_eq!(
        completion.wait().unwrap().dst,
        make_planar420_buf(width as usize, height as usize, 0x10, 0x80, 0x80)
    );
}

#[test]
fn scale_converter_downscales_to_the_destination() {
    let mut converter = ScaleConverter::new();
    let dst_bytes = converter
        .set_info(&tags("420P", 64, 32), ScaleParams::default())
        .unwrap();

    let src_format = VideoFormat::new(Packing::Pgroup, 96, 48).unwrap();
    let src = make_pgroup_buf(96, 48);
    let (_, completion) = converter
        .scale_convert(vec![src], src_format, Some(vec![0u8; dst_bytes]))
        .unwrap();
    // A uniform source stays uniform at any size.
    assert_eq!(
        completion.wait().unwrap().dst,
        make_planar420_buf(64, 32, 0x10, 0x80, 0x80)
    );
}

#[test]
fn degenerate_scale_factors_fail_configuration() {
    let mut converter = ScaleConverter::new();
    let params = ScaleParams {
        scale: [1.0, -2.0],
        offset: [0.0, 0.0],
    };
    assert!(converter.set_info(&tags("420P", 64, 32), params).is_err());
}

// ---------------------------------------------------------------------------
// Flipping
// ---------------------------------------------------------------------------

#[test]
fn flips_packed_lines_and_back() {
    let mut flipper = Flipper::new();
    let frame_bytes = flipper.set_info(&tags("UYVY10", 48, 8)).unwrap();
    assert_eq!(frame_bytes, 48 * 4 * 8);

    let stride = 48 * 4;
    let mut src = vec![0u8; frame_bytes];
    for row in 0..8 {
        src[row * stride..(row + 1) * stride].fill(row as u8);
    }
    let (_, completion) = flipper
        .flip(vec![src.clone()], Some(vec![0u8; frame_bytes]))
        .unwrap();
    let flipped = completion.wait().unwrap().dst;
    for row in 0..8 {
        assert!(flipped[row * stride..(row + 1) * stride]
            .iter()
            .all(|&b| b == 7 - row as u8));
    }

    let (_, completion) = flipper
        .flip(vec![flipped], Some(vec![0u8; frame_bytes]))
        .unwrap();
    assert_eq!(completion.wait().unwrap().dst, src);
}

#[test]
fn planar_flip_fails_configuration() {
    let mut flipper = Flipper::new();
    assert!(flipper.set_info(&tags("420P", 48, 8)).is_err());
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

fn coded_tags(width: u32, height: u32) -> TagMap {
    let mut t = tags("420P", width, height);
    t.insert("encodingName", "rle")
        .insert("bitrate", 4_000_000)
        .insert("gopFrames", 10);
    t
}

#[test]
fn encoder_reports_coded_budget() {
    let mut encoder = Encoder::new();
    let bytes = encoder
        .set_info(&tags("420P", 1920, 1080), &coded_tags(1920, 1080))
        .unwrap();
    assert_eq!(bytes, 1920 * 1080);
}

#[test]
fn encoder_rejects_unknown_encodings_and_geometry() {
    let mut encoder = Encoder::new();
    let mut bad = tags("420P", 1920, 1080);
    bad.insert("encodingName", "h265");
    assert!(encoder
        .set_info(&tags("420P", 1920, 1080), &bad)
        .unwrap_err()
        .is_config());

    assert!(encoder
        .set_info(&tags("420P", 1280, 720), &coded_tags(1920, 1080))
        .unwrap_err()
        .is_config());
}

#[test]
fn v210_frames_encode_and_decode_back_to_any_packing() {
    trace_init();
    let (width, height) = (96u32, 8u32);

    let mut encoder = Encoder::new();
    let coded_budget = encoder
        .set_info(&tags("v210", width, height), &coded_tags(width, height))
        .unwrap();

    let src_fmt = VideoFormat::new(Packing::V210, width, height).unwrap();
    let planar_fmt = VideoFormat::new(Packing::Planar420, width, height).unwrap();

    // Studio pattern through the packing table gives a known 4:2:0 frame.
    let planar = make_planar420_buf(width as usize, height as usize, 0x10, 0x80, 0x80);
    let mut v210 = vec![0u8; src_fmt.frame_bytes()];
    framemill_codecs::Repacker::new(planar_fmt, src_fmt)
        .unwrap()
        .repack(&planar, &mut v210)
        .unwrap();

    let (_, completion) = encoder
        .encode(vec![v210], Some(vec![0u8; coded_budget]))
        .unwrap();
    let coded = completion.wait().unwrap();
    assert!(coded.bytes_written > 0);
    assert!(coded.bytes_written <= coded_budget);

    let mut decoder = Decoder::new();
    let raw_bytes = decoder
        .set_info(&coded_tags(width, height), &tags("420P", width, height))
        .unwrap();
    let payload = coded.dst[..coded.bytes_written].to_vec();
    let (_, completion) = decoder
        .decode(vec![payload], Some(vec![0u8; raw_bytes]))
        .unwrap();
    let decoded = completion.wait().unwrap();
    assert_eq!(decoded.bytes_written, raw_bytes);
    assert_eq!(decoded.dst, planar);
}

#[test]
fn decoder_surfaces_codec_errors_through_the_completion() {
    let (width, height) = (16u32, 8u32);
    let mut decoder = Decoder::new();
    let raw_bytes = decoder
        .set_info(&coded_tags(width, height), &tags("420P", width, height))
        .unwrap();
    let (_, completion) = decoder
        .decode(vec![vec![0xff]], Some(vec![0u8; raw_bytes]))
        .unwrap();
    assert!(matches!(completion.wait().unwrap_err(), Error::Codec(_)));
}
