use opus_framer::audio_pipeline::{OpusEncodePipeline, PipelineError, TICKS_PER_MS};
use opus_framer::config::{
    AudioProcessingConfig, ConfigSet, EncoderConfig, FramingConfig, InputFormat,
    OpusApplicationSetting,
};

fn setup() -> (OpusEncodePipeline, usize) {
    let config = ConfigSet::load_from_dir("config").expect("config");
    let frame_bytes = config.audio.frame_bytes();
    (
        OpusEncodePipeline::new(&config.audio, &config.encoder).expect("pipeline"),
        frame_bytes,
    )
}

/// 48kHzステレオの440Hz正弦波をS16LEで生成
fn sine_chunk(bytes: usize, sample_offset: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes);
    let mut i = sample_offset;
    while out.len() + 4 <= bytes {
        let t = i as f32 / 48_000.0;
        let value = (8_000.0 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()) as i16;
        out.extend_from_slice(&value.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
        i += 1;
    }
    out.resize(bytes, 0);
    out
}

#[test]
fn misaligned_chunks_produce_contiguous_packets() {
    let (mut pipeline, frame_bytes) = setup();
    assert_eq!(frame_bytes, 3_840);

    let mut packets = Vec::new();
    let mut consumed = 0usize;
    for size in [1_000usize, 2_500, 7_000, 3_840, 5_000] {
        let chunk = sine_chunk(size, consumed / 4);
        let start = consumed as i64;
        let stop = (consumed + size) as i64;
        packets.extend(pipeline.push(&chunk, start, stop).expect("push"));
        consumed += size;
    }

    // 19340B = 5フレームと端数
    assert_eq!(packets.len(), consumed / frame_bytes);
    assert_eq!(pipeline.pending_frames(), 0);

    for packet in &packets {
        assert!(packet.data.len() > 1);
        assert_eq!(packet.stop - packet.start, 20 * TICKS_PER_MS);
    }
    for pair in packets.windows(2) {
        assert_eq!(pair[0].stop, pair[1].start);
    }
    assert_eq!(packets[0].start, 0);
}

#[test]
fn pipeline_rejects_unsupported_frame_duration() {
    let config = ConfigSet::load_from_dir("config").expect("config");
    let audio = AudioProcessingConfig {
        input: config.audio.input.clone(),
        framing: FramingConfig {
            frame_duration_ms: 7.5,
        },
    };

    let result = OpusEncodePipeline::new(&audio, &config.encoder);
    assert!(matches!(
        result,
        Err(PipelineError::UnsupportedFrameDuration(_))
    ));
}

#[test]
fn pipeline_rejects_unsupported_sample_rate() {
    let audio = AudioProcessingConfig {
        input: InputFormat {
            sample_rate_hz: 44_100,
            channels: 2,
            bits_per_sample: 16,
        },
        framing: FramingConfig {
            frame_duration_ms: 20.0,
        },
    };
    let encoder = EncoderConfig {
        application: OpusApplicationSetting::Voip,
        target_bitrate_kbps: 64,
    };

    let result = OpusEncodePipeline::new(&audio, &encoder);
    assert!(matches!(result, Err(PipelineError::Encoder(_))));
}
