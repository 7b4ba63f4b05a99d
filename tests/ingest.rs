use opus_framer::audio_pipeline::TICKS_PER_MS;
use opus_framer::config::ConfigSet;
use opus_framer::ingest::{IngestError, OpusIngestor};

fn setup() -> (OpusIngestor, usize) {
    let config = ConfigSet::load_from_dir("config").expect("config");
    let frame_bytes = config.audio.frame_bytes();
    (
        OpusIngestor::new(config.audio.clone(), config.encoder.clone()),
        frame_bytes,
    )
}

#[test]
fn session_lifecycle_produces_packets() {
    let (ingestor, frame_bytes) = setup();
    let session_id = "sess-encode-1";

    ingestor.open_session(session_id).expect("open session");
    assert_eq!(ingestor.session_count(), 1);

    // 2フレーム分を一度に投入
    let chunk = vec![0u8; frame_bytes * 2];
    let packets = ingestor
        .push_chunk(session_id, &chunk, 1_000, 1_000 + 40 * TICKS_PER_MS)
        .expect("push chunk");

    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].start, 1_000);
    assert_eq!(packets[0].stop, packets[1].start);

    ingestor.close_session(session_id).expect("close session");
    assert_eq!(ingestor.session_count(), 0);
}

#[test]
fn duplicate_open_is_rejected() {
    let (ingestor, _) = setup();
    ingestor.open_session("sess-dup").expect("open session");

    let err = ingestor.open_session("sess-dup").expect_err("duplicate open");
    assert!(matches!(err, IngestError::AlreadyExists(_)));

    // 既存セッションはそのまま生きている
    assert_eq!(ingestor.session_count(), 1);
}

#[test]
fn unknown_session_is_rejected() {
    let (ingestor, _) = setup();

    let err = ingestor
        .push_chunk("sess-missing", &[0u8; 4], 0, 0)
        .expect_err("push to missing session");
    assert!(matches!(err, IngestError::NotFound(_)));

    let err = ingestor
        .close_session("sess-missing")
        .expect_err("close missing session");
    assert!(matches!(err, IngestError::NotFound(_)));
}

#[test]
fn push_after_close_is_rejected() {
    let (ingestor, frame_bytes) = setup();
    let session_id = "sess-closed";

    ingestor.open_session(session_id).expect("open session");
    ingestor
        .push_chunk(session_id, &vec![0u8; frame_bytes], 0, 0)
        .expect("push chunk");
    ingestor.close_session(session_id).expect("close session");

    let err = ingestor
        .push_chunk(session_id, &vec![0u8; frame_bytes], 0, 0)
        .expect_err("push after close");
    assert!(matches!(err, IngestError::NotFound(_)));
}
