use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use opus_framer::audio_pipeline::{EncodedPacket, TICKS_PER_MS};
use opus_framer::config::ConfigSet;
use opus_framer::realtime::{spawn_encode_worker, PacketSink, SinkError, TimedChunk};

struct ChannelSink {
    tx: mpsc::Sender<EncodedPacket>,
}

#[async_trait]
impl PacketSink for ChannelSink {
    async fn deliver(&self, _session_id: &str, packet: EncodedPacket) -> Result<(), SinkError> {
        self.tx.send(packet).await.map_err(|_| SinkError::Closed)
    }
}

#[tokio::test]
async fn worker_encodes_and_delivers_packets() {
    let config = ConfigSet::load_from_dir("config").expect("config");
    let frame_bytes = config.audio.frame_bytes();

    let (chunk_tx, chunk_rx) = mpsc::channel::<TimedChunk>(8);
    let (packet_tx, mut packet_rx) = mpsc::channel::<EncodedPacket>(32);

    let handle = spawn_encode_worker(
        &config,
        "sess-rt-1".to_string(),
        chunk_rx,
        ChannelSink { tx: packet_tx },
    )
    .expect("spawn worker");

    // 1.5フレーム＋0.5フレームに分けて送る
    let frame_ticks = 20 * TICKS_PER_MS;
    chunk_tx
        .send(TimedChunk {
            data: Bytes::from(vec![0u8; frame_bytes * 3 / 2]),
            start: 0,
            stop: frame_ticks * 3 / 2,
        })
        .await
        .expect("send chunk#1");
    chunk_tx
        .send(TimedChunk {
            data: Bytes::from(vec![0u8; frame_bytes / 2]),
            start: frame_ticks * 3 / 2,
            stop: frame_ticks * 2,
        })
        .await
        .expect("send chunk#2");
    drop(chunk_tx);

    let mut packets = Vec::new();
    while let Ok(Some(packet)) = timeout(Duration::from_secs(5), packet_rx.recv()).await {
        packets.push(packet);
    }

    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].start, 0);
    assert_eq!(packets[0].stop, packets[1].start);
    assert_eq!(packets[1].stop, 2 * frame_ticks);

    timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker finished")
        .expect("worker task");
}
