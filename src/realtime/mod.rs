use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::audio_pipeline::{
    EncodedPacket, FramingError, OpusEncodePipeline, PipelineError, ReferenceTime,
};
use crate::config::ConfigSet;

/// パケット配送先のエラー
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("packet sink closed")]
    Closed,
    #[error("packet sink failure: {0}")]
    Other(String),
}

/// エンコード済みパケットの配送先
#[async_trait]
pub trait PacketSink: Send + Sync + 'static {
    async fn deliver(&self, session_id: &str, packet: EncodedPacket) -> Result<(), SinkError>;
}

/// タイムスタンプ付きPCMチャンク
#[derive(Debug, Clone)]
pub struct TimedChunk {
    pub data: Bytes,
    pub start: ReferenceTime,
    pub stop: ReferenceTime,
}

/// 受信チャネルからPCMチャンクを取り出し、エンコードして配送するタスクを起動
///
/// - バッファ満杯で入らなかったチャンクは警告を出して破棄する
/// - エンコード失敗は致命的としてタスクを終了する
pub fn spawn_encode_worker<S: PacketSink>(
    config: &ConfigSet,
    session_id: String,
    mut chunk_rx: Receiver<TimedChunk>,
    sink: S,
) -> Result<JoinHandle<()>, PipelineError> {
    let mut pipeline = OpusEncodePipeline::new(&config.audio, &config.encoder)?;

    Ok(tokio::spawn(async move {
        while let Some(chunk) = chunk_rx.recv().await {
            let packets = match pipeline.push(&chunk.data, chunk.start, chunk.stop) {
                Ok(packets) => packets,
                Err(PipelineError::Framing(FramingError::AtCapacity { requested, free })) => {
                    warn!(
                        session_id = %session_id,
                        requested,
                        free,
                        "frame buffer at capacity, dropping chunk"
                    );
                    continue;
                }
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "encode failed, stopping session");
                    return;
                }
            };

            for packet in packets {
                if let Err(e) = sink.deliver(&session_id, packet).await {
                    warn!(session_id = %session_id, error = %e, "packet delivery failed");
                    return;
                }
            }
        }

        info!(
            session_id = %session_id,
            residual_ms = pipeline.buffered_ms(),
            "chunk stream ended"
        );
    }))
}
