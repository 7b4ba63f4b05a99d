use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::info;

use crate::audio_pipeline::{EncodedPacket, OpusEncodePipeline, PipelineError, ReferenceTime};
use crate::config::{AudioProcessingConfig, EncoderConfig};

/// インジェスト処理で発生しうるエラー
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("session already exists: {0}")]
    AlreadyExists(String),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

struct SessionState {
    pipeline: OpusEncodePipeline,
}

/// PCM(S16LE)チャンクを受け取り、フレーム化・エンコードして返すインジェスタ
///
/// - セッションごとに独立した再フレーミングバッファとエンコーダを保持する
/// - 入力フォーマットが変わる場合はセッションを閉じて開き直す
pub struct OpusIngestor {
    audio_cfg: AudioProcessingConfig,
    encoder_cfg: EncoderConfig,
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl OpusIngestor {
    /// 音声設定とエンコーダ設定からインジェスタを作成
    pub fn new(audio_cfg: AudioProcessingConfig, encoder_cfg: EncoderConfig) -> Self {
        Self {
            audio_cfg,
            encoder_cfg,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// セッション開始（同名のセッションが生きていればエラー）
    ///
    /// 開き直しは途中のバッファとエンコーダ状態を黙って捨てることになるため
    /// 許可しない。
    pub fn open_session(&self, session_id: &str) -> Result<(), IngestError> {
        let mut map = self.sessions.lock();
        if map.contains_key(session_id) {
            return Err(IngestError::AlreadyExists(session_id.to_string()));
        }

        let pipeline = OpusEncodePipeline::new(&self.audio_cfg, &self.encoder_cfg)?;
        map.insert(session_id.to_string(), SessionState { pipeline });
        info!(session_id, "encode session opened");
        Ok(())
    }

    /// PCM(S16LE)チャンクを投入し、エンコード済みパケットを返す
    pub fn push_chunk(
        &self,
        session_id: &str,
        chunk: &[u8],
        chunk_start: ReferenceTime,
        chunk_stop: ReferenceTime,
    ) -> Result<Vec<EncodedPacket>, IngestError> {
        let mut map = self.sessions.lock();
        let state = map
            .get_mut(session_id)
            .ok_or_else(|| IngestError::NotFound(session_id.to_string()))?;
        Ok(state.pipeline.push(chunk, chunk_start, chunk_stop)?)
    }

    /// セッション終了（丸ごと1フレームに満たない残データは破棄）
    pub fn close_session(&self, session_id: &str) -> Result<(), IngestError> {
        let mut map = self.sessions.lock();
        let state = map
            .remove(session_id)
            .ok_or_else(|| IngestError::NotFound(session_id.to_string()))?;

        info!(
            session_id,
            residual_ms = state.pipeline.buffered_ms(),
            "encode session closed"
        );
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
