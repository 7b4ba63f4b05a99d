use super::error::FramingError;
use super::format::{FrameDuration, PcmFormat, ReferenceTime};

/// 受け付ける最大フォーマット（48kHz・2ch・16bit）の1秒分
const MAX_BYTES_PER_SECOND: usize = 192_000;

/// 取り出した1フレーム分のビュー
///
/// `data` はバッファ内部領域への参照。次の `append` / `next_frame` で
/// コンパクションやオフセット前進により無効になるが、借用がその呼び出し
/// より先にビューを手放すことを強制する。
#[derive(Debug)]
pub struct EncodeFrame<'a> {
    pub start: ReferenceTime,
    pub stop: ReferenceTime,
    pub data: &'a [u8],
}

/// 任意長のPCMチャンクを固定長のエンコードフレームへ詰め直すバッファ
///
/// - 入力チャンク境界はフレーム境界と揃っていなくてよい
/// - 格納領域は固定長で、append時のコンパクションにより再利用する
/// - タイムスタンプは最初のチャンクの開始時刻だけを信頼し、以後は
///   フレーム長の整数倍で外挿する。上流のチャンク時刻が揺れても
///   出力フレームの時刻は連続かつ単調のまま
///
/// 同期処理は行わない。`append` と `next_frame` は同一の処理コールバック
/// から直列に呼ばれる前提（appendの後に空になるまでnext_frameを回す）。
pub struct FrameBuffer {
    format: PcmFormat,
    frame_duration: FrameDuration,
    bytes_per_second: usize,
    bytes_per_frame: usize,
    storage: Box<[u8]>,
    read_offset: usize,
    stored_bytes: usize,
    pending_frames: usize,
    stream_start: Option<ReferenceTime>,
    running_time: ReferenceTime,
    last_chunk_stop: ReferenceTime,
}

impl FrameBuffer {
    /// フォーマットとフレーム長からバッファを構築
    ///
    /// 1フレームが整数バイトにならない組み合わせは拒否する。黙って丸めると
    /// バイトオフセットと時刻の対応が永続的にずれるため、構築自体を失敗させる。
    pub fn new(format: PcmFormat, frame_duration: FrameDuration) -> Result<Self, FramingError> {
        let bytes_per_frame = match format.bytes_per_frame(frame_duration) {
            Some(bytes) if bytes > 0 => bytes,
            _ => {
                return Err(FramingError::FractionalFrameSize {
                    bytes_per_second: format.bytes_per_second(),
                    frame_duration_ms: frame_duration.millis(),
                })
            }
        };

        Ok(Self {
            format,
            frame_duration,
            bytes_per_second: format.bytes_per_second() as usize,
            bytes_per_frame,
            storage: vec![0u8; MAX_BYTES_PER_SECOND].into_boxed_slice(),
            read_offset: 0,
            stored_bytes: 0,
            pending_frames: 0,
            stream_start: None,
            running_time: 0,
            last_chunk_stop: 0,
        })
    }

    /// PCMチャンクを追記し、取り出し可能な総フレーム数を返す
    ///
    /// 空き不足なら `AtCapacity` を返し、状態は一切変更しない。
    /// 落とすか待つかは呼び出し側の方針。
    pub fn append(
        &mut self,
        data: &[u8],
        chunk_start: ReferenceTime,
        chunk_stop: ReferenceTime,
    ) -> Result<usize, FramingError> {
        let free = self.free_space();
        if data.len() > free {
            return Err(FramingError::AtCapacity {
                requested: data.len(),
                free,
            });
        }

        // 未読の残りを先頭へ寄せ、書き込み側を常に連続領域にする
        if self.read_offset > 0 {
            if self.stored_bytes > 0 {
                self.storage
                    .copy_within(self.read_offset..self.read_offset + self.stored_bytes, 0);
            }
            self.read_offset = 0;
        }

        self.storage[self.stored_bytes..self.stored_bytes + data.len()].copy_from_slice(data);
        self.stored_bytes += data.len();

        if self.stream_start.is_none() {
            self.stream_start = Some(chunk_start);
            self.running_time = chunk_start;
        }
        // 最新チャンクの終了時刻は記録するだけで、フレーム時刻には使わない
        self.last_chunk_stop = chunk_stop;

        self.pending_frames = self.stored_bytes / self.bytes_per_frame;
        Ok(self.pending_frames)
    }

    /// 次の1フレームをタイムスタンプ付きで取り出す
    ///
    /// 丸ごと1フレーム分のデータがなければ `None`（エラーではなく通常の
    /// 空状態）。返すフレームの開始時刻は running time、終了時刻は
    /// フレーム長ぶん進めた値で、連続・無重複・無欠落になる。
    pub fn next_frame(&mut self) -> Option<EncodeFrame<'_>> {
        if self.pending_frames == 0 {
            return None;
        }

        let start = self.running_time;
        self.running_time += self.frame_duration.ticks();
        let stop = self.running_time;

        let data = &self.storage[self.read_offset..self.read_offset + self.bytes_per_frame];
        self.read_offset += self.bytes_per_frame;
        self.stored_bytes -= self.bytes_per_frame;
        self.pending_frames -= 1;

        Some(EncodeFrame { start, stop, data })
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn free_space(&self) -> usize {
        self.capacity() - self.stored_bytes
    }

    pub fn stored_bytes(&self) -> usize {
        self.stored_bytes
    }

    pub fn pending_frames(&self) -> usize {
        self.pending_frames
    }

    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_second
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_frame
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn frame_duration(&self) -> FrameDuration {
        self.frame_duration
    }

    /// 最初に追記されたチャンクの開始時刻（追記前は `None`）
    pub fn stream_start(&self) -> Option<ReferenceTime> {
        self.stream_start
    }

    /// 最後に追記されたチャンクの終了時刻（記録のみ）
    pub fn last_chunk_stop(&self) -> ReferenceTime {
        self.last_chunk_stop
    }

    /// バッファ済みの時間（ミリ秒）
    pub fn buffered_ms(&self) -> f64 {
        self.stored_bytes as f64 * 1_000.0 / self.bytes_per_second as f64
    }

    /// 丸ごと1フレームに満たない端数の時間（ミリ秒）
    pub fn residual_ms(&self) -> f64 {
        (self.stored_bytes % self.bytes_per_frame) as f64 * 1_000.0 / self.bytes_per_second as f64
    }
}
