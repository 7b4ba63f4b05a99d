use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use opus_framer::audio_pipeline::{OpusEncodePipeline, ReferenceTime, TICKS_PER_MS};
use opus_framer::config::ConfigSet;

/// 標準入力の生PCM(S16LE)をエンコードし、長さプレフィックス付きの
/// Opusパケット列を標準出力へ書き出すデモホスト。
#[tokio::main]
async fn main() {
    init_tracing();

    let config = match ConfigSet::load_from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = ?err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(root = ?config.root(), "configuration loaded");

    let mut pipeline = match OpusEncodePipeline::new(&config.audio, &config.encoder) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!(error = %err, "failed to build encode pipeline");
            std::process::exit(1);
        }
    };

    let bytes_per_second = config.audio.input.pcm_format().bytes_per_second() as i64;
    info!(
        sample_rate = config.audio.input.sample_rate_hz,
        channels = config.audio.input.channels,
        frame_ms = config.audio.framing.frame_duration_ms,
        "encoding from stdin"
    );

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut buf = vec![0u8; 4096];
    // チャンクの時刻はストリーム先頭からのバイト位置で合成する
    let mut consumed: i64 = 0;
    let mut packet_count: u64 = 0;

    loop {
        let read = match stdin.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                error!(error = %err, "stdin read failed");
                break;
            }
        };

        let chunk_start = ticks_at(consumed, bytes_per_second);
        consumed += read as i64;
        let chunk_stop = ticks_at(consumed, bytes_per_second);

        let packets = match pipeline.push(&buf[..read], chunk_start, chunk_stop) {
            Ok(packets) => packets,
            Err(err) => {
                error!(error = %err, "encode failed");
                std::process::exit(1);
            }
        };

        for packet in packets {
            let len = packet.data.len() as u32;
            if let Err(err) = stdout.write_all(&len.to_le_bytes()).await {
                error!(error = %err, "stdout write failed");
                std::process::exit(1);
            }
            if let Err(err) = stdout.write_all(&packet.data).await {
                error!(error = %err, "stdout write failed");
                std::process::exit(1);
            }
            packet_count += 1;
        }
    }

    if let Err(err) = stdout.flush().await {
        error!(error = %err, "stdout flush failed");
    }

    info!(
        packets = packet_count,
        residual_ms = pipeline.buffered_ms(),
        "stream finished"
    );
}

/// ストリーム先頭からのバイト位置を基準時間ティックに変換
fn ticks_at(bytes: i64, bytes_per_second: i64) -> ReferenceTime {
    bytes * 1_000 * TICKS_PER_MS / bytes_per_second
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}
