// CLI utility to dump decoded packets from a capture file
// Usage: packet_dump <capture_file> [--count N]

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bedrock_codec::batch::{open_batch, Wrapper};
use bedrock_codec::capture::{read_capture, CaptureEntry, Direction};
use bedrock_codec::config::CodecConfig;
use bedrock_codec::context::CodecContext;
use bedrock_codec::diagnostics::{hex_preview, to_json, to_pretty_json, PREVIEW_BYTES};
use bedrock_codec::error::CodecError;
use bedrock_codec::logging;
use bedrock_codec::packet::{decode_packet, DecodeReport, Packet};
use bedrock_codec::packets::{GamePacket, UnconnectedPing, UnconnectedPong};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

struct SessionLog {
    path: PathBuf,
    session_id: Uuid,
    packets: Vec<CaptureEntry>,
    start_time: i64,
}

impl SessionLog {
    fn load(path: PathBuf) -> Result<Self> {
        // Captures are named <session id>.bin
        let filename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Invalid capture filename")?;
        let session_id =
            Uuid::parse_str(filename).context("Failed to parse session ID from filename")?;

        let packets = read_capture(&path)
            .with_context(|| format!("Failed to read capture {}", path.display()))?;
        if packets.is_empty() {
            anyhow::bail!("No packets found in capture {}", path.display());
        }
        let start_time = packets[0].timestamp;

        Ok(Self {
            path,
            session_id,
            packets,
            start_time,
        })
    }

    fn relative_time(&self, timestamp: i64) -> i64 {
        timestamp - self.start_time
    }
}

fn report_json(report: &DecodeReport) -> Value {
    json!({
        "consumed": report.consumed,
        "trailing": report.trailing,
        "skipped": report.skipped,
        "skip_reason": report.skip_reason,
    })
}

fn decoded_json<T: serde::Serialize>(id: u32, name: &str, packet: &T, report: &DecodeReport) -> Value {
    json!({
        "packet_id": format!("0x{:02x}", id),
        "packet_name": name,
        "fields": to_json(packet).unwrap_or(Value::Null),
        "report": report_json(report),
    })
}

fn error_json(data: &[u8], err: &CodecError) -> Value {
    let id = data.first().copied().unwrap_or_default();
    json!({
        "packet_id": format!("0x{:02x}", id),
        "error": err.to_string(),
    })
}

/// One game packet (varint id framing).
fn describe_game_packet(data: &[u8], ctx: &CodecContext) -> Value {
    match GamePacket::decode_any(data, ctx) {
        Ok((packet, report)) => decoded_json(packet.id(), packet.name(), &packet, &report),
        Err(err) => error_json(data, &err),
    }
}

/// A raw frame as captured: a batch wrapper, an offline message, or a bare
/// game packet.
fn describe_frame(data: &[u8], ctx: &CodecContext) -> Value {
    let Some(&first) = data.first() else {
        return json!({ "error": "empty frame" });
    };

    let id = first as u32;
    if id == Wrapper::ID {
        let wrapper = match decode_packet::<Wrapper>(data, ctx) {
            Ok((wrapper, _)) => wrapper,
            Err(err) => return error_json(data, &err),
        };
        return match open_batch(&wrapper, ctx.config().max_batch_size) {
            Ok(inner) => {
                let batch: Vec<Value> = inner
                    .iter()
                    .map(|packet| describe_game_packet(packet, ctx))
                    .collect();
                json!({ "packet_name": Wrapper::NAME, "batch": batch })
            }
            Err(err) => {
                warn!("Could not open batch: {}", err);
                error_json(data, &err)
            }
        };
    }
    if id == UnconnectedPing::ID {
        return describe_offline::<UnconnectedPing>(data, ctx);
    }
    if id == UnconnectedPong::ID {
        return describe_offline::<UnconnectedPong>(data, ctx);
    }
    describe_game_packet(data, ctx)
}

fn describe_offline<P: Packet + serde::Serialize>(data: &[u8], ctx: &CodecContext) -> Value {
    match decode_packet::<P>(data, ctx) {
        Ok((packet, report)) => decoded_json(P::ID, P::NAME, &packet, &report),
        Err(err) => error_json(data, &err),
    }
}

fn main() -> Result<()> {
    logging::init("warn");

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <capture_file> [--count N]", args[0]);
        eprintln!("  capture_file: Path to the capture file to read");
        eprintln!("  --count N: Number of packets to dump (default: 10)");
        std::process::exit(1);
    }

    let capture_file = PathBuf::from(&args[1]);

    let mut count = 10;
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        if arg == "--count" || arg == "-n" {
            let value = rest.next().context("--count needs a value")?;
            count = value
                .parse()
                .context("Invalid count value. Must be a positive integer.")?;
        }
    }

    let config = CodecConfig::load(None)?;
    let ctx = CodecContext::with_config(config);
    let session_log = SessionLog::load(capture_file)?;

    println!("Loaded capture file: {}", session_log.path.display());
    println!("Session ID: {}", session_log.session_id);
    println!("Total packets: {}", session_log.packets.len());
    println!();

    let packets_to_show = count.min(session_log.packets.len());
    let mut output_packets = Vec::with_capacity(packets_to_show);

    for (idx, packet) in session_log.packets.iter().take(packets_to_show).enumerate() {
        let direction_str = match packet.direction {
            Direction::Clientbound => "Clientbound",
            Direction::Serverbound => "Serverbound",
        };
        let time_str = DateTime::<Utc>::from_timestamp_millis(packet.timestamp)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S%.3f UTC")
            .to_string();

        output_packets.push(json!({
            "index": idx,
            "direction": direction_str,
            "timestamp": packet.timestamp,
            "timestamp_formatted": time_str,
            "relative_time_ms": session_log.relative_time(packet.timestamp),
            "protocol_version": packet.protocol_version,
            "size_bytes": packet.data.len(),
            "decoded": describe_frame(&packet.data, &ctx),
            "data_hex": hex_preview(&packet.data, PREVIEW_BYTES),
        }));
    }

    let output = json!({
        "session_id": session_log.session_id.to_string(),
        "total_packets": session_log.packets.len(),
        "packets_shown": packets_to_show,
        "packets": output_packets,
    });
    println!("{}", to_pretty_json(&output)?);

    Ok(())
}
