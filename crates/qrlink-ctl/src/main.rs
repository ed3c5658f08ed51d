//! qrlink-ctl — command-line interface to the qrlink codecs.
//!
//! Encodes payloads into animated-barcode part streams, decodes part
//! streams back into payloads, and manages the named payload slots used by
//! display profiles.

use std::io::{BufRead, Read};

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use qrlink_codecs::fountain::FountainError;
use qrlink_codecs::{detect, Reassembler, ReceiveOutcome, SchemeKind, Sequencer};
use qrlink_core::capacity::max_payload_bytes;
use qrlink_core::config::{QrlinkConfig, SlotStore};
use qrlink_core::payload::{ContentType, Encoding};

// ── Argument parsing ──────────────────────────────────────────────────────────

#[derive(Debug)]
struct EncodeArgs {
    scheme: String,
    content_type: ContentType,
    encoding: Encoding,
    max_width: u32,
    chunk_size: usize,
    input: Input,
}

#[derive(Debug)]
enum Input {
    File(String),
    Slot(String),
    Text(String),
}

fn parse_content_type(name: &str) -> Result<ContentType> {
    match name {
        "psbt" => Ok(ContentType::Psbt),
        "txn" => Ok(ContentType::Transaction),
        "json" => Ok(ContentType::Json),
        "text" => Ok(ContentType::Unicode),
        other => bail!("unknown content type {other:?} (psbt, txn, json, text)"),
    }
}

fn parse_encoding(name: &str) -> Result<Encoding> {
    match name {
        "hex" => Ok(Encoding::Hex),
        "base32" => Ok(Encoding::Base32),
        "compressed" => Ok(Encoding::CompressedBase32),
        other => bail!("unknown encoding {other:?} (hex, base32, compressed)"),
    }
}

fn parse_encode_args(args: &[&str], config: &QrlinkConfig) -> Result<EncodeArgs> {
    let mut parsed = EncodeArgs {
        scheme: "dense".to_string(),
        content_type: ContentType::Psbt,
        encoding: Encoding::CompressedBase32,
        max_width: config.send.max_width,
        chunk_size: config.send.chunk_size,
        input: Input::Text(String::new()),
    };
    let mut input = None;

    let mut i = 0;
    while i < args.len() {
        let value = |i: usize| -> Result<String> {
            args.get(i + 1)
                .map(|s| s.to_string())
                .with_context(|| format!("{} requires a value", args[i]))
        };
        match args[i] {
            "--scheme" => parsed.scheme = value(i)?,
            "--type" => parsed.content_type = parse_content_type(&value(i)?)?,
            "--encoding" => parsed.encoding = parse_encoding(&value(i)?)?,
            "--width" => parsed.max_width = value(i)?.parse().context("--width must be a number")?,
            "--chunk" => {
                parsed.chunk_size = value(i)?.parse().context("--chunk must be a number")?
            }
            "--file" => input = Some(Input::File(value(i)?)),
            "--slot" => input = Some(Input::Slot(value(i)?)),
            "--text" => input = Some(Input::Text(value(i)?)),
            other => bail!("unknown encode option: {other}"),
        }
        i += 2;
    }

    parsed.input = input.context("encode needs --file, --slot, or --text")?;
    Ok(parsed)
}

fn read_input(input: &Input, config: &QrlinkConfig) -> Result<Vec<u8>> {
    match input {
        Input::File(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {path}"))
        }
        Input::Slot(name) => {
            let store = SlotStore::load(&config.slots.path)?;
            let text = store
                .get(name)
                .with_context(|| format!("no slot named {name:?}"))?;
            Ok(text.as_bytes().to_vec())
        }
        Input::Text(text) => Ok(text.as_bytes().to_vec()),
    }
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

fn cmd_encode(args: &[&str], config: &QrlinkConfig) -> Result<()> {
    let args = parse_encode_args(args, config)?;
    let payload = read_input(&args.input, config)?;

    let mut sequencer = match args.scheme.as_str() {
        "dense" => Sequencer::dense(&payload, args.content_type, args.encoding, args.max_width)?,
        "pmofn" => {
            let text = String::from_utf8(payload).context("pmofn framing needs UTF-8 input")?;
            Sequencer::pmofn(&text, args.chunk_size)?
        }
        other => bail!("unknown scheme {other:?} (dense, pmofn)"),
    };

    let total = sequencer.total_parts().unwrap_or(1);
    tracing::debug!(scheme = %args.scheme, total, "encoding payload");
    for _ in 0..total {
        println!("{}", sequencer.next_part()?.text);
    }
    Ok(())
}

fn cmd_decode(args: &[&str], as_json: bool) -> Result<()> {
    let lines: Vec<String> = match args {
        [] => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text.lines().map(str::to_string).collect()
        }
        [path] => {
            let file =
                std::fs::File::open(path).with_context(|| format!("failed to open {path}"))?;
            std::io::BufReader::new(file)
                .lines()
                .collect::<std::io::Result<_>>()
                .context("failed to read parts")?
        }
        other => bail!("decode takes at most one file argument, got: {}", other.join(" ")),
    };

    let mut rx = Reassembler::new();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        match rx.receive(line.trim()) {
            Ok(ReceiveOutcome::Collecting(progress)) => {
                tracing::debug!(filled = progress.filled, total = progress.total, "collecting");
            }
            Ok(ReceiveOutcome::Complete(payload)) => {
                if as_json {
                    let doc = serde_json::json!({
                        "scheme": scheme_name(payload.scheme),
                        "content_type": payload.content_type.map(|ct| ct.tag().to_string()),
                        "payload": payload.content.display_text(),
                    });
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                } else {
                    println!("{}", payload.content.display_text());
                }
                return Ok(());
            }
            Err(e) if matches!(e, qrlink_codecs::ReceiveError::Fountain(FountainError::Unavailable)) => {
                bail!("fountain-coded input needs a wallet runtime, not the CLI");
            }
            Err(e) => bail!("part rejected: {e}"),
        }
    }
    bail!("input ended before the payload completed");
}

fn cmd_slots(args: &[&str], config: &QrlinkConfig) -> Result<()> {
    let mut store = SlotStore::load(&config.slots.path)?;
    match args {
        [] | ["list"] => {
            let names: Vec<&str> = store.names().collect();
            if names.is_empty() {
                println!("No slots stored.");
            } else {
                for name in names {
                    println!("{name}");
                }
            }
            Ok(())
        }
        ["get", name] => {
            let text = store.get(name).with_context(|| format!("no slot named {name:?}"))?;
            println!("{text}");
            Ok(())
        }
        ["set", name, value] => {
            store.set(name, value);
            store.save()?;
            println!("Stored slot {name:?} ({} chars).", value.chars().count());
            Ok(())
        }
        ["rm", name] => {
            if store.remove(name) {
                store.save()?;
                println!("Removed slot {name:?}.");
            } else {
                println!("No slot named {name:?}.");
            }
            Ok(())
        }
        other => bail!("unknown slots command: {}", other.join(" ")),
    }
}

fn cmd_capacity(args: &[&str]) -> Result<()> {
    let width: u32 = match args {
        [w] => w.parse().context("width must be a number")?,
        other => bail!("capacity takes one width argument, got: {}", other.join(" ")),
    };
    println!("{}", max_payload_bytes(width));
    Ok(())
}

fn cmd_detect(args: &[&str]) -> Result<()> {
    let text = match args {
        [t] => t,
        other => bail!("detect takes one part argument, got: {}", other.join(" ")),
    };
    println!("{}", scheme_name(detect(text)));
    Ok(())
}

fn scheme_name(scheme: SchemeKind) -> &'static str {
    match scheme {
        SchemeKind::Dense => "dense",
        SchemeKind::Pmofn => "pmofn",
        SchemeKind::Fountain => "fountain",
        SchemeKind::Single => "single",
    }
}

fn print_usage() {
    println!("Usage: qrlink-ctl <command>");
    println!();
    println!("Commands:");
    println!("  encode [options]          Print one full cycle of parts for a payload");
    println!("      --scheme dense|pmofn    Framing scheme (default: dense)");
    println!("      --type psbt|txn|json|text");
    println!("      --encoding hex|base32|compressed");
    println!("      --width <modules>       Barcode width for part sizing");
    println!("      --chunk <chars>         pmofn chunk size");
    println!("      --file <path> | --slot <name> | --text <string>");
    println!("  decode [file] [--json]    Reassemble parts, one per line (stdin if no file)");
    println!("  slots [list]              List stored payload slots");
    println!("  slots get|set|rm <name>   Manage stored payload slots");
    println!("  capacity <width>          Print the payload byte budget for a barcode width");
    println!("  detect <part>             Print the framing scheme of one part");
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .init();

    let config = QrlinkConfig::load().context("failed to load configuration")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut as_json = false;
    let mut remaining: Vec<&str> = Vec::new();
    for arg in &args {
        if arg == "--json" {
            as_json = true;
        } else {
            remaining.push(arg);
        }
    }

    match remaining.as_slice() {
        ["encode", rest @ ..] => cmd_encode(rest, &config),
        ["decode", rest @ ..] => cmd_decode(rest, as_json),
        ["slots", rest @ ..] => cmd_slots(rest, &config),
        ["capacity", rest @ ..] => cmd_capacity(rest),
        ["detect", rest @ ..] => cmd_detect(rest),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
