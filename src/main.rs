//! hle-aac - feed an ADTS file through the HLE DSP AAC decoder

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;

use hle_aac::audio::adts::{detect_media_type, split_frames, StreamMeta};
use hle_aac::audio::{create_decoder, DecoderBackend, SAMPLES_PER_FRAME};
use hle_aac::config::Config;
use hle_aac::memory::{Fcram, GuestMemory};
use hle_aac::protocol::{
    BinaryMessage, DecodeAacRequest, DecodeAacResponse, DecoderCodec, DecoderCommand,
    MessageHeader,
};

/// Room reserved per output channel; a frame decodes to at most 2048 samples.
const CHANNEL_SLOT: u32 = 0x2000;

#[derive(Parser)]
#[command(name = "hle-aac")]
#[command(about = "Decode ADTS AAC through the HLE DSP message interface", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an ADTS file to raw s16le PCM, one file per channel
    Decode {
        /// Input ADTS file
        input: PathBuf,

        /// Output prefix; writes <prefix>.ch0.pcm and <prefix>.ch1.pcm
        #[arg(short, long)]
        output: PathBuf,

        /// Decoder backend (software, null); overrides config.toml
        #[arg(long)]
        backend: Option<DecoderBackend>,

        /// Print every response as a JSON line
        #[arg(long)]
        trace: bool,
    },

    /// Show the stream parameters of the first frame
    Info {
        /// Input ADTS file
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct TraceLine<'a> {
    frame: usize,
    header: &'a MessageHeader,
    response: DecodeAacResponse,
}

fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    let cli = Cli::parse();

    // 加载配置
    let config = Config::new().unwrap_or_default();
    log::debug!("{} {} starting", config.app_name, config.app_version);

    match cli.command {
        Commands::Decode {
            input,
            output,
            backend,
            trace,
        } => {
            let mut decoder_config = config.decoder.clone();
            if let Some(backend) = backend {
                decoder_config.backend = backend;
            }
            let stream = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let mut memory = Fcram::new(config.fcram_base, config.fcram_size);
            let mut decoder = create_decoder(&decoder_config);

            let frames = split_frames(&stream);
            if frames.is_empty() {
                bail!("No ADTS frames found in {}", input.display());
            }
            log::info!("Decoding {} frames from {}", frames.len(), input.display());

            // 压缩数据放在 FCRAM 起始处，输出缓冲紧随其后
            let src_base = memory.fcram_base();
            memory
                .write(src_base, stream.len())
                .context("Input does not fit in FCRAM")?
                .copy_from_slice(&stream);
            let dst_ch0 = align_up(src_base, stream.len())?;
            let dst_ch1 = dst_ch0.wrapping_add(CHANNEL_SLOT);
            if dst_ch1 < dst_ch0 || !memory.contains(dst_ch1, CHANNEL_SLOT as usize) {
                bail!("Input does not leave room for output buffers in FCRAM");
            }

            let init = BinaryMessage::new(DecoderCodec::DecodeAac, DecoderCommand::Init);
            if decoder.process_request(&mut memory, &init).is_none() {
                bail!("Decoder rejected Init");
            }

            let mut ch0 = pcm_writer(&output, 0)?;
            let mut ch1 = pcm_writer(&output, 1)?;
            let mut stdout = std::io::stdout().lock();

            for (index, &(offset, len)) in frames.iter().enumerate() {
                for addr in [dst_ch0, dst_ch1] {
                    if let Some(slot) = memory.write(addr, CHANNEL_SLOT as usize) {
                        slot.fill(0);
                    }
                }

                let request = BinaryMessage::decode_request(DecodeAacRequest {
                    src_addr: src_base + offset as u32,
                    size: len as u32,
                    dst_addr_ch0: dst_ch0,
                    dst_addr_ch1: dst_ch1,
                    ..Default::default()
                });
                let Some(response) = decoder.process_request(&mut memory, &request) else {
                    bail!("Decoder gave no response for frame {}", index);
                };
                let info = response.decode_aac_response();

                if trace {
                    let line = TraceLine {
                        frame: index,
                        header: &response.header,
                        response: info,
                    };
                    serde_json::to_writer(&mut stdout, &line)?;
                    writeln!(stdout)?;
                }

                let bytes = (info.num_samples.min(SAMPLES_PER_FRAME * 2) * 2) as usize;
                copy_channel(&memory, dst_ch0, bytes, &mut ch0)?;
                if info.num_channels >= 2 {
                    copy_channel(&memory, dst_ch1, bytes, &mut ch1)?;
                }
            }

            ch0.flush()?;
            ch1.flush()?;
            log::info!("Wrote PCM to {}.ch*.pcm", output.display());
        }
        Commands::Info { input } => {
            let stream = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let Some(meta) = detect_media_type(&stream) else {
                bail!("{} does not start with an ADTS header", input.display());
            };
            print_info(&input, &meta, split_frames(&stream).len());
        }
    }

    Ok(())
}

fn align_up(base: u32, len: usize) -> anyhow::Result<u32> {
    let len = u32::try_from(len).context("Input larger than the address space")?;
    let end = base.checked_add(len).context("Input larger than the address space")?;
    end.checked_add(0xFFF)
        .map(|v| v & !0xFFF)
        .context("Input larger than the address space")
}

fn pcm_writer(prefix: &Path, channel: usize) -> anyhow::Result<BufWriter<File>> {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".ch{}.pcm", channel));
    let path = PathBuf::from(name);
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn copy_channel(
    memory: &Fcram,
    addr: u32,
    len: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let pcm = memory
        .read(addr, len)
        .with_context(|| format!("Output buffer {:08x} out of bounds", addr))?;
    out.write_all(pcm)?;
    Ok(())
}

fn print_info(input: &Path, meta: &StreamMeta, frames: usize) {
    let header = &meta.header;
    println!("Input: {}", input.display());
    println!("  Format: ADTS ({})", if header.mpeg2 { "MPEG-2" } else { "MPEG-4" });
    println!("  Audio object type: {}", header.profile);
    println!("  Sample rate: {} Hz", header.samplerate);
    println!("  Channels: {}", header.channels);
    println!("  AAC tag: {:#06x}", meta.aac_tag);
    println!("  Frames: {}", frames);
}
