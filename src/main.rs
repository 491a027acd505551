// src/main.rs

use std::fs::File;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use rust_adx_native::config::{ConfigError, DecoderConfig};
use rust_adx_native::logging::{self, DecodeLog};
use rust_adx_native::{Decoder, VariantPolicy};

#[derive(Parser, Debug)]
#[command(version, about = "Decode OpenRTB Native requests into the canonical 1.1 shape")]
struct CliArgs {
    /// 输入文件，`-` 或留空表示 stdin
    inputs: Vec<String>,
    /// JSON 配置文件
    #[arg(long)]
    config: Option<String>,
    /// 日志目录，留空则输出到 stderr
    #[arg(long)]
    log_dir: Option<String>,
    #[arg(long, value_enum)]
    variant_policy: Option<VariantPolicy>,
    #[arg(long)]
    max_wrap_depth: Option<usize>,
    #[arg(long)]
    max_input_bytes: Option<usize>,
    /// 格式化输出
    #[arg(long)]
    pretty: bool,
}

impl CliArgs {
    /// 配置文件打底，命令行参数覆盖
    fn decoder_config(&self) -> Result<DecoderConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => DecoderConfig::from_file(path)?,
            None => DecoderConfig::default(),
        };
        if let Some(policy) = self.variant_policy {
            config.variant_policy = policy;
        }
        if let Some(depth) = self.max_wrap_depth {
            config.max_wrap_depth = depth;
        }
        if let Some(limit) = self.max_input_bytes {
            config.max_input_bytes = limit;
        }
        Ok(config)
    }
}

/// 读取输入，超过上限直接拒绝，不交给解码器
fn read_input(source: &str, limit: usize) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let cap = (limit as u64).saturating_add(1);
    let read = if source == "-" {
        io::stdin().lock().take(cap).read_to_end(&mut buffer)
    } else {
        File::open(source).and_then(|file| file.take(cap).read_to_end(&mut buffer))
    };
    read.map_err(|e| format!("failed to read {}: {}", source, e))?;

    if buffer.len() > limit {
        return Err(format!("{} exceeds the {} byte input limit", source, limit));
    }
    Ok(buffer)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // guard 必须活到进程结束，否则缓冲日志不会刷盘
    let _guard = match logging::init(args.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Unable to set global tracing subscriber: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match args.decoder_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let decoder = Decoder::new(config);

    let sources = if args.inputs.is_empty() {
        vec!["-".to_string()]
    } else {
        args.inputs.clone()
    };

    let mut failures = 0usize;
    for source in &sources {
        let label = if source == "-" { "stdin" } else { source.as_str() };

        let raw = match read_input(source, decoder.config().max_input_bytes) {
            Ok(raw) => raw,
            Err(message) => {
                error!(source = label, "{}", message);
                eprintln!("{}", message);
                failures += 1;
                continue;
            }
        };

        let result = decoder.decode(&raw);
        DecodeLog::from_result(label, &result).emit();

        match result {
            Ok(request) => {
                let rendered = if args.pretty {
                    serde_json::to_string_pretty(&request)
                } else {
                    serde_json::to_string(&request)
                };
                match rendered {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        error!(source = label, "failed to render request: {}", e);
                        failures += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("{}: {}", label, e);
                failures += 1;
            }
        }
    }

    info!(inputs = sources.len(), failures, "native-decode finished");
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
