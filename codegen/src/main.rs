//! # jsonb-codegen
//!
//! Generates serializer sources for the endpoint return types recorded in a type index.
//!
//! ```text
//! jsonb-codegen [--log-level <level>] <index.json> [config.json] [out-dir]
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use error_stack::Report;
use jsonb_codegen::config::{GlobalSerializationConfig, JsonbConfig};
use jsonb_codegen::driver::{Driver, FileSystemSink, ReturnTypeCandidates};
use jsonb_codegen::error::{Error, Result};
use jsonb_codegen::logging::{TracingLevel, init_tracing};
use jsonb_codegen::type_index::TypeIndex;
use strum::VariantNames;

const DEFAULT_OUT_DIR: &str = "generated";
const USAGE: &str = "usage: jsonb-codegen [--log-level <level>] <index.json> [config.json] [out-dir]";

struct Arguments {
    log_level: TracingLevel,
    index:     PathBuf,
    config:    Option<PathBuf>,
    out_dir:   PathBuf,
}

fn parse_arguments(mut args: impl Iterator<Item = String>) -> Result<Arguments> {
    let mut log_level = TracingLevel::Info;
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--log-level" {
            let value = args
                .next()
                .ok_or_else(|| Report::new(Error::invalid_config("arguments", USAGE)))?;
            log_level = TracingLevel::from_str(&value).map_err(|e| {
                Report::new(Error::invalid_config("log level", format!("{value}: {e}")))
                    .attach(format!("Valid levels: {}", TracingLevel::VARIANTS.join(", ")))
            })?;
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    let mut positional = positional.into_iter();
    let index = positional
        .next()
        .ok_or_else(|| Report::new(Error::invalid_config("arguments", USAGE)))?;
    let config = positional.next();
    let out_dir = positional
        .next()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    if positional.next().is_some() {
        return Err(Report::new(Error::invalid_config("arguments", USAGE)));
    }

    Ok(Arguments {
        log_level,
        index,
        config,
        out_dir,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let arguments = parse_arguments(std::env::args().skip(1))?;
    let _guard = init_tracing(arguments.log_level);

    let config = match &arguments.config {
        Some(path) => JsonbConfig::load(path)?.validate()?,
        None => GlobalSerializationConfig::default(),
    };
    let index = Arc::new(TypeIndex::load(&arguments.index)?);
    tracing::info!(classes = index.len(), index = %arguments.index.display(), "Loaded type index");

    let driver = Driver::new(Arc::clone(&index), config);
    let outcome = driver
        .run_concurrent(&ReturnTypeCandidates::new(&index))
        .await?;

    let mut sink = FileSystemSink::new(&arguments.out_dir)?;
    Driver::publish(&outcome, &mut sink)?;
    tracing::info!(
        files = sink.written().len(),
        out_dir = %sink.out_dir().display(),
        "Wrote generated sources"
    );
    Ok(())
}
