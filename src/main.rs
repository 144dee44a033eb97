use airwire::config::Config;
use airwire::http::reader::ResponseReader;
use airwire::http::response::ResponseMessage;
use airwire::http::writer::ResponseWriter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    tokio::select! {
        res = relay(&cfg) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Parses responses from stdin and writes their normalized form to stdout.
async fn relay(cfg: &Config) -> anyhow::Result<()> {
    let mut reader = ResponseReader::new(tokio::io::stdin(), cfg);
    let mut stdout = tokio::io::stdout();
    let mut message = ResponseMessage::new();
    let mut count = 0usize;

    while reader.read_response(&mut message).await? {
        count += 1;
        info!(
            index = count,
            status = message.status(),
            reason = message.status_message(),
            headers = message.headers().len(),
            content_length = message.content_len(),
            "Response parsed"
        );

        let mut writer = ResponseWriter::new(&message, &cfg.protocol)?;
        writer.write_to_stream(&mut stdout).await?;
    }

    info!(responses = count, "Input exhausted");
    Ok(())
}
