use super::convert::{convert_with_retry, describe_error};
use super::ui;
use crate::core::ConversionEngine;
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const GREETING: &str = "Send an amount and a currency and I will convert it at the official \
Bank of Russia rate.\n\nExamples:\n  100 usd\n  2500 руб\n  100 kzt\n  100 доллар сша\n\n\
Type quit to exit.\n\n";

/// Converts each input line until end of input or `quit`. All lines share the
/// engine's rate cache.
pub async fn run<R, W>(engine: &ConversionEngine, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(GREETING.as_bytes()).await?;
    output.flush().await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }

        debug!(%text, "Handling input line");
        let reply = match convert_with_retry(engine, text, false).await {
            Ok(result) => result.display_as_table(),
            Err(err) => ui::style_text(&describe_error(&err), ui::StyleType::Error),
        };
        output.write_all(format!("{reply}\n\n").as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
