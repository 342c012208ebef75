use anyhow::Result;
use copygen::client::AutogenClient;
use copygen::panel::{Panel, Phase, SystemClipboard};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let mut panel = Panel::new(AutogenClient::from_env());
    let mut clipboard = SystemClipboard;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("copygen panel - marketing copy from a title and feature list");
    loop {
        let Some(title) = prompt(&mut lines, "\nProduct title (empty to quit): ").await? else {
            break;
        };
        if title.trim().is_empty() {
            break;
        }

        println!("Features, one per line (finish with an empty line):");
        let mut features_text = String::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                break;
            }
            features_text.push_str(&line);
            features_text.push('\n');
        }

        println!("Generating...");
        panel.submit(&title, &features_text).await;
        stream_reveal(&panel).await?;

        if panel.phase() == Phase::Ready {
            print_metadata(&panel);
            if let Some(answer) = prompt(&mut lines, "Copy to clipboard? [y/N]: ").await? {
                if answer.trim().eq_ignore_ascii_case("y") {
                    panel.copy_to_clipboard(&mut clipboard);
                    if panel.copied() {
                        println!("Copied!");
                    }
                }
            }
        }
    }
    Ok(())
}

/// Prints the marketing copy as the reveal animation progresses.
async fn stream_reveal(panel: &Panel) -> Result<()> {
    let Some(mut rx) = panel.subscribe_reveal() else {
        return Ok(());
    };
    let mut printed = 0;
    while rx.changed().await.is_ok() {
        let shown = rx.borrow_and_update().clone();
        let delta: String = shown.chars().skip(printed).collect();
        printed = shown.chars().count();
        print!("{delta}");
        std::io::stdout().flush()?;
    }
    println!();
    Ok(())
}

fn print_metadata(panel: &Panel) {
    let result = panel.result();
    if let Some(title) = &result.title {
        println!("Product: {title}");
    }
    if let Some(brand) = &result.brand {
        println!("Brand: {brand}");
    }
    println!(
        "Price: {} (was {})",
        result.price_display(),
        result.original_price_display()
    );
    if let Some(url) = &result.canonical_url {
        println!("Listing: {url}");
    }
    if !result.images.is_empty() {
        println!("Images:");
        for image in &result.images {
            println!("  {image}");
        }
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}
