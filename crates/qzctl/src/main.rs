// Файл: crates/qzctl/src/main.rs
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gateway::{HttpTransport, ScatterGatherCursor};
use queryzilla_shard::{content, Document};

#[derive(Parser)]
#[command(version, about = "Queryzilla control: scatter-gather search across shards")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Поиск по всем шардам одним агрегатным курсором
    Search {
        /// Адреса шардов host:port, в порядке регистрации (повторяемый)
        #[arg(long, required = true)]
        addr: Vec<String>,
        #[arg(long)]
        q: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Начать с глобальной строки (seek)
        #[arg(long, default_value_t = 0)]
        from: u64,
        #[arg(long, default_value_t = gateway::cursor::DEFAULT_PAGE)]
        page: usize,
        /// Маска contents: 1 text, 2 metadata, 4 terms, 8 matches
        #[arg(long)]
        contents: Option<u32>,
    },
    /// Статус одного шарда
    Status {
        #[arg(long)]
        addr: String,
        #[arg(long, default_value_t = false)]
        detail: bool,
    },
    /// Выселить все курсоры шарда
    Close {
        #[arg(long)]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Search {
            addr,
            q,
            limit,
            from,
            page,
            contents,
        } => {
            let transport = Arc::new(HttpTransport::new());
            let contents = contents.unwrap_or(content::ALL);
            let mut cur =
                ScatterGatherCursor::begin(transport, &addr, &q, contents, page).await?;

            if cur.global_total() == 0 {
                eprintln!("total=0");
                return Ok(());
            }

            let mut shown = 0usize;
            if from > 0 {
                cur.seek(from).await?;
            } else if !cur.next().await? {
                eprintln!("total={} shown=0", cur.global_total());
                return Ok(());
            }
            print_row(cur.global_row(), cur.current()?);
            shown += 1;

            while shown < limit && cur.next().await? {
                print_row(cur.global_row(), cur.current()?);
                shown += 1;
            }
            eprintln!("total={} shown={}", cur.global_total(), shown);

            cur.close().await;
        }
        Cmd::Status { addr, detail } => {
            let url = if detail {
                format!("http://{addr}/status?detail")
            } else {
                format!("http://{addr}/status")
            };
            let v: serde_json::Value = reqwest::get(&url).await?.json().await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        Cmd::Close { addr } => {
            let v: serde_json::Value = reqwest::get(format!("http://{addr}/close"))
                .await?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
    }
    Ok(())
}

fn print_row(row: i64, doc: &Document) {
    let id = doc
        .metadata
        .get("_id")
        .cloned()
        .unwrap_or_else(|| "-".to_string());
    println!("{}\t{}\t{}", row, id, preview(doc, 80));
}

/// Усечённое превью текста; длинный хвост помечается многоточием.
fn preview(doc: &Document, max: usize) -> String {
    let text = doc.text.as_deref().unwrap_or("");
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}…")
    } else {
        text.to_string()
    }
}
