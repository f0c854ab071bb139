use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use sales_pulse::llm::{ChatCompletionClient, SalesAssistant};
use sales_pulse::{
    aggregate, loaded_month_names, BridgeConfig, ChatSession, FileStore, SheetIngestor,
    MONTH_NAMES,
};

/// Upload monthly sales spreadsheets and ask an AI assistant about them
#[derive(Parser, Debug)]
#[command(name = "sales-pulse")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding uploaded month datasets
    #[arg(long, env = "SALES_PULSE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Bearer token for the chat-completion service
    #[arg(long, env = "SALES_PULSE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the chat-completion model
    #[arg(short = 'm', long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a spreadsheet (.xlsx, .xls, .xlsb, .ods or .csv) as one month's data
    Upload {
        /// Month slot, 0 (Janeiro) to 11 (Dezembro)
        month: usize,
        file: PathBuf,
    },
    /// List the months that have data
    Months,
    /// Ask a single question and exit
    Ask { question: String },
    /// Interactive conversation about the loaded data
    Chat,
    /// Serve the analyze-sales HTTP endpoint
    Serve {
        #[arg(long, env = "SALES_PULSE_BIND_ADDR")]
        bind: Option<String>,
    },
}

impl Args {
    fn config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::from_env();
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        config
    }
}

fn assistant(config: &BridgeConfig) -> Result<SalesAssistant<ChatCompletionClient>> {
    let client = ChatCompletionClient::from_config(config)?;
    Ok(SalesAssistant::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.config();

    match args.command {
        Command::Upload { month, file } => {
            let store = FileStore::open(&config.data_dir)?;
            let report = SheetIngestor::new(&store)
                .ingest_file(month, &file)
                .with_context(|| format!("Erro no upload de {}", file.display()))?;
            println!("✅ {}", report);
        }
        Command::Months => {
            let store = FileStore::open(&config.data_dir)?;
            let loaded = loaded_month_names(&store)?;
            for name in MONTH_NAMES {
                let mark = if loaded.iter().any(|m| m == name) { "✔" } else { " " };
                println!("[{}] {}", mark, name);
            }
            if loaded.len() == MONTH_NAMES.len() {
                println!("\nTodos os dados foram carregados.");
            }
        }
        Command::Ask { question } => {
            let store = FileStore::open(&config.data_dir)?;
            let assistant = assistant(&config)?;
            let records = aggregate(&store)?;
            let months = loaded_month_names(&store)?;
            let answer = assistant.ask(&question, &records, &months).await?;
            println!("{}", answer);
        }
        Command::Chat => run_chat(&config).await?,
        Command::Serve { bind } => {
            let assistant = assistant(&config)?;
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            sales_pulse::server::serve(&bind, assistant).await?;
        }
    }

    Ok(())
}

async fn run_chat(config: &BridgeConfig) -> Result<()> {
    let store = FileStore::open(&config.data_dir)?;
    let assistant = assistant(config)?;
    let months = loaded_month_names(&store)?;
    if months.is_empty() {
        bail!("Nenhuma planilha carregada. Faça upload das planilhas primeiro.");
    }

    println!("📊 Planilhas ativas: {}", months.join(", "));
    println!("🤖 Pergunte sobre suas vendas (digite 'sair' para encerrar).");

    let mut session = ChatSession::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let question = input.trim();
        if question.eq_ignore_ascii_case("sair") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let records = aggregate(&store)?;
        match session.send(&assistant, question, &records, &months).await {
            Ok(Some(reply)) => println!("\n{}\n", reply.content),
            Ok(None) => {}
            Err(e) => println!("⚠️  Erro na análise: {}\n", e),
        }
    }

    Ok(())
}
