mod cli;

use chrono::Utc;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use cli::{Cli, Commands};
use sap_invoices::models::RunMode;
use sap_invoices::transport::{DirectoryDropbox, FileParameterStore, HttpMailRelay};
use sap_invoices::{
    logging, AlmaClient, AppConfig, InvoiceProcess, ProcessOutcome, RunOrchestrator, SapError,
    SequenceManager,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::ProcessInvoices {
            final_run,
            real_run,
            log_level,
        } => process_invoices(RunMode { final_run, real_run }, &log_level).await,
    }
}

async fn process_invoices(mode: RunMode, log_level: &str) -> ExitCode {
    // 初始化日志 - 使用本地时间格式
    match logging::init_tracing(log_level) {
        Ok(message) => info!("{}", message),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    // 加载配置
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "sap-invoices config settings loaded for environment: {}",
        config.workspace
    );

    match run(&config, mode).await {
        Ok(ProcessOutcome::Completed { .. }) => ExitCode::SUCCESS,
        Ok(ProcessOutcome::NoInvoices) => ExitCode::FAILURE,
        Err(err) => {
            error!("SAP invoice process failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &AppConfig, mode: RunMode) -> Result<ProcessOutcome, SapError> {
    let alma = AlmaClient::builder(&config.alma_api_url, &config.alma_api_read_write_key)
        .timeout(config.alma_timeout())
        .request_delay(config.request_delay())
        .build()?;
    let store = FileParameterStore::new(&config.parameter_store_path);
    let dropbox = DirectoryDropbox::new(&config.sap_dropbox_path);
    let mailer = HttpMailRelay::new(&config.mail_relay_url, config.alma_timeout())?;
    let mail_settings = config.mail_settings();

    let sequence = SequenceManager::new(&store, &config.sap_sequence_num);
    let orchestrator = RunOrchestrator::new(
        &alma,
        &sequence,
        &dropbox,
        &mailer,
        &mail_settings,
        &config.workspace,
    )
    .with_output_dir(config.output_dir.clone());
    let process = InvoiceProcess::new(&alma, &sequence, &orchestrator);

    process.execute(Utc::now(), mode).await
}
