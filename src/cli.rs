//! 命令行参数定义

use clap::{Parser, Subcommand};

/// Alma 发票 -> SAP 付款文件
#[derive(Parser, Debug)]
#[command(name = "sap-invoices", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 处理待发送发票：review 运行只生成并发送汇总与报告；
    /// final 运行另外生成 SAP 文件、投递、写回序号并在 Alma 中标记付款
    ProcessInvoices {
        /// 正式运行 (默认为 review 运行)
        #[arg(long)]
        final_run: bool,

        /// 谨慎使用：真实执行外部副作用 (发邮件；final 时投递文件并标记付款)。
        /// 默认为 dry run，只在日志中输出内容
        #[arg(long)]
        real_run: bool,

        /// 日志级别 (不区分大小写)，例如 debug 或 warning
        #[arg(short, long, env = "LOG_LEVEL", default_value = "INFO")]
        log_level: String,
    },
}
