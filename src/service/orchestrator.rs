use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use super::classifier;
use super::ledger;
use super::report;
use super::sap_file;
use super::sequence::SequenceManager;
use crate::alma::AlmaApi;
use crate::error::SapError;
use crate::models::{
    InvoiceField, InvoiceType, NormalizedInvoice, PaymentOutcome, RunMode, RunResult, SapFileSet,
    SAP_PAYMENT_METHOD,
};
use crate::transport::{Dropbox, MailSettings, Mailer, ReportEmail};

/// 单个类别 (专著 / 连续出版物) 的一次运行
///
/// | 模式          | 副作用                                           |
/// |---------------|--------------------------------------------------|
/// | review / dry  | 生成汇总与报告，写入日志                         |
/// | review / real | 汇总与报告发邮件给审核人                         |
/// | final / dry   | 另外生成 SAP 数据文件与控制文件，写入日志        |
/// | final / real  | 投递 SAP 文件、写回序号、标记付款、发邮件给财务  |
pub struct RunOrchestrator<'a> {
    alma: &'a dyn AlmaApi,
    sequence: &'a SequenceManager<'a>,
    dropbox: &'a dyn Dropbox,
    mailer: &'a dyn Mailer,
    mail_settings: &'a MailSettings,
    workspace: String,
    output_dir: Option<PathBuf>,
}

impl<'a> RunOrchestrator<'a> {
    pub fn new(
        alma: &'a dyn AlmaApi,
        sequence: &'a SequenceManager<'a>,
        dropbox: &'a dyn Dropbox,
        mailer: &'a dyn Mailer,
        mail_settings: &'a MailSettings,
        workspace: impl Into<String>,
    ) -> Self {
        Self {
            alma,
            sequence,
            dropbox,
            mailer,
            mail_settings,
            workspace: workspace.into(),
            output_dir: None,
        }
    }

    /// 本地保存运行产物的目录
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub async fn run(
        &self,
        problem_invoices: &[NormalizedInvoice],
        invoices: &[NormalizedInvoice],
        invoice_type: InvoiceType,
        sequence_number: &str,
        date: DateTime<Utc>,
        mode: RunMode,
    ) -> Result<RunResult, SapError> {
        let today = date.date_naive();
        let title = invoice_type.title_plural();

        tracing::info!("Starting file generation process for run {}", invoice_type);
        let (data_file_name, control_file_name) = sap_file::file_names(sequence_number, today);
        tracing::info!(
            "Generated next SAP file names: {}, {}",
            data_file_name,
            control_file_name
        );

        tracing::info!("Generating {}s summary", invoice_type);
        let summary =
            report::render_summary(problem_invoices, invoices, &data_file_name, &control_file_name)?;
        tracing::info!("Generating {}s report", invoice_type);
        let cover_sheets = report::render_report(today, invoices)?;

        let (sap_invoices, other_invoices) =
            classifier::split(invoices, InvoiceField::PaymentMethod, SAP_PAYMENT_METHOD, None);

        let mut file_set = None;
        if mode.final_run {
            tracing::info!("Final run, generating files for SAP");
            let files = sap_file::build_file_set(sequence_number, today, &sap_invoices)?;
            tracing::info!("{} data file contents:\n{}", title, files.data_contents);
            tracing::info!("{} control file contents:\n{}", title, files.control_contents);

            if mode.real_run {
                self.transmit(&files).await?;

                tracing::info!("Real run, updating SAP sequence in Parameter Store");
                self.sequence
                    .update_sequence(sequence_number, today, invoice_type)
                    .await?;

                tracing::info!("Real run, marking invoices PAID in Alma");
                let outcomes = self.mark_invoices_paid(invoices, date).await;
                let paid = outcomes.iter().filter(|o| o.paid).count();
                tracing::info!("{} {} invoices successfully marked as paid in Alma", paid, invoice_type);
                if let Err(err) = self.write_ledger(invoice_type, date, &outcomes) {
                    tracing::error!("Could not write {} payment ledger: {}", invoice_type, err);
                }
            }
            file_set = Some(files);
        }

        if mode.real_run {
            let email = ReportEmail::for_run(
                self.mail_settings,
                &summary,
                &cover_sheets,
                invoice_type,
                date,
                mode.final_run,
            );
            let message_id = self.mailer.send(&email).await?;
            tracing::info!("{} email sent with message ID: {}", title, message_id);
        } else {
            tracing::info!("{} summary:\n{}\n", title, summary);
            tracing::info!("{} report:\n{}\n", title, cover_sheets);
            self.write_artifacts(invoice_type, mode, date, &summary, &cover_sheets, file_set.as_ref())
                .await?;
        }

        Ok(RunResult {
            total_invoices: invoices.len(),
            sap_invoices: sap_invoices.len(),
            other_invoices: other_invoices.len(),
        })
    }

    /// 逐张标记付款；失败只记录，不中断
    pub async fn mark_invoices_paid(
        &self,
        invoices: &[NormalizedInvoice],
        date: DateTime<Utc>,
    ) -> Vec<PaymentOutcome> {
        let mut outcomes = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            tracing::debug!(
                invoice_id = %invoice.id,
                total_amount = %invoice.total_amount,
                currency = %invoice.currency,
                "Marking invoice paid"
            );
            let result = self
                .alma
                .mark_invoice_paid(&invoice.id, date, &invoice.total_amount, &invoice.currency)
                .await;
            let error = match result {
                Ok(()) => None,
                Err(err) => {
                    tracing::error!(
                        "Something went wrong marking invoice '{}' paid in Alma. {}",
                        invoice.id,
                        err
                    );
                    Some(err.to_string())
                }
            };
            outcomes.push(PaymentOutcome {
                invoice_id: invoice.id.clone(),
                number: invoice.number.clone(),
                amount: invoice.total_amount.clone(),
                currency: invoice.currency.clone(),
                paid: error.is_none(),
                error,
            });
        }
        outcomes
    }

    async fn transmit(&self, files: &SapFileSet) -> Result<(), SapError> {
        tracing::info!("Real run, sending files to SAP dropbox");
        self.dropbox
            .put(&files.data_file_name, &files.data_contents)
            .await?;
        tracing::info!(
            "Sent data file '{}' to SAP dropbox {}",
            files.data_file_name,
            self.workspace
        );
        self.dropbox
            .put(&files.control_file_name, &files.control_contents)
            .await?;
        tracing::info!(
            "Sent control file '{}' to SAP dropbox {}",
            files.control_file_name,
            self.workspace
        );
        Ok(())
    }

    async fn write_artifacts(
        &self,
        invoice_type: InvoiceType,
        mode: RunMode,
        date: DateTime<Utc>,
        summary: &str,
        cover_sheets: &str,
        file_set: Option<&SapFileSet>,
    ) -> Result<(), SapError> {
        let Some(dir) = self.output_dir.as_deref() else {
            return Ok(());
        };
        tokio::fs::create_dir_all(dir).await?;

        let stamp = date.format("%Y%m%d%H%M%S");
        let prefix = format!("{}_{}", invoice_type.mail_label(), mode.label());
        write_file(dir, &format!("{prefix}_summary_{stamp}.txt"), summary).await?;
        write_file(dir, &format!("{prefix}_report_{stamp}.txt"), cover_sheets).await?;
        if let Some(files) = file_set {
            write_file(dir, &files.data_file_name, &files.data_contents).await?;
            write_file(dir, &files.control_file_name, &files.control_contents).await?;
        }
        Ok(())
    }

    fn write_ledger(
        &self,
        invoice_type: InvoiceType,
        date: DateTime<Utc>,
        outcomes: &[PaymentOutcome],
    ) -> Result<(), SapError> {
        let Some(dir) = self.output_dir.as_deref() else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "payments_{}_{}.csv",
            invoice_type.mail_label(),
            date.format("%Y%m%d%H%M%S")
        ));
        ledger::export_payment_ledger(outcomes, &path)?;
        tracing::info!("Payment ledger written to {}", path.display());
        Ok(())
    }
}

async fn write_file(dir: &Path, file_name: &str, contents: &str) -> Result<(), SapError> {
    let path = dir.join(file_name);
    tokio::fs::write(&path, contents).await?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
