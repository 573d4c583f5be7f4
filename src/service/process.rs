use chrono::{DateTime, Utc};

use super::classifier;
use super::orchestrator::RunOrchestrator;
use super::parser::{self, InvoiceParser};
use super::sequence::{self, SequenceManager};
use crate::alma::AlmaApi;
use crate::error::SapError;
use crate::models::{InvoiceField, InvoiceType, RunMode, RunResult};

/// 一次完整处理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Alma 中没有待发送发票
    NoInvoices,
    Completed {
        monograph: RunResult,
        serial: RunResult,
    },
}

/// 拉取、解析、拆分发票，先跑专著再跑连续出版物
pub struct InvoiceProcess<'a> {
    alma: &'a dyn AlmaApi,
    sequence: &'a SequenceManager<'a>,
    orchestrator: &'a RunOrchestrator<'a>,
}

impl<'a> InvoiceProcess<'a> {
    pub fn new(
        alma: &'a dyn AlmaApi,
        sequence: &'a SequenceManager<'a>,
        orchestrator: &'a RunOrchestrator<'a>,
    ) -> Self {
        Self {
            alma,
            sequence,
            orchestrator,
        }
    }

    pub async fn execute(&self, date: DateTime<Utc>, mode: RunMode) -> Result<ProcessOutcome, SapError> {
        tracing::info!("Starting SAP invoices process with options:");
        tracing::info!("Date: {}", date);
        tracing::info!("Final run: {}", mode.final_run);
        tracing::info!("Real run: {}", mode.real_run);

        let records = parser::retrieve_sorted_invoices(self.alma).await?;
        if records.is_empty() {
            tracing::info!("No invoices waiting to be sent in Alma, aborting SAP invoice process");
            return Ok(ProcessOutcome::NoInvoices);
        }
        tracing::info!("{} invoices retrieved from Alma", records.len());

        let mut invoice_parser = InvoiceParser::new(self.alma);
        let (problem_invoices, clean_invoices) = invoice_parser.parse(&records).await?;
        tracing::info!("{} problem invoices found.", problem_invoices.len());
        tracing::debug!(
            vendors = invoice_parser.cache().vendor_count(),
            funds = invoice_parser.cache().fund_count(),
            "validation cache after parsing"
        );

        let (monographs, serials) = classifier::split(
            &clean_invoices,
            InvoiceField::Type,
            InvoiceType::Monograph.as_str(),
            Some(InvoiceType::Serial.as_str()),
        );
        tracing::info!("{} monograph invoices retrieved and parsed.", monographs.len());
        tracing::info!("{} serial invoices retrieved and parsed.", serials.len());

        let monograph_sequence = self.sequence.next_sequence().await?;
        let serial_sequence = sequence::increment(&monograph_sequence)?;

        let monograph = self
            .orchestrator
            .run(
                &problem_invoices,
                &monographs,
                InvoiceType::Monograph,
                &monograph_sequence,
                date,
                mode,
            )
            .await?;
        let serial = self
            .orchestrator
            .run(
                &problem_invoices,
                &serials,
                InvoiceType::Serial,
                &serial_sequence,
                date,
                mode,
            )
            .await?;

        tracing::info!(
            "SAP invoice process completed for a {} run\n\
             {} monograph invoices retrieved and processed:\n\
             {} SAP monograph invoices\n\
             {} other payment monograph invoices\n\
             {} serial invoices retrieved and processed\n",
            mode.label(),
            monograph.total_invoices,
            monograph.sap_invoices,
            monograph.other_invoices,
            serial.total_invoices
        );

        Ok(ProcessOutcome::Completed { monograph, serial })
    }
}
