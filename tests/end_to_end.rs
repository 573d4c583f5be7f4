//! 以模拟的 Alma 与邮件中继跑完整流程

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sap_invoices::models::RunMode;
use sap_invoices::transport::{
    DirectoryDropbox, FileParameterStore, HttpMailRelay, MailSettings, ParameterStore,
};
use sap_invoices::{AlmaClient, InvoiceProcess, ProcessOutcome, RunOrchestrator, SequenceManager};

const SEQUENCE_KEY: &str = "/test/example/sap_sequence";

fn invoice(id: &str, vendor: &str, number: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "number": number,
        "invoice_date": "2021-09-27Z",
        "vendor": {"value": vendor},
        "payment_method": {"value": "ACCOUNTINGDEPARTMENT"},
        "total_amount": amount,
        "currency": {"value": "USD"},
        "invoice_lines": {"invoice_line": [
            {"fund_distribution": [{"fund_code": {"value": "ABC"}, "amount": amount}]}
        ]}
    })
}

fn vendor(name: &str) -> Value {
    json!({
        "name": name,
        "contact_info": {"address": [{
            "address_type": [{"value": "payment"}],
            "line1": "123 Main Street",
            "city": "Cambridge",
            "state_province": "MA",
            "postal_code": "02139",
            "country": {"value": "USA"}
        }]}
    })
}

fn mail_settings() -> MailSettings {
    MailSettings {
        from_address: "from@example.com".to_string(),
        reply_to: "replyto@example.com".to_string(),
        final_recipients: "final@example.com".to_string(),
        review_recipients: "review@example.com".to_string(),
    }
}

async fn mock_alma(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/acq/invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_record_count": 2,
            "invoice": [
                invoice("0501130659", "FOOBAR-S", "67890", 200.0),
                invoice("0501130656", "DANGER-M", "456789", 150.0)
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acq/vendors/DANGER-M"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendor("Danger Inc.")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acq/vendors/FOOBAR-S"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendor("Foo Bar Serials")))
        .expect(1)
        .mount(server)
        .await;
    // 同一基金只查询一次
    Mock::given(method("GET"))
        .and(path("/acq/funds"))
        .and(query_param("q", "fund_code~ABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_record_count": 1,
            "fund": [{"code": "ABC", "external_id": "1234567-000001"}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mock_paid(server: &MockServer, invoice_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/acq/invoices/{invoice_id}")))
        .and(query_param("op", "paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": invoice_id,
            "payment": {"payment_status": {"value": "PAID"}}
        })))
        .expect(times)
        .mount(server)
        .await;
}

fn alma_client(server: &MockServer) -> AlmaClient {
    AlmaClient::builder(format!("{}/", server.uri()), "just-for-testing")
        .request_delay(Duration::ZERO)
        .build()
        .expect("alma client")
}

#[tokio::test]
async fn final_real_run_delivers_files_and_advances_sequence() {
    let alma_server = MockServer::start().await;
    mock_alma(&alma_server).await;
    mock_paid(&alma_server, "0501130656", 1).await;
    mock_paid(&alma_server, "0501130659", 1).await;

    let mail_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message_id": "abc123"})))
        .expect(2)
        .mount(&mail_server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let dropbox_dir = workdir.path().join("dropbox");
    std::fs::create_dir(&dropbox_dir).unwrap();
    let output_dir = workdir.path().join("output");

    let store = FileParameterStore::new(workdir.path().join("parameters.json"));
    store
        .put(SEQUENCE_KEY, "0003,20210722000000,ser")
        .await
        .unwrap();

    let alma = alma_client(&alma_server);
    let dropbox = DirectoryDropbox::new(&dropbox_dir);
    let mailer =
        HttpMailRelay::new(format!("{}/send", mail_server.uri()), Duration::from_secs(5)).unwrap();
    let settings = mail_settings();
    let sequence = SequenceManager::new(&store, SEQUENCE_KEY);
    let orchestrator = RunOrchestrator::new(&alma, &sequence, &dropbox, &mailer, &settings, "test")
        .with_output_dir(Some(output_dir.clone()));
    let process = InvoiceProcess::new(&alma, &sequence, &orchestrator);

    let date = Utc.with_ymd_and_hms(2021, 10, 1, 9, 0, 0).unwrap();
    let outcome = process
        .execute(date, RunMode { final_run: true, real_run: true })
        .await
        .unwrap();

    match outcome {
        ProcessOutcome::Completed { monograph, serial } => {
            assert_eq!(monograph.total_invoices, 1);
            assert_eq!(monograph.sap_invoices, 1);
            assert_eq!(serial.total_invoices, 1);
        }
        ProcessOutcome::NoInvoices => panic!("invoices were available"),
    }

    assert_eq!(
        store.get(SEQUENCE_KEY).await.unwrap(),
        "0005,20211001000000,ser"
    );

    let mut delivered: Vec<String> = std::fs::read_dir(&dropbox_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    delivered.sort();
    assert_eq!(
        delivered,
        vec![
            "clibsapg.0004.20211001000000",
            "clibsapg.0005.20211001000000",
            "dlibsapg.0004.20211001000000",
            "dlibsapg.0005.20211001000000",
        ]
    );

    let data = std::fs::read_to_string(dropbox_dir.join("dlibsapg.0004.20211001000000")).unwrap();
    assert!(data.starts_with('B'));
    assert_eq!(data.lines().count(), 2);
    let control =
        std::fs::read_to_string(dropbox_dir.join("clibsapg.0004.20211001000000")).unwrap();
    assert_eq!(control.len(), 113);

    let ledger = std::fs::read_to_string(output_dir.join("payments_mono_20211001090000.csv")).unwrap();
    assert!(ledger.starts_with("invoice_id,number,amount,currency,paid,error"));
    assert!(ledger.contains("0501130656,456789,150.00,USD,true,"));
}

#[tokio::test]
async fn review_dry_run_has_no_side_effects() {
    let alma_server = MockServer::start().await;
    mock_alma(&alma_server).await;
    mock_paid(&alma_server, "0501130656", 0).await;
    mock_paid(&alma_server, "0501130659", 0).await;

    let mail_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message_id": "abc123"})))
        .expect(0)
        .mount(&mail_server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let dropbox_dir = workdir.path().join("dropbox");
    std::fs::create_dir(&dropbox_dir).unwrap();
    let output_dir = workdir.path().join("output");

    let store = FileParameterStore::new(workdir.path().join("parameters.json"));
    store
        .put(SEQUENCE_KEY, "0003,20210722000000,ser")
        .await
        .unwrap();

    let alma = alma_client(&alma_server);
    let dropbox = DirectoryDropbox::new(&dropbox_dir);
    let mailer =
        HttpMailRelay::new(format!("{}/send", mail_server.uri()), Duration::from_secs(5)).unwrap();
    let settings = mail_settings();
    let sequence = SequenceManager::new(&store, SEQUENCE_KEY);
    let orchestrator = RunOrchestrator::new(&alma, &sequence, &dropbox, &mailer, &settings, "test")
        .with_output_dir(Some(output_dir.clone()));
    let process = InvoiceProcess::new(&alma, &sequence, &orchestrator);

    let date = Utc.with_ymd_and_hms(2021, 10, 1, 9, 0, 0).unwrap();
    process.execute(date, RunMode::default()).await.unwrap();

    assert_eq!(
        store.get(SEQUENCE_KEY).await.unwrap(),
        "0003,20210722000000,ser"
    );
    assert_eq!(std::fs::read_dir(&dropbox_dir).unwrap().count(), 0);

    let summary =
        std::fs::read_to_string(output_dir.join("mono_review_summary_20211001090000.txt")).unwrap();
    assert!(summary.contains("dlibsapg.0004.20211001000000"));
    assert!(output_dir.join("serial_review_report_20211001090000.txt").exists());
    assert!(!output_dir.join("dlibsapg.0004.20211001000000").exists());
}
