use config::{Config, Environment, Source};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::transport::MailSettings;

/// 应用配置，从环境变量加载 (`WORKSPACE` -> `workspace`)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub workspace: String,
    pub alma_api_url: String,
    pub alma_api_read_write_key: String,
    /// 秒
    pub alma_api_timeout: u64,
    pub alma_request_delay_ms: u64,
    /// 参数存储中保存 SAP 序号的键
    pub sap_sequence_num: String,
    pub parameter_store_path: PathBuf,
    pub sap_dropbox_path: PathBuf,
    pub mail_relay_url: String,
    pub send_from_email: String,
    pub sap_reply_to_email: String,
    pub sap_final_recipient_email: String,
    pub sap_review_recipient_email: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// 从进程环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("alma_api_timeout", 30)?
            .set_default("alma_request_delay_ms", 100)?
            .add_source(source)
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 生产环境的序号参数只能在 prod 工作区使用
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sap_sequence_num.contains("prod") && self.workspace != "prod" {
            return Err(ConfigError::InvalidValue {
                field: "sap_sequence_num".to_string(),
                reason: format!(
                    "production sequence parameter may only be used in the prod workspace, found workspace '{}'",
                    self.workspace
                ),
            });
        }
        Ok(())
    }

    pub fn alma_timeout(&self) -> Duration {
        Duration::from_secs(self.alma_api_timeout)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.alma_request_delay_ms)
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            from_address: self.send_from_email.clone(),
            reply_to: self.sap_reply_to_email.clone(),
            final_recipients: self.sap_final_recipient_email.clone(),
            review_recipients: self.sap_review_recipient_email.clone(),
        }
    }
}
