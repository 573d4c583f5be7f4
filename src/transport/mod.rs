//! 外部协作方：参数存储、SAP dropbox、邮件投递

pub mod dropbox;
pub mod mail;
pub mod parameter_store;

pub use dropbox::DirectoryDropbox;
pub use mail::{Attachment, HttpMailRelay, MailSettings, ReportEmail};
pub use parameter_store::{FileParameterStore, MemoryParameterStore};

use async_trait::async_trait;

use crate::error::TransportError;

/// 键值参数存储 (保存 SAP 序号)
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<String, TransportError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), TransportError>;
}

/// SAP 文件投递点
#[async_trait]
pub trait Dropbox: Send + Sync {
    async fn put(&self, file_name: &str, contents: &str) -> Result<(), TransportError>;
}

/// 报告邮件投递，返回消息 ID
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &ReportEmail) -> Result<String, TransportError>;
}
