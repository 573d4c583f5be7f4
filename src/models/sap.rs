use bigdecimal::BigDecimal;

/// 一次运行、一个类别生成的 SAP 文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SapFileSet {
    pub data_contents: String,
    pub control_contents: String,
    pub data_file_name: String,
    pub control_file_name: String,
}

/// 运行模式：review/final × dry/real
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    pub final_run: bool,
    pub real_run: bool,
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        if self.final_run {
            "final"
        } else {
            "review"
        }
    }
}

/// 单个类别的运行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    pub total_invoices: usize,
    pub sap_invoices: usize,
    pub other_invoices: usize,
}

/// 标记付款的单条结果 (写入 CSV 台账)
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub invoice_id: String,
    pub number: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub paid: bool,
    pub error: Option<String>,
}
