//! Render an invoice to PDF and publish it to a cubic.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::client::CubicClient;
use crate::contract::{Renderer, Transport};
use crate::error::{InvoiceError, RenderError};
use crate::types::{FileDescriptor, FolderUploadMeta, SingleUploadMeta};

pub const PDF_MIME: &str = "application/pdf";
pub const DEFAULT_FIELD_NAME: &str = "eFile";

/// Invoice record handed to the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub name: String,
    pub cell_no: String,
    #[serde(default)]
    pub landline_no: String,
    pub email: String,
    pub date: String,
    pub account_info: AccountInfo,
    pub order_info: OrderInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub vat_no: String,
    pub order_no: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub inv_no: String,
    pub sales_person: String,
    pub del_method: String,
    pub pay_method: String,
    pub stock: StockLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub barcode: String,
    pub s_code: String,
    pub description: String,
    pub qty: u32,
    pub unit_price: f64,
    pub nett_price: f64,
    pub vat: f64,
}

/// Where the rendered PDF is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    Folder(FolderUploadMeta),
    Single(SingleUploadMeta),
}

/// One render-and-upload run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceJob {
    pub template: String,
    pub output_dir: PathBuf,
    /// Defaults to `<millis>-<uuid>-inv.pdf`.
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Remove the local PDF once the upload has finished, whatever its outcome.
    #[serde(default)]
    pub cleanup: bool,
    pub destination: Destination,
}

fn default_field_name() -> String {
    DEFAULT_FIELD_NAME.to_string()
}

impl InvoiceJob {
    pub fn trace_loaded(&self) {
        let target = match &self.destination {
            Destination::Folder(meta) => format!("folder {}/{}", meta.section_name, meta.folder_name),
            Destination::Single(meta) => format!("singles {}", meta.section_name),
        };
        info!(
            template = %self.template,
            output_dir = %self.output_dir.display(),
            field_name = %self.field_name,
            cleanup = self.cleanup,
            destination = %target,
            "Loaded invoice job"
        );
    }

    fn pdf_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                format!("{millis}-{}-inv.pdf", Uuid::new_v4())
            }
        }
    }
}

/// Renders `data` with `job.template`, writes the PDF, and uploads it.
///
/// Returns the API response of the upload call.
pub async fn publish_invoice<R: Renderer, T: Transport>(
    renderer: &R,
    client: &CubicClient<T>,
    job: &InvoiceJob,
    data: &InvoiceData,
) -> Result<Value, InvoiceError> {
    let record = serde_json::to_value(data)
        .map_err(|e| RenderError::Template(format!("invoice record is not serializable: {e}")))?;

    let pdf = renderer.render(&job.template, &record).await.map_err(|e| {
        error!(template = %job.template, error = %e, "Invoice render failed");
        e
    })?;

    tokio::fs::create_dir_all(&job.output_dir)
        .await
        .map_err(|source| InvoiceError::Io {
            context: "failed to create output directory",
            path: job.output_dir.clone(),
            source,
        })?;

    let file_name = job.pdf_name();
    let path = job.output_dir.join(&file_name);
    tokio::fs::write(&path, &pdf)
        .await
        .map_err(|source| InvoiceError::Io {
            context: "failed to write invoice",
            path: path.clone(),
            source,
        })?;

    let size = tokio::fs::metadata(&path)
        .await
        .map_err(|source| InvoiceError::Io {
            context: "failed to stat invoice",
            path: path.clone(),
            source,
        })?
        .len();
    info!(path = %path.display(), size, "Wrote invoice PDF");

    let files = [FileDescriptor {
        original_filename: file_name,
        size,
        filepath: path.clone(),
        mime_type: PDF_MIME.to_string(),
    }];

    let result = match &job.destination {
        Destination::Folder(meta) => client.upload_folder_file(meta, &job.field_name, &files).await,
        Destination::Single(meta) => client.upload_single(meta, &job.field_name, &files).await,
    };

    if job.cleanup {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = ?e, "Failed to remove local invoice");
        }
    }

    let response = result?;
    info!(invoice = %data.order_info.inv_no, "Invoice published");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_defaults_field_name_and_cleanup() {
        let yaml = r#"
template: invoice
output_dir: /tmp/out
destination:
  type: single
  cubicId: c1
  cubicName: cubic
  sectionName: files
  sectionTitle: Invoices
"#;
        let job: InvoiceJob = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(job.field_name, "eFile");
        assert!(!job.cleanup);
        assert!(matches!(job.destination, Destination::Single(ref m) if m.section_name == "files"));
    }

    #[test]
    fn generated_names_are_unique_pdfs() {
        let job: InvoiceJob = serde_yaml::from_str(
            "template: t\noutput_dir: o\ndestination:\n  type: folder\n  cardId: c\n  cardName: n\n  sectionName: files\n  sectionTitle: s\n  folderName: f\n  folderId: id\n",
        )
        .unwrap();
        let a = job.pdf_name();
        let b = job.pdf_name();
        assert!(a.ends_with("-inv.pdf"));
        assert_ne!(a, b);
    }

    #[test]
    fn configured_file_name_wins() {
        let mut job: InvoiceJob = serde_yaml::from_str(
            "template: t\noutput_dir: o\nfile_name: fixed.pdf\ndestination:\n  type: single\n  cubicId: c\n  cubicName: n\n  sectionName: files\n  sectionTitle: s\n",
        )
        .unwrap();
        assert_eq!(job.pdf_name(), "fixed.pdf");
        job.file_name = None;
        assert_ne!(job.pdf_name(), "fixed.pdf");
    }

    #[test]
    fn invoice_data_uses_camel_case() {
        let data: InvoiceData = serde_json::from_value(serde_json::json!({
            "name": "Jane",
            "cellNo": "0821234567",
            "email": "jane@example.com",
            "date": "2024-01-31",
            "accountInfo": {"id": "A1", "orderNo": "O9"},
            "orderInfo": {
                "invNo": "INV-1",
                "salesPerson": "Sam",
                "delMethod": "Courier",
                "payMethod": "EFT",
                "stock": {
                    "barcode": "600", "sCode": "S1", "description": "Widget",
                    "qty": 2, "unitPrice": 10.0, "nettPrice": 20.0, "vat": 3.0
                }
            }
        }))
        .unwrap();
        assert_eq!(data.landline_no, "");
        assert_eq!(data.order_info.stock.s_code, "S1");
    }
}
