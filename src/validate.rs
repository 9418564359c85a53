//! Argument checks run before any request is built.
//!
//! One function per client operation. Each returns the first offending field
//! as [`CubicError::Validation`].

use serde_json::Value;

use crate::error::CubicError;
use crate::types::{CreateFolder, DeleteFile, DeleteFolder};

const CUBIC_ID: (&str, &str) = ("cubicId", "Provide valid cubic ID");
const CUBIC_NAME: (&str, &str) = ("cubicName", "Provide valid cubic name");
const SECTION: (&str, &str) = ("sectionName", "Provide cubic section name you wish to access");
const SECTION_NAME: (&str, &str) = ("sectionName", "Provide valid section name");
const FOLDER_NAME: (&str, &str) = ("folderName", "Provide valid folder name");
const FOLDER_ID: (&str, &str) = ("folderId", "Provide valid folder ID");

fn non_empty(value: &str, (field, message): (&'static str, &'static str)) -> Result<(), CubicError> {
    if value.is_empty() {
        return Err(CubicError::validation(field, message));
    }
    Ok(())
}

/// Credentials every call carries.
pub fn init(token: &str, app_id: &str) -> Result<(), CubicError> {
    non_empty(token, ("token", "Token is missing"))?;
    non_empty(app_id, ("appID", "AppId is missing"))
}

pub fn cubic_id(cubic_id: &str) -> Result<(), CubicError> {
    non_empty(cubic_id, CUBIC_ID)
}

/// Section, singles and folder listings, and a single folder.
pub fn section(cubic_id: &str, section_name: &str) -> Result<(), CubicError> {
    non_empty(cubic_id, CUBIC_ID)?;
    non_empty(section_name, SECTION)
}

pub fn create_folder(req: &CreateFolder) -> Result<(), CubicError> {
    non_empty(&req.cubic_id, CUBIC_ID)?;
    non_empty(&req.cubic_name, CUBIC_NAME)?;
    non_empty(&req.section_name, SECTION_NAME)?;
    non_empty(&req.folder_name, FOLDER_NAME)
}

pub fn delete_folder(req: &DeleteFolder) -> Result<(), CubicError> {
    non_empty(&req.cubic_id, CUBIC_ID)?;
    non_empty(&req.cubic_name, CUBIC_NAME)?;
    non_empty(&req.section_name, SECTION_NAME)?;
    non_empty(&req.folder_name, FOLDER_NAME)?;
    non_empty(&req.folder_id, FOLDER_ID)
}

pub fn delete_file(req: &DeleteFile) -> Result<(), CubicError> {
    non_empty(&req.section_name, SECTION_NAME)
}

/// Shape check for a delete record that has not been typed yet.
pub fn delete_file_record(value: &Value) -> Result<(), CubicError> {
    let Some(record) = value.as_object() else {
        return Err(CubicError::validation("data", "Provide valid data object"));
    };
    match record.get("sectionName") {
        Some(Value::String(section)) => non_empty(section, SECTION_NAME),
        _ => Err(CubicError::validation(SECTION_NAME.0, SECTION_NAME.1)),
    }
}

/// Singles upload. Folder uploads accept any field name.
pub fn single_upload_field(field_name: &str) -> Result<(), CubicError> {
    non_empty(field_name, ("fieldname", "Provide valid file field name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create() -> CreateFolder {
        CreateFolder {
            cubic_id: "c1".into(),
            cubic_name: "n".into(),
            section_name: "files".into(),
            folder_name: "f".into(),
        }
    }

    fn delete() -> DeleteFolder {
        DeleteFolder {
            cubic_id: "c1".into(),
            cubic_name: "n".into(),
            section_name: "files".into(),
            folder_name: "f".into(),
            folder_id: "f1".into(),
        }
    }

    #[test]
    fn init_requires_token_then_app_id() {
        assert!(init("t", "a").is_ok());
        assert_eq!(init("", "").unwrap_err().field(), Some("token"));
        assert_eq!(init("t", "").unwrap_err().field(), Some("appID"));
    }

    #[test]
    fn section_checks_in_order() {
        assert!(section("c1", "image").is_ok());
        assert_eq!(section("", "").unwrap_err().field(), Some("cubicId"));
        assert_eq!(section("c1", "").unwrap_err().field(), Some("sectionName"));
    }

    #[test]
    fn create_folder_rejects_each_empty_field() {
        assert!(create_folder(&create()).is_ok());

        let cases: [(fn(&mut CreateFolder), &str); 4] = [
            (|r| r.cubic_id.clear(), "cubicId"),
            (|r| r.cubic_name.clear(), "cubicName"),
            (|r| r.section_name.clear(), "sectionName"),
            (|r| r.folder_name.clear(), "folderName"),
        ];
        for (clear, field) in cases {
            let mut req = create();
            clear(&mut req);
            assert_eq!(create_folder(&req).unwrap_err().field(), Some(field));
        }
    }

    #[test]
    fn delete_folder_rejects_each_empty_field() {
        assert!(delete_folder(&delete()).is_ok());

        let cases: [(fn(&mut DeleteFolder), &str); 5] = [
            (|r| r.cubic_id.clear(), "cubicId"),
            (|r| r.cubic_name.clear(), "cubicName"),
            (|r| r.section_name.clear(), "sectionName"),
            (|r| r.folder_name.clear(), "folderName"),
            (|r| r.folder_id.clear(), "folderId"),
        ];
        for (clear, field) in cases {
            let mut req = delete();
            clear(&mut req);
            assert_eq!(delete_folder(&req).unwrap_err().field(), Some(field));
        }
    }

    #[test]
    fn delete_file_record_shape() {
        assert!(delete_file_record(&json!({"sectionName": "files"})).is_ok());
        assert_eq!(
            delete_file_record(&json!(null)).unwrap_err().field(),
            Some("data")
        );
        assert_eq!(
            delete_file_record(&json!(["files"])).unwrap_err().field(),
            Some("data")
        );
        for bad in [json!({}), json!({"sectionName": null}), json!({"sectionName": 1}), json!({"sectionName": ""})] {
            assert_eq!(delete_file_record(&bad).unwrap_err().field(), Some("sectionName"));
        }
    }

    #[test]
    fn single_upload_needs_field_name() {
        assert!(single_upload_field("eFile").is_ok());
        assert_eq!(single_upload_field("").unwrap_err().field(), Some("fieldname"));
    }
}
