//! Multipart form description for [`upload_form`](crate::HttpClient::upload_form).
//!
//! # Design
//! `PostForm` is plain owned data; nothing engine-specific happens until
//! submission, when the field list is serialized into the engine's
//! multipart representation. That keeps forms cheap to build, clone, and
//! inspect in tests, and means a form outliving its request owns no engine
//! resources.

use std::path::{Path, PathBuf};

use curl::easy::Form;
use curl::FormError;

/// One field of a multipart form, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// A file upload field: `name` is the form field name, `path` the
    /// local file read at submission time.
    File { name: String, path: PathBuf },
    /// A plain text field.
    Content { name: String, value: String },
}

/// Ordered multipart form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    parts: Vec<FormPart>,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file upload field.
    pub fn add_form_file(&mut self, name: &str, path: impl AsRef<Path>) {
        self.parts.push(FormPart::File {
            name: name.to_string(),
            path: path.as_ref().to_path_buf(),
        });
    }

    /// Append a plain text field.
    pub fn add_form_content(&mut self, name: &str, value: &str) {
        self.parts.push(FormPart::Content {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Serialize into the engine's multipart representation.
    ///
    /// `None` for an empty form, which the client sends as a plain POST.
    pub(crate) fn to_curl_form(&self) -> Result<Option<Form>, FormError> {
        if self.parts.is_empty() {
            return Ok(None);
        }
        let mut form = Form::new();
        for part in &self.parts {
            match part {
                FormPart::File { name, path } => form.part(name).file(path.as_path()).add()?,
                FormPart::Content { name, value } => {
                    form.part(name).contents(value.as_bytes()).add()?
                }
            }
        }
        Ok(Some(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_keep_submission_order() {
        let mut form = PostForm::new();
        form.add_form_file("submitted", "/tmp/upload.txt");
        form.add_form_content("description", "a text field");

        assert_eq!(
            form.parts(),
            &[
                FormPart::File {
                    name: "submitted".to_string(),
                    path: PathBuf::from("/tmp/upload.txt"),
                },
                FormPart::Content {
                    name: "description".to_string(),
                    value: "a text field".to_string(),
                },
            ]
        );
    }

    #[test]
    fn empty_form_serializes_to_none() {
        let form = PostForm::new();
        assert!(form.is_empty());
        assert!(form.to_curl_form().unwrap().is_none());
    }

    #[test]
    fn populated_form_serializes() {
        let mut form = PostForm::new();
        form.add_form_content("alpha", "one");
        form.add_form_content("beta", "two");
        assert!(form.to_curl_form().unwrap().is_some());
    }
}
