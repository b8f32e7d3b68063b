// handlers/properties/form.rs - multipart body reader for create/update

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::models::{FileUpload, FormFields, PropertyFields};

/// Repeated file field carrying listing images
pub const IMAGES_FIELD: &str = "images";

/// A decoded create/update submission
#[derive(Debug, Default)]
pub struct SubmittedForm {
    pub fields: FormFields,
    pub images: Vec<FileUpload>,
}

impl SubmittedForm {
    /// Split the submission into typed property fields and image parts
    pub fn into_parts(self) -> Result<(PropertyFields, Vec<FileUpload>), ApiError> {
        let fields = PropertyFields::from_form(&self.fields)
            .map_err(|errors| ApiError::validation_error("Invalid field values", Some(errors)))?;
        Ok((fields, self.images))
    }
}

/// Read every part of a multipart body. File parts named `images` become
/// uploads (including unset inputs with an empty file name, which the
/// pipeline skips); everything else is kept as a text field.
pub async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> Result<SubmittedForm, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGES_FIELD {
            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.images.push(FileUpload {
                    name: file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }
        }

        let value = field.text().await.map_err(multipart_error)?;
        form.fields.push(name, value);
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body is too large")
    } else {
        ApiError::bad_request(err.body_text())
    }
}
