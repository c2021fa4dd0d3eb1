use axum::extract::Multipart;
use service_core::error::AppError;
use std::collections::HashMap;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];
const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// An image file taken from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// Lower-cased file extension, `bin` when the name has none.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Both the extension and the declared MIME type must name JPEG or PNG.
    pub fn ensure_image(&self) -> Result<(), AppError> {
        let extension_ok = ALLOWED_EXTENSIONS.contains(&self.extension().as_str());
        let mime_ok = ALLOWED_MIME_TYPES.contains(&self.content_type.to_lowercase().as_str());

        if extension_ok && mime_ok {
            Ok(())
        } else {
            Err(AppError::bad_request("Images only (JPEG, JPG, PNG)"))
        }
    }
}

/// Text fields plus the optional `image` part of a fruit form.
#[derive(Debug, Default)]
pub struct FruitForm {
    fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl FruitForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FruitForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
                })?;

                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read field {}: {}", name, e))
                })?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    #[cfg(test)]
    pub(crate) fn with_fields(pairs: &[(&str, &str)]) -> Self {
        FruitForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: None,
        }
    }
}
