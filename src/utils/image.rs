use crate::utils::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// 讀取影像並編碼為生成請求 `images` 欄位所需的 base64
pub async fn encode_image_to_base64(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(STANDARD.encode(bytes))
}

/// multipart 上傳時附帶的檔名，無法取得時使用通用名稱
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "image.png".to_string())
}
