use crate::core::Storage;
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 讀取 JSON 陣列檔案
pub async fn read_json_array<S: Storage, T: DeserializeOwned>(
    storage: &S,
    name: &str,
) -> Result<Vec<T>> {
    let bytes = storage.read_file(name).await?;
    let items = serde_json::from_slice(&bytes)?;
    Ok(items)
}

/// 以兩格縮排、不跳脫非 ASCII 字元的格式寫出
pub async fn write_json_array<S: Storage, T: Serialize>(
    storage: &S,
    name: &str,
    items: &[T],
) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    storage.write_file(name, json.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use tempfile::TempDir;

    #[test]
    fn test_written_json_is_pretty_and_unescaped() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        tokio_test::block_on(async {
            let urls = vec!["https://www.sumyca.com/listings/台東".to_string()];
            write_json_array(&storage, "final_urls.json", &urls).await.unwrap();

            let text = std::fs::read_to_string(temp_dir.path().join("final_urls.json")).unwrap();
            assert_eq!(text, "[\n  \"https://www.sumyca.com/listings/台東\"\n]");

            let back: Vec<String> = read_json_array(&storage, "final_urls.json").await.unwrap();
            assert_eq!(back, urls);
        });
    }

    #[test]
    fn test_non_array_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("final.json"), "{\"id\": 1}").unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        let result: Result<Vec<serde_json::Value>> =
            tokio_test::block_on(read_json_array(&storage, "final.json"));
        assert!(matches!(
            result,
            Err(crate::utils::error::EtlError::SerializationError(_))
        ));
    }
}
