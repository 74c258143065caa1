use crate::core::{MasterProduct, Storage, StoreRecord};
use crate::utils::error::{EtlError, Result};

/// Reads `code,name` list files (one header line) through a [`Storage`].
pub struct ListLoader<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> ListLoader<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Non-empty, trimmed lines in file order. The header is still included.
    pub async fn read_lines(&self, path: &str) -> Result<Vec<String>> {
        let bytes = self.storage.read_file(path).await.map_err(|e| {
            tracing::error!("❌ Error reading file {}: {}", path, e);
            EtlError::SourceUnavailable {
                path: path.to_string(),
                source: into_io_error(e),
            }
        })?;

        let text = String::from_utf8_lossy(&bytes);
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn load_stores(&self, path: &str) -> Result<Vec<StoreRecord>> {
        let lines = self.read_lines(path).await?;
        let stores: Vec<StoreRecord> = parse_code_name_lines(skip_header(&lines))?
            .into_iter()
            .filter(|(code, name)| !code.is_empty() && !name.is_empty())
            .map(|(code, name)| StoreRecord { code, name })
            .collect();

        tracing::debug!("Parsed {} stores from {}", stores.len(), path);
        Ok(stores)
    }

    pub async fn load_products(&self, path: &str) -> Result<Vec<MasterProduct>> {
        let lines = self.read_lines(path).await?;
        let products: Vec<MasterProduct> = parse_code_name_lines(skip_header(&lines))?
            .into_iter()
            .filter(|(code, _)| !code.is_empty())
            .map(|(code, name)| MasterProduct { code, name })
            .collect();

        tracing::debug!("Parsed {} master products from {}", products.len(), path);
        Ok(products)
    }
}

fn skip_header(lines: &[String]) -> &[String] {
    lines.get(1..).unwrap_or(&[])
}

/// Splits every line on its first comma. Quotes are left untouched; the name
/// keeps any further commas. Only `\n` ends a record, a stray `\r` stays in
/// the field.
pub fn parse_code_name_lines(lines: &[String]) -> Result<Vec<(String, String)>> {
    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(joined.as_bytes());

    let mut pairs = Vec::with_capacity(lines.len());
    for record in reader.records() {
        let record = record?;
        let code = record.get(0).unwrap_or_default().to_string();
        let name = record.iter().skip(1).collect::<Vec<_>>().join(",");
        pairs.push((code, name));
    }
    Ok(pairs)
}

fn into_io_error(err: EtlError) -> std::io::Error {
    match err {
        EtlError::IoError(io) => io,
        other => std::io::Error::other(other.to_string()),
    }
}
