use crate::core::{ApiProductEntry, MasterProduct, ReconciledProduct};
use std::collections::HashMap;

/// Aligns one store's API entries with the master list: one row per master
/// product, in master order. Products the API did not mention get stock 0.
pub fn reconcile(master: &[MasterProduct], entries: &[ApiProductEntry]) -> Vec<ReconciledProduct> {
    // 重複的商品代碼以最後一筆為準
    let lookup: HashMap<&str, &ApiProductEntry> = entries
        .iter()
        .map(|entry| (entry.code.as_str(), entry))
        .collect();

    master
        .iter()
        .map(|product| match lookup.get(product.code.as_str()) {
            Some(entry) => ReconciledProduct {
                code: product.code.clone(),
                name: entry.name.clone().unwrap_or_else(|| product.name.clone()),
                stock: entry.stock,
            },
            None => ReconciledProduct {
                code: product.code.clone(),
                name: product.name.clone(),
                stock: 0,
            },
        })
        .collect()
}
