//! 宛先イメージの重複検出
//!
//! 1回の実行内で同じ宛先イメージを2つ以上のサービスが宣言している場合、
//! どのタスクも実行する前に実行全体を中断します。

use crate::error::{ComposeError, DuplicateImage, Result};
use crate::log::LogHandle;
use crate::model::ImageClaim;
use std::collections::HashMap;

/// 重複しているイメージを初出順に列挙する
pub fn find_duplicates(claims: &[ImageClaim]) -> Vec<DuplicateImage> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counted: Vec<DuplicateImage> = Vec::new();

    for claim in claims {
        match index.get(claim.image.as_str()) {
            Some(&i) => {
                counted[i].count += 1;
                counted[i].services.push(claim.service.clone());
            }
            None => {
                index.insert(claim.image.as_str(), counted.len());
                counted.push(DuplicateImage {
                    image: claim.image.clone(),
                    count: 1,
                    services: vec![claim.service.clone()],
                });
            }
        }
    }

    counted.into_iter().filter(|d| d.count > 1).collect()
}

/// 宛先イメージが全て異なることを検証する
pub fn validate_destinations(claims: &[ImageClaim], log: &LogHandle) -> Result<()> {
    let duplicates = find_duplicates(claims);
    if duplicates.is_empty() {
        return Ok(());
    }

    for duplicate in &duplicates {
        log.run_error(format!(
            "Error: Image name {} is used {} times ({}).",
            duplicate.image,
            duplicate.count,
            duplicate.services.join(", ")
        ));
    }
    Err(ComposeError::DuplicateImages(duplicates))
}
