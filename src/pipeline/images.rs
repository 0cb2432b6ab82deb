//! Page-image resolution for the bank-disambiguation fallback.
//!
//! The parsing service's JSON result doubles as a manifest of the images it
//! cropped out of each page. Only a handful of them can plausibly show a bank
//! logo (headers of the first pages), so candidate selection deduplicates the
//! names in manifest order and caps the list — every extra image is another
//! vision-model call.

use crate::error::ExtratoError;
use crate::pipeline::parse::{JobId, ParseService};
use serde::Deserialize;

/// The page/image manifest returned by the parsing service's JSON result.
///
/// Jobs that produced no images legitimately return empty `pages`/`images`
/// arrays (or omit them); `#[serde(default)]` keeps that from being an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageManifest {
    #[serde(default)]
    pub pages: Vec<ManifestPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestPage {
    #[serde(default)]
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestImage {
    pub name: String,
}

/// Deduplicate image names in manifest order, keeping at most `cap`.
pub fn select_image_names(manifest: &PageManifest, cap: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for page in &manifest.pages {
        for image in &page.images {
            if names.len() >= cap {
                return names;
            }
            if !names.contains(&image.name) {
                names.push(image.name.clone());
            }
        }
    }
    names
}

/// Fetch the job's manifest and pick the candidate image names.
///
/// An empty result is not an error — it means the fallback has nothing to
/// vote on and the statement keeps its text-derived bank candidate.
pub async fn candidate_image_names<P>(
    service: &P,
    job: &JobId,
    cap: usize,
) -> Result<Vec<String>, ExtratoError>
where
    P: ParseService + ?Sized,
{
    let manifest = service.page_manifest(job).await?;
    Ok(select_image_names(&manifest, cap))
}

/// MIME type for a manifest image name, from its extension.
pub fn mime_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(pages: &[&[&str]]) -> PageManifest {
        PageManifest {
            pages: pages
                .iter()
                .map(|images| ManifestPage {
                    images: images
                        .iter()
                        .map(|name| ManifestImage {
                            name: name.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn selection_dedups_and_caps() {
        let m = manifest(&[
            &["logo.png", "header.png", "logo.png"],
            &["logo.png", "footer.png", "stamp.png"],
        ]);
        assert_eq!(
            select_image_names(&m, 3),
            vec!["logo.png", "header.png", "footer.png"]
        );
    }

    #[test]
    fn selection_preserves_manifest_order() {
        let m = manifest(&[&["b.png"], &["a.png"]]);
        assert_eq!(select_image_names(&m, 3), vec!["b.png", "a.png"]);
    }

    #[test]
    fn empty_manifest_yields_no_candidates() {
        assert!(select_image_names(&PageManifest::default(), 3).is_empty());
    }

    #[test]
    fn manifest_tolerates_missing_image_arrays() {
        let m: PageManifest =
            serde_json::from_str(r#"{"pages": [{}, {"images": [{"name": "x.png"}]}]}"#).unwrap();
        assert_eq!(select_image_names(&m, 3), vec!["x.png"]);
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("page_1.png"), "image/png");
        assert_eq!(mime_for("logo.JPG"), "image/jpeg");
        assert_eq!(mime_for("crop.jpeg"), "image/jpeg");
        // Unknown extensions default to PNG, the service's usual output.
        assert_eq!(mime_for("weird.bin"), "image/png");
    }
}
