//! Public types: search results, processed entries, analysis results, and run options.

use crossbeam_channel::Receiver;
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::engine::overlay::Overlay;
use crate::utils::locks::{lock, read, write};
use crate::utils::watchers::Watchers;

/// A decoded, displayable bitmap. Shared, never mutated after decode.
pub type DecodedImage = Arc<image::DynamicImage>;

/// One search hit as returned by the search collaborator. Immutable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResultItem {
    /// Full-resolution image URL. Also the key for analysis requests.
    pub media_url: String,
    pub thumbnail_url: String,
    pub title: String,
    /// Page the image was found on.
    pub source_url: String,
    /// Source pixel width, when the index reports it.
    pub width: Option<u32>,
    /// Source pixel height, when the index reports it.
    pub height: Option<u32>,
}

/// Content-analysis report for one image.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub request_id: Option<String>,
    pub metadata: Option<ImageMetadata>,
    pub adult: Option<Adult>,
    pub color: Option<ColorInfo>,
    pub categories: Vec<Category>,
    pub faces: Vec<Face>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Adult {
    pub is_adult_content: bool,
    pub is_racy_content: bool,
    pub adult_score: f64,
    pub racy_score: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorInfo {
    pub dominant_color_foreground: String,
    pub dominant_color_background: String,
    pub dominant_colors: Vec<String>,
    pub accent_color: String,
    #[serde(rename = "isBWImg")]
    pub is_bw_img: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub name: String,
    pub score: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Face {
    pub age: u32,
    /// "Male", "Female", or whatever the service reports.
    pub gender: String,
    pub face_rectangle: FaceRectangle,
}

/// Face bounds in source-image pixels.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FaceRectangle {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl AnalysisResult {
    /// Text report shown next to the selected image.
    pub fn report(&self, media_url: &str) -> String {
        let mut out = format!("Media URL : {media_url}\n\n");
        if let Some(adult) = &self.adult {
            out.push_str(&format!(
                "Adult : {} (score = {})\n",
                adult.is_adult_content, adult.adult_score
            ));
            out.push_str(&format!(
                "Racy : {} (score = {})\n",
                adult.is_racy_content, adult.racy_score
            ));
        }
        let categories = if self.categories.is_empty() {
            "None".to_string()
        } else {
            self.categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.push_str(&format!("Categories : {categories}\n"));
        if let Some(color) = &self.color {
            out.push_str(&format!(
                "DominantColors : {}\n",
                color.dominant_colors.join(", ")
            ));
            out.push_str(&format!(
                "DominantColorForeground : {}\n",
                color.dominant_color_foreground
            ));
            out.push_str(&format!(
                "DominantColorBackground : {}\n",
                color.dominant_color_background
            ));
            out.push_str(&format!("AccentColor : {}\n", color.accent_color));
        }
        if let Some(meta) = &self.metadata {
            out.push_str(&format!(
                "MetaData : [{}:({}×{})]\n",
                meta.format, meta.width, meta.height
            ));
        }
        out
    }
}

/// Size of the area the full image is displayed in. Used to scale the face overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension cannot hold a drawing.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Entry field that changed; delivered to [`Entry::subscribe`] receivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryField {
    FullImage,
    Analysis,
    Overlay,
}

/// Mutable detail fields of an [`Entry`], filled in by the detail pipeline.
#[derive(Clone, Debug, Default)]
pub struct EntryDetail {
    pub full_image: Option<DecodedImage>,
    pub analysis: Option<Arc<AnalysisResult>>,
    pub overlay: Option<Arc<Overlay>>,
}

/// One processed search result. Only ever built once its thumbnail decoded successfully.
pub struct Entry {
    item: SearchResultItem,
    thumbnail: DecodedImage,
    detail: RwLock<EntryDetail>,
    /// Serializes detail pipeline invocations targeting this entry.
    detail_gate: Mutex<()>,
    watchers: Watchers<EntryField>,
}

impl Entry {
    pub fn new(item: SearchResultItem, thumbnail: DecodedImage) -> Self {
        Self {
            item,
            thumbnail,
            detail: RwLock::new(EntryDetail::default()),
            detail_gate: Mutex::new(()),
            watchers: Watchers::default(),
        }
    }

    pub fn item(&self) -> &SearchResultItem {
        &self.item
    }

    pub fn thumbnail(&self) -> &DecodedImage {
        &self.thumbnail
    }

    pub fn full_image(&self) -> Option<DecodedImage> {
        read(&self.detail).full_image.clone()
    }

    pub fn analysis(&self) -> Option<Arc<AnalysisResult>> {
        read(&self.detail).analysis.clone()
    }

    pub fn overlay(&self) -> Option<Arc<Overlay>> {
        read(&self.detail).overlay.clone()
    }

    /// Snapshot of all detail fields, taken under one lock.
    pub fn detail(&self) -> EntryDetail {
        read(&self.detail).clone()
    }

    /// Both the full image and the analysis are present.
    pub fn is_detailed(&self) -> bool {
        let d = read(&self.detail);
        d.full_image.is_some() && d.analysis.is_some()
    }

    /// Receive a notification each time a detail field changes.
    pub fn subscribe(&self) -> Receiver<EntryField> {
        self.watchers.subscribe()
    }

    pub(crate) fn detail_gate(&self) -> MutexGuard<'_, ()> {
        lock(&self.detail_gate)
    }

    pub(crate) fn set_full_image(&self, image: DecodedImage) {
        write(&self.detail).full_image = Some(image);
        self.watchers.notify(EntryField::FullImage);
    }

    pub(crate) fn set_analysis(&self, analysis: AnalysisResult) {
        write(&self.detail).analysis = Some(Arc::new(analysis));
        self.watchers.notify(EntryField::Analysis);
    }

    pub(crate) fn set_overlay(&self, overlay: Overlay) {
        write(&self.detail).overlay = Some(Arc::new(overlay));
        self.watchers.notify(EntryField::Overlay);
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = read(&self.detail);
        f.debug_struct("Entry")
            .field("item", &self.item)
            .field("full_image", &d.full_image.is_some())
            .field("analysis", &d.analysis.is_some())
            .field("overlay", &d.overlay.is_some())
            .finish()
    }
}

/// Options for search runs.
#[derive(Clone, Debug, Default)]
pub struct RunOpts {
    /// Cap on concurrent thumbnail workers. `None` dispatches every item of the page at once.
    pub max_concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_without_analysis_parts() {
        let r = AnalysisResult::default();
        let text = r.report("http://x/a.jpg");
        assert!(text.starts_with("Media URL : http://x/a.jpg"));
        assert!(text.contains("Categories : None"));
        assert!(!text.contains("Adult"));
    }

    #[test]
    fn test_report_lists_scores_and_colors() {
        let r = AnalysisResult {
            adult: Some(Adult {
                is_adult_content: false,
                is_racy_content: true,
                adult_score: 0.25,
                racy_score: 0.75,
            }),
            color: Some(ColorInfo {
                dominant_colors: vec!["Black".into(), "White".into()],
                accent_color: "19A4B2".into(),
                ..Default::default()
            }),
            categories: vec![Category {
                name: "animal_cat".into(),
                score: 0.9,
            }],
            metadata: Some(ImageMetadata {
                width: 640,
                height: 480,
                format: "Jpeg".into(),
            }),
            ..Default::default()
        };
        let text = r.report("u");
        assert!(text.contains("Adult : false (score = 0.25)"));
        assert!(text.contains("Racy : true (score = 0.75)"));
        assert!(text.contains("Categories : animal_cat"));
        assert!(text.contains("DominantColors : Black, White"));
        assert!(text.contains("AccentColor : 19A4B2"));
        assert!(text.contains("MetaData : [Jpeg:(640×480)]"));
    }

    #[test]
    fn test_analysis_result_deserializes_camel_case() {
        let json = r#"{
            "requestId": "abc",
            "faces": [{"age": 31, "gender": "Female",
                       "faceRectangle": {"left": 10, "top": 20, "width": 30, "height": 40}}],
            "color": {"dominantColors": ["Red"], "isBWImg": true}
        }"#;
        let r: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.request_id.as_deref(), Some("abc"));
        assert_eq!(r.faces[0].face_rectangle.top, 20);
        assert!(r.color.unwrap().is_bw_img);
        assert!(r.categories.is_empty());
    }

    #[test]
    fn test_display_size_degenerate() {
        assert!(DisplaySize::new(0.0, 10.0).is_degenerate());
        assert!(DisplaySize::new(10.0, -1.0).is_degenerate());
        assert!(!DisplaySize::new(1.0, 1.0).is_degenerate());
    }
}
