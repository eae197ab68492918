use serde::{Deserialize, Serialize};

/// Logical page of the funnel. Drives both content keys and analyzer paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageRole {
    Home,
    #[serde(alias = "thankyou-upsell")]
    Thankyou,
}

impl PageRole {
    pub const ALL: [PageRole; 2] = [PageRole::Home, PageRole::Thankyou];

    pub fn key_prefix(self) -> &'static str {
        match self {
            PageRole::Home => "home",
            PageRole::Thankyou => "thankyou",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            PageRole::Home => "/",
            PageRole::Thankyou => "/thankyou",
        }
    }
}

impl std::str::FromStr for PageRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "/" => Ok(Self::Home),
            "thankyou" | "thankyou-upsell" | "upsell" | "/thankyou" => Ok(Self::Thankyou),
            other => Err(anyhow::anyhow!("unknown page `{}` (expected home, thankyou)", other)),
        }
    }
}

/// What the rendering layer needs to draw a funnel page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContent {
    pub video_url: Option<String>,
    pub banner_url: Option<String>,
    pub headline: String,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Scarcity,
    Hero,
    Video,
    Cta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    Purple,
    Blue,
    Green,
}

/// One classified block of an analyzed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VslElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub text: String,
    pub sub_text: Option<String>,
    pub value: Option<f64>,
    pub order: u32,
    pub color_tag: ColorTag,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub elements: Vec<VslElement>,
    pub ticket_average: f64,
    pub total_offers: usize,
}

impl AnalysisResult {
    /// The "no data" shape returned whenever analysis cannot complete.
    pub fn empty() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.elements.is_empty() }
}

/// Admin view of one page's configured media, without the emergency fallback.
///
/// `video_key`/`banner_key` name the slot's own regional key; the `*_source_key`
/// fields name the row that actually answered, which differs when the slot is
/// served by a global or borrowed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSlot {
    pub role: PageRole,
    pub video_key: String,
    pub video_url: Option<String>,
    pub video_source_key: Option<String>,
    pub banner_key: String,
    pub banner_url: Option<String>,
    pub banner_source_key: Option<String>,
}

impl MediaSlot {
    /// True when the slot's own regional video key is what serves it.
    pub fn video_configured(&self) -> bool {
        self.video_source_key.as_deref() == Some(self.video_key.as_str())
    }
}
