//! Slide Store
//!
//! Holds the active [`ContentGeneration`]: the ordered slides the surface is
//! showing, the key → ordinal map the host navigates by, and the footer
//! captions derived from them.
//!
//! A new generation is *prepared* here, handed to the transition controller
//! for the visual swap and only then *committed*. Until the commit the old
//! key map stays authoritative.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::resource::ResourceRef;

/// Identifier of one content generation; strictly increasing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(u64);

impl GenerationId {
    /// Raw value
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// What a generation was built from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationKind {
    /// Keyed text slides
    Text,
    /// One anonymous text slide, editable in place
    SingleText,
    /// Image slides
    Images,
    /// One video slide
    Video,
}

/// Body of a slide
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SlideContent {
    /// Formatted text
    Text {
        /// The text
        text: String,
    },
    /// Still image
    Image {
        /// Normalized location
        src: String,
    },
    /// Video
    Video {
        /// Normalized location
        src: String,
    },
}

/// One unit of content in a generation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Key the host navigates by
    pub key: String,
    /// Body
    pub content: SlideContent,
    /// Caption shown in the footer while this slide is current
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_caption: Option<String>,
    /// Position in the generation
    pub ordinal: usize,
}

/// Text slide as sent by the host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSlideInput {
    /// Slide key (verse tag); the ordinal is used when absent
    #[serde(default, alias = "verse")]
    pub key: Option<String>,
    /// Slide text
    pub text: String,
    /// Footer caption
    #[serde(default)]
    pub footer: Option<String>,
}

impl TextSlideInput {
    /// Anonymous slide with `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            key: None,
            text: text.into(),
            footer: None,
        }
    }

    /// Keyed slide with `text`
    pub fn keyed(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            text: text.into(),
            footer: None,
        }
    }

    /// Attach a footer caption
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Image slide as sent by the host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSlideInput {
    /// Slide key; the ordinal is used when absent
    #[serde(default)]
    pub key: Option<String>,
    /// Image location
    pub path: ResourceRef,
    /// Footer caption
    #[serde(default)]
    pub footer: Option<String>,
}

/// `goToSlide` argument: a key, or a position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideTarget {
    /// Slide key (or a numeric string)
    Key(String),
    /// Slide position
    Ordinal(usize),
}

impl From<&str> for SlideTarget {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for SlideTarget {
    fn from(ordinal: usize) -> Self {
        Self::Ordinal(ordinal)
    }
}

/// Footer caption entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterCaption {
    /// Key of the slide the caption belongs to
    pub key: String,
    /// Caption text
    pub text: String,
    /// Whether its slide is the current one
    pub active: bool,
}

/// Immutable batch of slides sharing one transition
#[derive(Clone, Debug, PartialEq)]
pub struct ContentGeneration {
    id: GenerationId,
    kind: GenerationKind,
    slides: Vec<Slide>,
    keys: HashMap<String, usize>,
}

impl ContentGeneration {
    fn new(id: GenerationId, kind: GenerationKind, slides: Vec<Slide>) -> Self {
        let mut keys = HashMap::with_capacity(slides.len());
        for slide in &slides {
            if keys.contains_key(&slide.key) {
                tracing::warn!(
                    generation = %id,
                    key = %slide.key,
                    ordinal = slide.ordinal,
                    "Duplicate slide key; only the first is addressable by key"
                );
                continue;
            }
            keys.insert(slide.key.clone(), slide.ordinal);
        }
        Self {
            id,
            kind,
            slides,
            keys,
        }
    }

    /// Generation identifier
    #[must_use]
    pub fn id(&self) -> GenerationId {
        self.id
    }

    /// What the generation was built from
    #[must_use]
    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    /// Slides in presentation order
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of slides
    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the generation has no slides
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Resolve a target: key first, then ordinal
    #[must_use]
    pub fn resolve(&self, target: &SlideTarget) -> Option<usize> {
        let (key, ordinal) = match target {
            SlideTarget::Key(key) => (key.clone(), key.trim().parse::<usize>().ok()),
            SlideTarget::Ordinal(n) => (n.to_string(), Some(*n)),
        };
        self.keys
            .get(&key)
            .copied()
            .or_else(|| ordinal.filter(|n| *n < self.slides.len()))
    }

    /// Footer captions with the slide at `current` marked active
    #[must_use]
    pub fn captions(&self, current: usize) -> Vec<FooterCaption> {
        self.slides
            .iter()
            .filter_map(|slide| {
                slide.footer_caption.as_ref().map(|text| FooterCaption {
                    key: slide.key.clone(),
                    text: text.clone(),
                    active: slide.ordinal == current,
                })
            })
            .collect()
    }
}

/// Owner of the active generation and its navigation state
#[derive(Debug, Default)]
pub struct SlideStore {
    active: Option<ContentGeneration>,
    current: usize,
    next_id: u64,
}

impl SlideStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> GenerationId {
        let id = GenerationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Build a text generation; unkeyed slides are keyed by their ordinal
    pub fn prepare_text(&mut self, inputs: &[TextSlideInput]) -> ContentGeneration {
        let slides = inputs
            .iter()
            .enumerate()
            .map(|(ordinal, input)| Slide {
                key: input
                    .key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .unwrap_or_else(|| ordinal.to_string()),
                content: SlideContent::Text {
                    text: input.text.clone(),
                },
                footer_caption: input.footer.clone(),
                ordinal,
            })
            .collect();
        let id = self.allocate();
        ContentGeneration::new(id, GenerationKind::Text, slides)
    }

    /// Build a single anonymous text slide generation
    pub fn prepare_single_text(&mut self, text: &str) -> ContentGeneration {
        let slide = Slide {
            key: "0".to_string(),
            content: SlideContent::Text {
                text: text.to_string(),
            },
            footer_caption: None,
            ordinal: 0,
        };
        let id = self.allocate();
        ContentGeneration::new(id, GenerationKind::SingleText, vec![slide])
    }

    /// Build an image generation, normalizing every reference onto `scheme`
    pub fn prepare_images(&mut self, inputs: &[ImageSlideInput], scheme: &str) -> ContentGeneration {
        let slides = inputs
            .iter()
            .enumerate()
            .map(|(ordinal, input)| Slide {
                key: input
                    .key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .unwrap_or_else(|| ordinal.to_string()),
                content: SlideContent::Image {
                    src: input.path.normalized(scheme).as_str().to_string(),
                },
                footer_caption: input.footer.clone(),
                ordinal,
            })
            .collect();
        let id = self.allocate();
        ContentGeneration::new(id, GenerationKind::Images, slides)
    }

    /// Build a one-slide video generation
    pub fn prepare_video(&mut self, path: &ResourceRef, scheme: &str) -> ContentGeneration {
        let slide = Slide {
            key: "0".to_string(),
            content: SlideContent::Video {
                src: path.normalized(scheme).as_str().to_string(),
            },
            footer_caption: None,
            ordinal: 0,
        };
        let id = self.allocate();
        ContentGeneration::new(id, GenerationKind::Video, vec![slide])
    }

    /// Make `generation` authoritative, positioned on its first slide
    pub fn commit(&mut self, generation: ContentGeneration) {
        tracing::debug!(
            generation = %generation.id(),
            kind = ?generation.kind(),
            slides = generation.len(),
            "Generation committed"
        );
        self.active = Some(generation);
        self.current = 0;
    }

    /// Replace the text of an active single-text generation in place
    ///
    /// Returns the generation and slide key that changed, or `None` when the
    /// active generation was not built by [`SlideStore::prepare_single_text`].
    /// A one-slide generation from [`SlideStore::prepare_text`] does not
    /// qualify, even without a key: it may carry a footer caption that an
    /// in-place edit would leave stale.
    pub fn set_single_text(&mut self, text: &str) -> Option<(GenerationId, String)> {
        let generation = self
            .active
            .as_mut()
            .filter(|g| g.kind == GenerationKind::SingleText)?;
        let slide = generation.slides.first_mut()?;
        slide.content = SlideContent::Text {
            text: text.to_string(),
        };
        Some((generation.id, slide.key.clone()))
    }

    /// Move to a slide of the active generation; `None` if it does not resolve
    pub fn go_to(&mut self, target: &SlideTarget) -> Option<usize> {
        let ordinal = self.active.as_ref()?.resolve(target)?;
        self.current = ordinal;
        Some(ordinal)
    }

    /// Drop the active generation
    pub fn clear(&mut self) {
        self.active = None;
        self.current = 0;
    }

    /// Active generation
    #[must_use]
    pub fn active(&self) -> Option<&ContentGeneration> {
        self.active.as_ref()
    }

    /// Ordinal of the current slide
    #[must_use]
    pub fn current_ordinal(&self) -> Option<usize> {
        self.active.as_ref().map(|_| self.current)
    }

    /// Key of the current slide
    #[must_use]
    pub fn current_key(&self) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|g| g.slides.get(self.current))
            .map(|slide| slide.key.as_str())
    }

    /// Number of slides in the active generation
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.as_ref().map_or(0, ContentGeneration::len)
    }

    /// Whether no slide is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Footer captions of the active generation
    #[must_use]
    pub fn captions(&self) -> Vec<FooterCaption> {
        self.active
            .as_ref()
            .map(|g| g.captions(self.current))
            .unwrap_or_default()
    }
}
