//! Accessibility preferences for the dashboard shell.
//!
//! One [`PreferenceStore`] is shared per session. Each setter updates the
//! shared record and immediately mirrors the change onto the document root;
//! observers follow along through a `watch` receiver. Consumers reach the
//! store through a [`PreferenceScope`], which refuses access when no provider
//! installed a store.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::cache::lock::mutex_lock;

const SOURCE: &str = "presentation::preferences";

pub const DEFAULT_FONT_SCALE: u16 = 100;
pub const MIN_FONT_SCALE: u16 = 50;
pub const MAX_FONT_SCALE: u16 = 200;

pub const FONT_SIZE_PROPERTY: &str = "font-size";
pub const HIGH_CONTRAST_CLASS: &str = "high-contrast";
pub const LETTER_SPACING_CLASS: &str = "letter-spacing";
pub const COLOR_VISION_ATTRIBUTE: &str = "data-color-vision";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("accessibility preferences must be used within a preference provider")]
    OutsideProvider,
    #[error("unknown color vision mode `{0}`")]
    UnknownColorVisionMode(String),
}

/// Color-vision deficiency simulated by the dashboard's filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorVisionMode {
    #[default]
    None,
    Protanopia,
    Deuteranopia,
    Tritanopia,
    Achromatopsia,
}

impl ColorVisionMode {
    pub const ALL: [ColorVisionMode; 5] = [
        ColorVisionMode::None,
        ColorVisionMode::Protanopia,
        ColorVisionMode::Deuteranopia,
        ColorVisionMode::Tritanopia,
        ColorVisionMode::Achromatopsia,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Protanopia => "protanopia",
            Self::Deuteranopia => "deuteranopia",
            Self::Tritanopia => "tritanopia",
            Self::Achromatopsia => "achromatopsia",
        }
    }
}

impl fmt::Display for ColorVisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorVisionMode {
    type Err = PreferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| PreferenceError::UnknownColorVisionMode(value.to_string()))
    }
}

/// The shared preference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Root font size as a percentage.
    pub font_scale: u16,
    pub high_contrast: bool,
    pub color_vision_mode: ColorVisionMode,
    pub letter_spacing: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_scale: DEFAULT_FONT_SCALE,
            high_contrast: false,
            color_vision_mode: ColorVisionMode::None,
            letter_spacing: false,
        }
    }
}

/// Presentation target the preferences are mirrored onto.
pub trait DocumentRoot: Send + Sync {
    fn set_style_property(&self, name: &str, value: &str);
    fn toggle_class(&self, class: &str, enabled: bool);
    /// Set an attribute, or remove it when `value` is `None`.
    fn set_attribute(&self, name: &str, value: Option<&str>);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RootState {
    styles: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
}

/// In-memory document root.
///
/// Used when rendering the initial `<html>` element on the server, where no
/// live DOM exists yet.
#[derive(Debug, Default)]
pub struct VirtualRoot {
    state: Mutex<RootState>,
}

impl VirtualRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.read(|state| state.styles.get(name).cloned())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.read(|state| state.classes.contains(class))
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.read(|state| state.attributes.get(name).cloned())
    }

    /// Attributes for the root element, e.g.
    /// `class="high-contrast" style="font-size: 120%" data-color-vision="tritanopia"`.
    pub fn render_attributes(&self) -> String {
        self.read(|state| {
            let mut parts = Vec::new();
            if !state.classes.is_empty() {
                let classes: Vec<&str> = state.classes.iter().map(String::as_str).collect();
                parts.push(format!("class=\"{}\"", classes.join(" ")));
            }
            if !state.styles.is_empty() {
                let styles: Vec<String> = state
                    .styles
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect();
                parts.push(format!("style=\"{}\"", styles.join("; ")));
            }
            for (name, value) in &state.attributes {
                parts.push(format!("{name}=\"{value}\""));
            }
            parts.join(" ")
        })
    }

    fn read<T>(&self, f: impl FnOnce(&RootState) -> T) -> T {
        let guard = mutex_lock(&self.state, SOURCE, "root.read");
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut RootState)) {
        let mut guard = mutex_lock(&self.state, SOURCE, "root.write");
        f(&mut guard);
    }
}

impl DocumentRoot for VirtualRoot {
    fn set_style_property(&self, name: &str, value: &str) {
        self.write(|state| {
            state.styles.insert(name.to_string(), value.to_string());
        });
    }

    fn toggle_class(&self, class: &str, enabled: bool) {
        self.write(|state| {
            if enabled {
                state.classes.insert(class.to_string());
            } else {
                state.classes.remove(class);
            }
        });
    }

    fn set_attribute(&self, name: &str, value: Option<&str>) {
        self.write(|state| match value {
            Some(value) => {
                state.attributes.insert(name.to_string(), value.to_string());
            }
            None => {
                state.attributes.remove(name);
            }
        });
    }
}

/// Shared, observable accessibility preferences.
pub struct PreferenceStore {
    root: Arc<dyn DocumentRoot>,
    state: watch::Sender<Preferences>,
    /// Held across commit and mirroring so the root sees changes in order.
    updating: Mutex<()>,
}

impl PreferenceStore {
    /// Create a store with default preferences and mirror them onto `root`.
    pub fn new(root: Arc<dyn DocumentRoot>) -> Self {
        let initial = Preferences::default();
        let (state, _) = watch::channel(initial);
        let store = Self {
            root,
            state,
            updating: Mutex::new(()),
        };
        store.apply_all(&initial);
        store
    }

    pub fn snapshot(&self) -> Preferences {
        *self.state.borrow()
    }

    /// Observe every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.state.subscribe()
    }

    pub fn font_scale(&self) -> u16 {
        self.state.borrow().font_scale
    }

    pub fn high_contrast(&self) -> bool {
        self.state.borrow().high_contrast
    }

    pub fn color_vision_mode(&self) -> ColorVisionMode {
        self.state.borrow().color_vision_mode
    }

    pub fn letter_spacing(&self) -> bool {
        self.state.borrow().letter_spacing
    }

    /// Set the root font size, clamped to `[50, 200]` percent.
    pub fn set_font_scale(&self, percent: u16) {
        let percent = percent.clamp(MIN_FONT_SCALE, MAX_FONT_SCALE);
        self.update(|prefs| prefs.font_scale = percent);
    }

    pub fn set_high_contrast(&self, enabled: bool) {
        self.update(|prefs| prefs.high_contrast = enabled);
    }

    pub fn set_color_vision_mode(&self, mode: ColorVisionMode) {
        self.update(|prefs| prefs.color_vision_mode = mode);
    }

    pub fn set_letter_spacing(&self, enabled: bool) {
        self.update(|prefs| prefs.letter_spacing = enabled);
    }

    /// Restore every preference to its default in a single update.
    pub fn reset_settings(&self) {
        self.update(|prefs| *prefs = Preferences::default());
    }

    fn update(&self, mutate: impl FnOnce(&mut Preferences)) {
        let _updating = mutex_lock(&self.updating, SOURCE, "update");
        let mut transition = None;
        self.state.send_if_modified(|prefs| {
            let before = *prefs;
            mutate(prefs);
            let changed = before != *prefs;
            if changed {
                transition = Some((before, *prefs));
            }
            changed
        });

        if let Some((before, after)) = transition {
            debug!(?before, ?after, "accessibility preferences changed");
            self.apply_changes(&before, &after);
        }
    }

    fn apply_all(&self, prefs: &Preferences) {
        self.apply_font_scale(prefs.font_scale);
        self.root.toggle_class(HIGH_CONTRAST_CLASS, prefs.high_contrast);
        self.apply_color_vision(prefs.color_vision_mode);
        self.root.toggle_class(LETTER_SPACING_CLASS, prefs.letter_spacing);
    }

    fn apply_changes(&self, before: &Preferences, after: &Preferences) {
        if before.font_scale != after.font_scale {
            self.apply_font_scale(after.font_scale);
        }
        if before.high_contrast != after.high_contrast {
            self.root.toggle_class(HIGH_CONTRAST_CLASS, after.high_contrast);
        }
        if before.color_vision_mode != after.color_vision_mode {
            self.apply_color_vision(after.color_vision_mode);
        }
        if before.letter_spacing != after.letter_spacing {
            self.root.toggle_class(LETTER_SPACING_CLASS, after.letter_spacing);
        }
    }

    fn apply_font_scale(&self, percent: u16) {
        self.root
            .set_style_property(FONT_SIZE_PROPERTY, &format!("{percent}%"));
    }

    fn apply_color_vision(&self, mode: ColorVisionMode) {
        let value = (mode != ColorVisionMode::None).then(|| mode.as_str());
        self.root.set_attribute(COLOR_VISION_ATTRIBUTE, value);
    }
}

/// Handle through which consumers reach the session's preference store.
#[derive(Clone, Default)]
pub struct PreferenceScope {
    store: Option<Arc<PreferenceStore>>,
}

impl PreferenceScope {
    /// A scope backed by `store`.
    pub fn provide(store: Arc<PreferenceStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A scope with no provider; every access fails.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn preferences(&self) -> Result<&PreferenceStore, PreferenceError> {
        self.store
            .as_deref()
            .ok_or(PreferenceError::OutsideProvider)
    }
}
