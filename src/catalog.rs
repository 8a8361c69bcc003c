// ============================================================================
// FILTER CATALOG — category → key registry, selection, user overlay merge
// ============================================================================
//
// One catalog instance per process, owned by the composition root and handed
// down explicitly (no global).  Descriptors are expensive to build and are
// instantiated lazily on first lookup, then memoized until an explicit
// release.  User overlay records (hidden/favourite/rating) are merged into
// every query and persisted through the injected store.
// ============================================================================

use std::collections::HashMap;

use crate::filter::descriptor::FilterDescriptor;
use crate::filter::library::{FilterDefinition, builtin_definitions};
use crate::log_warn;
use crate::store::{OverlayStore, UserOverlay};

/// The fixed set of gallery categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    QuickSelect,
    ColorAdjustments,
    ImageProcessing,
    BlendModes,
    VisualEffects,
    Style,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::QuickSelect,
        Category::ColorAdjustments,
        Category::ImageProcessing,
        Category::BlendModes,
        Category::VisualEffects,
        Category::Style,
    ];

    /// Category shown when the app starts.
    pub const DEFAULT: Category = Category::QuickSelect;

    /// Menu title.
    pub fn title(&self) -> &'static str {
        match self {
            Category::QuickSelect => "Quick Select",
            Category::ColorAdjustments => "Color Adjustments",
            Category::ImageProcessing => "Image Processing",
            Category::BlendModes => "Blend Modes",
            Category::VisualEffects => "Visual Effects",
            Category::Style => "Style",
        }
    }
}

pub struct FilterCatalog {
    definitions: HashMap<String, FilterDefinition>,
    /// Sorted key list per category (the gallery ordering).
    order: HashMap<Category, Vec<String>>,
    /// Lazily instantiated descriptors.
    descriptors: HashMap<String, FilterDescriptor>,
    /// Overlay cache; authoritative within the process, write-through to the
    /// store so read-after-write always observes the newest value.
    overlays: HashMap<String, UserOverlay>,
    store: Box<dyn OverlayStore>,
    /// Nested pin counts guarding descriptor release.
    locks: HashMap<String, u32>,
    selected_category: Category,
    selected_key: String,
    populated: bool,
}

impl FilterCatalog {
    pub fn new(store: Box<dyn OverlayStore>) -> Self {
        Self {
            definitions: HashMap::new(),
            order: HashMap::new(),
            descriptors: HashMap::new(),
            overlays: HashMap::new(),
            store,
            locks: HashMap::new(),
            selected_category: Category::DEFAULT,
            selected_key: String::new(),
            populated: false,
        }
    }

    // ------------------------------------------------------------------
    //  Bootstrap
    // ------------------------------------------------------------------

    /// One-time bootstrap: registers the built-in filter set and selects
    /// the first entry of the default category.  Safe to call again — later
    /// calls are no-ops, so repeated wiring cannot duplicate keys or reset
    /// user overlays.
    pub fn populate(&mut self) {
        if self.populated {
            return;
        }
        self.populated = true;

        for def in builtin_definitions() {
            self.register(def);
        }

        let first = self
            .visible_keys(Category::DEFAULT)
            .into_iter()
            .next()
            .or_else(|| self.keys(Category::DEFAULT).first().cloned());
        match first {
            Some(key) => self.selected_key = key,
            None => log_warn!("no filters registered for {}", Category::DEFAULT.title()),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Add one definition.  Keys are unique catalog-wide; a duplicate is
    /// rejected with a warning rather than replacing user-visible state.
    pub fn register(&mut self, def: FilterDefinition) {
        let key = def.key.to_string();
        if self.definitions.contains_key(&key) {
            log_warn!("duplicate filter key ignored: {}", key);
            return;
        }

        let list = self.order.entry(def.category).or_default();
        let pos = list.binary_search(&key).unwrap_or_else(|p| p);
        list.insert(pos, key.clone());

        let overlay = self.store.load(&key);
        self.overlays.insert(key.clone(), overlay);
        self.definitions.insert(key, def);
    }

    // ------------------------------------------------------------------
    //  Listing
    // ------------------------------------------------------------------

    /// All keys of a category, sorted.
    pub fn keys(&self, category: Category) -> &[String] {
        self.order.get(&category).map_or(&[], |list| list.as_slice())
    }

    /// Keys of a category minus those the user hid.
    pub fn visible_keys(&self, category: Category) -> Vec<String> {
        self.keys(category)
            .iter()
            .filter(|key| !self.is_hidden(key))
            .cloned()
            .collect()
    }

    /// Favourited keys across every category, sorted.
    pub fn favourite_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .overlays
            .iter()
            .filter(|(_, overlay)| overlay.favourite)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Keys rated at or above `min_rating`, across every category, sorted.
    pub fn rated_keys(&self, min_rating: u8) -> Vec<String> {
        let mut keys: Vec<String> = self
            .overlays
            .iter()
            .filter(|(_, overlay)| overlay.rating >= min_rating)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn category_of(&self, key: &str) -> Option<Category> {
        self.definitions.get(key).map(|def| def.category)
    }

    pub fn title_of(&self, key: &str) -> Option<&'static str> {
        self.definitions.get(key).map(|def| def.title)
    }

    // ------------------------------------------------------------------
    //  Descriptor lookup / lifecycle
    // ------------------------------------------------------------------

    /// The descriptor for `key`, built on first reference and memoized.
    /// Unknown keys log and return `None`.
    pub fn descriptor(&mut self, key: &str) -> Option<&mut FilterDescriptor> {
        if !self.descriptors.contains_key(key) {
            match self.definitions.get(key) {
                Some(def) => {
                    let descriptor = def.instantiate();
                    self.descriptors.insert(key.to_string(), descriptor);
                }
                None => {
                    log_warn!("unknown filter key: {}", key);
                    return None;
                }
            }
        }
        self.descriptors.get_mut(key)
    }

    /// Whether a descriptor is currently instantiated (without building one).
    pub fn is_instantiated(&self, key: &str) -> bool {
        self.descriptors.contains_key(key)
    }

    /// Drop the memoized descriptor so its resources can go away.  Locked
    /// keys are left alone.  The paired render surface should be released
    /// from the pool by the same caller — the catalog does not own the pool.
    pub fn release(&mut self, key: &str) -> bool {
        if self.is_locked(key) {
            return false;
        }
        self.descriptors.remove(key).is_some()
    }

    /// Drop every unlocked descriptor (memory pressure, background entry).
    pub fn release_all(&mut self) {
        let locks = std::mem::take(&mut self.locks);
        self.descriptors.retain(|key, _| locks.get(key).is_some_and(|&n| n > 0));
        self.locks = locks;
    }

    // ------------------------------------------------------------------
    //  Locks
    // ------------------------------------------------------------------

    /// Pin a key so `release` leaves it alone.  Nested: every `lock` needs
    /// a matching `unlock`.
    pub fn lock(&mut self, key: &str) {
        *self.locks.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn unlock(&mut self, key: &str) {
        if let Some(count) = self.locks.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.locks.remove(key);
            }
        }
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locks.get(key).is_some_and(|&count| count > 0)
    }

    // ------------------------------------------------------------------
    //  User overlay
    // ------------------------------------------------------------------

    pub fn overlay(&self, key: &str) -> UserOverlay {
        self.overlays.get(key).copied().unwrap_or_default()
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.overlay(key).hidden
    }

    pub fn is_favourite(&self, key: &str) -> bool {
        self.overlay(key).favourite
    }

    pub fn rating(&self, key: &str) -> u8 {
        self.overlay(key).rating
    }

    pub fn set_hidden(&mut self, key: &str, hidden: bool) {
        self.update_overlay(key, |overlay| overlay.hidden = hidden);
    }

    pub fn set_favourite(&mut self, key: &str, favourite: bool) {
        self.update_overlay(key, |overlay| overlay.favourite = favourite);
    }

    pub fn set_rating(&mut self, key: &str, rating: u8) {
        let rating = rating.min(UserOverlay::MAX_RATING);
        self.update_overlay(key, |overlay| overlay.rating = rating);
    }

    fn update_overlay(&mut self, key: &str, mutate: impl FnOnce(&mut UserOverlay)) {
        let mut overlay = self.overlay(key);
        mutate(&mut overlay);
        self.overlays.insert(key.to_string(), overlay);
        // Cache first, then write through: persistence trouble must not
        // break read-after-write.
        if let Err(e) = self.store.save(key, overlay) {
            log_warn!("overlay save failed for {}: {}", key, e);
        }
    }

    // ------------------------------------------------------------------
    //  Selection
    // ------------------------------------------------------------------

    /// Process-wide active filter.  Last write wins; no validation beyond a
    /// warning for unknown keys (the gallery may select ahead of lazy
    /// registration during startup).
    pub fn select(&mut self, category: Category, key: &str) {
        if !self.definitions.contains_key(key) {
            log_warn!("selecting unknown filter key: {}", key);
        }
        self.selected_category = category;
        self.selected_key = key.to_string();
    }

    pub fn selected(&self) -> (Category, &str) {
        (self.selected_category, &self.selected_key)
    }

    /// Next key after the current selection in its category, wrapping.
    pub fn next_key(&self) -> Option<String> {
        self.step_key(1)
    }

    /// Previous key before the current selection in its category, wrapping.
    pub fn previous_key(&self) -> Option<String> {
        self.step_key(-1)
    }

    fn step_key(&self, delta: isize) -> Option<String> {
        let list = self.keys(self.selected_category);
        if list.is_empty() {
            return None;
        }
        let here = list.iter().position(|key| *key == self.selected_key)?;
        let len = list.len() as isize;
        let next = (here as isize + delta).rem_euclid(len) as usize;
        Some(list[next].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryOverlayStore;

    fn catalog() -> FilterCatalog {
        let mut catalog = FilterCatalog::new(Box::new(MemoryOverlayStore::new()));
        catalog.populate();
        catalog
    }

    #[test]
    fn populate_is_idempotent() {
        let mut c = catalog();
        let before: Vec<String> = Category::ALL
            .iter()
            .flat_map(|&cat| c.keys(cat).to_vec())
            .collect();
        c.set_rating("Sepia", 3);
        c.set_hidden("Invert", true);

        c.populate();
        let after: Vec<String> = Category::ALL
            .iter()
            .flat_map(|&cat| c.keys(cat).to_vec())
            .collect();
        assert_eq!(before, after);
        assert_eq!(c.rating("Sepia"), 3);
        assert!(c.is_hidden("Invert"));
    }

    #[test]
    fn keys_are_unique_catalog_wide() {
        let c = catalog();
        let mut all: Vec<String> = Category::ALL
            .iter()
            .flat_map(|&cat| c.keys(cat).to_vec())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert!(total > 20, "built-in set unexpectedly small: {}", total);
    }

    #[test]
    fn lookup_is_lazy_and_memoized() {
        let mut c = catalog();
        assert!(!c.is_instantiated("Sepia"));
        {
            let d = c.descriptor("Sepia").expect("built-in key");
            assert_eq!(d.key(), "Sepia");
            d.set_parameter(0, 0.25);
        }
        assert!(c.is_instantiated("Sepia"));
        // memoized: parameter state survives the second lookup
        let d = c.descriptor("Sepia").unwrap();
        assert_eq!(d.parameter(0), 0.25);
    }

    #[test]
    fn unknown_key_returns_none() {
        let mut c = catalog();
        assert!(c.descriptor("NoSuchFilter").is_none());
    }

    #[test]
    fn visibility_filter_excludes_exactly_the_hidden() {
        let mut c = catalog();
        let all = c.keys(Category::VisualEffects).to_vec();
        assert!(all.len() >= 3);
        c.set_hidden(&all[0], true);
        c.set_hidden(&all[2], true);

        let visible = c.visible_keys(Category::VisualEffects);
        let expected: Vec<String> = all
            .iter()
            .filter(|key| !c.is_hidden(key))
            .cloned()
            .collect();
        assert_eq!(visible, expected);
        assert!(!visible.contains(&all[0]));
        assert!(visible.contains(&all[1]));
    }

    #[test]
    fn overlay_read_after_write() {
        let mut c = catalog();
        c.set_favourite("Vignette", true);
        c.set_rating("Vignette", 9); // clamps to MAX_RATING
        assert!(c.is_favourite("Vignette"));
        assert_eq!(c.rating("Vignette"), UserOverlay::MAX_RATING);
        assert!(c.favourite_keys().contains(&"Vignette".to_string()));
        assert_eq!(c.rated_keys(1), vec!["Vignette".to_string()]);
    }

    #[test]
    fn selection_is_last_write_wins() {
        let mut c = catalog();
        let (category, key) = c.selected();
        assert_eq!(category, Category::DEFAULT);
        assert!(!key.is_empty(), "populate selects a default filter");

        c.select(Category::VisualEffects, "Vignette");
        c.select(Category::ImageProcessing, "GaussianBlur");
        let (category, key) = c.selected();
        assert_eq!(category, Category::ImageProcessing);
        assert_eq!(key, "GaussianBlur");
    }

    #[test]
    fn navigation_wraps_in_sorted_order() {
        let mut c = catalog();
        let keys = c.keys(Category::VisualEffects).to_vec();
        c.select(Category::VisualEffects, &keys[0]);
        assert_eq!(c.next_key().as_deref(), Some(keys[1].as_str()));
        assert_eq!(c.previous_key().as_deref(), Some(keys[keys.len() - 1].as_str()));
    }

    #[test]
    fn locked_keys_survive_release() {
        let mut c = catalog();
        c.descriptor("Sepia").unwrap();
        c.lock("Sepia");
        assert!(!c.release("Sepia"));
        assert!(c.is_instantiated("Sepia"));
        c.unlock("Sepia");
        assert!(c.release("Sepia"));
        assert!(!c.is_instantiated("Sepia"));
    }

    #[test]
    fn release_all_respects_locks() {
        let mut c = catalog();
        c.descriptor("Sepia").unwrap();
        c.descriptor("Invert").unwrap();
        c.lock("Invert");
        c.release_all();
        assert!(!c.is_instantiated("Sepia"));
        assert!(c.is_instantiated("Invert"));
    }

    #[test]
    fn persistence_failure_is_not_fatal() {
        struct FailingStore;
        impl OverlayStore for FailingStore {
            fn load(&mut self, _key: &str) -> UserOverlay {
                UserOverlay::default()
            }
            fn save(&mut self, _key: &str, _overlay: UserOverlay) -> Result<(), String> {
                Err("disk on fire".to_string())
            }
        }
        let mut c = FilterCatalog::new(Box::new(FailingStore));
        c.populate();
        c.set_hidden("Sepia", true);
        // cache still answers with the new value
        assert!(c.is_hidden("Sepia"));
    }
}
