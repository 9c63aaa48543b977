//! Shared offset pagination helpers.
//!
//! Client-supplied `page` and `per_page` hints are never rejected: missing or
//! malformed values fall back to defaults and numbers are clamped into the
//! configured bounds.

use tablero_api_types::{PageMeta, Paginated};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MIN_PER_PAGE: u32 = 1;
pub const MAX_PER_PAGE: u32 = 100;

/// Configured page-size range plus the size used when the client sends none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeBounds {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for PageSizeBounds {
    fn default() -> Self {
        Self {
            min: MIN_PER_PAGE,
            max: MAX_PER_PAGE,
            default: DEFAULT_PER_PAGE,
        }
    }
}

impl From<&crate::config::PaginationSettings> for PageSizeBounds {
    fn from(settings: &crate::config::PaginationSettings) -> Self {
        Self {
            min: settings.min,
            max: settings.max,
            default: settings.default,
        }
    }
}

impl PageSizeBounds {
    /// Resolve a raw `per_page` hint.
    ///
    /// Missing or non-numeric input yields `default`; numbers are truncated
    /// toward zero and clamped into `[min, max]`. With `min > max` the result
    /// is `max`; settings loading rejects that combination.
    pub fn resolve(&self, requested: Option<&str>) -> u32 {
        match requested.and_then(parse_numeric) {
            Some(value) => self.clamp_f64(value),
            None => self.default,
        }
    }

    /// Clamp an integer page size into `[min, max]`.
    pub fn clamp(&self, value: i64) -> u32 {
        let clamped = value.max(i64::from(self.min)).min(i64::from(self.max));
        u32::try_from(clamped).unwrap_or(self.min)
    }

    fn clamp_f64(&self, value: f64) -> u32 {
        let clamped = value.max(f64::from(self.min)).min(f64::from(self.max));
        clamped as u32
    }
}

/// `resolvePageSize` with explicit bounds.
pub fn resolve_page_size(requested: Option<&str>, min: u32, max: u32, default: u32) -> u32 {
    PageSizeBounds { min, max, default }.resolve(requested)
}

/// Resolve a raw 1-based `page` hint; anything unusable becomes page 1.
pub fn resolve_page(requested: Option<&str>) -> u32 {
    match requested.and_then(parse_numeric) {
        Some(value) if value >= 1.0 => value.min(f64::from(u32::MAX)) as u32,
        _ => 1,
    }
}

/// Parse a numeric query value, truncating toward zero.
///
/// Accepts integers, decimals and exponent notation surrounded by optional
/// whitespace. Infinities and NaN are treated as non-numeric.
fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(integer as f64);
    }
    let is_plain_number = trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e' | 'E'));
    if !is_plain_number {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(f64::trunc)
}

/// Resolved offset pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Build a request from raw `page` / `per_page` query values.
    pub fn from_query(page: Option<&str>, per_page: Option<&str>, bounds: &PageSizeBounds) -> Self {
        Self::new(resolve_page(page), bounds.resolve(per_page))
    }

    /// Number of items preceding this page.
    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_sub(1).saturating_mul(self.per_page as usize)
    }

    /// Metadata for this page over a collection of `total` items.
    pub fn meta(&self, total: u64) -> PageMeta {
        let per_page = u64::from(self.per_page);
        let last_page = total.div_ceil(per_page).max(1);
        let from = self.offset() as u64 + 1;
        let to = (from + per_page - 1).min(total);
        let has_items = from <= total;

        PageMeta {
            current_page: self.page,
            per_page: self.per_page,
            total,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            from: has_items.then_some(from),
            to: has_items.then_some(to),
        }
    }

    /// Slice one page out of an already filtered collection.
    pub fn paginate<T: Clone>(&self, items: &[T]) -> Paginated<T> {
        let data = items
            .iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .cloned()
            .collect();

        Paginated {
            data,
            meta: self.meta(items.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: PageSizeBounds = PageSizeBounds {
        min: 1,
        max: 100,
        default: 10,
    };

    #[test]
    fn every_integer_lands_within_bounds() {
        for n in -250_i64..=250 {
            let resolved = BOUNDS.resolve(Some(&n.to_string()));
            assert!((1..=100).contains(&resolved), "{n} resolved to {resolved}");
            if (1..=100).contains(&n) {
                assert_eq!(i64::from(resolved), n);
            }
        }
        assert_eq!(BOUNDS.resolve(Some(&i64::MAX.to_string())), 100);
        assert_eq!(BOUNDS.resolve(Some(&i64::MIN.to_string())), 1);
    }

    #[test]
    fn missing_or_malformed_input_uses_default() {
        assert_eq!(BOUNDS.resolve(None), 10);
        for raw in ["", "   ", "abc", "12abc", "NaN", "inf", "0x10", "1,5"] {
            assert_eq!(BOUNDS.resolve(Some(raw)), 10, "{raw:?}");
        }
    }

    #[test]
    fn decimals_are_truncated_not_rounded() {
        assert_eq!(BOUNDS.resolve(Some("7.9")), 7);
        assert_eq!(BOUNDS.resolve(Some(" 25.5 ")), 25);
        assert_eq!(BOUNDS.resolve(Some("1e2")), 100);
        assert_eq!(BOUNDS.resolve(Some("0.9")), 1);
    }

    #[test]
    fn explicit_bounds_helper_uses_given_range() {
        assert_eq!(resolve_page_size(None, 1, 100, 10), 10);
        assert_eq!(resolve_page_size(Some("500"), 1, 100, 10), 100);
        assert_eq!(resolve_page_size(Some("3"), 5, 50, 20), 5);
        assert_eq!(PageSizeBounds::default(), BOUNDS);
    }

    #[test]
    fn clamp_handles_integer_input() {
        assert_eq!(BOUNDS.clamp(0), 1);
        assert_eq!(BOUNDS.clamp(42), 42);
        assert_eq!(BOUNDS.clamp(1_000), 100);
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(resolve_page(None), 1);
        assert_eq!(resolve_page(Some("0")), 1);
        assert_eq!(resolve_page(Some("-4")), 1);
        assert_eq!(resolve_page(Some("x")), 1);
        assert_eq!(resolve_page(Some("3.7")), 3);
    }

    #[test]
    fn paginate_slices_and_reports_meta() {
        let items: Vec<u32> = (1..=23).collect();
        let page = PageRequest::new(3, 10).paginate(&items);

        assert_eq!(page.data, vec![21, 22, 23]);
        assert_eq!(page.meta.total, 23);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.meta.from, Some(21));
        assert_eq!(page.meta.to, Some(23));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items: Vec<u32> = (1..=5).collect();
        let page = PageRequest::new(4, 5).paginate(&items);

        assert!(page.data.is_empty());
        assert_eq!(page.meta.last_page, 1);
        assert_eq!(page.meta.from, None);
        assert_eq!(page.meta.to, None);
    }

    #[test]
    fn empty_collection_has_single_page() {
        let page = PageRequest::new(1, 10).paginate::<u32>(&[]);
        assert_eq!(page.meta.last_page, 1);
        assert_eq!(page.meta.total, 0);
    }

    #[test]
    fn from_query_combines_page_and_size() {
        let request = PageRequest::from_query(Some("2"), Some("250"), &BOUNDS);
        assert_eq!(request, PageRequest::new(2, 100));
        assert_eq!(request.offset(), 100);
    }
}
