//! Sort options shown on product listings.
//!
//! [`SORT_OPTIONS`] is display data: grouped `(field, label)` pairs in the
//! order the listing page renders them. [`SortKey`] is the parsed form of the
//! `?sort=` query parameter that repositories turn into an `ORDER BY`.

use std::fmt;

use serde::Serialize;

/// One selectable ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortOption {
    /// Value of the `sort` query parameter; a leading `-` means descending.
    pub field: &'static str,
    pub label: &'static str,
}

/// A titled group of orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortGroup {
    pub title: &'static str,
    pub options: &'static [SortOption],
}

const fn option(field: &'static str, label: &'static str) -> SortOption {
    SortOption { field, label }
}

/// The sort catalog, in display order.
///
/// Both `Ranglar` entries use `color`, so "Z - A" currently sorts A to Z.
/// Kept as-is until the catalog owner confirms the intended key (`-color`
/// is already understood by [`SortKey`]).
pub const SORT_OPTIONS: &[SortGroup] = &[
    SortGroup {
        title: "Narxi",
        options: &[option("-price", "Qimmatlari"), option("price", "Arzonroq")],
    },
    SortGroup {
        title: "Ranglar",
        options: &[option("color", "A - Z"), option("color", "Z - A")],
    },
    SortGroup {
        title: "O`lchami",
        options: &[option("size", "Kichiklari"), option("-size", "Kattalari")],
    },
];

/// Product column a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Color,
    Size,
}

impl SortField {
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Color => "color",
            Self::Size => "size",
        }
    }
}

/// A parsed `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    /// Parse a `sort` value such as `price` or `-size`.
    ///
    /// Returns `None` for anything else; callers fall back to their default
    /// ordering.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = raw
            .strip_prefix('-')
            .map_or((false, raw), |rest| (true, rest));
        let field = match name {
            "price" => SortField::Price,
            "color" => SortField::Color,
            "size" => SortField::Size,
            _ => return None,
        };
        Some(Self { field, descending })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.field.column())
    }
}
