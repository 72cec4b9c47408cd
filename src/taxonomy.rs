//! Listing categories and the fields each one carries.
//!
//! Adding a category means adding a row to [`CATEGORIES`]; nothing branches
//! on category tags elsewhere.

use crate::query::{QueryDescriptor, SortDirection};
use serde::Serialize;

/// Collection holding every listing.
pub const LISTINGS_COLLECTION: &str = "listings";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Choice(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySpec {
    pub tag: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required,
    }
}

pub static CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        tag: "jobs",
        label: "Jobs",
        fields: &[
            field("title", "Job title", FieldKind::Text, true),
            field("company", "Company", FieldKind::Text, true),
            field(
                "employment",
                "Employment type",
                FieldKind::Choice(&["full_time", "part_time", "contract", "internship"]),
                true,
            ),
            field("salary", "Monthly salary", FieldKind::Number, false),
            field("remote", "Remote", FieldKind::Boolean, false),
        ],
    },
    CategorySpec {
        tag: "rentals",
        label: "Rentals",
        fields: &[
            field("title", "Title", FieldKind::Text, true),
            field("rent", "Monthly rent", FieldKind::Number, true),
            field("bedrooms", "Bedrooms", FieldKind::Number, true),
            field("furnished", "Furnished", FieldKind::Boolean, false),
        ],
    },
    CategorySpec {
        tag: "vehicles",
        label: "Vehicles",
        fields: &[
            field("title", "Title", FieldKind::Text, true),
            field("make", "Make", FieldKind::Text, true),
            field("year", "Year", FieldKind::Number, true),
            field("mileage", "Mileage", FieldKind::Number, false),
            field(
                "fuel",
                "Fuel",
                FieldKind::Choice(&["petrol", "diesel", "hybrid", "electric"]),
                false,
            ),
            field("price", "Price", FieldKind::Number, true),
        ],
    },
    CategorySpec {
        tag: "electronics",
        label: "Electronics",
        fields: &[
            field("title", "Title", FieldKind::Text, true),
            field("brand", "Brand", FieldKind::Text, false),
            field(
                "condition",
                "Condition",
                FieldKind::Choice(&["new", "used", "refurbished"]),
                true,
            ),
            field("price", "Price", FieldKind::Number, true),
        ],
    },
    CategorySpec {
        tag: "services",
        label: "Services",
        fields: &[
            field("title", "Title", FieldKind::Text, true),
            field("rate", "Hourly rate", FieldKind::Number, false),
        ],
    },
];

/// Look up a category by tag.
pub fn category(tag: &str) -> Option<&'static CategorySpec> {
    CATEGORIES.iter().find(|c| c.tag == tag)
}

impl CategorySpec {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Newest listings of this category.
    pub fn listing_query(&self) -> QueryDescriptor {
        QueryDescriptor::new()
            .equals("category", self.tag)
            .order_by("createdAt", SortDirection::Desc)
    }
}
