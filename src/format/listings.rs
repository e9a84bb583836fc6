use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::ResultFormatter;

// The gateway hands back accessibility strings rather than numeric fields,
// so rating and price are recovered by pattern match. Known weakness: the
// price pattern is currency-symbol specific. Records that fail either
// pattern still rank, they just sort last.
lazy_static! {
    static ref RATING: Regex = Regex::new(r"(\d+\.?\d*)").unwrap();
    static ref RATING_OUT_OF_FIVE: Regex = Regex::new(r"(\d+\.?\d*) out of 5").unwrap();
    static ref PRICE: Regex = Regex::new(r"£(\d+)").unwrap();
}

const MISSING_RATING: f64 = 0.0;
const MISSING_PRICE: f64 = 999.0;
const TOP_COUNT: usize = 3;

/// Renders search-listing payloads as a short ranked rundown: distinct
/// count, then the top three by rating (descending) and price (ascending).
pub struct ListingFormatter;

impl ResultFormatter for ListingFormatter {
    fn name(&self) -> &str {
        "listings"
    }

    fn matches(&self, raw: &Value) -> bool {
        raw.get("searchResults").is_some()
    }

    fn format(&self, raw: &Value) -> Option<String> {
        let listings = raw.get("searchResults")?.as_array()?;

        // Dedup by id, first occurrence wins.
        let mut seen = std::collections::HashSet::new();
        let mut unique: Vec<&Value> = Vec::new();
        for listing in listings {
            let Some(id) = listing.get("id").map(Value::to_string) else {
                continue;
            };
            if seen.insert(id) {
                unique.push(listing);
            }
        }
        if unique.is_empty() {
            return None;
        }
        let distinct = unique.len();

        unique.sort_by(|a, b| {
            rating_key(b)
                .partial_cmp(&rating_key(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    price_key(a)
                        .partial_cmp(&price_key(b))
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let mut summary = format!(
            "I found {} listings. Here are the top options: ",
            distinct
        );
        for (i, listing) in unique.iter().take(TOP_COUNT).enumerate() {
            let position = i + 1;
            let name = display_name(listing).unwrap_or_else(|| format!("Listing {}", position));
            let price = price_label(listing).unwrap_or_else(|| "price varies".to_string());
            let rating = rating_label(listing).unwrap_or_else(|| "no rating".to_string());
            summary.push_str(&format!(
                "{}. {}, {} per night, rated {}. ",
                position, name, price, rating
            ));
        }

        Some(summary.trim_end().to_string())
    }
}

fn rating_text(listing: &Value) -> Option<&str> {
    listing.get("avgRatingA11yLabel")?.as_str()
}

fn price_text(listing: &Value) -> Option<&str> {
    listing
        .get("structuredDisplayPrice")?
        .get("primaryLine")?
        .get("accessibilityLabel")?
        .as_str()
}

fn rating_key(listing: &Value) -> f64 {
    rating_text(listing)
        .and_then(|text| RATING.captures(text))
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(MISSING_RATING)
}

fn price_key(listing: &Value) -> f64 {
    price_text(listing)
        .and_then(|text| PRICE.captures(text))
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(MISSING_PRICE)
}

fn display_name(listing: &Value) -> Option<String> {
    listing
        .get("demandStayListing")?
        .get("description")?
        .get("name")?
        .get("localizedStringWithTranslationPreference")?
        .as_str()
        .map(String::from)
}

fn price_label(listing: &Value) -> Option<String> {
    price_text(listing)
        .and_then(|text| PRICE.captures(text))
        .map(|captures| format!("£{}", &captures[1]))
}

fn rating_label(listing: &Value) -> Option<String> {
    rating_text(listing)
        .and_then(|text| RATING_OUT_OF_FIVE.captures(text))
        .map(|captures| format!("{} out of 5", &captures[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(id: &str, name: &str, price: &str, rating: &str) -> Value {
        json!({
            "id": id,
            "demandStayListing": {
                "description": {
                    "name": {"localizedStringWithTranslationPreference": name}
                }
            },
            "structuredDisplayPrice": {
                "primaryLine": {"accessibilityLabel": price}
            },
            "avgRatingA11yLabel": rating,
        })
    }

    fn payload(listings: Vec<Value>) -> Value {
        json!({"searchResults": listings})
    }

    #[test]
    fn test_rating_dominates_price() {
        let raw = payload(vec![
            listing("a", "Canal flat", "£100 per night", "4.5 out of 5 average rating"),
            listing("b", "Loft", "£120 per night", "4.8 out of 5 average rating"),
            json!({"id": "c", "structuredDisplayPrice": {"primaryLine": {"accessibilityLabel": "£50 per night"}}}),
        ]);
        let summary = ListingFormatter.format(&raw).unwrap();
        let loft = summary.find("Loft").unwrap();
        let canal = summary.find("Canal flat").unwrap();
        let unnamed = summary.find("Listing 3").unwrap();
        assert!(loft < canal && canal < unnamed);
    }

    #[test]
    fn test_order_is_input_independent() {
        let forward = payload(vec![
            listing("a", "First", "£80 per night", "4.2 out of 5"),
            listing("b", "Second", "£60 per night", "4.9 out of 5"),
        ]);
        let reversed = payload(vec![
            listing("b", "Second", "£60 per night", "4.9 out of 5"),
            listing("a", "First", "£80 per night", "4.2 out of 5"),
        ]);
        assert_eq!(
            ListingFormatter.format(&forward).unwrap(),
            ListingFormatter.format(&reversed).unwrap()
        );
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let raw = payload(vec![
            listing("same", "Original", "£90 per night", "4.0 out of 5"),
            listing("same", "Duplicate", "£10 per night", "5.0 out of 5"),
        ]);
        let summary = ListingFormatter.format(&raw).unwrap();
        assert!(summary.starts_with("I found 1 listings."));
        assert!(summary.contains("Original"));
        assert!(!summary.contains("Duplicate"));
    }

    #[test]
    fn test_equal_ratings_prefer_cheaper() {
        let raw = payload(vec![
            listing("a", "Pricier", "£200 per night", "4.5 out of 5"),
            listing("b", "Cheaper", "£90 per night", "4.5 out of 5"),
        ]);
        let summary = ListingFormatter.format(&raw).unwrap();
        assert!(summary.find("Cheaper").unwrap() < summary.find("Pricier").unwrap());
    }

    #[test]
    fn test_fallback_labels() {
        let raw = payload(vec![json!({"id": "bare"})]);
        let summary = ListingFormatter.format(&raw).unwrap();
        assert!(summary.contains("Listing 1"));
        assert!(summary.contains("price varies"));
        assert!(summary.contains("no rating"));
    }

    #[test]
    fn test_takes_at_most_three() {
        let raw = payload(
            (0..5)
                .map(|i| {
                    listing(
                        &format!("id{}", i),
                        &format!("Place {}", i),
                        "£100 per night",
                        "4.0 out of 5",
                    )
                })
                .collect(),
        );
        let summary = ListingFormatter.format(&raw).unwrap();
        assert!(summary.starts_with("I found 5 listings."));
        assert!(summary.contains("Place 2"));
        assert!(!summary.contains("Place 3"));
        assert!(!summary.contains("Place 4"));
    }

    #[test]
    fn test_malformed_payload_yields_none() {
        assert!(ListingFormatter.format(&json!({"searchResults": 7})).is_none());
        assert!(ListingFormatter
            .format(&json!({"searchResults": [{"name": "no id"}]}))
            .is_none());
    }

    #[test]
    fn test_detector() {
        assert!(ListingFormatter.matches(&json!({"searchResults": []})));
        assert!(!ListingFormatter.matches(&json!({"datetime": "x"})));
    }
}
