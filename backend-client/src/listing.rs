//! Client-side narrowing of listings the server already returned.

use strum_macros::Display;
use strum_macros::EnumString;

use crate::types::Property;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SortField {
    Price,
    Rating,
    RealtorRating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Rating thresholds and ordering the server does not support. Missing
/// ratings count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub min_realtor_rating: Option<f64>,
    pub min_property_rating: Option<f64>,
    pub sort: Option<(SortField, SortOrder)>,
}

impl ListingFilter {
    pub fn apply(&self, properties: Vec<Property>) -> Vec<Property> {
        let mut kept: Vec<Property> = properties
            .into_iter()
            .filter(|p| {
                let realtor = p.realtor_rating.unwrap_or(0.0);
                let own = p.rating.unwrap_or(0.0);
                self.min_realtor_rating.is_none_or(|min| realtor >= min)
                    && self.min_property_rating.is_none_or(|min| own >= min)
            })
            .collect();
        if let Some((field, order)) = self.sort {
            // Stable, so equal keys keep server order.
            kept.sort_by(|a, b| {
                let ord = sort_key(a, field).total_cmp(&sort_key(b, field));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        kept
    }
}

fn sort_key(p: &Property, field: SortField) -> f64 {
    match field {
        SortField::Price => p.price,
        SortField::Rating => p.rating.unwrap_or(0.0),
        SortField::RealtorRating => p.realtor_rating.unwrap_or(0.0),
    }
}

/// Address search over listings. City must match exactly; street and house
/// are substring matches against the address. All comparisons happen on
/// [`normalize_address`] output so Cyrillic and Latin spellings meet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
}

impl AddressFilter {
    pub fn is_empty(&self) -> bool {
        [&self.city, &self.street, &self.house]
            .iter()
            .all(|part| part.as_deref().is_none_or(str::is_empty))
    }

    pub fn matches(&self, property: &Property) -> bool {
        let address = normalize_address(property.address.as_deref().unwrap_or(""));
        let city = normalize_address(property.city.as_deref().unwrap_or(""));
        if let Some(want) = non_empty(&self.city)
            && city != normalize_address(want)
        {
            return false;
        }
        if let Some(want) = non_empty(&self.street)
            && !address.contains(&normalize_address(want))
        {
            return false;
        }
        if let Some(want) = non_empty(&self.house)
            && !address.contains(&normalize_address(want))
        {
            return false;
        }
        true
    }

    pub fn apply(&self, properties: Vec<Property>) -> Vec<Property> {
        properties.into_iter().filter(|p| self.matches(p)).collect()
    }

    /// Free-text geocoder query, most specific part first.
    pub fn geocode_query(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.house, &self.street, &self.city]
            .into_iter()
            .filter_map(non_empty)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Map zoom for the most specific part given.
    pub fn zoom(&self) -> u8 {
        if non_empty(&self.house).is_some() {
            18
        } else if non_empty(&self.street).is_some() {
            16
        } else {
            13
        }
    }
}

fn non_empty(part: &Option<String>) -> Option<&str> {
    part.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Transliterate Ukrainian Cyrillic to Latin and lowercase.
pub fn normalize_address(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let lower: String = c.to_lowercase().collect();
        match transliterate(&lower) {
            Some(latin) => out.push_str(latin),
            None => out.push_str(&lower),
        }
    }
    out
}

fn transliterate(c: &str) -> Option<&'static str> {
    let latin = match c {
        "а" => "a",
        "б" => "b",
        "в" => "v",
        "г" | "ґ" => "g",
        "д" => "d",
        "е" | "є" => "e",
        "ж" => "zh",
        "з" => "z",
        "и" | "і" | "ї" | "й" => "i",
        "к" => "k",
        "л" => "l",
        "м" => "m",
        "н" => "n",
        "о" => "o",
        "п" => "p",
        "р" => "r",
        "с" => "s",
        "т" => "t",
        "у" => "u",
        "ф" => "f",
        "х" => "kh",
        "ц" => "ts",
        "ч" => "ch",
        "ш" => "sh",
        "щ" => "shch",
        "ю" => "yu",
        "я" => "ya",
        "ь" | "ъ" => "",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listing(id: i64, price: f64, rating: Option<f64>, realtor: Option<f64>) -> Property {
        Property {
            id,
            title: format!("#{id}"),
            price,
            rating,
            realtor_rating: realtor,
            ..Default::default()
        }
    }

    fn ids(props: &[Property]) -> Vec<i64> {
        props.iter().map(|p| p.id).collect()
    }

    #[test]
    fn missing_ratings_count_as_zero() {
        let filter = ListingFilter {
            min_property_rating: Some(3.0),
            ..Default::default()
        };
        let kept = filter.apply(vec![
            listing(1, 10.0, Some(4.0), None),
            listing(2, 10.0, None, Some(5.0)),
            listing(3, 10.0, Some(3.0), None),
        ]);
        assert_eq!(ids(&kept), vec![1, 3]);
    }

    #[test]
    fn sorts_by_price_descending_and_keeps_ties_in_order() {
        let filter = ListingFilter {
            sort: Some((SortField::Price, SortOrder::Desc)),
            ..Default::default()
        };
        let kept = filter.apply(vec![
            listing(1, 100.0, None, None),
            listing(2, 300.0, None, None),
            listing(3, 100.0, None, None),
        ]);
        assert_eq!(ids(&kept), vec![2, 1, 3]);
    }

    #[test]
    fn no_sort_preserves_server_order() {
        let kept = ListingFilter::default().apply(vec![
            listing(3, 1.0, None, None),
            listing(1, 2.0, None, None),
        ]);
        assert_eq!(ids(&kept), vec![3, 1]);
    }

    #[test]
    fn sort_field_parses_kebab_case() {
        assert_eq!("realtor-rating".parse::<SortField>().ok(), Some(SortField::RealtorRating));
        assert_eq!("DESC".parse::<SortOrder>().ok(), Some(SortOrder::Desc));
    }

    #[test]
    fn normalizes_cyrillic_to_latin() {
        assert_eq!(normalize_address("Київ"), "kiiv");
        assert_eq!(normalize_address("вул. Шевченка 5"), "vul. shevchenka 5");
        assert_eq!(normalize_address("Lviv"), "lviv");
    }

    #[test]
    fn address_filter_matches_across_scripts() {
        let property = Property {
            id: 1,
            title: "Flat".to_string(),
            city: Some("Львів".to_string()),
            address: Some("вул. Городоцька 12".to_string()),
            ..Default::default()
        };
        let filter = AddressFilter {
            city: Some("lviv".to_string()),
            street: Some("Gorodotska".to_string()),
            house: Some("12".to_string()),
        };
        assert!(filter.matches(&property));

        let wrong_city = AddressFilter {
            city: Some("Kyiv".to_string()),
            ..Default::default()
        };
        assert!(!wrong_city.matches(&property));
    }

    #[test]
    fn geocode_query_and_zoom_follow_most_specific_part() {
        let filter = AddressFilter {
            city: Some("Kyiv".to_string()),
            street: Some("Khreshchatyk".to_string()),
            house: None,
        };
        assert_eq!(filter.geocode_query().as_deref(), Some("Khreshchatyk Kyiv"));
        assert_eq!(filter.zoom(), 16);

        assert_eq!(AddressFilter::default().geocode_query(), None);
        assert!(AddressFilter::default().is_empty());
        assert_eq!(AddressFilter::default().zoom(), 13);
    }
}
