//! Mapping of genre/decade selections onto the catalog search syntax.

/// Build the search query for the given genres and decades.
///
/// Genres and decades each become an OR-list; both lists are joined with a space. Empty
/// input produces an empty query.
pub fn build_query(genres: &[String], decades: &[String]) -> String {
    let mut parts = Vec::with_capacity(2);

    if !genres.is_empty() {
        parts.push(
            genres
                .iter()
                .map(|genre| format!("genre:\"{genre}\""))
                .collect::<Vec<_>>()
                .join(" OR "),
        );
    }

    if !decades.is_empty() {
        parts.push(
            decades
                .iter()
                .map(|decade| format!("year:{}", decade_to_range(decade)))
                .collect::<Vec<_>>()
                .join(" OR "),
        );
    }

    parts.join(" ")
}

/// `"1990s"` -> `"1990-1999"`; anything not starting with a year maps to an empty range.
pub fn decade_to_range(decade: &str) -> String {
    decade_start(decade)
        .map(|start| format!("{}-{}", start, start + 9))
        .unwrap_or_default()
}

/// Whether `value` names a decade: four digits ending in zero, then `s` (`"1990s"`).
pub fn is_decade(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 5
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[3] == b'0'
        && bytes[4] == b's'
}

/// First year of a decade label such as `"1990s"`.
pub fn decade_start(decade: &str) -> Option<u16> {
    decade.get(..4)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn genre_and_decade_clauses_are_combined() {
        let query = build_query(&strings(&["Rock"]), &strings(&["1990s"]));

        assert!(query.contains("genre:\"Rock\""));
        assert!(query.contains("year:1990-1999"));
        assert_eq!(query, "genre:\"Rock\" year:1990-1999");
    }

    #[test]
    fn empty_selection_yields_empty_query() {
        assert_eq!(build_query(&[], &[]), "");
    }

    #[test]
    fn multiple_terms_are_or_joined() {
        let query = build_query(
            &strings(&["Pop", "Hip-Hop"]),
            &strings(&["2010s", "2020s"]),
        );

        assert_eq!(
            query,
            "genre:\"Pop\" OR genre:\"Hip-Hop\" year:2010-2019 OR year:2020-2029"
        );
    }

    #[test]
    fn decades_only_has_no_genre_clause() {
        assert_eq!(build_query(&[], &strings(&["1960s"])), "year:1960-1969");
    }

    #[test]
    fn unparsable_decade_maps_to_empty_range() {
        assert_eq!(decade_to_range("sixties"), "");
        assert_eq!(decade_to_range("80s"), "");
        assert_eq!(decade_start("2000s"), Some(2000));
    }

    #[test]
    fn decade_labels_start_on_a_round_year() {
        assert!(is_decade("1990s"));
        assert!(is_decade("2000s"));
        assert!(!is_decade("1995s"));
        assert!(!is_decade("90s"));
        assert!(!is_decade("1990"));
        assert!(!is_decade("199xs"));
        assert!(!is_decade("1990é"));
    }
}
