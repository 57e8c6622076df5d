//! Key-name transformations applied to document keys before field lookup.

/// Converts a `snake_case` document key into `camelCase`.
///
/// - Every underscore-delimited segment after the first is capitalized and the
///   underscores between segments are dropped; the first segment is lowercased.
/// - Runs of leading and trailing underscores are preserved verbatim.
/// - A key with a single segment is returned unchanged (it may already be camel case).
///
/// ```
/// use tree_decoder::key::convert_from_snake_case;
///
/// assert_eq!(convert_from_snake_case("one_two_three"), "oneTwoThree");
/// assert_eq!(convert_from_snake_case("_one_two_three_"), "_oneTwoThree_");
/// assert_eq!(convert_from_snake_case("alreadyCamel"), "alreadyCamel");
/// ```
#[must_use]
pub fn convert_from_snake_case(key: &str) -> String {
    let Some(start) = key.find(|c| c != '_') else {
        // Empty, or nothing but underscores.
        return key.to_owned();
    };
    // `start` points at a non-underscore, so a last one exists too.
    let end = key.rfind(|c| c != '_').map_or(key.len(), |i| {
        i + key[i..].chars().next().map_or(0, char::len_utf8)
    });

    let (leading, rest) = key.split_at(start);
    let (body, trailing) = rest.split_at(end - start);

    let mut segments = body.split('_').filter(|s| !s.is_empty());
    let Some(first) = segments.next() else {
        return key.to_owned();
    };
    let remaining: Vec<&str> = segments.collect();
    if remaining.is_empty() {
        return key.to_owned();
    }

    let mut converted = String::with_capacity(key.len());
    converted.push_str(leading);
    converted.push_str(&first.to_lowercase());
    for segment in remaining {
        converted.push_str(&capitalize(segment));
    }
    converted.push_str(trailing);
    converted
}

/// Uppercases the first character of `word` and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}
