//! Label normalisation and sibling-name collision resolution.

/// Lookup key for a field label: lower-case, spaces become underscores.
///
/// `"Initial Leg Count"` → `"initial_leg_count"`.
pub fn methodize(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Display form of a field label: underscores become spaces and every word
/// starts with an upper-case letter. The rest of each word is kept as is.
///
/// `"initial_leg_count"` → `"Initial Leg Count"`.
pub fn wordify(label: &str) -> String {
    label
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Next candidate name after a collision.
///
/// The trailing run of ASCII digits is parsed and incremented in place; a
/// name without trailing digits gets `_1` appended.
///
/// ```rust
/// use qexplorer_model::naming::increment_name;
///
/// assert_eq!(increment_name("Mode"), "Mode_1");
/// assert_eq!(increment_name("Mode_1"), "Mode_2");
/// assert_eq!(increment_name("Term_9"), "Term_10");
/// ```
pub fn increment_name(name: &str) -> String {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    if digits.is_empty() {
        return format!("{name}_1");
    }
    match digits.parse::<u128>() {
        Ok(n) => format!("{stem}{}", n + 1),
        // Absurdly long digit runs: keep them and start a fresh counter.
        Err(_) => format!("{name}_1"),
    }
}

/// Resolve `proposed` against `taken` by repeated [`increment_name`].
pub fn unique_name<'a, I>(proposed: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<&str> = taken.into_iter().collect();
    let mut name = proposed.to_string();
    while taken.contains(&name.as_str()) {
        name = increment_name(&name);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methodize() {
        assert_eq!(methodize("Initial Leg Count"), "initial_leg_count");
        assert_eq!(methodize("Mode 1"), "mode_1");
        assert_eq!(methodize("name"), "name");
    }

    #[test]
    fn test_wordify() {
        assert_eq!(wordify("initial_leg_count"), "Initial Leg Count");
        assert_eq!(wordify("Phase Degrees"), "Phase Degrees");
        assert_eq!(wordify("mode_2"), "Mode 2");
    }

    #[test]
    fn test_increment_name() {
        assert_eq!(increment_name("Mode"), "Mode_1");
        assert_eq!(increment_name("Mode_1"), "Mode_2");
        assert_eq!(increment_name("Term_9"), "Term_10");
        assert_eq!(increment_name("Step 3"), "Step 4");
    }

    #[test]
    fn test_increment_only_touches_trailing_digits() {
        // The digit run is replaced at the end of the name only.
        assert_eq!(increment_name("q1_1"), "q1_2");
        assert_eq!(increment_name("11"), "12");
    }

    #[test]
    fn test_unique_name() {
        let taken = ["Mode", "Mode_1", "Mode_2"];
        assert_eq!(unique_name("Mode", taken), "Mode_3");
        assert_eq!(unique_name("Cavity", taken), "Cavity");
    }
}
