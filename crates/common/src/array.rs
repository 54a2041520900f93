//! Slice containment checks

/// Whether `needle` is an element of `haystack`
pub fn contains<T: PartialEq>(haystack: &[T], needle: &T) -> bool {
    haystack.iter().any(|item| item == needle)
}

/// Whether every element of `needles` is in `haystack`
pub fn contains_all<T: PartialEq>(haystack: &[T], needles: &[T]) -> bool {
    needles.iter().all(|needle| contains(haystack, needle))
}

/// Whether `haystack` contains all of `needles` and at least one other element
pub fn contains_more_than<T: PartialEq>(haystack: &[T], needles: &[T]) -> bool {
    contains_all(haystack, needles) && haystack.iter().any(|item| !contains(needles, item))
}
