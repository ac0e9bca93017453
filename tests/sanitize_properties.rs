//! Filename sanitizer properties.

use proptest::prelude::*;

use paperdigest::crawler::{safe_filename, MAX_STEM_CHARS};

const HREF: &str = "https://huggingface.co/papers/2403.01234";

fn stem(name: &str) -> &str {
    name.strip_suffix(".pdf").expect("always a .pdf name")
}

fn is_clean(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ')
}

proptest! {
    #[test]
    fn only_disallowed_characters_fall_back_to_href(title in r"[!-,/:-@\[\]^`{-~]{1,40}") {
        prop_assert_eq!(safe_filename(&title, HREF), "2403.01234.pdf");
    }

    #[test]
    fn long_titles_are_cut_to_the_stem_limit(title in "[a-zA-Z0-9]{201,400}") {
        let name = safe_filename(&title, HREF);
        prop_assert_eq!(stem(&name).chars().count(), MAX_STEM_CHARS);
    }

    #[test]
    fn output_is_a_clean_pdf_name(
        title in any::<String>(),
        href in "https://[a-z.]{1,10}/papers/[ -~]{0,30}",
    ) {
        let name = safe_filename(&title, &href);
        prop_assert!(name.ends_with(".pdf"));
        prop_assert!(stem(&name).chars().all(is_clean), "disallowed char in {:?}", name);
        prop_assert!(stem(&name).chars().count() <= MAX_STEM_CHARS);
    }

    #[test]
    fn href_fallback_is_clean(href in "https://[a-z.]{1,10}/papers/[ -~]{0,300}") {
        let name = safe_filename("", &href);
        prop_assert!(name.ends_with(".pdf"));
        prop_assert!(stem(&name).chars().all(is_clean), "disallowed char in {:?}", name);
        prop_assert!(stem(&name).chars().count() <= MAX_STEM_CHARS);
    }
}
