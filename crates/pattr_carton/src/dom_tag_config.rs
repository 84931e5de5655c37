//! HTML tag tables used by the tokenizer, the serializer and the built-in
//! directives.

use phf::phf_set;

/// Elements that never have children and have no closing tag
pub static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr"
};

/// Elements whose content is raw text up to the matching close tag
pub static RAW_TEXT_TAGS: phf::Set<&'static str> = phf_set! {
    "script", "style", "textarea", "title"
};

/// Elements whose `value` property is bound by `p-model`
pub static FORM_VALUE_TAGS: phf::Set<&'static str> = phf_set! {
    "input", "textarea", "select"
};

/// Check if a tag is a void element
#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

/// Check if a tag holds raw text
#[inline]
pub fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.contains(tag)
}

/// Check if a tag carries a form value
#[inline]
pub fn is_form_value_tag(tag: &str) -> bool {
    FORM_VALUE_TAGS.contains(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("input"));
        assert!(is_void_tag("br"));
        assert!(!is_void_tag("div"));
    }

    #[test]
    fn test_raw_text_tags() {
        assert!(is_raw_text_tag("script"));
        assert!(!is_raw_text_tag("span"));
    }
}
