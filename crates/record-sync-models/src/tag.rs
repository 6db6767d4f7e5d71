use serde::{Deserialize, Serialize};

/// Which Discogs list a record came from. No other values originate on the
/// source side; anything else found in the destination is treated as a
/// malformed page by the snapshot reader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Collection,
    Wish,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Collection => "collection",
            Tag::Wish => "wish",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "collection" => Some(Tag::Collection),
            "wish" => Some(Tag::Wish),
            _ => None,
        }
    }

    pub fn color(&self) -> &'static str {
        tag_color(self.name())
    }
}

/// Select-option color for a tag name. Total over arbitrary names:
/// `collection` is green, `wish` is purple, everything else is blue.
pub fn tag_color(name: &str) -> &'static str {
    match name {
        "collection" => "green",
        "wish" => "purple",
        _ => "blue",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_color_mapping() {
        assert_eq!(tag_color("collection"), "green");
        assert_eq!(tag_color("wish"), "purple");
        assert_eq!(tag_color("listening"), "blue");
        assert_eq!(tag_color(""), "blue");
    }

    #[test]
    fn test_tag_color_is_deterministic() {
        assert_eq!(tag_color("collection"), tag_color("collection"));
        assert_eq!(Tag::Collection.color(), "green");
        assert_eq!(Tag::Wish.color(), "purple");
    }

    #[test]
    fn test_tag_name_round_trip() {
        assert_eq!(Tag::from_name(Tag::Collection.name()), Some(Tag::Collection));
        assert_eq!(Tag::from_name(Tag::Wish.name()), Some(Tag::Wish));
        assert_eq!(Tag::from_name("favourites"), None);
    }
}
