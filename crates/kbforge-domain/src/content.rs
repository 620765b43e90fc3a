//! Content module - externally owned items and collections the pipeline reads

use std::fmt;

/// Identifier of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionId(pub i64);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A user-authored idea
    Idea,

    /// An external knowledge source (article, document, page)
    KnowledgeSource,
}

impl ContentKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Idea => "idea",
            ContentKind::KnowledgeSource => "knowledge_source",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "idea" => Some(ContentKind::Idea),
            "knowledge_source" | "source" => Some(ContentKind::KnowledgeSource),
            _ => None,
        }
    }
}

/// Kind of collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// A group of ideas
    Group,

    /// A domain of knowledge sources
    Domain,
}

impl CollectionKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Group => "group",
            CollectionKind::Domain => "domain",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "group" => Some(CollectionKind::Group),
            "domain" => Some(CollectionKind::Domain),
            _ => None,
        }
    }
}

/// A piece of free text fed to the extraction pipeline
///
/// Owned by the content store; read-only to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Unique identifier
    pub id: ItemId,

    /// Idea or knowledge source
    pub kind: ContentKind,

    /// Display title
    pub title: String,

    /// Full text to extract relations from
    pub text: String,

    /// Where the text came from, if anywhere
    pub url: Option<String>,

    /// Publication date as recorded by the content store
    pub publish_date: String,
}

impl ContentItem {
    /// Create an item with no URL
    pub fn new(
        id: ItemId,
        kind: ContentKind,
        title: impl Into<String>,
        text: impl Into<String>,
        publish_date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            text: text.into(),
            url: None,
            publish_date: publish_date.into(),
        }
    }

    /// Attach a source URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// An ordered group of content items
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Unique identifier
    pub id: CollectionId,

    /// Group or domain
    pub kind: CollectionKind,

    /// Display name
    pub name: String,

    /// Member item ids, in collection order
    pub members: Vec<ItemId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [ContentKind::Idea, ContentKind::KnowledgeSource] {
            assert_eq!(ContentKind::parse(kind.as_str()), Some(kind));
        }
        for kind in [CollectionKind::Group, CollectionKind::Domain] {
            assert_eq!(CollectionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ContentKind::parse("artifact"), None);
    }

    #[test]
    fn test_item_builder() {
        let item = ContentItem::new(ItemId(3), ContentKind::Idea, "t", "body", "2024-01-01")
            .with_url("https://example.org");
        assert_eq!(item.url.as_deref(), Some("https://example.org"));
        assert_eq!(item.id.to_string(), "3");
    }
}
