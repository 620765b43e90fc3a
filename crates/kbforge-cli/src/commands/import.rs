//! Import command implementation.

use crate::cli::ImportArgs;
use crate::commands::open_store;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kbforge_domain::traits::ContentStore;
use kbforge_domain::{Collection, CollectionId, CollectionKind, ContentItem, ContentKind, ItemId};
use kbforge_store::SqliteStore;
use serde::Deserialize;
use std::fs;

/// Content file accepted by `kbforge import`.
///
/// ```json
/// {
///   "items": [{"id": 1, "kind": "idea", "title": "Paris", "text": "...", "publish_date": "2024-01-01"}],
///   "collections": [{"id": 10, "kind": "group", "name": "capitals", "members": [1]}]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ImportFile {
    /// Items to insert
    #[serde(default)]
    pub items: Vec<ItemRecord>,

    /// Collections to insert
    #[serde(default)]
    pub collections: Vec<CollectionRecord>,
}

/// One content item in an import file.
#[derive(Debug, Deserialize)]
pub struct ItemRecord {
    /// Item id
    pub id: i64,
    /// `idea` or `knowledge_source`
    #[serde(default = "default_item_kind")]
    pub kind: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Text to extract from
    pub text: String,
    /// Source URL
    #[serde(default)]
    pub url: Option<String>,
    /// Publication date
    #[serde(default)]
    pub publish_date: String,
}

/// One collection in an import file.
#[derive(Debug, Deserialize)]
pub struct CollectionRecord {
    /// Collection id
    pub id: i64,
    /// `group` or `domain`
    #[serde(default = "default_collection_kind")]
    pub kind: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Member item ids, in order
    #[serde(default)]
    pub members: Vec<i64>,
}

fn default_item_kind() -> String {
    ContentKind::Idea.as_str().to_string()
}

fn default_collection_kind() -> String {
    CollectionKind::Group.as_str().to_string()
}

impl ItemRecord {
    fn into_item(self) -> Result<ContentItem> {
        let kind = ContentKind::parse(&self.kind).ok_or_else(|| {
            CliError::InvalidInput(format!("item {}: unknown kind '{}'", self.id, self.kind))
        })?;
        let item = ContentItem::new(ItemId(self.id), kind, self.title, self.text, self.publish_date);
        Ok(match self.url {
            Some(url) => item.with_url(url),
            None => item,
        })
    }
}

impl CollectionRecord {
    fn into_collection(self) -> Result<Collection> {
        let kind = CollectionKind::parse(&self.kind).ok_or_else(|| {
            CliError::InvalidInput(format!("collection {}: unknown kind '{}'", self.id, self.kind))
        })?;
        Ok(Collection {
            id: CollectionId(self.id),
            kind,
            name: self.name,
            members: self.members.into_iter().map(ItemId).collect(),
        })
    }
}

/// Insert every item, then every collection.
///
/// The whole file is checked first, so a bad kind or an id that already
/// exists leaves the store untouched. Returns `(items, collections)` inserted.
pub fn import_content(store: &mut SqliteStore, file: ImportFile) -> Result<(usize, usize)> {
    let items = file
        .items
        .into_iter()
        .map(ItemRecord::into_item)
        .collect::<Result<Vec<_>>>()?;
    let collections = file
        .collections
        .into_iter()
        .map(CollectionRecord::into_collection)
        .collect::<Result<Vec<_>>>()?;

    let mut existing = Vec::new();
    for item in &items {
        if store.get_item(item.id)?.is_some() {
            existing.push(format!("item {}", item.id));
        }
    }
    for collection in &collections {
        if store.get_collection(collection.id)?.is_some() {
            existing.push(format!("collection {}", collection.id));
        }
    }
    if !existing.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "already imported: {}",
            existing.join(", ")
        )));
    }

    for item in &items {
        store.insert_item(item)?;
    }
    for collection in &collections {
        store.insert_collection(collection)?;
    }

    tracing::info!(
        "Imported {} items and {} collections",
        items.len(),
        collections.len()
    );
    Ok((items.len(), collections.len()))
}

/// Execute the import command.
pub fn execute_import(args: ImportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let contents = fs::read_to_string(&args.file)?;
    let file: ImportFile = serde_json::from_str(&contents)?;

    let mut store = open_store(config)?;
    let (items, collections) = import_content(&mut store, file)?;

    if !formatter.is_quiet() {
        println!("{}", formatter.imported(items, collections));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"{
        "items": [
            {"id": 1, "title": "Paris", "text": "Paris is the capital of France", "publish_date": "2024-01-01"},
            {"id": 2, "kind": "knowledge_source", "text": "Berlin is in Germany", "url": "https://example.org/berlin"}
        ],
        "collections": [
            {"id": 10, "kind": "domain", "name": "geography", "members": [2, 1]}
        ]
    }"#;

    fn parse(json: &str) -> ImportFile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_import_items_and_collections() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        assert_eq!(import_content(&mut store, parse(FILE)).unwrap(), (2, 1));

        let berlin = store.get_item(ItemId(2)).unwrap().unwrap();
        assert_eq!(berlin.kind, ContentKind::KnowledgeSource);
        assert_eq!(berlin.url.as_deref(), Some("https://example.org/berlin"));

        let paris = store.get_item(ItemId(1)).unwrap().unwrap();
        assert_eq!(paris.kind, ContentKind::Idea);

        let collection = store.get_collection(CollectionId(10)).unwrap().unwrap();
        assert_eq!(collection.kind, CollectionKind::Domain);
        assert_eq!(collection.members, vec![ItemId(2), ItemId(1)]);
    }

    #[test]
    fn test_reimport_rejected_without_changes() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        import_content(&mut store, parse(FILE)).unwrap();

        let again = r#"{"items": [
            {"id": 3, "text": "new"},
            {"id": 1, "text": "clash"}
        ]}"#;
        match import_content(&mut store, parse(again)) {
            Err(CliError::InvalidInput(msg)) => assert!(msg.contains("item 1")),
            other => panic!("Expected InvalidInput error, got {:?}", other),
        }
        assert!(store.get_item(ItemId(3)).unwrap().is_none());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let file = parse(r#"{"items": [{"id": 1, "kind": "artifact", "text": "x"}]}"#);
        assert!(matches!(
            import_content(&mut store, file),
            Err(CliError::InvalidInput(_))
        ));
        assert!(store.get_item(ItemId(1)).unwrap().is_none());
    }

    #[test]
    fn test_empty_file() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        assert_eq!(import_content(&mut store, parse("{}")).unwrap(), (0, 0));
    }
}
