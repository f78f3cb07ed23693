//! `lopdf`-backed implementation of the page split/merge primitives.

use lopdf::{Dictionary, Document, Object, ObjectId};
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::pages::PageEngine;
use std::collections::BTreeMap;
use std::io::Write;

/// Splits and merges PDF documents page by page.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageEngine;

impl LopdfPageEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PageEngine for LopdfPageEngine {
    fn split(&self, document: &[u8]) -> Result<Vec<Vec<u8>>> {
        let source = Document::load_mem(document)
            .map_err(|err| ScanBotError::page_engine(format!("Failed to load PDF: {err}")))?;
        let total = source.get_pages().len() as u32;

        let mut pages = Vec::with_capacity(total as usize);
        for number in 1..=total {
            let mut page = source.clone();
            let others: Vec<u32> = (1..=total).filter(|other| *other != number).collect();
            page.delete_pages(&others);
            page.prune_objects();

            let mut buffer = Vec::new();
            page.save_to(&mut buffer).map_err(|err| {
                ScanBotError::page_engine(format!("Failed to write page {number}: {err}"))
            })?;
            pages.push(buffer);
        }

        tracing::debug!("[PdfEngine] Split document into {} page(s)", pages.len());
        Ok(pages)
    }

    fn merge(&self, pages: &[Vec<u8>], out: &mut dyn Write) -> Result<()> {
        let mut merged = merge_documents(pages)?;
        let mut writer = out;
        merged
            .save_to(&mut writer)
            .map_err(|err| ScanBotError::page_engine(format!("Failed to write PDF: {err}")))?;
        Ok(())
    }
}

/// Concatenates documents into a single page tree, keeping input order.
fn merge_documents(inputs: &[Vec<u8>]) -> Result<Document> {
    if inputs.is_empty() {
        return Err(ScanBotError::page_engine("Nothing to merge"));
    }

    let mut max_id = 1;
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for input in inputs {
        let mut document = Document::load_mem(input)
            .map_err(|err| ScanBotError::page_engine(format!("Failed to load page: {err}")))?;
        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        for (_, page_id) in document.get_pages() {
            let page = detached_page(&document, page_id)?;
            page_objects.push((page_id, Object::Dictionary(page)));
        }
        objects.extend(document.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut page_tree: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        let kind = type_name(&object).map(<[u8]>::to_vec);
        match kind.as_deref() {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    if let Object::Dictionary(dictionary) = object {
                        catalog = Some((object_id, dictionary));
                    }
                }
            }
            Some(b"Pages") => {
                if page_tree.is_none() {
                    if let Object::Dictionary(dictionary) = object {
                        page_tree = Some((object_id, dictionary));
                    }
                }
            }
            // Pages are re-parented below; outlines would point into dropped trees.
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (catalog_id, mut catalog) =
        catalog.ok_or_else(|| ScanBotError::page_engine("No document catalog found"))?;
    let (tree_id, mut tree) =
        page_tree.ok_or_else(|| ScanBotError::page_engine("No page tree found"))?;

    let mut kids = Vec::with_capacity(page_objects.len());
    for (page_id, page) in page_objects {
        if let Object::Dictionary(mut dictionary) = page {
            dictionary.set("Parent", Object::Reference(tree_id));
            merged.objects.insert(page_id, Object::Dictionary(dictionary));
            kids.push(Object::Reference(page_id));
        }
    }

    tree.set("Count", Object::Integer(kids.len() as i64));
    tree.set("Kids", Object::Array(kids));
    merged.objects.insert(tree_id, Object::Dictionary(tree));

    catalog.set("Pages", Object::Reference(tree_id));
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = merged.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}

/// Page attributes a page may take from an ancestor `/Pages` node.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 32;

/// Copy of the page dictionary with inherited attributes made explicit, so it
/// stays complete once its own page tree is dropped.
fn detached_page(document: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = document
        .get_dictionary(page_id)
        .map_err(|err| ScanBotError::page_engine(format!("Missing page object: {err}")))?
        .clone();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        if depth == MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = document.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Ok(page)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dictionary = object.as_dict().ok()?;
    dictionary.get(b"Type").ok()?.as_name().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Builds a PDF whose page `i` has MediaBox width `base + i`.
    fn sample_pdf(base: i64, pages: usize) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let tree_id = document.new_object_id();

        let mut kids = Vec::new();
        for index in 0..pages {
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => tree_id,
                "MediaBox" => vec![0.into(), 0.into(), (base + index as i64).into(), 100.into()],
            });
            kids.push(Object::Reference(page_id));
        }

        document.objects.insert(
            tree_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => tree_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        document.save_to(&mut buffer).unwrap();
        buffer
    }

    /// Builds a PDF whose pages carry no MediaBox of their own and inherit
    /// one of width `width` from the page tree.
    fn inherited_pdf(width: i64, pages: usize) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let tree_id = document.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                Object::Reference(document.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => tree_id,
                }))
            })
            .collect();

        document.objects.insert(
            tree_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), 100.into()],
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => tree_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        document.save_to(&mut buffer).unwrap();
        buffer
    }

    /// MediaBox widths of every page, in page order.
    fn page_widths(pdf: &[u8]) -> Vec<i64> {
        let document = Document::load_mem(pdf).unwrap();
        document
            .get_pages()
            .values()
            .map(|page_id| {
                let page = document.get_dictionary(*page_id).unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_split_yields_single_pages_in_order() {
        let engine = LopdfPageEngine::new();
        let pages = engine.split(&sample_pdf(100, 3)).unwrap();

        assert_eq!(pages.len(), 3);
        for (index, page) in pages.iter().enumerate() {
            assert_eq!(page_widths(page), vec![100 + index as i64]);
        }
    }

    #[test]
    fn test_merge_preserves_given_order() {
        let engine = LopdfPageEngine::new();
        let front = engine.split(&sample_pdf(100, 2)).unwrap();
        let rear = engine.split(&sample_pdf(200, 2)).unwrap();
        let ordered = vec![
            front[0].clone(),
            rear[1].clone(),
            front[1].clone(),
            rear[0].clone(),
        ];

        let mut out = Vec::new();
        engine.merge(&ordered, &mut out).unwrap();

        assert_eq!(page_widths(&out), vec![100, 201, 101, 200]);
    }

    #[test]
    fn test_merge_keeps_inherited_page_attributes() {
        let engine = LopdfPageEngine::new();
        let front = engine.split(&inherited_pdf(300, 2)).unwrap();
        let rear = engine.split(&inherited_pdf(400, 2)).unwrap();
        let ordered = vec![
            front[0].clone(),
            rear[1].clone(),
            front[1].clone(),
            rear[0].clone(),
        ];

        let mut out = Vec::new();
        engine.merge(&ordered, &mut out).unwrap();

        assert_eq!(page_widths(&out), vec![300, 400, 300, 400]);
    }

    #[test]
    fn test_split_rejects_garbage() {
        let engine = LopdfPageEngine::new();
        let err = engine.split(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ScanBotError::PageEngine(_)));
    }

    #[test]
    fn test_merge_rejects_empty_input() {
        let mut out = Vec::new();
        assert!(LopdfPageEngine::new().merge(&[], &mut out).is_err());
        assert!(out.is_empty());
    }
}
