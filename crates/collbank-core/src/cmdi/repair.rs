//! Reconcile a stored CMDI document with its VLO item record.
//!
//! Each step below is idempotent on its own, so `repair(repair(x))` equals
//! `repair(x)`. Steps that cannot run are reported as warnings; only an
//! unreadable or malformed document fails the whole operation.

use super::tree::{Element, XmlDocument};
use crate::config::CmdiConfig;
use crate::error::{CollbankError, Result};
use crate::model::VloItem;
use crate::store::CatalogueStore;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where the document comes from.
#[derive(Debug, Clone)]
pub enum XmlSource {
    Path(PathBuf),
    Text(String),
    Bytes(Vec<u8>),
}

impl XmlSource {
    pub(crate) fn load(self) -> Result<String> {
        match self {
            XmlSource::Text(text) => Ok(text),
            XmlSource::Path(path) => {
                std::fs::read_to_string(&path).map_err(|e| CollbankError::io_with_path(e, path))
            }
            XmlSource::Bytes(bytes) => String::from_utf8(bytes).map_err(|e| CollbankError::XmlParse {
                message: format!("document is not valid UTF-8: {}", e),
                position: e.utf8_error().valid_up_to() as u64,
            }),
        }
    }
}

/// Result of [`repair`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    pub xml: String,
    /// The document tree was modified.
    pub changed: bool,
    /// The item's title was filled from the document; the caller persists it.
    pub item_changed: bool,
    pub warnings: Vec<String>,
}

/// Component shapes that carry a title, with the title's local name.
const TITLE_SHAPES: &[(&str, &str)] = &[
    ("OralHistoryInterviewCRF", "Title"),
    ("CorpusCollection_CSD", "title"),
    (CmdiConfig::COMPONENT_NAME, "title"),
];

/// Canonical resource types: lowercase key, canonical spelling, id prefix.
const PROXY_TYPES: &[(&str, &str, &str)] = &[
    ("landingpage", "LandingPage", "lp"),
    ("searchpage", "SearchPage", "sp"),
    ("resource", "Resource", "res"),
];
const OTHER_TYPE: (&str, &str) = ("Other", "oth");

/// Build a name in the same namespace prefix as `parent`.
fn qualified(parent: &Element, local: &str) -> String {
    match parent.name.rsplit_once(':') {
        Some((prefix, _)) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

fn ensure_version(root: &mut Element) -> bool {
    if root.attr(CmdiConfig::VERSION_ATTRIBUTE).is_some() {
        return false;
    }
    root.set_attr(CmdiConfig::VERSION_ATTRIBUTE, CmdiConfig::VERSION);
    true
}

fn ensure_self_link(root: &mut Element, self_link: &str) -> bool {
    if root.child("Header").is_none() {
        let name = qualified(root, "Header");
        root.insert_element(0, Element::new(name));
    }
    let Some(header) = root.child_mut("Header") else {
        return false;
    };

    if let Some(link) = header.child_mut("MdSelfLink") {
        if link.text() == self_link {
            return false;
        }
        link.set_text(self_link);
        return true;
    }

    let link = Element::with_text(qualified(header, "MdSelfLink"), self_link);
    let before_profile = header
        .elements()
        .position(|el| el.is("MdProfile"));
    match before_profile {
        Some(index) => header.insert_element(index, link),
        None => header.push(link),
    }
    true
}

/// Returns `(tree_changed, item_changed)`.
fn reconcile_title(root: &mut Element, item: &mut VloItem) -> (bool, bool) {
    let Some(components) = root.child_mut("Components") else {
        return (false, false);
    };
    let shape = TITLE_SHAPES
        .iter()
        .copied()
        .find(|(shape, _)| components.child(shape).is_some());
    let Some((component, title_name)) =
        shape.and_then(|(shape, title)| components.child_mut(shape).map(|c| (c, title)))
    else {
        debug!("No titled component in document for item {:?}", item.id);
        return (false, false);
    };

    let xml_title = component
        .child(title_name)
        .map(|el| el.text())
        .unwrap_or_default();
    let db_title = item.title.trim().to_string();

    match (db_title.is_empty(), xml_title.is_empty()) {
        (true, false) => {
            item.title = xml_title;
            (false, true)
        }
        (false, true) => {
            match component.child_mut(title_name) {
                Some(title) => title.set_text(db_title),
                None => {
                    let index = if component.child("ID").is_some() { 1 } else { 0 };
                    let title = Element::with_text(qualified(component, title_name), db_title);
                    component.insert_element(index, title);
                }
            }
            (true, false)
        }
        _ => {
            if db_title != xml_title {
                debug!(
                    "Title of item {:?} differs from its document; keeping both",
                    item.id
                );
            }
            (false, false)
        }
    }
}

/// Proposed changes for one proxy; `None` means already correct.
#[derive(Debug, Default)]
struct ProxyFix {
    mimetype: Option<String>,
    resource_type: Option<String>,
    id: Option<String>,
}

impl ProxyFix {
    fn is_noop(&self) -> bool {
        self.mimetype.is_none() && self.resource_type.is_none() && self.id.is_none()
    }
}

fn canonical_type(raw: &str) -> (&'static str, &'static str) {
    let key = raw.trim().to_lowercase();
    PROXY_TYPES
        .iter()
        .find(|(lower, _, _)| *lower == key)
        .map(|(_, canonical, abbr)| (*canonical, *abbr))
        .unwrap_or(OTHER_TYPE)
}

/// Canonical proxy id for an item.
pub fn proxy_id(type_abbr: &str, item_abbr: &str, item_id: i64) -> String {
    format!("{}_{}metadata_{:05}", type_abbr, item_abbr, item_id)
}

fn plan_proxy(proxy: &Element, item_abbr: &str, item_id: i64) -> ProxyFix {
    let mut fix = ProxyFix::default();
    let (raw_type, mimetype) = match proxy.child("ResourceType") {
        Some(rt) => (rt.text(), rt.attr("mimetype").unwrap_or("").trim().to_string()),
        None => (String::new(), String::new()),
    };

    if mimetype.is_empty() {
        fix.mimetype = Some(CmdiConfig::DEFAULT_MIMETYPE.to_string());
    }
    let (canonical, abbr) = canonical_type(&raw_type);
    if raw_type != canonical {
        fix.resource_type = Some(canonical.to_string());
    }
    let id = proxy_id(abbr, item_abbr, item_id);
    if proxy.attr("id") != Some(id.as_str()) {
        fix.id = Some(id);
    }
    fix
}

fn apply_proxy(proxy: &mut Element, fix: ProxyFix) {
    if let Some(id) = fix.id {
        proxy.set_attr("id", id);
    }
    if proxy.child("ResourceType").is_none() {
        let name = qualified(proxy, "ResourceType");
        proxy.insert_element(0, Element::new(name));
    }
    if let Some(rt) = proxy.child_mut("ResourceType") {
        if let Some(mimetype) = fix.mimetype {
            rt.set_attr("mimetype", mimetype);
        }
        if let Some(resource_type) = fix.resource_type {
            rt.set_text(resource_type);
        }
    }
}

fn normalize_proxies(root: &mut Element, item: &VloItem) -> Result<bool> {
    let Some(list) = root.find_mut(&["Resources", "ResourceProxyList"]) else {
        return Ok(false);
    };
    let item_id = item.id.ok_or_else(|| {
        CollbankError::validation("id", "unsaved item; resource proxies left unchanged")
    })?;

    let fixes: Vec<ProxyFix> = list
        .elements()
        .filter(|el| el.is("ResourceProxy"))
        .map(|proxy| plan_proxy(proxy, &item.abbr, item_id))
        .collect();
    if fixes.iter().all(ProxyFix::is_noop) {
        return Ok(false);
    }

    let proxies = list.elements_mut().filter(|el| el.is("ResourceProxy"));
    for (proxy, fix) in proxies.zip(fixes) {
        apply_proxy(proxy, fix);
    }
    Ok(true)
}

/// Repair a CMDI document against `item`.
///
/// A malformed or unreadable document is an error; everything else is
/// best effort with problems collected in [`RepairOutcome::warnings`].
pub fn repair(
    source: XmlSource,
    item: &mut VloItem,
    self_link: Option<&str>,
) -> Result<RepairOutcome> {
    let text = source.load()?;
    let mut doc = XmlDocument::parse(&text)?;
    let mut outcome = RepairOutcome::default();
    let root = &mut doc.root;

    outcome.changed |= ensure_version(root);

    if let Some(link) = self_link.map(str::trim).filter(|l| !l.is_empty()) {
        outcome.changed |= ensure_self_link(root, link);
    }

    let (tree_changed, item_changed) = reconcile_title(root, item);
    outcome.changed |= tree_changed;
    outcome.item_changed = item_changed;

    match normalize_proxies(root, item) {
        Ok(changed) => outcome.changed |= changed,
        Err(e) => {
            warn!("Proxy normalization skipped for item {}: {}", item.abbr, e);
            outcome.warnings.push(format!("proxy normalization: {}", e));
        }
    }

    outcome.xml = doc.to_xml_string()?;
    Ok(outcome)
}

impl CatalogueStore {
    /// Repair the stored document of a VLO item and save the result when
    /// either the document or the item changed.
    pub fn repair_item(&self, item_id: i64, self_link: Option<&str>) -> Result<RepairOutcome> {
        let mut item = self.get_vlo_item(item_id)?;
        let outcome = repair(
            XmlSource::Text(item.xmlcontent.clone()),
            &mut item,
            self_link,
        )?;

        // a re-serialized but otherwise untouched document is not saved
        if outcome.changed || outcome.item_changed {
            item.xmlcontent = outcome.xml.clone();
            self.save_vlo_item(&mut item)?;
            info!(
                "Repaired VLO item {} (tree changed: {}, title copied: {})",
                item_id, outcome.changed, outcome.item_changed
            );
        }
        Ok(outcome)
    }
}
