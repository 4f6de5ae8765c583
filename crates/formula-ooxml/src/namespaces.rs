//! Namespace and tag registry.
//!
//! Tags are carried as [`QName`]s (namespace URI + local name). The registry maps short aliases
//! (`r`, `mc`, `v`, ...) to URIs so callers can write `registry.qualify("r", "id")` and so the
//! XML writer can pick prefixes when emitting a tree.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub const SHEET_MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const SHEET_DRAWING_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub const VML_NS: &str = "urn:schemas-microsoft-com:vml";
pub const OFFICE_NS: &str = "urn:schemas-microsoft-com:office:office";
pub const EXCEL_NS: &str = "urn:schemas-microsoft-com:office:excel";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Aliases registered by [`NamespaceRegistry::default`].
const WELL_KNOWN: &[(&str, &str)] = &[
    ("main", SHEET_MAIN_NS),
    ("r", REL_NS),
    ("pr", PKG_REL_NS),
    ("mc", MC_NS),
    ("a", DRAWING_NS),
    ("xdr", SHEET_DRAWING_NS),
    ("v", VML_NS),
    ("o", OFFICE_NS),
    ("x", EXCEL_NS),
    ("xml", XML_NS),
];

/// A namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub ns: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(ns: Option<&str>, local: &str) -> Self {
        Self {
            ns: ns.map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn local(local: &str) -> Self {
        Self::new(None, local)
    }

    /// Parse Clark notation (`{uri}local`) or a bare local name.
    pub fn from_clark(tag: &str) -> Self {
        match tag.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            Some((ns, local)) => Self::new(Some(ns), local),
            None => Self::local(tag),
        }
    }

    pub fn matches(&self, ns: Option<&str>, local: &str) -> bool {
        self.local == local && self.ns.as_deref() == ns
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.ns {
            write!(f, "{{{}}}{}", ns, self.local)
        } else {
            f.write_str(&self.local)
        }
    }
}

/// Strip the namespace from a qualified tag (`{uri}local`, `prefix:local`, or `local`).
pub fn localname(tag: &str) -> &str {
    if let Some((_, local)) = tag.rsplit_once('}') {
        return local;
    }
    tag.rsplit_once(':').map(|(_, local)| local).unwrap_or(tag)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("unknown namespace alias `{0}`")]
    UnknownAlias(String),
    #[error("alias `{alias}` is already bound to `{existing}`")]
    AliasConflict { alias: String, existing: String },
}

/// Alias <-> URI table used for building qualified names and for choosing prefixes on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    by_alias: BTreeMap<String, String>,
    by_uri: BTreeMap<String, String>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (alias, uri) in WELL_KNOWN {
            registry.insert(alias, uri);
        }
        registry
    }
}

impl NamespaceRegistry {
    pub fn empty() -> Self {
        Self {
            by_alias: BTreeMap::new(),
            by_uri: BTreeMap::new(),
        }
    }

    fn insert(&mut self, alias: &str, uri: &str) {
        self.by_alias.insert(alias.to_string(), uri.to_string());
        // First alias registered for a URI is the one used on output.
        self.by_uri
            .entry(uri.to_string())
            .or_insert_with(|| alias.to_string());
    }

    /// Bind `alias` to `uri`. Re-registering the same pair is a no-op; rebinding an alias to a
    /// different URI is rejected.
    pub fn register(&mut self, alias: &str, uri: &str) -> Result<(), NamespaceError> {
        if let Some(existing) = self.by_alias.get(alias) {
            if existing == uri {
                return Ok(());
            }
            return Err(NamespaceError::AliasConflict {
                alias: alias.to_string(),
                existing: existing.clone(),
            });
        }
        self.insert(alias, uri);
        Ok(())
    }

    pub fn uri(&self, alias: &str) -> Option<&str> {
        self.by_alias.get(alias).map(String::as_str)
    }

    pub fn alias(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(String::as_str)
    }

    pub fn qualify(&self, alias: &str, local: &str) -> Result<QName, NamespaceError> {
        let uri = self
            .uri(alias)
            .ok_or_else(|| NamespaceError::UnknownAlias(alias.to_string()))?;
        Ok(QName::new(Some(uri), local))
    }

    /// Resolve `prefix:local`, Clark notation, or a bare local name.
    pub fn resolve(&self, tag: &str) -> Result<QName, NamespaceError> {
        if tag.starts_with('{') {
            return Ok(QName::from_clark(tag));
        }
        match tag.split_once(':') {
            Some((alias, local)) => self.qualify(alias, local),
            None => Ok(QName::local(tag)),
        }
    }

    /// Render a name as `alias:local` when its namespace is registered.
    pub fn prefixed(&self, name: &QName) -> String {
        match name.ns.as_deref().and_then(|ns| self.alias(ns)) {
            Some(alias) => format!("{alias}:{}", name.local),
            None => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_and_strips_tags() {
        let registry = NamespaceRegistry::default();
        let tag = registry.qualify("main", "autoFilter").unwrap();
        assert_eq!(tag.to_string(), format!("{{{SHEET_MAIN_NS}}}autoFilter"));
        assert_eq!(localname(&tag.to_string()), "autoFilter");
        assert_eq!(localname("r:id"), "id");
        assert_eq!(localname("filter"), "filter");
    }

    #[test]
    fn keeps_simultaneous_namespaces_apart() {
        let registry = NamespaceRegistry::default();
        let main = registry.resolve("main:shape").unwrap();
        let vml = registry.resolve("v:shape").unwrap();
        assert_ne!(main, vml);
        assert_eq!(main.local, vml.local);
        assert_eq!(registry.prefixed(&vml), "v:shape");
        assert_eq!(QName::from_clark(&vml.to_string()), vml);
    }

    #[test]
    fn rejects_alias_rebinding() {
        let mut registry = NamespaceRegistry::default();
        registry.register("r", REL_NS).unwrap();
        let err = registry.register("r", VML_NS).unwrap_err();
        assert!(matches!(err, NamespaceError::AliasConflict { .. }));
        assert!(matches!(
            registry.qualify("nope", "x"),
            Err(NamespaceError::UnknownAlias(_))
        ));
    }
}
