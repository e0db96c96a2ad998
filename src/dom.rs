use std::collections::HashMap;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::reader::Reader as XmlReader;
use quick_xml::writer::Writer as XmlWriter;

/// Namespace assumed when the root element carries no xmlns declaration.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// Secondary binding re-applied on serialization for cross-reference attributes.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Handle into the document arena. Assigned at load time and stable for the
/// lifetime of the document; detached nodes keep their handle.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(NodeId),
    Text(String),
    Comment(String),
}

/// One XML element. The tag name is kept as written (prefix included) so
/// serialization round-trips; matching is done on the local name.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Child>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name with any namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing any existing value so keys stay unique.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        set_attr_entry(&mut self.attrs, name, value);
    }
}

fn set_attr_entry(attrs: &mut Vec<(String, String)>, name: &str, value: &str) {
    match attrs.iter_mut().find(|(k, _)| k == name) {
        Some((_, v)) => *v = value.to_string(),
        None => attrs.push((name.to_string(), value.to_string())),
    }
}

/// Namespace bindings threaded through the write call. Replaces the kind of
/// process-global prefix registration some XML libraries use.
#[derive(Debug, Clone)]
pub struct NamespaceConfig {
    pub default_ns: String,
    /// prefix -> URI, written as `xmlns:<prefix>` on the root element.
    pub bindings: Vec<(String, String)>,
}

impl NamespaceConfig {
    /// Re-applies the document's detected namespace plus the xlink binding.
    pub fn for_document(doc: &Document) -> Self {
        NamespaceConfig {
            default_ns: doc.namespace().to_string(),
            bindings: vec![("xlink".to_string(), XLINK_NS.to_string())],
        }
    }
}

/// An XML document as an arena of elements. The tree only stores downward
/// (parent -> children) edges; upward lookups go through [`parent_index`].
///
/// [`parent_index`]: Document::parent_index
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    namespace: String,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Document, String> {
        let mut reader = XmlReader::from_str(xml);
        let mut nodes: Vec<Element> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(XmlEvent::Start(ref e)) => {
                    let id = nodes.len();
                    nodes.push(read_element(e));
                    attach(&mut nodes, &stack, &mut root, id)?;
                    stack.push(id);
                }
                Ok(XmlEvent::Empty(ref e)) => {
                    let id = nodes.len();
                    nodes.push(read_element(e));
                    attach(&mut nodes, &stack, &mut root, id)?;
                }
                Ok(XmlEvent::Text(ref e)) => {
                    if let Some(&parent) = stack.last() {
                        let raw = e
                            .decode()
                            .map_err(|e| format!("XML parse error: {}", e))?;
                        nodes[parent].children.push(Child::Text(unescape_text(&raw)));
                    }
                }
                Ok(XmlEvent::CData(e)) => {
                    if let Some(&parent) = stack.last() {
                        let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        nodes[parent].children.push(Child::Text(raw));
                    }
                }
                Ok(XmlEvent::Comment(ref e)) => {
                    if let Some(&parent) = stack.last() {
                        let raw = e
                            .decode()
                            .map_err(|e| format!("XML parse error: {}", e))?;
                        nodes[parent].children.push(Child::Comment(raw.into_owned()));
                    }
                }
                Ok(XmlEvent::End(_)) => {
                    stack.pop();
                }
                Ok(XmlEvent::Eof) => break,
                Err(e) => return Err(format!("XML parse error: {}", e)),
                _ => {}
            }
            buf.clear();
        }

        let root = root.ok_or_else(|| "document has no root element".to_string())?;
        let namespace = detect_namespace(&nodes, root);
        Ok(Document {
            nodes,
            root,
            namespace,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Namespace URI detected from the root tag at parse time.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id]
    }

    /// Adds a detached element to the arena.
    pub fn alloc(&mut self, element: Element) -> NodeId {
        self.nodes.push(element);
        self.nodes.len() - 1
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in &self.nodes[id].children {
            if let Child::Element(cid) = child {
                self.collect_descendants(*cid, out);
            }
        }
    }

    /// Concatenated text of `id`'s subtree in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in &self.nodes[id].children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(cid) => self.collect_text(*cid, out),
                Child::Comment(_) => {}
            }
        }
    }

    /// Child -> parent lookup over the whole tree, built in one pass. The
    /// tree itself has no upward edges, so this is the only way up.
    pub fn parent_index(&self) -> HashMap<NodeId, NodeId> {
        let mut parents = HashMap::new();
        for id in self.descendants(self.root) {
            for child in &self.nodes[id].children {
                if let Child::Element(cid) = child {
                    parents.insert(*cid, id);
                }
            }
        }
        parents
    }

    /// Detaches `child` from `parent`'s child sequence. Returns false when
    /// `child` is not among `parent`'s children.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent].children;
        match children.iter().position(|c| *c == Child::Element(child)) {
            Some(idx) => {
                children.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Swaps `old` for `new` in place, so `new` takes the exact position
    /// `old` occupied in the child sequence.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> Result<(), String> {
        let children = &mut self.nodes[parent].children;
        match children.iter().position(|c| *c == Child::Element(old)) {
            Some(idx) => {
                children[idx] = Child::Element(new);
                Ok(())
            }
            None => Err(format!(
                "node {} is no longer a child of node {}",
                old, parent
            )),
        }
    }

    /// Serializes the tree back to XML with a declaration, re-applying the
    /// namespace bindings from `ns` on the root element.
    pub fn to_svg(&self, ns: &NamespaceConfig) -> Result<String, String> {
        let mut writer = XmlWriter::new(Vec::new());
        writer
            .write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| format!("Failed to serialize SVG: {}", e))?;
        self.write_element(&mut writer, self.root, Some(ns))?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| format!("Failed to serialize SVG: {}", e))
    }

    fn write_element(
        &self,
        writer: &mut XmlWriter<Vec<u8>>,
        id: NodeId,
        ns: Option<&NamespaceConfig>,
    ) -> Result<(), String> {
        let element = &self.nodes[id];
        let mut start = BytesStart::new(element.name.as_str());

        if let Some(cfg) = ns {
            let mut attrs = element.attrs.clone();
            set_attr_entry(&mut attrs, "xmlns", &cfg.default_ns);
            for (prefix, uri) in &cfg.bindings {
                set_attr_entry(&mut attrs, &format!("xmlns:{}", prefix), uri);
            }
            for (k, v) in &attrs {
                start.push_attribute((k.as_str(), v.as_str()));
            }
        } else {
            for (k, v) in &element.attrs {
                start.push_attribute((k.as_str(), v.as_str()));
            }
        }

        if element.children.is_empty() {
            return writer
                .write_event(XmlEvent::Empty(start))
                .map_err(|e| format!("Failed to serialize SVG: {}", e));
        }

        writer
            .write_event(XmlEvent::Start(start))
            .map_err(|e| format!("Failed to serialize SVG: {}", e))?;
        for child in &element.children {
            match child {
                Child::Element(cid) => self.write_element(writer, *cid, None)?,
                Child::Text(text) => writer
                    .write_event(XmlEvent::Text(BytesText::new(text)))
                    .map_err(|e| format!("Failed to serialize SVG: {}", e))?,
                Child::Comment(text) => writer
                    .write_event(XmlEvent::Comment(BytesText::from_escaped(text.as_str())))
                    .map_err(|e| format!("Failed to serialize SVG: {}", e))?,
            }
        }
        writer
            .write_event(XmlEvent::End(BytesEnd::new(element.name.as_str())))
            .map_err(|e| format!("Failed to serialize SVG: {}", e))
    }
}

fn read_element(e: &BytesStart) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attrs = e
        .attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).to_string(),
                unescape_text(&String::from_utf8_lossy(&a.value)),
            )
        })
        .collect();
    Element {
        name,
        attrs,
        children: Vec::new(),
    }
}

fn unescape_text(raw: &str) -> String {
    unescape(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn attach(
    nodes: &mut [Element],
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    id: NodeId,
) -> Result<(), String> {
    if let Some(&parent) = stack.last() {
        nodes[parent].children.push(Child::Element(id));
        Ok(())
    } else if root.is_none() {
        *root = Some(id);
        Ok(())
    } else {
        Err("XML parse error: multiple root elements".to_string())
    }
}

fn detect_namespace(nodes: &[Element], root: NodeId) -> String {
    let element = &nodes[root];
    let declaration = match element.name.split_once(':') {
        Some((prefix, _)) => format!("xmlns:{}", prefix),
        None => "xmlns".to_string(),
    };
    element
        .attr(&declaration)
        .unwrap_or(SVG_NS)
        .to_string()
}
