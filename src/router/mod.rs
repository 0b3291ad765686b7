//! The schema router: a process-lifetime, URI-keyed registry of compiled
//! schemas plus external-reference resolution.
//!
//! The router's address tree mirrors the JSON structure of each registered
//! schema document: one node per distinct (document, fragment-path)
//! identity, with `$id` aliases mapping additional URIs onto the *same*
//! node. Nodes are arena-allocated and never removed. External references
//! resolve through scheme-selected [`DocumentLoader`]s with exactly one
//! in-flight fetch per URI; concurrent callers share the outstanding task.

mod loaders;

pub use loaders::{DocumentLoader, FileLoader, HttpLoader, LoadError};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::Shared;
use futures::FutureExt;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cursor::{Cursor, CursorMut};
use crate::error::{StructureError, ValidateError};
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaParser};
use crate::uri;

type NodeId = usize;

struct AddressNode {
    schema: Option<Schema>,
    children: IndexMap<String, NodeId>,
    aliases: Vec<String>,
}

impl AddressNode {
    fn new() -> Self {
        Self {
            schema: None,
            children: IndexMap::new(),
            aliases: Vec::new(),
        }
    }
}

/// Arena of address nodes; aliased URIs share node ids instead of nodes.
struct AddressTree {
    nodes: Vec<AddressNode>,
    roots: HashMap<String, NodeId>,
}

impl AddressTree {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: HashMap::new(),
        }
    }

    fn alloc(&mut self) -> NodeId {
        self.nodes.push(AddressNode::new());
        self.nodes.len() - 1
    }

    /// Returns the root node for a normalized URI, creating it on demand.
    fn root_for(&mut self, base: &str) -> NodeId {
        if let Some(&id) = self.roots.get(base) {
            return id;
        }
        let id = self.alloc();
        self.roots.insert(base.to_string(), id);
        self.nodes[id].aliases.push(base.to_string());
        id
    }

    fn locate(&self, root: NodeId, pointer: &Pointer) -> Option<NodeId> {
        pointer
            .query(NodeCursor { tree: self, id: root })
            .map(|cursor| cursor.id)
    }
}

/// Read cursor over the address tree; every node is object-like, so tokens
/// are always plain keys.
struct NodeCursor<'a> {
    tree: &'a AddressTree,
    id: NodeId,
}

impl Cursor for NodeCursor<'_> {
    fn step(self, token: &str) -> Option<Self> {
        let id = *self.tree.nodes[self.id].children.get(token)?;
        Some(NodeCursor {
            tree: self.tree,
            id,
        })
    }

    fn is_object(&self) -> bool {
        true
    }

    fn is_array(&self) -> bool {
        false
    }
}

/// Write cursor over the address tree.
struct NodeCursorMut<'a> {
    tree: &'a mut AddressTree,
    id: NodeId,
}

impl<'a> NodeCursorMut<'a> {
    fn child(&mut self, token: &str) -> NodeId {
        if let Some(&id) = self.tree.nodes[self.id].children.get(token) {
            return id;
        }
        let id = self.tree.alloc();
        self.tree.nodes[self.id]
            .children
            .insert(token.to_string(), id);
        id
    }
}

impl<'a> CursorMut for NodeCursorMut<'a> {
    type Value = Schema;

    fn step_mut(self, token: &str) -> Option<Self> {
        let id = *self.tree.nodes[self.id].children.get(token)?;
        Some(NodeCursorMut {
            tree: self.tree,
            id,
        })
    }

    fn ensure(mut self, token: &str) -> Option<Self> {
        let id = self.child(token);
        Some(NodeCursorMut {
            tree: self.tree,
            id,
        })
    }

    fn write(mut self, token: &str, value: Schema) -> bool {
        let id = self.child(token);
        self.tree.nodes[id].schema = Some(value);
        true
    }

    fn replace(self, value: Schema) {
        self.tree.nodes[self.id].schema = Some(value);
    }
}

type FetchTask =
    Shared<Pin<Box<dyn Future<Output = Result<(), ValidateError>> + Send + 'static>>>;

struct RouterInner {
    tree: RwLock<AddressTree>,
    in_flight: Mutex<HashMap<String, FetchTask>>,
    lazy_guard: Mutex<HashSet<String>>,
    loaders: RwLock<HashMap<String, Arc<dyn DocumentLoader>>>,
}

/// A process-lifetime registry of compiled schemas keyed by URI.
///
/// Routers are cheap to clone and shared by every parser compiled against
/// them; the URI→node map and the in-flight-resolution map are the only
/// state mutated concurrently across overlapping validations, and both are
/// guarded here.
///
/// # Example
///
/// ```rust
/// use waypoint::{Dialect, Pointer, SchemaParser, SchemaRouter};
/// use serde_json::json;
///
/// let router = SchemaRouter::new();
/// let parser = SchemaParser::with_router(Dialect::Draft7, router.clone());
///
/// parser
///     .parse(
///         json!({"$id": "app://ids/user", "type": "object"}),
///         Pointer::from_uri("app://schemas/user").unwrap(),
///     )
///     .unwrap();
///
/// // The $id alias and the registration scope address the same schema.
/// let by_scope = Pointer::from_uri("app://schemas/user").unwrap();
/// let by_id = Pointer::from_uri("app://ids/user").unwrap();
/// assert!(router.resolve_cached(&by_scope, &Pointer::root(), &parser).is_some());
/// assert!(router.resolve_cached(&by_id, &Pointer::root(), &parser).is_some());
/// ```
#[derive(Clone)]
pub struct SchemaRouter {
    inner: Arc<RouterInner>,
}

impl SchemaRouter {
    /// Creates a router with the default HTTP and file loaders installed.
    pub fn new() -> Self {
        let mut loaders: HashMap<String, Arc<dyn DocumentLoader>> = HashMap::new();
        let http = Arc::new(HttpLoader::new());
        loaders.insert("http".to_string(), http.clone());
        loaders.insert("https".to_string(), http);
        loaders.insert("file".to_string(), Arc::new(FileLoader));
        Self {
            inner: Arc::new(RouterInner {
                tree: RwLock::new(AddressTree::new()),
                in_flight: Mutex::new(HashMap::new()),
                lazy_guard: Mutex::new(HashSet::new()),
                loaders: RwLock::new(loaders),
            }),
        }
    }

    /// Registers (or replaces) the loader for a URI scheme.
    pub fn with_loader(self, scheme: impl Into<String>, loader: Arc<dyn DocumentLoader>) -> Self {
        self.inner.loaders.write().insert(scheme.into(), loader);
        self
    }

    /// Registers a compiled schema under its scope.
    ///
    /// The address-tree node for the scope's base URI is created on demand,
    /// the schema is written at the scope's pointer path (creating
    /// intermediate nodes), and any `$id` the schema declares registers
    /// additional alias URIs pointing at the same node: an absolute `$id`
    /// directly, a relative one resolved against every known alias of the
    /// current base node.
    pub fn add_schema(&self, schema: &Schema, scope: &Pointer) -> Result<(), StructureError> {
        let base = uri::normalize(scope.base().unwrap_or(""));
        let mut tree = self.inner.tree.write();
        let root = tree.root_for(&base);
        scope.write(
            NodeCursorMut {
                tree: &mut *tree,
                id: root,
            },
            schema.clone(),
            true,
        );
        let node = tree
            .locate(root, scope)
            .expect("node was just created along the scope path");

        if let Some(id_value) = schema.raw().get("$id") {
            let id_text = id_value.as_str().ok_or(StructureError::WrongType {
                keyword: "$id",
                expected: "a string",
            })?;
            let aliases: Vec<String> = if uri::is_absolute(id_text) {
                vec![uri::normalize(id_text)]
            } else {
                let base_aliases = tree.nodes[root].aliases.clone();
                base_aliases
                    .iter()
                    .map(|alias| uri::resolve(alias, id_text))
                    .collect()
            };
            for alias in aliases {
                debug!(scope = %scope.to_uri(), alias = %alias, "registered $id alias");
                tree.roots.insert(alias.clone(), node);
                tree.nodes[node].aliases.push(alias);
            }
        }
        Ok(())
    }

    /// Purely local lookup of a reference: no I/O, no fetches.
    ///
    /// A relative reference base is tried against every known alias of the
    /// scope's node before falling back to the scope itself; the fragment
    /// pointer is then followed through the address tree. When the tree has
    /// no node but the owning document does contain the path, just that
    /// subtree is compiled on the spot (schemas are not pre-walked
    /// everywhere eagerly).
    pub fn resolve_cached(
        &self,
        reference: &Pointer,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Option<Schema> {
        let candidates = self.candidate_uris(reference, scope);
        for candidate in &candidates {
            let (hit, lazy) = {
                let tree = self.inner.tree.read();
                let Some(&root) = tree.roots.get(candidate) else {
                    continue;
                };
                match tree.locate(root, reference) {
                    Some(node) if tree.nodes[node].schema.is_some() => {
                        (tree.nodes[node].schema.clone(), None)
                    }
                    _ => {
                        let lazy = tree.nodes[root].schema.as_ref().and_then(|owner| {
                            reference.query_json(owner.raw()).cloned()
                        });
                        (None, lazy)
                    }
                }
            };
            if let Some(schema) = hit {
                debug!(uri = %candidate, "reference cache hit");
                return Some(schema);
            }
            if let Some(subtree) = lazy {
                let key = format!("{}#{}", candidate, reference.build());
                if !self.inner.lazy_guard.lock().insert(key.clone()) {
                    continue;
                }
                debug!(uri = %candidate, pointer = %reference.build(), "lazily compiling cached subtree");
                let scope_ptr = Pointer::root_of(candidate.clone())
                    .extend(reference.tokens().iter().cloned());
                let parsed = parser.parse(subtree, scope_ptr);
                self.inner.lazy_guard.lock().remove(&key);
                if let Ok(schema) = parsed {
                    return Some(schema);
                }
            }
        }
        None
    }

    /// Resolves a reference, fetching its document if it is not cached.
    ///
    /// A cached hit completes immediately. Otherwise at most one fetch per
    /// document URI is in flight at a time; concurrent callers subscribe to
    /// the outstanding task. On completion the in-flight entry is removed
    /// (success or failure — failed fetches are not cached) and the cache is
    /// re-queried.
    ///
    /// # Errors
    ///
    /// [`ValidateError::Reference`] when the fetch fails, the fetched
    /// document is malformed, or the pointer path is absent after the fetch.
    pub async fn resolve_ref(
        &self,
        reference: &Pointer,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Schema, ValidateError> {
        if let Some(schema) = self.resolve_cached(reference, scope, parser) {
            return Ok(schema);
        }

        let ref_base = reference.base().unwrap_or("");
        if ref_base.is_empty() {
            return Err(ValidateError::Reference {
                uri: reference.to_uri(),
                reason: "not found in any registered document".to_string(),
            });
        }
        let target = if uri::is_absolute(ref_base) {
            uri::normalize(ref_base)
        } else {
            uri::resolve(scope.base().unwrap_or(""), ref_base)
        };
        let document = uri::strip_fragment(&target).to_string();

        let task = {
            let mut in_flight = self.inner.in_flight.lock();
            match in_flight.get(&document) {
                Some(task) => {
                    debug!(uri = %document, "subscribing to in-flight fetch");
                    task.clone()
                }
                None => {
                    let task = fetch_document(self.clone(), parser.clone(), document.clone())
                        .boxed()
                        .shared();
                    in_flight.insert(document.clone(), task.clone());
                    task
                }
            }
        };
        let outcome = task.await;
        self.inner.in_flight.lock().remove(&document);
        outcome?;

        self.resolve_cached(reference, scope, parser)
            .ok_or_else(|| ValidateError::Reference {
                uri: reference.to_uri(),
                reason: format!("'{}' not found after fetching {}", reference.build(), document),
            })
    }

    /// Candidate root URIs for a reference, most specific first.
    fn candidate_uris(&self, reference: &Pointer, scope: &Pointer) -> Vec<String> {
        let scope_base = uri::normalize(scope.base().unwrap_or(""));
        let mut candidates = Vec::new();
        match reference.base() {
            None => candidates.push(scope_base),
            Some(ref_base) if uri::is_absolute(ref_base) => {
                candidates.push(uri::normalize(ref_base));
            }
            Some(ref_base) => {
                let tree = self.inner.tree.read();
                if let Some(&root) = tree.roots.get(&scope_base) {
                    for alias in &tree.nodes[root].aliases {
                        candidates.push(uri::resolve(alias, ref_base));
                    }
                }
                drop(tree);
                candidates.push(uri::resolve(&scope_base, ref_base));
            }
        }
        candidates.dedup();
        candidates
    }
}

impl Default for SchemaRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches and compiles one document, populating the router cache as a side
/// effect of parsing.
async fn fetch_document(
    router: SchemaRouter,
    parser: SchemaParser,
    document: String,
) -> Result<(), ValidateError> {
    let loader = {
        let loaders = router.inner.loaders.read();
        let scheme = uri::scheme(&document).unwrap_or("file");
        loaders.get(scheme).cloned().ok_or_else(|| {
            ValidateError::Reference {
                uri: document.clone(),
                reason: format!("no loader registered for scheme '{}'", scheme),
            }
        })?
    };
    debug!(uri = %document, "fetching schema document");
    let json = loader
        .fetch(&document)
        .await
        .map_err(|e| {
            warn!(uri = %document, error = %e, "schema fetch failed");
            ValidateError::Reference {
                uri: document.clone(),
                reason: e.to_string(),
            }
        })?;
    parser
        .parse(json, Pointer::root_of(document.clone()))
        .map_err(|e| ValidateError::Reference {
            uri: document.clone(),
            reason: format!("fetched document is not a valid schema: {}", e),
        })?;
    debug!(uri = %document, "schema document registered");
    Ok(())
}
