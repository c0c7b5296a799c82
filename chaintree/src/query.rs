//! loading and querying of tree tables
//!
//! [QueryEngine] ties the pieces together: it loads binary tree files into a [TreeStore],
//! resolves the chains that lead to nodes with a given identifier code, merges them into a
//! minimal tree and renders the result.
use crate::{
    cancel::CancelToken,
    config::Config,
    decode::RecordDecoder,
    error::{Error, Result},
    merge::ChainMergeTree,
    node::{Chain, NodeId, TreeNode},
    render::render_chain,
    resolve::ChainResolver,
    store::{TableHandle, TreeStore},
};
use fnv::FnvHashSet;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};
use tracing::{debug, info, warn};

/// Outcome of loading a tree file
#[derive(Debug, Default)]
pub struct LoadReport {
    /// rows that were written
    pub inserted: u64,
    /// rows the store refused
    pub failed: u64,
    /// nodes whose root path is broken. Only filled if [Config::validate_on_load] is set.
    pub invalid: Vec<ChainFailure>,
}

/// A chain that could not be resolved. Only this chain is skipped.
#[derive(Debug)]
pub struct ChainFailure {
    pub node: NodeId,
    pub error: Error,
}

impl std::fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain to node {} skipped: {}", self.node, self.error)
    }
}

/// All chains leading to nodes with a given identifier code
#[derive(Debug, Default)]
pub struct ChainReport {
    /// resolved chains, ordered by the weight of their target node, descending
    pub chains: Vec<Chain>,
    pub failures: Vec<ChainFailure>,
}

/// The merged tree of all chains leading to nodes with a given identifier code
#[derive(Debug, Default)]
pub struct MinimalTree {
    pub tree: ChainMergeTree,
    pub failures: Vec<ChainFailure>,
}

pub struct QueryEngine<S> {
    store: S,
    config: Config,
    resolver: ChainResolver,
    cancel: CancelToken,
}

impl<S: TreeStore> QueryEngine<S> {
    pub fn new(store: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            resolver: ChainResolver::new(config.max_chain_depth),
            config,
            cancel: CancelToken::default(),
        })
    }

    /// use the given token to abort long running loads and queries
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// names of all tables in the store
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.store.table_names()
    }

    /// bind to a table for loading, creating it if needed
    pub fn select_or_create(&self, name: &str) -> Result<TableHandle> {
        self.store.select_or_create(name)
    }

    /// bind to an existing table for querying
    pub fn require(&self, name: &str) -> Result<TableHandle> {
        self.store.require(name)
    }

    /// Load a binary tree file into a table.
    ///
    /// Rows the store refuses are counted and skipped. Fails if the file can not be read, or
    /// if it ends with an incomplete record. Rows inserted before the failure stay in the table.
    pub fn load_file(&self, path: impl AsRef<Path>, table: &TableHandle) -> Result<LoadReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;
        let total_len = file.metadata().ok().map(|m| m.len());
        info!("The file {} has been successfully opened.", path.display());
        self.load_reader(BufReader::new(file), total_len, table)
    }

    /// Load binary tree records from a reader. See [QueryEngine::load_file].
    pub fn load_reader<R: Read>(
        &self,
        reader: R,
        total_len: Option<u64>,
        table: &TableHandle,
    ) -> Result<LoadReport> {
        #[cfg(feature = "metrics")]
        let _timer = crate::prom::LOAD_HIST.start_timer();
        let mut decoder = RecordDecoder::new(reader);
        if let Some(total_len) = total_len {
            decoder = decoder.with_progress(total_len, self.config.progress_interval);
        }
        let mut report = LoadReport::default();
        for record in decoder {
            if self.cancel.is_cancelled() {
                warn!(
                    "load into {} cancelled after {} rows, {} failed",
                    table, report.inserted, report.failed
                );
                return Err(Error::Cancelled);
            }
            let node = match record {
                Ok(node) => node,
                Err(Error::IncompleteRecord { remaining, .. }) => {
                    return Err(Error::IncompleteRecord {
                        loaded: report.inserted,
                        failed: report.failed,
                        remaining,
                    })
                }
                Err(cause) => return Err(cause),
            };
            match self.store.insert(table, &node) {
                Ok(()) => report.inserted += 1,
                Err(cause) => {
                    warn!("{}", cause);
                    #[cfg(feature = "metrics")]
                    crate::prom::INSERT_FAILURES.inc();
                    report.failed += 1;
                }
            }
        }
        info!(
            "loaded {} rows into {}, {} failed",
            report.inserted, table, report.failed
        );
        if self.config.validate_on_load {
            report.invalid = self.validate_table(table)?;
        }
        Ok(report)
    }

    /// Resolve the root path of every node in the table and return the broken ones.
    pub fn validate_table(&self, table: &TableHandle) -> Result<Vec<ChainFailure>> {
        let mut failures = Vec::new();
        for page in self.dump_table(table, self.config.page_size) {
            for node in page? {
                self.cancel.check()?;
                if let Err(error) = self.resolver.root_path_from(&self.store, table, node) {
                    if !error.is_chain_local() {
                        return Err(error);
                    }
                    failures.push(ChainFailure {
                        node: node.node_id,
                        error,
                    });
                }
            }
        }
        if !failures.is_empty() {
            warn!("{} nodes in {} have a broken root path", failures.len(), table);
        }
        Ok(failures)
    }

    /// Resolve the chain from the root for each match in `matches`.
    ///
    /// Chain local failures are collected, everything else aborts.
    fn resolve_all(
        &self,
        table: &TableHandle,
        matches: Vec<TreeNode>,
        mut f: impl FnMut(Chain),
    ) -> Result<Vec<ChainFailure>> {
        let mut failures = Vec::new();
        for node in matches {
            self.cancel.check()?;
            match self.resolver.root_path_from(&self.store, table, node) {
                Ok(chain) => f(chain),
                Err(error) if error.is_chain_local() => {
                    let failure = ChainFailure {
                        node: node.node_id,
                        error,
                    };
                    warn!("{}", failure);
                    failures.push(failure);
                }
                Err(error) => return Err(error),
            }
        }
        Ok(failures)
    }

    /// All chains from a root to a node with identifier `code`, heaviest target first.
    pub fn list_chains_by_identifier(&self, table: &TableHandle, code: i32) -> Result<ChainReport> {
        let matches = self.store.get_by_identifier(table, code)?;
        debug!("{} nodes with kza {} in {}", matches.len(), code, table);
        let mut chains = Vec::with_capacity(matches.len());
        let failures = self.resolve_all(table, matches, |chain| chains.push(chain))?;
        Ok(ChainReport { chains, failures })
    }

    /// All chains leading to `code`, merged into one tree.
    pub fn minimal_tree_by_identifier(
        &self,
        table: &TableHandle,
        code: i32,
    ) -> Result<MinimalTree> {
        let matches = self.store.get_by_identifier(table, code)?;
        debug!("{} nodes with kza {} in {}", matches.len(), code, table);
        let mut tree = ChainMergeTree::new();
        let failures = self.resolve_all(table, matches, |chain| {
            tree.insert_chain(&chain);
        })?;
        Ok(MinimalTree { tree, failures })
    }

    /// Rendered chains leading to `code`, one string per chain.
    ///
    /// Chains that could not be resolved are reported in place.
    pub fn query_chains(&self, table: &TableHandle, code: i32) -> Result<Vec<String>> {
        let report = self.list_chains_by_identifier(table, code)?;
        let mut lines = report
            .chains
            .iter()
            .map(|chain| render_chain(chain, code))
            .collect::<Vec<_>>();
        lines.extend(report.failures.iter().map(ToString::to_string));
        Ok(lines)
    }

    /// Rendered minimal tree for `code`, one string per node.
    ///
    /// Chains that could not be resolved are reported after the tree.
    pub fn query_minimal_tree(&self, table: &TableHandle, code: i32) -> Result<Vec<String>> {
        let MinimalTree { tree, failures } = self.minimal_tree_by_identifier(table, code)?;
        let mut lines = tree.render(Some(code)).collect::<Vec<_>>();
        lines.extend(failures.iter().map(ToString::to_string));
        Ok(lines)
    }

    /// Rows of a table in insertion order, `page_size` rows at a time.
    pub fn dump_table(&self, table: &TableHandle, page_size: usize) -> Pages<'_, S> {
        Pages {
            store: &self.store,
            table: table.clone(),
            offset: 0,
            page_size: page_size.max(1),
            done: false,
        }
    }

    /// The whole table as a tree, starting from the nodes whose parent is `0`.
    ///
    /// Each stored node appears once. Nodes that are not reachable from a root (dangling or
    /// cyclic parent links) are left out.
    pub fn forest(&self, table: &TableHandle) -> Result<ChainMergeTree> {
        let mut tree = ChainMergeTree::new();
        let mut visited = FnvHashSet::default();
        let mut stack = vec![(ChainMergeTree::ROOT, NodeId::ROOT, 0usize)];
        while let Some((parent_index, parent_id, depth)) = stack.pop() {
            self.cancel.check()?;
            for child in self.store.get_children(table, parent_id)? {
                if !visited.insert(child.node_id) {
                    continue;
                }
                let index = tree.append(parent_index, &child, depth);
                stack.push((index, child.node_id, depth + 1));
            }
        }
        Ok(tree)
    }

    /// Rendered view of the whole table as a tree.
    pub fn view_as_tree(&self, table: &TableHandle) -> Result<Vec<String>> {
        Ok(self.forest(table)?.render(None).collect())
    }
}

/// Iterator over the rows of a table, one page at a time
pub struct Pages<'a, S> {
    store: &'a S,
    table: TableHandle,
    offset: usize,
    page_size: usize,
    done: bool,
}

impl<'a, S: TreeStore> Iterator for Pages<'a, S> {
    type Item = Result<Vec<TreeNode>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.scan(&self.table, self.offset, self.page_size) {
            Ok(page) => {
                if page.len() < self.page_size {
                    self.done = true;
                }
                if page.is_empty() {
                    return None;
                }
                self.offset += page.len();
                Some(Ok(page))
            }
            Err(cause) => {
                self.done = true;
                Some(Err(cause))
            }
        }
    }
}
