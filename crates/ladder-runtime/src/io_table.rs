//! Thread-safe I/O table.
//!
//! The table is the only mutable state shared between the scan worker and
//! external collaborators (a Modbus server, a UI). One lock guards the
//! whole image: `snapshot` clones under it, `commit` merges under it, and
//! `set`/`get` hold it for a single key operation. No reader ever observes
//! a half-committed scan.
//!
//! External writers must not hold references into the table across I/O
//! calls; every operation here is a single short-lived lock acquisition.

use ladder_common::faults::{FaultCounters, SoftFault};
use ladder_common::iec_types::DINT;
use ladder_common::image::{Image, SymbolId};
use ladder_common::value::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, RwLock};

/// A single cell change, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoChange {
    /// The cell that changed.
    pub id: SymbolId,
    /// Its new value.
    pub value: Value,
}

struct Subscriber {
    ids: HashSet<SymbolId>,
    tx: mpsc::Sender<IoChange>,
}

/// Shared image of inputs, outputs, and memory cells.
pub struct IoTable {
    image: RwLock<Image>,
    /// Advisory partition: the ids the installed program writes.
    outputs: RwLock<BTreeSet<SymbolId>>,
    subscribers: Mutex<Vec<Subscriber>>,
    faults: Arc<FaultCounters>,
}

static_assertions::assert_impl_all!(IoTable: Send, Sync);

impl Default for IoTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IoTable {
    /// Create an empty table with its own fault counters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_faults(Arc::new(FaultCounters::new()))
    }

    /// Create an empty table sharing the given fault counters.
    #[must_use]
    pub fn with_faults(faults: Arc<FaultCounters>) -> Self {
        Self {
            image: RwLock::new(Image::new()),
            outputs: RwLock::new(BTreeSet::new()),
            subscribers: Mutex::new(Vec::new()),
            faults,
        }
    }

    /// A value-copy of the current image.
    #[must_use]
    pub fn snapshot(&self) -> Image {
        self.image.read().expect("io table lock poisoned").clone()
    }

    /// Merge a delta onto the image.
    ///
    /// Keys present in the delta overwrite, keys absent stay untouched, and
    /// the merge is atomic with respect to every other table operation.
    pub fn commit(&self, delta: &Image) {
        let changes = {
            let mut image = self.image.write().expect("io table lock poisoned");
            let changes: Vec<IoChange> = delta
                .iter()
                .filter(|(id, value)| image.get(id.as_str()) != Some(**value))
                .map(|(id, value)| IoChange {
                    id: id.clone(),
                    value: *value,
                })
                .collect();
            image.merge(delta);
            changes
        };
        self.notify(&changes);
    }

    /// Store one cell. Last write wins.
    pub fn set(&self, id: impl Into<SymbolId>, value: Value) {
        let id = id.into();
        let changed = {
            let mut image = self.image.write().expect("io table lock poisoned");
            let changed = image.get(&id) != Some(value);
            image.set(id.clone(), value);
            changed
        };
        if changed {
            self.notify(&[IoChange { id, value }]);
        }
    }

    /// Look up one cell.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.image.read().expect("io table lock poisoned").get(id)
    }

    /// Read a bit; absent reads false, a mismatch reads false and is counted.
    #[must_use]
    pub fn read_bit(&self, id: &str) -> bool {
        match self.get(id) {
            None => false,
            Some(value) => value.as_bit().unwrap_or_else(|| {
                self.faults.record(SoftFault::ImageTypeMismatch);
                false
            }),
        }
    }

    /// Read a word; absent reads zero, a mismatch reads zero and is counted.
    #[must_use]
    pub fn read_word(&self, id: &str) -> DINT {
        match self.get(id) {
            None => 0,
            Some(value) => value.as_word().unwrap_or_else(|| {
                self.faults.record(SoftFault::ImageTypeMismatch);
                0
            }),
        }
    }

    /// Store a bit.
    pub fn write_bit(&self, id: impl Into<SymbolId>, bit: bool) {
        self.set(id, Value::Bit(bit));
    }

    /// Store a word.
    pub fn write_word(&self, id: impl Into<SymbolId>, word: DINT) {
        self.set(id, Value::Word(word));
    }

    /// Record which ids the installed program writes.
    ///
    /// The partition is advisory; it only scopes [`IoTable::snapshot_outputs`].
    pub fn register_outputs(&self, ids: impl IntoIterator<Item = SymbolId>) {
        let mut outputs = self.outputs.write().expect("io table lock poisoned");
        outputs.clear();
        outputs.extend(ids);
    }

    /// Snapshot restricted to the registered program outputs.
    #[must_use]
    pub fn snapshot_outputs(&self) -> Image {
        let outputs = self.outputs.read().expect("io table lock poisoned");
        self.image
            .read()
            .expect("io table lock poisoned")
            .filtered(outputs.iter().map(String::as_str))
    }

    /// Subscribe to changes of the given ids.
    ///
    /// Every commit or set that changes a subscribed cell sends one
    /// [`IoChange`]. Receivers that disappear are pruned on the next
    /// notification.
    pub fn subscribe(&self, ids: impl IntoIterator<Item = SymbolId>) -> mpsc::Receiver<IoChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .expect("io table lock poisoned")
            .push(Subscriber {
                ids: ids.into_iter().collect(),
                tx,
            });
        rx
    }

    fn notify(&self, changes: &[IoChange]) {
        if changes.is_empty() {
            return;
        }
        let mut subscribers = self.subscribers.lock().expect("io table lock poisoned");
        subscribers.retain(|subscriber| {
            for change in changes {
                if subscriber.ids.contains(&change.id)
                    && subscriber.tx.send(change.clone()).is_err()
                {
                    return false;
                }
            }
            true
        });
    }

    /// Clear every cell, as for a controller reset. Subscribers are kept.
    pub fn reset(&self) {
        self.image.write().expect("io table lock poisoned").clear();
    }

    /// The shared soft-fault counters.
    #[must_use]
    pub fn faults(&self) -> &Arc<FaultCounters> {
        &self.faults
    }

    /// Number of cells currently present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.image.read().expect("io table lock poisoned").len()
    }

    /// True if no cell is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for IoTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoTable")
            .field("cells", &self.len())
            .finish_non_exhaustive()
    }
}
