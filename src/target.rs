//! Per-item execution context and batch construction

use crate::proxy::ProxyAllocator;
use crate::utils::task_name;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::Span;

/// Execution context handed to the processing function and its callbacks
///
/// Immutable once built. Results and errors travel through return values and
/// callback arguments, never back into the target.
#[derive(Debug)]
pub struct Target<D> {
    index: usize,
    data: Option<D>,
    proxy: Option<String>,
    span: Span,
}

impl<D> Target<D> {
    /// Position in the batch, in dispatch order (after shuffling)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Item payload; `None` for count-based sources
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Proxy assigned to this item
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Tracing span tagged with this item's name
    ///
    /// Execution units already run inside this span. Enter it explicitly when
    /// logging from threads or tasks spawned by the processing function.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Display name (`00001` for index 0)
    pub fn name(&self) -> String {
        task_name(self.index)
    }
}

/// Items submitted as one batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskSource<D> {
    /// Generate this many items without payload
    Count(usize),
    /// One item per payload, in order
    Items(Vec<D>),
}

impl<D> TaskSource<D> {
    /// Number of items the source produces
    pub fn len(&self) -> usize {
        match self {
            TaskSource::Count(n) => *n,
            TaskSource::Items(items) => items.len(),
        }
    }

    /// Whether the source produces no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D> From<usize> for TaskSource<D> {
    fn from(count: usize) -> Self {
        TaskSource::Count(count)
    }
}

impl<D> From<Vec<D>> for TaskSource<D> {
    fn from(items: Vec<D>) -> Self {
        TaskSource::Items(items)
    }
}

/// Build the ordered targets of one batch
///
/// Payloads are shuffled first when `shuffle` is set, so indices always follow
/// dispatch order. Each target gets its own child span of `parent`. The proxy
/// session key comes from `session_key(payload)`, else the index.
pub(crate) fn build_targets<D, R>(
    source: TaskSource<D>,
    shuffle: bool,
    proxies: &ProxyAllocator,
    session_key: Option<&(dyn Fn(&D) -> String + Send + Sync)>,
    parent: &Span,
    rng: &mut R,
) -> Vec<Target<D>>
where
    R: Rng + ?Sized,
{
    let payloads: Vec<Option<D>> = match source {
        TaskSource::Count(n) => (0..n).map(|_| None).collect(),
        TaskSource::Items(mut items) => {
            if shuffle {
                items.shuffle(rng);
            }
            items.into_iter().map(Some).collect()
        }
    };

    payloads
        .into_iter()
        .enumerate()
        .map(|(index, data)| {
            let session = match (&data, session_key) {
                (Some(payload), Some(key)) => key(payload),
                _ => index.to_string(),
            };
            Target {
                index,
                proxy: proxies.assign(&session),
                data,
                span: tracing::info_span!(parent: parent, "task", task = %task_name(index)),
            }
        })
        .collect()
}
