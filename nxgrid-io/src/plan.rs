//! Hyperslab blocking for bounded-memory reads.
//!
//! A [`BlockingPlan`] splits a row-major array into slabs whose element
//! count never exceeds the blob budget (or the innermost extent, whichever is
//! larger). Slabs are produced in row-major order, so each one lands in the
//! destination buffer directly after the previous one.
//!
//! For dims `[20, 20, 20]` and a budget of 1000 elements the split dimension
//! is 0 with a step of 2: ten slabs of `[2, 20, 20]`, 800 elements each.

/// Highest rank the reader accepts.
pub const MAX_RANK: usize = 7;

/// How an array is cut into slabs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockingPlan {
    dims: Vec<usize>,
    split: Option<usize>,
    step: usize,
    run_len: usize,
    max_blob: usize,
}

impl BlockingPlan {
    /// Plans a read of `dims` under `blob_budget` elements.
    ///
    /// Returns `None` when the whole array fits (product of `dims` below
    /// `max(dims[last], blob_budget)`) and should be read in one request.
    /// Budgets below 1 are treated as 1.
    #[must_use]
    pub fn for_budget(dims: &[usize], blob_budget: usize) -> Option<Self> {
        let &last = dims.last()?;
        let max_blob = last.max(blob_budget.max(1));
        let total: usize = dims.iter().product();
        if total < max_blob {
            return None;
        }

        let rank = dims.len();
        let (split, step, run_len) = if rank == 1 {
            (None, 1, 1)
        } else if last >= max_blob {
            // a single innermost row already fills the budget
            (Some(rank - 2), 1, last)
        } else {
            let mut pos = rank - 1;
            let mut prod = last;
            let mut run_len = last;
            while prod < max_blob && pos > 0 {
                pos -= 1;
                prod *= dims[pos];
                if prod < max_blob {
                    run_len = prod;
                }
            }
            // total >= max_blob, so the loop stopped on a dimension that overflows
            let inner = prod / dims[pos];
            (Some(pos), (max_blob / inner).max(1), run_len)
        };

        Some(Self {
            dims: dims.to_vec(),
            split,
            step,
            run_len,
            max_blob,
        })
    }

    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Dimension advanced between slabs; `None` for a single slab over a
    /// rank-1 array.
    #[must_use]
    pub fn split_dimension(&self) -> Option<usize> {
        self.split
    }

    /// Extent along the split dimension of a full slab.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Contiguous elements per index of the split dimension.
    #[must_use]
    pub fn run_len(&self) -> usize {
        self.run_len
    }

    /// `max(dims[last], blob_budget)`.
    #[must_use]
    pub fn max_blob_size(&self) -> usize {
        self.max_blob
    }

    /// Length of the reusable slab buffer.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.max_blob.min(self.dims.iter().product())
    }

    pub fn slabs(&self) -> Slabs<'_> {
        let mut size = self.dims.clone();
        if let Some(pos) = self.split {
            size[..pos].fill(1);
            size[pos] = self.step.min(self.dims[pos]);
        }
        Slabs {
            plan: self,
            start: vec![0; self.dims.len()],
            size,
            offset: 0,
            done: false,
        }
    }

    #[must_use]
    pub fn slab_count(&self) -> usize {
        self.slabs().count()
    }
}

/// One slab request and where its data goes in the destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slab {
    pub start: Vec<usize>,
    pub size: Vec<usize>,
    /// Element offset in the destination array.
    pub offset: usize,
    /// Elements delivered by this slab.
    pub len: usize,
}

/// Row-major odometer over the slabs of a plan.
#[derive(Debug)]
pub struct Slabs<'a> {
    plan: &'a BlockingPlan,
    start: Vec<usize>,
    size: Vec<usize>,
    offset: usize,
    done: bool,
}

impl Slabs<'_> {
    fn advance(&mut self) {
        let Some(pos) = self.plan.split else {
            self.done = true;
            return;
        };
        let dims = &self.plan.dims;
        self.start[pos] += self.size[pos];
        if self.start[pos] >= dims[pos] {
            self.start[pos] = 0;
            let mut i = pos;
            loop {
                if i == 0 {
                    self.done = true;
                    return;
                }
                i -= 1;
                if self.start[i] + 1 >= dims[i] {
                    self.start[i] = 0;
                } else {
                    self.start[i] += 1;
                    break;
                }
            }
        }
        self.size[pos] = self.plan.step.min(dims[pos] - self.start[pos]);
    }
}

impl Iterator for Slabs<'_> {
    type Item = Slab;

    fn next(&mut self) -> Option<Slab> {
        if self.done {
            return None;
        }
        let len = self.size.iter().product();
        let slab = Slab {
            start: self.start.clone(),
            size: self.size.clone(),
            offset: self.offset,
            len,
        };
        self.offset += len;
        self.advance();
        Some(slab)
    }
}
