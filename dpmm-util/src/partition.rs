use anyhow::{bail, Result};

/// One cluster of the partition: its atom value plus the indices of the
/// data points currently assigned to it.
///
/// The atom sampler reads `value`/`items` and writes `value`; item
/// membership is edited only by the (external) partition sampler.
#[derive(Debug, Clone)]
pub struct PartitionCell<V> {
    value: V,
    items: Vec<usize>,
}

impl<V> PartitionCell<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            items: Vec::new(),
        }
    }

    pub fn with_items(value: V, items: Vec<usize>) -> Self {
        Self { value, items }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    pub fn items(&self) -> &[usize] {
        &self.items
    }

    pub fn add_item(&mut self, item: usize) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, item: usize) {
        self.items.retain(|&j| j != item);
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }
}

/// The current assignment of data points to clusters.
#[derive(Debug, Clone, Default)]
pub struct Partition<V> {
    cells: Vec<PartitionCell<V>>,
}

impl<V> Partition<V> {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn add_cell(&mut self, cell: PartitionCell<V>) {
        self.cells.push(cell);
    }

    pub fn cells(&self) -> &[PartitionCell<V>] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [PartitionCell<V>] {
        &mut self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.cells.iter().map(|cell| cell.value())
    }

    /// Replace every cell's atom value at once, in cell order. Used by
    /// the atom sampler to apply a full sampling pass atomically.
    pub fn set_values(&mut self, values: Vec<V>) -> Result<()> {
        if values.len() != self.cells.len() {
            bail!(
                "{} values for a partition of {} cells",
                values.len(),
                self.cells.len()
            );
        }

        for (cell, value) in self.cells.iter_mut().zip(values) {
            cell.value = value;
        }

        Ok(())
    }
}
