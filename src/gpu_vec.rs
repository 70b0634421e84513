// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::Pod;

/// Append-only array of GPU records.
///
/// Capacity doubles on overflow, copying the existing elements into a fresh
/// allocation the way a device buffer is reallocated. Growth stops at a hard
/// byte ceiling: appends that would need to cross it are dropped and the
/// buffer is left untouched. Callers must treat the ceiling as a per-frame
/// content cap.
pub struct GpuVec<T: Pod> {
    data: Vec<T>,
    capacity: usize,
    max_bytes: usize,
    reallocations: usize,
    saturated: bool,
    label: &'static str,
}

impl<T: Pod> GpuVec<T> {
    pub fn new(label: &'static str, capacity: usize, max_bytes: usize) -> Self {
        let max_elems = max_bytes / size_of::<T>().max(1);
        let capacity = capacity.max(1).min(max_elems.max(1));
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            max_bytes,
            reallocations: 0,
            saturated: false,
            label,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of times the backing storage has been reallocated.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// True once an append has been dropped since the last `clear`.
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    /// Appends `value`, returning its index, or `None` when the buffer is at
    /// its ceiling.
    pub fn push(&mut self, value: T) -> Option<u32> {
        if !self.reserve(1) {
            return None;
        }
        let index = self.data.len();
        self.data.push(value);
        Some(index as u32)
    }

    /// Appends every element of `values` or none of them. Returns the index
    /// of the first appended element.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Option<u32> {
        if !self.reserve(values.len()) {
            return None;
        }
        let index = self.data.len();
        self.data.extend_from_slice(values);
        Some(index as u32)
    }

    /// Resets the length to zero and keeps the backing capacity.
    pub fn clear(&mut self) {
        self.data.clear();
        self.saturated = false;
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    fn reserve(&mut self, additional: usize) -> bool {
        let needed = self.data.len() + additional;
        if needed <= self.capacity {
            return true;
        }
        let mut new_capacity = self.capacity;
        while new_capacity < needed {
            new_capacity *= 2;
        }
        if new_capacity.saturating_mul(size_of::<T>()) > self.max_bytes {
            if !self.saturated {
                tracing::warn!(
                    buffer = self.label,
                    len = self.data.len(),
                    max_bytes = self.max_bytes,
                    "buffer ceiling reached, dropping appends until the slot is reset"
                );
                self.saturated = true;
            }
            return false;
        }
        let mut data = Vec::with_capacity(new_capacity);
        data.extend_from_slice(&self.data);
        self.data = data;
        tracing::debug!(
            buffer = self.label,
            from = self.capacity,
            to = new_capacity,
            "grew buffer"
        );
        self.capacity = new_capacity;
        self.reallocations += 1;
        true
    }
}

impl<T: Pod> std::ops::Index<usize> for GpuVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}
