use crate::{Error, Executor, Result, Value};

/// Consecutive keys reserved from a sequence, `[first, first + count - 1]`.
///
/// Reservations are not transactional on most databases: when the save that
/// reserved a range is rolled back the keys stay consumed and leave a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub first: i64,
    pub count: u64,
    taken: u64,
}

impl KeyRange {
    pub fn new(first: i64, count: u64) -> Self {
        Self {
            first,
            count,
            taken: 0,
        }
    }

    /// Reserves `count` keys of `sequence` through `executor`.
    pub async fn allocate<E: Executor>(
        executor: &mut E,
        sequence: &str,
        count: u64,
    ) -> Result<Self> {
        let first = executor.allocate_range(sequence, count).await?;
        Ok(Self::new(first, count))
    }

    pub fn last(&self) -> Option<i64> {
        (self.count > 0).then(|| self.first + self.count as i64 - 1)
    }

    pub fn remaining(&self) -> u64 {
        self.count - self.taken
    }
}

impl Iterator for KeyRange {
    type Item = i64;
    fn next(&mut self) -> Option<i64> {
        if self.taken >= self.count {
            return None;
        }
        let result = self.first + self.taken as i64;
        self.taken += 1;
        Some(result)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}

/// Converts a generated key into the type of the key column.
pub fn key_value(prototype: &Value, key: i64) -> Result<Value> {
    match prototype {
        Value::Int32(..) => i32::try_from(key)
            .map(|v| Value::Int32(Some(v)))
            .map_err(|_| Error::msg(format!("Generated key {key} does not fit into i32"))),
        Value::Int64(..) => Ok(Value::Int64(Some(key))),
        _ => Err(Error::msg(format!(
            "Cannot assign the generated key {key} to a {} column",
            prototype.type_name()
        ))),
    }
}
