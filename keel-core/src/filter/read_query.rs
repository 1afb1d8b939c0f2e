use crate::{Filter, OrderBy};

/// Everything a select needs besides the table: filter, ordering, paging and projection.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub filter: Filter,
    pub order_by: OrderBy,
    /// Rows per page, `0` disables paging.
    pub page_size: u64,
    /// 1-based page number, values below 1 are read as 1.
    pub page_number: u64,
    /// Properties to project, empty means every non-skip column.
    pub columns: Vec<String>,
    /// Also compute the total number of matching rows.
    pub with_total: bool,
}

impl ReadQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn order_by(mut self, order_by: impl Into<OrderBy>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn page(mut self, page_size: u64, page_number: u64) -> Self {
        self.page_size = page_size;
        self.page_number = page_number;
        self
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_total(mut self) -> Self {
        self.with_total = true;
        self
    }

    /// Rows skipped before the requested page, saturating at `u64::MAX`.
    pub fn offset(&self) -> u64 {
        (self.page_number.max(1) - 1).saturating_mul(self.page_size)
    }
}

impl From<Filter> for ReadQuery {
    fn from(value: Filter) -> Self {
        Self::new(value)
    }
}
