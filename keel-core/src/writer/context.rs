use crate::{Parameters, Statement};

/// Clause currently being written.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectWhere,
    SqlSelectOrderBy,
    SqlCount,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlUpdate,
    SqlUpdateWhere,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    SqlTemplate,
    SqlSequenceRange,
}

/// State threaded through the writer while one statement is produced.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Context {
    pub fragment: Fragment,
    /// Values bound so far, in placeholder order.
    pub parameters: Parameters,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self {
            fragment,
            parameters: Parameters::new(),
        }
    }

    /// Sets the current fragment and returns the previous one.
    pub fn switch_fragment(&mut self, fragment: Fragment) -> Fragment {
        std::mem::replace(&mut self.fragment, fragment)
    }

    pub fn into_statement(self, sql: String) -> Statement {
        Statement {
            sql,
            parameters: self.parameters,
        }
    }
}
