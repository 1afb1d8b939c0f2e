use keel::{
    Connection, Driver, Error, Executor, GenericSqlWriter, Result, RowLabeled, RowsAffected,
    Statement, Transaction, Value,
    stream::{self, Stream},
};
use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

/// Everything the mock saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin,
    Commit,
    Rollback,
    Fetch(Statement),
    Execute(Statement),
}

#[derive(Debug)]
pub struct MockState {
    pub calls: Vec<Call>,
    /// Rows returned by the next plain fetches, one entry per fetch.
    pub results: VecDeque<Vec<RowLabeled>>,
    /// Statements containing this text fail.
    pub fail_on: Option<String>,
    pub fail_begin: bool,
    pub fail_commit: bool,
    /// Next key handed out by sequence ranges and identity inserts.
    pub next_key: i64,
    /// Rows reported by every execute.
    pub rows_affected: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            results: VecDeque::new(),
            fail_on: None,
            fail_begin: false,
            fail_commit: false,
            next_key: 1,
            rows_affected: 1,
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;
    type Transaction<'c> = MockTransaction<'c>;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

/// Records statements instead of running them. Sequence ranges and
/// `RETURNING` inserts are answered from `next_key`.
#[derive(Default, Debug, Clone)]
pub struct MockConnection {
    pub state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Statements run, fetched or executed.
    pub fn statements(&self) -> Vec<Statement> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Fetch(s) | Call::Execute(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn push_rows(&self, rows: Vec<RowLabeled>) {
        self.state().results.push_back(rows);
    }
}

pub fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
    RowLabeled::new(
        labels.iter().map(|v| v.to_string()).collect(),
        values.into_boxed_slice(),
    )
}

fn check(state: &MockState, statement: &Statement) -> Result<()> {
    if let Some(fail_on) = &state.fail_on
        && statement.sql.contains(fail_on.as_str())
    {
        return Err(Error::msg(format!("Mock failure on `{}`", statement.sql)));
    }
    Ok(())
}

fn fetch(state: &Mutex<MockState>, statement: Statement) -> Result<Vec<RowLabeled>> {
    let mut state = state.lock().unwrap();
    state.calls.push(Call::Fetch(statement.clone()));
    check(&state, &statement)?;
    if statement.sql.contains("setval(") {
        let count = statement
            .parameters
            .get("count")
            .and_then(Value::as_i64)
            .unwrap_or_default();
        let first = state.next_key;
        state.next_key += count;
        return Ok(vec![row(&["first"], vec![Value::Int64(Some(first))])]);
    }
    if statement.sql.contains("RETURNING") {
        let key = state.next_key;
        state.next_key += 1;
        return Ok(vec![row(&["id"], vec![Value::Int64(Some(key))])]);
    }
    Ok(state.results.pop_front().unwrap_or_default())
}

fn execute(state: &Mutex<MockState>, statement: Statement) -> Result<RowsAffected> {
    let mut state = state.lock().unwrap();
    state.calls.push(Call::Execute(statement.clone()));
    check(&state, &statement)?;
    Ok(RowsAffected { rows_affected: state.rows_affected })
}

fn rows_stream(result: Result<Vec<RowLabeled>>) -> impl Stream<Item = Result<RowLabeled>> + Send {
    stream::iter(match result {
        Ok(rows) => rows.into_iter().map(Ok).collect::<Vec<_>>(),
        Err(e) => vec![Err(e)],
    })
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &MockDriver
    }

    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        rows_stream(fetch(&self.state, statement))
    }

    fn execute(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let result = execute(&self.state, statement);
        async move { result }
    }
}

impl Connection for MockConnection {
    fn connect(_url: &str) -> impl Future<Output = Result<Self>> + Send {
        async { Ok(MockConnection::new()) }
    }

    fn begin(&mut self) -> impl Future<Output = Result<MockTransaction<'_>>> + Send {
        async move {
            let fail = {
                let mut state = self.state();
                state.calls.push(Call::Begin);
                state.fail_begin
            };
            if fail {
                return Err(Error::msg("Mock failure on begin"));
            }
            Ok(MockTransaction { connection: self })
        }
    }
}

pub struct MockTransaction<'c> {
    connection: &'c mut MockConnection,
}

impl<'c> Executor for MockTransaction<'c> {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &MockDriver
    }

    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.connection.fetch(statement)
    }

    fn execute(
        &mut self,
        statement: Statement,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.connection.execute(statement)
    }
}

impl<'c> Transaction<'c> for MockTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut state = self.connection.state();
            state.calls.push(Call::Commit);
            if state.fail_commit {
                return Err(Error::msg("Mock failure on commit"));
            }
            Ok(())
        }
    }

    fn rollback(self) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.connection.state().calls.push(Call::Rollback);
            Ok(())
        }
    }
}
