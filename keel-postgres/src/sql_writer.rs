use keel_core::{
    SqlWriter, Statement, Value,
    writer::{Context, Fragment},
};
use std::fmt::Write;

/// Postgres dialect: positional `$n` placeholders and an advisory locked range
/// allocation.
#[derive(Default, Debug, Clone)]
pub struct PostgresSqlWriter {
    /// Function `(sequence text, count bigint) -> bigint` reserving a range,
    /// used instead of the built in statement when present.
    pub sequence_function: Option<String>,
}

impl SqlWriter for PostgresSqlWriter {
    fn named_parameters(&self) -> bool {
        false
    }

    fn write_placeholder(
        &self,
        _context: &mut Context,
        out: &mut String,
        _name: &str,
        position: usize,
    ) {
        let _ = write!(out, "${}", position + 1);
    }

    /// `setval(nextval())` is not atomic on its own, concurrent allocators are
    /// serialized through a transaction scoped advisory lock keyed on the
    /// sequence name. Plain `nextval()` callers do not take the lock.
    fn sequence_range_statement(&self, sequence: &str, count: u64) -> Statement {
        let mut out = String::with_capacity(256);
        let mut context = Context::new(Fragment::SqlSequenceRange);
        let count = Value::Int64(Some(count as i64));
        let sequence = Value::Varchar(Some(sequence.to_string()));
        if let Some(function) = &self.sequence_function {
            out.push_str("SELECT ");
            out.push_str(function);
            out.push('(');
            self.write_parameter(&mut context, &mut out, "sequence", sequence);
            out.push_str("::text, ");
            self.write_parameter(&mut context, &mut out, "count", count);
            out.push_str("::bigint);");
            return context.into_statement(out);
        }
        let sequence_param = |context: &mut Context, out: &mut String| {
            out.push('(');
            self.write_parameter(context, out, "sequence", sequence.clone());
            out.push_str("::text)");
        };
        out.push_str("SELECT setval(");
        sequence_param(&mut context, &mut out);
        out.push_str("::regclass, nextval(");
        sequence_param(&mut context, &mut out);
        out.push_str("::regclass) + ");
        self.write_parameter(&mut context, &mut out, "count", count.clone());
        out.push_str("::bigint - 1) - ");
        self.write_parameter(&mut context, &mut out, "count", count);
        out.push_str("::bigint + 1\nFROM (SELECT pg_advisory_xact_lock(hashtext(");
        sequence_param(&mut context, &mut out);
        out.push_str("))) AS range_lock;");
        context.into_statement(out)
    }
}
