use crate::{
    AndOr, ChangeKind, ColumnDescriptor, Error, Filter, FilterExpression, FilterSegment,
    KeyStrategy, Operator, OrderBy, OrderDirection, ReadQuery, Record, Result, Statement,
    TableDescriptor, Value, separated_by,
    writer::{Context, Fragment},
};
use std::fmt::Write;

/// Dialect printer turning table descriptors, filters and records into statements.
///
/// Every method has a default implementation producing generic SQL with `@name`
/// placeholders. Drivers override the few hooks where their dialect differs,
/// most notably [`SqlWriter::write_placeholder`].
pub trait SqlWriter: Send + Sync {
    /// Whether placeholders carry the parameter name (`@name`) or only a position (`$1`).
    fn named_parameters(&self) -> bool {
        true
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_table_name(&self, context: &mut Context, out: &mut String, table: &TableDescriptor) {
        self.write_identifier_quoted(context, out, &table.name);
    }

    /// Column name, aliased to its property inside a projection.
    fn write_column(&self, context: &mut Context, out: &mut String, column: &ColumnDescriptor) {
        self.write_identifier_quoted(context, out, &column.name);
        if context.fragment == Fragment::SqlSelect && column.is_aliased() {
            out.push_str(" AS ");
            self.write_identifier_quoted(context, out, column.property);
        }
    }

    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(if value { "TRUE" } else { "FALSE" });
    }

    /// Single quoted string literal.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    /// Placeholder of the parameter at `position` (0-based).
    fn write_placeholder(
        &self,
        _context: &mut Context,
        out: &mut String,
        name: &str,
        _position: usize,
    ) {
        out.push('@');
        out.push_str(name);
    }

    /// Binds `value` under `name` and writes its placeholder.
    fn write_parameter(&self, context: &mut Context, out: &mut String, name: &str, value: Value) {
        let position = context.parameters.add(name, value);
        self.write_placeholder(context, out, name, position);
    }

    /// Pattern around a bound value: `('%' || @name || '%')`. The value is never altered.
    fn write_pattern(
        &self,
        context: &mut Context,
        out: &mut String,
        operator: Operator,
        name: &str,
        value: Value,
    ) {
        out.push('(');
        if let Some(prefix) = operator.prefix() {
            self.write_value_string(context, out, prefix);
            out.push_str(" || ");
        }
        self.write_parameter(context, out, name, value);
        if let Some(suffix) = operator.suffix() {
            out.push_str(" || ");
            self.write_value_string(context, out, suffix);
        }
        out.push(')');
    }

    /// One expression, its parameters are named `{name}_{segment}_{expression}`.
    fn write_filter_expression(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        expression: &FilterExpression,
        segment: usize,
        index: usize,
    ) -> Result<()> {
        let Some(column) = table.column(&expression.property) else {
            let error = Error::msg(format!(
                "Cannot filter `{}` on `{}`, the property is not mapped",
                table.name, expression.property
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        self.write_column(context, out, column);
        out.push(' ');
        out.push_str(expression.operator.sql());
        if !expression.operator.uses_value() {
            return Ok(());
        }
        out.push(' ');
        let name = format!("{}_{}_{}", expression.parameter_name(), segment, index);
        let value = expression.value.clone().unwrap_or_default();
        match expression.operator {
            Operator::In => {
                let items = match value {
                    Value::List(items, ..) => items.unwrap_or_default(),
                    v => vec![v],
                };
                out.push('(');
                if items.is_empty() {
                    out.push_str("NULL");
                }
                separated_by(
                    out,
                    items.into_iter().enumerate(),
                    |out, (i, v)| {
                        self.write_parameter(context, out, &format!("{name}_i{i}"), v);
                    },
                    ", ",
                );
                out.push(')');
            }
            op if op.is_pattern() => self.write_pattern(context, out, op, &name, value),
            _ => self.write_parameter(context, out, &name, value),
        }
        Ok(())
    }

    /// Writes `(e0 AND e1 ...) OR (e0 ...)`, skipping empty segments.
    ///
    /// The connector stored with an element joins it to the one before, so the
    /// connector of the first element written is ignored.
    fn write_filter(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        segments: &[(usize, &FilterSegment)],
    ) -> Result<()> {
        let mut first_segment = true;
        for (s, segment) in segments {
            if segment.is_empty() {
                continue;
            }
            if !first_segment {
                let _ = write!(out, " {} ", segment.joined_by.sql());
            }
            first_segment = false;
            out.push('(');
            for (e, (expression, connector)) in segment.expressions.iter().enumerate() {
                if e > 0 {
                    let _ = write!(out, " {} ", connector.sql());
                }
                self.write_filter_expression(context, out, table, expression, *s, e)?;
            }
            out.push(')');
        }
        Ok(())
    }

    /// `WHERE` clause of a read, hiding soft deleted rows unless the filter
    /// already carries a segment named `SoftDelete`.
    fn write_where(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        filter: &Filter,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlSelectWhere);
        let segments = filter
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .collect::<Vec<_>>();
        let soft_delete = (table.is_soft_delete()
            && !filter.has_segment(crate::SOFT_DELETE_SEGMENT))
        .then(FilterSegment::soft_delete);
        if !segments.is_empty() || soft_delete.is_some() {
            out.push_str("\nWHERE ");
        }
        match soft_delete {
            Some(soft_delete) => {
                let grouped = segments.len() > 1;
                if grouped {
                    out.push('(');
                }
                self.write_filter(context, out, table, &segments)?;
                if grouped {
                    out.push(')');
                }
                if !segments.is_empty() {
                    let _ = write!(out, " {} ", AndOr::And.sql());
                }
                self.write_filter(
                    context,
                    out,
                    table,
                    &[(filter.segments.len(), &soft_delete)],
                )?;
            }
            None => self.write_filter(context, out, table, &segments)?,
        }
        context.switch_fragment(previous);
        Ok(())
    }

    /// `ORDER BY`, the primary key ascending when nothing is requested.
    fn write_order_by(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        order_by: &OrderBy,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlSelectOrderBy);
        let mut columns = Vec::with_capacity(order_by.expressions.len().max(1));
        for expression in &order_by.expressions {
            let Some(column) = table.column(&expression.property) else {
                let error = Error::msg(format!(
                    "Cannot order `{}` by `{}`, the property is not mapped",
                    table.name, expression.property
                ));
                log::error!("{:#}", error);
                return Err(error);
            };
            columns.push((column, expression.direction));
        }
        if columns.is_empty() {
            if let Some(pk) = table.primary_key() {
                columns.push((pk, OrderDirection::Ascending));
            }
        }
        if !columns.is_empty() {
            out.push_str("\nORDER BY ");
            separated_by(
                out,
                columns,
                |out, (column, direction)| {
                    self.write_column(context, out, column);
                    out.push(' ');
                    out.push_str(direction.sql());
                },
                ", ",
            );
        }
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_paging(&self, _context: &mut Context, out: &mut String, offset: u64, size: u64) {
        let _ = write!(out, "\nOFFSET {offset} ROWS FETCH NEXT {size} ROWS ONLY");
    }

    fn write_returning(&self, context: &mut Context, out: &mut String, column: &ColumnDescriptor) {
        out.push_str("\nRETURNING ");
        self.write_identifier_quoted(context, out, &column.name);
    }

    /// Custom SQL with `@property` placeholders bound from the record.
    ///
    /// Named dialects also receive every other property of the record.
    fn write_template(
        &self,
        context: &mut Context,
        out: &mut String,
        template: &str,
        record: &dyn Record,
    ) {
        let previous = context.switch_fragment(Fragment::SqlTemplate);
        let row = record.row();
        let mut chars = template.char_indices().peekable();
        let mut quoted = false;
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                quoted = !quoted;
            }
            let starts_name = chars
                .peek()
                .is_some_and(|(_, n)| n.is_ascii_alphabetic() || *n == '_');
            if c != '@' || quoted || !starts_name {
                out.push(c);
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while let Some((j, n)) = chars.peek() {
                if !(n.is_ascii_alphanumeric() || *n == '_') {
                    break;
                }
                end = j + n.len_utf8();
                chars.next();
            }
            let name = &template[start..end];
            match row.iter().find(|(p, _)| *p == name) {
                Some((_, value)) => self.write_parameter(context, out, name, value.clone()),
                None => {
                    out.push('@');
                    out.push_str(name);
                }
            }
        }
        if self.named_parameters() {
            for (property, value) in row {
                context.parameters.add(property, value);
            }
        }
        context.switch_fragment(previous);
    }

    fn select_statement(&self, table: &TableDescriptor, query: &ReadQuery) -> Result<Statement> {
        let mut out = String::with_capacity(128 + table.columns.len() * 32);
        let mut context = Context::new(Fragment::SqlSelect);
        if let Some(template) = &table.templates.select {
            out.push_str(template.trim_end().trim_end_matches(';'));
        } else {
            let mut columns = query
                .columns
                .iter()
                .filter_map(|property| {
                    let column = table.column(property);
                    if column.is_none() {
                        log::warn!(
                            "Ignoring `{}` in the projection of `{}`, the property is not mapped",
                            property,
                            table.name
                        );
                    }
                    column
                })
                .collect::<Vec<_>>();
            if columns.is_empty() {
                columns = table.projected().collect();
            }
            out.push_str("SELECT ");
            separated_by(
                &mut out,
                columns,
                |out, column| self.write_column(&mut context, out, column),
                ", ",
            );
            out.push_str("\nFROM ");
            context.switch_fragment(Fragment::SqlSelectFrom);
            self.write_table_name(&mut context, &mut out, table);
        }
        self.write_where(&mut context, &mut out, table, &query.filter)?;
        self.write_order_by(&mut context, &mut out, table, &query.order_by)?;
        if query.page_size > 0 {
            self.write_paging(&mut context, &mut out, query.offset(), query.page_size);
        }
        out.push(';');
        Ok(context.into_statement(out))
    }

    fn count_statement(&self, table: &TableDescriptor, filter: &Filter) -> Result<Statement> {
        let mut out = String::with_capacity(128);
        let mut context = Context::new(Fragment::SqlCount);
        if let Some(template) = &table.templates.count {
            out.push_str(template.trim_end().trim_end_matches(';'));
        } else {
            out.push_str("SELECT COUNT(*)\nFROM ");
            self.write_table_name(&mut context, &mut out, table);
        }
        self.write_where(&mut context, &mut out, table, filter)?;
        out.push(';');
        Ok(context.into_statement(out))
    }

    /// Statement writing one record.
    ///
    /// `changed` restricts an update to the given properties.
    fn write_statement(
        &self,
        table: &TableDescriptor,
        kind: ChangeKind,
        record: &dyn Record,
        changed: Option<&[String]>,
    ) -> Result<Statement> {
        table.ensure_writable()?;
        let mut out = String::with_capacity(128 + table.columns.len() * 32);
        let mut context = Context::default();
        let template = match kind {
            ChangeKind::Insert => &table.templates.insert,
            ChangeKind::Update => &table.templates.update,
            ChangeKind::Delete => &table.templates.delete,
            ChangeKind::StoredProcedure => &table.templates.procedure,
        };
        if let Some(template) = template {
            self.write_template(&mut context, &mut out, template, record);
            return Ok(context.into_statement(out));
        }
        match kind {
            ChangeKind::Insert => self.write_insert(&mut context, &mut out, table, record)?,
            ChangeKind::Update => {
                self.write_update(&mut context, &mut out, table, record, changed)?
            }
            ChangeKind::Delete => self.write_delete(&mut context, &mut out, table, record)?,
            ChangeKind::StoredProcedure => {
                let error = Error::msg(format!(
                    "Table `{}` has no stored procedure template",
                    table.name
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        out.push(';');
        Ok(context.into_statement(out))
    }

    fn write_insert(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        record: &dyn Record,
    ) -> Result<()> {
        context.switch_fragment(Fragment::SqlInsertInto);
        let identity = table.key_strategy == KeyStrategy::Identity;
        let columns = table
            .insertable()
            .filter(|c| !(identity && c.primary_key))
            .collect::<Vec<_>>();
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            row.push((column, record_value(table, record, column)?));
        }
        if let (KeyStrategy::Sequence(sequence), Some(pk)) =
            (&table.key_strategy, table.primary_key())
        {
            if row
                .iter()
                .any(|(c, v)| c.primary_key && v.is_unset_key())
            {
                let error = Error::msg(format!(
                    "Cannot insert into `{}`: the key `{}` must be allocated from `{}` first",
                    table.name, pk.property, sequence
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        out.push_str("INSERT INTO ");
        self.write_table_name(context, out, table);
        if row.is_empty() {
            out.push_str(" DEFAULT VALUES");
        } else {
            out.push_str(" (");
            separated_by(
                out,
                row.iter(),
                |out, (c, _)| self.write_identifier_quoted(context, out, &c.name),
                ", ",
            );
            out.push_str(") VALUES\n(");
            context.switch_fragment(Fragment::SqlInsertIntoValues);
            separated_by(
                out,
                row,
                |out, (c, v)| self.write_parameter(context, out, c.property, v),
                ", ",
            );
            out.push(')');
        }
        if let (true, Some(pk)) = (identity, table.primary_key()) {
            self.write_returning(context, out, pk);
        }
        Ok(())
    }

    fn write_update(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        record: &dyn Record,
        changed: Option<&[String]>,
    ) -> Result<()> {
        context.switch_fragment(Fragment::SqlUpdate);
        if let Some(changed) = changed {
            for property in changed {
                if table.column(property).is_none() {
                    log::warn!(
                        "Ignoring `{}` in the update of `{}`, the property is not mapped",
                        property,
                        table.name
                    );
                }
            }
        }
        let columns = table
            .columns
            .iter()
            .filter(|c| c.writable && !c.primary_key && !c.skip)
            .filter(|c| changed.is_none_or(|v| v.iter().any(|p| p == c.property)))
            .collect::<Vec<_>>();
        if columns.is_empty() {
            let error = Error::msg(format!(
                "Nothing to update in `{}`, no writable column is selected",
                table.name
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        out.push_str("UPDATE ");
        self.write_table_name(context, out, table);
        out.push_str(" SET\n");
        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            values.push((column, record_value(table, record, column)?));
        }
        separated_by(
            out,
            values,
            |out, (c, v)| {
                self.write_identifier_quoted(context, out, &c.name);
                out.push_str(" = ");
                self.write_parameter(context, out, c.property, v);
            },
            ", ",
        );
        context.switch_fragment(Fragment::SqlUpdateWhere);
        self.write_key_condition(context, out, table, record)
    }

    /// Hard delete, or an update of the soft delete flag.
    fn write_delete(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        record: &dyn Record,
    ) -> Result<()> {
        if let Some(flag) = table.soft_delete() {
            context.switch_fragment(Fragment::SqlUpdate);
            out.push_str("UPDATE ");
            self.write_table_name(context, out, table);
            out.push_str(" SET ");
            self.write_identifier_quoted(context, out, &flag.name);
            out.push_str(" = ");
            self.write_value_bool(context, out, true);
            context.switch_fragment(Fragment::SqlUpdateWhere);
        } else {
            context.switch_fragment(Fragment::SqlDeleteFrom);
            out.push_str("DELETE FROM ");
            self.write_table_name(context, out, table);
            context.switch_fragment(Fragment::SqlDeleteFromWhere);
        }
        self.write_key_condition(context, out, table, record)
    }

    /// `WHERE "pk" = @pk`
    fn write_key_condition(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDescriptor,
        record: &dyn Record,
    ) -> Result<()> {
        let Some(pk) = table.primary_key() else {
            return table.ensure_writable();
        };
        let value = record_value(table, record, pk)?;
        out.push_str("\nWHERE ");
        self.write_identifier_quoted(context, out, &pk.name);
        out.push_str(" = ");
        self.write_parameter(context, out, pk.property, value);
        Ok(())
    }

    /// Multi-row insert of every writable column, key included.
    ///
    /// Parameters are named `{property}_{row}`.
    fn bulk_insert_statement(
        &self,
        table: &TableDescriptor,
        records: &[&dyn Record],
    ) -> Result<Statement> {
        table.ensure_writable()?;
        let columns = table.insertable().collect::<Vec<_>>();
        let mut out = String::with_capacity(128 + records.len() * columns.len() * 16);
        let mut context = Context::new(Fragment::SqlInsertInto);
        if records.is_empty() {
            return Ok(context.into_statement(out));
        }
        out.push_str("INSERT INTO ");
        self.write_table_name(&mut context, &mut out, table);
        out.push_str(" (");
        separated_by(
            &mut out,
            columns.iter(),
            |out, c| self.write_identifier_quoted(&mut context, out, &c.name),
            ", ",
        );
        out.push_str(") VALUES\n");
        context.switch_fragment(Fragment::SqlInsertIntoValues);
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                out.push_str(",\n");
            }
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                values.push((*column, record_value(table, *record, column)?));
            }
            out.push('(');
            separated_by(
                &mut out,
                values,
                |out, (c, v)| {
                    self.write_parameter(&mut context, out, &format!("{}_{}", c.property, i), v)
                },
                ", ",
            );
            out.push(')');
        }
        out.push(';');
        Ok(context.into_statement(out))
    }

    /// Reserves `count` consecutive values of `sequence` and returns the first one.
    fn sequence_range_statement(&self, sequence: &str, count: u64) -> Statement {
        let mut out = String::with_capacity(128);
        let mut context = Context::new(Fragment::SqlSequenceRange);
        let count = Value::Int64(Some(count as i64));
        let sequence = Value::Varchar(Some(sequence.to_string()));
        out.push_str("SELECT setval(");
        self.write_parameter(&mut context, &mut out, "sequence", sequence.clone());
        out.push_str(", nextval(");
        self.write_parameter(&mut context, &mut out, "sequence", sequence);
        out.push_str(") + ");
        self.write_parameter(&mut context, &mut out, "count", count.clone());
        out.push_str(" - 1) - ");
        self.write_parameter(&mut context, &mut out, "count", count);
        out.push_str(" + 1;");
        context.into_statement(out)
    }
}

fn record_value(
    table: &TableDescriptor,
    record: &dyn Record,
    column: &ColumnDescriptor,
) -> Result<Value> {
    record.get_value(column.property).ok_or_else(|| {
        let error = Error::msg(format!(
            "Record {} does not expose the property `{}` of `{}`",
            record.entity_name(),
            column.property,
            table.name
        ));
        log::error!("{:#}", error);
        error
    })
}

/// Generic SQL with `@name` placeholders.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {}
