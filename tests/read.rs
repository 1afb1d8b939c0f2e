mod resource {
    pub mod init;
    pub mod mock;
    pub mod shop;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        init::init_logs,
        mock::{Call, MockConnection, row},
        shop::{Customer, CustomerOrder, CustomerReport},
    };
    use keel::{
        Connection, Entity, Executor, Filter, FilterExpression, FilterSegment, KeyRange,
        Operator, ReadQuery, Registry, Statement, Transaction, Value,
    };
    use rust_decimal::Decimal;

    fn customer_row(id: i64, name: &str) -> keel::RowLabeled {
        row(
            &["id", "name", "email", "is_deleted"],
            vec![
                Value::Int64(Some(id)),
                Value::Varchar(Some(name.into())),
                Value::Varchar(None),
                Value::Boolean(Some(false)),
            ],
        )
    }

    #[tokio::test]
    async fn find_all_with_total() {
        init_logs();
        let registry = Registry::new();
        let mut connection = MockConnection::new();
        connection.push_rows(vec![customer_row(1, "Ada"), customer_row(2, "Grace")]);
        connection.push_rows(vec![row(&["count"], vec![Value::Int64(Some(42))])]);
        let query = ReadQuery::new(Filter::new().push(FilterSegment::new(
            FilterExpression::new::<Customer>("name", Operator::NotEqual)
                .unwrap()
                .value("Linus"),
        )))
        .page(2, 1)
        .with_total();
        let response = Customer::find_all(&mut connection, &registry, &query).await;
        assert!(response.success, "{:?}", response.error_message);
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[1].name, "Grace");
        assert_eq!(response.total_count, Some(42));

        let statements = connection.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].sql.starts_with("SELECT \"id\", \"name\""));
        assert!(statements[1].sql.starts_with("SELECT COUNT(*)"));
        assert_eq!(
            statements[1].parameters.get("name_0_0"),
            Some(&Value::Varchar(Some("Linus".into())))
        );
    }

    #[tokio::test]
    async fn find_pk() {
        init_logs();
        let registry = Registry::new();
        let mut connection = MockConnection::new();
        connection.push_rows(vec![customer_row(7, "Ada")]);
        let response = Customer::find_pk(&mut connection, &registry, 7i64).await;
        assert_eq!(response.first().map(|v| v.id), Some(7));
        assert_eq!(response.total_count, None);
        let statements = connection.statements();
        assert!(statements[0].sql.contains(
            "WHERE (\"id\" = @id_0_0) AND (\"is_deleted\" = @is_deleted_1_0)"
        ));
        assert_eq!(
            statements[0].parameters.get("id_0_0"),
            Some(&Value::Int64(Some(7)))
        );

        // Nothing found is still a success
        let response = Customer::find_pk(&mut connection, &registry, 8i64).await;
        assert!(response.success);
        assert!(response.first().is_none());

        let response = CustomerReport::find_pk(&mut connection, &registry, "Ada").await;
        assert!(!response.success);
        assert!(
            response
                .error_message
                .unwrap()
                .contains("has no primary key")
        );
    }

    #[tokio::test]
    async fn projected_columns() {
        init_logs();
        let registry = Registry::new();
        let mut connection = MockConnection::new();
        let query = ReadQuery::new(Filter::new()).columns(["id", "name"]);
        connection.push_rows(vec![row(
            &["id", "name"],
            vec![Value::Int64(Some(1)), Value::Varchar(Some("Ada".into()))],
        )]);
        let response = Customer::find_rows(&mut connection, &registry, &query).await;
        assert!(response.success, "{:?}", response.error_message);
        assert_eq!(response.items.len(), 1);
        let first = response.first().unwrap();
        assert_eq!(first.names(), ["id", "name"]);
        assert_eq!(first.decode::<String>("name").unwrap(), "Ada");
        assert!(
            connection.statements()[0]
                .sql
                .starts_with("SELECT \"id\", \"name\"\nFROM \"customer\"")
        );

        // Decoding into the entity needs every required field
        connection.push_rows(vec![first.clone()]);
        let response = Customer::find_all(&mut connection, &registry, &query).await;
        assert!(!response.success);
        assert!(
            response
                .error_message
                .unwrap()
                .contains("`is_deleted` of type bool is missing")
        );

        // Optional and skipped fields can be left out
        connection.push_rows(vec![row(
            &["id", "customer_id", "total"],
            vec![
                Value::Int32(Some(5)),
                Value::Int64(Some(1)),
                Value::Decimal(Some(Decimal::new(1999, 2))),
            ],
        )]);
        let response = CustomerOrder::find_all(
            &mut connection,
            &registry,
            &ReadQuery::default().columns(["id", "customer_id", "total"]),
        )
        .await;
        assert!(response.success, "{:?}", response.error_message);
        assert_eq!(
            response.first(),
            Some(&CustomerOrder {
                id: 5,
                customer_id: 1,
                total: Decimal::new(1999, 2),
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn count() {
        init_logs();
        let registry = Registry::new();
        let mut connection = MockConnection::new();
        connection.push_rows(vec![row(&["count"], vec![Value::Int32(Some(3))])]);
        let response = Customer::count(&mut connection, &registry, &Filter::new()).await;
        assert!(response.success);
        assert!(response.items.is_empty());
        assert_eq!(response.total_count, Some(3));

        connection.push_rows(vec![row(&["count"], vec![Value::Varchar(Some("x".into()))])]);
        let response = Customer::count(&mut connection, &registry, &Filter::new()).await;
        assert!(!response.success);
        assert!(
            response
                .error_message
                .unwrap()
                .contains("Expected a row count")
        );
    }

    #[tokio::test]
    async fn errors_become_responses() {
        init_logs();
        let registry = Registry::new();
        let mut connection = MockConnection::new();
        connection.state().fail_on = Some("FROM \"customer\"".into());
        let response =
            Customer::find_all(&mut connection, &registry, &ReadQuery::default()).await;
        assert!(!response.success);
        assert!(response.items.is_empty());
        assert!(response.error_message.unwrap().contains("Mock failure"));
        connection.state().fail_on = None;

        // Rows that do not decode fail the whole read
        connection.push_rows(vec![
            customer_row(1, "Ada"),
            row(&["id", "name"], vec![Value::Int64(Some(2)), Value::Null]),
        ]);
        let response =
            Customer::find_all(&mut connection, &registry, &ReadQuery::default()).await;
        assert!(!response.success);
        assert!(response.items.is_empty());
    }

    #[tokio::test]
    async fn ranges_inside_transaction() {
        init_logs();
        let mut connection = MockConnection::new();
        connection.state().next_key = 40;
        {
            let mut transaction = connection.begin().await.unwrap();
            let mut keys = KeyRange::allocate(&mut transaction, "orders_id_seq", 3)
                .await
                .unwrap();
            assert_eq!(keys.last(), Some(42));
            assert_eq!(keys.remaining(), 3);
            assert_eq!(keys.by_ref().collect::<Vec<_>>(), [40, 41, 42]);
            assert_eq!(keys.next(), None);
            assert_eq!(
                transaction.allocate_range("orders_id_seq", 0).await.unwrap(),
                0
            );
            transaction.commit().await.unwrap();
        }
        let calls = connection.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Call::Begin);
        assert!(matches!(&calls[1], Call::Fetch(s) if s.sql.contains("setval(")));
        assert_eq!(calls[2], Call::Commit);

        let value = connection
            .fetch_scalar(Statement::from("SELECT 1"))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }
}
