use keel::Entity;
use rust_decimal::Decimal;
use time::Date;

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(priority = 10)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub is_deleted: bool,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(name = "orders", priority = 20)]
pub struct CustomerOrder {
    pub id: i32,
    pub customer_id: i64,
    #[keel(name = "order_total")]
    pub total: Decimal,
    pub placed_on: Option<Date>,
    #[keel(skip)]
    pub notes: Option<String>,
    #[keel(read_only)]
    pub created_by: Option<String>,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(identity)]
pub struct AuditLog {
    pub id: i64,
    pub message: String,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
pub struct Product {
    #[keel(primary_key)]
    pub code: String,
    pub price: f64,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(
    name = "customer_report",
    select = "SELECT name, orders FROM customer_report_view",
    count = "SELECT COUNT(*) FROM customer_report_view"
)]
pub struct CustomerReport {
    pub name: String,
    pub orders: i64,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[keel(
    sequence = "archive_keys",
    procedure = "CALL archive_customer(@id, @reason);",
    delete = "DELETE FROM archive WHERE id = @id AND reason <> '@reason'"
)]
pub struct Archive {
    pub id: i64,
    pub reason: String,
}
